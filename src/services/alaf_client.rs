// services/alaf_client.rs
use crate::domain::{Instance, ModelStatus, NextInstanceResponse, ProjectId, StatusResponse, Submission};
use crate::services::{AnnotationApi, StatusApi};
use crate::utils::config::Config;
use crate::utils::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::{Client as HttpClient, Response, Url};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Client HTTP du serveur d'annotation
#[derive(Debug, Clone)]
pub struct AlafClient {
    http_client: Arc<HttpClient>,
    base_url: Url,
}

impl AlafClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| AppError::Config(format!("Invalid server URL {}: {}", base_url, e)))?;

        // Les chemins sont résolus relativement à la base, préfixe éventuel compris
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http_client = Arc::new(
            HttpClient::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?,
        );

        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.server_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| AppError::Config(format!("Invalid endpoint {}: {}", path, e)))
    }

    /// Transformer un statut non 2xx en erreur en conservant le corps pour le diagnostic
    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(AppError::UnexpectedStatus {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl AnnotationApi for AlafClient {
    async fn next_instance(&self, project_id: ProjectId) -> Result<Instance> {
        let url = self.endpoint(&format!("project/{}/instance/next", project_id))?;

        let response = self.http_client
            .get(url)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let next: NextInstanceResponse = response
            .json()
            .await?;

        debug!(project_id, instance_id = %next.instance_id, "instance received");
        Ok(next.into())
    }

    async fn annotate(&self, submission: &Submission) -> Result<()> {
        let url = self.endpoint("annotate")?;

        let response = self.http_client
            .post(url)
            .json(submission)
            .send()
            .await?;
        Self::check_status(response).await?;

        Ok(())
    }
}

#[async_trait]
impl StatusApi for AlafClient {
    async fn project_status(&self, project_id: ProjectId) -> Result<Vec<ModelStatus>> {
        let url = self.endpoint(&format!("project/{}/status", project_id))?;

        let response = self.http_client
            .get(url)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let status: StatusResponse = response
            .json()
            .await?;

        Ok(status.models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Annotation, InstanceId};
    use assert_json_diff::assert_json_eq;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> AlafClient {
        AlafClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_next_instance() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/project/3/instance/next"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "instance_id": 17,
                "utterance": "the weather is nice"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let instance = client_for(&server).next_instance(3).await.unwrap();

        assert_eq!(instance.id, InstanceId::Int(17));
        assert_eq!(instance.text, "the weather is nice");
    }

    #[tokio::test]
    async fn test_next_instance_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/project/3/instance/next"))
            .respond_with(ResponseTemplate::new(500).set_body_string("No instance without annotation left"))
            .mount(&server)
            .await;

        let result = client_for(&server).next_instance(3).await;

        match result {
            Err(AppError::UnexpectedStatus { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "No instance without annotation left");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_next_instance_incomplete_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/project/3/instance/next"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"instance_id": 17})))
            .mount(&server)
            .await;

        let result = client_for(&server).next_instance(3).await;
        assert!(matches!(result, Err(AppError::ParseError(_))));
    }

    #[tokio::test]
    async fn test_annotate_posts_submission() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/annotate"))
            .and(body_json(json!({"instance_id": "x1", "annotation": 0})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let submission = Submission {
            instance_id: InstanceId::from("x1"),
            annotation: Annotation::Negative,
        };
        client_for(&server).annotate(&submission).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_json_eq!(body, json!({"instance_id": "x1", "annotation": 0}));
    }

    #[tokio::test]
    async fn test_annotate_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/annotate"))
            .respond_with(ResponseTemplate::new(400).set_body_string("no instance id found"))
            .mount(&server)
            .await;

        let submission = Submission {
            instance_id: InstanceId::Int(1),
            annotation: Annotation::Skip,
        };
        let result = client_for(&server).annotate(&submission).await;
        assert!(matches!(result, Err(AppError::UnexpectedStatus { status: 400, .. })));
    }

    #[tokio::test]
    async fn test_project_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/project/9/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [
                    {"name": "svm_a", "status": true, "count": 4},
                    {"name": "svm_b", "status": false, "count": null}
                ]
            })))
            .mount(&server)
            .await;

        let models = client_for(&server).project_status(9).await.unwrap();

        assert_eq!(models.len(), 2);
        assert_eq!(models[0].name().as_deref(), Some("svm_a"));
        assert!(models[0].is_online());
        assert_eq!(models[0].count(), Some(4));
        assert_eq!(models[1].count(), None);
    }

    #[tokio::test]
    async fn test_base_url_with_prefix() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/alaf/project/2/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"models": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = AlafClient::new(&format!("{}/alaf", server.uri()), Duration::from_secs(5)).unwrap();
        assert!(client.base_url().path().ends_with("/alaf/"));

        let models = client.project_status(2).await.unwrap();
        assert!(models.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        // Port réservé, aucune écoute attendue
        let client = AlafClient::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        let result = client.next_instance(1).await;
        assert!(matches!(result, Err(AppError::Http(_))));
    }

    #[test]
    fn test_invalid_base_url() {
        let result = AlafClient::new("not a url", Duration::from_secs(1));
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
