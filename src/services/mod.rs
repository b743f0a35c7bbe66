//! # Services Module
//!
//! Accès au serveur d'annotation. Les boucles de `workers` ne dépendent que
//! des traits définis ici, ce qui permet de les piloter avec des doublures en test.

pub mod alaf_client;

pub use alaf_client::AlafClient;

use async_trait::async_trait;

use crate::domain::{Instance, ModelStatus, ProjectId, Submission};
use crate::utils::Result;

/// Récupération des instances et envoi des annotations
#[async_trait]
pub trait AnnotationApi: Send + Sync {
    /// Prochaine instance non annotée du projet
    async fn next_instance(&self, project_id: ProjectId) -> Result<Instance>;

    /// Envoi d'une décision; seul le succès ou l'échec compte
    async fn annotate(&self, submission: &Submission) -> Result<()>;
}

/// État des modèles d'un projet
#[async_trait]
pub trait StatusApi: Send + Sync {
    async fn project_status(&self, project_id: ProjectId) -> Result<Vec<ModelStatus>>;
}
