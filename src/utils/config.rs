// utils/config.rs
use crate::utils::error::{AppError, Result};
use dotenv::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Nombre de couleurs de la palette des graphiques serveur, borne haute du nombre de modèles
pub const DEFAULT_MAX_MODELS: usize = 20;
pub const DEFAULT_MIN_MODELS: usize = 1;

#[derive(Debug, Clone)]
pub struct Config {
    // Serveur
    pub server_url: String,
    pub project_id: u64,
    pub request_timeout_seconds: u64,

    // Boucles
    pub retry_delay_ms: u64,
    pub status_poll_interval_ms: u64,

    // Formulaire de projet
    pub min_models: usize,
    pub max_models: usize,

    // Logging
    pub log_level: String,
    pub log_format: String,
}

impl Config {
    /// Charger la configuration depuis les variables d'environnement
    pub fn from_env() -> Result<Self> {
        // Charger le fichier .env si présent
        let _ = dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Construire la configuration à partir d'une source de variables quelconque
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let project_id = lookup("ALAF_PROJECT_ID").ok_or_else(|| {
            AppError::Config("Variable d'environnement requise manquante: ALAF_PROJECT_ID".to_string())
        })?;

        let config = Config {
            server_url: lookup("ALAF_SERVER_URL").unwrap_or_else(|| "http://localhost:5000".to_string()),
            project_id: parse_value("ALAF_PROJECT_ID", &project_id)?,
            request_timeout_seconds: parse_or("ALAF_REQUEST_TIMEOUT_SECONDS", lookup("ALAF_REQUEST_TIMEOUT_SECONDS"), 30)?,

            retry_delay_ms: parse_or("ALAF_RETRY_DELAY_MS", lookup("ALAF_RETRY_DELAY_MS"), 1000)?,
            status_poll_interval_ms: parse_or("ALAF_STATUS_POLL_INTERVAL_MS", lookup("ALAF_STATUS_POLL_INTERVAL_MS"), 5000)?,

            min_models: parse_or("ALAF_MIN_MODELS", lookup("ALAF_MIN_MODELS"), DEFAULT_MIN_MODELS)?,
            max_models: parse_or("ALAF_MAX_MODELS", lookup("ALAF_MAX_MODELS"), DEFAULT_MAX_MODELS)?,

            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_format: lookup("LOG_FORMAT").unwrap_or_else(|| "json".to_string()),
        };

        if config.min_models > config.max_models {
            return Err(AppError::Validation(format!(
                "ALAF_MIN_MODELS ({}) must not exceed ALAF_MAX_MODELS ({})",
                config.min_models, config.max_models
            )));
        }

        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn status_poll_interval(&self) -> Duration {
        Duration::from_millis(self.status_poll_interval_ms)
    }

    /// Logs JSON ou format compact lisible
    pub fn is_json_logging(&self) -> bool {
        self.log_format == "json"
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::Validation(format!("{} must be a number", key)))
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}
