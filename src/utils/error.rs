// utils/error.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // Erreurs réseau
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    // Erreurs de données
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    Validation(String),

    // Erreurs de configuration
    #[error("Configuration error: {0}")]
    Config(String),

    // Erreurs système
    #[error("IO error: {0}")]
    Io(String),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return AppError::ParseError(err.to_string());
        }
        match err.status() {
            Some(status) => AppError::UnexpectedStatus {
                status: status.as_u16(),
                body: err.to_string(),
            },
            None => AppError::Http(err.to_string()),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

// Type de résultat standard
pub type Result<T> = std::result::Result<T, AppError>;
