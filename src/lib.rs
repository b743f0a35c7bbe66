// src/lib.rs
// Modules principaux
pub mod core;
pub mod domain;
pub mod services;
pub mod utils;
pub mod workers;

// Ré-exports pour faciliter l'utilisation
pub use crate::core::{EditOutcome, ModelEntry, ModelListEditor};
pub use domain::{Annotation, Instance, InstanceId, ModelStatus, ProjectId, Submission};
pub use services::{AlafClient, AnnotationApi, StatusApi};
pub use utils::{AppError, Config, Result};
pub use workers::{
    AnnotationSession, ModelStatusMonitor, MonitorConfig, SessionConfig, SessionPhase, SessionState,
    SubmitOutcome, TaskHandle,
};

// Version de l'application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = "ALAF Annotator";
