//! # Workers Module
//!
//! Boucles de fond du client d'annotation :
//! - `annotation_session.rs`: Récupération des instances et envoi des annotations
//! - `status_monitor.rs`: Polling de l'état des modèles d'un projet
//! - `task.rs`: Tâche annulable commune aux deux boucles
//!
//! ## Architecture
//! Chaque boucle se réarme après chaque étape terminée (succès ou échec)
//! au lieu de tourner sur un intervalle fixe. L'état courant est publié
//! via `tokio::sync::watch` pour la couche d'affichage.

pub mod annotation_session;
pub mod status_monitor;
pub mod task;

pub use annotation_session::{AnnotationSession, SessionConfig, SessionPhase, SessionState, SubmitOutcome};
pub use status_monitor::{ModelStatusMonitor, MonitorConfig, RefreshOutcome};
pub use task::{CancelSignal, TaskHandle};
