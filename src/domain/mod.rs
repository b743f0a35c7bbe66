//! # Domain Models Module
//!
//! Ce module contient les données échangées avec le serveur d'annotation.
//!
//! ## Structure
//! - `instance.rs`: Instance à annoter, décision d'annotation et soumission
//! - `model.rs`: État des modèles d'apprentissage d'un projet
//!
//! ## Conventions
//! - Les formats JSON suivent exactement ceux du serveur
//! - Les identifiants serveur sont opaques et renvoyés sans transformation

pub mod instance;
pub mod model;

// Ré-export des types principaux pour une utilisation facile
pub use instance::{Annotation, Instance, InstanceId, NextInstanceResponse, Submission};
pub use model::{ModelStatus, StatusResponse};

/// Identifiant numérique d'un projet côté serveur
pub type ProjectId = u64;
