use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use tracing::debug;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::utils::config::{Config, DEFAULT_MAX_MODELS, DEFAULT_MIN_MODELS};

const REQUIRED_MESSAGE: &str = "This field is required.";
const WORD_CHARACTERS_MESSAGE: &str = "Only letters numbers or underscore allowed";
const DISTINCT_MESSAGE: &str = "Model names have to be distinct";

/// Un emplacement de modèle du formulaire de projet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub value: Option<String>,
    #[serde(default)]
    pub errors: Vec<String>,
    pub id: Option<String>,
}

impl ModelEntry {
    /// Entrée vide ajoutée par `add`
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn named(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Applied,
    /// Borne atteinte: un message a été ajouté à la place
    Refused,
    InvalidIndex,
}

/// Règles de nommage appliquées par le serveur à la soumission du formulaire
#[derive(Debug, Validate)]
struct ModelName {
    #[validate(
        custom = "validate_word_characters",
        length(min = 4, max = 75, message = "Entry must be between 4 & 75 characters")
    )]
    name: String,
}

fn validate_word_characters(name: &str) -> std::result::Result<(), ValidationError> {
    if name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Ok(());
    }

    let mut error = ValidationError::new("word_characters");
    error.message = Some(Cow::from(WORD_CHARACTERS_MESSAGE));
    Err(error)
}

fn name_messages(errors: &ValidationErrors) -> Vec<String> {
    let field_errors = errors.field_errors();
    let Some(name_errors) = field_errors.get("name") else {
        return Vec::new();
    };

    name_errors
        .iter()
        .map(|e| {
            e.message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| e.code.to_string())
        })
        .collect()
}

/// Liste bornée de modèles éditée dans le formulaire de projet.
///
/// Les dépassements de bornes ne sont jamais rejetés: un message est
/// accumulé sur une entrée pour être affiché à côté du champ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelListEditor {
    entries: Vec<ModelEntry>,
    min_entries: usize,
    max_entries: usize,
}

impl ModelListEditor {
    /// Aucune vérification que la liste initiale respecte les bornes
    pub fn initialize(entries: Vec<ModelEntry>, min_entries: usize, max_entries: usize) -> Self {
        debug!(entries = entries.len(), min_entries, max_entries, "model list initialized");
        Self {
            entries,
            min_entries,
            max_entries,
        }
    }

    pub fn with_default_bounds(entries: Vec<ModelEntry>) -> Self {
        Self::initialize(entries, DEFAULT_MIN_MODELS, DEFAULT_MAX_MODELS)
    }

    /// Bornes lues dans `ALAF_MIN_MODELS` / `ALAF_MAX_MODELS`
    pub fn from_config(entries: Vec<ModelEntry>, config: &Config) -> Self {
        Self::initialize(entries, config.min_models, config.max_models)
    }

    pub fn entries(&self) -> &[ModelEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<ModelEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn min_entries(&self) -> usize {
        self.min_entries
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn entry_mut(&mut self, index: usize) -> Option<&mut ModelEntry> {
        self.entries.get_mut(index)
    }

    pub fn set_value(&mut self, index: usize, value: Option<String>) -> EditOutcome {
        match self.entries.get_mut(index) {
            Some(entry) => {
                entry.value = value;
                EditOutcome::Applied
            }
            None => EditOutcome::InvalidIndex,
        }
    }

    pub fn add(&mut self) -> EditOutcome {
        if self.entries.len() >= self.max_entries {
            let message = format!("Maximum of {} models reached", self.max_entries);
            if let Some(last) = self.entries.last_mut() {
                last.errors.push(message);
            }
            debug!(entries = self.entries.len(), max_entries = self.max_entries, "model add refused");
            return EditOutcome::Refused;
        }

        self.entries.push(ModelEntry::empty());
        debug!(entries = self.entries.len(), "model added");
        EditOutcome::Applied
    }

    pub fn remove(&mut self, index: usize) -> EditOutcome {
        if self.entries.len() <= self.min_entries {
            let message = if self.min_entries == 1 {
                format!("Minimum {} model is required", self.min_entries)
            } else {
                format!("Minimum {} models are required", self.min_entries)
            };

            return match self.entries.get_mut(index) {
                Some(entry) => {
                    entry.errors.push(message);
                    debug!(index, min_entries = self.min_entries, "model removal refused");
                    EditOutcome::Refused
                }
                None => EditOutcome::InvalidIndex,
            };
        }

        if index >= self.entries.len() {
            return EditOutcome::InvalidIndex;
        }

        self.entries.remove(index);
        debug!(index, entries = self.entries.len(), "model removed");
        EditOutcome::Applied
    }

    pub fn clear_errors(&mut self) {
        for entry in &mut self.entries {
            entry.errors.clear();
        }
    }

    /// Applique les règles de nommage avant soumission; renvoie `true` si aucune erreur
    pub fn validate(&mut self) -> bool {
        self.clear_errors();

        for entry in &mut self.entries {
            let value = entry.value.as_deref().unwrap_or("");
            if value.trim().is_empty() {
                entry.errors.push(REQUIRED_MESSAGE.to_string());
                continue;
            }

            let candidate = ModelName {
                name: value.to_string(),
            };
            if let Err(errors) = candidate.validate() {
                entry.errors.extend(name_messages(&errors));
            }
        }

        let mut occurrences: HashMap<String, usize> = HashMap::new();
        for value in self.entries.iter().filter_map(|entry| entry.value.as_deref()) {
            if !value.trim().is_empty() {
                *occurrences.entry(value.to_string()).or_default() += 1;
            }
        }
        for entry in &mut self.entries {
            let duplicated = entry
                .value
                .as_deref()
                .and_then(|value| occurrences.get(value))
                .is_some_and(|count| *count > 1);
            if duplicated {
                entry.errors.push(DISTINCT_MESSAGE.to_string());
            }
        }

        self.entries.iter().all(|entry| entry.errors.is_empty())
    }
}
