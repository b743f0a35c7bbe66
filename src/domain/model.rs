use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// État d'un modèle tel que rapporté par le serveur
///
/// Le contenu est conservé tel quel et transmis sans modification à
/// l'affichage; les accesseurs lisent les champs usuels quand ils existent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelStatus(Map<String, Value>);

impl ModelStatus {
    pub fn raw(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_raw(self) -> Map<String, Value> {
        self.0
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Nom du modèle, à défaut son identifiant
    pub fn name(&self) -> Option<String> {
        match self.0.get("name").or_else(|| self.0.get("id"))? {
            Value::String(name) => Some(name.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// État brut (booléen de connexion ou valeur d'énumération côté serveur)
    pub fn state(&self) -> Option<&Value> {
        self.0.get("status").or_else(|| self.0.get("state"))
    }

    /// Modèle connecté au serveur (session active)
    pub fn is_online(&self) -> bool {
        matches!(self.0.get("status"), Some(Value::Bool(true)))
    }

    /// Nombre d'instances annotées pour ce modèle
    pub fn count(&self) -> Option<i64> {
        self.0.get("count").and_then(Value::as_i64)
    }
}

impl From<Map<String, Value>> for ModelStatus {
    fn from(raw: Map<String, Value>) -> Self {
        Self(raw)
    }
}

/// Réponse de `/project/{id}/status`
#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    pub models: Vec<ModelStatus>,
}
