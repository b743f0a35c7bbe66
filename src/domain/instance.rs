use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifiant opaque d'une instance, renvoyé tel quel au serveur
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InstanceId {
    Int(i64),
    Text(String),
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceId::Int(id) => write!(f, "{}", id),
            InstanceId::Text(id) => write!(f, "{}", id),
        }
    }
}

impl From<i64> for InstanceId {
    fn from(id: i64) -> Self {
        InstanceId::Int(id)
    }
}

impl From<&str> for InstanceId {
    fn from(id: &str) -> Self {
        InstanceId::Text(id.to_string())
    }
}

/// Texte à annoter, conservé jusqu'à son annotation ou son remplacement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub id: InstanceId,
    pub text: String,
}

/// Réponse de `instance/next`
#[derive(Debug, Deserialize)]
pub struct NextInstanceResponse {
    pub instance_id: InstanceId,
    pub utterance: String,
}

impl From<NextInstanceResponse> for Instance {
    fn from(response: NextInstanceResponse) -> Self {
        Self {
            id: response.instance_id,
            text: response.utterance,
        }
    }
}

/// Décision de l'annotateur, transmise sous forme de code entier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Annotation {
    Positive,
    Negative,
    Skip,
}

impl Annotation {
    pub const KEY_POSITIVE: u32 = 65; // A
    pub const KEY_NEGATIVE: u32 = 76; // L
    pub const KEY_SKIP: u32 = 71; // G

    pub fn code(self) -> i8 {
        match self {
            Annotation::Positive => 1,
            Annotation::Negative => 0,
            Annotation::Skip => -1,
        }
    }

    /// Raccourcis clavier par code de touche physique
    pub fn from_key_code(key_code: u32) -> Option<Self> {
        match key_code {
            Self::KEY_POSITIVE => Some(Annotation::Positive),
            Self::KEY_NEGATIVE => Some(Annotation::Negative),
            Self::KEY_SKIP => Some(Annotation::Skip),
            _ => None,
        }
    }
}

impl From<Annotation> for i8 {
    fn from(annotation: Annotation) -> Self {
        annotation.code()
    }
}

impl TryFrom<i8> for Annotation {
    type Error = String;

    fn try_from(code: i8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Annotation::Positive),
            0 => Ok(Annotation::Negative),
            -1 => Ok(Annotation::Skip),
            other => Err(format!("unknown annotation code: {}", other)),
        }
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Annotation::Positive => "positive",
            Annotation::Negative => "negative",
            Annotation::Skip => "skip",
        };
        f.write_str(label)
    }
}

/// Corps de `POST /annotate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub instance_id: InstanceId,
    pub annotation: Annotation,
}
