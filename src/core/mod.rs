// Logique métier sans effet réseau
pub mod model_list;

pub use model_list::{EditOutcome, ModelEntry, ModelListEditor};
