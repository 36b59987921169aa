//! Settings of a [`DocumentSource`](crate::source::DocumentSource).

use serde::Deserialize;

use crate::error::DocumentStoreResult;

/// Source-wide settings.
///
/// ```ignore
/// let config = SourceConfig::from_json(r#"{ "set_string_id": false, "recursive": 2 }"#)?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Return identifiers in their external string form.
    pub set_string_id: bool,
    /// Recursion depth for reads that do not ask for one. Overrides the entity defaults.
    pub recursive: Option<i32>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            set_string_id: true,
            recursive: None,
        }
    }
}

impl SourceConfig {
    pub fn from_json(json: &str) -> DocumentStoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn set_string_id(mut self, set_string_id: bool) -> Self {
        self.set_string_id = set_string_id;
        self
    }

    pub fn recursive(mut self, depth: i32) -> Self {
        self.recursive = Some(depth);
        self
    }
}
