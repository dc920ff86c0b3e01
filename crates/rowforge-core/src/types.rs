use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Formatted type metadata for a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnType {
    /// User-friendly formatted type (e.g. `character varying(255)`).
    pub data_type: String,
    #[serde(default)]
    pub character_max_length: Option<i32>,
    #[serde(default)]
    pub numeric_precision: Option<i32>,
    #[serde(default)]
    pub numeric_scale: Option<i32>,
}

impl ColumnType {
    pub fn new(data_type: impl Into<String>) -> Self {
        Self {
            data_type: data_type.into(),
            character_max_length: None,
            numeric_precision: None,
            numeric_scale: None,
        }
    }

    /// Lowercased type name without modifiers, e.g. `varchar(20)` -> `varchar`.
    pub fn base_name(&self) -> String {
        self.data_type
            .split('(')
            .next()
            .unwrap_or(&self.data_type)
            .trim()
            .to_lowercase()
    }
}

/// Identity generation strategy for database-assigned columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IdentityGeneration {
    Always,
    ByDefault,
}
