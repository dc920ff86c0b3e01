use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Single-column foreign key reference carried by a column definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ForeignKeyRef {
    pub referenced_schema: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

impl ForeignKeyRef {
    /// `schema.table` key of the referenced table.
    pub fn table_key(&self) -> String {
        format!("{}.{}", self.referenced_schema, self.referenced_table)
    }
}
