use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constraints::ForeignKeyRef;
use crate::generator::GeneratorSpec;
use crate::types::{ColumnType, IdentityGeneration};

/// Top-level schema document consumed by the row producer.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DatabaseSchema {
    /// Contract version for this schema format.
    pub schema_version: String,
    /// Database name when available.
    #[serde(default)]
    pub database: Option<String>,
    /// Tables in the order the caller wants them produced.
    pub tables: Vec<Table>,
}

impl DatabaseSchema {
    pub fn table(&self, schema: &str, name: &str) -> Option<&Table> {
        self.tables
            .iter()
            .find(|table| table.schema == schema && table.name == name)
    }
}

/// A table definition with columns in schema order.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Table {
    pub schema: String,
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
    pub columns: Vec<Column>,
}

impl Table {
    /// `schema.table` key used for lookups and ordering.
    pub fn key(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }
}

/// Column metadata plus its optional bound generator.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Column {
    pub ordinal_position: i16,
    pub name: String,
    pub column_type: ColumnType,
    pub is_nullable: bool,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default)]
    pub identity: Option<IdentityGeneration>,
    #[serde(default)]
    pub foreign_key: Option<ForeignKeyRef>,
    #[serde(default)]
    pub generator: Option<GeneratorSpec>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl Column {
    /// Columns whose value is assigned later by the database.
    pub fn is_deferred(&self) -> bool {
        self.identity.is_some()
    }

    /// `(schema, table, column)` of the column this one copies from, resolved
    /// against the owning table.
    pub fn copy_source<'a>(&'a self, owner: &'a Table) -> Option<(&'a str, &'a str, &'a str)> {
        match &self.generator {
            Some(GeneratorSpec::CopyFromColumn {
                schema,
                table,
                column,
            }) => Some((
                schema.as_deref().unwrap_or(&owner.schema),
                table.as_deref().unwrap_or(&owner.name),
                column.as_str(),
            )),
            _ => None,
        }
    }
}
