use std::sync::Arc;

use crate::errors::GenerationError;
use crate::row::Row;
use crate::store::ValueStore;

/// Placeholder replaced by the rendered row statements.
pub const ROWS_PLACEHOLDER: &str = "{{rows}}";
/// Placeholder replaced by the task's sequence number.
pub const N_PLACEHOLDER: &str = "{{n}}";
/// Placeholder replaced by a fresh number from the sequence function, once
/// per occurrence.
pub const SEQ_PLACEHOLDER: &str = "{{seq}}";

/// Turns a base query plus produced rows into final query text.
pub trait QueryMaterializer: Send + Sync {
    fn materialize(
        &self,
        base_query: &str,
        rows: &[Row],
        n: u64,
        sequence: &dyn Fn() -> u64,
    ) -> Result<String, GenerationError>;
}

impl<F> QueryMaterializer for F
where
    F: Fn(&str, &[Row], u64, &dyn Fn() -> u64) -> Result<String, GenerationError> + Send + Sync,
{
    fn materialize(
        &self,
        base_query: &str,
        rows: &[Row],
        n: u64,
        sequence: &dyn Fn() -> u64,
    ) -> Result<String, GenerationError> {
        self(base_query, rows, n, sequence)
    }
}

/// Renders one `INSERT` statement per row into the base query.
///
/// Deferred fields are left out of the column list so the database assigns
/// them. An empty base query yields just the statements.
#[derive(Debug, Clone)]
pub struct InsertMaterializer {
    store: Arc<ValueStore>,
}

impl InsertMaterializer {
    pub fn new(store: Arc<ValueStore>) -> Self {
        Self { store }
    }

    fn render_row(&self, row: &Row) -> Result<String, GenerationError> {
        let mut columns = Vec::with_capacity(row.fields.len());
        let mut values = Vec::with_capacity(row.fields.len());

        for field in row.fields.iter().filter(|field| field.produces_value_now) {
            let value = self.store.get(field.handle).ok_or_else(|| {
                GenerationError::MissingReference(format!(
                    "no stored value for {}.{} (handle {})",
                    row.key(),
                    field.name,
                    field.handle
                ))
            })?;
            columns.push(quote_ident(&field.name));
            values.push(value.to_sql_literal());
        }

        let target = format!("{}.{}", quote_ident(&row.schema), quote_ident(&row.table));
        if columns.is_empty() {
            return Ok(format!("INSERT INTO {target} DEFAULT VALUES;"));
        }

        Ok(format!(
            "INSERT INTO {target} ({}) VALUES ({});",
            columns.join(", "),
            values.join(", ")
        ))
    }
}

impl QueryMaterializer for InsertMaterializer {
    fn materialize(
        &self,
        base_query: &str,
        rows: &[Row],
        n: u64,
        sequence: &dyn Fn() -> u64,
    ) -> Result<String, GenerationError> {
        let statements = rows
            .iter()
            .map(|row| self.render_row(row))
            .collect::<Result<Vec<_>, _>>()?
            .join("\n");

        if base_query.trim().is_empty() {
            return Ok(statements);
        }
        if !base_query.contains(ROWS_PLACEHOLDER) {
            return Err(GenerationError::InvalidArgument(format!(
                "base query has no {ROWS_PLACEHOLDER} placeholder"
            )));
        }

        // Placeholders are filled in the template only; row text goes in last
        // and is never rescanned.
        let mut template = base_query.replace(N_PLACEHOLDER, &n.to_string());
        while let Some(position) = template.find(SEQ_PLACEHOLDER) {
            let next = sequence().to_string();
            template.replace_range(position..position + SEQ_PLACEHOLDER.len(), &next);
        }
        Ok(template.replace(ROWS_PLACEHOLDER, &statements))
    }
}

fn quote_ident(raw: &str) -> String {
    format!("\"{}\"", raw.replace('"', "\"\""))
}
