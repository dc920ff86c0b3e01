use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::schema::DatabaseSchema;

/// Validate internal consistency of a schema document.
///
/// This checks:
/// - duplicate tables/columns and tables without columns
/// - foreign key targets exist
/// - copy-from-column sources exist, and same-table sources come earlier
/// - identity columns do not carry a value generator
pub fn validate_schema(schema: &DatabaseSchema) -> Result<()> {
    let mut catalog: BTreeMap<String, BTreeSet<&str>> = BTreeMap::new();

    for table in &schema.tables {
        let key = table.key();
        if table.columns.is_empty() {
            return Err(Error::InvalidSchema(format!("table has no columns: {key}")));
        }

        let mut columns = BTreeSet::new();
        for column in &table.columns {
            if !columns.insert(column.name.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate column name: {key}.{}",
                    column.name
                )));
            }
        }

        if catalog.insert(key.clone(), columns).is_some() {
            return Err(Error::InvalidSchema(format!("duplicate table name: {key}")));
        }
    }

    for table in &schema.tables {
        let key = table.key();
        for (position, column) in table.columns.iter().enumerate() {
            if column.is_deferred() && column.generator.is_some() {
                return Err(Error::InvalidSchema(format!(
                    "identity column cannot carry a generator: {key}.{}",
                    column.name
                )));
            }

            if let Some(fk) = &column.foreign_key {
                let target = fk.table_key();
                let exists = catalog
                    .get(&target)
                    .is_some_and(|columns| columns.contains(fk.referenced_column.as_str()));
                if !exists {
                    return Err(Error::InvalidSchema(format!(
                        "foreign key target not found: {key}.{} -> {target}.{}",
                        column.name, fk.referenced_column
                    )));
                }
            }

            if let Some((source_schema, source_table, source_column)) = column.copy_source(table) {
                let target = format!("{source_schema}.{source_table}");
                if target == key {
                    let earlier = table.columns[..position]
                        .iter()
                        .any(|candidate| candidate.name == source_column);
                    if !earlier {
                        return Err(Error::InvalidSchema(format!(
                            "copy source must precede the column: {key}.{} <- {source_column}",
                            column.name
                        )));
                    }
                    continue;
                }

                let exists = catalog
                    .get(&target)
                    .is_some_and(|columns| columns.contains(source_column));
                if !exists {
                    return Err(Error::InvalidSchema(format!(
                        "copy source not found: {key}.{} <- {target}.{source_column}",
                        column.name
                    )));
                }
            }
        }
    }

    Ok(())
}
