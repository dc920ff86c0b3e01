use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use rowforge_core::Table;

use crate::errors::GenerationError;
use crate::generators::produce_for_column;
use crate::handle::ValueHandle;
use crate::row::{Field, Row};
use crate::store::ValueStore;

/// Handle of an already produced column, as seen by copy-from-column fields.
#[derive(Debug, Clone, Copy)]
struct ScopedHandle {
    handle: ValueHandle,
    produces_value_now: bool,
}

/// Handles produced so far in one pass, keyed by `schema.table.column`.
#[derive(Debug, Default)]
struct HandleScope {
    handles: HashMap<String, ScopedHandle>,
}

impl HandleScope {
    fn get(&self, key: &str) -> Option<ScopedHandle> {
        self.handles.get(key).copied()
    }

    fn insert(&mut self, key: String, handle: ScopedHandle) {
        self.handles.insert(key, handle);
    }
}

/// Expands table definitions into rows, writing produced values into a shared
/// [`ValueStore`].
///
/// Copy-from-column fields resolve to the handle of their source column, so
/// both fields read back the identical value. Within [`RowProducer::produce_rows`]
/// the source is looked up in the batch first; otherwise the latest row this
/// producer made for the source table is used.
///
/// The latest-row fallback is shared by every caller of one producer. With
/// concurrent callers it may pick up another caller's parent, whose store
/// entries can already be released; the materializer then reports a
/// `MissingReference`. Batches that contain their copy sources never use it.
#[derive(Debug)]
pub struct RowProducer {
    store: Arc<ValueStore>,
    rng: Mutex<ChaCha8Rng>,
    latest: Mutex<HashMap<String, ScopedHandle>>,
}

impl RowProducer {
    pub fn new(store: Arc<ValueStore>, seed: u64) -> Self {
        Self {
            store,
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
            latest: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<ValueStore> {
        &self.store
    }

    /// Produce one row for `table` at sequence number `n`.
    pub fn produce_row(&self, table: &Table, n: u64) -> Result<Row, GenerationError> {
        let mut scope = HandleScope::default();
        self.produce_in_scope(table, n, &mut scope)
    }

    /// Lazily produce one row per table, in order, calling `n_supplier` once
    /// per table.
    ///
    /// Tables must be ordered so copy sources come first; see
    /// [`rowforge_core::order_tables`].
    pub fn produce_rows<'a, F>(
        &'a self,
        tables: &'a [Table],
        n_supplier: F,
    ) -> Result<Rows<'a, F>, GenerationError>
    where
        F: FnMut() -> u64,
    {
        if tables.is_empty() {
            return Err(GenerationError::InvalidArgument(
                "produce_rows requires at least one table".to_string(),
            ));
        }

        Ok(Rows {
            producer: self,
            tables: tables.iter(),
            n_supplier,
            scope: HandleScope::default(),
        })
    }

    fn produce_in_scope(
        &self,
        table: &Table,
        n: u64,
        scope: &mut HandleScope,
    ) -> Result<Row, GenerationError> {
        validate_table(table)?;

        let mut written = Vec::new();
        let row = self.fill_row(table, n, scope, &mut written);
        if row.is_err() {
            self.store.discard(&written);
        }
        row
    }

    /// Produce the fields of one row, recording every handle put into the
    /// store in `written` so a failed row can be rolled back.
    fn fill_row(
        &self,
        table: &Table,
        n: u64,
        scope: &mut HandleScope,
        written: &mut Vec<ValueHandle>,
    ) -> Result<Row, GenerationError> {
        let mut fields = Vec::with_capacity(table.columns.len());
        let mut produced = Vec::with_capacity(table.columns.len());
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);

        for column in &table.columns {
            let scoped = if let Some((schema, source_table, source_column)) =
                column.copy_source(table)
            {
                let key = column_key(schema, source_table, source_column);
                scope
                    .get(&key)
                    .or_else(|| self.latest_handle(&key))
                    .ok_or_else(|| {
                        GenerationError::MissingReference(format!(
                            "{}.{} copies {key} which has not been produced",
                            table.key(),
                            column.name
                        ))
                    })?
            } else if column.is_deferred() {
                ScopedHandle {
                    handle: ValueHandle::mint(),
                    produces_value_now: false,
                }
            } else {
                let handle = ValueHandle::mint();
                let value = produce_for_column(column, n, &mut *rng)?;
                self.store.put(handle, value);
                written.push(handle);
                ScopedHandle {
                    handle,
                    produces_value_now: true,
                }
            };

            let key = column_key(&table.schema, &table.name, &column.name);
            scope.insert(key.clone(), scoped);
            produced.push((key, scoped));
            fields.push(Field {
                name: column.name.clone(),
                handle: scoped.handle,
                produces_value_now: scoped.produces_value_now,
                data_type: column.column_type.clone(),
            });
        }
        drop(rng);

        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(produced);

        trace!(table = %table.key(), n, fields = fields.len(), "row produced");

        Ok(Row {
            schema: table.schema.clone(),
            table: table.name.clone(),
            n,
            fields,
        })
    }

    fn latest_handle(&self, key: &str) -> Option<ScopedHandle> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied()
    }
}

/// Lazy row sequence returned by [`RowProducer::produce_rows`].
pub struct Rows<'a, F> {
    producer: &'a RowProducer,
    tables: std::slice::Iter<'a, Table>,
    n_supplier: F,
    scope: HandleScope,
}

impl<F> Iterator for Rows<'_, F>
where
    F: FnMut() -> u64,
{
    type Item = Result<Row, GenerationError>;

    fn next(&mut self) -> Option<Self::Item> {
        let table = self.tables.next()?;
        let n = (self.n_supplier)();
        Some(self.producer.produce_in_scope(table, n, &mut self.scope))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.tables.size_hint()
    }
}

fn validate_table(table: &Table) -> Result<(), GenerationError> {
    if table.name.trim().is_empty() {
        return Err(GenerationError::InvalidArgument(
            "table name must not be empty".to_string(),
        ));
    }
    if table.columns.is_empty() {
        return Err(GenerationError::InvalidArgument(format!(
            "table {} has no columns",
            table.key()
        )));
    }
    Ok(())
}

fn column_key(schema: &str, table: &str, column: &str) -> String {
    format!("{schema}.{table}.{column}")
}
