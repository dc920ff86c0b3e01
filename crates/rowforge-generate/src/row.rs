use rowforge_core::{ColumnType, Value};
use serde::Serialize;

use crate::handle::ValueHandle;
use crate::store::ValueStore;

/// One column slot of a produced row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    pub handle: ValueHandle,
    /// `false` when the value is supplied later from outside, e.g. a
    /// database-assigned identity. Such handles get no store entry.
    pub produces_value_now: bool,
    pub data_type: ColumnType,
}

/// Fields for one table instantiation at sequence number `n`, in schema order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub schema: String,
    pub table: String,
    pub n: u64,
    pub fields: Vec<Field>,
}

impl Row {
    pub fn key(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Look up the stored value of a field by column name.
    pub fn value(&self, name: &str, store: &ValueStore) -> Option<Value> {
        self.field(name).and_then(|field| store.get(field.handle))
    }
}
