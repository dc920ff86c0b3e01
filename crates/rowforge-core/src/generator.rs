use chrono::{NaiveDate, NaiveDateTime};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Generator bound to a column.
///
/// Every variant except [`GeneratorSpec::CopyFromColumn`] is a function of the
/// sequence number `n` and its own parameters; random variants also draw from
/// the row producer's shared random source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeneratorSpec {
    /// Always yields `value`.
    Constant { value: Value },
    /// Yields `start + (n - 1) * step`.
    Counter {
        #[serde(default = "default_one")]
        start: i64,
        #[serde(default = "default_one")]
        step: i64,
    },
    /// Draws from the shared random source.
    Random { distribution: RandomSpec },
    /// Always yields the same timestamp.
    DateStatic { value: NaiveDateTime },
    /// Yields `start + (n - 1) * step_seconds`.
    DateIncrementing {
        start: NaiveDateTime,
        #[serde(default = "default_day_seconds")]
        step_seconds: i64,
    },
    /// Reuses the handle of another column produced earlier in the same pass.
    ///
    /// `table` unset means the referencing table itself; `schema` unset means
    /// the referencing table's schema.
    CopyFromColumn {
        #[serde(default)]
        schema: Option<String>,
        #[serde(default)]
        table: Option<String>,
        column: String,
    },
}

impl GeneratorSpec {
    /// Stable identifier used in logs and error messages.
    pub fn id(&self) -> &'static str {
        match self {
            GeneratorSpec::Constant { .. } => "constant",
            GeneratorSpec::Counter { .. } => "counter",
            GeneratorSpec::Random { distribution } => distribution.id(),
            GeneratorSpec::DateStatic { .. } => "date.static",
            GeneratorSpec::DateIncrementing { .. } => "date.incrementing",
            GeneratorSpec::CopyFromColumn { .. } => "copy_from_column",
        }
    }

    pub fn is_copy(&self) -> bool {
        matches!(self, GeneratorSpec::CopyFromColumn { .. })
    }
}

/// Parameters for random generators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RandomSpec {
    IntRange {
        min: i64,
        max: i64,
    },
    FloatRange {
        min: f64,
        max: f64,
        #[serde(default)]
        scale: Option<u32>,
    },
    Bool {
        #[serde(default = "default_probability")]
        probability: f64,
    },
    Text {
        #[serde(default = "default_one_usize")]
        min_len: usize,
        max_len: usize,
        #[serde(default)]
        charset: Option<String>,
    },
    Choice {
        values: Vec<Value>,
    },
    Uuid,
    DateRange {
        min: NaiveDate,
        max: NaiveDate,
    },
}

impl RandomSpec {
    pub fn id(&self) -> &'static str {
        match self {
            RandomSpec::IntRange { .. } => "random.int_range",
            RandomSpec::FloatRange { .. } => "random.float_range",
            RandomSpec::Bool { .. } => "random.bool",
            RandomSpec::Text { .. } => "random.text",
            RandomSpec::Choice { .. } => "random.choice",
            RandomSpec::Uuid => "random.uuid",
            RandomSpec::DateRange { .. } => "random.date_range",
        }
    }
}

fn default_one() -> i64 {
    1
}

fn default_one_usize() -> usize {
    1
}

fn default_day_seconds() -> i64 {
    86_400
}

fn default_probability() -> f64 {
    0.5
}
