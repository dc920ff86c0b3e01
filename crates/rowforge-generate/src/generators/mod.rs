//! Value functions for every generator variant plus the type-based fallback
//! used by columns without a bound generator.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rand::{Rng, RngCore};

use rowforge_core::{Column, GeneratorSpec, RandomSpec, Value};

use crate::errors::GenerationError;

const DEFAULT_CHARSET: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const FALLBACK_INT_MAX: i64 = 100_000;
const FALLBACK_FLOAT_MAX: f64 = 100_000.0;
const FALLBACK_DAY_SPAN: i64 = 365;

/// Produce the value of `column` for sequence number `n`.
///
/// Bound generators win; otherwise nullable columns yield `Null` and the rest
/// fall back to a value derived from the column type.
pub fn produce_for_column(
    column: &Column,
    n: u64,
    rng: &mut dyn RngCore,
) -> Result<Value, GenerationError> {
    match &column.generator {
        Some(spec) => produce(spec, n, rng),
        None if column.is_nullable => Ok(Value::Null),
        None => fallback_for_type(column, rng),
    }
}

/// Produce a value from a generator for sequence number `n`.
///
/// Copy-from-column generators have no value function: the row producer
/// resolves them to an existing handle instead.
pub fn produce(
    spec: &GeneratorSpec,
    n: u64,
    rng: &mut dyn RngCore,
) -> Result<Value, GenerationError> {
    match spec {
        GeneratorSpec::Constant { value } => Ok(value.clone()),
        GeneratorSpec::Counter { start, step } => {
            let value = offset(n)
                .checked_mul(*step)
                .and_then(|delta| start.checked_add(delta))
                .ok_or_else(|| overflow("counter", n))?;
            Ok(Value::Int(value))
        }
        GeneratorSpec::Random { distribution } => produce_random(distribution, rng),
        GeneratorSpec::DateStatic { value } => Ok(Value::Timestamp(*value)),
        GeneratorSpec::DateIncrementing {
            start,
            step_seconds,
        } => {
            let value = offset(n)
                .checked_mul(*step_seconds)
                .and_then(Duration::try_seconds)
                .and_then(|delta| start.checked_add_signed(delta))
                .ok_or_else(|| overflow("date.incrementing", n))?;
            Ok(Value::Timestamp(value))
        }
        GeneratorSpec::CopyFromColumn { .. } => Err(GenerationError::Unsupported(
            "copy_from_column has no value function".to_string(),
        )),
    }
}

fn produce_random(spec: &RandomSpec, rng: &mut dyn RngCore) -> Result<Value, GenerationError> {
    match spec {
        RandomSpec::IntRange { min, max } => {
            if min > max {
                return Err(invalid("random.int_range min must be <= max"));
            }
            Ok(Value::Int(rng.random_range(*min..=*max)))
        }
        RandomSpec::FloatRange { min, max, scale } => {
            if min.is_nan() || max.is_nan() || min > max {
                return Err(invalid("random.float_range min must be <= max"));
            }
            let value = if min == max {
                *min
            } else {
                rng.random_range(*min..=*max)
            };
            Ok(Value::Float(round_to_scale(value, *scale)))
        }
        RandomSpec::Bool { probability } => {
            if !(0.0..=1.0).contains(probability) {
                return Err(invalid("random.bool probability must be within 0..=1"));
            }
            Ok(Value::Bool(rng.random_bool(*probability)))
        }
        RandomSpec::Text {
            min_len,
            max_len,
            charset,
        } => {
            if min_len > max_len {
                return Err(invalid("random.text min_len must be <= max_len"));
            }
            let charset: Vec<char> = charset
                .as_deref()
                .unwrap_or(DEFAULT_CHARSET)
                .chars()
                .collect();
            if charset.is_empty() {
                return Err(invalid("random.text charset must not be empty"));
            }
            let len = rng.random_range(*min_len..=*max_len);
            let text = (0..len)
                .map(|_| charset[rng.random_range(0..charset.len())])
                .collect();
            Ok(Value::Text(text))
        }
        RandomSpec::Choice { values } => {
            if values.is_empty() {
                return Err(invalid("random.choice requires at least one value"));
            }
            Ok(values[rng.random_range(0..values.len())].clone())
        }
        RandomSpec::Uuid => Ok(Value::Uuid(random_uuid(rng))),
        RandomSpec::DateRange { min, max } => {
            if min > max {
                return Err(invalid("random.date_range min must be <= max"));
            }
            let span = (*max - *min).num_days();
            let days = rng.random_range(0..=span);
            Ok(Value::Date(*min + Duration::days(days)))
        }
    }
}

fn fallback_for_type(column: &Column, rng: &mut dyn RngCore) -> Result<Value, GenerationError> {
    let base_date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
    let data_type = column.column_type.base_name();

    let value = match data_type.as_str() {
        "uuid" | "uniqueidentifier" => Value::Uuid(random_uuid(rng)),
        "smallint" | "integer" | "int" | "int2" | "int4" | "int8" | "bigint" | "tinyint" => {
            Value::Int(rng.random_range(1..=FALLBACK_INT_MAX))
        }
        "numeric" | "decimal" | "money" => match column.column_type.numeric_scale {
            Some(scale) if scale > 0 => {
                let value = rng.random_range(0.0..=FALLBACK_FLOAT_MAX);
                Value::Float(round_to_scale(value, Some(scale as u32)))
            }
            _ => Value::Int(rng.random_range(1..=FALLBACK_INT_MAX)),
        },
        "real" | "float" | "float4" | "float8" | "double precision" => {
            let value = rng.random_range(0.0..=FALLBACK_FLOAT_MAX);
            Value::Float(round_to_scale(value, Some(2)))
        }
        "boolean" | "bool" | "bit" => Value::Bool(rng.random_bool(0.5)),
        "date" => Value::Date(base_date + Duration::days(rng.random_range(0..=FALLBACK_DAY_SPAN))),
        name if name.starts_with("timestamp") || name.starts_with("datetime") => {
            let date = base_date + Duration::days(rng.random_range(0..=FALLBACK_DAY_SPAN));
            let seconds = rng.random_range(0..86_400u32);
            let time =
                NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0).unwrap_or_default();
            Value::Timestamp(NaiveDateTime::new(date, time))
        }
        _ => {
            let mut value = format!("{}_{}", column.name, rng.random::<u32>());
            if let Some(max_len) = column.column_type.character_max_length {
                value.truncate(max_len.max(0) as usize);
            }
            Value::Text(value)
        }
    };

    Ok(value)
}

fn random_uuid(rng: &mut dyn RngCore) -> uuid::Uuid {
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    uuid::Builder::from_random_bytes(bytes).into_uuid()
}

fn round_to_scale(value: f64, scale: Option<u32>) -> f64 {
    match scale {
        Some(scale) => {
            let factor = 10f64.powi(scale as i32);
            (value * factor).round() / factor
        }
        None => value,
    }
}

fn offset(n: u64) -> i64 {
    i64::try_from(n.saturating_sub(1)).unwrap_or(i64::MAX)
}

fn invalid(message: &str) -> GenerationError {
    GenerationError::InvalidGenerator(message.to_string())
}

fn overflow(id: &str, n: u64) -> GenerationError {
    GenerationError::InvalidGenerator(format!("{id} overflowed at sequence number {n}"))
}
