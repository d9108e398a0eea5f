use std::collections::HashMap;
use std::fmt;

use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;

/// A single literal from a dump `VALUES` tuple.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Integer(i64),
    Decimal(BigDecimal),
    Text(String),
    Null,
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Integer(v) => write!(f, "{v}"),
            SqlValue::Decimal(v) => write!(f, "{v}"),
            SqlValue::Text(v) => write!(f, "'{v}'"),
            SqlValue::Null => f.write_str("NULL"),
        }
    }
}

/// Errors raised while reading a typed field out of a [`LegacyRow`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("missing required field `{0}`")]
    Missing(&'static str),

    #[error("field `{field}` has unusable value {value}")]
    Invalid { field: &'static str, value: String },
}

/// One legacy row keyed by canonical field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegacyRow {
    fields: HashMap<String, SqlValue>,
}

impl LegacyRow {
    pub fn new(fields: HashMap<String, SqlValue>) -> Self {
        Self { fields }
    }

    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, SqlValue)>,
        K: Into<String>,
    {
        Self {
            fields: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&SqlValue> {
        self.fields.get(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Present, non-null, non-blank value.
    fn value(&self, field: &str) -> Option<&SqlValue> {
        match self.fields.get(field) {
            None | Some(SqlValue::Null) => None,
            Some(SqlValue::Text(s)) if s.trim().is_empty() => None,
            Some(value) => Some(value),
        }
    }

    fn invalid(field: &'static str, value: &SqlValue) -> FieldError {
        FieldError::Invalid {
            field,
            value: value.to_string(),
        }
    }

    pub fn int(&self, field: &'static str) -> Result<Option<i64>, FieldError> {
        let Some(value) = self.value(field) else {
            return Ok(None);
        };
        match value {
            SqlValue::Integer(v) => Ok(Some(*v)),
            SqlValue::Decimal(d) if d.is_integer() => d
                .to_i64()
                .map(Some)
                .ok_or_else(|| Self::invalid(field, value)),
            SqlValue::Text(s) => s
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| Self::invalid(field, value)),
            _ => Err(Self::invalid(field, value)),
        }
    }

    pub fn required_int(&self, field: &'static str) -> Result<i64, FieldError> {
        self.int(field)?.ok_or(FieldError::Missing(field))
    }

    /// Narrowing variant of [`LegacyRow::int`] for 32-bit columns.
    pub fn int32(&self, field: &'static str) -> Result<Option<i32>, FieldError> {
        match self.int(field)? {
            Some(v) => i32::try_from(v).map(Some).map_err(|_| FieldError::Invalid {
                field,
                value: v.to_string(),
            }),
            None => Ok(None),
        }
    }

    /// Trimmed text; numbers are rendered with their literal spelling.
    pub fn text(&self, field: &str) -> Option<String> {
        match self.value(field)? {
            SqlValue::Text(s) => Some(s.trim().to_string()),
            SqlValue::Integer(v) => Some(v.to_string()),
            SqlValue::Decimal(d) => Some(d.to_string()),
            SqlValue::Null => None,
        }
    }

    /// Legacy boolean flag. Absent and NULL read as `false`.
    pub fn flag(&self, field: &'static str) -> Result<bool, FieldError> {
        let Some(value) = self.value(field) else {
            return Ok(false);
        };
        match value {
            SqlValue::Integer(v) => Ok(*v != 0),
            SqlValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "y" | "yes" | "t" | "true" => Ok(true),
                "0" | "n" | "no" | "f" | "false" => Ok(false),
                _ => Err(Self::invalid(field, value)),
            },
            _ => Err(Self::invalid(field, value)),
        }
    }

    /// Legacy timestamp. MySQL zero-dates read as `None`.
    pub fn timestamp(&self, field: &'static str) -> Result<Option<NaiveDateTime>, FieldError> {
        let Some(value) = self.value(field) else {
            return Ok(None);
        };
        match value {
            SqlValue::Integer(secs) => DateTime::from_timestamp(*secs, 0)
                .map(|dt| Some(dt.naive_utc()))
                .ok_or_else(|| Self::invalid(field, value)),
            SqlValue::Text(s) => {
                let s = s.trim();
                if s.starts_with("0000-00-00") {
                    return Ok(None);
                }
                NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                    .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
                    .or_else(|_| {
                        NaiveDate::parse_from_str(s, "%Y-%m-%d")
                            .map(|d| d.and_time(chrono::NaiveTime::MIN))
                    })
                    .map(Some)
                    .map_err(|_| Self::invalid(field, value))
            }
            _ => Err(Self::invalid(field, value)),
        }
    }
}
