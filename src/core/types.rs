use super::{EditError, Result, Value};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Integer,
    Float,
    Text,
    Boolean,
    Uuid,
    Timestamp,
    Date,
}

impl DataType {
    pub fn is_compatible(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (Self::Integer, Value::Integer(_)) => true,
            (Self::Float, Value::Float(_)) => true,
            (Self::Float, Value::Integer(_)) => true, // Integer -> Float is lossless enough
            (Self::Text, Value::Text(_)) => true,
            (Self::Boolean, Value::Boolean(_)) => true,
            (Self::Uuid, Value::Uuid(_)) => true,
            (Self::Timestamp, Value::Timestamp(_)) => true,
            (Self::Date, Value::Date(_)) => true,
            _ => false,
        }
    }

    /// Parses user input (e.g. a CLI argument) into a value of this type.
    /// The literal `null` (any case) yields [`Value::Null`].
    pub fn parse_value(&self, raw: &str) -> Result<Value> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("null") {
            return Ok(Value::Null);
        }

        let invalid = |reason: String| {
            EditError::TypeMismatch(format!("cannot parse '{}' as {}: {}", trimmed, self, reason))
        };

        match self {
            Self::Integer => trimmed
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|err| invalid(err.to_string())),
            Self::Float => trimmed
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|err| invalid(err.to_string())),
            Self::Text => Ok(Value::Text(raw.to_string())),
            Self::Boolean => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(Value::Boolean(true)),
                "false" | "no" | "0" => Ok(Value::Boolean(false)),
                _ => Err(invalid("expected true or false".to_string())),
            },
            Self::Uuid => Uuid::parse_str(trimmed)
                .map(Value::Uuid)
                .map_err(|err| invalid(err.to_string())),
            Self::Timestamp => DateTime::parse_from_rfc3339(trimmed)
                .map(|ts| Value::Timestamp(ts.with_timezone(&Utc)))
                .map_err(|err| invalid(err.to_string())),
            Self::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .map(Value::Date)
                .map_err(|err| invalid(err.to_string())),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => write!(f, "INTEGER"),
            Self::Float => write!(f, "FLOAT"),
            Self::Text => write!(f, "TEXT"),
            Self::Boolean => write!(f, "BOOLEAN"),
            Self::Uuid => write!(f, "UUID"),
            Self::Timestamp => write!(f, "TIMESTAMP"),
            Self::Date => write!(f, "DATE"),
        }
    }
}

/// Conversion between a Rust field type and [`Value`].
///
/// Implemented for the field types `#[derive(Entity)]` understands. A
/// conversion failure is reported as [`EditError::TypeMismatch`].
pub trait PropertyValue: Sized {
    fn data_type() -> DataType;

    fn nullable() -> bool {
        false
    }

    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> Result<Self>;
}

fn mismatch(expected: DataType, value: &Value) -> EditError {
    EditError::TypeMismatch(format!(
        "expected {}, got {}",
        expected,
        value.type_name()
    ))
}

macro_rules! integer_property_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl PropertyValue for $ty {
                fn data_type() -> DataType {
                    DataType::Integer
                }

                fn to_value(&self) -> Value {
                    Value::Integer(i64::from(*self))
                }

                fn from_value(value: Value) -> Result<Self> {
                    match value {
                        Value::Integer(v) => <$ty>::try_from(v).map_err(|_| {
                            EditError::TypeMismatch(format!(
                                "value {} out of range for {}",
                                v,
                                stringify!($ty)
                            ))
                        }),
                        other => Err(mismatch(DataType::Integer, &other)),
                    }
                }
            }
        )*
    };
}

// Only types that widen losslessly into i64. `u64` and `usize` are left out
// because values above i64::MAX have no INTEGER representation.
integer_property_value!(i64, i32, i16, u32);

impl PropertyValue for f64 {
    fn data_type() -> DataType {
        DataType::Float
    }

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    fn from_value(value: Value) -> Result<Self> {
        value
            .as_f64()
            .ok_or_else(|| mismatch(DataType::Float, &value))
    }
}

impl PropertyValue for f32 {
    fn data_type() -> DataType {
        DataType::Float
    }

    fn to_value(&self) -> Value {
        Value::Float(*self as f64)
    }

    fn from_value(value: Value) -> Result<Self> {
        value
            .as_f64()
            .map(|v| v as f32)
            .ok_or_else(|| mismatch(DataType::Float, &value))
    }
}

impl PropertyValue for bool {
    fn data_type() -> DataType {
        DataType::Boolean
    }

    fn to_value(&self) -> Value {
        Value::Boolean(*self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(b) => Ok(b),
            other => Err(mismatch(DataType::Boolean, &other)),
        }
    }
}

impl PropertyValue for String {
    fn data_type() -> DataType {
        DataType::Text
    }

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(mismatch(DataType::Text, &other)),
        }
    }
}

impl PropertyValue for Uuid {
    fn data_type() -> DataType {
        DataType::Uuid
    }

    fn to_value(&self) -> Value {
        Value::Uuid(*self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Uuid(id) => Ok(id),
            other => Err(mismatch(DataType::Uuid, &other)),
        }
    }
}

impl PropertyValue for DateTime<Utc> {
    fn data_type() -> DataType {
        DataType::Timestamp
    }

    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Timestamp(ts) => Ok(ts),
            other => Err(mismatch(DataType::Timestamp, &other)),
        }
    }
}

impl PropertyValue for NaiveDate {
    fn data_type() -> DataType {
        DataType::Date
    }

    fn to_value(&self) -> Value {
        Value::Date(*self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Date(date) => Ok(date),
            other => Err(mismatch(DataType::Date, &other)),
        }
    }
}

impl<T: PropertyValue> PropertyValue for Option<T> {
    fn data_type() -> DataType {
        T::data_type()
    }

    fn nullable() -> bool {
        true
    }

    fn to_value(&self) -> Value {
        match self {
            Some(value) => value.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_compatibility() {
        let int_type = DataType::Integer;
        assert!(int_type.is_compatible(&Value::Integer(42)));
        assert!(int_type.is_compatible(&Value::Null));
        assert!(!int_type.is_compatible(&Value::Text("hello".into())));
        assert!(DataType::Float.is_compatible(&Value::Integer(1)));
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(DataType::Integer.parse_value(" 42 ").unwrap(), Value::Integer(42));
        assert_eq!(DataType::Boolean.parse_value("yes").unwrap(), Value::Boolean(true));
        assert_eq!(DataType::Text.parse_value("NULL").unwrap(), Value::Null);
        assert_eq!(
            DataType::Date.parse_value("2024-02-29").unwrap(),
            Value::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
        );
        assert!(matches!(
            DataType::Integer.parse_value("forty"),
            Err(EditError::TypeMismatch(_))
        ));
        assert!(DataType::Uuid.parse_value("not-a-uuid").is_err());
    }

    #[test]
    fn test_integer_range_checks() {
        assert_eq!(u32::from_value(Value::Integer(7)).unwrap(), 7);
        assert!(matches!(
            u32::from_value(Value::Integer(-1)),
            Err(EditError::TypeMismatch(_))
        ));
        assert!(i32::from_value(Value::Text("1".into())).is_err());
    }

    #[test]
    fn test_unsigned_values_stay_integers() {
        let value = u32::MAX.to_value();
        assert_eq!(value, Value::Integer(u32::MAX as i64));
        assert!(u32::data_type().is_compatible(&value));
        assert_eq!(u32::from_value(value).unwrap(), u32::MAX);
        assert_eq!(i16::MIN.to_value(), Value::Integer(i16::MIN as i64));
    }

    #[test]
    fn test_option_round_trip() {
        assert_eq!(Option::<String>::from_value(Value::Null).unwrap(), None);
        assert_eq!(
            Option::<i64>::from_value(Value::Integer(3)).unwrap(),
            Some(3)
        );
        assert!(Option::<i64>::nullable());
        assert!(!i64::nullable());
        assert_eq!(Some(2.5f64).to_value(), Value::Float(2.5));
    }

    #[test]
    fn test_float_accepts_integer() {
        assert_eq!(f64::from_value(Value::Integer(4)).unwrap(), 4.0);
        assert!(bool::from_value(Value::Integer(1)).is_err());
    }
}
