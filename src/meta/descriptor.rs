use crate::core::{DataType, EditError, Result, Value};
use std::fmt;

/// Stable identity of one named, typed property of an entity type.
///
/// The `index` is the declaration position inside the owning
/// [`AccessorTable`](super::AccessorTable) and never changes once the table
/// is built. Properties are always readable; `writable` is false for
/// read-only properties.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyDescriptor {
    index: usize,
    name: &'static str,
    data_type: DataType,
    nullable: bool,
    writable: bool,
}

impl PropertyDescriptor {
    pub(crate) fn new(
        index: usize,
        name: &'static str,
        data_type: DataType,
        nullable: bool,
        writable: bool,
    ) -> Self {
        Self {
            index,
            name,
            data_type,
            nullable,
            writable,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_readable(&self) -> bool {
        true
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// Checks nullability and type compatibility of a candidate value.
    pub fn validate(&self, value: &Value) -> Result<()> {
        if value.is_null() {
            if !self.nullable {
                return Err(EditError::ConstraintViolation(format!(
                    "Property '{}' cannot be NULL",
                    self.name
                )));
            }
            return Ok(());
        }

        if !self.data_type.is_compatible(value) {
            return Err(EditError::TypeMismatch(format!(
                "Property '{}' expects type {}, got {}",
                self.name,
                self.data_type,
                value.type_name()
            )));
        }

        Ok(())
    }
}

impl fmt::Display for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.data_type)?;
        if !self.nullable {
            write!(f, " NOT NULL")?;
        }
        if !self.writable {
            write!(f, " READONLY")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_null_on_required_property() {
        let descriptor = PropertyDescriptor::new(0, "age", DataType::Integer, false, true);
        assert!(matches!(
            descriptor.validate(&Value::Null),
            Err(EditError::ConstraintViolation(_))
        ));
        assert!(descriptor.validate(&Value::Integer(3)).is_ok());
        assert!(matches!(
            descriptor.validate(&Value::Text("x".into())),
            Err(EditError::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_display() {
        let descriptor = PropertyDescriptor::new(1, "nickname", DataType::Text, true, false);
        assert_eq!(descriptor.to_string(), "nickname TEXT READONLY");
    }
}
