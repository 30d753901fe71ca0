use super::{Entity, PropertyDescriptor, PropertyEntry};
use crate::core::Value;
use log::warn;
use std::collections::HashMap;

/// Compiled getters and setters for every property of one entity type.
///
/// Immutable after [`AccessorTable::build`]; shared through `Arc` by the
/// [`AccessorRegistry`](super::AccessorRegistry).
pub struct AccessorTable<T> {
    type_name: &'static str,
    entries: Vec<PropertyEntry<T>>,
    by_name: HashMap<&'static str, usize>,
}

impl<T: Entity> AccessorTable<T> {
    /// Introspects `T` and compiles its accessor table.
    ///
    /// A spec whose name repeats an earlier one is ignored.
    pub fn build() -> Self {
        let mut entries = Vec::new();
        let mut by_name = HashMap::new();

        for spec in T::properties() {
            if by_name.contains_key(spec.name) {
                warn!(
                    "ignoring duplicate property '{}' on '{}'",
                    spec.name,
                    T::type_name()
                );
                continue;
            }
            let index = entries.len();
            by_name.insert(spec.name, index);
            entries.push(PropertyEntry::from_spec(index, spec));
        }

        Self {
            type_name: T::type_name(),
            entries,
            by_name,
        }
    }
}

impl<T> AccessorTable<T> {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.entries.iter().map(PropertyEntry::descriptor)
    }

    pub fn entries(&self) -> &[PropertyEntry<T>] {
        &self.entries
    }

    /// Entry for a descriptor of this table. Descriptors from another table
    /// (index out of range or a different name) resolve to `None`.
    pub fn entry(&self, descriptor: &PropertyDescriptor) -> Option<&PropertyEntry<T>> {
        self.entries
            .get(descriptor.index())
            .filter(|entry| entry.descriptor().name() == descriptor.name())
    }

    pub(crate) fn entry_at(&self, index: usize) -> Option<&PropertyEntry<T>> {
        self.entries.get(index)
    }

    pub fn find(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.by_name
            .get(name)
            .map(|index| self.entries[*index].descriptor())
    }

    pub fn read(&self, entity: &T, descriptor: &PropertyDescriptor) -> Option<Value> {
        self.entry(descriptor).map(|entry| entry.get(entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DataType, Value};
    use crate::meta::PropertySpec;

    #[derive(Default)]
    struct Point {
        x: i64,
        y: i64,
    }

    impl Entity for Point {
        fn properties() -> Vec<PropertySpec<Self>> {
            vec![
                PropertySpec::read_write(
                    "x",
                    DataType::Integer,
                    |p: &Point| Value::Integer(p.x),
                    |p: &mut Point, v| {
                        p.x = v.as_i64().unwrap_or_default();
                        Ok(())
                    },
                ),
                PropertySpec::read_only("y", DataType::Integer, |p: &Point| Value::Integer(p.y)),
                PropertySpec::read_only("x", DataType::Integer, |_: &Point| Value::Null),
            ]
        }
    }

    #[test]
    fn test_build_skips_duplicate_names() {
        let table = AccessorTable::<Point>::build();
        assert_eq!(table.len(), 2);
        assert!(table.find("x").unwrap().is_writable());
        assert!(!table.find("y").unwrap().is_writable());
        assert!(table.find("z").is_none());
    }

    #[test]
    fn test_read_through_descriptor() {
        let table = AccessorTable::<Point>::build();
        let point = Point { x: 3, y: 4 };
        let y = table.find("y").unwrap().clone();
        assert_eq!(table.read(&point, &y), Some(Value::Integer(4)));
    }

    #[derive(Default)]
    struct Empty;

    impl Entity for Empty {
        fn properties() -> Vec<PropertySpec<Self>> {
            Vec::new()
        }
    }

    #[test]
    fn test_zero_properties_is_not_an_error() {
        let table = AccessorTable::<Empty>::build();
        assert!(table.is_empty());
        assert_eq!(table.descriptors().count(), 0);
    }
}
