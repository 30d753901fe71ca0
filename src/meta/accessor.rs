use super::PropertyDescriptor;
use crate::core::{DataType, PropertyValue, Result, Value};

/// Compiled read accessor for one property.
pub type PropertyGetter<T> = fn(&T) -> Value;

/// Compiled write accessor for one property.
pub type PropertySetter<T> = fn(&mut T, Value) -> Result<()>;

/// Full conversion check run before a value is staged.
pub type PropertyCheck = fn(&Value) -> Result<()>;

fn check_value<V: PropertyValue>(value: &Value) -> Result<()> {
    V::from_value(value.clone()).map(|_| ())
}

/// Introspection output for one property, as declared by an
/// [`Entity`](super::Entity) implementation.
///
/// Usually produced by `#[derive(Entity)]`; hand-written implementations
/// build them with [`PropertySpec::read_write`] or [`PropertySpec::read_only`].
pub struct PropertySpec<T> {
    pub(crate) name: &'static str,
    pub(crate) data_type: DataType,
    pub(crate) nullable: bool,
    pub(crate) getter: PropertyGetter<T>,
    pub(crate) setter: Option<PropertySetter<T>>,
    pub(crate) check: Option<PropertyCheck>,
}

impl<T> PropertySpec<T> {
    pub fn read_write(
        name: &'static str,
        data_type: DataType,
        getter: PropertyGetter<T>,
        setter: PropertySetter<T>,
    ) -> Self {
        Self {
            name,
            data_type,
            nullable: false,
            getter,
            setter: Some(setter),
            check: None,
        }
    }

    pub fn read_only(name: &'static str, data_type: DataType, getter: PropertyGetter<T>) -> Self {
        Self {
            name,
            data_type,
            nullable: false,
            getter,
            setter: None,
            check: None,
        }
    }

    /// Read-only spec whose type information comes from a [`PropertyValue`].
    pub fn typed<V: PropertyValue>(name: &'static str, getter: PropertyGetter<T>) -> Self {
        Self {
            name,
            data_type: V::data_type(),
            nullable: V::nullable(),
            getter,
            setter: None,
            check: Some(check_value::<V>),
        }
    }

    pub fn with_setter(mut self, setter: PropertySetter<T>) -> Self {
        self.setter = Some(setter);
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn with_check(mut self, check: PropertyCheck) -> Self {
        self.check = Some(check);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// One row of an accessor table: a descriptor with its compiled accessors.
pub struct PropertyEntry<T> {
    descriptor: PropertyDescriptor,
    getter: PropertyGetter<T>,
    setter: Option<PropertySetter<T>>,
    check: Option<PropertyCheck>,
}

impl<T> PropertyEntry<T> {
    pub(crate) fn from_spec(index: usize, spec: PropertySpec<T>) -> Self {
        let descriptor = PropertyDescriptor::new(
            index,
            spec.name,
            spec.data_type,
            spec.nullable,
            spec.setter.is_some(),
        );
        Self {
            descriptor,
            getter: spec.getter,
            setter: spec.setter,
            check: spec.check,
        }
    }

    pub fn descriptor(&self) -> &PropertyDescriptor {
        &self.descriptor
    }

    pub fn get(&self, entity: &T) -> Value {
        (self.getter)(entity)
    }

    /// Applies `value` through the setter. Returns `Ok(false)` when the
    /// property has no setter.
    pub fn set(&self, entity: &mut T, value: Value) -> Result<bool> {
        match self.setter {
            Some(setter) => {
                setter(entity, value)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Descriptor-level validation followed by the typed conversion check.
    pub fn validate(&self, value: &Value) -> Result<()> {
        self.descriptor.validate(value)?;
        if let Some(check) = self.check {
            check(value)?;
        }
        Ok(())
    }
}
