use super::{ValueKind, ValueType, coerce_to, Value};
use crate::error::ValueError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A type-erased container holding at most one value plus the type it was declared with.
///
/// A non-empty cell always holds a value its declared type accepts. Strict accessors
/// report a [`ValueError::TypeMismatch`]; the coercing ones never fail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedValueCell {
    declared_type: ValueType,
    value: Option<Value>,
}

impl TypedValueCell {
    /// Creates an empty cell.
    pub fn new(declared_type: ValueType) -> Self {
        Self {
            declared_type,
            value: None,
        }
    }

    /// Creates a cell holding the zero value of its declared type.
    pub fn zeroed(declared_type: ValueType) -> Self {
        Self {
            declared_type,
            value: declared_type.zero_value(),
        }
    }

    /// Creates a cell declared as the value's own type.
    pub fn of<T: ValueKind>(value: T) -> Self {
        Self {
            declared_type: T::VALUE_TYPE,
            value: Some(value.into_value()),
        }
    }

    pub fn with_value(declared_type: ValueType, value: Value) -> Result<Self, ValueError> {
        let mut cell = Self::new(declared_type);
        cell.set_value(value)?;
        Ok(cell)
    }

    pub fn declared_type(&self) -> ValueType {
        self.declared_type
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    pub fn clear(&mut self) {
        self.value = None;
    }

    pub fn set<T: ValueKind>(&mut self, value: T) -> Result<(), ValueError> {
        self.check(T::VALUE_TYPE)?;
        self.value = Some(value.into_value());
        Ok(())
    }

    pub fn set_value(&mut self, value: Value) -> Result<(), ValueError> {
        self.check(value.value_type())?;
        self.value = Some(value);
        Ok(())
    }

    /// Stores `value` after coercing it into the declared type. An empty source empties the cell.
    pub fn set_coerced(&mut self, value: Option<&Value>) {
        self.value = coerce_to(value, self.declared_type);
    }

    /// Reads the value as `T`, `Ok(None)` if the cell is empty.
    pub fn get<T: ValueKind>(&self) -> Result<Option<T>, ValueError> {
        match &self.value {
            None => Ok(None),
            Some(value) => T::from_value(value).map(Some).ok_or(ValueError::TypeMismatch {
                expected: T::VALUE_TYPE,
                found: value.value_type(),
            }),
        }
    }

    pub fn get_coerced<T: ValueKind>(&self) -> T {
        T::coerce(self.value.as_ref())
    }

    fn check(&self, source: ValueType) -> Result<(), ValueError> {
        if self.declared_type.accepts(source) {
            Ok(())
        } else {
            Err(ValueError::TypeMismatch {
                expected: self.declared_type,
                found: source,
            })
        }
    }
}

impl fmt::Display for TypedValueCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{} ({})", value, self.declared_type),
            None => write!(f, "null ({})", self.declared_type),
        }
    }
}
