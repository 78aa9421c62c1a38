//! The coercion policy shared by cells, pins and convert nodes.
//!
//! Same-type values pass through untouched, numeric values are cast between each other
//! (narrowing truncates toward zero) and everything else is formatted as text and parsed
//! into the target type. Coercion never fails: unparseable input becomes the zero value.

use super::{Color, Value, ValueType};
use std::str::FromStr;

/// A Rust type that maps onto exactly one [`ValueType`].
pub trait ValueKind: Sized + Clone {
    const VALUE_TYPE: ValueType;

    fn into_value(self) -> Value;

    /// Strict view: `None` unless the value already is of this kind.
    fn from_value(value: &Value) -> Option<Self>;

    /// Lenient view following the coercion policy. `None` coerces to the zero value.
    fn coerce(value: Option<&Value>) -> Self;

    fn zero() -> Self;
}

fn parse_or<T: FromStr>(value: &Value, fallback: T) -> T {
    value.to_string().trim().parse().unwrap_or(fallback)
}

macro_rules! numeric_kind {
    ($ty:ty, $variant:ident, $zero:expr) => {
        impl ValueKind for $ty {
            const VALUE_TYPE: ValueType = ValueType::$variant;

            fn into_value(self) -> Value {
                Value::$variant(self)
            }

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(*v),
                    _ => None,
                }
            }

            fn coerce(value: Option<&Value>) -> Self {
                match value {
                    Some(Value::Integer(v)) => *v as $ty,
                    Some(Value::Float(v)) => *v as $ty,
                    Some(Value::Double(v)) => *v as $ty,
                    Some(other) => parse_or(other, $zero),
                    None => $zero,
                }
            }

            fn zero() -> Self {
                $zero
            }
        }
    };
}

numeric_kind!(i32, Integer, 0);
numeric_kind!(f32, Float, 0.0);
numeric_kind!(f64, Double, 0.0);

impl ValueKind for bool {
    const VALUE_TYPE: ValueType = ValueType::Bool;

    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn coerce(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Bool(b)) => *b,
            Some(other) => parse_or(other, String::new()).eq_ignore_ascii_case("true"),
            None => false,
        }
    }

    fn zero() -> Self {
        false
    }
}

impl ValueKind for String {
    const VALUE_TYPE: ValueType = ValueType::String;

    fn into_value(self) -> Value {
        Value::String(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    fn coerce(value: Option<&Value>) -> Self {
        value.map(|v| v.to_string()).unwrap_or_default()
    }

    fn zero() -> Self {
        String::new()
    }
}

impl ValueKind for Color {
    const VALUE_TYPE: ValueType = ValueType::Color;

    fn into_value(self) -> Value {
        Value::Color(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Color(c) => Some(*c),
            _ => None,
        }
    }

    fn coerce(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Color(c)) => *c,
            Some(other) => parse_or(other, Color::default()),
            None => Color::default(),
        }
    }

    fn zero() -> Self {
        Color::default()
    }
}

impl ValueKind for Vec<Value> {
    const VALUE_TYPE: ValueType = ValueType::List;

    fn into_value(self) -> Value {
        Value::List(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::List(items) => Some(items.clone()),
            _ => None,
        }
    }

    fn coerce(value: Option<&Value>) -> Self {
        match value {
            Some(Value::List(items)) => items.clone(),
            _ => Vec::new(),
        }
    }

    fn zero() -> Self {
        Vec::new()
    }
}

/// Coerces a runtime value into a runtime type.
///
/// An empty source stays empty; `Any` passes the value through unchanged.
pub fn coerce_to(value: Option<&Value>, target: ValueType) -> Option<Value> {
    let value = value?;
    if target.accepts(value.value_type()) {
        return Some(value.clone());
    }
    let coerced = match target {
        ValueType::Any => value.clone(),
        ValueType::Bool => bool::coerce(Some(value)).into_value(),
        ValueType::Integer => i32::coerce(Some(value)).into_value(),
        ValueType::Float => f32::coerce(Some(value)).into_value(),
        ValueType::Double => f64::coerce(Some(value)).into_value(),
        ValueType::String => String::coerce(Some(value)).into_value(),
        ValueType::Color => Color::coerce(Some(value)).into_value(),
        ValueType::List => Vec::<Value>::coerce(Some(value)).into_value(),
    };
    Some(coerced)
}
