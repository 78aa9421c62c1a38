use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The declared type of a pin, cell or data model property.
///
/// `Any` is only ever a declared type: it accepts a value of every other kind and is used
/// for generic inputs such as the input pin of a convert node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Any,
    Bool,
    Integer,
    Float,
    Double,
    String,
    Color,
    List,
}

impl ValueType {
    pub fn is_numeric(self) -> bool {
        matches!(self, ValueType::Integer | ValueType::Float | ValueType::Double)
    }

    /// Whether a value of type `source` can be stored as-is in a cell declared as `self`.
    pub fn accepts(self, source: ValueType) -> bool {
        self == ValueType::Any || self == source
    }

    /// Whether an output of type `source` may feed an input declared as `self`.
    ///
    /// Anything that is not directly assignable goes through the coercion policy when the
    /// value crosses the connection.
    pub fn can_connect_from(self, source: ValueType) -> bool {
        source == ValueType::Any
            || self.accepts(source)
            || (self.is_numeric() && source.is_numeric())
            || self == ValueType::String
    }

    /// The zero value of this type, `None` for `Any`.
    pub fn zero_value(self) -> Option<Value> {
        match self {
            ValueType::Any => None,
            ValueType::Bool => Some(Value::Bool(false)),
            ValueType::Integer => Some(Value::Integer(0)),
            ValueType::Float => Some(Value::Float(0.0)),
            ValueType::Double => Some(Value::Double(0.0)),
            ValueType::String => Some(Value::String(String::new())),
            ValueType::Color => Some(Value::Color(Color::default())),
            ValueType::List => Some(Value::List(Vec::new())),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Any => "Any",
            ValueType::Bool => "Bool",
            ValueType::Integer => "Integer",
            ValueType::Float => "Float",
            ValueType::Double => "Double",
            ValueType::String => "String",
            ValueType::Color => "Color",
            ValueType::List => "List",
        };
        write!(f, "{}", name)
    }
}

/// An RGBA color as used by layer brushes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.a, self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = ();

    /// Parses `#rrggbb` or `#aarrggbb`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2).ok_or(())?, 16).map_err(|_| ());
        match hex.len() {
            6 => Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Ok(Color::rgba(channel(2)?, channel(4)?, channel(6)?, channel(0)?)),
            _ => Err(()),
        }
    }
}

/// A runtime value flowing through pins, cells and data model properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    Bool(bool),
    Integer(i32),
    Float(f32),
    Double(f64),
    String(String),
    Color(Color),
    List(Vec<Value>),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Bool(_) => ValueType::Bool,
            Value::Integer(_) => ValueType::Integer,
            Value::Float(_) => ValueType::Float,
            Value::Double(_) => ValueType::Double,
            Value::String(_) => ValueType::String,
            Value::Color(_) => ValueType::Color,
            Value::List(_) => ValueType::List,
        }
    }

    /// Widens any numeric value to `f64`; `None` for non-numeric values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f as f64),
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Whole numbers print without a fraction; everything else prints the shortest text that
/// round-trips in the value's own width.
fn fmt_real<T: fmt::Display + Into<f64> + Copy>(f: &mut fmt::Formatter<'_>, n: T) -> fmt::Result {
    let wide: f64 = n.into();
    if wide.is_finite() && wide.fract() == 0.0 && wide.abs() < i64::MAX as f64 {
        write!(f, "{}", wide as i64)
    } else {
        write!(f, "{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(n) => fmt_real(f, *n),
            Value::Double(n) => fmt_real(f, *n),
            Value::String(s) => write!(f, "{}", s),
            Value::Color(c) => write!(f, "{}", c),
            Value::List(items) => write!(f, "[{}]", items.iter().join(", ")),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Color> for Value {
    fn from(value: Color) -> Self {
        Value::Color(value)
    }
}
