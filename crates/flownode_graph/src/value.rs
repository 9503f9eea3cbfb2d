// SPDX-License-Identifier: MIT OR Apache-2.0
//! Runtime values carried by data pins and their type descriptors.
//!
//! Assignability is decided by an explicit table: every type names its
//! direct supertype, and a target accepts a source when the source's
//! supertype chain reaches the target. There is no implicit numeric
//! coercion (`Int` does not accept `Float`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Type descriptor declared by a data pin or a variable
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Top type, accepts every value
    Any,
    /// Abstract numeric type, accepts `Int` and `Float`
    Number,
    /// Boolean value
    Bool,
    /// 64-bit signed integer
    Int,
    /// 64-bit float
    Float,
    /// UTF-8 text
    Text,
    /// Named user type
    Custom(String),
    /// By-reference (out) parameter of the wrapped element type
    ByRef(Box<DataType>),
}

impl DataType {
    /// Wrap a type as a by-reference parameter
    pub fn by_ref(inner: DataType) -> Self {
        Self::ByRef(Box::new(inner))
    }

    /// Strip any by-reference wrapping
    pub fn element(&self) -> &DataType {
        match self {
            Self::ByRef(inner) => inner.element(),
            other => other,
        }
    }

    /// Direct supertype in the assignability table
    pub fn supertype(&self) -> Option<DataType> {
        match self {
            Self::ByRef(inner) => inner.supertype(),
            Self::Any => None,
            Self::Int | Self::Float => Some(Self::Number),
            Self::Number | Self::Bool | Self::Text | Self::Custom(_) => Some(Self::Any),
        }
    }

    /// Whether a pin of this type accepts values declared as `source`.
    ///
    /// Both sides are unwrapped to their element type first.
    pub fn is_assignable_from(&self, source: &DataType) -> bool {
        let target = self.element();
        let mut current = Some(source.element().clone());
        while let Some(ty) = current {
            if &ty == target {
                return true;
            }
            current = ty.supertype();
        }
        false
    }

    /// Default value for a pin declared with this type
    pub fn default_value(&self) -> Value {
        match self.element() {
            Self::Bool => Value::Bool(false),
            Self::Int => Value::Int(0),
            Self::Float => Value::Float(0.0),
            Self::Text => Value::Text(String::new()),
            _ => Value::Null,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("Any"),
            Self::Number => f.write_str("Number"),
            Self::Bool => f.write_str("Bool"),
            Self::Int => f.write_str("Int"),
            Self::Float => f.write_str("Float"),
            Self::Text => f.write_str("Text"),
            Self::Custom(name) if is_reserved_custom_name(name) => write!(f, "{CUSTOM_PREFIX}{name})"),
            Self::Custom(name) => f.write_str(name),
            Self::ByRef(inner) => write!(f, "{inner}&"),
        }
    }
}

const CUSTOM_PREFIX: &str = "Custom(";

const BUILTIN_NAMES: [&str; 6] = ["Any", "Number", "Bool", "Int", "Float", "Text"];

/// Custom names that would not parse back as themselves when written bare
fn is_reserved_custom_name(name: &str) -> bool {
    BUILTIN_NAMES.contains(&name) || name.ends_with('&') || name.starts_with(CUSTOM_PREFIX)
}

/// Parses the [`Display`](fmt::Display) form. Custom names that shadow a
/// builtin or end in `&` are written as `Custom(name)`.
impl FromStr for DataType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(name) = s.strip_prefix(CUSTOM_PREFIX).and_then(|rest| rest.strip_suffix(')')) {
            return Ok(Self::Custom(name.to_string()));
        }
        if let Some(inner) = s.strip_suffix('&') {
            return Ok(Self::by_ref(inner.parse()?));
        }
        Ok(match s {
            "Any" => Self::Any,
            "Number" => Self::Number,
            "Bool" => Self::Bool,
            "Int" => Self::Int,
            "Float" => Self::Float,
            "Text" => Self::Text,
            other => Self::Custom(other.to_string()),
        })
    }
}

/// Value stored in a pin or variable
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// No value
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Float
    Float(f64),
    /// Text
    Text(String),
}

impl Value {
    /// Runtime type of this value
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Null => DataType::Any,
            Self::Bool(_) => DataType::Bool,
            Self::Int(_) => DataType::Int,
            Self::Float(_) => DataType::Float,
            Self::Text(_) => DataType::Text,
        }
    }

    /// Whether this is `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Boolean payload, if any
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer payload, if any
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Float payload, if any
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Text payload, if any
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_types_are_assignable() {
        assert!(DataType::Int.is_assignable_from(&DataType::Int));
        assert!(DataType::Text.is_assignable_from(&DataType::Text));
        assert!(DataType::Custom("Vec3".into()).is_assignable_from(&DataType::Custom("Vec3".into())));
    }

    #[test]
    fn test_supertypes_accept_subtypes() {
        assert!(DataType::Number.is_assignable_from(&DataType::Int));
        assert!(DataType::Number.is_assignable_from(&DataType::Float));
        assert!(DataType::Any.is_assignable_from(&DataType::Int));
        assert!(DataType::Any.is_assignable_from(&DataType::Custom("Vec3".into())));
    }

    #[test]
    fn test_no_implicit_numeric_coercion() {
        assert!(!DataType::Int.is_assignable_from(&DataType::Float));
        assert!(!DataType::Float.is_assignable_from(&DataType::Int));
        assert!(!DataType::Int.is_assignable_from(&DataType::Number));
        assert!(!DataType::Int.is_assignable_from(&DataType::Any));
    }

    #[test]
    fn test_by_ref_is_unwrapped() {
        let out_int = DataType::by_ref(DataType::Int);
        assert!(DataType::Int.is_assignable_from(&out_int));
        assert!(DataType::Number.is_assignable_from(&out_int));
        assert!(!DataType::Float.is_assignable_from(&out_int));
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for ty in [
            DataType::Any,
            DataType::Number,
            DataType::Bool,
            DataType::Int,
            DataType::Float,
            DataType::Text,
            DataType::Custom("Vec3".into()),
            DataType::by_ref(DataType::Float),
            DataType::Custom("Int".into()),
            DataType::Custom("Handle&".into()),
            DataType::Custom("Custom(Vec3)".into()),
            DataType::by_ref(DataType::Custom("Float".into())),
        ] {
            let parsed: DataType = ty.to_string().parse().unwrap();
            assert_eq!(parsed, ty);
        }
    }

    #[test]
    fn test_shadowing_custom_names_are_escaped() {
        assert_eq!(DataType::Custom("Int".into()).to_string(), "Custom(Int)");
        assert_eq!(DataType::Custom("Vec3".into()).to_string(), "Vec3");
        assert_eq!("Int".parse::<DataType>().unwrap(), DataType::Int);
    }

    #[test]
    fn test_value_runtime_types() {
        assert_eq!(Value::from(true).data_type(), DataType::Bool);
        assert_eq!(Value::from(3_i64).data_type(), DataType::Int);
        assert_eq!(Value::from(1.5).data_type(), DataType::Float);
        assert_eq!(Value::from("hi").data_type(), DataType::Text);
        assert_eq!(Value::Null.data_type(), DataType::Any);
    }
}
