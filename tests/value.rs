//! Tests for typed value cells and the coercion policy.
use hikari::prelude::*;

#[cfg(test)]
mod value_tests {
    use super::*;

    #[test]
    fn test_get_coerced_on_same_type_is_exact() {
        let cell = TypedValueCell::of(1234.5678_f64);
        assert_eq!(cell.get_coerced::<f64>(), 1234.5678);
        assert_eq!(cell.get::<f64>().expect("same type"), Some(1234.5678));

        let cell = TypedValueCell::of(Color::rgb(10, 20, 30));
        assert_eq!(cell.get_coerced::<Color>(), Color::rgb(10, 20, 30));
    }

    #[test]
    fn test_unparseable_text_coerces_to_zero() {
        let cell = TypedValueCell::of("abc".to_string());
        assert_eq!(cell.get_coerced::<i32>(), 0);
        assert_eq!(cell.get_coerced::<f64>(), 0.0);
        assert!(!cell.get_coerced::<bool>());
    }

    #[test]
    fn test_strict_access_reports_type_mismatch() {
        let mut cell = TypedValueCell::new(ValueType::Integer);
        let err = cell.set(1.5_f64).expect_err("double into integer cell");
        assert_eq!(
            err,
            ValueError::TypeMismatch {
                expected: ValueType::Integer,
                found: ValueType::Double,
            }
        );
        assert!(cell.is_empty());

        cell.set(7).expect("integer into integer cell");
        assert!(cell.get::<String>().is_err());
        assert_eq!(cell.get_coerced::<String>(), "7");
    }

    #[test]
    fn test_any_cell_accepts_every_kind() {
        let mut cell = TypedValueCell::new(ValueType::Any);
        cell.set(true).expect("bool into any");
        cell.set("text".to_string()).expect("string into any");
        assert_eq!(cell.value(), Some(&Value::from("text")));
    }

    #[test]
    fn test_set_coerced_converts_into_declared_type() {
        let mut cell = TypedValueCell::new(ValueType::Integer);
        cell.set_coerced(Some(&Value::Double(9.99)));
        assert_eq!(cell.value(), Some(&Value::Integer(9)));

        cell.set_coerced(None);
        assert!(cell.is_empty());
    }

    #[test]
    fn test_zeroed_cells_and_display() {
        assert_eq!(TypedValueCell::zeroed(ValueType::Double).value(), Some(&Value::Double(0.0)));
        assert!(TypedValueCell::zeroed(ValueType::Any).is_empty());
        assert_eq!(TypedValueCell::of(2.0_f64).to_string(), "2 (Double)");
        assert_eq!(TypedValueCell::new(ValueType::Bool).to_string(), "null (Bool)");
    }

    #[test]
    fn test_float_display_uses_its_own_precision() {
        assert_eq!(Value::Float(0.1).to_string(), "0.1");
        assert_eq!(Value::Float(-2.75).to_string(), "-2.75");
        assert_eq!(Value::Float(3.0).to_string(), "3");
        assert_eq!(Value::Double(0.1).to_string(), "0.1");

        let mut text = TypedValueCell::new(ValueType::String);
        text.set_coerced(Some(&Value::Float(0.1)));
        assert_eq!(text.value(), Some(&Value::from("0.1")));
    }

    #[test]
    fn test_color_parsing_and_formatting() {
        let color: Color = "#ff102030".parse().expect("argb color");
        assert_eq!(color, Color::rgba(0x10, 0x20, 0x30, 0xff));
        assert_eq!(color.to_string(), "#ff102030");
        assert_eq!(TypedValueCell::of("#102030".to_string()).get_coerced::<Color>(), Color::rgb(0x10, 0x20, 0x30));
    }

    #[test]
    fn test_connection_compatibility() {
        assert!(ValueType::Double.can_connect_from(ValueType::Integer));
        assert!(ValueType::String.can_connect_from(ValueType::Color));
        assert!(ValueType::Bool.can_connect_from(ValueType::Any));
        assert!(!ValueType::Bool.can_connect_from(ValueType::Integer));
        assert!(!ValueType::Color.can_connect_from(ValueType::String));
    }

    #[test]
    fn test_value_serde_is_tagged() {
        let json = serde_json::to_value(Value::Integer(5)).expect("serialize");
        assert_eq!(json, serde_json::json!({ "type": "Integer", "value": 5 }));
        let list: Value = serde_json::from_value(serde_json::json!({
            "type": "List",
            "value": [{ "type": "Bool", "value": true }]
        }))
        .expect("deserialize");
        assert_eq!(list.to_string(), "[true]");
    }
}
