//! Unit tests for error messages, configuration and node registries.
use hikari::config::{MAX_UPDATE_RATE, MIN_UPDATE_RATE};
use hikari::prelude::*;
use hikari::script::registry::NodeFactory;

#[test]
fn test_error_display() {
    let mismatch = ValueError::TypeMismatch {
        expected: ValueType::Integer,
        found: ValueType::String,
    };
    assert!(mismatch.to_string().starts_with("Type mismatch"));

    let unknown = DefinitionError::UnknownNodeKind {
        node_id: "n1".to_string(),
        kind: "Teleport".to_string(),
    };
    assert_eq!(unknown.to_string(), "Node 'n1' has an unregistered node kind: 'Teleport'");

    let busy = PrerequisiteError::Busy("Driver".to_string());
    assert_eq!(busy.to_string(), "Prerequisite 'Driver' is already installing or uninstalling");
}

#[test]
fn test_config_from_json_and_file() {
    let config = EngineConfig::from_json(r#"{ "targetUpdateRate": 1, "changeChannelCapacity": 0 }"#)
        .expect("valid config");
    assert_eq!(config.target_update_rate, MIN_UPDATE_RATE);
    assert_eq!(config.change_channel_capacity, 1);

    let config = EngineConfig::from_json("{}").expect("empty config");
    assert_eq!(config, EngineConfig::default());
    assert!(config.target_update_rate <= MAX_UPDATE_RATE);

    assert!(matches!(
        EngineConfig::from_json("{ \"targetUpdateRate\": \"fast\" }"),
        Err(ConfigError::Parse(_))
    ));
    assert!(matches!(
        EngineConfig::from_file("does/not/exist.json"),
        Err(ConfigError::Io { .. })
    ));
}

#[test]
fn test_registry_aliases_and_custom_factories() {
    struct Constant;

    impl NodeFactory for Constant {
        fn node_type(&self) -> &str {
            "Answer"
        }

        fn create(&self, _storage: Option<&serde_json::Value>) -> Result<NodeKind, String> {
            Ok(NodeKind::StaticValue(Value::Integer(42)))
        }
    }

    let registry = NodeRegistry::new()
        .with_alias("Text", "ToString")
        .with_factory(Box::new(Constant));

    assert!(registry.contains("Text"));
    assert!(registry.kind_names().contains(&"Answer"));
    assert_eq!(
        registry.create("Text", None).expect("registered").expect("valid"),
        NodeKind::ToString
    );
    assert_eq!(
        registry.create("Answer", None).expect("registered").expect("valid"),
        NodeKind::StaticValue(Value::Integer(42))
    );
    assert!(registry.create("Teleport", None).is_none());
    assert!(registry.create("StaticValue", None).expect("registered").is_err());
}
