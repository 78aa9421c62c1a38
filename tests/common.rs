//! Common test utilities for building modules, data models and scripts.
use hikari::prelude::*;
use std::sync::Arc;

/// Path into the `game` module of [`game_registry`].
#[allow(dead_code)]
pub fn game_path(path: &str) -> DataModelPath {
    DataModelPath::new("game", path)
}

/// A data model shaped like a small game integration.
///
/// `Player { Name, Health, Alive }`, `Inventory` (a list of `{ Name, Count }`) and an
/// absent `Target`.
#[allow(dead_code)]
pub fn game_data_model() -> DataModel {
    let item = |name: &str, count: i32| {
        DataModelEntry::Model(DataModel::new().with_value("Name", name.to_string()).with_value("Count", count))
    };
    DataModel::new()
        .with_model(
            "Player",
            DataModel::new()
                .with_value("Name", "Hero".to_string())
                .with_value("Health", 80)
                .with_value("Alive", true),
        )
        .with_list("Inventory", vec![item("Potion", 3), item("Sword", 1)])
        .with_null("Target")
}

/// A registry holding the `game` module.
#[allow(dead_code)]
pub fn game_registry() -> Arc<ModuleRegistry> {
    let registry = Arc::new(ModuleRegistry::new());
    registry.add(Module::new("game", "Game", game_data_model()));
    registry
}

/// Connects two pins by name.
#[allow(dead_code)]
pub fn link(script: &mut NodeScript, from: NodeId, output: &str, to: NodeId, input: &str) -> bool {
    let output = script
        .find_pin(from, PinDirection::Output, output)
        .expect("output pin exists");
    let input = script
        .find_pin(to, PinDirection::Input, input)
        .expect("input pin exists");
    script.connect(output, input)
}

/// `StaticValue(5) -> ToString -> ToInteger`, returning the three node ids.
#[allow(dead_code)]
pub fn create_chain_script() -> (NodeScript, [NodeId; 3]) {
    let mut script = NodeScript::new("Chain");
    let constant = script.add_node(NodeKind::StaticValue(Value::Integer(5)));
    let to_string = script.add_node(NodeKind::ToString);
    let to_integer = script.add_node(NodeKind::ToInteger);
    assert!(link(&mut script, constant, "Output", to_string, "Input"));
    assert!(link(&mut script, to_string, "String", to_integer, "Input"));
    (script, [constant, to_string, to_integer])
}

/// Definition JSON of the same chain as [`create_chain_script`].
#[allow(dead_code)]
pub const CHAIN_SCRIPT_JSON: &str = r#"{
    "name": "Chain",
    "nodes": [
        { "id": "a", "kind": "StaticValue", "storage": { "type": "Integer", "value": 5 } },
        { "id": "b", "kind": "ToString" },
        { "id": "c", "kind": "ToInteger" }
    ],
    "connections": [
        { "source": "a", "sourcePin": "Output", "target": "b", "targetPin": "Input" },
        { "source": "b", "sourcePin": "String", "target": "c", "targetPin": "Input" }
    ]
}"#;
