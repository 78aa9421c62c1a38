//! Tests for node scripts: structure, evaluation order, cycles and definitions.
mod common;
use common::*;
use hikari::prelude::*;
use tokio::sync::broadcast::error::TryRecvError;

#[cfg(test)]
mod script_tests {
    use super::*;

    #[test]
    fn test_chain_converts_through_text() {
        let modules = ModuleRegistry::new();
        let (mut script, [_, to_string, to_integer]) = create_chain_script();

        script.evaluate(&modules).expect("acyclic script evaluates");

        let text = script.output_value(to_string, "String").expect("string output");
        assert_eq!(text.value(), Some(&Value::from("5")));
        let number = script.output_value(to_integer, "Integer").expect("integer output");
        assert_eq!(number.get::<i32>().expect("integer cell"), Some(5));
    }

    #[test]
    fn test_evaluation_order_respects_every_edge() {
        let modules = ModuleRegistry::new();
        let mut script = NodeScript::new("Reversed");
        // Added downstream first so insertion order is the wrong order.
        let last = script.add_node(NodeKind::ToDouble);
        let middle = script.add_node(NodeKind::ToString);
        let first = script.add_node(NodeKind::StaticValue(Value::Float(2.5)));
        assert!(link(&mut script, first, "Output", middle, "Input"));
        assert!(link(&mut script, middle, "String", last, "Input"));

        let order = script.evaluation_order().expect("no cycle");
        assert_eq!(order.len(), 3);
        let position = |id| order.iter().position(|n| *n == id).expect("node is ordered");
        assert!(position(first) < position(middle));
        assert!(position(middle) < position(last));

        script.evaluate(&modules).expect("evaluates");
        assert_eq!(
            script.output_value(last, "Double").expect("double output").value(),
            Some(&Value::Double(2.5))
        );
    }

    #[test]
    fn test_cycle_skips_the_pass_and_keeps_outputs() {
        let modules = ModuleRegistry::new();
        let (mut script, [_, _, to_integer]) = create_chain_script();
        let a = script.add_node(NodeKind::ToInteger);
        let b = script.add_node(NodeKind::ToInteger);
        assert!(link(&mut script, to_integer, "Integer", a, "Input"));
        script.evaluate(&modules).expect("acyclic so far");

        let before: Vec<TypedValueCell> = script
            .nodes()
            .iter()
            .flat_map(|n| n.outputs().map(|p| p.cell().clone()).collect::<Vec<_>>())
            .collect();

        assert!(link(&mut script, a, "Integer", b, "Input"));
        assert!(link(&mut script, b, "Integer", a, "Input"));
        let err = script.evaluate(&modules).expect_err("cycle is detected");
        assert!(matches!(err, ScriptError::GraphCycleDetected { node } if node == a || node == b));

        let after: Vec<TypedValueCell> = script
            .nodes()
            .iter()
            .flat_map(|n| n.outputs().map(|p| p.cell().clone()).collect::<Vec<_>>())
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_structural_changes_are_published_once() {
        let mut script = NodeScript::new("Events");
        let mut events = script.subscribe();

        let a = script.add_node(NodeKind::StaticValue(Value::Bool(true)));
        let b = script.add_node(NodeKind::ToString);
        let output = script.find_pin(a, PinDirection::Output, "Output").expect("output");
        let input = script.find_pin(b, PinDirection::Input, "Input").expect("input");

        assert!(script.connect(output, input));
        assert!(!script.connect(output, input), "duplicate connect is a no-op");
        assert!(script.disconnect(output, input));
        assert!(!script.disconnect(output, input), "absent disconnect is a no-op");
        assert!(script.connect(output, input));
        assert!(script.remove_node(b));
        assert!(!script.remove_node(b));

        let expected = [
            StructuralChange::NodeAdded(a),
            StructuralChange::NodeAdded(b),
            StructuralChange::Connected {
                output,
                input,
                replaced: None,
            },
            StructuralChange::Disconnected { output, input },
            StructuralChange::Connected {
                output,
                input,
                replaced: None,
            },
            StructuralChange::NodeRemoved(b),
        ];
        for change in expected {
            assert_eq!(events.try_recv().expect("event published"), change);
        }
        assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
        assert!(script.connections().is_empty());
        assert!(script.pin(output).expect("pin survives").connections().is_empty());
    }

    #[test]
    fn test_connect_replaces_existing_input_connection() {
        let mut script = NodeScript::new("Replace");
        let first = script.add_node(NodeKind::StaticValue(Value::Integer(1)));
        let second = script.add_node(NodeKind::StaticValue(Value::Integer(2)));
        let sink = script.add_node(NodeKind::ToInteger);

        assert!(link(&mut script, first, "Output", sink, "Input"));
        let mut events = script.subscribe();
        assert!(link(&mut script, second, "Output", sink, "Input"));

        let first_output = script.find_pin(first, PinDirection::Output, "Output").expect("output");
        let second_output = script.find_pin(second, PinDirection::Output, "Output").expect("output");
        let input = script.find_pin(sink, PinDirection::Input, "Input").expect("input");
        assert!(script.pin(first_output).expect("pin").connections().is_empty());
        assert_eq!(script.connections().len(), 1);
        assert_eq!(
            events.try_recv().expect("one event"),
            StructuralChange::Connected {
                output: second_output,
                input,
                replaced: Some(first_output),
            }
        );
        assert_eq!(events.try_recv(), Err(TryRecvError::Empty));

        script.evaluate(&ModuleRegistry::new()).expect("evaluates");
        assert_eq!(script.output_value(sink, "Integer").expect("output").get_coerced::<i32>(), 2);
    }

    #[test]
    fn test_invalid_directions_are_rejected() {
        let mut script = NodeScript::new("Directions");
        let a = script.add_node(NodeKind::ToString);
        let b = script.add_node(NodeKind::ToString);
        let a_out = script.find_pin(a, PinDirection::Output, "String").expect("output");
        let b_out = script.find_pin(b, PinDirection::Output, "String").expect("output");
        let a_in = script.find_pin(a, PinDirection::Input, "Input").expect("input");

        assert!(!script.connect(a_out, b_out));
        assert!(!script.connect(a_in, a_out));
        assert!(script.connections().is_empty());
    }

    #[test]
    fn test_unconnected_inputs_use_their_default() {
        let modules = ModuleRegistry::new();
        let mut script = NodeScript::new("Defaults");
        let to_integer = script.add_node(NodeKind::ToInteger);
        let to_string = script.add_node(NodeKind::ToString);
        script
            .node_mut(to_integer)
            .expect("node")
            .set_input_default("Input", Some(Value::from("42")))
            .expect("any input accepts text");

        script.evaluate(&modules).expect("evaluates");

        assert_eq!(script.output_value(to_integer, "Integer").expect("output").get_coerced::<i32>(), 42);
        assert!(script.output_value(to_string, "String").expect("output").is_empty());
    }

    #[test]
    fn test_script_from_definition() {
        let modules = ModuleRegistry::new();
        let definition = ScriptDefinition::from_json(CHAIN_SCRIPT_JSON).expect("valid json");
        let mut script = NodeScript::from_definition(&definition, &NodeRegistry::new(), &modules)
            .expect("definition builds");

        assert_eq!(script.nodes().len(), 3);
        assert_eq!(script.connections().len(), 2);
        script.evaluate(&modules).expect("evaluates");

        let last = script.nodes()[2].id();
        assert_eq!(script.output_value(last, "Integer").expect("output").get_coerced::<i32>(), 5);
    }

    #[test]
    fn test_definition_survives_a_round_trip() {
        let modules = ModuleRegistry::new();
        let (script, _) = create_chain_script();
        let definition = script.to_definition();
        assert_eq!(definition.nodes.len(), 3);
        assert_eq!(definition.connections.len(), 2);

        let json = definition.to_json().expect("serializes");
        let reloaded = ScriptDefinition::from_json(&json).expect("parses");
        let mut rebuilt = NodeScript::from_definition(&reloaded, &NodeRegistry::new(), &modules)
            .expect("rebuilds");
        rebuilt.evaluate(&modules).expect("evaluates");
        let last = rebuilt.nodes()[2].id();
        assert_eq!(rebuilt.output_value(last, "Integer").expect("output").get_coerced::<i32>(), 5);
    }

    #[test]
    fn test_definition_errors() {
        let modules = ModuleRegistry::new();
        let registry = NodeRegistry::new();

        let unknown = ScriptDefinition::from_json(
            r#"{ "name": "x", "nodes": [{ "id": "a", "kind": "Teleport" }] }"#,
        )
        .expect("valid json");
        assert!(matches!(
            NodeScript::from_definition(&unknown, &registry, &modules),
            Err(DefinitionError::UnknownNodeKind { .. })
        ));

        let duplicate = ScriptDefinition::from_json(
            r#"{ "name": "x", "nodes": [{ "id": "a", "kind": "ToString" }, { "id": "a", "kind": "ToFloat" }] }"#,
        )
        .expect("valid json");
        assert!(matches!(
            NodeScript::from_definition(&duplicate, &registry, &modules),
            Err(DefinitionError::DuplicateNode(id)) if id == "a"
        ));

        let missing_pin = ScriptDefinition::from_json(
            r#"{ "name": "x",
                 "nodes": [{ "id": "a", "kind": "ToString" }, { "id": "b", "kind": "ToFloat" }],
                 "connections": [{ "source": "a", "sourcePin": "Text", "target": "b", "targetPin": "Input" }] }"#,
        )
        .expect("valid json");
        assert!(matches!(
            NodeScript::from_definition(&missing_pin, &registry, &modules),
            Err(DefinitionError::PinNotFound { direction: PinDirection::Output, .. })
        ));

        let missing_node = ScriptDefinition::from_json(
            r#"{ "name": "x",
                 "nodes": [{ "id": "a", "kind": "ToString" }],
                 "connections": [{ "source": "a", "sourcePin": "String", "target": "z", "targetPin": "Input" }] }"#,
        )
        .expect("valid json");
        assert!(matches!(
            NodeScript::from_definition(&missing_node, &registry, &modules),
            Err(DefinitionError::NodeNotFound { missing_node_id, .. }) if missing_node_id == "z"
        ));

        assert!(matches!(
            ScriptDefinition::from_json("{ not json"),
            Err(DefinitionError::JsonParseError(_))
        ));
    }

    #[test]
    fn test_float_text_keeps_single_precision_digits() {
        let modules = ModuleRegistry::new();
        let mut script = NodeScript::new("Float text");
        let tenth = script.add_node(NodeKind::StaticValue(Value::Float(0.1)));
        let whole = script.add_node(NodeKind::StaticValue(Value::Float(3.0)));
        let tenth_text = script.add_node(NodeKind::ToString);
        let whole_text = script.add_node(NodeKind::ToString);
        assert!(link(&mut script, tenth, "Output", tenth_text, "Input"));
        assert!(link(&mut script, whole, "Output", whole_text, "Input"));

        script.evaluate(&modules).expect("evaluates");

        assert_eq!(
            script.output_value(tenth_text, "String").expect("output").value(),
            Some(&Value::from("0.1"))
        );
        assert_eq!(
            script.output_value(whole_text, "String").expect("output").value(),
            Some(&Value::from("3"))
        );
    }

    #[test]
    fn test_cycle_is_detected_before_pins_are_refreshed() {
        let modules = game_registry();
        let mut script = NodeScript::new("Cycle first");
        let health = script.add_node(NodeKind::DataModel(Some(game_path("Player.Health"))));
        script.evaluate(modules.as_ref()).expect("acyclic so far");

        let a = script.add_node(NodeKind::ToInteger);
        let b = script.add_node(NodeKind::ToInteger);
        assert!(link(&mut script, a, "Integer", b, "Input"));
        assert!(link(&mut script, b, "Integer", a, "Input"));
        let game = modules.get("game").expect("module");
        game.update_data_model(|model| {
            model.entry_at_mut("Player").map(|entry| {
                *entry = DataModelEntry::Model(DataModel::new().with_value("Health", 55.5_f64))
            })
        });
        let mut events = script.subscribe();

        let err = script.evaluate(modules.as_ref()).expect_err("cycle is detected");
        assert!(matches!(err, ScriptError::GraphCycleDetected { .. }));
        assert_eq!(events.try_recv(), Err(TryRecvError::Empty), "pins were not refreshed");
        let output = script.output_value(health, "Output").expect("pin kept");
        assert_eq!(output.declared_type(), ValueType::Integer);
        assert_eq!(output.value(), Some(&Value::Integer(80)));
    }
}
