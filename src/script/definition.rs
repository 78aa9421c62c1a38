use super::{NodeId, NodeRegistry, NodeScript, PinDirection, ScriptContext};
use crate::error::DefinitionError;
use crate::value::Value;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// The persisted form of a node script.
///
/// Nodes refer to each other by definition-local string ids and to pins by name, so a
/// definition survives reshapes of dynamic pins as long as the names still exist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptDefinition {
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<NodeDefinition>,
    #[serde(default)]
    pub connections: Vec<ConnectionDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDefinition {
    pub id: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input_defaults: Vec<PinDefaultDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinDefaultDefinition {
    pub pin: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDefinition {
    pub source: String,
    pub source_pin: String,
    pub target: String,
    pub target_pin: String,
}

impl ScriptDefinition {
    pub fn from_json(json: &str) -> Result<Self, DefinitionError> {
        serde_json::from_str(json).map_err(|e| DefinitionError::JsonParseError(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, DefinitionError> {
        serde_json::to_string_pretty(self).map_err(|e| DefinitionError::JsonParseError(e.to_string()))
    }
}

impl NodeScript {
    /// Builds a script from its definition.
    ///
    /// Dynamic nodes get their pins from `ctx` before defaults and connections are applied.
    /// A reference to a pin a dynamic node does not currently expose is dropped with a
    /// warning; for any other node it is an error.
    pub fn from_definition(
        definition: &ScriptDefinition,
        registry: &NodeRegistry,
        ctx: &dyn ScriptContext,
    ) -> Result<Self, DefinitionError> {
        let mut script = NodeScript::new(definition.name.clone());
        let mut ids: AHashMap<&str, NodeId> = AHashMap::with_capacity(definition.nodes.len());

        for node in &definition.nodes {
            if ids.contains_key(node.id.as_str()) {
                return Err(DefinitionError::DuplicateNode(node.id.clone()));
            }
            let kind = registry
                .create(&node.kind, node.storage.as_ref())
                .ok_or_else(|| DefinitionError::UnknownNodeKind {
                    node_id: node.id.clone(),
                    kind: node.kind.clone(),
                })?
                .map_err(|message| DefinitionError::InvalidStorage {
                    node_id: node.id.clone(),
                    message,
                })?;
            ids.insert(node.id.as_str(), script.add_node(kind));
        }

        script.refresh_pins(ctx);

        for node in &definition.nodes {
            let id = ids[node.id.as_str()];
            for default in &node.input_defaults {
                let Some(target) = script.node_mut(id) else {
                    continue;
                };
                let dynamic = target.kind().is_dynamic();
                let applied = target
                    .set_input_default(&default.pin, Some(default.value.clone()))
                    .map_err(|e| DefinitionError::InvalidStorage {
                        node_id: node.id.clone(),
                        message: e.to_string(),
                    })?;
                if !applied {
                    missing_pin(&node.id, &default.pin, PinDirection::Input, dynamic)?;
                }
            }
        }

        for connection in &definition.connections {
            let source = *ids.get(connection.source.as_str()).ok_or_else(|| {
                DefinitionError::NodeNotFound {
                    missing_node_id: connection.source.clone(),
                    source_node_id: connection.target.clone(),
                }
            })?;
            let target = *ids.get(connection.target.as_str()).ok_or_else(|| {
                DefinitionError::NodeNotFound {
                    missing_node_id: connection.target.clone(),
                    source_node_id: connection.source.clone(),
                }
            })?;

            let output = script.find_pin(source, PinDirection::Output, &connection.source_pin);
            let input = script.find_pin(target, PinDirection::Input, &connection.target_pin);
            let (output, input) = match (output, input) {
                (Some(output), Some(input)) => (output, input),
                (None, _) => {
                    let dynamic = script.node(source).is_some_and(|n| n.kind().is_dynamic());
                    missing_pin(&connection.source, &connection.source_pin, PinDirection::Output, dynamic)?;
                    continue;
                }
                (_, None) => {
                    let dynamic = script.node(target).is_some_and(|n| n.kind().is_dynamic());
                    missing_pin(&connection.target, &connection.target_pin, PinDirection::Input, dynamic)?;
                    continue;
                }
            };

            if !script.connect(output, input) {
                return Err(DefinitionError::ConnectionRejected {
                    source_node_id: connection.source.clone(),
                    source_pin: connection.source_pin.clone(),
                    target_node_id: connection.target.clone(),
                    target_pin: connection.target_pin.clone(),
                });
            }
        }

        debug!(
            script = %script.name,
            nodes = script.nodes.len(),
            connections = definition.connections.len(),
            "script built from definition"
        );
        Ok(script)
    }

    /// Captures the script's nodes, input defaults and connections.
    pub fn to_definition(&self) -> ScriptDefinition {
        let key = |id: NodeId| id.0.to_string();
        let nodes = self
            .nodes
            .iter()
            .map(|node| NodeDefinition {
                id: key(node.id()),
                kind: node.kind().type_name().to_string(),
                storage: node.storage(),
                input_defaults: node
                    .inputs()
                    .filter_map(|pin| {
                        pin.default_value().map(|value| PinDefaultDefinition {
                            pin: pin.name().to_string(),
                            value: value.clone(),
                        })
                    })
                    .collect(),
            })
            .collect();

        let connections = self
            .connections()
            .into_iter()
            .filter_map(|(output, input)| {
                let output = self.pin(output)?;
                let input = self.pin(input)?;
                Some(ConnectionDefinition {
                    source: key(output.node()),
                    source_pin: output.name().to_string(),
                    target: key(input.node()),
                    target_pin: input.name().to_string(),
                })
            })
            .collect();

        ScriptDefinition {
            name: self.name.clone(),
            nodes,
            connections,
        }
    }
}

fn missing_pin(
    node_id: &str,
    pin: &str,
    direction: PinDirection,
    dynamic: bool,
) -> Result<(), DefinitionError> {
    if dynamic {
        warn!(node = node_id, pin, %direction, "pin not present on dynamic node, skipping");
        Ok(())
    } else {
        Err(DefinitionError::PinNotFound {
            node_id: node_id.to_string(),
            pin: pin.to_string(),
            direction,
        })
    }
}
