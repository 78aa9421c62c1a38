use super::NodeId;
use crate::error::ValueError;
use crate::value::{TypedValueCell, Value, ValueType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Script-unique identifier of a pin. Never reused within a script, even across reshapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PinId(pub(crate) u64);

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pin#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinDirection {
    Input,
    Output,
}

impl fmt::Display for PinDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinDirection::Input => write!(f, "input"),
            PinDirection::Output => write!(f, "output"),
        }
    }
}

/// The shape of a pin: what a node layout is made of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinSpec {
    pub name: String,
    pub value_type: ValueType,
}

impl PinSpec {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
        }
    }
}

/// A named, typed slot on a node.
///
/// Inputs hold at most one connection, outputs fan out. Connections are stored on both
/// ends and are always added and removed in pairs by the owning script.
#[derive(Debug, Clone)]
pub struct Pin {
    id: PinId,
    node: NodeId,
    name: String,
    direction: PinDirection,
    cell: TypedValueCell,
    default: Option<Value>,
    connections: Vec<PinId>,
}

impl Pin {
    pub(crate) fn new(id: PinId, node: NodeId, spec: &PinSpec, direction: PinDirection) -> Self {
        Self {
            id,
            node,
            name: spec.name.clone(),
            direction,
            cell: TypedValueCell::new(spec.value_type),
            default: None,
            connections: Vec::new(),
        }
    }

    pub fn id(&self) -> PinId {
        self.id
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> PinDirection {
        self.direction
    }

    pub fn value_type(&self) -> ValueType {
        self.cell.declared_type()
    }

    /// The value this pin holds for the current pass.
    pub fn cell(&self) -> &TypedValueCell {
        &self.cell
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn connections(&self) -> &[PinId] {
        &self.connections
    }

    pub fn is_connected(&self) -> bool {
        !self.connections.is_empty()
    }

    pub fn matches(&self, spec: &PinSpec) -> bool {
        self.name == spec.name && self.value_type() == spec.value_type
    }

    /// Sets the value an unconnected input yields, checked against the pin type.
    pub fn set_default(&mut self, value: Option<Value>) -> Result<(), ValueError> {
        if let Some(value) = &value {
            TypedValueCell::with_value(self.value_type(), value.clone())?;
        }
        self.default = value;
        Ok(())
    }

    pub(crate) fn cell_mut(&mut self) -> &mut TypedValueCell {
        &mut self.cell
    }

    pub(crate) fn reset_to_default(&mut self) {
        let default = self.default.clone();
        self.cell.set_coerced(default.as_ref());
    }

    pub(crate) fn attach(&mut self, other: PinId) {
        if !self.connections.contains(&other) {
            self.connections.push(other);
        }
    }

    pub(crate) fn clear_connections(&mut self) {
        self.connections.clear();
    }

    pub(crate) fn detach(&mut self, other: PinId) -> bool {
        let before = self.connections.len();
        self.connections.retain(|p| *p != other);
        before != self.connections.len()
    }
}
