use super::{NodeKind, Pin, PinDirection, PinId, PinSpec};
use crate::error::ValueError;
use crate::value::{TypedValueCell, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Script-unique identifier of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Hands out node and pin ids for one script.
#[derive(Debug, Default)]
pub(crate) struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub(crate) fn node(&mut self) -> NodeId {
        self.next += 1;
        NodeId(self.next)
    }

    pub(crate) fn pin(&mut self) -> PinId {
        self.next += 1;
        PinId(self.next)
    }
}

/// A unit of computation: a kind plus the pins it currently exposes.
///
/// Pins are kept inputs first, then outputs, each in layout order.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    kind: NodeKind,
    pins: Vec<Pin>,
}

impl Node {
    pub(crate) fn new(id: NodeId, kind: NodeKind, ids: &mut IdAllocator) -> Self {
        let (inputs, outputs) = kind.initial_layout();
        let mut pins = Vec::with_capacity(inputs.len() + outputs.len());
        pins.extend(inputs.iter().map(|s| Pin::new(ids.pin(), id, s, PinDirection::Input)));
        pins.extend(outputs.iter().map(|s| Pin::new(ids.pin(), id, s, PinDirection::Output)));
        Self { id, kind, pins }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.display_name()
    }

    /// The node's persisted configuration, if its kind has any.
    pub fn storage(&self) -> Option<serde_json::Value> {
        self.kind.storage()
    }

    pub fn pins(&self) -> &[Pin] {
        &self.pins
    }

    pub(crate) fn pins_mut(&mut self) -> &mut [Pin] {
        &mut self.pins
    }

    pub fn inputs(&self) -> impl Iterator<Item = &Pin> {
        self.pins
            .iter()
            .filter(|p| p.direction() == PinDirection::Input)
    }

    pub fn outputs(&self) -> impl Iterator<Item = &Pin> {
        self.pins
            .iter()
            .filter(|p| p.direction() == PinDirection::Output)
    }

    pub fn pin(&self, id: PinId) -> Option<&Pin> {
        self.pins.iter().find(|p| p.id() == id)
    }

    pub(crate) fn pin_mut(&mut self, id: PinId) -> Option<&mut Pin> {
        self.pins.iter_mut().find(|p| p.id() == id)
    }

    pub fn input(&self, name: &str) -> Option<&Pin> {
        self.inputs().find(|p| p.name() == name)
    }

    pub fn output(&self, name: &str) -> Option<&Pin> {
        self.outputs().find(|p| p.name() == name)
    }

    /// The current value of an output pin.
    pub fn output_value(&self, name: &str) -> Option<&TypedValueCell> {
        self.output(name).map(|p| p.cell())
    }

    /// Configures the value an unconnected input yields. `Ok(false)` if there is no such input.
    pub fn set_input_default(&mut self, name: &str, value: Option<Value>) -> Result<bool, ValueError> {
        match self
            .pins
            .iter_mut()
            .find(|p| p.direction() == PinDirection::Input && p.name() == name)
        {
            Some(pin) => pin.set_default(value).map(|_| true),
            None => Ok(false),
        }
    }

    pub(crate) fn layout(&self, direction: PinDirection) -> Vec<PinSpec> {
        self.pins
            .iter()
            .filter(|p| p.direction() == direction)
            .map(|p| PinSpec::new(p.name(), p.value_type()))
            .collect()
    }

    /// Replaces the pins of one direction with `layout`.
    ///
    /// A pin survives, keeping its id and connections, only if the pin at the same position
    /// has the same name and type. Every other old pin is returned so the script can drop
    /// the connections that pointed at it.
    pub(crate) fn reshape(
        &mut self,
        direction: PinDirection,
        layout: &[PinSpec],
        ids: &mut IdAllocator,
    ) -> Vec<Pin> {
        let (mut old, kept): (Vec<Pin>, Vec<Pin>) = std::mem::take(&mut self.pins)
            .into_iter()
            .partition(|p| p.direction() == direction);

        let mut rebuilt = Vec::with_capacity(layout.len());
        let mut removed = Vec::new();
        let mut old_iter = old.drain(..);
        for spec in layout {
            match old_iter.next() {
                Some(pin) if pin.matches(spec) => rebuilt.push(pin),
                Some(pin) => {
                    removed.push(pin);
                    rebuilt.push(Pin::new(ids.pin(), self.id, spec, direction));
                }
                None => rebuilt.push(Pin::new(ids.pin(), self.id, spec, direction)),
            }
        }
        removed.extend(old_iter);

        self.pins = match direction {
            PinDirection::Input => rebuilt.into_iter().chain(kept).collect(),
            PinDirection::Output => kept.into_iter().chain(rebuilt).collect(),
        };
        removed
    }
}
