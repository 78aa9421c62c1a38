//! Node scripts: graphs of typed nodes evaluated once per update tick.

use ahash::AHashMap;
use tokio::sync::broadcast;
use tracing::{debug, trace};

mod context;
pub mod definition;
mod engine;
mod kinds;
mod node;
mod pin;
pub mod registry;

pub use context::ScriptContext;
pub use definition::{ConnectionDefinition, NodeDefinition, PinDefaultDefinition, ScriptDefinition};
pub use kinds::{LayerPropertyBinding, NodeKind};
pub use node::{Node, NodeId};
pub use pin::{Pin, PinDirection, PinId, PinSpec};
pub use registry::{NodeFactory, NodeRegistry};

use crate::datamodel::DataModelPath;
use crate::profile::ElementId;
use node::IdAllocator;

/// Default buffer size of the structural change channel.
pub const DEFAULT_CHANGE_CAPACITY: usize = 64;

/// A structural mutation of a script. Exactly one is published per accepted mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralChange {
    NodeAdded(NodeId),
    NodeRemoved(NodeId),
    /// The node's pin set was rebuilt; connections to vanished pins were dropped.
    PinsChanged(NodeId),
    /// A bound node now points elsewhere, either through a rebind or because its target
    /// disappeared. `pins_changed` is set when the pin set was rebuilt as well.
    BindingChanged { node: NodeId, pins_changed: bool },
    /// `replaced` is the input's previous source, already disconnected.
    Connected {
        output: PinId,
        input: PinId,
        replaced: Option<PinId>,
    },
    Disconnected { output: PinId, input: PinId },
}

/// An owned graph of nodes and the connections between their pins.
pub struct NodeScript {
    name: String,
    nodes: Vec<Node>,
    ids: IdAllocator,
    changes: broadcast::Sender<StructuralChange>,
}

impl NodeScript {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_capacity(name, DEFAULT_CHANGE_CAPACITY)
    }

    pub fn with_capacity(name: impl Into<String>, change_capacity: usize) -> Self {
        let (changes, _) = broadcast::channel(change_capacity.max(1));
        Self {
            name: name.into(),
            nodes: Vec::new(),
            ids: IdAllocator::default(),
            changes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Subscribes to structural changes made after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<StructuralChange> {
        self.changes.subscribe()
    }

    fn publish(&self, change: StructuralChange) {
        trace!(script = %self.name, ?change, "structural change");
        // No subscribers is fine.
        let _ = self.changes.send(change);
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    /// Mutable access for configuring a node, e.g. its input defaults.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id() == id)
    }

    pub fn pin(&self, id: PinId) -> Option<&Pin> {
        self.nodes.iter().find_map(|n| n.pin(id))
    }

    fn pin_mut(&mut self, id: PinId) -> Option<&mut Pin> {
        self.nodes.iter_mut().find_map(|n| n.pin_mut(id))
    }

    /// Finds a pin by its owner and name.
    pub fn find_pin(&self, node: NodeId, direction: PinDirection, name: &str) -> Option<PinId> {
        let node = self.node(node)?;
        let pin = match direction {
            PinDirection::Input => node.input(name),
            PinDirection::Output => node.output(name),
        };
        pin.map(|p| p.id())
    }

    /// The current value of a node's output pin.
    pub fn output_value(&self, node: NodeId, pin: &str) -> Option<&crate::value::TypedValueCell> {
        self.node(node)?.output_value(pin)
    }

    pub fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let id = self.ids.node();
        debug!(script = %self.name, node = %id, kind = kind.type_name(), "node added");
        self.nodes.push(Node::new(id, kind, &mut self.ids));
        self.publish(StructuralChange::NodeAdded(id));
        id
    }

    /// Removes a node and every connection touching its pins. `false` if absent.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        let Some(index) = self.nodes.iter().position(|n| n.id() == id) else {
            return false;
        };
        let node = self.nodes.remove(index);
        self.detach_pins(node.pins());
        debug!(script = %self.name, node = %id, "node removed");
        self.publish(StructuralChange::NodeRemoved(id));
        true
    }

    /// Connects an output pin to an input pin.
    ///
    /// Replaces the input's previous connection, if any, which is reported in the single
    /// [`StructuralChange::Connected`] event. Returns `false` (no-op) if either pin is missing,
    /// the directions or types do not fit, or the connection already exists.
    pub fn connect(&mut self, output: PinId, input: PinId) -> bool {
        let (Some(from), Some(to)) = (self.pin(output), self.pin(input)) else {
            return false;
        };
        if from.direction() != PinDirection::Output
            || to.direction() != PinDirection::Input
            || !to.value_type().can_connect_from(from.value_type())
        {
            return false;
        }
        if to.connections().contains(&output) {
            return false;
        }

        let previous: Vec<PinId> = to.connections().to_vec();
        let replaced = previous.first().copied();
        for old in previous {
            if let Some(pin) = self.pin_mut(old) {
                pin.detach(input);
            }
        }
        if let Some(to) = self.pin_mut(input) {
            to.clear_connections();
            to.attach(output);
        }
        if let Some(from) = self.pin_mut(output) {
            from.attach(input);
        }
        self.publish(StructuralChange::Connected {
            output,
            input,
            replaced,
        });
        true
    }

    /// Removes a connection. `false` (no-op) if it does not exist.
    pub fn disconnect(&mut self, output: PinId, input: PinId) -> bool {
        let connected = self
            .pin(input)
            .is_some_and(|p| p.direction() == PinDirection::Input && p.connections().contains(&output));
        if !connected {
            return false;
        }
        if let Some(pin) = self.pin_mut(input) {
            pin.detach(output);
        }
        if let Some(pin) = self.pin_mut(output) {
            pin.detach(input);
        }
        self.publish(StructuralChange::Disconnected { output, input });
        true
    }

    /// Every connection as `(output, input)`, in node and pin order.
    pub fn connections(&self) -> Vec<(PinId, PinId)> {
        self.nodes
            .iter()
            .flat_map(|n| n.outputs())
            .flat_map(|p| p.connections().iter().map(move |input| (p.id(), *input)))
            .collect()
    }

    /// Binds a Layer Property or Data Binding Exit node to a layer property and rebuilds its
    /// pins. `false` if the node is missing or of another kind.
    ///
    /// Every accepted rebind publishes one [`StructuralChange::BindingChanged`], even when
    /// the new target has the same pin layout.
    pub fn rebind_layer_property(
        &mut self,
        node: NodeId,
        element: Option<ElementId>,
        property_path: Option<String>,
        ctx: &dyn ScriptContext,
    ) -> bool {
        let Some(target) = self.node_mut(node) else {
            return false;
        };
        match target.kind_mut() {
            NodeKind::LayerProperty(binding) | NodeKind::DataBindingExit(binding) => {
                binding.element_id = element;
                binding.property_path = element.and(property_path);
            }
            _ => return false,
        }
        let pins_changed = self.sync_node(node, ctx);
        self.publish(StructuralChange::BindingChanged { node, pins_changed });
        true
    }

    /// Binds a Data Model node to a path and rebuilds its pins.
    pub fn rebind_data_model(
        &mut self,
        node: NodeId,
        path: Option<DataModelPath>,
        ctx: &dyn ScriptContext,
    ) -> bool {
        let Some(target) = self.node_mut(node) else {
            return false;
        };
        match target.kind_mut() {
            NodeKind::DataModel(current) => *current = path,
            _ => return false,
        }
        let pins_changed = self.sync_node(node, ctx);
        self.publish(StructuralChange::BindingChanged { node, pins_changed });
        true
    }

    /// Brings every dynamic node's pins in line with the external state it depends on.
    /// Returns how many nodes were reshaped.
    ///
    /// A node whose bound element vanished is unbound and reported as
    /// [`StructuralChange::BindingChanged`]; a plain reshape as [`StructuralChange::PinsChanged`].
    pub fn refresh_pins(&mut self, ctx: &dyn ScriptContext) -> usize {
        let dynamic: Vec<(NodeId, NodeKind)> = self
            .nodes
            .iter()
            .filter(|n| n.kind().is_dynamic())
            .map(|n| (n.id(), n.kind().clone()))
            .collect();
        let mut reshaped = 0;
        for (id, before) in dynamic {
            let pins_changed = self.sync_node(id, ctx);
            let rebound = self.node(id).is_some_and(|n| *n.kind() != before);
            if rebound {
                self.publish(StructuralChange::BindingChanged {
                    node: id,
                    pins_changed,
                });
            } else if pins_changed {
                self.publish(StructuralChange::PinsChanged(id));
            }
            reshaped += usize::from(pins_changed);
        }
        reshaped
    }

    /// Rebuilds the node's pins if its desired layout differs. Publishes nothing.
    fn sync_node(&mut self, id: NodeId, ctx: &dyn ScriptContext) -> bool {
        let Some(node) = self.nodes.iter_mut().find(|n| n.id() == id) else {
            return false;
        };
        let Some((direction, layout)) = node.desired_layout(ctx) else {
            return false;
        };
        if node.layout(direction) == layout {
            return false;
        }
        let removed = node.reshape(direction, &layout, &mut self.ids);
        self.detach_pins(&removed);
        debug!(script = %self.name, node = %id, pins = layout.len(), "pins reshaped");
        true
    }

    /// Drops the far ends of every connection of `pins`.
    fn detach_pins(&mut self, pins: &[Pin]) {
        let mut dangling: AHashMap<PinId, Vec<PinId>> = AHashMap::new();
        for pin in pins {
            for other in pin.connections() {
                dangling.entry(*other).or_default().push(pin.id());
            }
        }
        for (other, gone) in dangling {
            if let Some(pin) = self.pin_mut(other) {
                for id in gone {
                    pin.detach(id);
                }
            }
        }
    }
}

impl std::fmt::Debug for NodeScript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeScript")
            .field("name", &self.name)
            .field("nodes", &self.nodes)
            .finish()
    }
}
