use super::{NodeId, NodeScript, PinId, ScriptContext};
use crate::error::ScriptError;
use crate::value::Value;
use ahash::AHashMap;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{trace, warn};

impl NodeScript {
    /// Orders the nodes so that every node comes after all nodes feeding its inputs.
    pub fn evaluation_order(&self) -> Result<Vec<NodeId>, ScriptError> {
        let mut graph: DiGraph<NodeId, ()> = DiGraph::with_capacity(self.nodes.len(), 0);
        let indices: AHashMap<NodeId, NodeIndex> = self
            .nodes
            .iter()
            .map(|n| (n.id(), graph.add_node(n.id())))
            .collect();

        for (output, input) in self.connections() {
            let (Some(from), Some(to)) = (self.pin(output), self.pin(input)) else {
                continue;
            };
            if let (Some(&a), Some(&b)) = (indices.get(&from.node()), indices.get(&to.node())) {
                graph.update_edge(a, b, ());
            }
        }

        toposort(&graph, None)
            .map(|sorted| sorted.into_iter().map(|idx| graph[idx]).collect())
            .map_err(|cycle| ScriptError::GraphCycleDetected {
                node: graph[cycle.node_id()],
            })
    }

    /// Runs one evaluation pass.
    ///
    /// The graph is checked for cycles first. On a cycle nothing is touched: pins are not
    /// refreshed, nothing is evaluated and every pin keeps its previous value.
    ///
    /// Otherwise dynamic pins are refreshed, then each node's inputs are loaded from their
    /// sources, coerced into the input's type, or reset to the input's default when
    /// unconnected. A refresh only drops connections, so the order stays valid.
    pub fn evaluate(&mut self, ctx: &dyn ScriptContext) -> Result<(), ScriptError> {
        let order = self.evaluation_order().inspect_err(|err| {
            warn!(script = %self.name, error = %err, "skipping evaluation pass");
        })?;
        self.refresh_pins(ctx);

        for id in order {
            let incoming = self.gather_inputs(id);
            let Some(node) = self.nodes.iter_mut().find(|n| n.id() == id) else {
                continue;
            };
            for (pin_id, source) in incoming {
                let Some(pin) = node.pin_mut(pin_id) else {
                    continue;
                };
                match source {
                    Some(value) => pin.cell_mut().set_coerced(value.as_ref()),
                    None => pin.reset_to_default(),
                }
            }
            node.evaluate(ctx);
            trace!(script = %self.name, node = %id, "node evaluated");
        }
        Ok(())
    }

    /// For every input of `node`: `Some(source value)` if connected, `None` if not.
    fn gather_inputs(&self, node: NodeId) -> Vec<(PinId, Option<Option<Value>>)> {
        let Some(node) = self.node(node) else {
            return Vec::new();
        };
        node.inputs()
            .map(|input| {
                let source = input
                    .connections()
                    .first()
                    .and_then(|source| self.pin(*source))
                    .map(|source| source.cell().value().cloned());
                (input.id(), source)
            })
            .collect()
    }
}
