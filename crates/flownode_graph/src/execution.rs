// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph execution: entry discovery, the execution stack, resolve/execute.
//!
//! A run pops nodes off a LIFO stack. Each activation first *resolves*
//! the node's data inputs, pulling values across data connectors and
//! running auto-run producers on demand (unmemoized), then *executes*
//! the node, which pushes whatever runs next.
//!
//! Execution is single-threaded and not re-entrant. Per-node state such
//! as a loop counter lives in the node instance.

use crate::connector::{Connector, ConnectorId};
use crate::engine::{GraphEngine, GraphError};
use crate::node::{NodeError, NodeId};
use crate::pin::{Pin, PinId, PinRef};
use crate::value::{DataType, Value};
use crate::variables::VariableStore;
use indexmap::IndexMap;

/// Summary of a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Number of entry nodes the run started from
    pub entry_nodes: usize,
    /// Number of nodes popped off the execution stack
    pub activations: usize,
}

impl GraphEngine {
    /// Entry nodes in discovery order.
    ///
    /// An entry node declares at least one execute pin and has no
    /// connected execute input. The node list is scanned newest first.
    pub fn entry_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .values()
            .rev()
            .filter(|node| node.has_execute_pin())
            .filter(|node| {
                !node
                    .pins()
                    .iter()
                    .filter(|p| p.is_execute_input())
                    .any(|p| self.connectors.values().any(|c| c.dst == p.pin_ref()))
            })
            .map(|node| node.id())
            .collect()
    }

    /// Push the node connected to an output pin onto the execution stack.
    ///
    /// Returns whether anything was pushed.
    pub fn push_next_connect_node(&mut self, pin: PinRef) -> bool {
        push_connected(&self.connectors, &mut self.stack, pin)
    }

    /// Push a node onto the execution stack
    pub fn push_next_node(&mut self, node_id: NodeId) {
        self.stack.push(node_id);
    }

    /// Execute the graph from its entry nodes until the stack is empty.
    ///
    /// Entry nodes are pushed in reverse discovery order so the first
    /// discovered runs first. Any failure aborts the run and clears the
    /// stack; runs cannot be resumed.
    pub fn run(&mut self) -> Result<RunReport, GraphError> {
        self.stack.clear();
        for node in self.nodes.values_mut() {
            node.reset();
        }

        let entries = self.entry_nodes();
        if entries.is_empty() {
            return Err(GraphError::NoEntryNodes);
        }
        tracing::debug!(entries = entries.len(), nodes = self.nodes.len(), "run started");

        for &node_id in entries.iter().rev() {
            self.stack.push(node_id);
        }

        let mut activations = 0;
        while let Some(node_id) = self.stack.pop() {
            if let Err(err) = self.run_node(node_id, 0) {
                self.stack.clear();
                tracing::debug!(error = %err, activations, "run aborted");
                return Err(err);
            }
            activations += 1;
        }

        tracing::debug!(activations, "run finished");
        Ok(RunReport {
            entry_nodes: entries.len(),
            activations,
        })
    }

    /// Resolve then execute a single node
    fn run_node(&mut self, node_id: NodeId, depth: usize) -> Result<(), GraphError> {
        if depth > self.config.max_resolve_depth {
            return Err(self.execution_error(
                node_id,
                NodeError::ResolveDepthExceeded(self.config.max_resolve_depth),
            ));
        }
        self.resolve(node_id, depth)?;
        self.execute(node_id)
    }

    /// Pull upstream values into every connected data input
    fn resolve(&mut self, node_id: NodeId, depth: usize) -> Result<(), GraphError> {
        let node = self.nodes.get(&node_id).ok_or(GraphError::NodeNotFound(node_id))?;
        let inputs: Vec<(PinId, Connector)> = node
            .pins()
            .iter()
            .filter(|p| p.is_data_input())
            .filter_map(|p| self.find_connector(p.pin_ref()).map(|c| (p.id(), *c)))
            .collect();

        for (input, connector) in inputs {
            let producer = self.nodes.get(&connector.src.node).ok_or_else(|| {
                self.execution_error(
                    node_id,
                    NodeError::DanglingConnector(format!("producer {} is gone", connector.src.node)),
                )
            })?;
            if producer.is_auto_run() {
                self.run_node(connector.src.node, depth + 1)?;
            }

            let value = self
                .pin(connector.src)
                .map(|p| p.value().clone())
                .ok_or_else(|| {
                    self.execution_error(
                        node_id,
                        NodeError::DanglingConnector(format!("source pin {:?} is gone", connector.src)),
                    )
                })?;
            if let Some(pin) = self.nodes.get_mut(&node_id).and_then(|n| n.pin_mut(input)) {
                Pin::copy_data(pin, &value);
            }
        }
        Ok(())
    }

    fn execute(&mut self, node_id: NodeId) -> Result<(), GraphError> {
        let Self {
            nodes,
            connectors,
            variables,
            stack,
            ..
        } = self;
        let node = nodes.get_mut(&node_id).ok_or(GraphError::NodeNotFound(node_id))?;
        tracing::trace!(node = %node_id, name = node.name(), "execute");

        let name = node.name().to_string();
        let (pins, kind) = node.parts_mut();
        let mut cx = NodeContext {
            node: node_id,
            pins,
            connectors,
            variables,
            stack,
        };
        kind.execute(&mut cx).map_err(|source| GraphError::Execution {
            node: node_id,
            name,
            source,
        })
    }

    fn execution_error(&self, node_id: NodeId, source: NodeError) -> GraphError {
        let name = self
            .nodes
            .get(&node_id)
            .map(|n| n.name().to_string())
            .unwrap_or_default();
        GraphError::Execution {
            node: node_id,
            name,
            source,
        }
    }
}

fn push_connected(
    connectors: &IndexMap<ConnectorId, Connector>,
    stack: &mut Vec<NodeId>,
    pin: PinRef,
) -> bool {
    match connectors.values().find(|c| c.src == pin) {
        Some(connector) => {
            stack.push(connector.dst.node);
            true
        }
        None => false,
    }
}

/// What a node sees of the engine while it executes
#[derive(Debug)]
pub struct NodeContext<'a> {
    node: NodeId,
    pins: &'a mut [Pin],
    connectors: &'a IndexMap<ConnectorId, Connector>,
    variables: &'a mut VariableStore,
    stack: &'a mut Vec<NodeId>,
}

impl<'a> NodeContext<'a> {
    /// ID of the executing node
    pub fn node_id(&self) -> NodeId {
        self.node
    }

    /// The executing node's pins
    pub fn pins(&self) -> &[Pin] {
        &*self.pins
    }

    /// The executing node's pins, mutably
    pub fn pins_mut(&mut self) -> &mut [Pin] {
        &mut *self.pins
    }

    /// Pin by name
    pub fn pin(&self, name: &str) -> Result<&Pin, NodeError> {
        self.pins
            .iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| NodeError::MissingPin(name.to_string()))
    }

    /// Pin by name, mutably
    pub fn pin_mut(&mut self, name: &str) -> Result<&mut Pin, NodeError> {
        self.pins
            .iter_mut()
            .find(|p| p.name() == name)
            .ok_or_else(|| NodeError::MissingPin(name.to_string()))
    }

    /// Value of a named pin
    pub fn value(&self, name: &str) -> Result<&Value, NodeError> {
        self.pin(name).map(Pin::value)
    }

    /// Boolean value of a named pin
    pub fn bool_value(&self, name: &str) -> Result<bool, NodeError> {
        let value = self.value(name)?;
        value.as_bool().ok_or_else(|| NodeError::TypeMismatch {
            pin: name.to_string(),
            expected: DataType::Bool,
            found: value.data_type(),
        })
    }

    /// Set the value of a named pin
    pub fn set_value(&mut self, name: &str, value: Value) -> Result<(), NodeError> {
        self.pin_mut(name)?.set_value(value);
        Ok(())
    }

    /// Push whatever is connected to the named output pin.
    ///
    /// Returns whether anything was pushed.
    pub fn push_next_connect_node(&mut self, pin_name: &str) -> Result<bool, NodeError> {
        let pin = self.pin(pin_name)?.pin_ref();
        Ok(push_connected(self.connectors, &mut *self.stack, pin))
    }

    /// Push a node directly
    pub fn push_next_node(&mut self, node_id: NodeId) {
        self.stack.push(node_id);
    }

    /// Push the executing node again
    pub fn push_self(&mut self) {
        self.stack.push(self.node);
    }

    /// The variable store
    pub fn variables(&self) -> &VariableStore {
        &*self.variables
    }

    /// The variable store, mutably
    pub fn variables_mut(&mut self) -> &mut VariableStore {
        &mut *self.variables
    }
}
