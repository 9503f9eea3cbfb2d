// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph engine: node and connector sets, validation, variable store.
//!
//! Execution lives in [`crate::execution`].

use crate::config::EngineConfig;
use crate::connector::{Connector, ConnectorId};
use crate::node::{Node, NodeError, NodeId};
use crate::pin::{Pin, PinDirection, PinKind, PinRef};
use crate::value::{DataType, Value};
use crate::variables::{Variable, VariableStore};
use indexmap::IndexMap;
use std::collections::HashSet;

/// A node taken out of the graph together with the connectors that
/// referenced it, so it can be put back exactly where it was
#[derive(Debug)]
pub struct RemovedNode {
    /// Position in the node list
    pub index: usize,
    /// The node itself, pins and state intact
    pub node: Node,
    /// Cascaded connectors with their positions, ascending
    pub connectors: Vec<(usize, Connector)>,
}

/// The node graph and its execution state
#[derive(Debug, Default)]
pub struct GraphEngine {
    pub(crate) config: EngineConfig,
    pub(crate) nodes: IndexMap<NodeId, Node>,
    pub(crate) connectors: IndexMap<ConnectorId, Connector>,
    pub(crate) variables: VariableStore,
    pub(crate) stack: Vec<NodeId>,
}

impl GraphEngine {
    /// Create an empty engine with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty engine with the given configuration
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ---- nodes ----

    /// Add a node to the graph
    pub fn add_node(&mut self, node: Node) -> Result<NodeId, GraphError> {
        let id = node.id();
        if self.nodes.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        tracing::debug!(node = %id, name = node.name(), "add node");
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Remove a node and every connector that references it
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<RemovedNode> {
        let (index, _, node) = self.nodes.shift_remove_full(&node_id)?;

        let positions: Vec<usize> = self
            .connectors
            .values()
            .enumerate()
            .filter(|(_, c)| c.involves_node(node_id))
            .map(|(i, _)| i)
            .collect();

        // Remove back to front so earlier positions stay valid
        let mut connectors = Vec::with_capacity(positions.len());
        for &position in positions.iter().rev() {
            if let Some((_, connector)) = self.connectors.shift_remove_index(position) {
                connectors.push((position, connector));
            }
        }
        connectors.reverse();

        tracing::debug!(
            node = %node_id,
            cascaded = connectors.len(),
            "remove node"
        );
        Some(RemovedNode {
            index,
            node,
            connectors,
        })
    }

    /// Put a removed node and its connectors back at their positions
    pub fn restore_node(&mut self, removed: RemovedNode) -> Result<NodeId, GraphError> {
        let RemovedNode {
            index,
            node,
            connectors,
        } = removed;
        let id = node.id();
        if self.nodes.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        let index = index.min(self.nodes.len());
        self.nodes.shift_insert(index, id, node);

        for (position, connector) in connectors {
            if let Err(err) = self.restore_connector(position, connector) {
                tracing::warn!(node = %id, error = %err, "connector not restored");
            }
        }
        Ok(id)
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable node by ID
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// All nodes, in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All node IDs, in insertion order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // ---- pins ----

    /// Reference to the first pin named `name` on a node
    pub fn find_pin(&self, node_id: NodeId, name: &str) -> Option<PinRef> {
        self.nodes.get(&node_id)?.pin_ref(name)
    }

    /// Resolve a pin reference
    pub fn pin(&self, pin: PinRef) -> Option<&Pin> {
        self.nodes.get(&pin.node)?.pin(pin.pin)
    }

    /// Resolve a pin reference mutably
    pub fn pin_mut(&mut self, pin: PinRef) -> Option<&mut Pin> {
        self.nodes.get_mut(&pin.node)?.pin_mut(pin.pin)
    }

    fn require_pin(&self, pin: PinRef) -> Result<&Pin, GraphError> {
        let node = self
            .nodes
            .get(&pin.node)
            .ok_or(GraphError::NodeNotFound(pin.node))?;
        node.pin(pin.pin).ok_or(GraphError::PinNotFound(pin))
    }

    // ---- connectors ----

    /// Check whether `src -> dst` would be a valid connector
    pub fn validate_connector(&self, src: PinRef, dst: PinRef) -> Result<(), GraphError> {
        let source = self.require_pin(src)?;
        let target = self.require_pin(dst)?;
        validate_pins(source, target)?;
        Ok(())
    }

    /// Add a validated connector between an output and an input pin.
    ///
    /// No cycle check is made: control-flow loops are legitimate.
    pub fn add_connector(&mut self, src: PinRef, dst: PinRef) -> Result<ConnectorId, GraphError> {
        self.validate_connector(src, dst)?;
        let connector = Connector::new(src, dst);
        let id = connector.id;
        self.connectors.insert(id, connector);
        tracing::debug!(connector = ?id, "add connector");
        Ok(id)
    }

    /// Re-insert a previously removed connector at its old position
    pub fn restore_connector(&mut self, index: usize, connector: Connector) -> Result<ConnectorId, GraphError> {
        self.validate_connector(connector.src, connector.dst)?;
        let index = index.min(self.connectors.len());
        self.connectors.shift_insert(index, connector.id, connector);
        Ok(connector.id)
    }

    /// Remove a connector, returning its position and contents
    pub fn remove_connector(&mut self, connector_id: ConnectorId) -> Option<(usize, Connector)> {
        let (index, _, connector) = self.connectors.shift_remove_full(&connector_id)?;
        tracing::debug!(connector = ?connector_id, "remove connector");
        Some((index, connector))
    }

    /// Get a connector by ID
    pub fn connector(&self, connector_id: ConnectorId) -> Option<&Connector> {
        self.connectors.get(&connector_id)
    }

    /// All connectors, in insertion order
    pub fn connectors(&self) -> impl Iterator<Item = &Connector> {
        self.connectors.values()
    }

    /// Number of connectors
    pub fn connector_count(&self) -> usize {
        self.connectors.len()
    }

    /// The connector feeding an input pin, if any.
    ///
    /// When several connectors target the same input the first added wins.
    pub fn find_connector(&self, pin: PinRef) -> Option<&Connector> {
        self.connectors.values().find(|c| c.dst == pin)
    }

    /// Connectors leaving a pin
    pub fn connectors_from(&self, pin: PinRef) -> impl Iterator<Item = &Connector> {
        self.connectors.values().filter(move |c| c.src == pin)
    }

    /// Connectors touching a node
    pub fn connectors_for_node(&self, node_id: NodeId) -> impl Iterator<Item = &Connector> {
        self.connectors.values().filter(move |c| c.involves_node(node_id))
    }

    /// Whether a data connector from `src` to `dst` would close a
    /// data-dependency cycle. Execute connectors are ignored, so loops
    /// built from control flow are never reported.
    ///
    /// `add_connector` does not call this.
    pub fn creates_data_cycle(&self, src: NodeId, dst: NodeId) -> bool {
        let mut visited = HashSet::new();
        self.has_data_path(dst, src, &mut visited)
    }

    fn has_data_path(&self, current: NodeId, target: NodeId, visited: &mut HashSet<NodeId>) -> bool {
        if current == target {
            return true;
        }
        if !visited.insert(current) {
            return false;
        }
        self.connectors
            .values()
            .filter(|c| c.src.node == current)
            .filter(|c| {
                self.pin(c.src)
                    .is_some_and(|p| p.kind() == PinKind::Data)
            })
            .any(|c| self.has_data_path(c.dst.node, target, visited))
    }

    // ---- variables ----

    /// Set a variable's value and declared type
    pub fn set_variable(&mut self, key: impl Into<String>, value: Value, data_type: DataType) {
        self.variables.set(key, value, data_type);
    }

    /// A variable's value
    pub fn variable(&self, key: &str) -> Option<&Value> {
        self.variables.get(key)
    }

    /// A variable's declared type
    pub fn variable_type(&self, key: &str) -> Option<&DataType> {
        self.variables.data_type(key)
    }

    /// Remove a variable, returning its position and contents
    pub fn remove_variable(&mut self, key: &str) -> Option<(usize, Variable)> {
        self.variables.remove(key)
    }

    /// Variable keys in insertion order
    pub fn variable_keys(&self) -> impl Iterator<Item = &str> {
        self.variables.keys()
    }

    /// The variable store
    pub fn variables(&self) -> &VariableStore {
        &self.variables
    }

    /// The variable store, mutably
    pub fn variables_mut(&mut self) -> &mut VariableStore {
        &mut self.variables
    }
}

/// Structural and type checks for a connector, in order: direction,
/// kind, then data type compatibility
pub fn validate_pins(src: &Pin, dst: &Pin) -> Result<(), ValidationError> {
    if src.direction() != PinDirection::Output || dst.direction() != PinDirection::Input {
        return Err(ValidationError::WrongDirection);
    }
    if src.kind() != dst.kind() {
        return Err(ValidationError::KindMismatch);
    }
    if src.kind() == PinKind::Data {
        let compatible = match (src.data_type(), dst.data_type()) {
            (Some(source), Some(target)) => target.is_assignable_from(source),
            _ => false,
        };
        if !compatible {
            return Err(ValidationError::IncompatibleTypes {
                source_type: describe(src.data_type()),
                target_type: describe(dst.data_type()),
            });
        }
    }
    Ok(())
}

fn describe(data_type: Option<&DataType>) -> String {
    data_type.map_or_else(|| "<none>".to_string(), ToString::to_string)
}

/// Malformed connector
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Connectors must run from an output pin to an input pin
    #[error("Wrong direction: connectors run from an output pin to an input pin")]
    WrongDirection,

    /// Execute and data pins cannot be connected
    #[error("Kind mismatch: execute and data pins cannot be connected")]
    KindMismatch,

    /// Target type does not accept the source type
    #[error("Incompatible data types: source is {source_type}, target is {target_type}")]
    IncompatibleTypes {
        /// Declared type of the source pin
        source_type: String,
        /// Declared type of the target pin
        target_type: String,
    },
}

/// Error from a graph operation
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Connector rejected before any mutation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// `run()` found nothing to start from
    #[error("No entry nodes found in the graph")]
    NoEntryNodes,

    /// A node failed during `run()`; the run was aborted
    #[error("Flow execution error in node {name} ({node}): {source}")]
    Execution {
        /// Failing node
        node: NodeId,
        /// Its display name
        name: String,
        /// What went wrong
        #[source]
        source: NodeError,
    },

    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Pin not found
    #[error("Pin not found: {0:?}")]
    PinNotFound(PinRef),

    /// Connector not found
    #[error("Connector not found: {0:?}")]
    ConnectorNotFound(ConnectorId),

    /// Node ID already present
    #[error("Node already in graph: {0}")]
    DuplicateNode(NodeId),
}
