// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the graph framework.
//!
//! A [`Node`] owns its pins and a boxed [`NodeKind`], the capability set
//! each concrete node type implements. Resolve-then-execute is driven by
//! the engine and cannot be overridden by a kind.

use crate::execution::NodeContext;
use crate::pin::{Pin, PinAllocator, PinDirection, PinId, PinKind, PinRef};
use crate::value::{DataType, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Scalar node properties, in declaration order
pub type Properties = IndexMap<String, Value>;

/// Capability interface implemented by every node type
pub trait NodeKind: fmt::Debug {
    /// Populate the default pins. Called exactly once, before the node
    /// joins a graph; must be deterministic for a given configuration.
    fn allocate_default_pins(&self, pins: &mut PinAllocator<'_>);

    /// Node-specific work, run after the engine resolved data inputs
    fn execute(&mut self, cx: &mut NodeContext<'_>) -> Result<(), NodeError>;

    /// Auto-run nodes are evaluated on demand by their consumers' resolve step
    fn auto_run(&self) -> bool {
        false
    }

    /// Clear per-instance state carried between activations.
    ///
    /// The engine calls this for every node when a run starts.
    fn reset(&mut self) {}

    /// Scalar property values, used by persistence and property edits
    fn properties(&self) -> Properties {
        Properties::new()
    }

    /// Update a property on a live node
    fn set_property(&mut self, name: &str, _value: Value) -> Result<(), NodeError> {
        Err(NodeError::UnknownProperty(name.to_string()))
    }
}

/// A node instance in the graph
#[derive(Debug)]
pub struct Node {
    id: NodeId,
    name: String,
    path: String,
    pins: Vec<Pin>,
    kind: Box<dyn NodeKind>,
}

impl Node {
    /// Create a node and allocate its default pins
    pub fn new(name: impl Into<String>, path: impl Into<String>, kind: impl NodeKind + 'static) -> Self {
        Self::from_boxed(NodeId::new(), name, path, Box::new(kind))
    }

    /// Create a node with a fixed ID from an already boxed kind
    pub fn from_boxed(
        id: NodeId,
        name: impl Into<String>,
        path: impl Into<String>,
        kind: Box<dyn NodeKind>,
    ) -> Self {
        let mut pins = Vec::new();
        kind.allocate_default_pins(&mut PinAllocator::new(id, &mut pins));
        Self {
            id,
            name: name.into(),
            path: path.into(),
            pins,
            kind,
        }
    }

    /// Node ID
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the node
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Registry path the node was created from
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether consumers evaluate this node on demand
    pub fn is_auto_run(&self) -> bool {
        self.kind.auto_run()
    }

    /// All pins, in allocation order
    pub fn pins(&self) -> &[Pin] {
        &self.pins
    }

    /// Get a pin by ID
    pub fn pin(&self, id: PinId) -> Option<&Pin> {
        self.pins.iter().find(|p| p.id() == id)
    }

    /// Get a mutable pin by ID
    pub fn pin_mut(&mut self, id: PinId) -> Option<&mut Pin> {
        self.pins.iter_mut().find(|p| p.id() == id)
    }

    /// First pin with the given name
    pub fn find_pin(&self, name: &str) -> Option<&Pin> {
        self.pins.iter().find(|p| p.name() == name)
    }

    /// First pin with the given name and direction
    pub fn find_pin_in(&self, name: &str, direction: PinDirection) -> Option<&Pin> {
        self.pins
            .iter()
            .find(|p| p.name() == name && p.direction() == direction)
    }

    /// Mutable pin lookup by name
    pub fn find_pin_mut(&mut self, name: &str) -> Option<&mut Pin> {
        self.pins.iter_mut().find(|p| p.name() == name)
    }

    /// Reference to a named pin, for connecting
    pub fn pin_ref(&self, name: &str) -> Option<PinRef> {
        self.find_pin(name).map(Pin::pin_ref)
    }

    /// Whether any pin is an execute pin
    pub fn has_execute_pin(&self) -> bool {
        self.pins
            .iter()
            .any(|p| p.kind() == PinKind::Execute)
    }

    /// Property values of the node kind
    pub fn properties(&self) -> Properties {
        self.kind.properties()
    }

    /// Update a property of the node kind
    pub fn set_property(&mut self, name: &str, value: Value) -> Result<(), NodeError> {
        self.kind.set_property(name, value)
    }

    /// The node kind
    pub fn kind(&self) -> &dyn NodeKind {
        self.kind.as_ref()
    }

    pub(crate) fn reset(&mut self) {
        self.kind.reset();
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut [Pin], &mut dyn NodeKind) {
        (&mut self.pins, self.kind.as_mut())
    }
}

/// Error raised by a node while it executes
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// Pin name not present on the node
    #[error("Pin not found: {0}")]
    MissingPin(String),

    /// Pin holds a value of the wrong type
    #[error("Type mismatch on pin {pin}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Pin name
        pin: String,
        /// Expected type
        expected: DataType,
        /// Runtime type of the value found
        found: DataType,
    },

    /// Wrapped callable reported a failure
    #[error("Function failed: {0}")]
    Function(String),

    /// Data inputs nested deeper than the configured limit
    #[error("Resolve depth exceeded the limit of {0}")]
    ResolveDepthExceeded(usize),

    /// A connector points at a node or pin that is no longer in the graph
    #[error("Dangling connector: {0}")]
    DanglingConnector(String),

    /// Property name not known to the node kind
    #[error("Unknown property: {0}")]
    UnknownProperty(String),

    /// Property value rejected by the node kind
    #[error("Invalid value for property {name}: {reason}")]
    InvalidProperty {
        /// Property name
        name: String,
        /// Why it was rejected
        reason: String,
    },
}
