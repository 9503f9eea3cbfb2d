// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pin definitions for node inputs/outputs.

use crate::node::NodeId;
use crate::value::{DataType, Value};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PinId(pub Uuid);

impl PinId {
    /// Create a new random pin ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PinId {
    fn default() -> Self {
        Self::new()
    }
}

/// Pin direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinDirection {
    /// Input pin
    Input,
    /// Output pin
    Output,
}

/// What a connection between two pins means
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinKind {
    /// Control flow: "what runs next"
    Execute,
    /// Data dependency: "where a value comes from"
    Data,
}

/// Non-owning reference to a pin on a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PinRef {
    /// Host node
    pub node: NodeId,
    /// Pin on the host node
    pub pin: PinId,
}

impl PinRef {
    /// Create a new pin reference
    pub fn new(node: NodeId, pin: PinId) -> Self {
        Self { node, pin }
    }
}

/// A pin on a node
#[derive(Debug, Clone, PartialEq)]
pub struct Pin {
    id: PinId,
    host: NodeId,
    name: String,
    direction: PinDirection,
    kind: PinKind,
    data_type: Option<DataType>,
    value: Value,
    revision: u64,
}

impl Pin {
    pub(crate) fn new(
        host: NodeId,
        name: impl Into<String>,
        direction: PinDirection,
        kind: PinKind,
        data_type: Option<DataType>,
        value: Value,
    ) -> Self {
        Self {
            id: PinId::new(),
            host,
            name: name.into(),
            direction,
            kind,
            data_type,
            value,
            revision: 0,
        }
    }

    /// Pin ID
    pub fn id(&self) -> PinId {
        self.id
    }

    /// Node that owns this pin
    pub fn host(&self) -> NodeId {
        self.host
    }

    /// Reference usable by connectors
    pub fn pin_ref(&self) -> PinRef {
        PinRef::new(self.host, self.id)
    }

    /// Pin name, unique per node by convention
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pin direction
    pub fn direction(&self) -> PinDirection {
        self.direction
    }

    /// Pin kind
    pub fn kind(&self) -> PinKind {
        self.kind
    }

    /// Declared data type (`None` for execute pins)
    pub fn data_type(&self) -> Option<&DataType> {
        self.data_type.as_ref()
    }

    /// Current value
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Number of observable value changes made through [`Pin::set_value`].
    ///
    /// Only ever increases. Restoring an earlier value, as an undo does,
    /// is a change of its own and bumps it again.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether this is an input data pin, the kind resolve pulls into
    pub fn is_data_input(&self) -> bool {
        self.direction == PinDirection::Input && self.kind == PinKind::Data
    }

    /// Whether this is an input execute pin
    pub fn is_execute_input(&self) -> bool {
        self.direction == PinDirection::Input && self.kind == PinKind::Execute
    }

    /// Set the value, bumping the revision when it changes.
    ///
    /// Returns whether the value changed.
    pub fn set_value(&mut self, value: Value) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        self.revision += 1;
        true
    }

    /// Assign `dst.value = src` without type checks or change notification.
    ///
    /// Types were validated when the connector was created.
    pub fn copy_data(dst: &mut Pin, src: &Value) {
        dst.value = src.clone();
    }
}

/// Builder handed to [`crate::node::NodeKind::allocate_default_pins`]
#[derive(Debug)]
pub struct PinAllocator<'a> {
    host: NodeId,
    pins: &'a mut Vec<Pin>,
}

impl<'a> PinAllocator<'a> {
    pub(crate) fn new(host: NodeId, pins: &'a mut Vec<Pin>) -> Self {
        Self { host, pins }
    }

    /// Add an execute pin
    pub fn execute(&mut self, name: impl Into<String>, direction: PinDirection) -> PinId {
        self.push(Pin::new(self.host, name, direction, PinKind::Execute, None, Value::Null))
    }

    /// Add a data pin initialised with the type's default value
    pub fn data(&mut self, name: impl Into<String>, direction: PinDirection, data_type: DataType) -> PinId {
        let value = data_type.default_value();
        self.data_with_value(name, direction, data_type, value)
    }

    /// Add a data pin with an explicit initial value
    pub fn data_with_value(
        &mut self,
        name: impl Into<String>,
        direction: PinDirection,
        data_type: DataType,
        value: Value,
    ) -> PinId {
        self.push(Pin::new(self.host, name, direction, PinKind::Data, Some(data_type), value))
    }

    fn push(&mut self, pin: Pin) -> PinId {
        let id = pin.id;
        self.pins.push(pin);
        id
    }
}
