// SPDX-License-Identifier: MIT OR Apache-2.0
//! Concrete graph edits.
//!
//! Each command moves graph state in and out of itself: a removed node
//! is held by the command until it is restored, so redo puts back the
//! very same node with its pins and IDs intact.

use crate::command::{CommandError, GraphCommand};
use flownode_graph::{
    Connector, ConnectorId, DataType, GraphEngine, GraphError, Node, NodeError, NodeId, PinKind,
    PinRef, RemovedNode, Value, Variable,
};

fn not_applied(what: &str) -> CommandError {
    CommandError::InvalidState(format!("{what} has not been applied"))
}

fn already_applied(what: &str) -> CommandError {
    CommandError::InvalidState(format!("{what} is already applied"))
}

/// Where a node lives while it is not in the graph
#[derive(Debug)]
enum Detached {
    Fresh(Node),
    Removed(RemovedNode),
}

/// Command to add a node
#[derive(Debug)]
pub struct AddNodeCommand {
    node_id: NodeId,
    description: String,
    detached: Option<Detached>,
}

impl AddNodeCommand {
    /// Create a new add command for a node that is not yet in a graph
    pub fn new(node: Node) -> Self {
        Self {
            node_id: node.id(),
            description: format!("Add {}", node.name()),
            detached: Some(Detached::Fresh(node)),
        }
    }

    /// ID of the node being added
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }
}

impl GraphCommand for AddNodeCommand {
    fn description(&self) -> &str {
        &self.description
    }

    fn execute(&mut self, engine: &mut GraphEngine) -> Result<(), CommandError> {
        if engine.node(self.node_id).is_some() {
            return Err(GraphError::DuplicateNode(self.node_id).into());
        }
        match self.detached.take() {
            Some(Detached::Fresh(node)) => {
                engine.add_node(node)?;
            }
            Some(Detached::Removed(removed)) => {
                engine.restore_node(removed)?;
            }
            None => return Err(already_applied(&self.description)),
        }
        Ok(())
    }

    fn undo(&mut self, engine: &mut GraphEngine) -> Result<(), CommandError> {
        if self.detached.is_some() {
            return Err(not_applied(&self.description));
        }
        let removed = engine
            .remove_node(self.node_id)
            .ok_or(GraphError::NodeNotFound(self.node_id))?;
        self.detached = Some(Detached::Removed(removed));
        Ok(())
    }
}

/// Command to remove a node and the connectors touching it
#[derive(Debug)]
pub struct RemoveNodeCommand {
    node_id: NodeId,
    removed: Option<RemovedNode>,
}

impl RemoveNodeCommand {
    /// Create a new remove command
    pub fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            removed: None,
        }
    }
}

impl GraphCommand for RemoveNodeCommand {
    fn description(&self) -> &str {
        "Remove Node"
    }

    fn execute(&mut self, engine: &mut GraphEngine) -> Result<(), CommandError> {
        if self.removed.is_some() {
            return Err(already_applied(self.description()));
        }
        let removed = engine
            .remove_node(self.node_id)
            .ok_or(GraphError::NodeNotFound(self.node_id))?;
        self.removed = Some(removed);
        Ok(())
    }

    fn undo(&mut self, engine: &mut GraphEngine) -> Result<(), CommandError> {
        if engine.node(self.node_id).is_some() {
            return Err(GraphError::DuplicateNode(self.node_id).into());
        }
        let removed = self.removed.take().ok_or_else(|| not_applied("Remove Node"))?;
        engine.restore_node(removed)?;
        Ok(())
    }
}

/// Command to connect an output pin to an input pin
#[derive(Debug)]
pub struct AddConnectorCommand {
    src: PinRef,
    dst: PinRef,
    applied: Option<ConnectorId>,
    removed: Option<(usize, Connector)>,
}

impl AddConnectorCommand {
    /// Create a new connect command
    pub fn new(src: PinRef, dst: PinRef) -> Self {
        Self {
            src,
            dst,
            applied: None,
            removed: None,
        }
    }

    /// ID of the connector, once it exists
    pub fn connector_id(&self) -> Option<ConnectorId> {
        self.applied
            .or_else(|| self.removed.as_ref().map(|(_, c)| c.id))
    }
}

impl GraphCommand for AddConnectorCommand {
    fn description(&self) -> &str {
        "Add Connector"
    }

    fn execute(&mut self, engine: &mut GraphEngine) -> Result<(), CommandError> {
        if self.applied.is_some() {
            return Err(already_applied(self.description()));
        }
        // Redo restores the same connector at its old position
        let id = match self.removed {
            Some((index, connector)) => engine.restore_connector(index, connector)?,
            None => engine.add_connector(self.src, self.dst)?,
        };
        self.removed = None;
        self.applied = Some(id);
        Ok(())
    }

    fn undo(&mut self, engine: &mut GraphEngine) -> Result<(), CommandError> {
        let id = self.applied.ok_or_else(|| not_applied("Add Connector"))?;
        let removed = engine
            .remove_connector(id)
            .ok_or(GraphError::ConnectorNotFound(id))?;
        self.applied = None;
        self.removed = Some(removed);
        Ok(())
    }
}

/// Command to remove a connector
#[derive(Debug)]
pub struct RemoveConnectorCommand {
    connector_id: ConnectorId,
    removed: Option<(usize, Connector)>,
}

impl RemoveConnectorCommand {
    /// Create a new disconnect command
    pub fn new(connector_id: ConnectorId) -> Self {
        Self {
            connector_id,
            removed: None,
        }
    }
}

impl GraphCommand for RemoveConnectorCommand {
    fn description(&self) -> &str {
        "Remove Connector"
    }

    fn execute(&mut self, engine: &mut GraphEngine) -> Result<(), CommandError> {
        if self.removed.is_some() {
            return Err(already_applied(self.description()));
        }
        let removed = engine
            .remove_connector(self.connector_id)
            .ok_or(GraphError::ConnectorNotFound(self.connector_id))?;
        self.removed = Some(removed);
        Ok(())
    }

    fn undo(&mut self, engine: &mut GraphEngine) -> Result<(), CommandError> {
        let (index, connector) = self.removed.ok_or_else(|| not_applied("Remove Connector"))?;
        engine.restore_connector(index, connector)?;
        self.removed = None;
        Ok(())
    }
}

/// Command to add or update a variable
#[derive(Debug)]
pub struct SetVariableCommand {
    key: String,
    value: Value,
    data_type: DataType,
    // Outer None: not applied. Inner None: the key was new.
    previous: Option<Option<Variable>>,
}

impl SetVariableCommand {
    /// Create a new set command
    pub fn new(key: impl Into<String>, value: Value, data_type: DataType) -> Self {
        Self {
            key: key.into(),
            value,
            data_type,
            previous: None,
        }
    }
}

impl GraphCommand for SetVariableCommand {
    fn description(&self) -> &str {
        "Set Variable"
    }

    fn execute(&mut self, engine: &mut GraphEngine) -> Result<(), CommandError> {
        if self.previous.is_some() {
            return Err(already_applied(self.description()));
        }
        let previous = engine.variables().entry(&self.key).cloned();
        engine.set_variable(self.key.clone(), self.value.clone(), self.data_type.clone());
        self.previous = Some(previous);
        Ok(())
    }

    fn undo(&mut self, engine: &mut GraphEngine) -> Result<(), CommandError> {
        match &self.previous {
            // Overwriting keeps the key's position
            Some(Some(old)) => {
                engine.set_variable(self.key.clone(), old.value.clone(), old.data_type.clone());
            }
            Some(None) => {
                engine
                    .remove_variable(&self.key)
                    .ok_or_else(|| CommandError::VariableNotFound(self.key.clone()))?;
            }
            None => return Err(not_applied("Set Variable")),
        }
        self.previous = None;
        Ok(())
    }
}

/// Command to remove a variable
#[derive(Debug)]
pub struct RemoveVariableCommand {
    key: String,
    removed: Option<(usize, Variable)>,
}

impl RemoveVariableCommand {
    /// Create a new remove command
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            removed: None,
        }
    }
}

impl GraphCommand for RemoveVariableCommand {
    fn description(&self) -> &str {
        "Remove Variable"
    }

    fn execute(&mut self, engine: &mut GraphEngine) -> Result<(), CommandError> {
        if self.removed.is_some() {
            return Err(already_applied(self.description()));
        }
        let removed = engine
            .remove_variable(&self.key)
            .ok_or_else(|| CommandError::VariableNotFound(self.key.clone()))?;
        self.removed = Some(removed);
        Ok(())
    }

    fn undo(&mut self, engine: &mut GraphEngine) -> Result<(), CommandError> {
        let (index, variable) = self
            .removed
            .take()
            .ok_or_else(|| not_applied("Remove Variable"))?;
        engine.variables_mut().insert_at(index, self.key.clone(), variable);
        Ok(())
    }
}

/// Command to edit the literal value of a data pin.
///
/// Undo restores the previous value, not the pin's
/// [`revision`](flownode_graph::Pin::revision): both directions count as
/// changes.
#[derive(Debug)]
pub struct SetPinValueCommand {
    pin: PinRef,
    value: Value,
    previous: Option<Value>,
}

impl SetPinValueCommand {
    /// Create a new pin edit
    pub fn new(pin: PinRef, value: Value) -> Self {
        Self {
            pin,
            value,
            previous: None,
        }
    }
}

impl GraphCommand for SetPinValueCommand {
    fn description(&self) -> &str {
        "Set Pin Value"
    }

    fn execute(&mut self, engine: &mut GraphEngine) -> Result<(), CommandError> {
        if self.previous.is_some() {
            return Err(already_applied(self.description()));
        }
        if engine.node(self.pin.node).is_none() {
            return Err(GraphError::NodeNotFound(self.pin.node).into());
        }
        let pin = engine.pin_mut(self.pin).ok_or(GraphError::PinNotFound(self.pin))?;
        if pin.kind() != PinKind::Data {
            return Err(CommandError::InvalidState(format!(
                "pin {} carries no value",
                pin.name()
            )));
        }
        // Null clears the pin; anything else must fit the declared type
        if let Some(expected) = pin.data_type() {
            let found = self.value.data_type();
            if !self.value.is_null() && !expected.is_assignable_from(&found) {
                return Err(NodeError::TypeMismatch {
                    pin: pin.name().to_string(),
                    expected: expected.clone(),
                    found,
                }
                .into());
            }
        }
        let previous = pin.value().clone();
        pin.set_value(self.value.clone());
        self.previous = Some(previous);
        Ok(())
    }

    fn undo(&mut self, engine: &mut GraphEngine) -> Result<(), CommandError> {
        let pin = engine.pin_mut(self.pin).ok_or(GraphError::PinNotFound(self.pin))?;
        let previous = self.previous.take().ok_or_else(|| not_applied("Set Pin Value"))?;
        pin.set_value(previous);
        Ok(())
    }
}

/// Command to edit a node kind property, such as a loop count
#[derive(Debug)]
pub struct SetPropertyCommand {
    node_id: NodeId,
    name: String,
    value: Value,
    previous: Option<Value>,
}

impl SetPropertyCommand {
    /// Create a new property edit
    pub fn new(node_id: NodeId, name: impl Into<String>, value: Value) -> Self {
        Self {
            node_id,
            name: name.into(),
            value,
            previous: None,
        }
    }
}

impl GraphCommand for SetPropertyCommand {
    fn description(&self) -> &str {
        "Set Property"
    }

    fn execute(&mut self, engine: &mut GraphEngine) -> Result<(), CommandError> {
        if self.previous.is_some() {
            return Err(already_applied(self.description()));
        }
        let node = engine
            .node_mut(self.node_id)
            .ok_or(GraphError::NodeNotFound(self.node_id))?;
        let previous = node
            .properties()
            .get(&self.name)
            .cloned()
            .ok_or_else(|| NodeError::UnknownProperty(self.name.clone()))?;
        node.set_property(&self.name, self.value.clone())?;
        self.previous = Some(previous);
        Ok(())
    }

    fn undo(&mut self, engine: &mut GraphEngine) -> Result<(), CommandError> {
        let node = engine
            .node_mut(self.node_id)
            .ok_or(GraphError::NodeNotFound(self.node_id))?;
        let previous = self.previous.clone().ok_or_else(|| not_applied("Set Property"))?;
        node.set_property(&self.name, previous)?;
        self.previous = None;
        Ok(())
    }
}
