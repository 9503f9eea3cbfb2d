// SPDX-License-Identifier: MIT OR Apache-2.0
//! Variable access nodes, bound to one key of the engine's variable store.

use super::{PIN_INPUT, PIN_OUTPUT};
use crate::execution::NodeContext;
use crate::node::{NodeError, NodeKind, Properties};
use crate::pin::{PinAllocator, PinDirection};
use crate::value::{DataType, Value};

/// Property naming the variable
pub const PROP_KEY: &str = "key";
/// Property naming the declared type of a getter's output
pub const PROP_DATA_TYPE: &str = "data_type";

fn text_property(properties: &Properties, name: &str) -> Result<Option<String>, NodeError> {
    match properties.get(name) {
        None => Ok(None),
        Some(Value::Text(text)) => Ok(Some(text.clone())),
        Some(other) => Err(invalid_text(name, other)),
    }
}

fn invalid_text(name: &str, value: &Value) -> NodeError {
    NodeError::InvalidProperty {
        name: name.to_string(),
        reason: format!("expected Text, got {value:?}"),
    }
}

// The key names a pin, so it cannot change after allocation
fn fixed_property(name: &str) -> NodeError {
    NodeError::InvalidProperty {
        name: name.to_string(),
        reason: "fixed when the node is created".to_string(),
    }
}

fn required_key(properties: &Properties) -> Result<String, NodeError> {
    text_property(properties, PROP_KEY)?.ok_or_else(|| NodeError::InvalidProperty {
        name: PROP_KEY.to_string(),
        reason: "missing".to_string(),
    })
}

/// Reads a variable into an output pin named after its key.
///
/// Auto-run: it is evaluated each time a consumer resolves it. A missing
/// variable reads as `Null`.
#[derive(Debug, Clone)]
pub struct GetVariableNode {
    key: String,
    data_type: Option<DataType>,
}

impl GetVariableNode {
    /// Getter with an `Any` output
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            data_type: None,
        }
    }

    /// Getter whose output pin declares `data_type`
    pub fn typed(key: impl Into<String>, data_type: DataType) -> Self {
        Self {
            key: key.into(),
            data_type: Some(data_type),
        }
    }

    /// Build from stored properties
    pub fn from_properties(properties: &Properties) -> Result<Self, NodeError> {
        let key = required_key(properties)?;
        Ok(match text_property(properties, PROP_DATA_TYPE)? {
            Some(name) => Self::typed(key, name.parse().unwrap_or(DataType::Any)),
            None => Self::new(key),
        })
    }

    /// Variable key
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl NodeKind for GetVariableNode {
    fn allocate_default_pins(&self, pins: &mut PinAllocator<'_>) {
        let data_type = self.data_type.clone().unwrap_or(DataType::Any);
        pins.data(self.key.clone(), PinDirection::Output, data_type);
    }

    fn execute(&mut self, cx: &mut NodeContext<'_>) -> Result<(), NodeError> {
        let value = cx.variables().get(&self.key).cloned().unwrap_or_default();
        cx.set_value(&self.key, value)
    }

    fn auto_run(&self) -> bool {
        true
    }

    fn properties(&self) -> Properties {
        let mut properties = Properties::new();
        properties.insert(PROP_KEY.to_string(), Value::Text(self.key.clone()));
        if let Some(data_type) = &self.data_type {
            properties.insert(PROP_DATA_TYPE.to_string(), Value::Text(data_type.to_string()));
        }
        properties
    }

    fn set_property(&mut self, name: &str, _value: Value) -> Result<(), NodeError> {
        match name {
            PROP_KEY | PROP_DATA_TYPE => Err(fixed_property(name)),
            _ => Err(NodeError::UnknownProperty(name.to_string())),
        }
    }
}

/// Writes its input pin into a variable, then continues through `Output`.
///
/// An existing variable keeps its declared type; a new one takes the
/// runtime type of the written value.
#[derive(Debug, Clone)]
pub struct SetVariableNode {
    key: String,
}

impl SetVariableNode {
    /// Setter for `key`
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// Build from stored properties
    pub fn from_properties(properties: &Properties) -> Result<Self, NodeError> {
        Ok(Self::new(required_key(properties)?))
    }

    /// Variable key
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl NodeKind for SetVariableNode {
    fn allocate_default_pins(&self, pins: &mut PinAllocator<'_>) {
        pins.execute(PIN_INPUT, PinDirection::Input);
        pins.execute(PIN_OUTPUT, PinDirection::Output);
        pins.data(self.key.clone(), PinDirection::Input, DataType::Any);
    }

    fn execute(&mut self, cx: &mut NodeContext<'_>) -> Result<(), NodeError> {
        let value = cx.value(&self.key)?.clone();
        cx.variables_mut().assign(&self.key, value);
        cx.push_next_connect_node(PIN_OUTPUT)?;
        Ok(())
    }

    fn properties(&self) -> Properties {
        let mut properties = Properties::new();
        properties.insert(PROP_KEY.to_string(), Value::Text(self.key.clone()));
        properties
    }

    fn set_property(&mut self, name: &str, _value: Value) -> Result<(), NodeError> {
        match name {
            PROP_KEY => Err(fixed_property(name)),
            _ => Err(NodeError::UnknownProperty(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::GraphEngine;
    use crate::node::Node;
    use crate::nodes::sequence::SequenceNode;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_get_reads_current_value_on_every_activation() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut engine = GraphEngine::new();
        engine.set_variable("speed", Value::Int(3), DataType::Int);

        let get = engine
            .add_node(Node::new(
                "Get",
                "/system/Variable/Get",
                GetVariableNode::typed("speed", DataType::Int),
            ))
            .unwrap();
        let set = engine
            .add_node(Node::new("Set", "/system/Variable/Set", SetVariableNode::new("speed")))
            .unwrap();
        let sink_seen = seen.clone();
        let sink = engine
            .add_node(Node::new(
                "Sink",
                "/system/Sequence",
                SequenceNode::with_work(move |cx| {
                    let value = cx.variables().get("speed").cloned().unwrap_or_default();
                    sink_seen.borrow_mut().push(value);
                    Ok(())
                }),
            ))
            .unwrap();

        // Set.speed <- Get.speed, then Sink
        let src = engine.find_pin(get, "speed").unwrap();
        let dst = engine.find_pin(set, "speed").unwrap();
        engine.add_connector(src, dst).unwrap();
        let src = engine.find_pin(set, PIN_OUTPUT).unwrap();
        let dst = engine.find_pin(sink, PIN_INPUT).unwrap();
        engine.add_connector(src, dst).unwrap();

        engine.run().unwrap();
        engine.set_variable("speed", Value::Int(9), DataType::Int);
        engine.run().unwrap();
        assert_eq!(*seen.borrow(), [Value::Int(3), Value::Int(9)]);
    }

    #[test]
    fn test_missing_variable_reads_null() {
        let mut engine = GraphEngine::new();
        let get = engine
            .add_node(Node::new("Get", "/system/Variable/Get", GetVariableNode::new("ghost")))
            .unwrap();
        let set = engine
            .add_node(Node::new("Set", "/system/Variable/Set", SetVariableNode::new("copy")))
            .unwrap();
        let src = engine.find_pin(get, "ghost").unwrap();
        let dst = engine.find_pin(set, "copy").unwrap();
        engine.add_connector(src, dst).unwrap();

        engine.run().unwrap();
        assert_eq!(engine.variable("copy"), Some(&Value::Null));
    }

    #[test]
    fn test_set_keeps_declared_type() {
        let mut engine = GraphEngine::new();
        engine.set_variable("score", Value::Int(0), DataType::Number);
        let set = engine
            .add_node(Node::new("Set", "/system/Variable/Set", SetVariableNode::new("score")))
            .unwrap();
        let pin = engine.find_pin(set, "score").unwrap();
        engine.pin_mut(pin).unwrap().set_value(Value::Int(12));

        engine.run().unwrap();
        assert_eq!(engine.variable("score"), Some(&Value::Int(12)));
        assert_eq!(engine.variable_type("score"), Some(&DataType::Number));
    }

    #[test]
    fn test_properties_round_trip() {
        let get = GetVariableNode::typed("speed", DataType::Float);
        let rebuilt = GetVariableNode::from_properties(&get.properties()).unwrap();
        assert_eq!(rebuilt.key(), "speed");
        assert_eq!(rebuilt.properties(), get.properties());

        assert!(SetVariableNode::from_properties(&Properties::new()).is_err());

        let mut set = SetVariableNode::new("a");
        assert!(matches!(
            set.set_property(PROP_KEY, Value::Text("b".into())),
            Err(NodeError::InvalidProperty { .. })
        ));
        assert!(matches!(
            set.set_property("color", Value::Int(1)),
            Err(NodeError::UnknownProperty(_))
        ));
        assert_eq!(set.key(), "a");
    }

    #[test]
    fn test_custom_type_named_like_builtin_survives_properties() {
        let get = GetVariableNode::typed("pos", DataType::Custom("Int".into()));
        let properties = get.properties();
        assert_eq!(properties[PROP_DATA_TYPE], Value::Text("Custom(Int)".into()));

        let node = Node::new(
            "Get",
            "/system/Variable/Get",
            GetVariableNode::from_properties(&properties).unwrap(),
        );
        let pin = node.find_pin("pos").unwrap();
        assert_eq!(pin.data_type(), Some(&DataType::Custom("Int".into())));
    }
}
