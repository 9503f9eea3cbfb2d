// SPDX-License-Identifier: MIT OR Apache-2.0
//! Serializable snapshot of a graph: nodes, connectors and variables.
//!
//! Nodes are stored by registry path plus properties, and pins by name,
//! so a document can be rebuilt into a fresh engine through a
//! [`NodeRegistry`]. Only data pin values are stored; pin IDs are
//! reallocated on rebuild.

use crate::config::EngineConfig;
use crate::engine::{GraphEngine, GraphError};
use crate::node::{NodeId, Properties};
use crate::pin::{PinDirection, PinKind, PinRef};
use crate::registry::{NodeRegistry, RegistryError};
use crate::value::{DataType, Value};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Saved graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    /// Nodes, in graph order
    pub nodes: Vec<NodeRecord>,
    /// Connectors, in graph order
    pub connectors: Vec<ConnectorRecord>,
    /// Variables, in insertion order
    #[serde(default)]
    pub variables: Vec<VariableRecord>,
}

/// Saved node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Node ID
    pub id: NodeId,
    /// Registry path
    pub path: String,
    /// Display name
    pub name: String,
    /// Kind properties
    #[serde(default)]
    pub properties: Properties,
    /// Data pin values
    #[serde(default)]
    pub pins: Vec<PinRecord>,
}

/// Saved pin value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinRecord {
    /// Pin name
    pub name: String,
    /// Stored value
    pub value: Value,
}

/// Saved connector, referencing pins by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorRecord {
    /// Node owning the output pin
    pub source_node: NodeId,
    /// Output pin name
    pub source_pin: String,
    /// Node owning the input pin
    pub target_node: NodeId,
    /// Input pin name
    pub target_pin: String,
}

/// Saved variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableRecord {
    /// Variable key
    pub key: String,
    /// Current value
    pub value: Value,
    /// Declared type
    pub data_type: DataType,
}

impl GraphDocument {
    /// Snapshot an engine
    pub fn capture(engine: &GraphEngine) -> Self {
        let nodes = engine
            .nodes()
            .map(|node| NodeRecord {
                id: node.id(),
                path: node.path().to_string(),
                name: node.name().to_string(),
                properties: node.properties(),
                pins: node
                    .pins()
                    .iter()
                    .filter(|p| p.kind() == PinKind::Data)
                    .map(|p| PinRecord {
                        name: p.name().to_string(),
                        value: p.value().clone(),
                    })
                    .collect(),
            })
            .collect();

        let connectors = engine
            .connectors()
            .filter_map(|c| {
                let src = engine.pin(c.src)?;
                let dst = engine.pin(c.dst)?;
                Some(ConnectorRecord {
                    source_node: c.src.node,
                    source_pin: src.name().to_string(),
                    target_node: c.dst.node,
                    target_pin: dst.name().to_string(),
                })
            })
            .collect();

        let variables = engine
            .variables()
            .iter()
            .map(|(key, var)| VariableRecord {
                key: key.to_string(),
                value: var.value.clone(),
                data_type: var.data_type.clone(),
            })
            .collect();

        Self {
            nodes,
            connectors,
            variables,
        }
    }

    /// Build a fresh engine from this document.
    ///
    /// Connectors go through the usual validation, so a document edited
    /// by hand cannot produce an ill-typed graph.
    pub fn rebuild(&self, registry: &NodeRegistry, config: &EngineConfig) -> Result<GraphEngine, DocumentError> {
        let mut engine = GraphEngine::with_config(config.clone());

        for record in &self.nodes {
            let mut node = registry.instantiate(record.id, &record.path, &record.properties)?;
            node.set_name(record.name.clone());
            for pin in &record.pins {
                let target = node
                    .find_pin_mut(&pin.name)
                    .ok_or_else(|| DocumentError::MissingPin {
                        node: record.name.clone(),
                        pin: pin.name.clone(),
                    })?;
                target.set_value(pin.value.clone());
            }
            engine.add_node(node)?;
        }

        for record in &self.connectors {
            let src = pin_ref(&engine, record.source_node, &record.source_pin, PinDirection::Output)?;
            let dst = pin_ref(&engine, record.target_node, &record.target_pin, PinDirection::Input)?;
            engine.add_connector(src, dst)?;
        }

        for var in &self.variables {
            engine.set_variable(var.key.clone(), var.value.clone(), var.data_type.clone());
        }

        tracing::debug!(
            nodes = engine.node_count(),
            connectors = engine.connector_count(),
            "rebuilt graph"
        );
        Ok(engine)
    }

    /// Serialize to RON format
    pub fn to_ron(&self) -> Result<String, DocumentError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    /// Deserialize from RON format
    pub fn from_ron(s: &str) -> Result<Self, DocumentError> {
        Ok(ron::from_str(s)?)
    }

    /// Save to a RON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DocumentError> {
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }

    /// Load from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron(&contents)
    }
}

fn pin_ref(
    engine: &GraphEngine,
    node_id: NodeId,
    name: &str,
    direction: PinDirection,
) -> Result<PinRef, DocumentError> {
    let node = engine.node(node_id).ok_or(GraphError::NodeNotFound(node_id))?;
    node.find_pin_in(name, direction)
        .map(|p| p.pin_ref())
        .ok_or_else(|| DocumentError::MissingPin {
            node: node.name().to_string(),
            pin: name.to_string(),
        })
}

/// Errors saving or rebuilding a document
#[derive(Debug, Error)]
pub enum DocumentError {
    /// File could not be read or written
    #[error("Document I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// RON could not be parsed
    #[error("Failed to parse document: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// RON could not be produced
    #[error("Failed to serialize document: {0}")]
    Serialize(#[from] ron::Error),

    /// A node path could not be instantiated
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The rebuilt graph rejected a node or connector
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A referenced pin does not exist on the rebuilt node
    #[error("Node {node} has no pin named {pin}")]
    MissingPin {
        /// Node name
        node: String,
        /// Pin name
        pin: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(registry: &NodeRegistry) -> GraphEngine {
        let mut engine = GraphEngine::new();
        let mut properties = Properties::new();
        properties.insert("loop_count".into(), Value::Int(2));
        let looped = engine
            .add_node(registry.create_node_with("/system/Loop", &properties).unwrap())
            .unwrap();
        let show = engine
            .add_node(registry.create_node("/custom/Debug/show_message").unwrap())
            .unwrap();
        let message = engine.find_pin(show, "message").unwrap();
        engine.pin_mut(message).unwrap().set_value(Value::Text("hello".into()));

        let body = engine.find_pin(looped, "LoopBody").unwrap();
        let input = engine.find_pin(show, "Input").unwrap();
        engine.add_connector(body, input).unwrap();
        engine.set_variable("speed", Value::Float(1.5), DataType::Float);
        engine
    }

    #[test]
    fn test_ron_round_trip() {
        let registry = NodeRegistry::with_builtins();
        let doc = GraphDocument::capture(&sample(&registry));
        let ron_str = doc.to_ron().unwrap();
        let loaded = GraphDocument::from_ron(&ron_str).unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_rebuild_reproduces_graph() {
        let registry = NodeRegistry::with_builtins();
        let engine = sample(&registry);
        let doc = GraphDocument::capture(&engine);

        let rebuilt = doc.rebuild(&registry, &EngineConfig::default()).unwrap();
        assert_eq!(rebuilt.node_count(), 2);
        assert_eq!(rebuilt.connector_count(), 1);
        assert_eq!(rebuilt.variable("speed"), Some(&Value::Float(1.5)));
        // Same IDs, names, pin values and properties
        assert_eq!(GraphDocument::capture(&rebuilt), doc);
    }

    #[test]
    fn test_rebuild_rejects_unknown_pin() {
        let registry = NodeRegistry::with_builtins();
        let mut doc = GraphDocument::capture(&sample(&registry));
        doc.connectors[0].target_pin = "Nowhere".into();
        assert!(matches!(
            doc.rebuild(&registry, &EngineConfig::default()),
            Err(DocumentError::MissingPin { .. })
        ));
    }

    #[test]
    fn test_save_and_load() {
        let registry = NodeRegistry::with_builtins();
        let doc = GraphDocument::capture(&sample(&registry));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.ron");
        doc.save(&path).unwrap();
        assert_eq!(GraphDocument::load(&path).unwrap(), doc);
    }
}
