// SPDX-License-Identifier: MIT OR Apache-2.0
//! Registry of node types, keyed by stable path.
//!
//! Paths look like `/system/Branch` or `/custom/Math/add`. Each entry
//! holds a factory that builds the node kind from scalar properties, so
//! saved documents can be rebuilt without knowing concrete types.

use crate::node::{Node, NodeError, NodeId, NodeKind, Properties};
use crate::nodes::{
    BranchNode, FunctionNode, FunctionSignature, GetVariableNode, LoopNode, SequenceNode,
    SetVariableNode,
};
use indexmap::IndexMap;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// Factory building a node kind from its properties
pub type NodeFactory = Box<dyn Fn(&Properties) -> Result<Box<dyn NodeKind>, NodeError>>;

/// Node type category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeCategory {
    /// Flow control and variable access under `/system`
    System,
    /// Wrapped functions under `/custom`
    Function,
}

/// Registry metadata for one path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    /// Registry path
    pub path: String,
    /// Category
    pub category: NodeCategory,
    /// Human-readable description
    pub description: String,
}

struct Entry {
    info: NodeInfo,
    factory: NodeFactory,
}

/// Registry of available node types
#[derive(Default)]
pub struct NodeRegistry {
    entries: IndexMap<String, Entry>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the system nodes and the builtin functions
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_system_nodes();
        crate::functions::register_builtin_functions(&mut registry);
        registry
    }

    /// Register a factory under `path`, replacing any previous entry
    pub fn register(
        &mut self,
        path: impl Into<String>,
        category: NodeCategory,
        description: impl Into<String>,
        factory: impl Fn(&Properties) -> Result<Box<dyn NodeKind>, NodeError> + 'static,
    ) {
        let path = path.into();
        tracing::trace!(path = %path, ?category, "register node type");
        let info = NodeInfo {
            path: path.clone(),
            category,
            description: description.into(),
        };
        self.entries.insert(
            path,
            Entry {
                info,
                factory: Box::new(factory),
            },
        );
    }

    /// Register a function signature under its `/custom/...` path
    pub fn register_function(&mut self, signature: FunctionSignature) -> String {
        let path = signature.path();
        let description = signature.description().to_string();
        let signature = Rc::new(signature);
        self.register(path.clone(), NodeCategory::Function, description, move |_| {
            Ok(Box::new(FunctionNode::new(signature.clone())))
        });
        path
    }

    /// Register the flow control and variable nodes
    pub fn register_system_nodes(&mut self) {
        self.register("/system/Sequence", NodeCategory::System, "Run in order", |_| {
            Ok(Box::new(SequenceNode::new()))
        });
        self.register(
            "/system/Branch",
            NodeCategory::System,
            "If/else branching on a boolean",
            |_| Ok(Box::new(BranchNode)),
        );
        self.register(
            "/system/Loop",
            NodeCategory::System,
            "Run the loop body a fixed number of times",
            |properties| Ok(Box::new(LoopNode::from_properties(properties)?)),
        );
        self.register(
            "/system/Variable/Get",
            NodeCategory::System,
            "Read a graph variable",
            |properties| Ok(Box::new(GetVariableNode::from_properties(properties)?)),
        );
        self.register(
            "/system/Variable/Set",
            NodeCategory::System,
            "Write a graph variable",
            |properties| Ok(Box::new(SetVariableNode::from_properties(properties)?)),
        );
    }

    /// Create a node with default properties
    pub fn create_node(&self, path: &str) -> Result<Node, RegistryError> {
        self.create_node_with(path, &Properties::new())
    }

    /// Create a node from properties
    pub fn create_node_with(&self, path: &str, properties: &Properties) -> Result<Node, RegistryError> {
        self.instantiate(NodeId::new(), path, properties)
    }

    /// Create a node with a fixed ID, as when rebuilding a saved graph
    pub fn instantiate(&self, id: NodeId, path: &str, properties: &Properties) -> Result<Node, RegistryError> {
        let entry = self
            .entries
            .get(path)
            .ok_or_else(|| RegistryError::UnknownPath(path.to_string()))?;
        let kind = (entry.factory)(properties).map_err(|source| RegistryError::Factory {
            path: path.to_string(),
            source,
        })?;
        Ok(Node::from_boxed(id, node_name(path), path, kind))
    }

    /// Metadata for a path
    pub fn info(&self, path: &str) -> Option<&NodeInfo> {
        self.entries.get(path).map(|e| &e.info)
    }

    /// Whether a path is registered
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// All registered paths, in registration order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Paths of system nodes
    pub fn system_paths(&self) -> impl Iterator<Item = &str> {
        self.paths_in(NodeCategory::System)
    }

    /// Paths of wrapped functions
    pub fn function_paths(&self) -> impl Iterator<Item = &str> {
        self.paths_in(NodeCategory::Function)
    }

    fn paths_in(&self, category: NodeCategory) -> impl Iterator<Item = &str> {
        self.entries
            .values()
            .filter(move |e| e.info.category == category)
            .map(|e| e.info.path.as_str())
    }

    /// Number of registered paths
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.values().map(|e| &e.info)).finish()
    }
}

/// Default node name: the last path segment
fn node_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Errors raised while creating nodes from the registry
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No factory registered under the path
    #[error("Unknown node path: {0}")]
    UnknownPath(String),

    /// The factory rejected the properties
    #[error("Failed to create {path}: {source}")]
    Factory {
        /// Registry path
        path: String,
        /// Factory error
        #[source]
        source: NodeError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{DataType, Value};

    #[test]
    fn test_system_nodes_registered() {
        let mut registry = NodeRegistry::new();
        registry.register_system_nodes();

        let paths: Vec<_> = registry.system_paths().collect();
        assert_eq!(
            paths,
            [
                "/system/Sequence",
                "/system/Branch",
                "/system/Loop",
                "/system/Variable/Get",
                "/system/Variable/Set",
            ]
        );
        assert_eq!(registry.function_paths().count(), 0);
        assert_eq!(registry.info("/system/Loop").unwrap().category, NodeCategory::System);
    }

    #[test]
    fn test_create_node_names_after_last_segment() {
        let registry = NodeRegistry::with_builtins();
        let node = registry.create_node("/system/Branch").unwrap();
        assert_eq!(node.name(), "Branch");
        assert_eq!(node.path(), "/system/Branch");
        assert!(node.find_pin("Condition").is_some());

        let add = registry.create_node("/custom/Math/add").unwrap();
        assert_eq!(add.name(), "add");
        assert!(add.is_auto_run());
    }

    #[test]
    fn test_create_node_with_properties() {
        let registry = NodeRegistry::with_builtins();
        let mut properties = Properties::new();
        properties.insert("loop_count".into(), Value::Int(4));
        let node = registry.create_node_with("/system/Loop", &properties).unwrap();
        assert_eq!(node.properties().get("loop_count"), Some(&Value::Int(4)));

        let mut properties = Properties::new();
        properties.insert("key".into(), Value::Text("speed".into()));
        properties.insert("data_type".into(), Value::Text("Float".into()));
        let get = registry.create_node_with("/system/Variable/Get", &properties).unwrap();
        assert_eq!(get.find_pin("speed").unwrap().data_type(), Some(&DataType::Float));
    }

    #[test]
    fn test_create_node_errors() {
        let registry = NodeRegistry::with_builtins();
        assert!(matches!(
            registry.create_node("/system/Nope"),
            Err(RegistryError::UnknownPath(_))
        ));
        // Variable nodes require a key
        assert!(matches!(
            registry.create_node("/system/Variable/Set"),
            Err(RegistryError::Factory { .. })
        ));
    }

    #[test]
    fn test_register_function_uses_custom_path() {
        let mut registry = NodeRegistry::new();
        let path = registry.register_function(
            FunctionSignature::new("Util", "noop", |_| Ok(())).describe("Does nothing"),
        );
        assert_eq!(path, "/custom/Util/noop");
        assert_eq!(registry.function_paths().collect::<Vec<_>>(), ["/custom/Util/noop"]);
        assert_eq!(registry.info(&path).unwrap().description, "Does nothing");
    }
}
