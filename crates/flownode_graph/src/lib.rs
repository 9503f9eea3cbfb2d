// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node graph execution engine for FlowNode.
//!
//! Graphs mix two kinds of pins:
//! - Execute pins carry control flow between nodes
//! - Data pins carry typed values, pulled on demand
//!
//! ## Architecture
//!
//! A [`GraphEngine`] owns nodes, connectors, a variable store and the
//! execution stack. Running a graph pops nodes off the stack; each
//! activation resolves its data inputs (running auto-run producers
//! upstream) and then executes, pushing whatever runs next.
//!
//! Node types are created by path through a [`NodeRegistry`], and a
//! [`GraphDocument`] saves and rebuilds whole graphs as RON.

pub mod config;
pub mod connector;
pub mod document;
pub mod engine;
pub mod execution;
pub mod functions;
pub mod node;
pub mod nodes;
pub mod pin;
pub mod registry;
pub mod value;
pub mod variables;

pub use config::EngineConfig;
pub use connector::{Connector, ConnectorId};
pub use document::{DocumentError, GraphDocument};
pub use engine::{GraphEngine, GraphError, RemovedNode, ValidationError};
pub use execution::{NodeContext, RunReport};
pub use node::{Node, NodeError, NodeId, NodeKind, Properties};
pub use pin::{Pin, PinDirection, PinId, PinKind, PinRef};
pub use registry::{NodeCategory, NodeRegistry, RegistryError};
pub use value::{DataType, Value};
pub use variables::{Variable, VariableStore};
