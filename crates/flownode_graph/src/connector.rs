// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connector (edge) definitions for the graph.

use crate::node::NodeId;
use crate::pin::PinRef;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a connector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectorId(pub Uuid);

impl ConnectorId {
    /// Create a new random connector ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectorId {
    fn default() -> Self {
        Self::new()
    }
}

/// A directed edge from an output pin to an input pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connector {
    /// Unique connector ID
    pub id: ConnectorId,
    /// Output pin the edge starts at
    pub src: PinRef,
    /// Input pin the edge ends at
    pub dst: PinRef,
}

impl Connector {
    /// Create a new connector
    pub fn new(src: PinRef, dst: PinRef) -> Self {
        Self {
            id: ConnectorId::new(),
            src,
            dst,
        }
    }

    /// Check if this connector involves a specific node
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        self.src.node == node_id || self.dst.node == node_id
    }

    /// Check if this connector touches a specific pin
    pub fn involves_pin(&self, pin: PinRef) -> bool {
        self.src == pin || self.dst == pin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pin::PinId;

    #[test]
    fn test_involves() {
        let a = PinRef::new(NodeId::new(), PinId::new());
        let b = PinRef::new(NodeId::new(), PinId::new());
        let connector = Connector::new(a, b);

        assert!(connector.involves_node(a.node));
        assert!(connector.involves_node(b.node));
        assert!(!connector.involves_node(NodeId::new()));
        assert!(connector.involves_pin(b));
        assert!(!connector.involves_pin(PinRef::new(a.node, PinId::new())));
    }
}
