// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sequence: run a work hook, then continue through `Output`.

use super::{PIN_INPUT, PIN_OUTPUT};
use crate::execution::NodeContext;
use crate::node::{NodeError, NodeKind};
use crate::pin::{PinAllocator, PinDirection};
use std::fmt;

/// Work hook run by a [`SequenceNode`] on each activation
pub type WorkFn = Box<dyn FnMut(&mut NodeContext<'_>) -> Result<(), NodeError>>;

/// Straight-line flow node with an optional work hook
#[derive(Default)]
pub struct SequenceNode {
    work: Option<WorkFn>,
}

impl SequenceNode {
    /// Sequence that only forwards control flow
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence that runs `work` before forwarding
    pub fn with_work(work: impl FnMut(&mut NodeContext<'_>) -> Result<(), NodeError> + 'static) -> Self {
        Self {
            work: Some(Box::new(work)),
        }
    }

    fn do_work(&mut self, cx: &mut NodeContext<'_>) -> Result<(), NodeError> {
        match self.work.as_mut() {
            Some(work) => work(cx),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for SequenceNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceNode")
            .field("work", &self.work.is_some())
            .finish()
    }
}

impl NodeKind for SequenceNode {
    fn allocate_default_pins(&self, pins: &mut PinAllocator<'_>) {
        pins.execute(PIN_INPUT, PinDirection::Input);
        pins.execute(PIN_OUTPUT, PinDirection::Output);
    }

    fn execute(&mut self, cx: &mut NodeContext<'_>) -> Result<(), NodeError> {
        self.do_work(cx)?;
        cx.push_next_connect_node(PIN_OUTPUT)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::GraphEngine;
    use crate::node::Node;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn logging(name: &'static str, log: &Rc<RefCell<Vec<&'static str>>>) -> Node {
        let log = log.clone();
        Node::new(
            name,
            "/system/Sequence",
            SequenceNode::with_work(move |_| {
                log.borrow_mut().push(name);
                Ok(())
            }),
        )
    }

    #[test]
    fn test_sequence_chain() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut engine = GraphEngine::new();
        let first = engine.add_node(logging("first", &log)).unwrap();
        let second = engine.add_node(logging("second", &log)).unwrap();
        let out = engine.find_pin(first, PIN_OUTPUT).unwrap();
        let input = engine.find_pin(second, PIN_INPUT).unwrap();
        engine.add_connector(out, input).unwrap();

        engine.run().unwrap();
        assert_eq!(*log.borrow(), ["first", "second"]);
    }

    #[test]
    fn test_output_pin_is_an_output() {
        let node = Node::new("Sequence", "/system/Sequence", SequenceNode::new());
        let out = node.find_pin(PIN_OUTPUT).unwrap();
        assert_eq!(out.direction(), PinDirection::Output);
    }

    #[test]
    fn test_work_error_aborts_run() {
        let mut engine = GraphEngine::new();
        engine
            .add_node(Node::new(
                "Broken",
                "/system/Sequence",
                SequenceNode::with_work(|_| Err(NodeError::Function("no".into()))),
            ))
            .unwrap();
        assert!(engine.run().is_err());
    }
}
