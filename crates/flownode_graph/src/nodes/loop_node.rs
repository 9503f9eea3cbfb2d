// SPDX-License-Identifier: MIT OR Apache-2.0
//! Loop: run `LoopBody` a fixed number of times, then `Completed`.
//!
//! The node re-enters itself through the execution stack: each
//! activation below the count pushes itself first and the body second,
//! so the body runs to completion before the next iteration. The
//! iteration counter is per-instance state, reset when a run starts.

use super::PIN_INPUT;
use crate::execution::NodeContext;
use crate::node::{NodeError, NodeKind, Properties};
use crate::pin::{PinAllocator, PinDirection};
use crate::value::{DataType, Value};

/// Flow run once per iteration
pub const PIN_LOOP_BODY: &str = "LoopBody";
/// Flow run after the last iteration
pub const PIN_COMPLETED: &str = "Completed";
/// Current iteration index, data output
pub const PIN_INDEX: &str = "Index";
/// Property holding the iteration count
pub const PROP_LOOP_COUNT: &str = "loop_count";

/// Counted loop
#[derive(Debug, Clone)]
pub struct LoopNode {
    loop_count: i64,
    next_index: i64,
}

impl LoopNode {
    /// Loop running the body `loop_count` times
    pub fn new(loop_count: i64) -> Self {
        Self {
            loop_count,
            next_index: 0,
        }
    }

    /// Build from stored properties; a missing count means one iteration
    pub fn from_properties(properties: &Properties) -> Result<Self, NodeError> {
        match properties.get(PROP_LOOP_COUNT) {
            Some(value) => Ok(Self::new(parse_count(value.clone())?)),
            None => Ok(Self::default()),
        }
    }

    /// Configured iteration count
    pub fn loop_count(&self) -> i64 {
        self.loop_count
    }
}

impl Default for LoopNode {
    fn default() -> Self {
        Self::new(1)
    }
}

fn parse_count(value: Value) -> Result<i64, NodeError> {
    match value {
        Value::Int(count) if count >= 0 => Ok(count),
        other => Err(NodeError::InvalidProperty {
            name: PROP_LOOP_COUNT.to_string(),
            reason: format!("expected a non-negative Int, got {other:?}"),
        }),
    }
}

impl NodeKind for LoopNode {
    fn allocate_default_pins(&self, pins: &mut PinAllocator<'_>) {
        pins.execute(PIN_INPUT, PinDirection::Input);
        pins.execute(PIN_LOOP_BODY, PinDirection::Output);
        pins.execute(PIN_COMPLETED, PinDirection::Output);
        pins.data(PIN_INDEX, PinDirection::Output, DataType::Int);
    }

    fn execute(&mut self, cx: &mut NodeContext<'_>) -> Result<(), NodeError> {
        if self.next_index < self.loop_count {
            cx.set_value(PIN_INDEX, Value::Int(self.next_index))?;
            cx.push_self();
            self.next_index += 1;
            cx.push_next_connect_node(PIN_LOOP_BODY)?;
        } else {
            cx.push_next_connect_node(PIN_COMPLETED)?;
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.next_index = 0;
    }

    fn properties(&self) -> Properties {
        let mut properties = Properties::new();
        properties.insert(PROP_LOOP_COUNT.to_string(), Value::Int(self.loop_count));
        properties
    }

    fn set_property(&mut self, name: &str, value: Value) -> Result<(), NodeError> {
        if name != PROP_LOOP_COUNT {
            return Err(NodeError::UnknownProperty(name.to_string()));
        }
        self.loop_count = parse_count(value)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::GraphEngine;
    use crate::node::{Node, NodeId};
    use crate::nodes::sequence::SequenceNode;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    /// Prints the loop index it receives on `Index`
    #[derive(Debug)]
    struct PrintIndex(Log);

    impl NodeKind for PrintIndex {
        fn allocate_default_pins(&self, pins: &mut PinAllocator<'_>) {
            pins.execute(PIN_INPUT, PinDirection::Input);
            pins.data(PIN_INDEX, PinDirection::Input, DataType::Int);
        }

        fn execute(&mut self, cx: &mut NodeContext<'_>) -> Result<(), NodeError> {
            let index = cx.value(PIN_INDEX)?.clone();
            self.0.borrow_mut().push(format!("index {index}"));
            Ok(())
        }
    }

    fn wire(engine: &mut GraphEngine, src: NodeId, src_pin: &str, dst: NodeId, dst_pin: &str) {
        let src = engine.find_pin(src, src_pin).unwrap();
        let dst = engine.find_pin(dst, dst_pin).unwrap();
        engine.add_connector(src, dst).unwrap();
    }

    fn loop_graph(count: i64) -> (GraphEngine, Log) {
        let log = Log::default();
        let mut engine = GraphEngine::new();
        let looped = engine
            .add_node(Node::new("Loop", "/system/Loop", LoopNode::new(count)))
            .unwrap();
        let body = engine
            .add_node(Node::new("PrintIndex", "/test/PrintIndex", PrintIndex(log.clone())))
            .unwrap();
        let done_log = log.clone();
        let done = engine
            .add_node(Node::new(
                "PrintDone",
                "/system/Sequence",
                SequenceNode::with_work(move |_| {
                    done_log.borrow_mut().push("done".to_string());
                    Ok(())
                }),
            ))
            .unwrap();

        wire(&mut engine, looped, PIN_LOOP_BODY, body, PIN_INPUT);
        wire(&mut engine, looped, PIN_INDEX, body, PIN_INDEX);
        wire(&mut engine, looped, PIN_COMPLETED, done, PIN_INPUT);
        (engine, log)
    }

    #[test]
    fn test_body_runs_with_indices_then_completed_once() {
        let (mut engine, log) = loop_graph(3);
        let report = engine.run().unwrap();

        assert_eq!(*log.borrow(), ["index 0", "index 1", "index 2", "done"]);
        // 4 loop activations, 3 bodies, 1 completion
        assert_eq!(report.activations, 8);
    }

    #[test]
    fn test_zero_count_goes_straight_to_completed() {
        let (mut engine, log) = loop_graph(0);
        engine.run().unwrap();
        assert_eq!(*log.borrow(), ["done"]);
    }

    #[test]
    fn test_counter_resets_between_runs() {
        let (mut engine, log) = loop_graph(2);
        engine.run().unwrap();
        engine.run().unwrap();
        assert_eq!(
            *log.borrow(),
            ["index 0", "index 1", "done", "index 0", "index 1", "done"]
        );
    }

    #[test]
    fn test_loop_count_property() {
        let mut node = LoopNode::new(3);
        assert_eq!(node.properties().get(PROP_LOOP_COUNT), Some(&Value::Int(3)));

        node.set_property(PROP_LOOP_COUNT, Value::Int(7)).unwrap();
        assert_eq!(node.loop_count(), 7);

        assert!(matches!(
            node.set_property(PROP_LOOP_COUNT, Value::Int(-1)),
            Err(NodeError::InvalidProperty { .. })
        ));
        assert!(matches!(
            node.set_property("speed", Value::Int(1)),
            Err(NodeError::UnknownProperty(_))
        ));

        let rebuilt = LoopNode::from_properties(&node.properties()).unwrap();
        assert_eq!(rebuilt.loop_count(), 7);
        assert_eq!(LoopNode::from_properties(&Properties::new()).unwrap().loop_count(), 1);
    }
}
