// SPDX-License-Identifier: MIT OR Apache-2.0
//! Branch: pick the `True` or `False` flow from a boolean input.

use super::PIN_INPUT;
use crate::execution::NodeContext;
use crate::node::{NodeError, NodeKind};
use crate::pin::{PinAllocator, PinDirection};
use crate::value::DataType;

/// Flow taken when the condition holds
pub const PIN_TRUE: &str = "True";
/// Flow taken otherwise
pub const PIN_FALSE: &str = "False";
/// Boolean data input
pub const PIN_CONDITION: &str = "Condition";

/// If/else flow node; exactly one branch advances per activation
#[derive(Debug, Default)]
pub struct BranchNode;

impl NodeKind for BranchNode {
    fn allocate_default_pins(&self, pins: &mut PinAllocator<'_>) {
        pins.execute(PIN_INPUT, PinDirection::Input);
        pins.execute(PIN_TRUE, PinDirection::Output);
        pins.execute(PIN_FALSE, PinDirection::Output);
        pins.data(PIN_CONDITION, PinDirection::Input, DataType::Bool);
    }

    fn execute(&mut self, cx: &mut NodeContext<'_>) -> Result<(), NodeError> {
        let next = if cx.bool_value(PIN_CONDITION)? {
            PIN_TRUE
        } else {
            PIN_FALSE
        };
        cx.push_next_connect_node(next)?;
        Ok(())
    }
}
