// SPDX-License-Identifier: MIT OR Apache-2.0
//! Stock node kinds: flow control, wrapped functions, variable access.

pub mod branch;
pub mod function;
pub mod loop_node;
pub mod sequence;
pub mod variable;

pub use branch::BranchNode;
pub use function::{FunctionNode, FunctionSignature, Parameter};
pub use loop_node::LoopNode;
pub use sequence::SequenceNode;
pub use variable::{GetVariableNode, SetVariableNode};

/// Execute input shared by the stock flow nodes
pub const PIN_INPUT: &str = "Input";
/// Execute output shared by the stock flow nodes
pub const PIN_OUTPUT: &str = "Output";
