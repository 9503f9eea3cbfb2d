// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command layer for FlowNode graphs.
//!
//! Every edit to a [`GraphEngine`](flownode_graph::GraphEngine) made on
//! behalf of a user goes through a [`GraphCommand`], so it can be undone.
//! A [`CommandHistory`] keeps bounded undo and redo stacks, and
//! [`CommandHistory::begin_group`] opens a transaction whose commands
//! are either all kept or all reverted.

pub mod command;
pub mod commands;
pub mod history;

pub use command::{CommandError, CompositeCommand, GraphCommand};
pub use commands::{
    AddConnectorCommand, AddNodeCommand, RemoveConnectorCommand, RemoveNodeCommand,
    RemoveVariableCommand, SetPinValueCommand, SetPropertyCommand, SetVariableCommand,
};
pub use history::{CommandGroup, CommandHistory};
