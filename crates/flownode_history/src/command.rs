// SPDX-License-Identifier: MIT OR Apache-2.0
//! The command trait and command composition.
//!
//! A command is a matched pair of `execute` and `undo`. Commands receive
//! the engine on every call and carry whatever state they need to invert
//! themselves, such as a removed node or a previous value.

use flownode_graph::{GraphEngine, GraphError, NodeError};
use std::fmt;

/// A reversible graph edit
pub trait GraphCommand: fmt::Debug {
    /// Human-readable description, shown in undo menus
    fn description(&self) -> &str;

    /// Apply the edit. On failure the engine must be left unchanged.
    fn execute(&mut self, engine: &mut GraphEngine) -> Result<(), CommandError>;

    /// Revert a previous successful `execute`
    fn undo(&mut self, engine: &mut GraphEngine) -> Result<(), CommandError>;
}

/// Error type for command execution
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The engine rejected the edit
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A node rejected the edit
    #[error(transparent)]
    Node(#[from] NodeError),

    /// Undo stack is empty
    #[error("Nothing to undo")]
    NothingToUndo,

    /// Redo stack is empty
    #[error("Nothing to redo")]
    NothingToRedo,

    /// Variable not found
    #[error("Variable not found: {0}")]
    VariableNotFound(String),

    /// The command was called out of order, e.g. undone twice
    #[error("Invalid command state: {0}")]
    InvalidState(String),
}

/// Ordered list of commands applied and reverted as one
#[derive(Debug)]
pub struct CompositeCommand {
    description: String,
    commands: Vec<Box<dyn GraphCommand>>,
}

impl CompositeCommand {
    /// Create an empty composite
    pub fn new(description: impl Into<String>) -> Self {
        Self::from_commands(description, Vec::new())
    }

    /// Wrap commands that will run in the given order
    pub fn from_commands(description: impl Into<String>, commands: Vec<Box<dyn GraphCommand>>) -> Self {
        Self {
            description: description.into(),
            commands,
        }
    }

    /// Append a command
    pub fn push(&mut self, command: impl GraphCommand + 'static) {
        self.commands.push(Box::new(command));
    }

    /// Append a command, builder style
    pub fn with(mut self, command: impl GraphCommand + 'static) -> Self {
        self.push(command);
        self
    }

    /// Number of sub-commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether there are no sub-commands
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl GraphCommand for CompositeCommand {
    fn description(&self) -> &str {
        &self.description
    }

    fn execute(&mut self, engine: &mut GraphEngine) -> Result<(), CommandError> {
        for i in 0..self.commands.len() {
            if let Err(err) = self.commands[i].execute(engine) {
                undo_all(&mut self.commands[..i], engine);
                return Err(err);
            }
        }
        Ok(())
    }

    fn undo(&mut self, engine: &mut GraphEngine) -> Result<(), CommandError> {
        for i in (0..self.commands.len()).rev() {
            if let Err(err) = self.commands[i].undo(engine) {
                // Re-apply what was already reverted so the composite stays whole
                for command in &mut self.commands[i + 1..] {
                    if let Err(redo_err) = command.execute(engine) {
                        tracing::warn!(
                            command = command.description(),
                            error = %redo_err,
                            "failed to re-apply after undo failure"
                        );
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }
}

/// Undo applied commands in reverse order, best effort.
///
/// Failures are logged and do not stop the remaining undos.
pub(crate) fn undo_all(commands: &mut [Box<dyn GraphCommand>], engine: &mut GraphEngine) {
    for command in commands.iter_mut().rev() {
        if let Err(err) = command.undo(engine) {
            tracing::warn!(
                command = command.description(),
                error = %err,
                "rollback undo failed"
            );
        }
    }
}
