// SPDX-License-Identifier: MIT OR Apache-2.0
//! Undo/redo history and transactional command groups.
//!
//! Commands run against the engine the moment they are executed. The
//! history only records them; a [`CommandGroup`] records several
//! commands as one entry and reverts all of them if any fails.

use crate::command::{undo_all, CommandError, CompositeCommand, GraphCommand};
use flownode_graph::config::DEFAULT_HISTORY_DEPTH;
use flownode_graph::{EngineConfig, GraphEngine};
use std::collections::VecDeque;

/// Undo/redo history manager
#[derive(Debug)]
pub struct CommandHistory {
    /// Undo stack, oldest first
    undo_stack: VecDeque<Box<dyn GraphCommand>>,
    /// Redo stack, oldest first
    redo_stack: VecDeque<Box<dyn GraphCommand>>,
    /// Maximum history depth
    max_depth: usize,
}

impl CommandHistory {
    /// Create a new history manager
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_HISTORY_DEPTH)
    }

    /// Create with custom maximum depth
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_depth,
        }
    }

    /// Create with the depth from an engine configuration
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::with_max_depth(config.history_depth)
    }

    /// Execute a command and record it.
    ///
    /// A failing command is dropped and the history is left untouched.
    pub fn execute(
        &mut self,
        engine: &mut GraphEngine,
        command: impl GraphCommand + 'static,
    ) -> Result<(), CommandError> {
        self.execute_boxed(engine, Box::new(command))
    }

    /// Execute an already boxed command and record it
    pub fn execute_boxed(
        &mut self,
        engine: &mut GraphEngine,
        mut command: Box<dyn GraphCommand>,
    ) -> Result<(), CommandError> {
        command.execute(engine)?;
        self.record(command);
        Ok(())
    }

    /// Push an applied command, clearing redo and evicting the oldest entries
    fn record(&mut self, command: Box<dyn GraphCommand>) {
        tracing::debug!(command = command.description(), "record command");
        self.redo_stack.clear();
        self.undo_stack.push_back(command);

        while self.undo_stack.len() > self.max_depth {
            if let Some(evicted) = self.undo_stack.pop_front() {
                tracing::trace!(command = evicted.description(), "evicted from history");
            }
        }
    }

    /// Undo the last command.
    ///
    /// If the undo fails the command stays on the undo stack.
    pub fn undo(&mut self, engine: &mut GraphEngine) -> Result<(), CommandError> {
        let mut command = self.undo_stack.pop_back().ok_or(CommandError::NothingToUndo)?;
        if let Err(err) = command.undo(engine) {
            self.undo_stack.push_back(command);
            return Err(err);
        }
        tracing::debug!(command = command.description(), "undo");
        self.redo_stack.push_back(command);
        Ok(())
    }

    /// Redo the last undone command.
    ///
    /// If the redo fails the command stays on the redo stack.
    pub fn redo(&mut self, engine: &mut GraphEngine) -> Result<(), CommandError> {
        let mut command = self.redo_stack.pop_back().ok_or(CommandError::NothingToRedo)?;
        if let Err(err) = command.execute(engine) {
            self.redo_stack.push_back(command);
            return Err(err);
        }
        tracing::debug!(command = command.description(), "redo");
        self.undo_stack.push_back(command);
        Ok(())
    }

    /// Start a transaction.
    ///
    /// Commands executed through the group apply immediately. The first
    /// failure reverts everything the group applied. The group is
    /// recorded as a single entry only by [`CommandGroup::commit`]; a
    /// group dropped without a commit, including on an early `?` return
    /// or a panic, is rolled back.
    pub fn begin_group<'a>(
        &'a mut self,
        engine: &'a mut GraphEngine,
        description: impl Into<String>,
    ) -> CommandGroup<'a> {
        CommandGroup {
            history: self,
            engine,
            description: description.into(),
            applied: Vec::new(),
            rolled_back: false,
            committed: false,
        }
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get undo stack depth
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get redo stack depth
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Maximum number of undo entries kept
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Get description of next undo operation
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|c| c.description())
    }

    /// Get description of next redo operation
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.back().map(|c| c.description())
    }

    /// Descriptions on the undo stack, oldest first
    pub fn undo_descriptions(&self) -> impl Iterator<Item = &str> {
        self.undo_stack.iter().map(|c| c.description())
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new()
    }
}

/// An open transaction on a [`CommandHistory`].
///
/// Must be closed with [`commit`](Self::commit); dropping an uncommitted
/// group reverts everything it applied.
#[derive(Debug)]
#[must_use = "an uncommitted group is rolled back when dropped"]
pub struct CommandGroup<'a> {
    history: &'a mut CommandHistory,
    engine: &'a mut GraphEngine,
    description: String,
    applied: Vec<Box<dyn GraphCommand>>,
    rolled_back: bool,
    committed: bool,
}

impl CommandGroup<'_> {
    /// Execute a command inside the transaction.
    ///
    /// On failure every command applied so far is undone in reverse
    /// order, the group is closed and the failing error is returned.
    pub fn execute(&mut self, mut command: impl GraphCommand + 'static) -> Result<(), CommandError> {
        if self.rolled_back {
            return Err(CommandError::InvalidState(format!(
                "group \"{}\" was rolled back",
                self.description
            )));
        }
        if let Err(err) = command.execute(self.engine) {
            tracing::debug!(
                group = %self.description,
                command = command.description(),
                error = %err,
                "group failed, rolling back"
            );
            self.roll_back();
            return Err(err);
        }
        self.applied.push(Box::new(command));
        Ok(())
    }

    /// The engine, for reads between commands
    pub fn engine(&self) -> &GraphEngine {
        &*self.engine
    }

    /// Number of commands applied so far
    pub fn len(&self) -> usize {
        self.applied.len()
    }

    /// Whether nothing has been applied
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }

    /// Whether the group was rolled back
    pub fn is_rolled_back(&self) -> bool {
        self.rolled_back
    }

    /// Revert everything and record nothing
    pub fn rollback(mut self) {
        self.roll_back();
    }

    /// Record the applied commands as one history entry
    pub fn commit(mut self) {
        self.committed = true;
        if self.rolled_back || self.applied.is_empty() {
            return;
        }
        let commands = std::mem::take(&mut self.applied);
        let composite = CompositeCommand::from_commands(self.description.clone(), commands);
        self.history.record(Box::new(composite));
    }

    fn roll_back(&mut self) {
        undo_all(&mut self.applied, self.engine);
        self.applied.clear();
        self.rolled_back = true;
    }
}

impl Drop for CommandGroup<'_> {
    fn drop(&mut self) {
        if self.committed || self.rolled_back {
            return;
        }
        if !self.applied.is_empty() {
            tracing::debug!(
                group = %self.description,
                commands = self.applied.len(),
                "group dropped without commit, rolling back"
            );
        }
        self.roll_back();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{AddNodeCommand, SetVariableCommand};
    use flownode_graph::{DataType, NodeRegistry, Value};

    #[test]
    fn test_execute_undo_redo() {
        let registry = NodeRegistry::with_builtins();
        let mut engine = GraphEngine::new();
        let mut history = CommandHistory::new();

        let node = registry.create_node("/system/Branch").unwrap();
        let id = node.id();
        history.execute(&mut engine, AddNodeCommand::new(node)).unwrap();
        assert!(history.can_undo());
        assert_eq!(history.undo_description(), Some("Add Branch"));

        history.undo(&mut engine).unwrap();
        assert!(engine.node(id).is_none());
        assert!(history.can_redo());

        history.redo(&mut engine).unwrap();
        assert!(engine.node(id).is_some());
        assert_eq!(history.undo_depth(), 1);
        assert_eq!(history.redo_depth(), 0);
    }

    #[test]
    fn test_empty_stacks() {
        let mut engine = GraphEngine::new();
        let mut history = CommandHistory::new();
        assert!(matches!(history.undo(&mut engine), Err(CommandError::NothingToUndo)));
        assert!(matches!(history.redo(&mut engine), Err(CommandError::NothingToRedo)));
    }

    #[test]
    fn test_new_command_clears_redo() {
        let mut engine = GraphEngine::new();
        let mut history = CommandHistory::new();
        history
            .execute(&mut engine, SetVariableCommand::new("a", Value::Int(1), DataType::Int))
            .unwrap();
        history.undo(&mut engine).unwrap();
        assert_eq!(history.redo_depth(), 1);

        history
            .execute(&mut engine, SetVariableCommand::new("b", Value::Int(2), DataType::Int))
            .unwrap();
        assert_eq!(history.redo_depth(), 0);
    }

    #[test]
    fn test_oldest_entries_are_evicted() {
        let mut engine = GraphEngine::new();
        let mut history = CommandHistory::with_max_depth(3);
        for i in 0..5 {
            history
                .execute(&mut engine, SetVariableCommand::new(format!("v{i}"), Value::Int(i), DataType::Int))
                .unwrap();
        }
        assert_eq!(history.undo_depth(), 3);
        for _ in 0..3 {
            history.undo(&mut engine).unwrap();
        }
        assert!(!history.can_undo());
        // v0 and v1 fell out of the history and stay applied
        assert_eq!(engine.variable_keys().collect::<Vec<_>>(), ["v0", "v1"]);
    }

    #[test]
    fn test_failed_command_is_not_recorded() {
        let mut engine = GraphEngine::new();
        let mut history = CommandHistory::new();
        let err = history
            .execute(&mut engine, crate::commands::RemoveVariableCommand::new("ghost"))
            .unwrap_err();
        assert!(matches!(err, CommandError::VariableNotFound(_)));
        assert!(!history.can_undo());
    }

    #[test]
    fn test_group_commits_as_one_entry() {
        let mut engine = GraphEngine::new();
        let mut history = CommandHistory::from_config(&EngineConfig::default());
        assert_eq!(history.max_depth(), DEFAULT_HISTORY_DEPTH);

        let mut group = history.begin_group(&mut engine, "Add variables");
        group
            .execute(SetVariableCommand::new("a", Value::Int(1), DataType::Int))
            .unwrap();
        group
            .execute(SetVariableCommand::new("b", Value::Int(2), DataType::Int))
            .unwrap();
        assert_eq!(group.engine().variable("b"), Some(&Value::Int(2)));
        group.commit();

        assert_eq!(history.undo_depth(), 1);
        assert_eq!(history.undo_description(), Some("Add variables"));

        history.undo(&mut engine).unwrap();
        assert!(engine.variables().is_empty());
    }

    #[test]
    fn test_uncommitted_group_rolls_back_on_drop() {
        let mut engine = GraphEngine::new();
        let mut history = CommandHistory::new();
        {
            let mut group = history.begin_group(&mut engine, "Forgotten");
            group
                .execute(SetVariableCommand::new("a", Value::Int(1), DataType::Int))
                .unwrap();
        }
        assert!(engine.variables().is_empty());
        assert!(!history.can_undo());
    }

    fn build_pair(
        registry: &NodeRegistry,
        engine: &mut GraphEngine,
        history: &mut CommandHistory,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut group = history.begin_group(engine, "two nodes");
        group.execute(AddNodeCommand::new(registry.create_node("/system/Sequence")?))?;
        // Missing `key` property
        group.execute(AddNodeCommand::new(registry.create_node("/system/Variable/Set")?))?;
        group.commit();
        Ok(())
    }

    #[test]
    fn test_early_return_inside_group_keeps_nothing() {
        let registry = NodeRegistry::with_builtins();
        let mut engine = GraphEngine::new();
        let mut history = CommandHistory::new();

        assert!(build_pair(&registry, &mut engine, &mut history).is_err());
        assert_eq!(engine.node_count(), 0);
        assert_eq!(history.undo_depth(), 0);
        assert_eq!(history.undo_description(), None);
    }

    /// Applies fine but refuses to be undone
    #[derive(Debug)]
    struct StuckUndo;

    impl GraphCommand for StuckUndo {
        fn description(&self) -> &str {
            "stuck"
        }

        fn execute(&mut self, _engine: &mut GraphEngine) -> Result<(), CommandError> {
            Ok(())
        }

        fn undo(&mut self, _engine: &mut GraphEngine) -> Result<(), CommandError> {
            Err(CommandError::InvalidState("cannot undo".into()))
        }
    }

    #[test]
    fn test_rollback_continues_past_undo_failure() {
        let mut engine = GraphEngine::new();
        let mut history = CommandHistory::new();

        let mut group = history.begin_group(&mut engine, "Partial");
        group
            .execute(SetVariableCommand::new("a", Value::Int(1), DataType::Int))
            .unwrap();
        group.execute(StuckUndo).unwrap();
        let err = group
            .execute(crate::commands::RemoveVariableCommand::new("ghost"))
            .unwrap_err();
        assert!(matches!(err, CommandError::VariableNotFound(_)));
        assert!(group.is_rolled_back());
        drop(group);

        // The variable set before the stuck command was still reverted
        assert!(engine.variables().is_empty());
        assert!(!history.can_undo());
    }

    #[test]
    fn test_empty_group_records_nothing() {
        let mut engine = GraphEngine::new();
        let mut history = CommandHistory::new();
        history.begin_group(&mut engine, "Nothing").commit();
        assert!(!history.can_undo());
    }

    #[test]
    fn test_explicit_rollback() {
        let mut engine = GraphEngine::new();
        let mut history = CommandHistory::new();
        let mut group = history.begin_group(&mut engine, "Abandoned");
        group
            .execute(SetVariableCommand::new("a", Value::Int(1), DataType::Int))
            .unwrap();
        group.rollback();

        assert!(engine.variables().is_empty());
        assert!(!history.can_undo());
    }
}
