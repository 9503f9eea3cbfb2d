// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in demo graph, assembled through the command layer.
//!
//! ```text
//! Start -> Loop --LoopBody--> Set last_index (<- Loop.Index)
//!               --Completed-> show_message -> Set answer (<- add(int_output, 41))
//! ```

use anyhow::Context;
use flownode_graph::{GraphEngine, NodeId, NodeRegistry, PinRef, Properties, Value};
use flownode_history::{
    AddConnectorCommand, AddNodeCommand, CommandGroup, CommandHistory, SetPinValueCommand,
};

/// Build the demo graph into `engine`, recorded as one history entry
pub fn build(
    registry: &NodeRegistry,
    engine: &mut GraphEngine,
    history: &mut CommandHistory,
    loop_count: i64,
) -> anyhow::Result<()> {
    let mut group = history.begin_group(engine, "Build demo graph");

    let start = add(&mut group, registry, "/system/Sequence", Properties::new())?;
    let looped = add(
        &mut group,
        registry,
        "/system/Loop",
        properties(&[("loop_count", Value::Int(loop_count))]),
    )?;
    let set_index = add(
        &mut group,
        registry,
        "/system/Variable/Set",
        properties(&[("key", Value::Text("last_index".into()))]),
    )?;
    let message = add(&mut group, registry, "/custom/Debug/show_message", Properties::new())?;
    let one = add(&mut group, registry, "/custom/Constant/int_output", Properties::new())?;
    let sum = add(&mut group, registry, "/custom/Math/add", Properties::new())?;
    let set_answer = add(
        &mut group,
        registry,
        "/system/Variable/Set",
        properties(&[("key", Value::Text("answer".into()))]),
    )?;

    let text = pin(&group, message, "message")?;
    group.execute(SetPinValueCommand::new(text, Value::Text("demo loop finished".into())))?;
    let b = pin(&group, sum, "b")?;
    group.execute(SetPinValueCommand::new(b, Value::Int(41)))?;

    for (src, src_pin, dst, dst_pin) in [
        (start, "Output", looped, "Input"),
        (looped, "LoopBody", set_index, "Input"),
        (looped, "Index", set_index, "last_index"),
        (looped, "Completed", message, "Input"),
        (message, "Output", set_answer, "Input"),
        (one, "result", sum, "a"),
        (sum, "result", set_answer, "answer"),
    ] {
        let src = pin(&group, src, src_pin)?;
        let dst = pin(&group, dst, dst_pin)?;
        group.execute(AddConnectorCommand::new(src, dst))?;
    }

    group.commit();
    Ok(())
}

fn properties(entries: &[(&str, Value)]) -> Properties {
    entries
        .iter()
        .map(|(name, value)| ((*name).to_string(), value.clone()))
        .collect()
}

fn add(
    group: &mut CommandGroup<'_>,
    registry: &NodeRegistry,
    path: &str,
    properties: Properties,
) -> anyhow::Result<NodeId> {
    let node = registry
        .create_node_with(path, &properties)
        .with_context(|| format!("failed to create {path}"))?;
    let id = node.id();
    group.execute(AddNodeCommand::new(node))?;
    Ok(id)
}

fn pin(group: &CommandGroup<'_>, node: NodeId, name: &str) -> anyhow::Result<PinRef> {
    group
        .engine()
        .find_pin(node, name)
        .with_context(|| format!("node {node} has no pin {name}"))
}
