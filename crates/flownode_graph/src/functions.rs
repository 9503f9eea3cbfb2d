// SPDX-License-Identifier: MIT OR Apache-2.0
//! Builtin function library: small math, constant and debug functions.

use crate::node::NodeError;
use crate::nodes::FunctionSignature;
use crate::registry::NodeRegistry;
use crate::value::{DataType, Value};

fn int_arg(args: &[Value], index: usize, name: &str) -> Result<i64, NodeError> {
    let value = args.get(index).cloned().unwrap_or_default();
    value.as_int().ok_or_else(|| NodeError::TypeMismatch {
        pin: name.to_string(),
        expected: DataType::Int,
        found: value.data_type(),
    })
}

fn set_out(args: &mut [Value], index: usize, value: Value) -> Result<(), NodeError> {
    let slot = args
        .get_mut(index)
        .ok_or_else(|| NodeError::Function(format!("missing out argument {index}")))?;
    *slot = value;
    Ok(())
}

/// `result = a + b`
pub fn add() -> FunctionSignature {
    FunctionSignature::new("Math", "add", |args| {
        let sum = int_arg(args, 0, "a")?.wrapping_add(int_arg(args, 1, "b")?);
        set_out(args, 2, Value::Int(sum))
    })
    .param("a", DataType::Int)
    .param("b", DataType::Int)
    .out_param("result", DataType::Int)
    .auto_run(true)
    .describe("Add two integers")
}

/// `result = a - b`
pub fn sub() -> FunctionSignature {
    FunctionSignature::new("Math", "sub", |args| {
        let diff = int_arg(args, 0, "a")?.wrapping_sub(int_arg(args, 1, "b")?);
        set_out(args, 2, Value::Int(diff))
    })
    .param("a", DataType::Int)
    .param("b", DataType::Int)
    .out_param("result", DataType::Int)
    .auto_run(true)
    .describe("Subtract two integers")
}

/// Constant integer `1`
pub fn int_output() -> FunctionSignature {
    FunctionSignature::new("Constant", "int_output", |args| set_out(args, 0, Value::Int(1)))
        .out_param("result", DataType::Int)
        .auto_run(true)
        .describe("Produce the integer 1")
}

/// Constant float `1.0`
pub fn float_output() -> FunctionSignature {
    FunctionSignature::new("Constant", "float_output", |args| set_out(args, 0, Value::Float(1.0)))
        .out_param("result", DataType::Float)
        .auto_run(true)
        .describe("Produce the float 1.0")
}

/// Log a message, in control flow
pub fn show_message() -> FunctionSignature {
    FunctionSignature::new("Debug", "show_message", |args| {
        let message = args.first().cloned().unwrap_or_default();
        tracing::info!(target: "flownode::message", "{message}");
        Ok(())
    })
    .param("message", DataType::Text)
    .describe("Log a message")
}

/// Register every builtin function
pub fn register_builtin_functions(registry: &mut NodeRegistry) {
    for signature in [add(), sub(), int_output(), float_output(), show_message()] {
        registry.register_function(signature);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::GraphEngine;
    use crate::node::Node;
    use crate::nodes::variable::SetVariableNode;

    #[test]
    fn test_builtin_paths() {
        let mut registry = NodeRegistry::new();
        register_builtin_functions(&mut registry);
        let paths: Vec<_> = registry.function_paths().collect();
        assert_eq!(
            paths,
            [
                "/custom/Math/add",
                "/custom/Math/sub",
                "/custom/Constant/int_output",
                "/custom/Constant/float_output",
                "/custom/Debug/show_message",
            ]
        );
    }

    #[test]
    fn test_math_functions() {
        let mut args = vec![Value::Int(7), Value::Int(5), Value::Null];
        add().call(&mut args).unwrap();
        assert_eq!(args[2], Value::Int(12));
        sub().call(&mut args).unwrap();
        assert_eq!(args[2], Value::Int(2));

        let mut bad = vec![Value::Text("7".into()), Value::Int(5), Value::Null];
        assert!(matches!(add().call(&mut bad), Err(NodeError::TypeMismatch { .. })));
    }

    #[test]
    fn test_constants_feed_add() {
        let registry = NodeRegistry::with_builtins();
        let mut engine = GraphEngine::new();
        let one = engine.add_node(registry.create_node("/custom/Constant/int_output").unwrap()).unwrap();
        let add = engine.add_node(registry.create_node("/custom/Math/add").unwrap()).unwrap();
        let store = engine
            .add_node(Node::new("Set", "/system/Variable/Set", SetVariableNode::new("sum")))
            .unwrap();

        for (src, src_pin, dst, dst_pin) in [
            (one, "result", add, "a"),
            (one, "result", add, "b"),
            (add, "result", store, "sum"),
        ] {
            let src = engine.find_pin(src, src_pin).unwrap();
            let dst = engine.find_pin(dst, dst_pin).unwrap();
            engine.add_connector(src, dst).unwrap();
        }

        engine.run().unwrap();
        assert_eq!(engine.variable("sum"), Some(&Value::Int(2)));
        assert_eq!(engine.variable_type("sum"), Some(&DataType::Int));
    }

    #[test]
    fn test_float_constant_rejected_by_int_input() {
        let registry = NodeRegistry::with_builtins();
        let mut engine = GraphEngine::new();
        let one = engine.add_node(registry.create_node("/custom/Constant/float_output").unwrap()).unwrap();
        let add = engine.add_node(registry.create_node("/custom/Math/add").unwrap()).unwrap();
        let src = engine.find_pin(one, "result").unwrap();
        let dst = engine.find_pin(add, "a").unwrap();
        assert!(engine.add_connector(src, dst).is_err());
    }
}
