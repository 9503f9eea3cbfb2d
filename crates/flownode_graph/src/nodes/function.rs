// SPDX-License-Identifier: MIT OR Apache-2.0
//! Function nodes: wrap an externally bound callable as a graph node.
//!
//! A [`FunctionSignature`] declares the parameter list; each parameter
//! becomes one data pin, in declaration order. Out parameters become
//! output pins typed `T&`. Non auto-run functions also get `Input` and
//! `Output` execute pins, allocated before the parameter pins.

use super::{PIN_INPUT, PIN_OUTPUT};
use crate::execution::NodeContext;
use crate::node::{NodeError, NodeKind};
use crate::pin::{PinAllocator, PinDirection, PinKind};
use crate::value::{DataType, Value};
use std::fmt;
use std::rc::Rc;

/// Callable bound to a function node.
///
/// Receives one argument per parameter, in declaration order. Out
/// parameters are written in place.
pub type Callable = Rc<dyn Fn(&mut [Value]) -> Result<(), NodeError>>;

/// One declared parameter of a function
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Parameter name, used as the pin name
    pub name: String,
    /// Declared type of the parameter, without the by-ref marker
    pub data_type: DataType,
    /// Whether the function writes this parameter
    pub is_out: bool,
}

impl Parameter {
    /// Input parameter
    pub fn input(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            is_out: false,
        }
    }

    /// Out parameter
    pub fn output(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            is_out: true,
        }
    }

    /// Type of the pin allocated for this parameter
    pub fn pin_type(&self) -> DataType {
        if self.is_out {
            DataType::by_ref(self.data_type.clone())
        } else {
            self.data_type.clone()
        }
    }
}

/// Declaration of a bindable function
#[derive(Clone)]
pub struct FunctionSignature {
    category: String,
    name: String,
    description: String,
    auto_run: bool,
    parameters: Vec<Parameter>,
    callable: Callable,
}

impl FunctionSignature {
    /// Signature with no parameters, run through execute pins
    pub fn new(
        category: impl Into<String>,
        name: impl Into<String>,
        callable: impl Fn(&mut [Value]) -> Result<(), NodeError> + 'static,
    ) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
            description: String::new(),
            auto_run: false,
            parameters: Vec::new(),
            callable: Rc::new(callable),
        }
    }

    /// Add an input parameter
    pub fn param(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.parameters.push(Parameter::input(name, data_type));
        self
    }

    /// Add an out parameter
    pub fn out_param(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.parameters.push(Parameter::output(name, data_type));
        self
    }

    /// Mark the function as a pure producer, pulled on demand
    pub fn auto_run(mut self, auto_run: bool) -> Self {
        self.auto_run = auto_run;
        self
    }

    /// Attach a description shown by the registry
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Category segment of the registry path
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Function name, also the node name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether nodes built from this signature are auto-run
    pub fn is_auto_run(&self) -> bool {
        self.auto_run
    }

    /// Declared parameters, in order
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Registry path, `/custom/<category>/<name>`
    pub fn path(&self) -> String {
        format!("/custom/{}/{}", self.category, self.name)
    }

    /// Invoke the bound callable
    pub fn call(&self, args: &mut [Value]) -> Result<(), NodeError> {
        (self.callable)(args)
    }
}

impl fmt::Debug for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionSignature")
            .field("path", &self.path())
            .field("auto_run", &self.auto_run)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// Node wrapping a [`FunctionSignature`]
#[derive(Debug, Clone)]
pub struct FunctionNode {
    signature: Rc<FunctionSignature>,
}

impl FunctionNode {
    /// Node for the given signature
    pub fn new(signature: Rc<FunctionSignature>) -> Self {
        Self { signature }
    }

    /// The wrapped signature
    pub fn signature(&self) -> &FunctionSignature {
        &self.signature
    }
}

impl NodeKind for FunctionNode {
    fn allocate_default_pins(&self, pins: &mut PinAllocator<'_>) {
        if !self.signature.auto_run {
            pins.execute(PIN_INPUT, PinDirection::Input);
            pins.execute(PIN_OUTPUT, PinDirection::Output);
        }
        for param in &self.signature.parameters {
            let direction = if param.is_out {
                PinDirection::Output
            } else {
                PinDirection::Input
            };
            pins.data(param.name.clone(), direction, param.pin_type());
        }
    }

    fn execute(&mut self, cx: &mut NodeContext<'_>) -> Result<(), NodeError> {
        let mut args: Vec<Value> = cx
            .pins()
            .iter()
            .filter(|p| p.kind() == PinKind::Data)
            .map(|p| p.value().clone())
            .collect();

        self.signature.call(&mut args)?;

        let data_pins = cx.pins_mut().iter_mut().filter(|p| p.kind() == PinKind::Data);
        for (pin, value) in data_pins.zip(args) {
            if pin.direction() == PinDirection::Output {
                pin.set_value(value);
            }
        }

        if !self.signature.auto_run {
            cx.push_next_connect_node(PIN_OUTPUT)?;
        }
        Ok(())
    }

    fn auto_run(&self) -> bool {
        self.signature.auto_run
    }
}
