//! Operator definitions: purely descriptive records of one graph step.

use serde::{Deserialize, Serialize};

/// Value of a named operator argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArgValue {
    #[serde(rename = "f")]
    Float(f32),
    #[serde(rename = "i")]
    Int(i64),
    #[serde(rename = "floats")]
    Floats(Vec<f32>),
    #[serde(rename = "ints")]
    Ints(Vec<i64>),
    #[serde(rename = "s")]
    Str(String),
}

/// A named operator argument such as `shape` or `value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    pub name: String,
    #[serde(flatten)]
    pub value: ArgValue,
}

impl Argument {
    pub fn new(name: impl Into<String>, value: ArgValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn float(name: impl Into<String>, value: f32) -> Self {
        Self::new(name, ArgValue::Float(value))
    }

    pub fn int(name: impl Into<String>, value: i64) -> Self {
        Self::new(name, ArgValue::Int(value))
    }

    pub fn ints(name: impl Into<String>, values: impl IntoIterator<Item = i64>) -> Self {
        Self::new(name, ArgValue::Ints(values.into_iter().collect()))
    }
}

/// One operator in a net: a type name, ordered inputs and outputs, and
/// named arguments.
///
/// Nothing here executes; the operator registry gives the type its meaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorDef {
    #[serde(rename = "type")]
    op_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    input: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    output: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    arg: Vec<Argument>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    is_gradient_op: bool,
}

impl OperatorDef {
    /// Creates an operator definition of the given type with no bindings.
    pub fn new(op_type: impl Into<String>) -> Self {
        Self {
            op_type: op_type.into(),
            input: Vec::new(),
            output: Vec::new(),
            arg: Vec::new(),
            is_gradient_op: false,
        }
    }

    /// Appends an input blob name.
    pub fn input(mut self, name: impl Into<String>) -> Self {
        self.input.push(name.into());
        self
    }

    /// Appends several input blob names.
    pub fn inputs<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.input.extend(names.into_iter().map(Into::into));
        self
    }

    /// Appends an output blob name.
    pub fn output(mut self, name: impl Into<String>) -> Self {
        self.output.push(name.into());
        self
    }

    /// Appends several output blob names.
    pub fn outputs<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.output.extend(names.into_iter().map(Into::into));
        self
    }

    /// Appends an argument.
    pub fn arg(mut self, arg: Argument) -> Self {
        self.arg.push(arg);
        self
    }

    /// Appends several arguments.
    pub fn with_args(mut self, args: impl IntoIterator<Item = Argument>) -> Self {
        self.arg.extend(args);
        self
    }

    /// Sets the gradient-operator flag.
    pub fn gradient(mut self, is_gradient_op: bool) -> Self {
        self.is_gradient_op = is_gradient_op;
        self
    }

    pub fn op_type(&self) -> &str {
        &self.op_type
    }

    pub fn input_names(&self) -> &[String] {
        &self.input
    }

    pub fn output_names(&self) -> &[String] {
        &self.output
    }

    pub fn args(&self) -> &[Argument] {
        &self.arg
    }

    pub fn is_gradient_op(&self) -> bool {
        self.is_gradient_op
    }

    /// Returns the `index`-th input name, or an empty string if absent.
    pub fn input_name(&self, index: usize) -> &str {
        self.input.get(index).map(String::as_str).unwrap_or("")
    }

    /// Returns the `index`-th output name, or an empty string if absent.
    pub fn output_name(&self, index: usize) -> &str {
        self.output.get(index).map(String::as_str).unwrap_or("")
    }

    /// Looks up an argument by name.
    pub fn get_arg(&self, name: &str) -> Option<&ArgValue> {
        self.arg.iter().find(|a| a.name == name).map(|a| &a.value)
    }

    /// Returns a float argument, accepting integer values too.
    pub fn arg_float(&self, name: &str) -> Option<f32> {
        match self.get_arg(name)? {
            ArgValue::Float(v) => Some(*v),
            ArgValue::Int(v) => Some(*v as f32),
            _ => None,
        }
    }

    /// Returns an integer argument.
    pub fn arg_int(&self, name: &str) -> Option<i64> {
        match self.get_arg(name)? {
            ArgValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns an integer-list argument.
    pub fn arg_ints(&self, name: &str) -> Option<&[i64]> {
        match self.get_arg(name)? {
            ArgValue::Ints(v) => Some(v),
            _ => None,
        }
    }

    /// Renames one output in place.
    pub(crate) fn set_output(&mut self, index: usize, name: String) {
        if let Some(slot) = self.output.get_mut(index) {
            *slot = name;
        }
    }
}
