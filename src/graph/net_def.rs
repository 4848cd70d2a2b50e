//! Net definitions: named, ordered operator lists.

use serde::{Deserialize, Serialize};

use super::operator_def::{Argument, OperatorDef};
use crate::errors::Result;
use crate::operators::OpKind;

/// An ordered sequence of operator definitions plus a name.
///
/// Operators are executed top to bottom. Indices returned by
/// [`NetDef::add_op`] stay valid because operators are only ever appended.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetDef {
    name: String,
    #[serde(default)]
    op: Vec<OperatorDef>,
}

impl NetDef {
    /// Creates an empty net definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            op: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Returns the operators in execution order.
    pub fn ops(&self) -> &[OperatorDef] {
        &self.op
    }

    pub fn len(&self) -> usize {
        self.op.len()
    }

    pub fn is_empty(&self) -> bool {
        self.op.is_empty()
    }

    /// Appends an operator and returns its index.
    pub fn add_op(&mut self, op: OperatorDef) -> usize {
        self.op.push(op);
        self.op.len() - 1
    }

    /// Appends an operator after checking its type is registered and its
    /// input/output counts fit that type.
    pub fn add_operator<I, O>(
        &mut self,
        op_type: &str,
        inputs: I,
        outputs: O,
        args: Vec<Argument>,
    ) -> Result<usize>
    where
        I: IntoIterator,
        I::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        let kind = OpKind::from_type(op_type)?;
        let op = OperatorDef::new(op_type)
            .inputs(inputs)
            .outputs(outputs)
            .with_args(args);
        kind.check_arity(&op)?;
        Ok(self.add_op(op))
    }

    /// Returns the operator type names in execution order.
    pub fn op_types(&self) -> Vec<&str> {
        self.op.iter().map(OperatorDef::op_type).collect()
    }

    /// Serializes the definition to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a definition from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
