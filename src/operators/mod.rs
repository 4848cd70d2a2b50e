//! The operator registry and its kernels.
//!
//! Uses a simple enum instead of trait objects: [`OpKind::from_type`] is the
//! registry lookup, and each variant dispatches to a kernel module. Kernels
//! read their inputs from the workspace, do the math on `burn` tensors, and
//! overwrite their outputs in place.

mod convert;
mod fill;
mod fully_connected;
mod sigmoid;
mod softmax_loss;
mod sum;

use burn::tensor::backend::Backend;

use crate::errors::{NetError, Result};
use crate::graph::OperatorDef;
use crate::workspace::Workspace;

/// Every operator type the registry knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// Fill with a constant `value`, shaped like the input or by `shape`.
    ConstantFill,
    /// Fill with Xavier-uniform values for the given `shape`.
    XavierFill,
    /// Fully connected layer: `Y = X * W^T + b`.
    FC,
    FCGradient,
    /// Element-wise logistic sigmoid.
    Sigmoid,
    SigmoidGradient,
    /// Softmax over classes followed by mean cross-entropy against int labels.
    SoftmaxWithLoss,
    SoftmaxWithLossGradient,
    /// Element-wise sum of equally shaped inputs.
    Sum,
}

/// Accepted number of inputs or outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    min: usize,
    max: Option<usize>,
}

impl Arity {
    const fn exactly(n: usize) -> Self {
        Self {
            min: n,
            max: Some(n),
        }
    }

    const fn range(min: usize, max: usize) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    const fn at_least(min: usize) -> Self {
        Self { min, max: None }
    }

    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min && self.max.is_none_or(|max| count <= max)
    }

    fn describe(&self) -> String {
        match self.max {
            Some(max) if max == self.min => format!("{max}"),
            Some(max) => format!("{}..={max}", self.min),
            None => format!("at least {}", self.min),
        }
    }
}

impl OpKind {
    /// All registered operator kinds.
    pub const ALL: [OpKind; 9] = [
        OpKind::ConstantFill,
        OpKind::XavierFill,
        OpKind::FC,
        OpKind::FCGradient,
        OpKind::Sigmoid,
        OpKind::SigmoidGradient,
        OpKind::SoftmaxWithLoss,
        OpKind::SoftmaxWithLossGradient,
        OpKind::Sum,
    ];

    /// Looks up an operator type name in the registry.
    pub fn from_type(op_type: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.type_name() == op_type)
            .ok_or_else(|| NetError::UnknownOperator {
                op_type: op_type.to_string(),
            })
    }

    /// Returns true if `op_type` names a registered operator.
    pub fn is_registered(op_type: &str) -> bool {
        Self::from_type(op_type).is_ok()
    }

    /// Returns the registered type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            OpKind::ConstantFill => "ConstantFill",
            OpKind::XavierFill => "XavierFill",
            OpKind::FC => "FC",
            OpKind::FCGradient => "FCGradient",
            OpKind::Sigmoid => "Sigmoid",
            OpKind::SigmoidGradient => "SigmoidGradient",
            OpKind::SoftmaxWithLoss => "SoftmaxWithLoss",
            OpKind::SoftmaxWithLossGradient => "SoftmaxWithLossGradient",
            OpKind::Sum => "Sum",
        }
    }

    pub fn input_arity(&self) -> Arity {
        match self {
            OpKind::ConstantFill => Arity::range(0, 1),
            OpKind::XavierFill => Arity::exactly(0),
            OpKind::FC | OpKind::FCGradient => Arity::exactly(3),
            OpKind::Sigmoid => Arity::exactly(1),
            OpKind::SigmoidGradient | OpKind::SoftmaxWithLoss => Arity::exactly(2),
            OpKind::SoftmaxWithLossGradient => Arity::exactly(4),
            OpKind::Sum => Arity::at_least(1),
        }
    }

    pub fn output_arity(&self) -> Arity {
        match self {
            OpKind::FCGradient => Arity::exactly(3),
            OpKind::SoftmaxWithLoss => Arity::exactly(2),
            _ => Arity::exactly(1),
        }
    }

    /// Checks the input and output counts of `op` against this kind.
    pub fn check_arity(&self, op: &OperatorDef) -> Result<()> {
        let checks = [
            ("inputs", self.input_arity(), op.input_names().len()),
            ("outputs", self.output_arity(), op.output_names().len()),
        ];
        for (kind, arity, actual) in checks {
            if !arity.accepts(actual) {
                return Err(NetError::InvalidArity {
                    op_type: self.type_name().to_string(),
                    kind,
                    expected: arity.describe(),
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Computes output shapes from input shapes without touching any data.
    ///
    /// Fails with [`NetError::InvalidArity`] when `inputs` or the outputs of
    /// `op` do not fit this kind.
    pub fn infer_shapes(&self, op: &OperatorDef, inputs: &[Vec<usize>]) -> Result<Vec<Vec<usize>>> {
        self.check_arity(op)?;
        if !self.input_arity().accepts(inputs.len()) {
            return Err(NetError::InvalidArity {
                op_type: self.type_name().to_string(),
                kind: "input shapes",
                expected: self.input_arity().describe(),
                actual: inputs.len(),
            });
        }
        match self {
            OpKind::ConstantFill => fill::constant_fill_shape(op, inputs),
            OpKind::XavierFill => fill::xavier_fill_shape(op),
            OpKind::FC => fully_connected::fc_shape(inputs),
            OpKind::FCGradient => fully_connected::fc_gradient_shape(inputs),
            OpKind::Sigmoid => Ok(vec![inputs[0].clone()]),
            OpKind::SigmoidGradient => sigmoid::sigmoid_gradient_shape(inputs),
            OpKind::SoftmaxWithLoss => softmax_loss::softmax_loss_shape(inputs),
            OpKind::SoftmaxWithLossGradient => softmax_loss::softmax_loss_gradient_shape(inputs),
            OpKind::Sum => sum::sum_shape(inputs),
        }
    }

    /// Runs the kernel for `op` against `workspace` on `device`.
    pub fn run<B: Backend>(
        &self,
        op: &OperatorDef,
        workspace: &mut Workspace,
        device: &B::Device,
    ) -> Result<()> {
        match self {
            OpKind::ConstantFill => fill::constant_fill(op, workspace),
            OpKind::XavierFill => fill::xavier_fill(op, workspace),
            OpKind::FC => fully_connected::fc::<B>(op, workspace, device),
            OpKind::FCGradient => fully_connected::fc_gradient::<B>(op, workspace, device),
            OpKind::Sigmoid => sigmoid::sigmoid::<B>(op, workspace, device),
            OpKind::SigmoidGradient => sigmoid::sigmoid_gradient::<B>(op, workspace, device),
            OpKind::SoftmaxWithLoss => softmax_loss::softmax_loss::<B>(op, workspace, device),
            OpKind::SoftmaxWithLossGradient => {
                softmax_loss::softmax_loss_gradient::<B>(op, workspace, device)
            }
            OpKind::Sum => sum::sum::<B>(op, workspace, device),
        }
    }
}
