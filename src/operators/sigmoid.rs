//! Sigmoid activation and its gradient.

use burn::tensor::{activation, backend::Backend};

use super::convert::{float_input, input_shapes, write_output};
use crate::errors::{NetError, Result};
use crate::graph::OperatorDef;
use crate::workspace::Workspace;

pub(super) fn sigmoid_gradient_shape(inputs: &[Vec<usize>]) -> Result<Vec<Vec<usize>>> {
    let (y, dy) = (&inputs[0], &inputs[1]);
    if y != dy {
        return Err(NetError::shape_mismatch("Sigmoid output gradient", y, dy));
    }
    Ok(vec![y.clone()])
}

/// `Y = 1 / (1 + e^-X)`, element-wise.
pub(super) fn sigmoid<B: Backend>(
    op: &OperatorDef,
    workspace: &mut Workspace,
    device: &B::Device,
) -> Result<()> {
    let shape = workspace.fetch_blob(op.input_name(0))?.shape().to_vec();
    let numel = shape.iter().product();

    let x = float_input::<B, 1>(workspace, op.input_name(0), [numel], device)?;
    write_output(workspace, op.output_name(0), activation::sigmoid(x), &shape)
}

/// `dX = dY * Y * (1 - Y)`, computed from the forward output `Y`.
pub(super) fn sigmoid_gradient<B: Backend>(
    op: &OperatorDef,
    workspace: &mut Workspace,
    device: &B::Device,
) -> Result<()> {
    let shape = sigmoid_gradient_shape(&input_shapes(op, workspace)?)?.remove(0);
    let numel = shape.iter().product();

    let y = float_input::<B, 1>(workspace, op.input_name(0), [numel], device)?;
    let dy = float_input::<B, 1>(workspace, op.input_name(1), [numel], device)?;

    let dx = dy * y.clone() * (y.neg() + 1.0);
    write_output(workspace, op.output_name(0), dx, &shape)
}
