//! Element-wise sum, used to accumulate gradients.

use burn::tensor::backend::Backend;

use super::convert::{float_input, input_shapes, write_output};
use crate::errors::{NetError, Result};
use crate::graph::OperatorDef;
use crate::workspace::Workspace;

pub(super) fn sum_shape(inputs: &[Vec<usize>]) -> Result<Vec<Vec<usize>>> {
    let first = &inputs[0];
    if let Some(other) = inputs.iter().find(|shape| *shape != first) {
        return Err(NetError::shape_mismatch("Sum input", first, other));
    }
    Ok(vec![first.clone()])
}

pub(super) fn sum<B: Backend>(
    op: &OperatorDef,
    workspace: &mut Workspace,
    device: &B::Device,
) -> Result<()> {
    let shape = sum_shape(&input_shapes(op, workspace)?)?.remove(0);
    let numel = shape.iter().product();

    let mut total = float_input::<B, 1>(workspace, op.input_name(0), [numel], device)?;
    for name in &op.input_names()[1..] {
        total = total + float_input::<B, 1>(workspace, name, [numel], device)?;
    }
    write_output(workspace, op.output_name(0), total, &shape)
}
