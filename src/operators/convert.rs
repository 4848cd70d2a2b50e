//! Moving data between workspace tensors and `burn` tensors.

use burn::tensor::{Tensor as BurnTensor, TensorData, backend::Backend};

use crate::errors::{NetError, Result};
use crate::graph::OperatorDef;
use crate::workspace::Workspace;

/// Returns the current shapes of every input of `op`.
pub(super) fn input_shapes(op: &OperatorDef, workspace: &Workspace) -> Result<Vec<Vec<usize>>> {
    op.input_names()
        .iter()
        .map(|name| workspace.fetch_blob(name).map(|t| t.shape().to_vec()))
        .collect()
}

/// Flattens a shape into `(outer, inner)` around axis 1.
pub(super) fn flatten_2d(shape: &[usize], context: &str) -> Result<(usize, usize)> {
    match shape.split_first() {
        Some((&outer, rest)) => Ok((outer, rest.iter().product())),
        None => Err(NetError::shape_mismatch(context, &[1, 1], shape)),
    }
}

/// Builds a `burn` tensor from host values.
pub(super) fn float_tensor<B: Backend, const D: usize>(
    values: Vec<f32>,
    shape: [usize; D],
    device: &B::Device,
) -> BurnTensor<B, D> {
    BurnTensor::from_data(TensorData::new(values, shape), device)
}

/// Reads the float blob `name` as a `burn` tensor of the given shape.
///
/// The blob may have any shape with the same element count.
pub(super) fn float_input<B: Backend, const D: usize>(
    workspace: &Workspace,
    name: &str,
    shape: [usize; D],
    device: &B::Device,
) -> Result<BurnTensor<B, D>> {
    let tensor = workspace.fetch_blob(name)?;
    if tensor.numel() != shape.iter().product::<usize>() {
        return Err(NetError::shape_mismatch(name, &shape, tensor.shape()));
    }
    let values = tensor.data::<f32>()?.to_vec();
    Ok(float_tensor::<B, D>(values, shape, device))
}

/// Writes `value` into the blob `name`, reshaped to `shape`.
pub(super) fn write_output<B: Backend, const D: usize>(
    workspace: &mut Workspace,
    name: &str,
    value: BurnTensor<B, D>,
    shape: &[usize],
) -> Result<()> {
    let values = value
        .into_data()
        .to_vec::<f32>()
        .map_err(|err| NetError::TensorConversion {
            message: format!("{err:?}"),
        })?;
    let output = workspace.output_tensor(name);
    output.resize(shape);
    output.copy_from_slice(&values)
}
