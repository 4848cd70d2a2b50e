//! Fill operators: `ConstantFill` and `XavierFill`.

use rand::Rng;

use crate::errors::{NetError, Result};
use crate::graph::OperatorDef;
use crate::workspace::{DataType, Workspace};

/// `dtype` argument values, numbered like the usual tensor-proto enum.
const DTYPE_FLOAT: i64 = 1;
const DTYPE_INT32: i64 = 2;

/// Reads the optional `shape` argument.
fn shape_arg(op: &OperatorDef) -> Result<Option<Vec<usize>>> {
    let Some(dims) = op.arg_ints("shape") else {
        return Ok(None);
    };
    dims.iter()
        .map(|&dim| {
            usize::try_from(dim).map_err(|_| {
                NetError::invalid_argument(op.op_type(), "shape", format!("negative dimension {dim}"))
            })
        })
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

fn dtype_arg(op: &OperatorDef) -> Result<DataType> {
    match op.arg_int("dtype").unwrap_or(DTYPE_FLOAT) {
        DTYPE_FLOAT => Ok(DataType::Float32),
        DTYPE_INT32 => Ok(DataType::Int32),
        other => Err(NetError::invalid_argument(
            op.op_type(),
            "dtype",
            format!("unsupported data type {other}"),
        )),
    }
}

pub(super) fn constant_fill_shape(op: &OperatorDef, inputs: &[Vec<usize>]) -> Result<Vec<Vec<usize>>> {
    dtype_arg(op)?;
    match inputs.first() {
        Some(shape) => Ok(vec![shape.clone()]),
        None => Ok(vec![shape_arg(op)?.unwrap_or_default()]),
    }
}

/// Fills the output with `value` (default 0).
///
/// With an input the output takes the input's shape; otherwise the `shape`
/// argument is used, and no shape at all yields a scalar.
pub(super) fn constant_fill(op: &OperatorDef, workspace: &mut Workspace) -> Result<()> {
    let shape = match op.input_names().first() {
        Some(name) => workspace.fetch_blob(name)?.shape().to_vec(),
        None => shape_arg(op)?.unwrap_or_default(),
    };
    let value = op.arg_float("value").unwrap_or(0.0);
    let dtype = dtype_arg(op)?;

    let output = workspace.output_tensor(op.output_name(0));
    output.resize(&shape);
    match dtype {
        DataType::Float32 => output.mutable_data::<f32>().fill(value),
        DataType::Int32 => output.mutable_data::<i32>().fill(value as i32),
    }
    Ok(())
}

fn xavier_shape(op: &OperatorDef) -> Result<Vec<usize>> {
    let shape = shape_arg(op)?
        .ok_or_else(|| NetError::invalid_argument(op.op_type(), "shape", "argument is required"))?;
    if shape.is_empty() || shape.contains(&0) {
        return Err(NetError::invalid_argument(
            op.op_type(),
            "shape",
            format!("cannot compute fan-in of shape {shape:?}"),
        ));
    }
    Ok(shape)
}

pub(super) fn xavier_fill_shape(op: &OperatorDef) -> Result<Vec<Vec<usize>>> {
    Ok(vec![xavier_shape(op)?])
}

/// Fills the output uniformly in `[-s, s]` with `s = sqrt(3 / fan_in)`,
/// where `fan_in` is the element count divided by the first dimension.
pub(super) fn xavier_fill(op: &OperatorDef, workspace: &mut Workspace) -> Result<()> {
    let shape = xavier_shape(op)?;
    let numel: usize = shape.iter().product();
    let fan_in = numel / shape[0];
    let scale = (3.0 / fan_in as f32).sqrt();

    let rng = workspace.rng_mut();
    let values: Vec<f32> = (0..numel)
        .map(|_| rng.random_range(-scale..=scale))
        .collect();

    let output = workspace.output_tensor(op.output_name(0));
    output.resize(&shape);
    output.copy_from_slice(&values)
}
