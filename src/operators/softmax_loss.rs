//! Softmax with cross-entropy loss, and its gradient.
//!
//! Logits `X` are flattened to `[n, d]`; `label` holds `n` int32 class
//! indices in `[0, d)`. The optional `scale` argument multiplies the loss.

use burn::tensor::{activation, backend::Backend};

use super::convert::{flatten_2d, float_input, float_tensor, input_shapes, write_output};
use crate::errors::{NetError, Result};
use crate::graph::OperatorDef;
use crate::workspace::Workspace;

fn logits_dims(x: &[usize], label: &[usize]) -> Result<(usize, usize)> {
    let (n, d) = flatten_2d(x, "SoftmaxWithLoss logits")?;
    if n == 0 || d == 0 {
        return Err(NetError::shape_mismatch("SoftmaxWithLoss logits", &[n.max(1), d.max(1)], x));
    }
    if label.iter().product::<usize>() != n || label.len() > 2 {
        return Err(NetError::shape_mismatch("SoftmaxWithLoss label", &[n], label));
    }
    Ok((n, d))
}

/// Outputs the softmax, shaped like `X`, and a scalar loss.
pub(super) fn softmax_loss_shape(inputs: &[Vec<usize>]) -> Result<Vec<Vec<usize>>> {
    logits_dims(&inputs[0], &inputs[1])?;
    Ok(vec![inputs[0].clone(), Vec::new()])
}

/// Inputs `X`, `label`, `P`, `dloss`; output `dX`.
pub(super) fn softmax_loss_gradient_shape(inputs: &[Vec<usize>]) -> Result<Vec<Vec<usize>>> {
    let (x, label, probs, d_loss) = (&inputs[0], &inputs[1], &inputs[2], &inputs[3]);
    logits_dims(x, label)?;
    if probs != x {
        return Err(NetError::shape_mismatch("SoftmaxWithLoss probabilities", x, probs));
    }
    if d_loss.iter().product::<usize>() != 1 {
        return Err(NetError::shape_mismatch("SoftmaxWithLoss loss gradient", &[], d_loss));
    }
    Ok(vec![x.clone()])
}

/// Row-major one-hot encoding of `labels` over `classes` columns.
fn one_hot(labels: &[i32], classes: usize) -> Result<Vec<f32>> {
    let mut encoded = vec![0.0f32; labels.len() * classes];
    for (row, &label) in labels.iter().enumerate() {
        let class = usize::try_from(label)
            .ok()
            .filter(|&class| class < classes)
            .ok_or(NetError::InvalidLabel { label, classes })?;
        encoded[row * classes + class] = 1.0;
    }
    Ok(encoded)
}

/// `P = softmax(X)`, `loss = -scale * mean_i log P[i, label_i]`.
pub(super) fn softmax_loss<B: Backend>(
    op: &OperatorDef,
    workspace: &mut Workspace,
    device: &B::Device,
) -> Result<()> {
    let shapes = input_shapes(op, workspace)?;
    let (n, d) = logits_dims(&shapes[0], &shapes[1])?;
    let scale = op.arg_float("scale").unwrap_or(1.0);

    let labels = one_hot(workspace.fetch_blob(op.input_name(1))?.data::<i32>()?, d)?;
    let logits = float_input::<B, 2>(workspace, op.input_name(0), [n, d], device)?;
    let labels = float_tensor::<B, 2>(labels, [n, d], device);

    let probs = activation::softmax(logits.clone(), 1);
    let loss = (activation::log_softmax(logits, 1) * labels)
        .sum()
        .mul_scalar(-scale / n as f32);

    write_output(workspace, op.output_name(0), probs, &shapes[0])?;
    write_output(workspace, op.output_name(1), loss, &[])
}

/// `dX = (P - onehot(label)) * dloss * scale / n`.
pub(super) fn softmax_loss_gradient<B: Backend>(
    op: &OperatorDef,
    workspace: &mut Workspace,
    device: &B::Device,
) -> Result<()> {
    let shapes = input_shapes(op, workspace)?;
    let output_shape = softmax_loss_gradient_shape(&shapes)?.remove(0);
    let (n, d) = flatten_2d(&shapes[0], "SoftmaxWithLoss logits")?;
    let scale = op.arg_float("scale").unwrap_or(1.0);

    let labels = one_hot(workspace.fetch_blob(op.input_name(1))?.data::<i32>()?, d)?;
    let d_loss = workspace
        .fetch_blob(op.input_name(3))?
        .data::<f32>()?
        .first()
        .copied()
        .ok_or(NetError::UninitializedTensor)?;
    let probs = float_input::<B, 2>(workspace, op.input_name(2), [n, d], device)?;
    let labels = float_tensor::<B, 2>(labels, [n, d], device);

    let dx = (probs - labels).mul_scalar(d_loss * scale / n as f32);
    write_output(workspace, op.output_name(0), dx, &output_shape)
}
