//! Fully connected layer and its gradient.

use burn::tensor::backend::Backend;

use super::convert::{flatten_2d, float_input, input_shapes, write_output};
use crate::errors::{NetError, Result};
use crate::graph::OperatorDef;
use crate::workspace::Workspace;

/// Checks `X`, `W`, `b` and returns `(n, k, m)`.
///
/// `X` is flattened to `[n, k]` around axis 1, `W` must be `[m, k]` and `b`
/// must be `[m]`.
fn fc_dims(x: &[usize], w: &[usize], b: &[usize]) -> Result<(usize, usize, usize)> {
    let (n, k) = flatten_2d(x, "FC input")?;
    let m = w.first().copied().unwrap_or(0);
    if w.len() != 2 || w[1] != k {
        return Err(NetError::shape_mismatch("FC weight", &[m, k], w));
    }
    if b != [m] {
        return Err(NetError::shape_mismatch("FC bias", &[m], b));
    }
    Ok((n, k, m))
}

pub(super) fn fc_shape(inputs: &[Vec<usize>]) -> Result<Vec<Vec<usize>>> {
    let (n, _, m) = fc_dims(&inputs[0], &inputs[1], &inputs[2])?;
    Ok(vec![vec![n, m]])
}

/// Inputs `X`, `W`, `dY`; outputs `dW`, `db`, `dX`.
pub(super) fn fc_gradient_shape(inputs: &[Vec<usize>]) -> Result<Vec<Vec<usize>>> {
    let (x, w, dy) = (&inputs[0], &inputs[1], &inputs[2]);
    let m = w.first().copied().unwrap_or(0);
    let (n, _, _) = fc_dims(x, w, &[m])?;
    if dy.as_slice() != [n, m] {
        return Err(NetError::shape_mismatch("FC output gradient", &[n, m], dy));
    }
    Ok(vec![w.clone(), vec![m], x.clone()])
}

/// `Y = X * W^T + b`.
pub(super) fn fc<B: Backend>(
    op: &OperatorDef,
    workspace: &mut Workspace,
    device: &B::Device,
) -> Result<()> {
    let shapes = input_shapes(op, workspace)?;
    let (n, k, m) = fc_dims(&shapes[0], &shapes[1], &shapes[2])?;

    let x = float_input::<B, 2>(workspace, op.input_name(0), [n, k], device)?;
    let w = float_input::<B, 2>(workspace, op.input_name(1), [m, k], device)?;
    let b = float_input::<B, 2>(workspace, op.input_name(2), [1, m], device)?;

    let y = x.matmul(w.transpose()) + b;
    write_output(workspace, op.output_name(0), y, &[n, m])
}

/// `dW = dY^T * X`, `db = sum over rows of dY`, `dX = dY * W`.
pub(super) fn fc_gradient<B: Backend>(
    op: &OperatorDef,
    workspace: &mut Workspace,
    device: &B::Device,
) -> Result<()> {
    let shapes = input_shapes(op, workspace)?;
    let output_shapes = fc_gradient_shape(&shapes)?;
    let (n, k) = flatten_2d(&shapes[0], "FC input")?;
    let m = shapes[1][0];

    let x = float_input::<B, 2>(workspace, op.input_name(0), [n, k], device)?;
    let w = float_input::<B, 2>(workspace, op.input_name(1), [m, k], device)?;
    let dy = float_input::<B, 2>(workspace, op.input_name(2), [n, m], device)?;

    let dw = dy.clone().transpose().matmul(x);
    let db = dy.clone().sum_dim(0);
    let dx = dy.matmul(w);

    write_output(workspace, op.output_name(0), dw, &output_shapes[0])?;
    write_output(workspace, op.output_name(1), db, &output_shapes[1])?;
    write_output(workspace, op.output_name(2), dx, &output_shapes[2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::Tensor;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn feed(workspace: &mut Workspace, name: &str, shape: &[usize], values: &[f32]) {
        workspace.feed_blob(name, Tensor::from_vec(shape, values.to_vec()).unwrap());
    }

    fn values(workspace: &Workspace, name: &str) -> Vec<f32> {
        workspace.fetch_blob(name).unwrap().to_vec::<f32>().unwrap()
    }

    #[test]
    fn test_fc_shape() {
        assert_eq!(
            fc_shape(&[vec![16, 100], vec![10, 100], vec![10]]).unwrap(),
            vec![vec![16, 10]]
        );
        assert_eq!(
            fc_shape(&[vec![4, 3, 2], vec![5, 6], vec![5]]).unwrap(),
            vec![vec![4, 5]]
        );
        assert!(fc_shape(&[vec![16, 100], vec![100, 10], vec![10]]).is_err());
        assert!(fc_shape(&[vec![16, 100], vec![10, 100], vec![100]]).is_err());
    }

    #[test]
    fn test_fc_forward_values() {
        let device = Default::default();
        let mut workspace = Workspace::with_seed(0);
        // X = [[1, 2], [3, 4]], W = [[1, 0], [0, 1], [1, 1]], b = [0.5, -0.5, 0]
        feed(&mut workspace, "x", &[2, 2], &[1.0, 2.0, 3.0, 4.0]);
        feed(&mut workspace, "w", &[3, 2], &[1.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        feed(&mut workspace, "b", &[3], &[0.5, -0.5, 0.0]);

        let op = OperatorDef::new("FC").inputs(["x", "w", "b"]).output("y");
        fc::<TestBackend>(&op, &mut workspace, &device).unwrap();

        assert_eq!(workspace.fetch_blob("y").unwrap().shape(), &[2, 3]);
        let y = values(&workspace, "y");
        let expected = [1.5, 1.5, 3.0, 3.5, 3.5, 7.0];
        for (got, want) in y.iter().zip(expected) {
            assert!((got - want).abs() < 1e-6, "got {got}, want {want}");
        }
    }

    #[test]
    fn test_fc_gradient_values() {
        let device = Default::default();
        let mut workspace = Workspace::with_seed(0);
        feed(&mut workspace, "x", &[2, 2], &[1.0, 2.0, 3.0, 4.0]);
        feed(&mut workspace, "w", &[1, 2], &[0.5, -1.0]);
        feed(&mut workspace, "dy", &[2, 1], &[1.0, 2.0]);

        let op = OperatorDef::new("FCGradient")
            .inputs(["x", "w", "dy"])
            .outputs(["w_grad", "b_grad", "x_grad"]);
        fc_gradient::<TestBackend>(&op, &mut workspace, &device).unwrap();

        // dW = dY^T X = [1*1 + 2*3, 1*2 + 2*4]
        assert_eq!(values(&workspace, "w_grad"), vec![7.0, 10.0]);
        assert_eq!(values(&workspace, "b_grad"), vec![3.0]);
        assert_eq!(workspace.fetch_blob("b_grad").unwrap().shape(), &[1]);
        // dX = dY W
        assert_eq!(values(&workspace, "x_grad"), vec![0.5, -1.0, 1.0, -2.0]);
    }

    #[test]
    fn test_fc_runtime_shape_check() {
        let device = Default::default();
        let mut workspace = Workspace::with_seed(0);
        feed(&mut workspace, "x", &[1, 3], &[1.0, 2.0, 3.0]);
        feed(&mut workspace, "w", &[1, 2], &[1.0, 1.0]);
        feed(&mut workspace, "b", &[1], &[0.0]);

        let op = OperatorDef::new("FC").inputs(["x", "w", "b"]).output("y");
        let err = fc::<TestBackend>(&op, &mut workspace, &device).unwrap_err();
        assert!(matches!(err, NetError::ShapeMismatch { .. }));
        assert!(!workspace.has_blob("y"));
    }
}
