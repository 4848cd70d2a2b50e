//! End-to-end tests of the intro run and cross-checks of the synthesized
//! backward pass against burn's autodiff.

use burn::backend::{Autodiff, NdArray};
use burn::tensor::activation::{log_softmax, sigmoid};
use burn::tensor::{Tensor as BurnTensor, TensorData, backend::Backend};
use opgraph::driver::{build_init_net, build_train_net};
use opgraph::gradient::add_gradient_operators;
use opgraph::graph::NetDef;
use opgraph::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

type TestBackend = NdArray;
type TrainingBackend = Autodiff<NdArray>;

const TOLERANCE: f32 = 1e-4;

fn assert_all_close(actual: &[f32], expected: &[f32]) {
    assert_eq!(actual.len(), expected.len());
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            (a - e).abs() < TOLERANCE,
            "element {i}: got {a}, expected {e}"
        );
    }
}

fn random_tensor(rng: &mut StdRng, shape: &[usize]) -> Tensor {
    let numel = shape.iter().product();
    let values: Vec<f32> = (0..numel).map(|_| rng.random_range(-1.0..1.0)).collect();
    Tensor::from_vec(shape, values).unwrap()
}

fn fed_workspace(n: usize, k: usize, m: usize, seed: u64) -> Workspace {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut workspace = Workspace::with_seed(seed);
    workspace.feed_blob("data", random_tensor(&mut rng, &[n, k]));
    workspace.feed_blob("fc_w", random_tensor(&mut rng, &[m, k]));
    workspace.feed_blob("fc_b", random_tensor(&mut rng, &[m]));
    let labels: Vec<i32> = (0..n).map(|_| rng.random_range(0..m as i32)).collect();
    workspace.feed_blob("label", Tensor::from_vec(&[n], labels).unwrap());
    workspace
}

fn to_vec<const D: usize>(tensor: BurnTensor<TestBackend, D>) -> Vec<f32> {
    tensor.into_data().to_vec::<f32>().unwrap()
}

/// The same inputs as autodiff leaves.
struct Leaves {
    x: BurnTensor<TrainingBackend, 2>,
    w: BurnTensor<TrainingBackend, 2>,
    b: BurnTensor<TrainingBackend, 1>,
    one_hot: BurnTensor<TrainingBackend, 2>,
}

fn leaves(workspace: &Workspace) -> Leaves {
    let device = Default::default();
    let leaf = |name: &str| {
        let tensor = workspace.fetch_blob(name).unwrap();
        TensorData::new(tensor.to_vec::<f32>().unwrap(), tensor.shape().to_vec())
    };
    let w_shape = workspace.fetch_blob("fc_w").unwrap().shape().to_vec();
    let m = w_shape[0];

    let labels = workspace.fetch_blob("label").unwrap().to_vec::<i32>().unwrap();
    let mut one_hot = vec![0.0f32; labels.len() * m];
    for (row, &label) in labels.iter().enumerate() {
        one_hot[row * m + label as usize] = 1.0;
    }

    Leaves {
        x: BurnTensor::from_data(leaf("data"), &device).require_grad(),
        w: BurnTensor::from_data(leaf("fc_w"), &device).require_grad(),
        b: BurnTensor::from_data(leaf("fc_b"), &device).require_grad(),
        one_hot: BurnTensor::from_data(TensorData::new(one_hot, [labels.len(), m]), &device),
    }
}

fn cross_entropy(
    logits: BurnTensor<TrainingBackend, 2>,
    one_hot: BurnTensor<TrainingBackend, 2>,
) -> BurnTensor<TrainingBackend, 1> {
    let n = logits.dims()[0] as f32;
    (log_softmax(logits, 1) * one_hot).sum().mul_scalar(-1.0 / n)
}

fn fetch_floats(workspace: &Workspace, name: &str) -> Vec<f32> {
    workspace.fetch_blob(name).unwrap().to_vec::<f32>().unwrap()
}

#[test]
fn test_feed_and_fetch_roundtrip() {
    let mut rng = StdRng::seed_from_u64(1);
    let x = random_tensor(&mut rng, &[4, 3, 2]);

    let mut workspace = Workspace::with_seed(1);
    workspace.feed_blob("my_x", x.clone());
    let fetched = workspace.fetch_blob("my_x").unwrap();

    assert_eq!(fetched.shape(), &[4, 3, 2]);
    assert_eq!(fetched.data::<f32>().unwrap(), x.data::<f32>().unwrap());
}

#[test]
fn test_train_net_operator_order() {
    let (net, _) = build_train_net().unwrap();
    assert_eq!(
        net.op_types(),
        vec![
            "FC",
            "Sigmoid",
            "SoftmaxWithLoss",
            "ConstantFill",
            "SoftmaxWithLossGradient",
            "SigmoidGradient",
            "FCGradient",
        ]
    );
}

#[test]
fn test_init_net_populates_parameters() {
    let device = <TestBackend as Backend>::Device::default();
    let mut workspace = Workspace::with_seed(3);
    let init = build_init_net(&DriverConfig::default()).unwrap();
    workspace.run_net_once::<TestBackend>(&init, &device).unwrap();

    let w = workspace.fetch_blob("fc_w").unwrap();
    assert_eq!(w.shape(), &[10, 100]);
    let limit = (3.0f32 / 100.0).sqrt();
    assert!(w.data::<f32>().unwrap().iter().all(|v| v.abs() <= limit));

    let b = workspace.fetch_blob("fc_b").unwrap();
    assert_eq!(b.shape(), &[10]);
    assert!(b.data::<f32>().unwrap().iter().all(|&v| v == 0.0));
}

#[test]
fn test_repeated_runs_are_identical() {
    let device = <TestBackend as Backend>::Device::default();
    let mut workspace = fed_workspace(16, 100, 10, 5);
    let (def, _) = build_train_net().unwrap();
    let net = workspace.create_net::<TestBackend>(&def, &device).unwrap();

    net.run(&mut workspace).unwrap();
    let softmax = fetch_floats(&workspace, "softmax");
    let loss = fetch_floats(&workspace, "loss");
    let w_grad = fetch_floats(&workspace, "fc_w_grad");

    for _ in 0..9 {
        net.run(&mut workspace).unwrap();
        assert_eq!(fetch_floats(&workspace, "softmax"), softmax);
        assert_eq!(fetch_floats(&workspace, "loss"), loss);
        assert_eq!(fetch_floats(&workspace, "fc_w_grad"), w_grad);
    }
}

#[test]
fn test_end_to_end_with_fixed_seed() {
    let config = DriverConfig::new().iterations(5).seed(42);
    let device = <TestBackend as Backend>::Device::default();

    let mut first = Driver::<TestBackend>::new(config.clone(), device).unwrap();
    let report = first.run_with_output(&mut Vec::new()).unwrap();

    assert_eq!(report.softmax_shape, vec![16, 10]);
    assert_eq!(report.runs, 50);
    assert_eq!(report.loss_history.len(), 5);
    let loss = first.workspace().fetch_blob("loss").unwrap();
    assert!(loss.shape().is_empty());
    assert_eq!(loss.numel(), 1);

    let rows = fetch_floats(first.workspace(), "softmax");
    for row in rows.chunks(10) {
        assert!((row.iter().sum::<f32>() - 1.0).abs() < TOLERANCE);
    }

    let mut second = Driver::<TestBackend>::new(config, device).unwrap();
    let again = second.run_with_output(&mut Vec::new()).unwrap();
    assert_eq!(again.loss_history, report.loss_history);
}

#[test]
fn test_gradients_match_autodiff() {
    let device = <TestBackend as Backend>::Device::default();
    let mut workspace = fed_workspace(6, 5, 4, 17);
    let (def, grads) = build_train_net().unwrap();
    workspace.run_net_once::<TestBackend>(&def, &device).unwrap();

    let Leaves { x, w, b, one_hot } = leaves(&workspace);
    let logits = sigmoid(x.clone().matmul(w.clone().transpose()) + b.clone().unsqueeze());
    let loss = cross_entropy(logits, one_hot);

    assert_all_close(
        &fetch_floats(&workspace, "loss"),
        &to_vec(loss.clone().inner()),
    );

    let gradients = loss.backward();
    assert_all_close(
        &fetch_floats(&workspace, &grads["fc_w"]),
        &to_vec(w.grad(&gradients).unwrap()),
    );
    assert_all_close(
        &fetch_floats(&workspace, &grads["fc_b"]),
        &to_vec(b.grad(&gradients).unwrap()),
    );
    assert_all_close(
        &fetch_floats(&workspace, &grads["data"]),
        &to_vec(x.grad(&gradients).unwrap()),
    );
}

#[test]
fn test_fan_out_gradients_match_autodiff() {
    let mut def = NetDef::new("fan out");
    def.add_operator("FC", ["data", "fc_w", "fc_b"], ["hidden"], vec![])
        .unwrap();
    def.add_operator("Sigmoid", ["hidden"], ["activated"], vec![])
        .unwrap();
    def.add_operator("Sum", ["hidden", "activated"], ["logits"], vec![])
        .unwrap();
    def.add_operator("SoftmaxWithLoss", ["logits", "label"], ["softmax", "loss"], vec![])
        .unwrap();
    let grads = add_gradient_operators(&mut def, &["loss"]).unwrap();

    assert_eq!(grads["hidden"], "hidden_grad");
    let accumulations: Vec<_> = def.ops()[4..]
        .iter()
        .filter(|op| op.op_type() == "Sum")
        .collect();
    assert_eq!(accumulations.len(), 1);
    assert_eq!(accumulations[0].output_names(), &["hidden_grad"]);
    assert_eq!(accumulations[0].input_names().len(), 2);

    let device = <TestBackend as Backend>::Device::default();
    let mut workspace = fed_workspace(5, 3, 4, 29);
    workspace.run_net_once::<TestBackend>(&def, &device).unwrap();

    let Leaves { x, w, b, one_hot } = leaves(&workspace);
    let hidden = x.matmul(w.clone().transpose()) + b.clone().unsqueeze();
    let logits = hidden.clone() + sigmoid(hidden);
    let gradients = cross_entropy(logits, one_hot).backward();

    assert_all_close(
        &fetch_floats(&workspace, &grads["fc_w"]),
        &to_vec(w.grad(&gradients).unwrap()),
    );
    assert_all_close(
        &fetch_floats(&workspace, &grads["fc_b"]),
        &to_vec(b.grad(&gradients).unwrap()),
    );
}

#[test]
fn test_repeated_input_gradient_matches_autodiff() {
    // x is both the input and the weight of one FC.
    let mut def = NetDef::new("square");
    def.add_operator("FC", ["data", "data", "fc_b"], ["logits"], vec![])
        .unwrap();
    def.add_operator("SoftmaxWithLoss", ["logits", "label"], ["softmax", "loss"], vec![])
        .unwrap();
    let grads = add_gradient_operators(&mut def, &["loss"]).unwrap();

    let device = <TestBackend as Backend>::Device::default();
    let mut workspace = fed_workspace(4, 4, 4, 31);
    workspace.run_net_once::<TestBackend>(&def, &device).unwrap();

    let Leaves { x, b, one_hot, .. } = leaves(&workspace);
    let logits = x.clone().matmul(x.clone().transpose()) + b.unsqueeze();
    let gradients = cross_entropy(logits, one_hot).backward();

    assert_all_close(
        &fetch_floats(&workspace, &grads["data"]),
        &to_vec(x.grad(&gradients).unwrap()),
    );
}

#[test]
fn test_loss_consumed_downstream_keeps_its_seed() {
    let device = <TestBackend as Backend>::Device::default();

    let (single, _) = build_train_net().unwrap();
    let mut workspace = fed_workspace(6, 5, 4, 37);
    workspace.run_net_once::<TestBackend>(&single, &device).unwrap();
    let single_grad = fetch_floats(&workspace, "fc_w_grad");

    // total = loss, so d(loss + total)/d(fc_w) is twice the single gradient.
    let mut def = NetDef::new("two losses");
    def.add_operator("FC", ["data", "fc_w", "fc_b"], ["fc1"], vec![])
        .unwrap();
    def.add_operator("Sigmoid", ["fc1"], ["pred"], vec![]).unwrap();
    def.add_operator("SoftmaxWithLoss", ["pred", "label"], ["softmax", "loss"], vec![])
        .unwrap();
    def.add_operator("Sum", ["loss"], ["total"], vec![]).unwrap();
    let grads = add_gradient_operators(&mut def, &["loss", "total"]).unwrap();

    let mut workspace = fed_workspace(6, 5, 4, 37);
    workspace.run_net_once::<TestBackend>(&def, &device).unwrap();

    assert_eq!(fetch_floats(&workspace, &grads["loss"]), vec![2.0]);
    let doubled: Vec<f32> = single_grad.iter().map(|g| 2.0 * g).collect();
    assert_all_close(&fetch_floats(&workspace, &grads["fc_w"]), &doubled);
}

#[test]
fn test_fill_operators_have_no_gradient() {
    let mut init = build_init_net(&DriverConfig::default()).unwrap();
    init.add_operator("Sum", ["fc_w", "fc_w"], ["doubled"], vec![])
        .unwrap();

    let err = add_gradient_operators(&mut init, &["doubled"]).unwrap_err();
    assert!(matches!(err, NetError::NoGradient { op_type } if op_type == "XavierFill"));
}
