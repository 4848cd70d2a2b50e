//! The two nets of the intro run.

use super::DriverConfig;
use crate::errors::Result;
use crate::gradient::{GradientMap, add_gradient_operators};
use crate::graph::{Argument, NetDef};

/// Name of the training net; the init net appends `_init`.
pub const NET_NAME: &str = "my first net";

fn dim(size: usize) -> i64 {
    i64::try_from(size).unwrap_or(i64::MAX)
}

/// Builds the parameter initialization net: Xavier weights `fc_w` of shape
/// `[classes, input]` and zero bias `fc_b` of shape `[classes]`.
pub fn build_init_net(config: &DriverConfig) -> Result<NetDef> {
    let mut net = NetDef::new(format!("{NET_NAME}_init"));
    net.add_operator(
        "XavierFill",
        Vec::<String>::new(),
        ["fc_w"],
        vec![Argument::ints(
            "shape",
            [dim(config.num_classes), dim(config.input_size)],
        )],
    )?;
    net.add_operator(
        "ConstantFill",
        Vec::<String>::new(),
        ["fc_b"],
        vec![Argument::ints("shape", [dim(config.num_classes)])],
    )?;
    Ok(net)
}

/// Builds the forward net `FC -> Sigmoid -> SoftmaxWithLoss` and appends its
/// backward pass with respect to `loss`.
pub fn build_train_net() -> Result<(NetDef, GradientMap)> {
    let mut net = NetDef::new(NET_NAME);
    net.add_operator("FC", ["data", "fc_w", "fc_b"], ["fc1"], vec![])?;
    net.add_operator("Sigmoid", ["fc1"], ["pred"], vec![])?;
    net.add_operator(
        "SoftmaxWithLoss",
        ["pred", "label"],
        ["softmax", "loss"],
        vec![],
    )?;
    let grads = add_gradient_operators(&mut net, &["loss"])?;
    Ok((net, grads))
}
