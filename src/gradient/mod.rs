//! Gradient registry and gradient synthesis.
//!
//! The registry maps one forward operator to the operators computing its
//! input gradients. The synthesizer walks a forward net in reverse and
//! appends everything the registry returns, summing partial gradients of
//! blobs that feed more than one operator.
//!
//! # Example
//!
//! ```
//! use opgraph::gradient::add_gradient_operators;
//! use opgraph::graph::NetDef;
//!
//! let mut net = NetDef::new("my first net");
//! net.add_operator("FC", ["data", "fc_w", "fc_b"], ["fc1"], vec![]).unwrap();
//! net.add_operator("Sigmoid", ["fc1"], ["pred"], vec![]).unwrap();
//! net.add_operator("SoftmaxWithLoss", ["pred", "label"], ["softmax", "loss"], vec![]).unwrap();
//!
//! let grads = add_gradient_operators(&mut net, &["loss"]).unwrap();
//! assert_eq!(grads["fc_w"], "fc_w_grad");
//! assert_eq!(
//!     net.op_types(),
//!     vec![
//!         "FC",
//!         "Sigmoid",
//!         "SoftmaxWithLoss",
//!         "ConstantFill",
//!         "SoftmaxWithLossGradient",
//!         "SigmoidGradient",
//!         "FCGradient",
//!     ]
//! );
//! ```

mod builder;
mod registry;

pub use builder::{GradientMap, add_gradient_operators};
pub use registry::{GradientOpsMeta, gradient_for_op, gradient_name};
