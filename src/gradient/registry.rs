//! The gradient registry.

use crate::errors::{NetError, Result};
use crate::graph::OperatorDef;
use crate::operators::OpKind;

/// The backward counterpart of one forward operator.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientOpsMeta {
    /// Operators computing the input gradients, in execution order.
    pub ops: Vec<OperatorDef>,
    /// Blob holding the gradient of each forward input, `None` where the
    /// input is not differentiable.
    pub g_input: Vec<Option<String>>,
}

/// Default gradient blob name of `blob`.
pub fn gradient_name(blob: &str) -> String {
    format!("{blob}_grad")
}

fn required_output_gradient<'a>(
    op: &OperatorDef,
    g_output: &'a [Option<String>],
    index: usize,
) -> Result<&'a str> {
    g_output
        .get(index)
        .and_then(Option::as_deref)
        .ok_or_else(|| NetError::MissingGradient {
            op_type: op.op_type().to_string(),
            output: op.output_name(index).to_string(),
        })
}

/// Looks up the gradient operators of `op`.
///
/// `g_output` names the gradient blob of each output of `op`, `None` where no
/// gradient flows back. Operators without a gradient (fills, and gradient
/// operators themselves) fail with [`NetError::NoGradient`].
pub fn gradient_for_op(op: &OperatorDef, g_output: &[Option<String>]) -> Result<GradientOpsMeta> {
    let kind = OpKind::from_type(op.op_type())?;
    kind.check_arity(op)?;
    if g_output.len() != op.output_names().len() {
        return Err(NetError::InvalidArity {
            op_type: op.op_type().to_string(),
            kind: "output gradients",
            expected: op.output_names().len().to_string(),
            actual: g_output.len(),
        });
    }

    let input = |index: usize| op.input_name(index).to_string();
    let grad = |index: usize| gradient_name(op.input_name(index));

    match kind {
        OpKind::FC => {
            let dy = required_output_gradient(op, g_output, 0)?;
            Ok(GradientOpsMeta {
                ops: vec![
                    OperatorDef::new("FCGradient")
                        .inputs([input(0), input(1), dy.to_string()])
                        .outputs([grad(1), grad(2), grad(0)])
                        .with_args(op.args().iter().cloned()),
                ],
                g_input: vec![Some(grad(0)), Some(grad(1)), Some(grad(2))],
            })
        }
        OpKind::Sigmoid => {
            let dy = required_output_gradient(op, g_output, 0)?;
            Ok(GradientOpsMeta {
                ops: vec![
                    OperatorDef::new("SigmoidGradient")
                        .inputs([op.output_name(0).to_string(), dy.to_string()])
                        .output(grad(0)),
                ],
                g_input: vec![Some(grad(0))],
            })
        }
        OpKind::SoftmaxWithLoss => {
            let d_loss = required_output_gradient(op, g_output, 1)?;
            Ok(GradientOpsMeta {
                ops: vec![
                    OperatorDef::new("SoftmaxWithLossGradient")
                        .inputs([
                            input(0),
                            input(1),
                            op.output_name(0).to_string(),
                            d_loss.to_string(),
                        ])
                        .output(grad(0))
                        .with_args(op.args().iter().cloned()),
                ],
                g_input: vec![Some(grad(0)), None],
            })
        }
        OpKind::Sum => {
            let dy = required_output_gradient(op, g_output, 0)?;
            Ok(GradientOpsMeta {
                ops: Vec::new(),
                g_input: vec![Some(dy.to_string()); op.input_names().len()],
            })
        }
        OpKind::ConstantFill
        | OpKind::XavierFill
        | OpKind::FCGradient
        | OpKind::SigmoidGradient
        | OpKind::SoftmaxWithLossGradient => Err(NetError::NoGradient {
            op_type: op.op_type().to_string(),
        }),
    }
}
