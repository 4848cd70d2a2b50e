//! Gradient synthesis for a forward net.

use std::collections::BTreeMap;

use super::registry::{GradientOpsMeta, gradient_for_op, gradient_name};
use crate::errors::Result;
use crate::graph::{Argument, NetDef, OperatorDef};

/// Forward blob name to the blob holding its gradient.
pub type GradientMap = BTreeMap<String, String>;

/// One contribution to a blob's gradient.
#[derive(Debug)]
struct Partial {
    name: String,
    /// `(operator, output)` in the backward sequence that writes `name`, or
    /// `None` when the partial aliases a blob written elsewhere.
    producer: Option<(usize, usize)>,
}

/// Backward operators under construction plus partial gradients that have
/// not been combined yet.
#[derive(Debug, Default)]
struct BackwardBuilder {
    ops: Vec<OperatorDef>,
    pending: BTreeMap<String, Vec<Partial>>,
}

impl BackwardBuilder {
    fn append(&mut self, meta: GradientOpsMeta, forward_inputs: &[String]) {
        let base = self.ops.len();
        self.ops
            .extend(meta.ops.into_iter().map(|op| op.gradient(true)));

        // Each partial claims its own output slot, so an input repeated on
        // one operator gets one partial per slot.
        let mut claimed = Vec::new();
        for (input, g_input) in forward_inputs.iter().zip(meta.g_input) {
            let Some(name) = g_input else {
                continue;
            };
            let producer = self.ops[base..].iter().enumerate().find_map(|(i, op)| {
                op.output_names()
                    .iter()
                    .enumerate()
                    .find(|&(output, written)| {
                        *written == name && !claimed.contains(&(base + i, output))
                    })
                    .map(|(output, _)| (base + i, output))
            });
            claimed.extend(producer);
            self.pending
                .entry(input.clone())
                .or_default()
                .push(Partial { name, producer });
        }
    }

    /// Appends the `ConstantFill` seeding `<loss>_grad` with 1.0 and records
    /// it as the first partial of `loss`.
    fn seed(&mut self, loss: &str) {
        let name = gradient_name(loss);
        self.ops.push(
            OperatorDef::new("ConstantFill")
                .input(loss)
                .output(name.clone())
                .arg(Argument::float("value", 1.0))
                .gradient(true),
        );
        let producer = Some((self.ops.len() - 1, 0));
        self.pending
            .entry(loss.to_string())
            .or_default()
            .push(Partial { name, producer });
    }

    /// Combines the partial gradients of `blob` and records the result.
    ///
    /// Must run before any backward operator reads the gradient of `blob`,
    /// i.e. before the producer of `blob` is differentiated.
    fn flush(&mut self, blob: &str, grads: &mut GradientMap) {
        let Some(mut partials) = self.pending.remove(blob) else {
            return;
        };
        if partials.len() == 1 {
            grads.insert(blob.to_string(), partials.remove(0).name);
            return;
        }

        let target = gradient_name(blob);
        let mut inputs = Vec::with_capacity(partials.len());
        for (i, partial) in partials.into_iter().enumerate() {
            match partial.producer {
                Some((op, output)) => {
                    let renamed = format!("{target}_autosplit_{i}");
                    self.ops[op].set_output(output, renamed.clone());
                    inputs.push(renamed);
                }
                None => inputs.push(partial.name),
            }
        }
        log::debug!("Accumulating {} partial gradients into {target}", inputs.len());
        self.ops.push(
            OperatorDef::new("Sum")
                .inputs(inputs)
                .output(target.clone())
                .gradient(true),
        );
        grads.insert(blob.to_string(), target);
    }

    fn flush_all(&mut self, grads: &mut GradientMap) {
        let blobs: Vec<String> = self.pending.keys().cloned().collect();
        for blob in blobs {
            self.flush(&blob, grads);
        }
    }
}

/// Appends the backward pass of `net` with respect to `losses`.
///
/// The operators already in `net` are the forward pass. For each loss a
/// `ConstantFill` seed producing `<loss>_grad = 1.0` is appended; then the
/// forward operators are visited by descending index and every gradient
/// operator the registry returns is appended, flagged as a gradient
/// operator. Forward operators none of whose outputs receive a gradient are
/// skipped. A blob consumed by several operators gets one `Sum` operator
/// combining its partial gradients.
///
/// Returns the gradient blob of every blob that received one.
pub fn add_gradient_operators(net: &mut NetDef, losses: &[&str]) -> Result<GradientMap> {
    let forward_len = net.len();
    let mut grads = GradientMap::new();

    let mut backward = BackwardBuilder::default();
    for loss in losses {
        backward.seed(loss);
    }

    for index in (0..forward_len).rev() {
        let forward = &net.ops()[index];
        for output in forward.output_names() {
            backward.flush(output, &mut grads);
        }

        let g_output: Vec<Option<String>> = forward
            .output_names()
            .iter()
            .map(|output| grads.get(output).cloned())
            .collect();
        if g_output.iter().all(Option::is_none) {
            log::debug!(
                "No gradient reaches {} at index {index}, skipping",
                forward.op_type()
            );
            continue;
        }

        let meta = gradient_for_op(forward, &g_output)?;
        backward.append(meta, forward.input_names());
    }
    backward.flush_all(&mut grads);

    log::debug!(
        "Appending {} gradient operators to '{}'",
        backward.ops.len(),
        net.name()
    );
    for op in backward.ops {
        net.add_op(op);
    }
    Ok(grads)
}
