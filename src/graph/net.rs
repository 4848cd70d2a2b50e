//! Runnable nets.

use std::collections::HashMap;

use burn::tensor::backend::Backend;

use super::NetDef;
use crate::errors::{NetError, Result};
use crate::operators::OpKind;
use crate::workspace::Workspace;

/// A validated net bound to a device, ready to run against a workspace.
///
/// Creation resolves every operator type and walks the net once with the
/// workspace's current blob shapes, so configuration errors surface before
/// the first run.
pub struct Net<B: Backend> {
    def: NetDef,
    kinds: Vec<OpKind>,
    device: B::Device,
}

impl<B: Backend> Net<B> {
    /// Validates `def` against `workspace` and builds the net.
    pub fn new(def: &NetDef, workspace: &Workspace, device: &B::Device) -> Result<Self> {
        let mut shapes: HashMap<&str, Vec<usize>> = HashMap::new();
        let mut kinds = Vec::with_capacity(def.len());

        for op in def.ops() {
            let kind = OpKind::from_type(op.op_type())?;
            kind.check_arity(op)?;

            let input_shapes = op
                .input_names()
                .iter()
                .map(|name| match shapes.get(name.as_str()) {
                    Some(shape) => Ok(shape.clone()),
                    None => workspace
                        .fetch_blob(name)
                        .map(|tensor| tensor.shape().to_vec()),
                })
                .collect::<Result<Vec<_>>>()?;

            let output_shapes = kind.infer_shapes(op, &input_shapes)?;
            for (name, shape) in op.output_names().iter().zip(output_shapes) {
                shapes.insert(name.as_str(), shape);
            }
            kinds.push(kind);
        }

        log::debug!(
            "Created net '{}' with {} operators",
            def.name(),
            kinds.len()
        );

        Ok(Self {
            def: def.clone(),
            kinds,
            device: device.clone(),
        })
    }

    pub fn name(&self) -> &str {
        self.def.name()
    }

    /// Returns the definition this net was created from.
    pub fn def(&self) -> &NetDef {
        &self.def
    }

    /// Returns the resolved operator kinds in execution order.
    pub fn kinds(&self) -> &[OpKind] {
        &self.kinds
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// Executes every operator in declaration order.
    pub fn run(&self, workspace: &mut Workspace) -> Result<()> {
        for (kind, op) in self.kinds.iter().zip(self.def.ops()) {
            log::trace!("Running {} -> {:?}", op.op_type(), op.output_names());
            kind.run::<B>(op, workspace, &self.device)
                .map_err(|err| annotate(err, op.op_type()))?;
        }
        Ok(())
    }
}

fn annotate(err: NetError, op_type: &str) -> NetError {
    if let NetError::ShapeMismatch {
        context,
        expected,
        actual,
    } = err
    {
        return NetError::ShapeMismatch {
            context: format!("{op_type}: {context}"),
            expected,
            actual,
        };
    }
    err
}
