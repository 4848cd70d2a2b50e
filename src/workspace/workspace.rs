//! The workspace: exclusive owner of all blobs of a run.

use std::collections::HashMap;

use burn::tensor::backend::Backend;
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::{Blob, Tensor};
use crate::errors::{NetError, Result};
use crate::graph::{Net, NetDef};

/// A mapping from blob name to blob, plus the random source used by fill
/// operators.
#[derive(Debug)]
pub struct Workspace {
    blobs: HashMap<String, Blob>,
    rng: StdRng,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    /// Creates an empty workspace seeded from the operating system.
    pub fn new() -> Self {
        Self {
            blobs: HashMap::new(),
            rng: StdRng::from_os_rng(),
        }
    }

    /// Creates an empty workspace whose random fills are reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            blobs: HashMap::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Returns the blob with the given name, creating an empty one if needed.
    pub fn create_blob(&mut self, name: &str) -> &mut Blob {
        self.blobs
            .entry(name.to_string())
            .or_insert_with(|| Blob::new(name))
    }

    /// Returns true if a blob with the given name exists.
    pub fn has_blob(&self, name: &str) -> bool {
        self.blobs.contains_key(name)
    }

    /// Looks up a blob by name.
    pub fn get_blob(&self, name: &str) -> Result<&Blob> {
        self.blobs.get(name).ok_or_else(|| NetError::MissingBlob {
            name: name.to_string(),
        })
    }

    /// Looks up a blob by name for mutation.
    pub fn get_blob_mut(&mut self, name: &str) -> Result<&mut Blob> {
        self.blobs.get_mut(name).ok_or_else(|| NetError::MissingBlob {
            name: name.to_string(),
        })
    }

    /// Removes a blob, returning true if it existed.
    pub fn remove_blob(&mut self, name: &str) -> bool {
        self.blobs.remove(name).is_some()
    }

    /// Returns all blob names in sorted order.
    pub fn blob_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.blobs.keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the number of blobs.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Returns true if the workspace holds no blobs.
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Stores `tensor` under `name`, replacing whatever the blob held.
    pub fn feed_blob(&mut self, name: &str, tensor: Tensor) {
        self.create_blob(name).reset(tensor);
    }

    /// Returns the tensor stored under `name`.
    pub fn fetch_blob(&self, name: &str) -> Result<&Tensor> {
        self.get_blob(name)?.get::<Tensor>()
    }

    /// Returns the tensor stored under an existing blob for in-place updates.
    pub fn tensor_mut(&mut self, name: &str) -> Result<&mut Tensor> {
        Ok(self.get_blob_mut(name)?.get_mutable::<Tensor>())
    }

    /// Returns the tensor an operator writes to, creating the blob if needed.
    pub(crate) fn output_tensor(&mut self, name: &str) -> &mut Tensor {
        self.create_blob(name).get_mutable::<Tensor>()
    }

    pub(crate) fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Validates `def` against this workspace and instantiates a runnable net.
    pub fn create_net<B: Backend>(&self, def: &NetDef, device: &B::Device) -> Result<Net<B>> {
        Net::new(def, self, device)
    }

    /// Creates a net from `def` and runs it once.
    pub fn run_net_once<B: Backend>(&mut self, def: &NetDef, device: &B::Device) -> Result<()> {
        let net = self.create_net::<B>(def, device)?;
        net.run(self)
    }
}
