//! Workspaces, blobs, and host tensors.
//!
//! A [`Workspace`] owns every [`Blob`] of a run. Operators bind to each other
//! only through blob names, and every operation that touches blobs receives
//! the workspace explicitly.
//!
//! # Example
//!
//! ```
//! use opgraph::workspace::{Tensor, Workspace};
//!
//! let mut workspace = Workspace::with_seed(7);
//! let x = Tensor::from_vec(&[2, 2], vec![1.0f32, 2.0, 3.0, 4.0]).unwrap();
//! workspace.feed_blob("my_x", x.clone());
//!
//! assert_eq!(workspace.fetch_blob("my_x").unwrap(), &x);
//! ```

mod blob;
mod tensor;
#[allow(clippy::module_inception)]
mod workspace;

pub use blob::Blob;
pub use tensor::{DataType, Element, Tensor};
pub use workspace::Workspace;
