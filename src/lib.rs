//! # opgraph
//!
//! A small operator-graph framework and the intro tutorial that drives it.
//!
//! Nets are plain, serializable lists of operator definitions bound together
//! by blob names. A [`Workspace`] owns every blob and runs nets against them.
//! Backward passes are synthesized from a gradient registry rather than taped,
//! so a training net is just a longer net.
//!
//! Kernels do their math with `burn` tensors on any [`burn::tensor::backend::Backend`].
//!
//! ## Example
//!
//! ```
//! use opgraph::prelude::*;
//!
//! let device = Default::default();
//! let config = DriverConfig::new()
//!     .iterations(2)
//!     .runs_per_iteration(2)
//!     .seed(42);
//!
//! let mut driver = Driver::<CpuBackend>::new(config, device).unwrap();
//! let mut out = Vec::new();
//! let report = driver.run_with_output(&mut out).unwrap();
//!
//! assert_eq!(report.softmax_shape, vec![16, 10]);
//! assert!(report.final_loss.is_finite());
//! ```

pub mod driver;
pub mod errors;
pub mod gradient;
pub mod graph;
pub mod operators;
pub mod workspace;

// Re-exports for convenience
pub use driver::{Driver, DriverConfig, DriverReport};
pub use errors::{NetError, Result};
pub use graph::{Net, NetDef, OperatorDef};
pub use workspace::{Blob, Tensor, Workspace};

/// CPU backend used by default.
pub type CpuBackend = burn::backend::NdArray;

/// GPU backend selectable at startup.
pub type GpuBackend = burn::backend::Wgpu;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::driver::{Driver, DriverConfig, DriverReport, DriverState};
    pub use crate::errors::{NetError, Result};
    pub use crate::gradient::{GradientMap, add_gradient_operators};
    pub use crate::graph::{Argument, Net, NetDef, OperatorDef};
    pub use crate::operators::OpKind;
    pub use crate::workspace::{Blob, DataType, Tensor, Workspace};
    pub use crate::{CpuBackend, GpuBackend};
}
