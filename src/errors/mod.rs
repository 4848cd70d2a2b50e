//! Error types shared by the workspace, graph, and operator modules.

mod net_error;

pub use net_error::{NetError, Result};
