//! The intro tutorial driver.
//!
//! This module provides:
//! - Driver configuration
//! - The init and training nets of the tutorial
//! - The run itself: a single init pass followed by a fixed training budget

mod config;
mod nets;
mod print;
mod runner;

pub use config::DriverConfig;
pub use nets::{NET_NAME, build_init_net, build_train_net};
pub use print::format_tensor;
pub use runner::{Driver, DriverReport, DriverState};
