//! Operator and net definitions, and runnable nets.
//!
//! Definitions are plain data: a [`NetDef`] is an ordered list of
//! [`OperatorDef`]s bound together by blob names. A [`Net`] is what a
//! [`Workspace`](crate::workspace::Workspace) creates from a definition once
//! every operator type and shape checks out.
//!
//! # Example
//!
//! ```
//! use opgraph::graph::{Argument, NetDef};
//!
//! let mut init = NetDef::new("my first net_init");
//! init.add_operator("XavierFill", Vec::<String>::new(), ["fc_w"], vec![Argument::ints("shape", [10, 100])])
//!     .unwrap();
//! init.add_operator("ConstantFill", Vec::<String>::new(), ["fc_b"], vec![Argument::ints("shape", [10])])
//!     .unwrap();
//! assert_eq!(init.op_types(), vec!["XavierFill", "ConstantFill"]);
//! ```

#[allow(clippy::module_inception)]
mod net;
mod net_def;
mod operator_def;

pub use net::Net;
pub use net_def::NetDef;
pub use operator_def::{ArgValue, Argument, OperatorDef};
