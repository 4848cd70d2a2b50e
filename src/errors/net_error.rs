//! Net-related error types.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, NetError>;

/// Errors that can occur while building or running nets.
///
/// Every variant is fatal for the driver: nothing in the crate retries.
#[derive(Debug, Error)]
pub enum NetError {
    #[error("Unknown operator type: {op_type}")]
    UnknownOperator { op_type: String },

    #[error("Operator {op_type} has no registered gradient")]
    NoGradient { op_type: String },

    #[error("Gradient of output {output} of operator {op_type} is not available")]
    MissingGradient { op_type: String, output: String },

    #[error("Operator {op_type} expects {expected} {kind}, got {actual}")]
    InvalidArity {
        op_type: String,
        kind: &'static str,
        expected: String,
        actual: usize,
    },

    #[error("Blob not found: {name}")]
    MissingBlob { name: String },

    #[error("Blob {name} holds {actual}, requested {requested}")]
    BlobTypeMismatch {
        name: String,
        requested: &'static str,
        actual: &'static str,
    },

    #[error("Tensor data not initialized")]
    UninitializedTensor,

    #[error("Tensor holds {actual} elements, requested {requested}")]
    DataTypeMismatch {
        requested: &'static str,
        actual: &'static str,
    },

    #[error("Shape mismatch in {context}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        context: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Invalid argument {name} for operator {op_type}: {message}")]
    InvalidArgument {
        op_type: String,
        name: String,
        message: String,
    },

    #[error("Label {label} out of range for {classes} classes")]
    InvalidLabel { label: i32, classes: usize },

    #[error("Tensor conversion error: {message}")]
    TensorConversion { message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl NetError {
    pub(crate) fn shape_mismatch(
        context: impl Into<String>,
        expected: &[usize],
        actual: &[usize],
    ) -> Self {
        Self::ShapeMismatch {
            context: context.into(),
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    pub(crate) fn invalid_argument(
        op_type: &str,
        name: &str,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidArgument {
            op_type: op_type.to_string(),
            name: name.to_string(),
            message: message.into(),
        }
    }
}
