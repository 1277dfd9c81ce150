/// Error taxonomy shared by keyword parsing, sessions and streams.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SpotterError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpotterError {
    /// Bad shape, type or size from the caller; the engine was not touched.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Porcupine out of memory")]
    OutOfMemory,

    #[error("Porcupine IO error")]
    Io,

    /// The engine rejected an argument that passed local validation.
    #[error("Porcupine invalid argument")]
    InvalidArgument,

    #[error("Porcupine error (status {0})")]
    Engine(i32),

    #[error("Session has been disposed")]
    Disposed,
}

impl SpotterError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        SpotterError::Validation(msg.into())
    }
}
