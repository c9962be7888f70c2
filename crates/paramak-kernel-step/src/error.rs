//! Error types for STEP file operations.

use thiserror::Error;

/// Errors that can occur while writing STEP files.
#[derive(Error, Debug)]
pub enum StepError {
    /// I/O error writing a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid geometry (e.g., non-finite coordinates).
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Invalid topology (e.g., a body without triangles, a wire with too few points).
    #[error("Invalid topology in '{body}': {message}")]
    InvalidTopology {
        /// Name of the offending body.
        body: String,
        /// Error message.
        message: String,
    },

    /// Nothing was added to the writer.
    #[error("No bodies to write")]
    Empty,
}

impl StepError {
    /// Create an invalid topology error.
    pub fn invalid_topology(body: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidTopology {
            body: body.into(),
            message: message.into(),
        }
    }
}
