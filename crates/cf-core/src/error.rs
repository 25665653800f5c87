//! Unified error type for clipfit.
//!
//! Every crate funnels its failures into [`Error`]. The variants follow the
//! batch error taxonomy: validation failures are rejected before any
//! per-candidate work, while probe, transcode and staging failures become the
//! failed candidate's outcome. [`Error::kind`] gives a stable code that is
//! serialized alongside the human-readable message.

/// Unified error type covering all failure modes in clipfit.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Request data failed validation (extension, size, batch bounds).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Media metadata could not be read.
    #[error("Probe error: {0}")]
    Probe(String),

    /// The external encoder failed, hung, or produced an unusable output.
    #[error("Transcode error: {0}")]
    Transcode(String),

    /// Temporary storage could not be acquired or written.
    #[error("Staging error: {0}")]
    Staging(String),

    /// An external tool (ffmpeg, ffprobe) could not be run.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// Configuration values are malformed.
    #[error("Config error: {0}")]
    Config(String),

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable snake_case code for this error, used in serialized outcomes.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation_error",
            Error::Probe(_) => "probe_error",
            Error::Transcode(_) => "transcode_error",
            Error::Staging(_) => "staging_error",
            Error::Tool { .. } => "tool_error",
            Error::Config(_) => "config_error",
            Error::Io { .. } => "io_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Re-label a tool failure as a probe failure, keeping other variants.
    pub fn into_probe(self) -> Self {
        match self {
            Error::Tool { tool, message } => Error::Probe(format!("{tool}: {message}")),
            Error::Io { source } => Error::Probe(source.to_string()),
            other => other,
        }
    }

    /// Re-label a tool failure as a transcode failure, keeping other variants.
    pub fn into_transcode(self) -> Self {
        match self {
            Error::Tool { tool, message } => Error::Transcode(format!("{tool}: {message}")),
            Error::Io { source } => Error::Transcode(source.to_string()),
            other => other,
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
