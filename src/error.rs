//! Error types for the preview layer

use thiserror::Error;

use crate::config::ConfigError;
use crate::engine::EngineError;
use crate::reload::ReloadError;

/// Shown in place of the page when startup fails
pub const FATAL_MESSAGE: &str = "An error occurred while loading the file. Please open it again.";

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, PreviewError>;

#[derive(Error, Debug)]
pub enum PreviewError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Startup failed: {0}")]
    Startup(#[from] EngineError),

    #[error(transparent)]
    Reload(#[from] ReloadError),

    #[error("Script error: {0}")]
    Uncaught(String),
}

/// How far an error is allowed to reach
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The page is unusable; replace it with [`FATAL_MESSAGE`]
    Fatal,
    /// Log it; the currently displayed document stays
    Transient,
}

impl PreviewError {
    pub fn severity(&self) -> Severity {
        match self {
            PreviewError::Config(_) | PreviewError::Startup(_) | PreviewError::Uncaught(_) => {
                Severity::Fatal
            }
            PreviewError::Reload(_) => Severity::Transient,
        }
    }
}
