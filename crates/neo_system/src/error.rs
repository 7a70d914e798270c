//! Scheduler and configuration error types.

use std::path::PathBuf;

use crate::registry::SystemId;

/// Errors raised by the system registry.
#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    /// A system's `init` failed under [`ErrorPolicy::Halt`](crate::ErrorPolicy::Halt).
    #[error("system '{system}' failed to initialise: {source}")]
    InitFailed {
        /// The failing system's name.
        system: &'static str,
        /// What the system reported.
        #[source]
        source: anyhow::Error,
    },

    /// A system's `update` failed under [`ErrorPolicy::Halt`](crate::ErrorPolicy::Halt).
    #[error("system '{system}' failed on frame {frame}: {source}")]
    UpdateFailed {
        /// The failing system's name.
        system: &'static str,
        /// The frame that was aborted.
        frame: u64,
        /// What the system reported.
        #[source]
        source: anyhow::Error,
    },

    /// No system is registered under this id.
    #[error("no system registered as {0:?}")]
    UnknownSystem(SystemId),

    /// The system has been shut down and can't change state any more.
    #[error("system '{0}' has been destroyed")]
    Destroyed(&'static str),
}

/// Errors raised while loading an [`EngineConfig`](crate::EngineConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        /// The file that was requested.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON for an engine config.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}
