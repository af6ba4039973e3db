//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup and the run so that
//! `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: gabm_core::ConfigError,
    },

    /// Building the scenario failed.
    #[error("scenario error: {source}")]
    Scenario {
        /// The underlying scenario error.
        #[from]
        source: gabm_core::ScenarioError,
    },

    /// The round runner failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: gabm_core::RunnerError,
    },

    /// The history could not be serialized.
    #[error("failed to serialize history: {source}")]
    Serialize {
        /// The underlying serde error.
        #[from]
        source: serde_json::Error,
    },

    /// The history could not be written.
    #[error("failed to write history to {path}: {message}")]
    Output {
        /// Destination path.
        path: String,
        /// Description of the I/O failure.
        message: String,
    },
}
