//! Error types for the Roon adapter

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to a Roon core
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No core answered discovery within the window
    #[error("no Roon core discovered on the local network")]
    NoCoreFound,

    /// Discovery could not be started at all
    #[error("failed to start Roon discovery")]
    Discovery,

    /// The pairing credential is missing or blank
    #[error("missing Roon pairing credential, run the pairing flow first")]
    MissingCredentials,

    /// Operation requires a live core session
    #[error("not connected to a Roon core")]
    NotConnected,

    /// The core stopped answering mid-registration
    #[error("registration aborted: {0}")]
    Registration(String),

    /// Cover art could not be produced for this request
    #[error("cover art unavailable: {0}")]
    CoverUnavailable(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings store error
    #[error("settings error: {0}")]
    Config(#[from] anyhow::Error),
}
