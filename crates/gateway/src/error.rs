use thiserror::Error;

/// Errors that can occur while issuing, redeeming or sweeping tokens.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// An error occurred in the state store.
    #[error("state error: {0}")]
    State(#[from] dropgate_state::StateError),

    /// A token record could not be encoded for storage.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The gateway was misconfigured (e.g. missing required components).
    #[error("configuration error: {0}")]
    Configuration(String),
}
