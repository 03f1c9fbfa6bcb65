use thiserror::Error;

/// Outcome of a voice connect attempt or an established session.
///
/// `Clone` because the same value is observed by every waiter on the
/// pending-result signal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoiceError {
    /// No confirmation arrived within the connect deadline.
    #[error("voice connect timed out")]
    ConnectTimeout,
    /// The attempt was superseded by a newer connect or an explicit
    /// disconnect. Not a failure.
    #[error("voice connect cancelled")]
    Cancelled,
    /// The outbound voice-state update could not be sent.
    #[error("gateway send failed: {0}")]
    Gateway(String),
    /// The media-layer handshake was rejected or broke down.
    #[error("media handshake failed: {0}")]
    Handshake(String),
    /// An established or connecting session lost its transport.
    #[error("voice session disconnected: {0}")]
    Disconnected(String),
    /// Session-ready parameters arrived but the caller's own voice state is
    /// not in the cache, so there is no session id to hand the media layer.
    #[error("own voice state missing from cache")]
    MissingVoiceState,
}

/// Failure to hand an outbound request to the gateway connection.
#[derive(Debug, Clone, Error)]
#[error("gateway send failed: {0}")]
pub struct GatewayError(pub String);

impl From<GatewayError> for VoiceError {
    fn from(err: GatewayError) -> Self {
        VoiceError::Gateway(err.0)
    }
}

#[derive(Debug, Error)]
pub enum RestError {
    #[error("not found")]
    NotFound,
    #[error("forbidden")]
    Forbidden,
    #[error("rate limited")]
    RateLimited,
    #[error("request failed: {0}")]
    Http(String),
}
