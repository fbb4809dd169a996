//! Projection error types.

/// A channel could not build its payload from the current state.
#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    /// The payload could not be converted to JSON.
    #[error("failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A value the channel depends on is missing or unusable.
    #[error("{0}")]
    Failed(String),
}

impl ProjectionError {
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Errors returned by [`Projector`](crate::Projector) itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProjectorError {
    /// A channel with this name is already registered.
    #[error("channel '{0}' is already registered")]
    DuplicateChannel(String),

    /// No channel with this name is registered.
    #[error("unknown channel '{0}'")]
    UnknownChannel(String),
}

/// A fault contained at a channel boundary; the fallback payload was used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelFault {
    #[error("channel '{channel}' failed: {reason}")]
    Failed { channel: String, reason: String },

    #[error("channel '{channel}' panicked: {message}")]
    Panicked { channel: String, message: String },
}

impl ChannelFault {
    /// Returns the name of the channel that faulted.
    #[must_use]
    pub fn channel(&self) -> &str {
        match self {
            Self::Failed { channel, .. } | Self::Panicked { channel, .. } => channel,
        }
    }
}
