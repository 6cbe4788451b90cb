use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// All errors the core can surface to an embedding edge (CLI, web handler).
#[derive(Debug, Error)]
pub enum Error {
    #[error("could not read current playback: nothing seems to be playing")]
    NoCurrentPlayback,

    #[error(
        "the current context cannot be suspended; only positions in albums and playlists can be stored"
    )]
    ContextNotSuspendable,

    #[error("could not find track in its playback context")]
    TrackNotFound,

    #[error("no (active) device available for playback")]
    NoDeviceAvailable,

    #[error("slot {slot} is not in the range of existing slots ({len} stored)")]
    SlotOutOfRange { slot: usize, len: usize },

    #[error("no authorization pending for this session")]
    NoPendingAuthorization,

    #[error("authorization state mismatch")]
    StateMismatch,

    #[error("token exchange failed: {reason}")]
    TokenExchange { reason: String },

    #[error("could not confirm user identity; a fresh sign-in is required")]
    Reauthenticate,

    #[error("no data stored for this user")]
    UserNotFound,

    #[error("remote call '{operation}' failed: {source}")]
    Api {
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("storage error: {0}")]
    Storage(#[source] anyhow::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Coarse classification so an edge can translate errors into a transport
/// (e.g. 4xx vs 5xx) without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller must correct the request and resubmit.
    UserInput,
    /// The remote service rejected or failed the operation.
    Upstream,
    /// The slot store failed below the contract level.
    Storage,
    /// Everything else.
    Internal,
}

impl Error {
    pub fn api(operation: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self::Api {
            operation,
            source: source.into(),
        }
    }

    pub fn storage(source: impl Into<anyhow::Error>) -> Self {
        Self::Storage(source.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SlotOutOfRange { .. }
            | Self::NoPendingAuthorization
            | Self::StateMismatch
            | Self::Reauthenticate
            | Self::UserNotFound => ErrorKind::UserInput,
            Self::NoCurrentPlayback
            | Self::ContextNotSuspendable
            | Self::TrackNotFound
            | Self::NoDeviceAvailable
            | Self::TokenExchange { .. }
            | Self::Api { .. } => ErrorKind::Upstream,
            Self::Storage(_) => ErrorKind::Storage,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}
