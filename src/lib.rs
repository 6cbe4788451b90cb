pub mod auth;
pub mod config;
pub mod error;
pub mod player;
pub mod remote;
pub mod service;
pub mod store;

pub use auth::{
    AccessToken, AuthDecision, AuthGate, Authenticator, CallbackParams, HttpAuthenticator, Session,
};
pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use player::{SnapshotEngine, TrackLocator};
pub use remote::{Device, HttpPlayerClient, PlayerClient, RetryPolicy, RetryingClient};
pub use service::PlayheadService;
pub use store::{ContextType, MemoryStore, PlaybackSnapshot, SlotStore, SqliteStore};
