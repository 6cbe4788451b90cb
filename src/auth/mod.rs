//! Authorization session state machine.
//!
//! A session moves through three states, all carried by [`Session`] fields:
//! no token yet, waiting for the provider callback (a one-shot `state` value
//! is pending), and authenticated. [`AuthGate`] drives the transitions; the
//! edge that hosts it only has to turn [`AuthDecision`] values into redirects
//! and [`crate::error::ErrorKind`] values into status codes.

mod provider;

pub use provider::{Authenticator, DEFAULT_ACCOUNTS_URL, HttpAuthenticator};

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::remote::PlayerClient;

/// Per-user authorization state. Serde round-trippable so an outer web layer
/// can seal it into a cookie; the CLI keeps it as a JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    /// Provider grant, present once the user completed authorization.
    pub access_token: Option<AccessToken>,

    /// Cached identity of the token's owner.
    pub user_id: Option<String>,

    /// One-shot anti-forgery value for the in-flight authorization, if any.
    pub pending_state: Option<String>,

    /// Where the user wanted to go before being sent to the consent page.
    pub requested_path: Option<String>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// Read a session file, treating a missing file as a fresh session.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("failed to read session file: {}", path.display()))
                    .into());
            }
        };
        let session = serde_json::from_str(&raw)
            .with_context(|| format!("corrupt session file: {}", path.display()))?;
        Ok(session)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let raw = serde_json::to_string_pretty(self).context("failed to serialize session")?;
        fs::write(path, raw)
            .with_context(|| format!("failed to write session file: {}", path.display()))?;
        Ok(())
    }
}

/// Token-endpoint response, treated as opaque beyond bearer use.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub scope: String,
    pub expires_in: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Query parameters the provider appends when redirecting back.
#[derive(Debug, Clone, Default)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: String,
    /// Set when the user denied consent or the provider aborted.
    pub error: Option<String>,
}

/// What the edge should do with an incoming request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthDecision {
    /// A token is present; let the request through.
    Authenticated,
    /// The request is the provider callback; feed it to `handle_callback`.
    Callback,
    /// Send the user to the consent page (307 at an HTTP edge).
    Redirect { location: String },
}

/// Gatekeeper for the authorization-code flow.
pub struct AuthGate {
    authenticator: Arc<dyn Authenticator>,
    callback_path: String,
}

impl AuthGate {
    pub fn new(authenticator: Arc<dyn Authenticator>, callback_path: impl Into<String>) -> Self {
        Self {
            authenticator,
            callback_path: callback_path.into(),
        }
    }

    /// Classify a request for `requested_path`.
    ///
    /// When an authorization is already pending its state value is reused, so
    /// parallel tabs or a retried request converge on one consent round trip
    /// instead of invalidating each other. The requested path is recorded
    /// fresh each time; the latest one wins.
    pub fn evaluate(&self, session: &mut Session, requested_path: &str) -> AuthDecision {
        if session.is_authenticated() {
            return AuthDecision::Authenticated;
        }
        if requested_path == self.callback_path {
            return AuthDecision::Callback;
        }

        let state = match &session.pending_state {
            Some(state) => state.clone(),
            None => {
                let state = random_state();
                session.pending_state = Some(state.clone());
                state
            }
        };
        session.requested_path = Some(requested_path.to_string());

        AuthDecision::Redirect {
            location: self.authenticator.authorize_url(&state),
        }
    }

    /// Complete the flow with the provider's callback parameters, returning
    /// the path the user originally asked for.
    ///
    /// The state check happens before anything is exchanged. A mismatch
    /// leaves the pending authorization untouched, so the legitimate
    /// callback can still arrive; only a successful exchange consumes the
    /// one-shot fields.
    pub async fn handle_callback(
        &self,
        session: &mut Session,
        params: &CallbackParams,
    ) -> Result<String> {
        let Some(pending) = session.pending_state.clone() else {
            return Err(Error::NoPendingAuthorization);
        };

        if params.state != pending {
            warn!("authorization callback carried an unexpected state value");
            return Err(Error::StateMismatch);
        }

        if let Some(reason) = &params.error {
            return Err(Error::TokenExchange {
                reason: format!("authorization denied: {reason}"),
            });
        }
        let Some(code) = &params.code else {
            return Err(Error::TokenExchange {
                reason: "callback carried no authorization code".to_string(),
            });
        };

        let token = self.authenticator.exchange_code(code).await?;

        session.access_token = Some(token);
        session.pending_state = None;
        let target = session
            .requested_path
            .take()
            .unwrap_or_else(|| "/".to_string());

        info!("authorization completed");
        Ok(target)
    }

    /// Return the user id the session belongs to, fetching and caching it on
    /// first use. When the provider rejects the token the session falls back
    /// to the unauthenticated state instead of failing hard.
    pub async fn ensure_identity(
        &self,
        session: &mut Session,
        client: &dyn PlayerClient,
    ) -> Result<String> {
        if let Some(id) = &session.user_id {
            return Ok(id.clone());
        }

        match client.current_user().await {
            Ok(profile) => {
                info!(user = %profile.id, "attached user identity to session");
                session.user_id = Some(profile.id.clone());
                Ok(profile.id)
            }
            Err(err) => {
                warn!(error = %err, "could not confirm user identity, dropping the stored token");
                session.access_token = None;
                Err(Error::Reauthenticate)
            }
        }
    }
}

/// 32 random bytes, hex encoded.
fn random_state() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_state_is_long_and_unique() {
        let a = random_state();
        let b = random_state();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }

    #[test]
    fn session_round_trips_through_its_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let mut session = Session::default();
        session.access_token = Some(AccessToken {
            access_token: "tok".to_string(),
            token_type: "Bearer".to_string(),
            scope: String::new(),
            expires_in: 3600,
            refresh_token: None,
        });
        session.user_id = Some("someone".to_string());
        session.save(&path).unwrap();

        let loaded = Session::load(&path).unwrap();
        assert_eq!(loaded, session);
    }

    #[test]
    fn missing_session_file_means_a_fresh_session() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(session, Session::default());
    }
}
