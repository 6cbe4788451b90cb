use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::config::ProviderConfig;
use crate::error::{Error, Result};

use super::AccessToken;

pub const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.spotify.com";

/// Scopes needed to read and steer playback. Nothing else is requested.
const SCOPES: &str = "user-read-currently-playing user-read-playback-state user-modify-playback-state";

const EXCHANGE_TIMEOUT: Duration = Duration::from_secs(30);

/// The provider side of the authorization-code flow: building the consent
/// URL and swapping the returned code for an access token.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Consent-page URL carrying the given one-shot `state`.
    fn authorize_url(&self, state: &str) -> String;

    /// Exchange an authorization code for an access token. Any failure,
    /// transport or provider-side, surfaces as [`Error::TokenExchange`].
    async fn exchange_code(&self, code: &str) -> Result<AccessToken>;
}

pub struct HttpAuthenticator {
    client: Client,
    accounts_url: Url,
    client_id: String,
    client_secret: String,
    redirect_url: String,
}

impl HttpAuthenticator {
    pub fn new(provider: &ProviderConfig) -> Result<Self> {
        Self::with_accounts_url(DEFAULT_ACCOUNTS_URL, provider)
    }

    /// Point the authenticator at a different accounts host, mainly for tests.
    pub fn with_accounts_url(accounts_url: &str, provider: &ProviderConfig) -> Result<Self> {
        let accounts_url = Url::parse(accounts_url)
            .map_err(|e| anyhow::anyhow!("invalid accounts url '{accounts_url}': {e}"))?;
        Ok(Self {
            client: Client::new(),
            accounts_url,
            client_id: provider.client_id.clone(),
            client_secret: provider.client_secret.clone(),
            redirect_url: provider.redirect_url.clone(),
        })
    }
}

#[async_trait]
impl Authenticator for HttpAuthenticator {
    fn authorize_url(&self, state: &str) -> String {
        let mut url = self.accounts_url.clone();
        url.set_path("/authorize");
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("scope", SCOPES)
            .append_pair("redirect_uri", &self.redirect_url)
            .append_pair("state", state);
        url.to_string()
    }

    async fn exchange_code(&self, code: &str) -> Result<AccessToken> {
        let mut url = self.accounts_url.clone();
        url.set_path("/api/token");

        let response = self
            .client
            .post(url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_url.as_str()),
            ])
            .timeout(EXCHANGE_TIMEOUT)
            .send()
            .await
            .map_err(|e| Error::TokenExchange {
                reason: format!("token endpoint unreachable: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::TokenExchange {
                reason: format!("token endpoint returned {status}: {body}"),
            });
        }

        let dto: TokenDto = response.json().await.map_err(|e| Error::TokenExchange {
            reason: format!("invalid token response: {e}"),
        })?;

        Ok(AccessToken {
            access_token: dto.access_token,
            token_type: dto.token_type,
            scope: dto.scope,
            expires_in: dto.expires_in,
            refresh_token: dto.refresh_token,
        })
    }
}

#[derive(Deserialize)]
struct TokenDto {
    access_token: String,
    #[serde(default)]
    token_type: String,
    #[serde(default)]
    scope: String,
    #[serde(default)]
    expires_in: u64,
    refresh_token: Option<String>,
}
