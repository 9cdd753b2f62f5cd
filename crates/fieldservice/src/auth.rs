use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::types::AuthError;

/// Seconds shaved off the server-reported lifetime before a token is
/// considered expired.
pub const SAFETY_MARGIN_SECS: i64 = 60;

/// Token and lifetime as issued by the credential endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub expires_in: u64,
}

/// Cached bearer credential. Replaced wholesale on refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    pub fn from_grant(grant: TokenGrant, issued_at: DateTime<Utc>) -> Self {
        let lifetime = Duration::seconds(grant.expires_in.min(i32::MAX as u64) as i64);
        Self {
            token: grant.access_token,
            expires_at: issued_at + lifetime - Duration::seconds(SAFETY_MARGIN_SECS),
        }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn request_token(&self) -> Result<TokenGrant, AuthError>;
}

/// Single-flight bearer token cache.
///
/// The lock is held across the credential request, so concurrent callers
/// wait for one refresh instead of issuing their own.
pub struct TokenCache<S> {
    source: S,
    cached: Mutex<Option<Credential>>,
}

impl<S: CredentialSource> TokenCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cached: Mutex::new(None),
        }
    }

    pub async fn get_token(&self) -> Result<String, AuthError> {
        let mut cached = self.cached.lock().await;
        if let Some(credential) = cached.as_ref() {
            if credential.is_valid_at(Utc::now()) {
                return Ok(credential.token.clone());
            }
        }

        let grant = self.source.request_token().await?;
        let credential = Credential::from_grant(grant, Utc::now());
        tracing::debug!(expires_at = %credential.expires_at, "refreshed access token");
        let token = credential.token.clone();
        *cached = Some(credential);
        Ok(token)
    }

    /// Drops the cached credential so the next call re-authenticates.
    pub async fn invalidate(&self) {
        self.cached.lock().await.take();
    }

    pub async fn current(&self) -> Option<Credential> {
        self.cached.lock().await.clone()
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

/// OAuth2 client-credentials grant against the configured token endpoint.
pub struct OAuthClient {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl OAuthClient {
    pub fn new(
        http: reqwest::Client,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http,
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

#[async_trait]
impl CredentialSource for OAuthClient {
    async fn request_token(&self) -> Result<TokenGrant, AuthError> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        let response = self
            .http
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(AuthError::Transport)?;

        let status = response.status();
        let body = response.text().await.map_err(AuthError::Transport)?;
        if !status.is_success() {
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }
        serde_json::from_str::<TokenGrant>(&body).map_err(|err| AuthError::Malformed(err.to_string()))
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const LIMIT: usize = 512;
    if body.len() <= LIMIT {
        return body.to_string();
    }
    let mut end = LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
