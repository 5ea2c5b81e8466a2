//! OAuth client-credentials exchange shared by the speech and chat clients.

use crate::error::AuthError;
use serde::Deserialize;
use std::fmt;
use tracing::debug;

/// Bearer token for a remote API. The expiry is owned by the server; a
/// token is only known to be stale once a call using it fails.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Requests a fresh token. Every call is a new request with its own `RqUID`.
pub async fn request_token(
    client: &reqwest::Client,
    url: &str,
    credentials: &str,
    scope: &str,
) -> Result<AccessToken, AuthError> {
    let request_id = uuid::Uuid::new_v4().to_string();
    debug!("Requesting access token for scope {} (RqUID {})", scope, request_id);

    let response = client
        .post(url)
        .header("RqUID", &request_id)
        .header("Authorization", format!("Basic {}", credentials))
        .header("Accept", "application/json")
        .form(&[("scope", scope)])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::Rejected {
            status: status.as_u16(),
            body,
        });
    }

    let bytes = response.bytes().await?;
    parse_token_response(&bytes)
}

fn parse_token_response(bytes: &[u8]) -> Result<AccessToken, AuthError> {
    let parsed: TokenResponse = serde_json::from_slice(bytes)
        .map_err(|e| AuthError::MalformedResponse(e.to_string()))?;

    if parsed.access_token.is_empty() {
        return Err(AuthError::MalformedResponse(
            "empty access_token".to_string(),
        ));
    }

    Ok(AccessToken(parsed.access_token))
}
