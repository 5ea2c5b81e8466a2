use super::ChatModel;
use crate::auth::{self, AccessToken};
use crate::config::LlmConfig;
use crate::error::{AuthError, ChatError};
use serde::{Deserialize, Serialize};
use shared::Turn;
use tokio::sync::Mutex;

/// Chat-completions client for GigaChat.
///
/// Holds its own access token: one is requested on first use, and a call
/// rejected with 401/403 gets exactly one new token and one retry.
pub struct GigaChatClient {
    http: reqwest::Client,
    auth_url: String,
    api_url: String,
    scope: String,
    model: String,
    credentials: String,
    token: Mutex<Option<AccessToken>>,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Turn,
}

impl GigaChatClient {
    pub fn new(http: reqwest::Client, config: &LlmConfig) -> Result<Self, AuthError> {
        let credentials = config
            .credentials
            .clone()
            .filter(|c| !c.trim().is_empty())
            .ok_or(AuthError::MissingCredentials("llm (GIGACHAT_AUTH_TOKEN)"))?;

        Ok(Self {
            http,
            auth_url: config.auth_url.clone(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            scope: config.scope.clone(),
            model: config.model.clone(),
            credentials,
            token: Mutex::new(None),
        })
    }

    async fn refresh(&self) -> Result<AccessToken, ChatError> {
        let token =
            auth::request_token(&self.http, &self.auth_url, &self.credentials, &self.scope).await?;
        tracing::info!("Obtained language model access token");
        *self.token.lock().await = Some(token.clone());
        Ok(token)
    }

    async fn current_token(&self) -> Result<AccessToken, ChatError> {
        let cached = self.token.lock().await.clone();
        match cached {
            Some(token) => Ok(token),
            None => self.refresh().await,
        }
    }

    async fn send(&self, messages: &[Turn], token: &AccessToken) -> Result<String, ChatError> {
        let response = self
            .http
            .post(format!("{}/chat/completions", self.api_url))
            .header("Authorization", token.bearer())
            .header("Accept", "application/json")
            .json(&CompletionRequest {
                model: &self.model,
                messages,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        parse_completion(&bytes)
    }
}

fn parse_completion(bytes: &[u8]) -> Result<String, ChatError> {
    let parsed: CompletionResponse =
        serde_json::from_slice(bytes).map_err(|e| ChatError::MalformedResponse(e.to_string()))?;

    parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| ChatError::MalformedResponse("response has no choices".to_string()))
}

#[async_trait::async_trait]
impl ChatModel for GigaChatClient {
    async fn complete(&self, messages: &[Turn]) -> Result<String, ChatError> {
        let token = self.current_token().await?;

        match self.send(messages, &token).await {
            Err(e) if e.is_auth_failure() => {
                tracing::warn!("Language model rejected the access token, refreshing");
                *self.token.lock().await = None;
                let token = self.refresh().await?;
                self.send(messages, &token).await
            }
            result => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let messages = vec![Turn::system("prompt"), Turn::user("hi")];
        let body = serde_json::to_value(CompletionRequest {
            model: "GigaChat",
            messages: &messages,
        })
        .unwrap();

        assert_eq!(body["model"], "GigaChat");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");
    }

    #[test]
    fn test_parse_completion_takes_first_choice() {
        let reply = parse_completion(
            br#"{"choices":[{"message":{"role":"assistant","content":"Math at 9:30."},"index":0,"finish_reason":"stop"}],"usage":{"total_tokens":10}}"#,
        )
        .unwrap();
        assert_eq!(reply, "Math at 9:30.");
    }

    #[test]
    fn test_parse_completion_without_choices() {
        let result = parse_completion(br#"{"choices":[]}"#);
        assert!(matches!(result, Err(ChatError::MalformedResponse(_))));
    }

    #[test]
    fn test_new_requires_credentials() {
        let result = GigaChatClient::new(reqwest::Client::new(), &LlmConfig::default());
        assert!(matches!(result, Err(AuthError::MissingCredentials(_))));
    }
}
