use super::SpeechApi;
use crate::audio::PcmAudio;
use crate::auth::{self, AccessToken};
use crate::config::SpeechConfig;
use crate::error::{AuthError, SpeechError};
use serde::Deserialize;

/// REST client for the SaluteSpeech recognition and synthesis endpoints.
#[derive(Clone)]
pub struct SpeechClient {
    http: reqwest::Client,
    auth_url: String,
    api_url: String,
    scope: String,
    credentials: String,
    voice: String,
    format: String,
}

#[derive(Deserialize)]
struct RecognitionResponse {
    #[serde(default)]
    result: Option<Vec<String>>,
}

impl SpeechClient {
    pub fn new(http: reqwest::Client, config: &SpeechConfig) -> Result<Self, AuthError> {
        let credentials = config
            .credentials
            .clone()
            .filter(|c| !c.trim().is_empty())
            .ok_or(AuthError::MissingCredentials("speech (SBER_AUTH_TOKEN)"))?;

        Ok(Self {
            http,
            auth_url: config.auth_url.clone(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            scope: config.scope.clone(),
            credentials,
            voice: config.voice.clone(),
            format: config.format.clone(),
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{}", self.api_url, method)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SpeechError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SpeechError::Status {
        status: status.as_u16(),
        body,
    })
}

fn parse_recognition(bytes: &[u8]) -> Result<Vec<String>, SpeechError> {
    let parsed: RecognitionResponse = serde_json::from_slice(bytes)
        .map_err(|e| SpeechError::MalformedResponse(e.to_string()))?;
    Ok(parsed.result.unwrap_or_default())
}

fn pcm_content_type(audio: &PcmAudio) -> String {
    format!("audio/x-pcm;bit=16;rate={}", audio.sample_rate)
}

#[async_trait::async_trait]
impl SpeechApi for SpeechClient {
    async fn authenticate(&self) -> Result<AccessToken, SpeechError> {
        let token =
            auth::request_token(&self.http, &self.auth_url, &self.credentials, &self.scope).await?;
        tracing::info!("Obtained speech access token");
        Ok(token)
    }

    async fn recognize(
        &self,
        audio: &PcmAudio,
        token: &AccessToken,
    ) -> Result<Vec<String>, SpeechError> {
        tracing::debug!(
            "Sending {} bytes of audio for recognition",
            audio.bytes.len()
        );

        let response = self
            .http
            .post(self.endpoint("speech:recognize"))
            .header("Authorization", token.bearer())
            .header("Content-Type", pcm_content_type(audio))
            .body(audio.bytes.clone())
            .send()
            .await?;

        let response = check_status(response).await?;
        let bytes = response.bytes().await?;
        let candidates = parse_recognition(&bytes)?;
        tracing::debug!("Recognition returned {} candidate(s)", candidates.len());
        Ok(candidates)
    }

    async fn synthesize(&self, text: &str, token: &AccessToken) -> Result<Vec<u8>, SpeechError> {
        let response = self
            .http
            .post(self.endpoint("text:synthesize"))
            .header("Authorization", token.bearer())
            .header("Content-Type", "application/text")
            .query(&[("format", self.format.as_str()), ("voice", self.voice.as_str())])
            .body(text.to_string())
            .send()
            .await?;

        let response = check_status(response).await?;
        let audio = response.bytes().await?.to_vec();
        if audio.is_empty() {
            return Err(SpeechError::MalformedResponse(
                "synthesis returned no audio".to_string(),
            ));
        }
        tracing::debug!("Synthesized {} bytes of audio", audio.len());
        Ok(audio)
    }
}
