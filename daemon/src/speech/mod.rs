//! Cloud speech recognition and synthesis.

pub mod client;

pub use client::SpeechClient;

use crate::audio::PcmAudio;
use crate::auth::AccessToken;
use crate::error::SpeechError;

/// Remote speech service. Token lifetime is managed by the caller, which
/// decides when a failed call warrants a new token.
#[async_trait::async_trait]
pub trait SpeechApi: Send + Sync {
    /// Exchanges the configured credentials for a new access token.
    async fn authenticate(&self) -> Result<AccessToken, SpeechError>;

    /// Returns the recognition candidates, best first. No speech yields an
    /// empty list rather than an error.
    async fn recognize(
        &self,
        audio: &PcmAudio,
        token: &AccessToken,
    ) -> Result<Vec<String>, SpeechError>;

    /// Returns an encoded audio file (WAV by default) speaking `text`.
    async fn synthesize(&self, text: &str, token: &AccessToken) -> Result<Vec<u8>, SpeechError>;
}
