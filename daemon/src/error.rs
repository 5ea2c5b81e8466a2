//! Error types for the assistant's collaborators.
//!
//! Each collaborator reports failures through its own enum so the
//! interaction loop can decide what a failure means for the current cycle.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("No default input device found")]
    NoInputDevice,

    #[error("Audio input device #{0} not found")]
    DeviceIndex(usize),

    #[error("No default output device found")]
    NoOutputDevice,

    #[error("Audio connection failed: {0}")]
    Connection(String),

    #[error("No suitable audio configuration found for {sample_rate}Hz, {channels} channel(s)")]
    UnsupportedConfig { sample_rate: u32, channels: u16 },

    #[error("Audio stream error: {0}")]
    Stream(String),

    #[error("No audio received for {0} ms, input stream stalled")]
    Stalled(u64),

    #[error("No audio was captured. Check your microphone.")]
    EmptyRecording,

    #[error("Unsupported WAV format: {0}")]
    WavFormat(String),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Playback failed: {0}")]
    Playback(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("No credentials configured for {0}")]
    MissingCredentials(&'static str),

    #[error("Token request rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Token request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed token response: {0}")]
    MalformedResponse(String),
}

#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("No access token available")]
    MissingToken,

    #[error("Speech service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Speech request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed speech service response: {0}")]
    MalformedResponse(String),
}

impl SpeechError {
    /// True when the service rejected the bearer token.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, SpeechError::Status { status: 401 | 403, .. })
    }
}

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Language model returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Language model request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed language model response: {0}")]
    MalformedResponse(String),
}

impl ChatError {
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ChatError::Status { status: 401 | 403, .. })
    }
}
