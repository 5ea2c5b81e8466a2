use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default = "Config::default")]
pub struct Config {
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SpeechConfig {
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_speech_api_url")]
    pub api_url: String,
    #[serde(default = "default_speech_scope")]
    pub scope: String,
    #[serde(default)]
    pub credentials: Option<String>,
    #[serde(default = "default_voice")]
    pub voice: String,
    #[serde(default = "default_synthesis_format")]
    pub format: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            auth_url: default_auth_url(),
            api_url: default_speech_api_url(),
            scope: default_speech_scope(),
            credentials: None,
            voice: default_voice(),
            format: default_synthesis_format(),
        }
    }
}

fn default_auth_url() -> String {
    "https://ngw.devices.sberbank.ru:9443/api/v2/oauth".to_string()
}

fn default_speech_api_url() -> String {
    "https://smartspeech.sber.ru/rest/v1".to_string()
}

fn default_speech_scope() -> String {
    "SALUTE_SPEECH_PERS".to_string()
}

fn default_voice() -> String {
    "Bys_24000".to_string()
}

fn default_synthesis_format() -> String {
    "wav16".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LlmConfig {
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_llm_api_url")]
    pub api_url: String,
    #[serde(default = "default_llm_scope")]
    pub scope: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default)]
    pub credentials: Option<String>,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default = "default_apology")]
    pub apology: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            auth_url: default_auth_url(),
            api_url: default_llm_api_url(),
            scope: default_llm_scope(),
            model: default_llm_model(),
            credentials: None,
            system_prompt: default_system_prompt(),
            apology: default_apology(),
        }
    }
}

fn default_llm_api_url() -> String {
    "https://gigachat.devices.sberbank.ru/api/v1".to_string()
}

fn default_llm_scope() -> String {
    "GIGACHAT_API_PERS".to_string()
}

fn default_llm_model() -> String {
    "GigaChat".to_string()
}

fn default_system_prompt() -> String {
    "You are a school student's assistant and help with school matters. \
What follows is a friendly conversation between a person and an AI. \
The AI is talkative and gives plenty of concrete details from its context. \
If the AI does not know the answer to a question, it honestly says that it does not know.\n\
When answering, use the information from the context:\n\
context: \"Friday schedule: 8:30 - Russian, 9:30 - Math. \
Monday schedule: 8:20 - Literature, 9:50 - Engineering\"\n\
\"About school 777: the State Budgetary Educational Institution \
'Engineering and Technology School No. 777' of Saint Petersburg is a unique school \
with a high-tech learning environment, founded on the initiative of the Government \
of Saint Petersburg and its Committee on Education.\"\n\
\"Extra classes: English on Tuesday and Thursday at 16:15\"\n\
If the context does not contain enough information, answer in your own words."
        .to_string()
}

fn default_apology() -> String {
    "Sorry, something went wrong while processing your request.".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AudioConfig {
    #[serde(default)]
    pub device_index: Option<usize>,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_channels")]
    pub channels: u16,
    #[serde(default = "default_max_record_seconds")]
    pub max_record_seconds: u64,
    #[serde(default = "default_check_interval_ms")]
    pub check_interval_ms: u64,
    #[serde(default = "default_stall_timeout_ms")]
    pub stall_timeout_ms: u64,
    #[serde(default = "default_audio_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_recording_file")]
    pub recording_file: String,
    #[serde(default = "default_reply_file")]
    pub reply_file: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device_index: None,
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            max_record_seconds: default_max_record_seconds(),
            check_interval_ms: default_check_interval_ms(),
            stall_timeout_ms: default_stall_timeout_ms(),
            directory: default_audio_directory(),
            recording_file: default_recording_file(),
            reply_file: default_reply_file(),
        }
    }
}

impl AudioConfig {
    pub fn recording_path(&self) -> PathBuf {
        self.directory.join(&self.recording_file)
    }

    pub fn reply_path(&self) -> PathBuf {
        self.directory.join(&self.reply_file)
    }

    pub fn max_record_duration(&self) -> Duration {
        Duration::from_secs(self.max_record_seconds)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }

    pub fn stall_timeout(&self) -> Duration {
        Duration::from_millis(self.stall_timeout_ms)
    }
}

fn default_sample_rate() -> u32 {
    16000
}
fn default_channels() -> u16 {
    1
}
fn default_max_record_seconds() -> u64 {
    20
}
fn default_check_interval_ms() -> u64 {
    500
}
fn default_stall_timeout_ms() -> u64 {
    2000
}

fn default_audio_directory() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("scholar"))
        .unwrap_or_else(|| PathBuf::from("audio"))
}

fn default_recording_file() -> String {
    "recording.wav".to_string()
}

fn default_reply_file() -> String {
    "output.wav".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct InputConfig {
    #[serde(default = "default_device_name")]
    pub device_name: String,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
    #[serde(default = "default_rescan_interval_ms")]
    pub rescan_interval_ms: u64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            device_name: default_device_name(),
            poll_interval_ms: default_poll_interval_ms(),
            cooldown_ms: default_cooldown_ms(),
            rescan_interval_ms: default_rescan_interval_ms(),
        }
    }
}

impl InputConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn rescan_interval(&self) -> Duration {
        Duration::from_millis(self.rescan_interval_ms)
    }
}

fn default_device_name() -> String {
    "mouse".to_string()
}
fn default_poll_interval_ms() -> u64 {
    100
}
fn default_cooldown_ms() -> u64 {
    1000
}
fn default_rescan_interval_ms() -> u64 {
    5000
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct HttpConfig {
    #[serde(default)]
    pub ca_cert_path: Option<PathBuf>,
    #[serde(default = "default_http_timeout")]
    pub timeout_seconds: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            ca_cert_path: None,
            timeout_seconds: default_http_timeout(),
        }
    }
}

fn default_http_timeout() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_log_directory(),
        }
    }
}

fn default_log_directory() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("scholar").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// Bounds on the reactive token refresh: `attempts` calls of the failing
/// operation in total, with at most `refreshes` new tokens requested.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct RetryConfig {
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    #[serde(default = "default_refreshes")]
    pub refreshes: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            refreshes: default_refreshes(),
        }
    }
}

fn default_attempts() -> u32 {
    2
}

fn default_refreshes() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            speech: SpeechConfig::default(),
            llm: LlmConfig::default(),
            audio: AudioConfig::default(),
            input: InputConfig::default(),
            http: HttpConfig::default(),
            logging: LoggingConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl Config {
    /// Applies the environment variables the assistant has always been
    /// deployed with on top of the file values.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("SBER_AUTH_TOKEN") {
            self.speech.credentials = Some(value);
        }
        if let Some(value) = lookup("GIGACHAT_AUTH_TOKEN") {
            self.llm.credentials = Some(value);
        }
        if let Some(value) = lookup("AUDIO_DEVICE_INDEX") {
            self.audio.device_index = Some(parse_override("AUDIO_DEVICE_INDEX", &value)?);
        }
        if let Some(value) = lookup("AUDIO_RATE") {
            self.audio.sample_rate = parse_override("AUDIO_RATE", &value)?;
        }
        if let Some(value) = lookup("AUDIO_CHANNELS") {
            self.audio.channels = parse_override("AUDIO_CHANNELS", &value)?;
        }
        if let Some(value) = lookup("OUTPUT_AUDIO_FILE") {
            self.audio.reply_file = value;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate == 0 {
            return Err(anyhow::anyhow!("audio.sample_rate must be greater than 0"));
        }
        if self.audio.channels == 0 {
            return Err(anyhow::anyhow!("audio.channels must be greater than 0"));
        }
        if self.audio.max_record_seconds == 0 {
            return Err(anyhow::anyhow!(
                "audio.max_record_seconds must be greater than 0"
            ));
        }
        if self.audio.check_interval_ms == 0 {
            return Err(anyhow::anyhow!(
                "audio.check_interval_ms must be greater than 0"
            ));
        }
        if self.audio.stall_timeout_ms == 0 {
            return Err(anyhow::anyhow!(
                "audio.stall_timeout_ms must be greater than 0"
            ));
        }
        if self.input.poll_interval_ms == 0 {
            return Err(anyhow::anyhow!(
                "input.poll_interval_ms must be greater than 0"
            ));
        }
        if self.retry.attempts == 0 {
            return Err(anyhow::anyhow!("retry.attempts must be at least 1"));
        }
        if self.audio.recording_file.is_empty() || self.audio.reply_file.is_empty() {
            return Err(anyhow::anyhow!("audio file names must not be empty"));
        }
        Ok(())
    }
}

fn parse_override<T>(name: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid value '{}' for {}: {}", value, name, e))
}

/// Reads the config file (defaults when it does not exist), then applies
/// environment overrides and validates the result.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = if path.exists() {
        let config_str = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;
        toml::from_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?
    } else {
        Config::default()
    };

    config.apply_overrides(|name| std::env::var(name).ok())?;
    config.validate()?;
    Ok(config)
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("scholar").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}
