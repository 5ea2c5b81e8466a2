//! The interaction loop.
//!
//! One `Assistant` drives every cycle: it polls the activation source,
//! records while the button is held, asks the speech service for a
//! transcript, gets a reply from the conversation, synthesizes it and plays
//! it. Cycles never overlap, so the speech token and the history are plain
//! fields with no locking.

use crate::audio::{wav, Player, Recorder};
use crate::auth::AccessToken;
use crate::config::{Config, RetryConfig};
use crate::conversation::Conversation;
use crate::error::SpeechError;
use crate::input::Activation;
use crate::speech::SpeechApi;
use futures_util::future::BoxFuture;
use shared::{CycleOutcome, Phase};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Tunables of the loop that do not belong to any collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantSettings {
    pub reply_path: PathBuf,
    pub poll_interval: Duration,
    /// Pause after each cycle before polling again.
    pub cooldown: Duration,
    /// Spoken instead of a reply when the language model fails.
    pub apology: String,
    pub retry: RetryConfig,
}

impl AssistantSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            reply_path: config.audio.reply_path(),
            poll_interval: config.input.poll_interval(),
            cooldown: config.input.cooldown(),
            apology: config.llm.apology.clone(),
            retry: config.retry,
        }
    }
}

pub struct Collaborators {
    pub activation: Box<dyn Activation>,
    pub recorder: Box<dyn Recorder>,
    pub player: Box<dyn Player>,
    pub speech: Arc<dyn SpeechApi>,
    pub conversation: Conversation,
}

pub struct Assistant {
    activation: Box<dyn Activation>,
    recorder: Box<dyn Recorder>,
    player: Box<dyn Player>,
    speech: Arc<dyn SpeechApi>,
    conversation: Conversation,
    token: Option<AccessToken>,
    phase: Phase,
    settings: AssistantSettings,
}

impl Assistant {
    pub fn new(collaborators: Collaborators, settings: AssistantSettings) -> Self {
        Self {
            activation: collaborators.activation,
            recorder: collaborators.recorder,
            player: collaborators.player,
            speech: collaborators.speech,
            conversation: collaborators.conversation,
            token: None,
            phase: Phase::Idle,
            settings,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    fn enter(&mut self, phase: Phase) {
        tracing::debug!("Phase {} -> {}", self.phase, phase);
        self.phase = phase;
    }

    /// Replaces the speech token with a freshly issued one. On failure the
    /// token is cleared so the next operation asks again.
    pub async fn refresh_token(&mut self) -> bool {
        match self.speech.authenticate().await {
            Ok(token) => {
                self.token = Some(token);
                true
            }
            Err(e) => {
                tracing::error!("Failed to obtain speech access token: {}", e);
                self.token = None;
                false
            }
        }
    }

    /// Runs `call` under the refresh policy: a missing token is fetched
    /// before the first attempt, and every later attempt is preceded by a
    /// refresh while the refresh budget lasts. Attempts and refreshes are
    /// bounded by [`RetryConfig`], so a cycle never loops.
    async fn with_token<'a, T, F>(&mut self, operation: &str, mut call: F) -> Result<T, SpeechError>
    where
        F: FnMut(Arc<dyn SpeechApi>, AccessToken) -> BoxFuture<'a, Result<T, SpeechError>>,
    {
        let mut refreshes = 0;
        let mut last_error = None;

        for attempt in 1..=self.settings.retry.attempts {
            let wants_refresh = self.token.is_none() || attempt > 1;
            if wants_refresh && refreshes < self.settings.retry.refreshes {
                refreshes += 1;
                if !self.refresh_token().await {
                    return Err(last_error.unwrap_or(SpeechError::MissingToken));
                }
            }

            let Some(token) = self.token.clone() else {
                return Err(last_error.unwrap_or(SpeechError::MissingToken));
            };

            match call(Arc::clone(&self.speech), token).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_auth_failure() => {
                    tracing::warn!(
                        "{} attempt {} rejected the access token: {}",
                        operation,
                        attempt,
                        e
                    );
                    last_error = Some(e);
                }
                Err(e) => {
                    tracing::warn!("{} attempt {} failed: {}", operation, attempt, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(SpeechError::MissingToken))
    }

    /// Runs one full cycle and returns to [`Phase::Idle`] whatever happens.
    pub async fn handle_interaction(&mut self) -> CycleOutcome {
        self.enter(Phase::Activated);
        let outcome = self.interaction().await;
        self.enter(Phase::Idle);

        if outcome == CycleOutcome::Completed {
            tracing::info!("Interaction completed");
        } else {
            tracing::warn!("Interaction ended early: {}", outcome);
        }
        outcome
    }

    async fn interaction(&mut self) -> CycleOutcome {
        self.enter(Phase::Recording);
        tracing::info!("Recording started");
        let recording = match self.recorder.record(self.activation.as_mut()).await {
            Ok(recording) => recording,
            Err(e) => {
                tracing::error!("Audio capture failed: {}", e);
                return CycleOutcome::CaptureFailed;
            }
        };

        let audio = match wav::read_pcm16(&recording.path) {
            Ok(audio) if !audio.is_empty() => audio,
            Ok(_) => {
                tracing::error!("Recording at {} is empty", recording.path.display());
                return CycleOutcome::CaptureFailed;
            }
            Err(e) => {
                tracing::error!("Failed to read recording: {}", e);
                return CycleOutcome::CaptureFailed;
            }
        };

        self.enter(Phase::Recognizing);
        let audio = &audio;
        let candidates = match self
            .with_token("Recognition", move |speech, token| {
                Box::pin(async move { speech.recognize(audio, &token).await })
            })
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::error!("Speech recognition failed: {}", e);
                return CycleOutcome::RecognitionFailed;
            }
        };

        let Some(text) = candidates
            .first()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
        else {
            tracing::info!("No speech recognized");
            return CycleOutcome::NotRecognized;
        };
        tracing::info!("Recognized: {}", text);

        self.enter(Phase::Responding);
        let reply = match self.conversation.respond(&text).await {
            Ok(reply) => reply.trim().to_string(),
            Err(e) => {
                tracing::error!("Language model call failed: {}", e);
                self.settings.apology.clone()
            }
        };
        if reply.is_empty() {
            return CycleOutcome::NoReply;
        }
        tracing::info!("Reply: {}", reply);

        self.enter(Phase::Synthesizing);
        let reply = reply.as_str();
        let speech = match self
            .with_token("Synthesis", move |speech, token| {
                Box::pin(async move { speech.synthesize(reply, &token).await })
            })
            .await
        {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!("Speech synthesis failed: {}", e);
                return CycleOutcome::SynthesisFailed;
            }
        };

        if let Err(e) = tokio::fs::write(&self.settings.reply_path, &speech).await {
            tracing::error!(
                "Failed to write reply audio to {}: {}",
                self.settings.reply_path.display(),
                e
            );
            return CycleOutcome::SynthesisFailed;
        }

        self.enter(Phase::Playing);
        match self.player.play(&self.settings.reply_path).await {
            Ok(()) => CycleOutcome::Completed,
            Err(e) => {
                tracing::error!("Playback failed: {}", e);
                CycleOutcome::PlaybackFailed
            }
        }
    }

    /// Polls the activation source until `shutdown` resolves. A cycle in
    /// progress always runs to completion; shutdown is only observed while
    /// idle or cooling down.
    pub async fn run<S>(&mut self, shutdown: S)
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        tracing::info!("Assistant started, waiting for the button");
        self.token = None;
        self.refresh_token().await;

        loop {
            let pause = if self.activation.is_engaged() {
                tracing::info!("Button pressed");
                self.handle_interaction().await;
                self.settings.cooldown
            } else {
                self.settings.poll_interval
            };

            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(pause) => {}
            }
        }

        tracing::info!("Assistant stopped");
    }
}
