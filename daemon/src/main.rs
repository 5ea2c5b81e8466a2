use anyhow::Result;
use clap::Parser;
use scholard::audio::{CpalRecorder, RodioPlayer};
use scholard::config::{self, Config};
use scholard::conversation::{Conversation, GigaChatClient};
use scholard::input::Activation;
use scholard::speech::SpeechClient;
use scholard::{http, logging, Assistant, AssistantSettings, Collaborators};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "scholard")]
#[command(about = "Push-to-talk school voice assistant", long_about = None)]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(config::default_config_path);
    let config = config::load_config(&config_path)?;

    let log_path = logging::init(&config.logging)?;
    info!("scholard starting...");
    info!("Logging to {}", log_path.display());
    info!("Config: {}", config_path.display());

    std::fs::create_dir_all(&config.audio.directory).map_err(|e| {
        anyhow::anyhow!(
            "Failed to create audio directory {}: {}",
            config.audio.directory.display(),
            e
        )
    })?;

    let client = http::build_client(&config.http)?;
    let speech = SpeechClient::new(client.clone(), &config.speech)?;
    let chat = GigaChatClient::new(client, &config.llm)?;

    let mut assistant = Assistant::new(
        Collaborators {
            activation: activation_source(&config),
            recorder: Box::new(CpalRecorder::new(&config.audio)),
            player: Box::new(RodioPlayer::new()),
            speech: Arc::new(speech),
            conversation: Conversation::new(config.llm.system_prompt.clone(), Arc::new(chat)),
        },
        AssistantSettings::from_config(&config),
    );

    assistant.run(shutdown_signal()).await;
    info!("scholard stopped");
    Ok(())
}

#[cfg(target_os = "linux")]
fn activation_source(config: &Config) -> Box<dyn Activation> {
    Box::new(scholard::input::MouseButton::new(&config.input))
}

#[cfg(not(target_os = "linux"))]
fn activation_source(_config: &Config) -> Box<dyn Activation> {
    tracing::warn!("No input device backend on this platform; the button never engages");
    Box::new(scholard::input::NeverEngaged)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received interrupt, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
