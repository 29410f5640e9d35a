//! Speech gateway command line
//!
//! Operator tool for exercising the gateway outside the backend.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use care_speech_gateway::{AudioEncoding, AuthSigner, GatewayConfig, SpeechGateway, VoiceOptions};

#[derive(Parser)]
#[command(name = "care-speech-gateway", version, about = "Cloud ASR/TTS gateway client")]
struct Cli {
    /// Config file (defaults to config.toml next to the executable)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Transcribe an audio file to text
    Transcribe {
        file: PathBuf,
        #[arg(long)]
        language: Option<String>,
        /// Keep the input file instead of deleting it afterwards
        #[arg(long)]
        keep_input: bool,
    },
    /// Synthesize text to an audio file
    Synthesize {
        text: String,
        #[arg(long)]
        voice: Option<String>,
        /// lame (mp3) or raw (pcm)
        #[arg(long)]
        encoding: Option<AudioEncoding>,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print a freshly signed connection URL
    Sign { target: Target },
}

#[derive(Clone, Copy, ValueEnum)]
enum Target {
    Iat,
    Tts,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(GatewayConfig::config_path);
    let mut config = GatewayConfig::load(&config_path)?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling session");
            ctrl_c.cancel();
        }
    });

    match cli.command {
        Command::Transcribe {
            file,
            language,
            keep_input,
        } => {
            if keep_input {
                config.asr.remove_source = false;
            }
            let gateway = SpeechGateway::from_config(&config)?;
            let language = language.unwrap_or_else(|| gateway.asr().language().to_string());
            let text = gateway
                .asr()
                .transcribe_with_cancel(&file, &language, &cancel)
                .await
                .with_context(|| format!("Failed to transcribe {}", file.display()))?;
            println!("{}", text);
        }
        Command::Synthesize {
            text,
            voice,
            encoding,
            output,
        } => {
            let gateway = SpeechGateway::from_config(&config)?;
            let default = gateway.tts().default_voice().clone();
            let voice = VoiceOptions::new(
                voice.unwrap_or(default.voice),
                encoding.unwrap_or(default.encoding),
            );
            let audio = gateway
                .synthesize_with_cancel(&text, &voice, &cancel)
                .await
                .context("Failed to synthesize text")?;
            tokio::fs::write(&output, &audio)
                .await
                .with_context(|| format!("Failed to write {}", output.display()))?;
            tracing::info!("Wrote {} bytes to {}", audio.len(), output.display());
        }
        Command::Sign { target } => {
            let endpoint = match target {
                Target::Iat => &config.iat.endpoint,
                Target::Tts => &config.tts.endpoint,
            };
            let signer = AuthSigner::new(Arc::new(config.credentials.clone()));
            let signed = signer.sign_now(endpoint)?;
            println!("{}", signed.url);
        }
    }

    Ok(())
}
