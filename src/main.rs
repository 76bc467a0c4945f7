use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use agrivoice_gateway::voice::{voice_token, SpeechSynthesizer};
use agrivoice_gateway::{ApiServer, Config};

/// Agrivoice - voice and text chat relay for an agriculture assistant
#[derive(Parser)]
#[command(name = "agrivoice", version, about)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, env = "AGRIVOICE_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(long, env = "AGRIVOICE_PORT", default_value = "8080")]
    port: u16,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Synthesize a line of text and print the resulting file path
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,agrivoice_gateway=info",
        1 => "info,agrivoice_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    tracing::debug!(
        upload_dir = %config.upload_dir.display(),
        audio_dir = %config.audio_dir.display(),
        model = %config.llm.model,
        "loaded configuration"
    );

    config.ensure_dirs()?;

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::TestTts { text } => test_tts(&config, &text).await,
        };
    }

    if config.openai_api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY not set; chat requests will fail until it is provided");
    }
    if config.hugging_face_api_key.is_none() {
        tracing::warn!("HUGGING_FACE_API_KEY not set; audio transcription may fail");
    }

    tracing::info!(port = cli.port, "starting agrivoice gateway");

    let server = ApiServer::new(&config, cli.port)?;
    server.run().await?;

    Ok(())
}

/// Synthesize a sample line through the configured TTS service
async fn test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
    println!("Synthesizing: \"{text}\"");

    let synthesizer = SpeechSynthesizer::new(&config.tts, &config.audio_dir)?;
    let token = voice_token();
    let path = synthesizer.synthesize(text, &token).await?;

    println!("Wrote {}", path.display());
    Ok(())
}
