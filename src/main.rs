use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use minssem::{ApiServerBuilder, Config};

/// Minssem - conversational Korean tutor backend
#[derive(Parser)]
#[command(name = "minssem", version, about)]
struct Cli {
    /// Address to bind
    #[arg(long, env = "HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Config file (defaults to ~/.config/minssem/config.toml)
    #[arg(short, long, env = "MINSSEM_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the browser client
    #[arg(long, env = "MINSSEM_STATIC_DIR")]
    static_dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env is optional; real environment variables take precedence
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up logging based on verbosity, unless RUST_LOG says otherwise
    let filter = match cli.verbose {
        0 => "info,minssem=info",
        1 => "info,minssem=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "loaded .env");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;

    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if cli.static_dir.is_some() {
        config.server.static_dir = cli.static_dir;
    }

    tracing::info!(
        port = config.server.port,
        chat_model = %config.models.chat,
        stt_model = %config.voice.stt_model,
        tts_model = %config.voice.tts_model,
        persona = %config.persona.name,
        "starting tutor gateway"
    );
    tracing::debug!(?config, "loaded configuration");

    let server = ApiServerBuilder::from_config(&config)?.build();
    server.run().await?;

    Ok(())
}
