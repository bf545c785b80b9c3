use agrocast::api::{self, AppState};
use agrocast::config::Config;
use agrocast::pipeline::Recommender;
use agrocast::session::{run_terminal, FormSession};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "agrocast",
    about = "Recommend crops from soil chemistry and a city's seasonal climate"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(long, env = "AGROCAST_CONFIG", default_value = "config/config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the REST API (default).
    Serve,
    /// Run the two-step form flow in the terminal.
    Interactive,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,agrocast=debug,tower_http=debug")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config::load(&cli.config).map_err(|e| {
        anyhow::anyhow!(
            "Failed to load configuration from {}: {}\n\n\
             Make sure:\n\
             1. the configuration file exists\n\
             2. All required environment variables are set (check .env.example)\n\
             3. Create a .env file if needed",
            cli.config.display(),
            e
        )
    })?;
    info!("Configuration loaded");

    let recommender = Recommender::from_config(&config).map_err(|e| {
        anyhow::anyhow!(
            "Failed to initialise recommender: {}\n\n\
             Model path: {}\n\n\
             Export the trained scaler, encoder and network to this JSON file \
             or point model.path at an existing export.",
            e,
            config.model.path.display()
        )
    })?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&config, recommender).await,
        Command::Interactive => {
            let mut session = FormSession::new(&recommender);
            let stdin = std::io::stdin();
            let mut stdout = std::io::stdout();
            run_terminal(&mut session, stdin.lock(), &mut stdout).await?;
            Ok(())
        }
    }
}

async fn serve(config: &Config, recommender: Recommender) -> anyhow::Result<()> {
    let state = AppState {
        recommender: Arc::new(recommender),
    };
    let app = api::router(state);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", addr, e))?;
    info!("Agrocast API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Agrocast API shutting down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown");
        }
    }
}
