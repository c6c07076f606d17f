/// drive-mirror server - HTTP trigger for remote folder mirroring
use clap::{Parser, Subcommand};
use mirror_engine::{
    CommandPublisher, Publisher, SqliteStateStore, StateStore, SyncManager,
};
use mirror_remote::{DriveClient, RemoteStore, StaticTokenProvider, TokenProvider};
use mirror_server::{config::MirrorConfig, create_router, state::AppState};
use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mirror-server")]
#[command(about = "Mirror a remote folder tree to static hosting", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Configuration file path
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Run a single sync cycle and exit
    SyncOnce {
        /// Configuration file path
        #[arg(short, long)]
        config: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mirror_server=info,mirror_engine=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => {
            serve(config.as_deref()).await?;
        }
        Commands::SyncOnce { config } => {
            sync_once(config.as_deref()).await?;
        }
    }

    Ok(())
}

async fn build_manager(config: &MirrorConfig) -> anyhow::Result<SyncManager> {
    let state = SqliteStateStore::connect(&config.state.database_url).await?;
    let state: Arc<dyn StateStore> = Arc::new(state);
    tracing::info!("State store connected");

    let tokens: Arc<dyn TokenProvider> =
        Arc::new(StaticTokenProvider::new(config.remote.access_token.clone()));
    let remote: Arc<dyn RemoteStore> =
        Arc::new(DriveClient::with_base_url(config.remote.base_url.clone(), tokens));

    let publisher: Arc<dyn Publisher> =
        Arc::new(CommandPublisher::new(config.publish.command.clone()));

    Ok(SyncManager::new(remote, state, publisher, config.sync_config()))
}

async fn serve(config_path: Option<&str>) -> anyhow::Result<()> {
    let config = MirrorConfig::load(config_path)?;
    config.validate()?;

    tracing::info!("Starting drive-mirror server");
    tracing::info!("Host: {}", config.server.host);
    tracing::info!("Port: {}", config.server.port);

    let manager = Arc::new(build_manager(&config).await?);
    let app_state = AppState::new(manager, config.auth.sync_secret.clone());
    let app = create_router(app_state);

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn sync_once(config_path: Option<&str>) -> anyhow::Result<()> {
    let config = MirrorConfig::load(config_path)?;
    config.validate()?;

    let manager = build_manager(&config).await?;
    let outcome = manager.run_sync().await?;
    tracing::info!("Sync finished: {:?}", outcome);

    Ok(())
}
