use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use interview_session::backend::{load_catalog, CategorySource};
use interview_session::{
    create_router, AppState, CaptureDeviceFactory, Collaborators, Config, HttpBackend,
    SessionConfig, TransportFactory,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "interview-session")]
#[command(about = "Live interview session controller")]
struct Cli {
    /// Config file path, without extension
    #[arg(short, long, default_value = "config/interview-session")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the local control API (default)
    Serve,
    /// Print the interview categories and exit
    Categories,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("Interview Session v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);
    info!("Backend: {}", cfg.backend.base_url);

    let execution_limit = SessionConfig::from(&cfg).execution_timeout;
    let backend =
        Arc::new(HttpBackend::new(cfg.backend.clone())?.with_execute_timeout(execution_limit));

    match cli.command.unwrap_or(Command::Serve) {
        Command::Categories => {
            for category in load_catalog(backend.as_ref()).await {
                println!(
                    "{:<24} {:<11} {:<8} {}",
                    category.id, category.kind, category.duration, category.title
                );
            }
            Ok(())
        }
        Command::Serve => serve(cfg, backend).await,
    }
}

async fn serve(cfg: Config, backend: Arc<HttpBackend>) -> Result<()> {
    let transport = TransportFactory::create(&cfg.channel);
    let device = CaptureDeviceFactory::create(cfg.media.backend);
    info!(
        "Channel transport: {}, capture device: {}",
        transport.name(),
        device.name()
    );

    let catalog: Arc<dyn CategorySource> = backend.clone();
    let collaborators = Collaborators::from_backend(backend, transport, device);
    let state = AppState::new(collaborators, catalog, SessionConfig::from(&cfg));
    let app = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Control API listening on http://{}", addr);
    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}
