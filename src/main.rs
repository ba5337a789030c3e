use clap::Parser;
use dotenvy::dotenv;
use lan_share::config::ShareConfig;
use lan_share::infrastructure::{network, storage};
use lan_share::services::transfer::format_size;
use lan_share::{AppState, create_app};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Host to bind when no LAN address is picked
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Port for the HTTP server
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory to share
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Bind to the first LAN address matching AUTO_IP_PREFIX
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    auto: Option<bool>,
}

impl Args {
    fn apply(self, mut config: ShareConfig) -> ShareConfig {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(dir) = self.dir {
            config.storage_dir = dir;
        }
        if let Some(auto) = self.auto {
            config.auto_ip = auto;
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lan_share=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting LAN Share...");

    let config = args.apply(ShareConfig::from_env());
    info!(
        "🛡️  Config: Max Size={}, Buffer={}, Progress Step={}%",
        format_size(config.max_file_size),
        format_size(config.buffer_size as u64),
        config.progress_log_step
    );

    let root = storage::setup_storage_dir(&config.storage_dir).await?;
    let ip = bind_ip(&config)?;
    let addr = SocketAddr::new(ip, config.port);

    let state = AppState::new(config, root);

    let app = create_app(state).layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            })
            .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                info!("📥 {} {}", request.method(), request.uri());
            })
            .on_response(
                |response: &axum::http::Response<_>,
                 latency: std::time::Duration,
                 _span: &tracing::Span| {
                    info!(
                        "📤 Finished in {:?} with status {}",
                        latency,
                        response.status()
                    );
                },
            ),
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("✅ Server ready at http://{}", addr);
    info!("📖 Swagger UI: http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("🛑 Server shut down gracefully.");
    Ok(())
}

fn bind_ip(config: &ShareConfig) -> anyhow::Result<IpAddr> {
    if config.auto_ip {
        match network::detect_lan_ip(&config.auto_ip_prefix) {
            Some(ip) => {
                info!("🌐 LAN address detected: {}", ip);
                return Ok(IpAddr::V4(ip));
            }
            None => warn!(
                "No LAN address starts with {:?}, falling back to {}",
                config.auto_ip_prefix, config.host
            ),
        }
    }
    config
        .host
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid host {:?}: {}", config.host, e))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, starting graceful shutdown...");
        },
    }
}
