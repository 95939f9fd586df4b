use anyhow::Result;
use clap::Parser;
use sitedex_server::{build_app, ServeConfig};
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "sitedex-server")]
#[command(about = "Publish a site's search partitions and media, with JSON query endpoints")]
struct Args {
    /// Assets directory written by `sitedex-indexer build`
    #[arg(long, default_value = "./public/assets")]
    assets: String,
    /// Origins allowed to fetch shards cross-origin (comma separated, default any)
    #[arg(long, env = "CORS_ALLOW_ORIGIN")]
    allow_origins: Option<String>,
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let config = ServeConfig { assets_root: args.assets.into(), allow_origins: args.allow_origins };
    let app = build_app(&config)?;

    let listener = TcpListener::bind((args.host.as_str(), args.port)).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        assets = %config.assets_root.display(),
        origins = config.allow_origins.as_deref().unwrap_or("*"),
        "serving site assets"
    );
    axum::serve(listener, app).await?;
    Ok(())
}
