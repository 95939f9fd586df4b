use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use sitedex_core::paths::doc_id;
use sitedex_core::{ExtractorRegistry, Indexes, SiteIndexer, SitePaths};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "sitedex-indexer")]
#[command(about = "Build the partitioned search assets of a documentation site", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SiteArgs {
    /// Source document tree
    #[arg(long, default_value = "./data")]
    data: String,
    /// Published assets directory (partitions and media)
    #[arg(long, default_value = "./public/assets")]
    assets: String,
    /// Document cache directory
    #[arg(long, default_value = "./tmp/cache")]
    cache: String,
}

impl SiteArgs {
    fn paths(&self) -> SitePaths {
        SitePaths::new(&self.data, &self.assets, &self.cache)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Re-index changed documents and revert deleted ones
    Build {
        #[command(flatten)]
        site: SiteArgs,
    },
    /// List what the next build would touch, without writing anything
    Status {
        #[command(flatten)]
        site: SiteArgs,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { site } => build(site.paths()),
        Commands::Status { site } => status(site.paths()),
    }
}

fn build(paths: SitePaths) -> Result<()> {
    tracing::debug!(data = %paths.data_root.display(), assets = %paths.assets_root.display(), "building site");
    let indexer = SiteIndexer::open(paths)?;
    let summary = indexer.build()?;
    println!("indexed={} fresh={} removed={}", summary.indexed, summary.fresh, summary.removed);
    Ok(())
}

fn status(paths: SitePaths) -> Result<()> {
    let indexes = Indexes::at(&paths);
    let indexer = SiteIndexer::new(paths, indexes, ExtractorRegistry::default());
    for doc in indexer.stale_documents()? {
        println!("stale    {}", doc_id(&doc));
    }
    for id in indexer.pending_removals()? {
        println!("removed  {id}");
    }
    Ok(())
}
