use anyhow::Result;
use clap::{Parser, Subcommand};
use reqwest::Client;
use sitedex_client::HttpIndexReader;
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "sitedex-search")]
#[command(about = "Query a published site's search partitions over HTTP")]
struct Cli {
    /// Origin serving the site's assets
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    base_uri: String,
    /// Request timeout seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// User-Agent string sent with every shard request
    #[arg(long, default_value = "sitedex-search/0.1")]
    user_agent: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Documents containing any of the given terms
    Search { query: Vec<String> },
    /// Value counts of a front-matter property
    Props { name: String },
    /// Documents carrying a property value
    Refs { name: String, value: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Cli::parse();

    let mut builder = Client::builder().user_agent(args.user_agent.clone());
    if let Some(secs) = args.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    let reader = HttpIndexReader::new(builder.build()?, &args.base_uri);

    let out = match args.command {
        Command::Search { query } => serde_json::to_string_pretty(&reader.search(&query.join(" ")).await?)?,
        Command::Props { name } => serde_json::to_string_pretty(&reader.property_values(&name).await?)?,
        Command::Refs { name, value } => serde_json::to_string_pretty(&reader.property_references(&name, &value).await?)?,
    };
    println!("{out}");
    Ok(())
}
