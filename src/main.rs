use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use anisource_lib::{
    modules::provider::infrastructure::adapters::{AniListSource, JikanSource},
    shared::utils::init_logger,
    AggregatorConfig, SearchFilters, SourceManager,
};

/// Query anime metadata across every configured source
#[derive(Parser)]
#[command(name = "anisource")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Only ask this source
    #[arg(long, global = true)]
    source: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search with failover across sources
    #[command(alias = "s")]
    Search {
        #[arg(required = true)]
        query: Vec<String>,
        #[arg(long, default_value = "1")]
        page: u32,
    },

    /// Search every source at once and merge the results
    #[command(alias = "all")]
    SearchAll {
        #[arg(required = true)]
        query: Vec<String>,
        #[arg(long, default_value = "1")]
        page: u32,
    },

    /// Show one title by its qualified id (e.g. jikan-20)
    #[command(alias = "i")]
    Info { id: String },

    /// List episodes of a title
    Episodes { id: String },

    /// Currently trending titles
    Trending {
        #[arg(long, default_value = "1")]
        page: u32,
    },

    /// Probe every source and print the health table
    Health,

    /// List registered sources
    Sources,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logger();
    let cli = Cli::parse();

    let config = AggregatorConfig::from_env().context("Failed to load configuration")?;
    let manager = SourceManager::builder()
        .with_config(config)
        .register(Arc::new(AniListSource::new()))
        .register(Arc::new(JikanSource::new()))
        .build()
        .context("Failed to build source manager")?;

    let source = cli.source.as_deref();
    match cli.command {
        Commands::Search { query, page } => {
            let page = manager
                .search(&query.join(" "), page, source, &SearchFilters::default())
                .await?;
            print_json(&page)
        }
        Commands::SearchAll { query, page } => {
            print_json(&manager.search_all(&query.join(" "), page).await?)
        }
        Commands::Info { id } => print_json(&manager.get_details(&id, source).await?),
        Commands::Episodes { id } => print_json(&manager.get_episodes(&id, source).await?),
        Commands::Trending { page } => print_json(&manager.get_trending(page, source).await?),
        Commands::Health => print_json(&manager.check_all_health().await),
        Commands::Sources => print_json(&manager.get_available_sources().await),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render output")?;
    println!("{}", rendered);
    Ok(())
}
