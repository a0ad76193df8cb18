use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arxiv_citegraph::arxiv::{ArxivClient, ArxivId};
use arxiv_citegraph::config::{load_config, Config};
use arxiv_citegraph::graph::{CitationGraphBuilder, PaperSource};
use arxiv_citegraph::latex;

/// arXiv Citegraph - build citation networks by crawling arXiv LaTeX sources
#[derive(Parser, Debug)]
#[command(name = "arxiv-citegraph")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build citation networks from arXiv papers", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Disable the on-disk record cache for this run
    #[arg(long, global = true, default_value_t = false)]
    no_cache: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Crawl citations breadth-first from one or more seed papers
    Crawl {
        /// Seed arXiv ids or URLs, comma-separated
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<String>,

        /// Maximum crawl depth (0 = seeds only)
        #[arg(long, default_value_t = 1)]
        max_depth: u32,

        /// Write the network JSON to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Fetch metadata for a single paper
    Fetch {
        /// arXiv id or URL
        #[arg(long)]
        id: String,
    },
    /// Download and unpack a paper's LaTeX source
    Source {
        /// arXiv id or URL
        #[arg(long)]
        id: String,
    },
    /// Extract the references from a paper's LaTeX source
    Refs {
        /// arXiv id or URL
        #[arg(long)]
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| format!("arxiv_citegraph={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    if cli.no_cache {
        config.store.enabled = false;
    }

    let client = Arc::new(ArxivClient::from_config(&config)?);

    match cli.command {
        Commands::Crawl {
            ids,
            max_depth,
            output,
        } => {
            let seeds = ids
                .iter()
                .map(|raw| ArxivId::parse(raw))
                .collect::<Result<Vec<_>, _>>()?;

            let builder = CitationGraphBuilder::from_config(Arc::clone(&client), &config.crawl);
            let network = builder.build(&seeds, max_depth).await?;

            let json = serde_json::to_string_pretty(&network)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    tracing::info!(path = %path.display(), "network written");
                }
                None => println!("{json}"),
            }
        }
        Commands::Fetch { id } => {
            let id = ArxivId::parse(&id)?;
            let record = client.fetch_metadata(&id).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Source { id } => {
            let id = ArxivId::parse(&id)?;
            let bundle = client.fetch_source(&id).await?;
            println!("{}", serde_json::to_string_pretty(&bundle)?);
        }
        Commands::Refs { id } => {
            let id = ArxivId::parse(&id)?;
            let bundle = client.fetch_source(&id).await?;
            let references = latex::parse(&bundle.latex);
            println!("{}", serde_json::to_string_pretty(&references)?);
        }
    }

    Ok(())
}
