//! `mangafire` command-line front-end.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use mangafire_agent::config::{normalize_language, AgentConfig, SUPPORTED_LANGUAGES};
use mangafire_agent::models::{PaginationOptions, SeriesRef};
use mangafire_agent::MangaFireAgent;

#[derive(Parser)]
#[command(name = "mangafire")]
#[command(about = "Browser-driven catalog crawler for mangafire.to")]
#[command(version)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true, env = "MANGAFIRE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Chapter translation language
    #[arg(long, global = true)]
    language: Option<String>,

    /// Delay between page reveal steps, in milliseconds
    #[arg(long, global = true)]
    delay_ms: Option<u64>,

    /// IANA timezone the browser emulates
    #[arg(long, global = true)]
    timezone: Option<String>,

    /// Show the browser window
    #[arg(long, global = true)]
    headed: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Print the site icon URL
    Favicon,

    /// Search the catalog
    Search {
        query: String,
        /// 1-based result page
        #[arg(short, long, default_value = "1")]
        page: u32,
    },

    /// Show series details
    Info { id: String },

    /// List a series' chapters
    Chapters { id: String },

    /// Collect the page images of one chapter
    Pages {
        /// Series ID
        id: String,
        /// Chapter ID (defaults to the first listed chapter)
        #[arg(short, long)]
        chapter: Option<String>,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = build_config(&cli)?;
    let agent = MangaFireAgent::new(config);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{} Interrupted, cancelling", style("!").yellow());
            on_interrupt.cancel();
        }
    });

    let result = execute(&agent, cli.command, &cancel).await;
    agent.dispose_async().await;
    result
}

fn build_config(cli: &Cli) -> anyhow::Result<AgentConfig> {
    let mut config = match cli.config {
        Some(ref path) => AgentConfig::load(path)?,
        None => AgentConfig::default(),
    }
    .with_env_overrides();

    if let Some(ref language) = cli.language {
        config.language = normalize_language(language).ok_or_else(|| {
            anyhow::anyhow!(
                "Unsupported language '{}' (expected one of: {})",
                language,
                SUPPORTED_LANGUAGES.join(", ")
            )
        })?;
    }
    if let Some(delay_ms) = cli.delay_ms {
        config.page_loading_delay_ms = delay_ms;
    }
    if let Some(ref timezone) = cli.timezone {
        config.timezone = timezone.clone();
    }
    if cli.headed {
        config.browser.headless = false;
    }

    Ok(config)
}

async fn execute(
    agent: &MangaFireAgent,
    command: Commands,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    match command {
        Commands::Favicon => {
            println!("{}", agent.get_favicon());
        }
        Commands::Search { query, page } => {
            let pagination = PaginationOptions::with_token(page.to_string());
            let results = agent.search(&query, &pagination, cancel).await?;
            eprintln!(
                "{} {} results on page {}",
                style("✓").green(),
                results.len(),
                page
            );
            print_json(&results)?;
        }
        Commands::Info { id } => {
            let detail = agent.get_by_id(&id, cancel).await?;
            print_json(&detail)?;
        }
        Commands::Chapters { id } => {
            let chapters = agent
                .get_chapters(&SeriesRef::new(id), &PaginationOptions::default(), cancel)
                .await?;
            eprintln!("{} {} chapters", style("✓").green(), chapters.len());
            print_json(&chapters)?;
        }
        Commands::Pages { id, chapter } => {
            let chapters = agent
                .get_chapters(&SeriesRef::new(&id), &PaginationOptions::default(), cancel)
                .await?;
            let selected = match chapter {
                Some(ref chapter_id) => chapters.data.iter().find(|c| &c.id == chapter_id),
                None => chapters.data.first(),
            };
            let Some(selected) = selected else {
                anyhow::bail!(
                    "Chapter {} not found for series {}",
                    chapter.as_deref().unwrap_or("(any)"),
                    id
                );
            };

            eprintln!(
                "{} Revealing pages of {}",
                style("→").cyan(),
                selected.uri
            );
            let pages = agent.get_chapter_pages(selected, cancel).await?;
            eprintln!("{} {} pages", style("✓").green(), pages.len());
            print_json(&pages)?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
