//! Resolve the media of a post in a saved HTML page.
//!
//! Prints the `ExtractionResult` as JSON on stdout; logs go to stderr.

mod config;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use media_resolver::lookups::{HttpMediaLookup, NoopMediaLookup};
use media_resolver::{
    ExtractionOptions, ExtractionResult, MediaLookup, MediaResolver, PageSnapshot, ResolverConfig,
    TweetContextResolver,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LookupConfig;

#[derive(Parser)]
#[command(name = "resolve-media")]
#[command(about = "Resolve the media list and clicked item of a post")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct PageArgs {
    /// Saved HTML page
    html: PathBuf,

    /// CSS selector of the clicked element
    #[arg(long, short)]
    selector: String,

    /// URL the page was loaded from
    #[arg(long)]
    location: Option<String>,

    /// Levels to climb when looking for the author link
    #[arg(long, default_value_t = 10)]
    username_depth: usize,

    /// Also read status links of the enclosing post
    #[arg(long)]
    scan_post_container: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full extraction
    Extract {
        #[command(flatten)]
        page: PageArgs,

        /// Media lookup base URL (env: MEDIA_LOOKUP_URL)
        #[arg(long)]
        lookup_url: Option<String>,

        /// Bearer token for the lookup (env: MEDIA_LOOKUP_TOKEN)
        #[arg(long)]
        token: Option<String>,

        /// Per-attempt lookup deadline (env: MEDIA_LOOKUP_TIMEOUT_MS)
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Lookup retries after the first attempt (env: MEDIA_LOOKUP_MAX_RETRIES)
        #[arg(long)]
        max_retries: Option<u32>,

        /// Treat the selected element as the post container
        #[arg(long)]
        container: bool,

        /// Print a readable summary to stderr as well
        #[arg(long)]
        summary: bool,
    },

    /// Only resolve the post identity of the clicked element
    Context {
        #[command(flatten)]
        page: PageArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,media_resolver=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            page,
            lookup_url,
            token,
            timeout_ms,
            max_retries,
            container,
            summary,
        } => {
            let flags = LookupConfig {
                url: lookup_url,
                token,
                timeout_ms,
                max_retries,
            };
            let lookup = LookupConfig::from_env()
                .context("Failed to load configuration")?
                .merge(flags);

            let mut options = ExtractionOptions::default();
            if let Some(timeout_ms) = lookup.timeout_ms {
                options = options.with_timeout_ms(timeout_ms);
            }
            if let Some(max_retries) = lookup.max_retries {
                options = options.with_max_retries(max_retries);
            }

            let snapshot = load_page(&page)?;
            let resolver_config = resolver_config(&page);

            let result = match lookup.url.as_deref() {
                Some(url) => {
                    let mut client = HttpMediaLookup::new(url)
                        .context("Invalid media lookup URL")?
                        .with_request_timeout(Duration::from_millis(options.timeout_ms));
                    if let Some(token) = lookup.token {
                        client = client.with_token(token);
                    }
                    let resolver = MediaResolver::with_config(client, resolver_config);
                    run(&resolver, &snapshot, &page.selector, container, options).await?
                }
                None => {
                    tracing::info!("No MEDIA_LOOKUP_URL configured, DOM scan only");
                    let resolver = MediaResolver::with_config(NoopMediaLookup, resolver_config);
                    run(&resolver, &snapshot, &page.selector, container, options).await?
                }
            };

            if summary {
                print_summary(&result);
            }
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::Context { page } => {
            let snapshot = load_page(&page)?;
            let clicked = snapshot
                .select_first(&page.selector)?
                .with_context(|| format!("No element matches `{}`", page.selector))?;

            let context = TweetContextResolver::new(resolver_config(&page)).resolve(clicked, snapshot.location());
            match context {
                Some(context) => println!("{}", serde_json::to_string_pretty(&context)?),
                None => bail!("No tweet id found on the selected element"),
            }
        }
    }

    Ok(())
}

async fn run<L: MediaLookup>(
    resolver: &MediaResolver<L>,
    page: &PageSnapshot,
    selector: &str,
    as_container: bool,
    options: ExtractionOptions,
) -> Result<ExtractionResult> {
    let selected = page.select_first(selector)?;

    if as_container {
        let container = selected.with_context(|| format!("No element matches `{}`", selector))?;
        return Ok(resolver.extract_from_container(page, container, options).await);
    }

    // A selector that matches nothing is passed through as a missing element
    Ok(resolver.extract(page, selected, options).await)
}

fn load_page(args: &PageArgs) -> Result<PageSnapshot> {
    let html = std::fs::read_to_string(&args.html)
        .with_context(|| format!("Failed to read {}", args.html.display()))?;
    PageSnapshot::parse(&html, args.location.as_deref()).context("Failed to parse page")
}

fn resolver_config(args: &PageArgs) -> ResolverConfig {
    ResolverConfig::new()
        .with_username_search_depth(args.username_depth)
        .with_post_container_scan(args.scan_post_container)
}

fn print_summary(result: &ExtractionResult) {
    let status = if result.success {
        "found".bright_green().bold()
    } else {
        "nothing found".bright_red().bold()
    };
    eprintln!(
        "{} {} item(s) via {}",
        status,
        result.len(),
        result.source_type().to_string().bright_cyan()
    );

    for (i, item) in result.media_items.iter().enumerate() {
        let marker = if i == result.clicked_index { "▶".bright_yellow() } else { " ".normal() };
        eprintln!("{} {:>2} {:<5} {}", marker, i, item.media_type.as_str(), item.url);
    }

    for error in &result.metadata.errors {
        eprintln!("{} {}", "!".bright_red(), error.message);
    }
}
