//! PAGETRACK CLI
//!
//! Command-line interface for fetching pages through the access-counting cache.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pagetrack_core::{AccessKey, Content, Store};
use pagetrack_fetch::{FetchConfig, HttpFetcher};
use pagetrack_store::MemoryStore;
use pagetrack_tracker::{CacheStatus, CachingInterceptor, TrackerConfig};

type Tracker = CachingInterceptor<HttpFetcher, Arc<dyn Store>>;

/// PAGETRACK - access-counting, TTL-cached page fetcher
#[derive(Parser)]
#[command(name = "pagetrack")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Redis URL; the in-process store is used when absent
    #[arg(long, global = true, env = "REDIS_URL")]
    redis_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a page through the cache
    Get {
        /// Page URL
        url: String,
        /// Fetch the page this many times
        #[arg(short, long, default_value = "1")]
        repeat: u32,
        /// Cache lifetime in seconds
        #[arg(long)]
        ttl: Option<u64>,
        /// Return bodies of non-2xx responses instead of failing
        #[arg(long)]
        lenient: bool,
        /// Give up on a fetch after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Do not print the page body
        #[arg(short, long)]
        quiet: bool,
        /// Print interceptor statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show how many times a page has been requested
    Count {
        /// Page URL
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "pagetrack=debug,info"
    } else {
        "pagetrack=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Get {
            url,
            repeat,
            ttl,
            lenient,
            timeout,
            quiet,
            json,
        } => {
            let opts = GetOptions {
                repeat,
                ttl,
                lenient,
                timeout,
                quiet,
                json,
            };
            cmd_get(&url, cli.redis_url.as_deref(), opts).await
        }
        Commands::Count { url } => cmd_count(&url, cli.redis_url.as_deref()).await,
    }
}

struct GetOptions {
    repeat: u32,
    ttl: Option<u64>,
    lenient: bool,
    timeout: Option<u64>,
    quiet: bool,
    json: bool,
}

/// Fetch a page, possibly several times
async fn cmd_get(url: &str, redis_url: Option<&str>, opts: GetOptions) -> Result<()> {
    let key = AccessKey::new(url).context("Invalid URL")?;
    if opts.repeat == 0 {
        bail!("--repeat must be at least 1");
    }

    let mut tracker_config = TrackerConfig::from_env().context("Invalid tracker configuration")?;
    if let Some(ttl) = opts.ttl {
        tracker_config = tracker_config.with_ttl_seconds(ttl);
    }
    let mut fetch_config = FetchConfig::from_env().context("Invalid fetch configuration")?;
    if opts.lenient {
        fetch_config = fetch_config.lenient();
    }

    let tracker = build_tracker(redis_url, tracker_config, fetch_config).await?;
    println!("{} {}", "🌐 Fetching:".cyan().bold(), url);

    let mut last = None;
    for attempt in 1..=opts.repeat {
        let spinner = spinner(format!("request {}/{}", attempt, opts.repeat))?;
        let start = Instant::now();

        let result = match opts.timeout {
            Some(secs) => {
                tracker
                    .fetch_with_outcome_timeout(&key, Duration::from_secs(secs))
                    .await
            }
            None => tracker.fetch_with_outcome_until(&key, ctrl_c()).await,
        };
        spinner.finish_and_clear();

        let outcome = result.with_context(|| format!("Request {} failed", attempt))?;
        println!(
            "   {} #{} {} bytes in {:?} {}",
            status_label(outcome.status),
            attempt,
            outcome.content.len(),
            start.elapsed(),
            format!("(count={})", outcome.access_count).dimmed(),
        );
        last = Some(outcome.content);
    }

    if let Some(content) = last.filter(|_| !opts.quiet) {
        print_body(&content);
    }

    let stats = tracker.stats();
    if opts.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("\n{}", "📈 Stats:".green().bold());
        println!("   {} {}", "Requests:".dimmed(), stats.requests);
        println!("   {} {} / {}", "Hits / misses:".dimmed(), stats.hits, stats.misses);
        println!("   {} {:.0}%", "Hit ratio:".dimmed(), stats.hit_ratio() * 100.0);
    }

    Ok(())
}

/// Show the access count of a page
async fn cmd_count(url: &str, redis_url: Option<&str>) -> Result<()> {
    let key = AccessKey::new(url).context("Invalid URL")?;
    let tracker_config = TrackerConfig::from_env().context("Invalid tracker configuration")?;
    let tracker = build_tracker(redis_url, tracker_config, FetchConfig::default()).await?;

    let count = tracker.access_count(&key).await?;
    let cached = tracker.cached(&key).await?;

    println!("{} {}", "🔢 Access count:".cyan().bold(), url);
    println!("   {} {}", "Count:".dimmed(), count);
    match cached {
        Some(content) => println!("   {} yes ({} bytes)", "Cached:".dimmed(), content.len()),
        None => println!("   {} no", "Cached:".dimmed()),
    }
    if redis_url.is_none() {
        println!(
            "\n{}",
            "ℹ️  Using the in-process store; counts do not persist between runs (set --redis-url)."
                .yellow()
        );
    }

    Ok(())
}

async fn build_tracker(
    redis_url: Option<&str>,
    tracker_config: TrackerConfig,
    fetch_config: FetchConfig,
) -> Result<Tracker> {
    let store = open_store(redis_url).await?;
    let fetcher = HttpFetcher::with_config(fetch_config).context("Failed to create HTTP fetcher")?;
    debug!(?tracker_config, "Building interceptor");
    CachingInterceptor::with_config(fetcher, store, tracker_config).context("Invalid tracker configuration")
}

#[cfg(feature = "redis")]
async fn open_store(redis_url: Option<&str>) -> Result<Arc<dyn Store>> {
    match redis_url {
        Some(url) => {
            let store = pagetrack_store::RedisStore::connect(url)
                .await
                .context("Failed to connect to Redis")?;
            store.ping().await.context("Redis did not answer PING")?;
            Ok(Arc::new(store))
        }
        None => Ok(Arc::new(MemoryStore::new())),
    }
}

#[cfg(not(feature = "redis"))]
async fn open_store(redis_url: Option<&str>) -> Result<Arc<dyn Store>> {
    if redis_url.is_some() {
        bail!("this build has no Redis support; rebuild with `--features redis`");
    }
    Ok(Arc::new(MemoryStore::new()))
}

fn spinner(message: String) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("   {spinner:.green} {msg}")?);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(80));
    Ok(pb)
}

async fn ctrl_c() {
    // fall back to never cancelling when the signal handler is unavailable
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

fn status_label(status: CacheStatus) -> ColoredString {
    match status {
        CacheStatus::Hit => "HIT ".green().bold(),
        CacheStatus::Miss => "MISS".yellow().bold(),
    }
}

fn print_body(content: &Content) {
    println!("\n{}", "📄 Body:".yellow().bold());
    match content.as_str() {
        Ok(text) => println!("{}", text),
        Err(_) => println!("   <{} bytes of binary content>", content.len()),
    }
}
