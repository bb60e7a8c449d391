//! Pinch Crawler main entry point
//!
//! This is the command-line interface for the Pinch SEO crawl service.

use anyhow::{bail, Context};
use clap::Parser;
use pinch_crawler::audit::PageSpeedClient;
use pinch_crawler::config::{load_config_with_hash, Config};
use pinch_crawler::crawler::{build_http_client, HttpFetcher, PageProcessor, SessionRunner};
use pinch_crawler::quota::QuotaGuard;
use pinch_crawler::rules::CheckRegistry;
use pinch_crawler::server::CrawlServer;
use pinch_crawler::storage::{open_storage, share, AccountStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Pinch: a quota-aware SEO crawler
///
/// Pinch serves crawl sessions over WebSocket. Each session walks one site
/// within the account's plan limits and streams page findings live.
#[derive(Parser, Debug)]
#[command(name = "pinch-crawler")]
#[command(version = "1.0.0")]
#[command(about = "A quota-aware SEO crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the service settings without serving
    #[arg(long, conflicts_with_all = ["usage", "add_user"])]
    dry_run: bool,

    /// Show crawl usage for a user and exit
    #[arg(long, value_name = "USER_ID", conflicts_with_all = ["dry_run", "add_user"])]
    usage: Option<String>,

    /// Create a user (or change their plan) and exit
    #[arg(long, value_name = "USER_ID", requires = "plan")]
    add_user: Option<String>,

    /// Plan for --add-user
    #[arg(long, value_name = "PLAN", requires = "add_user")]
    plan: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if let Some(user_id) = cli.usage.as_deref() {
        handle_usage(&config, user_id)?;
    } else if let Some(user_id) = cli.add_user.as_deref() {
        handle_add_user(&config, user_id, cli.plan.as_deref().unwrap_or_default())?;
    } else {
        handle_serve(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("pinch_crawler=info,warn"),
            1 => EnvFilter::new("pinch_crawler=debug,info"),
            2 => EnvFilter::new("pinch_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows the settings
fn handle_dry_run(config: &Config) {
    println!("=== Pinch Crawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Concurrency: {}", config.crawler.concurrency);
    println!("  Page timeout: {}s", config.crawler.page_timeout_secs);
    println!("  Progress window: {}ms", config.crawler.progress_window_ms);
    match config.crawler.max_depth {
        Some(depth) => println!("  Max depth: {}", depth),
        None => println!("  Max depth: unbounded"),
    }

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nServer:");
    println!("  Bind address: {}", config.server.bind_address);
    println!("  Database: {}", config.storage.database_path);
    println!("  Stale lock after: {}s", config.quota.stale_lock_secs);

    println!(
        "\nPerformance audits: {}",
        if config.audit.enabled { "enabled" } else { "disabled" }
    );

    println!("\nPlans ({}):", config.plans.len());
    for (name, limits) in &config.plans {
        println!(
            "  - {}: {} websites/month, {} pages/website",
            name, limits.monthly_website_limit, limits.per_website_page_limit
        );
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --usage mode: prints a user's crawl usage
fn handle_usage(config: &Config, user_id: &str) -> anyhow::Result<()> {
    use pinch_crawler::output::{load_usage_report, print_usage_report};

    let store = open_storage(Path::new(&config.storage.database_path))?;
    let report = load_usage_report(&store, &config.plans, user_id)?;
    print_usage_report(&report);

    Ok(())
}

/// Handles the --add-user mode: creates a user or changes their plan
fn handle_add_user(config: &Config, user_id: &str, plan: &str) -> anyhow::Result<()> {
    if config.plan(plan).is_none() {
        bail!("Unknown plan '{}'; configured plans: {:?}", plan, config.plans.keys());
    }

    let mut store = open_storage(Path::new(&config.storage.database_path))?;
    store.upsert_user(user_id, plan)?;
    println!("✓ User {} is on plan {}", user_id, plan);

    Ok(())
}

/// Handles the main mode: serves crawl sessions until Ctrl-C
async fn handle_serve(config: Config) -> anyhow::Result<()> {
    let store = share(open_storage(Path::new(&config.storage.database_path))?);
    let instance_id = uuid::Uuid::new_v4().to_string();

    let guard = Arc::new(QuotaGuard::new(
        store.clone(),
        config.plans.clone(),
        instance_id.clone(),
        config.quota.stale_lock_secs,
    ));
    guard.recover_stale_locks()?;

    let client = build_http_client(&config.user_agent)?;
    let processor = PageProcessor::new(
        Arc::new(HttpFetcher::with_client(client.clone())),
        Arc::new(CheckRegistry::with_defaults()),
        Duration::from_secs(config.crawler.page_timeout_secs),
    );
    let audit = PageSpeedClient::from_config(client, &config.audit)?;

    let runner = SessionRunner::new(
        guard,
        store,
        processor,
        config.crawler.concurrency as usize,
    )
    .with_max_depth(config.crawler.max_depth)
    .with_audit(audit);

    let server = CrawlServer::new(
        Arc::new(runner),
        Duration::from_millis(config.crawler.progress_window_ms),
    );
    let shutdown = server.shutdown_token();

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!("Instance {} ready", instance_id);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl-C, stopping");
            shutdown.cancel();
        }
    });

    server.serve(listener).await?;
    tracing::info!("Server stopped");

    Ok(())
}
