//! crawl-url main entry point
//!
//! This is the command-line interface for discovering the URLs of a site.

use anyhow::{bail, Context};
use clap::Parser;
use crawl_url::config::{load_config, Config};
use crawl_url::output::{generate_filename, write_result, OutputFormat};
use crawl_url::url::{normalize_url, suggest_url_fix};
use crawl_url::{Mode, ProgressCallback, RunOptions, Runner};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// crawl-url: discover the URLs of a website
///
/// Reads the site's sitemaps when it has them and falls back to a polite
/// breadth-first crawl that honors robots.txt and a per-site delay.
#[derive(Parser, Debug)]
#[command(name = "crawl-url")]
#[command(version)]
#[command(about = "Discover the URLs of a website", long_about = None)]
struct Cli {
    /// Site URL, sitemap URL, or path to a local sitemap file
    #[arg(value_name = "URL")]
    url: String,

    /// Discovery strategy: auto, sitemap or crawl
    #[arg(short, long, default_value = "auto")]
    mode: Mode,

    /// Maximum link depth when crawling (1-10)
    #[arg(short, long)]
    depth: Option<u32>,

    /// Seconds to wait between requests to the same site
    #[arg(long)]
    delay: Option<f64>,

    /// Only keep URLs starting with this prefix
    #[arg(short, long)]
    filter: Option<String>,

    /// Stop after collecting this many URLs
    #[arg(long)]
    max_urls: Option<usize>,

    /// Output file (defaults to a name derived from the domain)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format: txt, json or csv
    #[arg(long, default_value = "txt")]
    format: OutputFormat,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };

    check_location(&cli.url, cli.mode)?;

    let options = RunOptions {
        url: cli.url.clone(),
        mode: cli.mode,
        max_depth: cli.depth,
        delay: cli.delay,
        filter: cli.filter.clone(),
        max_urls: cli.max_urls,
    };
    options.validate().context("Invalid arguments")?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing with the URLs collected so far");
            interrupt.cancel();
        }
    });

    let mut runner = Runner::new(config).with_cancel(cancel);
    if !cli.quiet {
        runner = runner.with_progress(progress_printer());
    }

    let result = runner.execute(&options).await;
    if !cli.quiet {
        eprintln!();
    }

    if result.count > 0 {
        let output_path = cli
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(generate_filename(&cli.url, cli.format)));
        write_result(&output_path, &result, cli.format, &cli.url)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        if !cli.quiet {
            println!("Saved {} URLs to {}", result.count, output_path.display());
        }
    }

    for error in &result.errors {
        tracing::warn!("{}", error);
    }

    if result.success {
        if !cli.quiet {
            println!("✓ {}", result.message);
        }
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("✗ {}", result.message);
        Ok(ExitCode::FAILURE)
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("crawl_url=info,warn"),
            1 => EnvFilter::new("crawl_url=debug,info"),
            2 => EnvFilter::new("crawl_url=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Rejects start locations that can never work, suggesting a fix when possible
fn check_location(location: &str, mode: Mode) -> anyhow::Result<()> {
    let is_local_file = mode != Mode::Crawl && Path::new(location).is_file();
    if is_local_file || normalize_url(location, None).is_ok() {
        return Ok(());
    }

    match suggest_url_fix(location) {
        Some(fix) => bail!("Invalid URL '{}'. Did you mean '{}'?", location, fix),
        None => bail!(
            "Invalid URL '{}'. Use an http(s) URL such as https://example.com",
            location
        ),
    }
}

/// Progress line on stderr, rewritten in place
fn progress_printer() -> ProgressCallback {
    Arc::new(|message: &str, found: usize| {
        let mut stderr = std::io::stderr().lock();
        let _ = write!(stderr, "\r\x1b[2K{} ({} URLs found)", message, found);
        let _ = stderr.flush();
    })
}
