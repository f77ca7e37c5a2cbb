use anyhow::{Context, bail};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tagtally_core::report::{ReportFormat, generate_report};
use tagtally_core::{BatchRunner, BatchSettings, ConcurrencyLimiter, FetchResult};
use tagtally_scanner::parse_target;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::server;

/// Install the global tracing subscriber. `RUST_LOG` wins over `quiet`.
pub fn init_tracing(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Expand a leading `~` in a user supplied path.
pub fn expand_path(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref())
}

/// Load URLs from either a hosts file or the `--url` arguments
pub fn load_urls_from_source(
    urls: Option<Vec<String>>,
    hosts_file: Option<&PathBuf>,
) -> anyhow::Result<Vec<String>> {
    if let Some(hosts_file_path) = hosts_file {
        load_urls_from_file(&expand_path(hosts_file_path))
    } else if let Some(urls) = urls
        && !urls.is_empty()
    {
        Ok(urls
            .iter()
            .map(|url| parse_url_line(url).unwrap_or_else(|| url.clone()))
            .collect())
    } else {
        bail!("Either --url or --hosts-file must be provided")
    }
}

/// Load URLs from a newline-delimited file. Blank lines and `#` comments are
/// skipped; lines that cannot be made into a URL are kept verbatim so the
/// batch reports them as invalid.
pub fn load_urls_from_file(path: &Path) -> anyhow::Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read hosts file {}", path.display()))?;

    let urls: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| parse_url_line(line).unwrap_or_else(|| line.to_string()))
        .collect();

    if urls.is_empty() {
        bail!("No URLs found in {}", path.display());
    }

    Ok(urls)
}

/// Parse a single line as an http(s) URL, trying to add http:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    if parse_target(line).is_ok() {
        return Some(line.to_string());
    }

    let with_scheme = format!("http://{}", line);
    if parse_target(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    warn!("'{}' is not a valid URL", line);
    None
}

/// Overrides taken from the command line.
#[derive(Debug, Default, Clone)]
pub struct SettingsOverrides {
    pub config: Option<PathBuf>,
    pub concurrency: Option<usize>,
    pub timeout_secs: Option<u64>,
    /// `Some(0)` disables the batch deadline.
    pub deadline_secs: Option<u64>,
}

impl SettingsOverrides {
    pub fn from_matches(args: &ArgMatches) -> Self {
        Self {
            config: args.get_one::<PathBuf>("config").cloned(),
            concurrency: args.get_one::<usize>("concurrency").copied(),
            timeout_secs: args.get_one::<u64>("timeout").copied(),
            deadline_secs: args.get_one::<u64>("deadline").copied(),
        }
    }
}

/// Build settings from an optional config file with command line overrides applied on top.
pub fn resolve_settings(overrides: &SettingsOverrides) -> anyhow::Result<BatchSettings> {
    let mut settings = match overrides.config {
        Some(ref path) => {
            let path = expand_path(path);
            BatchSettings::from_file(&path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?
        }
        None => BatchSettings::default(),
    };

    if let Some(concurrency) = overrides.concurrency {
        settings.concurrency = concurrency;
    }
    if let Some(timeout) = overrides.timeout_secs {
        settings.request_timeout_secs = timeout;
    }
    if let Some(deadline) = overrides.deadline_secs {
        settings.batch_deadline_secs = if deadline == 0 { None } else { Some(deadline) };
    }

    settings.validate()?;
    Ok(settings)
}

/// Cancel `token` on the first Ctrl-C.
pub fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping");
            token.cancel();
        }
    });
}

pub async fn handle_fetch(sub_matches: &ArgMatches, quiet: bool) -> anyhow::Result<()> {
    let settings = resolve_settings(&SettingsOverrides::from_matches(sub_matches))?;
    let urls = load_urls_from_source(
        sub_matches
            .get_many::<String>("url")
            .map(|values| values.cloned().collect()),
        sub_matches.get_one::<PathBuf>("hosts-file"),
    )?;
    let format = sub_matches
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text);

    if !quiet {
        println!("\n{} Fetching {} URL(s)", "→".blue(), urls.len());
        println!("Concurrency: {}", settings.concurrency);
        match settings.deadline() {
            Some(deadline) => println!("Deadline:    {}s\n", deadline.as_secs()),
            None => println!("Deadline:    none\n"),
        }
    }

    let limiter = ConcurrencyLimiter::new(settings.concurrency)?;
    let mut runner = BatchRunner::new(&settings, limiter)?;

    let progress_bar = if quiet {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting batch...");
        Some(pb)
    };

    if let Some(ref pb) = progress_bar {
        let pb = pb.clone();
        let done = Arc::new(AtomicUsize::new(0));
        runner = runner.with_result_callback(Arc::new(move |result: &FetchResult| {
            let count = done.fetch_add(1, Ordering::Relaxed) + 1;
            pb.set_message(format!("{} done, last: {}", count, result.url));
        }));
    }

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let batch = runner.run_with_cancel(&urls, cancel).await;

    if let Some(pb) = progress_bar {
        pb.finish_and_clear();
    }

    let summary = batch.summary();
    if !quiet {
        let status = if summary.failed + summary.timed_out + summary.cancelled == 0 {
            "✓".green().bold()
        } else {
            "!".yellow().bold()
        };
        println!(
            "{} {} of {} URLs fetched successfully\n",
            status, summary.succeeded, summary.total
        );
    }

    let report = generate_report(&batch, format)?;
    match sub_matches.get_one::<PathBuf>("output") {
        Some(path) => {
            let path = expand_path(path);
            fs::write(&path, report)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!("Report written to {}", path.display());
            if !quiet {
                println!("{} Report saved to {}", "✓".green().bold(), path.display());
            }
        }
        None => print!("{}", report),
    }

    Ok(())
}

pub async fn handle_serve(sub_matches: &ArgMatches) -> anyhow::Result<()> {
    let settings = resolve_settings(&SettingsOverrides::from_matches(sub_matches))?;
    let bind = sub_matches
        .get_one::<SocketAddr>("bind")
        .copied()
        .context("--bind is required")?;

    let limiter = ConcurrencyLimiter::new(settings.concurrency)?;
    let runner = BatchRunner::new(&settings, limiter.clone())?;

    let shutdown = CancellationToken::new();
    cancel_on_ctrl_c(shutdown.clone());

    info!(
        "Serving on {} with {} fetch slots",
        bind,
        limiter.capacity()
    );
    server::serve(bind, runner, shutdown).await?;

    limiter.close();
    info!("Server stopped");
    Ok(())
}
