mod config;
mod error;
mod freshrss;
mod http;
mod models;
mod radarr;
mod sonarr;
mod widget;
mod window;

use anyhow::Result;
use clap::Parser;
use config::{Configuration, FreshRssWidgetConfig, ReleasesWidgetConfig};
use http::HttpClient;
use std::path::{Path, PathBuf};
use tokio::time::interval;
use tracing::{error, info, warn};
use widget::{ArrReleasesWidget, FreshRssWidget, HtmlRenderer};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Directory rendered HTML fragments are written to
    #[arg(short, long, default_value = "fragments")]
    out_dir: PathBuf,

    /// Refresh every configured widget once and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(&cli.log_level)
        .init();

    info!("Starting dasharr v0.1.0");

    // Load configuration
    let config = Configuration::from_file(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config);

    std::fs::create_dir_all(&cli.out_dir)?;

    // Initialize HTTP client
    let http_client = HttpClient::new();

    if cli.once {
        if let Some(releases_config) = &config.releases {
            let mut widget = ArrReleasesWidget::new(http_client.clone(), releases_config);
            refresh_releases(&mut widget, &cli.out_dir).await;
        }
        if let Some(freshrss_config) = &config.freshrss {
            let mut widget = FreshRssWidget::new(http_client.clone(), freshrss_config);
            refresh_feeds(&mut widget, &cli.out_dir).await;
        }
        return Ok(());
    }

    // Start one refresh loop per configured widget
    let mut refresh_tasks = Vec::new();
    if let Some(releases_config) = config.releases.clone() {
        refresh_tasks.push(tokio::spawn(releases_loop(
            releases_config,
            http_client.clone(),
            cli.out_dir.clone(),
        )));
    }
    if let Some(freshrss_config) = config.freshrss.clone() {
        refresh_tasks.push(tokio::spawn(freshrss_loop(
            freshrss_config,
            http_client.clone(),
            cli.out_dir.clone(),
        )));
    }

    if refresh_tasks.is_empty() {
        warn!("No widgets configured, nothing to do");
        return Ok(());
    }

    // Wait for all loops (they run forever)
    for task in refresh_tasks {
        task.await?;
    }

    Ok(())
}

async fn releases_loop(config: ReleasesWidgetConfig, http_client: HttpClient, out_dir: PathBuf) {
    let mut widget = ArrReleasesWidget::new(http_client, &config);
    let mut interval = interval(config.refresh_interval());

    loop {
        interval.tick().await;
        refresh_releases(&mut widget, &out_dir).await;
    }
}

async fn freshrss_loop(config: FreshRssWidgetConfig, http_client: HttpClient, out_dir: PathBuf) {
    let mut widget = FreshRssWidget::new(http_client, &config);
    let mut interval = interval(config.refresh_interval());

    loop {
        interval.tick().await;
        refresh_feeds(&mut widget, &out_dir).await;
    }
}

async fn refresh_releases(widget: &mut ArrReleasesWidget, out_dir: &Path) {
    match widget.update().await {
        Ok(()) => {
            info!("Refreshed {} releases", widget.releases().len());
            write_fragment(out_dir, "releases.html", &widget.render(&HtmlRenderer));
        }
        // The previous fragment stays in place
        Err(err) => error!("Releases refresh failed: {}", err),
    }
}

async fn refresh_feeds(widget: &mut FreshRssWidget, out_dir: &Path) {
    match widget.update().await {
        Ok(()) => {
            info!("Refreshed {} feeds", widget.feeds().len());
            write_fragment(out_dir, "freshrss.html", &widget.render(&HtmlRenderer));
        }
        Err(err) => error!("FreshRSS refresh failed: {}", err),
    }
}

fn write_fragment(out_dir: &Path, name: &str, fragment: &str) {
    let path = out_dir.join(name);
    if let Err(err) = std::fs::write(&path, fragment) {
        error!("Failed to write {}: {}", path.display(), err);
    }
}
