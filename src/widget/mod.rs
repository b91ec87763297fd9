use crate::config::{FreshRssWidgetConfig, ReleasesWidgetConfig};
use crate::error::WidgetError;
use crate::freshrss::FreshRssClient;
use crate::http::HttpClient;
use crate::models::{FeedSubscription, Release};
use crate::radarr::RadarrClient;
use crate::sonarr::SonarrClient;
use chrono::Utc;
use tracing::warn;

/// Rendering capability the host supplies. The widgets hand over normalized
/// data and never touch template mechanics themselves.
pub trait Renderer {
    fn render_releases(&self, title: &str, collapse_after: i64, releases: &[Release]) -> String;
    fn render_feeds(&self, title: &str, collapse_after: i64, feeds: &[FeedSubscription]) -> String;
}

/// Collapse counts of 0 or below -1 fall back to 5; -1 means never collapse.
fn normalize_collapse_after(value: i64) -> i64 {
    if value == 0 || value < -1 {
        5
    } else {
        value
    }
}

/// The combined Sonarr/Radarr calendar widget. Sonarr releases always come
/// before Radarr releases; a failure in either service aborts the whole
/// refresh and keeps the previous list.
pub struct ArrReleasesWidget {
    title: String,
    collapse_after: i64,
    sonarr: Option<SonarrClient>,
    radarr: Option<RadarrClient>,
    releases: Vec<Release>,
}

impl ArrReleasesWidget {
    pub fn new(http: HttpClient, config: &ReleasesWidgetConfig) -> Self {
        let sonarr = config
            .sonarr
            .as_ref()
            .filter(|service| service.enable)
            .map(|service| SonarrClient::new(http.clone(), service.clone(), config.date_format));
        let radarr = config
            .radarr
            .as_ref()
            .filter(|service| service.enable)
            .map(|service| RadarrClient::new(http.clone(), service.clone(), config.date_format));

        Self {
            title: config
                .title
                .clone()
                .unwrap_or_else(|| "Releasing Today".to_string()),
            collapse_after: normalize_collapse_after(config.collapse_after),
            sonarr,
            radarr,
            releases: Vec::new(),
        }
    }

    pub async fn update(&mut self) -> Result<(), WidgetError> {
        let mut result = Vec::new();

        if let Some(sonarr) = &self.sonarr {
            match sonarr.fetch_releases(Utc::now()).await {
                Ok(releases) => result.extend(releases),
                Err(err) => {
                    warn!("failed to fetch releases from sonarr: {}", err);
                    return Err(err);
                }
            }
        }

        if let Some(radarr) = &self.radarr {
            match radarr.fetch_releases().await {
                Ok(releases) => result.extend(releases),
                Err(err) => {
                    warn!("failed to fetch releases from radarr: {}", err);
                    return Err(err);
                }
            }
        }

        self.releases = result;
        Ok(())
    }

    pub fn releases(&self) -> &[Release] {
        &self.releases
    }

    pub fn render(&self, renderer: &dyn Renderer) -> String {
        renderer.render_releases(&self.title, self.collapse_after, &self.releases)
    }
}

/// Lists the feeds a FreshRSS instance aggregates.
pub struct FreshRssWidget {
    title: String,
    collapse_after: i64,
    limit: usize,
    client: FreshRssClient,
    feeds: Vec<FeedSubscription>,
}

impl FreshRssWidget {
    pub fn new(http: HttpClient, config: &FreshRssWidgetConfig) -> Self {
        let limit = if config.limit <= 0 {
            25
        } else {
            config.limit as usize
        };

        Self {
            title: config
                .title
                .clone()
                .unwrap_or_else(|| "FreshRSS Feed".to_string()),
            collapse_after: normalize_collapse_after(config.collapse_after),
            limit,
            client: FreshRssClient::new(http, config.clone()),
            feeds: Vec::new(),
        }
    }

    pub async fn update(&mut self) -> Result<(), WidgetError> {
        match self.client.fetch_feeds().await {
            Ok(mut feeds) => {
                feeds.truncate(self.limit);
                self.feeds = feeds;
                Ok(())
            }
            Err(err) => {
                warn!("failed to fetch feeds from freshrss: {}", err);
                Err(err)
            }
        }
    }

    pub fn feeds(&self) -> &[FeedSubscription] {
        &self.feeds
    }

    pub fn render(&self, renderer: &dyn Renderer) -> String {
        renderer.render_feeds(&self.title, self.collapse_after, &self.feeds)
    }
}

/// Built-in renderer producing a plain HTML fragment. A host dashboard
/// with its own template engine supplies a different `Renderer` instead.
pub struct HtmlRenderer;

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

impl Renderer for HtmlRenderer {
    fn render_releases(&self, title: &str, collapse_after: i64, releases: &[Release]) -> String {
        let mut out = format!(
            "<section class=\"releases\" data-collapse-after=\"{}\">\n  <h2>{}</h2>\n  <ul>\n",
            collapse_after,
            escape_html(title)
        );
        for release in releases {
            let class = if release.grabbed {
                " class=\"grabbed\""
            } else {
                ""
            };
            let episode = match (&release.season_number, &release.episode_number) {
                (Some(season), Some(number)) => format!(
                    " <span class=\"episode\">S{}E{}</span>",
                    escape_html(season),
                    escape_html(number)
                ),
                _ => String::new(),
            };
            out.push_str(&format!(
                "    <li{}><img src=\"{}\" alt=\"\"><a href=\"{}\">{}</a>{} <time>{}</time> <p>{}</p></li>\n",
                class,
                escape_html(&release.image_cover_url),
                escape_html(&release.url),
                escape_html(&release.title),
                episode,
                escape_html(&release.air_date),
                escape_html(&release.subtitle),
            ));
        }
        out.push_str("  </ul>\n</section>\n");
        out
    }

    fn render_feeds(&self, title: &str, collapse_after: i64, feeds: &[FeedSubscription]) -> String {
        let mut out = format!(
            "<section class=\"feeds\" data-collapse-after=\"{}\">\n  <h2>{}</h2>\n  <ul>\n",
            collapse_after,
            escape_html(title)
        );
        for feed in feeds {
            out.push_str(&format!(
                "    <li><a href=\"{}\">{}</a></li>\n",
                escape_html(&feed.site_url),
                escape_html(&feed.title),
            ));
        }
        out.push_str("  </ul>\n</section>\n");
        out
    }
}
