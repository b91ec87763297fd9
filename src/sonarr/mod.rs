use crate::config::SonarrConfig;
use crate::error::WidgetError;
use crate::http::HttpClient;
use crate::models::{deep_link, display_overview, pad_number, poster_url, CoverImage, DateStyle, Release};
use crate::window::{DisplayZone, ReleaseWindow};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use tracing::{info, instrument};
use url::Url;

pub struct SonarrClient {
    http: HttpClient,
    config: SonarrConfig,
    date_style: DateStyle,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarEpisode {
    #[serde(default)]
    has_file: bool,
    #[serde(default)]
    series_id: i64,
    season_number: i64,
    episode_number: i64,
    /// The calendar item's own title is the episode title.
    #[serde(rename = "title", default)]
    episode_title: String,
    #[serde(default)]
    overview: String,
    air_date_utc: DateTime<Utc>,
    #[serde(default)]
    series: CalendarSeries,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarSeries {
    #[serde(default)]
    title: String,
    #[serde(default)]
    images: Vec<CoverImage>,
    #[serde(default)]
    title_slug: String,
}

impl SonarrClient {
    pub fn new(http: HttpClient, config: SonarrConfig, date_style: DateStyle) -> Self {
        Self {
            http,
            config,
            date_style,
        }
    }

    fn validate(&self) -> Result<(), WidgetError> {
        if self.config.internal_url.is_empty() {
            return Err(WidgetError::config("missing sonarr internal-url config"));
        }
        if self.config.api_key.is_empty() {
            return Err(WidgetError::config("missing sonarr apikey config"));
        }
        Url::parse(&self.config.internal_url).map_err(|_| {
            WidgetError::config(format!(
                "invalid sonarr internal-url: {}",
                self.config.internal_url
            ))
        })?;
        Ok(())
    }

    #[instrument(skip(self, now))]
    pub async fn fetch_releases(&self, now: DateTime<Utc>) -> Result<Vec<Release>, WidgetError> {
        self.validate()?;

        let zone = DisplayZone::resolve(&self.config.timezone)?;
        let window = ReleaseWindow::compute(
            now,
            zone,
            self.config.day_offset,
            self.config.from_previous_days,
        )?;

        let url = self.calendar_url(&window);
        let body = self
            .http
            .get_with_api_key(&url, self.config.api_key.as_str(), self.config.skip_ssl)
            .await?;

        let episodes: Vec<CalendarEpisode> = serde_json::from_str(&body)?;
        info!("Fetched {} calendar entries from Sonarr", episodes.len());

        Ok(self.normalize(episodes, zone, &window))
    }

    fn calendar_url(&self, window: &ReleaseWindow) -> String {
        // The query range is wider than the acceptance window; entries the
        // upstream returns outside the local day are dropped after decode.
        let mut url = format!(
            "{}/api/v3/calendar?includeSeries=true&start={}&end={}",
            self.config.internal_url.trim_end_matches('/'),
            urlencoding::encode(&window.query_start.to_rfc3339_opts(SecondsFormat::Secs, true)),
            urlencoding::encode(&window.query_end.to_rfc3339_opts(SecondsFormat::Secs, true)),
        );
        if !self.config.tags.is_empty() {
            url.push_str("&tags=");
            url.push_str(&urlencoding::encode(&self.config.tags));
        }
        url
    }

    fn normalize(
        &self,
        episodes: Vec<CalendarEpisode>,
        zone: DisplayZone,
        window: &ReleaseWindow,
    ) -> Vec<Release> {
        let mut releases = Vec::new();
        for episode in episodes {
            if !window.contains(episode.air_date_utc) {
                continue;
            }

            let image_cover_url = if self.config.internal_insecure_thumbnail {
                // exposes the API key in the rendered page
                format!(
                    "{}/api/v3/mediacover/{}/poster-500.jpg?apikey={}",
                    self.config.external_url.trim_end_matches('/'),
                    episode.series_id,
                    self.config.api_key.as_str()
                )
            } else {
                poster_url(&episode.series.images)
            };

            let subtitle = if episode.episode_title.is_empty() {
                display_overview(&episode.overview)
            } else {
                episode.episode_title
            };

            releases.push(Release {
                title: episode.series.title,
                subtitle,
                image_cover_url,
                air_date: self.date_style.format(zone.to_zone(episode.air_date_utc)),
                season_number: Some(pad_number(episode.season_number)),
                episode_number: Some(pad_number(episode.episode_number)),
                grabbed: episode.has_file,
                url: deep_link(
                    &self.config.external_url,
                    &self.config.internal_url,
                    "series",
                    &episode.series.title_slug,
                ),
            });
        }
        releases
    }
}
