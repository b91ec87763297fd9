use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A calendar entry normalized for display, regardless of which service
/// produced it. Construction happens after window filtering, never before.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Release {
    pub title: String,
    pub subtitle: String,
    pub image_cover_url: String,
    pub air_date: String,
    pub season_number: Option<String>,
    pub episode_number: Option<String>,
    pub grabbed: bool,
    pub url: String,
}

/// Cover art entry as both Sonarr and Radarr return it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverImage {
    #[serde(default)]
    pub cover_type: String,
    #[serde(default)]
    pub remote_url: String,
}

/// First poster image, or an empty URL when the upstream carries none.
pub fn poster_url(images: &[CoverImage]) -> String {
    images
        .iter()
        .find(|image| image.cover_type == "poster")
        .map(|image| image.remote_url.clone())
        .unwrap_or_default()
}

/// A feed subscription listed by FreshRSS. Handing each feed to an RSS
/// item fetcher is the host's job, not ours.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FeedSubscription {
    pub title: String,
    pub url: String,
    pub site_url: String,
    pub last_updated_on_time: i64,
}

/// Display format for release dates.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum DateStyle {
    #[default]
    Dash,
    Slash,
}

impl DateStyle {
    pub fn format(self, date: DateTime<FixedOffset>) -> String {
        let pattern = match self {
            DateStyle::Dash => "%m-%d %H:%M",
            DateStyle::Slash => "%m/%d %H:%M",
        };
        date.format(pattern).to_string()
    }
}

/// Zero-pad season/episode numbers to at least two digits. Wider values
/// pass through unchanged.
pub fn pad_number(value: i64) -> String {
    format!("{:02}", value)
}

/// Overview text shown under the title; empty upstream text becomes "TBA".
pub fn display_overview(overview: &str) -> String {
    if overview.is_empty() {
        "TBA".to_string()
    } else {
        overview.to_string()
    }
}

/// Deep link back into the source service. The external URL wins when set,
/// and a trailing slash on either base is stripped.
pub fn deep_link(external_url: &str, internal_url: &str, path: &str, slug: &str) -> String {
    let base = if external_url.is_empty() {
        internal_url
    } else {
        external_url
    };
    format!("{}/{}/{}", base.trim_end_matches('/'), path, slug)
}
