use crate::config::RadarrConfig;
use crate::error::WidgetError;
use crate::http::HttpClient;
use crate::models::{deep_link, display_overview, poster_url, CoverImage, DateStyle, Release};
use crate::window::DisplayZone;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Deserialize;
use tracing::{info, instrument};
use url::Url;

pub struct RadarrClient {
    http: HttpClient,
    config: RadarrConfig,
    date_style: DateStyle,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarMovie {
    #[serde(default)]
    has_file: bool,
    #[serde(default)]
    title: String,
    #[serde(default)]
    overview: String,
    #[serde(default)]
    images: Vec<CoverImage>,
    #[serde(default)]
    release_date: String,
    #[serde(default)]
    in_cinemas: String,
    #[serde(default)]
    physical_release: String,
    #[serde(default)]
    digital_release: String,
    #[serde(default)]
    title_slug: String,
}

impl CalendarMovie {
    /// First non-empty date field, with the label shown when the plain
    /// release date itself is absent.
    fn pick_release_date(&self) -> (&str, &'static str) {
        if !self.release_date.is_empty() {
            (&self.release_date, "")
        } else if !self.in_cinemas.is_empty() {
            (&self.in_cinemas, "Cinemas: ")
        } else if !self.physical_release.is_empty() {
            (&self.physical_release, "Physical: ")
        } else {
            (&self.digital_release, "Digital: ")
        }
    }
}

/// Radarr emits RFC 3339 timestamps or plain dates depending on field and
/// version; plain dates are taken as midnight UTC.
fn parse_release_date(value: &str) -> Result<DateTime<Utc>, WidgetError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|date| Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
        .map_err(|source| WidgetError::Date {
            value: value.to_string(),
            source,
        })
}

impl RadarrClient {
    pub fn new(http: HttpClient, config: RadarrConfig, date_style: DateStyle) -> Self {
        Self {
            http,
            config,
            date_style,
        }
    }

    fn validate(&self) -> Result<(), WidgetError> {
        if self.config.internal_url.is_empty() {
            return Err(WidgetError::config("missing radarr internal-url config"));
        }
        if self.config.api_key.is_empty() {
            return Err(WidgetError::config("missing radarr apikey config"));
        }
        Url::parse(&self.config.internal_url).map_err(|_| {
            WidgetError::config(format!(
                "invalid radarr internal-url: {}",
                self.config.internal_url
            ))
        })?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn fetch_releases(&self) -> Result<Vec<Release>, WidgetError> {
        self.validate()?;

        let zone = DisplayZone::resolve(&self.config.timezone)?;

        let url = self.calendar_url();
        let body = self
            .http
            .get_with_api_key(&url, self.config.api_key.as_str(), self.config.skip_ssl)
            .await?;

        let movies: Vec<CalendarMovie> = serde_json::from_str(&body)?;
        info!("Fetched {} calendar entries from Radarr", movies.len());

        self.normalize(movies, zone)
    }

    fn calendar_url(&self) -> String {
        let mut url = format!(
            "{}/api/v3/calendar",
            self.config.internal_url.trim_end_matches('/')
        );
        if !self.config.tags.is_empty() {
            url.push_str("?tags=");
            url.push_str(&urlencoding::encode(&self.config.tags));
        }
        url
    }

    fn normalize(
        &self,
        movies: Vec<CalendarMovie>,
        zone: DisplayZone,
    ) -> Result<Vec<Release>, WidgetError> {
        let mut releases = Vec::new();
        for movie in movies {
            let (date_value, label) = movie.pick_release_date();
            let instant = parse_release_date(date_value)?;
            let air_date = format!("{}{}", label, self.date_style.format(zone.to_zone(instant)));

            releases.push(Release {
                title: movie.title,
                subtitle: display_overview(&movie.overview),
                image_cover_url: poster_url(&movie.images),
                air_date,
                season_number: None,
                episode_number: None,
                grabbed: movie.has_file,
                url: deep_link(
                    &self.config.external_url,
                    &self.config.internal_url,
                    "movie",
                    &movie.title_slug,
                ),
            });
        }
        Ok(releases)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> RadarrConfig {
        RadarrConfig {
            enable: true,
            internal_url: "http://10.0.0.3:7878".to_string(),
            external_url: "https://movies.example.com".to_string(),
            api_key: "k".into(),
            skip_ssl: false,
            timezone: "UTC".to_string(),
            tags: String::new(),
        }
    }

    fn test_client() -> RadarrClient {
        RadarrClient::new(HttpClient::new(), test_config(), DateStyle::Dash)
    }

    fn movie_with_dates(
        release_date: &str,
        in_cinemas: &str,
        physical: &str,
        digital: &str,
    ) -> CalendarMovie {
        CalendarMovie {
            has_file: false,
            title: "Dune: Part Two".to_string(),
            overview: "Paul unites with the Fremen.".to_string(),
            images: vec![],
            release_date: release_date.to_string(),
            in_cinemas: in_cinemas.to_string(),
            physical_release: physical.to_string(),
            digital_release: digital.to_string(),
            title_slug: "dune-part-two".to_string(),
        }
    }

    #[test]
    fn test_release_date_wins_without_label() {
        let client = test_client();
        let movies = vec![movie_with_dates(
            "2024-06-15T00:00:00Z",
            "2024-03-01T00:00:00Z",
            "",
            "",
        )];
        let releases = client.normalize(movies, DisplayZone::resolve("UTC").unwrap()).unwrap();
        assert_eq!(releases[0].air_date, "06-15 00:00");
    }

    #[test]
    fn test_cinemas_fallback_has_label() {
        let client = test_client();
        let movies = vec![movie_with_dates("", "2024-03-01T00:00:00Z", "", "")];
        let releases = client.normalize(movies, DisplayZone::resolve("UTC").unwrap()).unwrap();
        assert_eq!(releases[0].air_date, "Cinemas: 03-01 00:00");
    }

    #[test]
    fn test_physical_fallback_has_label() {
        let client = test_client();
        let movies = vec![movie_with_dates("", "", "2024-07-02T00:00:00Z", "")];
        let releases = client.normalize(movies, DisplayZone::resolve("UTC").unwrap()).unwrap();
        assert_eq!(releases[0].air_date, "Physical: 07-02 00:00");
    }

    #[test]
    fn test_digital_fallback_has_label() {
        let client = test_client();
        let movies = vec![movie_with_dates("", "", "", "2024-05-21T00:00:00Z")];
        let releases = client.normalize(movies, DisplayZone::resolve("UTC").unwrap()).unwrap();
        assert_eq!(releases[0].air_date, "Digital: 05-21 00:00");
    }

    #[test]
    fn test_plain_date_parses_as_midnight_utc() {
        assert_eq!(
            parse_release_date("2024-06-15").unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_rfc3339_date_parses() {
        assert_eq!(
            parse_release_date("2024-06-15T18:30:00Z").unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 15, 18, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_no_date_at_all_is_an_error() {
        let client = test_client();
        let movies = vec![movie_with_dates("", "", "", "")];
        let err = client
            .normalize(movies, DisplayZone::resolve("UTC").unwrap())
            .unwrap_err();
        assert!(matches!(err, WidgetError::Date { value, .. } if value.is_empty()));
    }

    #[test]
    fn test_normalized_fields() {
        let client = test_client();
        let mut movie = movie_with_dates("2024-06-15", "", "", "");
        movie.has_file = true;
        movie.images = vec![CoverImage {
            cover_type: "poster".to_string(),
            remote_url: "https://images.example.com/dune.jpg".to_string(),
        }];

        let releases = client
            .normalize(vec![movie], DisplayZone::resolve("UTC").unwrap())
            .unwrap();
        let release = &releases[0];
        assert_eq!(release.title, "Dune: Part Two");
        assert_eq!(release.subtitle, "Paul unites with the Fremen.");
        assert_eq!(release.image_cover_url, "https://images.example.com/dune.jpg");
        assert!(release.grabbed);
        assert!(release.season_number.is_none());
        assert!(release.episode_number.is_none());
        assert_eq!(release.url, "https://movies.example.com/movie/dune-part-two");
    }

    #[test]
    fn test_decode_accepts_calendar_payload() {
        let movies: Vec<CalendarMovie> = serde_json::from_str(
            r#"[{
                "title": "Dune: Part Two",
                "overview": "",
                "hasFile": false,
                "titleSlug": "dune-part-two",
                "inCinemas": "2024-03-01T00:00:00Z",
                "images": [{"coverType": "poster", "remoteUrl": "https://images.example.com/dune.jpg"}]
            }]"#,
        )
        .unwrap();
        assert_eq!(movies[0].pick_release_date().1, "Cinemas: ");
    }

    #[tokio::test]
    async fn test_missing_api_key_is_config_error() {
        let mut config = test_config();
        config.api_key = "".into();
        config.internal_url = "http://127.0.0.1:9".to_string();
        let client = RadarrClient::new(HttpClient::new(), config, DateStyle::Dash);

        let err = client.fetch_releases().await.unwrap_err();
        assert!(matches!(err, WidgetError::Config(message) if message.contains("apikey")));
    }
}
