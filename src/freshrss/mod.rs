use crate::config::FreshRssWidgetConfig;
use crate::error::WidgetError;
use crate::http::HttpClient;
use crate::models::FeedSubscription;
use serde::Deserialize;
use tracing::{info, instrument};
use url::Url;

pub struct FreshRssClient {
    http: HttpClient,
    config: FreshRssWidgetConfig,
}

/// The fever API authenticates with md5 over `user:password`, hex encoded.
pub fn fever_api_key(user: &str, password: &str) -> String {
    format!("{:x}", md5::compute(format!("{}:{}", user, password)))
}

#[derive(Debug, Deserialize)]
struct FeverFeedsResponse {
    #[serde(default)]
    feeds: Vec<FeverFeed>,
}

#[derive(Debug, Deserialize)]
struct FeverFeed {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    site_url: String,
    #[serde(default)]
    last_updated_on_time: i64,
}

impl FreshRssClient {
    pub fn new(http: HttpClient, config: FreshRssWidgetConfig) -> Self {
        Self { http, config }
    }

    fn validate(&self) -> Result<(), WidgetError> {
        if self.config.freshrss_url.is_empty() {
            return Err(WidgetError::config("missing freshrss-url config"));
        }
        if self.config.freshrss_user.is_empty() {
            return Err(WidgetError::config("missing freshrss-user config"));
        }
        if self.config.freshrss_api_pass.is_empty() {
            return Err(WidgetError::config("missing freshrss-api-pass config"));
        }
        Url::parse(&self.config.freshrss_url).map_err(|_| {
            WidgetError::config(format!(
                "invalid freshrss-url: {}",
                self.config.freshrss_url
            ))
        })?;
        Ok(())
    }

    /// List the feeds the FreshRSS instance aggregates. Fetching the items
    /// of each feed is left to the host's RSS collaborator.
    #[instrument(skip(self))]
    pub async fn fetch_feeds(&self) -> Result<Vec<FeedSubscription>, WidgetError> {
        self.validate()?;

        let api_key = fever_api_key(
            &self.config.freshrss_user,
            self.config.freshrss_api_pass.as_str(),
        );
        let url = format!(
            "{}/api/fever.php?api",
            self.config.freshrss_url.trim_end_matches('/')
        );

        let body = self
            .http
            .post_form(&url, &[("api_key", api_key.as_str()), ("feeds", "")])
            .await?;

        let response: FeverFeedsResponse = serde_json::from_str(&body)?;
        info!("FreshRSS listed {} feeds", response.feeds.len());

        Ok(response
            .feeds
            .into_iter()
            .map(|feed| FeedSubscription {
                title: feed.title,
                url: feed.url,
                site_url: feed.site_url,
                last_updated_on_time: feed.last_updated_on_time,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> FreshRssWidgetConfig {
        FreshRssWidgetConfig {
            title: None,
            freshrss_url: "https://rss.example.com".to_string(),
            freshrss_user: "admin".to_string(),
            freshrss_api_pass: "hunter2".into(),
            limit: 0,
            collapse_after: 0,
            cache_duration: None,
        }
    }

    #[test]
    fn test_fever_api_key_shape() {
        let key = fever_api_key("admin", "hunter2");
        assert_eq!(key.len(), 32);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_fever_api_key_is_deterministic_and_credential_bound() {
        assert_eq!(fever_api_key("admin", "hunter2"), fever_api_key("admin", "hunter2"));
        assert_ne!(fever_api_key("admin", "hunter2"), fever_api_key("admin", "other"));
        assert_ne!(fever_api_key("admin", "hunter2"), fever_api_key("other", "hunter2"));
    }

    #[test]
    fn test_decode_fever_listing() {
        let response: FeverFeedsResponse = serde_json::from_str(
            r#"{
                "api_version": 3,
                "auth": 1,
                "last_refreshed_on_time": 1718445600,
                "feeds": [
                    {
                        "id": 1,
                        "favicon_id": 1,
                        "title": "Lobsters",
                        "url": "https://lobste.rs/rss",
                        "site_url": "https://lobste.rs",
                        "is_spark": 0,
                        "last_updated_on_time": 1718440000
                    },
                    {
                        "id": 2,
                        "favicon_id": 2,
                        "title": "LWN",
                        "url": "https://lwn.net/headlines/rss",
                        "site_url": "https://lwn.net",
                        "is_spark": 0,
                        "last_updated_on_time": 1718430000
                    }
                ],
                "feeds_groups": [{"group_id": 1, "feed_ids": "1,2"}]
            }"#,
        )
        .unwrap();

        assert_eq!(response.feeds.len(), 2);
        assert_eq!(response.feeds[0].title, "Lobsters");
        assert_eq!(response.feeds[1].site_url, "https://lwn.net");
    }

    #[tokio::test]
    async fn test_missing_credentials_are_config_errors() {
        let mut config = test_config();
        config.freshrss_api_pass = "".into();
        let client = FreshRssClient::new(HttpClient::new(), config);
        let err = client.fetch_feeds().await.unwrap_err();
        assert!(matches!(err, WidgetError::Config(message) if message.contains("api-pass")));

        let mut config = test_config();
        config.freshrss_url = String::new();
        let client = FreshRssClient::new(HttpClient::new(), config);
        let err = client.fetch_feeds().await.unwrap_err();
        assert!(matches!(err, WidgetError::Config(message) if message.contains("freshrss-url")));
    }
}
