use crate::models::DateStyle;
use serde::{Deserialize, Deserializer};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Configuration {
    pub releases: Option<ReleasesWidgetConfig>,
    pub freshrss: Option<FreshRssWidgetConfig>,
}

/// A config string that may point at an environment variable: a value
/// written `${NAME}` is replaced by the variable's value while the YAML is
/// being deserialized. Used for API keys and passwords.
#[derive(Debug, Clone, Default)]
pub struct EnvString(String);

impl EnvString {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for EnvString {
    fn from(value: &str) -> Self {
        EnvString(value.to_string())
    }
}

impl<'de> Deserialize<'de> for EnvString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if let Some(name) = raw.strip_prefix("${").and_then(|rest| rest.strip_suffix('}')) {
            let value = std::env::var(name).map_err(|_| {
                serde::de::Error::custom(format!("environment variable {} is not set", name))
            })?;
            return Ok(EnvString(value));
        }
        Ok(EnvString(raw))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReleasesWidgetConfig {
    pub title: Option<String>,
    pub sonarr: Option<SonarrConfig>,
    pub radarr: Option<RadarrConfig>,
    #[serde(default)]
    pub collapse_after: i64,
    /// Refresh period in seconds.
    pub cache_duration: Option<u64>,
    #[serde(default)]
    pub date_format: DateStyle,
}

impl ReleasesWidgetConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.cache_duration.unwrap_or(5 * 60))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SonarrConfig {
    #[serde(default = "default_enable")]
    pub enable: bool,
    #[serde(default)]
    pub internal_url: String,
    #[serde(default)]
    pub external_url: String,
    #[serde(rename = "apikey", default)]
    pub api_key: EnvString,
    #[serde(rename = "skipssl", default)]
    pub skip_ssl: bool,
    #[serde(default)]
    pub timezone: String,
    #[serde(default)]
    pub day_offset: i32,
    #[serde(default)]
    pub from_previous_days: i32,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub internal_insecure_thumbnail: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RadarrConfig {
    #[serde(default = "default_enable")]
    pub enable: bool,
    #[serde(default)]
    pub internal_url: String,
    #[serde(default)]
    pub external_url: String,
    #[serde(rename = "apikey", default)]
    pub api_key: EnvString,
    #[serde(rename = "skipssl", default)]
    pub skip_ssl: bool,
    #[serde(default)]
    pub timezone: String,
    #[serde(default)]
    pub tags: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FreshRssWidgetConfig {
    pub title: Option<String>,
    #[serde(default)]
    pub freshrss_url: String,
    #[serde(default)]
    pub freshrss_user: String,
    #[serde(default)]
    pub freshrss_api_pass: EnvString,
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub collapse_after: i64,
    /// Refresh period in seconds.
    pub cache_duration: Option<u64>,
}

impl FreshRssWidgetConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.cache_duration.unwrap_or(60 * 60))
    }
}

fn default_enable() -> bool {
    true
}

impl Configuration {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Configuration = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
releases:
  collapse-after: 3
  cache-duration: 120
  date-format: slash
  sonarr:
    internal-url: https://10.0.0.2:8989/
    external-url: https://tv.example.com
    apikey: abc123
    skipssl: true
    timezone: Europe/Berlin
    day-offset: -1
    from-previous-days: 2
    tags: anime
    internal-insecure-thumbnail: true
  radarr:
    enable: false
    internal-url: http://10.0.0.3:7878
    apikey: def456
freshrss:
  freshrss-url: https://rss.example.com
  freshrss-user: admin
  freshrss-api-pass: hunter2
  limit: 10
"#;

    #[test]
    fn test_parse_full_config() {
        let config: Configuration = serde_yaml::from_str(FIXTURE).unwrap();

        let releases = config.releases.unwrap();
        assert_eq!(releases.collapse_after, 3);
        assert_eq!(releases.refresh_interval(), Duration::from_secs(120));
        assert_eq!(releases.date_format, DateStyle::Slash);

        let sonarr = releases.sonarr.unwrap();
        assert!(sonarr.enable);
        assert_eq!(sonarr.internal_url, "https://10.0.0.2:8989/");
        assert_eq!(sonarr.api_key.as_str(), "abc123");
        assert!(sonarr.skip_ssl);
        assert_eq!(sonarr.timezone, "Europe/Berlin");
        assert_eq!(sonarr.day_offset, -1);
        assert_eq!(sonarr.from_previous_days, 2);
        assert_eq!(sonarr.tags, "anime");
        assert!(sonarr.internal_insecure_thumbnail);

        let radarr = releases.radarr.unwrap();
        assert!(!radarr.enable);
        assert_eq!(radarr.external_url, "");

        let freshrss = config.freshrss.unwrap();
        assert_eq!(freshrss.freshrss_user, "admin");
        assert_eq!(freshrss.limit, 10);
        assert_eq!(freshrss.refresh_interval(), Duration::from_secs(60 * 60));
    }

    #[test]
    fn test_defaults_for_minimal_config() {
        let config: Configuration = serde_yaml::from_str(
            "releases:\n  sonarr:\n    internal-url: http://10.0.0.2:8989\n    apikey: k\n",
        )
        .unwrap();

        let releases = config.releases.unwrap();
        assert_eq!(releases.collapse_after, 0);
        assert_eq!(releases.refresh_interval(), Duration::from_secs(5 * 60));
        assert_eq!(releases.date_format, DateStyle::Dash);
        assert!(config.freshrss.is_none());

        let sonarr = releases.sonarr.unwrap();
        assert!(sonarr.enable);
        assert_eq!(sonarr.day_offset, 0);
        assert_eq!(sonarr.from_previous_days, 0);
        assert!(!sonarr.skip_ssl);
        assert!(!sonarr.internal_insecure_thumbnail);
    }

    #[test]
    fn test_env_indirection_resolves() {
        std::env::set_var("DASHARR_TEST_API_KEY", "from-env");
        let config: Configuration = serde_yaml::from_str(
            "releases:\n  sonarr:\n    internal-url: http://10.0.0.2:8989\n    apikey: ${DASHARR_TEST_API_KEY}\n",
        )
        .unwrap();

        let sonarr = config.releases.unwrap().sonarr.unwrap();
        assert_eq!(sonarr.api_key.as_str(), "from-env");
    }

    #[test]
    fn test_env_indirection_unset_variable_fails() {
        let result: Result<Configuration, _> = serde_yaml::from_str(
            "releases:\n  sonarr:\n    apikey: ${DASHARR_TEST_MISSING_KEY}\n",
        );
        assert!(result.is_err());
    }
}
