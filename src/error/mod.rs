use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single widget refresh. No variant is retried; the caller
/// surfaces the error and keeps whatever it rendered last.
#[derive(Debug, Error)]
pub enum WidgetError {
    #[error("missing or invalid config: {0}")]
    Config(String),

    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected status code {status} from {url}")]
    Upstream { status: StatusCode, url: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("failed to parse date {value:?}: {source}")]
    Date {
        value: String,
        source: chrono::ParseError,
    },

    #[error("unknown timezone {0:?}")]
    Timezone(String),
}

impl WidgetError {
    pub fn config(message: impl Into<String>) -> Self {
        WidgetError::Config(message.into())
    }
}
