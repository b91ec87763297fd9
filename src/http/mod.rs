use crate::error::WidgetError;
use reqwest::{Client, ClientBuilder, StatusCode};
use std::time::Duration;
use tracing::{debug, error, instrument};

/// Shared HTTP client pair. The insecure variant skips certificate
/// validation and is only picked per request when a service sets its
/// `skipssl` flag; it never becomes the default.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    insecure_client: Client,
}

fn builder() -> ClientBuilder {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent("dasharr/0.1.0")
}

impl HttpClient {
    pub fn new() -> Self {
        let client = builder().build().expect("Failed to create HTTP client");
        let insecure_client = builder()
            .danger_accept_invalid_certs(true)
            .build()
            .expect("Failed to create insecure HTTP client");

        Self {
            client,
            insecure_client,
        }
    }

    fn pick(&self, skip_ssl: bool) -> &Client {
        if skip_ssl {
            &self.insecure_client
        } else {
            &self.client
        }
    }

    #[instrument(skip(self, api_key), fields(url = %url))]
    pub async fn get_with_api_key(
        &self,
        url: &str,
        api_key: &str,
        skip_ssl: bool,
    ) -> Result<String, WidgetError> {
        debug!("Making GET request");
        let response = self
            .pick(skip_ssl)
            .get(url)
            .header("X-Api-Key", api_key)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            error!("HTTP request failed with status: {}", response.status());
            return Err(WidgetError::Upstream {
                status: response.status(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }

    #[instrument(skip(self, form), fields(url = %url))]
    pub async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<String, WidgetError> {
        debug!("Making POST request");
        let response = self.pick(false).post(url).form(form).send().await?;

        if response.status() != StatusCode::OK {
            error!("HTTP POST failed with status: {}", response.status());
            return Err(WidgetError::Upstream {
                status: response.status(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}
