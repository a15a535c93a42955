use crate::domain::model::RawPage;
use crate::utils::error::{Result, ScrapeError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = concat!("passwatch/", env!("CARGO_PKG_VERSION"));

/// 對票務網站的單次 GET，不重試
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(
        user_agent: &str,
        timeout: Duration,
        headers: &HashMap<String, String>,
    ) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        for (key, value) in headers {
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
                ScrapeError::InvalidConfigValue {
                    field: "source.headers".to_string(),
                    value: key.clone(),
                    reason: e.to_string(),
                }
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                ScrapeError::InvalidConfigValue {
                    field: format!("source.headers.{}", key),
                    value: value.clone(),
                    reason: e.to_string(),
                }
            })?;
            default_headers.insert(name, value);
        }

        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .default_headers(default_headers)
            .build()?;

        Ok(Self { client })
    }

    pub async fn fetch(&self, url: &str) -> Result<RawPage> {
        tracing::debug!("Making request to: {}", url);
        let response = self.client.get(url).send().await?;

        let final_url = response.url().to_string();
        let status = response.status();
        tracing::info!("Request URL: {}", final_url);
        tracing::info!("Request status code: {}", status.as_u16());

        if !status.is_success() {
            return Err(ScrapeError::HttpStatus {
                status: status.as_u16(),
                url: final_url,
            });
        }

        let body = response.text().await?;
        tracing::debug!("Received {} bytes", body.len());

        Ok(RawPage {
            url: final_url,
            status: status.as_u16(),
            body,
        })
    }
}
