use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use super::{parse_url, Document, PageSource};
use crate::config::HttpSettings;
use crate::error::FetchError;

/// [`PageSource`] backed by plain HTTP GETs.
pub struct HttpSource {
    name: &'static str,
    client: Client,
    max_retries: u32,
    backoff: Duration,
    open: bool,
}

fn build_client(settings: &HttpSettings) -> Result<Client, FetchError> {
    Ok(Client::builder()
        .user_agent(settings.user_agent.as_str())
        .timeout(Duration::from_secs(settings.timeout_secs))
        .build()?)
}

impl HttpSource {
    /// The listing and secondary sessions. Both clients are built before
    /// either session opens, so a failure leaves nothing to close.
    pub fn open_pair(settings: &HttpSettings) -> Result<(Self, Self), FetchError> {
        let listing = build_client(settings)?;
        let secondary = build_client(settings)?;
        Ok((
            Self::with_client("listing", listing, settings),
            Self::with_client("secondary", secondary, settings),
        ))
    }

    fn with_client(name: &'static str, client: Client, settings: &HttpSettings) -> Self {
        debug!(session = name, "Opened session");
        Self {
            name,
            client,
            max_retries: settings.max_retries,
            backoff: Duration::from_millis(settings.backoff_ms),
            open: true,
        }
    }

    async fn get_with_retry(&self, url: &reqwest::Url) -> Result<String, FetchError> {
        let mut attempt = 0;
        loop {
            let response = self.client.get(url.clone()).send().await?;
            let status = response.status();
            if status.is_success() {
                return Ok(response.text().await?);
            }

            let should_retry =
                status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
            if status == StatusCode::NOT_FOUND {
                return Err(FetchError::NotFound(url.to_string()));
            }
            if !should_retry || attempt >= self.max_retries {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            let backoff = self.backoff * 2u32.pow(attempt);
            warn!(
                "HTTP {} on {} (attempt {}/{}), backing off {:.1}s",
                status.as_u16(),
                url,
                attempt + 1,
                self.max_retries,
                backoff.as_secs_f64()
            );
            tokio::time::sleep(backoff).await;
            attempt += 1;
        }
    }
}

impl PageSource for HttpSource {
    async fn navigate(&mut self, url: &str) -> Result<Document, FetchError> {
        if !self.open {
            return Err(FetchError::Closed);
        }
        let url = parse_url(url)?;
        debug!(session = self.name, %url, "GET");
        let body = self.get_with_retry(&url).await?;
        Ok(Document::new(url, &body))
    }

    async fn close(&mut self) {
        if self.open {
            self.open = false;
            debug!(session = self.name, "Closed session");
        }
    }
}
