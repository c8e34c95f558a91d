//! Blob transport: `fetch(locator) -> bytes`.

use std::{future::Future, pin::Pin};

use bytes::Bytes;
use tracing::{debug, instrument, warn};

use crate::config::LoaderConfig;
use crate::errors::TabularError;

pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<Bytes, TabularError>> + Send + 'a>>;

/// Fetches raw attachment bytes from a locator.
pub trait BlobFetcher: Send + Sync {
    fn fetch<'a>(&'a self, locator: &'a str) -> FetchFuture<'a>;
}

/// HTTP(S) fetcher with separate connect and read timeouts.
///
/// Any non-2xx status is a failure.
pub struct HttpBlobFetcher {
    client: reqwest::Client,
}

impl HttpBlobFetcher {
    pub fn new(cfg: &LoaderConfig) -> Result<Self, TabularError> {
        cfg.validate()?;
        let client = reqwest::Client::builder()
            .connect_timeout(cfg.connect_timeout())
            .read_timeout(cfg.read_timeout())
            .build()
            .map_err(|e| TabularError::Config(format!("http client: {e}")))?;
        Ok(Self { client })
    }
}

impl BlobFetcher for HttpBlobFetcher {
    fn fetch<'a>(&'a self, locator: &'a str) -> FetchFuture<'a> {
        Box::pin(fetch_http(&self.client, locator))
    }
}

#[instrument(skip_all, fields(locator = %short(locator)))]
async fn fetch_http(client: &reqwest::Client, locator: &str) -> Result<Bytes, TabularError> {
    let transport = |e: reqwest::Error| TabularError::Fetch {
        locator: short(locator),
        reason: if e.is_timeout() {
            "timed out".to_string()
        } else if e.is_connect() {
            format!("connect error: {e}")
        } else {
            e.to_string()
        },
    };

    let resp = client.get(locator).send().await.map_err(transport)?;
    let status = resp.status();
    if !status.is_success() {
        warn!(%status, "blob fetch returned non-success status");
        return Err(TabularError::HttpStatus {
            locator: short(locator),
            status: status.as_u16(),
        });
    }

    let body = resp.bytes().await.map_err(transport)?;
    debug!(bytes = body.len(), "blob fetched");
    Ok(body)
}

/// Locators may carry signed query strings; logs keep the head only.
pub(crate) fn short(locator: &str) -> String {
    let head = locator.split('?').next().unwrap_or(locator);
    head.chars().take(120).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_drops_query_and_bounds_length() {
        assert_eq!(short("https://b/x.csv?sig=secret"), "https://b/x.csv");
        assert_eq!(short(&"a".repeat(500)).len(), 120);
    }
}
