use crate::{core::config::ImageLoadingConfig, MapError, Result};
use crossbeam_channel::Sender;
use once_cell::sync::Lazy;
use reqwest::blocking::Client;
use std::{thread, time::Duration};

/// `(url, bytes or error)` delivered when a fetch settles
pub type FetchOutcome = (String, Result<Vec<u8>>);

/// Shared blocking HTTP client. Building the client once avoids the cost of
/// TLS and connection pool setup for every icon.
pub(crate) static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent(concat!("teyvat-map/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|e| {
            log::warn!("falling back to default HTTP client: {e}");
            Client::new()
        })
});

/// Anything that can fetch image bytes without blocking the caller
pub trait ImageFetcher: Send + Sync {
    /// Start fetching `url`; exactly one outcome must be sent on `done`.
    fn fetch(&self, url: String, done: Sender<FetchOutcome>);
}

/// Fetches images over HTTP on detached threads.
///
/// Failed requests are retried `max_retries` times; the default budget of
/// zero keeps failures final.
pub struct HttpImageFetcher {
    config: ImageLoadingConfig,
}

impl HttpImageFetcher {
    pub fn new(config: ImageLoadingConfig) -> Self {
        Self { config }
    }
}

impl Default for HttpImageFetcher {
    fn default() -> Self {
        Self::new(ImageLoadingConfig::default())
    }
}

fn download(url: &str) -> Result<Vec<u8>> {
    let resp = HTTP_CLIENT.get(url).send()?;
    if !resp.status().is_success() {
        return Err(MapError::Service(format!("HTTP {} for {url}", resp.status())));
    }
    Ok(resp.bytes()?.to_vec())
}

/// Runs `download` until it succeeds or the retry budget is spent, sleeping
/// `retry_delay(n)` before the n-th retry.
fn fetch_with_retries<D, S>(
    url: &str,
    config: &ImageLoadingConfig,
    mut download: D,
    mut sleep: S,
) -> Result<Vec<u8>>
where
    D: FnMut(&str) -> Result<Vec<u8>>,
    S: FnMut(Duration),
{
    let mut attempt = 1;
    loop {
        log::debug!("fetch image {url} attempt {attempt}");
        match download(url) {
            Ok(data) => return Ok(data),
            Err(e) if attempt <= config.max_retries => {
                log::warn!("image {url} failed on attempt {attempt}: {e}");
                sleep(config.retry_delay(attempt));
                attempt += 1;
            }
            Err(e) => {
                log::error!("giving up on image {url}: {e}");
                return Err(e);
            }
        }
    }
}

impl ImageFetcher for HttpImageFetcher {
    fn fetch(&self, url: String, done: Sender<FetchOutcome>) {
        let config = self.config.clone();

        thread::spawn(move || {
            let outcome = fetch_with_retries(&url, &config, download, thread::sleep);
            let _ = done.send((url, outcome));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flaky(failures: u32) -> impl FnMut(&str) -> Result<Vec<u8>> {
        let mut calls = 0;
        move |url| {
            calls += 1;
            if calls <= failures {
                Err(MapError::Service(format!("503 for {url}")))
            } else {
                Ok(vec![1, 2, 3])
            }
        }
    }

    #[test]
    fn test_backoff_doubles_from_first_retry() {
        let config = ImageLoadingConfig {
            max_retries: 3,
            retry_delay_ms: 100,
            exponential_backoff: true,
            ..ImageLoadingConfig::default()
        };
        let mut slept = Vec::new();
        let data = fetch_with_retries("https://icons/a.png", &config, flaky(3), |d| slept.push(d));

        assert_eq!(data.unwrap(), vec![1, 2, 3]);
        assert_eq!(
            slept,
            [100, 200, 400].map(Duration::from_millis).to_vec()
        );
    }

    #[test]
    fn test_default_budget_fails_without_sleeping() {
        let config = ImageLoadingConfig::default();
        let mut slept = Vec::new();
        let result = fetch_with_retries("https://icons/a.png", &config, flaky(1), |d| slept.push(d));

        assert!(matches!(result, Err(MapError::Service(_))));
        assert!(slept.is_empty());
    }
}
