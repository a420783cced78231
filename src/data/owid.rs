//! Our World in Data COVID-19 feed download.

use std::io::Read;
use std::time::Duration;

use reqwest::blocking::Client;

use crate::error::AppError;

pub const DEFAULT_SOURCE_URL: &str =
    "https://github.com/owid/covid-19-data/blob/master/public/data/owid-covid-data.csv?raw=true";

/// Something that can hand out a fresh byte stream of the feed CSV.
///
/// `open` is called from a blocking context once per update cycle.
pub trait FeedSource: Send + Sync + 'static {
    fn open(&self) -> Result<Box<dyn Read + Send>, AppError>;

    /// Human-readable origin, used in log lines.
    fn describe(&self) -> String;
}

/// Downloads the feed over HTTP(S).
#[derive(Debug, Clone)]
pub struct OwidClient {
    url: String,
    timeout: Option<Duration>,
}

impl OwidClient {
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Default for OwidClient {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCE_URL, None)
    }
}

impl FeedSource for OwidClient {
    fn open(&self) -> Result<Box<dyn Read + Send>, AppError> {
        // The blocking client owns its own runtime, so it is built (and dropped)
        // on the blocking thread that reads the body.
        // The full CSV is large; the client's default 30s total timeout is too short.
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| AppError::feed(format!("Failed to build HTTP client: {e}")))?;

        let resp = client
            .get(&self.url)
            .send()
            .map_err(|e| AppError::feed(format!("Feed request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::feed(format!(
                "Feed request failed with status {}.",
                resp.status()
            )));
        }

        Ok(Box::new(resp))
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_client_points_at_owid() {
        let client = OwidClient::default();
        assert_eq!(client.url(), DEFAULT_SOURCE_URL);
        assert_eq!(client.describe(), DEFAULT_SOURCE_URL);
    }
}
