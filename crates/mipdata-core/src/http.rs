//! Blocking HTTP access to library websites.
//!
//! Everything the catalog fetches goes through [`HttpClient`], so tests and
//! embedders can substitute their own transport.

use std::io::{self, Write};
use std::time::Duration;

use crate::error::{Error, Result};

/// Default timeout for one whole request, connect to last body byte.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking GET transport.
pub trait HttpClient: Send + Sync {
    /// Stream the body of `url` into `sink`, returning the number of bytes written.
    ///
    /// Non-success statuses must be reported as [`Error::HttpStatus`].
    fn fetch(&self, url: &str, sink: &mut dyn Write) -> Result<u64>;

    /// Fetch `url` as text. Invalid UTF-8 sequences are replaced.
    fn fetch_text(&self, url: &str) -> Result<String> {
        let mut body = Vec::new();
        self.fetch(url, &mut body)?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

/// [`HttpClient`] backed by a `ureq` agent.
#[derive(Clone)]
pub struct UreqClient {
    agent: ureq::Agent,
}

impl UreqClient {
    pub fn new(timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self { agent }
    }
}

impl Default for UreqClient {
    fn default() -> Self {
        Self::new(DEFAULT_HTTP_TIMEOUT)
    }
}

impl HttpClient for UreqClient {
    #[tracing::instrument(level = "debug", skip(self, sink))]
    fn fetch(&self, url: &str, sink: &mut dyn Write) -> Result<u64> {
        let response = self.agent.get(url).call().map_err(|e| request_error(url, e))?;
        let mut reader = response.into_body().into_reader();
        let written = io::copy(&mut reader, sink).map_err(|e| body_error(url, e))?;
        tracing::debug!("Received {written} bytes from {url}");
        Ok(written)
    }
}

fn request_error(url: &str, error: ureq::Error) -> Error {
    match error {
        ureq::Error::StatusCode(status) => Error::HttpStatus {
            url: url.to_owned(),
            status,
        },
        ureq::Error::Timeout(_) => Error::Timeout { url: url.to_owned() },
        other => Error::Transport {
            url: url.to_owned(),
            source: Box::new(other),
        },
    }
}

/// Body read failures surface as `io::Error`; timeouts keep their own variant.
fn body_error(url: &str, error: io::Error) -> Error {
    if error.kind() == io::ErrorKind::TimedOut {
        Error::Timeout { url: url.to_owned() }
    } else {
        Error::Transport {
            url: url.to_owned(),
            source: Box::new(error),
        }
    }
}
