//! Blocking HTTP fetches behind a small trait so runs can be driven offline

use crate::error::{Error, Result};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};

/// Something that can GET a URL and return the body as text
pub trait Fetch {
    fn get_text(&self, url: &str) -> Result<String>;
}

/// [`Fetch`] over a blocking reqwest client
///
/// No retries and no timeout beyond reqwest's defaults; any failure is
/// reported as [`Error::Fetch`].
pub struct HttpFetcher {
    client: Client,
    user_agent: String,
}

impl HttpFetcher {
    pub fn new(user_agent: impl Into<String>) -> Result<Self> {
        let client = Client::builder().build().map_err(|e| Error::Fetch {
            url: String::new(),
            message: format!("failed to build HTTP client: {e}"),
        })?;
        Ok(Self {
            client,
            user_agent: user_agent.into(),
        })
    }
}

impl Fetch for HttpFetcher {
    fn get_text(&self, url: &str) -> Result<String> {
        let fetch_error = |message: String| Error::Fetch {
            url: url.to_string(),
            message,
        };

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .header(
                ACCEPT,
                "text/html,application/xhtml+xml,application/json;q=0.9,*/*;q=0.8",
            )
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.5")
            .send()
            .map_err(|e| fetch_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("HTTP {status}")));
        }

        response.text().map_err(|e| fetch_error(e.to_string()))
    }
}

#[cfg(test)]
pub(crate) mod stub {
    use super::*;
    use std::collections::HashMap;

    /// Canned responses keyed by URL; unknown URLs fail like a 404
    #[derive(Default)]
    pub struct StubFetcher {
        responses: HashMap<String, String>,
    }

    impl StubFetcher {
        pub fn with(mut self, url: &str, body: &str) -> Self {
            self.responses.insert(url.to_string(), body.to_string());
            self
        }
    }

    impl Fetch for StubFetcher {
        fn get_text(&self, url: &str) -> Result<String> {
            self.responses.get(url).cloned().ok_or_else(|| Error::Fetch {
                url: url.to_string(),
                message: "HTTP 404 Not Found".to_string(),
            })
        }
    }
}
