//! REST client for the remote visa-requirement lookup API.
//!
//! Wraps `GET {base}/v2/requirements/{passport}/{destination}` using
//! [`reqwest`], mapping HTTP statuses onto the lookup error taxonomy:
//! 429 is a rate-limit signal, 402/403 mean the period quota is spent,
//! anything else non-2xx is a recoverable API error.

use crate::lookup::{LookupError, RawRequirement, RequirementLookup};

/// HTTP client for the requirement lookup service.
pub struct VisaApi {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl VisaApi {
    /// Create a new API client.
    ///
    /// * `base_url` - Base HTTP URL, e.g. `https://api.example.com`.
    /// * `api_key` - Sent as the `x-api-key` header on every request.
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    fn classify_status(status: u16, body: String) -> LookupError {
        match status {
            429 => LookupError::RateLimited,
            402 | 403 => LookupError::QuotaExceeded,
            _ => LookupError::Api { status, body },
        }
    }
}

#[async_trait::async_trait]
impl RequirementLookup for VisaApi {
    async fn lookup(
        &self,
        passport: &str,
        destination: &str,
    ) -> Result<RawRequirement, LookupError> {
        let url = format!(
            "{}/v2/requirements/{}/{}",
            self.base_url, passport, destination
        );

        let response = self
            .client
            .get(&url)
            .header("x-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(Self::classify_status(status.as_u16(), body));
        }

        response
            .json::<RawRequirement>()
            .await
            .map_err(|e| LookupError::Transport(e.to_string()))
    }
}
