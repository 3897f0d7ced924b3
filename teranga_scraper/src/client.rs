//! Polite HTTP session for the source site.

use std::sync::Arc;
use std::time::Duration;

use crate::errors::FetchError;
use crate::policy::RequestPolicy;

/// Per-call timeout. The source occasionally holds connections open for
/// minutes when throttling; waiting that out is worse than retrying.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(25);

/// Browser-like HTTP session shared across a whole scraping run.
///
/// One underlying `reqwest::Client` is reused for every request so cookies
/// and keep-alive connections persist, which is both faster and closer to
/// real browser traffic. Each call takes the policy's pause first and
/// presents a freshly rotated identity.
pub struct FetchClient {
    http: reqwest::Client,
    policy: Arc<dyn RequestPolicy>,
}

impl FetchClient {
    pub fn new(policy: Arc<dyn RequestPolicy>) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, policy })
    }

    /// Fetches one page, pausing the policy's pre-request delay first.
    pub async fn get(&self, url: &str) -> Result<String, FetchError> {
        self.get_after(url, self.policy.request_delay()).await
    }

    /// Fetches a chained page (club or competition), which takes the
    /// shorter pause.
    pub async fn get_chained(&self, url: &str) -> Result<String, FetchError> {
        self.get_after(url, self.policy.chained_delay()).await
    }

    async fn get_after(&self, url: &str, pause: Duration) -> Result<String, FetchError> {
        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }

        let identity = self.policy.identity();
        let resp = self
            .http
            .get(url)
            .header("user-agent", identity.user_agent)
            .header(
                "accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
            )
            .header("accept-language", identity.accept_language)
            .header("upgrade-insecure-requests", "1")
            .header("sec-fetch-dest", "document")
            .header("sec-fetch-mode", "navigate")
            .header("sec-fetch-site", "none")
            .header("cache-control", "max-age=0")
            .header("dnt", "1")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    tracing::warn!("request for {} timed out", url);
                    FetchError::Timeout {
                        url: url.to_string(),
                    }
                } else {
                    tracing::warn!("request for {} failed: {}", url, e);
                    FetchError::Http(e)
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!("unexpected status {} for {}", status, url);
            return Err(FetchError::Status {
                status,
                url: url.to_string(),
            });
        }

        Ok(resp.text().await?)
    }
}
