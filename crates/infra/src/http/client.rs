use std::time::Duration;

use privacyguard_domain::PrivacyGuardError;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tracing::debug;

use crate::errors::InfraError;

/// How often a transport call may be re-sent.
///
/// Only connection-level failures and 5xx answers count as transient. The
/// delay doubles after each failed attempt, capped at 256x the base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_backoff: Duration,
}

impl RetryPolicy {
    /// Single attempt, no backoff.
    pub const fn none() -> Self {
        Self { max_attempts: 1, base_backoff: Duration::ZERO }
    }

    /// Delay before attempt number `attempt` (1-based, so attempt 2 is the
    /// first retry).
    fn delay_before(&self, attempt: usize) -> Duration {
        let doublings = attempt.saturating_sub(2).min(8);
        self.base_backoff.saturating_mul(1 << doublings)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 1, base_backoff: Duration::from_millis(200) }
    }
}

/// Transport for the PrivacyGuard API.
///
/// Knows nothing about credentials or status semantics beyond "5xx may be
/// transient"; 401 recovery lives in the API client above it.
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: ReqwestClient,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Client with default timeout and no transport retries.
    ///
    /// # Errors
    /// Fails only if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, PrivacyGuardError> {
        Self::builder().build()
    }

    /// Start a request on the underlying connection pool.
    pub fn request<U: reqwest::IntoUrl>(&self, method: Method, url: U) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Send `builder`, re-sending on transient failures per the retry policy.
    ///
    /// Every attempt is bounded by the client timeout on its own, so a slow
    /// transient failure still leaves room for the next attempt. A body that
    /// cannot be replayed (multipart forms) gets exactly one attempt.
    ///
    /// # Errors
    /// The transport error of the last attempt. Non-success statuses are
    /// returned as responses, not errors.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, reqwest::Error> {
        let budget = if builder.try_clone().is_some() { self.retry.max_attempts.max(1) } else { 1 };
        let mut current = builder;
        let mut attempt = 1;

        loop {
            let spare = if attempt < budget { current.try_clone() } else { None };

            let request = current.build()?;
            let method = request.method().clone();
            let path = request.url().path().to_string();
            debug!(attempt, %method, %path, "sending HTTP request");

            current = match (self.client.execute(request).await, spare) {
                (Ok(response), Some(next)) if response.status().is_server_error() => {
                    let status = response.status();
                    debug!(attempt, %method, %path, %status, "transient status, retrying");
                    next
                }
                (Err(err), Some(next)) if is_transient(&err) => {
                    debug!(attempt, %method, %path, error = %err, "transport failure, retrying");
                    next
                }
                (outcome, _) => {
                    if let Ok(response) = &outcome {
                        let status = response.status();
                        debug!(attempt, %method, %path, %status, "received HTTP response");
                    }
                    return outcome;
                }
            };

            attempt += 1;
            let delay = self.retry.delay_before(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug, Default)]
pub struct HttpClientBuilder {
    timeout: Option<Duration>,
    retry: RetryPolicy,
    user_agent: Option<String>,
}

impl HttpClientBuilder {
    /// Whole-request timeout; 30s when unset.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Total attempts per call, the first one included.
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.retry.max_attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.retry.base_backoff = backoff;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// # Errors
    /// Fails only if the TLS backend cannot be initialized.
    pub fn build(self) -> Result<HttpClient, PrivacyGuardError> {
        let agent = self
            .user_agent
            .unwrap_or_else(|| format!("privacyguard-client/{}", env!("CARGO_PKG_VERSION")));

        let client = ReqwestClient::builder()
            .timeout(self.timeout.unwrap_or(Duration::from_secs(30)))
            .user_agent(agent)
            .no_proxy()
            .build()
            .map_err(to_domain)?;

        Ok(HttpClient { client, retry: self.retry })
    }
}

fn to_domain(err: reqwest::Error) -> PrivacyGuardError {
    InfraError::from(err).into()
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
