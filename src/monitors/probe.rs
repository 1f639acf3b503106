//! Health prober - one bounded-time check against one target
//!
//! ## Classification
//!
//! Failures are classified in priority order:
//!
//! 1. the request exceeded the configured timeout → [`FailureKind::Timeout`]
//! 2. the remote actively refused the connection → [`FailureKind::ConnectionRefused`]
//! 3. anything else → [`FailureKind::Other`] with the raw error text
//!
//! A `200 OK` is always a success. The payload is stored as-is and never
//! validated here; interpreting it is up to the report builder.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{instrument, trace, warn};

/// Outcome of a single probe
#[derive(Debug, Clone, PartialEq)]
pub enum CheckResult {
    /// The agent answered in time; the body is kept verbatim
    Success { metrics: Value },

    /// The agent did not answer successfully
    Failure(ProbeFailure),
}

impl CheckResult {
    pub fn is_success(&self) -> bool {
        matches!(self, CheckResult::Success { .. })
    }
}

/// Classified failure kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    Timeout,
    ConnectionRefused,
    Other,
}

impl FailureKind {
    /// Classify a failure from its text alone
    ///
    /// Used for records that were persisted without an explicit kind.
    pub fn classify(detail: &str) -> FailureKind {
        let lower = detail.to_lowercase();
        if lower.contains("timeout") || lower.contains("timed out") {
            FailureKind::Timeout
        } else if detail.contains("ECONNREFUSED") || lower.contains("refused") {
            FailureKind::ConnectionRefused
        } else {
            FailureKind::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::ConnectionRefused => "connectionRefused",
            FailureKind::Other => "other",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified probe failure with its diagnostic text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeFailure {
    pub kind: FailureKind,
    pub detail: String,
}

impl ProbeFailure {
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn timeout(timeout: Duration) -> Self {
        Self::new(
            FailureKind::Timeout,
            format!("Connection timed out after {}ms", timeout.as_millis()),
        )
    }
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.detail)
    }
}

impl std::error::Error for ProbeFailure {}

/// Something that can check a target's health endpoint
///
/// `HttpProber` is the production implementation; tests plug in scripted
/// probers to drive the registry state machine without a network.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Perform exactly one check against `endpoint`
    async fn probe(&self, endpoint: &str) -> CheckResult;
}

/// Build the status URL for an endpoint
pub fn status_url(endpoint: &str) -> String {
    format!("{}/status", endpoint.trim_end_matches('/'))
}

/// Prober that issues `GET <endpoint>/status` over HTTP
#[derive(Debug, Clone)]
pub struct HttpProber {
    /// HTTP client (reused across requests, carries the timeout)
    client: reqwest::Client,

    timeout: Duration,
}

impl HttpProber {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn classify(&self, err: reqwest::Error) -> ProbeFailure {
        if err.is_timeout() {
            return ProbeFailure::timeout(self.timeout);
        }

        let refused = is_connection_refused(&err);
        let raw = format!("{:#}", anyhow::Error::from(err));

        if refused {
            ProbeFailure::new(
                FailureKind::ConnectionRefused,
                format!("Connection refused: {raw}"),
            )
        } else {
            ProbeFailure::new(FailureKind::Other, raw)
        }
    }
}

/// Walk the source chain looking for an OS-level refusal
fn is_connection_refused(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io) = e.downcast_ref::<std::io::Error>()
            && io.kind() == std::io::ErrorKind::ConnectionRefused
        {
            return true;
        }
        current = e.source();
    }
    false
}

#[async_trait]
impl Prober for HttpProber {
    #[instrument(skip(self))]
    async fn probe(&self, endpoint: &str) -> CheckResult {
        let url = status_url(endpoint);
        trace!("requesting status from {url}");

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                let failure = self.classify(e);
                warn!("{url}: {failure}");
                return CheckResult::Failure(failure);
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            warn!("{url}: unexpected status {status}");
            return CheckResult::Failure(ProbeFailure::new(
                FailureKind::Other,
                format!("HTTP error: {status}"),
            ));
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                let failure = self.classify(e);
                warn!("{url}: failed to read body: {failure}");
                return CheckResult::Failure(failure);
            }
        };

        let metrics = serde_json::from_str(&body).unwrap_or(Value::String(body));
        trace!("{url}: received status");

        CheckResult::Success { metrics }
    }
}
