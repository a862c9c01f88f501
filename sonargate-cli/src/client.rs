//! Analysis service HTTP client.

use crate::CliResult;
use reqwest::Client;
use sonargate_core::{MetricKey, PayloadKind, RawPayloads};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Where and as whom to query the analysis service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceTarget {
    /// Base URL without trailing slash.
    pub server_url: String,
    /// Bearer token.
    pub token: String,
    /// Project key to query.
    pub project_key: String,
    /// Page size for the issue search.
    pub page_size: u32,
}

impl ServiceTarget {
    /// Full URL for a payload endpoint.
    pub fn url(&self, kind: PayloadKind) -> String {
        let path = match kind {
            PayloadKind::Metrics => "measures/component",
            PayloadKind::Issues => "issues/search",
            PayloadKind::QualityGate => "qualitygates/project_status",
        };
        format!("{}/api/{path}", self.server_url)
    }

    /// Query parameters for a payload endpoint.
    pub fn query(&self, kind: PayloadKind) -> Vec<(&'static str, String)> {
        match kind {
            PayloadKind::Metrics => vec![
                ("component", self.project_key.clone()),
                ("metricKeys", MetricKey::query_list()),
            ],
            PayloadKind::Issues => vec![
                ("componentKeys", self.project_key.clone()),
                ("ps", self.page_size.to_string()),
                ("resolved", "false".to_string()),
            ],
            PayloadKind::QualityGate => vec![("projectKey", self.project_key.clone())],
        }
    }
}

/// Client abstraction for the analysis service API.
pub trait SonarClient {
    /// Fetch the raw body for one payload kind.
    fn fetch_payload<'a>(
        &'a self,
        target: &'a ServiceTarget,
        kind: PayloadKind,
    ) -> Pin<Box<dyn Future<Output = CliResult<String>> + Send + 'a>>;
}

/// Reqwest-backed analysis service client.
pub struct ReqwestSonarClient {
    client: Client,
}

impl ReqwestSonarClient {
    /// Build a client with the standard request timeout.
    pub fn new() -> CliResult<Self> {
        let client = Client::builder()
            .user_agent("sonargate-cli")
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }
}

impl SonarClient for ReqwestSonarClient {
    fn fetch_payload<'a>(
        &'a self,
        target: &'a ServiceTarget,
        kind: PayloadKind,
    ) -> Pin<Box<dyn Future<Output = CliResult<String>> + Send + 'a>> {
        Box::pin(fetch_payload(&self.client, target, kind))
    }
}

/// Fetch one payload body with bearer authorization.
async fn fetch_payload(
    client: &Client,
    target: &ServiceTarget,
    kind: PayloadKind,
) -> CliResult<String> {
    let response = client
        .get(target.url(kind))
        .bearer_auth(&target.token)
        .query(&target.query(kind))
        .send()
        .await?
        .error_for_status()?;
    Ok(response.text().await?)
}

/// Fetch all payloads one after another.
///
/// A failed request leaves its payload empty; the remaining requests still run.
pub async fn fetch_payloads<C: SonarClient>(client: &C, target: &ServiceTarget) -> RawPayloads {
    let mut payloads = RawPayloads::default();
    for kind in PayloadKind::ALL {
        let body = match client.fetch_payload(target, kind).await {
            Ok(body) => Some(body),
            Err(err) => {
                log::warn!("{kind} request failed: {err}");
                None
            }
        };
        payloads.set(kind, body);
    }
    payloads
}
