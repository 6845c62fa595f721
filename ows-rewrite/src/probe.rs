use crate::metrics_defs::PROBE_FAILURES;
use crate::style::{GeometryKind, describe_feature_type_url};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

/// Default timeout of one `DescribeFeatureType` request.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(thiserror::Error, Debug)]
pub enum ProbeError {
    #[error("HTTP client error: {0}")]
    ReqwestError(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    UnexpectedStatus(StatusCode),
}

/// Fetches WFS `DescribeFeatureType` documents.
#[async_trait]
pub trait GeometryProbe: Send + Sync {
    /// Returns the raw response body for `url`.
    async fn describe_feature_type(&self, url: &str) -> Result<String, ProbeError>;
}

/// Probe backed by a reqwest client with a request timeout.
#[derive(Clone)]
pub struct HttpGeometryProbe {
    client: reqwest::Client,
}

impl HttpGeometryProbe {
    pub fn new(timeout: Duration) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpGeometryProbe { client })
    }
}

#[async_trait]
impl GeometryProbe for HttpGeometryProbe {
    async fn describe_feature_type(&self, url: &str) -> Result<String, ProbeError> {
        let response = self.client.get(url).send().await?;

        match response.status() {
            StatusCode::OK => Ok(response.text().await?),
            status => Err(ProbeError::UnexpectedStatus(status)),
        }
    }
}

/// Looks up the geometry kind of a WFS type.
///
/// Probe failures are logged and yield `None`, i.e. automatic styling.
pub async fn probe_geometry(
    probe: &dyn GeometryProbe,
    wfs_url: &str,
    type_name: &str,
) -> Option<GeometryKind> {
    let url = describe_feature_type_url(wfs_url, type_name);

    match probe.describe_feature_type(&url).await {
        Ok(schema) => GeometryKind::detect(&schema),
        Err(e) => {
            shared::counter!(PROBE_FAILURES).increment(1);
            tracing::warn!(
                url = %url,
                error = %e,
                "DescribeFeatureType request failed"
            );
            None
        }
    }
}
