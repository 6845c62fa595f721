use ows_rewrite::probe::DEFAULT_PROBE_TIMEOUT;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Timeout cannot be 0: {0}")]
    InvalidTimeout(&'static str),

    #[error("OGC service URL cannot be a base: {0}")]
    InvalidServiceUrl(Url),
}

/// Print gateway configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Listener for print requests
    pub listener: Listener,
    /// Admin listener for health and readiness checks
    pub admin_listener: Listener,
    /// Base URL of the OGC service print requests are forwarded to
    #[serde(default = "default_ogc_service_url")]
    pub ogc_service_url: Url,
    /// Declared QGIS Server version, selects how external layers are passed
    #[serde(default = "default_qgis_server_version")]
    pub qgis_server_version: String,
    /// Suffix appended to the map id in the forwarded URL (e.g. ".qgs")
    #[serde(default)]
    pub qgs_postfix: String,
    /// Filename for PDF responses, `<mapid>.pdf` if unset
    #[serde(default)]
    pub print_pdf_filename: Option<String>,
    #[serde(default)]
    pub timeouts: Timeouts,
}

fn default_ogc_service_url() -> Url {
    Url::parse("http://localhost:5013/").expect("static URL is valid")
}

fn default_qgis_server_version() -> String {
    "2.18.19".into()
}

impl Config {
    /// Validates the print gateway configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;
        self.timeouts.validate()?;

        if self.ogc_service_url.cannot_be_a_base() {
            return Err(ValidationError::InvalidServiceUrl(
                self.ogc_service_url.clone(),
            ));
        }

        Ok(())
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Timeouts {
    /// Timeout for the forwarded print request
    #[serde(default = "default_backend_timeout_secs")]
    pub backend_timeout_secs: u64,
    /// Timeout for each WFS DescribeFeatureType request
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

fn default_backend_timeout_secs() -> u64 {
    120
}

fn default_probe_timeout_secs() -> u64 {
    DEFAULT_PROBE_TIMEOUT.as_secs()
}

impl Default for Timeouts {
    fn default() -> Self {
        Timeouts {
            backend_timeout_secs: default_backend_timeout_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
        }
    }
}

impl Timeouts {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.backend_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("backend_timeout_secs"));
        }
        if self.probe_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("probe_timeout_secs"));
        }
        Ok(())
    }
}
