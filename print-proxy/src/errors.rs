use hyper::StatusCode;
use thiserror::Error;

/// Errors that can occur while serving a print request
#[derive(Error, Debug)]
pub enum PrintError {
    #[error("Failed to read request body: {0}")]
    RequestBodyError(String),

    #[error("Missing <mapName>:LAYERS parameter")]
    MissingLayersParam,

    #[error("Invalid backend URL: {0}")]
    InvalidBackendUrl(#[from] url::ParseError),

    #[error("Backend request failed for {0}: {1}")]
    BackendRequestFailed(String, String),

    #[error("Backend timeout for {0}")]
    BackendTimeout(String),

    #[error("Failed to read backend response: {0}")]
    ResponseBodyError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Probe error: {0}")]
    ProbeError(#[from] ows_rewrite::ProbeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PrintError {
    /// Status returned to the client for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            PrintError::RequestBodyError(_) | PrintError::MissingLayersParam => {
                StatusCode::BAD_REQUEST
            }
            PrintError::BackendRequestFailed(..) | PrintError::ResponseBodyError(_) => {
                StatusCode::BAD_GATEWAY
            }
            PrintError::BackendTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            PrintError::InvalidBackendUrl(_)
            | PrintError::InternalError(_)
            | PrintError::ProbeError(_)
            | PrintError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
