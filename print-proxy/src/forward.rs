use crate::errors::PrintError;
use http::header::{CONTENT_TYPE, HeaderValue, ORIGIN};
use hyper::body::Bytes;
use hyper::Response;
use ows_rewrite::Params;
use shared::http::add_via_header;
use std::time::Duration;
use url::Url;

/// POST the print parameters form-encoded to the OGC service.
///
/// The whole response body is collected. Only the backend's status and
/// `content-type` are passed on; a Via header is added. `timeout` covers the
/// complete request/response cycle.
pub async fn send_to_backend(
    client: &reqwest::Client,
    url: Url,
    params: &Params,
    origin: Option<&HeaderValue>,
    timeout: Duration,
) -> Result<Response<Bytes>, PrintError> {
    // Use host as identifier for error messages
    let backend_identifier = url.host_str().unwrap_or(url.as_str()).to_string();
    let map_error = |e: reqwest::Error| {
        if e.is_timeout() {
            PrintError::BackendTimeout(backend_identifier.clone())
        } else {
            PrintError::BackendRequestFailed(backend_identifier.clone(), e.to_string())
        }
    };

    let form: Vec<(&str, &str)> = params
        .iter()
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect();

    let mut request = client.post(url).form(&form).timeout(timeout);
    if let Some(origin) = origin {
        request = request.header(ORIGIN, origin.clone());
    }

    let response = request.send().await.map_err(map_error)?;

    let status = response.status();
    let version = response.version();
    let content_type = response.headers().get(CONTENT_TYPE).cloned();

    let body = response.bytes().await.map_err(|e| {
        if e.is_timeout() {
            PrintError::BackendTimeout(backend_identifier.clone())
        } else {
            PrintError::ResponseBodyError(e.to_string())
        }
    })?;

    let mut builder = Response::builder().status(status);
    if let Some(content_type) = content_type {
        builder = builder.header(CONTENT_TYPE, content_type);
    }

    let mut response = builder
        .body(body)
        .map_err(|e| PrintError::InternalError(format!("Failed to build response: {e}")))?;
    add_via_header(response.headers_mut(), version);

    Ok(response)
}
