use crate::config::Config;
use crate::errors::PrintError;
use crate::forward::send_to_backend;
use crate::metrics_defs::{PRINT_REQUESTS, REQUEST_DURATION, REQUESTS_INFLIGHT};
use crate::params::PrintParams;
use http::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HeaderValue, ORIGIN};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use ows_rewrite::ExternalOwsLayers;
use shared::http::make_error_response;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Handles `POST /<mapid>` print requests.
///
/// The posted form is converted to GetPrint parameters, external OWS layers
/// are rewritten for the configured QGIS Server version and the result is
/// forwarded to `<ogc_service_url>/<mapid><qgs_postfix>`.
pub struct PrintHandler {
    ogc_service_url: Url,
    qgs_postfix: String,
    print_pdf_filename: Option<String>,
    backend_timeout: Duration,
    client: reqwest::Client,
    rewriter: ExternalOwsLayers,
}

impl PrintHandler {
    pub fn new(config: &Config, rewriter: ExternalOwsLayers) -> Self {
        Self {
            ogc_service_url: config.ogc_service_url.clone(),
            qgs_postfix: config.qgs_postfix.clone(),
            print_pdf_filename: config.print_pdf_filename.clone(),
            backend_timeout: Duration::from_secs(config.timeouts.backend_timeout_secs),
            client: reqwest::Client::new(),
            rewriter,
        }
    }

    pub async fn handle<B>(&self, request: Request<B>) -> Response<BoxBody<Bytes, PrintError>>
    where
        B: hyper::body::Body + Send,
        B::Error: std::fmt::Display,
    {
        let _inflight = InflightGuard::new();

        let response = match self.print(request).await {
            Ok(response) => response.map(|body| Full::new(body).map_err(|e| match e {}).boxed()),
            Err(e) => {
                tracing::error!(error = %e, "Print request failed");
                make_error_response(e.status_code())
            }
        };

        shared::counter!(PRINT_REQUESTS, "status" => response.status().as_str().to_string())
            .increment(1);

        response
    }

    async fn print<B>(&self, request: Request<B>) -> Result<Response<Bytes>, PrintError>
    where
        B: hyper::body::Body + Send,
        B::Error: std::fmt::Display,
    {
        if request.method() != Method::POST {
            return Ok(status_response(StatusCode::METHOD_NOT_ALLOWED));
        }

        let map_id = request.uri().path().trim_start_matches('/').to_string();
        if map_id.is_empty() {
            return Ok(status_response(StatusCode::NOT_FOUND));
        }

        let origin = request.headers().get(ORIGIN).cloned();
        let body = request
            .into_body()
            .collect()
            .await
            .map(|collected| collected.to_bytes())
            .map_err(|e| PrintError::RequestBodyError(e.to_string()))?;

        let PrintParams {
            mut params,
            content_disposition,
        } = PrintParams::from_form(&body);
        tracing::debug!(map_id = %map_id, params = ?params, "Print params");

        let layer_param = PrintParams::layer_param_of(&params)
            .ok_or(PrintError::MissingLayersParam)?
            .to_string();

        self.rewriter.update_params(&mut params, &layer_param).await;

        let url = self.backend_url(&map_id)?;
        tracing::info!(url = %url, "Forwarding print request");

        let mut response = send_to_backend(
            &self.client,
            url,
            &params,
            origin.as_ref(),
            self.backend_timeout,
        )
        .await?;

        let is_pdf = response
            .headers()
            .get(CONTENT_TYPE)
            .is_some_and(|content_type| content_type == PDF_CONTENT_TYPE);

        if is_pdf {
            let filename = match &self.print_pdf_filename {
                Some(filename) => filename.clone(),
                None => format!("{map_id}.pdf"),
            };
            let value = format!("{content_disposition}; filename={filename}");

            match HeaderValue::from_str(&value) {
                Ok(value) => {
                    response.headers_mut().insert(CONTENT_DISPOSITION, value);
                }
                Err(e) => {
                    tracing::warn!(value = %value, error = %e, "Invalid content-disposition");
                }
            }
        }

        Ok(response)
    }

    fn backend_url(&self, map_id: &str) -> Result<Url, PrintError> {
        let url = format!(
            "{}/{}{}",
            self.ogc_service_url.as_str().trim_end_matches('/'),
            map_id,
            self.qgs_postfix
        );
        Ok(Url::parse(&url)?)
    }
}

/// Counts a request as in flight until dropped, also when the handler future
/// is cancelled.
struct InflightGuard {
    started: Instant,
}

impl InflightGuard {
    fn new() -> Self {
        shared::gauge!(REQUESTS_INFLIGHT).increment(1);
        Self {
            started: Instant::now(),
        }
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        shared::gauge!(REQUESTS_INFLIGHT).decrement(1);
        shared::histogram!(REQUEST_DURATION).record(self.started.elapsed().as_secs_f64());
    }
}

fn status_response(status: StatusCode) -> Response<Bytes> {
    let mut response = Response::new(Bytes::from(format!(
        "{}\n",
        status.canonical_reason().unwrap_or_default()
    )));
    *response.status_mut() = status;
    response
}

/// hyper service wrapping a shared [`PrintHandler`]
#[derive(Clone)]
pub struct PrintService {
    handler: Arc<PrintHandler>,
}

impl PrintService {
    pub fn new(handler: PrintHandler) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }
}

impl Service<Request<Incoming>> for PrintService {
    type Response = Response<BoxBody<Bytes, PrintError>>;
    type Error = PrintError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let handler = self.handler.clone();
        Box::pin(async move { Ok(handler.handle(req).await) })
    }
}
