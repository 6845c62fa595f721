pub mod config;
pub mod errors;
mod forward;
pub mod metrics_defs;
pub mod params;
mod service;

pub use errors::PrintError;
pub use service::{PrintHandler, PrintService};

use ows_rewrite::{ExternalOwsLayers, HttpGeometryProbe, RenderBackendVersion};
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::sync::Arc;
use std::time::Duration;

pub async fn run(config: config::Config) -> Result<(), PrintError> {
    let version = RenderBackendVersion::parse(&config.qgis_server_version);
    let probe = HttpGeometryProbe::new(Duration::from_secs(config.timeouts.probe_timeout_secs))?;
    tracing::info!(
        version = %version,
        external_wms = version.supports_external_wms(),
        "Configured QGIS Server version"
    );

    let rewriter = ExternalOwsLayers::new(version, Arc::new(probe));
    let print_service = PrintService::new(PrintHandler::new(&config, rewriter));

    let print_task = run_http_service(
        &config.listener.host,
        config.listener.port,
        print_service,
    );
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        AdminService::<_, PrintError>::new(|| true),
    );

    tokio::try_join!(print_task, admin_task)?;
    Ok(())
}
