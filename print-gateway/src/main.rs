mod config;

use clap::{Parser, Subcommand};
use config::{CommonConfig, Config};
use metrics_exporter_statsd::StatsdBuilder;
use shared::metrics_defs::{MetricDef, MetricType};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(author, version, about = "Print gateway for QGIS Server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Serve print requests
    Run {
        #[arg(long)]
        config: PathBuf,
    },
    /// Load and validate a config file, then exit
    CheckConfig {
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    match &cli.command {
        CliCommand::Run { config } => {
            let config = load_config(config);
            let _sentry = init_logging(&config.common);
            init_metrics(&config.common);

            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(e) => {
                    eprintln!("Failed to start runtime: {e}");
                    process::exit(1);
                }
            };

            tracing::info!("Starting print gateway");
            if let Err(e) = runtime.block_on(print_proxy::run(config.print)) {
                tracing::error!(error = %e, "Print gateway stopped");
                eprintln!("Print gateway error: {e}");
                process::exit(1);
            }
        }
        CliCommand::CheckConfig { config } => {
            load_config(config);
            println!("Config OK: {}", config.display());
        }
    }
}

fn load_config(path: &Path) -> Config {
    match Config::from_file(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", path.display());
            process::exit(1);
        }
    }
}

fn init_logging(common: &CommonConfig) -> Option<sentry::ClientInitGuard> {
    let guard = common.logging.as_ref().map(|logging| {
        sentry::init((
            logging.sentry_dsn.as_str(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(guard.as_ref().map(|_| sentry::integrations::tracing::layer()))
        .init();

    guard
}

fn init_metrics(common: &CommonConfig) {
    let Some(metrics_config) = &common.metrics else {
        return;
    };

    let recorder = match StatsdBuilder::from(
        metrics_config.statsd_host.as_str(),
        metrics_config.statsd_port,
    )
    .build(Some("print_gateway"))
    {
        Ok(recorder) => recorder,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build statsd recorder, metrics disabled");
            return;
        }
    };

    if metrics::set_global_recorder(recorder).is_err() {
        tracing::error!("Failed to install metrics recorder");
        return;
    }

    for def in print_proxy::metrics_defs::ALL_METRICS
        .iter()
        .chain(ows_rewrite::metrics_defs::ALL_METRICS)
    {
        describe(def);
    }
}

fn describe(def: &MetricDef) {
    match def.metric_type {
        MetricType::Counter => metrics::describe_counter!(def.name, def.description),
        MetricType::Gauge => metrics::describe_gauge!(def.name, def.description),
        MetricType::Histogram => metrics::describe_histogram!(def.name, def.description),
    }
}
