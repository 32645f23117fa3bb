use anyhow::Context;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::{SpanExporter, WithExportConfig, WithHttpConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogFormat, TelemetryConfig};

/// Console log filter when `RUST_LOG` is unset. Logs go to stderr and the
/// chat happens on stdout, so keep the default quiet.
const DEFAULT_LOG_FILTER: &str = "warn";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Keeps the tracer provider alive; flushes pending spans on shutdown.
#[derive(Debug)]
pub struct TelemetryGuard {
    provider: Option<SdkTracerProvider>,
}

impl TelemetryGuard {
    /// Flush and stop the exporter. Safe to call more than once.
    pub fn shutdown(&mut self) -> anyhow::Result<()> {
        if let Some(provider) = self.provider.take() {
            provider
                .shutdown()
                .context("failed to flush trace exporter")?;
        }
        Ok(())
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            eprintln!("Telemetry shutdown error: {e:#}");
        }
    }
}

/// Initialize application telemetry.
///
/// Configures:
/// - `tracing-subscriber::fmt` on stderr, compact or JSON.
/// - `EnvFilter` for dynamic log levels (`RUST_LOG`).
/// - When `otlp_endpoint` is set, an OTLP/HTTP span exporter bridged through
///   `tracing-opentelemetry`, so the per-question, database and HTTP spans
///   reach the monitoring backend.
pub fn init(cfg: &TelemetryConfig) -> anyhow::Result<TelemetryGuard> {
    let filter_layer = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let fmt_layer: BoxedLayer = match cfg.log_format {
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_line_number(true)
            .compact()
            .with_filter(filter_layer)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .json()
            .with_filter(filter_layer)
            .boxed(),
    };

    let mut layers = vec![fmt_layer];

    let provider = match cfg.otlp_endpoint.as_deref().filter(|e| !e.trim().is_empty()) {
        Some(endpoint) => {
            let provider = build_tracer_provider(cfg, endpoint)?;
            let tracer = provider.tracer(cfg.service_name.clone());
            layers.push(
                tracing_opentelemetry::layer()
                    .with_tracer(tracer)
                    .with_filter(LevelFilter::INFO)
                    .boxed(),
            );
            opentelemetry::global::set_tracer_provider(provider.clone());
            Some(provider)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .context("tracing subscriber already initialized")?;

    tracing::info!(
        service.name = %cfg.service_name,
        otlp.enabled = provider.is_some(),
        "Telemetry initialized"
    );

    Ok(TelemetryGuard { provider })
}

fn build_tracer_provider(
    cfg: &TelemetryConfig,
    endpoint: &str,
) -> anyhow::Result<SdkTracerProvider> {
    let exporter = SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .with_headers(cfg.otlp_headers.clone())
        .build()
        .context("failed to build OTLP span exporter")?;

    let resource = Resource::builder()
        .with_service_name(cfg.service_name.clone())
        .build();

    Ok(SdkTracerProvider::builder()
        .with_resource(resource)
        .with_batch_exporter(exporter)
        .build())
}
