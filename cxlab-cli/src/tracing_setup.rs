//! Logging for the cxlab CLI
//!
//! One subscriber: an `EnvFilter`, a compact stderr layer, and (with the
//! `telemetry` feature and `--otel`) an OTLP span layer. stdout is reserved for
//! command output such as `query` rows.
//!
//! Environment variables:
//!   RUST_LOG                          # Overrides the default directives below
//!   OTEL_EXPORTER_OTLP_ENDPOINT       # OTLP endpoint (default: http://localhost:4317)
//!   OTEL_SERVICE_NAME                 # Service name (default: cxlab)

use anyhow::{anyhow, Result};
use tracing::Subscriber;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    /// Raise cxlab's own crates to `debug` unless RUST_LOG is set
    pub debug: bool,
    /// Enable OpenTelemetry OTLP export
    pub otel: bool,
}

/// Filter used when RUST_LOG is unset. sqlx stays one level below cxlab.
fn default_directives(debug: bool) -> &'static str {
    if debug {
        "warn,cxlab=debug,cxlab_db=debug,sqlx=info"
    } else {
        "warn,cxlab=info,cxlab_db=info,sqlx=warn"
    }
}

fn env_filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(debug)))
}

fn console_layer<S>(debug: bool) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(debug)
        .compact()
}

#[cfg(feature = "telemetry")]
fn otlp_layer<S>() -> Result<impl Layer<S>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::trace::TracerProvider;

    let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
        .unwrap_or_else(|_| "http://localhost:4317".to_string());
    let service_name =
        std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "cxlab".to_string());

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&endpoint)
        .build()
        .map_err(|e| anyhow!("Failed to create OTLP exporter: {}", e))?;

    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
        .with_resource(opentelemetry_sdk::Resource::new(vec![
            KeyValue::new("service.name", service_name),
            KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
        ]))
        .build();
    let tracer = provider.tracer("cxlab");

    // Held globally until shutdown_otel() flushes it
    let _ = opentelemetry::global::set_tracer_provider(provider);

    Ok(tracing_opentelemetry::layer().with_tracer(tracer))
}

/// Install the global subscriber.
///
/// `--otel` without the `telemetry` feature falls back to console logging.
pub fn init(config: &TracingConfig) -> Result<()> {
    let subscriber = tracing_subscriber::registry()
        .with(env_filter(config.debug))
        .with(console_layer(config.debug));

    #[cfg(feature = "telemetry")]
    let subscriber = subscriber.with(if config.otel { Some(otlp_layer()?) } else { None });

    #[cfg(not(feature = "telemetry"))]
    if config.otel {
        eprintln!("--otel ignored: cxlab was built without the `telemetry` feature");
    }

    subscriber.try_init().map_err(|err| anyhow!(err))
}

/// Flush pending spans
#[cfg(feature = "telemetry")]
pub fn shutdown_otel() {
    opentelemetry::global::shutdown_tracer_provider();
}

#[cfg(not(feature = "telemetry"))]
pub fn shutdown_otel() {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directives_parse() {
        for debug in [false, true] {
            assert!(EnvFilter::try_new(default_directives(debug)).is_ok());
        }
    }

    #[test]
    fn debug_only_raises_cxlab_crates() {
        assert!(default_directives(true).contains("cxlab_db=debug"));
        assert!(default_directives(true).starts_with("warn,"));
        assert!(default_directives(false).contains("sqlx=warn"));
    }
}
