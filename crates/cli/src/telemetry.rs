//! Observability wiring: `tracing-subscriber` plus an optional OTLP exporter.

use anyhow::{Context, Result};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::{SpanExporter, WithExportConfig};
use opentelemetry_sdk::{runtime, trace::TracerProvider};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable naming the OTLP collector endpoint.
const OTLP_ENDPOINT_ENV: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

/// Keeps the tracer provider alive until [`Telemetry::shutdown`].
pub struct Telemetry {
    provider: Option<TracerProvider>,
}

impl Telemetry {
    /// Flushes pending spans and stops the exporter.
    pub fn shutdown(self) {
        if let Some(provider) = self.provider {
            if let Err(e) = provider.shutdown() {
                eprintln!("failed to shut down tracer provider: {e}");
            }
        }
    }
}

/// Tracing target of this binary's own events.
const CLI_TARGET: &str = env!("CARGO_CRATE_NAME");

fn default_filter(verbosity: u8) -> String {
    let (base, level) = match verbosity {
        0 => return "warn".to_string(),
        1 => ("warn", "info"),
        2 => ("info", "debug"),
        _ => ("debug", "trace"),
    };
    format!("{base},search={level},search_http={level},{CLI_TARGET}={level}")
}

/// Installs the global subscriber. Logs go to stderr so stdout carries only
/// command output.
///
/// `RUST_LOG` wins over the verbosity count when set.
pub fn init(verbosity: u8, json: bool) -> Result<Telemetry> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.is_empty() => EnvFilter::try_new(directives)
            .context("invalid RUST_LOG directives")?,
        _ => EnvFilter::new(default_filter(verbosity)),
    };

    let provider = match std::env::var(OTLP_ENDPOINT_ENV) {
        Ok(endpoint) if !endpoint.is_empty() => Some(otlp_provider(endpoint)?),
        _ => None,
    };
    let otel_layer = provider
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer("searchctl")));

    let registry = tracing_subscriber::registry().with(filter).with(otel_layer);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init()
    }
    .context("failed to install tracing subscriber")?;

    Ok(Telemetry { provider })
}

fn otlp_provider(endpoint: String) -> Result<TracerProvider> {
    let exporter = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .context("failed to create OTLP span exporter")?;

    Ok(TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_workspace_levels() {
        assert_eq!(default_filter(0), "warn");
        assert!(default_filter(1).contains("search=info"));
        assert!(default_filter(2).contains("search_http=debug"));
        assert!(default_filter(9).contains("search=trace"));
    }

    #[test]
    fn verbosity_covers_the_binary_own_events() {
        let own_target = module_path!().split("::").next().unwrap();
        assert!(default_filter(1).contains(&format!("{own_target}=info")));
        assert!(default_filter(3).contains(&format!("{own_target}=trace")));
    }
}
