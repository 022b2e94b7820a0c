//! Traces, logs and metrics export.

use std::time::{Duration, Instant};

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use metrics::{Unit, counter, describe_gauge, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use opentelemetry::KeyValue;
use opentelemetry::global;
use opentelemetry::trace::{Span, Tracer};
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::{LogExporter, SpanExporter, WithExportConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::logs::{SdkLogger, SdkLoggerProvider};
use opentelemetry_sdk::trace::SdkTracerProvider;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System};

use crate::error::ServerError;

const REQUEST_DURATION: &str = "http_requests_duration_seconds";
const SAMPLE_INTERVAL: Duration = Duration::from_secs(10);

/// Log bridge for `tracing-subscriber` and the provider to flush on exit.
pub type LogExport = (
    OpenTelemetryTracingBridge<SdkLoggerProvider, SdkLogger>,
    SdkLoggerProvider,
);

fn service_resource() -> Resource {
    Resource::builder()
        .with_service_name(env!("CARGO_PKG_NAME"))
        .build()
}

fn telemetry_error(
    err: impl std::error::Error + Send + Sync + 'static,
) -> ServerError {
    ServerError::Telemetry(Box::new(err))
}

/// Export spans to the OTLP collector at `endpoint` and make it the global
/// tracer provider.
pub fn setup_tracer(endpoint: &str) -> Result<SdkTracerProvider, ServerError> {
    let exporter = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .map_err(telemetry_error)?;

    let provider = SdkTracerProvider::builder()
        .with_resource(service_resource())
        .with_batch_exporter(exporter)
        .build();
    global::set_tracer_provider(provider.clone());

    Ok(provider)
}

/// Export `tracing` events as OTLP log records.
pub fn setup_logging(endpoint: &str) -> Result<LogExport, ServerError> {
    let exporter = LogExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .map_err(telemetry_error)?;

    let provider = SdkLoggerProvider::builder()
        .with_resource(service_resource())
        .with_batch_exporter(exporter)
        .build();

    Ok((OpenTelemetryTracingBridge::new(&provider), provider))
}

/// Install the global Prometheus recorder and start sampling process usage.
pub fn setup_metrics_recorder() -> Result<PrometheusHandle, ServerError> {
    const BUCKETS: &[f64] = &[
        0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
    ];

    describe_gauge!(
        "process_cpu_usage",
        Unit::Percent,
        "CPU usage of the process in percentage."
    );
    describe_gauge!(
        "process_memory_used_bytes",
        Unit::Bytes,
        "Total process memory in bytes."
    );

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full(REQUEST_DURATION.to_owned()), BUCKETS)
        .and_then(PrometheusBuilder::install_recorder)
        .map_err(telemetry_error)?;

    tokio::spawn(sample_process());

    Ok(handle)
}

async fn sample_process() {
    let pid = Pid::from_u32(std::process::id());
    let mut system = System::new_with_specifics(RefreshKind::nothing());
    let refresh = ProcessRefreshKind::nothing().with_memory().with_cpu();

    loop {
        system.refresh_processes_specifics(ProcessesToUpdate::Some(&[pid]), true, refresh);

        if let Some(process) = system.process(pid) {
            gauge!("process_memory_used_bytes").set(process.memory() as f64);
            gauge!("process_cpu_usage").set(process.cpu_usage() as f64);
        }

        tokio::time::sleep(SAMPLE_INTERVAL).await;
    }
}

/// Route layer recording one span, one counter increment and one latency
/// sample per request.
pub async fn track(req: Request, next: Next) -> Response {
    let started = Instant::now();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| req.uri().path(), MatchedPath::as_str)
        .to_owned();
    let method = req.method().to_string();
    let version = format!("{:?}", req.version());

    let mut span = global::tracer(env!("CARGO_PKG_NAME")).start("http-request");

    let response = next.run(req).await;
    let status = response.status().as_u16().to_string();

    span.set_attributes([
        KeyValue::new("http.version", version),
        KeyValue::new("http.route", path.clone()),
        KeyValue::new("http.method", method.clone()),
        KeyValue::new("http.status", status.clone()),
    ]);
    span.end();

    let labels = [("method", method), ("path", path), ("status", status)];
    counter!("http_requests_total", &labels).increment(1);
    histogram!(REQUEST_DURATION, &labels).record(started.elapsed().as_secs_f64());

    response
}
