//! Traces and logs shipped over OTLP, Prometheus metrics served on their own
//! listener.

use std::future::ready;
use std::time::{Duration, Instant};

use axum::Router;
use axum::extract::{MatchedPath, Request};
use axum::http::Version;
use axum::middleware::Next;
use axum::response::Response;
use axum::routing::get;
use metrics::Unit;
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};
use opentelemetry::trace::{Span, SpanKind, Status, TraceError, Tracer};
use opentelemetry::{KeyValue, global};
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::{LogExporter, SpanExporter, WithExportConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::logs::{LogError, SdkLogger, SdkLoggerProvider};
use opentelemetry_sdk::trace::SdkTracerProvider;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

const SERVICE_NAME: &str = env!("CARGO_PKG_NAME");
const PROCESS_SAMPLE_PERIOD: Duration = Duration::from_secs(15);
/// Route label of requests no route matched, keeps label cardinality bounded.
const UNMATCHED_ROUTE: &str = "unmatched";

pub const HTTP_REQUESTS: &str = "http_server_requests_total";
pub const HTTP_DURATION: &str = "http_server_request_duration_seconds";
pub const RATE_LIMITED: &str = "rate_limited_requests_total";
pub const TRACKED_CLIENTS: &str = "rate_limiter_tracked_clients";
const PROCESS_CPU: &str = "process_cpu_usage_percent";
const PROCESS_MEMORY: &str = "process_resident_memory_bytes";

fn resource() -> Resource {
    Resource::builder().with_service_name(SERVICE_NAME).build()
}

/// Tracer provider exporting spans to the OTLP collector at `endpoint`.
pub fn setup_tracer(endpoint: &str) -> Result<SdkTracerProvider, TraceError> {
    let exporter = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource())
        .build())
}

/// `tracing` layer forwarding log events to the OTLP collector at `endpoint`.
pub fn setup_logging(
    endpoint: &str,
) -> Result<OpenTelemetryTracingBridge<SdkLoggerProvider, SdkLogger>, LogError> {
    let exporter = LogExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;
    let provider = SdkLoggerProvider::builder()
        .with_resource(resource())
        .with_batch_exporter(exporter)
        .build();

    Ok(OpenTelemetryTracingBridge::new(&provider))
}

fn describe_metrics() {
    metrics::describe_counter!(HTTP_REQUESTS, Unit::Count, "Requests answered, by method, route and status.");
    metrics::describe_histogram!(HTTP_DURATION, Unit::Seconds, "Time spent answering a request.");
    metrics::describe_counter!(RATE_LIMITED, Unit::Count, "Requests refused with 429.");
    metrics::describe_gauge!(TRACKED_CLIENTS, Unit::Count, "Clients with requests inside the current window.");
    metrics::describe_gauge!(PROCESS_CPU, Unit::Percent, "CPU used by this process.");
    metrics::describe_gauge!(PROCESS_MEMORY, Unit::Bytes, "Resident memory of this process.");
}

/// Install the global Prometheus recorder.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    const LATENCY_BUCKETS: &[f64] = &[
        0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
    ];

    describe_metrics();

    PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full(HTTP_DURATION.to_owned()), LATENCY_BUCKETS)?
        .install_recorder()
}

/// Sample CPU and memory of this process until `shutdown` flips to `true`.
pub fn spawn_process_collector(mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let pid = Pid::from_u32(std::process::id());
        let mut system = System::new_with_specifics(RefreshKind::nothing());
        let mut interval = tokio::time::interval(PROCESS_SAMPLE_PERIOD);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    system.refresh_processes_specifics(
                        ProcessesToUpdate::Some(&[pid]),
                        true,
                        ProcessRefreshKind::nothing().with_memory().with_cpu(),
                    );

                    if let Some(process) = system.process(pid) {
                        metrics::gauge!(PROCESS_CPU).set(f64::from(process.cpu_usage()));
                        metrics::gauge!(PROCESS_MEMORY).set(process.memory() as f64);
                    }
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                },
            }
        }

        tracing::debug!("process collector stopped");
    })
}

/// Router exposing `GET /metrics`. Served on its own listener.
pub fn metrics_router(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || ready(handle.render())))
}

/// `network.protocol.version` of an HTTP version.
fn protocol_version(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_11 => "1.1",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "unknown",
    }
}

/// Route template of the request, never the raw path.
fn route_label(req: &Request) -> String {
    req.extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_owned())
}

/// Count and time every request and open a server span for it.
pub async fn track(req: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = req.method().to_string();
    let route = route_label(&req);
    let version = protocol_version(req.version());

    let tracer = global::tracer(SERVICE_NAME);
    let mut span = tracer
        .span_builder(format!("{method} {route}"))
        .with_kind(SpanKind::Server)
        .with_attributes([
            KeyValue::new("http.request.method", method.clone()),
            KeyValue::new("http.route", route.clone()),
            KeyValue::new("network.protocol.version", version),
        ])
        .start(&tracer);

    let response = next.run(req).await;
    let status = response.status();

    span.set_attribute(KeyValue::new("http.response.status_code", i64::from(status.as_u16())));
    if status.is_server_error() {
        span.set_status(Status::error(status.to_string()));
    }
    span.end();

    let labels = [
        ("method", method),
        ("route", route),
        ("status", status.as_u16().to_string()),
    ];
    metrics::counter!(HTTP_REQUESTS, &labels).increment(1);
    metrics::histogram!(HTTP_DURATION, &labels).record(started.elapsed().as_secs_f64());

    response
}
