use crate::config::Config;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{runtime, trace as sdktrace, Resource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Registry};

pub const CHAT_MESSAGES_TOTAL: &str = "chat_messages_total";
pub const UPSTREAM_FAILURES_TOTAL: &str = "lyzr_upstream_failures_total";
pub const WIDGET_LOADS_TOTAL: &str = "widget_loads_total";
pub const WIDGET_BLOCKED_TOTAL: &str = "widget_blocked_total";
pub const TICKETS_OPENED_TOTAL: &str = "tickets_opened_total";
pub const LYZR_REQUEST_DURATION: &str = "lyzr_request_duration_seconds";

pub struct ObservabilityGuard;

impl Drop for ObservabilityGuard {
    fn drop(&mut self) {
        shutdown();
    }
}

pub fn init(config: &Config) -> Result<ObservabilityGuard, Box<dyn std::error::Error>> {
    init_tracing(config)?;
    init_metrics(config)?;
    Ok(ObservabilityGuard)
}

fn init_tracing(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_thread_ids(true)
        .with_target(true);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "lyzr_desk=debug,tower_http=info,sqlx=warn".into());

    // Optional OTLP layer for distributed tracing
    if let Some(endpoint) = &config.otel_exporter_endpoint {
        let exporter = opentelemetry_otlp::new_exporter()
            .tonic()
            .with_endpoint(endpoint);

        let tracer = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(exporter)
            .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
                KeyValue::new("service.name", config.service_name.clone()),
            ])))
            .install_batch(runtime::Tokio)?;

        Registry::default()
            .with(env_filter)
            .with(fmt_layer)
            .with(tracing_opentelemetry::layer().with_tracer(tracer))
            .init();
    } else {
        Registry::default().with(env_filter).with(fmt_layer).init();
    }

    Ok(())
}

fn init_metrics(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let Some(port) = config.metrics_port else {
        tracing::info!("METRICS_PORT not set, Prometheus exporter disabled");
        return Ok(());
    };

    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()?;

    metrics::describe_counter!(CHAT_MESSAGES_TOTAL, "Chat messages relayed to Lyzr");
    metrics::describe_counter!(UPSTREAM_FAILURES_TOTAL, "Failed Lyzr calls");
    metrics::describe_counter!(WIDGET_LOADS_TOTAL, "Widget scripts served");
    metrics::describe_counter!(WIDGET_BLOCKED_TOTAL, "Widget loads refused by the domain gate");
    metrics::describe_counter!(TICKETS_OPENED_TOTAL, "Tickets opened from chat sessions");
    metrics::describe_histogram!(
        LYZR_REQUEST_DURATION,
        metrics::Unit::Seconds,
        "Latency of Lyzr calls"
    );

    tracing::info!("Metrics exporter (Prometheus) started on port {}", port);
    Ok(())
}

pub fn shutdown() {
    global::shutdown_tracer_provider();
}
