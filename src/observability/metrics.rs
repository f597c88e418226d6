use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE
        .get_or_init(|| async {
            info!("Initializing Metrics ...");
            Metrics::new()
        })
        .await
}

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Stage metrics
    pub stage_requests: IntCounterVec,
    pub stage_failed_attempts: IntCounterVec,
    pub stage_failures: IntCounterVec,
    pub stage_duration: HistogramVec,

    // Signer metrics
    pub sign_duration: HistogramVec,

    // Outcome
    pub auth_success: IntCounter,
    pub auth_failures: IntCounterVec,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("siiauth".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Stage
            stage_requests: IntCounterVec::new(Opts::new("stage_requests_total", "Transport attempts by stage"), &["stage"]).unwrap(),
            stage_failed_attempts: IntCounterVec::new(Opts::new("stage_failed_attempts_total", "Failed transport attempts by stage and reason"), &["stage", "reason"]).unwrap(),
            stage_failures: IntCounterVec::new(Opts::new("stage_failures_total", "Stage failures by reason"), &["stage", "reason"]).unwrap(),
            stage_duration: HistogramVec::new(HistogramOpts::new("stage_duration_seconds", "Stage duration seconds").buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]), &["stage"]).unwrap(),

            sign_duration: HistogramVec::new(HistogramOpts::new("sign_duration_seconds", "Signer duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]), &["outcome"]).unwrap(),

            // Outcome
            auth_success: IntCounter::new("auth_success_total", "Tokens obtained").unwrap(),
            auth_failures: IntCounterVec::new(Opts::new("auth_failures_total", "Failed logins by reason"), &["reason"]).unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.stage_requests.clone())).unwrap();
        reg.register(Box::new(metrics.stage_failed_attempts.clone())).unwrap();
        reg.register(Box::new(metrics.stage_failures.clone())).unwrap();
        reg.register(Box::new(metrics.stage_duration.clone())).unwrap();
        reg.register(Box::new(metrics.sign_duration.clone())).unwrap();
        reg.register(Box::new(metrics.auth_success.clone())).unwrap();
        reg.register(Box::new(metrics.auth_failures.clone())).unwrap();

        metrics
    }

    /// Prometheus text exposition of every registered metric.
    pub fn render_text(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
