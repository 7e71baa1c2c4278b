use prometheus::{Encoder, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub dispatch_total: IntCounterVec,
    pub dispatch_latency_seconds: HistogramVec,
    pub distance_lookups: IntCounterVec,
    pub payouts_generated_total: IntCounter,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let dispatch_total = IntCounterVec::new(
            Opts::new("dispatch_total", "Dispatch attempts by outcome"),
            &["outcome"],
        )
        .expect("valid dispatch_total metric");

        let dispatch_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "dispatch_latency_seconds",
                "Latency of a single booking dispatch in seconds",
            ),
            &["outcome"],
        )
        .expect("valid dispatch_latency_seconds metric");

        let distance_lookups = IntCounterVec::new(
            Opts::new("distance_lookups_total", "Distance cache lookups by result"),
            &["result"],
        )
        .expect("valid distance_lookups_total metric");

        let payouts_generated_total = IntCounter::new(
            "payouts_generated_total",
            "Contractor payouts written by the weekly aggregator",
        )
        .expect("valid payouts_generated_total metric");

        registry
            .register(Box::new(dispatch_total.clone()))
            .expect("register dispatch_total");
        registry
            .register(Box::new(dispatch_latency_seconds.clone()))
            .expect("register dispatch_latency_seconds");
        registry
            .register(Box::new(distance_lookups.clone()))
            .expect("register distance_lookups_total");
        registry
            .register(Box::new(payouts_generated_total.clone()))
            .expect("register payouts_generated_total");

        Self {
            registry,
            dispatch_total,
            dispatch_latency_seconds,
            distance_lookups,
            payouts_generated_total,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
