use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::Encoder;
use prometheus::IntCounter;
use prometheus::IntCounterVec;
use prometheus::IntGaugeVec;
use prometheus::Opts;
use prometheus::Registry;
use prometheus::TextEncoder;
use tracing::warn;

#[cfg(test)]
mod metrics_test;

lazy_static! {
    pub static ref MERGED_BATCHES: IntCounter = IntCounter::new(
        "propsync_merged_batches_total",
        "Change batches fully merged into a mirror"
    )
    .expect("metric can not be created");

    pub static ref RESYNCS: IntCounterVec = IntCounterVec::new(
        Opts::new("propsync_resyncs_total", "Reset-and-resync runs by cause"),
        &["reason"]
    )
    .expect("metric can not be created");

    pub static ref TRUNCATED_FOLLOWUPS: IntCounter = IntCounter::new(
        "propsync_truncated_followups_total",
        "Follow-up polls issued for truncated change batches"
    )
    .expect("metric can not be created");

    pub static ref MERGE_FAILURES: IntCounter = IntCounter::new(
        "propsync_merge_failures_total",
        "Change batches that could not be merged"
    )
    .expect("metric can not be created");

    pub static ref MIRROR_OBJECTS: IntGaugeVec = IntGaugeVec::new(
        Opts::new("propsync_mirror_objects", "Objects currently held by a mirror"),
        &["kind"]
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();
}

static REGISTER: Once = Once::new();

pub fn register_custom_metrics() {
    REGISTER.call_once(|| {
        REGISTRY
            .register(Box::new(MERGED_BATCHES.clone()))
            .expect("collector can be registered");
        REGISTRY
            .register(Box::new(RESYNCS.clone()))
            .expect("collector can be registered");
        REGISTRY
            .register(Box::new(TRUNCATED_FOLLOWUPS.clone()))
            .expect("collector can be registered");
        REGISTRY
            .register(Box::new(MERGE_FAILURES.clone()))
            .expect("collector can be registered");
        REGISTRY
            .register(Box::new(MIRROR_OBJECTS.clone()))
            .expect("collector can be registered");
    });
}

/// Render the crate registry in the prometheus text exposition format
pub fn gather_text() -> String {
    register_custom_metrics();

    let mut buffer = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer) {
        warn!("could not encode metrics: {:?}", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}
