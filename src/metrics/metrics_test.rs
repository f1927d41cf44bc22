use super::*;

#[test]
fn test_gather_text_exposes_collectors() {
    MERGED_BATCHES.inc();
    RESYNCS.with_label_values(&["invalid_version"]).inc();
    MIRROR_OBJECTS.with_label_values(&["VirtualMachine"]).set(3);

    let text = gather_text();
    assert!(text.contains("propsync_merged_batches_total"));
    assert!(text.contains("propsync_resyncs_total{reason=\"invalid_version\"}"));
    assert!(text.contains("propsync_mirror_objects{kind=\"VirtualMachine\"}"));
}

#[test]
fn test_register_is_idempotent() {
    register_custom_metrics();
    register_custom_metrics();
    assert!(!REGISTRY.gather().is_empty());
}
