use std::sync::Arc;
use std::time::Duration;

use propsync::metrics::gather_text;
use propsync::CollectorConfig;
use propsync::ManagedObjectKind;
use propsync::ObjectRef;
use propsync::ObjectUpdate;
use propsync::PropertyChange;
use propsync::PropertyCollector;
use propsync::PropertyValue;
use propsync::Selector;
use propsync::WatchId;

use crate::commons::QueuedFeed;

fn vm_101() -> ObjectRef {
    "VirtualMachine:vm-101".parse().unwrap()
}

#[tokio::test]
async fn test_vm_rename_and_removal_are_mirrored() {
    let feed = QueuedFeed::new();
    let collector = PropertyCollector::virtual_machines(Arc::clone(&feed), ["name"]).unwrap();

    feed.publish(vec![ObjectUpdate::enter(vm_101(), [("name", PropertyValue::from("web-1"))])]);
    let vms = collector.get_properties().await.unwrap();
    assert_eq!(vms[&vm_101()]["name"], PropertyValue::from("web-1"));

    feed.publish(vec![ObjectUpdate::modify(
        vm_101(),
        [PropertyChange::assign("name", "web-1-renamed")],
    )]);
    let vms = collector.get_properties().await.unwrap();
    assert_eq!(vms[&vm_101()]["name"], PropertyValue::from("web-1-renamed"));

    feed.publish(vec![ObjectUpdate::leave(vm_101())]);
    let vms = collector.get_properties().await.unwrap();
    assert!(vms.is_empty());

    collector.close().await.unwrap();
    assert_eq!(feed.released(), vec![WatchId(1)]);
}

#[tokio::test]
async fn test_watch_uses_vm_traversal() {
    let feed = QueuedFeed::new();
    let collector = PropertyCollector::virtual_machines(Arc::clone(&feed), ["name", "runtime.powerState"]).unwrap();

    collector.get_properties().await.unwrap();

    let watches = feed.watches();
    assert_eq!(watches.len(), 1);
    assert_eq!(watches[0].kind(), &ManagedObjectKind::VirtualMachine);
    assert_eq!(watches[0].paths(), ["name", "runtime.powerState"]);
    assert!(watches[0].traversal().is_some());
    collector.close().await.unwrap();
}

#[tokio::test]
async fn test_expired_version_is_healed_transparently() {
    let feed = QueuedFeed::new();
    let collector = PropertyCollector::builder(
        Arc::clone(&feed),
        Selector::full_hierarchy(ManagedObjectKind::VirtualMachine, ["name"]).unwrap(),
    )
    .set_config(CollectorConfig {
        max_resync_attempts: 1,
        ..Default::default()
    })
    .build()
    .unwrap();
    feed.publish(vec![ObjectUpdate::enter(vm_101(), [("name", PropertyValue::from("web-1"))])]);
    collector.get_properties().await.unwrap();

    feed.expire_version();
    assert!(collector.check_for_updates().await.unwrap());

    feed.publish(vec![ObjectUpdate::enter(vm_101(), [("name", PropertyValue::from("web-1b"))])]);
    let vms = collector.get_properties().await.unwrap();
    assert_eq!(vms[&vm_101()]["name"], PropertyValue::from("web-1b"));
    assert!(gather_text().contains("propsync_resyncs_total{reason=\"stale\"}"));
    collector.close().await.unwrap();
}

#[tokio::test]
async fn test_wait_for_updates_reports_no_change() {
    let feed = QueuedFeed::new();
    let collector = PropertyCollector::host_systems(Arc::clone(&feed), ["name"]).unwrap();

    assert!(!collector.wait_for_updates(Duration::from_millis(10)).await.unwrap());

    feed.publish(vec![ObjectUpdate::enter(
        ObjectRef::new(ManagedObjectKind::HostSystem, "host-9"),
        [("name", PropertyValue::from("esx-9"))],
    )]);
    assert!(collector.wait_for_updates(Duration::from_millis(10)).await.unwrap());
    collector.close().await.unwrap();
}
