#![cfg(test)]
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use apdash_common::network::device::IdentityRecord;
use apdash_common::network::page::ResultPage;
use apdash_common::ports::SourceError;
use apdash_core::presence::{PresenceAggregator, RenderError};
use apdash_core::resolver::DeviceResolver;
use tokio::time::Instant;

use crate::fakes::{MemoryStore, StaticSource};

const BUDGET: Duration = Duration::from_secs(5);

fn aggregator(source: StaticSource, store: Arc<MemoryStore>, prefixes: &[&str]) -> PresenceAggregator {
    let prefixes = prefixes.iter().map(|p| p.to_string()).collect();
    let resolver = DeviceResolver::new(store, prefixes);
    PresenceAggregator::new(Arc::new(source), Arc::new(resolver))
}

fn ip(text: &str) -> IpAddr {
    text.parse().unwrap()
}

/// One known device and one the DHCP server has never seen, on the same AP.
#[tokio::test]
async fn known_and_unknown_devices_share_a_group() {
    let store = MemoryStore::new()
        .lease("p::", "aa:aa:aa:aa:aa:01", "10.0.0.5")
        .identity("p::", "aa:aa:aa:aa:aa:01", IdentityRecord::new("laptop", "MSFT 5.0"));
    let source = StaticSource::new(&[("bb:bb:bb:bb:bb:02", "ap1"), ("aa:aa:aa:aa:aa:01", "ap1")]);

    let page = aggregator(source, Arc::new(store), &["p::"])
        .render_within(BUDGET)
        .await
        .unwrap();

    assert_eq!(page.groups.len(), 1);
    let group = page.group("ap1").unwrap();
    assert_eq!(group.members.len(), 2);

    let known = &group.members[0];
    assert_eq!(known.address.to_string(), "aa:aa:aa:aa:aa:01");
    assert_eq!(known.ips, vec![ip("10.0.0.5")]);
    assert_eq!(known.hostname, "laptop");
    assert_eq!(known.vendor_label, "MSFT 5.0");

    let unknown = &group.members[1];
    assert_eq!(unknown.address.to_string(), "bb:bb:bb:bb:bb:02");
    assert!(unknown.ips.is_empty());
    assert_eq!(unknown.hostname, "");
    assert_eq!(unknown.vendor_class, "");
}

#[tokio::test]
async fn lease_is_found_whichever_prefix_holds_it() {
    let all = ["a::", "b::", "c::"];
    for holder in all {
        let store = MemoryStore::new().lease(holder, "aa:aa:aa:aa:aa:01", "10.0.0.5");
        let source = StaticSource::new(&[("aa:aa:aa:aa:aa:01", "ap1")]);

        let page = aggregator(source, Arc::new(store), &all)
            .render_within(BUDGET)
            .await
            .unwrap();
        assert_eq!(page.groups[0].members[0].ips, vec![ip("10.0.0.5")], "held by {holder}");
    }
}

#[tokio::test]
async fn every_prefix_is_asked_twice_per_device() {
    let store = Arc::new(MemoryStore::new());
    let source = StaticSource::new(&[("aa:aa:aa:aa:aa:01", "ap1"), ("aa:aa:aa:aa:aa:02", "ap2")]);

    aggregator(source, Arc::clone(&store), &["a::", "b::"])
        .render_within(BUDGET)
        .await
        .unwrap();
    assert_eq!(store.reads(), 8);
}

#[tokio::test]
async fn render_is_idempotent() {
    let store = Arc::new(
        MemoryStore::new()
            .lease("p::", "aa:aa:aa:aa:aa:01", "10.0.0.9")
            .lease("q::", "aa:aa:aa:aa:aa:01", "10.0.0.5")
            .identity("p::", "cc:cc:cc:cc:cc:03", IdentityRecord::new("tv", "")),
    );
    let source = StaticSource::new(&[
        ("cc:cc:cc:cc:cc:03", "wlan1"),
        ("aa:aa:aa:aa:aa:01", "wlan0"),
        ("bb:bb:bb:bb:bb:02", "wlan0"),
    ]);
    let aggregator = aggregator(source, store, &["p::", "q::"]);

    let first: ResultPage = aggregator.render_within(BUDGET).await.unwrap();
    let second: ResultPage = aggregator.render_within(BUDGET).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.total_devices(), 3);
    assert_eq!(
        first.group("wlan0").unwrap().members[0].ips,
        vec![ip("10.0.0.5"), ip("10.0.0.9")]
    );
}

#[tokio::test]
async fn groups_and_members_are_ordered() {
    let source = StaticSource::new(&[
        ("ff:00:00:00:00:01", "zulu"),
        ("0a:00:00:00:00:01", "alpha"),
        ("0B:00:00:00:00:01", "alpha"),
        ("01:00:00:00:00:01", "alpha"),
        ("10:00:00:00:00:01", "mike"),
    ]);
    let page = aggregator(source, Arc::new(MemoryStore::new()), &["p::"])
        .render_within(BUDGET)
        .await
        .unwrap();

    let names: Vec<&str> = page.groups.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "mike", "zulu"]);

    let alpha: Vec<String> = page.groups[0]
        .members
        .iter()
        .map(|m| m.address.to_string())
        .collect();
    assert_eq!(
        alpha,
        vec!["01:00:00:00:00:01", "0a:00:00:00:00:01", "0b:00:00:00:00:01"]
    );
}

#[tokio::test]
async fn renamed_groups_merge_and_sort_by_display_name() {
    let source = StaticSource::new(&[
        ("aa:aa:aa:aa:aa:01", "wlan0"),
        ("aa:aa:aa:aa:aa:02", "wlan1"),
        ("aa:aa:aa:aa:aa:03", "wlan2"),
    ]);
    let rename = HashMap::from([
        ("wlan0".to_string(), "Upstairs".to_string()),
        ("wlan1".to_string(), "Upstairs".to_string()),
        ("wlan2".to_string(), "Garage".to_string()),
    ]);
    let page = aggregator(source, Arc::new(MemoryStore::new()), &["p::"])
        .with_rename(rename)
        .render_within(BUDGET)
        .await
        .unwrap();

    let names: Vec<&str> = page.groups.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["Garage", "Upstairs"]);
    assert_eq!(page.group("Upstairs").unwrap().members.len(), 2);
}

#[tokio::test]
async fn long_vendor_class_is_shortened_for_display_only() {
    let store = MemoryStore::new().identity(
        "p::",
        "aa:aa:aa:aa:aa:01",
        IdentityRecord::new("console", "MSFT 5.0 XBOX ONE 20"),
    );
    let source = StaticSource::new(&[("aa:aa:aa:aa:aa:01", "ap1")]);

    let page = aggregator(source, Arc::new(store), &["p::"])
        .render_within(BUDGET)
        .await
        .unwrap();
    let device = &page.groups[0].members[0];
    assert_eq!(device.vendor_label, "MSFT 5.0 XBOX...");
    assert_eq!(device.vendor_class, "MSFT 5.0 XBOX ONE 20");
}

#[tokio::test(start_paused = true)]
async fn hung_store_does_not_hold_up_the_render() {
    let store = MemoryStore::new()
        .lease("fast::", "aa:aa:aa:aa:aa:01", "10.0.0.5")
        .hang_prefix("slow::");
    let source = StaticSource::new(&[("aa:aa:aa:aa:aa:01", "ap1"), ("bb:bb:bb:bb:bb:02", "ap1")]);
    let aggregator = aggregator(source, Arc::new(store), &["fast::", "slow::"]);

    let started = Instant::now();
    let deadline = started + Duration::from_secs(2);
    let page = aggregator.render(deadline).await.unwrap();

    assert!(Instant::now() <= deadline + Duration::from_millis(1));
    let members = &page.groups[0].members;
    assert_eq!(members.len(), 2);
    assert_eq!(members[0].ips, vec![ip("10.0.0.5")]);
    assert!(members[1].ips.is_empty());
    assert_eq!(members[1].hostname, "");
}

#[tokio::test]
async fn source_failure_fails_the_render() {
    let source = StaticSource::failing(SourceError::Rejected("permission denied".into()));
    let result = aggregator(source, Arc::new(MemoryStore::new()), &["p::"])
        .render_within(BUDGET)
        .await;

    let err = result.unwrap_err();
    assert!(matches!(err, RenderError::Association(_)));
    assert_eq!(err.to_string(), "error listing associated clients: permission denied");
}

#[tokio::test]
async fn page_serializes_for_the_dashboard() {
    let store = MemoryStore::new()
        .lease("p::", "aa:aa:aa:aa:aa:01", "10.0.0.5")
        .identity("p::", "aa:aa:aa:aa:aa:01", IdentityRecord::new("laptop", "MSFT 5.0"));
    let source = StaticSource::new(&[("aa:aa:aa:aa:aa:01", "ap1")]);

    let page = aggregator(source, Arc::new(store), &["p::"])
        .render_within(BUDGET)
        .await
        .unwrap();
    let json = serde_json::to_value(&page).unwrap();

    assert_eq!(
        json,
        serde_json::json!({
            "groups": [{
                "name": "ap1",
                "members": [{
                    "address": "aa:aa:aa:aa:aa:01",
                    "ips": ["10.0.0.5"],
                    "attachment_point": "ap1",
                    "hostname": "laptop",
                    "vendor_class": "MSFT 5.0",
                    "vendor_label": "MSFT 5.0"
                }]
            }]
        })
    );
}
