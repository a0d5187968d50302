//! Contract Test: Unchanged IP
//!
//! Verifies that the provider is only called when the address changes.
//!
//! Constraints verified:
//! - Equal resolution result: no provider call, exactly one `info` entry
//! - First-ever resolution always updates
//! - A new address updates and reports the previous one
//!
//! If this test fails, someone has:
//! - Removed the comparison against the last known IP
//! - Added extra log entries to the unchanged path

mod common;

use common::*;
use dyndns_core::{CycleOutcome, LogKind, LogSink, ProviderKind};
use std::sync::Arc;
use tokio_test::assert_ok;

#[tokio::test]
async fn unchanged_ip_skips_provider_and_logs_once() {
    let resolver = Arc::new(ScriptedResolver::new("203.0.113.5"));
    let provider = Arc::new(MockDnsProvider::new());
    let (monitor, sink) = build_monitor(&resolver, &provider);
    assert_ok!(monitor.reconfigure(test_config(ProviderKind::Ovh, 300)));

    // Establish the last known IP
    monitor.trigger_manual_check().await.unwrap().unwrap();
    assert_eq!(monitor.state().last_known_ip, Some(ip("203.0.113.5")));
    assert_eq!(provider.call_count(), 1);
    let before = sink.len().await;

    let outcome = monitor.trigger_manual_check().await.unwrap().unwrap();
    assert_eq!(outcome, CycleOutcome::Unchanged { ip: ip("203.0.113.5") });

    assert_eq!(provider.call_count(), 1, "provider must not be called for an unchanged IP");
    assert_eq!(sink.len().await, before + 1, "exactly one entry per unchanged cycle");

    let latest = &sink.recent(1).await.unwrap()[0];
    assert_eq!(latest.kind, LogKind::Info);
    assert_eq!(latest.message, "IP has not changed");
    assert_eq!(latest.ip, Some(ip("203.0.113.5")));
}

#[tokio::test]
async fn first_resolution_always_updates() {
    let resolver = Arc::new(ScriptedResolver::new("198.51.100.7"));
    let provider = Arc::new(MockDnsProvider::new());
    let (monitor, sink) = build_monitor(&resolver, &provider);
    monitor.reconfigure(test_config(ProviderKind::NoIp, 300)).unwrap();

    let outcome = monitor.trigger_manual_check().await.unwrap().unwrap();
    assert!(matches!(outcome, CycleOutcome::Updated { previous: None, .. }));

    let entries = sink.recent(10).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].message, "IP change detected: N/A -> 198.51.100.7");
    assert_eq!(entries[0].kind, LogKind::Success);
    assert_eq!(
        entries[0].message,
        "DNS updated successfully (NOIP): good 198.51.100.7"
    );

    let state = monitor.state();
    assert_eq!(state.last_success, Some(FixedClock::new().0));
    assert!(!state.updating);
}

#[tokio::test]
async fn changed_ip_reports_previous_address() {
    let resolver = Arc::new(ScriptedResolver::new("203.0.113.5"));
    let provider = Arc::new(MockDnsProvider::new());
    let (monitor, sink) = build_monitor(&resolver, &provider);
    monitor.reconfigure(test_config(ProviderKind::Ovh, 300)).unwrap();

    monitor.trigger_manual_check().await.unwrap();
    resolver.set_ip("203.0.113.9");

    let outcome = monitor.trigger_manual_check().await.unwrap().unwrap();
    match outcome {
        CycleOutcome::Updated { ip: new, previous, .. } => {
            assert_eq!(new, ip("203.0.113.9"));
            assert_eq!(previous, Some(ip("203.0.113.5")));
        }
        other => panic!("expected an update, got {:?}", other),
    }

    let calls = provider.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].ip, ip("203.0.113.9"));
    assert_eq!(calls[1].domain, "h.example.com");

    let change = &sink.recent(2).await.unwrap()[1];
    assert_eq!(change.message, "IP change detected: 203.0.113.5 -> 203.0.113.9");
}
