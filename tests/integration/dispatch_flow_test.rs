// tests/integration/dispatch_flow_test.rs

use std::sync::Arc;
use std::time::Duration;

use httpmock::{Method::POST, MockServer};
use tokio::sync::mpsc;

use notification_router::domain::error::{NotifierError, SkipReason};
use notification_router::domain::model::alert::{AlertRule, EventSource, LocalObjectReference};
use notification_router::domain::model::event::{Event, InvolvedObject, METADATA_REVISION, METADATA_SUMMARY};
use notification_router::domain::model::provider::{Provider, Secret, SECRET_TOKEN_KEY};
use notification_router::domain::model::severity::Severity;
use notification_router::repository::directory::InMemoryDirectory;
use notification_router::service::alert_matcher::InvalidPattern;
use notification_router::service::dispatch_reporter::{DeliveryTarget, DispatchReporter};
use notification_router::service::notification_dispatcher::{DispatchOutcome, NotificationDispatcher};

#[derive(Debug)]
struct Delivery {
    provider: String,
    notification: Event,
    error: Option<String>,
}

struct ChannelReporter {
    tx: mpsc::UnboundedSender<Delivery>,
}

impl DispatchReporter for ChannelReporter {
    fn invalid_exclusion(&self, _rule: &AlertRule, _pattern: &InvalidPattern) {}
    fn discarded(&self, _event: &Event) {}
    fn dispatching(&self, _event: &Event, _deliveries: usize) {}
    fn rule_skipped(&self, _rule: &AlertRule, _reason: &SkipReason) {}

    fn delivered(&self, target: &DeliveryTarget, notification: &Event) {
        let _ = self.tx.send(Delivery {
            provider: target.provider_name.clone(),
            notification: notification.clone(),
            error: None,
        });
    }

    fn delivery_failed(&self, target: &DeliveryTarget, notification: &Event, error: &NotifierError) {
        let _ = self.tx.send(Delivery {
            provider: target.provider_name.clone(),
            notification: notification.clone(),
            error: Some(error.to_string()),
        });
    }
}

fn setup(directory: InMemoryDirectory) -> (NotificationDispatcher, mpsc::UnboundedReceiver<Delivery>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let dispatcher = NotificationDispatcher::new(Arc::new(directory), Arc::new(ChannelReporter { tx }))
        .with_notifier_timeout(Duration::from_secs(5));
    (dispatcher, rx)
}

async fn collect(rx: &mut mpsc::UnboundedReceiver<Delivery>, expected: usize) -> Vec<Delivery> {
    let mut deliveries = Vec::with_capacity(expected);
    while deliveries.len() < expected {
        tokio::select! {
            Some(delivery) = rx.recv() => deliveries.push(delivery),
            _ = tokio::time::sleep(Duration::from_secs(10)) => {
                panic!("timed out waiting for deliveries, got {}", deliveries.len());
            }
        }
    }
    deliveries.sort_by(|a, b| a.provider.cmp(&b.provider));
    deliveries
}

fn event(severity: Severity) -> Event {
    Event::new(
        InvolvedObject {
            kind: "Kustomization".into(),
            name: "infra".into(),
            namespace: "flux-system".into(),
            ..Default::default()
        },
        severity,
        "ReconciliationFailed",
        "kustomize build failed",
    )
    .with_metadata(METADATA_REVISION, "main/4f0c9e1")
}

fn rule(name: &str, provider: &str) -> AlertRule {
    let mut rule = AlertRule::new("flux-system", name, provider);
    rule.spec.event_sources = vec![EventSource {
        kind: "Kustomization".into(),
        name: "*".into(),
        namespace: String::new(),
    }];
    rule.set_ready(true);
    rule
}

#[tokio::test]
async fn no_matching_rule_issues_no_deliveries() {
    let server = MockServer::start_async().await;
    let hook = server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(200);
        })
        .await;

    let directory = InMemoryDirectory::new();
    let mut helm_only = rule("helm", "hook");
    helm_only.spec.event_sources[0].kind = "HelmRelease".into();
    directory.upsert_alert(helm_only).await;
    directory
        .upsert_provider(Provider::new("flux-system", "hook", "generic", server.url("/hook")))
        .await;

    let (dispatcher, mut rx) = setup(directory);
    let outcome = dispatcher.dispatch(&event(Severity::Error)).await.unwrap();
    assert_eq!(outcome, DispatchOutcome::NoMatch);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(rx.try_recv().is_err());
    hook.assert_hits_async(0).await;
}

#[tokio::test]
async fn failing_destination_does_not_block_the_other() {
    let server = MockServer::start_async().await;
    let healthy = server
        .mock_async(|when, then| {
            when.method(POST).path("/healthy");
            then.status(200);
        })
        .await;

    let directory = InMemoryDirectory::new();
    directory.upsert_alert(rule("to-broken", "broken")).await;
    directory.upsert_alert(rule("to-healthy", "healthy")).await;
    // Nothing listens on port 1.
    directory
        .upsert_provider(Provider::new("flux-system", "broken", "generic", "http://127.0.0.1:1/hook"))
        .await;
    directory
        .upsert_provider(Provider::new("flux-system", "healthy", "generic", server.url("/healthy")))
        .await;

    let (dispatcher, mut rx) = setup(directory);
    let outcome = dispatcher.dispatch(&event(Severity::Error)).await.unwrap();
    assert_eq!(outcome, DispatchOutcome::Dispatched { matched: 2, spawned: 2 });

    let deliveries = collect(&mut rx, 2).await;
    assert_eq!(deliveries[0].provider, "broken");
    assert!(deliveries[0].error.is_some());
    assert_eq!(deliveries[1].provider, "healthy");
    assert!(deliveries[1].error.is_none());
    healthy.assert_async().await;
}

#[tokio::test]
async fn slow_destination_neither_delays_dispatch_nor_the_other_delivery() {
    let server = MockServer::start_async().await;
    let slow = server
        .mock_async(|when, then| {
            when.method(POST).path("/slow");
            then.status(200).delay(Duration::from_secs(3));
        })
        .await;
    let fast = server
        .mock_async(|when, then| {
            when.method(POST).path("/fast");
            then.status(200);
        })
        .await;

    let directory = InMemoryDirectory::new();
    directory.upsert_alert(rule("to-slow", "slow")).await;
    directory.upsert_alert(rule("to-fast", "fast")).await;
    directory
        .upsert_provider(Provider::new("flux-system", "slow", "generic", server.url("/slow")))
        .await;
    directory
        .upsert_provider(Provider::new("flux-system", "fast", "generic", server.url("/fast")))
        .await;

    let (dispatcher, mut rx) = setup(directory);
    let started = std::time::Instant::now();
    let outcome = dispatcher.dispatch(&event(Severity::Error)).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(1), "dispatch took {:?}", started.elapsed());
    assert_eq!(outcome, DispatchOutcome::Dispatched { matched: 2, spawned: 2 });

    let first = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("fast delivery should not wait for the slow one")
        .unwrap();
    assert_eq!(first.provider, "fast");
    assert!(first.error.is_none());
    assert!(started.elapsed() < Duration::from_secs(2));
    fast.assert_async().await;

    let second = collect(&mut rx, 1).await;
    assert_eq!(second[0].provider, "slow");
    assert!(second[0].error.is_none());
    assert!(started.elapsed() >= Duration::from_secs(3));
    slow.assert_async().await;
}

#[tokio::test]
async fn token_only_secret_keeps_provider_address() {
    let server = MockServer::start_async().await;
    let status = server
        .mock_async(|when, then| {
            when.method(POST)
                .path_contains("/api/v4/projects/")
                .path_contains("/statuses/4f0c9e1")
                .header("authorization", "Bearer from-secret");
            then.status(201);
        })
        .await;

    let directory = InMemoryDirectory::new();
    directory.upsert_alert(rule("commit-status", "gitlab")).await;

    let mut provider = Provider::new("flux-system", "gitlab", "gitlab", server.url("/org/infra.git"));
    provider.spec.secret_ref = Some(LocalObjectReference { name: "gitlab-token".into() });
    directory.upsert_provider(provider).await;
    directory
        .upsert_secret(Secret::new("flux-system", "gitlab-token").with_entry(SECRET_TOKEN_KEY, "from-secret"))
        .await;

    let (dispatcher, mut rx) = setup(directory);
    dispatcher.dispatch(&event(Severity::Error)).await.unwrap();

    let deliveries = collect(&mut rx, 1).await;
    assert_eq!(deliveries[0].error, None);
    status.assert_async().await;
}

#[tokio::test]
async fn summary_is_only_added_for_its_own_rule() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(202);
        })
        .await;

    let directory = InMemoryDirectory::new();
    let mut with_summary = rule("with-summary", "a");
    with_summary.spec.summary = Some("production".into());
    directory.upsert_alert(with_summary).await;
    directory.upsert_alert(rule("without-summary", "b")).await;
    directory
        .upsert_provider(Provider::new("flux-system", "a", "generic", server.url("/a")))
        .await;
    directory
        .upsert_provider(Provider::new("flux-system", "b", "generic", server.url("/b")))
        .await;

    let (dispatcher, mut rx) = setup(directory);
    let original = event(Severity::Error);
    dispatcher.dispatch(&original).await.unwrap();

    let deliveries = collect(&mut rx, 2).await;
    assert_eq!(deliveries[0].notification.metadata_value(METADATA_SUMMARY), Some("production"));
    assert_eq!(deliveries[1].notification.metadata_value(METADATA_SUMMARY), None);
    assert_eq!(deliveries[1].notification.metadata_value(METADATA_REVISION), Some("main/4f0c9e1"));
    assert_eq!(original.metadata_value(METADATA_SUMMARY), None);
}

#[tokio::test]
async fn overlapping_sources_deliver_once_per_source() {
    let server = MockServer::start_async().await;
    let hook = server
        .mock_async(|when, then| {
            when.method(POST).path("/hook");
            then.status(200);
        })
        .await;

    let directory = InMemoryDirectory::new();
    let mut overlapping = rule("overlap", "hook");
    overlapping.spec.event_sources.push(EventSource {
        kind: "Kustomization".into(),
        name: "infra".into(),
        namespace: "flux-system".into(),
    });
    directory.upsert_alert(overlapping).await;
    directory
        .upsert_provider(Provider::new("flux-system", "hook", "generic", server.url("/hook")))
        .await;

    let (dispatcher, mut rx) = setup(directory);
    let outcome = dispatcher.dispatch(&event(Severity::Info)).await.unwrap();
    assert_eq!(outcome, DispatchOutcome::Dispatched { matched: 2, spawned: 2 });

    collect(&mut rx, 2).await;
    hook.assert_hits_async(2).await;
}

#[tokio::test]
async fn gitlab_delivery_errors_are_reported_not_returned() {
    let server = MockServer::start_async().await;
    let status = server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(201);
        })
        .await;

    let directory = InMemoryDirectory::new();
    directory.upsert_alert(rule("commit-status", "gitlab")).await;
    let mut provider = Provider::new("flux-system", "gitlab", "gitlab", server.url("/org/infra"));
    provider.spec.secret_ref = Some(LocalObjectReference { name: "gitlab-token".into() });
    directory.upsert_provider(provider).await;
    directory
        .upsert_secret(Secret::new("flux-system", "gitlab-token").with_entry(SECRET_TOKEN_KEY, "t"))
        .await;

    let (dispatcher, mut rx) = setup(directory);
    let mut no_revision = event(Severity::Error);
    no_revision.metadata = None;
    let outcome = dispatcher.dispatch(&no_revision).await.unwrap();
    assert_eq!(outcome, DispatchOutcome::Dispatched { matched: 1, spawned: 1 });

    let deliveries = collect(&mut rx, 1).await;
    assert_eq!(deliveries[0].error.as_deref(), Some("missing revision metadata"));
    status.assert_hits_async(0).await;
}
