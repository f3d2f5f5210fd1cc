//! Push Receiver Integration Tests
//!
//! Tests for the receive -> dispatch -> execute pipeline: MIME filtering,
//! side effects per action, the dispatch time budget and statistics.

use async_trait::async_trait;
use brivas_mms_push::errors::StoreError;
use brivas_mms_push::memory::{
    InMemoryPreferences, InMemoryStore, RecordingUi, SideEffect, StaticDeviceConfig,
};
use brivas_mms_push::pdu::{DecodedPdu, EncodedString, NotificationInd, PduEncoder};
use brivas_mms_push::store::{
    pref, MessageStore, PersistExtra, Persisted, Predicate, RowUpdate, StoredRow,
};
use brivas_mms_push::{
    Action, ActionExecutor, Collection, DropReason, LegacyPushHandlers, MessageUri, PushConfig,
    PushDispatcher, PushReceiver, SubscriptionId, ThreadId, TransactionType,
};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tokio_test::assert_ok;

const MMS: &str = "application/vnd.wap.mms-message";

struct Harness {
    store: Arc<InMemoryStore>,
    ui: Arc<RecordingUi>,
    prefs: Arc<InMemoryPreferences>,
    receiver: PushReceiver,
}

fn harness(device: StaticDeviceConfig, config: PushConfig) -> Harness {
    harness_with_store(Arc::new(InMemoryStore::new()), device, config)
}

fn harness_with_store(
    store: Arc<InMemoryStore>,
    device: StaticDeviceConfig,
    config: PushConfig,
) -> Harness {
    let ui = Arc::new(RecordingUi::new());
    let prefs = Arc::new(InMemoryPreferences::new());
    let receiver = PushReceiver::new(
        PushDispatcher::new(store.clone(), LegacyPushHandlers::new()),
        ActionExecutor::new(store.clone(), ui.clone(), ui.clone(), ui.clone()),
        prefs.clone(),
        Arc::new(device),
        config,
    );
    Harness {
        store,
        ui,
        prefs,
        receiver,
    }
}

fn notification_bytes(transaction_id: &str, location: &str) -> Bytes {
    let mut notification = NotificationInd::new(transaction_id, location);
    notification.from = Some(EncodedString::new("+15550100/TYPE=PLMN"));
    PduEncoder::new()
        .encode(&DecodedPdu::Notification(notification))
        .expect("encodable PDU")
        .freeze()
}

async fn receive(h: &Harness, data: Bytes, sub: SubscriptionId) -> Option<Action> {
    let handle = h
        .receiver
        .on_receive(MMS, data, Some("+15550100".to_string()), sub)
        .expect("MMS push accepted");
    timeout(Duration::from_secs(5), handle)
        .await
        .expect("push task finished")
        .expect("push task did not panic")
}

#[tokio::test]
async fn test_notification_starts_retrieval() {
    let h = harness(StaticDeviceConfig::default(), PushConfig::default());

    let action = receive(&h, notification_bytes("T1", "http://mmsc/1"), SubscriptionId(1))
        .await
        .expect("within budget");

    let Action::PersistNotificationAndMaybeRetrieve { uri, .. } = action else {
        panic!("expected retrieval, got {action:?}");
    };
    assert_eq!(
        h.ui.calls(),
        vec![SideEffect::Retrieval {
            uri,
            transaction_type: TransactionType::Notification,
            subscription_id: SubscriptionId(1),
        }]
    );
}

#[tokio::test]
async fn test_end_to_end_indicator_only() {
    let h = harness(
        StaticDeviceConfig {
            auto_retrieve: false,
            mobile_data: false,
        },
        PushConfig::default(),
    );
    h.prefs.set(pref::TRANSACTION_ID, true);

    let action = receive(&h, notification_bytes("AB12", "http://x/y="), SubscriptionId(0))
        .await
        .expect("within budget");

    let Action::UpdateIndicatorOnly { thread_id } = action else {
        panic!("expected indicator update, got {action:?}");
    };
    assert_eq!(
        h.ui.calls(),
        vec![SideEffect::Indicator {
            thread_id,
            silent: false,
        }]
    );
    assert_eq!(
        h.store.notification_records()[0].content_location.as_deref(),
        Some(&b"http://x/y=AB12"[..])
    );
}

#[tokio::test]
async fn test_duplicate_has_no_side_effects() {
    let h = harness(StaticDeviceConfig::default(), PushConfig::default());
    let data = notification_bytes("T1", "http://mmsc/dup");

    receive(&h, data.clone(), SubscriptionId(0)).await;
    let second = receive(&h, data, SubscriptionId(0)).await;

    assert_eq!(second, Some(Action::drop(DropReason::Duplicate)));
    assert_eq!(h.ui.calls().len(), 1);
    assert_eq!(h.store.len(), 1);

    let stats = h.receiver.stats().snapshot();
    assert_eq!(stats.accepted, 2);
    assert_eq!(stats.outcomes.get("retrieve"), Some(&1));
    assert_eq!(stats.outcomes.get("duplicate"), Some(&1));
    assert_eq!(stats.in_flight, 0);
}

#[tokio::test]
async fn test_retrieval_failure_keeps_action() {
    let h = harness(StaticDeviceConfig::default(), PushConfig::default());
    h.ui.fail_retrieval("service unavailable");

    let action = receive(&h, notification_bytes("T1", "http://mmsc/2"), SubscriptionId(0)).await;

    assert!(matches!(
        action,
        Some(Action::PersistNotificationAndMaybeRetrieve { retrieve: true, .. })
    ));
    assert_eq!(h.receiver.stats().snapshot().side_effect_failures, 1);
    assert_eq!(h.store.len(), 1);
}

#[tokio::test]
async fn test_malformed_push_counted() {
    let h = harness(StaticDeviceConfig::default(), PushConfig::default());

    let action = receive(&h, Bytes::from_static(&[0x8C]), SubscriptionId(0)).await;

    assert_eq!(action, Some(Action::drop(DropReason::Malformed)));
    assert!(h.ui.calls().is_empty());
    assert_eq!(h.receiver.stats().outcome_count("malformed"), 1);
}

#[tokio::test]
async fn test_unsupported_mime_not_dispatched() {
    let h = harness(StaticDeviceConfig::default(), PushConfig::default());

    let handle = h.receiver.on_receive(
        "application/vnd.wap.connectivity-wbxml",
        notification_bytes("T1", "http://mmsc/3"),
        None,
        SubscriptionId(0),
    );

    assert!(handle.is_none());
    assert!(h.store.is_empty());
    assert_eq!(h.receiver.stats().snapshot().ignored, 1);
}

#[tokio::test]
async fn test_concurrent_pushes() {
    let h = harness(StaticDeviceConfig::default(), PushConfig::default());

    let handles: Vec<_> = (0..16)
        .filter_map(|i| {
            h.receiver.on_receive(
                MMS,
                notification_bytes("T", &format!("http://mmsc/{i}")),
                None,
                SubscriptionId(0),
            )
        })
        .collect();
    for handle in handles {
        let action = assert_ok!(handle.await);
        assert!(matches!(action, Some(ref a) if !a.is_drop()));
    }

    assert_eq!(h.store.len(), 16);
    assert_eq!(h.receiver.stats().outcome_count("retrieve"), 16);
}

// Store that stalls every query, to exhaust the dispatch budget
struct SlowStore {
    inner: InMemoryStore,
    delay: Duration,
}

#[async_trait]
impl MessageStore for SlowStore {
    async fn query(&self, predicate: &Predicate) -> Result<Vec<StoredRow>, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.query(predicate).await
    }

    async fn persist(
        &self,
        pdu: &DecodedPdu,
        collection: Collection,
        group_mms_enabled: bool,
        extra: &PersistExtra,
    ) -> Result<Persisted, StoreError> {
        self.inner
            .persist(pdu, collection, group_mms_enabled, extra)
            .await
    }

    async fn update(&self, uri: &MessageUri, update: RowUpdate) -> Result<(), StoreError> {
        self.inner.update(uri, update).await
    }

    async fn delete_old(&self, thread_id: ThreadId) -> Result<(), StoreError> {
        self.inner.delete_old(thread_id).await
    }
}

#[tokio::test]
async fn test_dispatch_budget_exceeded() {
    let store = Arc::new(SlowStore {
        inner: InMemoryStore::new(),
        delay: Duration::from_millis(500),
    });
    let ui = Arc::new(RecordingUi::new());
    let mut config = PushConfig::default();
    config.receiver.dispatch_budget_ms = 20;
    let receiver = PushReceiver::new(
        PushDispatcher::new(store.clone(), LegacyPushHandlers::new()),
        ActionExecutor::new(store.clone(), ui.clone(), ui.clone(), ui.clone()),
        Arc::new(InMemoryPreferences::new()),
        Arc::new(StaticDeviceConfig::default()),
        config,
    );
    assert_eq!(receiver.dispatch_budget(), Duration::from_millis(20));

    let handle = receiver
        .on_receive(MMS, notification_bytes("T1", "http://mmsc/slow"), None, SubscriptionId(0))
        .expect("MMS push accepted");
    let action = assert_ok!(handle.await);

    assert_eq!(action, None);
    assert!(store.inner.is_empty());
    assert!(ui.calls().is_empty());
    let stats = receiver.stats().snapshot();
    assert_eq!(stats.timeouts, 1);
    assert_eq!(stats.in_flight, 0);
    assert!(stats.outcomes.is_empty());
}

#[tokio::test]
async fn test_aborted_push_leaves_gauge_at_zero() {
    let store = Arc::new(SlowStore {
        inner: InMemoryStore::new(),
        delay: Duration::from_secs(30),
    });
    let ui = Arc::new(RecordingUi::new());
    let receiver = PushReceiver::new(
        PushDispatcher::new(store.clone(), LegacyPushHandlers::new()),
        ActionExecutor::new(store.clone(), ui.clone(), ui.clone(), ui),
        Arc::new(InMemoryPreferences::new()),
        Arc::new(StaticDeviceConfig::default()),
        PushConfig::default(),
    );

    let handle = receiver
        .on_receive(MMS, notification_bytes("T1", "http://mmsc/abort"), None, SubscriptionId(0))
        .expect("MMS push accepted");
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(receiver.stats().snapshot().in_flight, 1);

    handle.abort();
    let joined = handle.await;
    assert!(joined.is_err_and(|e| e.is_cancelled()));

    let stats = receiver.stats().snapshot();
    assert_eq!(stats.in_flight, 0);
    assert!(stats.outcomes.is_empty());
    assert!(store.inner.is_empty());
}

#[tokio::test]
async fn test_payload_tracing_enabled() {
    let mut config = PushConfig::default();
    config.receiver.trace_payloads = true;
    let h = harness(StaticDeviceConfig::default(), config);

    let data = notification_bytes("T1", "http://mmsc/traced");
    let action = receive(&h, data, SubscriptionId(0)).await;

    assert!(matches!(action, Some(ref a) if !a.is_drop()));
    assert!(h.receiver.config().receiver.trace_payloads);
}

#[tokio::test]
async fn test_report_routed_through_receiver() {
    let store = Arc::new(InMemoryStore::new());
    store.seed_send_request(b"m1", ThreadId(4));
    let h = harness_with_store(store, StaticDeviceConfig::default(), PushConfig::default());

    let report = brivas_mms_push::pdu::DeliveryInd {
        message_id: b"m1".to_vec(),
        mms_version: 0x12,
        to: vec![EncodedString::new("+15550199/TYPE=PLMN")],
        date: Some(1_700_000_000),
        status: Some(brivas_mms_push::pdu::DeliveryStatus::Retrieved),
    };
    let data = PduEncoder::new()
        .encode(&DecodedPdu::DeliveryReport(report))
        .expect("encodable PDU")
        .freeze();

    let action = receive(&h, data, SubscriptionId(0)).await.expect("within budget");

    assert_eq!(action.thread_id(), Some(ThreadId(4)));
    // Reports are stored silently
    assert!(h.ui.calls().is_empty());
}

#[test]
fn test_telemetry_init_is_repeatable() {
    // A second global subscriber is refused, never a panic
    let _ = brivas_telemetry::init("mms-push-test");
    let _ = brivas_telemetry::init("mms-push-test");
}
