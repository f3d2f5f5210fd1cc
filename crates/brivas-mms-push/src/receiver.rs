//! Push receiver
//!
//! Entry point for pushes delivered by the platform. Each accepted push runs
//! as its own tokio task: the context snapshot is taken, the dispatcher picks
//! an action and the executor carries it out, all within the dispatch budget.

use crate::action::Action;
use crate::config::PushConfig;
use crate::dispatcher::PushDispatcher;
use crate::executor::ActionExecutor;
use crate::stats::PushStats;
use crate::store::{pref, DeviceConfig, Preferences};
use crate::types::{DispatchContext, PushMimeType, RawPush, SubscriptionId};
use bytes::Bytes;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, instrument, trace, warn};

struct Inner {
    dispatcher: PushDispatcher,
    executor: ActionExecutor,
    preferences: Arc<dyn Preferences>,
    device: Arc<dyn DeviceConfig>,
    config: PushConfig,
    stats: PushStats,
}

/// Cheap to clone; clones share the dispatcher and statistics
#[derive(Clone)]
pub struct PushReceiver {
    inner: Arc<Inner>,
}

impl PushReceiver {
    pub fn new(
        dispatcher: PushDispatcher,
        executor: ActionExecutor,
        preferences: Arc<dyn Preferences>,
        device: Arc<dyn DeviceConfig>,
        config: PushConfig,
    ) -> Self {
        info!(
            budget_ms = config.receiver.dispatch_budget_ms,
            "Push receiver created"
        );
        Self {
            inner: Arc::new(Inner {
                dispatcher,
                executor,
                preferences,
                device,
                config,
                stats: PushStats::new(),
            }),
        }
    }

    pub fn stats(&self) -> &PushStats {
        &self.inner.stats
    }

    pub fn config(&self) -> &PushConfig {
        &self.inner.config
    }

    pub fn dispatch_budget(&self) -> Duration {
        self.inner.config.receiver.dispatch_budget()
    }

    /// Platform callback; unsupported MIME types are ignored
    pub fn on_receive(
        &self,
        mime_type: &str,
        data: Bytes,
        address: Option<String>,
        subscription_id: SubscriptionId,
    ) -> Option<JoinHandle<Option<Action>>> {
        let mime_type = match mime_type.parse::<PushMimeType>() {
            Ok(mime_type) => mime_type,
            Err(e) => {
                debug!("Ignoring push: {}", e);
                self.inner.stats.record_ignored();
                return None;
            }
        };
        Some(self.spawn(RawPush {
            data,
            mime_type,
            address,
            subscription_id,
        }))
    }

    /// Run a push on its own task
    pub fn spawn(&self, push: RawPush) -> JoinHandle<Option<Action>> {
        let receiver = self.clone();
        tokio::spawn(async move { receiver.process(push).await })
    }

    /// Dispatch and execute one push; `None` when the budget ran out
    #[instrument(skip_all, fields(mime = %push.mime_type, sub = %push.subscription_id))]
    pub async fn process(&self, push: RawPush) -> Option<Action> {
        let inner = &self.inner;
        inner.stats.record_accepted(push.mime_type.as_str());
        if inner.config.receiver.trace_payloads {
            trace!(payload = %hex::encode(&push.data), "Push payload");
        }

        let ctx = self.context_for(push.subscription_id);
        let budget = self.dispatch_budget();
        let started = Instant::now();
        let _in_flight = inner.stats.enter();

        let result = timeout(budget, async {
            let action = inner.dispatcher.dispatch(&push, &ctx).await;
            if let Err(e) = inner.executor.execute(&action).await {
                warn!(error = %e, outcome = action.outcome(), "Action side effect failed");
                inner.stats.record_side_effect_failure();
            }
            action
        })
        .await;

        match result {
            Ok(action) => {
                inner.stats.record_outcome(&action, started.elapsed());
                Some(action)
            }
            Err(_) => {
                warn!("Push abandoned after {:?}", budget);
                inner.stats.record_timeout();
                None
            }
        }
    }

    /// Snapshot preferences and device state for one push
    pub fn context_for(&self, subscription_id: SubscriptionId) -> DispatchContext {
        let inner = &self.inner;
        let mms = &inner.config.mms;
        let prefs = &inner.preferences;
        DispatchContext {
            subscription_id,
            wap_push_enabled: prefs.get_bool(pref::ENABLE_WAP_PUSH, mms.wap_push_default),
            transaction_id_enabled: prefs
                .get_bool(pref::TRANSACTION_ID, mms.transaction_id_default),
            group_mms_enabled: prefs.get_bool(pref::GROUP_MMS, mms.group_mms_default),
            auto_retrieve_enabled: inner.device.is_auto_retrieve_enabled(subscription_id),
            mobile_data_enabled: inner.device.is_mobile_data_enabled(subscription_id),
            parse_content_disposition: inner.config.codec.parse_content_disposition,
            check_mandatory_headers: inner.config.codec.check_mandatory_headers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legacy::LegacyPushHandlers;
    use crate::memory::{InMemoryPreferences, InMemoryStore, RecordingUi, StaticDeviceConfig};

    fn receiver(prefs: Arc<InMemoryPreferences>, device: StaticDeviceConfig) -> PushReceiver {
        let store = Arc::new(InMemoryStore::new());
        let ui = Arc::new(RecordingUi::new());
        PushReceiver::new(
            PushDispatcher::new(store.clone(), LegacyPushHandlers::new()),
            ActionExecutor::new(store, ui.clone(), ui.clone(), ui),
            prefs,
            Arc::new(device),
            PushConfig::default(),
        )
    }

    #[test]
    fn test_context_snapshot() {
        let prefs = Arc::new(InMemoryPreferences::new());
        prefs.set(pref::TRANSACTION_ID, true);
        prefs.set(pref::GROUP_MMS, false);
        let receiver = receiver(
            prefs,
            StaticDeviceConfig {
                auto_retrieve: false,
                mobile_data: true,
            },
        );

        let ctx = receiver.context_for(SubscriptionId(3));
        assert_eq!(ctx.subscription_id, SubscriptionId(3));
        assert!(ctx.wap_push_enabled);
        assert!(ctx.transaction_id_enabled);
        assert!(!ctx.group_mms_enabled);
        assert!(!ctx.auto_retrieve_enabled);
        assert!(ctx.mobile_data_enabled);
        assert!(ctx.check_mandatory_headers);
    }

    #[tokio::test]
    async fn test_unsupported_mime_is_ignored() {
        let receiver = receiver(
            Arc::new(InMemoryPreferences::new()),
            StaticDeviceConfig::default(),
        );
        let handle = receiver.on_receive(
            "text/plain",
            Bytes::from_static(b"hi"),
            None,
            SubscriptionId::default(),
        );
        assert!(handle.is_none());
        assert_eq!(receiver.stats().snapshot().ignored, 1);
        assert_eq!(receiver.stats().snapshot().accepted, 0);
    }
}
