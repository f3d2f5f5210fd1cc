//! Push dispatcher
//!
//! Classifies a push, consults the duplicate detector or the thread resolver,
//! performs the one store write the thread id depends on and returns exactly one
//! [`Action`]. Failures never escape: each one maps to a drop reason.

use crate::action::{Action, DropReason};
use crate::dedup::DuplicateDetector;
use crate::errors::PushError;
use crate::legacy::{LegacyContext, LegacyPushHandlers};
use crate::pdu::{
    effective_content_location, CodecOptions, DecodedPdu, NotificationInd, PduCodec,
};
use crate::policy::{RetrievalContext, RetrievalDecision, RetrievalPolicy};
use crate::store::{MessageStore, PersistExtra, Persisted};
use crate::thread::ThreadResolver;
use crate::types::{Collection, DispatchContext, RawPush};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

pub struct PushDispatcher {
    store: Arc<dyn MessageStore>,
    legacy: LegacyPushHandlers,
    detector: DuplicateDetector,
    resolver: ThreadResolver,
    policy: RetrievalPolicy,
}

impl PushDispatcher {
    pub fn new(store: Arc<dyn MessageStore>, legacy: LegacyPushHandlers) -> Self {
        Self {
            detector: DuplicateDetector::new(store.clone()),
            resolver: ThreadResolver::new(store.clone()),
            policy: RetrievalPolicy::new(),
            store,
            legacy,
        }
    }

    /// Run one push through the state machine
    #[instrument(skip_all, fields(mime = %push.mime_type, sub = %ctx.subscription_id, len = push.data.len()))]
    pub async fn dispatch(&self, push: &RawPush, ctx: &DispatchContext) -> Action {
        if push.mime_type.is_legacy() && ctx.wap_push_enabled {
            return self.dispatch_legacy(push, ctx).await;
        }

        let codec = PduCodec::new(CodecOptions::from_context(ctx));
        let pdu = match codec.decode(&push.data) {
            Ok(pdu) => pdu,
            Err(e) => {
                warn!(error = %e, "Dropping undecodable push");
                return Action::drop(DropReason::Malformed);
            }
        };
        debug!(kind = %pdu.kind(), message_type = pdu.message_type(), "Decoded push PDU");

        match self.route(pdu, push, ctx).await {
            Ok(action) => action,
            Err(e) => {
                error!(error = %e, "Push dispatch failed");
                Action::drop(DropReason::InternalError)
            }
        }
    }

    async fn route(
        &self,
        pdu: DecodedPdu,
        push: &RawPush,
        ctx: &DispatchContext,
    ) -> Result<Action, PushError> {
        match pdu {
            DecodedPdu::Notification(notification) => {
                self.handle_notification(notification, push, ctx).await
            }
            DecodedPdu::DeliveryReport(_) | DecodedPdu::ReadReport(_) => {
                self.handle_report(pdu, ctx).await
            }
            DecodedPdu::Unknown(unknown) => {
                info!("Unrecognized message type 0x{:02X}", unknown.message_type);
                Ok(Action::Unrecognized {
                    message_type: unknown.message_type,
                })
            }
        }
    }

    async fn handle_report(
        &self,
        pdu: DecodedPdu,
        ctx: &DispatchContext,
    ) -> Result<Action, PushError> {
        let message_id = pdu.message_id().unwrap_or_default();
        let thread_id = match self.resolver.resolve(message_id, pdu.kind()).await {
            Ok(thread_id) => thread_id,
            Err(e) if e.is_no_match() => {
                info!(kind = %pdu.kind(), "Dropping report: {}", e);
                return Ok(Action::drop(DropReason::NoMatchingSend));
            }
            Err(e) => return Err(e.into()),
        };

        let extra = PersistExtra::subscription(ctx.subscription_id).with_thread(thread_id);
        let Persisted { uri, thread_id } = self
            .store
            .persist(&pdu, Collection::Inbox, ctx.group_mms_enabled, &extra)
            .await?;

        info!(%uri, %thread_id, "Stored {} for thread", pdu.kind());
        Ok(Action::PersistAndPatchThread { uri, thread_id })
    }

    async fn handle_notification(
        &self,
        mut notification: NotificationInd,
        push: &RawPush,
        ctx: &DispatchContext,
    ) -> Result<Action, PushError> {
        let location = effective_content_location(&notification, ctx.transaction_id_enabled);
        let duplicate = self.detector.is_duplicate(location.as_deref()).await?;

        let decision = self.policy.decide(RetrievalContext {
            duplicate,
            auto_retrieve: ctx.auto_retrieve_enabled,
            mobile_data: ctx.mobile_data_enabled,
        });
        if decision == RetrievalDecision::Drop {
            info!(
                location = %String::from_utf8_lossy(location.as_deref().unwrap_or_default()),
                "Skip storing duplicate notification"
            );
            return Ok(Action::drop(DropReason::Duplicate));
        }

        if notification.content_location != location {
            debug!("Appended transaction id to content location");
            notification.content_location = location;
        }
        let address = notification
            .from
            .as_ref()
            .map(|from| from.to_string_lossy())
            .unwrap_or_else(|| push.address_or_default().to_string());

        // The only write for a notification; everything the row needs goes in it
        let pdu = DecodedPdu::Notification(notification);
        let extra = PersistExtra::subscription(ctx.subscription_id)
            .with_notification_address(address.clone());
        let Persisted { uri, thread_id } = self
            .store
            .persist(&pdu, Collection::Inbox, ctx.group_mms_enabled, &extra)
            .await?;

        let action = match decision {
            RetrievalDecision::PersistAndRetrieve => Action::PersistNotificationAndMaybeRetrieve {
                retrieve: true,
                uri,
                thread_id,
                address,
                subscription_id: ctx.subscription_id,
            },
            _ => Action::UpdateIndicatorOnly { thread_id },
        };
        info!(%thread_id, outcome = action.outcome(), "Stored notification");
        Ok(action)
    }

    async fn dispatch_legacy(&self, push: &RawPush, ctx: &DispatchContext) -> Action {
        let Some(handler) = self.legacy.get(push.mime_type) else {
            debug!("No handler registered for {}", push.mime_type);
            return Action::drop(DropReason::LegacyUnhandled);
        };

        let legacy_ctx = LegacyContext::new(push.address_or_default(), ctx.subscription_id);
        match handler.handle(&push.data, push.mime_type, &legacy_ctx).await {
            Ok(Some(thread_id)) => {
                info!(%thread_id, "Legacy push stored");
                Action::LegacyDelivered { thread_id }
            }
            Ok(None) => {
                debug!("Legacy handler ignored push");
                Action::drop(DropReason::LegacyUnhandled)
            }
            Err(e) => {
                error!(error = %e, "Legacy handler failed");
                Action::drop(DropReason::InternalError)
            }
        }
    }
}
