//! Dispatcher output

use crate::types::{MessageUri, SubscriptionId, ThreadId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a push produced no stored message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    Malformed,
    NoMatchingSend,
    Duplicate,
    InternalError,
    /// Legacy push with no handler, or the handler ignored it
    LegacyUnhandled,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::NoMatchingSend => "no_matching_send",
            Self::Duplicate => "duplicate",
            Self::InternalError => "internal_error",
            Self::LegacyUnhandled => "legacy_unhandled",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exactly one action per dispatched push
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Report stored and attached to its send request's thread
    PersistAndPatchThread { uri: MessageUri, thread_id: ThreadId },
    /// Notification stored; start retrieval when `retrieve` is set
    PersistNotificationAndMaybeRetrieve {
        retrieve: bool,
        uri: MessageUri,
        thread_id: ThreadId,
        address: String,
        subscription_id: SubscriptionId,
    },
    /// Notification stored; retrieval left to the user
    UpdateIndicatorOnly { thread_id: ThreadId },
    /// A legacy handler stored the push
    LegacyDelivered { thread_id: ThreadId },
    Drop { reason: DropReason },
    Unrecognized { message_type: u8 },
}

impl Action {
    pub fn drop(reason: DropReason) -> Self {
        Self::Drop { reason }
    }

    /// Metric label of the outcome
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::PersistAndPatchThread { .. } => "persist_and_patch_thread",
            Self::PersistNotificationAndMaybeRetrieve { retrieve: true, .. } => "retrieve",
            Self::PersistNotificationAndMaybeRetrieve { retrieve: false, .. } => "persist_only",
            Self::UpdateIndicatorOnly { .. } => "update_indicator_only",
            Self::LegacyDelivered { .. } => "legacy_delivered",
            Self::Drop { reason } => reason.as_str(),
            Self::Unrecognized { .. } => "unrecognized",
        }
    }

    pub fn thread_id(&self) -> Option<ThreadId> {
        match self {
            Self::PersistAndPatchThread { thread_id, .. }
            | Self::PersistNotificationAndMaybeRetrieve { thread_id, .. }
            | Self::UpdateIndicatorOnly { thread_id }
            | Self::LegacyDelivered { thread_id } => Some(*thread_id),
            Self::Drop { .. } | Self::Unrecognized { .. } => None,
        }
    }

    pub fn is_drop(&self) -> bool {
        matches!(self, Self::Drop { .. })
    }
}
