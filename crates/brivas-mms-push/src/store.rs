//! Collaborator interfaces
//!
//! The message store, preference storage, device state, UI surfaces and the
//! retrieval service are external systems. The engine reaches them only
//! through these traits.

use crate::errors::{CollaboratorError, StoreError};
use crate::pdu::DecodedPdu;
use crate::types::{Collection, MessageUri, SubscriptionId, ThreadId, TransactionType};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Preference keys read by the receiver
pub mod pref {
    pub const ENABLE_WAP_PUSH: &str = "pref_key_enable_wap_push";
    pub const GROUP_MMS: &str = "pref_key_mms_group_mms";
    pub const TRANSACTION_ID: &str = "pref_key_mms_transaction_id";
}

/// Row filters the engine needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Sent send-request rows carrying this Message-ID
    SendRequestsWithMessageId(Vec<u8>),
    /// Rows whose content location matches exactly
    ContentLocation(Vec<u8>),
}

/// A stored message as seen by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRow {
    pub uri: MessageUri,
    pub message_type: u8,
    pub thread_id: Option<ThreadId>,
    pub message_id: Option<Vec<u8>>,
    pub content_location: Option<Vec<u8>>,
    pub transaction_id: Option<Vec<u8>>,
    pub subscription_id: SubscriptionId,
    pub created_at: DateTime<Utc>,
}

/// Single-field update of a stored row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowUpdate {
    ThreadId(ThreadId),
    SubscriptionId(SubscriptionId),
}

/// Fields written in the same call as the row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistExtra {
    pub subscription_id: SubscriptionId,
    /// Attach to this thread instead of the one derived from the addresses
    pub thread_id: Option<ThreadId>,
    /// Flag the row's thread as holding notifications from this address
    pub notification_address: Option<String>,
}

impl PersistExtra {
    pub fn subscription(subscription_id: SubscriptionId) -> Self {
        Self {
            subscription_id,
            ..Default::default()
        }
    }

    pub fn with_thread(mut self, thread_id: ThreadId) -> Self {
        self.thread_id = Some(thread_id);
        self
    }

    pub fn with_notification_address(mut self, address: impl Into<String>) -> Self {
        self.notification_address = Some(address.into());
        self
    }
}

/// Result of a persist call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persisted {
    pub uri: MessageUri,
    pub thread_id: ThreadId,
}

/// Shared message store
///
/// `persist` is the only write on the dispatch path and must be atomic:
/// either the row and everything in its [`PersistExtra`] is stored, or
/// nothing is.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn query(&self, predicate: &Predicate) -> Result<Vec<StoredRow>, StoreError>;

    async fn persist(
        &self,
        pdu: &DecodedPdu,
        collection: Collection,
        group_mms_enabled: bool,
        extra: &PersistExtra,
    ) -> Result<Persisted, StoreError>;

    async fn update(&self, uri: &MessageUri, update: RowUpdate) -> Result<(), StoreError>;

    /// Trim a thread down to the configured message limit
    async fn delete_old(&self, thread_id: ThreadId) -> Result<(), StoreError>;
}

/// Persistent user preferences
pub trait Preferences: Send + Sync {
    fn get_bool(&self, key: &str, default: bool) -> bool;
}

/// Device and carrier state
pub trait DeviceConfig: Send + Sync {
    fn is_auto_retrieve_enabled(&self, subscription_id: SubscriptionId) -> bool;

    fn is_mobile_data_enabled(&self, subscription_id: SubscriptionId) -> bool;
}

/// New-message indicator
#[async_trait]
pub trait NotificationUi: Send + Sync {
    async fn update_indicator(&self, thread_id: ThreadId, silent: bool)
        -> Result<(), CollaboratorError>;
}

/// Home-screen widget
#[async_trait]
pub trait WidgetUi: Send + Sync {
    async fn notify_changed(&self) -> Result<(), CollaboratorError>;
}

/// Background download/transaction service
#[async_trait]
pub trait RetrievalService: Send + Sync {
    async fn start(
        &self,
        uri: &MessageUri,
        transaction_type: TransactionType,
        subscription_id: SubscriptionId,
    ) -> Result<(), CollaboratorError>;
}
