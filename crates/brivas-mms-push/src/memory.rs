//! In-memory collaborators
//!
//! Reference implementations of the store, preference, device and UI traits
//! for embedders without a platform backend and for tests.

use crate::errors::{CollaboratorError, StoreError};
use crate::pdu::{message_type, DecodedPdu, EncodedString};
use crate::store::{
    DeviceConfig, MessageStore, NotificationUi, PersistExtra, Persisted, Predicate, Preferences,
    RetrievalService, RowUpdate, StoredRow, WidgetUi,
};
use crate::types::{Collection, MessageUri, SubscriptionId, ThreadId, TransactionType};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use tracing::debug;

const URI_PREFIX: &str = "content://mms/";

/// A stored notification as tracked for deduplication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRecord {
    pub uri: MessageUri,
    pub content_location: Option<Vec<u8>>,
    pub transaction_id: Option<Vec<u8>>,
    pub subscription_id: SubscriptionId,
    pub thread_id: Option<ThreadId>,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct Entry {
    id: u64,
    collection: Collection,
    row: StoredRow,
}

/// Message store backed by concurrent maps
#[derive(Debug)]
pub struct InMemoryStore {
    rows: DashMap<u64, Entry>,
    threads: DashMap<String, ThreadId>,
    notification_threads: DashMap<ThreadId, String>,
    next_row: AtomicU64,
    next_thread: AtomicI64,
    /// Messages kept per thread by `delete_old`
    thread_limit: Option<usize>,
    failure: Mutex<Option<String>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
            threads: DashMap::new(),
            notification_threads: DashMap::new(),
            next_row: AtomicU64::new(1),
            next_thread: AtomicI64::new(1),
            thread_limit: None,
            failure: Mutex::new(None),
        }
    }

    pub fn with_thread_limit(mut self, limit: usize) -> Self {
        self.thread_limit = Some(limit);
        self
    }

    /// Make the next store operation fail with `message`
    pub fn fail_next(&self, message: impl Into<String>) {
        *self.failure.lock() = Some(message.into());
    }

    /// Record a sent message, as the send path would have
    pub fn seed_send_request(&self, message_id: &[u8], thread_id: ThreadId) -> MessageUri {
        self.insert(
            Collection::Sent,
            message_type::SEND_REQ,
            Some(thread_id),
            Some(message_id.to_vec()),
            None,
            None,
            SubscriptionId::default(),
        )
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All rows in insertion order
    pub fn rows(&self) -> Vec<StoredRow> {
        self.entries().into_iter().map(|entry| entry.row).collect()
    }

    pub fn row(&self, uri: &MessageUri) -> Option<StoredRow> {
        let id = parse_uri(uri)?;
        self.rows.get(&id).map(|entry| entry.row.clone())
    }

    pub fn collection_of(&self, uri: &MessageUri) -> Option<Collection> {
        let id = parse_uri(uri)?;
        self.rows.get(&id).map(|entry| entry.collection)
    }

    pub fn notification_records(&self) -> Vec<NotificationRecord> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.row.message_type == message_type::NOTIFICATION_IND)
            .map(|entry| NotificationRecord {
                uri: entry.row.uri,
                content_location: entry.row.content_location,
                transaction_id: entry.row.transaction_id,
                subscription_id: entry.row.subscription_id,
                thread_id: entry.row.thread_id,
                received_at: entry.row.created_at,
            })
            .collect()
    }

    pub fn is_notification_thread(&self, thread_id: ThreadId) -> bool {
        self.notification_threads.contains_key(&thread_id)
    }

    /// Sender recorded for a notification thread
    pub fn notification_sender(&self, thread_id: ThreadId) -> Option<String> {
        self.notification_threads
            .get(&thread_id)
            .map(|address| address.value().clone())
    }

    fn entries(&self) -> Vec<Entry> {
        let mut entries: Vec<Entry> = self.rows.iter().map(|e| e.value().clone()).collect();
        entries.sort_by_key(|entry| entry.id);
        entries
    }

    fn check_failure(&self) -> Result<(), StoreError> {
        match self.failure.lock().take() {
            Some(message) => Err(StoreError::Failed(message)),
            None => Ok(()),
        }
    }

    fn thread_for(&self, key: String) -> ThreadId {
        *self
            .threads
            .entry(key)
            .or_insert_with(|| ThreadId(self.next_thread.fetch_add(1, Ordering::Relaxed)))
    }

    fn insert(
        &self,
        collection: Collection,
        message_type: u8,
        thread_id: Option<ThreadId>,
        message_id: Option<Vec<u8>>,
        content_location: Option<Vec<u8>>,
        transaction_id: Option<Vec<u8>>,
        subscription_id: SubscriptionId,
    ) -> MessageUri {
        let id = self.next_row.fetch_add(1, Ordering::Relaxed);
        let uri = MessageUri(format!("{URI_PREFIX}{id}"));
        let row = StoredRow {
            uri: uri.clone(),
            message_type,
            thread_id,
            message_id,
            content_location,
            transaction_id,
            subscription_id,
            created_at: Utc::now(),
        };
        self.rows.insert(
            id,
            Entry {
                id,
                collection,
                row,
            },
        );
        uri
    }

    fn lookup(&self, uri: &MessageUri) -> Result<u64, StoreError> {
        parse_uri(uri)
            .filter(|id| self.rows.contains_key(id))
            .ok_or_else(|| StoreError::UnknownUri(uri.to_string()))
    }
}

fn parse_uri(uri: &MessageUri) -> Option<u64> {
    uri.as_str().strip_prefix(URI_PREFIX)?.parse().ok()
}

/// Conversation key: every participant with group MMS, else the first one
fn thread_key(addresses: &[&EncodedString], group_mms_enabled: bool) -> String {
    let mut names: Vec<String> = addresses.iter().map(|a| a.to_string_lossy()).collect();
    if !group_mms_enabled {
        names.truncate(1);
    }
    names.sort();
    names.join(";")
}

#[async_trait]
impl MessageStore for InMemoryStore {
    async fn query(&self, predicate: &Predicate) -> Result<Vec<StoredRow>, StoreError> {
        self.check_failure()?;
        let rows = self
            .entries()
            .into_iter()
            .map(|entry| entry.row)
            .filter(|row| match predicate {
                Predicate::SendRequestsWithMessageId(id) => {
                    row.message_type == message_type::SEND_REQ
                        && row.message_id.as_deref() == Some(id.as_slice())
                }
                Predicate::ContentLocation(location) => {
                    row.content_location.as_deref() == Some(location.as_slice())
                }
            })
            .collect();
        Ok(rows)
    }

    async fn persist(
        &self,
        pdu: &DecodedPdu,
        collection: Collection,
        group_mms_enabled: bool,
        extra: &PersistExtra,
    ) -> Result<Persisted, StoreError> {
        self.check_failure()?;
        let addresses: Vec<&EncodedString> = match pdu {
            DecodedPdu::Notification(n) => n.from.iter().collect(),
            DecodedPdu::DeliveryReport(r) => r.to.iter().collect(),
            DecodedPdu::ReadReport(r) => r.from.iter().chain(r.to.iter()).collect(),
            DecodedPdu::Unknown(u) => {
                return Err(StoreError::Failed(format!(
                    "cannot persist message type 0x{:02X}",
                    u.message_type
                )))
            }
        };
        let thread_id = match extra.thread_id {
            Some(thread_id) => thread_id,
            None => self.thread_for(thread_key(&addresses, group_mms_enabled)),
        };

        let uri = self.insert(
            collection,
            pdu.message_type(),
            Some(thread_id),
            pdu.message_id().map(<[u8]>::to_vec),
            pdu.content_location().map(<[u8]>::to_vec),
            pdu.transaction_id().map(<[u8]>::to_vec),
            extra.subscription_id,
        );
        if let Some(address) = &extra.notification_address {
            self.notification_threads.insert(thread_id, address.clone());
        }
        debug!(%uri, %thread_id, "Persisted {}", pdu.kind());
        Ok(Persisted { uri, thread_id })
    }

    async fn update(&self, uri: &MessageUri, update: RowUpdate) -> Result<(), StoreError> {
        self.check_failure()?;
        let id = self.lookup(uri)?;
        if let Some(mut entry) = self.rows.get_mut(&id) {
            match update {
                RowUpdate::ThreadId(thread_id) => entry.row.thread_id = Some(thread_id),
                RowUpdate::SubscriptionId(sub) => entry.row.subscription_id = sub,
            }
        }
        Ok(())
    }

    async fn delete_old(&self, thread_id: ThreadId) -> Result<(), StoreError> {
        self.check_failure()?;
        let Some(limit) = self.thread_limit else {
            return Ok(());
        };
        let in_thread: Vec<u64> = self
            .entries()
            .into_iter()
            .filter(|entry| entry.row.thread_id == Some(thread_id))
            .map(|entry| entry.id)
            .collect();
        let excess = in_thread.len().saturating_sub(limit);
        for id in &in_thread[..excess] {
            self.rows.remove(id);
        }
        if excess > 0 {
            debug!(%thread_id, removed = excess, "Recycled old messages");
        }
        Ok(())
    }
}

/// Preference storage backed by a map; unset keys return the default
#[derive(Debug, Default)]
pub struct InMemoryPreferences {
    values: DashMap<String, bool>,
}

impl InMemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: &str, value: bool) {
        self.values.insert(key.to_string(), value);
    }
}

impl Preferences for InMemoryPreferences {
    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.values.get(key).map(|v| *v).unwrap_or(default)
    }
}

/// Fixed device state, identical for every subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticDeviceConfig {
    pub auto_retrieve: bool,
    pub mobile_data: bool,
}

impl Default for StaticDeviceConfig {
    fn default() -> Self {
        Self {
            auto_retrieve: true,
            mobile_data: true,
        }
    }
}

impl DeviceConfig for StaticDeviceConfig {
    fn is_auto_retrieve_enabled(&self, _subscription_id: SubscriptionId) -> bool {
        self.auto_retrieve
    }

    fn is_mobile_data_enabled(&self, _subscription_id: SubscriptionId) -> bool {
        self.mobile_data
    }
}

/// Side effect observed by [`RecordingUi`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    Indicator {
        thread_id: ThreadId,
        silent: bool,
    },
    WidgetRefresh,
    Retrieval {
        uri: MessageUri,
        transaction_type: TransactionType,
        subscription_id: SubscriptionId,
    },
}

/// Records UI and retrieval calls instead of performing them
#[derive(Debug, Default)]
pub struct RecordingUi {
    calls: Mutex<Vec<SideEffect>>,
    fail_retrieval: Mutex<Option<String>>,
}

impl RecordingUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SideEffect> {
        self.calls.lock().clone()
    }

    /// Make every retrieval start fail with `message`
    pub fn fail_retrieval(&self, message: impl Into<String>) {
        *self.fail_retrieval.lock() = Some(message.into());
    }
}

#[async_trait]
impl NotificationUi for RecordingUi {
    async fn update_indicator(
        &self,
        thread_id: ThreadId,
        silent: bool,
    ) -> Result<(), CollaboratorError> {
        self.calls
            .lock()
            .push(SideEffect::Indicator { thread_id, silent });
        Ok(())
    }
}

#[async_trait]
impl WidgetUi for RecordingUi {
    async fn notify_changed(&self) -> Result<(), CollaboratorError> {
        self.calls.lock().push(SideEffect::WidgetRefresh);
        Ok(())
    }
}

#[async_trait]
impl RetrievalService for RecordingUi {
    async fn start(
        &self,
        uri: &MessageUri,
        transaction_type: TransactionType,
        subscription_id: SubscriptionId,
    ) -> Result<(), CollaboratorError> {
        if let Some(message) = self.fail_retrieval.lock().clone() {
            return Err(CollaboratorError::RetrievalService(message));
        }
        self.calls.lock().push(SideEffect::Retrieval {
            uri: uri.clone(),
            transaction_type,
            subscription_id,
        });
        Ok(())
    }
}
