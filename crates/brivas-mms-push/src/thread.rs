//! Thread resolution for delivery and read reports

use crate::errors::LookupError;
use crate::pdu::PduKind;
use crate::store::{MessageStore, Predicate};
use crate::types::ThreadId;
use std::sync::Arc;
use tracing::{debug, warn};

/// Finds the conversation a report belongs to through its send request
#[derive(Clone)]
pub struct ThreadResolver {
    store: Arc<dyn MessageStore>,
}

impl ThreadResolver {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }

    /// Thread of the single send request carrying `message_id`
    pub async fn resolve(&self, message_id: &[u8], kind: PduKind) -> Result<ThreadId, LookupError> {
        let rows = self
            .store
            .query(&Predicate::SendRequestsWithMessageId(message_id.to_vec()))
            .await?;

        match rows.as_slice() {
            [] => {
                debug!(%kind, "No send request for report");
                Err(LookupError::NotFound)
            }
            [row] => row.thread_id.ok_or_else(|| {
                warn!(%kind, uri = %row.uri, "Send request has no thread");
                LookupError::NotFound
            }),
            many => {
                warn!(%kind, count = many.len(), "Report matches several send requests");
                Err(LookupError::Ambiguous(many.len()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StoreError;
    use crate::memory::InMemoryStore;

    #[tokio::test]
    async fn test_single_match_returns_thread() {
        let store = Arc::new(InMemoryStore::new());
        store.seed_send_request(b"m1", ThreadId(42));
        let resolver = ThreadResolver::new(store);

        let thread = resolver.resolve(b"m1", PduKind::DeliveryReport).await;
        assert_eq!(thread.unwrap(), ThreadId(42));
    }

    #[tokio::test]
    async fn test_zero_and_many_matches() {
        let store = Arc::new(InMemoryStore::new());
        store.seed_send_request(b"dup", ThreadId(1));
        store.seed_send_request(b"dup", ThreadId(2));
        let resolver = ThreadResolver::new(store);

        assert!(matches!(
            resolver.resolve(b"missing", PduKind::ReadReport).await,
            Err(LookupError::NotFound)
        ));
        assert!(matches!(
            resolver.resolve(b"dup", PduKind::ReadReport).await,
            Err(LookupError::Ambiguous(2))
        ));
    }

    #[tokio::test]
    async fn test_store_failure_is_not_a_miss() {
        let store = Arc::new(InMemoryStore::new());
        store.fail_next("cursor closed");
        let resolver = ThreadResolver::new(store);

        let err = resolver.resolve(b"m1", PduKind::DeliveryReport).await.unwrap_err();
        assert!(matches!(err, LookupError::Store(StoreError::Failed(_))));
        assert!(!err.is_no_match());
    }
}
