//! Duplicate notification detection

use crate::errors::StoreError;
use crate::store::{MessageStore, Predicate};
use std::sync::Arc;
use tracing::debug;

/// Has a notification with this content location been stored before?
#[derive(Clone)]
pub struct DuplicateDetector {
    store: Arc<dyn MessageStore>,
}

impl DuplicateDetector {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }

    /// Exact byte match; an absent location is never a duplicate
    pub async fn is_duplicate(&self, content_location: Option<&[u8]>) -> Result<bool, StoreError> {
        let Some(location) = content_location else {
            return Ok(false);
        };
        let matches = self
            .store
            .query(&Predicate::ContentLocation(location.to_vec()))
            .await?;
        if !matches.is_empty() {
            debug!(
                location = %String::from_utf8_lossy(location),
                matches = matches.len(),
                "Content location already stored"
            );
        }
        Ok(!matches.is_empty())
    }
}
