//! Legacy browser-provisioning push handlers (SI-C / SL-C)
//!
//! Handlers are pluggable third-party code, so they report failures with
//! `anyhow` rather than an engine error type.

use crate::errors::PushError;
use crate::types::{PushMimeType, SubscriptionId, ThreadId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Context handed to a legacy handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyContext {
    /// Push address with the browser-information suffix appended
    pub address: String,
    pub subscription_id: SubscriptionId,
}

impl LegacyContext {
    pub fn new(address: &str, subscription_id: SubscriptionId) -> Self {
        Self {
            address: format!("{address}{}", crate::WAP_PUSH_ADDRESS_SUFFIX),
            subscription_id,
        }
    }
}

/// Stores an SI-C/SL-C push as a message
#[async_trait]
pub trait LegacyPushHandler: Send + Sync {
    /// `Some(thread)` when the push was stored, `None` when ignored
    async fn handle(
        &self,
        data: &[u8],
        mime_type: PushMimeType,
        ctx: &LegacyContext,
    ) -> anyhow::Result<Option<ThreadId>>;
}

/// Handlers keyed by legacy MIME type, populated at startup
#[derive(Clone, Default)]
pub struct LegacyPushHandlers {
    handlers: HashMap<PushMimeType, Arc<dyn LegacyPushHandler>>,
}

impl LegacyPushHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler; only SI-C and SL-C may be registered
    pub fn register(
        &mut self,
        mime_type: PushMimeType,
        handler: Arc<dyn LegacyPushHandler>,
    ) -> Result<(), PushError> {
        if !mime_type.is_legacy() {
            return Err(PushError::Legacy(format!(
                "{mime_type} is not a legacy push type"
            )));
        }
        self.handlers.insert(mime_type, handler);
        Ok(())
    }

    pub fn with(
        mut self,
        mime_type: PushMimeType,
        handler: Arc<dyn LegacyPushHandler>,
    ) -> Result<Self, PushError> {
        self.register(mime_type, handler)?;
        Ok(self)
    }

    pub fn get(&self, mime_type: PushMimeType) -> Option<&Arc<dyn LegacyPushHandler>> {
        self.handlers.get(&mime_type)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for LegacyPushHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LegacyPushHandlers")
            .field("mime_types", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ignore;

    #[async_trait]
    impl LegacyPushHandler for Ignore {
        async fn handle(
            &self,
            _data: &[u8],
            _mime_type: PushMimeType,
            _ctx: &LegacyContext,
        ) -> anyhow::Result<Option<ThreadId>> {
            Ok(None)
        }
    }

    #[test]
    fn test_registry_rejects_mms_type() {
        let mut handlers = LegacyPushHandlers::new();
        assert!(handlers
            .register(PushMimeType::MmsMessage, Arc::new(Ignore))
            .is_err());
        assert!(handlers
            .register(PushMimeType::ServiceLoading, Arc::new(Ignore))
            .is_ok());
        assert_eq!(handlers.len(), 1);
        assert!(handlers.get(PushMimeType::ServiceLoading).is_some());
        assert!(handlers.get(PushMimeType::ServiceIndication).is_none());
    }

    #[test]
    fn test_context_address_suffix() {
        let ctx = LegacyContext::new("Browser Information", SubscriptionId(1));
        assert_eq!(ctx.address, "Browser Information:Browser Information");
    }
}
