//! # Brivas MMS Push
//!
//! Decoding and retrieval-decision engine for MMS WAP push:
//!
//! - **PDU** - OMA MMS encapsulation over WSP encoding (decode / encode)
//! - **Dispatcher** - classification, deduplication, thread resolution, retrieval policy
//! - **Executor** - UI, retrieval and recycling side effects of a decision
//! - **Receiver** - per-push tasks under a time budget, with statistics
//!
//! ## Example
//! ```rust,ignore
//! use brivas_mms_push::{PushDispatcher, LegacyPushHandlers, RawPush, DispatchContext};
//!
//! let dispatcher = PushDispatcher::new(store, LegacyPushHandlers::new());
//! let action = dispatcher.dispatch(&RawPush::mms(bytes), &DispatchContext::default()).await;
//! ```

pub mod action;
pub mod config;
pub mod dedup;
pub mod dispatcher;
pub mod errors;
pub mod executor;
pub mod legacy;
pub mod memory;
pub mod pdu;
pub mod policy;
pub mod receiver;
pub mod stats;
pub mod store;
pub mod thread;
pub mod types;

// Re-exports
pub use action::{Action, DropReason};
pub use crate::config::PushConfig;
pub use errors::{PushError, Result};
pub use types::*;

pub use dedup::DuplicateDetector;
pub use dispatcher::PushDispatcher;
pub use executor::ActionExecutor;
pub use legacy::{LegacyContext, LegacyPushHandler, LegacyPushHandlers};
pub use pdu::{CodecOptions, DecodedPdu, PduCodec};
pub use policy::{RetrievalContext, RetrievalDecision, RetrievalPolicy};
pub use receiver::PushReceiver;
pub use stats::PushStats;
pub use thread::ThreadResolver;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Address recorded for pushes that arrive without one
pub const WAP_PUSH_DEFAULT_ADDRESS: &str = "Browser Information";

/// Suffix appended to the address handed to legacy handlers
pub const WAP_PUSH_ADDRESS_SUFFIX: &str = ":Browser Information";

/// Push MIME types
pub mod mime {
    pub const MMS_MESSAGE: &str = "application/vnd.wap.mms-message";
    pub const WAP_SIC: &str = "application/vnd.wap.sic";
    pub const WAP_SLC: &str = "application/vnd.wap.slc";
}
