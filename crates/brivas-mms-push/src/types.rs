//! Common types shared by the codec, the dispatcher and the collaborators

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Conversation thread identifier assigned by the message store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ThreadId(pub i64);

impl ThreadId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Store-generated identifier of a persisted message
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageUri(pub String);

impl MessageUri {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Subscription (SIM slot) identifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub i32);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// MIME types accepted by the push receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PushMimeType {
    /// `application/vnd.wap.mms-message`
    MmsMessage,
    /// `application/vnd.wap.sic` (compiled Service Indication)
    ServiceIndication,
    /// `application/vnd.wap.slc` (compiled Service Loading)
    ServiceLoading,
}

impl PushMimeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MmsMessage => crate::mime::MMS_MESSAGE,
            Self::ServiceIndication => crate::mime::WAP_SIC,
            Self::ServiceLoading => crate::mime::WAP_SLC,
        }
    }

    /// Browser-provisioning types handled outside the MMS path
    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::ServiceIndication | Self::ServiceLoading)
    }
}

impl FromStr for PushMimeType {
    type Err = UnsupportedMimeType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            crate::mime::MMS_MESSAGE => Ok(Self::MmsMessage),
            crate::mime::WAP_SIC => Ok(Self::ServiceIndication),
            crate::mime::WAP_SLC => Ok(Self::ServiceLoading),
            other => Err(UnsupportedMimeType(other.to_string())),
        }
    }
}

impl fmt::Display for PushMimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A MIME type the receiver does not accept
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported push MIME type: {0}")]
pub struct UnsupportedMimeType(pub String);

/// A WAP push as delivered by the platform
#[derive(Debug, Clone)]
pub struct RawPush {
    /// Push payload (the WSP body)
    pub data: Bytes,
    pub mime_type: PushMimeType,
    /// Originating address, if the platform supplied one
    pub address: Option<String>,
    pub subscription_id: SubscriptionId,
}

impl RawPush {
    /// MMS push on the default subscription
    pub fn mms(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            mime_type: PushMimeType::MmsMessage,
            address: None,
            subscription_id: SubscriptionId::default(),
        }
    }

    pub fn with_mime_type(mut self, mime_type: PushMimeType) -> Self {
        self.mime_type = mime_type;
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_subscription(mut self, subscription_id: SubscriptionId) -> Self {
        self.subscription_id = subscription_id;
        self
    }

    /// Originating address, falling back to the browser-information sentinel
    pub fn address_or_default(&self) -> &str {
        self.address
            .as_deref()
            .unwrap_or(crate::WAP_PUSH_DEFAULT_ADDRESS)
    }
}

/// Per-push snapshot of user preferences and device state
///
/// Built once per push by the receiver so the codec and the policy stay
/// pure functions of their inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchContext {
    pub subscription_id: SubscriptionId,
    /// Hand SI-C/SL-C pushes to the legacy handlers
    pub wap_push_enabled: bool,
    /// Append the transaction id to content locations ending in `=`
    pub transaction_id_enabled: bool,
    pub group_mms_enabled: bool,
    pub auto_retrieve_enabled: bool,
    pub mobile_data_enabled: bool,
    pub parse_content_disposition: bool,
    pub check_mandatory_headers: bool,
}

impl Default for DispatchContext {
    fn default() -> Self {
        Self {
            subscription_id: SubscriptionId::default(),
            wap_push_enabled: true,
            transaction_id_enabled: false,
            group_mms_enabled: true,
            auto_retrieve_enabled: true,
            mobile_data_enabled: true,
            parse_content_disposition: true,
            check_mandatory_headers: true,
        }
    }
}

/// Store collection a PDU is persisted into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Collection {
    Inbox,
    Sent,
}

/// Transaction kind handed to the retrieval service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    Notification,
}
