//! Typed MMS PDUs handled by the push receiver

use super::body::PduBody;
use super::charset::decode_text;
use super::{
    message_type, ContentType, DeliveryStatus, MessageClass, ReadStatus, TimeValue,
    INSERT_ADDRESS_TOKEN,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Header text with an optional charset (MIBenum)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedString {
    pub charset: Option<u32>,
    pub text: Vec<u8>,
}

impl EncodedString {
    pub fn new(text: impl Into<Vec<u8>>) -> Self {
        Self {
            charset: None,
            text: text.into(),
        }
    }

    pub fn with_charset(charset: u32, text: impl Into<Vec<u8>>) -> Self {
        Self {
            charset: Some(charset),
            text: text.into(),
        }
    }

    /// The From value recorded when the relay inserts the sender address
    pub fn insert_address() -> Self {
        Self::new(INSERT_ADDRESS_TOKEN)
    }

    pub fn is_insert_address(&self) -> bool {
        self.charset.is_none() && self.text == INSERT_ADDRESS_TOKEN.as_bytes()
    }

    pub fn to_string_lossy(&self) -> String {
        decode_text(self.charset, &self.text)
    }
}

impl fmt::Display for EncodedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

/// m-notification-ind: a message is waiting at the relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationInd {
    pub transaction_id: Vec<u8>,
    pub mms_version: u8,
    pub from: Option<EncodedString>,
    pub subject: Option<EncodedString>,
    pub message_class: Option<MessageClass>,
    pub message_size: Option<u64>,
    pub expiry: Option<TimeValue>,
    /// Retrieval URI; absent only when mandatory headers are not enforced
    pub content_location: Option<Vec<u8>>,
    pub delivery_report: Option<bool>,
}

impl NotificationInd {
    pub fn new(transaction_id: impl Into<Vec<u8>>, content_location: impl Into<Vec<u8>>) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            mms_version: super::MMS_VERSION_1_2,
            from: None,
            subject: None,
            message_class: Some(MessageClass::Personal),
            message_size: Some(0),
            expiry: Some(TimeValue::Relative(7 * 24 * 3600)),
            content_location: Some(content_location.into()),
            delivery_report: None,
        }
    }
}

/// m-delivery-ind: delivery report for a message we sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryInd {
    pub message_id: Vec<u8>,
    pub mms_version: u8,
    pub to: Vec<EncodedString>,
    /// Seconds since the epoch
    pub date: Option<u64>,
    pub status: Option<DeliveryStatus>,
}

impl DeliveryInd {
    pub fn date_time(&self) -> Option<DateTime<Utc>> {
        to_date_time(self.date)
    }
}

/// m-read-orig-ind: read report for a message we sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOrigInd {
    pub message_id: Vec<u8>,
    pub mms_version: u8,
    pub from: Option<EncodedString>,
    pub to: Vec<EncodedString>,
    pub date: Option<u64>,
    pub read_status: Option<ReadStatus>,
}

impl ReadOrigInd {
    pub fn date_time(&self) -> Option<DateTime<Utc>> {
        to_date_time(self.date)
    }
}

/// Any other message type; never produces a store write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPdu {
    pub message_type: u8,
    pub transaction_id: Option<Vec<u8>>,
    pub content_type: Option<ContentType>,
    pub body: Option<PduBody>,
}

fn to_date_time(date: Option<u64>) -> Option<DateTime<Utc>> {
    date.and_then(|secs| i64::try_from(secs).ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

/// PDU kinds the dispatcher distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PduKind {
    Notification,
    DeliveryReport,
    ReadReport,
    Unknown,
}

impl fmt::Display for PduKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Notification => "notification",
            Self::DeliveryReport => "delivery-report",
            Self::ReadReport => "read-report",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A decoded push PDU
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedPdu {
    Notification(NotificationInd),
    DeliveryReport(DeliveryInd),
    ReadReport(ReadOrigInd),
    Unknown(UnknownPdu),
}

impl DecodedPdu {
    pub fn kind(&self) -> PduKind {
        match self {
            Self::Notification(_) => PduKind::Notification,
            Self::DeliveryReport(_) => PduKind::DeliveryReport,
            Self::ReadReport(_) => PduKind::ReadReport,
            Self::Unknown(_) => PduKind::Unknown,
        }
    }

    /// X-Mms-Message-Type discriminant
    pub fn message_type(&self) -> u8 {
        match self {
            Self::Notification(_) => message_type::NOTIFICATION_IND,
            Self::DeliveryReport(_) => message_type::DELIVERY_IND,
            Self::ReadReport(_) => message_type::READ_ORIG_IND,
            Self::Unknown(pdu) => pdu.message_type,
        }
    }

    /// Message-ID of a delivery or read report
    pub fn message_id(&self) -> Option<&[u8]> {
        match self {
            Self::DeliveryReport(pdu) => Some(&pdu.message_id),
            Self::ReadReport(pdu) => Some(&pdu.message_id),
            _ => None,
        }
    }

    pub fn content_location(&self) -> Option<&[u8]> {
        match self {
            Self::Notification(pdu) => pdu.content_location.as_deref(),
            _ => None,
        }
    }

    pub fn transaction_id(&self) -> Option<&[u8]> {
        match self {
            Self::Notification(pdu) => Some(&pdu.transaction_id),
            Self::Unknown(pdu) => pdu.transaction_id.as_deref(),
            _ => None,
        }
    }

    /// Sender address as text, when the PDU type carries one
    pub fn sender(&self) -> Option<String> {
        match self {
            Self::Notification(pdu) => pdu.from.as_ref().map(EncodedString::to_string_lossy),
            Self::ReadReport(pdu) => pdu.from.as_ref().map(EncodedString::to_string_lossy),
            _ => None,
        }
    }
}
