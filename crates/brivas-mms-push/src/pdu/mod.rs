//! MMS PDU layer
//!
//! OMA-MMS-ENC message headers over WSP (WAP-230) value encoding.

mod body;
mod charset;
mod codec;
mod decoder;
mod encoder;
mod messages;
pub(crate) mod wsp;

pub use body::{ContentDisposition, DispositionKind, MultipartBody, Part, PduBody};
pub use charset::{decode_text, encoding_for_mib};
pub use codec::{append_transaction_id, effective_content_location, CodecOptions, PduCodec};
pub use decoder::PduDecoder;
pub use encoder::PduEncoder;
pub use messages::{
    DecodedPdu, DeliveryInd, EncodedString, NotificationInd, PduKind, ReadOrigInd, UnknownPdu,
};

use serde::{Deserialize, Serialize};

/// X-Mms-Message-Type values
pub mod message_type {
    pub const SEND_REQ: u8 = 0x80;
    pub const SEND_CONF: u8 = 0x81;
    pub const NOTIFICATION_IND: u8 = 0x82;
    pub const NOTIFYRESP_IND: u8 = 0x83;
    pub const RETRIEVE_CONF: u8 = 0x84;
    pub const ACKNOWLEDGE_IND: u8 = 0x85;
    pub const DELIVERY_IND: u8 = 0x86;
    pub const READ_REC_IND: u8 = 0x87;
    pub const READ_ORIG_IND: u8 = 0x88;
    pub const FORWARD_REQ: u8 = 0x89;
    pub const FORWARD_CONF: u8 = 0x8A;
}

/// Well-known MMS header field codes (assigned number | 0x80)
pub mod header {
    pub const BCC: u8 = 0x81;
    pub const CC: u8 = 0x82;
    pub const CONTENT_LOCATION: u8 = 0x83;
    pub const CONTENT_TYPE: u8 = 0x84;
    pub const DATE: u8 = 0x85;
    pub const DELIVERY_REPORT: u8 = 0x86;
    pub const DELIVERY_TIME: u8 = 0x87;
    pub const EXPIRY: u8 = 0x88;
    pub const FROM: u8 = 0x89;
    pub const MESSAGE_CLASS: u8 = 0x8A;
    pub const MESSAGE_ID: u8 = 0x8B;
    pub const MESSAGE_TYPE: u8 = 0x8C;
    pub const MMS_VERSION: u8 = 0x8D;
    pub const MESSAGE_SIZE: u8 = 0x8E;
    pub const PRIORITY: u8 = 0x8F;
    pub const READ_REPORT: u8 = 0x90;
    pub const REPORT_ALLOWED: u8 = 0x91;
    pub const RESPONSE_STATUS: u8 = 0x92;
    pub const RESPONSE_TEXT: u8 = 0x93;
    pub const SENDER_VISIBILITY: u8 = 0x94;
    pub const STATUS: u8 = 0x95;
    pub const SUBJECT: u8 = 0x96;
    pub const TO: u8 = 0x97;
    pub const TRANSACTION_ID: u8 = 0x98;
    pub const RETRIEVE_STATUS: u8 = 0x99;
    pub const RETRIEVE_TEXT: u8 = 0x9A;
    pub const READ_STATUS: u8 = 0x9B;
    pub const REPLY_CHARGING: u8 = 0x9C;
    pub const REPLY_CHARGING_DEADLINE: u8 = 0x9D;
    pub const REPLY_CHARGING_ID: u8 = 0x9E;
    pub const REPLY_CHARGING_SIZE: u8 = 0x9F;
    pub const PREVIOUSLY_SENT_BY: u8 = 0xA0;
    pub const PREVIOUSLY_SENT_DATE: u8 = 0xA1;
    pub const STORE: u8 = 0xA2;
    pub const MM_STATE: u8 = 0xA3;
    pub const MM_FLAGS: u8 = 0xA4;
    pub const STORE_STATUS: u8 = 0xA5;
    pub const STORE_STATUS_TEXT: u8 = 0xA6;
    pub const STORED: u8 = 0xA7;
    pub const DISTRIBUTION_INDICATOR: u8 = 0xB1;
    pub const STATUS_TEXT: u8 = 0xB6;
    pub const APPLIC_ID: u8 = 0xB7;
    pub const REPLY_APPLIC_ID: u8 = 0xB8;
    pub const AUX_APPLIC_ID: u8 = 0xB9;
    pub const CONTENT_CLASS: u8 = 0xBA;
    pub const DRM_CONTENT: u8 = 0xBB;
    pub const ADAPTATION_ALLOWED: u8 = 0xBC;
    pub const REPLACE_ID: u8 = 0xBD;
    pub const CANCEL_ID: u8 = 0xBE;
    pub const CANCEL_STATUS: u8 = 0xBF;
}

/// Well-known WSP header codes seen in multipart part headers
pub mod part_header {
    pub const CONTENT_LOCATION: u8 = 0x8E;
    pub const CONTENT_DISPOSITION: u8 = 0xAE;
    pub const CONTENT_ID: u8 = 0xC0;
    pub const CONTENT_DISPOSITION_V14: u8 = 0xC5;
}

/// Boolean header values (Delivery-Report, Read-Report, ...)
pub const VALUE_YES: u8 = 0x80;
pub const VALUE_NO: u8 = 0x81;

/// MMS 1.2, encoded as major << 4 | minor
pub const MMS_VERSION_1_2: u8 = 0x12;

/// Text the From header carries when the relay inserts the address
pub const INSERT_ADDRESS_TOKEN: &str = "insert-address-token";

/// Mandatory headers per message type, Message-Type excluded
///
/// `None` for message types this receiver does not recognise at all.
pub fn mandatory_headers(message_type: u8) -> Option<&'static [u8]> {
    use header::*;
    let required: &'static [u8] = match message_type {
        message_type::SEND_REQ => &[CONTENT_TYPE, FROM, TRANSACTION_ID, MMS_VERSION],
        message_type::SEND_CONF => &[RESPONSE_STATUS, TRANSACTION_ID, MMS_VERSION],
        message_type::NOTIFICATION_IND => &[
            CONTENT_LOCATION,
            EXPIRY,
            MESSAGE_CLASS,
            MESSAGE_SIZE,
            TRANSACTION_ID,
            MMS_VERSION,
        ],
        message_type::NOTIFYRESP_IND => &[STATUS, TRANSACTION_ID, MMS_VERSION],
        message_type::RETRIEVE_CONF => &[CONTENT_TYPE, DATE, MMS_VERSION],
        message_type::ACKNOWLEDGE_IND => &[TRANSACTION_ID, MMS_VERSION],
        message_type::DELIVERY_IND => &[DATE, MESSAGE_ID, STATUS, TO, MMS_VERSION],
        message_type::READ_REC_IND => &[FROM, MESSAGE_ID, READ_STATUS, TO, MMS_VERSION],
        message_type::READ_ORIG_IND => &[DATE, FROM, MESSAGE_ID, READ_STATUS, TO, MMS_VERSION],
        _ => return None,
    };
    Some(required)
}

/// X-Mms-Message-Class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageClass {
    Personal,
    Advertisement,
    Informational,
    Auto,
    Other(String),
}

impl MessageClass {
    pub fn from_token(token: u8) -> Option<Self> {
        match token {
            0x80 => Some(Self::Personal),
            0x81 => Some(Self::Advertisement),
            0x82 => Some(Self::Informational),
            0x83 => Some(Self::Auto),
            _ => None,
        }
    }

    pub fn token(&self) -> Option<u8> {
        match self {
            Self::Personal => Some(0x80),
            Self::Advertisement => Some(0x81),
            Self::Informational => Some(0x82),
            Self::Auto => Some(0x83),
            Self::Other(_) => None,
        }
    }

    /// Map a token-text class name, falling back to `Other`
    pub fn from_text(text: &str) -> Self {
        match text.to_ascii_lowercase().as_str() {
            "personal" => Self::Personal,
            "advertisement" => Self::Advertisement,
            "informational" => Self::Informational,
            "auto" => Self::Auto,
            _ => Self::Other(text.to_string()),
        }
    }
}

/// Expiry / Delivery-Time value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeValue {
    /// Seconds since the epoch
    Absolute(u64),
    /// Seconds from receipt
    Relative(u64),
}

impl TimeValue {
    pub const ABSOLUTE_TOKEN: u8 = 0x80;
    pub const RELATIVE_TOKEN: u8 = 0x81;
}

/// X-Mms-Status carried by m-delivery-ind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryStatus {
    Expired,
    Retrieved,
    Rejected,
    Deferred,
    Unrecognised,
    Indeterminate,
    Forwarded,
    Unreachable,
    Other(u8),
}

impl From<u8> for DeliveryStatus {
    fn from(v: u8) -> Self {
        match v {
            0x80 => Self::Expired,
            0x81 => Self::Retrieved,
            0x82 => Self::Rejected,
            0x83 => Self::Deferred,
            0x84 => Self::Unrecognised,
            0x85 => Self::Indeterminate,
            0x86 => Self::Forwarded,
            0x87 => Self::Unreachable,
            other => Self::Other(other),
        }
    }
}

impl From<DeliveryStatus> for u8 {
    fn from(status: DeliveryStatus) -> Self {
        match status {
            DeliveryStatus::Expired => 0x80,
            DeliveryStatus::Retrieved => 0x81,
            DeliveryStatus::Rejected => 0x82,
            DeliveryStatus::Deferred => 0x83,
            DeliveryStatus::Unrecognised => 0x84,
            DeliveryStatus::Indeterminate => 0x85,
            DeliveryStatus::Forwarded => 0x86,
            DeliveryStatus::Unreachable => 0x87,
            DeliveryStatus::Other(v) => v,
        }
    }
}

/// X-Mms-Read-Status carried by m-read-orig-ind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadStatus {
    Read,
    DeletedWithoutBeingRead,
    Other(u8),
}

impl From<u8> for ReadStatus {
    fn from(v: u8) -> Self {
        match v {
            0x80 => Self::Read,
            0x81 => Self::DeletedWithoutBeingRead,
            other => Self::Other(other),
        }
    }
}

impl From<ReadStatus> for u8 {
    fn from(status: ReadStatus) -> Self {
        match status {
            ReadStatus::Read => 0x80,
            ReadStatus::DeletedWithoutBeingRead => 0x81,
            ReadStatus::Other(v) => v,
        }
    }
}

/// Decoded Content-Type header value
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContentType {
    pub media_type: String,
    /// Charset MIBenum
    pub charset: Option<u32>,
    /// `type` parameter of multipart/related
    pub type_param: Option<String>,
    /// `start` parameter of multipart/related
    pub start: Option<Vec<u8>>,
    pub name: Option<Vec<u8>>,
    pub filename: Option<Vec<u8>>,
}

impl ContentType {
    pub fn new(media_type: impl Into<String>) -> Self {
        Self {
            media_type: media_type.into(),
            ..Default::default()
        }
    }

    pub fn is_multipart(&self) -> bool {
        self.media_type.starts_with("application/vnd.wap.multipart.")
            || self.media_type.starts_with("multipart/")
    }
}

/// WSP well-known content types (WAP-230 Table 40)
const WELL_KNOWN_MEDIA: &[&str] = &[
    "*/*",
    "text/*",
    "text/html",
    "text/plain",
    "text/x-hdml",
    "text/x-ttml",
    "text/x-vCalendar",
    "text/x-vCard",
    "text/vnd.wap.wml",
    "text/vnd.wap.wmlscript",
    "text/vnd.wap.wta-event",
    "multipart/*",
    "multipart/mixed",
    "multipart/form-data",
    "multipart/byterantes",
    "multipart/alternative",
    "application/*",
    "application/java-vm",
    "application/x-www-form-urlencoded",
    "application/x-hdmlc",
    "application/vnd.wap.wmlc",
    "application/vnd.wap.wmlscriptc",
    "application/vnd.wap.wta-eventc",
    "application/vnd.wap.uaprof",
    "application/vnd.wap.wtls-ca-certificate",
    "application/vnd.wap.wtls-user-certificate",
    "application/x-x509-ca-cert",
    "application/x-x509-user-cert",
    "image/*",
    "image/gif",
    "image/jpeg",
    "image/tiff",
    "image/png",
    "image/vnd.wap.wbmp",
    "application/vnd.wap.multipart.*",
    "application/vnd.wap.multipart.mixed",
    "application/vnd.wap.multipart.form-data",
    "application/vnd.wap.multipart.byteranges",
    "application/vnd.wap.multipart.alternative",
    "application/xml",
    "text/xml",
    "application/vnd.wap.wbxml",
    "application/x-x968-cross-cert",
    "application/x-x968-ca-cert",
    "application/x-x968-user-cert",
    "text/vnd.wap.si",
    "application/vnd.wap.sic",
    "text/vnd.wap.sl",
    "application/vnd.wap.slc",
    "text/vnd.wap.co",
    "application/vnd.wap.coc",
    "application/vnd.wap.multipart.related",
    "application/vnd.wap.sia",
    "text/vnd.wap.connectivity-xml",
    "application/vnd.wap.connectivity-wbxml",
    "application/pkcs7-mime",
    "application/vnd.wap.hashed-certificate",
    "application/vnd.wap.signed-certificate",
    "application/vnd.wap.cert-response",
    "application/xhtml+xml",
    "application/wml+xml",
    "text/css",
    "application/vnd.wap.mms-message",
];

/// Media type name for a well-known content type code
pub fn well_known_media(code: u64) -> Option<&'static str> {
    usize::try_from(code)
        .ok()
        .and_then(|idx| WELL_KNOWN_MEDIA.get(idx))
        .copied()
}

/// Well-known code for a media type name
pub fn media_code(media_type: &str) -> Option<u8> {
    WELL_KNOWN_MEDIA
        .iter()
        .position(|m| m.eq_ignore_ascii_case(media_type))
        .and_then(|idx| u8::try_from(idx).ok())
}
