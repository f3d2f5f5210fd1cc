//! Error types for the MMS push engine

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PushError>;

/// Top-level push error
#[derive(Debug, Error)]
pub enum PushError {
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    #[error("Collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Legacy handler error: {0}")]
    Legacy(String),
}

/// PDU decoding errors
///
/// Every variant is a reason the buffer could not be turned into a PDU;
/// callers treat all of them as a malformed push.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Malformed PDU: {0}")]
    Malformed(MalformedCause),
}

/// Why a buffer was rejected
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MalformedCause {
    #[error("buffer truncated")]
    Truncated,

    #[error("empty buffer")]
    Empty,

    #[error("unterminated text string")]
    UnterminatedString,

    #[error("invalid value length octet 0x{0:02X}")]
    InvalidLength(u8),

    #[error("integer of {0} octets exceeds 8")]
    IntegerTooLong(usize),

    #[error("uintvar exceeds 32 bits")]
    UintvarOverflow,

    #[error("expected short integer, got 0x{0:02X}")]
    NotShortInteger(u8),

    #[error("invalid token 0x{token:02X} in {field}")]
    InvalidToken { field: &'static str, token: u8 },

    #[error("missing X-Mms-Message-Type")]
    MissingMessageType,

    #[error("unknown message type 0x{0:02X}")]
    UnknownMessageType(u8),

    #[error("missing mandatory header 0x{header:02X} for message type 0x{message_type:02X}")]
    MissingHeader { message_type: u8, header: u8 },

    #[error("multipart body: {0}")]
    Body(String),
}

impl DecodeError {
    pub fn cause(&self) -> &MalformedCause {
        match self {
            Self::Malformed(cause) => cause,
        }
    }
}

impl From<MalformedCause> for DecodeError {
    fn from(cause: MalformedCause) -> Self {
        Self::Malformed(cause)
    }
}

/// PDU encoding errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("Cannot encode message type 0x{0:02X}")]
    Unsupported(u8),
}

/// Message store errors
#[derive(Debug, Error, Clone)]
pub enum StoreError {
    #[error("Store operation failed: {0}")]
    Failed(String),

    #[error("No such message: {0}")]
    UnknownUri(String),
}

/// Thread lookup outcome for delivery/read reports
///
/// `NotFound` and `Ambiguous` are both "no matching send request": the
/// thread of the report is never patched in either case.
#[derive(Debug, Error, Clone)]
pub enum LookupError {
    #[error("No send request matches the message id")]
    NotFound,

    #[error("{0} send requests match the message id")]
    Ambiguous(usize),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl LookupError {
    /// True when the lookup completed but produced no single match
    pub fn is_no_match(&self) -> bool {
        matches!(self, Self::NotFound | Self::Ambiguous(_))
    }
}

/// UI and retrieval-service failures raised while executing an action
#[derive(Debug, Error, Clone)]
pub enum CollaboratorError {
    #[error("Notification UI failed: {0}")]
    NotificationUi(String),

    #[error("Widget refresh failed: {0}")]
    Widget(String),

    #[error("Retrieval service failed: {0}")]
    RetrievalService(String),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Source(#[from] config::ConfigError),
}
