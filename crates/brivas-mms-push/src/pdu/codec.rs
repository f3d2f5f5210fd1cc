//! Codec facade and the transaction-id append rule

use super::decoder::PduDecoder;
use super::encoder::PduEncoder;
use super::messages::{DecodedPdu, NotificationInd};
use crate::errors::{DecodeError, EncodingError};
use crate::types::DispatchContext;
use bytes::BytesMut;
use serde::{Deserialize, Serialize};

/// Decoder switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecOptions {
    /// Honour Content-Disposition in multipart part headers
    pub parse_content_disposition: bool,
    /// Reject PDUs missing the headers their type requires
    pub check_mandatory_headers: bool,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            parse_content_disposition: true,
            check_mandatory_headers: true,
        }
    }
}

impl CodecOptions {
    pub fn from_context(ctx: &DispatchContext) -> Self {
        Self {
            parse_content_disposition: ctx.parse_content_disposition,
            check_mandatory_headers: ctx.check_mandatory_headers,
        }
    }
}

/// Pure decode/encode entry point used by the dispatcher
#[derive(Debug, Clone, Default)]
pub struct PduCodec {
    options: CodecOptions,
    decoder: PduDecoder,
    encoder: PduEncoder,
}

impl PduCodec {
    pub fn new(options: CodecOptions) -> Self {
        Self {
            options,
            decoder: PduDecoder::new(options),
            encoder: PduEncoder::new(),
        }
    }

    pub fn options(&self) -> CodecOptions {
        self.options
    }

    pub fn decode(&self, data: &[u8]) -> Result<DecodedPdu, DecodeError> {
        self.decoder.decode(data)
    }

    pub fn encode(&self, pdu: &DecodedPdu) -> Result<BytesMut, EncodingError> {
        self.encoder.encode(pdu)
    }
}

/// Append `transaction_id` to a content location ending in `=`
///
/// Returns `None` when the location does not qualify. Bytes are appended
/// as-is, without separator or re-encoding.
pub fn append_transaction_id(location: &[u8], transaction_id: &[u8]) -> Option<Vec<u8>> {
    if location.last() != Some(&b'=') {
        return None;
    }
    let mut appended = Vec::with_capacity(location.len() + transaction_id.len());
    appended.extend_from_slice(location);
    appended.extend_from_slice(transaction_id);
    Some(appended)
}

/// Content location after the append rule, without touching the PDU
pub fn effective_content_location(
    notification: &NotificationInd,
    transaction_id_enabled: bool,
) -> Option<Vec<u8>> {
    let location = notification.content_location.as_deref()?;
    if transaction_id_enabled {
        if let Some(appended) = append_transaction_id(location, &notification.transaction_id) {
            return Some(appended);
        }
    }
    Some(location.to_vec())
}
