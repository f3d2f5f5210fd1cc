//! MMS PDU encoder
//!
//! Writes the three PDU kinds the receiver stores. Message-Type,
//! Transaction-Id and MMS-Version always lead the header section.

use super::messages::{DecodedPdu, DeliveryInd, EncodedString, NotificationInd, ReadOrigInd};
use super::wsp;
use super::{header, message_type, MessageClass, TimeValue, VALUE_NO, VALUE_YES};
use crate::errors::EncodingError;
use bytes::{BufMut, BytesMut};

const FROM_ADDRESS_PRESENT: u8 = 0x80;
const FROM_INSERT_ADDRESS: u8 = 0x81;

#[derive(Debug, Clone, Copy, Default)]
pub struct PduEncoder;

impl PduEncoder {
    pub fn new() -> Self {
        Self
    }

    pub fn encode(&self, pdu: &DecodedPdu) -> Result<BytesMut, EncodingError> {
        let mut buf = BytesMut::with_capacity(128);
        match pdu {
            DecodedPdu::Notification(notification) => encode_notification(&mut buf, notification),
            DecodedPdu::DeliveryReport(report) => encode_delivery(&mut buf, report),
            DecodedPdu::ReadReport(report) => encode_read_orig(&mut buf, report),
            DecodedPdu::Unknown(unknown) => {
                return Err(EncodingError::Unsupported(unknown.message_type))
            }
        }
        Ok(buf)
    }
}

fn encode_notification(buf: &mut BytesMut, pdu: &NotificationInd) {
    put_message_type(buf, message_type::NOTIFICATION_IND);
    put_text_header(buf, header::TRANSACTION_ID, &pdu.transaction_id);
    put_version(buf, pdu.mms_version);

    if let Some(from) = &pdu.from {
        put_from(buf, from);
    }
    if let Some(subject) = &pdu.subject {
        buf.put_u8(header::SUBJECT);
        wsp::put_encoded_string(buf, subject);
    }
    if let Some(class) = &pdu.message_class {
        buf.put_u8(header::MESSAGE_CLASS);
        match class {
            MessageClass::Other(text) => wsp::put_text_string(buf, text.as_bytes()),
            known => buf.put_u8(known.token().unwrap_or(0x80)),
        }
    }
    if let Some(size) = pdu.message_size {
        buf.put_u8(header::MESSAGE_SIZE);
        wsp::put_long_integer(buf, size);
    }
    if let Some(expiry) = pdu.expiry {
        buf.put_u8(header::EXPIRY);
        put_time_value(buf, expiry);
    }
    if let Some(report) = pdu.delivery_report {
        buf.put_u8(header::DELIVERY_REPORT);
        buf.put_u8(if report { VALUE_YES } else { VALUE_NO });
    }
    if let Some(location) = &pdu.content_location {
        put_text_header(buf, header::CONTENT_LOCATION, location);
    }
}

fn encode_delivery(buf: &mut BytesMut, pdu: &DeliveryInd) {
    put_message_type(buf, message_type::DELIVERY_IND);
    put_version(buf, pdu.mms_version);
    put_text_header(buf, header::MESSAGE_ID, &pdu.message_id);
    put_recipients(buf, &pdu.to);
    if let Some(date) = pdu.date {
        buf.put_u8(header::DATE);
        wsp::put_long_integer(buf, date);
    }
    if let Some(status) = pdu.status {
        buf.put_u8(header::STATUS);
        buf.put_u8(status.into());
    }
}

fn encode_read_orig(buf: &mut BytesMut, pdu: &ReadOrigInd) {
    put_message_type(buf, message_type::READ_ORIG_IND);
    put_version(buf, pdu.mms_version);
    put_text_header(buf, header::MESSAGE_ID, &pdu.message_id);
    put_recipients(buf, &pdu.to);
    if let Some(from) = &pdu.from {
        put_from(buf, from);
    }
    if let Some(date) = pdu.date {
        buf.put_u8(header::DATE);
        wsp::put_long_integer(buf, date);
    }
    if let Some(status) = pdu.read_status {
        buf.put_u8(header::READ_STATUS);
        buf.put_u8(status.into());
    }
}

fn put_message_type(buf: &mut BytesMut, value: u8) {
    buf.put_u8(header::MESSAGE_TYPE);
    buf.put_u8(value);
}

fn put_version(buf: &mut BytesMut, version: u8) {
    buf.put_u8(header::MMS_VERSION);
    wsp::put_short_integer(buf, version);
}

fn put_text_header(buf: &mut BytesMut, field: u8, text: &[u8]) {
    buf.put_u8(field);
    wsp::put_text_string(buf, text);
}

fn put_recipients(buf: &mut BytesMut, to: &[EncodedString]) {
    for address in to {
        buf.put_u8(header::TO);
        wsp::put_encoded_string(buf, address);
    }
}

fn put_from(buf: &mut BytesMut, from: &EncodedString) {
    buf.put_u8(header::FROM);
    if from.is_insert_address() {
        wsp::put_value_length(buf, 1);
        buf.put_u8(FROM_INSERT_ADDRESS);
        return;
    }
    let mut inner = BytesMut::new();
    inner.put_u8(FROM_ADDRESS_PRESENT);
    wsp::put_encoded_string(&mut inner, from);
    wsp::put_value_length(buf, inner.len());
    buf.put_slice(&inner);
}

fn put_time_value(buf: &mut BytesMut, value: TimeValue) {
    let mut inner = BytesMut::new();
    match value {
        TimeValue::Absolute(secs) => {
            inner.put_u8(TimeValue::ABSOLUTE_TOKEN);
            wsp::put_long_integer(&mut inner, secs);
        }
        TimeValue::Relative(secs) => {
            inner.put_u8(TimeValue::RELATIVE_TOKEN);
            wsp::put_integer_value(&mut inner, secs);
        }
    }
    wsp::put_value_length(buf, inner.len());
    buf.put_slice(&inner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdu::messages::UnknownPdu;
    use crate::pdu::{CodecOptions, DeliveryStatus, PduDecoder, ReadStatus};

    fn decode(bytes: &[u8]) -> DecodedPdu {
        PduDecoder::new(CodecOptions::default()).decode(bytes).unwrap()
    }

    #[test]
    fn test_notification_leading_headers() {
        let pdu = DecodedPdu::Notification(NotificationInd::new("T1", "http://x/y"));
        let bytes = PduEncoder::new().encode(&pdu).unwrap();
        assert_eq!(&bytes[..7], &[0x8C, 0x82, 0x98, b'T', b'1', 0x00, 0x8D]);
        assert_eq!(decode(&bytes), pdu);
    }

    #[test]
    fn test_notification_with_sender_and_subject() {
        let mut notification = NotificationInd::new("T2", "http://mmsc/get?id=");
        notification.from = Some(EncodedString::new("+15550100/TYPE=PLMN"));
        notification.subject = Some(EncodedString::with_charset(106, "héllo"));
        notification.expiry = Some(TimeValue::Absolute(1_700_000_000));
        notification.delivery_report = Some(false);
        let pdu = DecodedPdu::Notification(notification);

        let bytes = PduEncoder::new().encode(&pdu).unwrap();
        assert_eq!(decode(&bytes), pdu);
    }

    #[test]
    fn test_reports_decode_back() {
        let delivery = DecodedPdu::DeliveryReport(DeliveryInd {
            message_id: b"msg-1".to_vec(),
            mms_version: 0x12,
            to: vec![EncodedString::new("+15550100/TYPE=PLMN")],
            date: Some(1_700_000_000),
            status: Some(DeliveryStatus::Rejected),
        });
        let bytes = PduEncoder::new().encode(&delivery).unwrap();
        assert_eq!(decode(&bytes), delivery);

        let read = DecodedPdu::ReadReport(ReadOrigInd {
            message_id: b"msg-2".to_vec(),
            mms_version: 0x12,
            from: Some(EncodedString::insert_address()),
            to: vec![EncodedString::new("a@example.com")],
            date: Some(0),
            read_status: Some(ReadStatus::DeletedWithoutBeingRead),
        });
        let bytes = PduEncoder::new().encode(&read).unwrap();
        assert_eq!(decode(&bytes), read);
    }

    #[test]
    fn test_unknown_is_unsupported() {
        let pdu = DecodedPdu::Unknown(UnknownPdu {
            message_type: 0x84,
            transaction_id: None,
            content_type: None,
            body: None,
        });
        assert_eq!(
            PduEncoder::new().encode(&pdu),
            Err(EncodingError::Unsupported(0x84))
        );
    }
}
