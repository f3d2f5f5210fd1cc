//! MMS PDU decoder

use super::body::{get_body, get_content_type, PduBody};
use super::codec::CodecOptions;
use super::messages::{
    DecodedPdu, DeliveryInd, EncodedString, NotificationInd, ReadOrigInd, UnknownPdu,
};
use super::wsp::{self, Parse};
use super::{
    header, mandatory_headers, message_type, ContentType, DeliveryStatus, MessageClass,
    ReadStatus, TimeValue, MMS_VERSION_1_2, VALUE_NO, VALUE_YES,
};
use crate::errors::{DecodeError, MalformedCause};
use bytes::{Buf, Bytes};
use tracing::trace;

const FROM_ADDRESS_PRESENT: u8 = 0x80;
const FROM_INSERT_ADDRESS: u8 = 0x81;

/// Header values collected in a single pass
#[derive(Debug, Default)]
struct Headers {
    seen: Vec<u8>,
    message_type: Option<u8>,
    transaction_id: Option<Vec<u8>>,
    mms_version: Option<u8>,
    message_id: Option<Vec<u8>>,
    content_location: Option<Vec<u8>>,
    from: Option<EncodedString>,
    to: Vec<EncodedString>,
    subject: Option<EncodedString>,
    date: Option<u64>,
    expiry: Option<TimeValue>,
    message_class: Option<MessageClass>,
    message_size: Option<u64>,
    status: Option<u8>,
    read_status: Option<u8>,
    delivery_report: Option<bool>,
    content_type: Option<ContentType>,
    body: Option<PduBody>,
}

impl Headers {
    fn has(&self, field: u8) -> bool {
        self.seen.contains(&field)
    }
}

/// Turns raw push bytes into a typed PDU
#[derive(Debug, Clone, Default)]
pub struct PduDecoder {
    options: CodecOptions,
}

impl PduDecoder {
    pub fn new(options: CodecOptions) -> Self {
        Self { options }
    }

    pub fn decode(&self, data: &[u8]) -> Result<DecodedPdu, DecodeError> {
        if data.is_empty() {
            return Err(MalformedCause::Empty.into());
        }
        let mut buf = Bytes::copy_from_slice(data);
        let headers = self.parse_headers(&mut buf)?;

        let message_type = headers
            .message_type
            .ok_or(MalformedCause::MissingMessageType)?;
        if self.options.check_mandatory_headers {
            check_mandatory(message_type, &headers)?;
        }
        Ok(build_pdu(message_type, headers))
    }

    fn parse_headers(&self, buf: &mut Bytes) -> Parse<Headers> {
        let mut headers = Headers::default();
        while buf.has_remaining() {
            let field = wsp::peek(buf)?;
            if field < 0x80 {
                let name = wsp::get_token_text(buf)?;
                wsp::get_text_string(buf)?;
                trace!(header = %name, "skipping application header");
                continue;
            }
            buf.advance(1);
            headers.seen.push(field);

            match field {
                header::MESSAGE_TYPE => headers.message_type = Some(wsp::get_octet(buf)?),
                header::TRANSACTION_ID => {
                    headers.transaction_id = Some(wsp::get_text_string(buf)?)
                }
                header::MMS_VERSION => headers.mms_version = Some(wsp::get_short_integer(buf)?),
                header::MESSAGE_ID => headers.message_id = Some(wsp::get_text_string(buf)?),
                header::CONTENT_LOCATION => {
                    headers.content_location = Some(wsp::get_text_string(buf)?)
                }
                header::FROM => headers.from = Some(get_from(buf)?),
                header::TO => headers.to.push(wsp::get_encoded_string(buf)?),
                header::SUBJECT => headers.subject = Some(wsp::get_encoded_string(buf)?),
                header::DATE => headers.date = Some(wsp::get_long_integer(buf)?),
                header::EXPIRY => headers.expiry = Some(get_time_value(buf)?),
                header::MESSAGE_CLASS => headers.message_class = Some(get_message_class(buf)?),
                header::MESSAGE_SIZE => headers.message_size = Some(wsp::get_long_integer(buf)?),
                header::STATUS => headers.status = Some(wsp::get_octet(buf)?),
                header::READ_STATUS => headers.read_status = Some(wsp::get_octet(buf)?),
                header::DELIVERY_REPORT => {
                    headers.delivery_report = Some(get_yes_no(buf, "delivery-report")?)
                }
                header::CONTENT_TYPE => {
                    // Content-Type is always the last header; the body follows
                    let content_type = get_content_type(buf)?;
                    let body =
                        get_body(&content_type, buf, self.options.parse_content_disposition)?;
                    headers.content_type = Some(content_type);
                    headers.body = Some(body);
                    break;
                }
                other => {
                    trace!(header = other, "skipping header");
                    wsp::skip_value(buf)?;
                }
            }
        }
        Ok(headers)
    }
}

fn check_mandatory(message_type: u8, headers: &Headers) -> Parse<()> {
    let required =
        mandatory_headers(message_type).ok_or(MalformedCause::UnknownMessageType(message_type))?;
    match required.iter().find(|&&field| !headers.has(field)) {
        Some(&missing) => Err(MalformedCause::MissingHeader {
            message_type,
            header: missing,
        }),
        None => Ok(()),
    }
}

fn build_pdu(message_type: u8, headers: Headers) -> DecodedPdu {
    let mms_version = headers.mms_version.unwrap_or(MMS_VERSION_1_2);
    match message_type {
        message_type::NOTIFICATION_IND => DecodedPdu::Notification(NotificationInd {
            transaction_id: headers.transaction_id.unwrap_or_default(),
            mms_version,
            from: headers.from,
            subject: headers.subject,
            message_class: headers.message_class,
            message_size: headers.message_size,
            expiry: headers.expiry,
            content_location: headers.content_location,
            delivery_report: headers.delivery_report,
        }),
        message_type::DELIVERY_IND => DecodedPdu::DeliveryReport(DeliveryInd {
            message_id: headers.message_id.unwrap_or_default(),
            mms_version,
            to: headers.to,
            date: headers.date,
            status: headers.status.map(DeliveryStatus::from),
        }),
        message_type::READ_ORIG_IND => DecodedPdu::ReadReport(ReadOrigInd {
            message_id: headers.message_id.unwrap_or_default(),
            mms_version,
            from: headers.from,
            to: headers.to,
            date: headers.date,
            read_status: headers.read_status.map(ReadStatus::from),
        }),
        other => DecodedPdu::Unknown(UnknownPdu {
            message_type: other,
            transaction_id: headers.transaction_id,
            content_type: headers.content_type,
            body: headers.body,
        }),
    }
}

/// From-value: value-length, then address-present + address or insert-address
fn get_from(buf: &mut Bytes) -> Parse<EncodedString> {
    let mut inner = wsp::get_length_prefixed(buf)?;
    match wsp::get_octet(&mut inner)? {
        FROM_ADDRESS_PRESENT => wsp::get_encoded_string(&mut inner),
        FROM_INSERT_ADDRESS => Ok(EncodedString::insert_address()),
        token => Err(MalformedCause::InvalidToken {
            field: "from",
            token,
        }),
    }
}

fn get_time_value(buf: &mut Bytes) -> Parse<TimeValue> {
    let mut inner = wsp::get_length_prefixed(buf)?;
    match wsp::get_octet(&mut inner)? {
        TimeValue::ABSOLUTE_TOKEN => Ok(TimeValue::Absolute(wsp::get_long_integer(&mut inner)?)),
        TimeValue::RELATIVE_TOKEN => Ok(TimeValue::Relative(wsp::get_integer_value(&mut inner)?)),
        token => Err(MalformedCause::InvalidToken {
            field: "expiry",
            token,
        }),
    }
}

fn get_message_class(buf: &mut Bytes) -> Parse<MessageClass> {
    let first = wsp::peek(buf)?;
    if first >= 0x80 {
        buf.advance(1);
        return MessageClass::from_token(first).ok_or(MalformedCause::InvalidToken {
            field: "message-class",
            token: first,
        });
    }
    Ok(MessageClass::from_text(&wsp::get_token_text(buf)?))
}

fn get_yes_no(buf: &mut Bytes, field: &'static str) -> Parse<bool> {
    match wsp::get_octet(buf)? {
        VALUE_YES => Ok(true),
        VALUE_NO => Ok(false),
        token => Err(MalformedCause::InvalidToken { field, token }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strict() -> PduDecoder {
        PduDecoder::new(CodecOptions::default())
    }

    fn lenient() -> PduDecoder {
        PduDecoder::new(CodecOptions {
            check_mandatory_headers: false,
            ..CodecOptions::default()
        })
    }

    /// m-notification-ind with every mandatory header
    fn notification_bytes() -> Vec<u8> {
        let mut pdu = vec![0x8C, 0x82, 0x98];
        pdu.extend_from_slice(b"T1\0");
        pdu.extend_from_slice(&[0x8D, 0x92]);
        // From: address-present "+15550100"
        pdu.extend_from_slice(&[0x89, 0x0B, 0x80]);
        pdu.extend_from_slice(b"+15550100\0");
        pdu.extend_from_slice(&[0x8A, 0x80]);
        pdu.extend_from_slice(&[0x8E, 0x02, 0x04, 0x00]);
        // Expiry: relative, one day
        pdu.extend_from_slice(&[0x88, 0x05, 0x81, 0x03, 0x01, 0x51, 0x80]);
        pdu.push(0x83);
        pdu.extend_from_slice(b"http://mmsc/x?id=\0");
        pdu
    }

    #[test]
    fn test_decode_notification() {
        let pdu = strict().decode(&notification_bytes()).unwrap();
        let DecodedPdu::Notification(notification) = pdu else {
            panic!("expected notification");
        };
        assert_eq!(notification.transaction_id, b"T1");
        assert_eq!(notification.mms_version, 0x12);
        assert_eq!(notification.from, Some(EncodedString::new("+15550100")));
        assert_eq!(notification.message_class, Some(MessageClass::Personal));
        assert_eq!(notification.message_size, Some(1024));
        assert_eq!(notification.expiry, Some(TimeValue::Relative(86_400)));
        assert_eq!(
            notification.content_location.as_deref(),
            Some(&b"http://mmsc/x?id="[..])
        );
    }

    #[test]
    fn test_missing_mandatory_header() {
        // Drop Content-Location (the trailing header)
        let mut data = notification_bytes();
        let cut = data.iter().rposition(|&b| b == 0x83).unwrap();
        data.truncate(cut);

        assert_eq!(
            strict().decode(&data),
            Err(DecodeError::Malformed(MalformedCause::MissingHeader {
                message_type: 0x82,
                header: 0x83,
            }))
        );

        let pdu = lenient().decode(&data).unwrap();
        assert_eq!(pdu.content_location(), None);
    }

    #[test]
    fn test_missing_message_type() {
        assert_eq!(
            strict().decode(&[0x98, b'T', 0x00]),
            Err(DecodeError::Malformed(MalformedCause::MissingMessageType))
        );
        assert_eq!(
            strict().decode(&[]),
            Err(DecodeError::Malformed(MalformedCause::Empty))
        );
    }

    #[test]
    fn test_unknown_message_type() {
        let data = [0x8C, 0x89, 0x98, b'T', 0x00, 0x8D, 0x92];
        assert_eq!(
            strict().decode(&data),
            Err(DecodeError::Malformed(MalformedCause::UnknownMessageType(0x89)))
        );
        let DecodedPdu::Unknown(unknown) = lenient().decode(&data).unwrap() else {
            panic!("expected unknown PDU");
        };
        assert_eq!(unknown.message_type, 0x89);
        assert_eq!(unknown.transaction_id.as_deref(), Some(&b"T"[..]));
    }

    #[test]
    fn test_unknown_headers_are_skipped() {
        // Priority (short), Response-Text (text) and X-Custom application header
        let mut data = vec![0x8C, 0x83, 0x8F, 0x81, 0x93];
        data.extend_from_slice(b"ok\0");
        data.extend_from_slice(b"X-Custom\0value\0");
        data.extend_from_slice(&[0x98, b'T', 0x00, 0x8D, 0x92, 0x95, 0x81]);

        let pdu = strict().decode(&data).unwrap();
        assert_eq!(pdu.message_type(), message_type::NOTIFYRESP_IND);
        assert_eq!(pdu.transaction_id(), Some(&b"T"[..]));
    }

    #[test]
    fn test_decode_delivery_report() {
        let mut data = vec![0x8C, 0x86, 0x8D, 0x92, 0x8B];
        data.extend_from_slice(b"msg-1\0");
        data.push(0x97);
        data.extend_from_slice(b"+15550100/TYPE=PLMN\0");
        data.extend_from_slice(&[0x85, 0x04, 0x65, 0x53, 0xF1, 0x00, 0x95, 0x81]);

        let DecodedPdu::DeliveryReport(report) = strict().decode(&data).unwrap() else {
            panic!("expected delivery report");
        };
        assert_eq!(report.message_id, b"msg-1");
        assert_eq!(report.to.len(), 1);
        assert_eq!(report.date, Some(0x6553_F100));
        assert_eq!(report.status, Some(DeliveryStatus::Retrieved));
    }

    #[test]
    fn test_truncated_header_value() {
        let data = [0x8C, 0x82, 0x98, b'T', b'1'];
        assert_eq!(
            strict().decode(&data),
            Err(DecodeError::Malformed(MalformedCause::UnterminatedString))
        );
    }

    #[test]
    fn test_insert_address_from() {
        let data = [
            0x8C, 0x88, 0x8D, 0x92, 0x8B, b'm', 0x00, 0x97, b'a', 0x00, 0x89, 0x01, 0x81, 0x85,
            0x01, 0x00, 0x9B, 0x80,
        ];
        let DecodedPdu::ReadReport(report) = strict().decode(&data).unwrap() else {
            panic!("expected read report");
        };
        assert!(report.from.unwrap().is_insert_address());
        assert_eq!(report.read_status, Some(ReadStatus::Read));
        assert_eq!(report.date, Some(0));
    }
}
