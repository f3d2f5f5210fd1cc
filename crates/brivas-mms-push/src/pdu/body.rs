//! Content-Type values and multipart bodies

use super::wsp::{self, Parse};
use super::{well_known_media, ContentType};
use crate::errors::MalformedCause;
use bytes::{Buf, Bytes};
use serde::{Deserialize, Serialize};
use tracing::trace;

// Well-known parameter codes (WAP-230 Table 38), short-integer form
const PARAM_CHARSET: u8 = 0x01;
const PARAM_NAME: u8 = 0x05;
const PARAM_FILENAME: u8 = 0x06;
const PARAM_TYPE: u8 = 0x09;
const PARAM_START: u8 = 0x0A;
const PARAM_NAME_V14: u8 = 0x17;
const PARAM_FILENAME_V14: u8 = 0x18;
const PARAM_START_V14: u8 = 0x19;

/// Body of a PDU carrying Content-Type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PduBody {
    Multipart(MultipartBody),
    /// Any non-multipart payload, kept opaque
    Single(Bytes),
}

impl PduBody {
    pub fn parts(&self) -> &[Part] {
        match self {
            Self::Multipart(body) => &body.parts,
            Self::Single(_) => &[],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartBody {
    pub parts: Vec<Part>,
}

/// One multipart entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub content_type: ContentType,
    pub content_location: Option<Vec<u8>>,
    pub content_id: Option<Vec<u8>>,
    /// Only populated when Content-Disposition parsing is enabled
    pub disposition: Option<ContentDisposition>,
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispositionKind {
    FormData,
    Attachment,
    Inline,
    Other(String),
}

impl DispositionKind {
    fn from_token(token: u8) -> Option<Self> {
        match token {
            0x80 => Some(Self::FormData),
            0x81 => Some(Self::Attachment),
            0x82 => Some(Self::Inline),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentDisposition {
    pub kind: DispositionKind,
    pub filename: Option<Vec<u8>>,
}

/// Content-Type header value, constrained or general form
pub(crate) fn get_content_type(buf: &mut Bytes) -> Parse<ContentType> {
    let first = wsp::peek(buf)?;
    if first >= 0x80 {
        return Ok(ContentType::new(get_media(buf)?));
    }
    if first >= wsp::TEXT_MIN {
        return Ok(ContentType::new(wsp::get_token_text(buf)?));
    }

    let mut inner = wsp::get_length_prefixed(buf)?;
    let mut content_type = ContentType::new(get_media(&mut inner)?);
    while inner.has_remaining() {
        get_parameter(&mut inner, &mut content_type)?;
    }
    Ok(content_type)
}

/// Well-known media code or extension media text
fn get_media(buf: &mut Bytes) -> Parse<String> {
    let first = wsp::peek(buf)?;
    if first >= wsp::TEXT_MIN && first < 0x80 {
        return wsp::get_token_text(buf);
    }
    let code = wsp::get_integer_value(buf)?;
    well_known_media(code)
        .map(str::to_string)
        .ok_or(MalformedCause::InvalidToken {
            field: "content-type",
            token: u8::try_from(code).unwrap_or(u8::MAX),
        })
}

fn get_parameter(buf: &mut Bytes, content_type: &mut ContentType) -> Parse<()> {
    let first = wsp::peek(buf)?;
    if first < 0x80 {
        // Untyped parameter: token-text name then a text or integer value
        let name = wsp::get_token_text(buf)?;
        trace!(parameter = %name, "skipping untyped content-type parameter");
        return wsp::skip_value(buf);
    }

    match wsp::get_short_integer(buf)? {
        PARAM_CHARSET => {
            if wsp::peek(buf)? >= wsp::TEXT_MIN && wsp::peek(buf)? < 0x80 {
                // "*" (any charset)
                wsp::get_text_string(buf)?;
            } else {
                let charset = wsp::get_integer_value(buf)?;
                content_type.charset = u32::try_from(charset).ok().filter(|&c| c != 0);
            }
        }
        PARAM_TYPE => content_type.type_param = Some(get_media(buf)?),
        PARAM_START | PARAM_START_V14 => content_type.start = Some(wsp::get_text_string(buf)?),
        PARAM_NAME | PARAM_NAME_V14 => content_type.name = Some(wsp::get_text_string(buf)?),
        PARAM_FILENAME | PARAM_FILENAME_V14 => {
            content_type.filename = Some(wsp::get_text_string(buf)?)
        }
        _ => wsp::skip_value(buf)?,
    }
    Ok(())
}

/// Parse whatever follows the headers of a body-bearing PDU
pub(crate) fn get_body(
    content_type: &ContentType,
    buf: &mut Bytes,
    parse_disposition: bool,
) -> Parse<PduBody> {
    if !content_type.is_multipart() {
        return Ok(PduBody::Single(buf.split_to(buf.len())));
    }

    let count = wsp::get_uintvar(buf)?;
    let mut parts = Vec::new();
    for index in 0..count {
        let part = get_part(buf, parse_disposition).map_err(|cause| {
            MalformedCause::Body(format!("part {index}: {cause}"))
        })?;
        parts.push(part);
    }
    Ok(PduBody::Multipart(MultipartBody { parts }))
}

fn get_part(buf: &mut Bytes, parse_disposition: bool) -> Parse<Part> {
    let headers_len = wsp::get_uintvar(buf)? as usize;
    let data_len = wsp::get_uintvar(buf)? as usize;
    let mut headers = wsp::take(buf, headers_len)?;

    let mut part = Part {
        content_type: get_content_type(&mut headers)?,
        content_location: None,
        content_id: None,
        disposition: None,
        data: Bytes::new(),
    };

    while headers.has_remaining() {
        let field = wsp::peek(&headers)?;
        if field < 0x80 {
            // Application header: token-text name, text-string value
            wsp::get_token_text(&mut headers)?;
            wsp::get_text_string(&mut headers)?;
            continue;
        }
        headers.advance(1);
        match field {
            super::part_header::CONTENT_LOCATION => {
                part.content_location = Some(wsp::get_text_string(&mut headers)?);
            }
            super::part_header::CONTENT_ID => {
                part.content_id = Some(wsp::get_quoted_string(&mut headers)?);
            }
            super::part_header::CONTENT_DISPOSITION
            | super::part_header::CONTENT_DISPOSITION_V14
                if parse_disposition =>
            {
                part.disposition = Some(get_disposition(&mut headers)?);
            }
            _ => wsp::skip_value(&mut headers)?,
        }
    }

    part.data = wsp::take(buf, data_len)?;
    Ok(part)
}

fn get_disposition(buf: &mut Bytes) -> Parse<ContentDisposition> {
    let mut inner = wsp::get_length_prefixed(buf)?;
    let first = wsp::peek(&inner)?;
    let kind = if first >= 0x80 {
        inner.advance(1);
        DispositionKind::from_token(first).ok_or(MalformedCause::InvalidToken {
            field: "content-disposition",
            token: first,
        })?
    } else {
        DispositionKind::Other(wsp::get_token_text(&mut inner)?)
    };

    let mut filename = None;
    while inner.has_remaining() {
        if wsp::peek(&inner)? < 0x80 {
            wsp::get_token_text(&mut inner)?;
            wsp::skip_value(&mut inner)?;
            continue;
        }
        match wsp::get_short_integer(&mut inner)? {
            PARAM_FILENAME | PARAM_FILENAME_V14 => {
                filename = Some(wsp::get_text_string(&mut inner)?)
            }
            _ => wsp::skip_value(&mut inner)?,
        }
    }
    Ok(ContentDisposition { kind, filename })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(data: &[u8]) -> Bytes {
        Bytes::copy_from_slice(data)
    }

    #[test]
    fn test_constrained_content_type() {
        let mut buf = bytes(&[0x83]);
        assert_eq!(get_content_type(&mut buf).unwrap().media_type, "text/plain");

        let mut buf = bytes(b"application/smil\0");
        assert_eq!(
            get_content_type(&mut buf).unwrap().media_type,
            "application/smil"
        );
    }

    #[test]
    fn test_general_content_type_with_parameters() {
        // multipart.related; type=application/smil; start=<s>
        let mut data = vec![0x00, 0xB3, 0x89];
        data.extend_from_slice(b"application/smil\0");
        data.push(0x8A);
        data.extend_from_slice(b"<s>\0");
        data[0] = (data.len() - 1) as u8;

        let content_type = get_content_type(&mut Bytes::from(data)).unwrap();
        assert_eq!(content_type.media_type, "application/vnd.wap.multipart.related");
        assert_eq!(content_type.type_param.as_deref(), Some("application/smil"));
        assert_eq!(content_type.start.as_deref(), Some(&b"<s>"[..]));
        assert!(content_type.is_multipart());
    }

    fn part_with_disposition() -> Vec<u8> {
        // headers: text/plain, Content-ID "<p1>", Content-Disposition attachment; filename=a.txt
        let mut headers = vec![0x83, 0xC0];
        headers.extend_from_slice(b"\"<p1>\0");
        headers.extend_from_slice(&[0xAE, 0x08, 0x81, 0x86]);
        headers.extend_from_slice(b"a.txt\0");
        let data = b"hi";

        let mut body = vec![0x01, headers.len() as u8, data.len() as u8];
        body.extend_from_slice(&headers);
        body.extend_from_slice(data);
        body
    }

    #[test]
    fn test_multipart_with_disposition_enabled() {
        let content_type = ContentType::new("application/vnd.wap.multipart.mixed");
        let body = get_body(&content_type, &mut Bytes::from(part_with_disposition()), true)
            .unwrap();

        let parts = body.parts();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].content_type.media_type, "text/plain");
        assert_eq!(parts[0].content_id.as_deref(), Some(&b"<p1>"[..]));
        assert_eq!(
            parts[0].disposition,
            Some(ContentDisposition {
                kind: DispositionKind::Attachment,
                filename: Some(b"a.txt".to_vec()),
            })
        );
        assert_eq!(&parts[0].data[..], b"hi");
    }

    #[test]
    fn test_multipart_with_disposition_disabled() {
        let content_type = ContentType::new("application/vnd.wap.multipart.mixed");
        let body = get_body(&content_type, &mut Bytes::from(part_with_disposition()), false)
            .unwrap();

        let parts = body.parts();
        assert_eq!(parts[0].disposition, None);
        assert_eq!(parts[0].content_id.as_deref(), Some(&b"<p1>"[..]));
        assert_eq!(&parts[0].data[..], b"hi");
    }

    #[test]
    fn test_truncated_part_data() {
        let content_type = ContentType::new("application/vnd.wap.multipart.mixed");
        let mut buf = bytes(&[0x01, 0x01, 0x05, 0x83, b'h']);
        assert!(matches!(
            get_body(&content_type, &mut buf, true),
            Err(MalformedCause::Body(_))
        ));
    }
}
