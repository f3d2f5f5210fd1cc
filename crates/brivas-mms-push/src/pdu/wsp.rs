//! WSP value encoding primitives (WAP-230 section 8.4.2)

use super::messages::EncodedString;
use crate::errors::MalformedCause;
use bytes::{Buf, BufMut, Bytes, BytesMut};

pub(crate) type Parse<T> = std::result::Result<T, MalformedCause>;

/// Quote octet preceding text that starts with a byte >= 0x80
pub const QUOTE: u8 = 0x7F;
/// Quote octet opening a quoted-string
pub const QUOTED_STRING_START: u8 = 0x22;
/// Value-length escape followed by a uintvar
pub const LENGTH_QUOTE: u8 = 0x1F;
pub const SHORT_LENGTH_MAX: u8 = 0x1E;
pub const TEXT_MIN: u8 = 0x20;
pub const END_OF_STRING: u8 = 0x00;

const LONG_INTEGER_MAX_OCTETS: usize = 8;
const UINTVAR_MAX_OCTETS: usize = 5;

pub fn peek(buf: &Bytes) -> Parse<u8> {
    buf.first().copied().ok_or(MalformedCause::Truncated)
}

pub fn get_octet(buf: &mut Bytes) -> Parse<u8> {
    if !buf.has_remaining() {
        return Err(MalformedCause::Truncated);
    }
    Ok(buf.get_u8())
}

/// Split off exactly `len` octets
pub fn take(buf: &mut Bytes, len: usize) -> Parse<Bytes> {
    if buf.remaining() < len {
        return Err(MalformedCause::Truncated);
    }
    Ok(buf.split_to(len))
}

pub fn get_uintvar(buf: &mut Bytes) -> Parse<u32> {
    let mut value: u64 = 0;
    for _ in 0..UINTVAR_MAX_OCTETS {
        let octet = get_octet(buf)?;
        value = (value << 7) | u64::from(octet & 0x7F);
        if octet & 0x80 == 0 {
            return u32::try_from(value).map_err(|_| MalformedCause::UintvarOverflow);
        }
    }
    Err(MalformedCause::UintvarOverflow)
}

/// Value-length: short length (0-30) or length-quote + uintvar
pub fn get_value_length(buf: &mut Bytes) -> Parse<usize> {
    let first = get_octet(buf)?;
    match first {
        0..=SHORT_LENGTH_MAX => Ok(first as usize),
        LENGTH_QUOTE => Ok(get_uintvar(buf)? as usize),
        other => Err(MalformedCause::InvalidLength(other)),
    }
}

/// Value-length followed by exactly that many octets
pub fn get_length_prefixed(buf: &mut Bytes) -> Parse<Bytes> {
    let len = get_value_length(buf)?;
    take(buf, len)
}

pub fn get_short_integer(buf: &mut Bytes) -> Parse<u8> {
    let octet = get_octet(buf)?;
    if octet & 0x80 == 0 {
        return Err(MalformedCause::NotShortInteger(octet));
    }
    Ok(octet & 0x7F)
}

pub fn get_long_integer(buf: &mut Bytes) -> Parse<u64> {
    let len = get_octet(buf)?;
    if len > SHORT_LENGTH_MAX {
        return Err(MalformedCause::InvalidLength(len));
    }
    let len = len as usize;
    if len > LONG_INTEGER_MAX_OCTETS {
        return Err(MalformedCause::IntegerTooLong(len));
    }
    let octets = take(buf, len)?;
    Ok(octets.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
}

/// Integer-value: short-integer or long-integer
pub fn get_integer_value(buf: &mut Bytes) -> Parse<u64> {
    if peek(buf)? & 0x80 != 0 {
        get_short_integer(buf).map(u64::from)
    } else {
        get_long_integer(buf)
    }
}

fn get_until_nul(buf: &mut Bytes) -> Parse<Bytes> {
    let end = buf
        .iter()
        .position(|&b| b == END_OF_STRING)
        .ok_or(MalformedCause::UnterminatedString)?;
    let text = buf.split_to(end);
    buf.advance(1);
    Ok(text)
}

/// Text-string, dropping the leading quote octet if present
pub fn get_text_string(buf: &mut Bytes) -> Parse<Vec<u8>> {
    let mut text = get_until_nul(buf)?;
    if text.first() == Some(&QUOTE) {
        text.advance(1);
    }
    Ok(text.to_vec())
}

/// Quoted-string, dropping the opening `"` if present
pub fn get_quoted_string(buf: &mut Bytes) -> Parse<Vec<u8>> {
    let mut text = get_until_nul(buf)?;
    if text.first() == Some(&QUOTED_STRING_START) {
        text.advance(1);
    }
    Ok(text.to_vec())
}

pub fn get_token_text(buf: &mut Bytes) -> Parse<String> {
    let text = get_until_nul(buf)?;
    Ok(String::from_utf8_lossy(&text).into_owned())
}

/// Encoded-string-value: text-string, or value-length + charset + text-string
pub fn get_encoded_string(buf: &mut Bytes) -> Parse<EncodedString> {
    let first = peek(buf)?;
    if first == END_OF_STRING {
        buf.advance(1);
        return Ok(EncodedString::default());
    }
    if first < TEXT_MIN {
        let mut inner = get_length_prefixed(buf)?;
        let charset = get_integer_value(&mut inner)?;
        let text = get_text_string(&mut inner)?;
        let charset = u32::try_from(charset).ok().filter(|&c| c != 0);
        return Ok(EncodedString { charset, text });
    }
    Ok(EncodedString::new(get_text_string(buf)?))
}

/// Skip any header value using the WSP value classes
pub fn skip_value(buf: &mut Bytes) -> Parse<()> {
    let first = peek(buf)?;
    match first {
        0..=LENGTH_QUOTE => {
            get_length_prefixed(buf)?;
        }
        TEXT_MIN..=QUOTE => {
            get_until_nul(buf)?;
        }
        _ => buf.advance(1),
    }
    Ok(())
}

// ==================== Encoding ====================

pub fn put_text_string(buf: &mut BytesMut, text: &[u8]) {
    if text.first().map_or(false, |&b| b >= 0x80) {
        buf.put_u8(QUOTE);
    }
    buf.put_slice(text);
    buf.put_u8(END_OF_STRING);
}

pub fn put_uintvar(buf: &mut BytesMut, value: u32) {
    let mut groups = [0u8; UINTVAR_MAX_OCTETS];
    let mut count = 0;
    let mut v = value;
    loop {
        groups[count] = (v & 0x7F) as u8;
        count += 1;
        v >>= 7;
        if v == 0 {
            break;
        }
    }
    for i in (0..count).rev() {
        let continuation = if i > 0 { 0x80 } else { 0x00 };
        buf.put_u8(groups[i] | continuation);
    }
}

pub fn put_value_length(buf: &mut BytesMut, len: usize) {
    if len <= SHORT_LENGTH_MAX as usize {
        buf.put_u8(len as u8);
    } else {
        buf.put_u8(LENGTH_QUOTE);
        put_uintvar(buf, len as u32);
    }
}

pub fn put_short_integer(buf: &mut BytesMut, value: u8) {
    buf.put_u8(value | 0x80);
}

pub fn put_long_integer(buf: &mut BytesMut, value: u64) {
    let octets = value.to_be_bytes();
    let skip = octets
        .iter()
        .take(LONG_INTEGER_MAX_OCTETS - 1)
        .take_while(|&&b| b == 0)
        .count();
    let significant = &octets[skip..];
    buf.put_u8(significant.len() as u8);
    buf.put_slice(significant);
}

pub fn put_integer_value(buf: &mut BytesMut, value: u64) {
    if value < 0x80 {
        put_short_integer(buf, value as u8);
    } else {
        put_long_integer(buf, value);
    }
}

pub fn put_encoded_string(buf: &mut BytesMut, value: &EncodedString) {
    match value.charset {
        None => put_text_string(buf, &value.text),
        Some(charset) => {
            let mut inner = BytesMut::new();
            put_integer_value(&mut inner, u64::from(charset));
            put_text_string(&mut inner, &value.text);
            put_value_length(buf, inner.len());
            buf.put_slice(&inner);
        }
    }
}
