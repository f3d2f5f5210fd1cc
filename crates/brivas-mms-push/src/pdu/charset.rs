//! Charset handling for encoded-string-values (IANA MIBenum numbers)

use encoding_rs::{
    Encoding, BIG5, EUC_JP, EUC_KR, GB18030, GBK, ISO_2022_JP, ISO_8859_2, ISO_8859_3,
    ISO_8859_4, ISO_8859_5, ISO_8859_6, ISO_8859_7, ISO_8859_8, SHIFT_JIS, UTF_16BE, UTF_8,
    WINDOWS_1252, WINDOWS_1254,
};

/// IANA MIBenum values found in MMS headers
pub mod mib {
    pub const ANY: u32 = 0;
    pub const US_ASCII: u32 = 3;
    pub const ISO_8859_1: u32 = 4;
    pub const ISO_8859_2: u32 = 5;
    pub const ISO_8859_3: u32 = 6;
    pub const ISO_8859_4: u32 = 7;
    pub const ISO_8859_5: u32 = 8;
    pub const ISO_8859_6: u32 = 9;
    pub const ISO_8859_7: u32 = 10;
    pub const ISO_8859_8: u32 = 11;
    pub const ISO_8859_9: u32 = 12;
    pub const SHIFT_JIS: u32 = 17;
    pub const EUC_JP: u32 = 18;
    pub const EUC_KR: u32 = 38;
    pub const ISO_2022_JP: u32 = 39;
    pub const UTF_8: u32 = 106;
    pub const GBK: u32 = 113;
    pub const GB18030: u32 = 114;
    pub const UCS_2: u32 = 1000;
    pub const UTF_16: u32 = 1015;
    pub const GB2312: u32 = 2025;
    pub const BIG5: u32 = 2026;
}

/// Encoding for a MIBenum, `None` when unsupported
pub fn encoding_for_mib(charset: u32) -> Option<&'static Encoding> {
    let encoding = match charset {
        // WHATWG decodes the Latin-1 labels as windows-1252
        mib::US_ASCII | mib::ISO_8859_1 => WINDOWS_1252,
        mib::ISO_8859_2 => ISO_8859_2,
        mib::ISO_8859_3 => ISO_8859_3,
        mib::ISO_8859_4 => ISO_8859_4,
        mib::ISO_8859_5 => ISO_8859_5,
        mib::ISO_8859_6 => ISO_8859_6,
        mib::ISO_8859_7 => ISO_8859_7,
        mib::ISO_8859_8 => ISO_8859_8,
        mib::ISO_8859_9 => WINDOWS_1254,
        mib::SHIFT_JIS => SHIFT_JIS,
        mib::EUC_JP => EUC_JP,
        mib::EUC_KR => EUC_KR,
        mib::ISO_2022_JP => ISO_2022_JP,
        mib::UTF_8 => UTF_8,
        mib::GBK | mib::GB2312 => GBK,
        mib::GB18030 => GB18030,
        mib::UCS_2 | mib::UTF_16 => UTF_16BE,
        mib::BIG5 => BIG5,
        _ => return None,
    };
    Some(encoding)
}

/// Decode header text in the given charset
///
/// Absent or unknown charsets decode as lossy UTF-8.
pub fn decode_text(charset: Option<u32>, bytes: &[u8]) -> String {
    let encoding = charset.and_then(encoding_for_mib).unwrap_or(UTF_8);
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}
