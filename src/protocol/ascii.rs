//! ASCII sentences: `$<body>*<checksum>\r\n`.
//!
//! The checksum covers the bytes strictly between `$` and `*`. Two hex digits
//! carry an 8-bit XOR checksum and four carry a CRC-16.

use serde::Deserialize;

use super::{ByteSource, Scan};
use crate::checksum::{checksum8, crc16};

/// Sync byte of an ASCII sentence.
pub const SYNC: u8 = b'$';

/// Which sentence checksums are accepted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecksumMode {
    /// Only two-digit XOR checksums.
    Checksum8,
    /// Only four-digit CRC-16s.
    Crc16,
    /// Either form.
    #[default]
    Either,
}

/// Async output headers carrying measurements rather than command traffic.
const MEASUREMENT_HEADERS: &[&str] = &[
    "VNYPR", "VNQTN", "VNQMR", "VNMAG", "VNACC", "VNGYR", "VNMAR", "VNYMR", "VNYBA", "VNYIA",
    "VNIMU", "VNGPS", "VNGPE", "VNINS", "VNINE", "VNISL", "VNISE", "VNDTV", "VNG2S", "VNG2E",
    "VNHVE",
];

/// Whether `header` names an asynchronous measurement sentence.
///
/// # Examples
///
/// ```
/// use vnframe::protocol::ascii::is_measurement_header;
///
/// assert!(is_measurement_header("VNYPR"));
/// assert!(!is_measurement_header("VNRRG"));
/// assert!(!is_measurement_header("GPGGA"));
/// ```
#[must_use]
pub fn is_measurement_header(header: &str) -> bool { MEASUREMENT_HEADERS.contains(&header) }

/// A framed ASCII sentence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AsciiFrame {
    /// First comma-separated token, without `$`.
    pub header: String,
    /// Total length, `$` through `\n`.
    pub length: usize,
}

/// Look for a sentence whose `$` sits at `start`.
///
/// A sentence that does not terminate within `max_length` bytes, that meets
/// another `$` first, or whose checksum is malformed or wrong is invalid.
pub fn find_packet<S: ByteSource + ?Sized>(
    src: &S,
    start: usize,
    max_length: usize,
    mode: ChecksumMode,
) -> Scan<AsciiFrame> {
    let mut body = Vec::new();
    let mut index = start + 1;
    loop {
        if index - start >= max_length {
            return Scan::Invalid;
        }
        let Some(byte) = src.byte_at(index) else {
            return Scan::Incomplete(index - start + 1);
        };
        match byte {
            b'\n' => break,
            SYNC => return Scan::Invalid,
            _ => body.push(byte),
        }
        index += 1;
    }
    if body.pop() != Some(b'\r') {
        return Scan::Invalid;
    }
    let Some(star) = body.iter().rposition(|&byte| byte == b'*') else {
        return Scan::Invalid;
    };
    let (content, digits) = (&body[..star], &body[star + 1..]);
    if !checksum_matches(content, digits, mode) {
        return Scan::Invalid;
    }
    let header_end = content
        .iter()
        .position(|&byte| byte == b',')
        .unwrap_or(content.len());
    let header = String::from_utf8_lossy(&content[..header_end]).into_owned();
    Scan::Found(AsciiFrame {
        header,
        length: index - start + 1,
    })
}

fn checksum_matches(content: &[u8], digits: &[u8], mode: ChecksumMode) -> bool {
    let Some(value) = std::str::from_utf8(digits)
        .ok()
        .filter(|text| text.bytes().all(|byte| byte.is_ascii_hexdigit()))
        .and_then(|text| u16::from_str_radix(text, 16).ok())
    else {
        return false;
    };
    match (digits.len(), mode) {
        (2, ChecksumMode::Checksum8 | ChecksumMode::Either) => {
            u16::from(checksum8(content)) == value
        }
        (4, ChecksumMode::Crc16 | ChecksumMode::Either) => crc16(content) == value,
        _ => false,
    }
}

/// Frame `body` as a sentence: `$<body>*<CRC-16>\r\n`.
///
/// # Examples
///
/// ```
/// use vnframe::protocol::ascii::frame_with_crc;
///
/// let sentence = frame_with_crc("VNRRG,01");
/// assert!(sentence.starts_with("$VNRRG,01*"));
/// assert!(sentence.ends_with("\r\n"));
/// assert_eq!(sentence.len(), "$VNRRG,01*XXXX\r\n".len());
/// ```
#[must_use]
pub fn frame_with_crc(body: &str) -> String {
    format!("${body}*{:04X}\r\n", crc16(body.as_bytes()))
}

/// Frame `body` as a sentence: `$<body>*<XOR>\r\n`.
#[must_use]
pub fn frame_with_checksum8(body: &str) -> String {
    format!("${body}*{:02X}\r\n", checksum8(body.as_bytes()))
}

/// Comma-separated fields of a framed sentence after its header, without the
/// checksum.
#[must_use]
pub fn fields(sentence: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(sentence);
    let inner = text.trim_start_matches('$').trim_end();
    let content = inner.rsplit_once('*').map_or(inner, |(content, _)| content);
    content.split(',').skip(1).map(str::to_owned).collect()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{ChecksumMode, find_packet, frame_with_checksum8, frame_with_crc, fields};
    use crate::protocol::Scan;

    fn found_header(sentence: &str, mode: ChecksumMode) -> Option<String> {
        match find_packet(sentence.as_bytes(), 0, 256, mode) {
            Scan::Found(frame) => {
                assert_eq!(frame.length, sentence.len());
                Some(frame.header)
            }
            _ => None,
        }
    }

    #[rstest]
    #[case(ChecksumMode::Either, true, true)]
    #[case(ChecksumMode::Checksum8, true, false)]
    #[case(ChecksumMode::Crc16, false, true)]
    fn checksum_mode_selects_accepted_forms(
        #[case] mode: ChecksumMode,
        #[case] xor_ok: bool,
        #[case] crc_ok: bool,
    ) {
        let xor = frame_with_checksum8("VNYPR,+010.000,-001.000,+000.500");
        let crc = frame_with_crc("VNYPR,+010.000,-001.000,+000.500");
        assert_eq!(found_header(&xor, mode).is_some(), xor_ok);
        assert_eq!(found_header(&crc, mode).is_some(), crc_ok);
    }

    #[test]
    fn header_excludes_sync_and_fields() {
        let sentence = frame_with_checksum8("VNRRG,01,VN-300");
        assert_eq!(
            found_header(&sentence, ChecksumMode::Either).as_deref(),
            Some("VNRRG")
        );
    }

    #[rstest]
    #[case::bad_checksum("$VNYPR,1,2,3*00\r\n")]
    #[case::no_star("$VNYPR,1,2,3\r\n")]
    #[case::bare_newline("$VNYPR,1,2,3*5A\n")]
    #[case::non_hex("$VNYPR*ZZ\r\n")]
    #[case::second_sync("$VNY$VNYPR*00\r\n")]
    fn malformed_sentences_are_invalid(#[case] sentence: &str) {
        assert_eq!(
            find_packet(sentence.as_bytes(), 0, 256, ChecksumMode::Either),
            Scan::Invalid
        );
    }

    #[test]
    fn unterminated_sentence_is_incomplete_until_max_length() {
        let partial = b"$VNYPR,+010";
        assert_eq!(
            find_packet(&partial[..], 0, 256, ChecksumMode::Either),
            Scan::Incomplete(partial.len() + 1)
        );
        assert_eq!(
            find_packet(&partial[..], 0, 8, ChecksumMode::Either),
            Scan::Invalid
        );
    }

    #[test]
    fn fields_drop_header_and_checksum() {
        let sentence = frame_with_crc("VNYPR,1.0,2.0,3.0");
        assert_eq!(fields(sentence.as_bytes()), ["1.0", "2.0", "3.0"]);
    }
}
