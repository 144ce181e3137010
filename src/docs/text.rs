//! Byte-to-text decoding for docs files

/// Decode a buffer as UTF-8 (with or without BOM) or BOM-marked UTF-16.
/// Returns `None` when none of those apply.
pub fn decode_text(buffer: &[u8]) -> Option<String> {
    if let Some(rest) = buffer.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return std::str::from_utf8(rest).ok().map(str::to_string);
    }
    if let Ok(content) = std::str::from_utf8(buffer) {
        return Some(content.to_string());
    }
    if let Some(rest) = buffer.strip_prefix(&[0xFF, 0xFE]) {
        return decode_utf16(rest, u16::from_le_bytes);
    }
    if let Some(rest) = buffer.strip_prefix(&[0xFE, 0xFF]) {
        return decode_utf16(rest, u16::from_be_bytes);
    }
    None
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Option<String> {
    let units: Vec<u16> = bytes.chunks_exact(2).map(|c| unit([c[0], c[1]])).collect();
    String::from_utf16(&units).ok()
}

/// Like [`decode_text`] but never fails; invalid sequences become U+FFFD.
pub fn decode_lossy(buffer: &[u8]) -> String {
    decode_text(buffer).unwrap_or_else(|| String::from_utf8_lossy(buffer).into_owned())
}

/// Heuristic used by search to skip binaries: a NUL byte in the first 8 KiB
/// (outside a UTF-16 BOM file) marks the buffer as non-text.
pub fn is_probably_text(buffer: &[u8]) -> bool {
    if buffer.starts_with(&[0xFF, 0xFE]) || buffer.starts_with(&[0xFE, 0xFF]) {
        return true;
    }
    let head = &buffer[..buffer.len().min(8192)];
    !head.contains(&0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_utf8_bom() {
        assert_eq!(decode_text(b"\xEF\xBB\xBFhello").as_deref(), Some("hello"));
    }

    #[test]
    fn decodes_utf16_both_endians() {
        assert_eq!(decode_text(&[0xFF, 0xFE, b'h', 0, b'i', 0]).as_deref(), Some("hi"));
        assert_eq!(decode_text(&[0xFE, 0xFF, 0, b'h', 0, b'i']).as_deref(), Some("hi"));
    }

    #[test]
    fn binary_is_detected() {
        assert!(!is_probably_text(&[0x89, b'P', b'N', b'G', 0, 0, 1]));
        assert!(is_probably_text(b"# Title\n"));
        assert!(decode_text(&[0xC3, 0x28]).is_none());
        assert_eq!(decode_lossy(&[b'a', 0xC3, 0x28]), "a\u{FFFD}(");
    }
}
