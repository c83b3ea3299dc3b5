//! UTF-8 sequence classification, cropping and US-ASCII transliteration.

use crate::error::DingdexError;
use crate::Result;

/// Length in bytes of the UTF-8 sequence starting at `at`.
///
/// Classifies the lead byte per RFC 3629. Fails with `BadSequence` when the
/// byte at `at` is a continuation byte or an illegal lead byte, and with
/// `IncompleteSequence` when the buffer ends before the sequence does.
pub fn sequence_len(bytes: &[u8], at: usize) -> Result<usize> {
    let lead = *bytes
        .get(at)
        .ok_or(DingdexError::IncompleteSequence(at))?;
    let len = match lead {
        0x00..=0x7f => 1,
        // continuation bytes and the overlong/out-of-range lead bytes
        0x80..=0xc1 | 0xf5..=0xff => return Err(DingdexError::BadSequence(at)),
        0xc2..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf4 => 4,
    };
    if at + len > bytes.len() {
        return Err(DingdexError::IncompleteSequence(at));
    }
    Ok(len)
}

/// Number of UTF-8 sequences (characters) in the buffer.
pub fn sequence_count(bytes: &[u8]) -> Result<usize> {
    let mut at = 0;
    let mut count = 0;
    while at < bytes.len() {
        at += sequence_len(bytes, at)?;
        count += 1;
    }
    Ok(count)
}

/// Truncate `buf` in place to at most `unicode_len` characters.
///
/// Returns the number of characters left in the buffer, which is smaller
/// than `unicode_len` when the buffer was short to begin with.
pub fn crop_to_unicode_len(buf: &mut Vec<u8>, unicode_len: usize) -> Result<usize> {
    let mut at = 0;
    let mut chars = 0;
    while at < buf.len() && chars < unicode_len {
        at += sequence_len(buf, at)?;
        chars += 1;
    }
    buf.truncate(at);
    Ok(chars)
}

/// True when every byte has its high bit clear.
pub fn is_usascii_clean(bytes: &[u8]) -> bool {
    bytes.iter().all(|b| b & 0x80 == 0)
}

/// Character count of a buffer already known to be valid UTF-8.
///
/// Counts non-continuation bytes, so it never fails; on invalid input it
/// merely returns a meaningless number. Use `sequence_count` when the input
/// has not been validated.
pub(crate) fn char_count(bytes: &[u8]) -> usize {
    bytes.iter().filter(|b| (**b & 0xc0) != 0x80).count()
}

/// US-ASCII transliteration of the sequence at the start of `bytes`.
///
/// The umlaut letters map to the digraphs the dictionary community writes
/// them as; a handful of other accented Latin letters drop their accent.
/// Returns `None` for sequences without a conventional ASCII form.
pub fn usascii_equivalent(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xc3, 0xa4, ..] => Some("ae"), // ä
        [0xc3, 0x84, ..] => Some("AE"), // Ä
        [0xc3, 0xb6, ..] => Some("oe"), // ö
        [0xc3, 0x96, ..] => Some("OE"), // Ö
        [0xc3, 0xbc, ..] => Some("ue"), // ü
        [0xc3, 0x9c, ..] => Some("UE"), // Ü
        [0xc3, 0x9f, ..] => Some("ss"), // ß
        [0xc3, 0xab, ..] => Some("ee"), // ë
        [0xc3, 0x8b, ..] => Some("EE"), // Ë
        [0xc3, 0xaf, ..] => Some("ie"), // ï
        [0xc3, 0x8f, ..] => Some("IE"), // Ï
        [0xc3, 0xa0..=0xa2, ..] => Some("a"), // à á â
        [0xc3, 0x80..=0x82, ..] => Some("A"),
        [0xc3, 0xa8..=0xaa, ..] => Some("e"), // è é ê
        [0xc3, 0x88..=0x8a, ..] => Some("E"),
        [0xc3, 0xa7, ..] => Some("c"), // ç
        [0xc3, 0x87, ..] => Some("C"),
        [0xc3, 0xb1, ..] => Some("n"), // ñ
        [0xc3, 0x91, ..] => Some("N"),
        _ => None,
    }
}
