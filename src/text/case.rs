//! Case folding and case-insensitive search.
//!
//! Upper-casing covers US-ASCII plus the two-byte German letters the DING
//! data uses (`ä ö ü ï ë`). `ß` has no folding here; the dictionary writes
//! it identically in both cases.

/// Upper-case a UTF-8 buffer in place.
pub fn to_upper(buf: &mut [u8]) {
    let mut i = 0;
    while i < buf.len() {
        match buf[i] {
            b'a'..=b'z' => {
                buf[i] -= 0x20;
                i += 1;
            }
            0xc3 if i + 1 < buf.len() => {
                match buf[i + 1] {
                    // ä ë ï ö ü -> Ä Ë Ï Ö Ü; everything else on this page,
                    // including ß, keeps its case
                    0xa4 | 0xab | 0xaf | 0xb6 | 0xbc => buf[i + 1] -= 0x20,
                    _ => {}
                }
                i += 2;
            }
            _ => i += 1,
        }
    }
}

/// Byte-level upper fold used by the case-insensitive search.
///
/// Folds ASCII letters and the continuation bytes of the recognized German
/// lower-case letters. Needles are assumed to be upper-cased already, so
/// folding the haystack byte is enough.
fn upper_byte(b: u8) -> u8 {
    match b {
        b'a'..=b'z' => b - 0x20,
        0xa4 | 0xab | 0xaf | 0xb6 | 0xbc => b - 0x20,
        _ => b,
    }
}

/// Does `needle_upper` occur in `haystack` at offset `at`?
pub fn imatches_at(haystack: &[u8], needle_upper: &[u8], at: usize) -> bool {
    if at + needle_upper.len() > haystack.len() {
        return false;
    }
    needle_upper
        .iter()
        .zip(&haystack[at..])
        .all(|(&n, &h)| n == upper_byte(h))
}

/// Offset of the first occurrence of `needle_upper` within
/// `haystack[from..to)`, or `None`.
pub fn ifind_first(
    haystack: &[u8],
    needle_upper: &[u8],
    from: usize,
    to: usize,
) -> Option<usize> {
    let to = to.min(haystack.len());
    if from > to {
        return None;
    }
    let last = to.checked_sub(needle_upper.len())?;
    (from..=last).find(|&at| imatches_at(haystack, needle_upper, at))
}
