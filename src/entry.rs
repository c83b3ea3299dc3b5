//! Dictionary entries and relevance scoring.
//!
//! An entry is one DING line split into its German and English sides.
//! Sub-senses separated by `|` stay opaque here; splitting them is the
//! renderer's business.

use std::borrow::Cow;

use crate::keyword::{Keyword, KeywordSet};
use crate::text::{case, utf8};

/// Added to the positional penalty when a keyword is only found on the
/// English side, so German matches rank first.
pub const ENGLISH_SIDE_PENALTY: u32 = 100;

/// Added for every keyword found on neither side.
pub const MISS_PENALTY: u32 = 10_000;

/// Distance of an entry that failed to consume every keyword. Greater than
/// any score a matching entry can accumulate.
pub const NO_MATCH: u32 = u32::MAX;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    german: Vec<u8>,
    english: Vec<u8>,
}

impl Entry {
    pub fn new(german: &[u8], english: &[u8]) -> Self {
        Self {
            german: trim(german).to_vec(),
            english: trim(english).to_vec(),
        }
    }

    /// Split a data line on the first `::`. Comment and empty lines, and
    /// lines without the separator, yield `None`.
    pub fn from_line(line: &[u8]) -> Option<Self> {
        let line = trim(line);
        if line.is_empty() || line[0] == b'#' {
            return None;
        }
        let sep = line.windows(2).position(|w| w == b"::")?;
        Some(Self::new(&line[..sep], &line[sep + 2..]))
    }

    pub fn german(&self) -> &[u8] {
        &self.german
    }

    pub fn english(&self) -> &[u8] {
        &self.english
    }

    pub fn german_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.german)
    }

    pub fn english_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.english)
    }

    /// Relevance distance of this entry against a keyword set; smaller is
    /// better.
    ///
    /// Keywords arrive longest-first and each one is looked up on the
    /// German side first, then the English side. A found keyword marks its
    /// bit in `use_map` and contributes its positional penalty (plus the
    /// English side penalty where applicable); a missing keyword
    /// contributes [`MISS_PENALTY`]. Entries that leave any keyword unused
    /// score [`NO_MATCH`].
    pub fn distance_from_keywords(
        &self,
        keywords: &KeywordSet,
        use_map: &mut Vec<bool>,
    ) -> u32 {
        use_map.clear();
        use_map.resize(keywords.len(), false);

        let mut distance: u32 = 0;
        for (i, keyword) in keywords.iter().enumerate() {
            if let Some(penalty) = side_penalty(&self.german, keyword) {
                use_map[i] = true;
                distance = distance.saturating_add(penalty);
            } else if let Some(penalty) = side_penalty(&self.english, keyword) {
                use_map[i] = true;
                distance = distance.saturating_add(penalty + ENGLISH_SIDE_PENALTY);
            } else {
                distance = distance.saturating_add(MISS_PENALTY);
            }
        }

        if use_map.iter().any(|used| !used) {
            return NO_MATCH;
        }
        distance
    }
}

/// Positional penalty of `keyword` within one side: the character offset of
/// the match plus the side's excess character length over the keyword. The
/// excess term lets an exact-length side beat a longer one that matches at
/// the same offset.
fn side_penalty(side: &[u8], keyword: &Keyword) -> Option<u32> {
    let at = case::ifind_first(side, keyword.as_bytes(), 0, side.len())?;
    let offset_chars = utf8::char_count(&side[..at]);
    let excess_chars = utf8::char_count(side).saturating_sub(keyword.chars());
    Some((offset_chars + excess_chars) as u32)
}

fn trim(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |p| p + 1);
    &bytes[start..end]
}
