//! Query keyword sets.
//!
//! A keyword set is the normalized form of a user query: upper-cased,
//! stripped of common words and of tokens that duplicate another keyword by
//! byte prefix, ordered longest-first. The longest-first ordering is
//! load-bearing for scoring, which assigns positions to the most specific
//! keywords before the short ones.

use crate::text::{case, common, utf8, words};
use crate::Result;

/// Umlaut-recovery substitutions, applied in this order. Each pattern is
/// two ASCII bytes and each replacement is a two-byte UTF-8 sequence, so
/// the rewrite happens in place.
const UMLAUT_SUBSTITUTIONS: [(&[u8; 2], [u8; 2]); 6] = [
    (b"EE", [0xc3, 0x8b]), // Ë
    (b"UE", [0xc3, 0x9c]), // Ü
    (b"OE", [0xc3, 0x96]), // Ö
    (b"AE", [0xc3, 0x84]), // Ä
    (b"IE", [0xc3, 0x8f]), // Ï
    (b"SS", [0xc3, 0x9f]), // ß
];

/// One normalized keyword with its cached character count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Keyword {
    bytes: Vec<u8>,
    chars: usize,
}

impl Keyword {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn chars(&self) -> usize {
        self.chars
    }
}

#[derive(Clone, Debug)]
pub struct KeywordSet {
    keywords: Vec<Keyword>,
    min_token_chars: usize,
}

impl KeywordSet {
    /// Create an empty set. Tokens shorter than `min_token_chars`
    /// characters are never admitted.
    pub fn new(min_token_chars: usize) -> Self {
        Self {
            keywords: Vec::new(),
            min_token_chars,
        }
    }

    /// Build a set directly from a query string.
    pub fn from_query(query: &str, min_token_chars: usize) -> Self {
        let mut set = Self::new(min_token_chars);
        set.add_from_string(query);
        set
    }

    /// Tokenize `input` and fold the surviving tokens into the set.
    ///
    /// Dropped are: common words, tokens shorter than the minimum, and
    /// tokens related to an existing keyword by byte prefix in either
    /// direction. The set is re-sorted afterwards: descending character
    /// count, ties in ascending byte order.
    pub fn add_from_string(&mut self, input: &str) {
        let mut upper = input.as_bytes().to_vec();
        case::to_upper(&mut upper);

        let tokens: Vec<(usize, usize)> = words::words(&upper)
            .map(|(offset, word)| (offset, offset + word.len()))
            .collect();
        for (start, end) in tokens {
            let token = &upper[start..end];
            if common::is_common_upper_word(token) {
                continue;
            }
            let chars = utf8::char_count(token);
            if chars < self.min_token_chars {
                continue;
            }
            if related_by_prefix(&self.keywords, token) {
                continue;
            }
            self.keywords.push(Keyword {
                bytes: token.to_vec(),
                chars,
            });
        }
        self.sort();
    }

    fn sort(&mut self) {
        self.keywords
            .sort_by(|a, b| b.chars.cmp(&a.chars).then_with(|| a.bytes.cmp(&b.bytes)));
    }

    /// Rewrite the ASCII umlaut digraphs (`AE OE UE IE EE SS`) in every
    /// keyword to the corresponding German letters. Returns whether any
    /// substitution happened; the caller uses that to decide on a second
    /// lookup pass. All substitutions are evaluated unconditionally.
    pub fn adjust(&mut self) -> bool {
        let mut adjusted = false;
        for keyword in &mut self.keywords {
            let mut changed = false;
            for (pattern, replacement) in UMLAUT_SUBSTITUTIONS {
                changed |= substitute_pair(&mut keyword.bytes, pattern, replacement);
            }
            if changed {
                keyword.chars = utf8::char_count(&keyword.bytes);
                adjusted = true;
            }
        }
        if adjusted {
            // character counts shrank; restore the length ordering
            self.sort();
            // the rewrite can collapse formerly unrelated keywords into
            // prefix-related ones (MASSE and MAßE both become MAßE), so
            // re-enforce prefix freedom; longest-first order keeps the
            // more specific keyword of a related pair
            let mut kept: Vec<Keyword> = Vec::with_capacity(self.keywords.len());
            for keyword in self.keywords.drain(..) {
                if !related_by_prefix(&kept, &keyword.bytes) {
                    kept.push(keyword);
                }
            }
            self.keywords = kept;
        }
        adjusted
    }

    /// Longest keyword in bytes, for sizing scratch buffers.
    pub fn longest_keyword(&self) -> usize {
        self.keywords.iter().map(|k| k.bytes.len()).max().unwrap_or(0)
    }

    /// True iff every keyword occurs in `text` under case-insensitive
    /// search. Vacuously true for an empty set.
    pub fn all_present(&self, text: &[u8]) -> bool {
        self.keywords
            .iter()
            .all(|k| case::ifind_first(text, &k.bytes, 0, text.len()).is_some())
    }

    /// The deduplicated set of keyword prefixes cropped to `depth`
    /// characters, as probed against the index.
    pub fn search_prefixes(&self, depth: usize) -> Result<Vec<Vec<u8>>> {
        let mut prefixes: Vec<Vec<u8>> = Vec::new();
        for keyword in &self.keywords {
            let mut prefix = keyword.bytes.clone();
            utf8::crop_to_unicode_len(&mut prefix, depth)?;
            if !prefixes.contains(&prefix) {
                prefixes.push(prefix);
            }
        }
        Ok(prefixes)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Keyword> {
        self.keywords.iter()
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

fn related_by_prefix(keywords: &[Keyword], token: &[u8]) -> bool {
    keywords
        .iter()
        .any(|k| k.bytes.starts_with(token) || token.starts_with(&k.bytes))
}

fn substitute_pair(bytes: &mut [u8], pattern: &[u8; 2], replacement: [u8; 2]) -> bool {
    let mut replaced = false;
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == pattern[0] && bytes[i + 1] == pattern[1] {
            bytes[i] = replacement[0];
            bytes[i + 1] = replacement[1];
            replaced = true;
        }
        i += 1;
    }
    replaced
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes_of(set: &KeywordSet) -> Vec<&[u8]> {
        set.iter().map(|k| k.as_bytes()).collect()
    }

    #[test]
    fn test_uppercases_and_keeps_content_words() {
        let set = KeywordSet::from_query("grüne Häuser", 3);
        assert_eq!(bytes_of(&set), vec!["HÄUSER".as_bytes(), "GRÜNE".as_bytes()]);
    }

    #[test]
    fn test_drops_common_words() {
        let set = KeywordSet::from_query("der grüne Baum", 3);
        assert_eq!(bytes_of(&set), vec!["GRÜNE".as_bytes(), b"BAUM".as_slice()]);
    }

    #[test]
    fn test_drops_short_tokens() {
        let set = KeywordSet::from_query("ab Haus", 3);
        assert_eq!(bytes_of(&set), vec![b"HAUS"]);
    }

    #[test]
    fn test_prefix_freedom_both_directions() {
        let set = KeywordSet::from_query("haus hausboot", 3);
        assert_eq!(bytes_of(&set), vec![b"HAUS"]);

        let set = KeywordSet::from_query("hausboot haus", 3);
        assert_eq!(bytes_of(&set), vec![b"HAUSBOOT"]);
    }

    #[test]
    fn test_ordering_longest_first_then_lexicographic() {
        let set = KeywordSet::from_query("zug adler baum", 3);
        assert_eq!(
            bytes_of(&set),
            vec![b"ADLER".as_slice(), b"BAUM".as_slice(), b"ZUG".as_slice()]
        );
    }

    #[test]
    fn test_ordering_counts_characters_not_bytes() {
        // five characters of umlauts take ten bytes but still lose against
        // a six-character ASCII word
        let set = KeywordSet::from_query("straße äöüïë", 3);
        assert_eq!(
            bytes_of(&set),
            vec!["STRAßE".as_bytes(), "ÄÖÜÏË".as_bytes()]
        );
        assert_eq!(set.iter().next().unwrap().chars(), 6);
    }

    #[test]
    fn test_adjust_substitutes_digraphs() {
        let mut set = KeywordSet::from_query("strasse", 3);
        assert!(set.adjust());
        assert_eq!(bytes_of(&set), vec!["STRAßE".as_bytes()]);
    }

    #[test]
    fn test_adjust_handles_every_digraph() {
        let mut set = KeywordSet::from_query("baer moewe fuesse", 3);
        assert!(set.adjust());
        let keywords = bytes_of(&set);
        assert!(keywords.contains(&"BÄR".as_bytes()));
        assert!(keywords.contains(&"MÖWE".as_bytes()));
        assert!(keywords.contains(&"FÜßE".as_bytes()));
    }

    #[test]
    fn test_adjust_merges_keywords_that_collapse_together() {
        // MASSE and MAßE are unrelated byte-wise, but the SS rewrite turns
        // the first into a duplicate of the second
        let mut set = KeywordSet::from_query("masse maße", 3);
        assert_eq!(set.len(), 2);
        assert!(set.adjust());
        assert_eq!(bytes_of(&set), vec!["MAßE".as_bytes()]);
    }

    #[test]
    fn test_adjust_keeps_the_longer_of_newly_related_keywords() {
        // MAßE and MASSEINHEIT share no byte prefix, but the rewrite turns
        // the second into MAßEINHEIT, an extension of the first
        let mut set = KeywordSet::from_query("maße masseinheit", 3);
        assert_eq!(set.len(), 2);
        assert!(set.adjust());
        assert_eq!(bytes_of(&set), vec!["MAßEINHEIT".as_bytes()]);
    }

    #[test]
    fn test_adjust_without_digraphs_reports_false() {
        let mut set = KeywordSet::from_query("haus", 3);
        assert!(!set.adjust());
        assert_eq!(bytes_of(&set), vec![b"HAUS"]);
    }

    #[test]
    fn test_adjust_is_idempotent() {
        let mut set = KeywordSet::from_query("strasse fuer", 3);
        set.adjust();
        let once = bytes_of(&set)
            .into_iter()
            .map(|b| b.to_vec())
            .collect::<Vec<_>>();
        assert!(!set.adjust());
        let twice = bytes_of(&set)
            .into_iter()
            .map(|b| b.to_vec())
            .collect::<Vec<_>>();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_all_present() {
        let set = KeywordSet::from_query("apple tree", 3);
        assert!(set.all_present(b"Apfelbaum :: apple tree"));
        assert!(!set.all_present(b"Apfel :: apple"));
        assert!(KeywordSet::new(3).all_present(b"anything"));
    }

    #[test]
    fn test_longest_keyword_in_bytes() {
        let set = KeywordSet::from_query("zug straße", 3);
        assert_eq!(set.longest_keyword(), "STRAßE".len());
    }

    #[test]
    fn test_search_prefixes_cropped_and_deduplicated() {
        let set = KeywordSet::from_query("apfel apfelsine baum", 3);
        // APFELSINE is dropped as a prefix duplicate of APFEL
        let prefixes = set.search_prefixes(3).unwrap();
        assert_eq!(prefixes, vec![b"APF".to_vec(), b"BAU".to_vec()]);
    }
}
