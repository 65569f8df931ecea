//! Character-offset helpers.
//!
//! Highlight offsets are character offsets, not byte offsets: the
//! presentation layer reports selection positions in rendered
//! characters and transcripts may contain multi-byte punctuation.
//! Every component measures length through these helpers so the
//! coordinate spaces stay consistent.

/// Number of characters in `s`.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte index of the `n`-th character, clamped to the end of the string.
pub fn byte_at(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len())
}

/// Substring by character offsets, clamped to the string bounds.
pub fn char_slice(s: &str, start: usize, end: usize) -> &str {
    if start >= end {
        return "";
    }
    &s[byte_at(s, start)..byte_at(s, end)]
}

/// Character offset of the first occurrence of `needle` at or after
/// character offset `from`.
pub fn find_from(s: &str, needle: &str, from: usize) -> Option<usize> {
    let base = byte_at(s, from);
    let hit = s[base..].find(needle)? + base;
    Some(char_len(&s[..hit]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_slice_clamps_to_bounds() {
        assert_eq!(char_slice("hello", 1, 3), "el");
        assert_eq!(char_slice("hello", 3, 99), "lo");
        assert_eq!(char_slice("hello", 4, 2), "");
    }

    #[test]
    fn char_offsets_survive_multibyte_text() {
        let s = "ありがとう world";
        assert_eq!(char_len(s), 11);
        assert_eq!(char_slice(s, 0, 5), "ありがとう");
        assert_eq!(char_slice(s, 6, 11), "world");
    }

    #[test]
    fn find_from_respects_lower_bound() {
        let s = "abc abc abc";
        assert_eq!(find_from(s, "abc", 0), Some(0));
        assert_eq!(find_from(s, "abc", 1), Some(4));
        assert_eq!(find_from(s, "abc", 9), None);
    }

    #[test]
    fn find_from_returns_char_offsets() {
        let s = "日本語 text";
        assert_eq!(find_from(s, "text", 0), Some(4));
    }
}
