use crate::text::{char_len, char_slice};
use crate::types::{Fragment, Highlight};

/// Split a canonical string into plain and highlighted runs.
///
/// The highlight set must be sorted and non-overlapping. The
/// concatenation of the returned fragments reproduces `text` exactly;
/// empty gaps are omitted.
pub fn render_segments(text: &str, highlights: &[Highlight]) -> Vec<Fragment> {
    let mut fragments = Vec::new();
    let mut cursor = 0usize;

    for h in highlights {
        if h.start > cursor {
            fragments.push(Fragment::plain(char_slice(text, cursor, h.start)));
        }
        fragments.push(Fragment::highlighted(
            char_slice(text, h.start, h.end),
            h.id.clone(),
        ));
        cursor = h.end;
    }

    let total = char_len(text);
    if cursor < total {
        fragments.push(Fragment::plain(char_slice(text, cursor, total)));
    }

    fragments
}
