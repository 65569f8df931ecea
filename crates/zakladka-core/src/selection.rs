use crate::text::{char_len, char_slice, find_from};

/// How far back from the reported position the fallback search may
/// start, in characters.
const SEARCH_WINDOW: usize = 100;

/// A selection as reported by the presentation layer: the number of
/// rendered characters before the selection start, plus the selected
/// text itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedSelection {
    pub rendered_prefix_len: usize,
    pub text: String,
}

impl ReportedSelection {
    pub fn new(rendered_prefix_len: usize, text: impl Into<String>) -> Self {
        Self {
            rendered_prefix_len,
            text: text.into(),
        }
    }
}

/// Resolve a reported selection to `[start, end)` character offsets
/// against the canonical string.
///
/// The rendered prefix length counts only rendered characters, so it
/// drifts from canonical offsets once highlight markup is interleaved
/// in the rendered output. The candidate offsets are verified against
/// the selected text first; when they disagree, a windowed search
/// looks for the first occurrence of the selected text starting no
/// earlier than `SEARCH_WINDOW` characters back. `None` means the
/// selection could not be mapped and must be silently dropped.
pub fn resolve_selection(
    canonical: &str,
    selection: &ReportedSelection,
) -> Option<(usize, usize)> {
    let selected = selection.text.trim();
    if selected.is_empty() {
        return None;
    }

    let start = selection.rendered_prefix_len;
    let end = start + char_len(selected);
    if char_slice(canonical, start, end).trim() == selected {
        return Some((start, end));
    }

    let from = start.saturating_sub(SEARCH_WINDOW);
    let found = find_from(canonical, selected, from)?;
    Some((found, found + char_len(selected)))
}
