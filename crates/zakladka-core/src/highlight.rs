use crate::types::Highlight;

/// Half-open interval intersection. Touching endpoints do not count
/// as overlap.
pub fn overlaps(a_start: usize, a_end: usize, b_start: usize, b_end: usize) -> bool {
    a_start < b_end && b_start < a_end
}

/// Outcome of a toggle against a highlight set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toggle {
    Added(String),
    Removed(String),
}

impl Toggle {
    pub fn id(&self) -> &str {
        match self {
            Toggle::Added(id) | Toggle::Removed(id) => id,
        }
    }
}

/// Toggle a candidate interval against a sorted, non-overlapping set.
///
/// Remove-wins: if the candidate overlaps an existing highlight, that
/// single highlight (the first match, never more than one per call)
/// is removed and no new one is created. Otherwise a fresh-id
/// highlight is inserted and the set re-sorted by start. Degenerate
/// candidates (`start >= end`) are ignored.
pub fn toggle(highlights: &mut Vec<Highlight>, start: usize, end: usize) -> Option<Toggle> {
    if start >= end {
        return None;
    }

    if let Some(pos) = highlights
        .iter()
        .position(|h| overlaps(h.start, h.end, start, end))
    {
        let removed = highlights.remove(pos);
        return Some(Toggle::Removed(removed.id));
    }

    let added = Highlight::new(start, end);
    let id = added.id.clone();
    highlights.push(added);
    highlights.sort_by_key(|h| h.start);
    Some(Toggle::Added(id))
}
