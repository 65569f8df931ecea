use crate::highlight::overlaps;
use crate::segments::render_segments;
use crate::text::char_len;
use crate::types::{Fragment, Highlight, OutlineSection};

/// Character spans of one section's heading and bullet block within
/// the flattened outline string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionPosition {
    pub heading_start: usize,
    pub heading_end: usize,
    pub bullets_start: usize,
    pub bullets_end: usize,
}

/// One outline section broken into renderable runs: the heading and
/// each bullet as independent fragment lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSection {
    pub heading: Vec<Fragment>,
    pub bullets: Vec<Vec<Fragment>>,
}

/// Walk sections in flattening order, assigning each its spans within
/// the flattened outline string. Must mirror `flatten_outline`
/// exactly: one newline between a heading and its bullets, one
/// between bullets, a blank line between sections.
pub fn section_positions(sections: &[OutlineSection]) -> Vec<SectionPosition> {
    let mut positions = Vec::with_capacity(sections.len());
    let mut cursor = 0usize;

    for section in sections {
        let heading_start = cursor;
        let heading_end = heading_start + char_len(&section.heading);
        let bullets_start = if section.bullets.is_empty() {
            heading_end
        } else {
            heading_end + 1
        };
        let bullets_len = if section.bullets.is_empty() {
            0
        } else {
            section.bullets.iter().map(|b| char_len(b)).sum::<usize>() + section.bullets.len() - 1
        };
        let bullets_end = bullets_start + bullets_len;

        positions.push(SectionPosition {
            heading_start,
            heading_end,
            bullets_start,
            bullets_end,
        });

        cursor = bullets_end + 2;
    }

    positions
}

/// Highlights intersecting a fragment's `[frag_start, frag_end)` span,
/// clipped to the fragment and re-expressed in fragment-local offsets.
pub fn fragment_highlights(
    highlights: &[Highlight],
    frag_start: usize,
    frag_end: usize,
) -> Vec<Highlight> {
    highlights
        .iter()
        .filter(|h| overlaps(h.start, h.end, frag_start, frag_end))
        .map(|h| Highlight {
            id: h.id.clone(),
            start: h.start.saturating_sub(frag_start),
            end: (h.end - frag_start).min(frag_end - frag_start),
        })
        .collect()
}

/// Project the outline highlight set onto each heading and bullet and
/// render them as runs. Recomputed on every render: section
/// boundaries move whenever the transcript does.
pub fn render_outline(
    sections: &[OutlineSection],
    highlights: &[Highlight],
) -> Vec<RenderedSection> {
    let positions = section_positions(sections);

    sections
        .iter()
        .zip(positions)
        .map(|(section, pos)| {
            let heading_marks =
                fragment_highlights(highlights, pos.heading_start, pos.heading_end);
            let heading = render_segments(&section.heading, &heading_marks);

            let mut bullet_start = pos.bullets_start;
            let bullets = section
                .bullets
                .iter()
                .map(|bullet| {
                    let bullet_end = bullet_start + char_len(bullet);
                    let marks = fragment_highlights(highlights, bullet_start, bullet_end);
                    let runs = render_segments(bullet, &marks);
                    bullet_start = bullet_end + 1;
                    runs
                })
                .collect();

            RenderedSection { heading, bullets }
        })
        .collect()
}
