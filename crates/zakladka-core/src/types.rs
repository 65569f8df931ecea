use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A half-open `[start, end)` character interval over one canonical
/// string. Offsets are only meaningful against the string the
/// highlight was created for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    pub id: String,
    pub start: usize,
    pub end: usize,
}

impl Highlight {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            start,
            end,
        }
    }
}

/// Which canonical string a highlight set is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightKind {
    Transcript,
    Outline,
}

impl HighlightKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HighlightKind::Transcript => "transcript",
            HighlightKind::Outline => "outline",
        }
    }
}

/// One derived outline section. Ephemeral: recomputed from the
/// transcript on every access, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineSection {
    pub heading: String,
    pub bullets: Vec<String>,
}

/// One rendered run of text. A highlighted run carries the id of the
/// highlight it came from so a click maps straight to removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub text: String,
    pub highlight_id: Option<String>,
}

impl Fragment {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            highlight_id: None,
        }
    }

    pub fn highlighted(text: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            highlight_id: Some(id.into()),
        }
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlight_id.is_some()
    }
}
