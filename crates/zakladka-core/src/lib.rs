//! Zakladka Core Library
//!
//! Text annotation engine for transcript review: span highlighting with
//! toggle semantics, deterministic outline synthesis, and two-tier
//! (local cache + remote) annotation persistence.

pub mod cache;
pub mod error;
pub mod highlight;
pub mod outline;
pub mod projection;
pub mod remote;
pub mod review;
pub mod segments;
pub mod selection;
pub mod store;
pub mod text;
pub mod types;

// Re-export commonly used items at crate root
pub use cache::LocalCache;
pub use error::{Result, ZakladkaError};
pub use highlight::{Toggle, overlaps, toggle};
pub use outline::{flatten_outline, split_sentences, synthesize};
pub use projection::{
    RenderedSection, SectionPosition, fragment_highlights, render_outline, section_positions,
};
pub use remote::{API_URL_ENV, FetchedAnnotations, HttpRemote, PushRequest, RemoteAnnotations};
pub use review::{ReviewSession, load_transcript};
pub use segments::render_segments;
pub use selection::{ReportedSelection, resolve_selection};
pub use store::{AnnotationStore, GRACE_DELAY, StoreConfig};
pub use types::{Fragment, Highlight, HighlightKind, OutlineSection};
