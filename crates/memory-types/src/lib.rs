//! Core data model for the memory lifecycle engine: the fact taxonomy, the
//! `Memory` row shape, error kinds, and the id-charset guard shared by every
//! entry point.

mod error;
mod memory;
mod taxonomy;
mod validate;

pub use error::MemoryError;
pub use memory::{Metadata, Memory};
pub use taxonomy::MemoryType;
pub use validate::validate_id;

/// Fixed embedding dimensionality. Every vector stored or searched against
/// must have exactly this many components.
pub const EMBEDDING_DIMS: usize = 1024;

/// Rolling-window cap on live `session-summary` rows per user.
pub const MAX_SESSION_SUMMARIES: usize = 3;

/// Default cosine-distance dedup threshold for non-structural types.
pub const DEDUP_DISTANCE: f32 = 0.12;
/// Widened cosine-distance dedup threshold for structural types.
pub const STRUCTURAL_DEDUP_DISTANCE: f32 = 0.25;

/// Default cosine-distance contradiction radius for non-structural types.
pub const CONTRADICTION_CANDIDATE_DISTANCE: f32 = 0.5;
/// Widened cosine-distance contradiction radius for structural types.
pub const STRUCTURAL_CONTRADICTION_DISTANCE: f32 = 0.65;
/// Maximum number of contradiction candidates sent to the classifier.
pub const CONTRADICTION_CANDIDATE_LIMIT: usize = 15;

/// Default score threshold applied by the ranker.
pub const DEFAULT_SEARCH_THRESHOLD: f32 = 0.3;
/// Default result size for search.
pub const DEFAULT_SEARCH_LIMIT: usize = 5;
