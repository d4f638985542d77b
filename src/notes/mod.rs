pub mod extraction;
pub mod matching;
pub mod normalizer;

pub use extraction::{extract_notes, parse_notes_response};
pub use matching::{
    calculate_similarity, find_matching_perfumes, highlight_matching_notes, NoteSimilarity,
    PerfumeMatch,
};
pub use normalizer::{normalize_note, notes_overlap};

// Module-level constants
pub const TARGET_NOTES: &str = "notes";
