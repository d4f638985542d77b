/// Normalize a note for comparison: lowercase, trimmed, commas and periods removed.
///
/// No stemming or synonym handling is applied, so "roses" and "rose" stay distinct tokens
/// and only match through substring containment.
pub fn normalize_note(note: &str) -> String {
    note.to_lowercase().trim().replace([',', '.'], "")
}

/// Two already-normalized notes overlap when either one contains the other.
///
/// Plain containment: a catalog note that normalizes to nothing (such as `"."`) is contained
/// in every user note.
pub fn notes_overlap(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_note() {
        assert_eq!(normalize_note("  Bergamot "), "bergamot");
        assert_eq!(normalize_note("Pink Pepper."), "pink pepper");
        assert_eq!(normalize_note("Vanilla, Bourbon"), "vanilla bourbon");
        assert_eq!(normalize_note("TONKA"), "tonka");
        // Interior whitespace is left alone.
        assert_eq!(normalize_note("white  musk"), "white  musk");
    }

    #[test]
    fn test_normalize_strips_before_removing_punctuation() {
        // Trimming happens first, so a trailing period hides trailing whitespace.
        assert_eq!(normalize_note("amber ."), "amber ");
    }

    #[test]
    fn test_notes_overlap() {
        assert!(notes_overlap("rose", "rose"));
        assert!(notes_overlap("rose", "turkish rose"));
        assert!(notes_overlap("turkish rose", "rose"));
        assert!(!notes_overlap("rose", "oud"));
    }

    #[test]
    fn test_empty_note_is_contained_everywhere() {
        assert!(notes_overlap("", "rose"));
        assert!(notes_overlap("rose", ""));
        assert!(notes_overlap("rose", &normalize_note(".")));
    }
}
