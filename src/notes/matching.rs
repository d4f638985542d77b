use html_escape::encode_text;
use std::collections::HashSet;
use tracing::debug;

use super::normalizer::{normalize_note, notes_overlap};
use super::TARGET_NOTES;
use crate::catalog::Perfume;

/// Share of the user's notes found in one perfume.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NoteSimilarity {
    pub score: f64,
    pub matched: usize,
    pub total: usize,
}

/// A catalog entry that shares at least one note with the user's comment.
#[derive(Clone, Debug)]
pub struct PerfumeMatch<'a> {
    pub perfume: &'a Perfume,
    pub similarity: NoteSimilarity,
}

/// Calculate how many of the user's notes appear in a perfume's `all_notes`.
///
/// A user note is matched when, after normalization, it overlaps at least one perfume note.
/// Duplicate user notes are counted once in `matched` but every entry counts toward
/// `total`.
pub fn calculate_similarity(user_notes: &[String], perfume: &Perfume) -> NoteSimilarity {
    if user_notes.is_empty() {
        return NoteSimilarity::default();
    }

    let perfume_notes: Vec<String> = perfume
        .all_notes
        .iter()
        .map(|note| normalize_note(note))
        .collect();

    let mut common_notes = HashSet::new();
    for user_note in user_notes.iter().map(|note| normalize_note(note)) {
        if perfume_notes
            .iter()
            .any(|perfume_note| notes_overlap(&user_note, perfume_note))
        {
            common_notes.insert(user_note);
        }
    }

    let matched = common_notes.len();
    let total = user_notes.len();

    NoteSimilarity {
        score: matched as f64 / total as f64,
        matched,
        total,
    }
}

/// Score every perfume against the user's notes, keeping only those with a non-zero score.
///
/// Results are ordered by score, highest first. The sort is stable so equal scores keep
/// catalog order.
pub fn find_matching_perfumes<'a>(
    user_notes: &[String],
    database: &'a [Perfume],
) -> Vec<PerfumeMatch<'a>> {
    let mut scored: Vec<PerfumeMatch<'a>> = database
        .iter()
        .filter_map(|perfume| {
            let similarity = calculate_similarity(user_notes, perfume);
            (similarity.score > 0.0).then_some(PerfumeMatch {
                perfume,
                similarity,
            })
        })
        .collect();

    scored.sort_by(|a, b| b.similarity.score.total_cmp(&a.similarity.score));

    debug!(
        target: TARGET_NOTES,
        "{} of {} perfumes share notes with {:?}",
        scored.len(),
        database.len(),
        user_notes
    );

    scored
}

/// Render a perfume's note list with the notes the user mentioned highlighted.
///
/// Returns `None` when the perfume has no notes in this list. Notes are HTML-escaped.
pub fn highlight_matching_notes(notes: &[String], user_notes: &[String]) -> Option<String> {
    if notes.is_empty() {
        return None;
    }

    let user_notes: Vec<String> = user_notes.iter().map(|note| normalize_note(note)).collect();

    let highlighted: Vec<String> = notes
        .iter()
        .map(|note| {
            let note_normalized = normalize_note(note);
            let escaped = encode_text(note).into_owned();
            if user_notes
                .iter()
                .any(|user_note| notes_overlap(user_note, &note_normalized))
            {
                format!(r#"<span style="color: red; font-weight: bold;">{}</span>"#, escaped)
            } else {
                escaped
            }
        })
        .collect();

    Some(highlighted.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn perfume(name: &str, all: &[&str]) -> Perfume {
        Perfume {
            brand: Some("House".to_string()),
            fragrance: Some(name.to_string()),
            all_notes: notes(all),
            ..Perfume::default()
        }
    }

    #[test]
    fn test_similarity_counts_substring_matches() {
        let p = perfume("A", &["Bergamot", "Turkish Rose", "Vanilla."]);
        let sim = calculate_similarity(&notes(&["rose", "vanilla", "oud"]), &p);
        assert_eq!(sim.matched, 2);
        assert_eq!(sim.total, 3);
        assert!((sim.score - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_similarity_user_note_containing_catalog_note() {
        let p = perfume("A", &["musk"]);
        let sim = calculate_similarity(&notes(&["white musk"]), &p);
        assert_eq!(sim.matched, 1);
        assert_eq!(sim.score, 1.0);
    }

    #[test]
    fn test_similarity_punctuation_only_catalog_note_matches_everything() {
        let p = perfume("A", &[".", "oud"]);
        let sim = calculate_similarity(&notes(&["rose"]), &p);
        assert_eq!(sim.matched, 1);
        assert_eq!(sim.total, 1);
        assert_eq!(find_matching_perfumes(&notes(&["rose"]), &[p]).len(), 1);
    }

    #[test]
    fn test_similarity_empty_query() {
        let p = perfume("A", &["musk"]);
        assert_eq!(calculate_similarity(&[], &p), NoteSimilarity::default());
    }

    #[test]
    fn test_similarity_duplicate_user_notes() {
        let p = perfume("A", &["rose"]);
        let sim = calculate_similarity(&notes(&["Rose", "rose."]), &p);
        assert_eq!(sim.matched, 1);
        assert_eq!(sim.total, 2);
        assert_eq!(sim.score, 0.5);
    }

    #[test]
    fn test_find_matching_perfumes_orders_and_filters() {
        let db = vec![
            perfume("half", &["rose", "amber"]),
            perfume("none", &["oud"]),
            perfume("full", &["rose", "iris"]),
            perfume("half-too", &["iris root"]),
        ];
        let user = notes(&["rose", "iris"]);
        let matches = find_matching_perfumes(&user, &db);

        let names: Vec<&str> = matches
            .iter()
            .map(|m| m.perfume.fragrance_or_unknown())
            .collect();
        // Ties keep catalog order.
        assert_eq!(names, vec!["full", "half", "half-too"]);
        assert_eq!(matches[0].similarity.matched, 2);
        assert_eq!(matches[1].similarity.matched, 1);
    }

    #[test]
    fn test_find_matching_perfumes_no_notes() {
        let db = vec![perfume("a", &["rose"])];
        assert!(find_matching_perfumes(&[], &db).is_empty());
    }

    #[test]
    fn test_highlight_matching_notes() {
        let rendered =
            highlight_matching_notes(&notes(&["Bergamot", "Lemon"]), &notes(&["bergamot"]))
                .unwrap();
        assert_eq!(
            rendered,
            r#"<span style="color: red; font-weight: bold;">Bergamot</span>, Lemon"#
        );
    }

    #[test]
    fn test_highlight_empty_list() {
        assert_eq!(highlight_matching_notes(&[], &notes(&["rose"])), None);
    }

    #[test]
    fn test_highlight_escapes_markup() {
        let rendered = highlight_matching_notes(&notes(&["<b>oud</b>"]), &[]).unwrap();
        assert_eq!(rendered, "&lt;b&gt;oud&lt;/b&gt;");
    }
}
