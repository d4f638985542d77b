//! HTML fragments returned by `/analyze_comment`.
//!
//! The browser page inserts these fragments as-is, so everything that comes from the user,
//! the model or the catalog is escaped here.

use html_escape::encode_text;

use crate::notes::{highlight_matching_notes, PerfumeMatch};

pub const NOT_SPECIFIED: &str = "Not specified";
pub const NO_NOTES_MESSAGE: &str = "No valid note information could be retrieved from AI.";

pub fn error_reply(message: &str) -> String {
    format!("<h3>Error</h3><p>{}</p>", encode_text(message))
}

pub fn api_error_reply(message: &str) -> String {
    format!("<h3>API Error Occurred</h3><p>{}</p>", encode_text(message))
}

pub fn no_notes_reply() -> String {
    format!(
        r#"
<h3>Extracted Notes:</h3>
<p>{}</p>
<h3>Result:</h3>
<p>No matching was performed because no perfume notes were extracted from your comment.</p>
"#,
        NO_NOTES_MESSAGE
    )
}

pub fn no_match_reply(user_notes: &[String]) -> String {
    format!(
        r#"
<h3>Extracted Notes:</h3>
<p>{}</p>
<h3>Result:</h3>
<p>Unfortunately, no perfumes matching the extracted notes were found.</p>
"#,
        joined_notes(user_notes)
    )
}

pub fn notes_html(user_notes: &[String]) -> String {
    format!(
        r#"
<h3>Extracted Notes:</h3>
<p>{}</p>
"#,
        joined_notes(user_notes)
    )
}

fn joined_notes(user_notes: &[String]) -> String {
    user_notes
        .iter()
        .map(|note| encode_text(note))
        .collect::<Vec<_>>()
        .join(", ")
}

fn note_row(label: &str, value: &str) -> String {
    format!(
        r#"
        <div class="note-row">
            <span class="note-label">{}:</span>
            <span class="note-value">{}</span>
        </div>"#,
        label, value
    )
}

/// One result card. The top, heart and base rows are left out when the perfume has no
/// notes for them; the All Notes row is always present.
pub fn perfume_item(matched: &PerfumeMatch<'_>, user_notes: &[String]) -> String {
    let perfume = matched.perfume;
    let mut rows = String::new();

    for (label, notes) in [
        ("Top notes", &perfume.top_notes),
        ("Heart notes", &perfume.heart_notes),
        ("Base notes", &perfume.base_notes),
    ] {
        if let Some(value) = highlight_matching_notes(notes, user_notes) {
            rows.push_str(&note_row(label, &value));
        }
    }

    let all_notes = highlight_matching_notes(&perfume.all_notes, user_notes)
        .unwrap_or_else(|| NOT_SPECIFIED.to_string());
    rows.push_str(&note_row("All Notes", &all_notes));

    format!(
        r#"
<div class="perfume-item">
    <div class="perfume-image">
        <img src="/static/perfume.png" alt="Perfume">
    </div>
    <div class="perfume-content">
        <div class="perfume-header">
            <div class="perfume-title-section">
                <div class="perfume-name">Perfume: {} - {}</div>
            </div>
            <span class="similarity-badge">Similarity: {}/{}</span>
        </div>
        <div class="perfume-notes">{}
        </div>
    </div>
</div>
"#,
        encode_text(perfume.brand_or_unknown()),
        encode_text(perfume.fragrance_or_unknown()),
        matched.similarity.matched,
        matched.similarity.total,
        rows
    )
}
