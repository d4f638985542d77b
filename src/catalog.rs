use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;
use tracing::{error, info};

use crate::TARGET_CATALOG;

/// One fragrance record from the perfume database file.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Perfume {
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub fragrance: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub top_notes: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub heart_notes: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub base_notes: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub all_notes: Vec<String>,
}

impl Perfume {
    pub fn brand_or_unknown(&self) -> &str {
        self.brand.as_deref().unwrap_or("Unknown")
    }

    pub fn fragrance_or_unknown(&self) -> &str {
        self.fragrance.as_deref().unwrap_or("Unknown")
    }
}

// Some exports write `null` instead of an empty list.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Loads the perfume database. Any failure is logged and produces an empty catalog, which
/// callers report to the user.
pub fn load_perfume_database(path: &Path) -> Vec<Perfume> {
    match read_perfume_database(path) {
        Ok(perfumes) => {
            info!(target: TARGET_CATALOG, "Loaded {} perfumes from {}", perfumes.len(), path.display());
            perfumes
        }
        Err(e) => {
            error!(target: TARGET_CATALOG, "Perfume database could not be loaded: {:#}", e);
            Vec::new()
        }
    }
}

fn read_perfume_database(path: &Path) -> Result<Vec<Perfume>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read database file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse database file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_valid_database() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"brand": "Maison", "fragrance": "Ambre", "top_notes": ["Bergamot"],
                  "heart_notes": [], "base_notes": ["Amber"], "all_notes": ["Bergamot", "Amber"],
                  "year": 2019}},
                {{"fragrance": "Nameless", "top_notes": null}}
            ]"#
        )
        .unwrap();

        let perfumes = load_perfume_database(file.path());
        assert_eq!(perfumes.len(), 2);
        assert_eq!(perfumes[0].brand_or_unknown(), "Maison");
        assert_eq!(perfumes[0].all_notes, vec!["Bergamot", "Amber"]);
        assert_eq!(perfumes[1].brand_or_unknown(), "Unknown");
        assert_eq!(perfumes[1].fragrance_or_unknown(), "Nameless");
        assert!(perfumes[1].all_notes.is_empty());
    }

    #[test]
    fn test_missing_database_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let perfumes = load_perfume_database(&dir.path().join("nope.json"));
        assert!(perfumes.is_empty());
    }

    #[test]
    fn test_malformed_database_is_empty() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{\"not\": \"a list\"}}").unwrap();
        assert!(load_perfume_database(file.path()).is_empty());
    }
}
