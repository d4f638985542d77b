use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use super::TARGET_EVALUATION;

pub const REAL_NOTES_HEADER: &str = "Real Notes Count";

/// Note counts exported from the evaluation spreadsheet.
///
/// The header row holds a `Real Notes Count` column; every named column to its right is
/// one model's predicted counts. Blank cells count as zero.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EvaluationSheet {
    pub models: Vec<String>,
    pub real_counts: Vec<i64>,
    /// One vector per model, aligned with `real_counts`.
    pub predictions: Vec<Vec<i64>>,
}

impl EvaluationSheet {
    pub fn row_count(&self) -> usize {
        self.real_counts.len()
    }
}

pub fn read_sheet(path: &Path) -> Result<EvaluationSheet> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to open evaluation sheet {}", path.display()))?;
    parse_sheet(&contents).with_context(|| format!("Invalid evaluation sheet {}", path.display()))
}

pub fn parse_sheet(contents: &str) -> Result<EvaluationSheet> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(contents.trim_start_matches('\u{feff}').as_bytes());

    let header = reader.headers().context("Failed to read header row")?.clone();
    if header.iter().all(|cell| cell.trim().is_empty()) {
        bail!("Evaluation sheet is empty");
    }

    let real_col = header
        .iter()
        .position(|cell| cell.trim() == REAL_NOTES_HEADER)
        .with_context(|| format!("No '{}' column in header", REAL_NOTES_HEADER))?;

    let model_columns = model_columns(&header, real_col);
    if model_columns.is_empty() {
        warn!(target: TARGET_EVALUATION, "No model columns after '{}'", REAL_NOTES_HEADER);
    }

    let mut sheet = EvaluationSheet {
        models: model_columns.iter().map(|(_, name)| name.clone()).collect(),
        real_counts: Vec::new(),
        predictions: vec![Vec::new(); model_columns.len()],
    };

    for record in reader.records() {
        let record = record.context("Failed to read evaluation row")?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let line = record.position().map_or(0, |pos| pos.line());
        let cell = |col: usize| record.get(col).unwrap_or("");

        sheet.real_counts.push(
            parse_count(cell(real_col))
                .with_context(|| format!("Line {}: bad '{}' value", line, REAL_NOTES_HEADER))?,
        );

        for (predictions, (col, name)) in sheet.predictions.iter_mut().zip(&model_columns) {
            predictions.push(
                parse_count(cell(*col))
                    .with_context(|| format!("Line {}: bad value for model '{}'", line, name))?,
            );
        }
    }

    debug!(
        target: TARGET_EVALUATION,
        "Parsed {} rows for {} models",
        sheet.row_count(),
        sheet.models.len()
    );

    Ok(sheet)
}

/// Named columns right of the real count. A repeated name gets a `.1`, `.2`, ... suffix so
/// every model stays distinct in the reports.
fn model_columns(header: &csv::StringRecord, real_col: usize) -> Vec<(usize, String)> {
    let mut seen: HashMap<String, usize> = HashMap::new();

    header
        .iter()
        .enumerate()
        .skip(real_col + 1)
        .map(|(col, name)| (col, name.trim().to_string()))
        .filter(|(_, name)| !name.is_empty())
        .map(|(col, name)| {
            let repeats = seen.entry(name.clone()).or_insert(0);
            let unique = if *repeats == 0 {
                name
            } else {
                format!("{}.{}", name, repeats)
            };
            *repeats += 1;
            (col, unique)
        })
        .collect()
}

/// Parses a note count. Spreadsheet exports sometimes write whole numbers as `3.0`.
fn parse_count(cell: &str) -> Result<i64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(0);
    }
    if let Ok(value) = cell.parse::<i64>() {
        return Ok(value);
    }
    match cell.parse::<f64>() {
        Ok(value) if value.fract() == 0.0 && value.is_finite() => Ok(value as i64),
        _ => bail!("'{}' is not a whole number", cell),
    }
}
