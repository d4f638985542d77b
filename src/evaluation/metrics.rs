use serde::Serialize;
use std::cmp::Ordering;

use super::sheet::EvaluationSheet;

/// Points per row for an absolute error of 0, 1, 2 and 3 notes; larger errors earn nothing.
pub const SCORE_TABLE: [u32; 4] = [100, 75, 50, 25];
pub const MAX_POINTS: u32 = 100;

/// Points a model earns on one row.
///
/// A model that extracted no notes earns nothing, however close zero was to the true count.
pub fn weighted_points(real: i64, predicted: i64) -> u32 {
    if predicted == 0 {
        return 0;
    }
    let error = real.abs_diff(predicted);
    usize::try_from(error)
        .ok()
        .and_then(|error| SCORE_TABLE.get(error).copied())
        .unwrap_or(0)
}

/// How many rows fell into each absolute-error bucket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ErrorDistribution {
    #[serde(rename = "0_errors")]
    pub zero: usize,
    #[serde(rename = "1_error")]
    pub one: usize,
    #[serde(rename = "2_errors")]
    pub two: usize,
    #[serde(rename = "3_errors")]
    pub three: usize,
    #[serde(rename = "4plus_errors")]
    pub four_plus: usize,
}

impl ErrorDistribution {
    pub fn record(&mut self, error: u64) {
        match error {
            0 => self.zero += 1,
            1 => self.one += 1,
            2 => self.two += 1,
            3 => self.three += 1,
            _ => self.four_plus += 1,
        }
    }

    /// `0|1|2|3|4+` counts, as shown in the comparison table.
    pub fn compact(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.zero, self.one, self.two, self.three, self.four_plus
        )
    }
}

/// Accuracy statistics of one model's note counts against the true counts.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelMetrics {
    pub model: String,
    pub exact_matches: usize,
    pub total_count: usize,
    /// Percentage of rows where the predicted count equals the true count.
    pub exact_accuracy: f64,
    pub mae: f64,
    pub rmse: f64,
    /// Points earned as a percentage of the maximum possible.
    pub weighted_accuracy: f64,
    pub error_distribution: ErrorDistribution,
    pub zero_note_count: usize,
    pub absolute_errors: Vec<u64>,
}

/// Score one model column. `real` and `predicted` are read pairwise; a missing prediction
/// counts as zero notes.
pub fn evaluate_model(model: &str, real: &[i64], predicted: &[i64]) -> ModelMetrics {
    let mut exact_matches = 0;
    let mut zero_note_count = 0;
    let mut weighted_score: u64 = 0;
    let mut error_distribution = ErrorDistribution::default();
    let mut absolute_errors = Vec::with_capacity(real.len());

    for (row, &real_value) in real.iter().enumerate() {
        let model_value = predicted.get(row).copied().unwrap_or(0);

        if model_value == real_value {
            exact_matches += 1;
        }
        if model_value == 0 {
            zero_note_count += 1;
        }

        let error = real_value.abs_diff(model_value);
        absolute_errors.push(error);
        error_distribution.record(error);
        weighted_score += u64::from(weighted_points(real_value, model_value));
    }

    let total_count = real.len();
    let (exact_accuracy, mae, rmse, weighted_accuracy) = if total_count == 0 {
        (0.0, 0.0, 0.0, 0.0)
    } else {
        let n = total_count as f64;
        let abs_sum: f64 = absolute_errors.iter().map(|&e| e as f64).sum();
        let sq_sum: f64 = absolute_errors.iter().map(|&e| (e as f64).powi(2)).sum();
        (
            exact_matches as f64 / n * 100.0,
            abs_sum / n,
            (sq_sum / n).sqrt(),
            weighted_score as f64 / (n * f64::from(MAX_POINTS)) * 100.0,
        )
    };

    ModelMetrics {
        model: model.to_string(),
        exact_matches,
        total_count,
        exact_accuracy,
        mae,
        rmse,
        weighted_accuracy,
        error_distribution,
        zero_note_count,
        absolute_errors,
    }
}

/// Metrics for every model column, in column order.
pub fn evaluate_sheet(sheet: &EvaluationSheet) -> Vec<ModelMetrics> {
    sheet
        .models
        .iter()
        .zip(&sheet.predictions)
        .map(|(model, predicted)| evaluate_model(model, &sheet.real_counts, predicted))
        .collect()
}

/// The orderings the report ranks models by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ranking {
    ExactMatch,
    Mae,
    Rmse,
    Weighted,
}

impl Ranking {
    pub const ALL: [Ranking; 4] = [
        Ranking::ExactMatch,
        Ranking::Mae,
        Ranking::Rmse,
        Ranking::Weighted,
    ];

    fn compare(self, a: &ModelMetrics, b: &ModelMetrics) -> Ordering {
        match self {
            Ranking::ExactMatch => b.exact_accuracy.total_cmp(&a.exact_accuracy),
            Ranking::Mae => a.mae.total_cmp(&b.mae),
            Ranking::Rmse => a.rmse.total_cmp(&b.rmse),
            Ranking::Weighted => b.weighted_accuracy.total_cmp(&a.weighted_accuracy),
        }
    }

    /// Best model first. Ties keep column order.
    pub fn rank(self, metrics: &[ModelMetrics]) -> Vec<&ModelMetrics> {
        let mut ranked: Vec<&ModelMetrics> = metrics.iter().collect();
        ranked.sort_by(|a, b| self.compare(a, b));
        ranked
    }
}
