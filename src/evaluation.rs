//! Offline accuracy evaluation of note-extraction models.
//!
//! Each model's extracted note count is compared with a human-labelled true count per review.
//! Besides exact-match rate, MAE and RMSE, models get a weighted score that rewards
//! near misses and gives nothing for an empty extraction.

pub mod metrics;
pub mod report;
pub mod sheet;

pub use metrics::{
    evaluate_model, evaluate_sheet, weighted_points, ErrorDistribution, ModelMetrics, Ranking,
};
pub use report::{json_report, text_report, JsonReport};
pub use sheet::{parse_sheet, read_sheet, EvaluationSheet, REAL_NOTES_HEADER};

pub const TARGET_EVALUATION: &str = "evaluation";
