use prettytable::{format, Cell, Row, Table};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

use super::metrics::{ErrorDistribution, ModelMetrics, Ranking};

const WIDTH: usize = 110;
pub const ZERO_RULE: &str = "Zero note extraction = 0 points";

/// Plain-text report assembled line by line.
#[derive(Default)]
struct ReportBuilder {
    lines: Vec<String>,
}

impl ReportBuilder {
    fn section(&mut self, title: &str) {
        self.lines.push("=".repeat(WIDTH));
        self.lines.push(title.to_string());
        self.lines.push("=".repeat(WIDTH));
        self.blank();
    }

    fn subsection(&mut self, title: &str) {
        self.lines.push(title.to_string());
        self.lines.push("-".repeat(WIDTH));
    }

    fn line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    fn paragraph(&mut self, lines: &[&str]) {
        self.lines.extend(lines.iter().map(|l| l.to_string()));
        self.blank();
    }

    fn blank(&mut self) {
        self.lines.push(String::new());
    }

    fn finish(self) -> String {
        self.lines.join("\n")
    }
}

pub fn medal(position: usize) -> String {
    match position {
        1 => "🥇".to_string(),
        2 => "🥈".to_string(),
        3 => "🥉".to_string(),
        _ => format!("{}.", position),
    }
}

fn ranking_title(ranking: Ranking) -> &'static str {
    match ranking {
        Ranking::ExactMatch => "EXACT MATCH ACCURACY RANKING - higher is better",
        Ranking::Mae => "MAE (MEAN ABSOLUTE ERROR) RANKING - lower is better",
        Ranking::Rmse => "RMSE RANKING - lower is better",
        Ranking::Weighted => "WEIGHTED ACCURACY RANKING - higher is better (0 NOTES = 0 POINTS)",
    }
}

fn ranking_header(ranking: Ranking) -> String {
    let (value, detail) = match ranking {
        Ranking::ExactMatch => ("Correct/Total", "Exact Acc."),
        Ranking::Mae => ("MAE", "Meaning"),
        Ranking::Rmse => ("RMSE", "Above MAE"),
        Ranking::Weighted => ("Weighted Score", "Zero-note rows"),
    };
    format!("{:<6} {:<30} {:<20} {}", "Rank", "Model", value, detail)
}

fn ranking_value(ranking: Ranking, m: &ModelMetrics) -> String {
    match ranking {
        Ranking::ExactMatch => format!(
            "{:<20} {:.2}%",
            format!("{}/{}", m.exact_matches, m.total_count),
            m.exact_accuracy
        ),
        Ranking::Mae => format!(
            "{:<20} off by {:.3} notes on average",
            format!("{:.3}", m.mae),
            m.mae
        ),
        Ranking::Rmse => format!(
            "{:<20} +{:.3}",
            format!("{:.3}", m.rmse),
            m.rmse - m.mae
        ),
        Ranking::Weighted => format!(
            "{:<20} {} times",
            format!("{:.2}%", m.weighted_accuracy),
            m.zero_note_count
        ),
    }
}

fn comparison_table(ranked: &[&ModelMetrics]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
    table.set_titles(Row::new(vec![
        Cell::new("Model"),
        Cell::new("Exact Acc"),
        Cell::new("MAE"),
        Cell::new("RMSE"),
        Cell::new("Weighted"),
        Cell::new("0 Notes"),
        Cell::new("Errors 0|1|2|3|4+"),
    ]));

    for m in ranked {
        table.add_row(Row::new(vec![
            Cell::new(&m.model),
            Cell::new(&format!("{:.2}%", m.exact_accuracy)),
            Cell::new(&format!("{:.3}", m.mae)),
            Cell::new(&format!("{:.3}", m.rmse)),
            Cell::new(&format!("{:.2}%", m.weighted_accuracy)),
            Cell::new(&m.zero_note_count.to_string()),
            Cell::new(&m.error_distribution.compact()),
        ]));
    }

    table
}

fn distribution_line(d: &ErrorDistribution) -> String {
    format!(
        "0={}, 1={}, 2={}, 3={}, 4+={}",
        d.zero, d.one, d.two, d.three, d.four_plus
    )
}

fn model_summary(report: &mut ReportBuilder, title: &str, m: &ModelMetrics) {
    report.line(format!("{}: {}", title, m.model));
    report.line(format!("   Exact Match Accuracy: {:.2}%", m.exact_accuracy));
    report.line(format!("   MAE: {:.3} notes", m.mae));
    report.line(format!("   RMSE: {:.3}", m.rmse));
    report.line(format!("   Weighted Accuracy: {:.2}%", m.weighted_accuracy));
    report.line(format!("   Zero-note extractions: {} times", m.zero_note_count));
    report.line(format!(
        "   Error distribution: {}",
        distribution_line(&m.error_distribution)
    ));
    report.blank();
}

/// Full human-readable report: metric descriptions, rankings, comparison table and a
/// best-versus-worst summary.
pub fn text_report(metrics: &[ModelMetrics], generated_at: &str) -> String {
    let mut report = ReportBuilder::default();

    report.section(&format!(
        "MODEL NOTE-COUNT ACCURACY ANALYSIS - INCLUDING ERROR DISTANCE\nRULE: {}",
        ZERO_RULE.to_uppercase()
    ));

    report.subsection("METRICS");
    report.paragraph(&[
        "1. EXACT MATCH ACCURACY",
        "    -> Extracted note count equals the true note count",
        "    -> Binary: right or wrong, ignores how far off a miss is",
    ]);
    report.paragraph(&[
        "2. MAE (Mean Absolute Error)",
        "    -> Average size of the error, sum(|true - predicted|) / n",
        "    -> MAE = 0.5 means the model is off by half a note on average",
    ]);
    report.paragraph(&[
        "3. RMSE (Root Mean Square Error)",
        "    -> sqrt(sum((true - predicted)^2) / n), punishes large misses harder",
        "    -> RMSE well above MAE means a few large errors",
    ]);
    report.paragraph(&[
        "4. WEIGHTED ACCURACY",
        "    -> Points per review by error distance:",
        "       model extracted 0 notes   = 0 points",
        "       exact count               = 100 points",
        "       off by 1                  = 75 points",
        "       off by 2                  = 50 points",
        "       off by 3                  = 25 points",
        "       off by 4 or more          = 0 points",
        "    -> Reported as a percentage of the maximum, higher is better",
    ]);
    report.paragraph(&[
        "NOTE: an empty extraction always scores 0 points.",
        "    Example: the review has 1 note and the model found none -> 0 points, not 75.",
    ]);

    report.section("RANKINGS");
    for ranking in Ranking::ALL {
        report.subsection(ranking_title(ranking));
        report.line(ranking_header(ranking));
        report.subsection("");
        for (idx, m) in ranking.rank(metrics).into_iter().enumerate() {
            report.line(format!(
                "{:<6} {:<30} {}",
                medal(idx + 1),
                m.model,
                ranking_value(ranking, m)
            ));
        }
        report.blank();
    }

    let by_weighted = Ranking::Weighted.rank(metrics);

    report.section("DETAILED COMPARISON");
    report.line(comparison_table(&by_weighted).to_string());
    report.blank();

    report.section("EXAMPLE SCENARIOS - WHY AN EMPTY EXTRACTION SCORES 0");
    report.paragraph(&[
        "True count: 1 note",
        "  Model extracted 0 notes",
        "  Error |1-0| = 1 would earn 75 points by distance alone",
        "  The zero rule applies instead: 0 points",
    ]);
    report.paragraph(&[
        "True count: 4 notes",
        "  Model A extracted 3 notes: error 1, 75 points",
        "  Model B extracted 0 notes: 0 points",
        "  A partial extraction beats an empty one",
    ]);

    if let (Some(best), Some(worst)) = (by_weighted.first(), by_weighted.last()) {
        report.section("BEST vs WORST MODEL");
        model_summary(&mut report, "BEST MODEL", best);
        model_summary(&mut report, "WORST MODEL", worst);

        report.line("PERFORMANCE GAP:");
        report.line(format!(
            "   Exact match: {:.2}%",
            best.exact_accuracy - worst.exact_accuracy
        ));
        report.line(format!("   MAE: {:.3} notes", worst.mae - best.mae));
        report.line(format!(
            "   Weighted accuracy: {:.2}%",
            best.weighted_accuracy - worst.weighted_accuracy
        ));
        report.line(format!(
            "   Zero-note extractions: {} times",
            worst.zero_note_count as i64 - best.zero_note_count as i64
        ));
        report.blank();

        report.section("CONCLUSIONS");
        report.paragraph(&[
            "1. WHICH METRIC?",
            "   EXACT MATCH for a plain right/wrong rate",
            "   MAE for the typical size of an error",
            "   RMSE to expose occasional large errors",
            "   WEIGHTED ACCURACY to balance correctness against error distance",
        ]);
        report.line("2. MODEL CHOICE");
        report.line(format!("   By weighted accuracy: {}", best.model));
        report.line(format!(
            "   Zero-note extractions: {} times (worst model: {})",
            best.zero_note_count, worst.zero_note_count
        ));
        report.blank();
    }

    report.line("=".repeat(WIDTH));
    report.line(format!("Report generated: {}", generated_at));
    report.line("=".repeat(WIDTH));

    report.finish()
}

#[derive(Debug, Serialize)]
pub struct JsonReport {
    pub summary: JsonSummary,
    pub models: JsonModels,
}

/// Per-model entries keyed by name, serialized as a JSON object in sheet column order.
#[derive(Debug, Default)]
pub struct JsonModels(Vec<(String, JsonModel)>);

impl JsonModels {
    /// Adds a model. A name seen before replaces the earlier entry in place.
    pub fn insert(&mut self, name: String, model: JsonModel) {
        match self.0.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, entry)) => *entry = model,
            None => self.0.push((name, model)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&JsonModel> {
        self.0
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, model)| model)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for JsonModels {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(name, model)| (name, model)))
    }
}

#[derive(Debug, Serialize)]
pub struct JsonSummary {
    pub total_reviews: usize,
    pub total_models: usize,
    pub new_rule: &'static str,
    pub metrics: BTreeMap<&'static str, &'static str>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct JsonModel {
    pub exact_match_accuracy: f64,
    pub exact_matches: usize,
    pub mae: f64,
    pub rmse: f64,
    pub weighted_accuracy: f64,
    pub zero_note_count: usize,
    pub error_distribution: ErrorDistribution,
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Machine-readable report: percentages rounded to 2 places, errors to 3.
pub fn json_report(metrics: &[ModelMetrics], total_reviews: usize) -> JsonReport {
    let descriptions = BTreeMap::from([
        ("exact_match", "Binary accuracy (correct/incorrect)"),
        ("mae", "Mean Absolute Error (lower is better)"),
        ("rmse", "Root Mean Square Error (lower is better)"),
        (
            "weighted_accuracy",
            "Weighted score with zero-note penalty (higher is better)",
        ),
    ]);

    let mut models = JsonModels::default();
    for m in metrics {
        models.insert(
            m.model.clone(),
            JsonModel {
                exact_match_accuracy: round_to(m.exact_accuracy, 2),
                exact_matches: m.exact_matches,
                mae: round_to(m.mae, 3),
                rmse: round_to(m.rmse, 3),
                weighted_accuracy: round_to(m.weighted_accuracy, 2),
                zero_note_count: m.zero_note_count,
                error_distribution: m.error_distribution,
            },
        );
    }

    JsonReport {
        summary: JsonSummary {
            total_reviews,
            total_models: models.len(),
            new_rule: ZERO_RULE,
            metrics: descriptions,
        },
        models,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::metrics::evaluate_model;

    fn sample() -> Vec<ModelMetrics> {
        let real = [2, 3, 1];
        vec![
            evaluate_model("weak", &real, &[0, 0, 1]),
            evaluate_model("strong", &real, &[2, 3, 2]),
        ]
    }

    #[test]
    fn test_text_report_rankings() {
        let report = text_report(&sample(), "2024-11-23");

        let weighted = report
            .find(ranking_title(Ranking::Weighted))
            .expect("weighted ranking present");
        let ranked: Vec<&str> = report[weighted..]
            .lines()
            .filter(|line| line.starts_with('🥇') || line.starts_with('🥈'))
            .take(2)
            .collect();
        assert!(ranked[0].starts_with("🥇") && ranked[0].contains("strong"));
        assert!(ranked[1].starts_with("🥈") && ranked[1].contains("weak"));

        assert!(report.contains("BEST MODEL: strong"));
        assert!(report.contains("WORST MODEL: weak"));
        assert!(report.contains("2/3"));
        assert!(report.ends_with(&"=".repeat(WIDTH)));
        assert!(report.contains("Report generated: 2024-11-23"));
    }

    #[test]
    fn test_text_report_without_models() {
        let report = text_report(&[], "today");
        assert!(report.contains("RANKINGS"));
        assert!(!report.contains("BEST MODEL"));
    }

    #[test]
    fn test_json_report() {
        let report = json_report(&sample(), 3);
        assert_eq!(report.summary.total_reviews, 3);
        assert_eq!(report.summary.total_models, 2);

        let strong = report.models.get("strong").unwrap();
        assert_eq!(strong.exact_matches, 2);
        assert_eq!(strong.exact_match_accuracy, 66.67);
        assert_eq!(strong.mae, 0.333);
        assert_eq!(strong.rmse, 0.577);
        // 100 + 100 + 75 of 300
        assert_eq!(strong.weighted_accuracy, 91.67);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["models"]["weak"]["zero_note_count"], 2);
        assert_eq!(json["models"]["weak"]["error_distribution"]["0_errors"], 1);
        assert_eq!(json["models"]["weak"]["error_distribution"]["2_errors"], 1);
        assert_eq!(json["models"]["weak"]["error_distribution"]["3_errors"], 1);
        assert_eq!(json["summary"]["new_rule"], ZERO_RULE);
    }

    #[test]
    fn test_json_report_keeps_column_order() {
        let real = [1, 1];
        let metrics = vec![
            evaluate_model("zeta", &real, &[1, 1]),
            evaluate_model("alpha", &real, &[0, 0]),
            evaluate_model("zeta", &real, &[1, 0]),
        ];
        let report = json_report(&metrics, 2);

        assert_eq!(report.models.names().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
        assert_eq!(report.summary.total_models, report.models.len());
        assert_eq!(report.models.get("zeta").unwrap().exact_matches, 1);

        let json = serde_json::to_string(&report.models).unwrap();
        assert!(json.find("\"zeta\"").unwrap() < json.find("\"alpha\"").unwrap());
    }

    #[test]
    fn test_medal() {
        assert_eq!(medal(1), "🥇");
        assert_eq!(medal(4), "4.");
    }
}
