use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use colored::Colorize;
use scentmatch::evaluation::report::medal;
use scentmatch::evaluation::{
    evaluate_sheet, json_report, read_sheet, text_report, Ranking, REAL_NOTES_HEADER,
};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Scores each model's extracted note counts against the human-labelled counts.
///
/// The input is a CSV export of the evaluation sheet: a `Real Notes Count` column followed
/// by one column of predicted counts per model.
#[derive(Parser, Debug)]
#[clap(about = "Compare note-extraction models against labelled note counts")]
struct Args {
    /// CSV export of the evaluation sheet
    #[clap(default_value = "models_note_count.csv")]
    input: PathBuf,

    /// Where to write the human-readable report
    #[clap(long, default_value = "model_accuracy_report_with_zero_rule.txt")]
    report_txt: PathBuf,

    /// Where to write the JSON report
    #[clap(long, default_value = "model_accuracy_report_with_zero_rule.json")]
    report_json: PathBuf,
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set default subscriber");

    let args = Args::parse();

    info!("Reading evaluation sheet {}", args.input.display());
    let sheet = read_sheet(&args.input)?;
    if sheet.models.is_empty() {
        warn!("No model columns found after '{}'", REAL_NOTES_HEADER);
    }
    info!(
        "{} reviews, {} models",
        sheet.row_count(),
        sheet.models.len()
    );

    let metrics = evaluate_sheet(&sheet);

    for m in &metrics {
        println!("{}", m.model.bold());
        println!(
            "  Exact match: {}/{} ({:.2}%)",
            m.exact_matches, m.total_count, m.exact_accuracy
        );
        println!("  MAE: {:.3}  RMSE: {:.3}", m.mae, m.rmse);
        println!(
            "  Weighted accuracy: {}",
            format!("{:.2}%", m.weighted_accuracy).green()
        );
        let zero = format!("{} times", m.zero_note_count);
        if m.zero_note_count > 0 {
            println!("  Zero-note extractions: {}", zero.red());
        } else {
            println!("  Zero-note extractions: {}", zero);
        }
        println!("  Errors 0|1|2|3|4+: {}", m.error_distribution.compact());
    }

    let generated_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    fs::write(&args.report_txt, text_report(&metrics, &generated_at))
        .with_context(|| format!("Failed to write {}", args.report_txt.display()))?;

    let json = serde_json::to_string_pretty(&json_report(&metrics, sheet.row_count()))
        .context("Failed to serialize JSON report")?;
    fs::write(&args.report_json, json)
        .with_context(|| format!("Failed to write {}", args.report_json.display()))?;

    println!();
    println!("{}", "FINAL RANKING (weighted accuracy, 0 notes = 0 points)".bold());
    for (i, m) in Ranking::Weighted.rank(&metrics).into_iter().enumerate() {
        println!(
            "{:<6} {:<30} {:>7.2}%  (zero-note: {})",
            medal(i + 1),
            m.model,
            m.weighted_accuracy,
            m.zero_note_count
        );
    }

    println!();
    println!(
        "{}: {}",
        "Text report".bright_blue(),
        args.report_txt.display()
    );
    println!(
        "{}: {}",
        "JSON report".bright_blue(),
        args.report_json.display()
    );

    Ok(())
}
