use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use scentmatch::batch::{
    default_output_file, read_reviews, summarize, write_results, BatchClient, DEFAULT_API_URL,
};
use scentmatch::environment::DEFAULT_MODEL;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Batch analysis tool that replays a file of reviews against a running scentmatch service.
///
/// Every non-empty line of the reviews file is posted to `/analyze_comment`. The extracted
/// notes, suggested perfumes and similarity badges are saved to a JSON file.
///
/// Example:
///    cargo run --bin batch_analyze -- --reviews reviews.txt --model openai/gpt-oss-120b
#[derive(Parser, Debug)]
#[clap(about = "Send every review in a file to the note analysis service")]
struct Args {
    /// Endpoint of a running service
    #[clap(long, default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Reviews file, one comment per line
    #[clap(long, default_value = "reviews.txt")]
    reviews: PathBuf,

    /// Model the service is configured with, used to name the output file
    #[clap(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Output JSON file (default: analysis_results_<model>_<timestamp>.json)
    #[clap(long)]
    output: Option<PathBuf>,

    /// Pause between requests in milliseconds
    #[clap(long, default_value = "500")]
    delay_ms: u64,

    /// How many of the most suggested perfumes to list
    #[clap(long, default_value = "5")]
    top: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set default subscriber");

    let args = Args::parse();

    info!("Reading reviews from {}", args.reviews.display());
    let reviews = read_reviews(&args.reviews)?;
    let total_lines = reviews.last().map_or(0, |(line, _)| *line);
    info!(
        "Found {} reviews, sending to {}",
        reviews.len(),
        args.api_url
    );

    let client = BatchClient::new(&args.api_url)?;
    let results = client
        .process_reviews(&reviews, total_lines, Duration::from_millis(args.delay_ms))
        .await;

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(default_output_file(&args.model)));
    write_results(&output, &results)?;

    let summary = summarize(&results, args.top);
    let failures = results.iter().filter(|r| r.error.is_some()).count();

    println!();
    println!("{}", "=".repeat(60));
    println!("{}", "Batch analysis complete".bold().green());
    println!("{}", "=".repeat(60));
    println!("{}: {}", "Model".bright_blue(), args.model);
    println!("{}: {}", "Reviews processed".bright_blue(), summary.reviews);
    if failures > 0 {
        println!("{}: {}", "Failed requests".bright_blue(), failures.to_string().red());
    }
    println!("{}: {}", "Notes extracted".bright_blue(), summary.total_notes);
    println!(
        "{}: {}",
        "Perfumes suggested".bright_blue(),
        summary.total_perfumes
    );
    println!(
        "{}: {:.2}",
        "Average suggestions per review".bright_blue(),
        summary.average_suggestions
    );

    if !summary.top_perfumes.is_empty() {
        println!();
        println!("{}", "Most suggested perfumes:".bold());
        for (i, (name, count)) in summary.top_perfumes.iter().enumerate() {
            println!("  {:>2}. {} ({} times)", i + 1, name, count);
        }
    }

    println!();
    println!("{}: {}", "Results saved to".bright_blue(), output.display());

    Ok(())
}
