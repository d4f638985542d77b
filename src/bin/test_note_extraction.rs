use scentmatch::environment::Config;
use scentmatch::notes::extract_notes;
use std::env;
use tokio::time::Instant;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Runs note extraction once against the configured LLM and prints the result.
///
/// Pass a comment as arguments, or run without arguments to use a built-in sample.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args: Vec<String> = env::args().skip(1).collect();
    let comment = if args.is_empty() {
        "Opens with a burst of bergamot and pink pepper, then settles into rose and jasmine. \
         After an hour it is all warm vanilla and sandalwood with a hint of musk."
            .to_string()
    } else {
        args.join(" ")
    };

    let config = Config::from_env();
    let Some(llm_params) = config.llm_params() else {
        error!("No LLM configured: set LLM_API_KEY (or GROQ_API_KEY), or LLM_TYPE=ollama");
        std::process::exit(1);
    };

    info!(
        "Using model: {} with temperature: {}",
        llm_params.model, llm_params.temperature
    );

    let start_time = Instant::now();
    info!("Starting note extraction...");

    match extract_notes(&comment, &llm_params).await {
        Ok(notes) => {
            info!(
                "Extracted {} notes in {:?}",
                notes.len(),
                start_time.elapsed()
            );
            for (i, note) in notes.iter().enumerate() {
                info!("{}: {}", i + 1, note);
            }
            info!(
                "Full extraction result:\n{}",
                serde_json::to_string_pretty(&serde_json::json!({ "notes": notes }))?
            );
        }
        Err(e) => {
            println!("Failed to extract notes: {:?}", e);
        }
    }

    Ok(())
}
