pub mod api;
pub mod render;

use crate::environment::Config;
use crate::LLMParams;

pub use api::{app_api_loop, build_analysis_response, router, AnalyzeResponse};

/// Shared state handed to every request handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Config,
    /// `None` when no LLM client could be configured at startup.
    pub llm_params: Option<LLMParams>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let llm_params = config.llm_params();
        Self { config, llm_params }
    }
}
