use anyhow::{anyhow, Result};
use async_openai::types::{
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use ollama_rs::generation::completion::request::GenerationRequest;
use ollama_rs::generation::options::GenerationOptions;
use std::time::Duration;
use tokio::time::sleep;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::{LLMClient, LLMParams, TARGET_LLM_REQUEST};

const MAX_RETRIES: u32 = 3;

/// Sends a system + user prompt pair to the configured model, retrying with exponential
/// backoff. Returns `None` once every attempt has failed or timed out.
pub async fn generate_llm_response(
    system_prompt: &str,
    user_prompt: &str,
    params: &LLMParams,
) -> Option<String> {
    let mut response_text = String::new();
    let mut backoff = 2;

    debug!(target: TARGET_LLM_REQUEST, "Starting LLM response generation with model {} for prompt: {}", params.model, user_prompt);

    for retry_count in 0..MAX_RETRIES {
        match timeout(
            Duration::from_secs(params.timeout_secs),
            request_completion(system_prompt, user_prompt, params),
        )
        .await
        {
            Ok(Ok(response)) => {
                response_text = response;
                debug!(target: TARGET_LLM_REQUEST, "LLM response received: {}", response_text);
                break;
            }
            Ok(Err(e)) => {
                warn!(target: TARGET_LLM_REQUEST, "Error generating response: {}", e);
                if retry_count < MAX_RETRIES - 1 {
                    info!(target: TARGET_LLM_REQUEST, "Retrying LLM request... ({}/{})", retry_count + 1, MAX_RETRIES);
                } else {
                    error!(target: TARGET_LLM_REQUEST, "Failed to generate response after {} retries", MAX_RETRIES);
                }
            }
            Err(_) => {
                warn!(target: TARGET_LLM_REQUEST, "LLM request timed out after {}s", params.timeout_secs);
                if retry_count < MAX_RETRIES - 1 {
                    info!(target: TARGET_LLM_REQUEST, "Retrying LLM request... ({}/{})", retry_count + 1, MAX_RETRIES);
                } else {
                    error!(target: TARGET_LLM_REQUEST, "Failed to generate response after {} retries due to timeouts", MAX_RETRIES);
                }
            }
        }

        if retry_count < MAX_RETRIES - 1 {
            debug!(target: TARGET_LLM_REQUEST, "Backing off for {} seconds before retry", backoff);
            sleep(Duration::from_secs(backoff)).await;
            backoff *= 2;
        }
    }

    if response_text.is_empty() {
        error!(target: TARGET_LLM_REQUEST, "No response generated after all retries");
        None
    } else {
        Some(response_text)
    }
}

async fn request_completion(
    system_prompt: &str,
    user_prompt: &str,
    params: &LLMParams,
) -> Result<String> {
    match &params.llm_client {
        LLMClient::OpenAI(client) => {
            let request = CreateChatCompletionRequestArgs::default()
                .model(params.model.as_str())
                .messages(vec![
                    ChatCompletionRequestSystemMessageArgs::default()
                        .content(system_prompt)
                        .build()?
                        .into(),
                    ChatCompletionRequestUserMessageArgs::default()
                        .content(user_prompt)
                        .build()?
                        .into(),
                ])
                .temperature(params.temperature)
                .max_completion_tokens(params.max_tokens)
                .build()?;

            let response = client.chat().create(request).await?;
            response
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
                .map(|content| content.trim().to_string())
                .filter(|content| !content.is_empty())
                .ok_or_else(|| anyhow!("chat completion returned no content"))
        }
        LLMClient::Ollama(ollama) => {
            let mut request =
                GenerationRequest::new(params.model.clone(), user_prompt.to_string());
            request.system = Some(system_prompt.to_string().into());
            request.options = Some(
                GenerationOptions::default()
                    .temperature(params.temperature)
                    .num_predict(params.max_tokens as i32),
            );

            let response = ollama.generate(request).await?;
            let content = response.response.trim().to_string();
            if content.is_empty() {
                return Err(anyhow!("ollama returned an empty response"));
            }
            Ok(content)
        }
    }
}
