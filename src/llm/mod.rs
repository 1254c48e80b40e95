//! LLM integration for Orchestra Search.
//!
//! The model is an opaque text-in, text-out dependency behind the
//! `LlmProvider` trait. rig-core handles the HTTP transport and `RigAdapter`
//! bridges rig's `CompletionModel` to `LlmProvider`. Tests substitute
//! scripted providers.

pub mod provider;
mod rig_adapter;

pub use provider::*;
pub use rig_adapter::RigAdapter;

use std::sync::Arc;

use rig::client::CompletionClient;
use secrecy::ExposeSecret;

use crate::config::AppConfig;
use crate::error::LlmError;

/// Create the LLM provider described by the application config.
///
/// Uses the chat completions endpoint under `config.base_url`.
pub fn create_provider(config: &AppConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    use rig::providers::openai;

    let client: rig::client::Client<openai::client::OpenAIResponsesExt> =
        openai::Client::builder()
            .api_key(config.api_key.expose_secret())
            .base_url(&config.base_url)
            .build()
            .map_err(|e| LlmError::RequestFailed {
                provider: "openai".to_string(),
                reason: format!("Failed to create OpenAI client: {}", e),
            })?;

    let model = client.completions_api().completion_model(&config.model);
    tracing::info!("Using OpenAI (model: {})", config.model);
    Ok(Arc::new(RigAdapter::new(model, &config.model, "openai")))
}
