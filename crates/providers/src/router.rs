use crate::anthropic::AnthropicClient;
use crate::azure::AzureClient;
use crate::openai::OpenAIClient;
use anyhow::{anyhow, Result};
use shared::agent_api::ChatMessage;
use shared::settings::ProviderConfig;

/// Dispatches chat completions to the vendor named by the active
/// [`ProviderConfig`]. Exactly one provider serves a session; there is no
/// fallback chain.
pub struct ProviderRouter {
    config: ProviderConfig,
}

impl ProviderRouter {
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }

    pub fn provider(&self) -> &str {
        &self.config.provider
    }

    pub async fn generate(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let api_key = self
            .config
            .resolved_api_key()
            .ok_or_else(|| anyhow!("{} not set", self.config.api_key_var()))?;

        tracing::debug!(
            provider = %self.config.provider,
            model = %self.config.model,
            "dispatching chat completion"
        );

        match self.config.provider.as_str() {
            "openai" => {
                let client = OpenAIClient::new(&self.config.model, &api_key);
                client.generate(messages).await
            }
            "anthropic" => {
                let client = AnthropicClient::new(&self.config.model, &api_key);
                client.generate(messages).await
            }
            "azure" => {
                let client = AzureClient::new(&self.config.model, &api_key)?;
                client.generate(messages).await
            }
            other => Err(anyhow!("Unknown provider: {}", other)),
        }
    }
}
