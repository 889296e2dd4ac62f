use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::agent_api::ChatMessage;
use std::env;
use std::sync::LazyLock;
use std::time::Duration;

static SHARED_HTTP: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(120))
        .pool_max_idle_per_host(2)
        .build()
        .expect("failed to build HTTP client")
});

const API_VERSION: &str = "2023-05-15";

#[derive(Debug, Serialize)]
struct AzureRequest {
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct AzureResponse {
    choices: Vec<AzureChoice>,
}

#[derive(Debug, Deserialize)]
struct AzureChoice {
    message: AzureResponseMessage,
}

#[derive(Debug, Deserialize)]
struct AzureResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Azure OpenAI client. The deployment name doubles as the model name, and
/// the resource endpoint comes from `AZURE_OPENAI_ENDPOINT`.
pub struct AzureClient {
    http: Client,
    auth_token: String,
    deployment: String,
    endpoint: String,
}

impl AzureClient {
    pub fn new(model: &str, api_key: &str) -> Result<Self> {
        let endpoint = env::var("AZURE_OPENAI_ENDPOINT")
            .map_err(|_| anyhow!("AZURE_OPENAI_ENDPOINT not set"))?;
        Ok(Self {
            http: SHARED_HTTP.clone(),
            auth_token: api_key.to_string(),
            deployment: model.to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub async fn generate(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.deployment, API_VERSION
        );
        let req = AzureRequest { messages };
        let resp = self
            .http
            .post(&url)
            .header("api-key", &self.auth_token)
            .header("Content-Type", "application/json")
            .json(&req)
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            let detail: String = body.chars().take(800).collect();
            if detail.trim().is_empty() {
                return Err(anyhow!("azure error: {}", status));
            }
            return Err(anyhow!("azure error: {}\n{}", status, detail));
        }
        let body: AzureResponse = resp.json().await?;
        let text = body
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();
        Ok(text)
    }
}
