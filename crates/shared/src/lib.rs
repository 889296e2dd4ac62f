pub mod catalog;

pub mod settings {
    use serde::{Deserialize, Serialize};

    /// The active (provider, model, key) triple selecting an LLM backend.
    ///
    /// At most one is active at a time; it is replaced wholesale when the
    /// user saves the settings dialog.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ProviderConfig {
        pub provider: String,
        pub model: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub api_key: Option<String>,
    }

    impl Default for ProviderConfig {
        fn default() -> Self {
            Self {
                provider: "openai".into(),
                model: "gpt-4-turbo-preview".into(),
                api_key: None,
            }
        }
    }

    impl ProviderConfig {
        /// Environment variable holding the provider's secret when no key is
        /// configured directly, e.g. `OPENAI_API_KEY`.
        pub fn api_key_var(&self) -> String {
            format!("{}_API_KEY", self.provider.to_uppercase())
        }

        /// Configured key, falling back to the provider's environment variable.
        pub fn resolved_api_key(&self) -> Option<String> {
            self.api_key
                .clone()
                .filter(|k| !k.trim().is_empty())
                .or_else(|| std::env::var(self.api_key_var()).ok())
        }
    }

}

pub mod agent_api {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ChatMessage {
        pub role: String, // "system" | "user" | "assistant"
        pub content: String,
    }

    impl ChatMessage {
        pub fn system(content: impl Into<String>) -> Self {
            Self {
                role: "system".into(),
                content: content.into(),
            }
        }

        pub fn user(content: impl Into<String>) -> Self {
            Self {
                role: "user".into(),
                content: content.into(),
            }
        }

        pub fn assistant(content: impl Into<String>) -> Self {
            Self {
                role: "assistant".into(),
                content: content.into(),
            }
        }
    }
}
