//! Thin assistant-client for the Mentat interface.
//!
//! The GUI talks to the backend exclusively through the [`AssistantClient`]
//! trait: one async startup step, then one "submit message, await answer"
//! operation per exchange. [`MentatClient`] is the production
//! implementation; it binds a working directory, a set of target paths and
//! a provider configuration, builds the code context at startup, and routes
//! each exchange through the configured vendor.

mod context;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use providers::router::ProviderRouter;
use shared::agent_api::ChatMessage;
use shared::catalog;
use shared::settings::ProviderConfig;
use std::path::PathBuf;

/// The opaque collaborator the session orchestrator drives. Usable only
/// after `startup` has completed successfully.
#[async_trait]
pub trait AssistantClient: Send + Sync + std::fmt::Debug {
    async fn startup(&self) -> Result<()>;
    async fn call(&self, message: &str) -> Result<String>;
}

struct ClientState {
    /// Set once startup has built the code context.
    system_prompt: Option<String>,
    history: Vec<ChatMessage>,
}

pub struct MentatClient {
    cwd: PathBuf,
    paths: Vec<PathBuf>,
    router: ProviderRouter,
    state: Mutex<ClientState>,
}

impl std::fmt::Debug for MentatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MentatClient")
            .field("cwd", &self.cwd)
            .field("paths", &self.paths)
            .finish_non_exhaustive()
    }
}

impl MentatClient {
    /// Binds a client to a workspace and provider. Validation failures here
    /// are startup errors for the session attempt: the working directory
    /// and every target path must exist, the (provider, model) pair must be
    /// permitted by the catalog, and an API key must be resolvable.
    pub fn new(cwd: PathBuf, paths: Vec<PathBuf>, config: ProviderConfig) -> Result<Self> {
        if !cwd.is_dir() {
            bail!("working directory {} does not exist", cwd.display());
        }
        if paths.is_empty() {
            bail!("no target paths given");
        }
        for p in &paths {
            if !p.exists() {
                bail!("target path {} does not exist", p.display());
            }
        }
        if !catalog::is_allowed(&config.provider, &config.model) {
            bail!(
                "model {} is not available for provider {}",
                config.model,
                config.provider
            );
        }
        if config.resolved_api_key().is_none() {
            bail!("{} not set", config.api_key_var());
        }

        Ok(Self {
            cwd,
            paths,
            router: ProviderRouter::new(config),
            state: Mutex::new(ClientState {
                system_prompt: None,
                history: Vec::new(),
            }),
        })
    }
}

#[async_trait]
impl AssistantClient for MentatClient {
    async fn startup(&self) -> Result<()> {
        let prompt = context::build_system_prompt(&self.cwd, &self.paths)?;
        tracing::debug!(
            provider = self.router.provider(),
            targets = self.paths.len(),
            "assistant client started"
        );
        let mut state = self.state.lock();
        state.system_prompt = Some(prompt);
        state.history.clear();
        Ok(())
    }

    async fn call(&self, message: &str) -> Result<String> {
        let messages = {
            let mut state = self.state.lock();
            let system = state
                .system_prompt
                .clone()
                .ok_or_else(|| anyhow!("assistant client has not been started"))?;
            state.history.push(ChatMessage::user(message));

            let mut msgs = Vec::with_capacity(state.history.len() + 1);
            msgs.push(ChatMessage::system(system));
            msgs.extend(state.history.iter().cloned());
            msgs
        };

        match self.router.generate(messages).await {
            Ok(answer) => {
                self.state
                    .lock()
                    .history
                    .push(ChatMessage::assistant(answer.as_str()));
                Ok(answer)
            }
            Err(e) => {
                // Keep the history consistent with what the backend saw.
                self.state.lock().history.pop();
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn config() -> ProviderConfig {
        ProviderConfig {
            provider: "openai".into(),
            model: "gpt-4-turbo-preview".into(),
            api_key: Some("sk-test".into()),
        }
    }

    #[test]
    fn rejects_missing_working_directory() {
        let tmp = tempdir().unwrap();
        let gone = tmp.path().join("nope");
        let err = MentatClient::new(gone.clone(), vec![gone], config()).unwrap_err();
        assert!(err.to_string().contains("working directory"));
    }

    #[test]
    fn rejects_missing_target_path() {
        let tmp = tempdir().unwrap();
        let missing = tmp.path().join("ghost.rs");
        let err =
            MentatClient::new(tmp.path().to_path_buf(), vec![missing], config()).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn rejects_model_outside_catalog() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("main.rs");
        fs::write(&file, "fn main() {}").unwrap();

        let mut cfg = config();
        cfg.model = "claude-v1".into();
        let err = MentatClient::new(tmp.path().to_path_buf(), vec![file], cfg).unwrap_err();
        assert!(err.to_string().contains("not available"));
    }

    #[tokio::test]
    async fn call_before_startup_is_an_error() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("main.rs");
        fs::write(&file, "fn main() {}").unwrap();

        let client = MentatClient::new(tmp.path().to_path_buf(), vec![file], config()).unwrap();
        let err = client.call("hello").await.unwrap_err();
        assert!(err.to_string().contains("not been started"));
    }

    #[tokio::test]
    async fn startup_builds_the_code_context() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("main.rs");
        fs::write(&file, "fn main() { println!(\"hi\"); }").unwrap();

        let client = MentatClient::new(tmp.path().to_path_buf(), vec![file], config()).unwrap();
        client.startup().await.unwrap();

        let state = client.state.lock();
        let prompt = state.system_prompt.as_deref().unwrap();
        assert!(prompt.contains("main.rs"));
        assert!(prompt.contains("println!"));
    }
}
