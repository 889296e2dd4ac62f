//! Persistence for the provider configuration.
//!
//! Everything lives under the user-level `~/.mentat` directory:
//! - `.env`: `<PROVIDER>_API_KEY=...` lines, shared with the assistant
//!   backend's own tooling; saving upserts the active provider's line and
//!   preserves everything else in the file.
//! - `configs.json`: the `{provider, model, api_key}` triple used to
//!   restore the settings dialog on launch.
//! - `.mentat_config.json`: the `{model}` document the assistant client
//!   reads for its own configuration.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use shared::settings::ProviderConfig;
use std::fs;
use std::path::{Path, PathBuf};

const ENV_FILE: &str = ".env";
const UI_CONFIG_FILE: &str = "configs.json";
const CLIENT_CONFIG_FILE: &str = ".mentat_config.json";

#[derive(Debug, Serialize, Deserialize)]
struct ClientConfig {
    model: String,
}

pub struct ConfigStore {
    root: PathBuf,
}

impl Default for ConfigStore {
    fn default() -> Self {
        let root = dirs::home_dir()
            .map(|home| home.join(".mentat"))
            .unwrap_or_else(|| PathBuf::from(".mentat"));
        Self { root }
    }
}

impl ConfigStore {
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn env_path(&self) -> PathBuf {
        self.root.join(ENV_FILE)
    }

    fn ui_config_path(&self) -> PathBuf {
        self.root.join(UI_CONFIG_FILE)
    }

    fn client_config_path(&self) -> PathBuf {
        self.root.join(CLIENT_CONFIG_FILE)
    }

    /// Restores the previously saved provider configuration, if any.
    pub fn load(&self) -> Option<ProviderConfig> {
        let contents = fs::read_to_string(self.ui_config_path()).ok()?;
        match serde_json::from_str(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::error!("ignoring unreadable {}: {e}", UI_CONFIG_FILE);
                None
            }
        }
    }

    /// Writes all three artifacts for the given configuration. A blank
    /// provider is rejected up front so no partial write ever happens.
    pub fn save(&self, config: &ProviderConfig) -> Result<()> {
        if config.provider.trim().is_empty() {
            bail!("no provider selected");
        }

        fs::create_dir_all(&self.root)
            .with_context(|| format!("creating {}", self.root.display()))?;

        if let Some(key) = config.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            let existing = fs::read_to_string(self.env_path()).unwrap_or_default();
            let updated = upsert_env_line(&existing, &config.api_key_var(), key.trim());
            fs::write(self.env_path(), updated)
                .with_context(|| format!("writing {}", ENV_FILE))?;
        }

        let ui_json = serde_json::to_string_pretty(config)?;
        fs::write(self.ui_config_path(), ui_json)
            .with_context(|| format!("writing {}", UI_CONFIG_FILE))?;

        let client_json = serde_json::to_string_pretty(&ClientConfig {
            model: config.model.clone(),
        })?;
        fs::write(self.client_config_path(), client_json)
            .with_context(|| format!("writing {}", CLIENT_CONFIG_FILE))?;

        Ok(())
    }

    /// Exports the env file into the process environment so provider
    /// clients can fall back to `<PROVIDER>_API_KEY` variables. Variables
    /// already set in the environment win.
    pub fn apply_env(&self) {
        let Ok(contents) = fs::read_to_string(self.env_path()) else {
            return;
        };
        for (key, value) in parse_env(&contents) {
            if std::env::var_os(&key).is_none() {
                std::env::set_var(&key, &value);
            }
        }
    }
}

fn parse_env(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let (key, value) = line.split_once('=')?;
            Some((key.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Replaces the `key=` line in place, or appends one, leaving unrelated
/// lines (including comments) exactly as they were.
fn upsert_env_line(existing: &str, key: &str, value: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut replaced = false;
    for line in existing.lines() {
        let is_target = line
            .split_once('=')
            .is_some_and(|(k, _)| k.trim() == key);
        if is_target {
            lines.push(format!("{key}={value}"));
            replaced = true;
        } else {
            lines.push(line.to_string());
        }
    }
    if !replaced {
        lines.push(format!("{key}={value}"));
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config(key: Option<&str>) -> ProviderConfig {
        ProviderConfig {
            provider: "openai".into(),
            model: "gpt-4-turbo-preview".into(),
            api_key: key.map(str::to_string),
        }
    }

    #[test]
    fn blank_provider_is_rejected_with_no_writes() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("mentat");
        let store = ConfigStore::with_root(root.clone());

        let mut cfg = config(Some("sk-test"));
        cfg.provider = "  ".into();
        assert!(store.save(&cfg).is_err());
        assert!(!root.exists(), "no partial write may occur");
    }

    #[test]
    fn save_writes_all_three_artifacts_consistently() {
        let tmp = tempdir().unwrap();
        let store = ConfigStore::with_root(tmp.path().join("mentat"));

        store.save(&config(Some("sk-test"))).unwrap();

        let env = fs::read_to_string(store.env_path()).unwrap();
        assert!(env.contains("OPENAI_API_KEY=sk-test"));

        let ui: ProviderConfig =
            serde_json::from_str(&fs::read_to_string(store.ui_config_path()).unwrap()).unwrap();
        assert_eq!(ui, config(Some("sk-test")));

        let client: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.client_config_path()).unwrap())
                .unwrap();
        assert_eq!(client["model"], "gpt-4-turbo-preview");
    }

    #[test]
    fn load_restores_what_save_wrote() {
        let tmp = tempdir().unwrap();
        let store = ConfigStore::with_root(tmp.path().join("mentat"));
        store.save(&config(Some("sk-test"))).unwrap();
        assert_eq!(store.load(), Some(config(Some("sk-test"))));
    }

    #[test]
    fn env_upsert_preserves_unrelated_lines() {
        let existing = "# keys\nANTHROPIC_API_KEY=old-claude\nOPENAI_API_KEY=old-openai\n";
        let updated = upsert_env_line(existing, "OPENAI_API_KEY", "new-openai");
        assert!(updated.contains("# keys"));
        assert!(updated.contains("ANTHROPIC_API_KEY=old-claude"));
        assert!(updated.contains("OPENAI_API_KEY=new-openai"));
        assert!(!updated.contains("old-openai"));
    }

    #[test]
    fn env_upsert_appends_when_key_is_new() {
        let updated = upsert_env_line("AZURE_API_KEY=az\n", "OPENAI_API_KEY", "sk");
        assert!(updated.contains("AZURE_API_KEY=az"));
        assert!(updated.ends_with("OPENAI_API_KEY=sk\n"));
    }

    #[test]
    fn apply_env_sets_missing_variables_only() {
        let tmp = tempdir().unwrap();
        let store = ConfigStore::with_root(tmp.path().to_path_buf());
        fs::write(
            store.env_path(),
            "MENTAT_TEST_FRESH_KEY=from-file\nMENTAT_TEST_TAKEN_KEY=from-file\n",
        )
        .unwrap();

        std::env::remove_var("MENTAT_TEST_FRESH_KEY");
        std::env::set_var("MENTAT_TEST_TAKEN_KEY", "from-env");
        store.apply_env();

        assert_eq!(
            std::env::var("MENTAT_TEST_FRESH_KEY").unwrap(),
            "from-file"
        );
        assert_eq!(std::env::var("MENTAT_TEST_TAKEN_KEY").unwrap(), "from-env");
    }
}
