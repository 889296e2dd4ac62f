//! Application state for the Mentat interface.
//!
//! `AppState` owns the target selection, the session orchestrator, the
//! settings dialog state and the channels to in-flight background work.
//! All mutation happens on the UI thread; workers only send outcomes.

use crate::config_store::ConfigStore;
use crate::selector::TargetSelection;
use crate::session::{SendRejection, SessionOrchestrator};
use crate::state;
use crate::widgets::FilePickerWidget;
use client::{AssistantClient, MentatClient};
use shared::catalog;
use shared::settings::ProviderConfig;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;

/// Result of the background startup step.
#[derive(Debug)]
pub struct StartupOutcome {
    pub result: Result<(), String>,
}

/// Result of one background chat exchange; always display text.
#[derive(Debug)]
pub struct ReplyOutcome {
    pub reply: String,
}

pub struct AppState {
    pub provider_config: ProviderConfig,
    pub config_store: ConfigStore,

    pub selection: Option<TargetSelection>,
    pub selection_label: String,
    pub file_picker: FilePickerWidget,

    pub session: SessionOrchestrator,
    pub input_text: String,
    /// Shown under the input row when a send was rejected.
    pub send_hint: Option<String>,

    pub startup_rx: Option<Receiver<StartupOutcome>>,
    pub reply_rx: Option<Receiver<ReplyOutcome>>,

    pub show_settings_dialog: bool,
    pub settings_provider_input: String,
    pub settings_model_input: String,
    pub settings_api_key_input: String,
    pub settings_status: Option<String>,
    pub settings_status_is_error: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_store(ConfigStore::default())
    }
}

impl AppState {
    pub fn with_store(config_store: ConfigStore) -> Self {
        let provider_config = config_store.load().unwrap_or_default();
        Self {
            provider_config,
            config_store,
            selection: None,
            selection_label: "Select a file or directory:".to_string(),
            file_picker: FilePickerWidget::default(),
            session: SessionOrchestrator::default(),
            input_text: String::new(),
            send_hint: None,
            startup_rx: None,
            reply_rx: None,
            show_settings_dialog: false,
            settings_provider_input: String::new(),
            settings_model_input: String::new(),
            settings_api_key_input: String::new(),
            settings_status: None,
            settings_status_is_error: false,
        }
    }

    // ── Target selection ────────────────────────────────────────────────

    pub fn select_files(&mut self) {
        let picked = self.file_picker.pick_files();
        if picked.is_empty() {
            // Cancelled; prior selection stays untouched.
            return;
        }
        self.replace_selection(picked);
    }

    pub fn select_folder(&mut self) {
        let Some(folder) = self.file_picker.pick_folder() else {
            return;
        };
        self.replace_selection(vec![folder]);
    }

    fn replace_selection(&mut self, paths: Vec<std::path::PathBuf>) {
        match TargetSelection::new(paths) {
            Ok(selection) => {
                self.selection_label = selection.describe();
                self.selection = Some(selection);
            }
            Err(e) => {
                tracing::error!("file selection failed: {e}");
                self.selection_label = format!("Error: {e}");
            }
        }
    }

    // ── Session lifecycle ───────────────────────────────────────────────

    pub fn run_mentat(&mut self) {
        if !self.session.can_run() {
            return;
        }
        // Make `<PROVIDER>_API_KEY` fallbacks visible before construction.
        self.config_store.apply_env();

        let config = self.provider_config.clone();
        let started = self
            .session
            .run(self.selection.as_ref(), &config, |selection, config| {
                let client = MentatClient::new(
                    selection.working_dir().to_path_buf(),
                    selection.paths().to_vec(),
                    config.clone(),
                )?;
                Ok(Arc::new(client) as Arc<dyn AssistantClient>)
            });

        if let Some(client) = started {
            let (tx, rx) = channel();
            state::run_session_startup(client, tx);
            self.startup_rx = Some(rx);
        }
    }

    pub fn send_message(&mut self) {
        let text = std::mem::take(&mut self.input_text);
        match self.session.begin_message(&text) {
            Ok((client, message)) => {
                self.send_hint = None;
                let (tx, rx) = channel();
                state::run_chat_exchange(client, message, self.session.request_timeout(), tx);
                self.reply_rx = Some(rx);
            }
            Err(SendRejection::Blank) => {
                self.input_text = text;
            }
            Err(rejection) => {
                self.send_hint = Some(rejection.to_string());
                self.input_text = text;
            }
        }
    }

    // ── Frame polling ───────────────────────────────────────────────────

    pub fn poll_startup(&mut self) {
        let Some(rx) = &self.startup_rx else {
            return;
        };
        match rx.try_recv() {
            Ok(outcome) => {
                self.session.finish_run(outcome.result);
                self.startup_rx = None;
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                self.session
                    .finish_run(Err("startup worker terminated unexpectedly".into()));
                self.startup_rx = None;
            }
        }
    }

    pub fn poll_reply(&mut self) {
        let Some(rx) = &self.reply_rx else {
            return;
        };
        match rx.try_recv() {
            Ok(outcome) => {
                self.session.finish_message(outcome.reply);
                self.reply_rx = None;
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                tracing::error!("request worker terminated unexpectedly");
                self.session
                    .finish_message("Error: request worker terminated unexpectedly".into());
                self.reply_rx = None;
            }
        }
    }

    /// Whether any background work should keep the UI repainting.
    pub fn has_work_in_flight(&self) -> bool {
        self.startup_rx.is_some() || self.reply_rx.is_some()
    }

    // ── Settings dialog ─────────────────────────────────────────────────

    pub fn open_settings(&mut self) {
        self.settings_provider_input = self.provider_config.provider.clone();
        self.settings_model_input = self.provider_config.model.clone();
        self.settings_api_key_input = self.provider_config.api_key.clone().unwrap_or_default();
        self.settings_status = None;
        self.settings_status_is_error = false;
        self.show_settings_dialog = true;
    }

    /// Keeps the model input valid for the chosen provider.
    pub fn settings_provider_changed(&mut self) {
        let models = catalog::models_for(&self.settings_provider_input).unwrap_or_default();
        if !models.contains(&self.settings_model_input.as_str()) {
            self.settings_model_input = catalog::default_model_for(&self.settings_provider_input)
                .unwrap_or_default()
                .to_string();
        }
    }

    pub fn save_settings(&mut self) {
        let provider = self.settings_provider_input.trim();
        if provider.is_empty() {
            self.settings_status = Some("Please choose a provider before saving.".to_string());
            self.settings_status_is_error = true;
            return;
        }

        let api_key = Some(self.settings_api_key_input.trim().to_string())
            .filter(|k| !k.is_empty());
        let config = ProviderConfig {
            provider: provider.to_string(),
            model: self.settings_model_input.clone(),
            api_key,
        };

        match self.config_store.save(&config) {
            Ok(()) => {
                self.provider_config = config;
                self.settings_status = Some("Settings saved.".to_string());
                self.settings_status_is_error = false;
            }
            Err(e) => {
                tracing::error!("failed to save settings: {e}");
                self.settings_status = Some(format!("Error: {e}"));
                self.settings_status_is_error = true;
            }
        }
    }
}
