use eframe::egui;
use parking_lot::Mutex;
use std::sync::Arc;

mod config_store;
mod selector;
mod session;
mod state;
mod types;
mod widgets;

use session::{Role, SessionState};
use shared::catalog;
use types::AppState;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 700.0])
            .with_min_inner_size([640.0, 480.0]),
        vsync: true,
        ..Default::default()
    };
    eframe::run_native(
        "Mentat",
        options,
        Box::new(|_cc| {
            Box::new(MentatApp {
                state: Arc::new(Mutex::new(AppState::default())),
            })
        }),
    )
}

struct MentatApp {
    state: Arc<Mutex<AppState>>,
}

fn state_badge(state: SessionState) -> egui::RichText {
    let (text, color) = match state {
        SessionState::Unstarted => ("not started", egui::Color32::from_rgb(140, 140, 150)),
        SessionState::Starting => ("starting…", egui::Color32::from_rgb(200, 160, 60)),
        SessionState::Ready => ("ready", egui::Color32::from_rgb(100, 170, 100)),
        SessionState::Failed => ("failed", egui::Color32::from_rgb(200, 90, 90)),
    };
    egui::RichText::new(text).size(12.0).color(color)
}

fn role_color(role: Role) -> egui::Color32 {
    match role {
        Role::User => egui::Color32::from_rgb(100, 150, 220),
        Role::Mentat => egui::Color32::from_rgb(120, 190, 120),
    }
}

impl eframe::App for MentatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut s = self.state.lock();

        // Poll background work (non-blocking) and keep repainting while
        // anything is in flight.
        s.poll_startup();
        s.poll_reply();
        if s.has_work_in_flight() {
            ctx.request_repaint();
        }

        // Target selector and session controls.
        egui::TopBottomPanel::top("selector").show(ctx, |ui| {
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.heading(egui::RichText::new("Mentat").size(20.0));
                ui.separator();
                ui.label(s.selection_label.clone());
            });
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                if ui.button("Browse Files…").clicked() {
                    s.select_files();
                }
                if ui.button("Browse Folder…").clicked() {
                    s.select_folder();
                }
                let can_run = s.session.can_run();
                if ui
                    .add_enabled(can_run, egui::Button::new("Run Mentat"))
                    .on_hover_text("Start a session on the selected target")
                    .clicked()
                {
                    s.run_mentat();
                }
                if s.session.state() == SessionState::Starting {
                    ui.spinner();
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Settings").clicked() {
                        s.open_settings();
                    }
                    ui.label(format!(
                        "{} · {}",
                        s.provider_config.provider, s.provider_config.model
                    ));
                    ui.label(state_badge(s.session.state()));
                });
            });
            ui.add_space(8.0);
        });

        // Message input.
        egui::TopBottomPanel::bottom("input").show(ctx, |ui| {
            ui.add_space(6.0);
            if let Some(hint) = s.send_hint.clone() {
                ui.label(
                    egui::RichText::new(hint)
                        .size(12.0)
                        .color(egui::Color32::from_rgb(200, 140, 60)),
                );
            }
            let can_send = s.session.can_send();
            ui.horizontal(|ui| {
                let field = ui.add_enabled(
                    can_send,
                    egui::TextEdit::singleline(&mut s.input_text)
                        .hint_text("Type a message…")
                        .desired_width(ui.available_width() - 80.0),
                );
                let submitted =
                    field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                let clicked = ui.add_enabled(can_send, egui::Button::new("Send")).clicked();
                if can_send && (submitted || clicked) {
                    s.send_message();
                    field.request_focus();
                }
                if s.session.is_busy() {
                    ui.spinner();
                }
            });
            ui.add_space(6.0);
        });

        // Conversation log.
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    if s.session.log().is_empty() {
                        ui.add_space(12.0);
                        ui.weak("Select a file or directory, run Mentat, then start chatting.");
                    }
                    for entry in s.session.log().entries() {
                        match entry.role {
                            Some(role) => {
                                ui.horizontal_wrapped(|ui| {
                                    ui.weak(
                                        egui::RichText::new(entry.timestamp.clone()).size(10.0),
                                    );
                                    ui.label(
                                        egui::RichText::new(format!("{}:", role.as_str()))
                                            .strong()
                                            .color(role_color(role)),
                                    );
                                    ui.label(entry.text.clone());
                                });
                            }
                            None => {
                                ui.label(
                                    egui::RichText::new(entry.text.clone())
                                        .italics()
                                        .color(egui::Color32::from_rgb(150, 150, 160)),
                                );
                            }
                        }
                        ui.add_space(4.0);
                    }
                });
        });

        // Settings dialog.
        if s.show_settings_dialog {
            let mut open = true;
            egui::Window::new("Settings")
                .open(&mut open)
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label("Provider");
                    let previous_provider = s.settings_provider_input.clone();
                    egui::ComboBox::from_id_source("settings_provider")
                        .selected_text(if s.settings_provider_input.is_empty() {
                            "choose…".to_string()
                        } else {
                            s.settings_provider_input.clone()
                        })
                        .show_ui(ui, |ui| {
                            for name in catalog::provider_names() {
                                ui.selectable_value(
                                    &mut s.settings_provider_input,
                                    name.to_string(),
                                    name,
                                );
                            }
                        });
                    if s.settings_provider_input != previous_provider {
                        s.settings_provider_changed();
                    }

                    ui.add_space(6.0);
                    ui.label("Model");
                    let models =
                        catalog::models_for(&s.settings_provider_input).unwrap_or_default();
                    egui::ComboBox::from_id_source("settings_model")
                        .selected_text(s.settings_model_input.clone())
                        .show_ui(ui, |ui| {
                            for model in models {
                                ui.selectable_value(
                                    &mut s.settings_model_input,
                                    model.to_string(),
                                    *model,
                                );
                            }
                        });

                    ui.add_space(6.0);
                    ui.label("API key");
                    ui.add(
                        egui::TextEdit::singleline(&mut s.settings_api_key_input)
                            .password(true)
                            .desired_width(260.0),
                    );

                    ui.add_space(10.0);
                    ui.horizontal(|ui| {
                        if ui.button("Save").clicked() {
                            s.save_settings();
                        }
                        if let Some(status) = s.settings_status.clone() {
                            let color = if s.settings_status_is_error {
                                egui::Color32::from_rgb(200, 90, 90)
                            } else {
                                egui::Color32::from_rgb(100, 170, 100)
                            };
                            ui.label(egui::RichText::new(status).size(12.0).color(color));
                        }
                    });
                });
            if !open {
                s.show_settings_dialog = false;
            }
        }
    }
}
