//! File picker widget using rfd (rust file dialog).
//!
//! Native blocking dialogs for choosing the assistant's target files or
//! folder. Dialog modality already serializes them on the UI thread.

use std::path::PathBuf;

pub struct FilePickerWidget {
    /// Starting directory for the next dialog; updated after each pick.
    start_dir: Option<PathBuf>,
    title: String,
}

impl Default for FilePickerWidget {
    fn default() -> Self {
        Self {
            start_dir: dirs::home_dir(),
            title: "Select a file or directory".to_string(),
        }
    }
}

impl FilePickerWidget {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Opens the multi-file dialog and waits. Empty on cancellation.
    pub fn pick_files(&mut self) -> Vec<PathBuf> {
        let mut dialog = rfd::FileDialog::new().set_title(&self.title);
        if let Some(ref dir) = self.start_dir {
            dialog = dialog.set_directory(dir);
        }
        let picked = dialog.pick_files().unwrap_or_default();
        self.remember(picked.first());
        picked
    }

    /// Opens the folder dialog and waits. `None` on cancellation.
    pub fn pick_folder(&mut self) -> Option<PathBuf> {
        let mut dialog = rfd::FileDialog::new().set_title(&self.title);
        if let Some(ref dir) = self.start_dir {
            dialog = dialog.set_directory(dir);
        }
        let picked = dialog.pick_folder();
        self.remember(picked.as_ref());
        picked
    }

    fn remember(&mut self, picked: Option<&PathBuf>) {
        if let Some(path) = picked {
            self.start_dir = path.parent().map(|p| p.to_path_buf());
        }
    }
}
