//! Code-context assembly for the assistant's system prompt.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Per-file cap keeps one giant file from crowding out the rest.
const MAX_FILE_BYTES: u64 = 16 * 1024;
/// Upper bound on the number of files embedded in the prompt.
const MAX_FILES: usize = 50;

const PROMPT_HEADER: &str = r#"You are Mentat, an AI coding assistant working inside a user's project.
You answer questions about the code below, explain it, and propose concrete
edits when asked. Refer to files by their paths as given. When you suggest a
change, show the exact code to add or replace."#;

/// Reads the target files into a system prompt. Directories are walked
/// recursively; unreadable or non-text files are skipped with a log line
/// rather than failing the whole startup.
pub fn build_system_prompt(cwd: &Path, targets: &[PathBuf]) -> Result<String> {
    let mut files: Vec<PathBuf> = Vec::new();
    for target in targets {
        if target.is_dir() {
            for entry in WalkDir::new(target)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                if entry.file_type().is_file() {
                    files.push(entry.into_path());
                }
                if files.len() >= MAX_FILES {
                    break;
                }
            }
        } else {
            files.push(target.clone());
        }
    }
    files.truncate(MAX_FILES);

    let mut prompt = String::from(PROMPT_HEADER);
    prompt.push_str("\n\nProject root: ");
    prompt.push_str(&cwd.display().to_string());
    prompt.push('\n');

    for path in &files {
        let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        if size > MAX_FILE_BYTES {
            tracing::debug!(path = %path.display(), size, "skipping oversized file");
            continue;
        }
        let contents = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "skipping unreadable file");
                continue;
            }
        };
        let display = path.strip_prefix(cwd).unwrap_or(path);
        prompt.push_str(&format!("\n--- {} ---\n{}\n", display.display(), contents));
    }

    Ok(prompt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn embeds_files_with_workspace_relative_paths() {
        let tmp = tempdir().unwrap();
        let sub = tmp.path().join("src");
        fs::create_dir_all(&sub).unwrap();
        fs::write(sub.join("lib.rs"), "pub fn answer() -> u32 { 42 }").unwrap();

        let prompt =
            build_system_prompt(tmp.path(), &[tmp.path().to_path_buf()]).unwrap();
        assert!(prompt.contains("--- src/lib.rs ---"));
        assert!(prompt.contains("answer()"));
    }

    #[test]
    fn oversized_files_are_skipped() {
        let tmp = tempdir().unwrap();
        let big = tmp.path().join("big.txt");
        fs::write(&big, "x".repeat((MAX_FILE_BYTES + 1) as usize)).unwrap();
        let small = tmp.path().join("small.txt");
        fs::write(&small, "tiny").unwrap();

        let prompt = build_system_prompt(tmp.path(), &[big, small]).unwrap();
        assert!(!prompt.contains("big.txt ---"));
        assert!(prompt.contains("--- small.txt ---"));
        assert!(prompt.contains("tiny"));
    }
}
