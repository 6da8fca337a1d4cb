use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::{generate_id, now_millis, Project};

pub const DEFAULT_WORK_TITLE: &str = "新生成的教学设计";

/// A saved markdown artifact. There is no edit path; saving again creates a
/// new, independent work.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Work {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Work {
    pub fn new(title: &str, content: &str) -> Self {
        let now = now_millis();
        Self {
            id: generate_id(),
            title: title.to_string(),
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// `<title>.md`, with path separators and other characters most
    /// filesystems reject replaced by `_`.
    pub fn export_file_name(&self) -> String {
        let stem: String = self
            .title
            .trim()
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect();
        let stem = if stem.is_empty() { "work".to_string() } else { stem };
        format!("{}.md", stem)
    }

    /// Write the raw markdown to `dir`, returning the file written.
    pub fn export_to(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(self.export_file_name());
        fs::write(&path, &self.content)?;
        info!("📄 Exported work '{}' to {}", self.title, path.display());
        Ok(path)
    }
}

impl Project {
    /// Save `content` verbatim under `title`. A blank title cancels the save.
    pub fn save_work(&mut self, title: &str, content: &str) -> Option<&Work> {
        if title.trim().is_empty() {
            return None;
        }
        self.works.push(Work::new(title.trim(), content));
        self.works.last()
    }

    pub fn delete_work(&mut self, id: &str) -> bool {
        let before = self.works.len();
        self.works.retain(|w| w.id != id);
        self.works.len() != before
    }

    pub fn find_work(&self, id: &str) -> Option<&Work> {
        self.works.iter().find(|w| w.id == id)
    }
}
