use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use super::kv::{KeyValueStore, StorageError};
use crate::config::AppSettings;
use crate::project::{generate_id, Project, ERROR_HINT, UNTITLED_PROJECT_TITLE};

pub const PROJECTS_KEY: &str = "tm_projects";
pub const SETTINGS_KEY: &str = "tm_settings";
/// Where an unreadable project collection is parked before it can be
/// overwritten by the next save.
pub const UNREADABLE_PROJECTS_KEY: &str = "tm_projects.unreadable";

/// Typed access to the two persisted records. Cheap to clone; clones share
/// the same backing store.
#[derive(Clone)]
pub struct Storage {
    kv: Arc<dyn KeyValueStore>,
}

impl Storage {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Load every project. Records are read one at a time: missing fields are
    /// backfilled and a record that still cannot be read is skipped. Whenever
    /// anything is skipped the raw text is parked under
    /// `UNREADABLE_PROJECTS_KEY` before the next save can overwrite it.
    pub fn load_projects(&self) -> Vec<Project> {
        let raw = match self.kv.get(PROJECTS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Failed to read projects: {}", e);
                return Vec::new();
            }
        };

        let (projects, skipped) = match parse_projects(&raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Stored projects are unreadable, starting empty: {}", e);
                (Vec::new(), 1)
            }
        };
        if skipped > 0 {
            if let Err(e) = self.kv.set(UNREADABLE_PROJECTS_KEY, &raw) {
                warn!("Failed to keep a copy of unreadable projects: {}", e);
            }
        }
        debug!("📂 Loaded {} projects", projects.len());
        projects
    }

    pub fn save_projects(&self, projects: &[Project]) -> Result<(), StorageError> {
        let data = serde_json::to_string(projects)?;
        self.kv.set(PROJECTS_KEY, &data)
    }

    pub fn load_settings(&self) -> AppSettings {
        match self.kv.get(SETTINGS_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Failed to parse settings: {}", e);
                AppSettings::default()
            }),
            Ok(None) => AppSettings::default(),
            Err(e) => {
                warn!("Failed to read settings: {}", e);
                AppSettings::default()
            }
        }
    }

    pub fn save_settings(&self, settings: &AppSettings) -> Result<(), StorageError> {
        let data = serde_json::to_string(settings)?;
        self.kv.set(SETTINGS_KEY, &data)
    }
}

/// Parse the stored collection, returning the readable projects and how
/// many records were skipped. Only a collection that is not a JSON array at
/// all is an error.
fn parse_projects(raw: &str) -> Result<(Vec<Project>, usize), serde_json::Error> {
    let records: Vec<Value> = serde_json::from_str(raw)?;
    let mut skipped = 0;

    let projects = records
        .into_iter()
        .enumerate()
        .filter_map(|(index, mut record)| {
            migrate_project_record(&mut record);
            match serde_json::from_value::<Project>(record) {
                Ok(project) => Some(project),
                Err(e) => {
                    warn!("Skipping unreadable project record #{}: {}", index + 1, e);
                    skipped += 1;
                    None
                }
            }
        })
        .collect();

    Ok((projects, skipped))
}

/// Backfill fields older or hand-edited records may lack: `works` (added
/// after the first release), scalar fields and message timestamps.
fn migrate_project_record(record: &mut Value) {
    let Value::Object(map) = record else {
        return;
    };

    for key in ["messages", "materials", "works", "quickActions"] {
        if !matches!(map.get(key), Some(Value::Array(_))) {
            map.insert(key.to_string(), Value::Array(Vec::new()));
        }
    }
    if !matches!(map.get("id"), Some(Value::String(_))) {
        map.insert("id".to_string(), Value::from(generate_id()));
    }
    if !matches!(map.get("title"), Some(Value::String(_))) {
        map.insert("title".to_string(), Value::from(UNTITLED_PROJECT_TITLE));
    }
    if !matches!(map.get("description"), Some(Value::String(_))) {
        map.insert("description".to_string(), Value::from(""));
    }

    let created_at = map.get("createdAt").and_then(Value::as_i64);
    let updated_at = map.get("updatedAt").and_then(Value::as_i64);
    let created_at = created_at.or(updated_at).unwrap_or(0);
    let updated_at = updated_at.unwrap_or(created_at).max(created_at);
    map.insert("createdAt".to_string(), Value::from(created_at));
    map.insert("updatedAt".to_string(), Value::from(updated_at));

    if let Some(Value::Array(messages)) = map.get_mut("messages") {
        for message in messages.iter_mut() {
            migrate_message_record(message, updated_at);
        }
    }
}

fn migrate_message_record(message: &mut Value, fallback_timestamp: i64) {
    let Value::Object(map) = message else {
        return;
    };

    if !matches!(map.get("id"), Some(Value::String(_))) {
        map.insert("id".to_string(), Value::from(generate_id()));
    }
    if map.get("timestamp").and_then(Value::as_i64).is_none() {
        map.insert("timestamp".to_string(), Value::from(fallback_timestamp));
    }
    // Error messages stored before they were flagged.
    let is_legacy_error = map.get("role").and_then(Value::as_str) == Some("model")
        && map
            .get("text")
            .and_then(Value::as_str)
            .is_some_and(|text| text.starts_with("Error: ") && text.ends_with(ERROR_HINT));
    if is_legacy_error && !map.contains_key("isError") {
        map.insert("isError".to_string(), Value::Bool(true));
    }
}
