use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod materials;
pub mod quick_actions;
pub mod works;

pub use materials::{Material, MaterialKind};
pub use quick_actions::QuickAction;
pub use works::Work;

/// Milliseconds since the Unix epoch, the unit every persisted timestamp uses.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub text: String,
    pub timestamp: i64,
    /// A failed request rendered in the conversation. Never sent back to the
    /// provider and never offered as a reply to save or copy.
    #[serde(rename = "isError", default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl Message {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            role,
            text: text.into(),
            timestamp: now_millis(),
            is_error: false,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::new(Role::Model, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::model(text)
        }
    }

    /// A finished assistant answer: MODEL role, not an error, not empty.
    pub fn is_reply(&self) -> bool {
        self.role == Role::Model && !self.is_error && !self.text.trim().is_empty()
    }
}

/// A lesson-design workspace: one conversation plus its materials, works and
/// quick actions. Stored with the camelCase keys the browser build used.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    pub description: String,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub works: Vec<Work>,
    #[serde(default)]
    pub quick_actions: Vec<QuickAction>,
}

pub const BLANK_PROJECT_TITLE: &str = "新项目";
pub const UNTITLED_PROJECT_TITLE: &str = "未命名项目";
pub const BLANK_PROJECT_DESCRIPTION: &str = "新创建的教学设计项目";
pub const DEFAULT_CATEGORY: &str = "通用";
/// Closes every error message appended to a conversation.
pub const ERROR_HINT: &str = "Hint: Check your API Key in Settings.";

impl Project {
    /// Build a project the way the gallery and the "new project" button do.
    ///
    /// With an initial message the conversation is seeded with a single USER
    /// turn holding it, and the description previews where it came from.
    pub fn new(title: Option<&str>, initial_message: Option<&str>, category: Option<&str>) -> Self {
        let now = now_millis();
        let description = match (initial_message, title) {
            (Some(_), Some(title)) => format!("基于: {}", title),
            (Some(message), None) => format!("{}...", message.chars().take(30).collect::<String>()),
            (None, _) => BLANK_PROJECT_DESCRIPTION.to_string(),
        };

        let mut project = Self {
            id: generate_id(),
            title: title.unwrap_or(UNTITLED_PROJECT_TITLE).to_string(),
            description,
            created_at: now,
            updated_at: now,
            messages: Vec::new(),
            category: category.map(str::to_string),
            materials: Vec::new(),
            works: Vec::new(),
            quick_actions: quick_actions::default_quick_actions(),
        };

        if let Some(message) = initial_message {
            project.messages.push(Message::user(message));
        }

        project
    }

    pub fn category_label(&self) -> &str {
        self.category.as_deref().unwrap_or(DEFAULT_CATEGORY)
    }

    /// The reply at 1-based position `number` in the conversation, or the
    /// latest reply when `number` is `None`. Used by save-as-work and copy.
    pub fn reply(&self, number: Option<usize>) -> Option<&Message> {
        match number {
            Some(n) => self.messages.get(n.checked_sub(1)?).filter(|m| m.is_reply()),
            None => self.messages.iter().rev().find(|m| m.is_reply()),
        }
    }
}
