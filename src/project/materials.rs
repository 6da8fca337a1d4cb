use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{generate_id, Project};
use crate::llm::file_utils;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MaterialKind {
    Text,
    Link,
    Image,
    File,
}

impl MaterialKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Link => "link",
            Self::Image => "image",
            Self::File => "file",
        }
    }
}

/// Reference input attached to a project. `data` carries a data URI and is
/// only set for uploads (image/file).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MaterialKind,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub is_active: bool,
}

pub const IMAGE_UPLOAD_CONTENT: &str = "图片附件";
pub const FILE_UPLOAD_CONTENT: &str = "文件附件";

impl Material {
    /// Manual text or link entry. Returns `None` when either field is blank.
    pub fn manual(kind: MaterialKind, title: &str, content: &str) -> Option<Self> {
        if title.trim().is_empty() || content.trim().is_empty() {
            return None;
        }
        if matches!(kind, MaterialKind::Image | MaterialKind::File) {
            return None;
        }

        Some(Self {
            id: generate_id(),
            kind,
            title: title.to_string(),
            content: content.to_string(),
            data: None,
            mime_type: None,
            is_active: true,
        })
    }

    /// An uploaded payload. Anything whose MIME type starts with `image/`
    /// becomes an image material, everything else a file.
    pub fn upload(file_name: &str, mime_type: &str, bytes: &[u8]) -> Self {
        let is_image = file_utils::is_image_mime(mime_type);
        Self {
            id: generate_id(),
            kind: if is_image { MaterialKind::Image } else { MaterialKind::File },
            title: file_name.to_string(),
            content: if is_image { IMAGE_UPLOAD_CONTENT } else { FILE_UPLOAD_CONTENT }.to_string(),
            data: Some(file_utils::to_data_uri(mime_type, bytes)),
            mime_type: Some(mime_type.to_string()),
            is_active: true,
        }
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let upload = file_utils::read_upload(path)?;
        Ok(Self::upload(&upload.file_name, &upload.mime_type, &upload.bytes))
    }

    /// Images travel as inline binary parts rather than in the text context.
    pub fn is_image_bearing(&self) -> bool {
        match self.kind {
            MaterialKind::Image => true,
            MaterialKind::File => self
                .mime_type
                .as_deref()
                .map(file_utils::is_image_mime)
                .unwrap_or(false),
            MaterialKind::Text | MaterialKind::Link => false,
        }
    }
}

impl Project {
    pub fn add_material(&mut self, material: Material) -> &Material {
        self.materials.push(material);
        &self.materials[self.materials.len() - 1]
    }

    /// Flip the active flag, returning the new state.
    pub fn toggle_material(&mut self, id: &str) -> Option<bool> {
        let material = self.materials.iter_mut().find(|m| m.id == id)?;
        material.is_active = !material.is_active;
        Some(material.is_active)
    }

    pub fn delete_material(&mut self, id: &str) -> bool {
        let before = self.materials.len();
        self.materials.retain(|m| m.id != id);
        self.materials.len() != before
    }

    pub fn active_materials(&self) -> impl Iterator<Item = &Material> {
        self.materials.iter().filter(|m| m.is_active)
    }
}
