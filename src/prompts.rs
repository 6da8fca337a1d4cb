use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const DEFAULT_SYSTEM_PROMPT: &str = "你是一位专业的教育专家助手，专为中小学教师服务。你的名字叫 'TeacherMind'。你的目标是协助教师进行高质量的教学设计、项目化学习(PBL)规划、评价量规制作以及课堂活动设计。回答应专业、具体、结构清晰，符合现代教育理念（如核心素养、深度学习）。请始终使用 Markdown 格式输出，包括标题、列表、加粗等格式，以便用户直接复制使用。";

const MATERIALS_HEADER: &str = "【重要】以下是用户提供的项目背景资料或课程内容（不包含图片，图片已作为多模态输入发送），请在回答中充分参考这些信息：";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct PromptConfig {
    /// Markdown file replacing the built-in system prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_file: Option<String>,
}

#[derive(Clone, Debug)]
pub struct PromptManager {
    system_prompt: String,
}

impl Default for PromptManager {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl PromptManager {
    /// An unreadable or empty override file falls back to the built-in prompt.
    pub fn load_from_config(config: &PromptConfig) -> Self {
        let system_prompt = match &config.system_prompt_file {
            Some(path) => match std::fs::read_to_string(path) {
                Ok(content) if !content.trim().is_empty() => {
                    debug!("✅ Loaded system prompt from: {}", path);
                    content.trim().to_string()
                }
                Ok(_) => {
                    warn!("⚠️ System prompt file {} is empty, using built-in prompt", path);
                    DEFAULT_SYSTEM_PROMPT.to_string()
                }
                Err(e) => {
                    warn!("⚠️ Failed to load system prompt from {}: {}", path, e);
                    DEFAULT_SYSTEM_PROMPT.to_string()
                }
            },
            None => DEFAULT_SYSTEM_PROMPT.to_string(),
        };

        Self { system_prompt }
    }

    /// The system prompt, followed by the materials block when there is one.
    pub fn system_instruction(&self, materials_context: &str) -> String {
        if materials_context.is_empty() {
            return self.system_prompt.clone();
        }
        format!("{}\n\n{}\n{}", self.system_prompt, MATERIALS_HEADER, materials_context)
    }
}
