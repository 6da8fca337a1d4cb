use serde::{Deserialize, Serialize};

use super::{generate_id, Project};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct QuickAction {
    pub id: String,
    pub label: String,
    pub prompt: String,
}

/// Seeded into every new project.
pub fn default_quick_actions() -> Vec<QuickAction> {
    [
        ("qa-1", "润色", "请润色上述内容，使其语言更加专业、学术，符合教学设计的规范。"),
        ("qa-2", "扩写", "请详细扩写上述点，补充更多具体的教学细节和操作步骤。"),
        ("qa-3", "举例", "请针对核心概念给出3个具体的课堂教学案例。"),
        ("qa-4", "生成量规", "请根据上述任务设计一个包含4个等级的评价量规(Rubric)。"),
    ]
    .into_iter()
    .map(|(id, label, prompt)| QuickAction {
        id: id.to_string(),
        label: label.to_string(),
        prompt: prompt.to_string(),
    })
    .collect()
}

impl Project {
    pub fn add_quick_action(&mut self, label: &str, prompt: &str) -> Option<&QuickAction> {
        if label.trim().is_empty() || prompt.trim().is_empty() {
            return None;
        }
        self.quick_actions.push(QuickAction {
            id: generate_id(),
            label: label.to_string(),
            prompt: prompt.to_string(),
        });
        self.quick_actions.last()
    }

    pub fn delete_quick_action(&mut self, id: &str) -> bool {
        let before = self.quick_actions.len();
        self.quick_actions.retain(|a| a.id != id);
        self.quick_actions.len() != before
    }

    /// Look up by id, falling back to the label so the terminal front end can
    /// accept either.
    pub fn find_quick_action(&self, key: &str) -> Option<&QuickAction> {
        self.quick_actions
            .iter()
            .find(|a| a.id == key)
            .or_else(|| self.quick_actions.iter().find(|a| a.label == key))
    }
}
