use std::fmt::Write;

use super::{format_date, preview};
use crate::project::{Message, Project, Role};

const MATERIAL_PREVIEW_CHARS: usize = 40;

/// Header line shown when a project is opened.
pub fn render_header(project: &Project) -> String {
    format!(
        "\n== {} ==\n{} · {} · 更新于 {}\n",
        project.title,
        project.description,
        project.category_label(),
        format_date(project.updated_at)
    )
}

fn speaker(message: &Message) -> &'static str {
    match message.role {
        Role::User => "你",
        Role::Model if message.is_error => "TeacherMind · 错误",
        Role::Model => "TeacherMind",
    }
}

pub fn render_message(message: &Message) -> String {
    format!("\n[{}]\n{}\n", speaker(message), message.text)
}

/// Messages are numbered from 1 so `/save <n>` and `/copy <n>` can name them.
pub fn render_conversation(project: &Project) -> String {
    if project.messages.is_empty() {
        return "\n开始您的教学设计对话吧。\n".to_string();
    }
    project
        .messages
        .iter()
        .enumerate()
        .map(|(i, message)| format!("\n#{} [{}]\n{}\n", i + 1, speaker(message), message.text))
        .collect()
}

pub fn render_materials(project: &Project) -> String {
    let mut out = String::new();
    let active = project.materials.iter().filter(|m| m.is_active).count();
    let _ = writeln!(out, "\n-- 资料库 ({} 已启用 / {}) --", active, project.materials.len());
    if project.materials.is_empty() {
        let _ = writeln!(out, "暂无资料。/mat-add text|link \"标题 | 内容\" 或 /upload <路径>");
        return out;
    }
    for (i, material) in project.materials.iter().enumerate() {
        let marker = if material.is_active { "[x]" } else { "[ ]" };
        let _ = writeln!(
            out,
            "{:>2}. {} {} ({}) {}",
            i + 1,
            marker,
            material.title,
            material.kind.label(),
            preview(&material.content, MATERIAL_PREVIEW_CHARS)
        );
    }
    out
}

pub fn render_works(project: &Project) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n-- 我的作品 ({}) --", project.works.len());
    if project.works.is_empty() {
        let _ = writeln!(out, "暂无作品。/save [编号] [标题] 保存回复。");
        return out;
    }
    for (i, work) in project.works.iter().enumerate() {
        let _ = writeln!(out, "{:>2}. {}  ({})", i + 1, work.title, format_date(work.created_at));
    }
    out
}

pub fn render_quick_actions(project: &Project) -> String {
    let mut out = String::from("\n快捷操作:");
    if project.quick_actions.is_empty() {
        out.push_str(" (无)");
    }
    for (i, action) in project.quick_actions.iter().enumerate() {
        let _ = write!(out, "  {}.{}", i + 1, action.label);
    }
    out.push('\n');
    out
}

/// The full project view: header, conversation, side panels and quick actions.
pub fn render(project: &Project) -> String {
    let mut out = render_header(project);
    out.push_str(&render_conversation(project));
    out.push_str(&render_materials(project));
    out.push_str(&render_works(project));
    out.push_str(&render_quick_actions(project));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{Material, MaterialKind};

    #[test]
    fn test_render_marks_active_materials() {
        let mut project = Project::new(Some("Unit"), None, None);
        let first = project
            .add_material(Material::manual(MaterialKind::Text, "Syllabus", "Week 1 photosynthesis").unwrap())
            .id
            .clone();
        project.add_material(Material::manual(MaterialKind::Link, "Video", "https://example.com").unwrap());
        project.toggle_material(&first);

        let out = render_materials(&project);
        assert!(out.contains("1 已启用 / 2"));
        assert!(out.contains("[ ] Syllabus (text)"));
        assert!(out.contains("[x] Video (link)"));
    }

    #[test]
    fn test_render_lists_conversation_and_quick_actions() {
        let mut project = Project::new(Some("Unit"), Some("Design a rubric"), None);
        project.messages.push(Message::model("Here is a rubric"));

        let out = render(&project);
        assert!(out.contains("== Unit =="));
        assert!(out.contains("#1 [你]\nDesign a rubric"));
        assert!(out.contains("#2 [TeacherMind]\nHere is a rubric"));
        assert!(out.contains("1.润色"));
        assert!(out.contains("4.生成量规"));
        assert!(out.contains("暂无作品"));
    }

    #[test]
    fn test_error_messages_are_labelled() {
        let mut project = Project::new(Some("Unit"), Some("hi"), None);
        project.messages.push(Message::error("Error: quota exceeded"));

        let out = render_conversation(&project);
        assert!(out.contains("#2 [TeacherMind · 错误]\nError: quota exceeded"));
        assert_eq!(render_message(&project.messages[1]), "\n[TeacherMind · 错误]\nError: quota exceeded\n");
    }

    #[test]
    fn test_empty_conversation_prompt() {
        let project = Project::new(None, None, None);
        assert!(render_conversation(&project).contains("开始您的教学设计对话吧"));
    }
}
