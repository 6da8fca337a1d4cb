use std::fmt::Write;

use super::format_date;
use crate::project::Project;

pub fn render(projects: &[Project]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n== 我的项目 ==");
    let _ = writeln!(out, "管理您的所有教学设计方案。\n");

    if projects.is_empty() {
        let _ = writeln!(out, "还没有项目");
        let _ = writeln!(out, "从快捷指令库开始 (/shortcuts)，或者创建一个空白项目 (/new)。");
        return out;
    }

    for (i, project) in projects.iter().enumerate() {
        let mut meta = format!(
            "{} · {} · {} 条对话",
            project.category_label(),
            format_date(project.updated_at),
            project.messages.len()
        );
        if !project.works.is_empty() {
            let _ = write!(meta, " · {} 作品", project.works.len());
        }
        let _ = writeln!(out, "{:>2}. {}", i + 1, project.title);
        let _ = writeln!(out, "     {}", project.description);
        let _ = writeln!(out, "     {}", meta);
    }

    let _ = writeln!(out, "\n/open <编号> 打开项目，/delete <编号> 删除项目，/new 创建新项目。");
    out
}
