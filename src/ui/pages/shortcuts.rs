use std::fmt::Write;

use crate::shortcuts::Shortcut;
use crate::ui::icons;

pub fn render(shortcuts: &[Shortcut], color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n== 快捷指令库 ==");
    let _ = writeln!(out, "选择一个教学场景，快速开始您的AI辅助设计。\n");

    for (i, shortcut) in shortcuts.iter().enumerate() {
        let icon = icons::colored(icons::glyph(shortcut.icon), shortcut.accent, color);
        let _ = writeln!(out, "{:>2}. {} {}  [{}]", i + 1, icon, shortcut.title, shortcut.category);
        let _ = writeln!(out, "     {}", shortcut.description);
    }

    let _ = writeln!(out, "\n输入编号开始使用，或 /projects 查看我的项目。");
    out
}
