use std::fmt::Write;

use crate::config::{AppSettings, SUPPORTED_MODELS};

pub fn render(settings: &AppSettings) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n== 设置 ==");
    let _ = writeln!(out, "Gemini API Key: {}", settings.masked_api_key());
    if settings.api_key.trim().is_empty() && settings.effective_api_key().is_some() {
        let _ = writeln!(out, "  (使用内置默认密钥)");
    }
    let _ = writeln!(out, "模型:");
    let current = settings.effective_model();
    for (i, (id, label)) in SUPPORTED_MODELS.iter().enumerate() {
        let marker = if *id == current { "*" } else { " " };
        let _ = writeln!(out, " {} {}. {} ({})", marker, i + 1, label, id);
    }
    if !SUPPORTED_MODELS.iter().any(|(id, _)| *id == current) {
        let _ = writeln!(out, " * 自定义: {}", current);
    }
    let _ = writeln!(out, "\n/key <API Key> 保存密钥，/model <编号或名称> 切换模型。");
    out
}

/// Resolve a model argument given as a list number or a model id.
pub fn resolve_model(arg: &str) -> Option<&'static str> {
    let arg = arg.trim();
    if let Ok(n) = arg.parse::<usize>() {
        return SUPPORTED_MODELS.get(n.checked_sub(1)?).map(|(id, _)| *id);
    }
    SUPPORTED_MODELS.iter().find(|(id, _)| *id == arg).map(|(id, _)| *id)
}
