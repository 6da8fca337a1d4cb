use crate::shortcuts::{Accent, ShortcutIcon};

/// Terminal glyph for each icon. The set is closed, so every shortcut has
/// exactly one rendering.
pub fn glyph(icon: ShortcutIcon) -> &'static str {
    match icon {
        ShortcutIcon::Target => "◎",
        ShortcutIcon::ListChecks => "☑",
        ShortcutIcon::Puzzle => "✚",
        ShortcutIcon::Zap => "⚡",
        ShortcutIcon::HelpCircle => "?",
        ShortcutIcon::Layout => "▦",
    }
}

/// ANSI foreground colour code for an accent.
pub fn ansi_color(accent: Accent) -> u8 {
    match accent {
        Accent::Blue => 34,
        Accent::Green => 32,
        Accent::Purple => 35,
        Accent::Yellow => 33,
        Accent::Pink => 95,
        Accent::Orange => 91,
    }
}

pub fn colored(text: &str, accent: Accent, enabled: bool) -> String {
    if enabled {
        format!("\x1b[{}m{}\x1b[0m", ansi_color(accent), text)
    } else {
        text.to_string()
    }
}
