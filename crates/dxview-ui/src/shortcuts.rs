//! 键盘快捷键

use crate::state::ToolbarIntent;

/// 快捷键动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    ResetView,
    ToggleLayers,
    ToggleExport,
    ToggleHelp,
    CloseAll,
}

impl Shortcut {
    pub fn intent(&self) -> ToolbarIntent {
        match self {
            Shortcut::ResetView => ToolbarIntent::ResetView,
            Shortcut::ToggleLayers => ToolbarIntent::ToggleLayersPanel,
            Shortcut::ToggleExport => ToolbarIntent::ToggleExportPanel,
            Shortcut::ToggleHelp => ToolbarIntent::ToggleHelp,
            Shortcut::CloseAll => ToolbarIntent::CloseAll,
        }
    }
}

/// 帮助中列出的快捷键
pub const SHORTCUT_HELP: &[(&str, &str)] = &[
    ("F / R", "Reset view"),
    ("L", "Toggle layers panel"),
    ("E", "Toggle export panel"),
    ("H / ?", "Toggle help"),
    ("Esc", "Close panels"),
];

/// 按键到动作的映射；文本框获得焦点时不响应
pub fn shortcut_for_key(key: egui::Key, text_focused: bool) -> Option<Shortcut> {
    if text_focused {
        return None;
    }
    match key {
        egui::Key::F | egui::Key::R => Some(Shortcut::ResetView),
        egui::Key::L => Some(Shortcut::ToggleLayers),
        egui::Key::E => Some(Shortcut::ToggleExport),
        egui::Key::H | egui::Key::Questionmark => Some(Shortcut::ToggleHelp),
        egui::Key::Escape => Some(Shortcut::CloseAll),
        _ => None,
    }
}

/// 收集本帧按下的快捷键
pub fn collect_shortcuts(ctx: &egui::Context) -> Vec<Shortcut> {
    // 只有文本框会长期持有键盘焦点
    let text_focused = ctx.memory(|memory| memory.focused().is_some());
    ctx.input(|input| {
        input
            .events
            .iter()
            .filter_map(|event| match event {
                egui::Event::Key {
                    key,
                    pressed: true,
                    repeat: false,
                    modifiers,
                    ..
                } if !modifiers.command && !modifiers.alt => shortcut_for_key(*key, text_focused),
                _ => None,
            })
            .collect()
    })
}
