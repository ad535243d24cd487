//! 帮助浮层

use crate::shortcuts::SHORTCUT_HELP;

const MOUSE_HELP: &[(&str, &str)] = &[
    ("Left drag", "Orbit"),
    ("Right drag", "Pan"),
    ("Wheel / pinch", "Zoom"),
    ("View cube click", "Snap to face"),
    ("View cube drag", "Orbit"),
];

/// 渲染帮助浮层
pub fn show_help(ctx: &egui::Context, show: &mut bool) {
    let mut open = *show;

    egui::Window::new("Help")
        .open(&mut open)
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
        .show(ctx, |ui| {
            help_grid(ui, "help_keys", "Keyboard", SHORTCUT_HELP);
            ui.add_space(8.0);
            help_grid(ui, "help_mouse", "Mouse", MOUSE_HELP);
        });

    *show = open;
}

fn help_grid(ui: &mut egui::Ui, id: &str, title: &str, rows: &[(&str, &str)]) {
    ui.strong(title);
    egui::Grid::new(id).num_columns(2).striped(true).show(ui, |ui| {
        for (key, action) in rows {
            ui.monospace(*key);
            ui.label(*action);
            ui.end_row();
        }
    });
}
