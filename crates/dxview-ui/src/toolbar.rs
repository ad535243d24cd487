//! 工具栏

use crate::state::{ToolbarIntent, UiState};
use dxview_renderer::ViewMode;

/// 渲染工具栏，返回本帧点击产生的意图
pub fn show_toolbar(ctx: &egui::Context, ui_state: &UiState) -> Vec<ToolbarIntent> {
    let mut intents = Vec::new();

    egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.spacing_mut().item_spacing.x = 4.0;

            let open = ui.add_enabled(!ui_state.is_loading(), egui::Button::new("📂 Open"));
            if open.on_hover_text("Open a DXF file").clicked() {
                intents.push(ToolbarIntent::OpenFile);
            }

            ui.separator();

            toggle_button(
                ui,
                &mut intents,
                ui_state.show_layers_panel,
                "☰ Layers",
                "Layers (L)",
                ToolbarIntent::ToggleLayersPanel,
            );
            toggle_button(
                ui,
                &mut intents,
                ui_state.show_export_panel,
                "⬇ Export",
                "Export (E)",
                ToolbarIntent::ToggleExportPanel,
            );
            toggle_button(
                ui,
                &mut intents,
                ui_state.measuring,
                "📏 Measure",
                "Measure distance",
                ToolbarIntent::ToggleMeasure,
            );

            ui.separator();

            if ui.button("⟲ Reset").on_hover_text("Reset View (F / R)").clicked() {
                intents.push(ToolbarIntent::ResetView);
            }

            let perspective = ui_state.view_mode == ViewMode::Perspective;
            if ui
                .selectable_label(perspective, "3D")
                .on_hover_text("Perspective")
                .clicked()
                && !perspective
            {
                intents.push(ToolbarIntent::SetViewMode(ViewMode::Perspective));
            }
            if ui
                .selectable_label(!perspective, "2D")
                .on_hover_text("Orthographic")
                .clicked()
                && perspective
            {
                intents.push(ToolbarIntent::SetViewMode(ViewMode::Orthographic));
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                toggle_button(
                    ui,
                    &mut intents,
                    ui_state.show_help,
                    "?",
                    "Help (H)",
                    ToolbarIntent::ToggleHelp,
                );
            });
        });
    });

    intents
}

fn toggle_button(
    ui: &mut egui::Ui,
    intents: &mut Vec<ToolbarIntent>,
    selected: bool,
    label: &str,
    tooltip: &str,
    intent: ToolbarIntent,
) {
    let button = egui::Button::new(label).selected(selected);
    if ui.add(button).on_hover_text(tooltip).clicked() {
        intents.push(intent);
    }
}
