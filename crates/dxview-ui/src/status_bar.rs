//! 状态栏

use crate::state::UiState;

/// 渲染状态栏
///
/// `measurement` 为最近一次测量的格式化结果。
pub fn show_status_bar(ctx: &egui::Context, ui_state: &UiState, measurement: Option<&str>) {
    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if ui_state.is_loading() {
                ui.spinner();
            }

            match &ui_state.last_error {
                Some(error) => {
                    ui.colored_label(ui.visuals().error_fg_color, error);
                }
                None => {
                    ui.label(&ui_state.status_message);
                }
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if let Some(info) = &ui_state.info {
                    ui.label(format!(
                        "DXF {} | {} entities | {} layers",
                        info.format_version, info.entity_count, info.layer_count
                    ));
                }
                if let Some(distance) = measurement {
                    ui.separator();
                    ui.strong(format!("Distance: {}", distance));
                }
            });
        });
    });
}
