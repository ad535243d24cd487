//! 导出面板

use dxview_file::ExportFormat;

/// 渲染导出面板，返回请求的导出格式
pub fn show_export_panel(
    ctx: &egui::Context,
    show: &mut bool,
    has_model: bool,
) -> Option<ExportFormat> {
    let mut requested = None;
    let mut open = *show;

    egui::Window::new("Export")
        .open(&mut open)
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-12.0, 48.0))
        .show(ctx, |ui| {
            if !has_model {
                ui.label(egui::RichText::new("Load a drawing first").weak());
                return;
            }

            ui.label("Save the current view as:");
            ui.add_space(4.0);

            ui.horizontal(|ui| {
                if ui.button("PNG image").on_hover_text("Rendered pixels").clicked() {
                    requested = Some(ExportFormat::Png);
                }
                if ui.button("SVG vector").on_hover_text("Projected lines and points").clicked() {
                    requested = Some(ExportFormat::Svg);
                }
            });
            ui.add_space(4.0);
            ui.label(egui::RichText::new("Grid and view cube are not included in SVG").weak().small());
        });

    *show = open;
    requested
}
