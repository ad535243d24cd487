//! 图层面板

use crate::state::LayerIntent;
use dxview_core::layer::LayerSummary;

/// 渲染图层面板，返回本帧产生的图层意图
pub fn show_layers_panel(
    ctx: &egui::Context,
    layers: &[LayerSummary],
    show: &mut bool,
) -> Vec<LayerIntent> {
    let mut intents = Vec::new();

    egui::SidePanel::right("layers_panel")
        .resizable(true)
        .default_width(220.0)
        .show_animated(ctx, *show, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Layers");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button("✕").clicked() {
                        *show = false;
                    }
                });
            });
            ui.separator();

            if layers.is_empty() {
                ui.label(egui::RichText::new("No layers").weak());
                return;
            }

            ui.horizontal(|ui| {
                if ui.button("Show All").clicked() {
                    intents.push(LayerIntent::ShowAll);
                }
                if ui.button("Hide All").clicked() {
                    intents.push(LayerIntent::HideAll);
                }
            });
            ui.separator();

            egui::ScrollArea::vertical().show(ui, |ui| {
                for layer in layers {
                    ui.horizontal(|ui| {
                        let mut visible = layer.visible;
                        if ui.checkbox(&mut visible, "").changed() {
                            intents.push(LayerIntent::SetLayerVisible(layer.name.clone(), visible));
                        }

                        // 颜色指示器
                        let color = egui::Color32::from_rgb(
                            layer.swatch_color.r,
                            layer.swatch_color.g,
                            layer.swatch_color.b,
                        );
                        let (rect, _response) =
                            ui.allocate_exact_size(egui::vec2(14.0, 14.0), egui::Sense::hover());
                        ui.painter().rect_filled(rect, 2.0, color);

                        let text = if layer.visible {
                            egui::RichText::new(&layer.name)
                        } else {
                            egui::RichText::new(&layer.name).weak()
                        };
                        ui.label(text);
                    });
                }
            });
        });

    intents
}
