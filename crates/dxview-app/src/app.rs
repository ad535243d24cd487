//! 查看器应用
//!
//! 每帧：推进场景 → 取回后台导入结果 → 处理面板意图 → 处理视口输入 → 绘制。

use crate::config::ViewerConfig;
use crate::input::{PinchEvent, TouchTracker};
use crate::viewport::{self, to_viewport};
use anyhow::Result;
use dxview_core::math::Point2;
use dxview_core::measure::MeasureTool;
use dxview_core::properties::Color;
use dxview_file::export::export_file_name;
use dxview_file::{save_png, ExportFormat, ImportJob, SvgExporter};
use dxview_renderer::gpu::request_headless_device;
use dxview_renderer::{CubeAction, Scene, StillFrameRenderer, WgpuBackend};
use dxview_ui::state::{LayerIntent, ToolbarIntent, UiState};
use dxview_ui::{export_panel, help, layers_panel, shortcuts, status_bar, toolbar};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};
use tracing::info;

/// 拾取顶点的屏幕半径（像素）
const PICK_RADIUS: f64 = 10.0;

/// 滚轮累积多少像素算一次缩放
const WHEEL_STEP: f32 = 50.0;

/// DXF 查看器
pub struct ViewerApp {
    scene: Scene<WgpuBackend>,
    still_frame: StillFrameRenderer,
    background: Color,
    ui_state: UiState,
    measure: MeasureTool,
    import_job: Option<ImportJob>,
    touches: TouchTracker,

    /// 视图立方体是否捕获了指针
    cube_captured: bool,
    wheel_accumulator: f32,
    started: Instant,
    last_frame: Instant,
}

impl ViewerApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: &ViewerConfig,
        initial_file: Option<PathBuf>,
    ) -> Result<Self> {
        // 与egui共用设备，模型缓冲同时用于静帧导出
        let (device, queue) = match cc.wgpu_render_state.as_ref() {
            Some(render_state) => (render_state.device.clone(), render_state.queue.clone()),
            None => {
                tracing::warn!("No wgpu render state from eframe, using a headless device");
                request_headless_device()?
            }
        };

        let scene = Scene::new(
            WgpuBackend::new(device.clone()),
            config.scene_settings(),
            config.window.width as f64,
            config.window.height as f64,
        );

        let now = Instant::now();
        let mut app = Self {
            scene,
            still_frame: StillFrameRenderer::new(device, queue),
            background: config.background_color(),
            ui_state: UiState::default(),
            measure: MeasureTool::new(config.measure.units),
            import_job: None,
            touches: TouchTracker::new(),
            cube_captured: false,
            wheel_accumulator: 0.0,
            started: now,
            last_frame: now,
        };

        if let Some(path) = initial_file {
            app.start_import(path);
        }
        Ok(app)
    }

    /// 在后台开始导入；进行中的导入被丢弃
    fn start_import(&mut self, path: PathBuf) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        info!("Importing {}", path.display());
        self.ui_state.begin_loading(name);
        self.import_job = Some(ImportJob::spawn(path));
    }

    fn poll_import(&mut self) {
        let Some(result) = self.import_job.as_ref().and_then(|job| job.poll()) else {
            return;
        };
        self.import_job = None;

        match result {
            Ok(imported) => {
                self.measure.clear();
                self.scene.add_model(imported.primitives);
                self.ui_state.finish_loading(imported.info);
            }
            Err(e) => {
                tracing::error!("Import failed: {}", e);
                self.ui_state.report_error(e.to_string());
            }
        }
    }

    fn show_open_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("DXF Files", &["dxf", "DXF"])
            .set_title("Open DXF")
            .pick_file()
        {
            self.start_import(path);
        }
    }

    fn handle_intent(&mut self, intent: ToolbarIntent) {
        let Some(intent) = self.ui_state.apply(intent) else {
            return;
        };
        tracing::debug!("Toolbar intent: {}", intent.name());

        match intent {
            ToolbarIntent::OpenFile => self.show_open_dialog(),
            ToolbarIntent::ResetView => self.scene.reset_view(),
            ToolbarIntent::SetViewMode(mode) => {
                self.scene.set_view_mode(mode);
                self.ui_state.view_mode = self.scene.view_mode();
            }
            ToolbarIntent::ToggleMeasure => {
                if self.ui_state.measuring {
                    self.measure.activate();
                } else {
                    self.measure.deactivate();
                }
            }
            _ => {}
        }
    }

    fn handle_layer_intent(&mut self, intent: LayerIntent) {
        match intent {
            LayerIntent::SetLayerVisible(name, visible) => {
                if !self.scene.set_layer_visible(&name, visible) {
                    tracing::warn!("Unknown layer: {}", name);
                }
            }
            LayerIntent::ShowAll => self.scene.show_all_layers(),
            LayerIntent::HideAll => self.scene.hide_all_layers(),
        }
    }

    fn export(&mut self, format: ExportFormat) {
        let Some(path) = rfd::FileDialog::new()
            .set_title("Export View")
            .set_file_name(export_file_name(format, SystemTime::now()))
            .add_filter(format.extension().to_uppercase(), &[format.extension()])
            .save_file()
        else {
            return;
        };

        match self.write_export(format, &path) {
            Ok(()) => {
                self.ui_state.last_error = None;
                self.ui_state.status_message = format!("Exported {}", path.display());
            }
            Err(e) => {
                tracing::error!("Export failed: {:#}", e);
                self.ui_state.report_error(format!("Export failed: {}", e));
            }
        }
    }

    fn write_export(&self, format: ExportFormat, path: &Path) -> Result<()> {
        let (width, height) = self.scene.viewport();
        let camera = self.scene.camera();

        match format {
            ExportFormat::Png => {
                let frame = self.still_frame.render(
                    self.scene.model(),
                    &self.scene.helper_vertices(),
                    camera,
                    width.round() as u32,
                    height.round() as u32,
                    self.background,
                )?;
                save_png(path, frame.width, frame.height, frame.rgba)?;
            }
            ExportFormat::Svg => {
                SvgExporter::new(width, height, self.background).export_to_file(
                    self.scene.visible_primitives(),
                    |p| camera.world_to_screen(p, width, height),
                    path,
                )?;
            }
        }
        Ok(())
    }

    /// 拖入的文件
    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .find_map(|file| file.path.clone())
        });
        if let Some(path) = dropped {
            self.start_import(path);
        }
    }

    fn handle_touches(&mut self, ctx: &egui::Context) {
        let events = ctx.input(|i| i.events.clone());
        for event in events {
            let egui::Event::Touch { id, phase, pos, .. } = event else {
                continue;
            };
            let position = Point2::new(pos.x as f64, pos.y as f64);
            let pinch = match phase {
                egui::TouchPhase::Start => self.touches.touch_start(id.0, position),
                egui::TouchPhase::Move => self.touches.touch_move(id.0, position),
                egui::TouchPhase::End | egui::TouchPhase::Cancel => self.touches.touch_end(id.0),
            };
            match pinch {
                Some(PinchEvent::Begin(distance)) => self.scene.pinch_begin(distance),
                Some(PinchEvent::Update(distance)) => self.scene.pinch_update(distance),
                Some(PinchEvent::End) => self.scene.pinch_end(),
                None => {}
            }
        }
    }

    /// 视图立方体的指针处理，返回本帧是否由立方体消费
    fn handle_view_cube(&mut self, ui: &egui::Ui, rect: egui::Rect, response: &egui::Response) -> bool {
        let (width, height) = self.scene.viewport();
        let now = self.started.elapsed();

        let hover = response
            .hover_pos()
            .and_then(|pos| self.scene.view_cube().to_local(to_viewport(&rect, pos), width, height));
        self.scene.view_cube_mut().hover(hover);

        let (pressed, released, latest) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.latest_pos(),
            )
        });
        let Some(latest) = latest else {
            return self.cube_captured;
        };

        // 拖动时指针可能离开控件，用未裁剪的局部坐标
        let origin = self.scene.view_cube().origin_in(width, height);
        let screen = to_viewport(&rect, latest);
        let local = Point2::new(screen.x - origin.x, screen.y - origin.y);

        if pressed && hover.is_some() {
            self.cube_captured = true;
            self.scene.view_cube_mut().pointer_down(local, now);
            return true;
        }
        if !self.cube_captured {
            return false;
        }

        let action = if released {
            self.cube_captured = false;
            self.scene.view_cube_mut().pointer_up(local, now)
        } else {
            self.scene.view_cube_mut().pointer_move(local, now)
        };
        if action != CubeAction::None {
            self.scene.apply_cube_action(action);
        }
        true
    }

    fn handle_viewport_input(&mut self, ui: &egui::Ui, rect: egui::Rect, response: &egui::Response) {
        if self.handle_view_cube(ui, rect, response) {
            return;
        }

        let drag = response.drag_delta();
        let delta = Point2::new(drag.x as f64, drag.y as f64);
        if !self.touches.is_pinching() && response.dragged_by(egui::PointerButton::Primary) {
            self.scene.orbit_drag(delta);
        }
        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.scene.pan_drag(delta);
        }

        if response.hovered() {
            self.wheel_accumulator += ui.input(|i| i.raw_scroll_delta.y);
            while self.wheel_accumulator.abs() >= WHEEL_STEP {
                let step = WHEEL_STEP.copysign(self.wheel_accumulator);
                self.scene.wheel(step as f64);
                self.wheel_accumulator -= step;
            }
        }

        if self.measure.active && response.clicked_by(egui::PointerButton::Primary) {
            if let Some(pos) = response.interact_pointer_pos() {
                self.pick_measure_point(to_viewport(&rect, pos));
            }
        }
    }

    fn pick_measure_point(&mut self, screen: Point2) {
        let Some(point) = self.scene.pick_vertex(screen, PICK_RADIUS) else {
            self.ui_state.status_message = "No vertex near cursor".to_string();
            return;
        };
        match self.measure.add_point(point) {
            Some(measurement) => {
                info!("Measured distance {:.4}", measurement.distance());
                if let Some(text) = self.measure.last_result() {
                    self.ui_state.status_message = format!("Distance: {}", text);
                }
            }
            None => self.ui_state.status_message = "Measure: pick the second point".to_string(),
        }
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).min(Duration::from_millis(100));
        self.last_frame = now;

        self.poll_import();
        self.handle_dropped_files(ctx);
        self.handle_touches(ctx);

        for shortcut in shortcuts::collect_shortcuts(ctx) {
            self.handle_intent(shortcut.intent());
        }

        for intent in toolbar::show_toolbar(ctx, &self.ui_state) {
            self.handle_intent(intent);
        }

        let layers = self.scene.layers();
        for intent in layers_panel::show_layers_panel(ctx, &layers, &mut self.ui_state.show_layers_panel) {
            self.handle_layer_intent(intent);
        }

        let has_model = self.scene.has_model();
        if let Some(format) =
            export_panel::show_export_panel(ctx, &mut self.ui_state.show_export_panel, has_model)
        {
            self.export(format);
        }

        help::show_help(ctx, &mut self.ui_state.show_help);

        let measurement = self.measure.last_result();
        status_bar::show_status_bar(ctx, &self.ui_state, measurement.as_deref());

        let background = viewport::color32(&self.background);
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE.fill(background))
            .show(ctx, |ui| {
                let (response, painter) =
                    ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
                let rect = response.rect;
                self.scene.resize(rect.width() as f64, rect.height() as f64);

                self.handle_viewport_input(ui, rect, &response);
                self.scene.tick(dt);

                viewport::draw_scene(&painter, rect, &self.scene, &self.measure);
                viewport::draw_view_cube(&painter, rect, self.scene.view_cube());

                if self.ui_state.is_loading() {
                    painter.text(
                        rect.center(),
                        egui::Align2::CENTER_CENTER,
                        "Loading...",
                        egui::FontId::proportional(18.0),
                        egui::Color32::from_gray(90),
                    );
                } else if !self.scene.has_model() {
                    painter.text(
                        rect.center(),
                        egui::Align2::CENTER_CENTER,
                        "Drop a DXF file here or press Open",
                        egui::FontId::proportional(18.0),
                        egui::Color32::from_gray(140),
                    );
                }
            });

        ctx.request_repaint();
    }
}
