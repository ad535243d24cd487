//! 场景
//!
//! 把模型容器、图层索引、相机、控制器、过渡动画和视图立方体组合在一起，
//! 对外提供导入后的全部查看操作。所有修改都在帧循环和输入回调里顺序执行。

use crate::camera::{CameraState, ViewMode};
use crate::controls::{OrbitControls, PinchZoom};
use crate::framing::{default_orthographic, fit_orthographic, fit_to_volume, AxesHelper, GroundGrid};
use crate::model::{GpuBackend, ModelContainer};
use crate::transition::{CameraTransition, TransitionSlot};
use crate::vertex::LineVertex;
use crate::view_cube::{apply_orbit, snap_pose, CubeAction, ViewCube};
use dxview_core::layer::{LayerRegistry, LayerSummary};
use dxview_core::math::{Point2, Point3};
use dxview_core::primitive::RenderPrimitive;
use std::time::Duration;

/// 场景参数
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSettings {
    pub fov_degrees: f64,
    pub near: f64,
    pub far: f64,
    pub min_distance: f64,
    pub max_distance: f64,
    pub damping: f64,
    pub view_cube_size: f64,
    pub view_cube_margin: f64,
    pub snap_duration: Duration,
    pub drag_time: Duration,
    pub drag_distance: f64,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            near: 0.1,
            far: 10000.0,
            min_distance: 1.0,
            max_distance: 5000.0,
            damping: 0.05,
            view_cube_size: 120.0,
            view_cube_margin: 20.0,
            snap_duration: Duration::from_millis(500),
            drag_time: Duration::from_millis(200),
            drag_distance: 5.0,
        }
    }
}

/// 查看器场景
pub struct Scene<B: GpuBackend> {
    settings: SceneSettings,
    model: ModelContainer<B>,
    layers: LayerRegistry,
    camera: CameraState,
    /// 进入正交模式前的透视相机
    saved_perspective: Option<CameraState>,
    controls: OrbitControls,
    transition: TransitionSlot,
    view_cube: ViewCube,
    pinch: PinchZoom,
    grid: GroundGrid,
    axes: AxesHelper,
    viewport: (f64, f64),
}

impl<B: GpuBackend> Scene<B> {
    pub fn new(backend: B, settings: SceneSettings, width: f64, height: f64) -> Self {
        let aspect = aspect_of(width, height);
        let mut camera = CameraState::new(aspect);
        camera.fov_degrees = settings.fov_degrees;
        camera.near = settings.near;
        camera.far = settings.far;

        let controls =
            OrbitControls::new(settings.min_distance, settings.max_distance, settings.damping);

        let mut view_cube = ViewCube::new(settings.view_cube_size, settings.view_cube_margin);
        view_cube.drag_time = settings.drag_time;
        view_cube.drag_distance = settings.drag_distance;
        view_cube.sync(&camera.snapshot());

        Self {
            settings,
            model: ModelContainer::new(backend),
            layers: LayerRegistry::new(),
            camera,
            saved_perspective: None,
            controls,
            transition: TransitionSlot::new(),
            view_cube,
            pinch: PinchZoom::default(),
            grid: GroundGrid::default(),
            axes: AxesHelper::default(),
            viewport: (width, height),
        }
    }

    /// 替换当前模型：释放旧资源、重建图层、显示网格并重新取景
    pub fn add_model(&mut self, primitives: Vec<RenderPrimitive>) {
        self.model.replace(primitives);
        self.layers = LayerRegistry::rebuild(self.model.primitives());
        self.grid.visible = true;
        self.axes.visible = true;
        self.fit_camera();
        tracing::info!(
            "Scene loaded {} primitives on {} layers",
            self.model.len(),
            self.layers.count()
        );
    }

    /// 按当前投影模式重新取景
    pub fn reset_view(&mut self) {
        if self.model.is_empty() {
            return;
        }
        self.fit_camera();
    }

    fn fit_camera(&mut self) {
        self.transition.cancel();
        self.controls.stop();

        let volume = self.model.bounding_box();
        self.camera = match self.camera.mode {
            ViewMode::Perspective => fit_to_volume(&volume, &self.camera, self.settings.fov_degrees),
            ViewMode::Orthographic => fit_orthographic(&volume, &self.camera, self.camera.aspect),
        };
        self.grid = GroundGrid::for_volume(&volume);
        self.view_cube.sync(&self.camera.snapshot());
    }

    /// 切换投影模式；正交模式下禁止旋转
    pub fn set_view_mode(&mut self, mode: ViewMode) {
        if self.camera.mode == mode {
            return;
        }
        self.transition.cancel();
        self.controls.stop();

        match mode {
            ViewMode::Orthographic => {
                self.saved_perspective = Some(self.camera.clone());
                self.camera = if self.model.is_empty() {
                    default_orthographic(&self.camera)
                } else {
                    fit_orthographic(&self.model.bounding_box(), &self.camera, self.camera.aspect)
                };
                self.controls.enable_rotate = false;
            }
            ViewMode::Perspective => {
                let mut camera = self
                    .saved_perspective
                    .take()
                    .unwrap_or_else(|| CameraState::new(self.camera.aspect));
                camera.aspect = self.camera.aspect;
                camera.mode = ViewMode::Perspective;
                self.camera = camera;
                self.controls.enable_rotate = true;
                if !self.model.is_empty() {
                    self.fit_camera();
                }
            }
        }
        self.controls.enable_pan = true;
        self.controls.enable_zoom = true;
        self.view_cube.sync(&self.camera.snapshot());
        tracing::debug!("View mode set to {:?}", mode);
    }

    pub fn view_mode(&self) -> ViewMode {
        self.camera.mode
    }

    /// 视口尺寸变化
    pub fn resize(&mut self, width: f64, height: f64) {
        if width <= 0.0 || height <= 0.0 || self.viewport == (width, height) {
            return;
        }
        self.viewport = (width, height);
        self.camera.set_aspect(aspect_of(width, height));
    }

    pub fn viewport(&self) -> (f64, f64) {
        self.viewport
    }

    /// 每帧调用：推进过渡或释放控制器惯性，然后同步视图立方体
    pub fn tick(&mut self, dt: Duration) {
        if !self.transition.tick(dt, &mut self.camera) {
            self.controls.update(&mut self.camera);
        }
        self.view_cube.sync(&self.camera.snapshot());
    }

    /// 执行视图立方体产生的动作
    pub fn apply_cube_action(&mut self, action: CubeAction) {
        match action {
            CubeAction::None => {}
            CubeAction::SnapTo(face) => {
                let (position, up) = snap_pose(face, &self.camera.snapshot());
                self.controls.stop();
                self.transition.start(CameraTransition::new(
                    &self.camera,
                    position,
                    self.camera.target,
                    up,
                    self.settings.snap_duration,
                ));
            }
            CubeAction::Orbit { yaw, pitch } => {
                if !self.controls.enable_rotate {
                    return;
                }
                self.transition.cancel();
                apply_orbit(&mut self.camera, yaw, pitch);
                self.view_cube.sync(&self.camera.snapshot());
            }
        }
    }

    /// 鼠标拖动旋转
    pub fn orbit_drag(&mut self, delta: Point2) {
        self.transition.cancel();
        self.controls.rotate(delta, self.viewport.1);
    }

    /// 鼠标拖动平移
    pub fn pan_drag(&mut self, delta: Point2) {
        self.transition.cancel();
        self.controls.pan(&self.camera, delta, self.viewport);
    }

    /// 滚轮缩放，正值拉近
    pub fn wheel(&mut self, delta: f64) {
        self.transition.cancel();
        self.controls.wheel(&mut self.camera, delta);
    }

    pub fn pinch_begin(&mut self, finger_distance: f64) {
        self.pinch.begin(finger_distance, &self.camera);
    }

    pub fn pinch_update(&mut self, finger_distance: f64) {
        self.transition.cancel();
        self.pinch.update(finger_distance, &mut self.camera);
    }

    pub fn pinch_end(&mut self) {
        self.pinch.end();
    }

    /// 设置图层可见性，未知图层返回 `false`
    pub fn set_layer_visible(&mut self, name: &str, visible: bool) -> bool {
        self.layers
            .set_visible(name, visible, self.model.primitives_mut())
    }

    /// 切换图层可见性，返回新状态
    pub fn toggle_layer(&mut self, name: &str) -> Option<bool> {
        let visible = !self.layers.get(name)?.visible;
        self.set_layer_visible(name, visible);
        Some(visible)
    }

    pub fn show_all_layers(&mut self) {
        self.layers.show_all(self.model.primitives_mut());
    }

    pub fn hide_all_layers(&mut self) {
        self.layers.hide_all(self.model.primitives_mut());
    }

    /// 图层面板使用的摘要
    pub fn layers(&self) -> Vec<LayerSummary> {
        self.layers.summaries()
    }

    pub fn layer_registry(&self) -> &LayerRegistry {
        &self.layers
    }

    /// 当前可见的图元（矢量导出与绘制）
    pub fn visible_primitives(&self) -> impl Iterator<Item = &RenderPrimitive> {
        self.model.primitives().iter().filter(|p| p.visible)
    }

    /// 屏幕半径内离拾取点最近的可见顶点
    pub fn pick_vertex(&self, screen: Point2, radius: f64) -> Option<Point3> {
        let (width, height) = self.viewport;
        self.visible_primitives()
            .flat_map(|p| p.points.iter())
            .filter_map(|point| {
                let projected = self.camera.world_to_screen(point, width, height)?;
                let distance = nalgebra::distance(&projected, &screen);
                (distance <= radius).then_some((distance, *point))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, point)| point)
    }

    /// 网格与坐标轴的线段顶点
    pub fn helper_vertices(&self) -> Vec<LineVertex> {
        let mut vertices = Vec::new();
        if self.grid.visible {
            for (a, b, color) in self.grid.lines() {
                vertices.push(LineVertex::new(&a, &color));
                vertices.push(LineVertex::new(&b, &color));
            }
        }
        if self.axes.visible {
            for (a, b, color) in self.axes.lines() {
                vertices.push(LineVertex::new(&a, &color));
                vertices.push(LineVertex::new(&b, &color));
            }
        }
        vertices
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_active()
    }

    pub fn view_cube(&self) -> &ViewCube {
        &self.view_cube
    }

    pub fn view_cube_mut(&mut self) -> &mut ViewCube {
        &mut self.view_cube
    }

    pub fn grid(&self) -> &GroundGrid {
        &self.grid
    }

    pub fn axes(&self) -> &AxesHelper {
        &self.axes
    }

    pub fn model(&self) -> &ModelContainer<B> {
        &self.model
    }

    pub fn has_model(&self) -> bool {
        !self.model.is_empty()
    }

    /// 释放模型资源并回到初始状态
    pub fn dispose(&mut self) {
        self.transition.cancel();
        self.model.dispose();
        self.layers.clear();
        self.grid.visible = false;
        self.axes.visible = false;
    }
}

fn aspect_of(width: f64, height: f64) -> f64 {
    if width > 0.0 && height > 0.0 {
        width / height
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CountingBackend;
    use crate::view_cube::CubeFace;
    use dxview_core::entity::DrawingEntity;
    use dxview_core::math::{approx_eq_tol, points_approx_eq, Vector3};
    use dxview_core::primitive::build;

    fn scene() -> Scene<CountingBackend> {
        Scene::new(CountingBackend::default(), SceneSettings::default(), 800.0, 600.0)
    }

    fn primitives() -> Vec<RenderPrimitive> {
        [
            DrawingEntity::line(Point3::new(-50.0, -50.0, -50.0), Point3::new(50.0, 50.0, 50.0))
                .with_layer("WALLS"),
            DrawingEntity::circle(Point3::origin(), 10.0).with_layer("DOORS").with_color_index(1),
            DrawingEntity::point(Point3::new(20.0, 0.0, 0.0)).with_layer("WALLS"),
        ]
        .iter()
        .filter_map(build)
        .collect()
    }

    #[test]
    fn test_grid_hidden_until_first_model() {
        let mut scene = scene();
        assert!(!scene.grid().visible);
        assert!(scene.helper_vertices().is_empty());

        scene.add_model(primitives());
        assert!(scene.grid().visible);
        assert!(scene.axes().visible);
        assert_eq!(scene.grid().size, 200.0);
        assert_eq!(scene.grid().elevation, -50.0);
    }

    #[test]
    fn test_add_model_fits_camera_and_rebuilds_layers() {
        let mut scene = scene();
        scene.add_model(primitives());

        let expected = 50.0 / 22.5_f64.to_radians().tan() * 1.5;
        assert!(points_approx_eq(
            &scene.camera().position,
            &Point3::new(expected, expected, expected),
            1e-9
        ));
        let names: Vec<String> = scene.layers().into_iter().map(|l| l.name).collect();
        assert_eq!(names, vec!["WALLS", "DOORS"]);

        scene.add_model(primitives());
        assert_eq!(scene.model().backend().live(), 3);
        assert_eq!(scene.model().backend().released, 3);
    }

    #[test]
    fn test_toggle_layer_hides_members() {
        let mut scene = scene();
        scene.add_model(primitives());

        assert_eq!(scene.toggle_layer("WALLS"), Some(false));
        assert_eq!(scene.visible_primitives().count(), 1);
        assert_eq!(scene.toggle_layer("MISSING"), None);

        scene.hide_all_layers();
        assert_eq!(scene.visible_primitives().count(), 0);
        scene.show_all_layers();
        assert_eq!(scene.visible_primitives().count(), 3);
    }

    #[test]
    fn test_cube_click_snaps_after_transition() {
        let mut scene = scene();
        scene.add_model(primitives());
        let target = scene.camera().target;
        let d = scene.camera().distance();

        scene.apply_cube_action(CubeAction::SnapTo(CubeFace::Right));
        assert!(scene.is_transitioning());
        for _ in 0..35 {
            scene.tick(Duration::from_millis(16));
        }
        assert!(!scene.is_transitioning());
        scene.tick(Duration::from_millis(16));

        assert!(points_approx_eq(
            &scene.camera().position,
            &(target + Vector3::new(d, 0.0, 0.0)),
            1e-6
        ));
        assert_eq!(scene.camera().up, Vector3::y());
        assert_eq!(scene.view_cube().orientation(), scene.camera().orientation());
    }

    #[test]
    fn test_orthographic_mode_disables_rotation() {
        let mut scene = scene();
        scene.add_model(primitives());
        let perspective = scene.camera().position;

        scene.set_view_mode(ViewMode::Orthographic);
        assert!(!scene.controls().enable_rotate);
        assert!(scene.controls().enable_pan);
        assert!(points_approx_eq(&scene.camera().position, &Point3::new(0.0, 0.0, 100.0), 1e-9));
        assert!(approx_eq_tol(scene.camera().frustum.top, 50.0, 1e-9));

        let before = scene.camera().position;
        scene.apply_cube_action(CubeAction::Orbit { yaw: 0.5, pitch: 0.0 });
        assert_eq!(scene.camera().position, before);

        scene.set_view_mode(ViewMode::Perspective);
        assert!(scene.controls().enable_rotate);
        assert!(points_approx_eq(&scene.camera().position, &perspective, 1e-9));
    }

    #[test]
    fn test_orthographic_import_regenerates_grid() {
        let mut scene = scene();
        scene.add_model(vec![build(&DrawingEntity::polyline(
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 10.0, 0.0)],
            false,
        ))
        .unwrap()]);
        assert_eq!(scene.grid().size, 20.0);

        scene.set_view_mode(ViewMode::Orthographic);
        scene.add_model(vec![build(&DrawingEntity::polyline(
            vec![Point3::new(0.0, 5.0, 0.0), Point3::new(1000.0, 1000.0, 0.0)],
            false,
        ))
        .unwrap()]);
        assert_eq!(scene.view_mode(), ViewMode::Orthographic);
        assert_eq!(scene.grid().size, 2000.0);
        assert_eq!(scene.grid().elevation, 5.0);
        assert!(scene.grid().visible);
    }

    #[test]
    fn test_pick_vertex_snaps_to_nearest() {
        let mut scene = scene();
        scene.add_model(primitives());
        scene.controls.enable_damping = false;

        let target = Point3::new(20.0, 0.0, 0.0);
        let (w, h) = scene.viewport();
        let screen = scene.camera().world_to_screen(&target, w, h).unwrap();
        let near = Point2::new(screen.x + 2.0, screen.y - 1.0);

        assert_eq!(scene.pick_vertex(near, 8.0), Some(target));
        assert_eq!(scene.pick_vertex(Point2::new(-100.0, -100.0), 8.0), None);
    }

    #[test]
    fn test_dispose_releases_everything() {
        let mut scene = scene();
        scene.add_model(primitives());
        scene.dispose();
        assert!(!scene.has_model());
        assert!(scene.layers().is_empty());
        assert_eq!(scene.model().backend().live(), 0);
    }
}
