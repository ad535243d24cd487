//! 视图立方体
//!
//! 右下角的小型方位指示器。立方体姿态每帧从主相机快照复制，
//! 点击某个面让主相机过渡到对应的标准视图，按住拖动则直接绕目标旋转主相机。
//!
//! 立方体有自己的相机（视场 50°，位于 (0, 0, 3)），不与主场景共享任何状态。
//! 交互结果以 [`CubeAction`] 返回，由调用方作用于主相机。

use crate::camera::{ndc_to_screen, CameraSnapshot, CameraState};
use dxview_core::math::{Point2, Point3, Rotation, Vector3};
use dxview_core::properties::Color;
use nalgebra::Unit;
use std::time::Duration;

/// 立方体半边长
const HALF_EXTENT: f64 = 0.5;

/// 轴线长度
const AXIS_LENGTH: f64 = 1.2;

/// 轴标签距原点的距离
const LABEL_DISTANCE: f64 = 1.4;

/// 标签朝向低于此值时隐藏
const LABEL_FACING_THRESHOLD: f64 = -0.2;

/// 相机与目标重合时使用的吸附距离
pub const FALLBACK_SNAP_DISTANCE: f64 = 100.0;

/// 立方体的六个面
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    Right,
    Left,
    Top,
    Bottom,
    Front,
    Back,
}

impl CubeFace {
    /// 面描述表中的下标（即材质下标）
    pub fn index(self) -> usize {
        match self {
            CubeFace::Right => 0,
            CubeFace::Left => 1,
            CubeFace::Top => 2,
            CubeFace::Bottom => 3,
            CubeFace::Front => 4,
            CubeFace::Back => 5,
        }
    }

    pub fn descriptor(self) -> &'static FaceDescriptor {
        &FACES[self.index()]
    }

    /// 由立方体局部坐标的命中点判定面：取绝对值最大的分量
    pub fn from_local_point(p: &Point3) -> Self {
        let (ax, ay, az) = (p.x.abs(), p.y.abs(), p.z.abs());
        if ax >= ay && ax >= az {
            if p.x > 0.0 {
                CubeFace::Right
            } else {
                CubeFace::Left
            }
        } else if ay >= ax && ay >= az {
            if p.y > 0.0 {
                CubeFace::Top
            } else {
                CubeFace::Bottom
            }
        } else if p.z > 0.0 {
            CubeFace::Front
        } else {
            CubeFace::Back
        }
    }
}

/// 面描述（静态表，初始化后不变）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceDescriptor {
    pub face: CubeFace,
    pub label: &'static str,
    direction: [f64; 3],
    up: [f64; 3],
    pub color: Color,
}

impl FaceDescriptor {
    /// 外法线方向
    pub fn direction(&self) -> Vector3 {
        Vector3::from(self.direction)
    }

    /// 标准视图的上方向
    pub fn canonical_up(&self) -> Vector3 {
        Vector3::from(self.up)
    }
}

/// 六个面，按材质顺序排列
pub static FACES: [FaceDescriptor; 6] = [
    FaceDescriptor {
        face: CubeFace::Right,
        label: "Right",
        direction: [1.0, 0.0, 0.0],
        up: [0.0, 1.0, 0.0],
        color: Color::with_alpha(0xff, 0x00, 0x00, 77),
    },
    FaceDescriptor {
        face: CubeFace::Left,
        label: "Left",
        direction: [-1.0, 0.0, 0.0],
        up: [0.0, 1.0, 0.0],
        color: Color::with_alpha(0xff, 0x6b, 0x6b, 77),
    },
    FaceDescriptor {
        face: CubeFace::Top,
        label: "Top",
        direction: [0.0, 1.0, 0.0],
        up: [0.0, 0.0, -1.0],
        color: Color::with_alpha(0x00, 0xff, 0x00, 77),
    },
    FaceDescriptor {
        face: CubeFace::Bottom,
        label: "Bottom",
        direction: [0.0, -1.0, 0.0],
        up: [0.0, 0.0, 1.0],
        color: Color::with_alpha(0x6b, 0xff, 0x6b, 77),
    },
    FaceDescriptor {
        face: CubeFace::Front,
        label: "Front",
        direction: [0.0, 0.0, 1.0],
        up: [0.0, 1.0, 0.0],
        color: Color::with_alpha(0x00, 0x00, 0xff, 77),
    },
    FaceDescriptor {
        face: CubeFace::Back,
        label: "Back",
        direction: [0.0, 0.0, -1.0],
        up: [0.0, 1.0, 0.0],
        color: Color::with_alpha(0x6b, 0x6b, 0xff, 77),
    },
];

/// 吸附到某个面时主相机的目标位置与上方向
pub fn snap_pose(face: CubeFace, camera: &CameraSnapshot) -> (Point3, Vector3) {
    let descriptor = face.descriptor();
    let distance = match camera.distance() {
        d if d > 0.0 => d,
        _ => FALLBACK_SNAP_DISTANCE,
    };
    (
        camera.target + descriptor.direction() * distance,
        descriptor.canonical_up(),
    )
}

/// 直接旋转主相机：先绕相机右轴俯仰，再绕世界 Y 轴偏航
///
/// 同时作用于相机到目标的偏移和上方向，不带阻尼。
pub fn apply_orbit(camera: &mut CameraState, yaw: f64, pitch: f64) {
    let right = Unit::new_normalize(camera.right());
    let rotation = Rotation::from_axis_angle(&Vector3::y_axis(), yaw)
        * Rotation::from_axis_angle(&right, pitch);

    let offset = camera.position - camera.target;
    camera.position = camera.target + rotation * offset;
    camera.up = rotation * camera.up;
}

/// 交互状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CubeState {
    #[default]
    Idle,
    Dragging,
}

/// 交互产生的动作
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CubeAction {
    None,
    /// 过渡到指定面的标准视图
    SnapTo(CubeFace),
    /// 直接旋转主相机（弧度）
    Orbit { yaw: f64, pitch: f64 },
}

/// 按下时记录的信息
#[derive(Debug, Clone, Copy)]
struct Press {
    origin: Point2,
    last: Point2,
    at: Duration,
}

/// 屏幕上的一个轴标签
#[derive(Debug, Clone, PartialEq)]
pub struct AxisLabel {
    pub text: &'static str,
    pub color: Color,
    /// 控件局部像素坐标
    pub position: Point2,
    pub visible: bool,
}

/// 投影后的一个面
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedFace {
    pub face: CubeFace,
    pub corners: [Point2; 4],
    pub color: Color,
    /// 面中心在立方体相机空间的 z（越大越靠近观察者）
    pub depth: f64,
    pub front_facing: bool,
}

/// 视图立方体
#[derive(Debug, Clone)]
pub struct ViewCube {
    /// 控件边长（像素）
    pub size: f64,

    /// 与视口右下角的距离（像素）
    pub margin: f64,

    /// 判定为拖动的按住时长
    pub drag_time: Duration,

    /// 判定为拖动的移动距离（像素）
    pub drag_distance: f64,

    /// 拖动旋转速度（弧度/像素）
    pub rotate_speed: f64,

    orientation: Rotation,
    camera: CameraState,
    state: CubeState,
    press: Option<Press>,
    hovered: Option<CubeFace>,
}

impl ViewCube {
    pub fn new(size: f64, margin: f64) -> Self {
        let mut camera = CameraState::new(1.0);
        camera.fov_degrees = 50.0;
        camera.near = 0.1;
        camera.far = 100.0;
        camera.position = Point3::new(0.0, 0.0, 3.0);
        camera.target = Point3::origin();
        camera.up = Vector3::y();

        Self {
            size,
            margin,
            drag_time: Duration::from_millis(200),
            drag_distance: 5.0,
            rotate_speed: 0.01,
            orientation: Rotation::identity(),
            camera,
            state: CubeState::Idle,
            press: None,
            hovered: None,
        }
    }

    /// 每帧同步：立方体姿态直接取主相机姿态
    pub fn sync(&mut self, snapshot: &CameraSnapshot) {
        self.orientation = snapshot.orientation;
    }

    pub fn orientation(&self) -> Rotation {
        self.orientation
    }

    pub fn state(&self) -> CubeState {
        self.state
    }

    pub fn hovered(&self) -> Option<CubeFace> {
        self.hovered
    }

    /// 控件左上角在视口中的位置
    pub fn origin_in(&self, viewport_width: f64, viewport_height: f64) -> Point2 {
        Point2::new(
            viewport_width - self.margin - self.size,
            viewport_height - self.margin - self.size,
        )
    }

    /// 视口坐标转控件局部坐标，不在控件内时返回 `None`
    pub fn to_local(&self, screen: Point2, viewport_width: f64, viewport_height: f64) -> Option<Point2> {
        let origin = self.origin_in(viewport_width, viewport_height);
        let local = Point2::new(screen.x - origin.x, screen.y - origin.y);
        let inside = (0.0..=self.size).contains(&local.x) && (0.0..=self.size).contains(&local.y);
        inside.then_some(local)
    }

    /// 射线检测：控件局部坐标下命中的面
    pub fn hit_test(&self, local: Point2) -> Option<CubeFace> {
        let (origin, direction) = self.camera.screen_ray(&local, self.size, self.size)?;

        let inverse = self.orientation.inverse();
        let origin = inverse * origin;
        let direction = inverse * direction;

        let t = intersect_unit_cube(&origin, &direction)?;
        Some(CubeFace::from_local_point(&(origin + direction * t)))
    }

    /// 更新悬停面
    pub fn hover(&mut self, local: Option<Point2>) {
        self.hovered = local.and_then(|p| self.hit_test(p));
    }

    /// 按下
    pub fn pointer_down(&mut self, local: Point2, now: Duration) {
        self.press = Some(Press {
            origin: local,
            last: local,
            at: now,
        });
        self.state = CubeState::Idle;
    }

    /// 移动：超过时间或距离阈值后进入拖动，拖动中返回旋转量
    pub fn pointer_move(&mut self, local: Point2, now: Duration) -> CubeAction {
        let Some(press) = self.press.as_mut() else {
            return CubeAction::None;
        };

        if self.state == CubeState::Idle {
            let held = now.saturating_sub(press.at);
            let moved = nalgebra::distance(&press.origin, &local);
            if held > self.drag_time || moved > self.drag_distance {
                self.state = CubeState::Dragging;
            }
        }

        if self.state != CubeState::Dragging {
            return CubeAction::None;
        }

        let dx = local.x - press.last.x;
        let dy = local.y - press.last.y;
        press.last = local;

        if dx == 0.0 && dy == 0.0 {
            return CubeAction::None;
        }
        CubeAction::Orbit {
            yaw: -dx * self.rotate_speed,
            pitch: -dy * self.rotate_speed,
        }
    }

    /// 抬起：快速点击命中某个面时返回吸附动作
    pub fn pointer_up(&mut self, local: Point2, now: Duration) -> CubeAction {
        let press = self.press.take();
        let was_dragging = self.state == CubeState::Dragging;
        self.state = CubeState::Idle;

        let Some(press) = press else {
            return CubeAction::None;
        };
        if was_dragging
            || now.saturating_sub(press.at) > self.drag_time
            || nalgebra::distance(&press.origin, &local) > self.drag_distance
        {
            return CubeAction::None;
        }

        match self.hit_test(local) {
            Some(face) => {
                tracing::debug!("View cube face clicked: {}", face.descriptor().label);
                CubeAction::SnapTo(face)
            }
            None => CubeAction::None,
        }
    }

    /// 把立方体局部坐标投影到控件像素坐标，返回 (像素坐标, NDC 深度)
    fn project(&self, local: &Point3) -> (Point2, f64) {
        let ndc = self.camera.project(&(self.orientation * local));
        (ndc_to_screen(&ndc, self.size, self.size), ndc.z)
    }

    /// X/Y/Z 轴标签
    pub fn labels(&self) -> [AxisLabel; 3] {
        let view = (self.camera.position - self.camera.target).normalize();
        let label = |text, color, axis: Vector3| {
            let direction = self.orientation * axis;
            let (position, depth) = self.project(&Point3::from(axis * LABEL_DISTANCE));
            let facing = direction.dot(&view);
            AxisLabel {
                text,
                color,
                position,
                visible: depth < 1.0 && facing >= LABEL_FACING_THRESHOLD,
            }
        };
        [
            label("X", Color::RED, Vector3::x()),
            label("Y", Color::GREEN, Vector3::y()),
            label("Z", Color::BLUE, Vector3::z()),
        ]
    }

    /// 六个面的投影，按由远到近排序
    pub fn faces(&self) -> Vec<ProjectedFace> {
        let view_point = self.camera.position;
        let mut faces: Vec<ProjectedFace> = FACES
            .iter()
            .map(|descriptor| {
                let normal = descriptor.direction();
                let (u, v) = face_tangents(&normal);
                let center = Point3::from(normal * HALF_EXTENT);
                let corners = [
                    center + (u + v) * HALF_EXTENT,
                    center + (u - v) * HALF_EXTENT,
                    center + (-u - v) * HALF_EXTENT,
                    center + (-u + v) * HALF_EXTENT,
                ]
                .map(|c| self.project(&c).0);

                let world_center = self.orientation * center;
                let world_normal = self.orientation * normal;
                ProjectedFace {
                    face: descriptor.face,
                    corners,
                    color: descriptor.color,
                    depth: world_center.z,
                    front_facing: world_normal.dot(&(view_point - world_center)) > 0.0,
                }
            })
            .collect();
        faces.sort_by(|a, b| a.depth.total_cmp(&b.depth));
        faces
    }

    /// 十二条棱
    pub fn edges(&self) -> Vec<(Point2, Point2)> {
        let corner = |i: u8| {
            let s = |bit: u8| if i & bit != 0 { HALF_EXTENT } else { -HALF_EXTENT };
            Point3::new(s(1), s(2), s(4))
        };
        let mut edges = Vec::with_capacity(12);
        for i in 0u8..8 {
            for bit in [1u8, 2, 4] {
                if i & bit == 0 {
                    let a = self.project(&corner(i)).0;
                    let b = self.project(&corner(i | bit)).0;
                    edges.push((a, b));
                }
            }
        }
        edges
    }

    /// 三条坐标轴
    pub fn axes(&self) -> [(Point2, Point2, Color); 3] {
        let center = self.project(&Point3::origin()).0;
        let tip = |axis: Vector3| self.project(&Point3::from(axis * AXIS_LENGTH)).0;
        [
            (center, tip(Vector3::x()), Color::RED),
            (center, tip(Vector3::y()), Color::GREEN),
            (center, tip(Vector3::z()), Color::BLUE),
        ]
    }
}

impl Default for ViewCube {
    fn default() -> Self {
        Self::new(120.0, 20.0)
    }
}

/// 与法线垂直的两条切向量
fn face_tangents(normal: &Vector3) -> (Vector3, Vector3) {
    if normal.x.abs() > 0.5 {
        (Vector3::y(), Vector3::z())
    } else if normal.y.abs() > 0.5 {
        (Vector3::z(), Vector3::x())
    } else {
        (Vector3::x(), Vector3::y())
    }
}

/// 射线与以原点为中心的单位立方体求交（slab 法），返回最近的非负参数
fn intersect_unit_cube(origin: &Point3, direction: &Vector3) -> Option<f64> {
    let mut t_min = f64::NEG_INFINITY;
    let mut t_max = f64::INFINITY;

    for axis in 0..3 {
        let o = origin[axis];
        let d = direction[axis];
        if d.abs() < 1e-12 {
            if !(-HALF_EXTENT..=HALF_EXTENT).contains(&o) {
                return None;
            }
            continue;
        }
        let t1 = (-HALF_EXTENT - o) / d;
        let t2 = (HALF_EXTENT - o) / d;
        t_min = t_min.max(t1.min(t2));
        t_max = t_max.min(t1.max(t2));
    }

    if t_max < t_min || t_max < 0.0 {
        return None;
    }
    Some(if t_min >= 0.0 { t_min } else { t_max })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transition::{CameraTransition, TransitionSlot, DEFAULT_SNAP_DURATION};
    use dxview_core::math::{approx_eq_tol, points_approx_eq};

    fn main_camera() -> CameraState {
        let mut camera = CameraState::new(1.0);
        camera.position = Point3::new(10.0, 20.0, 30.0);
        camera.target = Point3::new(1.0, 2.0, 3.0);
        camera
    }

    #[test]
    fn test_face_table() {
        for (i, descriptor) in FACES.iter().enumerate() {
            assert_eq!(descriptor.face.index(), i);
            assert!(approx_eq_tol(descriptor.direction().norm(), 1.0, 1e-12));
            assert!(approx_eq_tol(descriptor.direction().dot(&descriptor.canonical_up()), 0.0, 1e-12));
        }
        assert_eq!(CubeFace::Top.descriptor().canonical_up(), Vector3::new(0.0, 0.0, -1.0));
        assert_eq!(CubeFace::Bottom.descriptor().canonical_up(), Vector3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_face_from_local_point() {
        assert_eq!(CubeFace::from_local_point(&Point3::new(0.5, 0.1, -0.2)), CubeFace::Right);
        assert_eq!(CubeFace::from_local_point(&Point3::new(0.1, -0.5, 0.2)), CubeFace::Bottom);
        assert_eq!(CubeFace::from_local_point(&Point3::new(0.1, 0.2, -0.5)), CubeFace::Back);
    }

    #[test]
    fn test_center_click_hits_front_face_when_unrotated() {
        let cube = ViewCube::default();
        assert_eq!(cube.hit_test(Point2::new(60.0, 60.0)), Some(CubeFace::Front));
        assert_eq!(cube.hit_test(Point2::new(1.0, 1.0)), None);
    }

    #[test]
    fn test_hit_test_follows_orientation() {
        let mut cube = ViewCube::default();
        // 绕 Y 轴转 90°：局部 -X 面朝向立方体相机
        let snapshot = CameraSnapshot {
            position: Point3::new(10.0, 0.0, 0.0),
            target: Point3::origin(),
            up: Vector3::y(),
            orientation: Rotation::from_axis_angle(&Vector3::y_axis(), std::f64::consts::FRAC_PI_2),
        };
        cube.sync(&snapshot);
        assert_eq!(cube.hit_test(Point2::new(60.0, 60.0)), Some(CubeFace::Left));
    }

    #[test]
    fn test_click_right_face_snaps_camera() {
        let mut camera = main_camera();
        let d = camera.distance();
        let target = camera.target;

        let (position, up) = snap_pose(CubeFace::Right, &camera.snapshot());
        let mut slot = TransitionSlot::new();
        slot.start(CameraTransition::new(&camera, position, target, up, DEFAULT_SNAP_DURATION));

        for _ in 0..40 {
            slot.tick(Duration::from_millis(16), &mut camera);
        }
        assert!(!slot.is_active());
        assert!(points_approx_eq(&camera.position, &(target + Vector3::new(d, 0.0, 0.0)), 1e-9));
        assert_eq!(camera.up, Vector3::y());
        assert!(points_approx_eq(&camera.target, &target, 1e-12));
    }

    #[test]
    fn test_snap_with_zero_distance_uses_fallback() {
        let mut camera = main_camera();
        camera.position = camera.target;
        let (position, _) = snap_pose(CubeFace::Front, &camera.snapshot());
        assert!(approx_eq_tol(position.z - camera.target.z, FALLBACK_SNAP_DISTANCE, 1e-12));
    }

    #[test]
    fn test_quick_click_versus_drag() {
        let mut cube = ViewCube::default();
        let center = Point2::new(60.0, 60.0);

        cube.pointer_down(center, Duration::from_millis(0));
        assert_eq!(cube.pointer_move(Point2::new(61.0, 60.0), Duration::from_millis(20)), CubeAction::None);
        assert_eq!(
            cube.pointer_up(Point2::new(61.0, 60.0), Duration::from_millis(50)),
            CubeAction::SnapTo(CubeFace::Front)
        );

        cube.pointer_down(center, Duration::from_millis(1000));
        let action = cube.pointer_move(Point2::new(80.0, 60.0), Duration::from_millis(1020));
        assert_eq!(cube.state(), CubeState::Dragging);
        match action {
            CubeAction::Orbit { yaw, pitch } => {
                assert!(approx_eq_tol(yaw, -0.2, 1e-12));
                assert_eq!(pitch, 0.0);
            }
            other => panic!("expected orbit, got {:?}", other),
        }
        assert_eq!(cube.pointer_up(Point2::new(80.0, 60.0), Duration::from_millis(1100)), CubeAction::None);
        assert_eq!(cube.state(), CubeState::Idle);

        // 按住太久也不算点击
        cube.pointer_down(center, Duration::from_millis(2000));
        assert_eq!(cube.pointer_up(center, Duration::from_millis(2300)), CubeAction::None);
    }

    #[test]
    fn test_direct_orbit_preserves_distance() {
        let mut camera = main_camera();
        let d = camera.distance();
        let before = camera.position;
        apply_orbit(&mut camera, 0.3, -0.2);
        assert!(approx_eq_tol(camera.distance(), d, 1e-9));
        assert!((camera.position - before).norm() > 1e-3);
        assert!(approx_eq_tol(camera.up.norm(), 1.0, 1e-12));
    }

    #[test]
    fn test_labels_hide_when_pointing_away() {
        let mut cube = ViewCube::default();
        let labels = cube.labels();
        assert!(labels.iter().all(|l| l.visible));

        // 转 180°：Z 标签指向背面
        cube.sync(&CameraSnapshot {
            position: Point3::new(0.0, 0.0, -10.0),
            target: Point3::origin(),
            up: Vector3::y(),
            orientation: Rotation::from_axis_angle(&Vector3::y_axis(), std::f64::consts::PI),
        });
        let labels = cube.labels();
        assert!(labels[1].visible);
        assert!(!labels[2].visible);
    }

    #[test]
    fn test_faces_sorted_back_to_front() {
        let cube = ViewCube::default();
        let faces = cube.faces();
        assert_eq!(faces.len(), 6);
        assert_eq!(faces.last().map(|f| f.face), Some(CubeFace::Front));
        assert_eq!(faces.first().map(|f| f.face), Some(CubeFace::Back));
        assert_eq!(faces.iter().filter(|f| f.front_facing).count(), 1);
        assert_eq!(cube.edges().len(), 12);
    }
}
