//! 3D相机
//!
//! 透视/正交两种投影共用同一个相机状态。NDC 约定与 OpenGL 一致，
//! 深度范围为 [-1, 1]，深度 ≥ 1 表示在远平面之外或相机背后。

use dxview_core::math::{Matrix4, Point2, Point3, Rotation, Vector3};
use nalgebra as na;

/// 投影模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// 3D透视
    #[default]
    Perspective,
    /// 2D正交（俯视）
    Orthographic,
}

/// 正交视锥的半边界（相机空间）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthoFrustum {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl OrthoFrustum {
    /// 以高度和宽高比构造对称视锥
    pub fn from_height(height: f64, aspect: f64) -> Self {
        Self {
            left: -height * aspect / 2.0,
            right: height * aspect / 2.0,
            top: height / 2.0,
            bottom: -height / 2.0,
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }
}

/// 相机状态
#[derive(Debug, Clone, PartialEq)]
pub struct CameraState {
    /// 相机位置（世界坐标）
    pub position: Point3,

    /// 观察目标
    pub target: Point3,

    /// 上方向（不要求单位长度）
    pub up: Vector3,

    /// 投影模式
    pub mode: ViewMode,

    /// 垂直视场角（度）
    pub fov_degrees: f64,

    /// 视口宽高比
    pub aspect: f64,

    /// 近裁剪面
    pub near: f64,

    /// 远裁剪面
    pub far: f64,

    /// 正交视锥
    pub frustum: OrthoFrustum,

    /// 正交缩放（视锥按此值缩小）
    pub zoom: f64,
}

impl CameraState {
    /// 正交视锥在窗口变化时使用的默认高度
    pub const DEFAULT_FRUSTUM_SIZE: f64 = 200.0;

    /// 创建新的相机
    pub fn new(aspect: f64) -> Self {
        Self {
            position: Point3::new(100.0, 100.0, 100.0),
            target: Point3::origin(),
            up: Vector3::y(),
            mode: ViewMode::Perspective,
            fov_degrees: 45.0,
            aspect,
            near: 0.1,
            far: 10000.0,
            frustum: OrthoFrustum::from_height(Self::DEFAULT_FRUSTUM_SIZE, aspect),
            zoom: 1.0,
        }
    }

    /// 更新视口宽高比（正交视锥回到默认尺寸）
    pub fn set_aspect(&mut self, aspect: f64) {
        self.aspect = aspect;
        self.frustum = OrthoFrustum::from_height(Self::DEFAULT_FRUSTUM_SIZE, aspect);
    }

    /// 相机到目标的距离
    pub fn distance(&self) -> f64 {
        na::distance(&self.position, &self.target)
    }

    /// 相机姿态：局部 -Z 指向目标，局部 +Y 接近 `up`
    pub fn orientation(&self) -> Rotation {
        look_rotation(&self.position, &self.target, &self.up)
    }

    /// 相机局部右方向（世界坐标）
    pub fn right(&self) -> Vector3 {
        self.orientation() * Vector3::x()
    }

    /// 相机局部上方向（与视线正交）
    pub fn screen_up(&self) -> Vector3 {
        self.orientation() * Vector3::y()
    }

    /// 观察方向
    pub fn forward(&self) -> Vector3 {
        self.orientation() * -Vector3::z()
    }

    /// 视图矩阵
    pub fn view_matrix(&self) -> Matrix4 {
        let world = na::Isometry3::from_parts(
            na::Translation3::from(self.position.coords),
            self.orientation(),
        );
        world.inverse().to_homogeneous()
    }

    /// 投影矩阵
    pub fn projection_matrix(&self) -> Matrix4 {
        match self.mode {
            ViewMode::Perspective => Matrix4::new_perspective(
                self.aspect,
                self.fov_degrees.to_radians(),
                self.near,
                self.far,
            ),
            ViewMode::Orthographic => {
                let zoom = self.zoom.max(f64::EPSILON);
                Matrix4::new_orthographic(
                    self.frustum.left / zoom,
                    self.frustum.right / zoom,
                    self.frustum.bottom / zoom,
                    self.frustum.top / zoom,
                    self.near,
                    self.far,
                )
            }
        }
    }

    /// 视图投影矩阵
    pub fn view_projection(&self) -> Matrix4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// 世界坐标转 NDC（含深度）
    pub fn project(&self, point: &Point3) -> Point3 {
        self.view_projection().transform_point(point)
    }

    /// 世界坐标转屏幕坐标，位于相机背后或裁剪范围外时返回 `None`
    pub fn world_to_screen(&self, point: &Point3, width: f64, height: f64) -> Option<Point2> {
        let clip = self.view_projection() * point.to_homogeneous();
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.xyz() / clip.w;
        if ndc.z > 1.0 || ndc.z < -1.0 {
            return None;
        }
        Some(ndc_to_screen(&Point3::from(ndc), width, height))
    }

    /// 屏幕坐标对应的世界射线（原点，单位方向）
    pub fn screen_ray(&self, screen: &Point2, width: f64, height: f64) -> Option<(Point3, Vector3)> {
        let inverse = self.view_projection().try_inverse()?;
        let ndc = screen_to_ndc(screen, width, height);
        let near = inverse.transform_point(&Point3::new(ndc.x, ndc.y, -1.0));
        let far = inverse.transform_point(&Point3::new(ndc.x, ndc.y, 1.0));
        let direction = (far - near).try_normalize(f64::EPSILON)?;
        Some((near, direction))
    }

    /// 当前相机的只读快照
    pub fn snapshot(&self) -> CameraSnapshot {
        CameraSnapshot {
            position: self.position,
            target: self.target,
            up: self.up,
            orientation: self.orientation(),
        }
    }
}

impl Default for CameraState {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// 每帧传给视图立方体的相机快照
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSnapshot {
    pub position: Point3,
    pub target: Point3,
    pub up: Vector3,
    pub orientation: Rotation,
}

impl CameraSnapshot {
    /// 相机到目标的距离
    pub fn distance(&self) -> f64 {
        na::distance(&self.position, &self.target)
    }
}

/// 相机朝向：局部 +Z 指向 `eye - target`，X = up × Z，Y = Z × X
pub fn look_rotation(eye: &Point3, target: &Point3, up: &Vector3) -> Rotation {
    let z = (eye - target)
        .try_normalize(f64::EPSILON)
        .unwrap_or_else(Vector3::z);

    let x = up
        .cross(&z)
        .try_normalize(1e-12)
        .unwrap_or_else(|| any_perpendicular(&z));
    let y = z.cross(&x);

    let basis = na::Matrix3::from_columns(&[x, y, z]);
    Rotation::from_rotation_matrix(&na::Rotation3::from_matrix_unchecked(basis))
}

/// 与 `v` 垂直的任意单位向量
fn any_perpendicular(v: &Vector3) -> Vector3 {
    let helper = if v.y.abs() < 0.9 { Vector3::y() } else { Vector3::x() };
    helper.cross(v).normalize()
}

/// NDC 转屏幕像素（Y向下）
pub fn ndc_to_screen(ndc: &Point3, width: f64, height: f64) -> Point2 {
    Point2::new((ndc.x * 0.5 + 0.5) * width, (-ndc.y * 0.5 + 0.5) * height)
}

/// 屏幕像素转 NDC 的 XY
pub fn screen_to_ndc(screen: &Point2, width: f64, height: f64) -> Point2 {
    Point2::new(
        screen.x / width * 2.0 - 1.0,
        -(screen.y / height) * 2.0 + 1.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use dxview_core::math::{approx_eq_tol, points_approx_eq};

    #[test]
    fn test_orientation_looks_at_target() {
        let mut camera = CameraState::new(1.5);
        camera.position = Point3::new(0.0, 0.0, 10.0);
        camera.target = Point3::origin();

        let forward = camera.forward();
        assert!(approx_eq_tol(forward.z, -1.0, 1e-12));
        assert!(approx_eq_tol(camera.right().x, 1.0, 1e-12));
        assert!(approx_eq_tol(camera.screen_up().y, 1.0, 1e-12));
    }

    #[test]
    fn test_target_projects_to_viewport_center() {
        let camera = CameraState::new(800.0 / 600.0);
        let screen = camera.world_to_screen(&camera.target, 800.0, 600.0).unwrap();
        assert!(approx_eq_tol(screen.x, 400.0, 1e-6));
        assert!(approx_eq_tol(screen.y, 300.0, 1e-6));

        // 相机背后的点不可见
        let behind = camera.position + (camera.position - camera.target);
        assert!(camera.world_to_screen(&behind, 800.0, 600.0).is_none());
    }

    #[test]
    fn test_screen_ray_passes_through_target() {
        let camera = CameraState::new(1.0);
        let (origin, direction) = camera
            .screen_ray(&Point2::new(50.0, 50.0), 100.0, 100.0)
            .unwrap();
        let to_target = (camera.target - origin).normalize();
        assert!(approx_eq_tol(to_target.dot(&direction), 1.0, 1e-9));
    }

    #[test]
    fn test_degenerate_up_does_not_produce_nan() {
        let rotation = look_rotation(
            &Point3::new(0.0, 10.0, 0.0),
            &Point3::origin(),
            &Vector3::y(),
        );
        let z = rotation * Vector3::z();
        assert!(z.iter().all(|c| c.is_finite()));
        assert!(points_approx_eq(
            &Point3::from(z),
            &Point3::new(0.0, 1.0, 0.0),
            1e-12
        ));

        let zero_up = look_rotation(&Point3::new(0.0, 0.0, 5.0), &Point3::origin(), &Vector3::zeros());
        assert!((zero_up * Vector3::x()).iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_orthographic_projection_ignores_depth_for_xy() {
        let mut camera = CameraState::new(1.0);
        camera.mode = ViewMode::Orthographic;
        camera.position = Point3::new(0.0, 0.0, 100.0);
        camera.target = Point3::origin();
        camera.frustum = OrthoFrustum::from_height(20.0, 1.0);

        let a = camera.project(&Point3::new(5.0, 0.0, 0.0));
        let b = camera.project(&Point3::new(5.0, 0.0, -30.0));
        assert!(approx_eq_tol(a.x, 0.5, 1e-12));
        assert!(approx_eq_tol(a.x, b.x, 1e-12));

        camera.zoom = 2.0;
        let zoomed = camera.project(&Point3::new(5.0, 0.0, 0.0));
        assert!(approx_eq_tol(zoomed.x, 1.0, 1e-12));
    }
}
