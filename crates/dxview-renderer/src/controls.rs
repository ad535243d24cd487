//! 轨道控制器
//!
//! 绕目标点旋转、平移和推拉主相机。旋转始终以世界 Y 轴为极轴，
//! 输入先累积为增量，在 [`OrbitControls::update`] 中按阻尼系数逐帧释放。

use crate::camera::{CameraState, ViewMode};
use dxview_core::math::{Point2, Vector3};
use std::f64::consts::PI;

/// 极角与极点保持的最小距离
const POLAR_EPSILON: f64 = 1e-6;

/// 滚轮一格对应的缩放比例
const ZOOM_STEP: f64 = 0.95;

/// 轨道控制器
#[derive(Debug, Clone)]
pub struct OrbitControls {
    /// 是否允许旋转（正交模式下关闭）
    pub enable_rotate: bool,

    /// 是否允许平移
    pub enable_pan: bool,

    /// 是否允许缩放
    pub enable_zoom: bool,

    /// 是否启用惯性阻尼
    pub enable_damping: bool,

    /// 阻尼系数（每帧释放的增量比例）
    pub damping_factor: f64,

    /// 最小相机距离
    pub min_distance: f64,

    /// 最大相机距离
    pub max_distance: f64,

    /// 正交缩放范围
    pub min_zoom: f64,
    pub max_zoom: f64,

    /// 旋转速度（弧度/像素 × 2π / 视口高度）
    pub rotate_speed: f64,

    /// 待释放的方位角增量
    theta_delta: f64,

    /// 待释放的极角增量
    phi_delta: f64,

    /// 本帧的距离缩放
    scale: f64,

    /// 待释放的目标点平移
    pan_offset: Vector3,
}

impl OrbitControls {
    pub fn new(min_distance: f64, max_distance: f64, damping_factor: f64) -> Self {
        Self {
            enable_rotate: true,
            enable_pan: true,
            enable_zoom: true,
            enable_damping: true,
            damping_factor,
            min_distance,
            max_distance,
            min_zoom: 0.01,
            max_zoom: 1000.0,
            rotate_speed: 1.0,
            theta_delta: 0.0,
            phi_delta: 0.0,
            scale: 1.0,
            pan_offset: Vector3::zeros(),
        }
    }

    /// 鼠标拖动旋转（像素增量）
    pub fn rotate(&mut self, delta: Point2, viewport_height: f64) {
        if !self.enable_rotate || viewport_height <= 0.0 {
            return;
        }
        let per_pixel = 2.0 * PI * self.rotate_speed / viewport_height;
        self.theta_delta -= delta.x * per_pixel;
        self.phi_delta -= delta.y * per_pixel;
    }

    /// 屏幕空间平移（像素增量）
    pub fn pan(&mut self, camera: &CameraState, delta: Point2, viewport: (f64, f64)) {
        let (width, height) = viewport;
        if !self.enable_pan || width <= 0.0 || height <= 0.0 {
            return;
        }

        let (dx, dy) = match camera.mode {
            ViewMode::Perspective => {
                let target_distance =
                    camera.distance() * (camera.fov_degrees.to_radians() / 2.0).tan();
                (
                    2.0 * delta.x * target_distance / height,
                    2.0 * delta.y * target_distance / height,
                )
            }
            ViewMode::Orthographic => (
                delta.x * camera.frustum.width() / camera.zoom / width,
                delta.y * camera.frustum.height() / camera.zoom / height,
            ),
        };

        self.pan_offset += camera.right() * -dx + camera.screen_up() * dy;
    }

    /// 滚轮缩放，正值拉近
    pub fn wheel(&mut self, camera: &mut CameraState, delta: f64) {
        if !self.enable_zoom || delta == 0.0 {
            return;
        }
        if delta > 0.0 {
            self.dolly(camera, ZOOM_STEP);
        } else {
            self.dolly(camera, 1.0 / ZOOM_STEP);
        }
    }

    /// 按比例推拉（比例小于 1 表示拉近）
    pub fn dolly(&mut self, camera: &mut CameraState, factor: f64) {
        if !self.enable_zoom || factor <= 0.0 {
            return;
        }
        match camera.mode {
            ViewMode::Perspective => self.scale *= factor,
            ViewMode::Orthographic => {
                camera.zoom = (camera.zoom / factor).clamp(self.min_zoom, self.max_zoom);
            }
        }
    }

    /// 清除所有未释放的运动
    pub fn stop(&mut self) {
        self.theta_delta = 0.0;
        self.phi_delta = 0.0;
        self.scale = 1.0;
        self.pan_offset = Vector3::zeros();
    }

    /// 是否仍有惯性运动
    pub fn is_moving(&self) -> bool {
        self.theta_delta.abs() > 1e-9
            || self.phi_delta.abs() > 1e-9
            || self.pan_offset.norm_squared() > 1e-18
            || (self.scale - 1.0).abs() > 1e-12
    }

    /// 每帧调用：释放增量并把结果写回相机
    pub fn update(&mut self, camera: &mut CameraState) {
        let offset = camera.position - camera.target;

        let mut radius = offset.norm();
        let (mut theta, mut phi) = if radius == 0.0 {
            (0.0, PI / 2.0)
        } else {
            (
                offset.x.atan2(offset.z),
                (offset.y / radius).clamp(-1.0, 1.0).acos(),
            )
        };

        let release = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };

        theta += self.theta_delta * release;
        phi += self.phi_delta * release;
        phi = phi.clamp(POLAR_EPSILON, PI - POLAR_EPSILON);

        radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);

        camera.target += self.pan_offset * release;

        let sin_phi = phi.sin();
        let offset = Vector3::new(
            radius * sin_phi * theta.sin(),
            radius * phi.cos(),
            radius * sin_phi * theta.cos(),
        );
        camera.position = camera.target + offset;

        if self.enable_damping {
            self.theta_delta *= 1.0 - self.damping_factor;
            self.phi_delta *= 1.0 - self.damping_factor;
            self.pan_offset *= 1.0 - self.damping_factor;
        } else {
            self.theta_delta = 0.0;
            self.phi_delta = 0.0;
            self.pan_offset = Vector3::zeros();
        }
        self.scale = 1.0;
    }
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new(1.0, 5000.0, 0.05)
    }
}

/// 双指捏合缩放
///
/// 记录手势开始时的指间距和相机距离，之后按比例沿视线方向移动相机。
#[derive(Debug, Clone, Copy, Default)]
pub struct PinchZoom {
    start: Option<(f64, f64)>,
}

impl PinchZoom {
    /// 两指按下
    pub fn begin(&mut self, finger_distance: f64, camera: &CameraState) {
        if finger_distance > 0.0 {
            self.start = Some((finger_distance, camera.distance()));
        }
    }

    /// 两指移动
    pub fn update(&mut self, finger_distance: f64, camera: &mut CameraState) {
        let Some((initial_fingers, initial_distance)) = self.start else {
            return;
        };
        if finger_distance <= 0.0 {
            return;
        }
        let Some(direction) = (camera.position - camera.target).try_normalize(f64::EPSILON) else {
            return;
        };
        let distance = initial_distance * initial_fingers / finger_distance;
        camera.position = camera.target + direction * distance;
    }

    /// 手指抬起
    pub fn end(&mut self) {
        self.start = None;
    }

    pub fn is_active(&self) -> bool {
        self.start.is_some()
    }
}
