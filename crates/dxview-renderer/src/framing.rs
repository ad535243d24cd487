//! 相机取景
//!
//! 根据模型包围盒计算相机位置，并生成随模型尺寸缩放的地面网格。

use crate::camera::{CameraState, OrthoFrustum, ViewMode};
use dxview_core::math::{BoundingBox3, Point3, Vector3};
use dxview_core::properties::Color;

/// 取景留白系数
pub const FIT_MARGIN: f64 = 1.5;

/// 网格最大分段数
pub const MAX_GRID_DIVISIONS: u32 = 100;

/// 透视取景：相机放在包围盒中心的 (d, d, d) 方向
///
/// `d = (maxDim / 2) / tan(fov / 2) * 1.5`。零尺寸包围盒得到 `d = 0`，
/// 相机与目标重合，这是允许的退化结果。
pub fn fit_to_volume(volume: &BoundingBox3, camera: &CameraState, fov_degrees: f64) -> CameraState {
    let center = volume.center();
    let distance = fit_distance(volume.max_dimension(), fov_degrees);

    CameraState {
        position: center + Vector3::repeat(distance),
        target: center,
        mode: ViewMode::Perspective,
        fov_degrees,
        ..camera.clone()
    }
}

/// 把最大尺寸装进视场所需的距离
pub fn fit_distance(max_dimension: f64, fov_degrees: f64) -> f64 {
    let half_fov = (fov_degrees / 2.0).to_radians();
    (max_dimension / 2.0 / half_fov.tan()).abs() * FIT_MARGIN
}

/// 正交取景：沿 +Z 俯视包围盒中心，视锥由 XY 尺寸和宽高比决定
pub fn fit_orthographic(volume: &BoundingBox3, camera: &CameraState, aspect: f64) -> CameraState {
    let center = volume.center();
    let size = volume.size();
    let max_dim = size.x.max(size.y);

    CameraState {
        position: center + Vector3::new(0.0, 0.0, max_dim),
        target: center,
        up: Vector3::y(),
        mode: ViewMode::Orthographic,
        aspect,
        frustum: OrthoFrustum::from_height(max_dim, aspect),
        zoom: 1.0,
        ..camera.clone()
    }
}

/// 没有模型时的正交相机
pub fn default_orthographic(camera: &CameraState) -> CameraState {
    CameraState {
        position: Point3::new(0.0, 0.0, 100.0),
        target: Point3::origin(),
        up: Vector3::y(),
        mode: ViewMode::Orthographic,
        frustum: OrthoFrustum::from_height(CameraState::DEFAULT_FRUSTUM_SIZE, camera.aspect),
        zoom: 1.0,
        ..camera.clone()
    }
}

/// 地面网格（XZ 平面，中心在世界原点）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundGrid {
    /// 边长
    pub size: f64,

    /// 分段数
    pub divisions: u32,

    /// 所在高度
    pub elevation: f64,

    /// 是否显示
    pub visible: bool,
}

impl GroundGrid {
    pub const CENTER_COLOR: Color = Color::from_hex(0xcccccc);
    pub const LINE_COLOR: Color = Color::from_hex(0xe0e0e0);

    /// 按包围盒生成网格：边长 `ceil(maxDim * 2)`，分段 `min(ceil(边长 / 10), 100)`
    pub fn for_volume(volume: &BoundingBox3) -> Self {
        let size = (volume.max_dimension() * 2.0).ceil();
        let divisions = ((size / 10.0).ceil() as u32).min(MAX_GRID_DIVISIONS);
        let elevation = if volume.is_empty() { 0.0 } else { volume.min.y };

        Self {
            size,
            divisions,
            elevation,
            visible: true,
        }
    }

    /// 相邻网格线间距
    pub fn step(&self) -> f64 {
        if self.divisions == 0 {
            0.0
        } else {
            self.size / self.divisions as f64
        }
    }

    /// 展开为线段，中线使用强调色
    pub fn lines(&self) -> Vec<(Point3, Point3, Color)> {
        if self.divisions == 0 || self.size <= 0.0 {
            return Vec::new();
        }

        let half = self.size / 2.0;
        let step = self.step();
        let y = self.elevation;
        let center = self.divisions / 2;

        let mut lines = Vec::with_capacity((self.divisions as usize + 1) * 2);
        for i in 0..=self.divisions {
            let k = -half + i as f64 * step;
            let color = if i == center {
                Self::CENTER_COLOR
            } else {
                Self::LINE_COLOR
            };
            lines.push((Point3::new(-half, y, k), Point3::new(half, y, k), color));
            lines.push((Point3::new(k, y, -half), Point3::new(k, y, half), color));
        }
        lines
    }
}

impl Default for GroundGrid {
    fn default() -> Self {
        Self {
            size: 1000.0,
            divisions: 50,
            elevation: 0.0,
            visible: false,
        }
    }
}

/// 坐标轴指示（原点处的 X/Y/Z 三条线）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxesHelper {
    pub length: f64,
    pub visible: bool,
}

impl AxesHelper {
    pub fn lines(&self) -> [(Point3, Point3, Color); 3] {
        let o = Point3::origin();
        [
            (o, Point3::new(self.length, 0.0, 0.0), Color::RED),
            (o, Point3::new(0.0, self.length, 0.0), Color::GREEN),
            (o, Point3::new(0.0, 0.0, self.length), Color::BLUE),
        ]
    }
}

impl Default for AxesHelper {
    fn default() -> Self {
        Self {
            length: 100.0,
            visible: false,
        }
    }
}
