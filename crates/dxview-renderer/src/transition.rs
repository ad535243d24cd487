//! 相机过渡动画
//!
//! 位置和上方向分别线性插值，插值系数经二次缓入缓出曲线映射。
//! 同一时刻最多只有一个过渡，新过渡直接替换旧过渡，从相机当前姿态出发。

use crate::camera::CameraState;
use dxview_core::math::{Point3, Vector3};
use std::time::Duration;

/// 视图吸附的默认时长
pub const DEFAULT_SNAP_DURATION: Duration = Duration::from_millis(500);

/// 二次缓入缓出
pub fn ease_in_out_quad(progress: f64) -> f64 {
    let p = progress.clamp(0.0, 1.0);
    if p < 0.5 {
        2.0 * p * p
    } else {
        1.0 - (-2.0 * p + 2.0).powi(2) / 2.0
    }
}

/// 一段进行中的相机过渡
#[derive(Debug, Clone, PartialEq)]
pub struct CameraTransition {
    start_position: Point3,
    start_up: Vector3,
    end_position: Point3,
    end_up: Vector3,
    target: Point3,
    duration: Duration,
    elapsed: Duration,
}

impl CameraTransition {
    /// 从相机当前姿态出发的过渡
    pub fn new(
        camera: &CameraState,
        end_position: Point3,
        target: Point3,
        end_up: Vector3,
        duration: Duration,
    ) -> Self {
        Self {
            start_position: camera.position,
            start_up: camera.up,
            end_position,
            end_up,
            target,
            duration,
            elapsed: Duration::ZERO,
        }
    }

    /// 线性进度 [0, 1]
    pub fn progress(&self) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    pub fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }

    pub fn end_position(&self) -> Point3 {
        self.end_position
    }

    pub fn end_up(&self) -> Vector3 {
        self.end_up
    }

    /// 推进 `dt` 并写入相机，返回是否已结束
    pub fn advance(&mut self, dt: Duration, camera: &mut CameraState) -> bool {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        let t = ease_in_out_quad(self.progress());

        camera.position = self.start_position.lerp(&self.end_position, t);
        camera.up = self.start_up.lerp(&self.end_up, t);
        camera.target = self.target;

        self.is_finished()
    }
}

/// 单个过渡槽
#[derive(Debug, Clone, Default)]
pub struct TransitionSlot {
    active: Option<CameraTransition>,
}

impl TransitionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// 开始新过渡，替换进行中的过渡
    pub fn start(&mut self, transition: CameraTransition) {
        if let Some(previous) = self.active.replace(transition) {
            tracing::debug!(
                "Camera transition replaced at {:.0}% progress",
                previous.progress() * 100.0
            );
        }
    }

    pub fn cancel(&mut self) {
        self.active = None;
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn current(&self) -> Option<&CameraTransition> {
        self.active.as_ref()
    }

    /// 推进当前过渡，返回本帧是否驱动了相机
    pub fn tick(&mut self, dt: Duration, camera: &mut CameraState) -> bool {
        let Some(transition) = self.active.as_mut() else {
            return false;
        };
        if transition.advance(dt, camera) {
            self.active = None;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dxview_core::math::{approx_eq, points_approx_eq};

    #[test]
    fn test_easing_curve() {
        assert!(approx_eq(ease_in_out_quad(0.0), 0.0));
        assert!(approx_eq(ease_in_out_quad(0.25), 0.125));
        assert!(approx_eq(ease_in_out_quad(0.5), 0.5));
        assert!(approx_eq(ease_in_out_quad(0.75), 0.875));
        assert!(approx_eq(ease_in_out_quad(1.0), 1.0));
        assert!(approx_eq(ease_in_out_quad(2.0), 1.0));
    }

    #[test]
    fn test_transition_reaches_end_after_duration() {
        let mut camera = CameraState::new(1.0);
        let end = Point3::new(0.0, 0.0, 50.0);
        let mut slot = TransitionSlot::new();
        slot.start(CameraTransition::new(
            &camera,
            end,
            Point3::origin(),
            Vector3::y(),
            DEFAULT_SNAP_DURATION,
        ));

        assert!(slot.tick(Duration::from_millis(250), &mut camera));
        let halfway = Point3::new(50.0, 50.0, 75.0);
        assert!(points_approx_eq(&camera.position, &halfway, 1e-9));
        assert!(slot.is_active());

        assert!(slot.tick(Duration::from_millis(300), &mut camera));
        assert!(points_approx_eq(&camera.position, &end, 1e-12));
        assert!(!slot.is_active());
        assert!(!slot.tick(Duration::from_millis(16), &mut camera));
    }

    #[test]
    fn test_new_transition_replaces_old_from_current_pose() {
        let mut camera = CameraState::new(1.0);
        let mut slot = TransitionSlot::new();
        slot.start(CameraTransition::new(
            &camera,
            Point3::new(100.0, 0.0, 0.0),
            Point3::origin(),
            Vector3::y(),
            DEFAULT_SNAP_DURATION,
        ));
        slot.tick(Duration::from_millis(100), &mut camera);
        let mid_flight = camera.position;

        let second = CameraTransition::new(
            &camera,
            Point3::new(0.0, 0.0, 100.0),
            Point3::origin(),
            Vector3::y(),
            DEFAULT_SNAP_DURATION,
        );
        slot.start(second);
        slot.tick(Duration::ZERO, &mut camera);
        assert!(points_approx_eq(&camera.position, &mid_flight, 1e-12));

        slot.tick(DEFAULT_SNAP_DURATION, &mut camera);
        assert!(points_approx_eq(&camera.position, &Point3::new(0.0, 0.0, 100.0), 1e-12));
    }
}
