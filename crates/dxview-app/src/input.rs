//! 触控输入
//!
//! 跟踪按下的手指，把两指距离变化转换为捏合事件。

use dxview_core::math::Point2;

/// 捏合事件（参数为两指间距，像素）
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PinchEvent {
    Begin(f64),
    Update(f64),
    End,
}

/// 手指跟踪器
#[derive(Debug, Default)]
pub struct TouchTracker {
    /// 按下顺序排列的手指
    touches: Vec<(u64, Point2)>,
}

impl TouchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 是否处于两指捏合
    pub fn is_pinching(&self) -> bool {
        self.touches.len() >= 2
    }

    fn finger_distance(&self) -> Option<f64> {
        match self.touches.as_slice() {
            [(_, a), (_, b), ..] => Some((a - b).norm()),
            _ => None,
        }
    }

    pub fn touch_start(&mut self, id: u64, position: Point2) -> Option<PinchEvent> {
        self.touches.retain(|(existing, _)| *existing != id);
        self.touches.push((id, position));
        if self.touches.len() == 2 {
            self.finger_distance().map(PinchEvent::Begin)
        } else {
            None
        }
    }

    pub fn touch_move(&mut self, id: u64, position: Point2) -> Option<PinchEvent> {
        let index = self.touches.iter().position(|(existing, _)| *existing == id)?;
        self.touches[index].1 = position;
        if index < 2 {
            self.finger_distance().map(PinchEvent::Update)
        } else {
            None
        }
    }

    /// 抬起或取消；剩余两指以上时以新的两指重新开始
    pub fn touch_end(&mut self, id: u64) -> Option<PinchEvent> {
        let was_pinching = self.is_pinching();
        self.touches.retain(|(existing, _)| *existing != id);
        if !was_pinching {
            return None;
        }
        match self.finger_distance() {
            Some(distance) => Some(PinchEvent::Begin(distance)),
            None => Some(PinchEvent::End),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_fingers_pinch() {
        let mut tracker = TouchTracker::new();
        assert_eq!(tracker.touch_start(1, Point2::new(0.0, 0.0)), None);
        assert_eq!(
            tracker.touch_start(2, Point2::new(100.0, 0.0)),
            Some(PinchEvent::Begin(100.0))
        );
        assert!(tracker.is_pinching());

        assert_eq!(
            tracker.touch_move(2, Point2::new(200.0, 0.0)),
            Some(PinchEvent::Update(200.0))
        );
        assert_eq!(tracker.touch_end(1), Some(PinchEvent::End));
        assert!(!tracker.is_pinching());
        assert_eq!(tracker.touch_end(2), None);
    }

    #[test]
    fn test_third_finger_rebaselines() {
        let mut tracker = TouchTracker::new();
        tracker.touch_start(1, Point2::new(0.0, 0.0));
        tracker.touch_start(2, Point2::new(10.0, 0.0));
        assert_eq!(tracker.touch_start(3, Point2::new(0.0, 30.0)), None);
        assert_eq!(tracker.touch_move(3, Point2::new(0.0, 40.0)), None);

        assert_eq!(tracker.touch_end(2), Some(PinchEvent::Begin(40.0)));
    }

    #[test]
    fn test_single_finger_is_not_pinch() {
        let mut tracker = TouchTracker::new();
        tracker.touch_start(7, Point2::new(5.0, 5.0));
        assert_eq!(tracker.touch_move(7, Point2::new(6.0, 6.0)), None);
        assert_eq!(tracker.touch_move(8, Point2::new(6.0, 6.0)), None);
        assert_eq!(tracker.touch_end(7), None);
    }
}
