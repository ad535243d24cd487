//! 距离测量
//!
//! 图纸单位按毫米解释。依次拾取两点得到一次测量，之后重新开始。

use crate::math::Point3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 显示单位制
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MeasureUnits {
    /// 公制（m / mm / μm）
    #[default]
    Metric,
    /// 英制（英尺 / 英寸）
    Imperial,
}

impl MeasureUnits {
    pub fn name(&self) -> &'static str {
        match self {
            MeasureUnits::Metric => "metric",
            MeasureUnits::Imperial => "imperial",
        }
    }
}

impl fmt::Display for MeasureUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MeasureUnits {
    type Err = UnknownUnits;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "metric" => Ok(MeasureUnits::Metric),
            "imperial" => Ok(MeasureUnits::Imperial),
            _ => Err(UnknownUnits(s.to_string())),
        }
    }
}

/// 无法识别的单位制名称
#[derive(Debug, Clone, thiserror::Error)]
#[error("Unknown measurement units: {0}")]
pub struct UnknownUnits(pub String);

/// 将毫米距离格式化为可读文本
pub fn format_distance(value: f64, units: MeasureUnits) -> String {
    match units {
        MeasureUnits::Metric => {
            if value >= 1000.0 {
                format!("{:.3} m", value / 1000.0)
            } else if value >= 1.0 {
                format!("{:.2} mm", value)
            } else {
                format!("{:.2} μm", value * 1000.0)
            }
        }
        MeasureUnits::Imperial => {
            let inches = value / 25.4;
            if inches >= 12.0 {
                let feet = (inches / 12.0).floor();
                let remaining = inches % 12.0;
                format!("{}' {:.2}\"", feet as i64, remaining)
            } else {
                format!("{:.2}\"", inches)
            }
        }
    }
}

/// 一次完成的测量
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub from: Point3,
    pub to: Point3,
}

impl Measurement {
    /// 直线距离
    pub fn distance(&self) -> f64 {
        nalgebra::distance(&self.from, &self.to)
    }
}

/// 测量工具状态
#[derive(Debug, Clone, Default)]
pub struct MeasureTool {
    /// 是否处于测量模式
    pub active: bool,

    /// 显示单位
    pub units: MeasureUnits,

    /// 等待配对的第一个点
    pending: Option<Point3>,

    /// 已完成的测量
    measurements: Vec<Measurement>,
}

impl MeasureTool {
    pub fn new(units: MeasureUnits) -> Self {
        Self {
            units,
            ..Default::default()
        }
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    /// 退出测量模式（保留已有结果）
    pub fn deactivate(&mut self) {
        self.active = false;
        self.pending = None;
    }

    /// 拾取一个点；凑满两点时返回新的测量
    pub fn add_point(&mut self, point: Point3) -> Option<Measurement> {
        if !self.active {
            return None;
        }
        match self.pending.take() {
            None => {
                self.pending = Some(point);
                None
            }
            Some(from) => {
                let measurement = Measurement { from, to: point };
                self.measurements.push(measurement);
                Some(measurement)
            }
        }
    }

    /// 当前等待配对的点
    pub fn pending_point(&self) -> Option<Point3> {
        self.pending
    }

    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    /// 最近一次测量的格式化结果
    pub fn last_result(&self) -> Option<String> {
        self.measurements
            .last()
            .map(|m| format_distance(m.distance(), self.units))
    }

    /// 清除所有测量
    pub fn clear(&mut self) {
        self.pending = None;
        self.measurements.clear();
    }
}
