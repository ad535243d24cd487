//! 图纸实体
//!
//! 外部解析器产出的只读输入模型。几何字段保持可选，
//! 缺失字段由几何转换阶段判定为“无法渲染”而非错误。

use crate::math::Point3;
use serde::{Deserialize, Serialize};

/// 未指定图层时的默认图层名
pub const DEFAULT_LAYER: &str = "0";

/// 实体类型及其几何参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntityKind {
    Line {
        start: Option<Point3>,
        end: Option<Point3>,
    },
    Polyline {
        vertices: Vec<Point3>,
        closed: bool,
    },
    Circle {
        center: Option<Point3>,
        radius: Option<f64>,
    },
    Arc {
        center: Option<Point3>,
        radius: Option<f64>,
        /// 起始角（度）
        start_angle: Option<f64>,
        /// 终止角（度）
        end_angle: Option<f64>,
    },
    Spline {
        control_points: Vec<Point3>,
    },
    Point {
        position: Option<Point3>,
    },
    /// 本查看器不渲染的实体（文字、标注、填充等）
    Unsupported {
        type_name: String,
    },
}

impl EntityKind {
    /// 实体类型名（与DXF实体名一致）
    pub fn type_name(&self) -> &str {
        match self {
            EntityKind::Line { .. } => "LINE",
            EntityKind::Polyline { .. } => "POLYLINE",
            EntityKind::Circle { .. } => "CIRCLE",
            EntityKind::Arc { .. } => "ARC",
            EntityKind::Spline { .. } => "SPLINE",
            EntityKind::Point { .. } => "POINT",
            EntityKind::Unsupported { type_name } => type_name,
        }
    }
}

/// 一条图纸实体记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingEntity {
    /// 几何数据
    #[serde(flatten)]
    pub kind: EntityKind,

    /// 所属图层
    #[serde(default = "default_layer")]
    pub layer: String,

    /// ACI颜色索引
    #[serde(default)]
    pub color_index: Option<i32>,
}

fn default_layer() -> String {
    DEFAULT_LAYER.to_string()
}

impl DrawingEntity {
    /// 创建位于默认图层的实体
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            layer: default_layer(),
            color_index: None,
        }
    }

    /// 指定图层；空名称回落到默认图层
    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        let layer = layer.into();
        self.layer = if layer.is_empty() { default_layer() } else { layer };
        self
    }

    /// 指定颜色索引
    pub fn with_color_index(mut self, color_index: i32) -> Self {
        self.color_index = Some(color_index);
        self
    }

    /// 两点直线
    pub fn line(start: Point3, end: Point3) -> Self {
        Self::new(EntityKind::Line {
            start: Some(start),
            end: Some(end),
        })
    }

    /// 圆
    pub fn circle(center: Point3, radius: f64) -> Self {
        Self::new(EntityKind::Circle {
            center: Some(center),
            radius: Some(radius),
        })
    }

    /// 圆弧（角度单位为度）
    pub fn arc(center: Point3, radius: f64, start_angle: f64, end_angle: f64) -> Self {
        Self::new(EntityKind::Arc {
            center: Some(center),
            radius: Some(radius),
            start_angle: Some(start_angle),
            end_angle: Some(end_angle),
        })
    }

    /// 多段线
    pub fn polyline(vertices: Vec<Point3>, closed: bool) -> Self {
        Self::new(EntityKind::Polyline { vertices, closed })
    }

    /// 样条
    pub fn spline(control_points: Vec<Point3>) -> Self {
        Self::new(EntityKind::Spline { control_points })
    }

    /// 点
    pub fn point(position: Point3) -> Self {
        Self::new(EntityKind::Point {
            position: Some(position),
        })
    }

    /// 不支持的实体
    pub fn unsupported(type_name: impl Into<String>) -> Self {
        Self::new(EntityKind::Unsupported {
            type_name: type_name.into(),
        })
    }

    pub fn type_name(&self) -> &str {
        self.kind.type_name()
    }
}

/// 解析后的图纸文档
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrawingDocument {
    /// 文件头中的版本标记（$ACADVER）
    pub version: Option<String>,

    /// 按文件顺序排列的实体
    pub entities: Vec<DrawingEntity>,
}

impl DrawingDocument {
    pub fn new(version: Option<String>, entities: Vec<DrawingEntity>) -> Self {
        Self { version, entities }
    }

    /// 版本字符串，未知时为 "Unknown"
    pub fn version_label(&self) -> &str {
        self.version.as_deref().unwrap_or("Unknown")
    }
}
