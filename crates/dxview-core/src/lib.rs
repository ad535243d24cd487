//! DXView 核心
//!
//! 把解析器产出的图纸实体转换成可渲染图元，并维护派生的图层索引。
//!
//! # 数据流
//!
//! - `DrawingEntity`: 外部解析器产出的只读实体
//! - `RenderPrimitive`: 实体经几何转换得到的折线/闭合环/点
//! - `LayerRegistry`: 按来源图层分组的图元下标
//!
//! # 示例
//!
//! ```rust
//! use dxview_core::prelude::*;
//!
//! let entity = DrawingEntity::line(Point3::origin(), Point3::new(10.0, 0.0, 0.0))
//!     .with_layer("WALLS");
//! let primitive = build(&entity).unwrap();
//! let layers = LayerRegistry::rebuild(&[primitive]);
//! assert_eq!(layers.count(), 1);
//! ```

pub mod entity;
pub mod layer;
pub mod math;
pub mod measure;
pub mod primitive;
pub mod properties;

pub mod prelude {
    //! 常用类型的便捷导入
    pub use crate::entity::{DrawingDocument, DrawingEntity, EntityKind};
    pub use crate::layer::{Layer, LayerRegistry, LayerSummary};
    pub use crate::math::{BoundingBox3, Point2, Point3, Vector2, Vector3};
    pub use crate::measure::{format_distance, MeasureTool, MeasureUnits};
    pub use crate::primitive::{build, RenderPrimitive, Topology};
    pub use crate::properties::{resolve_color, Color};
}
