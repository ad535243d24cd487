//! 图层索引
//!
//! 图层由图元的来源图层名派生，不是独立数据。每次导入新模型时整体重建，
//! 不做增量更新。成员以图元在模型中的下标表示，不持有图元。

use crate::primitive::RenderPrimitive;
use crate::properties::Color;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 图层定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// 图层名称（唯一）
    pub name: String,

    /// 是否可见
    pub visible: bool,

    /// 色块颜色（取自该图层的第一个图元）
    pub swatch_color: Color,

    /// 成员图元在模型中的下标（按出现顺序）
    pub members: Vec<usize>,
}

impl Layer {
    /// 创建新图层
    pub fn new(name: impl Into<String>, swatch_color: Color) -> Self {
        Self {
            name: name.into(),
            visible: true,
            swatch_color,
            members: Vec::new(),
        }
    }

    /// 成员数量
    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

/// 提供给图层面板的只读摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSummary {
    pub name: String,
    pub visible: bool,
    pub swatch_color: Color,
}

/// 图层注册表
#[derive(Debug, Clone, Default)]
pub struct LayerRegistry {
    /// 所有图层（按首次出现顺序）
    layers: Vec<Layer>,

    /// 名称到下标的索引
    index: HashMap<String, usize>,
}

impl LayerRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 从图元序列单次遍历重建
    pub fn rebuild(primitives: &[RenderPrimitive]) -> Self {
        let mut registry = Self::new();

        for (i, primitive) in primitives.iter().enumerate() {
            let slot = match registry.index.get(&primitive.source_layer) {
                Some(&slot) => slot,
                None => {
                    let slot = registry.layers.len();
                    registry
                        .layers
                        .push(Layer::new(primitive.source_layer.clone(), primitive.color));
                    registry.index.insert(primitive.source_layer.clone(), slot);
                    slot
                }
            };
            registry.layers[slot].members.push(i);
        }

        tracing::debug!(
            "Rebuilt layer registry: {} layers over {} primitives",
            registry.layers.len(),
            primitives.len()
        );

        registry
    }

    /// 设置图层可见性并同步到成员图元
    ///
    /// 未知图层返回 `false`，不做任何修改。
    pub fn set_visible(
        &mut self,
        name: &str,
        visible: bool,
        primitives: &mut [RenderPrimitive],
    ) -> bool {
        let Some(&slot) = self.index.get(name) else {
            return false;
        };

        let layer = &mut self.layers[slot];
        layer.visible = visible;
        for &member in &layer.members {
            if let Some(primitive) = primitives.get_mut(member) {
                primitive.visible = visible;
            }
        }
        true
    }

    /// 显示所有图层
    pub fn show_all(&mut self, primitives: &mut [RenderPrimitive]) {
        self.set_all(true, primitives);
    }

    /// 隐藏所有图层
    pub fn hide_all(&mut self, primitives: &mut [RenderPrimitive]) {
        self.set_all(false, primitives);
    }

    fn set_all(&mut self, visible: bool, primitives: &mut [RenderPrimitive]) {
        let names: Vec<String> = self.layers.iter().map(|l| l.name.clone()).collect();
        for name in names {
            self.set_visible(&name, visible, primitives);
        }
    }

    /// 获取图层（按名称）
    pub fn get(&self, name: &str) -> Option<&Layer> {
        self.index.get(name).map(|&slot| &self.layers[slot])
    }

    /// 获取所有图层
    pub fn all_layers(&self) -> &[Layer] {
        &self.layers
    }

    /// 图层摘要列表
    pub fn summaries(&self) -> Vec<LayerSummary> {
        self.layers
            .iter()
            .map(|l| LayerSummary {
                name: l.name.clone(),
                visible: l.visible,
                swatch_color: l.swatch_color,
            })
            .collect()
    }

    /// 图层数量
    pub fn count(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// 清空
    pub fn clear(&mut self) {
        self.layers.clear();
        self.index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::DrawingEntity;
    use crate::math::Point3;
    use crate::primitive::build;

    fn sample_primitives() -> Vec<RenderPrimitive> {
        let entities = [
            DrawingEntity::line(Point3::origin(), Point3::new(1.0, 0.0, 0.0))
                .with_layer("WALLS")
                .with_color_index(1),
            DrawingEntity::circle(Point3::origin(), 5.0)
                .with_layer("DOORS")
                .with_color_index(5),
            DrawingEntity::line(Point3::origin(), Point3::new(0.0, 1.0, 0.0))
                .with_layer("WALLS")
                .with_color_index(3),
            DrawingEntity::point(Point3::origin()),
        ];
        entities.iter().filter_map(build).collect()
    }

    #[test]
    fn test_rebuild_groups_by_layer() {
        let primitives = sample_primitives();
        let registry = LayerRegistry::rebuild(&primitives);

        assert_eq!(registry.count(), 3);
        let names: Vec<_> = registry.all_layers().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["WALLS", "DOORS", "0"]);

        let walls = registry.get("WALLS").unwrap();
        assert_eq!(walls.members, vec![0, 2]);
        // 第一个图元决定色块
        assert_eq!(walls.swatch_color, Color::RED);

        let total: usize = registry.all_layers().iter().map(Layer::member_count).sum();
        assert_eq!(total, primitives.len());
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let primitives = sample_primitives();
        let a = LayerRegistry::rebuild(&primitives);
        let b = LayerRegistry::rebuild(&primitives);
        assert_eq!(a.all_layers(), b.all_layers());
    }

    #[test]
    fn test_set_visible_propagates_to_members() {
        let mut primitives = sample_primitives();
        let mut registry = LayerRegistry::rebuild(&primitives);

        assert!(registry.set_visible("WALLS", false, &mut primitives));
        assert!(!registry.get("WALLS").unwrap().visible);
        assert!(!primitives[0].visible);
        assert!(primitives[1].visible);
        assert!(!primitives[2].visible);

        assert!(!registry.set_visible("MISSING", false, &mut primitives));
        assert!(primitives[1].visible);
    }

    #[test]
    fn test_show_and_hide_all() {
        let mut primitives = sample_primitives();
        let mut registry = LayerRegistry::rebuild(&primitives);

        registry.hide_all(&mut primitives);
        assert!(primitives.iter().all(|p| !p.visible));
        assert!(registry.summaries().iter().all(|s| !s.visible));

        registry.show_all(&mut primitives);
        assert!(primitives.iter().all(|p| p.visible));
    }
}
