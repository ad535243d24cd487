//! 模型容器
//!
//! 持有当前图纸的全部图元及其 GPU 缓冲。替换模型时先同步释放旧缓冲，
//! 再为新图元上传缓冲，不做延迟释放。

use dxview_core::math::BoundingBox3;
use dxview_core::primitive::{bounds_of, RenderPrimitive};

/// GPU 资源后端
pub trait GpuBackend {
    /// 单个图元对应的 GPU 资源
    type Buffer;

    /// 为图元上传顶点数据
    fn upload(&mut self, primitive: &RenderPrimitive) -> Self::Buffer;

    /// 立即释放资源
    fn release(&mut self, buffer: Self::Buffer);
}

/// 当前模型
pub struct ModelContainer<B: GpuBackend> {
    backend: B,
    primitives: Vec<RenderPrimitive>,
    buffers: Vec<B::Buffer>,
}

impl<B: GpuBackend> ModelContainer<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            primitives: Vec::new(),
            buffers: Vec::new(),
        }
    }

    /// 整体替换模型
    pub fn replace(&mut self, primitives: Vec<RenderPrimitive>) {
        self.dispose();
        self.buffers = primitives.iter().map(|p| self.backend.upload(p)).collect();
        self.primitives = primitives;
        tracing::debug!("Model replaced: {} primitives uploaded", self.primitives.len());
    }

    /// 释放所有 GPU 资源并清空模型
    pub fn dispose(&mut self) {
        if self.buffers.is_empty() && self.primitives.is_empty() {
            return;
        }
        let released = self.buffers.len();
        for buffer in self.buffers.drain(..) {
            self.backend.release(buffer);
        }
        self.primitives.clear();
        tracing::debug!("Model disposed: {} buffers released", released);
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn primitives(&self) -> &[RenderPrimitive] {
        &self.primitives
    }

    /// 可变访问（仅用于同步可见性）
    pub fn primitives_mut(&mut self) -> &mut [RenderPrimitive] {
        &mut self.primitives
    }

    /// 图元与对应缓冲
    pub fn iter(&self) -> impl Iterator<Item = (&RenderPrimitive, &B::Buffer)> {
        self.primitives.iter().zip(self.buffers.iter())
    }

    /// 当前包围盒（按需计算，不缓存）
    pub fn bounding_box(&self) -> BoundingBox3 {
        bounds_of(&self.primitives)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

impl<B: GpuBackend> Drop for ModelContainer<B> {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// 不持有 GPU 资源的后端，只统计上传与释放次数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountingBackend {
    pub uploaded: usize,
    pub released: usize,
}

impl CountingBackend {
    /// 仍未释放的缓冲数
    pub fn live(&self) -> usize {
        self.uploaded - self.released
    }
}

impl GpuBackend for CountingBackend {
    type Buffer = usize;

    fn upload(&mut self, primitive: &RenderPrimitive) -> usize {
        self.uploaded += 1;
        primitive.vertex_count()
    }

    fn release(&mut self, _buffer: usize) {
        self.released += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dxview_core::math::Point3;
    use dxview_core::primitive::Topology;
    use dxview_core::properties::Color;

    fn primitive(x: f64) -> RenderPrimitive {
        RenderPrimitive::new(
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(x, 1.0, 0.0)],
            Topology::OpenPolyline,
            Color::BLACK,
            "0",
            "LINE",
        )
    }

    #[test]
    fn test_replace_releases_previous_buffers() {
        let mut model = ModelContainer::new(CountingBackend::default());
        model.replace(vec![primitive(1.0), primitive(2.0)]);
        assert_eq!(model.backend().live(), 2);

        model.replace(vec![primitive(5.0)]);
        assert_eq!(model.backend().uploaded, 3);
        assert_eq!(model.backend().released, 2);
        assert_eq!(model.len(), 1);
        assert_eq!(model.bounding_box().max.x, 5.0);
    }

    #[test]
    fn test_dispose_empties_model() {
        let mut model = ModelContainer::new(CountingBackend::default());
        model.replace(vec![primitive(1.0)]);
        model.dispose();
        assert!(model.is_empty());
        assert_eq!(model.backend().live(), 0);
        assert!(model.bounding_box().is_empty());

        // 重复释放无副作用
        model.dispose();
        assert_eq!(model.backend().released, 1);
    }
}
