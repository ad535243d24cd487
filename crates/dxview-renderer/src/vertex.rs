//! 顶点数据定义

use bytemuck::{Pod, Zeroable};
use dxview_core::math::{Matrix4, Point3};
use dxview_core::primitive::{RenderPrimitive, Topology};
use dxview_core::properties::Color;

/// 3D线条顶点
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    /// 位置 (x, y, z)
    pub position: [f32; 3],
    /// 颜色 (r, g, b, a)
    pub color: [f32; 4],
}

impl LineVertex {
    pub fn new(point: &Point3, color: &Color) -> Self {
        Self {
            position: [point.x as f32, point.y as f32, point.z as f32],
            color: color.to_f32_array(),
        }
    }

    /// 顶点缓冲区布局
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<LineVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // position
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // color
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// 把图元展开为 line-list 顶点（每条线段两个顶点）
pub fn line_list(primitive: &RenderPrimitive) -> Vec<LineVertex> {
    primitive
        .segments()
        .flat_map(|(a, b)| {
            [
                LineVertex::new(&a, &primitive.color),
                LineVertex::new(&b, &primitive.color),
            ]
        })
        .collect()
}

/// 点云图元的 point-list 顶点
pub fn point_list(primitive: &RenderPrimitive) -> Vec<LineVertex> {
    match primitive.topology {
        Topology::PointCloud => primitive
            .points
            .iter()
            .map(|p| LineVertex::new(p, &primitive.color))
            .collect(),
        _ => Vec::new(),
    }
}

/// 相机Uniform数据
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    /// 视图投影矩阵（列主序）
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_proj: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// 从视图投影矩阵构造
    ///
    /// wgpu 的裁剪空间深度为 [0, 1]，这里把 OpenGL 约定的 [-1, 1] 映射过去。
    pub fn from_view_projection(view_proj: &Matrix4) -> Self {
        #[rustfmt::skip]
        let depth_fix = Matrix4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 0.5, 0.5,
            0.0, 0.0, 0.0, 1.0,
        );
        let m = (depth_fix * view_proj).cast::<f32>();

        let mut uniform = Self::new();
        for (col, column) in uniform.view_proj.iter_mut().enumerate() {
            for (row, value) in column.iter_mut().enumerate() {
                *value = m[(row, col)];
            }
        }
        uniform
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}
