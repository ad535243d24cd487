//! 实体到可渲染图元的转换
//!
//! 每种实体类型对应一条固定的细分策略：
//! - 圆：`max(32, floor(r * 2))` 段的闭合环
//! - 圆弧：`max(16, floor(r))` 段的开放折线
//! - 圆与圆弧的段数上限为 [`MAX_SEGMENTS`]
//! - 样条：穿过控制点的向心 Catmull-Rom 曲线，固定 50 段
//!
//! 缺少必要字段或类型不受支持时返回 `None`，调用方直接跳过。

use crate::entity::{DrawingEntity, EntityKind};
use crate::math::{BoundingBox3, Point3};
use crate::properties::{resolve_color, Color};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// 圆的最少分段数
pub const MIN_CIRCLE_SEGMENTS: usize = 32;

/// 圆弧的最少分段数
pub const MIN_ARC_SEGMENTS: usize = 16;

/// 圆与圆弧的最多分段数
pub const MAX_SEGMENTS: usize = 4096;

/// 样条采样分段数（51个点）
pub const SPLINE_SEGMENTS: usize = 50;

/// 图元拓扑
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topology {
    /// 开放折线（line strip）
    OpenPolyline,
    /// 闭合环（首尾相连）
    ClosedLoop,
    /// 离散点
    PointCloud,
}

/// 一个实体转换后的可渲染图元
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderPrimitive {
    /// 有序顶点，折线的绘制顺序依赖于此
    pub points: Vec<Point3>,

    /// 拓扑类型
    pub topology: Topology,

    /// 显示颜色
    pub color: Color,

    /// 来源图层
    pub source_layer: String,

    /// 来源实体类型
    pub source_kind: String,

    /// 是否可见（由图层开关控制）
    pub visible: bool,
}

impl RenderPrimitive {
    /// 创建可见图元
    pub fn new(
        points: Vec<Point3>,
        topology: Topology,
        color: Color,
        source_layer: impl Into<String>,
        source_kind: impl Into<String>,
    ) -> Self {
        Self {
            points,
            topology,
            color,
            source_layer: source_layer.into(),
            source_kind: source_kind.into(),
            visible: true,
        }
    }

    /// 顶点数量
    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    /// 以线段对展开（闭合环追加尾首连接段，点云没有线段）
    pub fn segments(&self) -> impl Iterator<Item = (Point3, Point3)> + '_ {
        let pairs = match self.topology {
            Topology::PointCloud => &self.points[..0],
            _ => &self.points[..],
        };
        let closing = match self.topology {
            Topology::ClosedLoop if self.points.len() > 2 => {
                Some((self.points[self.points.len() - 1], self.points[0]))
            }
            _ => None,
        };
        pairs
            .windows(2)
            .map(|w| (w[0], w[1]))
            .chain(closing)
    }

    /// 图元包围盒
    pub fn bounding_box(&self) -> BoundingBox3 {
        BoundingBox3::from_points(&self.points)
    }
}

/// 计算一组图元的包围盒
pub fn bounds_of<'a>(primitives: impl IntoIterator<Item = &'a RenderPrimitive>) -> BoundingBox3 {
    primitives
        .into_iter()
        .fold(BoundingBox3::empty(), |acc, p| acc.union(&p.bounding_box()))
}

/// 圆的细分段数
pub fn circle_segments(radius: f64) -> usize {
    clamp_segments(radius * 2.0, MIN_CIRCLE_SEGMENTS)
}

/// 圆弧的细分段数
pub fn arc_segments(radius: f64) -> usize {
    clamp_segments(radius, MIN_ARC_SEGMENTS)
}

fn clamp_segments(wanted: f64, min: usize) -> usize {
    let wanted = wanted.floor();
    if wanted >= MAX_SEGMENTS as f64 {
        tracing::debug!("Segment count {} clamped to {}", wanted, MAX_SEGMENTS);
        return MAX_SEGMENTS;
    }
    // NaN 转换为 0
    min.max(wanted as usize)
}

/// 有限的正半径
fn valid_radius(radius: Option<f64>) -> Option<f64> {
    radius.filter(|r| r.is_finite() && *r > 0.0)
}

/// 角度缺省时取默认值，非有限值视为无效
fn valid_angle(angle: Option<f64>, default: f64) -> Option<f64> {
    match angle {
        Some(a) if !a.is_finite() => None,
        Some(a) => Some(a),
        None => Some(default),
    }
}

/// 将单个实体转换为图元
pub fn build(entity: &DrawingEntity) -> Option<RenderPrimitive> {
    let color = resolve_color(entity.color_index);

    let (points, topology) = match &entity.kind {
        EntityKind::Line { start, end } => {
            let (start, end) = ((*start)?, (*end)?);
            (vec![start, end], Topology::OpenPolyline)
        }

        EntityKind::Polyline { vertices, closed } => {
            if vertices.len() < 2 {
                return None;
            }
            let topology = if *closed {
                Topology::ClosedLoop
            } else {
                Topology::OpenPolyline
            };
            (vertices.clone(), topology)
        }

        EntityKind::Circle { center, radius } => {
            let center = (*center)?;
            let radius = valid_radius(*radius)?;
            let points = sample_arc(&center, radius, 0.0, TAU, circle_segments(radius));
            (points, Topology::ClosedLoop)
        }

        EntityKind::Arc {
            center,
            radius,
            start_angle,
            end_angle,
        } => {
            let center = (*center)?;
            let radius = valid_radius(*radius)?;
            let start = valid_angle(*start_angle, 0.0)?.to_radians();
            let mut end = valid_angle(*end_angle, 360.0)?.to_radians();
            // DXF圆弧总是从起始角逆时针扫到终止角
            if end < start {
                end += TAU;
            }
            let points = sample_arc(&center, radius, start, end, arc_segments(radius));
            (points, Topology::OpenPolyline)
        }

        EntityKind::Spline { control_points } => {
            if control_points.len() < 2 {
                return None;
            }
            let curve = CatmullRom::new(control_points);
            let points = (0..=SPLINE_SEGMENTS)
                .map(|i| curve.point_at(i as f64 / SPLINE_SEGMENTS as f64))
                .collect();
            (points, Topology::OpenPolyline)
        }

        EntityKind::Point { position } => (vec![(*position)?], Topology::PointCloud),

        EntityKind::Unsupported { .. } => return None,
    };

    Some(RenderPrimitive::new(
        points,
        topology,
        color,
        entity.layer.clone(),
        entity.type_name(),
    ))
}

/// 在XY平面内按参数均匀采样圆弧，共 `segments + 1` 个点，Z取圆心高度
fn sample_arc(center: &Point3, radius: f64, start: f64, end: f64, segments: usize) -> Vec<Point3> {
    let sweep = end - start;
    (0..=segments)
        .map(|i| {
            let angle = start + sweep * (i as f64 / segments as f64);
            Point3::new(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
                center.z,
            )
        })
        .collect()
}

/// 向心 Catmull-Rom 插值曲线（非闭合）
///
/// 端点外侧的虚拟控制点由首尾两点镜像得到，曲线穿过全部控制点。
struct CatmullRom<'a> {
    points: &'a [Point3],
}

impl<'a> CatmullRom<'a> {
    fn new(points: &'a [Point3]) -> Self {
        Self { points }
    }

    /// 参数 `t` ∈ [0, 1] 处的点
    fn point_at(&self, t: f64) -> Point3 {
        let points = self.points;
        let len = points.len();

        let p = (len - 1) as f64 * t;
        let mut index = p.floor() as usize;
        let mut weight = p - index as f64;
        if index >= len - 1 {
            index = len - 2;
            weight = 1.0;
        }

        let p1 = points[index];
        let p2 = points[index + 1];
        let p0 = if index > 0 {
            points[index - 1]
        } else {
            points[0] + (points[0] - points[1])
        };
        let p3 = if index + 2 < len {
            points[index + 2]
        } else {
            points[len - 1] + (points[len - 1] - points[len - 2])
        };

        // 向心参数化：间隔取距离的平方根
        let mut dt0 = (p1 - p0).norm_squared().powf(0.25);
        let mut dt1 = (p2 - p1).norm_squared().powf(0.25);
        let mut dt2 = (p3 - p2).norm_squared().powf(0.25);
        if dt1 < 1e-4 {
            dt1 = 1.0;
        }
        if dt0 < 1e-4 {
            dt0 = dt1;
        }
        if dt2 < 1e-4 {
            dt2 = dt1;
        }

        let axis = |c: usize| {
            nonuniform_cubic(
                [p0[c], p1[c], p2[c], p3[c]],
                [dt0, dt1, dt2],
                weight,
            )
        };
        Point3::new(axis(0), axis(1), axis(2))
    }
}

/// 非均匀 Catmull-Rom 段在 `t` 处的值（Hermite形式）
fn nonuniform_cubic(x: [f64; 4], dt: [f64; 3], t: f64) -> f64 {
    let [x0, x1, x2, x3] = x;
    let [dt0, dt1, dt2] = dt;

    let t1 = ((x1 - x0) / dt0 - (x2 - x0) / (dt0 + dt1) + (x2 - x1) / dt1) * dt1;
    let t2 = ((x2 - x1) / dt1 - (x3 - x1) / (dt1 + dt2) + (x3 - x2) / dt2) * dt1;

    let c0 = x1;
    let c1 = t1;
    let c2 = -3.0 * x1 + 3.0 * x2 - 2.0 * t1 - t2;
    let c3 = 2.0 * x1 - 2.0 * x2 + t1 + t2;

    let t2_ = t * t;
    c0 + c1 * t + c2 * t2_ + c3 * t2_ * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::points_approx_eq;

    #[test]
    fn test_line_requires_both_endpoints() {
        let missing_end = DrawingEntity::new(EntityKind::Line {
            start: Some(Point3::origin()),
            end: None,
        });
        let missing_start = DrawingEntity::new(EntityKind::Line {
            start: None,
            end: Some(Point3::new(1.0, 0.0, 0.0)),
        });
        assert!(build(&missing_end).is_none());
        assert!(build(&missing_start).is_none());

        let line = build(&DrawingEntity::line(
            Point3::origin(),
            Point3::new(10.0, 0.0, 0.0),
        ))
        .unwrap();
        assert_eq!(line.points.len(), 2);
        assert_eq!(line.topology, Topology::OpenPolyline);
        assert_eq!(line.source_kind, "LINE");
    }

    #[test]
    fn test_polyline_topology_follows_closed_flag() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        let open = build(&DrawingEntity::polyline(vertices.clone(), false)).unwrap();
        let closed = build(&DrawingEntity::polyline(vertices.clone(), true)).unwrap();
        assert_eq!(open.topology, Topology::OpenPolyline);
        assert_eq!(closed.topology, Topology::ClosedLoop);
        assert_eq!(closed.points, vertices);

        assert!(build(&DrawingEntity::polyline(vec![Point3::origin()], false)).is_none());
    }

    #[test]
    fn test_circle_is_closed_and_finely_sampled() {
        for radius in [0.5, 1.0, 15.0, 16.0, 40.7, 250.0] {
            let circle =
                build(&DrawingEntity::circle(Point3::new(3.0, -2.0, 1.5), radius)).unwrap();
            assert_eq!(circle.topology, Topology::ClosedLoop);
            assert!(circle.vertex_count() >= MIN_CIRCLE_SEGMENTS);
            assert_eq!(circle.vertex_count(), circle_segments(radius) + 1);

            let first = circle.points.first().unwrap();
            let last = circle.points.last().unwrap();
            assert!(points_approx_eq(first, last, 1e-9));
            assert!(circle.points.iter().all(|p| p.z == 1.5));
        }
        assert_eq!(circle_segments(40.7), 81);
    }

    #[test]
    fn test_circle_rejects_non_positive_radius() {
        assert!(build(&DrawingEntity::circle(Point3::origin(), 0.0)).is_none());
        assert!(build(&DrawingEntity::circle(Point3::origin(), -1.0)).is_none());
        let no_center = DrawingEntity::new(EntityKind::Circle {
            center: None,
            radius: Some(2.0),
        });
        assert!(build(&no_center).is_none());
    }

    #[test]
    fn test_circle_rejects_non_finite_radius() {
        for radius in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            assert!(build(&DrawingEntity::circle(Point3::origin(), radius)).is_none());
            assert!(build(&DrawingEntity::arc(Point3::origin(), radius, 0.0, 90.0)).is_none());
        }
    }

    #[test]
    fn test_huge_radius_is_capped() {
        assert_eq!(circle_segments(1e300), MAX_SEGMENTS);
        assert_eq!(arc_segments(1e8), MAX_SEGMENTS);
        assert_eq!(circle_segments(f64::NAN), MIN_CIRCLE_SEGMENTS);

        let circle = build(&DrawingEntity::circle(Point3::origin(), 1e300)).unwrap();
        assert_eq!(circle.vertex_count(), MAX_SEGMENTS + 1);
        assert_eq!(circle.topology, Topology::ClosedLoop);

        let arc = build(&DrawingEntity::arc(Point3::origin(), 1e300, 0.0, 90.0)).unwrap();
        assert_eq!(arc.vertex_count(), MAX_SEGMENTS + 1);
    }

    #[test]
    fn test_arc_rejects_non_finite_angles() {
        assert!(build(&DrawingEntity::arc(Point3::origin(), 5.0, f64::NAN, 90.0)).is_none());
        assert!(build(&DrawingEntity::arc(Point3::origin(), 5.0, 0.0, f64::INFINITY)).is_none());
        assert!(build(&DrawingEntity::arc(Point3::origin(), 5.0, 0.0, 90.0)).is_some());
    }

    #[test]
    fn test_arc_segment_count() {
        assert_eq!(arc_segments(50.0), 50);
        assert_eq!(arc_segments(5.0), 16);

        let arc = build(&DrawingEntity::arc(Point3::origin(), 50.0, 0.0, 90.0)).unwrap();
        assert_eq!(arc.vertex_count(), 51);
        assert_eq!(arc.topology, Topology::OpenPolyline);
        assert!(points_approx_eq(&arc.points[0], &Point3::new(50.0, 0.0, 0.0), 1e-9));
        assert!(points_approx_eq(&arc.points[50], &Point3::new(0.0, 50.0, 0.0), 1e-9));
    }

    #[test]
    fn test_arc_defaults_to_full_sweep() {
        let entity = DrawingEntity::new(EntityKind::Arc {
            center: Some(Point3::origin()),
            radius: Some(5.0),
            start_angle: None,
            end_angle: None,
        });
        let arc = build(&entity).unwrap();
        assert_eq!(arc.vertex_count(), 17);
        assert!(points_approx_eq(
            arc.points.first().unwrap(),
            arc.points.last().unwrap(),
            1e-9
        ));
    }

    #[test]
    fn test_arc_wraps_when_end_precedes_start() {
        // 270° -> 0° 等价于 270° -> 360°
        let arc = build(&DrawingEntity::arc(Point3::origin(), 20.0, 270.0, 0.0)).unwrap();
        assert!(points_approx_eq(&arc.points[0], &Point3::new(0.0, -20.0, 0.0), 1e-9));
        assert!(points_approx_eq(
            arc.points.last().unwrap(),
            &Point3::new(20.0, 0.0, 0.0),
            1e-9
        ));
        // 中点位于第四象限
        let mid = arc.points[arc.points.len() / 2];
        assert!(mid.x > 0.0 && mid.y < 0.0);
    }

    #[test]
    fn test_spline_passes_through_control_points() {
        let control = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 10.0, 0.0),
            Point3::new(20.0, 0.0, 0.0),
        ];
        let spline = build(&DrawingEntity::spline(control.clone())).unwrap();
        assert_eq!(spline.vertex_count(), SPLINE_SEGMENTS + 1);
        assert!(points_approx_eq(&spline.points[0], &control[0], 1e-9));
        assert!(points_approx_eq(&spline.points[25], &control[1], 1e-9));
        assert!(points_approx_eq(&spline.points[50], &control[2], 1e-9));

        assert!(build(&DrawingEntity::spline(vec![Point3::origin()])).is_none());
    }

    #[test]
    fn test_two_point_spline_is_straight() {
        let spline = build(&DrawingEntity::spline(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
        ]))
        .unwrap();
        assert!(spline.points.iter().all(|p| p.y.abs() < 1e-9));
        assert!(spline.points.windows(2).all(|w| w[1].x >= w[0].x));
    }

    #[test]
    fn test_point_and_unsupported() {
        let point = build(&DrawingEntity::point(Point3::new(1.0, 2.0, 3.0)).with_color_index(3))
            .unwrap();
        assert_eq!(point.topology, Topology::PointCloud);
        assert_eq!(point.color, Color::GREEN);
        assert_eq!(point.segments().count(), 0);

        assert!(build(&DrawingEntity::unsupported("TEXT")).is_none());
        let no_position = DrawingEntity::new(EntityKind::Point { position: None });
        assert!(build(&no_position).is_none());
    }

    #[test]
    fn test_closed_loop_segments_wrap_around() {
        let square = build(&DrawingEntity::polyline(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            true,
        ))
        .unwrap();
        let segments: Vec<_> = square.segments().collect();
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[3], (Point3::new(0.0, 1.0, 0.0), Point3::origin()));
    }

    #[test]
    fn test_layer_and_color_carried_through() {
        let entity = DrawingEntity::line(Point3::origin(), Point3::new(1.0, 1.0, 0.0))
            .with_layer("WALLS")
            .with_color_index(1);
        let line = build(&entity).unwrap();
        assert_eq!(line.source_layer, "WALLS");
        assert_eq!(line.color, Color::RED);
        assert!(line.visible);
    }
}
