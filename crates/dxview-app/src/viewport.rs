//! 视口绘制
//!
//! 图元、网格与视图立方体都投影到屏幕后用egui画出。

use dxview_core::math::{Point2, Point3};
use dxview_core::measure::MeasureTool;
use dxview_core::primitive::{RenderPrimitive, Topology};
use dxview_core::properties::Color;
use dxview_renderer::{CameraState, Scene, ViewCube, WgpuBackend};

/// 悬停面的高亮色
const HOVER_COLOR: Color = Color::with_alpha(0xff, 0xd5, 0x4f, 200);

const MEASURE_COLOR: Color = Color::from_hex(0xff6f00);

pub fn color32(color: &Color) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
}

fn to_pos(rect: &egui::Rect, point: Point2) -> egui::Pos2 {
    egui::pos2(rect.min.x + point.x as f32, rect.min.y + point.y as f32)
}

/// 视口坐标（相对于绘制区域左上角）
pub fn to_viewport(rect: &egui::Rect, pos: egui::Pos2) -> Point2 {
    Point2::new((pos.x - rect.min.x) as f64, (pos.y - rect.min.y) as f64)
}

/// 世界坐标到屏幕坐标的投影器
struct Projector<'a> {
    camera: &'a CameraState,
    rect: egui::Rect,
}

impl Projector<'_> {
    fn project(&self, point: &Point3) -> Option<egui::Pos2> {
        self.camera
            .world_to_screen(point, self.rect.width() as f64, self.rect.height() as f64)
            .map(|p| to_pos(&self.rect, p))
    }

    fn segment(&self, painter: &egui::Painter, a: &Point3, b: &Point3, stroke: egui::Stroke) {
        if let (Some(a), Some(b)) = (self.project(a), self.project(b)) {
            painter.line_segment([a, b], stroke);
        }
    }
}

/// 绘制整个场景
pub fn draw_scene(
    painter: &egui::Painter,
    rect: egui::Rect,
    scene: &Scene<WgpuBackend>,
    measure: &MeasureTool,
) {
    let projector = Projector {
        camera: scene.camera(),
        rect,
    };

    let grid = scene.grid();
    if grid.visible {
        for (a, b, color) in grid.lines() {
            projector.segment(painter, &a, &b, egui::Stroke::new(1.0, color32(&color)));
        }
    }

    for primitive in scene.visible_primitives() {
        draw_primitive(painter, &projector, primitive);
    }

    let axes = scene.axes();
    if axes.visible {
        for (a, b, color) in axes.lines() {
            projector.segment(painter, &a, &b, egui::Stroke::new(2.0, color32(&color)));
        }
    }

    draw_measurements(painter, &projector, measure);
}

fn draw_primitive(painter: &egui::Painter, projector: &Projector<'_>, primitive: &RenderPrimitive) {
    let color = color32(&primitive.color);

    if primitive.topology == Topology::PointCloud {
        for point in primitive.points.iter().filter_map(|p| projector.project(p)) {
            painter.circle_filled(point, 2.0, color);
        }
        return;
    }

    let stroke = egui::Stroke::new(1.0, color);
    let mut run: Vec<egui::Pos2> = Vec::with_capacity(primitive.points.len() + 1);
    let closed = primitive.topology == Topology::ClosedLoop && primitive.points.len() > 2;
    let first = primitive.points.first().filter(|_| closed);

    // 相机背后的顶点打断折线
    for point in primitive.points.iter().chain(first) {
        match projector.project(point) {
            Some(pos) => run.push(pos),
            None => flush(painter, &mut run, stroke),
        }
    }
    flush(painter, &mut run, stroke);
}

fn flush(painter: &egui::Painter, run: &mut Vec<egui::Pos2>, stroke: egui::Stroke) {
    if run.len() >= 2 {
        painter.add(egui::Shape::line(std::mem::take(run), stroke));
    } else {
        run.clear();
    }
}

fn draw_measurements(painter: &egui::Painter, projector: &Projector<'_>, measure: &MeasureTool) {
    let color = color32(&MEASURE_COLOR);
    let stroke = egui::Stroke::new(2.0, color);

    if let Some(last) = measure.measurements().last() {
        if let (Some(a), Some(b)) = (projector.project(&last.from), projector.project(&last.to)) {
            painter.line_segment([a, b], stroke);
            painter.circle_filled(a, 4.0, color);
            painter.circle_filled(b, 4.0, color);
            if let Some(text) = measure.last_result() {
                painter.text(
                    a + (b - a) * 0.5 + egui::vec2(0.0, -10.0),
                    egui::Align2::CENTER_BOTTOM,
                    text,
                    egui::FontId::proportional(14.0),
                    color,
                );
            }
        }
    }

    if let Some(pos) = measure.pending_point().and_then(|p| projector.project(&p)) {
        painter.circle_stroke(pos, 6.0, stroke);
    }
}

/// 绘制视图立方体
pub fn draw_view_cube(painter: &egui::Painter, rect: egui::Rect, cube: &ViewCube) {
    let origin = cube.origin_in(rect.width() as f64, rect.height() as f64);
    let to_screen = |p: Point2| to_pos(&rect, Point2::new(origin.x + p.x, origin.y + p.y));

    for face in cube.faces().iter().filter(|f| f.front_facing) {
        let corners: Vec<egui::Pos2> = face.corners.iter().map(|c| to_screen(*c)).collect();
        let fill = if cube.hovered() == Some(face.face) {
            color32(&HOVER_COLOR)
        } else {
            color32(&face.color)
        };
        let center = corners
            .iter()
            .fold(egui::Vec2::ZERO, |sum, c| sum + c.to_vec2())
            / corners.len() as f32;

        painter.add(egui::Shape::convex_polygon(corners, fill, egui::Stroke::NONE));
        painter.text(
            center.to_pos2(),
            egui::Align2::CENTER_CENTER,
            face.face.descriptor().label,
            egui::FontId::proportional(13.0),
            egui::Color32::from_gray(40),
        );
    }

    let edge = egui::Stroke::new(1.0, egui::Color32::from_gray(90));
    for (a, b) in cube.edges() {
        painter.line_segment([to_screen(a), to_screen(b)], edge);
    }

    for (a, b, color) in cube.axes() {
        painter.line_segment([to_screen(a), to_screen(b)], egui::Stroke::new(2.0, color32(&color)));
    }

    for label in cube.labels().iter().filter(|l| l.visible) {
        painter.text(
            to_screen(label.position),
            egui::Align2::CENTER_CENTER,
            label.text,
            egui::FontId::proportional(14.0),
            color32(&label.color),
        );
    }
}
