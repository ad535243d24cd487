//! 导出模块
//!
//! 当前视图导出为 PNG（由调用方提供渲染好的像素）或 SVG（由图元按当前相机投影生成）。
//! 文件名统一为 `dxf-view-<毫秒时间戳>.<扩展名>`。

use crate::error::FileError;
use dxview_core::math::{Point2, Point3};
use dxview_core::primitive::{RenderPrimitive, Topology};
use dxview_core::properties::Color;
use std::fmt::Write as _;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// 导出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Svg,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Svg => "svg",
        }
    }
}

/// 按时间戳生成导出文件名
pub fn export_file_name(format: ExportFormat, now: SystemTime) -> String {
    let millis = now
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("dxf-view-{}.{}", millis, format.extension())
}

/// 目录下的导出路径
pub fn export_path(dir: &Path, format: ExportFormat) -> PathBuf {
    dir.join(export_file_name(format, SystemTime::now()))
}

/// 把 RGBA 像素编码为 PNG
pub fn encode_png(width: u32, height: u32, rgba: Vec<u8>) -> Result<Vec<u8>, FileError> {
    let image = image::RgbaImage::from_raw(width, height, rgba).ok_or_else(|| {
        FileError::Export(format!("pixel buffer does not match {}x{}", width, height))
    })?;

    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| FileError::Export(e.to_string()))?;
    Ok(bytes)
}

/// 编码并写入 PNG 文件
pub fn save_png(path: &Path, width: u32, height: u32, rgba: Vec<u8>) -> Result<(), FileError> {
    let bytes = encode_png(width, height, rgba)?;
    std::fs::write(path, bytes)?;
    tracing::info!("PNG exported to {}", path.display());
    Ok(())
}

/// SVG 导出器
///
/// 坐标直接使用视口像素，投影由调用方提供。
pub struct SvgExporter {
    width: f64,
    height: f64,
    background: Color,
}

impl SvgExporter {
    pub fn new(width: f64, height: f64, background: Color) -> Self {
        Self {
            width,
            height,
            background,
        }
    }

    /// 把可见图元投影后写成 SVG
    ///
    /// 投影失败（位于相机背后）的顶点会打断折线。
    pub fn export<'a, F>(
        &self,
        primitives: impl IntoIterator<Item = &'a RenderPrimitive>,
        project: F,
    ) -> Result<String, FileError>
    where
        F: Fn(&Point3) -> Option<Point2>,
    {
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(FileError::Export(format!(
                "invalid viewport {}x{}",
                self.width, self.height
            )));
        }

        let mut svg = String::new();
        writeln!(svg, r#"<?xml version="1.0" encoding="UTF-8"?>"#).map_err(fmt_error)?;
        writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{:.0}" height="{:.0}" viewBox="0 0 {:.0} {:.0}">"#,
            self.width, self.height, self.width, self.height
        )
        .map_err(fmt_error)?;
        writeln!(
            svg,
            r#"  <rect width="100%" height="100%" fill="{}"/>"#,
            self.background.to_hex_string()
        )
        .map_err(fmt_error)?;

        let mut count = 0usize;
        for primitive in primitives.into_iter().filter(|p| p.visible) {
            for element in primitive_to_svg(primitive, &project) {
                writeln!(svg, "  {}", element).map_err(fmt_error)?;
                count += 1;
            }
        }

        svg.push_str("</svg>\n");
        tracing::debug!("SVG export produced {} elements", count);
        Ok(svg)
    }

    /// 导出到文件
    pub fn export_to_file<'a, F>(
        &self,
        primitives: impl IntoIterator<Item = &'a RenderPrimitive>,
        project: F,
        path: &Path,
    ) -> Result<(), FileError>
    where
        F: Fn(&Point3) -> Option<Point2>,
    {
        let svg = self.export(primitives, project)?;
        std::fs::write(path, svg)?;
        tracing::info!("SVG exported to {}", path.display());
        Ok(())
    }
}

fn fmt_error(e: std::fmt::Error) -> FileError {
    FileError::Export(e.to_string())
}

/// 单个图元转换为 SVG 元素
fn primitive_to_svg<F>(primitive: &RenderPrimitive, project: &F) -> Vec<String>
where
    F: Fn(&Point3) -> Option<Point2>,
{
    let stroke = primitive.color.to_hex_string();

    if primitive.topology == Topology::PointCloud {
        return primitive
            .points
            .iter()
            .filter_map(project)
            .map(|p| format!(r#"<circle cx="{:.2}" cy="{:.2}" r="1" fill="{}"/>"#, p.x, p.y, stroke))
            .collect();
    }

    let mut points: Vec<Option<Point2>> = primitive.points.iter().map(project).collect();
    if primitive.topology == Topology::ClosedLoop && points.len() > 2 {
        points.push(points[0]);
    }

    // 按投影失败的顶点切分为若干段
    points
        .split(|p| p.is_none())
        .filter(|run| run.len() >= 2)
        .map(|run| {
            let mut d = String::new();
            for (i, p) in run.iter().flatten().enumerate() {
                let op = if i == 0 { 'M' } else { 'L' };
                let _ = write!(d, "{}{:.2} {:.2} ", op, p.x, p.y);
            }
            format!(
                r#"<path d="{}" stroke="{}" stroke-width="1" fill="none"/>"#,
                d.trim_end(),
                stroke
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(p: &Point3) -> Option<Point2> {
        (p.z >= 0.0).then(|| Point2::new(p.x, p.y))
    }

    fn polyline(points: Vec<Point3>, topology: Topology) -> RenderPrimitive {
        RenderPrimitive::new(points, topology, Color::RED, "0", "LWPOLYLINE")
    }

    #[test]
    fn test_file_name_uses_millis() {
        let now = UNIX_EPOCH + std::time::Duration::from_millis(1_700_000_000_123);
        assert_eq!(export_file_name(ExportFormat::Png, now), "dxf-view-1700000000123.png");
        assert_eq!(export_file_name(ExportFormat::Svg, now), "dxf-view-1700000000123.svg");
    }

    #[test]
    fn test_svg_contains_paths_and_points() {
        let primitives = vec![
            polyline(
                vec![
                    Point3::new(0.0, 0.0, 0.0),
                    Point3::new(10.0, 0.0, 0.0),
                    Point3::new(10.0, 10.0, 0.0),
                ],
                Topology::ClosedLoop,
            ),
            RenderPrimitive::new(vec![Point3::new(5.0, 5.0, 0.0)], Topology::PointCloud, Color::BLUE, "0", "POINT"),
        ];
        let svg = SvgExporter::new(100.0, 50.0, Color::WHITE)
            .export(&primitives, flat)
            .unwrap();

        assert!(svg.contains(r#"viewBox="0 0 100 50""#));
        assert!(svg.contains(r#"d="M0.00 0.00 L10.00 0.00 L10.00 10.00 L0.00 0.00""#));
        assert!(svg.contains(r##"stroke="#ff0000""##));
        assert!(svg.contains(r#"<circle cx="5.00" cy="5.00""#));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_hidden_and_clipped_geometry() {
        let mut hidden = polyline(
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0)],
            Topology::OpenPolyline,
        );
        hidden.visible = false;
        let broken = polyline(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, -1.0),
                Point3::new(3.0, 0.0, 0.0),
            ],
            Topology::OpenPolyline,
        );
        let svg = SvgExporter::new(10.0, 10.0, Color::WHITE)
            .export([&hidden, &broken], flat)
            .unwrap();
        assert_eq!(svg.matches("<path").count(), 1);
    }

    #[test]
    fn test_png_roundtrip_header() {
        let rgba = vec![255u8; 4 * 3 * 2];
        let png = encode_png(3, 2, rgba).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        assert!(matches!(encode_png(3, 3, vec![0u8; 4]), Err(FileError::Export(_))));
    }

    #[test]
    fn test_save_png_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_path(dir.path(), ExportFormat::Png);
        save_png(&path, 1, 1, vec![0, 0, 0, 255]).unwrap();
        assert!(path.exists());
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("dxf-view-"));
    }
}
