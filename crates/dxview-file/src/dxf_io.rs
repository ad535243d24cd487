//! DXF解析
//!
//! 使用 `dxf` crate 读取模型空间实体，映射为 [`DrawingDocument`]。
//! 不支持的实体保留为 `Unsupported`，计入实体总数但不参与渲染。

use crate::error::FileError;
use dxf::entities::{Entity, EntityType};
use dxview_core::entity::{DrawingDocument, DrawingEntity, EntityKind};
use dxview_core::math::Point3;

/// 图纸解析器
pub trait DrawingParser {
    fn parse(&self, text: &str) -> Result<DrawingDocument, FileError>;
}

/// 基于 `dxf` crate 的解析器
#[derive(Debug, Clone, Copy, Default)]
pub struct DxfParser;

impl DrawingParser for DxfParser {
    fn parse(&self, text: &str) -> Result<DrawingDocument, FileError> {
        let drawing =
            dxf::Drawing::load(&mut text.as_bytes()).map_err(|e| FileError::Parse(e.to_string()))?;

        let entities: Vec<DrawingEntity> = drawing.entities().map(convert_entity).collect();
        tracing::debug!("Parsed {} DXF entities", entities.len());

        Ok(DrawingDocument::new(header_version(text), entities))
    }
}

/// 读取头段中 `$ACADVER` 的原始值（如 `AC1015`）
///
/// 只有实体段的文件没有版本信息，返回 `None`。
/// `drawing.header.version` 缺省为 R12 且不保留原始字符串，因此直接扫描文本。
pub fn header_version(text: &str) -> Option<String> {
    let mut lines = text.lines().map(str::trim);
    while let Some(line) = lines.next() {
        if line == "$ACADVER" {
            let code = lines.next()?;
            let value = lines.next()?;
            return (code == "1" && !value.is_empty()).then(|| value.to_string());
        }
        if line == "ENTITIES" {
            break;
        }
    }
    None
}

fn point(p: &dxf::Point) -> Point3 {
    Point3::new(p.x, p.y, p.z)
}

/// 将DXF实体转换为图纸实体
fn convert_entity(entity: &Entity) -> DrawingEntity {
    let kind = match &entity.specific {
        EntityType::Line(line) => EntityKind::Line {
            start: Some(point(&line.p1)),
            end: Some(point(&line.p2)),
        },

        EntityType::LwPolyline(lwpoly) => EntityKind::Polyline {
            vertices: lwpoly
                .vertices
                .iter()
                .map(|v| Point3::new(v.x, v.y, 0.0))
                .collect(),
            closed: lwpoly.is_closed(),
        },

        EntityType::Polyline(poly) => EntityKind::Polyline {
            vertices: poly.vertices().map(|v| point(&v.location)).collect(),
            closed: poly.is_closed(),
        },

        EntityType::Circle(circle) => EntityKind::Circle {
            center: Some(point(&circle.center)),
            radius: Some(circle.radius),
        },

        EntityType::Arc(arc) => EntityKind::Arc {
            center: Some(point(&arc.center)),
            radius: Some(arc.radius),
            start_angle: Some(arc.start_angle),
            end_angle: Some(arc.end_angle),
        },

        EntityType::Spline(spline) => {
            // 没有控制点时退回到拟合点
            let source = if spline.control_points.is_empty() {
                &spline.fit_points
            } else {
                &spline.control_points
            };
            EntityKind::Spline {
                control_points: source.iter().map(point).collect(),
            }
        }

        EntityType::ModelPoint(p) => EntityKind::Point {
            position: Some(point(&p.location)),
        },

        other => {
            let type_name = unsupported_name(other);
            tracing::trace!("Keeping unsupported entity {}", type_name);
            EntityKind::Unsupported {
                type_name: type_name.to_string(),
            }
        }
    };

    let mut converted = DrawingEntity::new(kind).with_layer(entity.common.layer.clone());
    if let Some(index) = entity.common.color.index() {
        converted = converted.with_color_index(i32::from(index));
    }
    converted
}

/// 不支持实体的 DXF 名称
fn unsupported_name(entity: &EntityType) -> &'static str {
    match entity {
        EntityType::Text(_) => "TEXT",
        EntityType::MText(_) => "MTEXT",
        EntityType::Insert(_) => "INSERT",
        EntityType::Ellipse(_) => "ELLIPSE",
        EntityType::Solid(_) => "SOLID",
        EntityType::Leader(_) => "LEADER",
        EntityType::RotatedDimension(_)
        | EntityType::RadialDimension(_)
        | EntityType::DiameterDimension(_) => "DIMENSION",
        _ => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_ENTITIES: &str = "0\nSECTION\n2\nENTITIES\n\
0\nLINE\n8\nWALLS\n62\n3\n10\n0.0\n20\n0.0\n30\n0.0\n11\n10.0\n21\n0.0\n31\n0.0\n\
0\nCIRCLE\n8\n\n10\n5.0\n20\n5.0\n30\n0.0\n40\n2.5\n\
0\nENDSEC\n0\nEOF\n";

    #[test]
    fn test_header_version() {
        let text = "0\nSECTION\n2\nHEADER\n9\n$ACADVER\n1\nAC1015\n0\nENDSEC\n0\nEOF\n";
        assert_eq!(header_version(text).as_deref(), Some("AC1015"));
        assert_eq!(header_version(TWO_ENTITIES), None);
    }

    #[test]
    fn test_parse_maps_entities() {
        let document = DxfParser.parse(TWO_ENTITIES).unwrap();
        assert_eq!(document.entities.len(), 2);
        assert_eq!(document.version_label(), "Unknown");

        let line = &document.entities[0];
        assert_eq!(line.layer, "WALLS");
        assert_eq!(line.color_index, Some(3));
        assert_eq!(
            line.kind,
            EntityKind::Line {
                start: Some(Point3::new(0.0, 0.0, 0.0)),
                end: Some(Point3::new(10.0, 0.0, 0.0)),
            }
        );

        let circle = &document.entities[1];
        assert_eq!(circle.layer, "0");
        assert_eq!(circle.color_index, None);
        assert_eq!(circle.type_name(), "CIRCLE");
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let result = DxfParser.parse("0\nSECTION\n2\nENTITIES\n0\nLINE\n10\nnot-a-number\n");
        assert!(matches!(result, Err(FileError::Parse(_))));
    }
}
