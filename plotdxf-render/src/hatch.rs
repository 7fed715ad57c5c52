use plotdxf_core::document::{Document, EntityId, Hatch};
use plotdxf_core::geometry::{Bounds2D, Point2, Transform2, Vector2};
use tracing::debug;

use crate::clip::{intersect_line_with_polygon, intersect_polygons};
use crate::color::quantize;
use crate::path::PlotPath;

/// 宿主提交的阴影图案：单位正方形内的图元路径加阴影颜色。
#[derive(Debug, Clone)]
pub struct HatchPattern {
    pub path: PlotPath,
    pub color: Option<[f64; 3]>,
}

/// 铺排网格的行列数：`ceil(边长 / 单元尺寸) - 1`。
///
/// 负值是合法结果（范围小于一个单元时网格为空），调用方的
/// `-rows..=rows` 区间会自然落空。
pub fn tile_counts(extent: &Bounds2D, tile_size: f64) -> (i64, i64) {
    let rows = (extent.height() / tile_size).ceil() as i64 - 1;
    let cols = (extent.width() / tile_size).ceil() as i64 - 1;
    (rows, cols)
}

/// 将阴影单元平铺到父路径范围并逐块裁剪。
///
/// 输出格式的阴影实体表达不了无限重复图案，这里用“复制 + 裁剪”
/// 模拟周期性：代价由父路径范围除以单元尺寸决定，有限且可控。
/// 单元以父路径（未裁剪原始路径）包围盒中心为原点，单元边长取
/// 渲染器的 DPI 值（宿主约定一个阴影单元为一设备英寸）。
pub fn tile_hatch(
    document: &mut Document,
    pattern: &HatchPattern,
    original_path: &PlotPath,
    transform: &Transform2,
    tile_size: f64,
    boundary_ids: &[EntityId],
) {
    let Some(extent) = original_path.transformed(transform).bounds() else {
        return;
    };
    let (rows, cols) = tile_counts(&extent, tile_size);
    let center = extent.center();
    let color = quantize(pattern.color);

    // 先把单元缩放到一个单元尺寸见方、中心对准父路径中心。
    let cell_transform = Transform2::from_translation(Vector2::new(-0.5, -0.5))
        .then_scale(tile_size)
        .then_translate(Vector2::new(center.x(), center.y()));
    let cell = pattern.path.transformed(&cell_transform);

    // 裁剪边界取自已写出的多段线实体；没有边界则无事可做。
    let boundaries: Vec<Vec<Point2>> = boundary_ids
        .iter()
        .filter_map(|id| document.polyline(*id).map(|polyline| polyline.vertices.clone()))
        .collect();
    if boundaries.is_empty() {
        return;
    }

    debug!(
        rows,
        cols,
        boundaries = boundaries.len(),
        "开始铺排阴影单元"
    );

    for irow in -rows..=rows {
        for icol in -cols..=cols {
            let offset = Transform2::from_translation(Vector2::new(
                icol as f64 * tile_size,
                irow as f64 * tile_size,
            ));
            let tile = cell.transformed(&offset);

            // 单元定义可能本身就是多段组合，逐块处理。
            for piece in tile.to_polygons() {
                for boundary in &boundaries {
                    // 恰好 2 个顶点按线段处理——顶点数启发式，
                    // 与参考输出保持一致，不做“修正”。
                    let clipped = if piece.len() == 2 {
                        intersect_line_with_polygon(&piece, boundary)
                    } else {
                        intersect_polygons(&piece, boundary)
                    };

                    for contour in clipped {
                        if contour.len() == 2 {
                            document.add_polyline(contour, false, color);
                        } else {
                            let mut hatch = Hatch::new(color);
                            hatch.add_boundary(contour, false);
                            document.add_hatch(hatch);
                        }
                    }
                }
            }
        }
    }
}
