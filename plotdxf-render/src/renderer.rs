use plotdxf_core::document::{Document, EntityId, Hatch, TextPlacement};
use plotdxf_core::geometry::{ClipRect, Point2, Transform2, Vector2};
use tracing::debug;

use crate::align::{alignment_for_key, compose_key, map_align};
use crate::clip::{PathKind, clip_contour};
use crate::color::quantize;
use crate::errors::RenderError;
use crate::hatch::{HatchPattern, tile_hatch};
use crate::path::PlotPath;
use crate::text::{RotationMode, TextMeta, normalize_content};

/// 宿主在每次绘制调用时提交的图形上下文快照（只读）。
#[derive(Debug, Clone, Default)]
pub struct GraphicsContext {
    /// 描边颜色，alpha 分量被忽略。
    pub rgb: Option<[f64; 3]>,
    /// 裁剪窗口；缺省表示本次调用不裁剪。
    pub clip_rect: Option<ClipRect>,
    /// 阴影图案；与实心填充相互独立。
    pub hatch: Option<HatchPattern>,
}

/// 宿主绘图框架期望的渲染回调契约。
///
/// 宿主逐个图元驱动这些入口；渲染核心以接口形式实现契约，
/// 不继承宿主的任何基类型。
pub trait PlotRenderer {
    fn open_group(&mut self, name: &str);
    fn close_group(&mut self, name: &str);

    fn draw_path(
        &mut self,
        gc: &GraphicsContext,
        path: &PlotPath,
        transform: &Transform2,
        face_color: Option<[f64; 3]>,
    );

    fn draw_path_collection(
        &mut self,
        gc: &GraphicsContext,
        master_transform: &Transform2,
        paths: &[PlotPath],
        face_colors: &[[f64; 3]],
    );

    fn draw_markers(
        &mut self,
        gc: &GraphicsContext,
        marker_path: &PlotPath,
        marker_transform: &Transform2,
        path: &PlotPath,
        transform: &Transform2,
        face_color: Option<[f64; 3]>,
    );

    /// 位图嵌入不在支持范围内，实现保持 no-op。
    fn draw_image(&mut self, _gc: &GraphicsContext, _x: f64, _y: f64) {}

    fn draw_text(
        &mut self,
        gc: &GraphicsContext,
        text: &str,
        font_size_points: f64,
        angle: f64,
        meta: Option<&TextMeta>,
    ) -> Result<(), RenderError>;

    fn canvas_width_height(&self) -> (f64, f64);

    fn points_to_pixels(&self, points: f64) -> f64;

    fn flipy(&self) -> bool {
        false
    }
}

/// 把绘图命令渲染为输出文档的核心编排器。
///
/// 独占持有一份 `Document`；画布尺寸或分辨率变化时由画布层重建
/// 整个渲染器。分组名栈记录当前绘制的语义类别（patch / line2d），
/// 随 open/close_group 推入弹出。
#[derive(Debug)]
pub struct DxfRenderer {
    width: f64,
    height: f64,
    dpi: f64,
    version: String,
    document: Document,
    group_stack: Vec<String>,
}

impl DxfRenderer {
    pub fn new(width: f64, height: f64, dpi: f64, version: impl Into<String>) -> Self {
        let version = version.into();
        let document = Self::new_document(&version, width, height);
        Self {
            width,
            height,
            dpi,
            version,
            document,
            group_stack: Vec::new(),
        }
    }

    fn new_document(version: &str, width: f64, height: f64) -> Document {
        Document::new(
            version,
            Point2::new(0.0, 0.0),
            Point2::new(width, height),
        )
    }

    /// 丢弃当前文档并原地重建，同时清空分组栈。
    pub fn clear(&mut self) {
        self.document = Self::new_document(&self.version, self.width, self.height);
        self.group_stack.clear();
    }

    #[inline]
    pub fn document(&self) -> &Document {
        &self.document
    }

    #[inline]
    pub fn into_document(self) -> Document {
        self.document
    }

    #[inline]
    pub fn dpi(&self) -> f64 {
        self.dpi
    }

    /// 变换、裁剪、逐轮廓写出多段线，返回写出的实体。
    fn render_contours(
        &mut self,
        gc: &GraphicsContext,
        path: &PlotPath,
        transform: &Transform2,
        kind: PathKind,
    ) -> Vec<EntityId> {
        let transformed = path.transformed(transform);
        if transformed.is_empty() {
            return Vec::new();
        }

        let contours = clip_contour(transformed.vertices(), gc.clip_rect.as_ref(), kind);
        if contours.is_empty() {
            return Vec::new();
        }

        let color = quantize(gc.rgb);
        contours
            .into_contours()
            .into_iter()
            .map(|contour| {
                // 刻意不闭合：闭合标志曾破坏以 patch 形式渲染的箭头标记。
                self.document.add_polyline(contour, false, color)
            })
            .collect()
    }

    fn render_line(&mut self, gc: &GraphicsContext, path: &PlotPath, transform: &Transform2) {
        let _ = self.render_contours(gc, path, transform, PathKind::Line2d);
    }

    fn render_patch(
        &mut self,
        gc: &GraphicsContext,
        path: &PlotPath,
        transform: &Transform2,
        face_color: Option<[f64; 3]>,
    ) {
        let polyline_ids = self.render_contours(gc, path, transform, PathKind::Patch);
        if polyline_ids.is_empty() {
            return;
        }

        if let Some(face) = face_color {
            let fill = quantize(Some(face));
            for id in &polyline_ids {
                // 边界路径取多段线自身的顶点与闭合状态，只做记账关联。
                let Some((vertices, is_closed)) = self
                    .document
                    .polyline(*id)
                    .map(|polyline| (polyline.vertices.clone(), polyline.is_closed))
                else {
                    continue;
                };
                let mut hatch = Hatch::new(fill);
                hatch.add_boundary(vertices, is_closed);
                hatch.associate([*id]);
                self.document.add_hatch(hatch);
            }
        }

        if let Some(pattern) = &gc.hatch {
            // 铺排以未裁剪的原始路径范围为准，边界用已写出的多段线。
            tile_hatch(
                &mut self.document,
                pattern,
                path,
                transform,
                self.dpi,
                &polyline_ids,
            );
        }
    }
}

impl PlotRenderer for DxfRenderer {
    fn open_group(&mut self, name: &str) {
        self.group_stack.push(name.to_string());
    }

    fn close_group(&mut self, _name: &str) {
        self.group_stack.pop();
    }

    fn draw_path(
        &mut self,
        gc: &GraphicsContext,
        path: &PlotPath,
        transform: &Transform2,
        face_color: Option<[f64; 3]>,
    ) {
        match self
            .group_stack
            .last()
            .and_then(|name| PathKind::from_group(name))
        {
            Some(PathKind::Patch) => self.render_patch(gc, path, transform, face_color),
            Some(PathKind::Line2d) => self.render_line(gc, path, transform),
            None => {
                debug!(group = ?self.group_stack.last(), "忽略未知分组中的路径");
            }
        }
    }

    fn draw_path_collection(
        &mut self,
        gc: &GraphicsContext,
        master_transform: &Transform2,
        paths: &[PlotPath],
        face_colors: &[[f64; 3]],
    ) {
        let face = face_colors.first().copied();
        for path in paths {
            self.render_patch(gc, path, master_transform, face);
        }
    }

    fn draw_markers(
        &mut self,
        gc: &GraphicsContext,
        marker_path: &PlotPath,
        marker_transform: &Transform2,
        path: &PlotPath,
        transform: &Transform2,
        _face_color: Option<[f64; 3]>,
    ) {
        // 只处理刻度标记：当前组是 line2d 且上一层组名含 tick
        // （其余标记已经由对应的 path 调用覆盖）。
        let depth = self.group_stack.len();
        let in_tick_group = depth >= 2
            && self.group_stack[depth - 1] == "line2d"
            && self.group_stack[depth - 2].contains("tick");
        if !in_tick_group {
            return;
        }

        let anchor = path.transformed(transform);
        let Some(first) = anchor.vertices().first().copied() else {
            return;
        };
        let translated = marker_transform.then_translate(Vector2::new(first.x(), first.y()));
        self.render_line(gc, marker_path, &translated);
    }

    fn draw_text(
        &mut self,
        gc: &GraphicsContext,
        text: &str,
        font_size_points: f64,
        angle: f64,
        meta: Option<&TextMeta>,
    ) -> Result<(), RenderError> {
        // 低层文字调用不携带富文本元数据，核心只支持高层路径。
        let Some(meta) = meta else {
            return Ok(());
        };

        let content = normalize_content(text);

        // 90° 且宿主未用 anchor 旋转模式时强制右对齐；这是对宿主
        // 锚点-旋转交互的经验补偿，触发条件保持精确相等判断。
        let horizontal = if angle == 90.0 && meta.rotation_mode != RotationMode::Anchor {
            "RIGHT"
        } else {
            map_align(&meta.horizontal_alignment, false)?
        };
        let vertical = map_align(&meta.vertical_alignment, true)?;
        let alignment = alignment_for_key(&compose_key(vertical, horizontal));

        // 宿主字号（点）换算到设备单位后减半，与参考查看器的
        // 视觉大小约定一致。
        let height = self.points_to_pixels(font_size_points) / 2.0;
        let color = quantize(gc.rgb);

        let id = self.document.add_text(content, height, angle, color);
        let insert = meta.transform.apply(meta.unitless_position);
        self.document
            .set_text_placement(id, TextPlacement { insert, alignment });
        Ok(())
    }

    fn canvas_width_height(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn points_to_pixels(&self, points: f64) -> f64 {
        points / 72.0 * self.dpi
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plotdxf_core::document::{AciColor, Entity, TextAlignment};

    fn renderer() -> DxfRenderer {
        DxfRenderer::new(100.0, 100.0, 100.0, "AC1032")
    }

    fn unit_square_path() -> PlotPath {
        PlotPath::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
        ])
    }

    fn stroke_gc() -> GraphicsContext {
        GraphicsContext {
            rgb: Some([0.0, 0.0, 1.0]),
            clip_rect: Some(ClipRect::new(
                Point2::new(0.0, 0.0),
                Point2::new(20.0, 20.0),
            )),
            hatch: None,
        }
    }

    #[test]
    fn filled_patch_emits_polyline_and_associated_hatch() {
        let mut renderer = renderer();
        renderer.open_group("patch");
        renderer.draw_path(
            &stroke_gc(),
            &unit_square_path(),
            &Transform2::identity(),
            Some([1.0, 0.0, 0.0]),
        );
        renderer.close_group("patch");

        let polylines: Vec<_> = renderer
            .document()
            .entities()
            .filter_map(|(id, entity)| match entity {
                Entity::Polyline(polyline) => Some((*id, polyline)),
                _ => None,
            })
            .collect();
        let hatches: Vec<_> = renderer
            .document()
            .entities()
            .filter_map(|(_, entity)| match entity {
                Entity::Hatch(hatch) => Some(hatch),
                _ => None,
            })
            .collect();

        assert_eq!(polylines.len(), 1);
        assert_eq!(hatches.len(), 1);

        let (polyline_id, polyline) = &polylines[0];
        assert_eq!(polyline.vertices.len(), 4);
        assert!(!polyline.is_closed);

        let hatch = hatches[0];
        // 填充色 (1,0,0) 量化为最接近红色的索引。
        assert_eq!(hatch.color, AciColor::new(1));
        assert_eq!(hatch.boundaries.len(), 1);
        assert_eq!(hatch.boundaries[0].vertices.len(), 4);
        assert_eq!(hatch.source_entities, vec![*polyline_id]);
    }

    #[test]
    fn unfilled_line_emits_polyline_only() {
        let mut renderer = renderer();
        renderer.open_group("line2d");
        renderer.draw_path(
            &stroke_gc(),
            &PlotPath::new(vec![Point2::new(1.0, 1.0), Point2::new(9.0, 9.0)]),
            &Transform2::identity(),
            None,
        );
        renderer.close_group("line2d");

        assert_eq!(renderer.document().entities().count(), 1);
        match renderer.document().entities().next() {
            Some((_, Entity::Polyline(polyline))) => {
                assert_eq!(polyline.color, AciColor::new(5));
            }
            other => panic!("expected polyline entity, got {other:?}"),
        }
    }

    #[test]
    fn path_outside_clip_window_emits_nothing() {
        let mut renderer = renderer();
        renderer.open_group("line2d");
        renderer.draw_path(
            &stroke_gc(),
            &PlotPath::new(vec![Point2::new(30.0, 30.0), Point2::new(40.0, 40.0)]),
            &Transform2::identity(),
            None,
        );
        renderer.close_group("line2d");
        assert!(renderer.document().is_empty());
    }

    #[test]
    fn path_without_open_group_is_ignored() {
        let mut renderer = renderer();
        renderer.draw_path(
            &stroke_gc(),
            &unit_square_path(),
            &Transform2::identity(),
            None,
        );
        assert!(renderer.document().is_empty());
    }

    #[test]
    fn split_line_emits_one_polyline_per_piece() {
        let mut renderer = renderer();
        renderer.open_group("line2d");
        renderer.draw_path(
            &stroke_gc(),
            &PlotPath::new(vec![
                Point2::new(-5.0, 2.0),
                Point2::new(25.0, 2.0),
                Point2::new(25.0, 8.0),
                Point2::new(-5.0, 8.0),
            ]),
            &Transform2::identity(),
            None,
        );
        renderer.close_group("line2d");
        assert_eq!(renderer.document().entities().count(), 2);
    }

    #[test]
    fn hatched_patch_invokes_tiler_with_emitted_boundaries() {
        let mut renderer = DxfRenderer::new(200.0, 200.0, 100.0, "AC1032");
        let square = PlotPath::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(100.0, 0.0),
            Point2::new(100.0, 100.0),
            Point2::new(0.0, 100.0),
        ]);
        let gc = GraphicsContext {
            rgb: Some([0.0, 0.0, 1.0]),
            clip_rect: None,
            hatch: Some(HatchPattern {
                path: PlotPath::new(vec![Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)]),
                color: Some([0.0, 1.0, 0.0]),
            }),
        };

        renderer.open_group("patch");
        renderer.draw_path(&gc, &square, &Transform2::identity(), None);
        renderer.close_group("patch");

        let hatch_lines = renderer
            .document()
            .entities()
            .filter(|(_, entity)| {
                matches!(entity, Entity::Polyline(polyline) if polyline.color == AciColor::new(3))
            })
            .count();
        assert!(hatch_lines >= 1, "期望铺排产生阴影线段");
    }

    #[test]
    fn markers_render_only_inside_tick_groups() {
        let marker = PlotPath::new(vec![Point2::new(0.0, 0.0), Point2::new(2.0, 0.0)]);
        let parent = PlotPath::new(vec![Point2::new(5.0, 5.0), Point2::new(6.0, 6.0)]);

        let mut renderer = renderer();
        renderer.open_group("xtick");
        renderer.open_group("line2d");
        renderer.draw_markers(
            &stroke_gc(),
            &marker,
            &Transform2::identity(),
            &parent,
            &Transform2::identity(),
            None,
        );
        renderer.close_group("line2d");
        renderer.close_group("xtick");

        assert_eq!(renderer.document().entities().count(), 1);
        match renderer.document().entities().next() {
            Some((_, Entity::Polyline(polyline))) => {
                assert!((polyline.vertices[0].x() - 5.0).abs() < 1e-9);
                assert!((polyline.vertices[0].y() - 5.0).abs() < 1e-9);
                assert!((polyline.vertices[1].x() - 7.0).abs() < 1e-9);
            }
            other => panic!("expected marker polyline, got {other:?}"),
        }

        // 非刻度分组下同一调用不产生任何实体。
        let mut renderer = self::renderer();
        renderer.open_group("line2d");
        renderer.draw_markers(
            &stroke_gc(),
            &marker,
            &Transform2::identity(),
            &parent,
            &Transform2::identity(),
            None,
        );
        renderer.close_group("line2d");
        assert!(renderer.document().is_empty());
    }

    #[test]
    fn path_collection_renders_each_path_as_filled_patch() {
        let mut renderer = renderer();
        let paths = vec![
            PlotPath::new(vec![
                Point2::new(0.0, 0.0),
                Point2::new(4.0, 0.0),
                Point2::new(4.0, 4.0),
            ]),
            PlotPath::new(vec![
                Point2::new(6.0, 6.0),
                Point2::new(9.0, 6.0),
                Point2::new(9.0, 9.0),
            ]),
        ];
        renderer.draw_path_collection(
            &stroke_gc(),
            &Transform2::identity(),
            &paths,
            &[[1.0, 0.0, 0.0]],
        );

        let polylines = renderer
            .document()
            .entities()
            .filter(|(_, entity)| matches!(entity, Entity::Polyline(_)))
            .count();
        let hatches = renderer
            .document()
            .entities()
            .filter(|(_, entity)| matches!(entity, Entity::Hatch(_)))
            .count();
        assert_eq!(polylines, 2);
        assert_eq!(hatches, 2);
    }

    #[test]
    fn text_with_metadata_is_placed_and_aligned() {
        let mut renderer = DxfRenderer::new(100.0, 100.0, 72.0, "AC1032");
        let meta = TextMeta {
            horizontal_alignment: "center".to_string(),
            vertical_alignment: "top".to_string(),
            rotation_mode: RotationMode::Default,
            unitless_position: Point2::new(0.5, 0.5),
            transform: Transform2::from_scale(100.0),
        };
        renderer
            .draw_text(&stroke_gc(), "$\\mathbf{5}$", 10.0, 0.0, Some(&meta))
            .expect("文字渲染失败");

        match renderer.document().entities().next() {
            Some((_, Entity::Text(text))) => {
                assert_eq!(text.content, "5");
                // 10pt 在 72 dpi 下为 10 像素，减半后得 5。
                assert!((text.height - 5.0).abs() < 1e-9);
                let placement = text.placement.expect("文字缺少锚点");
                assert_eq!(placement.alignment, TextAlignment::TopCenter);
                assert!((placement.insert.x() - 50.0).abs() < 1e-9);
                assert!((placement.insert.y() - 50.0).abs() < 1e-9);
            }
            other => panic!("expected text entity, got {other:?}"),
        }
    }

    #[test]
    fn rotated_text_forces_right_alignment_outside_anchor_mode() {
        let mut renderer = renderer();
        let mut meta = TextMeta {
            horizontal_alignment: "center".to_string(),
            vertical_alignment: "bottom".to_string(),
            rotation_mode: RotationMode::Default,
            unitless_position: Point2::new(0.0, 0.0),
            transform: Transform2::identity(),
        };
        renderer
            .draw_text(&stroke_gc(), "ylabel", 12.0, 90.0, Some(&meta))
            .expect("文字渲染失败");

        match renderer.document().entities().next() {
            Some((_, Entity::Text(text))) => {
                let placement = text.placement.expect("文字缺少锚点");
                assert_eq!(placement.alignment, TextAlignment::BottomRight);
            }
            other => panic!("expected text entity, got {other:?}"),
        }

        // anchor 模式保留宿主声明的水平对齐。
        let mut renderer = self::renderer();
        meta.rotation_mode = RotationMode::Anchor;
        renderer
            .draw_text(&stroke_gc(), "ylabel", 12.0, 90.0, Some(&meta))
            .expect("文字渲染失败");
        match renderer.document().entities().next() {
            Some((_, Entity::Text(text))) => {
                let placement = text.placement.expect("文字缺少锚点");
                assert_eq!(placement.alignment, TextAlignment::BottomCenter);
            }
            other => panic!("expected text entity, got {other:?}"),
        }
    }

    #[test]
    fn text_without_metadata_is_ignored() {
        let mut renderer = renderer();
        renderer
            .draw_text(&stroke_gc(), "raw", 10.0, 0.0, None)
            .expect("无元数据的文字调用不应失败");
        assert!(renderer.document().is_empty());
    }

    #[test]
    fn unsupported_alignment_keyword_fails_the_call() {
        let mut renderer = renderer();
        let meta = TextMeta {
            horizontal_alignment: "justified".to_string(),
            vertical_alignment: "top".to_string(),
            rotation_mode: RotationMode::Default,
            unitless_position: Point2::new(0.0, 0.0),
            transform: Transform2::identity(),
        };
        let err = renderer
            .draw_text(&stroke_gc(), "bad", 10.0, 0.0, Some(&meta))
            .unwrap_err();
        assert!(matches!(err, RenderError::UnsupportedAlignment(_)));
    }

    #[test]
    fn clear_rebuilds_the_document_in_place() {
        let mut renderer = renderer();
        renderer.open_group("line2d");
        renderer.draw_path(
            &stroke_gc(),
            &PlotPath::new(vec![Point2::new(1.0, 1.0), Point2::new(2.0, 2.0)]),
            &Transform2::identity(),
            None,
        );
        assert!(!renderer.document().is_empty());

        renderer.clear();
        assert!(renderer.document().is_empty());
        let (width, height) = renderer.canvas_width_height();
        assert!((width - 100.0).abs() < 1e-9);
        assert!((height - 100.0).abs() < 1e-9);
        assert!((renderer.document().extent_max().x() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn points_to_pixels_uses_dpi() {
        let renderer = DxfRenderer::new(10.0, 10.0, 144.0, "AC1032");
        assert!((renderer.points_to_pixels(72.0) - 144.0).abs() < 1e-9);
        assert!(!renderer.flipy());
    }
}
