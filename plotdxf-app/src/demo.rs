use std::path::Path;

use plotdxf_config::AppConfig;
use plotdxf_core::document::Entity;
use plotdxf_core::geometry::{ClipRect, Point2, Transform2, Vector2};
use plotdxf_io::IoError;
use plotdxf_render::canvas::{Drawable, DxfCanvas};
use plotdxf_render::hatch::HatchPattern;
use plotdxf_render::path::PlotPath;
use plotdxf_render::renderer::{DxfRenderer, GraphicsContext, PlotRenderer};
use plotdxf_render::text::{RotationMode, TextMeta};
use tracing::{info, warn};

/// 内置演示图形：外框、被视区裁剪的数据折线、带阴影的填充块、
/// 刻度标记和一条轴标签，覆盖宿主会触发的各类绘制调用。
struct DemoFigure {
    width: f64,
    height: f64,
}

impl DemoFigure {
    fn view_rect(&self) -> ClipRect {
        let margin_x = self.width * 0.1;
        let margin_y = self.height * 0.1;
        ClipRect::new(
            Point2::new(margin_x, margin_y),
            Point2::new(self.width - margin_x, self.height - margin_y),
        )
    }
}

impl Drawable for DemoFigure {
    fn draw(&self, renderer: &mut DxfRenderer) {
        let view = self.view_rect();
        renderer.open_group("figure");

        // 坐标轴外框：黑色按约定翻转为白色索引。
        let frame_gc = GraphicsContext {
            rgb: Some([0.0, 0.0, 0.0]),
            clip_rect: None,
            hatch: None,
        };
        renderer.open_group("patch");
        renderer.draw_path(
            &frame_gc,
            &PlotPath::new(vec![
                view.min(),
                Point2::new(view.max().x(), view.min().y()),
                view.max(),
                Point2::new(view.min().x(), view.max().y()),
            ]),
            &Transform2::identity(),
            None,
        );
        renderer.close_group("patch");

        // 数据折线：两度穿出视区，演示裁剪分段。
        let line_gc = GraphicsContext {
            rgb: Some([0.0, 0.0, 1.0]),
            clip_rect: Some(view),
            hatch: None,
        };
        renderer.open_group("line2d");
        renderer.draw_path(
            &line_gc,
            &PlotPath::new(vec![
                Point2::new(0.0, self.height * 0.3),
                Point2::new(self.width * 1.1, self.height * 0.4),
                Point2::new(self.width * 1.1, self.height * 0.6),
                Point2::new(0.0, self.height * 0.7),
            ]),
            &Transform2::identity(),
            None,
        );
        renderer.close_group("line2d");

        // 填充块：红色实心填充叠加绿色斜线阴影。
        let patch_gc = GraphicsContext {
            rgb: Some([0.2, 0.2, 0.2]),
            clip_rect: Some(view),
            hatch: Some(HatchPattern {
                path: PlotPath::new(vec![Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)]),
                color: Some([0.0, 1.0, 0.0]),
            }),
        };
        let block = PlotPath::new(vec![
            Point2::new(self.width * 0.25, self.height * 0.25),
            Point2::new(self.width * 0.55, self.height * 0.25),
            Point2::new(self.width * 0.55, self.height * 0.55),
            Point2::new(self.width * 0.25, self.height * 0.55),
        ]);
        renderer.open_group("patch");
        renderer.draw_path(
            &patch_gc,
            &block,
            &Transform2::identity(),
            Some([1.0, 0.0, 0.0]),
        );
        renderer.close_group("patch");

        // 底部刻度标记。
        let tick = PlotPath::new(vec![Point2::new(0.0, 0.0), Point2::new(0.0, -4.0)]);
        renderer.open_group("xtick");
        renderer.open_group("line2d");
        for step in 1..4 {
            let anchor = PlotPath::new(vec![Point2::new(
                self.width * 0.25 * step as f64,
                self.height * 0.1,
            )]);
            renderer.draw_markers(
                &frame_gc,
                &tick,
                &Transform2::identity(),
                &anchor,
                &Transform2::identity(),
                None,
            );
        }
        renderer.close_group("line2d");
        renderer.close_group("xtick");

        // 轴标签。
        let meta = TextMeta {
            horizontal_alignment: "center".to_string(),
            vertical_alignment: "top".to_string(),
            rotation_mode: RotationMode::Default,
            unitless_position: Point2::new(0.5, 0.02),
            transform: Transform2::from_scale(self.height)
                .then_translate(Vector2::new(self.width / 2.0 - self.height / 2.0, 0.0)),
        };
        if let Err(err) = renderer.draw_text(&frame_gc, "sample figure", 12.0, 0.0, Some(&meta)) {
            warn!(error = %err, "文字渲染失败");
        }

        renderer.close_group("figure");
    }
}

/// 渲染演示图形并落盘，随后打印文档概览。
pub fn run(config: &AppConfig, output: &Path) -> Result<(), IoError> {
    let mut canvas = DxfCanvas::with_version(
        config.canvas.width,
        config.canvas.height,
        config.canvas.dpi,
        config.output.dxf_version.clone(),
    );
    let figure = DemoFigure {
        width: config.canvas.width,
        height: config.canvas.height,
    };

    canvas.print_dxf(&figure, output)?;

    let document = canvas.renderer(false).document();
    let mut polylines = 0usize;
    let mut hatches = 0usize;
    let mut texts = 0usize;
    for (_, entity) in document.entities() {
        match entity {
            Entity::Polyline(_) => polylines += 1,
            Entity::Hatch(_) => hatches += 1,
            Entity::Text(_) => texts += 1,
        }
    }
    info!(polylines, hatches, texts, "演示文档统计");

    println!("plotdxf 演示渲染完成");
    println!("输出文件：{}", output.display());
    println!(
        "画布 {}x{} @ {} dpi，版本 {}",
        config.canvas.width, config.canvas.height, config.canvas.dpi, config.output.dxf_version
    );
    println!("  - 多段线 {polylines} 条");
    println!("  - 阴影 {hatches} 个");
    println!("  - 文字 {texts} 条");
    Ok(())
}
