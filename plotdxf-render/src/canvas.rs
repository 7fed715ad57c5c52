use std::io::Write;
use std::path::Path;

use plotdxf_core::document::Document;
use plotdxf_io::{DEFAULT_EXTENSION, DocumentSaver, DxfFacade, IoError};
use tracing::info;

use crate::renderer::DxfRenderer;

/// 输出文档版本；如需其他版本可用 `DxfCanvas::with_version` 覆盖。
pub const DXF_VERSION: &str = "AC1032";

/// 可被渲染的图形：宿主图形对象对画布暴露的唯一能力。
pub trait Drawable {
    fn draw(&self, renderer: &mut DxfRenderer);
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct RendererKey {
    width: f64,
    height: f64,
    dpi: f64,
}

/// 驱动渲染器并负责落盘的画布。
///
/// 渲染器按 (宽, 高, dpi) 键缓存：键变化时重建渲染器（连同其文档），
/// 否则复用；显式要求清空时原地重置文档。
pub struct DxfCanvas {
    width: f64,
    height: f64,
    dpi: f64,
    version: String,
    key: RendererKey,
    renderer: DxfRenderer,
}

impl DxfCanvas {
    pub fn new(width: f64, height: f64, dpi: f64) -> Self {
        Self::with_version(width, height, dpi, DXF_VERSION)
    }

    pub fn with_version(width: f64, height: f64, dpi: f64, version: impl Into<String>) -> Self {
        let version = version.into();
        let key = RendererKey { width, height, dpi };
        let renderer = DxfRenderer::new(width, height, dpi, version.clone());
        Self {
            width,
            height,
            dpi,
            version,
            key,
            renderer,
        }
    }

    /// 调整画布尺寸/分辨率；下次取渲染器时按新键重建。
    pub fn set_size(&mut self, width: f64, height: f64, dpi: f64) {
        self.width = width;
        self.height = height;
        self.dpi = dpi;
    }

    /// 注册的默认文件类型。
    pub fn default_filetype() -> &'static str {
        DEFAULT_EXTENSION
    }

    /// 取当前渲染器；尺寸或分辨率变化时重建，`cleared` 时重置文档。
    pub fn renderer(&mut self, cleared: bool) -> &mut DxfRenderer {
        let key = RendererKey {
            width: self.width,
            height: self.height,
            dpi: self.dpi,
        };
        if self.key != key {
            self.renderer = DxfRenderer::new(self.width, self.height, self.dpi, self.version.clone());
            self.key = key;
        } else if cleared {
            self.renderer.clear();
        }
        &mut self.renderer
    }

    /// 驱动图形完成一次渲染，返回生成的文档。
    pub fn draw(&mut self, figure: &impl Drawable) -> &Document {
        let renderer = self.renderer(false);
        figure.draw(renderer);
        renderer.document()
    }

    /// 渲染并保存到文件路径。
    pub fn print_dxf(&mut self, figure: &impl Drawable, path: impl AsRef<Path>) -> Result<(), IoError> {
        let renderer = self.renderer(false);
        figure.draw(renderer);
        DxfFacade::new().save(renderer.document(), path.as_ref())?;
        info!(path = %path.as_ref().display(), "DXF 文档已保存");
        Ok(())
    }

    /// 渲染并写入文本输出流。
    pub fn write_dxf<W: Write>(&mut self, figure: &impl Drawable, writer: W) -> Result<(), IoError> {
        let renderer = self.renderer(false);
        figure.draw(renderer);
        DxfFacade::new().write(renderer.document(), writer)
    }
}
