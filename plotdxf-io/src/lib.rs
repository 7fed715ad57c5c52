use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use plotdxf_core::document::{Document, Entity, Hatch, Polyline, Text};
use plotdxf_core::geometry::Point2;
use thiserror::Error;

/// 实体句柄的起始值，避开表对象占用的低位句柄。
const HANDLE_BASE: u64 = 0x100;

/// 注册的默认文件扩展名。
pub const DEFAULT_EXTENSION: &str = "dxf";

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to write file {path:?}: {source}")]
    WriteError {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write DXF stream: {0}")]
    StreamError(#[from] std::io::Error),
}

pub trait DocumentSaver {
    fn save(&self, document: &Document, path: &Path) -> Result<(), IoError>;
}

pub struct DxfFacade;

impl DxfFacade {
    pub fn new() -> Self {
        Self
    }

    /// 写入任意输出流（文本流形式的 DXF）。
    pub fn write<W: Write>(&self, document: &Document, writer: W) -> Result<(), IoError> {
        let mut emitter = DxfEmitter::new(writer);
        emitter.emit_document(document)?;
        Ok(())
    }
}

impl DocumentSaver for DxfFacade {
    fn save(&self, document: &Document, path: &Path) -> Result<(), IoError> {
        let file = File::create(path).map_err(|source| IoError::WriteError {
            path: path.to_path_buf(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        let emitted = DxfEmitter::new(&mut writer).emit_document(document);
        emitted
            .and_then(|_| writer.flush())
            .map_err(|source| IoError::WriteError {
                path: path.to_path_buf(),
                source,
            })
    }
}

/// 根据实体编号生成 DXF 句柄（十六进制、无前缀）。
pub fn entity_handle(raw_id: u64) -> String {
    format!("{:X}", HANDLE_BASE + raw_id)
}

/// 按组码/值对逐行写出 DXF 的发射器。
struct DxfEmitter<W: Write> {
    out: W,
}

impl<W: Write> DxfEmitter<W> {
    fn new(out: W) -> Self {
        Self { out }
    }

    fn pair(&mut self, code: i32, value: impl std::fmt::Display) -> std::io::Result<()> {
        writeln!(self.out, "{code}")?;
        writeln!(self.out, "{value}")
    }

    /// 写出一个 2D 点的 X/Y/Z 组码三元组（Z 恒为 0）。
    fn point(&mut self, base_code: i32, point: Point2) -> std::io::Result<()> {
        self.pair(base_code, point.x())?;
        self.pair(base_code + 10, point.y())?;
        self.pair(base_code + 20, 0.0)
    }

    fn emit_document(&mut self, document: &Document) -> std::io::Result<()> {
        self.emit_header(document)?;
        self.emit_tables()?;
        self.emit_entities(document)?;
        self.pair(0, "EOF")
    }

    fn emit_header(&mut self, document: &Document) -> std::io::Result<()> {
        let seed = HANDLE_BASE + document.entities().count() as u64 + 1;
        self.pair(0, "SECTION")?;
        self.pair(2, "HEADER")?;
        self.pair(9, "$ACADVER")?;
        self.pair(1, document.version())?;
        self.pair(9, "$HANDSEED")?;
        self.pair(5, format!("{seed:X}"))?;
        self.pair(9, "$EXTMIN")?;
        self.point(10, document.extent_min())?;
        self.pair(9, "$EXTMAX")?;
        self.point(10, document.extent_max())?;
        self.pair(0, "ENDSEC")
    }

    /// 图层表：所有实体都落在默认图层 0 上。
    fn emit_tables(&mut self) -> std::io::Result<()> {
        self.pair(0, "SECTION")?;
        self.pair(2, "TABLES")?;
        self.pair(0, "TABLE")?;
        self.pair(2, "LAYER")?;
        self.pair(70, 1)?;
        self.pair(0, "LAYER")?;
        self.pair(2, "0")?;
        self.pair(70, 0)?;
        self.pair(62, 7)?;
        self.pair(6, "CONTINUOUS")?;
        self.pair(0, "ENDTAB")?;
        self.pair(0, "ENDSEC")
    }

    fn emit_entities(&mut self, document: &Document) -> std::io::Result<()> {
        self.pair(0, "SECTION")?;
        self.pair(2, "ENTITIES")?;
        for (id, entity) in document.entities() {
            let handle = entity_handle(id.get());
            match entity {
                Entity::Polyline(polyline) => self.emit_polyline(&handle, polyline)?,
                Entity::Hatch(hatch) => self.emit_hatch(&handle, hatch)?,
                Entity::Text(text) => self.emit_text(&handle, text)?,
            }
        }
        self.pair(0, "ENDSEC")
    }

    fn emit_polyline(&mut self, handle: &str, polyline: &Polyline) -> std::io::Result<()> {
        self.pair(0, "LWPOLYLINE")?;
        self.pair(5, handle)?;
        self.pair(100, "AcDbEntity")?;
        self.pair(8, "0")?;
        self.pair(62, polyline.color.index())?;
        self.pair(100, "AcDbPolyline")?;
        self.pair(90, polyline.vertices.len())?;
        self.pair(70, i32::from(polyline.is_closed))?;
        for vertex in &polyline.vertices {
            self.pair(10, vertex.x())?;
            self.pair(20, vertex.y())?;
        }
        Ok(())
    }

    fn emit_hatch(&mut self, handle: &str, hatch: &Hatch) -> std::io::Result<()> {
        self.pair(0, "HATCH")?;
        self.pair(5, handle)?;
        self.pair(100, "AcDbEntity")?;
        self.pair(8, "0")?;
        self.pair(62, hatch.color.index())?;
        self.pair(100, "AcDbHatch")?;
        self.point(10, Point2::new(0.0, 0.0))?;
        self.pair(210, 0.0)?;
        self.pair(220, 0.0)?;
        self.pair(230, 1.0)?;
        self.pair(2, "SOLID")?;
        self.pair(70, 1)?;
        self.pair(71, i32::from(!hatch.source_entities.is_empty()))?;
        self.pair(91, hatch.boundaries.len())?;
        for boundary in &hatch.boundaries {
            // 2 = 多段线边界路径
            self.pair(92, 2)?;
            self.pair(72, 0)?;
            self.pair(73, i32::from(boundary.is_closed))?;
            self.pair(93, boundary.vertices.len())?;
            for vertex in &boundary.vertices {
                self.pair(10, vertex.x())?;
                self.pair(20, vertex.y())?;
            }
            self.pair(97, hatch.source_entities.len())?;
            for source in &hatch.source_entities {
                self.pair(330, entity_handle(source.get()))?;
            }
        }
        self.pair(75, 1)?;
        self.pair(76, 1)?;
        self.pair(98, 0)
    }

    fn emit_text(&mut self, handle: &str, text: &Text) -> std::io::Result<()> {
        let insert = text
            .placement
            .map(|placement| placement.insert)
            .unwrap_or_else(|| Point2::new(0.0, 0.0));

        self.pair(0, "TEXT")?;
        self.pair(5, handle)?;
        self.pair(100, "AcDbEntity")?;
        self.pair(8, "0")?;
        self.pair(62, text.color.index())?;
        self.pair(100, "AcDbText")?;
        self.point(10, insert)?;
        self.pair(40, text.height)?;
        self.pair(1, &text.content)?;
        self.pair(50, text.rotation)?;

        if let Some(placement) = text.placement
            && placement.alignment.uses_alignment_point()
        {
            let (horizontal, vertical) = placement.alignment.dxf_codes();
            self.pair(72, horizontal)?;
            // 非默认对齐使用第二对齐点作为锚点。
            self.point(11, placement.insert)?;
            self.pair(100, "AcDbText")?;
            self.pair(73, vertical)?;
        }
        Ok(())
    }
}
