use std::path::PathBuf;

use plotdxf_core::document::{
    AciColor, Document, Hatch, TextAlignment, TextPlacement,
};
use plotdxf_core::geometry::Point2;
use plotdxf_io::{DEFAULT_EXTENSION, DocumentSaver, DxfFacade, entity_handle};

/// 把写出的字节流解析回组码/值对，便于结构断言。
fn read_pairs(data: &[u8]) -> Vec<(i32, String)> {
    let source = std::str::from_utf8(data).expect("DXF 输出应为 UTF-8 文本");
    let mut pairs = Vec::new();
    let mut lines = source.lines();
    while let Some(code_line) = lines.next() {
        let value_line = lines.next().expect("组码缺少对应的值行");
        let code = code_line
            .trim()
            .parse::<i32>()
            .expect("组码行无法解析为整数");
        pairs.push((code, value_line.trim_end_matches('\r').to_string()));
    }
    pairs
}

fn find_pair<'a>(pairs: &'a [(i32, String)], code: i32, value: &str) -> Option<usize> {
    pairs
        .iter()
        .position(|(pair_code, pair_value)| *pair_code == code && pair_value == value)
}

fn sample_document() -> Document {
    let mut doc = Document::new("AC1032", Point2::new(0.0, 0.0), Point2::new(640.0, 480.0));
    let polyline_id = doc.add_polyline(
        [
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
        ],
        false,
        AciColor::new(5),
    );

    let mut hatch = Hatch::new(AciColor::new(1));
    let boundary = doc
        .polyline(polyline_id)
        .map(|polyline| (polyline.vertices.clone(), polyline.is_closed))
        .expect("多段线实体缺失");
    hatch.add_boundary(boundary.0, boundary.1);
    hatch.associate([polyline_id]);
    doc.add_hatch(hatch);

    let text_id = doc.add_text("axis label", 5.0, 90.0, AciColor::new(7));
    doc.set_text_placement(
        text_id,
        TextPlacement {
            insert: Point2::new(320.0, 12.0),
            alignment: TextAlignment::TopCenter,
        },
    );
    doc
}

#[test]
fn header_declares_version_and_extents() {
    let doc = sample_document();
    let mut buffer = Vec::new();
    DxfFacade::new().write(&doc, &mut buffer).expect("写出 DXF 失败");
    let pairs = read_pairs(&buffer);

    assert_eq!(pairs[0], (0, "SECTION".to_string()));
    assert_eq!(pairs[1], (2, "HEADER".to_string()));

    let acadver = find_pair(&pairs, 9, "$ACADVER").expect("缺少 $ACADVER");
    assert_eq!(pairs[acadver + 1], (1, "AC1032".to_string()));

    let extmax = find_pair(&pairs, 9, "$EXTMAX").expect("缺少 $EXTMAX");
    assert_eq!(pairs[extmax + 1].0, 10);
    assert_eq!(pairs[extmax + 1].1, "640");
    assert_eq!(pairs[extmax + 2].0, 20);
    assert_eq!(pairs[extmax + 2].1, "480");

    assert_eq!(pairs.last(), Some(&(0, "EOF".to_string())));
}

#[test]
fn polyline_block_carries_count_flag_and_vertices() {
    let doc = sample_document();
    let mut buffer = Vec::new();
    DxfFacade::new().write(&doc, &mut buffer).expect("写出 DXF 失败");
    let pairs = read_pairs(&buffer);

    let start = find_pair(&pairs, 0, "LWPOLYLINE").expect("缺少 LWPOLYLINE");
    assert_eq!(pairs[start + 1], (5, entity_handle(0)));

    let block = &pairs[start..];
    let count = block
        .iter()
        .find(|(code, _)| *code == 90)
        .expect("缺少顶点数组码 90");
    assert_eq!(count.1, "4");
    let closed = block
        .iter()
        .find(|(code, _)| *code == 70)
        .expect("缺少闭合标志组码 70");
    assert_eq!(closed.1, "0");
    let color = block
        .iter()
        .find(|(code, _)| *code == 62)
        .expect("缺少颜色组码 62");
    assert_eq!(color.1, "5");

    let vertex_x_count = block
        .iter()
        .take_while(|(code, value)| !(*code == 0 && value == "HATCH"))
        .filter(|(code, _)| *code == 10)
        .count();
    assert_eq!(vertex_x_count, 4);
}

#[test]
fn hatch_references_its_source_polyline() {
    let doc = sample_document();
    let mut buffer = Vec::new();
    DxfFacade::new().write(&doc, &mut buffer).expect("写出 DXF 失败");
    let pairs = read_pairs(&buffer);

    let start = find_pair(&pairs, 0, "HATCH").expect("缺少 HATCH");
    let block = &pairs[start..];

    let loops = block
        .iter()
        .find(|(code, _)| *code == 91)
        .expect("缺少边界环数组码 91");
    assert_eq!(loops.1, "1");
    let vertices = block
        .iter()
        .find(|(code, _)| *code == 93)
        .expect("缺少边界顶点数组码 93");
    assert_eq!(vertices.1, "4");
    let sources = block
        .iter()
        .find(|(code, _)| *code == 97)
        .expect("缺少关联实体数组码 97");
    assert_eq!(sources.1, "1");
    let reference = block
        .iter()
        .find(|(code, _)| *code == 330)
        .expect("缺少关联句柄组码 330");
    assert_eq!(reference.1, entity_handle(0));

    let associative = block
        .iter()
        .find(|(code, _)| *code == 71)
        .expect("缺少关联标志组码 71");
    assert_eq!(associative.1, "1");
}

#[test]
fn text_block_carries_alignment_codes() {
    let doc = sample_document();
    let mut buffer = Vec::new();
    DxfFacade::new().write(&doc, &mut buffer).expect("写出 DXF 失败");
    let pairs = read_pairs(&buffer);

    let start = find_pair(&pairs, 0, "TEXT").expect("缺少 TEXT");
    let block = &pairs[start..];

    let content = block
        .iter()
        .find(|(code, _)| *code == 1)
        .expect("缺少文字内容组码 1");
    assert_eq!(content.1, "axis label");
    let height = block
        .iter()
        .find(|(code, _)| *code == 40)
        .expect("缺少高度组码 40");
    assert_eq!(height.1, "5");
    let rotation = block
        .iter()
        .find(|(code, _)| *code == 50)
        .expect("缺少旋转角组码 50");
    assert_eq!(rotation.1, "90");

    // TOP_CENTER 对应 72=1 / 73=3，并写出第二对齐点。
    let horizontal = block
        .iter()
        .find(|(code, _)| *code == 72)
        .expect("缺少水平对齐组码 72");
    assert_eq!(horizontal.1, "1");
    let vertical = block
        .iter()
        .find(|(code, _)| *code == 73)
        .expect("缺少垂直对齐组码 73");
    assert_eq!(vertical.1, "3");
    let align_x = block
        .iter()
        .find(|(code, _)| *code == 11)
        .expect("缺少第二对齐点组码 11");
    assert_eq!(align_x.1, "320");
}

#[test]
fn save_writes_the_same_bytes_as_stream_output() {
    let doc = sample_document();
    let mut buffer = Vec::new();
    DxfFacade::new().write(&doc, &mut buffer).expect("写出 DXF 失败");

    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let mut path = PathBuf::from(dir.path());
    path.push(format!("figure.{DEFAULT_EXTENSION}"));
    DxfFacade::new().save(&doc, &path).expect("保存 DXF 失败");

    let saved = std::fs::read(&path).expect("读取保存结果失败");
    assert_eq!(saved, buffer);
}

#[test]
fn document_snapshot_roundtrips_through_json() {
    let doc = sample_document();
    let encoded = serde_json::to_string(&doc).expect("序列化文档失败");
    let decoded: Document = serde_json::from_str(&encoded).expect("反序列化文档失败");
    assert_eq!(decoded.entities().count(), doc.entities().count());
    assert_eq!(decoded.version(), doc.version());
    assert!((decoded.extent_max().x() - 640.0).abs() < 1e-9);
}
