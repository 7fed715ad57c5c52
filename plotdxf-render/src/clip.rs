use std::panic::{AssertUnwindSafe, catch_unwind};

use geo::{BooleanOps, Coord, LineString, MultiLineString, Polygon};
use plotdxf_core::geometry::{ClipRect, Point2};
use tracing::{debug, warn};

/// 绘制对象的语义类别，对应宿主分组名 `patch` / `line2d`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    Patch,
    Line2d,
}

impl PathKind {
    pub fn from_group(name: &str) -> Option<PathKind> {
        match name {
            "patch" => Some(PathKind::Patch),
            "line2d" => Some(PathKind::Line2d),
            _ => None,
        }
    }
}

/// 裁剪结果：单条轮廓或多条互不相连的轮廓。
///
/// 下游按变体分派，不对坐标值做类型探测；窗口把形状切成的
/// 每一块都必须保留为独立轮廓。
#[derive(Debug, Clone, PartialEq)]
pub enum Contours {
    One(Vec<Point2>),
    Many(Vec<Vec<Point2>>),
}

impl Contours {
    #[inline]
    pub fn none() -> Self {
        Contours::Many(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Contours::One(contour) => contour.is_empty(),
            Contours::Many(contours) => contours.iter().all(|contour| contour.is_empty()),
        }
    }

    pub fn count(&self) -> usize {
        match self {
            Contours::One(contour) => usize::from(!contour.is_empty()),
            Contours::Many(contours) => {
                contours.iter().filter(|contour| !contour.is_empty()).count()
            }
        }
    }

    /// 展开为轮廓列表，剔除空环。
    pub fn into_contours(self) -> Vec<Vec<Point2>> {
        match self {
            Contours::One(contour) => {
                if contour.is_empty() {
                    Vec::new()
                } else {
                    vec![contour]
                }
            }
            Contours::Many(contours) => contours
                .into_iter()
                .filter(|contour| !contour.is_empty())
                .collect(),
        }
    }
}

/// 将顶点序列按窗口裁剪。
///
/// 无窗口时原样返回。patch 模式走矩形-多边形求交（凸窗口下单片输出）；
/// line2d 模式先剔除非有限顶点，退化为单点时做点含测试，否则做
/// 折线-多边形求交，窗口切出的每一段各自成为一条轮廓。
pub fn clip_contour(vertices: &[Point2], window: Option<&ClipRect>, kind: PathKind) -> Contours {
    let Some(window) = window else {
        return Contours::One(vertices.to_vec());
    };

    match kind {
        PathKind::Patch => clip_patch(vertices, window),
        PathKind::Line2d => clip_line(vertices, window),
    }
}

fn clip_patch(vertices: &[Point2], window: &ClipRect) -> Contours {
    if vertices.len() < 3 {
        debug!(count = vertices.len(), "patch 顶点不足，裁剪结果为空");
        return Contours::none();
    }

    let subject = polygon_from(vertices);
    let clipper = window_polygon(window);
    let Some(pieces) = guarded(|| clipper.intersection(&subject)) else {
        return Contours::none();
    };

    let mut contours: Vec<Vec<Point2>> = pieces
        .0
        .iter()
        .map(exterior_points)
        .filter(|contour| !contour.is_empty())
        .collect();
    match contours.len() {
        0 => Contours::none(),
        1 => Contours::One(contours.swap_remove(0)),
        extra => {
            // 凸窗口不应把简单多边形切成多片；保留首片并记录异常输入。
            warn!(pieces = extra, "凸窗口裁剪产生多片结果，仅保留第一片");
            Contours::One(contours.swap_remove(0))
        }
    }
}

fn clip_line(vertices: &[Point2], window: &ClipRect) -> Contours {
    let finite: Vec<Point2> = vertices
        .iter()
        .copied()
        .filter(|vertex| vertex.is_finite())
        .collect();

    match finite.len() {
        0 => Contours::none(),
        1 => {
            // 单点折线退化为点含测试。
            if window.contains(finite[0]) {
                Contours::One(finite)
            } else {
                Contours::none()
            }
        }
        _ => {
            let clipper = window_polygon(window);
            let line = MultiLineString::new(vec![line_string_from(&finite)]);
            let Some(clipped) = guarded(|| clipper.clip(&line, false)) else {
                return Contours::none();
            };

            let mut contours: Vec<Vec<Point2>> = clipped
                .0
                .iter()
                .map(line_points)
                .filter(|contour| contour.len() > 1)
                .collect();
            match contours.len() {
                0 => Contours::none(),
                1 => Contours::One(contours.swap_remove(0)),
                _ => Contours::Many(contours),
            }
        }
    }
}

/// 线段与多边形求交，供阴影铺排的 2 顶点启发式使用。
pub fn intersect_line_with_polygon(segment: &[Point2], boundary: &[Point2]) -> Vec<Vec<Point2>> {
    if segment.len() < 2 || boundary.len() < 3 {
        return Vec::new();
    }
    let clipper = polygon_from(boundary);
    let line = MultiLineString::new(vec![line_string_from(segment)]);
    let Some(clipped) = guarded(|| clipper.clip(&line, false)) else {
        return Vec::new();
    };
    clipped
        .0
        .iter()
        .map(line_points)
        .filter(|contour| contour.len() > 1)
        .collect()
}

/// 多边形与多边形求交，结果为各交集片的外轮廓。
pub fn intersect_polygons(subject: &[Point2], boundary: &[Point2]) -> Vec<Vec<Point2>> {
    if subject.len() < 3 || boundary.len() < 3 {
        return Vec::new();
    }
    let subject = polygon_from(subject);
    let clipper = polygon_from(boundary);
    let Some(pieces) = guarded(|| clipper.intersection(&subject)) else {
        return Vec::new();
    };
    pieces
        .0
        .iter()
        .map(exterior_points)
        .filter(|contour| !contour.is_empty())
        .collect()
}

/// 几何内核对病态输入（自交、重合边）可能直接 panic；
/// 在此捕获并按“交集为空”处理，渲染继续进行。
fn guarded<T>(operation: impl FnOnce() -> T) -> Option<T> {
    match catch_unwind(AssertUnwindSafe(operation)) {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("几何求交失败，按空交集处理");
            None
        }
    }
}

fn coord_from(point: Point2) -> Coord<f64> {
    Coord {
        x: point.x(),
        y: point.y(),
    }
}

fn line_string_from(points: &[Point2]) -> LineString<f64> {
    LineString::new(points.iter().copied().map(coord_from).collect())
}

fn polygon_from(points: &[Point2]) -> Polygon<f64> {
    Polygon::new(line_string_from(points), Vec::new())
}

fn window_polygon(window: &ClipRect) -> Polygon<f64> {
    polygon_from(&window.corners())
}

fn line_points(line: &LineString<f64>) -> Vec<Point2> {
    line.coords()
        .map(|coord| Point2::new(coord.x, coord.y))
        .collect()
}

/// 外环顶点，去掉与首点重合的闭合点。
fn exterior_points(polygon: &Polygon<f64>) -> Vec<Point2> {
    let mut points = line_points(polygon.exterior());
    if points.len() > 1 {
        let first = points[0];
        if let Some(last) = points.last().copied()
            && (last.x() - first.x()).abs() < 1e-12
            && (last.y() - first.y()).abs() < 1e-12
        {
            points.pop();
        }
    }
    points
}
