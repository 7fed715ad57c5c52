use plotdxf_core::geometry::{Bounds2D, Point2, Transform2};
use serde::{Deserialize, Serialize};

/// 绘图前端提交的路径：有序顶点序列加可选的子路径分段。
///
/// 顶点处于宿主内部坐标系，进入裁剪管线前必须先施加变换。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotPath {
    vertices: Vec<Point2>,
    /// 各子路径的起始下标；恒以 0 开头。
    subpath_starts: Vec<usize>,
}

impl PlotPath {
    pub fn new(vertices: Vec<Point2>) -> Self {
        Self {
            vertices,
            subpath_starts: vec![0],
        }
    }

    pub fn from_subpaths(subpaths: Vec<Vec<Point2>>) -> Self {
        let mut vertices = Vec::new();
        let mut subpath_starts = Vec::new();
        for subpath in subpaths {
            if subpath.is_empty() {
                continue;
            }
            subpath_starts.push(vertices.len());
            vertices.extend(subpath);
        }
        if subpath_starts.is_empty() {
            subpath_starts.push(0);
        }
        Self {
            vertices,
            subpath_starts,
        }
    }

    #[inline]
    pub fn vertices(&self) -> &[Point2] {
        &self.vertices
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn transformed(&self, transform: &Transform2) -> PlotPath {
        Self {
            vertices: self
                .vertices
                .iter()
                .map(|vertex| transform.apply(*vertex))
                .collect(),
            subpath_starts: self.subpath_starts.clone(),
        }
    }

    pub fn bounds(&self) -> Option<Bounds2D> {
        let mut bounds = Bounds2D::empty();
        for vertex in &self.vertices {
            if vertex.is_finite() {
                bounds.include_point(*vertex);
            }
        }
        if bounds.is_empty() { None } else { Some(bounds) }
    }

    /// 按子路径拆分成独立的顶点环，供阴影单元分解使用。
    pub fn to_polygons(&self) -> Vec<Vec<Point2>> {
        let mut polygons = Vec::with_capacity(self.subpath_starts.len());
        for (slot, start) in self.subpath_starts.iter().enumerate() {
            let end = self
                .subpath_starts
                .get(slot + 1)
                .copied()
                .unwrap_or(self.vertices.len());
            if end > *start {
                polygons.push(self.vertices[*start..end].to_vec());
            }
        }
        polygons
    }
}
