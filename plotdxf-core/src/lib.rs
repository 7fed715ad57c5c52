pub mod geometry {
    use glam::{DAffine2, DVec2};
    use serde::{Deserialize, Serialize};

    /// 二维点，内部以 `glam::DVec2` 表示，全程使用双精度设备坐标。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_vec(vec: DVec2) -> Self {
            Self(vec)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn translate(self, offset: Vector2) -> Self {
            Self(self.0 + offset.0)
        }

        #[inline]
        pub fn is_finite(self) -> bool {
            self.0.is_finite()
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    impl From<DVec2> for Point2 {
        fn from(value: DVec2) -> Self {
            Self::from_vec(value)
        }
    }

    /// 二维向量，主要承担平移偏移量。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Vector2(pub DVec2);

    impl Vector2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    impl From<DVec2> for Vector2 {
        fn from(value: DVec2) -> Self {
            Self(value)
        }
    }

    /// 二维仿射变换，封装 `glam::DAffine2`。
    ///
    /// 绘图前端以 `then_*` 链式风格构造复合变换：先出现的调用先作用于点。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Transform2(pub DAffine2);

    impl Transform2 {
        #[inline]
        pub fn identity() -> Self {
            Self(DAffine2::IDENTITY)
        }

        #[inline]
        pub fn from_translation(offset: Vector2) -> Self {
            Self(DAffine2::from_translation(offset.as_vec2()))
        }

        #[inline]
        pub fn from_scale(factor: f64) -> Self {
            Self(DAffine2::from_scale(DVec2::splat(factor)))
        }

        /// 复合变换：`self` 先作用，`after` 后作用。
        #[inline]
        pub fn then(self, after: Transform2) -> Self {
            Self(after.0 * self.0)
        }

        #[inline]
        pub fn then_translate(self, offset: Vector2) -> Self {
            self.then(Self::from_translation(offset))
        }

        #[inline]
        pub fn then_scale(self, factor: f64) -> Self {
            self.then(Self::from_scale(factor))
        }

        #[inline]
        pub fn apply(&self, point: Point2) -> Point2 {
            Point2::from_vec(self.0.transform_point2(point.as_vec2()))
        }
    }

    impl Default for Transform2 {
        fn default() -> Self {
            Self::identity()
        }
    }

    /// 轴对齐边界框，用于估算路径范围与铺排阴影网格。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Bounds2D {
        min: Point2,
        max: Point2,
    }

    impl Bounds2D {
        #[inline]
        pub fn new(min: Point2, max: Point2) -> Self {
            Self { min, max }
        }

        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point2::new(f64::INFINITY, f64::INFINITY),
                max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x() > self.max.x() || self.min.y() > self.max.y()
        }

        #[inline]
        pub fn min(&self) -> Point2 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point2 {
            self.max
        }

        #[inline]
        pub fn width(&self) -> f64 {
            self.max.x() - self.min.x()
        }

        #[inline]
        pub fn height(&self) -> f64 {
            self.max.y() - self.min.y()
        }

        pub fn include_point(&mut self, point: Point2) {
            if self.is_empty() {
                self.min = point;
                self.max = point;
                return;
            }
            let min_vec = self.min.as_vec2().min(point.as_vec2());
            let max_vec = self.max.as_vec2().max(point.as_vec2());
            self.min = Point2::from_vec(min_vec);
            self.max = Point2::from_vec(max_vec);
        }

        #[inline]
        pub fn center(&self) -> Point2 {
            debug_assert!(!self.is_empty());
            let min_vec = self.min.as_vec2();
            let max_vec = self.max.as_vec2();
            Point2::from_vec((min_vec + max_vec) * 0.5)
        }
    }

    /// 轴对齐裁剪窗口。构造时对两个角点做归一化，保证
    /// `min.x <= max.x` 且 `min.y <= max.y` 恒成立。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct ClipRect {
        min: Point2,
        max: Point2,
    }

    impl ClipRect {
        pub fn new(corner_a: Point2, corner_b: Point2) -> Self {
            let min = Point2::new(corner_a.x().min(corner_b.x()), corner_a.y().min(corner_b.y()));
            let max = Point2::new(corner_a.x().max(corner_b.x()), corner_a.y().max(corner_b.y()));
            Self { min, max }
        }

        #[inline]
        pub fn min(&self) -> Point2 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point2 {
            self.max
        }

        /// 按逆时针顺序返回四个角点。
        pub fn corners(&self) -> [Point2; 4] {
            [
                self.min,
                Point2::new(self.max.x(), self.min.y()),
                self.max,
                Point2::new(self.min.x(), self.max.y()),
            ]
        }

        /// 点在窗口内（含边界）。
        #[inline]
        pub fn contains(&self, point: Point2) -> bool {
            point.x() >= self.min.x()
                && point.x() <= self.max.x()
                && point.y() >= self.min.y()
                && point.y() <= self.max.y()
        }
    }

}

pub mod document {
    use serde::{Deserialize, Serialize};

    use crate::geometry::{Bounds2D, Point2};

    /// 输出格式的索引色（ACI）。0 保留给 BYBLOCK，正常取值 1-255。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct AciColor(u8);

    impl AciColor {
        /// 默认前景色（白）。
        pub const WHITE: AciColor = AciColor(7);

        #[inline]
        pub fn new(index: u8) -> Self {
            Self(index)
        }

        #[inline]
        pub fn index(self) -> u8 {
            self.0
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct EntityId(u64);

    impl EntityId {
        #[inline]
        pub fn new(raw: u64) -> Self {
            Self(raw)
        }

        /// 提供原始数值，便于序列化或生成 DXF 句柄。
        #[inline]
        pub fn get(self) -> u64 {
            self.0
        }
    }

    /// 输出格式的文字锚点枚举。每个变体携带对应的水平/垂直组码。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub enum TextAlignment {
        Left,
        Center,
        Right,
        TopLeft,
        TopCenter,
        TopRight,
        MiddleLeft,
        MiddleCenter,
        MiddleRight,
        BottomLeft,
        BottomCenter,
        BottomRight,
    }

    impl TextAlignment {
        /// DXF 组码对 (72 水平, 73 垂直)。
        pub fn dxf_codes(self) -> (i16, i16) {
            match self {
                TextAlignment::Left => (0, 0),
                TextAlignment::Center => (1, 0),
                TextAlignment::Right => (2, 0),
                TextAlignment::BottomLeft => (0, 1),
                TextAlignment::BottomCenter => (1, 1),
                TextAlignment::BottomRight => (2, 1),
                TextAlignment::MiddleLeft => (0, 2),
                TextAlignment::MiddleCenter => (1, 2),
                TextAlignment::MiddleRight => (2, 2),
                TextAlignment::TopLeft => (0, 3),
                TextAlignment::TopCenter => (1, 3),
                TextAlignment::TopRight => (2, 3),
            }
        }

        /// 基线左对齐（组码 0/0）直接使用插入点，不需要第二对齐点。
        #[inline]
        pub fn uses_alignment_point(self) -> bool {
            self.dxf_codes() != (0, 0)
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub enum Entity {
        Polyline(Polyline),
        Hatch(Hatch),
        Text(Text),
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Polyline {
        pub vertices: Vec<Point2>,
        pub is_closed: bool,
        pub color: AciColor,
    }

    impl Polyline {
        pub fn bounds(&self) -> Option<Bounds2D> {
            let mut bounds = Bounds2D::empty();
            for vertex in &self.vertices {
                bounds.include_point(*vertex);
            }
            if bounds.is_empty() { None } else { Some(bounds) }
        }
    }

    /// 阴影填充的单条边界路径。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct HatchBoundary {
        pub vertices: Vec<Point2>,
        pub is_closed: bool,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Hatch {
        pub color: AciColor,
        pub boundaries: Vec<HatchBoundary>,
        /// 与边界关联的源多段线实体（记账用途，不参与几何计算）。
        pub source_entities: Vec<EntityId>,
    }

    impl Hatch {
        pub fn new(color: AciColor) -> Self {
            Self {
                color,
                boundaries: Vec::new(),
                source_entities: Vec::new(),
            }
        }

        pub fn add_boundary(&mut self, vertices: Vec<Point2>, is_closed: bool) {
            self.boundaries.push(HatchBoundary {
                vertices,
                is_closed,
            });
        }

        /// 记录边界路径与来源实体之间的关联。
        pub fn associate(&mut self, sources: impl IntoIterator<Item = EntityId>) {
            self.source_entities.extend(sources);
        }
    }

    #[derive(Debug, Clone, Copy, Serialize, Deserialize)]
    pub struct TextPlacement {
        pub insert: Point2,
        pub alignment: TextAlignment,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Text {
        pub content: String,
        pub height: f64,
        /// 旋转角，单位为度（输出格式约定）。
        pub rotation: f64,
        pub color: AciColor,
        pub placement: Option<TextPlacement>,
    }

    /// 渲染输出文档：声明画布范围，持有扁平的实体序列。
    ///
    /// 文档由渲染器独占持有；画布尺寸或分辨率变化时整体丢弃重建。
    /// 实体一经写入即视为不可变。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Document {
        version: String,
        extent_min: Point2,
        extent_max: Point2,
        entities: Vec<(EntityId, Entity)>,
        next_entity_id: u64,
    }

    impl Document {
        pub fn new(version: impl Into<String>, extent_min: Point2, extent_max: Point2) -> Self {
            Self {
                version: version.into(),
                extent_min,
                extent_max,
                entities: Vec::new(),
                next_entity_id: 0,
            }
        }

        #[inline]
        pub fn version(&self) -> &str {
            &self.version
        }

        #[inline]
        pub fn extent_min(&self) -> Point2 {
            self.extent_min
        }

        #[inline]
        pub fn extent_max(&self) -> Point2 {
            self.extent_max
        }

        pub fn add_polyline(
            &mut self,
            vertices: impl IntoIterator<Item = Point2>,
            is_closed: bool,
            color: AciColor,
        ) -> EntityId {
            let collected: Vec<Point2> = vertices.into_iter().collect();
            let id = self.next_id();
            self.entities.push((
                id,
                Entity::Polyline(Polyline {
                    vertices: collected,
                    is_closed,
                    color,
                }),
            ));
            id
        }

        pub fn add_hatch(&mut self, hatch: Hatch) -> EntityId {
            let id = self.next_id();
            self.entities.push((id, Entity::Hatch(hatch)));
            id
        }

        pub fn add_text(
            &mut self,
            content: impl Into<String>,
            height: f64,
            rotation: f64,
            color: AciColor,
        ) -> EntityId {
            let id = self.next_id();
            self.entities.push((
                id,
                Entity::Text(Text {
                    content: content.into(),
                    height,
                    rotation,
                    color,
                    placement: None,
                }),
            ));
            id
        }

        /// 设置文字实体的锚点与对齐方式，返回实体是否存在。
        pub fn set_text_placement(&mut self, id: EntityId, placement: TextPlacement) -> bool {
            match self.entity_mut(id) {
                Some(Entity::Text(text)) => {
                    text.placement = Some(placement);
                    true
                }
                _ => false,
            }
        }

        pub fn entity(&self, id: EntityId) -> Option<&Entity> {
            self.entities
                .iter()
                .find(|(entity_id, _)| *entity_id == id)
                .map(|(_, entity)| entity)
        }

        pub fn polyline(&self, id: EntityId) -> Option<&Polyline> {
            match self.entity(id) {
                Some(Entity::Polyline(polyline)) => Some(polyline),
                _ => None,
            }
        }

        #[inline]
        pub fn entities(&self) -> impl Iterator<Item = &(EntityId, Entity)> {
            self.entities.iter()
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.entities.is_empty()
        }

        fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
            self.entities
                .iter_mut()
                .find(|(entity_id, _)| *entity_id == id)
                .map(|(_, entity)| entity)
        }

        fn next_id(&mut self) -> EntityId {
            let id = EntityId::new(self.next_entity_id);
            self.next_entity_id += 1;
            id
        }
    }

}
