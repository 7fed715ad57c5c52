use std::sync::LazyLock;

use plotdxf_core::geometry::{Point2, Transform2};
use regex::Regex;

/// 宿主的富文本元数据。低层文字调用不携带它，渲染核心会直接忽略。
#[derive(Debug, Clone)]
pub struct TextMeta {
    /// 宿主声明的水平对齐关键字。
    pub horizontal_alignment: String,
    /// 宿主声明的垂直对齐关键字。
    pub vertical_alignment: String,
    pub rotation_mode: RotationMode,
    /// 宿主无量纲坐标系下的文字位置。
    pub unitless_position: Point2,
    /// 将无量纲位置映射到设备坐标的变换。
    pub transform: Transform2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationMode {
    Default,
    Anchor,
}

static BOLD_MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\mathbf\{(.*?)\}").expect("bold markup regex"));
static DOLLAR_DELIMITER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[$]").expect("dollar delimiter regex"));
static ITALIC_SPACING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\/").expect("italic spacing regex"));

/// 文字内容归一化：Unicode 负号替换为连字符，丢弃非 ASCII 字符，
/// 以 `$` 开头的数学标记做尽力而为的剥离（近似纯文本，不做排版）。
pub fn normalize_content(raw: &str) -> String {
    let replaced = raw.replace('\u{2212}', "-");
    let ascii: String = replaced.chars().filter(char::is_ascii).collect();
    if ascii.starts_with('$') {
        strip_mathtext(&ascii)
    } else {
        ascii
    }
}

fn strip_mathtext(text: &str) -> String {
    let stripped = BOLD_MARKUP.replace_all(text, "$1");
    let stripped = DOLLAR_DELIMITER.replace_all(&stripped, "");
    ITALIC_SPACING.replace_all(&stripped, " ").into_owned()
}
