use plotdxf_core::document::TextAlignment;

use crate::errors::RenderError;

/// 将绘图前端的对齐关键字翻译为输出格式的对齐词。
///
/// 词汇表之外的取值属于调用方错误，直接作为 `UnsupportedAlignment`
/// 上报；宿主框架不应传入这类值。
pub fn map_align(keyword: &str, vertical: bool) -> Result<&'static str, RenderError> {
    let mapped = match keyword {
        "right" => "RIGHT",
        "center" => "CENTER",
        "left" => "LEFT",
        "top" => "TOP",
        "bottom" => "BOTTOM",
        "middle" => "MIDDLE",
        "baseline" => "",
        "center_baseline" => "MIDDLE",
        other => return Err(RenderError::UnsupportedAlignment(other.to_string())),
    };
    // 输出格式区分水平 CENTER 与垂直 MIDDLE。
    if vertical && mapped == "CENTER" {
        return Ok("MIDDLE");
    }
    Ok(mapped)
}

/// 组合垂直/水平两个对齐词，空的部分不产生分隔符。
pub fn compose_key(vertical: &str, horizontal: &str) -> String {
    match (vertical.is_empty(), horizontal.is_empty()) {
        (true, _) => horizontal.to_string(),
        (_, true) => vertical.to_string(),
        _ => format!("{vertical}_{horizontal}"),
    }
}

/// 组合键到锚点枚举的固定映射；未知组合退回左下角。
pub fn alignment_for_key(key: &str) -> TextAlignment {
    match key {
        "TOP_LEFT" => TextAlignment::TopLeft,
        "TOP_CENTER" => TextAlignment::TopCenter,
        "TOP_RIGHT" => TextAlignment::TopRight,
        "MIDDLE_LEFT" => TextAlignment::MiddleLeft,
        "MIDDLE_CENTER" => TextAlignment::MiddleCenter,
        "MIDDLE_RIGHT" => TextAlignment::MiddleRight,
        "BOTTOM_LEFT" => TextAlignment::BottomLeft,
        "BOTTOM_CENTER" => TextAlignment::BottomCenter,
        "BOTTOM_RIGHT" => TextAlignment::BottomRight,
        "LEFT" => TextAlignment::Left,
        "CENTER" => TextAlignment::Center,
        "RIGHT" => TextAlignment::Right,
        _ => TextAlignment::BottomLeft,
    }
}

/// 一步完成：映射两个关键字、组合、查表。
pub fn resolve_alignment(
    horizontal: &str,
    vertical: &str,
) -> Result<TextAlignment, RenderError> {
    let mapped_horizontal = map_align(horizontal, false)?;
    let mapped_vertical = map_align(vertical, true)?;
    Ok(alignment_for_key(&compose_key(
        mapped_vertical,
        mapped_horizontal,
    )))
}
