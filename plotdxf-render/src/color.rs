use std::sync::LazyLock;

use plotdxf_core::document::AciColor;

/// 纯黑判定容差：各通道都落在该范围内时视为黑色。
const BLACK_TOLERANCE: f64 = 1e-6;

/// 色轮亮度阶梯（每组 5 档，偶数位满饱和、奇数位半饱和）。
const CHANNEL_LEVELS: [u8; 5] = [255, 204, 153, 102, 76];

/// 标准 CAD 索引色表：1-9 为基本色，10-249 为色相/亮度色轮，
/// 250-255 为灰度阶。0 号保留给 BYBLOCK，不参与最近邻匹配。
static PALETTE: LazyLock<[[u8; 3]; 256]> = LazyLock::new(build_palette);

fn build_palette() -> [[u8; 3]; 256] {
    let mut table = [[0u8; 3]; 256];
    table[1] = [255, 0, 0];
    table[2] = [255, 255, 0];
    table[3] = [0, 255, 0];
    table[4] = [0, 255, 255];
    table[5] = [0, 0, 255];
    table[6] = [255, 0, 255];
    table[7] = [255, 255, 255];
    table[8] = [128, 128, 128];
    table[9] = [192, 192, 192];
    for (offset, entry) in table[10..=249].iter_mut().enumerate() {
        *entry = wheel_entry(offset);
    }
    for (offset, entry) in table[250..=255].iter_mut().enumerate() {
        let value = 51 + (offset as u16 * 41).min(204) as u8;
        *entry = [value, value, value];
    }
    table
}

/// 色轮条目：24 个色相组（每组 15°）× 10 个亮度/饱和度档位。
fn wheel_entry(offset: usize) -> [u8; 3] {
    let group = offset / 10;
    let slot = offset % 10;
    let value = CHANNEL_LEVELS[slot / 2] as f64;
    let minimum = if slot % 2 == 1 { (value / 2.0).floor() } else { 0.0 };
    let hue = group as f64 * 15.0;
    hue_to_rgb(hue, value, minimum)
}

fn hue_to_rgb(hue: f64, value: f64, minimum: f64) -> [u8; 3] {
    let span = value - minimum;
    let ramp_up = |h: f64| minimum + span * (h / 60.0);
    let ramp_down = |h: f64| value - span * (h / 60.0);
    let (r, g, b) = match hue {
        h if h < 60.0 => (value, ramp_up(h), minimum),
        h if h < 120.0 => (ramp_down(h - 60.0), value, minimum),
        h if h < 180.0 => (minimum, value, ramp_up(h - 120.0)),
        h if h < 240.0 => (minimum, ramp_down(h - 180.0), value),
        h if h < 300.0 => (ramp_up(h - 240.0), minimum, value),
        h => (value, minimum, ramp_down(h - 300.0)),
    };
    [r.floor() as u8, g.floor() as u8, b.floor() as u8]
}

/// 将浮点 RGB（0.0-1.0，忽略 alpha）量化为索引色。
///
/// 无颜色时退回白色；纯黑翻转为最接近白色的索引（输出格式的查看器
/// 普遍使用深色背景，黑色线条会不可见）。其余颜色按 0-255 空间的
/// 欧氏距离取最近的调色板条目。
pub fn quantize(rgb: Option<[f64; 3]>) -> AciColor {
    match rgb {
        None => AciColor::WHITE,
        Some(channels) => {
            if channels.iter().all(|value| value.abs() <= BLACK_TOLERANCE) {
                nearest_index([255.0, 255.0, 255.0])
            } else {
                nearest_index(channels.map(|value| 255.0 * value))
            }
        }
    }
}

/// 最近邻查找，距离相同取编号较小的条目。
pub fn nearest_index(target: [f64; 3]) -> AciColor {
    let mut best_index = 1u8;
    let mut best_distance = f64::INFINITY;
    for (index, entry) in PALETTE.iter().enumerate().skip(1) {
        let dr = entry[0] as f64 - target[0];
        let dg = entry[1] as f64 - target[1];
        let db = entry[2] as f64 - target[2];
        let distance = dr * dr + dg * dg + db * db;
        if distance < best_distance {
            best_distance = distance;
            best_index = index as u8;
        }
    }
    AciColor::new(best_index)
}

/// 调色板查询，测试与文档序列化使用。
pub fn palette_entry(index: u8) -> [u8; 3] {
    PALETTE[index as usize]
}
