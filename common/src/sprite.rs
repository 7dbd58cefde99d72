//! スプライトシート判定ヒューリスティック
//!
//! 画像の幅・高さだけを見る純粋関数。画素は参照しない。

/// 幅・高さがフレームサイズの倍数に近い
pub const TAG_GRID_DIMENSIONS: &str = "sprite-sheet-like-dimensions";

/// 極端に横長・縦長（ストリップ状）
pub const TAG_SPRITE_STRIP: &str = "possible-sprite-strip";

/// 2Dゲームでよく使われるフレームサイズ
pub const COMMON_FRAME_SIZES: [u32; 5] = [32, 64, 128, 256, 512];

/// 倍数判定の許容誤差（剰余がこの値以下なら一致）
pub const FRAME_TOLERANCE: u32 = 2;

const MAX_ASPECT_RATIO: f64 = 5.0;
const MIN_ASPECT_RATIO: f64 = 0.2;

/// `value` がいずれかの候補の倍数に近いか
///
/// 剰余が小さい側だけを見る。254 は 256 の倍数「直前」だが一致しない。
pub fn is_multiple_of_any(value: u32, candidates: &[u32], tolerance: u32) -> bool {
    candidates
        .iter()
        .filter(|&&c| c != 0)
        .any(|&c| value % c <= tolerance)
}

/// 幅/高さ比（高さ0なら0）
pub fn aspect_ratio(width: u32, height: u32) -> f64 {
    if height == 0 {
        0.0
    } else {
        width as f64 / height as f64
    }
}

/// スプライトシートらしさのタグを返す
///
/// 順序は常に [グリッド寸法, ストリップ]。該当なしなら空。
pub fn detect_sprite_sheet(width: u32, height: u32) -> Vec<String> {
    let mut tags = Vec::new();

    if is_multiple_of_any(width, &COMMON_FRAME_SIZES, FRAME_TOLERANCE)
        && is_multiple_of_any(height, &COMMON_FRAME_SIZES, FRAME_TOLERANCE)
    {
        tags.push(TAG_GRID_DIMENSIONS.to_string());
    }

    let ratio = aspect_ratio(width, height);
    if ratio > MAX_ASPECT_RATIO || ratio < MIN_ASPECT_RATIO {
        tags.push(TAG_SPRITE_STRIP.to_string());
    }

    tags
}
