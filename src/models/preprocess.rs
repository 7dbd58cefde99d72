use image::imageops::FilterType;
use image::RgbImage;
use ndarray::Array4;

/// ViT系モデルの入力サイズ
pub const VIT_INPUT_SIZE: u32 = 224;

/// ViTImageProcessor の正規化値
pub const VIT_MEAN: [f32; 3] = [0.5, 0.5, 0.5];
pub const VIT_STD: [f32; 3] = [0.5, 0.5, 0.5];

/// RGB画像を `[1, 3, size, size]` のNCHWテンソルへ変換
///
/// バイリニアでリサイズし、[0,1] に縮めてから mean/std で正規化する。
pub fn pixel_values(image: &RgbImage, size: u32, mean: [f32; 3], std: [f32; 3]) -> Array4<f32> {
    let resized = image::imageops::resize(image, size, size, FilterType::Triangle);

    let mut input = Array4::<f32>::zeros((1, 3, size as usize, size as usize));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            input[[0, c, y as usize, x as usize]] = (pixel[c] as f32 / 255.0 - mean[c]) / std[c];
        }
    }
    input
}

/// ViT既定値での前処理
pub fn vit_pixel_values(image: &RgbImage) -> Array4<f32> {
    pixel_values(image, VIT_INPUT_SIZE, VIT_MEAN, VIT_STD)
}
