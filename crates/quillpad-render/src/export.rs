//! Image encoding of raster pixels.

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage, RgbaImage};
use quillpad_core::surface::{SurfaceError, SurfaceResult};

/// Encode RGBA pixels to PNG bytes.
pub fn encode_png(pixels: &RgbaImage) -> SurfaceResult<Vec<u8>> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, pixels.width(), pixels.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder
            .write_header()
            .map_err(|e| SurfaceError::Encode(format!("PNG header: {}", e)))?;
        writer
            .write_image_data(pixels.as_raw())
            .map_err(|e| SurfaceError::Encode(format!("PNG data: {}", e)))?;
    }
    log::debug!(
        "Encoded {}x{} PNG ({} bytes)",
        pixels.width(),
        pixels.height(),
        png_data.len()
    );
    Ok(png_data)
}

/// Encode pixels to JPEG, compositing transparency onto white.
pub fn encode_jpeg(pixels: &RgbaImage, quality: u8) -> SurfaceResult<Vec<u8>> {
    let rgb = flatten_onto_white(pixels);
    let mut jpeg_data = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg_data, quality.clamp(1, 100))
        .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|e| SurfaceError::Encode(format!("JPEG: {}", e)))?;
    Ok(jpeg_data)
}

fn flatten_onto_white(pixels: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(pixels.width(), pixels.height(), |x, y| {
        let [r, g, b, a] = pixels.get_pixel(x, y).0;
        let alpha = a as f32 / 255.0;
        let over_white = |c: u8| (c as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        image::Rgb([over_white(r), over_white(g), over_white(b)])
    })
}
