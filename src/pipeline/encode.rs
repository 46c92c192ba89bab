//! Image encoding: [`LoadedImage`] → base64 payload wrapped in `ImageData`.
//!
//! Images within the configured edge cap are sent as they are. Larger images
//! are downscaled (aspect ratio kept) and re-encoded as PNG, so a phone photo
//! does not blow the request size.

use super::input::LoadedImage;
use crate::error::VisionError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::io::Cursor;
use tracing::debug;

/// Prepare `img` for the vision request.
pub fn prepare_image(img: &LoadedImage, max_edge: Option<u32>) -> Result<ImageData, VisionError> {
    let failed = |e: image::ImageError| VisionError::ImageEncodingFailed {
        source_name: img.source_name.clone(),
        detail: e.to_string(),
    };

    if let Some(max_edge) = max_edge {
        let (w, h) = ImageReader::with_format(Cursor::new(&img.bytes), img.format)
            .into_dimensions()
            .map_err(failed)?;
        if w.max(h) > max_edge {
            let decoded = image::load_from_memory_with_format(&img.bytes, img.format).map_err(failed)?;
            let resized = decoded.resize(max_edge, max_edge, FilterType::Lanczos3);
            debug!(
                "Downscaled {} from {}x{} to {}x{}",
                img.source_name,
                w,
                h,
                resized.width(),
                resized.height()
            );
            return encode_png(&resized).map_err(failed);
        }
    }

    let b64 = STANDARD.encode(&img.bytes);
    debug!("Encoded image → {} bytes base64", b64.len());
    Ok(ImageData::new(b64, img.mime_type()).with_detail("high"))
}

/// Encode a decoded image as a base64 PNG.
pub fn encode_png(img: &DynamicImage) -> Result<ImageData, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded image → {} bytes base64", b64.len());

    Ok(ImageData::new(b64, "image/png").with_detail("high"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([255, 0, 0, 255])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
        buf
    }

    #[test]
    fn small_image_is_sent_untouched() {
        let bytes = png_bytes(10, 10);
        let loaded = LoadedImage::from_bytes("red.png", bytes.clone()).unwrap();
        let data = prepare_image(&loaded, Some(64)).unwrap();
        assert_eq!(data.mime_type, "image/png");
        assert_eq!(STANDARD.decode(&data.data).unwrap(), bytes);
    }

    #[test]
    fn large_image_is_downscaled() {
        let loaded = LoadedImage::from_bytes("wide.png", png_bytes(200, 100)).unwrap();
        let data = prepare_image(&loaded, Some(64)).unwrap();
        let decoded = image::load_from_memory(&STANDARD.decode(&data.data).unwrap()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 32));
    }

    #[test]
    fn no_cap_means_no_decode() {
        let loaded = LoadedImage::from_bytes("big.png", png_bytes(300, 300)).unwrap();
        let data = prepare_image(&loaded, None).unwrap();
        assert!(!data.data.is_empty());
    }
}
