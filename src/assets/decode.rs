use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use image::ImageDecoder as _;

use crate::foundation::error::{PhotowallError, PhotowallResult};

/// Decoded photo in premultiplied RGBA8 form.
#[derive(Clone, Debug)]
pub struct DecodedPhoto {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// Read and decode the photo at `path`.
///
/// Any IO or decoder failure, and images with a zero edge, map to
/// [`PhotowallError::CorruptImage`].
pub fn decode_photo_file(path: &Path) -> PhotowallResult<DecodedPhoto> {
    let bytes = std::fs::read(path).map_err(|e| PhotowallError::corrupt_image(path, e))?;
    decode_photo(&bytes).map_err(|e| PhotowallError::corrupt_image(path, e))
}

/// Decode encoded image bytes, apply EXIF orientation and convert to premultiplied RGBA8.
pub fn decode_photo(bytes: &[u8]) -> anyhow::Result<DecodedPhoto> {
    let reader = image::ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let mut decoder = reader.into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut dyn_img = image::DynamicImage::from_decoder(decoder)?;
    dyn_img.apply_orientation(orientation);

    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        anyhow::bail!("image has zero dimensions ({width}x{height})");
    }

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(DecodedPhoto {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
