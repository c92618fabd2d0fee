use std::path::Path;

use anyhow::Context;

use crate::foundation::error::PhotowallResult;

/// A composited collage as RGBA8 pixels.
///
/// Pixels are **premultiplied alpha**; with an opaque background every pixel is opaque and the
/// bytes equal straight RGBA.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollageFrame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl CollageFrame {
    /// Premultiplied RGBA8 of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Convert to a straight-alpha image.
    pub fn to_rgba_image(&self) -> PhotowallResult<image::RgbaImage> {
        let mut data = self.data.clone();
        if self.premultiplied {
            unpremultiply_rgba8_in_place(&mut data);
        }
        let img = image::RgbaImage::from_raw(self.width, self.height, data)
            .context("frame byte length does not match its dimensions")?;
        Ok(img)
    }

    /// Encode as PNG at `path`.
    pub fn save_png(&self, path: &Path) -> PhotowallResult<()> {
        self.to_rgba_image()?
            .save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }
}

fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
