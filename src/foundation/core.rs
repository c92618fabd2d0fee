use crate::foundation::error::{PhotowallError, PhotowallResult};

pub use kurbo::{Affine, Rect, Vec2};

/// Largest canvas edge the raster surface can address.
pub const MAX_CANVAS_EDGE: u32 = u16::MAX as u32;

/// Largest number of photos in one collage.
pub const MAX_PHOTO_COUNT: u32 = 10_000;

/// Target canvas size in pixels.
///
/// Both edges are in `1..=MAX_CANVAS_EDGE`; construct through [`CanvasSpec::new`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct CanvasSpec {
    width: u32,
    height: u32,
}

impl CanvasSpec {
    /// Validate and build a canvas.
    pub fn new(width: u32, height: u32) -> PhotowallResult<Self> {
        if width == 0 || height == 0 {
            return Err(PhotowallError::invalid_canvas(format!(
                "canvas must be non-empty, got {width}x{height}"
            )));
        }
        if width > MAX_CANVAS_EDGE || height > MAX_CANVAS_EDGE {
            return Err(PhotowallError::invalid_canvas(format!(
                "canvas {width}x{height} exceeds {MAX_CANVAS_EDGE}px per edge"
            )));
        }
        Ok(Self { width, height })
    }

    /// Build a canvas from signed settings values; negative edges are rejected.
    pub fn from_signed(width: i64, height: i64) -> PhotowallResult<Self> {
        let w = u32::try_from(width).map_err(|_| {
            PhotowallError::invalid_canvas(format!("canvas width must be > 0, got {width}"))
        })?;
        let h = u32::try_from(height).map_err(|_| {
            PhotowallError::invalid_canvas(format!("canvas height must be > 0, got {height}"))
        })?;
        Self::new(w, h)
    }

    /// Width in pixels.
    pub fn width(self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(self) -> u32 {
        self.height
    }

    /// Total pixel count.
    pub fn area(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// `true` when the canvas is at least as wide as it is tall.
    pub fn is_landscape(self) -> bool {
        self.width >= self.height
    }

    pub(crate) fn width_u16(self) -> u16 {
        // Checked against MAX_CANVAS_EDGE in `new`.
        self.width as u16
    }

    pub(crate) fn height_u16(self) -> u16 {
        self.height as u16
    }
}

/// Number of photos (and cells) per collage, in `1..=MAX_PHOTO_COUNT`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct PhotoCount(u32);

impl PhotoCount {
    /// Validate and build a photo count.
    pub fn new(n: u32) -> PhotowallResult<Self> {
        if n == 0 {
            return Err(PhotowallError::invalid_count("photo count must be >= 1"));
        }
        if n > MAX_PHOTO_COUNT {
            return Err(PhotowallError::invalid_count(format!(
                "photo count {n} exceeds {MAX_PHOTO_COUNT}"
            )));
        }
        Ok(Self(n))
    }

    /// Build a count from a signed settings value.
    pub fn from_signed(n: i64) -> PhotowallResult<Self> {
        let n = u32::try_from(n).map_err(|_| {
            PhotowallError::invalid_count(format!("photo count must be >= 1, got {n}"))
        })?;
        Self::new(n)
    }

    /// Raw count.
    pub fn get(self) -> u32 {
        self.0
    }

    /// Count as `usize` for indexing.
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// Integer cell rectangle inside a canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct CellRect {
    /// Left edge in pixels.
    pub x: u32,
    /// Top edge in pixels.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl CellRect {
    /// Exclusive right edge.
    pub fn right(self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(self) -> u32 {
        self.y + self.height
    }

    /// Cell area in pixels.
    pub fn area(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// `true` for cells with no pixels.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// `true` if the two cells share at least one pixel.
    pub fn overlaps(self, other: CellRect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// `true` if the cell lies fully inside `canvas`.
    pub fn is_inside(self, canvas: CanvasSpec) -> bool {
        self.right() <= canvas.width() && self.bottom() <= canvas.height()
    }

    /// Floating-point rectangle covering the same pixels.
    pub fn to_rect(self) -> Rect {
        Rect::new(
            f64::from(self.x),
            f64::from(self.y),
            f64::from(self.right()),
            f64::from(self.bottom()),
        )
    }
}

/// Straight (non-premultiplied) RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Opaque white.
    pub const WHITE: Self = Self::opaque(255, 255, 255);
    /// Opaque black.
    pub const BLACK: Self = Self::opaque(0, 0, 0);

    /// Opaque color from RGB channels.
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rrggbb` or `#rrggbbaa` (leading `#` optional).
    pub fn parse_hex(s: &str) -> PhotowallResult<Self> {
        let hex = s.trim().trim_start_matches('#');
        if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
            return Err(PhotowallError::config(format!(
                "color '{s}' must be #rrggbb or #rrggbbaa"
            )));
        }
        let channel = |i: usize| -> PhotowallResult<u8> {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| PhotowallError::config(format!("color '{s}' has invalid hex digits")))
        };
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a: if hex.len() == 8 { channel(6)? } else { 255 },
        })
    }

    /// Premultiplied RGBA8 bytes.
    pub fn premultiplied(self) -> [u8; 4] {
        let a = u16::from(self.a);
        let premul = |c: u8| -> u8 { (((u16::from(c) * a) + 127) / 255) as u8 };
        [premul(self.r), premul(self.g), premul(self.b), self.a]
    }

    /// Format as `#rrggbb` (alpha appended only when not opaque).
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl serde::Serialize for Rgba8 {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Rgba8 {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Rgba8::parse_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
