use crate::assets::source::PhotoRef;
use crate::foundation::core::{CellRect, Rect, Vec2};
use crate::foundation::error::{PhotowallError, PhotowallResult};

/// How a photo is scaled into its cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitMode {
    /// Whole photo visible, letterboxed on the shorter axis.
    #[default]
    Contain,
    /// Cell fully covered, photo center-cropped.
    Cover,
}

impl std::str::FromStr for FitMode {
    type Err = PhotowallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "contain" | "fit" | "letterbox" => Ok(Self::Contain),
            "cover" | "crop" | "fill" => Ok(Self::Cover),
            other => Err(PhotowallError::config(format!(
                "unknown fit mode '{other}' (expected 'contain' or 'cover')"
            ))),
        }
    }
}

/// A photo positioned in its cell for one render pass.
#[derive(Clone, Debug)]
pub struct PlacedImage {
    /// Photo with decoded pixels.
    pub photo: PhotoRef,
    /// Destination cell.
    pub cell: CellRect,
    /// Uniform scale from photo pixels to canvas pixels (> 0).
    pub scale: f64,
    /// Top-left of the full scaled photo relative to the cell origin.
    ///
    /// Non-negative for [`FitMode::Contain`], non-positive for [`FitMode::Cover`].
    pub offset: Vec2,
    /// Region of the photo that gets drawn, in photo pixels.
    pub source: Rect,
    /// Canvas region the `source` region lands on. Always inside `cell`.
    pub dest: Rect,
}

/// Computes aspect-preserving placements.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageFitter {
    mode: FitMode,
}

impl ImageFitter {
    /// Fitter using `mode`.
    pub fn new(mode: FitMode) -> Self {
        Self { mode }
    }

    /// Decode `photo` (if needed) and place it in `cell`.
    pub fn fit(&self, mut photo: PhotoRef, cell: CellRect) -> PhotowallResult<PlacedImage> {
        if cell.is_empty() {
            return Err(PhotowallError::invalid_canvas(format!(
                "cannot fit a photo into empty cell {}x{}",
                cell.width, cell.height
            )));
        }
        let pixels = photo.load()?;
        let placement = place(self.mode, (pixels.width, pixels.height), cell);
        Ok(PlacedImage {
            photo,
            cell,
            scale: placement.scale,
            offset: placement.offset,
            source: placement.source,
            dest: placement.dest,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Placement {
    pub(crate) scale: f64,
    pub(crate) offset: Vec2,
    pub(crate) source: Rect,
    pub(crate) dest: Rect,
}

/// Pure placement math for a `photo_w x photo_h` photo; both edges and the cell are non-empty.
pub(crate) fn place(mode: FitMode, (photo_w, photo_h): (u32, u32), cell: CellRect) -> Placement {
    let pw = f64::from(photo_w);
    let ph = f64::from(photo_h);
    let cw = f64::from(cell.width);
    let ch = f64::from(cell.height);
    let cell_rect = cell.to_rect();

    match mode {
        FitMode::Contain => {
            let scale = (cw / pw).min(ch / ph);
            let sw = (pw * scale).min(cw);
            let sh = (ph * scale).min(ch);
            let offset = Vec2::new((cw - sw) * 0.5, (ch - sh) * 0.5);
            let dest = Rect::from_origin_size(
                (cell_rect.x0 + offset.x, cell_rect.y0 + offset.y),
                (sw, sh),
            )
            .intersect(cell_rect);
            Placement {
                scale,
                offset,
                source: Rect::new(0.0, 0.0, pw, ph),
                dest,
            }
        }
        FitMode::Cover => {
            let scale = (cw / pw).max(ch / ph);
            let visible_w = (cw / scale).min(pw);
            let visible_h = (ch / scale).min(ph);
            let sx = (pw - visible_w) * 0.5;
            let sy = (ph - visible_h) * 0.5;
            Placement {
                scale,
                offset: Vec2::new(-sx * scale, -sy * scale),
                source: Rect::from_origin_size((sx, sy), (visible_w, visible_h)),
                dest: cell_rect,
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/fit.rs"]
mod tests;
