use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::foundation::core::CanvasSpec;
use crate::foundation::error::{PhotowallError, PhotowallResult};
use crate::render::frame::CollageFrame;

/// Where composited collages are shown.
///
/// A surface has a windowed and a fullscreen mode, each with its own canvas size. Failures are
/// reported as [`PhotowallError::DisplayUnavailable`], which stops the refresh loop.
pub trait DisplaySurface {
    /// Effective canvas size for the current mode.
    fn canvas(&self) -> CanvasSpec;

    /// Show `frame`, replacing whatever was shown before.
    fn present(&mut self, frame: &Arc<CollageFrame>) -> PhotowallResult<()>;

    /// Switch mode and return the new effective canvas size.
    fn set_fullscreen(&mut self, fullscreen: bool) -> PhotowallResult<CanvasSpec>;

    /// Whether the fullscreen mode is active.
    fn is_fullscreen(&self) -> bool;

    /// Release the surface. Called once when the loop stops.
    fn release(&mut self) -> PhotowallResult<()>;
}

/// Surface that keeps one PNG file up to date with the latest frame.
///
/// Each present encodes to a sibling temp file and renames it over the target, so viewers polling
/// the file never observe a half-written image.
#[derive(Debug)]
pub struct PngSurface {
    path: PathBuf,
    windowed: CanvasSpec,
    fullscreen: CanvasSpec,
    is_fullscreen: bool,
    released: bool,
}

impl PngSurface {
    /// Surface writing to `path`, starting windowed.
    pub fn new(path: impl Into<PathBuf>, windowed: CanvasSpec, fullscreen: CanvasSpec) -> Self {
        Self {
            path: path.into(),
            windowed,
            fullscreen,
            is_fullscreen: false,
            released: false,
        }
    }

    /// Start in fullscreen mode.
    pub fn with_fullscreen(mut self, fullscreen: bool) -> Self {
        self.is_fullscreen = fullscreen;
        self
    }

    /// Target file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "collage.png".into());
        name.push(".tmp");
        let mut tmp = self.path.clone();
        tmp.set_file_name(name);
        tmp
    }
}

impl DisplaySurface for PngSurface {
    fn canvas(&self) -> CanvasSpec {
        if self.is_fullscreen {
            self.fullscreen
        } else {
            self.windowed
        }
    }

    fn present(&mut self, frame: &Arc<CollageFrame>) -> PhotowallResult<()> {
        if self.released {
            return Err(PhotowallError::display_unavailable(
                "surface already released",
            ));
        }
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                PhotowallError::display_unavailable(format!(
                    "create output dir '{}': {e}",
                    parent.display()
                ))
            })?;
        }

        let tmp = self.temp_path();
        let img = frame.to_rgba_image()?;
        img.save_with_format(&tmp, image::ImageFormat::Png)
            .map_err(|e| {
                PhotowallError::display_unavailable(format!("write '{}': {e}", tmp.display()))
            })?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            PhotowallError::display_unavailable(format!(
                "replace '{}': {e}",
                self.path.display()
            ))
        })?;
        tracing::debug!(
            path = %self.path.display(),
            w = frame.width,
            h = frame.height,
            "frame presented"
        );
        Ok(())
    }

    fn set_fullscreen(&mut self, fullscreen: bool) -> PhotowallResult<CanvasSpec> {
        self.is_fullscreen = fullscreen;
        Ok(self.canvas())
    }

    fn is_fullscreen(&self) -> bool {
        self.is_fullscreen
    }

    fn release(&mut self) -> PhotowallResult<()> {
        self.released = true;
        let tmp = self.temp_path();
        if tmp.exists() {
            std::fs::remove_file(&tmp).ok();
        }
        Ok(())
    }
}

/// Surface that records every presented frame. Used by tests and embedders.
#[derive(Debug)]
pub struct InMemorySurface {
    windowed: CanvasSpec,
    fullscreen: CanvasSpec,
    is_fullscreen: bool,
    frames: Vec<Arc<CollageFrame>>,
    fail_after: Option<usize>,
    released: bool,
}

impl InMemorySurface {
    /// Surface with the same size in both modes.
    pub fn new(canvas: CanvasSpec) -> Self {
        Self::with_modes(canvas, canvas)
    }

    /// Surface with distinct windowed and fullscreen sizes.
    pub fn with_modes(windowed: CanvasSpec, fullscreen: CanvasSpec) -> Self {
        Self {
            windowed,
            fullscreen,
            is_fullscreen: false,
            frames: Vec::new(),
            fail_after: None,
            released: false,
        }
    }

    /// Make `present` fail with `DisplayUnavailable` once `n` frames were shown.
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    /// Frames presented so far, oldest first.
    pub fn frames(&self) -> &[Arc<CollageFrame>] {
        &self.frames
    }

    /// Whether [`DisplaySurface::release`] was called.
    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl DisplaySurface for InMemorySurface {
    fn canvas(&self) -> CanvasSpec {
        if self.is_fullscreen {
            self.fullscreen
        } else {
            self.windowed
        }
    }

    fn present(&mut self, frame: &Arc<CollageFrame>) -> PhotowallResult<()> {
        if self.released {
            return Err(PhotowallError::display_unavailable(
                "surface already released",
            ));
        }
        if let Some(n) = self.fail_after
            && self.frames.len() >= n
        {
            return Err(PhotowallError::display_unavailable("display went away"));
        }
        self.frames.push(Arc::clone(frame));
        Ok(())
    }

    fn set_fullscreen(&mut self, fullscreen: bool) -> PhotowallResult<CanvasSpec> {
        self.is_fullscreen = fullscreen;
        Ok(self.canvas())
    }

    fn is_fullscreen(&self) -> bool {
        self.is_fullscreen
    }

    fn release(&mut self) -> PhotowallResult<()> {
        self.released = true;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/display.rs"]
mod tests;
