//! Photowall turns a directory of photos into a self-refreshing collage.
//!
//! Every refresh interval a fresh random sample of photos is laid out on a grid, fitted into its
//! cells without distortion, composited with an optional caption and presented on a display
//! surface.
//!
//! # Pipeline overview
//!
//! 1. **Sample**: [`ImageSource`] picks up to N distinct photos from a directory
//! 2. **Plan**: [`plan_grid`] splits the canvas into N cells that tile it exactly
//! 3. **Fit**: [`ImageFitter`] places each photo in its cell (letterboxed or center-cropped)
//! 4. **Compose**: [`Compositor`] draws the placements and caption into a [`CollageFrame`]
//! 5. **Present**: [`RefreshLoop`] publishes the frame to a [`FrameSlot`] and a [`DisplaySurface`]
//!    and waits for the next tick or a [`LoopSignal`]
//!
//! Design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic layout**: planning and fitting are pure; sampling is reproducible with a seed.
//! - **Premultiplied RGBA8** end-to-end: decoded photos and composed frames are premultiplied.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod config;
mod foundation;
mod layout;
mod render;
mod session;

pub use assets::decode::{DecodedPhoto, decode_photo, decode_photo_file};
pub use assets::source::{ImageSource, PHOTO_EXTENSIONS, PhotoRef, SamplePolicy, scan_photos};
pub use assets::text::{OverlayFont, TextBrushRgba8, TextLayoutEngine, layout_extent};
pub use config::settings::{DEFAULT_SETTINGS_FILE, Settings};
pub use foundation::core::{
    Affine, CanvasSpec, CellRect, MAX_CANVAS_EDGE, MAX_PHOTO_COUNT, PhotoCount, Rect, Rgba8, Vec2,
};
pub use foundation::error::{PhotowallError, PhotowallResult};
pub use layout::fit::{FitMode, ImageFitter, PlacedImage};
pub use layout::grid::{GridShape, plan_grid};
pub use render::compositor::{Compositor, CompositorOpts};
pub use render::frame::CollageFrame;
pub use session::display::{DisplaySurface, InMemorySurface, PngSurface};
pub use session::refresh_loop::{
    DEFAULT_INTERVAL, LoopSignal, LoopState, LoopStats, RefreshConfig, RefreshLoop,
};
pub use session::slot::{FrameSlot, FrameSlotReader};
