use std::sync::Arc;

use image::imageops::FilterType;
use rayon::prelude::*;

use crate::assets::text::{OverlayFont, TextBrushRgba8, TextLayoutEngine, layout_extent};
use crate::foundation::core::{Affine, CanvasSpec, Rect, Rgba8};
use crate::foundation::error::{PhotowallError, PhotowallResult};
use crate::layout::fit::PlacedImage;
use crate::render::frame::CollageFrame;

/// Caption height relative to the canvas height.
const TEXT_SIZE_RATIO: f64 = 0.05;
const MIN_TEXT_SIZE_PX: f64 = 12.0;
/// Gap between the caption plate and the bottom edge, relative to the canvas height.
const TEXT_MARGIN_RATIO: f64 = 0.06;
const TEXT_MAX_WIDTH_RATIO: f64 = 0.9;
const PLATE_ALPHA: u8 = 150;

/// Colors used by the [`Compositor`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompositorOpts {
    /// Canvas fill, visible in letterbox bars and blank cells.
    pub background: Rgba8,
    /// Caption color.
    pub text_color: Rgba8,
}

impl Default for CompositorOpts {
    fn default() -> Self {
        Self {
            background: Rgba8::WHITE,
            text_color: Rgba8::WHITE,
        }
    }
}

/// CPU compositor drawing placed photos and a caption into a fresh [`CollageFrame`].
///
/// The output depends only on the arguments of [`Compositor::compose`] and the options/font
/// given at construction; the retained contexts are scratch state.
pub struct Compositor {
    opts: CompositorOpts,
    font: Option<OverlayFont>,
    text_engine: TextLayoutEngine,
    ctx: Option<vello_cpu::RenderContext>,
}

struct Tile {
    x: u32,
    y: u32,
    image: image::RgbaImage,
}

impl Compositor {
    /// Compositor drawing captions with `font`; without a font captions are skipped.
    ///
    /// The font is registered for layout up front, so an unusable font fails here.
    pub fn new(opts: CompositorOpts, font: Option<OverlayFont>) -> PhotowallResult<Self> {
        let mut text_engine = TextLayoutEngine::new();
        if let Some(font) = &font {
            text_engine.register(font)?;
        }
        Ok(Self {
            opts,
            font,
            text_engine,
            ctx: None,
        })
    }

    /// Whether captions can be drawn.
    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Draw `placements` in order over the background and overlay `text` at the bottom center.
    ///
    /// Every placement must come from [`crate::ImageFitter::fit`] so its pixels are decoded.
    /// Resampling runs on rayon's global pool.
    pub fn compose(
        &mut self,
        canvas: CanvasSpec,
        placements: &[PlacedImage],
        text: Option<&str>,
    ) -> PhotowallResult<CollageFrame> {
        let tiles = resample_tiles(placements);
        self.draw(canvas, tiles, text)
    }

    /// Like [`Compositor::compose`], resampling on `pool`.
    pub fn compose_in(
        &mut self,
        pool: &rayon::ThreadPool,
        canvas: CanvasSpec,
        placements: &[PlacedImage],
        text: Option<&str>,
    ) -> PhotowallResult<CollageFrame> {
        let tiles = pool.install(|| resample_tiles(placements));
        self.draw(canvas, tiles, text)
    }

    #[tracing::instrument(skip_all, fields(w = canvas.width(), h = canvas.height()))]
    fn draw(
        &mut self,
        canvas: CanvasSpec,
        tiles: Vec<PhotowallResult<Option<Tile>>>,
        text: Option<&str>,
    ) -> PhotowallResult<CollageFrame> {
        let mut paints = Vec::with_capacity(tiles.len());
        for tile in tiles {
            let Some(tile) = tile? else { continue };
            let (w, h) = tile.image.dimensions();
            let pixmap = pixmap_from_premul_bytes(tile.image.as_raw(), w, h)?;
            let paint = vello_cpu::Image {
                image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
                sampler: vello_cpu::peniko::ImageSampler::default(),
            };
            paints.push((tile.x, tile.y, w, h, paint));
        }

        let caption = match text.map(str::trim).filter(|t| !t.is_empty()) {
            Some(t) => self.layout_caption(canvas, t)?,
            None => None,
        };

        let width = canvas.width_u16();
        let height = canvas.height_u16();
        let opts = self.opts;
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            _ => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();

        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(color_to_cpu(opts.background));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(canvas.width()),
            f64::from(canvas.height()),
        ));

        for (x, y, w, h, paint) in paints {
            ctx.set_transform(affine_to_cpu(Affine::translate((f64::from(x), f64::from(y)))));
            ctx.set_paint(paint);
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(w),
                f64::from(h),
            ));
        }

        if let Some(caption) = caption {
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(color_to_cpu(caption.plate_color));
            ctx.fill_rect(&rect_to_cpu(caption.plate));

            ctx.set_transform(affine_to_cpu(Affine::translate(caption.origin)));
            for line in caption.layout.lines() {
                for item in line.items() {
                    let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                        continue;
                    };
                    let brush = run.style().brush;
                    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                        brush.r, brush.g, brush.b, brush.a,
                    ));
                    let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                        id: g.id,
                        x: g.x,
                        y: g.y,
                    });
                    // Draw with the face the run was shaped with so glyph ids match.
                    ctx.glyph_run(run.run().font())
                        .font_size(run.run().font_size())
                        .fill_glyphs(glyphs);
                }
            }
        }

        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(width, height);
        ctx.render_to_pixmap(&mut pixmap);
        self.ctx = Some(ctx);

        Ok(CollageFrame {
            width: canvas.width(),
            height: canvas.height(),
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }

    fn layout_caption(
        &mut self,
        canvas: CanvasSpec,
        text: &str,
    ) -> PhotowallResult<Option<Caption>> {
        let Some(font) = &self.font else {
            tracing::warn!("no font available, caption skipped");
            return Ok(None);
        };

        let canvas_w = f64::from(canvas.width());
        let canvas_h = f64::from(canvas.height());
        let size_px = (canvas_h * TEXT_SIZE_RATIO).max(MIN_TEXT_SIZE_PX);
        let layout = self.text_engine.layout_plain(
            text,
            font,
            size_px as f32,
            TextBrushRgba8::from(self.opts.text_color),
            Some((canvas_w * TEXT_MAX_WIDTH_RATIO) as f32),
        )?;

        let (text_w, text_h) = layout_extent(&layout);
        let pad = size_px * 0.4;
        let margin = (canvas_h * TEXT_MARGIN_RATIO).round();
        let x = ((canvas_w - text_w) * 0.5).max(0.0);
        let y = (canvas_h - margin - pad - text_h).max(pad);
        let plate = Rect::new(x - pad, y - pad, x + text_w + pad, y + text_h + pad)
            .intersect(Rect::new(0.0, 0.0, canvas_w, canvas_h));

        Ok(Some(Caption {
            layout,
            origin: (x, y),
            plate,
            plate_color: plate_color_for(self.opts.text_color),
        }))
    }
}

struct Caption {
    layout: parley::Layout<TextBrushRgba8>,
    origin: (f64, f64),
    plate: Rect,
    plate_color: Rgba8,
}

/// Translucent plate contrasting with the caption color.
fn plate_color_for(text: Rgba8) -> Rgba8 {
    let luma = 299 * u32::from(text.r) + 587 * u32::from(text.g) + 114 * u32::from(text.b);
    if luma >= 128_000 {
        Rgba8 {
            a: PLATE_ALPHA,
            ..Rgba8::BLACK
        }
    } else {
        Rgba8 {
            a: PLATE_ALPHA,
            ..Rgba8::WHITE
        }
    }
}

// Independent per placement; drawing waits for all of them.
fn resample_tiles(placements: &[PlacedImage]) -> Vec<PhotowallResult<Option<Tile>>> {
    placements.par_iter().map(resample_tile).collect()
}

/// Crop the visible part of the photo and resample it to its destination pixel size.
fn resample_tile(placed: &PlacedImage) -> PhotowallResult<Option<Tile>> {
    let pixels = placed.photo.pixels().ok_or_else(|| {
        PhotowallError::corrupt_image(placed.photo.path(), "photo pixels were not decoded")
    })?;

    let (x0, y0, x1, y1) = snap(placed.dest);
    let (w, h) = (x1.saturating_sub(x0), y1.saturating_sub(y0));
    if w == 0 || h == 0 {
        return Ok(None);
    }

    let view = image::ImageBuffer::<image::Rgba<u8>, &[u8]>::from_raw(
        pixels.width,
        pixels.height,
        pixels.rgba8_premul.as_slice(),
    )
    .ok_or_else(|| {
        PhotowallError::corrupt_image(placed.photo.path(), "pixel buffer size mismatch")
    })?;

    let (sx0, sy0, sx1, sy1) = snap_outward(placed.source, pixels.width, pixels.height);
    let cropped = image::imageops::crop_imm(&view, sx0, sy0, sx1 - sx0, sy1 - sy0);
    let mut image = image::imageops::resize(&*cropped, w, h, FilterType::Lanczos3);
    clamp_premultiplied(&mut image);

    Ok(Some(Tile { x: x0, y: y0, image }))
}

fn snap(r: Rect) -> (u32, u32, u32, u32) {
    let px = |v: f64| v.round().max(0.0) as u32;
    (px(r.x0), px(r.y0), px(r.x1), px(r.y1))
}

/// Integer source window covering `r`, at least one pixel on each axis.
fn snap_outward(r: Rect, width: u32, height: u32) -> (u32, u32, u32, u32) {
    let x0 = (r.x0.floor().max(0.0) as u32).min(width - 1);
    let y0 = (r.y0.floor().max(0.0) as u32).min(height - 1);
    let x1 = (r.x1.ceil().max(0.0) as u32).clamp(x0 + 1, width);
    let y1 = (r.y1.ceil().max(0.0) as u32).clamp(y0 + 1, height);
    (x0, y0, x1, y1)
}

// Lanczos ringing can push a premultiplied channel above its alpha.
fn clamp_premultiplied(image: &mut image::RgbaImage) {
    for px in image.pixels_mut() {
        let a = px.0[3];
        for c in &mut px.0[..3] {
            *c = (*c).min(a);
        }
    }
}

fn color_to_cpu(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> PhotowallResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| PhotowallError::invalid_canvas("pixmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| PhotowallError::invalid_canvas("pixmap height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(PhotowallError::invalid_canvas("pixmap byte len mismatch"));
    }
    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        (width as usize) * (height as usize),
    );
    for px in bytes.chunks_exact(4) {
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    let may_have_opacities = pixels.iter().any(|p| p.a != 255);
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
