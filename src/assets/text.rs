use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::core::Rgba8;
use crate::foundation::error::{PhotowallError, PhotowallResult};

/// Font used for the caption overlay.
#[derive(Clone)]
pub struct OverlayFont {
    /// Raw font file bytes.
    pub bytes: Arc<Vec<u8>>,
    /// Face index inside a collection file.
    pub index: u32,
    /// Family name of the face at `index`.
    pub family: String,
    /// Where the font came from, for logs.
    pub origin: String,
}

impl std::fmt::Debug for OverlayFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayFont")
            .field("bytes_len", &self.bytes.len())
            .field("index", &self.index)
            .field("family", &self.family)
            .field("origin", &self.origin)
            .finish()
    }
}

impl OverlayFont {
    /// Load a `.ttf`/`.otf` file, using its first face.
    pub fn from_file(path: &Path) -> PhotowallResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read font file '{}'", path.display()))?;
        Self::from_bytes(bytes, 0, path.display().to_string())
    }

    /// Font from raw file bytes, using the face at `index`.
    ///
    /// Fails with `Config` when the bytes hold no parsable face at that index.
    pub fn from_bytes(
        bytes: Vec<u8>,
        index: u32,
        origin: impl Into<String>,
    ) -> PhotowallResult<Self> {
        let origin = origin.into();
        let bytes = Arc::new(bytes);
        let mut db = usvg::fontdb::Database::new();
        let ids = db.load_font_source(usvg::fontdb::Source::Binary(bytes.clone()));
        let family = ids
            .iter()
            .filter_map(|id| db.face(*id))
            .find(|f| f.index == index)
            .and_then(|f| f.families.first().map(|(name, _)| name.clone()))
            .ok_or_else(|| {
                PhotowallError::config(format!(
                    "'{origin}' has no usable font face at index {index}"
                ))
            })?;
        Ok(Self {
            bytes,
            index,
            family,
            origin,
        })
    }

    /// Look up a sans-serif face among the installed system fonts.
    pub fn system_sans_serif() -> Option<Self> {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();

        let families = [
            usvg::fontdb::Family::SansSerif,
            usvg::fontdb::Family::Serif,
            usvg::fontdb::Family::Monospace,
        ];
        let query = usvg::fontdb::Query {
            families: &families,
            weight: usvg::fontdb::Weight::BOLD,
            stretch: usvg::fontdb::Stretch::Normal,
            style: usvg::fontdb::Style::Normal,
        };
        let id = db.query(&query).or_else(|| db.faces().next().map(|f| f.id))?;
        let family = db.face(id)?.families.first()?.0.clone();
        db.with_face_data(id, |data, index| Self {
            bytes: Arc::new(data.to_vec()),
            index,
            origin: format!("system:{family}"),
            family,
        })
    }

    /// Font from `path` when given, otherwise the system sans-serif.
    ///
    /// Returns `Ok(None)` when no path is given and the system has no fonts.
    pub fn resolve(path: Option<&Path>) -> PhotowallResult<Option<Self>> {
        match path {
            Some(p) => Self::from_file(p).map(Some),
            None => Ok(Self::system_sans_serif()),
        }
    }
}

/// Parley brush carrying a straight RGBA8 color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBrushRgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl From<Rgba8> for TextBrushRgba8 {
    fn from(c: Rgba8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

/// Stateful helper for building Parley text layouts from raw font bytes.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    registered: Option<(Arc<Vec<u8>>, String)>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    /// Fresh Parley contexts.
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            registered: None,
        }
    }

    /// Shape and lay out plain text using the given font.
    pub fn layout_plain(
        &mut self,
        text: &str,
        font: &OverlayFont,
        size_px: f32,
        brush: TextBrushRgba8,
        max_width_px: Option<f32>,
    ) -> PhotowallResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(PhotowallError::config("text size must be finite and > 0"));
        }

        let family_name = self.register(font)?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(max_width_px);
        if let Some(w) = max_width_px {
            layout.align(
                Some(w),
                parley::Alignment::Start,
                parley::AlignmentOptions::default(),
            );
        }
        Ok(layout)
    }

    /// Make `font` available for layout and return the family name that selects its face.
    ///
    /// One registration per font buffer; re-registering grows the collection.
    pub fn register(&mut self, font: &OverlayFont) -> PhotowallResult<String> {
        if let Some((bytes, name)) = &self.registered
            && Arc::ptr_eq(bytes, &font.bytes)
        {
            return Ok(name.clone());
        }

        let families = self.font_ctx.collection.register_fonts(
            parley::fontique::Blob::from(font.bytes.as_ref().clone()),
            None,
        );
        // A collection registers every face; the family of `font.index` picks the right one.
        let found = families.iter().any(|(id, _)| {
            self.font_ctx.collection.family_name(*id) == Some(font.family.as_str())
        });
        if !found {
            return Err(PhotowallError::config(format!(
                "font family '{}' not found in '{}'",
                font.family, font.origin
            )));
        }
        self.registered = Some((Arc::clone(&font.bytes), font.family.clone()));
        Ok(font.family.clone())
    }
}

/// Width and height of a laid out text block.
pub fn layout_extent(layout: &parley::Layout<TextBrushRgba8>) -> (f64, f64) {
    let mut w = 0.0f64;
    let mut h = 0.0f64;
    for line in layout.lines() {
        let m = line.metrics();
        w = w.max(f64::from(m.advance));
        h += f64::from(m.ascent + m.descent + m.leading);
    }
    (w, h)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/text.rs"]
mod tests;
