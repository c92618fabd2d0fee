use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};
use std::time::Duration;

use rayon::prelude::*;

use crate::assets::source::{ImageSource, SamplePolicy};
use crate::assets::text::OverlayFont;
use crate::foundation::core::{CanvasSpec, CellRect, PhotoCount, Rgba8};
use crate::foundation::error::{PhotowallError, PhotowallResult};
use crate::layout::fit::{FitMode, ImageFitter, PlacedImage};
use crate::layout::grid::plan_grid;
use crate::render::compositor::{Compositor, CompositorOpts};
use crate::render::frame::CollageFrame;
use crate::session::display::DisplaySurface;
use crate::session::slot::{FrameSlot, FrameSlotReader};

/// Default time between two collages.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(5000);

/// Everything the loop needs, fixed at startup.
#[derive(Clone, Debug)]
pub struct RefreshConfig {
    /// Directory the photos are sampled from.
    pub directory: PathBuf,
    /// Photos per collage.
    pub count: PhotoCount,
    /// Time between two collages. Must be non-zero.
    pub interval: Duration,
    /// Caption drawn over every collage.
    pub text: Option<String>,
    /// What to do when the directory holds fewer photos than `count`.
    pub policy: SamplePolicy,
    /// How photos are fitted into their cells.
    pub fit: FitMode,
    /// Canvas fill.
    pub background: Rgba8,
    /// Caption color.
    pub text_color: Rgba8,
    /// Caption font file. `None` looks up a system sans-serif.
    pub font: Option<PathBuf>,
    /// Descend into subdirectories when scanning.
    pub recursive: bool,
    /// Seed for reproducible sampling.
    pub seed: Option<u64>,
    /// Stop after this many render attempts. `None` runs until `Exit`.
    pub max_cycles: Option<u64>,
    /// Worker threads for decoding and resampling. `None` uses rayon defaults.
    pub threads: Option<usize>,
}

impl RefreshConfig {
    /// Config with defaults for everything except the directory and count.
    pub fn new(directory: impl Into<PathBuf>, count: PhotoCount) -> Self {
        Self {
            directory: directory.into(),
            count,
            interval: DEFAULT_INTERVAL,
            text: None,
            policy: SamplePolicy::default(),
            fit: FitMode::default(),
            background: Rgba8::WHITE,
            text_color: Rgba8::WHITE,
            font: None,
            recursive: false,
            seed: None,
            max_cycles: None,
            threads: None,
        }
    }
}

/// Where the loop is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    /// Constructed, not yet running.
    Idle,
    /// Building the next collage.
    Rendering,
    /// A collage is shown and the loop waits for the next tick or a signal.
    Displayed,
    /// Terminal.
    Stopped,
}

/// External requests delivered to a running loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopSignal {
    /// Switch between windowed and fullscreen, then render right away.
    ToggleFullscreen,
    /// Stop the loop.
    Exit,
}

/// Counters reported when the loop stops.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Collages composed and presented.
    pub cycles_rendered: u64,
    /// Render attempts that failed and left the previous frame in place.
    pub cycles_failed: u64,
    /// Photos dropped from a collage because they could not be decoded.
    pub photos_skipped: u64,
}

impl LoopStats {
    /// Render attempts so far.
    pub fn cycles(&self) -> u64 {
        self.cycles_rendered + self.cycles_failed
    }
}

enum Cycle {
    Composed(CollageFrame),
    Aborted,
}

/// Timer-driven collage renderer.
///
/// Each cycle samples photos, plans the grid for the current canvas, fits and composes, then
/// publishes the frame to the [`FrameSlot`] and presents it on the surface.
pub struct RefreshLoop<S: DisplaySurface> {
    config: RefreshConfig,
    surface: S,
    source: ImageSource,
    fitter: ImageFitter,
    compositor: Compositor,
    pool: rayon::ThreadPool,
    slot: FrameSlot,
    canvas: CanvasSpec,
    state: LoopState,
    stats: LoopStats,
    pending: VecDeque<LoopSignal>,
    presented_any: bool,
}

impl<S: DisplaySurface> RefreshLoop<S> {
    /// Validate `config` and prepare a loop presenting on `surface`.
    ///
    /// Everything that can only fail at startup fails here: a zero interval, a zero thread count
    /// and a missing or unparsable font file are `Config` errors.
    pub fn new(config: RefreshConfig, surface: S) -> PhotowallResult<Self> {
        if config.interval.is_zero() {
            return Err(PhotowallError::config("refresh interval must be > 0"));
        }
        let pool = build_thread_pool(config.threads)?;

        let font = OverlayFont::resolve(config.font.as_deref())
            .map_err(|e| PhotowallError::config(format!("caption font: {e}")))?;
        match &font {
            Some(f) => tracing::debug!(font = %f.origin, "caption font resolved"),
            None if config.text.is_some() => {
                tracing::warn!("no system font found, captions will not be drawn")
            }
            None => {}
        }

        let source = match config.seed {
            Some(seed) => ImageSource::seeded(&config.directory, config.policy, seed),
            None => ImageSource::new(&config.directory, config.policy),
        }
        .with_recursive(config.recursive);

        let compositor = Compositor::new(
            CompositorOpts {
                background: config.background,
                text_color: config.text_color,
            },
            font,
        )?;
        let canvas = surface.canvas();

        Ok(Self {
            fitter: ImageFitter::new(config.fit),
            config,
            surface,
            source,
            compositor,
            pool,
            slot: FrameSlot::new(),
            canvas,
            state: LoopState::Idle,
            stats: LoopStats::default(),
            pending: VecDeque::new(),
            presented_any: false,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Counters so far.
    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    /// Canvas the next collage is planned for.
    pub fn canvas(&self) -> CanvasSpec {
        self.canvas
    }

    /// Read handle onto the displayed frame.
    pub fn reader(&self) -> FrameSlotReader {
        self.slot.reader()
    }

    /// Surface the loop presents on.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Give back the surface.
    pub fn into_surface(self) -> S {
        self.surface
    }

    /// Compose one collage for the current canvas without presenting it.
    ///
    /// Errors are returned as-is; no placeholder is produced.
    pub fn render_once(&mut self) -> PhotowallResult<CollageFrame> {
        match self.render_cycle(None)? {
            Cycle::Composed(frame) => Ok(frame),
            Cycle::Aborted => Err(PhotowallError::Other(anyhow::anyhow!("render aborted"))),
        }
    }

    /// Run until `Exit`, `max_cycles`, or a display failure.
    ///
    /// When every sender of `signals` is gone the loop keeps running on its timer.
    pub fn run(&mut self, signals: &Receiver<LoopSignal>) -> PhotowallResult<LoopStats> {
        if self.state == LoopState::Stopped {
            return Ok(self.stats);
        }
        tracing::info!(
            dir = %self.config.directory.display(),
            count = self.config.count.get(),
            w = self.canvas.width(),
            h = self.canvas.height(),
            interval_ms = self.config.interval.as_millis() as u64,
            "refresh loop started"
        );
        let mut signals_open = true;

        loop {
            self.state = LoopState::Rendering;
            match self.render_cycle(Some(signals)) {
                Ok(Cycle::Composed(frame)) => {
                    if let Err(e) = self.show(frame) {
                        return self.fail(e);
                    }
                    self.stats.cycles_rendered += 1;
                    tracing::info!(cycle = self.stats.cycles_rendered, "collage updated");
                }
                Ok(Cycle::Aborted) => {
                    tracing::info!("exit requested during render, cycle abandoned");
                    self.stop()?;
                    return Ok(self.stats);
                }
                Err(e) if !e.is_cycle_local() => return self.fail(e),
                Err(e) => {
                    self.stats.cycles_failed += 1;
                    tracing::warn!(error = %e, "collage cycle failed, keeping previous frame");
                    if !self.presented_any
                        && let Err(e) = self.show_placeholder()
                    {
                        return self.fail(e);
                    }
                }
            }
            self.state = LoopState::Displayed;

            if let Some(max) = self.config.max_cycles
                && self.stats.cycles() >= max
            {
                self.stop()?;
                return Ok(self.stats);
            }

            let signal = match self.pending.pop_front() {
                Some(s) => Some(s),
                None if signals_open => match signals.recv_timeout(self.config.interval) {
                    Ok(s) => Some(s),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => {
                        tracing::debug!("signal channel closed, continuing on timer");
                        signals_open = false;
                        std::thread::sleep(self.config.interval);
                        None
                    }
                },
                None => {
                    std::thread::sleep(self.config.interval);
                    None
                }
            };

            match signal {
                Some(LoopSignal::Exit) => {
                    self.stop()?;
                    return Ok(self.stats);
                }
                Some(LoopSignal::ToggleFullscreen) => {
                    if let Err(e) = self.toggle_fullscreen() {
                        return self.fail(e);
                    }
                }
                None => {}
            }
        }
    }

    fn toggle_fullscreen(&mut self) -> PhotowallResult<()> {
        let fullscreen = !self.surface.is_fullscreen();
        self.canvas = self.surface.set_fullscreen(fullscreen)?;
        tracing::info!(
            fullscreen,
            w = self.canvas.width(),
            h = self.canvas.height(),
            "display mode changed"
        );
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(w = self.canvas.width(), h = self.canvas.height()))]
    fn render_cycle(&mut self, signals: Option<&Receiver<LoopSignal>>) -> PhotowallResult<Cycle> {
        let photos = self.source.sample(self.config.count.as_usize())?;
        if self.exit_requested(signals) {
            return Ok(Cycle::Aborted);
        }

        let count = PhotoCount::new(photos.len() as u32)?;
        let cells = plan_grid(self.canvas, count)?;

        let fitter = self.fitter;
        let fitted = self.pool.install(|| {
            photos
                .into_par_iter()
                .zip(cells.into_par_iter())
                .map(|(photo, cell)| {
                    let res = (!cell.is_empty()).then(|| fitter.fit(photo, cell));
                    (cell, res)
                })
                .collect::<Vec<_>>()
        });

        let mut placements = Vec::with_capacity(fitted.len());
        for (cell, res) in fitted {
            match res {
                None => tracing::debug!(?cell, "zero-area cell left blank"),
                Some(Ok(p)) => placements.push(p),
                Some(Err(PhotowallError::CorruptImage { path, reason })) => {
                    self.stats.photos_skipped += 1;
                    tracing::warn!(path = %path.display(), %reason, "skipping corrupt photo");
                    if let Some(p) = self.replace_corrupt(cell)? {
                        placements.push(p);
                    }
                }
                Some(Err(e)) => return Err(e),
            }
        }

        if self.exit_requested(signals) {
            return Ok(Cycle::Aborted);
        }

        let frame = self.compositor.compose_in(
            &self.pool,
            self.canvas,
            &placements,
            self.config.text.as_deref(),
        )?;
        tracing::debug!(placed = placements.len(), "collage composed");
        Ok(Cycle::Composed(frame))
    }

    /// Fill `cell` from the unused photos of this cycle; `None` leaves it blank.
    fn replace_corrupt(&mut self, cell: CellRect) -> PhotowallResult<Option<PlacedImage>> {
        while let Some(photo) = self.source.replacement() {
            match self.fitter.fit(photo, cell) {
                Ok(p) => {
                    tracing::debug!(path = %p.photo.path().display(), "replacement photo used");
                    return Ok(Some(p));
                }
                Err(PhotowallError::CorruptImage { path, reason }) => {
                    self.stats.photos_skipped += 1;
                    tracing::warn!(path = %path.display(), %reason, "skipping corrupt photo");
                }
                Err(e) => return Err(e),
            }
        }
        tracing::debug!(?cell, "no replacement left, cell stays blank");
        Ok(None)
    }

    /// Drain pending signals; keep toggles for after the cycle.
    fn exit_requested(&mut self, signals: Option<&Receiver<LoopSignal>>) -> bool {
        let Some(rx) = signals else {
            return false;
        };
        loop {
            match rx.try_recv() {
                Ok(LoopSignal::Exit) => return true,
                Ok(s) => self.pending.push_back(s),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return false,
            }
        }
    }

    fn show(&mut self, frame: CollageFrame) -> PhotowallResult<()> {
        let frame = Arc::new(frame);
        self.surface.present(&frame)?;
        self.slot.publish(frame);
        self.presented_any = true;
        Ok(())
    }

    fn show_placeholder(&mut self) -> PhotowallResult<()> {
        let text = self.config.text.as_deref();
        let frame = self.compositor.compose(self.canvas, &[], text)?;
        tracing::info!("showing placeholder until photos become available");
        self.show(frame)
    }

    fn stop(&mut self) -> PhotowallResult<()> {
        self.state = LoopState::Stopped;
        self.slot.clear();
        self.surface.release()?;
        tracing::info!(
            rendered = self.stats.cycles_rendered,
            failed = self.stats.cycles_failed,
            skipped = self.stats.photos_skipped,
            "refresh loop stopped"
        );
        Ok(())
    }

    fn fail(&mut self, err: PhotowallError) -> PhotowallResult<LoopStats> {
        tracing::error!(error = %err, "refresh loop cannot continue, stopping");
        if let Err(e) = self.stop() {
            tracing::debug!(error = %e, "release after fatal error");
        }
        Err(err)
    }
}

fn build_thread_pool(threads: Option<usize>) -> PhotowallResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(PhotowallError::config("'threads' must be >= 1 when set"));
    }
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| PhotowallError::config(format!("failed to build worker pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/session/refresh_loop.rs"]
mod tests;
