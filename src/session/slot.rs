use std::sync::{Arc, RwLock};

use crate::render::frame::CollageFrame;

type Shared = Arc<RwLock<Option<Arc<CollageFrame>>>>;

/// Holder of the currently displayed collage.
///
/// Exactly one `FrameSlot` exists per loop and only it can write; readers obtained from
/// [`FrameSlot::reader`] see either the previous or the next frame, never a partial one.
#[derive(Debug, Default)]
pub struct FrameSlot {
    inner: Shared,
}

/// Read handle onto a [`FrameSlot`].
#[derive(Clone, Debug)]
pub struct FrameSlotReader {
    inner: Shared,
}

impl FrameSlot {
    /// Empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// New read handle.
    pub fn reader(&self) -> FrameSlotReader {
        FrameSlotReader {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Swap in `frame`, returning the one it replaces.
    pub fn publish(&mut self, frame: Arc<CollageFrame>) -> Option<Arc<CollageFrame>> {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        guard.replace(frame)
    }

    /// Empty the slot.
    pub fn clear(&mut self) -> Option<Arc<CollageFrame>> {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        guard.take()
    }

    /// Frame currently held.
    pub fn current(&self) -> Option<Arc<CollageFrame>> {
        read(&self.inner)
    }
}

impl FrameSlotReader {
    /// Frame currently held.
    pub fn current(&self) -> Option<Arc<CollageFrame>> {
        read(&self.inner)
    }
}

fn read(inner: &Shared) -> Option<Arc<CollageFrame>> {
    inner.read().unwrap_or_else(|e| e.into_inner()).clone()
}

#[cfg(test)]
#[path = "../../tests/unit/session/slot.rs"]
mod tests;
