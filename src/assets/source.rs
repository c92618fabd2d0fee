use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::SeedableRng as _;
use rand::rngs::StdRng;
use rand::seq::SliceRandom as _;

use crate::assets::decode::{DecodedPhoto, decode_photo_file};
use crate::foundation::error::{PhotowallError, PhotowallResult};

/// File extensions (lowercase) treated as photos.
pub const PHOTO_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// Behavior when a collage asks for more photos than the directory holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplePolicy {
    /// Return every available photo.
    #[default]
    Lenient,
    /// Fail with [`PhotowallError::InsufficientPhotos`].
    Strict,
}

/// Handle to one photo on disk with lazily decoded pixels.
///
/// Equality and hashing only look at the path.
#[derive(Clone, Debug)]
pub struct PhotoRef {
    path: PathBuf,
    pixels: Option<Arc<DecodedPhoto>>,
}

impl PhotoRef {
    /// Reference a photo without touching the filesystem.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pixels: None,
        }
    }

    /// Source path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decoded pixels, if [`PhotoRef::load`] already ran.
    pub fn pixels(&self) -> Option<&Arc<DecodedPhoto>> {
        self.pixels.as_ref()
    }

    /// Decode the photo once and return the cached pixels.
    pub fn load(&mut self) -> PhotowallResult<Arc<DecodedPhoto>> {
        if let Some(p) = &self.pixels {
            return Ok(Arc::clone(p));
        }
        let decoded = Arc::new(decode_photo_file(&self.path)?);
        self.pixels = Some(Arc::clone(&decoded));
        Ok(decoded)
    }
}

impl PartialEq for PhotoRef {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for PhotoRef {}

impl std::hash::Hash for PhotoRef {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

/// Random photo sampler over one directory.
///
/// Every [`ImageSource::sample`] rescans the directory. Photos of the scan that were not handed
/// out stay available through [`ImageSource::replacement`] until the next sample.
#[derive(Debug)]
pub struct ImageSource {
    directory: PathBuf,
    policy: SamplePolicy,
    recursive: bool,
    rng: StdRng,
    reserve: VecDeque<PathBuf>,
}

impl ImageSource {
    /// Sampler with an OS-seeded rng.
    pub fn new(directory: impl Into<PathBuf>, policy: SamplePolicy) -> Self {
        Self::with_rng(directory, policy, StdRng::from_os_rng())
    }

    /// Sampler with a fixed seed; sampling is reproducible for a fixed directory listing.
    pub fn seeded(directory: impl Into<PathBuf>, policy: SamplePolicy, seed: u64) -> Self {
        Self::with_rng(directory, policy, StdRng::seed_from_u64(seed))
    }

    fn with_rng(directory: impl Into<PathBuf>, policy: SamplePolicy, rng: StdRng) -> Self {
        Self {
            directory: directory.into(),
            policy,
            recursive: false,
            rng,
            reserve: VecDeque::new(),
        }
    }

    /// Also collect photos from subdirectories.
    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Pick up to `n` distinct photos uniformly at random.
    #[tracing::instrument(skip(self), fields(dir = %self.directory.display()))]
    pub fn sample(&mut self, n: usize) -> PhotowallResult<Vec<PhotoRef>> {
        self.reserve.clear();
        let mut files = scan_photos(&self.directory, self.recursive)?;
        if files.is_empty() {
            return Err(PhotowallError::EmptyDirectory(self.directory.clone()));
        }
        if n > files.len() {
            match self.policy {
                SamplePolicy::Strict => {
                    return Err(PhotowallError::InsufficientPhotos {
                        requested: n,
                        available: files.len(),
                    });
                }
                SamplePolicy::Lenient => {
                    tracing::debug!(
                        requested = n,
                        available = files.len(),
                        "fewer photos than requested, using all of them"
                    );
                }
            }
        }

        files.shuffle(&mut self.rng);
        let take = n.min(files.len());
        self.reserve = files.split_off(take).into();
        Ok(files.into_iter().map(PhotoRef::new).collect())
    }

    /// Next unused photo from the last scan, for replacing a corrupt one.
    pub fn replacement(&mut self) -> Option<PhotoRef> {
        self.reserve.pop_front().map(PhotoRef::new)
    }

    /// Photos left for replacement in the current cycle.
    pub fn reserve_len(&self) -> usize {
        self.reserve.len()
    }
}

/// List eligible photo files under `dir`, sorted by path.
pub fn scan_photos(dir: &Path, recursive: bool) -> PhotowallResult<Vec<PathBuf>> {
    let mut out = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let rd = match std::fs::read_dir(&current) {
            Ok(rd) => rd,
            Err(e) if current == dir => {
                tracing::warn!(dir = %dir.display(), error = %e, "cannot read photos directory");
                return Err(PhotowallError::EmptyDirectory(dir.to_path_buf()));
            }
            Err(e) => {
                tracing::debug!(
                    dir = %current.display(),
                    error = %e,
                    "skipping unreadable subdirectory"
                );
                continue;
            }
        };

        for entry in rd.flatten() {
            let path = entry.path();
            if is_hidden(&path) {
                continue;
            }
            if path.is_dir() {
                if recursive {
                    pending.push(path);
                }
                continue;
            }
            if path.is_file() && has_photo_extension(&path) {
                out.push(path);
            }
        }
    }
    out.sort();
    Ok(out)
}

fn has_photo_extension(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
        return false;
    };
    let ext = ext.to_ascii_lowercase();
    PHOTO_EXTENSIONS.contains(&ext.as_str())
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/source.rs"]
mod tests;
