use std::path::PathBuf;

/// Convenience result type used across photowall.
pub type PhotowallResult<T> = Result<T, PhotowallError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum PhotowallError {
    /// The photos directory has no eligible image files (or could not be read).
    #[error("empty directory: no eligible photos in '{}'", .0.display())]
    EmptyDirectory(PathBuf),

    /// Strict sampling asked for more photos than the directory holds.
    #[error("insufficient photos: requested {requested}, only {available} available")]
    InsufficientPhotos {
        /// Number of photos requested for the collage.
        requested: usize,
        /// Number of eligible photos found on disk.
        available: usize,
    },

    /// Canvas geometry that cannot be rendered.
    #[error("invalid canvas: {0}")]
    InvalidCanvas(String),

    /// Photo count that cannot be planned.
    #[error("invalid count: {0}")]
    InvalidCount(String),

    /// A source photo that cannot be read or decoded.
    #[error("corrupt image '{}': {reason}", path.display())]
    CorruptImage {
        /// Path of the offending file.
        path: PathBuf,
        /// Decoder or IO failure description.
        reason: String,
    },

    /// The display surface cannot accept frames anymore.
    #[error("display unavailable: {0}")]
    DisplayUnavailable(String),

    /// Invalid settings value.
    #[error("config error: {0}")]
    Config(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PhotowallError {
    /// Build a [`PhotowallError::InvalidCanvas`] value.
    pub fn invalid_canvas(msg: impl Into<String>) -> Self {
        Self::InvalidCanvas(msg.into())
    }

    /// Build a [`PhotowallError::InvalidCount`] value.
    pub fn invalid_count(msg: impl Into<String>) -> Self {
        Self::InvalidCount(msg.into())
    }

    /// Build a [`PhotowallError::CorruptImage`] value.
    pub fn corrupt_image(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::CorruptImage {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Build a [`PhotowallError::DisplayUnavailable`] value.
    pub fn display_unavailable(msg: impl Into<String>) -> Self {
        Self::DisplayUnavailable(msg.into())
    }

    /// Build a [`PhotowallError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the error only spoils the current refresh cycle.
    ///
    /// Startup errors (geometry, settings) and a lost display are not cycle-local.
    pub fn is_cycle_local(&self) -> bool {
        !matches!(
            self,
            Self::InvalidCanvas(_)
                | Self::InvalidCount(_)
                | Self::Config(_)
                | Self::DisplayUnavailable(_)
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
