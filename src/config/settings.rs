use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;

use crate::assets::source::SamplePolicy;
use crate::foundation::core::{CanvasSpec, PhotoCount, Rgba8};
use crate::foundation::error::{PhotowallError, PhotowallResult};
use crate::layout::fit::FitMode;
use crate::session::refresh_loop::RefreshConfig;

/// Settings file looked up when none is given.
pub const DEFAULT_SETTINGS_FILE: &str = "settings.txt";

const KNOWN_KEYS: &[&str] = &[
    "number",
    "photos_directory",
    "width",
    "height",
    "text",
    "refresh_interval",
    "fullscreen",
    "screen_width",
    "screen_height",
    "background",
    "text_color",
    "fit",
    "strict",
    "recursive",
    "font",
    "output",
    "seed",
];

/// User-facing settings as read from a settings file.
///
/// Geometry is kept signed so that negative values reach validation and are reported as
/// `InvalidCanvas`/`InvalidCount` instead of parse errors.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Photos per collage.
    pub number: i64,
    /// Directory the photos are sampled from.
    pub photos_directory: PathBuf,
    /// Windowed canvas width.
    pub width: i64,
    /// Windowed canvas height.
    pub height: i64,
    /// Caption; empty means none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Milliseconds between collages.
    pub refresh_interval: u64,
    /// Start in fullscreen mode.
    pub fullscreen: bool,
    /// Fullscreen canvas width.
    pub screen_width: i64,
    /// Fullscreen canvas height.
    pub screen_height: i64,
    /// Canvas fill.
    pub background: Rgba8,
    /// Caption color.
    pub text_color: Rgba8,
    /// Fit mode.
    pub fit: FitMode,
    /// Fail instead of shrinking the collage when photos are missing.
    pub strict: bool,
    /// Scan subdirectories too.
    pub recursive: bool,
    /// Caption font file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<PathBuf>,
    /// PNG rewritten with every new collage.
    pub output: PathBuf,
    /// Sampling seed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            number: 6,
            photos_directory: PathBuf::from("photos"),
            width: 1600,
            height: 900,
            text: None,
            refresh_interval: 5000,
            fullscreen: false,
            screen_width: 1920,
            screen_height: 1080,
            background: Rgba8::WHITE,
            text_color: Rgba8::WHITE,
            fit: FitMode::Contain,
            strict: false,
            recursive: false,
            font: None,
            output: PathBuf::from("collage.png"),
            seed: None,
        }
    }
}

impl Settings {
    /// Read `path`; `.json` files are parsed as JSON, anything else as `key=value` lines.
    pub fn from_path(path: &Path) -> PhotowallResult<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read settings '{}'", path.display()))?;
        let settings = if is_json_path(path) {
            Self::parse_json(&s)?
        } else {
            Self::parse_key_value(&s)?
        };
        tracing::info!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    /// Like [`Settings::from_path`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> PhotowallResult<Self> {
        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "settings file not found, using defaults (run `photowall init` to create one)"
            );
            return Ok(Self::default());
        }
        Self::from_path(path)
    }

    /// Like [`Settings::load_or_default`], but a missing file is also written with the defaults.
    ///
    /// A file that cannot be written is logged; the defaults are still returned.
    pub fn load_or_create(path: &Path) -> PhotowallResult<Self> {
        if path.exists() {
            return Self::from_path(path);
        }
        let defaults = Self::default();
        match defaults.write_to(path) {
            Ok(()) => tracing::info!(path = %path.display(), "default settings file created"),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot create settings file")
            }
        }
        Ok(defaults)
    }

    /// Write these settings to `path`, as JSON for `.json` files and `key=value` lines otherwise.
    pub fn write_to(&self, path: &Path) -> PhotowallResult<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create settings dir '{}'", parent.display()))?;
        }
        let contents = if is_json_path(path) {
            serde_json::to_string_pretty(self).context("serialize settings")? + "\n"
        } else {
            self.to_key_value()
        };
        std::fs::write(path, contents)
            .with_context(|| format!("write settings '{}'", path.display()))?;
        Ok(())
    }

    /// Parse `key=value` lines. `#` starts a comment line.
    ///
    /// Unknown keys and lines without `=` are logged and skipped.
    pub fn parse_key_value(s: &str) -> PhotowallResult<Self> {
        let mut out = Self::default();
        for (i, raw) in s.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                tracing::warn!(line = i + 1, content = line, "ignoring malformed settings line");
                continue;
            };
            let key = key.trim();
            if !out.set(key, value.trim())? {
                tracing::warn!(line = i + 1, key, "ignoring unknown settings key");
            }
        }
        Ok(out)
    }

    /// Parse a JSON object with the same keys as the `key=value` form.
    pub fn parse_json(s: &str) -> PhotowallResult<Self> {
        let value: serde_json::Value = serde_json::from_str(s)
            .map_err(|e| PhotowallError::config(format!("settings json: {e}")))?;
        let serde_json::Value::Object(mut map) = value else {
            return Err(PhotowallError::config("settings json must be an object"));
        };
        map.retain(|key, _| {
            let known = KNOWN_KEYS.contains(&key.as_str());
            if !known {
                tracing::warn!(key = key.as_str(), "ignoring unknown settings key");
            }
            known
        });
        let mut out: Self = serde_json::from_value(serde_json::Value::Object(map))
            .map_err(|e| PhotowallError::config(format!("settings json: {e}")))?;
        if out.text.as_deref().is_some_and(|t| t.trim().is_empty()) {
            out.text = None;
        }
        Ok(out)
    }

    /// Apply one setting. Returns `Ok(false)` for unknown keys.
    pub fn set(&mut self, key: &str, value: &str) -> PhotowallResult<bool> {
        match key {
            "number" => self.number = parse_int(key, value)?,
            "photos_directory" => self.photos_directory = PathBuf::from(value),
            "width" => self.width = parse_int(key, value)?,
            "height" => self.height = parse_int(key, value)?,
            "text" => self.text = non_empty(value).map(str::to_string),
            "refresh_interval" => {
                self.refresh_interval = value.parse().map_err(|_| {
                    PhotowallError::config(format!(
                        "'refresh_interval' must be a whole number of milliseconds, got '{value}'"
                    ))
                })?;
            }
            "fullscreen" => self.fullscreen = parse_bool(key, value)?,
            "screen_width" => self.screen_width = parse_int(key, value)?,
            "screen_height" => self.screen_height = parse_int(key, value)?,
            "background" => self.background = Rgba8::parse_hex(value)?,
            "text_color" => self.text_color = Rgba8::parse_hex(value)?,
            "fit" => self.fit = value.parse()?,
            "strict" => self.strict = parse_bool(key, value)?,
            "recursive" => self.recursive = parse_bool(key, value)?,
            "font" => self.font = non_empty(value).map(PathBuf::from),
            "output" => self.output = PathBuf::from(value),
            "seed" => {
                self.seed = match non_empty(value) {
                    Some(v) => Some(v.parse().map_err(|_| {
                        PhotowallError::config(format!(
                            "'seed' must be an unsigned integer, got '{v}'"
                        ))
                    })?),
                    None => None,
                }
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Windowed canvas.
    pub fn windowed_canvas(&self) -> PhotowallResult<CanvasSpec> {
        CanvasSpec::from_signed(self.width, self.height)
    }

    /// Fullscreen canvas.
    pub fn fullscreen_canvas(&self) -> PhotowallResult<CanvasSpec> {
        CanvasSpec::from_signed(self.screen_width, self.screen_height)
    }

    /// Photos per collage.
    pub fn count(&self) -> PhotowallResult<PhotoCount> {
        PhotoCount::from_signed(self.number)
    }

    /// Check every value the refresh loop depends on.
    pub fn validate(&self) -> PhotowallResult<()> {
        self.count()?;
        self.windowed_canvas()?;
        self.fullscreen_canvas()?;
        if self.refresh_interval == 0 {
            return Err(PhotowallError::config("'refresh_interval' must be > 0"));
        }
        Ok(())
    }

    /// Validated loop configuration.
    pub fn refresh_config(&self) -> PhotowallResult<RefreshConfig> {
        self.validate()?;
        if self.refresh_interval < 100 {
            tracing::warn!(
                refresh_interval = self.refresh_interval,
                "refresh_interval is in milliseconds; this is very short"
            );
        }
        let mut cfg = RefreshConfig::new(&self.photos_directory, self.count()?);
        cfg.interval = Duration::from_millis(self.refresh_interval);
        cfg.text = self.text.clone();
        cfg.policy = if self.strict {
            SamplePolicy::Strict
        } else {
            SamplePolicy::Lenient
        };
        cfg.fit = self.fit;
        cfg.background = self.background;
        cfg.text_color = self.text_color;
        cfg.font = self.font.clone();
        cfg.recursive = self.recursive;
        cfg.seed = self.seed;
        Ok(cfg)
    }

    /// Settings rendered as a commented `key=value` file that parses back to `self`.
    pub fn to_key_value(&self) -> String {
        let opt = |v: Option<String>| v.unwrap_or_default();
        let fit = match self.fit {
            FitMode::Contain => "contain",
            FitMode::Cover => "cover",
        };
        let mut out = String::new();
        out.push_str("# photowall settings\n");
        out.push_str("# Lines are key=value; unknown keys are ignored.\n\n");
        out.push_str("# Photos per collage.\n");
        out.push_str(&format!("number={}\n", self.number));
        out.push_str(&format!("photos_directory={}\n", self.photos_directory.display()));
        out.push_str("# Scan subdirectories of photos_directory.\n");
        out.push_str(&format!("recursive={}\n", self.recursive));
        out.push_str("# Fail instead of using fewer photos when the directory runs short.\n");
        out.push_str(&format!("strict={}\n\n", self.strict));
        out.push_str("# Windowed and fullscreen canvas sizes in pixels.\n");
        out.push_str(&format!("width={}\n", self.width));
        out.push_str(&format!("height={}\n", self.height));
        out.push_str(&format!("fullscreen={}\n", self.fullscreen));
        out.push_str(&format!("screen_width={}\n", self.screen_width));
        out.push_str(&format!("screen_height={}\n\n", self.screen_height));
        out.push_str("# Milliseconds between collages.\n");
        out.push_str(&format!("refresh_interval={}\n", self.refresh_interval));
        out.push_str("# contain (letterbox) or cover (crop).\n");
        out.push_str(&format!("fit={fit}\n"));
        out.push_str(&format!("background={}\n\n", self.background.to_hex()));
        out.push_str("# Caption at the bottom of the collage; leave empty for none.\n");
        out.push_str(&format!("text={}\n", opt(self.text.clone())));
        out.push_str(&format!("text_color={}\n", self.text_color.to_hex()));
        out.push_str("# Font file for the caption; empty uses a system sans-serif.\n");
        out.push_str(&format!(
            "font={}\n\n",
            opt(self.font.as_ref().map(|p| p.display().to_string()))
        ));
        out.push_str("# PNG rewritten with every new collage.\n");
        out.push_str(&format!("output={}\n", self.output.display()));
        out.push_str("# Fixed sampling seed; empty samples differently on every run.\n");
        out.push_str(&format!(
            "seed={}\n",
            opt(self.seed.map(|s| s.to_string()))
        ));
        out
    }
}

fn non_empty(v: &str) -> Option<&str> {
    let v = v.trim();
    (!v.is_empty()).then_some(v)
}

fn parse_int(key: &str, value: &str) -> PhotowallResult<i64> {
    value
        .parse()
        .map_err(|_| PhotowallError::config(format!("'{key}' must be an integer, got '{value}'")))
}

fn parse_bool(key: &str, value: &str) -> PhotowallResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(PhotowallError::config(format!(
            "'{key}' must be true or false, got '{value}'"
        ))),
    }
}

fn is_json_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
#[path = "../../tests/unit/config/settings.rs"]
mod tests;
