//! Recognizer and tracker configuration.
//!
//! Every option has a documented default and can be overridden from a JSON
//! file. Recognizer factories call `validate()` before building anything, so
//! a bad option is reported at construction time rather than on the first
//! pointer event.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PointerflowError, PointerflowResult};

/// Aggregate configuration for a Pointerflow pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerflowConfig {
    /// Pointer tracker settings.
    pub tracker: TrackerConfig,

    /// Pan recognizer settings.
    pub pan: PanConfig,

    /// Pinch recognizer settings.
    pub pinch: PinchConfig,

    /// Tap recognizer settings.
    pub tap: TapConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Pointer tracker settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Cap on simultaneously tracked pointers. Later pointers are ignored
    /// until a slot frees up.
    pub max_pointers: usize,

    /// Free-list cap of the `PointerInfo` pool.
    pub pool_max_size: usize,
}

/// Axes a pan is allowed to start along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionMode {
    #[default]
    All,
    Horizontal,
    Vertical,
}

/// Pan recognizer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanConfig {
    /// Minimum displacement from the origin before a pan starts.
    pub threshold: f64,

    /// Restricts which directions may start a pan.
    pub direction_mode: DirectionMode,

    /// Cap on simultaneously tracked pointers.
    pub max_pointers: usize,

    /// Free-list cap of the emitted `PanValue` pool.
    pub pool_max_size: usize,
}

/// Pinch recognizer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinchConfig {
    /// Number of pointers forming a pinch.
    pub pointers: usize,

    /// Cap on simultaneously tracked pointers. Must be at least `pointers`.
    pub max_pointers: usize,

    /// Change in pointer spread required before the pinch activates.
    pub distance_epsilon: f64,

    /// Free-list cap of the emitted `PinchValue` pool.
    pub pool_max_size: usize,
}

/// Tap recognizer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TapConfig {
    /// Maximum pointer travel during a tap.
    pub movement_threshold: f64,

    /// Maximum press duration in milliseconds.
    pub duration_threshold: f64,

    /// Maximum distance between the origins of chained taps.
    /// Defaults to `movement_threshold`.
    pub chain_movement_threshold: Option<f64>,

    /// Maximum gap in milliseconds between a tap's end and the next tap's
    /// start for the two to chain. Defaults to `duration_threshold / 2`.
    pub chain_interval_threshold: Option<f64>,

    /// Emit a `cancel` signal when a started tap fails.
    pub emit_cancel: bool,

    /// Free-list cap of the emitted `TapValue` pool.
    pub pool_max_size: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "pointerflow_recognizers=trace,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

const DEFAULT_POOL_MAX_SIZE: usize = 32;

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_pointers: 2,
            pool_max_size: DEFAULT_POOL_MAX_SIZE,
        }
    }
}

impl Default for PanConfig {
    fn default() -> Self {
        Self {
            threshold: 10.0,
            direction_mode: DirectionMode::All,
            max_pointers: 2,
            pool_max_size: DEFAULT_POOL_MAX_SIZE,
        }
    }
}

impl Default for PinchConfig {
    fn default() -> Self {
        Self {
            pointers: 2,
            max_pointers: 2,
            distance_epsilon: 1.0,
            pool_max_size: DEFAULT_POOL_MAX_SIZE,
        }
    }
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            movement_threshold: 10.0,
            duration_threshold: 500.0,
            chain_movement_threshold: None,
            chain_interval_threshold: None,
            emit_cancel: true,
            pool_max_size: DEFAULT_POOL_MAX_SIZE,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

fn require_positive(name: &str, value: f64) -> PointerflowResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PointerflowError::config(format!(
            "{name} must be a positive finite number, got {value}"
        )))
    }
}

fn require_nonzero(name: &str, value: usize) -> PointerflowResult<()> {
    if value == 0 {
        return Err(PointerflowError::config(format!("{name} must be at least 1")));
    }
    Ok(())
}

impl TrackerConfig {
    pub fn validate(&self) -> PointerflowResult<()> {
        require_nonzero("tracker.max_pointers", self.max_pointers)?;
        require_nonzero("tracker.pool_max_size", self.pool_max_size)
    }
}

impl PanConfig {
    pub fn validate(&self) -> PointerflowResult<()> {
        require_positive("pan.threshold", self.threshold)?;
        require_nonzero("pan.max_pointers", self.max_pointers)?;
        require_nonzero("pan.pool_max_size", self.pool_max_size)
    }

    /// Tracker settings derived from this recognizer's options.
    pub fn tracker(&self) -> TrackerConfig {
        TrackerConfig {
            max_pointers: self.max_pointers,
            pool_max_size: self.pool_max_size,
        }
    }
}

impl PinchConfig {
    pub fn validate(&self) -> PointerflowResult<()> {
        if self.pointers < 2 {
            return Err(PointerflowError::config(format!(
                "pinch.pointers must be at least 2, got {}",
                self.pointers
            )));
        }
        if self.max_pointers < self.pointers {
            return Err(PointerflowError::config(format!(
                "pinch.max_pointers ({}) must be at least pinch.pointers ({})",
                self.max_pointers, self.pointers
            )));
        }
        require_positive("pinch.distance_epsilon", self.distance_epsilon)?;
        require_nonzero("pinch.pool_max_size", self.pool_max_size)
    }

    /// Tracker settings derived from this recognizer's options.
    pub fn tracker(&self) -> TrackerConfig {
        TrackerConfig {
            max_pointers: self.max_pointers,
            pool_max_size: self.pool_max_size,
        }
    }
}

impl TapConfig {
    pub fn validate(&self) -> PointerflowResult<()> {
        require_positive("tap.movement_threshold", self.movement_threshold)?;
        require_positive("tap.duration_threshold", self.duration_threshold)?;
        if let Some(value) = self.chain_movement_threshold {
            require_positive("tap.chain_movement_threshold", value)?;
        }
        if let Some(value) = self.chain_interval_threshold {
            require_positive("tap.chain_interval_threshold", value)?;
        }
        require_nonzero("tap.pool_max_size", self.pool_max_size)
    }

    /// Effective chain distance limit.
    pub fn chain_movement(&self) -> f64 {
        self.chain_movement_threshold
            .unwrap_or(self.movement_threshold)
    }

    /// Effective chain interval limit in milliseconds.
    pub fn chain_interval(&self) -> f64 {
        self.chain_interval_threshold
            .unwrap_or(self.duration_threshold / 2.0)
    }

    /// Tracker settings derived from this recognizer's options.
    /// A tap only ever follows one pointer; the second slot exists so a
    /// second finger going down can be observed and cancel the tap.
    pub fn tracker(&self) -> TrackerConfig {
        TrackerConfig {
            max_pointers: 2,
            pool_max_size: self.pool_max_size,
        }
    }
}

impl PointerflowConfig {
    /// Validate every section.
    pub fn validate(&self) -> PointerflowResult<()> {
        self.tracker.validate()?;
        self.pan.validate()?;
        self.pinch.validate()?;
        self.tap.validate()
    }

    /// Load and validate config from a JSON file. Missing fields take
    /// their defaults.
    pub fn load_from(path: &Path) -> PointerflowResult<Self> {
        if !path.exists() {
            return Err(PointerflowError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load config from `path` if given, falling back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> PointerflowResult<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => Ok(Self::default()),
        }
    }

    /// Save config as pretty-printed JSON.
    pub fn save_to(&self, path: &Path) -> PointerflowResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
