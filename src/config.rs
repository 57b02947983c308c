//! Configuration system for the MIDI-to-matrix preprocessor

use crate::error::{PreprocessError, Result as PreprocessResult};
use crate::midi::TimeSignature;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub version: String,
    pub dimensions: Dimensions,
    pub pitch: PitchConfig,
    pub quantize: QuantizeConfig,
    pub segment: SegmentConfig,
    pub augment: AugmentConfig,
    pub validation: ValidationConfig,
    pub tracks: TrackSelectionConfig,
    pub velocity: VelocityConfig,
    pub batch: BatchConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            dimensions: Dimensions::default(),
            pitch: PitchConfig::default(),
            quantize: QuantizeConfig::default(),
            segment: SegmentConfig::default(),
            augment: AugmentConfig::default(),
            validation: ValidationConfig::default(),
            tracks: TrackSelectionConfig::default(),
            velocity: VelocityConfig::default(),
            batch: BatchConfig::default(),
        }
    }
}

/// Output matrix shape: `x` time steps (columns) by `y` pitch rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dimensions {
    pub x: usize,
    pub y: usize,
}

impl Default for Dimensions {
    fn default() -> Self {
        Self { x: 64, y: 64 }
    }
}

/// How a MIDI pitch lands on a matrix row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PitchMapping {
    /// `row = pitch - start_octave * 12`, pitches outside the window are dropped
    #[default]
    Clip,
    /// `row = (pitch - start_octave * 12) mod rows`
    Wrap,
}

/// Pitch axis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchConfig {
    /// Row zero corresponds to MIDI pitch `start_octave * 12`
    pub start_octave: i32,
    pub mapping: PitchMapping,
}

impl Default for PitchConfig {
    fn default() -> Self {
        Self {
            start_octave: 3,
            mapping: PitchMapping::Clip,
        }
    }
}

impl PitchConfig {
    /// MIDI pitch mapped onto row zero
    pub fn base_pitch(&self) -> i32 {
        self.start_octave.saturating_mul(12)
    }

    /// Row for `pitch` in a matrix with `rows` rows, `None` if clipped away
    pub fn row_for(&self, pitch: u8, rows: usize) -> Option<usize> {
        if rows == 0 {
            return None;
        }
        let offset = i32::from(pitch).saturating_sub(self.base_pitch());
        match self.mapping {
            PitchMapping::Clip => {
                if offset >= 0 && (offset as usize) < rows {
                    Some(offset as usize)
                } else {
                    None
                }
            }
            PitchMapping::Wrap => Some(offset.rem_euclid(rows as i32) as usize),
        }
    }
}

/// Quantization grid as a fraction of a whole note ("1/16" = sixteenth notes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GridResolution {
    pub numerator: u32,
    pub denominator: u32,
}

impl GridResolution {
    pub fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Grid step in ticks for the given PPQ, never less than one tick
    pub fn step_ticks(&self, ppq: u32) -> u32 {
        if self.denominator == 0 {
            return 1;
        }
        let ticks = u64::from(ppq) * 4 * u64::from(self.numerator) / u64::from(self.denominator);
        ticks.clamp(1, u64::from(u32::MAX)) as u32
    }
}

impl Default for GridResolution {
    fn default() -> Self {
        Self::new(1, 16)
    }
}

impl fmt::Display for GridResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl FromStr for GridResolution {
    type Err = PreprocessError;

    fn from_str(s: &str) -> PreprocessResult<Self> {
        let (num, den) = s.split_once('/').ok_or_else(|| {
            PreprocessError::InvalidConfigParameter(format!(
                "resolution '{}' is not of the form <num>/<den>",
                s
            ))
        })?;
        let parse = |part: &str| {
            part.trim().parse::<u32>().map_err(|_| {
                PreprocessError::InvalidConfigParameter(format!(
                    "resolution '{}' has a non-numeric part '{}'",
                    s, part
                ))
            })
        };
        Ok(Self::new(parse(num)?, parse(den)?))
    }
}

impl TryFrom<String> for GridResolution {
    type Error = PreprocessError;

    fn try_from(value: String) -> PreprocessResult<Self> {
        value.parse()
    }
}

impl From<GridResolution> for String {
    fn from(value: GridResolution) -> Self {
        value.to_string()
    }
}

/// Quantization configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct QuantizeConfig {
    pub horizontal_resolution: GridResolution,
}

/// Windowing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Window length in measures
    pub step_size_x: u32,
    /// Used when the document declares no time signature
    pub default_time_signature: TimeSignature,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            step_size_x: 1,
            default_time_signature: TimeSignature::new(4, 4),
        }
    }
}

/// Augmentation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmentConfig {
    /// Semitone shifts rendered in addition to the untransposed window
    pub transpositions: Vec<i32>,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self {
            transpositions: vec![7, -7],
        }
    }
}

/// Matrix acceptance thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Minimum count of non-zero cells
    pub minimum_notes: usize,
    /// Minimum count of rows with at least one non-zero cell
    pub minimum_different_pitches: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            minimum_notes: 1,
            minimum_different_pitches: 1,
        }
    }
}

/// Track selection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackSelectionConfig {
    /// General MIDI programs (0-based) treated as pitched instruments
    pub pitched_programs: Vec<u8>,
    /// Treat MIDI channel 10 (index 9) as percussion whatever its program
    pub skip_drum_channel: bool,
}

impl Default for TrackSelectionConfig {
    fn default() -> Self {
        Self {
            // 112..=119 percussive, 120..=127 sound effects
            pitched_programs: (0..112).collect(),
            skip_drum_channel: true,
        }
    }
}

/// Velocity to intensity scaling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VelocityConfig {
    /// Intensity written for a full-velocity note
    pub max_intensity: f32,
}

impl Default for VelocityConfig {
    fn default() -> Self {
        Self { max_intensity: 1.0 }
    }
}

/// Batch orchestration configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Per-document decode timeout; `None` decodes inline without a limit.
    ///
    /// A timed-out document is failed right away, but its decoder thread
    /// keeps running in the background until the decoder returns.
    pub decode_timeout_ms: Option<u64>,
    /// Worker threads; 1 processes documents strictly in sequence
    pub workers: usize,
    /// Yield the thread after every document
    pub yield_between_documents: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            decode_timeout_ms: Some(10_000),
            workers: 1,
            yield_between_documents: true,
        }
    }
}

/// Validate configuration before a batch starts
pub fn validate_config(config: &Config) -> PreprocessResult<()> {
    let invalid = |msg: String| Err(PreprocessError::InvalidConfigParameter(msg));

    if config.dimensions.x == 0 || config.dimensions.y == 0 {
        return invalid(format!(
            "dimensions must be non-zero, got {}x{}",
            config.dimensions.x, config.dimensions.y
        ));
    }

    if !(-1..=10).contains(&config.pitch.start_octave) {
        return invalid(format!(
            "start_octave must lie in -1..=10, got {}",
            config.pitch.start_octave
        ));
    }

    let resolution = config.quantize.horizontal_resolution;
    if resolution.numerator == 0 || resolution.denominator == 0 {
        return invalid(format!("horizontal_resolution {} is empty", resolution));
    }

    if config.segment.step_size_x == 0 {
        return invalid("step_size_x must be at least 1".to_string());
    }

    let ts = config.segment.default_time_signature;
    if !ts.is_valid() {
        return invalid(format!("default_time_signature {} is not a valid meter", ts));
    }

    let max = config.velocity.max_intensity;
    if !max.is_finite() || max <= 0.0 {
        return invalid(format!("max_intensity must be positive, got {}", max));
    }

    if config.tracks.pitched_programs.iter().any(|&p| p > 127) {
        return invalid("pitched_programs must lie in 0..=127".to_string());
    }

    if config.batch.workers == 0 {
        return invalid("workers must be at least 1".to_string());
    }

    if config.batch.decode_timeout_ms == Some(0) {
        return invalid("decode_timeout_ms must be positive when set".to_string());
    }

    Ok(())
}

/// Load configuration from JSON file
pub fn load_config<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Save configuration to JSON file
pub fn save_config<P: AsRef<std::path::Path>>(config: &Config, path: P) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
