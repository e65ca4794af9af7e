// THEORY:
// A `ProcessorConfig` is fixed for the lifetime of one `BoardProcessor`. Every
// tunable of the pipeline lives here as data: the board dimension, the analysis
// resolution, the sampling stride of the video loop, the motion and color
// thresholds, and the calibrated RGB boxes that separate black pieces, white
// pieces and the board itself. The color boxes came out of one lighting setup,
// so they are loadable from JSON instead of being baked into the classifier.

use crate::error::{Result, VisionError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Dimension of the (square) board. Only the compact 4x4 variant and the
/// standard 8x8 board are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum BoardSize {
    #[default]
    Four,
    Eight,
}

impl BoardSize {
    pub fn cells_per_side(self) -> usize {
        match self {
            BoardSize::Four => 4,
            BoardSize::Eight => 8,
        }
    }

    pub fn cell_count(self) -> usize {
        let n = self.cells_per_side();
        n * n
    }
}

impl TryFrom<u32> for BoardSize {
    type Error = VisionError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            4 => Ok(BoardSize::Four),
            8 => Ok(BoardSize::Eight),
            other => Err(VisionError::InvalidBoardSize(other)),
        }
    }
}

impl From<BoardSize> for u32 {
    fn from(size: BoardSize) -> u32 {
        size.cells_per_side() as u32
    }
}

impl fmt::Display for BoardSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.cells_per_side();
        write!(f, "{n}x{n}")
    }
}

/// Inclusive per-channel RGB box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl ColorRange {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    /// Dark piece box: every channel in [0, 110].
    pub const BLACK: ColorRange = ColorRange::new([0, 0, 0], [110, 110, 110]);
    /// Light piece box: every channel in [150, 255].
    pub const WHITE: ColorRange = ColorRange::new([150, 150, 150], [255, 255, 255]);

    #[inline]
    pub fn contains(&self, rgb: [u8; 3]) -> bool {
        (0..3).all(|c| rgb[c] >= self.lower[c] && rgb[c] <= self.upper[c])
    }

    fn is_ordered(&self) -> bool {
        (0..3).all(|c| self.lower[c] <= self.upper[c])
    }
}

/// Parameters of the edge-preserving (bilateral) smoothing applied before
/// cell classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingParams {
    /// Neighbourhood diameter in pixels.
    pub diameter: u32,
    pub sigma_color: f32,
    pub sigma_space: f32,
}

impl Default for SmoothingParams {
    fn default() -> Self {
        Self {
            diameter: 15,
            sigma_color: 190.0,
            sigma_space: 190.0,
        }
    }
}

/// Parameters of the global frame-difference motion detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionParams {
    /// Side of the square Gaussian kernel applied to each grayscale frame. Must be odd.
    pub blur_kernel: u32,
    /// Absolute intensity difference at which a pixel counts as changed.
    pub pixel_delta_threshold: u8,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self {
            blur_kernel: 21,
            pixel_delta_threshold: 25,
        }
    }
}

/// Configuration of a `BoardProcessor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    pub board_size: BoardSize,
    /// Frames are resized to this width (aspect ratio kept) before extraction.
    pub resize_width: u32,
    /// Only every `skip_frames`-th video frame is sampled.
    pub skip_frames: u32,
    /// Motion is reported when the sum of thresholded difference values exceeds
    /// this. The sum grows with frame resolution, so tune it per input size.
    pub motion_threshold: u64,
    /// Fraction of a cell that must fall into a piece color box for the piece
    /// to be considered present.
    pub color_threshold: f64,
    pub black_range: ColorRange,
    pub white_range: ColorRange,
    pub smoothing: SmoothingParams,
    pub motion: MotionParams,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            board_size: BoardSize::Four,
            resize_width: 500,
            skip_frames: 20,
            motion_threshold: 10,
            color_threshold: 0.3,
            black_range: ColorRange::BLACK,
            white_range: ColorRange::WHITE,
            smoothing: SmoothingParams::default(),
            motion: MotionParams::default(),
        }
    }
}

impl ProcessorConfig {
    pub fn new(board_size: BoardSize) -> Self {
        Self {
            board_size,
            ..Self::default()
        }
    }

    /// Loads a JSON configuration. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: ProcessorConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.resize_width == 0 {
            return Err(VisionError::InvalidConfig("resize_width must be positive".into()));
        }
        if self.skip_frames == 0 {
            return Err(VisionError::InvalidConfig("skip_frames must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.color_threshold) {
            return Err(VisionError::InvalidConfig(format!(
                "color_threshold must be within [0, 1], got {}",
                self.color_threshold
            )));
        }
        if !self.black_range.is_ordered() || !self.white_range.is_ordered() {
            return Err(VisionError::InvalidConfig(
                "color range lower bound exceeds upper bound".into(),
            ));
        }
        if self.smoothing.diameter == 0 {
            return Err(VisionError::InvalidConfig("smoothing diameter must be positive".into()));
        }
        let sigmas = [self.smoothing.sigma_color, self.smoothing.sigma_space];
        if sigmas.iter().any(|sigma| !sigma.is_finite() || *sigma <= 0.0) {
            return Err(VisionError::InvalidConfig(format!(
                "smoothing sigmas must be positive, got color {} and space {}",
                self.smoothing.sigma_color, self.smoothing.sigma_space
            )));
        }
        if self.motion.blur_kernel == 0 || self.motion.blur_kernel % 2 == 0 {
            return Err(VisionError::InvalidConfig(format!(
                "blur_kernel must be odd, got {}",
                self.motion.blur_kernel
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_size_accepts_only_four_and_eight() {
        assert_eq!(BoardSize::try_from(4).unwrap(), BoardSize::Four);
        assert_eq!(BoardSize::try_from(8).unwrap(), BoardSize::Eight);
        assert!(matches!(
            BoardSize::try_from(6),
            Err(VisionError::InvalidBoardSize(6))
        ));
    }

    #[test]
    fn defaults_are_valid() {
        let config = ProcessorConfig::default();
        config.validate().expect("defaults validate");
        assert_eq!(config.board_size.cell_count(), 16);
        assert_eq!(config.smoothing.diameter, 15);
        assert_eq!(config.motion.blur_kernel, 21);
    }

    #[test]
    fn rejects_bad_values() {
        let mut config = ProcessorConfig::default();
        config.skip_frames = 0;
        assert!(config.validate().is_err());

        let mut config = ProcessorConfig::default();
        config.color_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = ProcessorConfig::default();
        config.color_threshold = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = ProcessorConfig::default();
        config.motion.blur_kernel = 20;
        assert!(config.validate().is_err());

        let mut config = ProcessorConfig::default();
        config.white_range = ColorRange::new([200, 0, 0], [100, 255, 255]);
        assert!(config.validate().is_err());

        let mut config = ProcessorConfig::default();
        config.smoothing.sigma_color = 0.0;
        assert!(matches!(config.validate(), Err(VisionError::InvalidConfig(_))));

        let mut config = ProcessorConfig::default();
        config.smoothing.sigma_space = f32::NAN;
        assert!(config.validate().is_err());

        let mut config = ProcessorConfig::default();
        config.smoothing.sigma_space = -3.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_takes_defaults() {
        let config: ProcessorConfig =
            serde_json::from_str(r#"{ "board_size": 8, "skip_frames": 5 }"#).unwrap();
        assert_eq!(config.board_size, BoardSize::Eight);
        assert_eq!(config.skip_frames, 5);
        assert_eq!(config.resize_width, 500);
        assert_eq!(config.white_range, ColorRange::WHITE);
    }

    #[test]
    fn json_rejects_unsupported_board_size() {
        let parsed: std::result::Result<ProcessorConfig, _> =
            serde_json::from_str(r#"{ "board_size": 5 }"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn color_range_is_inclusive() {
        assert!(ColorRange::BLACK.contains([110, 0, 110]));
        assert!(!ColorRange::BLACK.contains([111, 0, 0]));
        assert!(ColorRange::WHITE.contains([150, 255, 150]));
        assert!(!ColorRange::WHITE.contains([149, 255, 255]));
    }
}
