// THEORY:
// The `MotionGate` is a coarse, global "is anything moving?" test. Both inputs
// are grayscale frames that were already Gaussian-blurred (see
// `filters::blurred_gray`). The gate takes the absolute per-pixel difference,
// binarises it (255 where the difference reaches `pixel_delta_threshold`, 0
// elsewhere), sums the binary image and reports motion when the sum exceeds
// `motion_threshold`. It does not say *where* something moved; it only decides
// whether a sampled frame is safe to read the board from.
//
// The sum is not normalised, so a threshold tuned for one resolution does not
// carry over to another.

use crate::config::ProcessorConfig;
use crate::error::{Result, VisionError};
use image::GrayImage;

/// Value a changed pixel contributes to the motion sum.
const CHANGED_PIXEL_VALUE: u64 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionGate {
    pixel_delta_threshold: u8,
    motion_threshold: u64,
}

impl MotionGate {
    pub fn new(pixel_delta_threshold: u8, motion_threshold: u64) -> Self {
        Self {
            pixel_delta_threshold,
            motion_threshold,
        }
    }

    pub fn from_config(config: &ProcessorConfig) -> Self {
        Self::new(config.motion.pixel_delta_threshold, config.motion_threshold)
    }

    /// Sum of the binarised absolute difference between two frames.
    pub fn motion_level(&self, previous: &GrayImage, current: &GrayImage) -> Result<u64> {
        if previous.dimensions() != current.dimensions() {
            return Err(VisionError::FrameSizeMismatch {
                previous: previous.dimensions(),
                current: current.dimensions(),
            });
        }
        let changed = previous
            .as_raw()
            .iter()
            .zip(current.as_raw())
            .filter(|&(&a, &b)| a.abs_diff(b) >= self.pixel_delta_threshold)
            .count() as u64;
        Ok(changed * CHANGED_PIXEL_VALUE)
    }

    pub fn is_motion(&self, previous: &GrayImage, current: &GrayImage) -> Result<bool> {
        let level = self.motion_level(previous, current)?;
        let moving = level > self.motion_threshold;
        log::debug!(
            "motion level {level} (threshold {}): {}",
            self.motion_threshold,
            if moving { "moving" } else { "stable" }
        );
        Ok(moving)
    }
}
