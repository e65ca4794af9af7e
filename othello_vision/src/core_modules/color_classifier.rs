// THEORY:
// The `ColorClassifier` answers one question about a rectangular patch of a
// frame: does a given piece color cover more than `color_threshold` of it?
// A pixel belongs to a color when all three channels fall inside that color's
// inclusive RGB box. The boxes for black and white are disjoint and leave a dead
// zone between them where the board and the background live.

use crate::config::{ColorRange, ProcessorConfig};
use image::{GrayImage, Luma, RgbImage};

/// Piece colors the classifier knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceColor {
    Black,
    White,
}

/// Pixel rectangle inside a frame. Regions reaching past the frame edge are
/// clamped when sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CellRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn full(image: &RgbImage) -> Self {
        Self::new(0, 0, image.width(), image.height())
    }

    /// Intersection with a `width` x `height` frame.
    pub fn clamped(&self, width: u32, height: u32) -> CellRegion {
        let x = self.x.min(width);
        let y = self.y.min(height);
        CellRegion {
            x,
            y,
            width: self.width.min(width - x),
            height: self.height.min(height - y),
        }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

#[derive(Debug, Clone)]
pub struct ColorClassifier {
    black: ColorRange,
    white: ColorRange,
    threshold: f64,
}

impl ColorClassifier {
    pub fn new(black: ColorRange, white: ColorRange, threshold: f64) -> Self {
        Self {
            black,
            white,
            threshold,
        }
    }

    pub fn from_config(config: &ProcessorConfig) -> Self {
        Self::new(config.black_range, config.white_range, config.color_threshold)
    }

    pub fn range(&self, color: PieceColor) -> &ColorRange {
        match color {
            PieceColor::Black => &self.black,
            PieceColor::White => &self.white,
        }
    }

    /// Fraction of pixels in `region` inside the color box of `color`.
    /// `None` for an empty region.
    pub fn coverage(&self, image: &RgbImage, region: CellRegion, color: PieceColor) -> Option<f64> {
        let region = region.clamped(image.width(), image.height());
        let total = region.area();
        if total == 0 {
            return None;
        }
        let range = self.range(color);
        let mut hits = 0u64;
        for y in region.y..region.y + region.height {
            for x in region.x..region.x + region.width {
                if range.contains(image.get_pixel(x, y).0) {
                    hits += 1;
                }
            }
        }
        Some(hits as f64 / total as f64)
    }

    /// True when the coverage strictly exceeds the threshold. Empty regions are
    /// never dominant.
    pub fn is_dominant(&self, image: &RgbImage, region: CellRegion, color: PieceColor) -> bool {
        self.coverage(image, region, color)
            .is_some_and(|ratio| ratio > self.threshold)
    }

    /// Binary mask (255 inside the color box) of a region, for diagnostics.
    pub fn mask(&self, image: &RgbImage, region: CellRegion, color: PieceColor) -> GrayImage {
        let region = region.clamped(image.width(), image.height());
        let range = self.range(color);
        GrayImage::from_fn(region.width, region.height, |x, y| {
            let inside = range.contains(image.get_pixel(region.x + x, region.y + y).0);
            Luma([if inside { 255 } else { 0 }])
        })
    }
}
