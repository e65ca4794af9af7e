// THEORY:
// The `GridExtractor` turns one color frame into a `BoardGrid`. It does not
// classify anything itself; it prepares the frame and slices it.
//
// 1.  **Normalisation**: the frame is resized to `resize_width` (aspect kept) so
//     every threshold operates at one known resolution.
// 2.  **Smoothing**: a bilateral filter removes sensor noise inside pieces while
//     keeping the piece edges.
// 3.  **Slicing**: the smoothed frame is cut into N x N cells of
//     `width / N` by `height / N` pixels (integer division). A cell rectangle that
//     would run past the frame edge is clamped to it.
// 4.  **Delegation**: each cell goes through `sample_cell`, and the results are
//     gathered row-major into the grid.
//
// The board is assumed to be axis-aligned and to fill the frame.

use crate::config::{BoardSize, ProcessorConfig, SmoothingParams};
use crate::core_modules::annotate::draw_grid_overlay;
use crate::core_modules::cell_sampler::sample_cell;
use crate::core_modules::color_classifier::{CellRegion, ColorClassifier, PieceColor};
use crate::core_modules::debug_sink::{emit_best_effort, DebugSink, DebugStage};
use crate::core_modules::filters::{bilateral_filter, resize_to_width};
use crate::core_modules::position::BoardGrid;
use image::{DynamicImage, GrayImage, RgbImage};

#[derive(Debug, Clone)]
pub struct GridExtractor {
    board_size: BoardSize,
    resize_width: u32,
    smoothing: SmoothingParams,
    classifier: ColorClassifier,
}

impl GridExtractor {
    pub fn new(config: &ProcessorConfig) -> Self {
        Self {
            board_size: config.board_size,
            resize_width: config.resize_width,
            smoothing: config.smoothing,
            classifier: ColorClassifier::from_config(config),
        }
    }

    pub fn board_size(&self) -> BoardSize {
        self.board_size
    }

    /// Cell rectangles of a `width` x `height` frame, row-major.
    pub fn cell_regions(&self, width: u32, height: u32) -> Vec<CellRegion> {
        let n = self.board_size.cells_per_side() as u32;
        let cell_width = width / n;
        let cell_height = height / n;
        (0..n)
            .flat_map(|row| {
                (0..n).map(move |col| {
                    CellRegion::new(col * cell_width, row * cell_height, cell_width, cell_height)
                        .clamped(width, height)
                })
            })
            .collect()
    }

    /// Extracts the occupancy grid of `frame`. Intermediate images go to
    /// `debug`, tagged with `label`.
    pub fn extract(
        &self,
        frame: &RgbImage,
        label: &str,
        mut debug: Option<&mut dyn DebugSink>,
    ) -> BoardGrid {
        let resized = resize_to_width(frame, self.resize_width);
        let smoothed = bilateral_filter(&resized, &self.smoothing);
        let (width, height) = smoothed.dimensions();
        let regions = self.cell_regions(width, height);

        if let Some(sink) = debug.as_deref_mut() {
            self.emit_frame_diagnostics(sink, label, &resized, &smoothed, regions.first().copied());
        }

        let n = self.board_size.cells_per_side();
        let mut grid = BoardGrid::empty(self.board_size);
        for (i, region) in regions.into_iter().enumerate() {
            grid.set(i / n, i % n, sample_cell(&self.classifier, &smoothed, region));
        }

        log::debug!(
            "extracted {} from {}x{} frame ({}x{} analysed): {}",
            self.board_size,
            frame.width(),
            frame.height(),
            width,
            height,
            grid.encode()
        );
        grid
    }

    fn emit_frame_diagnostics(
        &self,
        sink: &mut dyn DebugSink,
        label: &str,
        resized: &RgbImage,
        smoothed: &RgbImage,
        first_cell: Option<CellRegion>,
    ) {
        let full = CellRegion::full(smoothed);
        let black = self.classifier.mask(smoothed, full, PieceColor::Black);
        let white = self.classifier.mask(smoothed, full, PieceColor::White);
        let pieces = GrayImage::from_fn(full.width, full.height, |x, y| {
            image::Luma([black.get_pixel(x, y).0[0].saturating_add(white.get_pixel(x, y).0[0])])
        });
        let overlay = draw_grid_overlay(resized, self.board_size.cells_per_side() as u32);

        emit_best_effort(sink, label, DebugStage::Smoothed, DynamicImage::ImageRgb8(smoothed.clone()));
        emit_best_effort(sink, label, DebugStage::GridOverlay, DynamicImage::ImageRgb8(overlay));
        emit_best_effort(sink, label, DebugStage::WhiteMask, DynamicImage::ImageLuma8(white));
        emit_best_effort(sink, label, DebugStage::BlackMask, DynamicImage::ImageLuma8(black));
        emit_best_effort(sink, label, DebugStage::PieceMask, DynamicImage::ImageLuma8(pieces));

        let Some(cell) = first_cell.filter(|c| c.area() > 0) else {
            return;
        };
        let crop = image::imageops::crop_imm(smoothed, cell.x, cell.y, cell.width, cell.height).to_image();
        let cell_full = CellRegion::full(&crop);
        let cell_white = self.classifier.mask(&crop, cell_full, PieceColor::White);
        let cell_black = self.classifier.mask(&crop, cell_full, PieceColor::Black);
        emit_best_effort(sink, label, DebugStage::FirstCell, DynamicImage::ImageRgb8(crop));
        emit_best_effort(sink, label, DebugStage::FirstCellWhiteMask, DynamicImage::ImageLuma8(cell_white));
        emit_best_effort(sink, label, DebugStage::FirstCellBlackMask, DynamicImage::ImageLuma8(cell_black));
    }
}
