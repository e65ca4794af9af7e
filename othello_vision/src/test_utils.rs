//! Synthetic boards for unit tests.

use crate::config::{BoardSize, ProcessorConfig, SmoothingParams};
use crate::core_modules::position::{BoardGrid, CellState};
use image::{Rgb, RgbImage};

pub(crate) const BOARD_GREEN: Rgb<u8> = Rgb([30, 120, 50]);
pub(crate) const PIECE_BLACK: Rgb<u8> = Rgb([20, 20, 20]);
pub(crate) const PIECE_WHITE: Rgb<u8> = Rgb([235, 235, 235]);

/// Config sized for fast tests: 160px analysis width and a small smoothing disc.
pub(crate) fn small_config(size: BoardSize) -> ProcessorConfig {
    ProcessorConfig {
        board_size: size,
        resize_width: 160,
        skip_frames: 1,
        smoothing: SmoothingParams {
            diameter: 5,
            ..SmoothingParams::default()
        },
        ..ProcessorConfig::default()
    }
}

/// Paints `grid` onto a green board of `width` x `height`, one disc per piece.
pub(crate) fn paint_board(grid: &BoardGrid, width: u32, height: u32) -> RgbImage {
    let n = grid.size().cells_per_side() as u32;
    let cell_w = width / n;
    let cell_h = height / n;
    let radius = cell_w.min(cell_h) as f32 * 0.47;
    RgbImage::from_fn(width, height, |x, y| {
        let (col, row) = ((x / cell_w).min(n - 1), (y / cell_h).min(n - 1));
        let cx = (col * cell_w) as f32 + cell_w as f32 / 2.0;
        let cy = (row * cell_h) as f32 + cell_h as f32 / 2.0;
        let dx = x as f32 + 0.5 - cx;
        let dy = y as f32 + 0.5 - cy;
        if dx * dx + dy * dy > radius * radius {
            return BOARD_GREEN;
        }
        match grid.get(row as usize, col as usize) {
            CellState::Black => PIECE_BLACK,
            CellState::White => PIECE_WHITE,
            CellState::Empty => BOARD_GREEN,
        }
    })
}
