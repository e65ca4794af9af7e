// THEORY:
// Annotation draws what the extractor saw back onto a copy of the frame: green
// grid lines at every cell boundary and a `B` or `W` glyph in the centre of every
// occupied cell. Black pieces get a white glyph and white pieces a black one so
// the label stays readable on top of the piece. The glyphs are tiny built-in
// bitmaps, which keeps annotation free of any font files.

use crate::core_modules::position::{BoardGrid, CellState};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

const GRID_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const GRID_THICKNESS: u32 = 2;

const GLYPH_WIDTH: usize = 5;
const GLYPH_HEIGHT: usize = 7;

const GLYPH_B: [&str; GLYPH_HEIGHT] = [
    "####.", "#...#", "#...#", "####.", "#...#", "#...#", "####.",
];
const GLYPH_W: [&str; GLYPH_HEIGHT] = [
    "#...#", "#...#", "#...#", "#.#.#", "#.#.#", "##.##", "#...#",
];

/// Returns an annotated copy of `frame`; the input is left untouched.
pub fn annotate_frame(frame: &RgbImage, grid: &BoardGrid) -> RgbImage {
    let mut out = frame.clone();
    let (width, height) = out.dimensions();
    let n = grid.size().cells_per_side() as u32;
    let cell_width = width / n;
    let cell_height = height / n;
    if cell_width == 0 || cell_height == 0 {
        return out;
    }

    for i in 1..n {
        let x = (i * cell_width) as i32 - 1;
        draw_filled_rect_mut(&mut out, Rect::at(x, 0).of_size(GRID_THICKNESS, height), GRID_COLOR);
        let y = (i * cell_height) as i32 - 1;
        draw_filled_rect_mut(&mut out, Rect::at(0, y).of_size(width, GRID_THICKNESS), GRID_COLOR);
    }

    let scale = (cell_width.min(cell_height) / 30).max(1);
    for row in 0..n as usize {
        for col in 0..n as usize {
            let (glyph, color) = match grid.get(row, col) {
                CellState::Black => (&GLYPH_B, Rgb([255, 255, 255])),
                CellState::White => (&GLYPH_W, Rgb([0, 0, 0])),
                CellState::Empty => continue,
            };
            let cx = col as u32 * cell_width + cell_width / 2;
            let cy = row as u32 * cell_height + cell_height / 2;
            draw_glyph(&mut out, glyph, cx, cy, scale, color);
        }
    }
    out
}

/// One-pixel grid lines on a copy of `frame`.
pub fn draw_grid_overlay(frame: &RgbImage, cells_per_side: u32) -> RgbImage {
    let mut out = frame.clone();
    let (width, height) = out.dimensions();
    let cell_width = width / cells_per_side;
    let cell_height = height / cells_per_side;
    for i in 1..cells_per_side {
        let x = (i * cell_width) as f32;
        draw_line_segment_mut(&mut out, (x, 0.0), (x, height as f32), GRID_COLOR);
        let y = (i * cell_height) as f32;
        draw_line_segment_mut(&mut out, (0.0, y), (width as f32, y), GRID_COLOR);
    }
    out
}

fn draw_glyph(
    image: &mut RgbImage,
    glyph: &[&str; GLYPH_HEIGHT],
    center_x: u32,
    center_y: u32,
    scale: u32,
    color: Rgb<u8>,
) {
    let left = center_x as i32 - (GLYPH_WIDTH as u32 * scale / 2) as i32;
    let top = center_y as i32 - (GLYPH_HEIGHT as u32 * scale / 2) as i32;
    for (gy, line) in glyph.iter().enumerate() {
        for (gx, bit) in line.bytes().enumerate() {
            if bit != b'#' {
                continue;
            }
            let x = left + (gx as u32 * scale) as i32;
            let y = top + (gy as u32 * scale) as i32;
            draw_filled_rect_mut(image, Rect::at(x, y).of_size(scale, scale), color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoardSize;

    const BACKGROUND: Rgb<u8> = Rgb([10, 60, 10]);

    #[test]
    fn draws_grid_lines_without_touching_the_input() {
        let frame = RgbImage::from_pixel(80, 80, BACKGROUND);
        let annotated = annotate_frame(&frame, &BoardGrid::empty(BoardSize::Four));

        assert_eq!(frame.get_pixel(20, 5), &BACKGROUND);
        assert_eq!(annotated.get_pixel(20, 5), &GRID_COLOR);
        assert_eq!(annotated.get_pixel(5, 40), &GRID_COLOR);
        assert_eq!(annotated.get_pixel(10, 10), &BACKGROUND);
    }

    #[test]
    fn labels_occupied_cells_only() {
        let frame = RgbImage::from_pixel(120, 120, BACKGROUND);
        let mut grid = BoardGrid::empty(BoardSize::Four);
        grid.set(0, 0, CellState::Black);
        grid.set(3, 3, CellState::White);
        let annotated = annotate_frame(&frame, &grid);

        let count_color = |x0: u32, y0: u32, color: Rgb<u8>| {
            (y0..y0 + 30)
                .flat_map(|y| (x0..x0 + 30).map(move |x| (x, y)))
                .filter(|&(x, y)| *annotated.get_pixel(x, y) == color)
                .count()
        };
        assert!(count_color(0, 0, Rgb([255, 255, 255])) > 0);
        assert!(count_color(90, 90, Rgb([0, 0, 0])) > 0);
        assert_eq!(count_color(30, 0, Rgb([255, 255, 255])), 0);
        assert_eq!(count_color(30, 0, Rgb([0, 0, 0])), 0);
    }

    #[test]
    fn overlay_marks_cell_boundaries() {
        let frame = RgbImage::from_pixel(40, 40, BACKGROUND);
        let overlay = draw_grid_overlay(&frame, 4);
        assert_eq!(overlay.get_pixel(10, 3), &GRID_COLOR);
        assert_eq!(overlay.get_pixel(3, 3), &BACKGROUND);
    }
}
