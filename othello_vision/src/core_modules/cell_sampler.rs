use crate::core_modules::color_classifier::{CellRegion, ColorClassifier, PieceColor};
use crate::core_modules::position::CellState;
use image::RgbImage;

/// Classifies one board cell. White is tested before black, so a region that
/// passes both tests resolves to `White`. Anything else is `Empty`.
pub fn sample_cell(classifier: &ColorClassifier, image: &RgbImage, region: CellRegion) -> CellState {
    if classifier.is_dominant(image, region, PieceColor::White) {
        CellState::White
    } else if classifier.is_dominant(image, region, PieceColor::Black) {
        CellState::Black
    } else {
        CellState::Empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColorRange;
    use image::Rgb;

    #[test]
    fn classifies_uniform_cells() {
        let classifier = ColorClassifier::new(ColorRange::BLACK, ColorRange::WHITE, 0.3);
        let cases = [
            ([0, 0, 0], CellState::Black),
            ([255, 255, 255], CellState::White),
            ([128, 128, 128], CellState::Empty),
            ([0, 128, 0], CellState::Empty),
        ];
        for (rgb, expected) in cases {
            let image = RgbImage::from_pixel(8, 8, Rgb(rgb));
            assert_eq!(sample_cell(&classifier, &image, CellRegion::full(&image)), expected);
        }
    }

    #[test]
    fn white_wins_when_both_colors_dominate() {
        // Overlapping boxes: mid gray falls in both.
        let black = ColorRange::new([0, 0, 0], [140, 140, 140]);
        let white = ColorRange::new([120, 120, 120], [255, 255, 255]);
        let classifier = ColorClassifier::new(black, white, 0.3);
        let image = RgbImage::from_pixel(8, 8, Rgb([130, 130, 130]));
        let region = CellRegion::full(&image);

        assert!(classifier.is_dominant(&image, region, PieceColor::Black));
        assert!(classifier.is_dominant(&image, region, PieceColor::White));
        assert_eq!(sample_cell(&classifier, &image, region), CellState::White);
    }

    #[test]
    fn empty_region_is_an_empty_cell() {
        let classifier = ColorClassifier::new(ColorRange::BLACK, ColorRange::WHITE, 0.3);
        let image = RgbImage::from_pixel(8, 8, Rgb([0, 0, 0]));
        let region = CellRegion::new(0, 0, 0, 0);
        assert_eq!(sample_cell(&classifier, &image, region), CellState::Empty);
    }
}
