// THEORY:
// Diagnostic images are handed to an explicit `DebugSink` passed into the
// extraction call instead of being written to a fixed directory. Nothing in the
// pipeline reads them back, and a sink that fails only loses diagnostics: the
// extractor logs the failure and keeps going.

use crate::error::Result;
use image::DynamicImage;
use std::path::{Path, PathBuf};

/// Intermediate images the grid extractor can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebugStage {
    /// Resized frame after bilateral smoothing.
    Smoothed,
    /// Resized frame with the cell grid drawn on it.
    GridOverlay,
    BlackMask,
    WhiteMask,
    /// Union of the black and white masks.
    PieceMask,
    /// Crop of the top-left cell.
    FirstCell,
    FirstCellBlackMask,
    FirstCellWhiteMask,
}

impl DebugStage {
    pub fn file_stem(self) -> &'static str {
        match self {
            DebugStage::Smoothed => "bilateral_filtered_image",
            DebugStage::GridOverlay => "grid_image_with_cells",
            DebugStage::BlackMask => "black_mask",
            DebugStage::WhiteMask => "white_mask",
            DebugStage::PieceMask => "game_pieces_mask",
            DebugStage::FirstCell => "cell_img",
            DebugStage::FirstCellBlackMask => "black_mask_cell",
            DebugStage::FirstCellWhiteMask => "white_mask_cell",
        }
    }
}

pub trait DebugSink {
    /// Receives one diagnostic image. `label` names the frame it came from.
    fn emit(&mut self, label: &str, stage: DebugStage, image: &DynamicImage) -> Result<()>;
}

/// Writes every image as `<dir>/<label>_<stage>.png`.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    /// Creates the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, label: &str, stage: DebugStage) -> PathBuf {
        self.dir.join(format!("{label}_{}.png", stage.file_stem()))
    }
}

impl DebugSink for DirectorySink {
    fn emit(&mut self, label: &str, stage: DebugStage, image: &DynamicImage) -> Result<()> {
        image.save(self.path_for(label, stage))?;
        Ok(())
    }
}

/// Keeps the emitted images in memory.
#[derive(Default)]
pub struct MemorySink {
    pub images: Vec<(String, DebugStage, DynamicImage)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, stage: DebugStage) -> Option<&DynamicImage> {
        self.images
            .iter()
            .find(|(_, s, _)| *s == stage)
            .map(|(_, _, image)| image)
    }
}

impl DebugSink for MemorySink {
    fn emit(&mut self, label: &str, stage: DebugStage, image: &DynamicImage) -> Result<()> {
        self.images.push((label.to_string(), stage, image.clone()));
        Ok(())
    }
}

/// Forwards to `sink` and downgrades a failure to a warning.
pub(crate) fn emit_best_effort(
    sink: &mut dyn DebugSink,
    label: &str,
    stage: DebugStage,
    image: DynamicImage,
) {
    if let Err(e) = sink.emit(label, stage, &image) {
        log::warn!("dropping debug image {label}/{}: {e}", stage.file_stem());
    }
}
