// THEORY:
// The `pipeline` module is the top-level API of the engine. A `BoardProcessor`
// wraps one validated `ProcessorConfig` and exposes the two entry points callers
// need: read the board from a single image, and track the moves of a video.
// Both are blocking calls that own all of their state for their duration, so one
// processor can serve any number of independent inputs.
//
// Known limitation: the annotated output of `process_video` only receives the
// sampling ticks that ran extraction. It has fewer frames than the input and is
// not aligned with it frame for frame.

use crate::config::{BoardSize, ProcessorConfig};
use crate::core_modules::annotate::annotate_frame;
use crate::core_modules::debug_sink::DebugSink;
use crate::core_modules::grid_extractor::GridExtractor;
use crate::core_modules::position::{BoardGrid, PieceCount, PositionString};
use crate::error::{Result, VisionError};
use crate::tracker::{MoveRecord, MoveTracker};
use crate::video::{FrameSink, FrameSource};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Result of reading one still image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageReport {
    pub board_size: BoardSize,
    pub state: PositionString,
    /// Row-major codes: 1 black, -1 white, 0 empty.
    pub grid: Vec<Vec<i8>>,
    pub piece_count: PieceCount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<PathBuf>,
}

impl ImageReport {
    pub fn from_grid(grid: &BoardGrid) -> Self {
        Self {
            board_size: grid.size(),
            state: grid.encode(),
            grid: grid.to_codes(),
            piece_count: grid.piece_count(),
            image_path: None,
        }
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        to_json(self, pretty)
    }
}

/// Result of tracking one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoReport {
    pub board_size: BoardSize,
    pub moves: Vec<MoveRecord>,
    pub total_moves: usize,
    /// Frames observed after the seed frame, sampled or not.
    pub total_frames: usize,
    pub video_path: Option<PathBuf>,
    pub output_video: Option<PathBuf>,
}

impl VideoReport {
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        to_json(self, pretty)
    }

    pub fn moves_as_text(&self) -> String {
        format_moves_as_text(&self.moves)
    }
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(text)
}

/// One `Move i: Player p - STATE (frame f)` line per move, numbered from 1.
pub fn format_moves_as_text(moves: &[MoveRecord]) -> String {
    moves
        .iter()
        .enumerate()
        .map(|(i, m)| {
            format!(
                "Move {}: Player {} - {} (frame {})",
                i + 1,
                m.player.number(),
                m.state,
                m.frame
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct BoardProcessor {
    config: ProcessorConfig,
    extractor: GridExtractor,
}

impl BoardProcessor {
    pub fn new(config: ProcessorConfig) -> Result<Self> {
        config.validate()?;
        let extractor = GridExtractor::new(&config);
        Ok(Self { config, extractor })
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn extract_grid(&self, frame: &RgbImage, debug: Option<&mut dyn DebugSink>) -> BoardGrid {
        self.extractor.extract(frame, "frame", debug)
    }

    pub fn process_frame(&self, frame: &RgbImage, debug: Option<&mut dyn DebugSink>) -> ImageReport {
        ImageReport::from_grid(&self.extract_grid(frame, debug))
    }

    /// Reads the board from an image file.
    pub fn process_image(
        &self,
        path: impl AsRef<Path>,
        debug: Option<&mut dyn DebugSink>,
    ) -> Result<ImageReport> {
        let path = path.as_ref();
        let frame = image::open(path)
            .map_err(|source| VisionError::ImageLoad {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgb8();
        let label = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("image");
        let grid = self.extractor.extract(&frame, label, debug);
        log::info!("{}: {}", path.display(), grid.encode());

        let mut report = ImageReport::from_grid(&grid);
        report.image_path = Some(path.to_path_buf());
        Ok(report)
    }

    /// Tracks the moves of a frame stream. Annotated frames of the ticks that
    /// ran extraction go to `output` when given; `output` is finished before
    /// returning, also on error.
    pub fn process_video(
        &self,
        source: &mut dyn FrameSource,
        mut output: Option<&mut dyn FrameSink>,
        mut debug: Option<&mut dyn DebugSink>,
    ) -> Result<VideoReport> {
        let result = self.track(
            source,
            output.as_deref_mut().map(|s| s as &mut dyn FrameSink),
            debug.as_deref_mut().map(|s| s as &mut dyn DebugSink),
        );
        let finished = match output {
            Some(sink) => sink.finish(),
            None => Ok(()),
        };
        let report = result?;
        finished?;
        Ok(report)
    }

    fn track(
        &self,
        source: &mut dyn FrameSource,
        mut output: Option<&mut dyn FrameSink>,
        mut debug: Option<&mut dyn DebugSink>,
    ) -> Result<VideoReport> {
        let mut tracker = MoveTracker::new(&self.config);
        while let Some(frame) = source.next_frame()? {
            let step_debug = debug.as_deref_mut().map(|s| s as &mut dyn DebugSink);
            let outcome = tracker.step(&frame, step_debug)?;
            if let (Some(sink), Some(grid)) = (output.as_deref_mut(), outcome.grid()) {
                sink.write_frame(&annotate_frame(&frame, grid))?;
            }
        }
        if !tracker.has_seed() {
            return Err(VisionError::EmptyVideo(source.describe()));
        }

        let log = tracker.into_log();
        log::info!(
            "{}: {} moves over {} frames",
            source.describe(),
            log.moves.len(),
            log.total_frames
        );
        Ok(VideoReport {
            board_size: self.config.board_size,
            total_moves: log.moves.len(),
            moves: log.moves,
            total_frames: log.total_frames,
            video_path: None,
            output_video: None,
        })
    }

    /// Tracks the moves of a video file, optionally writing an annotated copy
    /// with the input's frame rate and size.
    #[cfg(feature = "opencv")]
    pub fn process_video_file(
        &self,
        path: impl AsRef<Path>,
        output_path: Option<&Path>,
        debug: Option<&mut dyn DebugSink>,
    ) -> Result<VideoReport> {
        use crate::opencv_video::{VideoFileSource, VideoFileWriter};

        let path = path.as_ref();
        let mut source = VideoFileSource::open(path)?;
        let mut writer = match output_path {
            Some(out) => {
                let fps = source.frame_rate().unwrap_or(30.0);
                let size = source
                    .frame_size()
                    .ok_or_else(|| VisionError::VideoOpen(format!("{}: unknown frame size", path.display())))?;
                Some(VideoFileWriter::create(out, fps, size)?)
            }
            None => None,
        };

        let mut report = self.process_video(
            &mut source,
            writer.as_mut().map(|w| w as &mut dyn FrameSink),
            debug,
        )?;
        report.video_path = Some(path.to_path_buf());
        report.output_video = output_path.map(Path::to_path_buf);
        Ok(report)
    }
}
