// THEORY:
// This file is the entry point of the `othello_vision` library crate. It reads
// the discrete state of an Othello board (4x4 or 8x8) out of pixels:
//
//   frame -> motion gate -> grid extractor -> position string -> move tracker
//
// `pipeline::BoardProcessor` is the high-level interface: one call reads a still
// image, another tracks the moves of a video. The stage modules under
// `core_modules` are public for callers that want to drive a single stage, such
// as classifying one cell or gating one pair of frames.

pub mod config;
pub mod core_modules;
pub mod error;
#[cfg(feature = "opencv")]
pub mod opencv_video;
pub mod pipeline;
pub mod tracker;
pub mod video;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::{BoardSize, ColorRange, MotionParams, ProcessorConfig, SmoothingParams};
pub use core_modules::annotate::annotate_frame;
pub use core_modules::debug_sink::{DebugSink, DebugStage, DirectorySink, MemorySink};
pub use core_modules::position::{BoardGrid, CellState, PieceCount, PositionString};
pub use error::{Result, VisionError};
pub use pipeline::{format_moves_as_text, BoardProcessor, ImageReport, VideoReport};
pub use tracker::{MoveLog, MoveRecord, MoveTracker, Player, StepOutcome};
pub use video::{CollectingSink, FrameSink, FrameSource, ImageSequence, ImageSequenceWriter, InMemoryFrames};
