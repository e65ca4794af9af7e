// THEORY:
// The `MoveTracker` adds memory to the frame-by-frame extractor. It owns
// everything one video needs between frames: the blurred grayscale reference the
// motion gate compares against, the last stable position, whose turn it is, the
// frame counter and the move log. Nothing is shared between trackers, so
// independent videos can be tracked side by side.
//
// Per frame the tracker is always "scanning":
// 1.  **Seeding**: the very first frame only becomes the motion reference. It
//     is not counted and never read.
// 2.  **Sampling**: frames are numbered from 0; only indices divisible by
//     `skip_frames` are looked at.
// 3.  **Gating**: a sampled frame is compared against the previous sampled
//     frame. The reference is replaced either way, but a moving frame is dropped.
// 4.  **Diffing**: a stable frame is extracted, encoded and compared with the last
//     stable position. A difference is a move by the current player, after which
//     the turn passes to the other player.

use crate::config::ProcessorConfig;
use crate::core_modules::debug_sink::DebugSink;
use crate::core_modules::filters::blurred_gray;
use crate::core_modules::grid_extractor::GridExtractor;
use crate::core_modules::motion_gate::MotionGate;
use crate::core_modules::position::{BoardGrid, PositionString};
use crate::error::{Result, VisionError};
use image::{GrayImage, RgbImage};
use serde::{Deserialize, Serialize};

/// Player identifier, serialized as 1 or 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub fn number(self) -> u8 {
        match self {
            Player::One => 1,
            Player::Two => 2,
        }
    }

    /// The other player: `(player mod 2) + 1`.
    pub fn next(self) -> Self {
        match self.number() % 2 + 1 {
            1 => Player::One,
            _ => Player::Two,
        }
    }
}

impl From<Player> for u8 {
    fn from(player: Player) -> u8 {
        player.number()
    }
}

impl TryFrom<u8> for Player {
    type Error = VisionError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Player::One),
            2 => Ok(Player::Two),
            other => Err(VisionError::InvalidPlayer(other)),
        }
    }
}

/// One detected change of the stable board position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub player: Player,
    /// Position after the move.
    pub state: PositionString,
    /// Index of the sampled frame where the change was first seen.
    pub frame: usize,
}

/// Moves of one video plus the number of frames observed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MoveLog {
    pub moves: Vec<MoveRecord>,
    pub total_frames: usize,
}

/// What one call to `MoveTracker::step` did with its frame.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The frame became the initial motion reference.
    Seeded,
    /// Not a sampling tick.
    NotSampled,
    /// Sampling tick dropped because the scene was moving.
    MotionSkipped,
    /// Stable frame, same position as before.
    Unchanged(BoardGrid),
    /// Stable frame with a new position.
    Moved(BoardGrid, MoveRecord),
}

impl StepOutcome {
    /// The extracted grid, for ticks that ran extraction.
    pub fn grid(&self) -> Option<&BoardGrid> {
        match self {
            StepOutcome::Unchanged(grid) | StepOutcome::Moved(grid, _) => Some(grid),
            _ => None,
        }
    }
}

pub struct MoveTracker {
    extractor: GridExtractor,
    gate: MotionGate,
    skip_frames: usize,
    blur_kernel: u32,
    previous_gray: Option<GrayImage>,
    last_position: PositionString,
    player: Player,
    frames_seen: usize,
    moves: Vec<MoveRecord>,
}

impl MoveTracker {
    pub fn new(config: &ProcessorConfig) -> Self {
        Self {
            extractor: GridExtractor::new(config),
            gate: MotionGate::from_config(config),
            skip_frames: config.skip_frames.max(1) as usize,
            blur_kernel: config.motion.blur_kernel,
            previous_gray: None,
            last_position: PositionString::empty(config.board_size),
            player: Player::One,
            frames_seen: 0,
            moves: Vec::new(),
        }
    }

    /// Feeds the next frame of the stream.
    pub fn step(&mut self, frame: &RgbImage, debug: Option<&mut dyn DebugSink>) -> Result<StepOutcome> {
        if self.previous_gray.is_none() {
            self.previous_gray = Some(blurred_gray(frame, self.blur_kernel));
            return Ok(StepOutcome::Seeded);
        }

        let index = self.frames_seen;
        self.frames_seen += 1;
        if index % self.skip_frames != 0 {
            return Ok(StepOutcome::NotSampled);
        }

        let gray = blurred_gray(frame, self.blur_kernel);
        let moving = match &self.previous_gray {
            Some(previous) => self.gate.is_motion(previous, &gray)?,
            None => false,
        };
        self.previous_gray = Some(gray);
        if moving {
            log::debug!("frame {index}: motion, skipping extraction");
            return Ok(StepOutcome::MotionSkipped);
        }

        let grid = self.extractor.extract(frame, &format!("frame_{index:06}"), debug);
        let position = grid.encode();
        if position == self.last_position {
            return Ok(StepOutcome::Unchanged(grid));
        }

        let record = MoveRecord {
            player: self.player,
            state: position.clone(),
            frame: index,
        };
        log::info!(
            "move {}: player {} -> {} (frame {index})",
            self.moves.len() + 1,
            self.player.number(),
            position
        );
        self.moves.push(record.clone());
        self.player = self.player.next();
        self.last_position = position;
        Ok(StepOutcome::Moved(grid, record))
    }

    pub fn moves(&self) -> &[MoveRecord] {
        &self.moves
    }

    /// Frames counted so far (the seed frame excluded).
    pub fn frames_seen(&self) -> usize {
        self.frames_seen
    }

    pub fn current_player(&self) -> Player {
        self.player
    }

    pub fn last_position(&self) -> &PositionString {
        &self.last_position
    }

    pub fn has_seed(&self) -> bool {
        self.previous_gray.is_some()
    }

    pub fn into_log(self) -> MoveLog {
        MoveLog {
            moves: self.moves,
            total_frames: self.frames_seen,
        }
    }
}
