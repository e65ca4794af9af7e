use std::path::PathBuf;

/// Errors returned by the board extraction and move tracking entry points.
#[derive(thiserror::Error, Debug)]
pub enum VisionError {
    #[error("could not load image {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("could not open video: {0}")]
    VideoOpen(String),
    #[error("video {0} yielded no frames")]
    EmptyVideo(String),
    #[error("board size must be 4 or 8, got {0}")]
    InvalidBoardSize(u32),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("invalid position string: {0}")]
    InvalidPosition(String),
    #[error("player must be 1 or 2, got {0}")]
    InvalidPlayer(u8),
    #[error("frame size mismatch: previous {previous:?}, current {current:?}")]
    FrameSizeMismatch {
        previous: (u32, u32),
        current: (u32, u32),
    },
    #[error("failed to read frame {index}: {reason}")]
    FrameRead { index: usize, reason: String },
    #[error("failed to write output frame: {0}")]
    FrameWrite(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[cfg(feature = "opencv")]
    #[error(transparent)]
    OpenCv(#[from] opencv::Error),
}

pub type Result<T> = std::result::Result<T, VisionError>;
