// THEORY:
// The tracker does not care where frames come from. A `FrameSource` hands out
// RGB frames one at a time until the stream is exhausted, and a `FrameSink`
// receives the annotated frames of a run. Pure-Rust implementations cover
// in-memory frame lists and numbered image sequences on disk; the OpenCV-backed
// video file source and writer live in `opencv_video` behind the `opencv`
// feature. Sources and sinks own their handles and release them on drop.

use crate::error::{Result, VisionError};
use image::RgbImage;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

const SEQUENCE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "tif"];

pub trait FrameSource {
    /// Next frame, or `None` at the end of the stream.
    fn next_frame(&mut self) -> Result<Option<RgbImage>>;

    /// Frames per second, when the container knows it.
    fn frame_rate(&self) -> Option<f64> {
        None
    }

    /// Width and height of the frames, when known before reading.
    fn frame_size(&self) -> Option<(u32, u32)> {
        None
    }

    /// Human-readable name used in reports and errors.
    fn describe(&self) -> String;
}

pub trait FrameSink {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()>;

    /// Flushes and releases the underlying output.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Frames held in memory.
pub struct InMemoryFrames {
    frames: VecDeque<RgbImage>,
}

impl InMemoryFrames {
    pub fn new(frames: impl IntoIterator<Item = RgbImage>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }
}

impl FrameSource for InMemoryFrames {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        Ok(self.frames.pop_front())
    }

    fn frame_size(&self) -> Option<(u32, u32)> {
        self.frames.front().map(|f| f.dimensions())
    }

    fn describe(&self) -> String {
        "<memory>".to_string()
    }
}

/// Still images read in order as the frames of a video.
pub struct ImageSequence {
    name: String,
    paths: VecDeque<PathBuf>,
    index: usize,
}

impl ImageSequence {
    pub fn from_paths(name: impl Into<String>, paths: Vec<PathBuf>) -> Self {
        Self {
            name: name.into(),
            paths: paths.into(),
            index: 0,
        }
    }

    /// All image files of `dir`, sorted by file name.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(VisionError::VideoOpen(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_sequence_image(p))
            .collect();
        paths.sort();
        log::debug!("{} frames found in {}", paths.len(), dir.display());
        Ok(Self::from_paths(dir.display().to_string(), paths))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn is_sequence_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|e| SEQUENCE_EXTENSIONS.contains(&e.as_str()))
}

impl FrameSource for ImageSequence {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        let Some(path) = self.paths.pop_front() else {
            return Ok(None);
        };
        let index = self.index;
        self.index += 1;
        let frame = image::open(&path).map_err(|e| VisionError::FrameRead {
            index,
            reason: format!("{}: {e}", path.display()),
        })?;
        Ok(Some(frame.to_rgb8()))
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

/// Writes frames as `frame_000000.png`, `frame_000001.png`, ... into a directory.
pub struct ImageSequenceWriter {
    dir: PathBuf,
    written: usize,
}

impl ImageSequenceWriter {
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, written: 0 })
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FrameSink for ImageSequenceWriter {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        let path = self.dir.join(format!("frame_{:06}.png", self.written));
        frame
            .save(&path)
            .map_err(|e| VisionError::FrameWrite(format!("{}: {e}", path.display())))?;
        self.written += 1;
        Ok(())
    }
}

/// Keeps the annotated frames of a run in memory, the sink counterpart of
/// `InMemoryFrames`. Useful for callers that post-process the frames themselves
/// instead of writing them to disk.
#[derive(Debug, Default)]
pub struct CollectingSink {
    /// Frames in the order they were written.
    pub frames: Vec<RgbImage>,
    /// Set once `finish` has been called.
    pub finished: bool,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_frames(self) -> Vec<RgbImage> {
        self.frames
    }
}

impl FrameSink for CollectingSink {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}
