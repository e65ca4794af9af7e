// THEORY:
// Video file I/O through OpenCV's `videoio`. OpenCV hands out BGR `Mat`s; the
// rest of the library works on `image::RgbImage`, so every frame is converted at
// this boundary in both directions. Capture and writer handles are released in
// `Drop`, which covers early returns and error paths of the caller.

use crate::error::{Result, VisionError};
use crate::video::{FrameSink, FrameSource};
use image::RgbImage;
use opencv::{
    core::{self, Mat, Scalar},
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture, VideoWriter},
};
use std::path::Path;

pub struct VideoFileSource {
    path: String,
    capture: VideoCapture,
    frame: Mat,
    read: usize,
}

impl VideoFileSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().display().to_string();
        let capture = VideoCapture::from_file(&path, videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            return Err(VisionError::VideoOpen(path));
        }
        Ok(Self {
            path,
            capture,
            frame: Mat::default(),
            read: 0,
        })
    }
}

impl FrameSource for VideoFileSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        let grabbed = self.capture.read(&mut self.frame).map_err(|e| VisionError::FrameRead {
            index: self.read,
            reason: e.to_string(),
        })?;
        if !grabbed || self.frame.empty() {
            return Ok(None);
        }
        self.read += 1;

        let mut rgb = Mat::default();
        imgproc::cvt_color(&self.frame, &mut rgb, imgproc::COLOR_BGR2RGB, 0)?;
        let width = rgb.cols() as u32;
        let height = rgb.rows() as u32;
        let bytes = rgb.data_bytes()?.to_vec();
        RgbImage::from_raw(width, height, bytes)
            .map(Some)
            .ok_or_else(|| VisionError::FrameRead {
                index: self.read - 1,
                reason: "frame buffer does not match its dimensions".into(),
            })
    }

    fn frame_rate(&self) -> Option<f64> {
        self.capture
            .get(videoio::CAP_PROP_FPS)
            .ok()
            .filter(|fps| *fps > 0.0)
    }

    fn frame_size(&self) -> Option<(u32, u32)> {
        let width = self.capture.get(videoio::CAP_PROP_FRAME_WIDTH).ok()?;
        let height = self.capture.get(videoio::CAP_PROP_FRAME_HEIGHT).ok()?;
        (width > 0.0 && height > 0.0).then_some((width as u32, height as u32))
    }

    fn describe(&self) -> String {
        self.path.clone()
    }
}

impl Drop for VideoFileSource {
    fn drop(&mut self) {
        if let Err(e) = self.capture.release() {
            log::warn!("failed to release {}: {e}", self.path);
        }
    }
}

/// `mp4v` encoded output at a fixed frame size.
pub struct VideoFileWriter {
    path: String,
    writer: VideoWriter,
    size: (u32, u32),
    released: bool,
}

impl VideoFileWriter {
    pub fn create(path: impl AsRef<Path>, fps: f64, size: (u32, u32)) -> Result<Self> {
        let path = path.as_ref().display().to_string();
        let fourcc = VideoWriter::fourcc('m', 'p', '4', 'v')?;
        let writer = VideoWriter::new(
            &path,
            fourcc,
            fps,
            core::Size::new(size.0 as i32, size.1 as i32),
            true,
        )?;
        if !writer.is_opened()? {
            return Err(VisionError::FrameWrite(format!("could not open writer for {path}")));
        }
        Ok(Self {
            path,
            writer,
            size,
            released: false,
        })
    }
}

impl FrameSink for VideoFileWriter {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        if self.released {
            return Err(VisionError::FrameWrite(format!("{} is already closed", self.path)));
        }
        if frame.dimensions() != self.size {
            return Err(VisionError::FrameWrite(format!(
                "frame is {:?}, writer expects {:?}",
                frame.dimensions(),
                self.size
            )));
        }
        let (width, height) = frame.dimensions();
        let mut rgb = Mat::new_rows_cols_with_default(
            height as i32,
            width as i32,
            core::CV_8UC3,
            Scalar::all(0.0),
        )?;
        rgb.data_bytes_mut()?.copy_from_slice(frame.as_raw());
        let mut bgr = Mat::default();
        imgproc::cvt_color(&rgb, &mut bgr, imgproc::COLOR_RGB2BGR, 0)?;
        self.writer.write(&bgr)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if !self.released {
            self.released = true;
            self.writer.release()?;
        }
        Ok(())
    }
}

impl Drop for VideoFileWriter {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            log::warn!("failed to release writer for {}: {e}", self.path);
        }
    }
}
