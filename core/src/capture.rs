//! Frame output.
//!
//! The session hands every composited frame to a [`FrameSink`]:
//! - [`PngSequenceSink`] writes `frame_000000.png`, `frame_000001.png`, ...
//!   into a directory, ready for an external video encoder.
//! - [`GifSink`] streams frames to a background thread that encodes a
//!   single animated GIF.

use image::RgbaImage;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use thiserror::Error;

/// Frames buffered between the renderer and the GIF writer thread.
const GIF_QUEUE_DEPTH: usize = 4;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("PNG encoding failed: {0}")]
    Png(#[from] png::EncodingError),

    #[error("GIF encoding failed: {0}")]
    Gif(#[from] gif::EncodingError),

    #[error("frame is {width}x{height}, GIF frames are limited to 65535x65535")]
    FrameTooLarge { width: u32, height: u32 },

    #[error("frame is {got:?}, sink expects {expected:?}")]
    SizeMismatch {
        expected: (u32, u32),
        got: (u32, u32),
    },

    #[error("GIF writer thread stopped unexpectedly")]
    WriterGone,
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> CaptureError + '_ {
    move |source| CaptureError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Destination for rendered frames.
pub trait FrameSink {
    /// Accept frame number `index`. Frames arrive in order, starting at 0.
    fn submit(&mut self, index: u64, frame: &RgbaImage) -> Result<(), CaptureError>;

    /// Flush and close. No frames may follow.
    fn finish(&mut self) -> Result<(), CaptureError>;
}

/// Save one RGBA image as PNG.
pub fn save_png(path: &Path, image: &RgbaImage) -> Result<(), CaptureError> {
    let file = File::create(path).map_err(io_error(path))?;
    let writer = BufWriter::new(file);

    let mut encoder = png::Encoder::new(writer, image.width(), image.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);

    let mut png_writer = encoder.write_header()?;
    png_writer.write_image_data(image.as_raw())?;
    png_writer.finish()?;
    Ok(())
}

/// Writes each frame as a numbered PNG in a directory.
#[derive(Debug)]
pub struct PngSequenceSink {
    dir: PathBuf,
    written: u64,
}

impl PngSequenceSink {
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self, CaptureError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(io_error(&dir))?;
        Ok(Self { dir, written: 0 })
    }

    pub fn frame_path(&self, index: u64) -> PathBuf {
        self.dir.join(format!("frame_{:06}.png", index))
    }

    pub fn frames_written(&self) -> u64 {
        self.written
    }
}

impl FrameSink for PngSequenceSink {
    fn submit(&mut self, index: u64, frame: &RgbaImage) -> Result<(), CaptureError> {
        save_png(&self.frame_path(index), frame)?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), CaptureError> {
        tracing::info!(
            "Wrote {} frames to {}",
            self.written,
            self.dir.display()
        );
        Ok(())
    }
}

/// Encodes frames into an animated GIF on a background thread.
pub struct GifSink {
    path: PathBuf,
    size: (u32, u32),
    sender: Option<mpsc::SyncSender<RgbaImage>>,
    worker: Option<thread::JoinHandle<Result<u64, CaptureError>>>,
}

impl GifSink {
    pub fn create(
        path: impl Into<PathBuf>,
        width: u32,
        height: u32,
        fps: u32,
    ) -> Result<Self, CaptureError> {
        let path = path.into();
        if width > u16::MAX as u32 || height > u16::MAX as u32 {
            return Err(CaptureError::FrameTooLarge { width, height });
        }

        let file = File::create(&path).map_err(io_error(&path))?;
        let mut encoder = gif::Encoder::new(BufWriter::new(file), width as u16, height as u16, &[])?;
        encoder.set_repeat(gif::Repeat::Infinite)?;

        // Delay is in centiseconds.
        let frame_delay = (100 / fps.max(1)).max(1) as u16;

        let (sender, receiver) = mpsc::sync_channel::<RgbaImage>(GIF_QUEUE_DEPTH);
        let worker = thread::spawn(move || {
            let mut count = 0u64;
            for image in receiver {
                // GIF has no useful alpha.
                let rgb: Vec<u8> = image
                    .as_raw()
                    .chunks_exact(4)
                    .flat_map(|px| [px[0], px[1], px[2]])
                    .collect();
                let mut frame =
                    gif::Frame::from_rgb_speed(width as u16, height as u16, &rgb, 10);
                frame.delay = frame_delay;
                encoder.write_frame(&frame)?;
                count += 1;
            }
            Ok(count)
        });

        Ok(Self {
            path,
            size: (width, height),
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    fn join(&mut self) -> Result<u64, CaptureError> {
        self.sender = None;
        match self.worker.take() {
            Some(worker) => worker.join().map_err(|_| CaptureError::WriterGone)?,
            None => Err(CaptureError::WriterGone),
        }
    }
}

impl FrameSink for GifSink {
    fn submit(&mut self, _index: u64, frame: &RgbaImage) -> Result<(), CaptureError> {
        if frame.dimensions() != self.size {
            return Err(CaptureError::SizeMismatch {
                expected: self.size,
                got: frame.dimensions(),
            });
        }

        let sent = match &self.sender {
            Some(sender) => sender.send(frame.clone()).is_ok(),
            None => false,
        };
        if !sent {
            // The worker exited; surface its error if it had one.
            self.join()?;
            return Err(CaptureError::WriterGone);
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), CaptureError> {
        let frames = self.join()?;
        tracing::info!("GIF saved: {} ({} frames)", self.path.display(), frames);
        Ok(())
    }
}

impl Drop for GifSink {
    fn drop(&mut self) {
        if self.worker.is_some() {
            let _ = self.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tempfile::TempDir;

    fn solid(width: u32, height: u32, value: u8) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([value, 0, 255 - value, 255]))
    }

    #[test]
    fn test_png_sequence_names_frames() {
        let dir = TempDir::new().unwrap();
        let mut sink = PngSequenceSink::create(dir.path().join("frames")).unwrap();
        sink.submit(0, &solid(4, 3, 10)).unwrap();
        sink.submit(1, &solid(4, 3, 20)).unwrap();
        sink.finish().unwrap();

        assert_eq!(sink.frames_written(), 2);
        let first = dir.path().join("frames/frame_000000.png");
        let second = dir.path().join("frames/frame_000001.png");
        assert!(first.exists());
        assert!(second.exists());

        let decoded = image::open(&second).unwrap().to_rgba8();
        assert_eq!(decoded, solid(4, 3, 20));
    }

    #[test]
    fn test_gif_sink_writes_all_frames() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.gif");
        let mut sink = GifSink::create(&path, 8, 8, 60).unwrap();
        for i in 0..5u8 {
            sink.submit(i as u64, &solid(8, 8, i * 40)).unwrap();
        }
        sink.finish().unwrap();

        let file = File::open(&path).unwrap();
        let mut options = gif::DecodeOptions::new();
        options.set_color_output(gif::ColorOutput::RGBA);
        let mut decoder = options.read_info(file).unwrap();
        let mut frames = 0;
        while decoder.read_next_frame().unwrap().is_some() {
            frames += 1;
        }
        assert_eq!(frames, 5);
    }

    #[test]
    fn test_gif_sink_rejects_mismatched_frames() {
        let dir = TempDir::new().unwrap();
        let mut sink = GifSink::create(dir.path().join("out.gif"), 8, 8, 30).unwrap();
        let err = sink.submit(0, &solid(4, 4, 0)).unwrap_err();
        assert!(matches!(err, CaptureError::SizeMismatch { .. }));
        sink.finish().unwrap();
    }

    #[test]
    fn test_gif_too_large() {
        let dir = TempDir::new().unwrap();
        let err = GifSink::create(dir.path().join("big.gif"), 70_000, 10, 30).err();
        assert!(matches!(err, Some(CaptureError::FrameTooLarge { .. })));
    }
}
