use std::path::PathBuf;

use image::RgbaImage;
use tracing::debug;

use crate::engine::EngineResult;

/// Writes every `every`-th rendered frame to `dir` as `frame_00042.png`.
pub struct FrameSnapshots {
    dir: PathBuf,
    every: u64,
    written: usize,
    failed: usize,
}

impl FrameSnapshots {
    pub fn new(dir: impl Into<PathBuf>, every: u64) -> EngineResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            every: every.max(1),
            written: 0,
            failed: 0,
        })
    }

    pub fn written(&self) -> usize {
        self.written
    }

    /// Captures that were due but could not be written.
    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn maybe_capture(&mut self, frame_index: u64, image: &RgbaImage) -> EngineResult<Option<PathBuf>> {
        if frame_index % self.every != 0 {
            return Ok(None);
        }
        let path = self.dir.join(format!("frame_{frame_index:05}.png"));
        if let Err(e) = image.save(&path) {
            self.failed += 1;
            return Err(e.into());
        }
        self.written += 1;
        debug!(path = %path.display(), "frame snapshot written");
        Ok(Some(path))
    }
}
