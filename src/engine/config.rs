//! Run configuration: JSON file, then CLI overrides on top.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::demos::Variant;
use crate::engine::graphics::Canvas;
use crate::engine::xr::device_script::{DeviceScript, OrbitParams};
use crate::engine::{EngineError, EngineResult};

/// Largest accepted canvas side, in pixels.
pub const MAX_CANVAS_SIDE: u32 = 8192;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 360,
            height: 640,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Recorded script to replay. When unset, an orbit is generated from `orbit`.
    pub script: Option<PathBuf>,
    pub orbit: OrbitParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    pub dir: Option<PathBuf>,
    pub every: u64,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self { dir: None, every: 30 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub variant: Variant,
    pub canvas: CanvasConfig,
    pub device: DeviceConfig,
    /// Callback count after which the sunflower model becomes available.
    pub template_ready_frame: u64,
    pub max_frames: Option<u64>,
    pub snapshot: SnapshotConfig,
    /// Write the final scene graph here as JSON.
    pub dump_scene: Option<PathBuf>,
    /// Log a scene summary whenever it changes.
    pub inspect: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            variant: Variant::default(),
            canvas: CanvasConfig::default(),
            device: DeviceConfig::default(),
            template_ready_frame: 30,
            max_frames: None,
            snapshot: SnapshotConfig::default(),
            dump_scene: None,
            inspect: false,
        }
    }
}

impl DemoConfig {
    pub fn load(path: &Path) -> EngineResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let cfg: DemoConfig = serde_json::from_str(&json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(EngineError::config(format!(
                "canvas must be non-empty, got {}x{}",
                self.canvas.width, self.canvas.height
            )));
        }
        if self.canvas.width > MAX_CANVAS_SIDE || self.canvas.height > MAX_CANVAS_SIDE {
            return Err(EngineError::config(format!(
                "canvas {}x{} exceeds {MAX_CANVAS_SIDE} pixels per side",
                self.canvas.width, self.canvas.height
            )));
        }
        if self.snapshot.every == 0 {
            return Err(EngineError::config("snapshot interval must be at least 1"));
        }
        Ok(())
    }

    pub fn canvas(&self) -> Canvas {
        Canvas::new(self.canvas.width, self.canvas.height)
    }

    /// Replay the configured script, or synthesize an orbit.
    pub fn device_script(&self) -> EngineResult<DeviceScript> {
        match &self.device.script {
            Some(path) => DeviceScript::load(path),
            None => Ok(DeviceScript::orbit(&self.device.orbit)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let cfg: DemoConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, DemoConfig::default());
        assert_eq!(cfg.canvas(), Canvas::new(360, 640));
        assert_eq!(cfg.variant, Variant::Boxes);
    }

    #[test]
    fn nested_fields_override_individually() {
        let cfg: DemoConfig = serde_json::from_str(
            r#"{ "variant": "hit-test", "device": { "orbit": { "frames": 12 } }, "snapshot": { "every": 5 } }"#,
        )
        .unwrap();

        assert_eq!(cfg.variant, Variant::HitTest);
        assert_eq!(cfg.device.orbit.frames, 12);
        assert_eq!(cfg.device.orbit.tracking_lost_frames, OrbitParams::default().tracking_lost_frames);
        assert_eq!(cfg.snapshot.every, 5);
        assert_eq!(cfg.device_script().unwrap().frames.len(), 12);
    }

    #[test]
    fn zero_sized_canvas_is_rejected() {
        let mut cfg = DemoConfig::default();
        cfg.canvas.width = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn oversized_canvas_is_rejected() {
        let mut cfg = DemoConfig::default();
        cfg.canvas.height = MAX_CANVAS_SIDE;
        assert!(cfg.validate().is_ok());

        cfg.canvas.width = 70_000;
        assert!(matches!(cfg.validate(), Err(EngineError::Config(_))));
    }

    #[test]
    fn load_reads_from_disk() {
        let path = std::env::temp_dir().join(format!("ar-garden-config-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, r#"{ "max_frames": 3 }"#).unwrap();

        let cfg = DemoConfig::load(&path).unwrap();
        assert_eq!(cfg.max_frames, Some(3));
        let _ = std::fs::remove_file(&path);
    }
}
