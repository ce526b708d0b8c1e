//! Recorded / procedural device input for the headless runtime.
//!
//! A script is a flat list of frames. Each frame may carry a viewer pose (absent while
//! tracking is lost), hit-test positions in the local space, and flags asking the
//! device to deliver a select gesture, or to end the session, right before that frame.

use std::path::Path;

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::engine::xr::Eye;
use crate::engine::{EngineError, EngineResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedView {
    /// View-to-local transform, column-major.
    pub transform: [f32; 16],
    /// Column-major projection.
    pub projection: [f32; 16],
    #[serde(default = "default_eye")]
    pub eye: Eye,
}

fn default_eye() -> Eye {
    Eye::None
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptedFrame {
    pub time_ms: f64,
    #[serde(default)]
    pub viewer: Option<ScriptedView>,
    /// Surface intersections in local space, nearest first.
    #[serde(default)]
    pub hits: Vec<[f32; 3]>,
    #[serde(default)]
    pub select_before: bool,
    /// The runtime ends the session instead of delivering this frame.
    #[serde(default)]
    pub end_before: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceScript {
    pub frames: Vec<ScriptedFrame>,
}

/// Knobs for [`DeviceScript::orbit`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitParams {
    pub frames: u32,
    pub frame_interval_ms: f64,
    pub radius: f32,
    pub eye_height: f32,
    pub floor_y: f32,
    /// Radians per frame.
    pub angular_speed: f32,
    /// Leading frames with no viewer pose.
    pub tracking_lost_frames: u32,
    /// Deliver a select gesture every N frames (0 = never).
    pub select_every: u32,
    pub fov_y_degrees: f32,
    pub aspect: f32,
}

impl Default for OrbitParams {
    fn default() -> Self {
        Self {
            frames: 300,
            frame_interval_ms: 1000.0 / 60.0,
            radius: 1.5,
            eye_height: 0.0,
            floor_y: -1.2,
            angular_speed: 0.01,
            tracking_lost_frames: 10,
            select_every: 90,
            fov_y_degrees: 60.0,
            aspect: 9.0 / 16.0,
        }
    }
}

impl DeviceScript {
    pub fn load(path: &Path) -> EngineResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let script: DeviceScript = serde_json::from_str(&json)?;
        script.validate()?;
        Ok(script)
    }

    pub fn save(&self, path: &Path) -> EngineResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reject scripts a real runtime could never produce.
    pub fn validate(&self) -> EngineResult<()> {
        let mut last = f64::NEG_INFINITY;
        for (i, f) in self.frames.iter().enumerate() {
            if !f.time_ms.is_finite() || f.time_ms < last {
                return Err(EngineError::script(format!(
                    "frame {i}: time {} is not monotonic",
                    f.time_ms
                )));
            }
            last = f.time_ms;

            if let Some(v) = &f.viewer {
                if v.transform.iter().chain(v.projection.iter()).any(|x| !x.is_finite()) {
                    return Err(EngineError::script(format!("frame {i}: non-finite matrix")));
                }
            }
        }
        Ok(())
    }

    /// A viewer circling the origin, looking down at a floor plane.
    ///
    /// Hits come from the viewer's forward ray against `floor_y`, which is what a
    /// viewer-space hit-test source reports on a flat floor.
    pub fn orbit(p: &OrbitParams) -> Self {
        let projection = Mat4::perspective_rh_gl(p.fov_y_degrees.to_radians(), p.aspect, 0.01, 1000.0);

        let frames = (0..p.frames)
            .map(|i| {
                let time_ms = f64::from(i) * p.frame_interval_ms;
                let select_before = p.select_every > 0 && i > 0 && i % p.select_every == 0;

                if i < p.tracking_lost_frames {
                    return ScriptedFrame {
                        time_ms,
                        viewer: None,
                        hits: Vec::new(),
                        select_before,
                        ..ScriptedFrame::default()
                    };
                }

                let angle = i as f32 * p.angular_speed;
                let eye = Vec3::new(p.radius * angle.sin(), p.eye_height, p.radius * angle.cos());
                // Aim at a floor point between the eye and the origin so hits sweep a circle.
                let target = Vec3::new(eye.x * 0.3, p.floor_y, eye.z * 0.3);
                let view_to_local = Mat4::look_at_rh(eye, target, Vec3::Y).inverse();
                let forward = view_to_local.transform_vector3(Vec3::NEG_Z).normalize();

                let hits = floor_hit(eye, forward, p.floor_y)
                    .map(|h| vec![h.to_array()])
                    .unwrap_or_default();

                ScriptedFrame {
                    time_ms,
                    viewer: Some(ScriptedView {
                        transform: view_to_local.to_cols_array(),
                        projection: projection.to_cols_array(),
                        eye: Eye::None,
                    }),
                    hits,
                    select_before,
                    ..ScriptedFrame::default()
                }
            })
            .collect();

        Self { frames }
    }
}

/// Ray / horizontal plane intersection in front of the origin.
pub fn floor_hit(origin: Vec3, dir: Vec3, floor_y: f32) -> Option<Vec3> {
    if dir.y.abs() < 1e-6 {
        return None;
    }
    let t = (floor_y - origin.y) / dir.y;
    (t > 0.0).then(|| origin + dir * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orbit_starts_with_tracking_loss() {
        let s = DeviceScript::orbit(&OrbitParams {
            frames: 20,
            tracking_lost_frames: 5,
            ..OrbitParams::default()
        });
        assert_eq!(s.frames.len(), 20);
        assert!(s.frames[..5].iter().all(|f| f.viewer.is_none() && f.hits.is_empty()));
        assert!(s.frames[5..].iter().all(|f| f.viewer.is_some()));
    }

    #[test]
    fn orbit_hits_lie_on_the_floor() {
        let p = OrbitParams {
            frames: 30,
            tracking_lost_frames: 0,
            ..OrbitParams::default()
        };
        let s = DeviceScript::orbit(&p);
        for f in &s.frames {
            assert_eq!(f.hits.len(), 1);
            assert!((f.hits[0][1] - p.floor_y).abs() < 1e-4);
        }
    }

    #[test]
    fn select_cadence() {
        let s = DeviceScript::orbit(&OrbitParams {
            frames: 10,
            select_every: 4,
            ..OrbitParams::default()
        });
        let selects: Vec<usize> = s
            .frames
            .iter()
            .enumerate()
            .filter(|(_, f)| f.select_before)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(selects, vec![4, 8]);
    }

    #[test]
    fn floor_hit_rejects_rays_pointing_away() {
        assert!(floor_hit(Vec3::ZERO, Vec3::Y, -1.0).is_none());
        assert!(floor_hit(Vec3::ZERO, Vec3::X, -1.0).is_none());
        let h = floor_hit(Vec3::ZERO, Vec3::new(0.0, -1.0, -1.0).normalize(), -1.0).unwrap();
        assert!((h - Vec3::new(0.0, -1.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn validate_rejects_time_going_backwards() {
        let s = DeviceScript {
            frames: vec![
                ScriptedFrame {
                    time_ms: 10.0,
                    ..ScriptedFrame::default()
                },
                ScriptedFrame {
                    time_ms: 5.0,
                    ..ScriptedFrame::default()
                },
            ],
        };
        assert!(matches!(s.validate(), Err(EngineError::Script(_))));
    }

    #[test]
    fn scripts_parse_with_defaults() {
        let s: DeviceScript = serde_json::from_str(r#"{ "frames": [ { "time_ms": 0.0 } ] }"#).unwrap();
        assert_eq!(s.frames[0].viewer, None);
        assert!(s.frames[0].hits.is_empty());
        assert!(!s.frames[0].select_before);
        assert!(!s.frames[0].end_before);
    }
}
