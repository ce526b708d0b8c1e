use tracing::{debug, info};

use crate::engine::marker::Marker;
use crate::engine::scene::{NodeKind, Scene};
use crate::engine::session_controller::FrameStats;

/// Scene + frame-loop diagnostics for bring-up.
///
/// Call once per frame; logs a summary whenever something user-visible changed
/// (tracking gained/lost, marker shown, model placed, node count).
#[derive(Debug, Default, Clone)]
pub struct RenderingInspector {
    /// If true, log every frame. If false, log only when the summary changes.
    pub verbose_every_frame: bool,

    last_signature: Option<Signature>,
    reports: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Signature {
    nodes: usize,
    visible_meshes: usize,
    tracked: bool,
    marker_visible: bool,
    placed: u64,
}

impl RenderingInspector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of summaries logged so far.
    #[cfg(test)]
    pub fn reports(&self) -> usize {
        self.reports
    }

    fn should_report(&mut self, sig: Signature) -> bool {
        if self.verbose_every_frame {
            self.last_signature = Some(sig);
            return true;
        }

        match self.last_signature {
            Some(old) if old == sig => false,
            _ => {
                self.last_signature = Some(sig);
                true
            }
        }
    }

    pub fn observe(&mut self, stage: &str, scene: &Scene, stats: &FrameStats, marker: Option<&Marker>) -> bool {
        let visible_meshes = scene
            .iter()
            .filter(|(id, n)| matches!(n.kind, NodeKind::Mesh { .. }) && scene.world_visible(*id))
            .count();

        let sig = Signature {
            nodes: scene.len(),
            visible_meshes,
            tracked: stats.last_frame_tracked,
            marker_visible: marker.is_some_and(|m| m.visible),
            placed: stats.placed,
        };

        if !self.should_report(sig) {
            return false;
        }
        self.reports += 1;

        info!(
            stage,
            report = self.reports,
            frame = stats.frames,
            nodes = sig.nodes,
            visible_meshes = sig.visible_meshes,
            tracked = sig.tracked,
            marker_visible = sig.marker_visible,
            placed = sig.placed,
            "scene summary"
        );

        if let Some(m) = marker {
            debug!(x = m.position.x, y = m.position.y, z = m.position.z, "marker position");
        }
        debug!(
            rendered = stats.rendered,
            skipped_no_pose = stats.skipped_no_pose,
            hit_frames = stats.hit_frames,
            ignored_selects = stats.ignored_selects,
            "frame counters"
        );
        true
    }
}
