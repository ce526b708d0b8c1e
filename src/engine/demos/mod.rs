//! The two demo scenes.

pub mod boxes;
pub mod sunflower;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::engine::marker::{Marker, MarkerAdapter};
use crate::engine::scene::Scene;
use crate::engine::xr::SessionInit;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// Static grid of colored boxes around the viewer.
    #[default]
    Boxes,
    /// Reticle follows surface hits; select plants a sunflower.
    HitTest,
}

impl Variant {
    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Boxes => "boxes",
            Variant::HitTest => "hit-test",
        }
    }

    pub fn session_init(self) -> SessionInit {
        match self {
            Variant::Boxes => SessionInit::default(),
            Variant::HitTest => SessionInit::hit_test_with_overlay(),
        }
    }

    pub fn uses_hit_test(self) -> bool {
        matches!(self, Variant::HitTest)
    }

    /// The hit-test demo hides its entry button once the session is requested.
    pub fn hides_entry_button(self) -> bool {
        matches!(self, Variant::HitTest)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Initial scene for a variant, plus the marker when the variant has one.
pub struct DemoScene {
    pub scene: Scene,
    pub marker: Option<Marker>,
}

pub fn build(variant: Variant) -> DemoScene {
    match variant {
        Variant::Boxes => DemoScene {
            scene: boxes::box_grid(),
            marker: None,
        },
        Variant::HitTest => {
            let mut scene = sunflower::lit_scene();
            let marker = MarkerAdapter::spawn(&mut scene, &sunflower::reticle_template());
            DemoScene {
                scene,
                marker: Some(marker),
            }
        }
    }
}
