#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod animation;
pub mod app;
pub mod assets;
pub mod config;
pub mod errors;
pub mod interaction;
pub mod picking;
pub mod render;
pub mod resources;
pub mod scene;
pub mod status;
pub mod utils;
pub mod viewer;

pub use animation::{AnimationAction, AnimationClip, AnimationMixer, Binder, LoopMode};
pub use assets::{load_model, AssetServer, ModelAsset};
pub use config::{ClipMatchRule, MaterialPolicy, ScalePolicy, ViewerConfig};
pub use errors::{Result, ViewerError};
pub use interaction::ReactionTrigger;
pub use resources::{Geometry, MaterialKind, Mesh};
pub use scene::{Camera, Light, Node, Scene};
pub use status::{StatusDisplay, LOAD_FAILURE_TEXT};
pub use utils::orbit_control::OrbitControls;
pub use viewer::Viewer;
