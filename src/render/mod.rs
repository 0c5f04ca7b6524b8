//! GPU presentation.
//!
//! Deliberately small: one surface/device context and one forward pass that
//! draws the scene's meshes with lambert-style lighting. Everything fancier
//! (shadows, post-processing, IBL) is out of scope for this viewer.

pub mod context;
pub mod forward;

pub use context::WgpuContext;
pub use forward::ForwardRenderer;
