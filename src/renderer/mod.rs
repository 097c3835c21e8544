//! Rendering
//!
//! The render pass in `scene_render` only talks to the [`Surface`] trait.
//! On the web the surface is a [`ShapeBatch`], tessellated into triangles
//! and uploaded by the WebGPU [`RenderState`].

pub mod pipeline;
pub mod scene_render;
pub mod shapes;
pub mod surface;

pub use pipeline::RenderState;
pub use scene_render::SceneRenderer;
pub use shapes::{ShapeBatch, TextLabel, Vertex};
pub use surface::{Color, Palette, Surface};
