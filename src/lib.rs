//! Multi-level tile-grid raycaster.
//!
//! [`frame::render_frame`] turns a [`world::GridWorld`] and a
//! [`camera::Camera`] into an ordered list of [`draw::DrawIntent`]s. A
//! [`draw::DrawSink`] executes them; [`renderer::SoftwareSink`] is the CPU
//! one the demo binary presents through softbuffer.

pub mod camera;
pub mod compositor;
pub mod config;
pub mod draw;
pub mod error;
pub mod frame;
pub mod player;
pub mod projector;
pub mod raycaster;
pub mod renderer;
pub mod scaler;
pub mod shape;
pub mod sprites;
pub mod surface;
pub mod textures;
pub mod world;

pub use camera::{Camera, PlayerPose};
pub use compositor::DepthBuffer;
pub use config::{MapFile, RenderConfig};
pub use draw::{DrawIntent, DrawSink};
pub use error::{ConfigError, WorldError};
pub use frame::{FrameSettings, render_frame};
pub use world::GridWorld;
