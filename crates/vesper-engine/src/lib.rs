//! Vesper Engine - subsystem lifecycle and fixed-timestep game loop
//!
//! The execution core of the engine: [`Engine`] composes an ordered set of
//! [`Subsystem`]s with a two-mode [`GameLoop`], advancing simulation on a
//! fixed timestep while collaborators (renderer, asset loaders, input) stay
//! behind the subsystem contract.

mod config;
mod engine;
mod error;
mod game_loop;
mod scene;
mod subsystem;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::EngineError;
pub use game_loop::{Frame, GameLoop, LoopState, DEFAULT_MAX_DELTA, DEFAULT_MAX_FIXED_STEPS};
pub use scene::{CameraComponent, MaterialComponent, MeshComponent, SceneSubsystem};
pub use subsystem::{EngineContext, Subsystem};
