use std::any::Any;

use anyhow::Result;
use vesper_core::Time;

use crate::config::EngineConfig;

/// What a subsystem may touch while initializing. Kept deliberately narrow:
/// subsystems are opaque to each other, and anything two of them share goes
/// through explicit channels, not through the engine.
pub struct EngineContext<'a> {
    pub config: &'a EngineConfig,
}

/// An engine-level service with a three-phase lifecycle.
///
/// Subsystems are initialized in registration order, updated in registration
/// order every fixed tick, and shut down in reverse registration order.
/// There is no dependency resolution: register dependents after the services
/// they need (an asset manager before the renderer that consumes its
/// loaders).
///
/// A subsystem may itself own a [`World`](vesper_ecs::World) and a
/// [`SystemSchedule`](vesper_ecs::SystemSchedule), driving them from its
/// `update` — see [`SceneSubsystem`](crate::SceneSubsystem).
///
/// Errors from any lifecycle method propagate to the loop's caller
/// unchanged; the engine neither retries nor continues the frame.
pub trait Subsystem: Any + Send + Sync {
    /// Diagnostic label, also used in fault reports.
    fn name(&self) -> &str;

    /// One-time setup. Called exactly once per engine initialize, in
    /// registration order; a subsystem registered after the engine is
    /// already initialized is set up immediately.
    fn initialize(&mut self, _ctx: &mut EngineContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Called once per fixed tick with the frame's timing.
    fn update(&mut self, time: &Time) -> Result<()>;

    /// Teardown, reverse registration order.
    fn shutdown(&mut self) {}

    /// Downcast support for the engine's typed registry.
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
