//! The composition root: configuration, the game loop, and the ordered
//! subsystem registry, wired together into one lifecycle.

use std::any::TypeId;
use std::collections::HashMap;

use tracing::{debug, info};
use vesper_core::Time;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::game_loop::{Frame, GameLoop, LoopState};
use crate::subsystem::{EngineContext, Subsystem};

/// Owns the loop and the subsystems; one instance per application.
///
/// Lifecycle: [`initialize`](Engine::initialize) sets every registered
/// subsystem up in registration order, then either the host pumps
/// [`tick`](Engine::tick) (after [`start`](Engine::start) or
/// [`start_external`](Engine::start_external)) or drives
/// [`advance`](Engine::advance) with its own clock.
/// [`shutdown`](Engine::shutdown) tears everything down in reverse.
pub struct Engine {
    config: EngineConfig,
    game_loop: GameLoop,
    subsystems: Vec<Box<dyn Subsystem>>,
    by_type: HashMap<TypeId, usize>,
    time: Time,
    initialized: bool,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let game_loop = GameLoop::new(config.fixed_timestep);
        let time = Time::startup(config.fixed_timestep);
        Self {
            config,
            game_loop,
            subsystems: Vec::new(),
            by_type: HashMap::new(),
            time,
            initialized: false,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The most recent frame's timing snapshot.
    pub fn time(&self) -> Time {
        self.time
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn loop_state(&self) -> LoopState {
        self.game_loop.state()
    }

    pub fn is_running(&self) -> bool {
        self.game_loop.is_running()
    }

    pub fn subsystem_count(&self) -> usize {
        self.subsystems.len()
    }

    // ---- Registry ----

    /// Append a subsystem. Registration order is update order; shutdown runs
    /// in reverse. If the engine is already initialized the newcomer is
    /// initialized on the spot, so late registration is indistinguishable
    /// from early registration from the subsystem's point of view.
    pub fn add_subsystem<S: Subsystem>(&mut self, subsystem: S) -> Result<(), EngineError> {
        let index = self.subsystems.len();
        // First registered instance of a type wins the typed lookup.
        self.by_type.entry(TypeId::of::<S>()).or_insert(index);
        self.subsystems.push(Box::new(subsystem));

        if self.initialized {
            initialize_subsystem(&self.config, self.subsystems[index].as_mut())?;
        }
        Ok(())
    }

    /// The first registered subsystem of type `S`, if any.
    pub fn get_subsystem<S: Subsystem>(&self) -> Option<&S> {
        let index = *self.by_type.get(&TypeId::of::<S>())?;
        self.subsystems[index].as_any().downcast_ref::<S>()
    }

    pub fn get_subsystem_mut<S: Subsystem>(&mut self) -> Option<&mut S> {
        let index = *self.by_type.get(&TypeId::of::<S>())?;
        self.subsystems[index].as_any_mut().downcast_mut::<S>()
    }

    // ---- Lifecycle ----

    /// Initialize every registered subsystem, in registration order.
    /// Idempotent: a second call is a no-op and initializes nothing twice.
    pub fn initialize(&mut self) -> Result<(), EngineError> {
        if self.initialized {
            return Ok(());
        }
        info!(
            "Initializing engine '{}' ({} subsystems, fixed step {:.4}s)",
            self.config.app_name,
            self.subsystems.len(),
            self.config.fixed_timestep
        );
        self.game_loop.set_fixed_timestep(self.config.fixed_timestep);
        self.time = Time::startup(self.config.fixed_timestep);
        for subsystem in &mut self.subsystems {
            initialize_subsystem(&self.config, subsystem.as_mut())?;
        }
        self.initialized = true;
        Ok(())
    }

    /// Start the loop in self-timed mode.
    pub fn start(&mut self) {
        self.game_loop.start();
    }

    /// Start the loop in externally-driven mode; the host platform's frame
    /// pump then calls [`tick`](Engine::tick) once per refresh.
    pub fn start_external(&mut self) {
        self.game_loop.start_external();
    }

    /// Stop the loop. Idempotent, effective from the next tick boundary.
    pub fn stop(&mut self) {
        self.game_loop.stop();
    }

    /// Pump one frame off the loop's own clock. `Update` refreshes the
    /// engine time; each `FixedUpdate` refreshes it and fans out to every
    /// subsystem in registration order. A subsystem fault aborts the rest
    /// of the frame and propagates.
    pub fn tick(&mut self) -> Result<(), EngineError> {
        let Self {
            game_loop,
            subsystems,
            time,
            ..
        } = self;
        game_loop.tick(|frame| dispatch(subsystems, time, frame))
    }

    /// Pump one frame with an explicit delta, for hosts that measure their
    /// own frame times.
    pub fn advance(&mut self, delta: f32) -> Result<(), EngineError> {
        let Self {
            game_loop,
            subsystems,
            time,
            ..
        } = self;
        game_loop.advance(delta, |frame| dispatch(subsystems, time, frame))
    }

    /// Stop the loop and shut every subsystem down in reverse registration
    /// order, then clear the registry. Idempotent; a no-op before
    /// initialize.
    pub fn shutdown(&mut self) {
        if !self.initialized {
            return;
        }
        info!("Shutting down engine '{}'", self.config.app_name);
        self.game_loop.stop();
        for subsystem in self.subsystems.iter_mut().rev() {
            debug!("Shutting down subsystem '{}'", subsystem.name());
            subsystem.shutdown();
        }
        self.subsystems.clear();
        self.by_type.clear();
        self.initialized = false;
    }
}

fn initialize_subsystem(
    config: &EngineConfig,
    subsystem: &mut dyn Subsystem,
) -> Result<(), EngineError> {
    debug!("Initializing subsystem '{}'", subsystem.name());
    let mut ctx = EngineContext { config };
    subsystem
        .initialize(&mut ctx)
        .map_err(|e| EngineError::Subsystem {
            name: subsystem.name().to_string(),
            phase: "initialize",
            source: e,
        })
}

fn dispatch(
    subsystems: &mut [Box<dyn Subsystem>],
    time: &mut Time,
    frame: Frame,
) -> Result<(), EngineError> {
    match frame {
        Frame::Update(t) => {
            *time = t;
            Ok(())
        }
        Frame::FixedUpdate(t) => {
            *time = t;
            for subsystem in subsystems.iter_mut() {
                subsystem.update(&t).map_err(|e| EngineError::Subsystem {
                    name: subsystem.name().to_string(),
                    phase: "update",
                    source: e,
                })?;
            }
            Ok(())
        }
    }
}
