use anyhow::{Context, Result};
use vesper_core::Time;

use crate::world::World;

/// A named unit of per-frame logic scoped to one [`World`].
///
/// Systems run in ascending [`priority`](System::priority) order, with
/// registration order breaking ties. That ordering is load-bearing: a
/// transform-propagation system must run before the render-facing system
/// that consumes the transforms, so give it a lower priority.
pub trait System: Send + Sync {
    /// Diagnostic label. Uniqueness is not enforced.
    fn name(&self) -> &str;

    /// Lower runs first. Defaults to 0.
    fn priority(&self) -> i32 {
        0
    }

    /// One-time setup before the first update, e.g. spawning the entities
    /// this system manages.
    fn initialize(&mut self, _world: &mut World) {}

    /// Invoked once per scheduling tick. An error aborts the remaining
    /// systems this tick and propagates to the caller.
    fn update(&mut self, world: &mut World, time: &Time) -> Result<()>;

    /// Teardown when the owning subsystem shuts down.
    fn shutdown(&mut self) {}
}

/// Adapter turning a closure into a [`System`] with a name and priority.
pub struct FnSystem<F> {
    name: String,
    priority: i32,
    func: F,
}

impl<F> FnSystem<F>
where
    F: FnMut(&mut World, &Time) -> Result<()> + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            priority: 0,
            func,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl<F> System for FnSystem<F>
where
    F: FnMut(&mut World, &Time) -> Result<()> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn update(&mut self, world: &mut World, time: &Time) -> Result<()> {
        (self.func)(world, time)
    }
}

/// An ordered collection of systems driven once per tick.
///
/// Order is maintained at insertion time (stable with respect to
/// registration), never re-sorted afterwards.
pub struct SystemSchedule {
    systems: Vec<Box<dyn System>>,
}

impl SystemSchedule {
    pub fn new() -> Self {
        Self {
            systems: Vec::new(),
        }
    }

    /// Register a system, slotting it after every system with priority less
    /// than or equal to its own.
    pub fn add_system<S: System + 'static>(&mut self, system: S) {
        let priority = system.priority();
        let pos = self
            .systems
            .iter()
            .position(|s| s.priority() > priority)
            .unwrap_or(self.systems.len());
        self.systems.insert(pos, Box::new(system));
    }

    /// Run every system's one-time setup, in execution order.
    pub fn initialize_all(&mut self, world: &mut World) {
        for system in &mut self.systems {
            system.initialize(world);
        }
    }

    /// Run all systems in priority order. The first error aborts the rest of
    /// the tick and propagates.
    pub fn run_all(&mut self, world: &mut World, time: &Time) -> Result<()> {
        for system in &mut self.systems {
            system
                .update(world, time)
                .with_context(|| format!("system '{}' failed", system.name()))?;
        }
        Ok(())
    }

    /// Tear systems down in reverse execution order.
    pub fn shutdown_all(&mut self) {
        for system in self.systems.iter_mut().rev() {
            system.shutdown();
        }
    }

    /// Names in execution order, for diagnostics.
    pub fn names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}

impl Default for SystemSchedule {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn tick_time() -> Time {
        Time::new(1.0 / 60.0, 1.0 / 60.0, 1, 1.0 / 60.0)
    }

    fn recording_system(
        name: &str,
        priority: i32,
        log: Arc<Mutex<Vec<String>>>,
    ) -> FnSystem<impl FnMut(&mut World, &Time) -> Result<()> + Send + Sync> {
        let label = name.to_string();
        FnSystem::new(name, move |_: &mut World, _: &Time| {
            log.lock().unwrap().push(label.clone());
            Ok(())
        })
        .with_priority(priority)
    }

    #[test]
    fn closure_system_runs() {
        let mut world = World::new();
        world.insert_resource(0u32);
        let mut schedule = SystemSchedule::new();
        schedule.add_system(FnSystem::new("count", |w: &mut World, _: &Time| {
            *w.resource_mut::<u32>().unwrap() += 1;
            Ok(())
        }));
        schedule.run_all(&mut world, &tick_time()).unwrap();
        schedule.run_all(&mut world, &tick_time()).unwrap();
        assert_eq!(world.resource::<u32>(), Some(&2));
    }

    #[test]
    fn ascending_priority_execution() {
        let mut world = World::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut schedule = SystemSchedule::new();
        schedule.add_system(recording_system("late", 10, log.clone()));
        schedule.add_system(recording_system("first", 0, log.clone()));
        schedule.add_system(recording_system("middle", 5, log.clone()));

        schedule.run_all(&mut world, &tick_time()).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["first", "middle", "late"]);
        assert_eq!(schedule.names(), vec!["first", "middle", "late"]);
    }

    #[test]
    fn equal_priority_keeps_registration_order() {
        let mut world = World::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut schedule = SystemSchedule::new();
        schedule.add_system(recording_system("a", 1, log.clone()));
        schedule.add_system(recording_system("b", 1, log.clone()));
        schedule.add_system(recording_system("c", 1, log.clone()));

        schedule.run_all(&mut world, &tick_time()).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn failing_system_aborts_the_tick() {
        let mut world = World::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut schedule = SystemSchedule::new();
        schedule.add_system(recording_system("ran", 0, log.clone()));
        schedule.add_system(
            FnSystem::new("broken", |_: &mut World, _: &Time| {
                anyhow::bail!("simulation diverged")
            })
            .with_priority(1),
        );
        schedule.add_system(recording_system("never", 2, log.clone()));

        let err = schedule.run_all(&mut world, &tick_time()).unwrap_err();
        assert!(err.to_string().contains("broken"));
        assert_eq!(*log.lock().unwrap(), vec!["ran"]);
    }
}
