//! The ECS-hosting subsystem.
//!
//! [`SceneSubsystem`] is the composition the engine core promises: a
//! subsystem that owns a [`World`] and a [`SystemSchedule`] and drives them
//! from its own `update`. It also defines the narrow component surface an
//! external renderer consumes — mesh/material handles, transforms, and the
//! active camera — without knowing anything about the GPU behind it.

use std::any::Any;
use std::sync::Arc;

use anyhow::Result;
use tracing::debug;
use vesper_core::{Color, Time, Transform};
use vesper_ecs::{CompletionQueue, Entity, System, SystemSchedule, World};

use crate::subsystem::{EngineContext, Subsystem};

/// Reference to a mesh owned by an external asset loader. The id is opaque
/// to the engine core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshComponent {
    pub mesh_id: u64,
}

/// Reference to a material plus the per-entity tint an external renderer
/// applies to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialComponent {
    pub material_id: u64,
    pub base_color: Color,
}

impl MaterialComponent {
    pub fn new(material_id: u64) -> Self {
        Self {
            material_id,
            base_color: Color::WHITE,
        }
    }
}

/// Perspective camera parameters. The renderer builds its projection matrix
/// from these; the core only stores and finds them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraComponent {
    pub fov_y_radians: f32,
    pub near: f32,
    pub far: f32,
    /// Whether this camera is the one a renderer should use. With several
    /// active cameras, the first in component insertion order wins.
    pub active: bool,
}

impl Default for CameraComponent {
    fn default() -> Self {
        Self {
            fov_y_radians: 60f32.to_radians(),
            near: 0.1,
            far: 1000.0,
            active: true,
        }
    }
}

/// Subsystem owning a world and the systems that run over it each tick.
///
/// Update order within a tick: pending cross-thread completions are drained
/// first (so work finished off-thread is visible to this tick's systems),
/// then systems run in priority order.
pub struct SceneSubsystem {
    world: World,
    schedule: SystemSchedule,
    completions: Arc<CompletionQueue>,
}

impl SceneSubsystem {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            schedule: SystemSchedule::new(),
            completions: Arc::new(CompletionQueue::new()),
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Register a system. See [`SystemSchedule::add_system`] for ordering.
    pub fn add_system<S: System + 'static>(&mut self, system: S) {
        self.schedule.add_system(system);
    }

    /// A shareable handle for background workers to deliver results through;
    /// completions run on the engine thread at the start of the next update.
    pub fn completions(&self) -> Arc<CompletionQueue> {
        self.completions.clone()
    }

    /// The camera a renderer should use this frame: the first entity (in
    /// camera insertion order) whose [`CameraComponent`] is active and that
    /// carries a [`Transform`].
    pub fn active_camera(&self) -> Option<(Entity, CameraComponent, Transform)> {
        self.world
            .query::<(&CameraComponent, &Transform)>()
            .find(|(_, (camera, _))| camera.active)
            .map(|(entity, (camera, transform))| (entity, *camera, *transform))
    }
}

impl Default for SceneSubsystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Subsystem for SceneSubsystem {
    fn name(&self) -> &str {
        "scene"
    }

    fn initialize(&mut self, _ctx: &mut EngineContext<'_>) -> Result<()> {
        debug!("Scene starting with {} systems", self.schedule.len());
        self.schedule.initialize_all(&mut self.world);
        Ok(())
    }

    fn update(&mut self, time: &Time) -> Result<()> {
        self.completions.drain(&mut self.world);
        self.schedule.run_all(&mut self.world, time)
    }

    fn shutdown(&mut self) {
        self.schedule.shutdown_all();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vesper_core::Vec3;
    use vesper_ecs::FnSystem;

    fn tick_time() -> Time {
        Time::new(1.0 / 60.0, 1.0 / 60.0, 1, 1.0 / 60.0)
    }

    fn init(scene: &mut SceneSubsystem) {
        let config = crate::EngineConfig::default();
        let mut ctx = EngineContext { config: &config };
        scene.initialize(&mut ctx).unwrap();
    }

    #[test]
    fn renderer_style_query_sees_only_drawable_entities() {
        let mut scene = SceneSubsystem::new();
        let world = scene.world_mut();

        let drawable = world.spawn();
        world.insert(drawable, Transform::from_position(Vec3::X)).unwrap();
        world.insert(drawable, MeshComponent { mesh_id: 3 }).unwrap();
        world.insert(drawable, MaterialComponent::new(7)).unwrap();

        let bare = world.spawn();
        world.insert(bare, Transform::default()).unwrap();

        let drawn: Vec<_> = world
            .query::<(&MeshComponent, &Transform, Option<&MaterialComponent>)>()
            .collect();
        assert_eq!(drawn.len(), 1);
        let (entity, (mesh, _, material)) = &drawn[0];
        assert_eq!(*entity, drawable);
        assert_eq!(mesh.mesh_id, 3);
        assert_eq!(material.unwrap().material_id, 7);
    }

    #[test]
    fn active_camera_skips_inactive_ones() {
        let mut scene = SceneSubsystem::new();
        let world = scene.world_mut();

        let disabled = world.spawn();
        world.insert(disabled, Transform::default()).unwrap();
        world
            .insert(
                disabled,
                CameraComponent {
                    active: false,
                    ..Default::default()
                },
            )
            .unwrap();

        let main = world.spawn();
        world
            .insert(main, Transform::from_position(Vec3::new(0.0, 2.0, 5.0)))
            .unwrap();
        world.insert(main, CameraComponent::default()).unwrap();

        let (entity, camera, transform) = scene.active_camera().unwrap();
        assert_eq!(entity, main);
        assert!(camera.active);
        assert_eq!(transform.position, Vec3::new(0.0, 2.0, 5.0));
    }

    #[test]
    fn update_runs_systems_against_the_world() {
        let mut scene = SceneSubsystem::new();
        scene.world_mut().insert_resource(0u32);
        scene.add_system(FnSystem::new("count", |w: &mut World, _: &Time| {
            *w.resource_mut::<u32>().unwrap() += 1;
            Ok(())
        }));
        init(&mut scene);

        scene.update(&tick_time()).unwrap();
        scene.update(&tick_time()).unwrap();
        assert_eq!(scene.world().resource::<u32>(), Some(&2));
    }

    #[test]
    fn completions_land_before_systems_run() {
        let mut scene = SceneSubsystem::new();
        scene.world_mut().insert_resource(Vec::<u64>::new());
        scene.add_system(FnSystem::new("collect-meshes", |w: &mut World, _: &Time| {
            let ids: Vec<u64> = w
                .query::<(&MeshComponent,)>()
                .map(|(_, (m,))| m.mesh_id)
                .collect();
            *w.resource_mut::<Vec<u64>>().unwrap() = ids;
            Ok(())
        }));
        init(&mut scene);

        // A loader finishing off-thread hands its result to the world
        // through the completion queue.
        let completions = scene.completions();
        let worker = std::thread::spawn(move || {
            completions.push(|w: &mut World| {
                let e = w.spawn();
                w.insert(e, MeshComponent { mesh_id: 42 }).unwrap();
            });
        });
        worker.join().unwrap();

        scene.update(&tick_time()).unwrap();
        assert_eq!(scene.world().resource::<Vec<u64>>(), Some(&vec![42]));
    }
}
