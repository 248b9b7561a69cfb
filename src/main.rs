//! Vesper - headless demo host for the engine core
//!
//! Assembles an [`Engine`] the way a real host would: logging, config, a
//! scene subsystem with a few systems, then a bounded run of externally
//! driven frames standing in for a platform's display callback.

use anyhow::Result;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use vesper_core::{Quat, Time, Transform, Vec3};
use vesper_ecs::{FnSystem, World};
use vesper_engine::{CameraComponent, Engine, EngineConfig, MeshComponent, SceneSubsystem};

const DEMO_FRAMES: u32 = 240;

fn build_scene() -> Result<SceneSubsystem> {
    let mut scene = SceneSubsystem::new();
    let world = scene.world_mut();

    let cube = world.spawn();
    world.insert(cube, Transform::from_position(Vec3::ZERO))?;
    world.insert(cube, MeshComponent { mesh_id: 1 })?;

    let camera = world.spawn();
    world.insert(camera, Transform::from_position(Vec3::new(0.0, 2.0, 5.0)))?;
    world.insert(camera, CameraComponent::default())?;

    // Spin every mesh-carrying entity; runs before anything that would
    // consume the transforms.
    scene.add_system(
        FnSystem::new("spin", |world: &mut World, time: &Time| {
            let turn = Quat::from_rotation_y(time.delta_seconds());
            for (_, (transform, _)) in world.query::<(&mut Transform, &MeshComponent)>() {
                transform.rotate(turn);
            }
            Ok(())
        })
        .with_priority(0),
    );

    Ok(scene)
}

fn main() -> Result<()> {
    let config = EngineConfig::load_or_default("vesper.toml");

    let level = if config.enable_debug {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");

    info!("Starting {}", config.app_name);

    let mut engine = Engine::new(config);
    engine.add_subsystem(build_scene()?)?;
    engine.initialize()?;
    engine.start_external();

    // Stand-in for a platform frame pump.
    for _ in 0..DEMO_FRAMES {
        engine.tick()?;
        std::thread::sleep(std::time::Duration::from_millis(4));
    }

    if let Some(scene) = engine.get_subsystem::<SceneSubsystem>() {
        let (_, _, camera_transform) = scene
            .active_camera()
            .expect("demo scene always has a camera");
        info!(
            "Ran {} frames over {:.2}s, {} entities, camera at {}",
            engine.time().frame_count(),
            engine.time().elapsed_seconds(),
            scene.world().entity_count(),
            camera_transform.position,
        );
    }

    engine.shutdown();
    info!("Goodbye");
    Ok(())
}
