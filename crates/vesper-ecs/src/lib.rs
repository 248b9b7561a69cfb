//! Vesper ECS - Entity Component System
//!
//! The entity world at the heart of the engine: generational entity handles,
//! sparse-set component storage with per-type reverse indices, conjunction
//! queries, and a priority-ordered system schedule. Single-threaded by
//! design; the [`CompletionQueue`] is the one cross-thread handoff point.

mod component;
mod entity;
mod error;
mod handoff;
mod query;
mod resource;
mod system;
mod world;

pub use component::Component;
pub use entity::Entity;
pub use error::EcsError;
pub use handoff::CompletionQueue;
pub use query::{QueryIter, QueryParam};
pub use system::{FnSystem, System, SystemSchedule};
pub use world::World;
