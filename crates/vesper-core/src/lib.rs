//! Vesper Core - foundational value types for the Vesper engine
//!
//! This crate provides the leaf types consumed everywhere else:
//! - Mathematical primitives (re-exported from glam)
//! - Transform and Color value types
//! - The per-frame [`Time`] snapshot produced by the game loop

pub mod time;
pub mod types;

pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
pub use time::Time;
pub use types::{Color, Transform};
