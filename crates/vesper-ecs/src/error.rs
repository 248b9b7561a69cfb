use crate::entity::Entity;

/// Errors signaled by [`World`](crate::World) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EcsError {
    /// An operation that requires a live entity addressed a despawned or
    /// never-issued handle.
    #[error("unknown or despawned entity {0}")]
    UnknownEntity(Entity),
}
