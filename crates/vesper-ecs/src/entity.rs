use std::fmt;

/// A generational entity handle: a compact slot index plus the generation the
/// slot had when this handle was issued. Despawning bumps the generation, so
/// handles held past an entity's death stop resolving instead of aliasing
/// whatever reuses the slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl Entity {
    /// Build a handle from raw parts. Mainly for tests; handles normally come
    /// from [`World::spawn`](crate::World::spawn).
    pub fn from_raw(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// The slot index of this handle.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The generation the slot had when this handle was issued.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// One entity slot: its current generation and whether it is occupied.
#[derive(Clone, Copy)]
struct Slot {
    generation: u32,
    alive: bool,
}

/// Issues entity handles and recycles slots through a free list.
pub struct EntityAllocator {
    slots: Vec<Slot>,
    free: Vec<u32>,
    alive_count: usize,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            alive_count: 0,
        }
    }

    /// Allocate a fresh entity, reusing a freed slot if one is available.
    /// Never fails.
    pub fn allocate(&mut self) -> Entity {
        self.alive_count += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.alive = true;
            Entity {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                alive: true,
            });
            Entity {
                index,
                generation: 0,
            }
        }
    }

    /// Release an entity's slot. Returns `false` if the handle was stale or
    /// already released, in which case nothing changes.
    pub fn deallocate(&mut self, entity: Entity) -> bool {
        let Some(slot) = self.slots.get_mut(entity.index as usize) else {
            return false;
        };
        if !slot.alive || slot.generation != entity.generation {
            return false;
        }
        slot.alive = false;
        slot.generation += 1;
        self.free.push(entity.index);
        self.alive_count -= 1;
        true
    }

    /// Whether this handle still refers to a live entity.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.slots
            .get(entity.index as usize)
            .map_or(false, |s| s.alive && s.generation == entity.generation)
    }

    /// Resolve a slot index to a live handle, if the slot is occupied.
    pub(crate) fn entity_at(&self, index: u32) -> Option<Entity> {
        let slot = self.slots.get(index as usize)?;
        if slot.alive {
            Some(Entity {
                index,
                generation: slot.generation,
            })
        } else {
            None
        }
    }

    /// Iterate the indices of all currently occupied slots.
    pub(crate) fn live_indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.alive)
            .map(|(i, _)| i as u32)
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.alive_count
    }

    pub fn is_empty(&self) -> bool {
        self.alive_count == 0
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}
