use parking_lot::Mutex;

use crate::world::World;

type Completion = Box<dyn FnOnce(&mut World) + Send>;

/// The single sanctioned cross-thread handoff point.
///
/// The world is owned by one engine thread; background work (asset decoding,
/// long computations) must not touch it directly. Instead, a worker computes
/// its value off-thread and pushes a completion here; the owning subsystem
/// drains the queue at the start of its next update, applying each
/// completion on the engine thread in push order.
pub struct CompletionQueue {
    pending: Mutex<Vec<Completion>>,
}

impl CompletionQueue {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Enqueue a completion. Callable from any thread; typically the queue
    /// is shared as an `Arc<CompletionQueue>`.
    pub fn push(&self, completion: impl FnOnce(&mut World) + Send + 'static) {
        self.pending.lock().push(Box::new(completion));
    }

    /// Apply every pending completion to the world, in push order. Returns
    /// how many ran. The lock is released before any completion executes, so
    /// completions may push follow-ups without deadlocking; those run on the
    /// next drain.
    pub fn drain(&self, world: &mut World) -> usize {
        let batch: Vec<Completion> = std::mem::take(&mut *self.pending.lock());
        let count = batch.len();
        for completion in batch {
            completion(world);
        }
        count
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}

impl Default for CompletionQueue {
    fn default() -> Self {
        Self::new()
    }
}
