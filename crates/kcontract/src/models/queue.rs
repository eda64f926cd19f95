//! Block request queue: `blk_init_queue`, `blk_alloc_queue`,
//! `blk_cleanup_queue`.

use serde::Serialize;

use crate::assume::PathResult;
use crate::automaton::AutomatonState;
use crate::kernel::{Intercepted, Kernel};
use crate::nondet::Handle;
use crate::violation::ViolationId;

const SUBSYSTEM: &str = "linux:block:queue";

/// Queue created while one exists
pub const DOUBLE_ALLOCATION: ViolationId = ViolationId::new(SUBSYSTEM, "double allocation");
/// Queue cleaned up without being created
pub const USE_BEFORE_ALLOCATION: ViolationId =
    ViolationId::new(SUBSYSTEM, "use before allocation");
/// Queue not cleaned up at unload
pub const MORE_AT_EXIT: ViolationId = ViolationId::new(SUBSYSTEM, "more initial at exit");

/// Request queue stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QueueState {
    /// No queue, or it was cleaned up
    NoQueue,
    /// Queue created
    Initialized,
}

impl AutomatonState for QueueState {
    const KIND: &'static str = "queue";
    const IDLE: Self = Self::NoQueue;
    const STAGES: &'static [Self] = &[Self::NoQueue, Self::Initialized];
}

impl Kernel {
    fn request_queue(&mut self, call: &'static str) -> PathResult<Intercepted<Option<Handle>>> {
        self.intercept(call, |k| {
            let queue = k.any_ptr();
            k.models.queue.acquire(
                &mut k.log,
                QueueState::NoQueue,
                queue.is_some(),
                DOUBLE_ALLOCATION,
                "state == NoQueue",
                call,
            );
            Ok(queue)
        })
    }

    /// `struct request_queue *blk_init_queue(request_fn_proc *rfn, spinlock_t *lock)`
    pub fn blk_init_queue(
        &mut self,
        _rfn: Handle,
        _lock: Handle,
    ) -> PathResult<Intercepted<Option<Handle>>> {
        self.request_queue("blk_init_queue")
    }

    /// `struct request_queue *blk_alloc_queue(gfp_t gfp_mask)`
    pub fn blk_alloc_queue(&mut self, _gfp_mask: u32) -> PathResult<Intercepted<Option<Handle>>> {
        self.request_queue("blk_alloc_queue")
    }

    /// `void blk_cleanup_queue(struct request_queue *q)`
    pub fn blk_cleanup_queue(&mut self, _queue: Handle) -> PathResult<Intercepted<()>> {
        self.intercept("blk_cleanup_queue", |k| {
            k.models.queue.retreat(
                &mut k.log,
                QueueState::Initialized,
                USE_BEFORE_ALLOCATION,
                "state == Initialized",
                "blk_cleanup_queue",
            );
            Ok(())
        })
    }
}
