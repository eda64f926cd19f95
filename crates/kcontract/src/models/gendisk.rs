//! Generic disk lifecycle: `alloc_disk`, `add_disk`, `del_gendisk`,
//! `put_disk`.
//!
//! Stages run `NoDisk -> Allocated -> Added` and back one step at a time.

use serde::Serialize;

use crate::assume::PathResult;
use crate::automaton::AutomatonState;
use crate::kernel::{Intercepted, Kernel};
use crate::nondet::Handle;
use crate::violation::ViolationId;

const SUBSYSTEM: &str = "linux:gendisk";

/// `alloc_disk` while a disk is allocated
pub const DOUBLE_ALLOCATION: ViolationId = ViolationId::new(SUBSYSTEM, "double allocation");
/// `add_disk` without an allocated disk
pub const USE_BEFORE_ALLOCATION: ViolationId =
    ViolationId::new(SUBSYSTEM, "use before allocation");
/// `del_gendisk` on a disk that was not added
pub const DELETE_BEFORE_ADD: ViolationId = ViolationId::new(SUBSYSTEM, "delete before add");
/// `put_disk` with nothing allocated
pub const FREE_BEFORE_ALLOCATION: ViolationId =
    ViolationId::new(SUBSYSTEM, "free before allocation");
/// `put_disk` on a disk still added
pub const FREE_BEFORE_DELETE: ViolationId = ViolationId::new(SUBSYSTEM, "free before delete");
/// Disk not freed at unload
pub const MORE_AT_EXIT: ViolationId = ViolationId::new(SUBSYSTEM, "more initial at exit");

/// Disk lifecycle stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiskState {
    /// No disk, or the disk was freed
    NoDisk,
    /// `alloc_disk` succeeded
    Allocated,
    /// `add_disk` was called
    Added,
}

impl AutomatonState for DiskState {
    const KIND: &'static str = "gendisk";
    const IDLE: Self = Self::NoDisk;
    const STAGES: &'static [Self] = &[Self::NoDisk, Self::Allocated, Self::Added];
}

impl Kernel {
    /// `struct gendisk *alloc_disk(int minors)`
    pub fn alloc_disk(&mut self, _minors: i32) -> PathResult<Intercepted<Option<Handle>>> {
        self.intercept("alloc_disk", |k| {
            let disk = k.any_ptr();
            k.models.gendisk.acquire(
                &mut k.log,
                DiskState::NoDisk,
                disk.is_some(),
                DOUBLE_ALLOCATION,
                "state == NoDisk",
                "alloc_disk",
            );
            Ok(disk)
        })
    }

    /// `void add_disk(struct gendisk *disk)`
    pub fn add_disk(&mut self, _disk: Handle) -> PathResult<Intercepted<()>> {
        self.intercept("add_disk", |k| {
            k.models.gendisk.advance(
                &mut k.log,
                DiskState::Allocated,
                USE_BEFORE_ALLOCATION,
                "state == Allocated",
                "add_disk",
            );
            Ok(())
        })
    }

    /// `void del_gendisk(struct gendisk *disk)`
    pub fn del_gendisk(&mut self, _disk: Handle) -> PathResult<Intercepted<()>> {
        self.intercept("del_gendisk", |k| {
            k.models.gendisk.retreat(
                &mut k.log,
                DiskState::Added,
                DELETE_BEFORE_ADD,
                "state == Added",
                "del_gendisk",
            );
            Ok(())
        })
    }

    /// `void put_disk(struct gendisk *disk)`; a NULL disk is ignored
    pub fn put_disk(&mut self, disk: Option<Handle>) -> PathResult<Intercepted<()>> {
        self.intercept("put_disk", |k| {
            if disk.is_none() {
                return Ok(());
            }
            let id = if k.models.gendisk.state() == DiskState::Added {
                FREE_BEFORE_DELETE
            } else {
                FREE_BEFORE_ALLOCATION
            };
            k.models.gendisk.require(
                &mut k.log,
                &[DiskState::Allocated],
                id,
                "state == Allocated",
                "put_disk",
            );
            k.models.gendisk.release("put_disk");
            Ok(())
        })
    }
}
