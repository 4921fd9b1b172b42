// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::memory::SnapshotAllocator;
use crate::snapshot::Snapshot;
use core::ptr;
use log::debug;
use uefi::Status;
use uefi::boot::{self, AllocateType, MemoryType};

const PAGE_SIZE: usize = 4096;

/// Highest address a 32-bit locator can express.
const MAX_LOCATOR: u64 = 0xffff_ffff;

/// Where [`BootServicesAllocator`] places snapshots.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Placement {
    /// `AllocatePool`, anywhere in memory.
    #[default]
    Pool,
    /// `AllocatePages` below 4 GiB, so the address always fits into the
    /// record's 32-bit locator.
    Below4GiB,
}

/// Snapshot allocator backed by the boot services.
#[derive(Clone, Copy, Debug, Default)]
pub struct BootServicesAllocator {
    placement: Placement,
}

impl BootServicesAllocator {
    /// Create an allocator with the given placement.
    #[must_use]
    pub const fn new(placement: Placement) -> Self {
        Self { placement }
    }
}

impl SnapshotAllocator for BootServicesAllocator {
    fn allocate(&mut self, memory_type: MemoryType, size: usize) -> uefi::Result<Snapshot> {
        if size == 0 {
            return Err(Status::INVALID_PARAMETER.into());
        }

        let ptr = match self.placement {
            Placement::Pool => boot::allocate_pool(memory_type, size)?,
            Placement::Below4GiB => boot::allocate_pages(
                AllocateType::MaxAddress(MAX_LOCATOR),
                memory_type,
                size.div_ceil(PAGE_SIZE),
            )?,
        };
        debug!("{:?}: {size} bytes of {memory_type:?} at {ptr:p}", self.placement);

        // SAFETY: the firmware just handed out `size` writable bytes at `ptr`.
        // They are zeroed before a slice is formed over them, and nothing
        // frees memory of this allocation.
        unsafe {
            ptr::write_bytes(ptr.as_ptr(), 0, size);
            Ok(Snapshot::from_raw_parts(ptr, size))
        }
    }
}
