// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::snapshot::Snapshot;
use uefi::boot::MemoryType;

#[cfg(any(test, feature = "mockall"))]
use mockall::automock;

/// Source of [`Snapshot`] memory.
#[cfg_attr(any(test, feature = "mockall"), automock)]
pub trait SnapshotAllocator {
    /// Allocate exactly `size` bytes of `memory_type`, zero-initialized.
    ///
    /// The allocation is never freed.
    fn allocate(&mut self, memory_type: MemoryType, size: usize) -> uefi::Result<Snapshot>;
}
