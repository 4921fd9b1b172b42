// SPDX-License-Identifier: MIT OR Apache-2.0

use core::fmt::{self, Debug, Formatter};
use core::ptr::NonNull;
use core::slice;

/// The memory an HII database export is written into.
///
/// A snapshot is an escaping allocation: the published [`ExportRecord`]
/// refers to it by address, so it must never be freed or reused while
/// anything may still read the record, which includes the OS after
/// `ExitBootServices`. `Snapshot` therefore only wraps `'static` memory and
/// has no `Drop` impl. Dropping a `Snapshot` forgets the handle, not the
/// memory.
///
/// [`ExportRecord`]: crate::ExportRecord
pub struct Snapshot {
    buf: &'static mut [u8],
}

impl Snapshot {
    /// Wrap a buffer that lives for the rest of the boot session.
    #[must_use]
    pub fn from_static(buf: &'static mut [u8]) -> Self {
        Self { buf }
    }

    /// Wrap `len` bytes at `ptr`.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads and writes of `len` initialized bytes,
    /// must not be aliased, and must never be freed.
    #[must_use]
    pub unsafe fn from_raw_parts(ptr: NonNull<u8>, len: usize) -> Self {
        // SAFETY: upheld by the caller.
        let buf = unsafe { slice::from_raw_parts_mut(ptr.as_ptr(), len) };
        Self { buf }
    }

    /// Size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the snapshot is zero bytes long.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Address of the first byte.
    #[must_use]
    pub fn address(&self) -> usize {
        self.buf.as_ptr() as usize
    }

    /// Contents of the snapshot.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        self.buf
    }

    /// Mutable access for filling the snapshot.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        self.buf
    }

    /// Give up the handle, keeping the contents reachable for good.
    #[must_use]
    pub fn into_static(self) -> &'static [u8] {
        self.buf
    }
}

impl Debug for Snapshot {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("address", &(self.address() as *const u8))
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaked(len: usize) -> &'static mut [u8] {
        Box::leak(vec![0; len].into_boxed_slice())
    }

    #[test]
    fn from_static() {
        let buf = leaked(16);
        let address = buf.as_ptr() as usize;
        let mut snapshot = Snapshot::from_static(buf);
        assert_eq!(snapshot.len(), 16);
        assert!(!snapshot.is_empty());
        assert_eq!(snapshot.address(), address);

        snapshot.as_mut_slice().fill(0xa5);
        assert!(snapshot.bytes().iter().all(|&b| b == 0xa5));

        let contents = snapshot.into_static();
        assert_eq!(contents.as_ptr() as usize, address);
        assert_eq!(contents.len(), 16);
    }

    #[test]
    fn from_raw_parts() {
        let buf = leaked(32);
        let ptr = NonNull::new(buf.as_mut_ptr()).unwrap();
        let snapshot = unsafe { Snapshot::from_raw_parts(ptr, 32) };
        assert_eq!(snapshot.address(), ptr.as_ptr() as usize);
        assert_eq!(snapshot.len(), 32);
    }
}
