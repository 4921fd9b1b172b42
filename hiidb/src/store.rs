// SPDX-License-Identifier: MIT OR Apache-2.0

use uefi::runtime::{VariableAttributes, VariableVendor};
use uefi::{CStr16, Status};

#[cfg(any(test, feature = "mockall"))]
use mockall::automock;

/// Result of querying a variable's size with a null data buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VariableProbe {
    /// No variable with this name and vendor exists.
    NotFound,
    /// The variable exists and is `data_size` bytes long.
    BufferTooSmall {
        /// Size of the variable's data.
        data_size: usize,
    },
    /// The store reported success for a zero-sized buffer.
    Success {
        /// Size reported by the store.
        data_size: usize,
    },
    /// Any other status.
    Error(Status),
}

impl VariableProbe {
    /// Classify the status and size returned by `GetVariable`.
    #[must_use]
    pub fn from_status(status: Status, data_size: usize) -> Self {
        match status {
            Status::NOT_FOUND => Self::NotFound,
            Status::BUFFER_TOO_SMALL => Self::BufferTooSmall { data_size },
            Status::SUCCESS => Self::Success { data_size },
            status => Self::Error(status),
        }
    }
}

/// The variable services the export is read from and published to.
#[cfg_attr(any(test, feature = "mockall"), automock)]
pub trait VariableStore {
    /// Query a variable's size without reading its data.
    fn probe(&mut self, name: &CStr16, vendor: &VariableVendor) -> VariableProbe;

    /// Create or replace a variable.
    fn publish(
        &mut self,
        name: &CStr16,
        vendor: &VariableVendor,
        attributes: VariableAttributes,
        data: &[u8],
    ) -> uefi::Result;
}
