// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capabilities backed by the running firmware.
//!
//! These use the global system table registered with the `uefi` crate (for
//! example by the `#[entry]` macro), and must only be used before
//! `ExitBootServices`.

mod hii;
mod memory;
mod variables;

pub use hii::{HiiDatabaseExport, HiiDatabaseLocator, HiiExportProvider};
pub use memory::{BootServicesAllocator, Placement};
pub use variables::RuntimeVariableStore;
