// SPDX-License-Identifier: MIT OR Apache-2.0

//! Export of the UEFI HII database into a runtime-visible variable.
//!
//! The firmware keeps its HII database (the package lists describing setup
//! forms, strings and fonts) behind the `EFI_HII_DATABASE_PROTOCOL`, which is
//! gone once the OS has called `ExitBootServices`. This crate takes a one-time
//! snapshot of the whole database into `EfiRuntimeServicesData` memory and
//! publishes its location in the `HiiDB` variable, so the OS can find it
//! later.
//!
//! The published variable holds an 8-byte [`ExportRecord`]:
//!
//! | Offset | Size | Field                                 |
//! |--------|------|---------------------------------------|
//! | 0      | 4    | `length` of the snapshot, little endian |
//! | 4      | 4    | `locator` (address) of the snapshot, little endian |
//!
//! # Usage
//!
//! The workflow in [`Exporter`] never touches firmware state directly. It is
//! handed its capabilities ([`VariableStore`], [`ProviderLocator`],
//! [`SnapshotAllocator`]) at construction time. The [`firmware`] module has
//! the implementations backed by the `uefi` crate:
//!
//! ```no_run
//! use hiidb::firmware::{BootServicesAllocator, HiiDatabaseLocator, RuntimeVariableStore};
//! use hiidb::{ExportConfig, Exporter};
//!
//! # fn run() -> uefi::Status {
//! let config = ExportConfig::default();
//! let mut exporter = Exporter::new(
//!     config,
//!     RuntimeVariableStore,
//!     HiiDatabaseLocator,
//!     BootServicesAllocator::default(),
//! );
//! match exporter.run() {
//!     Ok(outcome) => {
//!         log::info!("{outcome}");
//!         uefi::Status::SUCCESS
//!     }
//!     Err(err) => config.exit_status(&err),
//! }
//! # }
//! ```
//!
//! # Crate features
//!
//! - `mockall`: exports `Mock*` implementations of the capability traits.

#![cfg_attr(all(not(test), not(feature = "mockall")), no_std)]
#![warn(missing_docs, unused)]
#![deny(clippy::all)]

mod config;
mod error;
mod memory;
mod provider;
mod record;
mod snapshot;
mod store;
mod workflow;

pub mod firmware;

pub use config::{ExitCodes, ExportConfig, FieldWidth};
pub use error::{ExportError, SizeNegotiationError};
pub use memory::SnapshotAllocator;
pub use provider::{PackageListProvider, ProviderLocator, SizeProbe};
pub use record::{ExportRecord, RecordError, RecordField};
pub use snapshot::Snapshot;
pub use store::{VariableProbe, VariableStore};
pub use workflow::{ExportSummary, Exporter, Outcome};

#[cfg(any(test, feature = "mockall"))]
pub use memory::MockSnapshotAllocator;
#[cfg(any(test, feature = "mockall"))]
pub use provider::{MockPackageListProvider, MockProviderLocator};
#[cfg(any(test, feature = "mockall"))]
pub use store::MockVariableStore;
