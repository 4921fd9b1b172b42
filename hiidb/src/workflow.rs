// SPDX-License-Identifier: MIT OR Apache-2.0

//! The export workflow.
//!
//! ```text
//! CheckExisting ─┬─ present ──────────────────────────────────────────▶ Done
//!                └─ absent ─▶ LocateProvider ─▶ SizeQuery ─▶ Allocate ─▶ FetchData
//!                                                                          │
//!                                                Done ◀─ Publish ◀─ Encode ◀┘
//! ```
//!
//! Every other edge leads to a terminal [`ExportError`].

use crate::config::ExportConfig;
use crate::error::{ExportError, SizeNegotiationError};
use crate::memory::SnapshotAllocator;
use crate::provider::{PackageListProvider, ProviderLocator};
use crate::record::ExportRecord;
use crate::snapshot::Snapshot;
use crate::store::{VariableProbe, VariableStore};
use core::fmt::{self, Display, Formatter};
use log::{debug, info};
use uefi::Status;
use uefi::runtime::VariableVendor;

/// Result of a successful [`Exporter::run`].
#[derive(Debug)]
pub enum Outcome {
    /// The database was exported and the record published.
    Exported(ExportSummary),
    /// A previous run already published the record. Nothing was done.
    AlreadyExported {
        /// Size of the existing variable.
        size: usize,
    },
}

impl Display for Outcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exported(summary) => write!(f, "{summary}"),
            Self::AlreadyExported { .. } => write!(f, "HII export already exists, nothing to do"),
        }
    }
}

/// What a fresh export published.
#[derive(Debug)]
pub struct ExportSummary {
    /// The published record.
    pub record: ExportRecord,
    /// The exported database.
    pub snapshot: Snapshot,
    /// Name of the published variable.
    pub name: &'static uefi::CStr16,
    /// Vendor of the published variable.
    pub vendor: VariableVendor,
}

impl Display for ExportSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Exported HII packages ({} bytes), var {}-{}",
            self.snapshot.len(),
            self.name,
            self.vendor.0
        )
    }
}

/// Exports the HII database into a variable, once.
///
/// The exporter owns its capabilities and touches no global state, so tests
/// can run it against mocks.
pub struct Exporter<S, L, A> {
    config: ExportConfig,
    store: S,
    locator: L,
    allocator: A,
}

impl<S, L, A> Exporter<S, L, A>
where
    S: VariableStore,
    L: ProviderLocator,
    A: SnapshotAllocator,
{
    /// Create an exporter from its configuration and capabilities.
    pub fn new(config: ExportConfig, store: S, locator: L, allocator: A) -> Self {
        Self {
            config,
            store,
            locator,
            allocator,
        }
    }

    /// The configuration this exporter runs with.
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Give back the capabilities.
    pub fn into_parts(self) -> (S, L, A) {
        (self.store, self.locator, self.allocator)
    }

    /// Run the export.
    ///
    /// If the variable already exists this returns
    /// [`Outcome::AlreadyExported`] without contacting the HII database.
    /// The existence check and the publication are not atomic; the exporter
    /// relies on running once, single-threaded, during boot.
    pub fn run(&mut self) -> Result<Outcome, ExportError> {
        if let Some(size) = self.existing_export()? {
            info!("HII export already exists, nothing to do");
            return Ok(Outcome::AlreadyExported { size });
        }

        let snapshot = self.export_database()?;
        let record = ExportRecord::encode(
            snapshot.len(),
            snapshot.address(),
            self.config.field_width(),
        )?;
        self.publish(&record)?;

        let summary = ExportSummary {
            record,
            snapshot,
            name: self.config.name(),
            vendor: *self.config.vendor(),
        };
        info!("{summary}");
        Ok(Outcome::Exported(summary))
    }

    /// Size of the published variable, if there is one.
    fn existing_export(&mut self) -> Result<Option<usize>, ExportError> {
        let probe = self.store.probe(self.config.name(), self.config.vendor());
        debug!("variable probe: {probe:?}");
        match probe {
            VariableProbe::NotFound => Ok(None),
            VariableProbe::BufferTooSmall { data_size } => Ok(Some(data_size)),
            VariableProbe::Success { data_size } => {
                Err(ExportError::UnexpectedState { data_size })
            }
            VariableProbe::Error(status) => Err(ExportError::StoreProbe(status)),
        }
    }

    /// Copy all HII package lists into a fresh snapshot.
    fn export_database(&mut self) -> Result<Snapshot, ExportError> {
        let mut provider = self
            .locator
            .locate()
            .map_err(|err| ExportError::ProviderUnavailable(err.status()))?;

        let probe = provider.probe_size();
        debug!("ExportPackageLists size probe: {probe:?}");
        if probe.size == 0 {
            return Err(SizeNegotiationError::Empty {
                status: probe.status,
            }
            .into());
        }

        let size = probe.size;
        let mut snapshot = self
            .allocator
            .allocate(self.config.memory_type(), size)
            .map_err(|err| ExportError::Allocation {
                size,
                status: err.status(),
            })?;
        debug!("allocated {snapshot:?}");

        match provider.export_into(snapshot.as_mut_slice()) {
            Ok(written) if written == size => Ok(snapshot),
            Ok(written) => Err(SizeNegotiationError::Changed {
                probed: size,
                reported: written,
            }
            .into()),
            Err(err) if err.status() == Status::BUFFER_TOO_SMALL => {
                Err(SizeNegotiationError::Changed {
                    probed: size,
                    reported: err.data().unwrap_or(size),
                }
                .into())
            }
            Err(err) => Err(ExportError::Export(err.status())),
        }
    }

    fn publish(&mut self, record: &ExportRecord) -> Result<(), ExportError> {
        self.store
            .publish(
                self.config.name(),
                self.config.vendor(),
                self.config.attributes(),
                &record.to_bytes(),
            )
            .map_err(|err| ExportError::Persistence(err.status()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldWidth;
    use crate::memory::MockSnapshotAllocator;
    use crate::provider::{MockPackageListProvider, MockProviderLocator, SizeProbe};
    use crate::record::{RecordError, RecordField};
    use crate::store::MockVariableStore;
    use mockall::predicate::eq;
    use uefi::cstr16;
    use uefi::boot::MemoryType;
    use uefi::runtime::VariableAttributes;

    type TestExporter = Exporter<MockVariableStore, MockProviderLocator, MockSnapshotAllocator>;

    /// Host heap addresses may not fit into 32 bits, so most tests mask.
    fn config() -> ExportConfig {
        ExportConfig::new().with_field_width(FieldWidth::Truncate)
    }

    fn exporter(
        store: MockVariableStore,
        locator: MockProviderLocator,
        allocator: MockSnapshotAllocator,
    ) -> TestExporter {
        Exporter::new(config(), store, locator, allocator)
    }

    fn absent_store() -> MockVariableStore {
        let mut store = MockVariableStore::new();
        store
            .expect_probe()
            .times(1)
            .return_const(VariableProbe::NotFound);
        store
    }

    fn leaked_snapshot(size: usize) -> Snapshot {
        Snapshot::from_static(Box::leak(vec![0; size].into_boxed_slice()))
    }

    fn leaking_allocator() -> MockSnapshotAllocator {
        let mut allocator = MockSnapshotAllocator::new();
        allocator
            .expect_allocate()
            .returning(|_, size| Ok(leaked_snapshot(size)));
        allocator
    }

    /// A provider of `size` bytes of `0x5a`.
    fn provider(size: usize) -> MockPackageListProvider {
        let mut provider = MockPackageListProvider::new();
        provider.expect_probe_size().times(1).return_const(SizeProbe {
            status: Status::BUFFER_TOO_SMALL,
            size,
        });
        provider
            .expect_export_into()
            .times(1)
            .returning(move |buffer| {
                assert_eq!(buffer.len(), size);
                buffer.fill(0x5a);
                Ok(size)
            });
        provider
    }

    fn locator(provider: MockPackageListProvider) -> MockProviderLocator {
        let mut locator = MockProviderLocator::new();
        let mut provider = Some(provider);
        locator
            .expect_locate()
            .times(1)
            .returning(move || Ok(provider.take().unwrap()));
        locator
    }

    fn unreachable_locator() -> MockProviderLocator {
        let mut locator = MockProviderLocator::new();
        locator.expect_locate().never();
        locator
    }

    fn unreachable_allocator() -> MockSnapshotAllocator {
        let mut allocator = MockSnapshotAllocator::new();
        allocator.expect_allocate().never();
        allocator
    }

    #[test]
    fn exports_and_publishes() {
        let mut store = absent_store();
        store
            .expect_publish()
            .withf(|name, vendor, attributes, data| {
                name.to_u16_slice_with_nul() == cstr16!("HiiDB").to_u16_slice_with_nul()
                    && vendor.0 == ExportConfig::DEFAULT_VENDOR.0
                    && attributes.contains(
                        VariableAttributes::BOOTSERVICE_ACCESS | VariableAttributes::RUNTIME_ACCESS,
                    )
                    && data.len() == ExportRecord::SIZE
            })
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let mut allocator = MockSnapshotAllocator::new();
        allocator
            .expect_allocate()
            .with(eq(MemoryType::RUNTIME_SERVICES_DATA), eq(4096))
            .times(1)
            .returning(|_, size| Ok(leaked_snapshot(size)));

        let mut exporter = exporter(store, locator(provider(4096)), allocator);
        let Outcome::Exported(summary) = exporter.run().unwrap() else {
            panic!("expected a fresh export");
        };

        assert_eq!(summary.snapshot.len(), 4096);
        assert!(summary.snapshot.bytes().iter().all(|&b| b == 0x5a));
        assert_eq!(summary.record.length, 4096);
        assert_eq!(
            summary.record.locator,
            (summary.snapshot.address() & 0xffff_ffff) as u32
        );
        assert!(summary.to_string().contains("4096 bytes"));
        assert!(
            summary
                .to_string()
                .ends_with("var HiiDB-ef9fc172-a1b2-4693-b327-6d32fc416042")
        );
    }

    #[test]
    fn existing_export_is_a_no_op() {
        let mut store = MockVariableStore::new();
        store
            .expect_probe()
            .times(1)
            .return_const(VariableProbe::BufferTooSmall { data_size: 8 });
        store.expect_publish().never();

        let mut exporter = exporter(store, unreachable_locator(), unreachable_allocator());
        let outcome = exporter.run().unwrap();
        assert!(matches!(outcome, Outcome::AlreadyExported { size: 8 }));
        assert_eq!(outcome.to_string(), "HII export already exists, nothing to do");
    }

    #[test]
    fn probe_success_is_unexpected() {
        let mut store = MockVariableStore::new();
        store
            .expect_probe()
            .return_const(VariableProbe::Success { data_size: 8 });
        store.expect_publish().never();

        let mut exporter = exporter(store, unreachable_locator(), unreachable_allocator());
        assert_eq!(
            exporter.run().unwrap_err(),
            ExportError::UnexpectedState { data_size: 8 }
        );
    }

    #[test]
    fn probe_failure() {
        let mut store = MockVariableStore::new();
        store
            .expect_probe()
            .return_const(VariableProbe::Error(Status::DEVICE_ERROR));
        store.expect_publish().never();

        let mut exporter = exporter(store, unreachable_locator(), unreachable_allocator());
        assert_eq!(
            exporter.run().unwrap_err(),
            ExportError::StoreProbe(Status::DEVICE_ERROR)
        );
    }

    #[test]
    fn provider_missing() {
        let mut store = absent_store();
        store.expect_publish().never();
        let mut locator = MockProviderLocator::new();
        locator
            .expect_locate()
            .times(1)
            .returning(|| Err(Status::NOT_FOUND.into()));

        let mut exporter = exporter(store, locator, unreachable_allocator());
        assert_eq!(
            exporter.run().unwrap_err(),
            ExportError::ProviderUnavailable(Status::NOT_FOUND)
        );
    }

    #[test]
    fn zero_size_is_rejected_before_allocating() {
        let mut store = absent_store();
        store.expect_publish().never();
        let mut provider = MockPackageListProvider::new();
        provider.expect_probe_size().return_const(SizeProbe {
            status: Status::SUCCESS,
            size: 0,
        });
        provider.expect_export_into().never();

        let mut exporter = exporter(store, locator(provider), unreachable_allocator());
        assert_eq!(
            exporter.run().unwrap_err(),
            ExportError::SizeNegotiation(SizeNegotiationError::Empty {
                status: Status::SUCCESS
            })
        );
    }

    #[test]
    fn allocation_failure() {
        let mut store = absent_store();
        store.expect_publish().never();
        let mut provider = MockPackageListProvider::new();
        provider.expect_probe_size().return_const(SizeProbe {
            status: Status::BUFFER_TOO_SMALL,
            size: 4096,
        });
        provider.expect_export_into().never();
        let mut allocator = MockSnapshotAllocator::new();
        allocator
            .expect_allocate()
            .times(1)
            .returning(|_, _| Err(Status::OUT_OF_RESOURCES.into()));

        let mut exporter = exporter(store, locator(provider), allocator);
        assert_eq!(
            exporter.run().unwrap_err(),
            ExportError::Allocation {
                size: 4096,
                status: Status::OUT_OF_RESOURCES
            }
        );
    }

    #[test]
    fn export_failure() {
        let mut store = absent_store();
        store.expect_publish().never();
        let mut provider = MockPackageListProvider::new();
        provider.expect_probe_size().return_const(SizeProbe {
            status: Status::BUFFER_TOO_SMALL,
            size: 4096,
        });
        provider
            .expect_export_into()
            .returning(|_| Err(uefi::Error::new(Status::INVALID_PARAMETER, None)));

        let mut exporter = exporter(store, locator(provider), leaking_allocator());
        assert_eq!(
            exporter.run().unwrap_err(),
            ExportError::Export(Status::INVALID_PARAMETER)
        );
    }

    #[test]
    fn growth_between_probe_and_export() {
        let mut store = absent_store();
        store.expect_publish().never();
        let mut provider = MockPackageListProvider::new();
        provider.expect_probe_size().return_const(SizeProbe {
            status: Status::BUFFER_TOO_SMALL,
            size: 4096,
        });
        provider
            .expect_export_into()
            .returning(|_| Err(uefi::Error::new(Status::BUFFER_TOO_SMALL, Some(8192))));

        let mut exporter = exporter(store, locator(provider), leaking_allocator());
        assert_eq!(
            exporter.run().unwrap_err(),
            ExportError::SizeNegotiation(SizeNegotiationError::Changed {
                probed: 4096,
                reported: 8192
            })
        );
    }

    #[test]
    fn shrink_between_probe_and_export() {
        let mut store = absent_store();
        store.expect_publish().never();
        let mut provider = MockPackageListProvider::new();
        provider.expect_probe_size().return_const(SizeProbe {
            status: Status::BUFFER_TOO_SMALL,
            size: 4096,
        });
        provider.expect_export_into().returning(|_| Ok(2048));

        let mut exporter = exporter(store, locator(provider), leaking_allocator());
        assert_eq!(
            exporter.run().unwrap_err(),
            ExportError::SizeNegotiation(SizeNegotiationError::Changed {
                probed: 4096,
                reported: 2048
            })
        );
    }

    #[test]
    fn publish_failure() {
        let mut store = absent_store();
        store
            .expect_publish()
            .times(1)
            .returning(|_, _, _, _| Err(Status::OUT_OF_RESOURCES.into()));

        let mut exporter = exporter(store, locator(provider(64)), leaking_allocator());
        assert_eq!(
            exporter.run().unwrap_err(),
            ExportError::Persistence(Status::OUT_OF_RESOURCES)
        );
    }

    #[test]
    fn checked_width_fails_loudly() {
        let mut store = absent_store();
        store.expect_publish().returning(|_, _, _, _| Ok(()));

        let mut exporter = Exporter::new(
            ExportConfig::new(),
            store,
            locator(provider(64)),
            leaking_allocator(),
        );
        match exporter.run() {
            Ok(Outcome::Exported(summary)) => {
                assert!(summary.snapshot.address() <= u32::MAX as usize);
                assert_eq!(summary.record.locator as usize, summary.snapshot.address());
            }
            Err(ExportError::RecordEncoding(RecordError::FieldOverflow { field, value })) => {
                assert_eq!(field, RecordField::Locator);
                assert!(value > u64::from(u32::MAX));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
