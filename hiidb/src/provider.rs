// SPDX-License-Identifier: MIT OR Apache-2.0

use uefi::Status;

#[cfg(any(test, feature = "mockall"))]
use mockall::automock;

/// Result of calling `ExportPackageLists` without a buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SizeProbe {
    /// Status of the call, normally [`Status::BUFFER_TOO_SMALL`].
    pub status: Status,
    /// Number of bytes required to hold all package lists.
    pub size: usize,
}

/// Exports the contents of the HII database.
#[cfg_attr(any(test, feature = "mockall"), automock)]
pub trait PackageListProvider {
    /// Ask for the size of all package lists by exporting into a null
    /// buffer.
    fn probe_size(&mut self) -> SizeProbe;

    /// Export all package lists into `buffer`, returning the number of bytes
    /// written.
    ///
    /// A [`Status::BUFFER_TOO_SMALL`] error carries the size the provider
    /// needs now.
    fn export_into(&mut self, buffer: &mut [u8]) -> uefi::Result<usize, Option<usize>>;
}

/// Finds the [`PackageListProvider`].
#[cfg_attr(
    any(test, feature = "mockall"),
    automock(type Provider = MockPackageListProvider;)
)]
pub trait ProviderLocator {
    /// The provider this locator finds.
    type Provider: PackageListProvider;

    /// Locate the provider, failing if the platform doesn't have one.
    fn locate(&mut self) -> uefi::Result<Self::Provider>;
}
