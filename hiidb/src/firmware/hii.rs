// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::provider::{PackageListProvider, ProviderLocator, SizeProbe};
use core::ffi::c_void;
use core::ptr;
use log::debug;
use uefi::boot::{self, OpenProtocolAttributes, OpenProtocolParams, ScopedProtocol};
use uefi::StatusExt;
use uefi::proto::unsafe_protocol;
use uefi_raw::protocol::hii::HiiHandle;
use uefi_raw::protocol::hii::database::HiiDatabaseProtocol;

/// The HII Database Protocol, as far as exporting it is concerned.
///
/// Unlike the `uefi` crate's `HiiDatabase`, this exports into a
/// caller-provided buffer, so the snapshot can live in memory that survives
/// `ExitBootServices`.
#[derive(Debug)]
#[repr(transparent)]
#[unsafe_protocol(HiiDatabaseProtocol::GUID)]
pub struct HiiDatabaseExport(HiiDatabaseProtocol);

impl HiiDatabaseExport {
    /// Call `ExportPackageLists` for all package lists.
    ///
    /// Returns the status and the buffer size reported by the firmware.
    fn export_package_lists(&self, buffer: Option<&mut [u8]>) -> (uefi::Status, usize) {
        let (buf, mut size) = match buffer {
            Some(buf) => (buf.as_mut_ptr(), buf.len()),
            None => (ptr::null_mut(), 0),
        };
        // A null handle selects every package list.
        let all = ptr::null_mut::<c_void>() as HiiHandle;
        // SAFETY: `buf` is either null with a size of zero or valid for
        // `size` bytes.
        let status =
            unsafe { (self.0.export_package_lists)(&self.0, all, &mut size, buf.cast()) };
        (status, size)
    }
}

/// Locates the firmware's HII database.
#[derive(Clone, Copy, Debug, Default)]
pub struct HiiDatabaseLocator;

impl ProviderLocator for HiiDatabaseLocator {
    type Provider = HiiExportProvider;

    fn locate(&mut self) -> uefi::Result<Self::Provider> {
        let handle = boot::get_handle_for_protocol::<HiiDatabaseExport>()?;
        // SAFETY: GetProtocol doesn't affect other users of the database, and
        // the interface is only used while boot services are active.
        let proto = unsafe {
            boot::open_protocol::<HiiDatabaseExport>(
                OpenProtocolParams {
                    handle,
                    agent: boot::image_handle(),
                    controller: None,
                },
                OpenProtocolAttributes::GetProtocol,
            )
        }?;
        debug!("found HII database on {handle:?}");
        Ok(HiiExportProvider { proto })
    }
}

/// The firmware's HII database, opened for export.
#[derive(Debug)]
pub struct HiiExportProvider {
    proto: ScopedProtocol<HiiDatabaseExport>,
}

impl PackageListProvider for HiiExportProvider {
    fn probe_size(&mut self) -> SizeProbe {
        let (status, size) = self.proto.export_package_lists(None);
        SizeProbe { status, size }
    }

    fn export_into(&mut self, buffer: &mut [u8]) -> uefi::Result<usize, Option<usize>> {
        let (status, size) = self.proto.export_package_lists(Some(buffer));
        status.to_result_with(|| size, |_| Some(size))
    }
}
