// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::store::{VariableProbe, VariableStore};
use core::ptr::{self, NonNull};
use uefi::runtime::{self, VariableAttributes, VariableVendor};
use uefi::{CStr16, Status, table};
use uefi_raw::table::runtime::RuntimeServices;

/// Variable store backed by the firmware's runtime services.
#[derive(Clone, Copy, Debug, Default)]
pub struct RuntimeVariableStore;

fn runtime_services_raw() -> Option<NonNull<RuntimeServices>> {
    let st = table::system_table_raw()?;
    // SAFETY: valid per requirements of `set_system_table`.
    let st = unsafe { st.as_ref() };
    NonNull::new(st.runtime_services)
}

impl VariableStore for RuntimeVariableStore {
    fn probe(&mut self, name: &CStr16, vendor: &VariableVendor) -> VariableProbe {
        let Some(rt) = runtime_services_raw() else {
            return VariableProbe::Error(Status::NOT_READY);
        };
        let rt = unsafe { rt.as_ref() };

        let mut data_size = 0;
        // SAFETY: `name` is null-terminated. With a zero size and a null
        // buffer the firmware only writes `data_size`.
        let status = unsafe {
            (rt.get_variable)(
                name.as_ptr().cast(),
                &vendor.0,
                ptr::null_mut(),
                &mut data_size,
                ptr::null_mut(),
            )
        };
        VariableProbe::from_status(status, data_size)
    }

    fn publish(
        &mut self,
        name: &CStr16,
        vendor: &VariableVendor,
        attributes: VariableAttributes,
        data: &[u8],
    ) -> uefi::Result {
        runtime::set_variable(name, vendor, attributes, data)
    }
}
