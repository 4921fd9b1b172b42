// SPDX-License-Identifier: MIT OR Apache-2.0

//! Export configuration.

use crate::error::ExportError;
use uefi::boot::MemoryType;
use uefi::runtime::{VariableAttributes, VariableVendor};
use uefi::{CStr16, Status, cstr16};
use uefi_raw::protocol::hii::database::HiiDatabaseProtocol;

/// How values wider than 32 bits are narrowed into an [`ExportRecord`].
///
/// [`ExportRecord`]: crate::ExportRecord
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FieldWidth {
    /// Fail the export if the snapshot's size or address doesn't fit.
    #[default]
    Checked,
    /// Mask off the upper bits. The published locator is then only usable
    /// if the platform's addresses fit into 32 bits anyway.
    Truncate,
}

/// Which [`Status`] the application exits with on failure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExitCodes {
    /// Every failure exits with [`Status::UNSUPPORTED`].
    #[default]
    Compatible,
    /// Each error class exits with its own status, see
    /// [`ExportError::status`].
    Distinct,
}

/// Parameters of an export.
///
/// `BOOTSERVICE_ACCESS` and `RUNTIME_ACCESS` are always part of the
/// attributes the variable is published with: the record has a reader
/// before and a reader after `ExitBootServices`.
#[derive(Clone, Copy, Debug)]
pub struct ExportConfig {
    name: &'static CStr16,
    vendor: VariableVendor,
    attributes: VariableAttributes,
    memory_type: MemoryType,
    field_width: FieldWidth,
    exit_codes: ExitCodes,
}

impl ExportConfig {
    /// Default name of the published variable.
    pub const DEFAULT_NAME: &'static CStr16 = cstr16!("HiiDB");

    /// Default vendor of the published variable: the HII database protocol
    /// GUID.
    pub const DEFAULT_VENDOR: VariableVendor = VariableVendor(HiiDatabaseProtocol::GUID);

    /// Attributes every published variable carries.
    pub const REQUIRED_ATTRIBUTES: VariableAttributes = VariableAttributes::BOOTSERVICE_ACCESS
        .union(VariableAttributes::RUNTIME_ACCESS);

    /// Default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            name: Self::DEFAULT_NAME,
            vendor: Self::DEFAULT_VENDOR,
            attributes: Self::REQUIRED_ATTRIBUTES,
            memory_type: MemoryType::RUNTIME_SERVICES_DATA,
            field_width: FieldWidth::Checked,
            exit_codes: ExitCodes::Compatible,
        }
    }

    /// Publish under `name` instead of `HiiDB`.
    #[must_use]
    pub const fn with_name(mut self, name: &'static CStr16) -> Self {
        self.name = name;
        self
    }

    /// Publish under `vendor` instead of the HII database protocol GUID.
    #[must_use]
    pub const fn with_vendor(mut self, vendor: VariableVendor) -> Self {
        self.vendor = vendor;
        self
    }

    /// Add `attributes` on top of [`Self::REQUIRED_ATTRIBUTES`].
    #[must_use]
    pub const fn with_attributes(mut self, attributes: VariableAttributes) -> Self {
        self.attributes = attributes.union(Self::REQUIRED_ATTRIBUTES);
        self
    }

    /// Allocate the snapshot as `memory_type`.
    ///
    /// The memory type must stay mapped and untouched after
    /// `ExitBootServices`, otherwise the published locator dangles.
    #[must_use]
    pub const fn with_memory_type(mut self, memory_type: MemoryType) -> Self {
        self.memory_type = memory_type;
        self
    }

    /// Set the narrowing policy for the record fields.
    #[must_use]
    pub const fn with_field_width(mut self, field_width: FieldWidth) -> Self {
        self.field_width = field_width;
        self
    }

    /// Set how failures map to exit statuses.
    #[must_use]
    pub const fn with_exit_codes(mut self, exit_codes: ExitCodes) -> Self {
        self.exit_codes = exit_codes;
        self
    }

    /// Name of the published variable.
    #[must_use]
    pub const fn name(&self) -> &'static CStr16 {
        self.name
    }

    /// Vendor of the published variable.
    #[must_use]
    pub const fn vendor(&self) -> &VariableVendor {
        &self.vendor
    }

    /// Attributes of the published variable.
    #[must_use]
    pub const fn attributes(&self) -> VariableAttributes {
        self.attributes
    }

    /// Memory type of the snapshot allocation.
    #[must_use]
    pub const fn memory_type(&self) -> MemoryType {
        self.memory_type
    }

    /// Narrowing policy for the record fields.
    #[must_use]
    pub const fn field_width(&self) -> FieldWidth {
        self.field_width
    }

    /// Exit status policy.
    #[must_use]
    pub const fn exit_codes(&self) -> ExitCodes {
        self.exit_codes
    }

    /// Exit status for a failed export.
    #[must_use]
    pub fn exit_status(&self, err: &ExportError) -> Status {
        match self.exit_codes {
            ExitCodes::Compatible => Status::UNSUPPORTED,
            ExitCodes::Distinct => err.status(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self::new()
    }
}
