// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::record::RecordError;
use core::fmt::{self, Display, Formatter};
use uefi::Status;

/// All the ways an export can fail.
///
/// Every error is terminal. Nothing is retried and nothing is rolled back: a
/// snapshot that was allocated before the failure stays allocated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportError {
    /// The variable store couldn't be queried for an existing export.
    StoreProbe(Status),
    /// A size-only query of the variable store reported success, i.e. it
    /// claimed to have returned data into a zero-sized buffer.
    UnexpectedState {
        /// Size reported alongside the success status.
        data_size: usize,
    },
    /// The HII database protocol is not available.
    ProviderUnavailable(Status),
    /// The provider's size reports can't be used. See [`SizeNegotiationError`].
    SizeNegotiation(SizeNegotiationError),
    /// The snapshot buffer couldn't be allocated.
    Allocation {
        /// Requested size in bytes.
        size: usize,
        /// Status returned by the allocator.
        status: Status,
    },
    /// Exporting the package lists into the snapshot buffer failed.
    Export(Status),
    /// The snapshot's size or address doesn't fit into the record.
    RecordEncoding(RecordError),
    /// Writing the record into the variable store failed.
    Persistence(Status),
}

impl ExportError {
    /// A status identifying the class of this error.
    ///
    /// Each variant maps to a different status, which is what the
    /// application exits with under [`ExitCodes::Distinct`]. The firmware
    /// status that caused the error, if any, is part of the variant and of
    /// the `Display` output instead.
    ///
    /// [`ExitCodes::Distinct`]: crate::ExitCodes::Distinct
    #[must_use]
    pub const fn status(&self) -> Status {
        match self {
            Self::StoreProbe(_) => Status::DEVICE_ERROR,
            Self::UnexpectedState { .. } => Status::PROTOCOL_ERROR,
            Self::ProviderUnavailable(_) => Status::NOT_FOUND,
            Self::SizeNegotiation(_) => Status::BAD_BUFFER_SIZE,
            Self::Allocation { .. } => Status::OUT_OF_RESOURCES,
            Self::Export(_) => Status::ABORTED,
            Self::RecordEncoding(_) => Status::BUFFER_TOO_SMALL,
            Self::Persistence(_) => Status::WRITE_PROTECTED,
        }
    }
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::StoreProbe(status) => {
                write!(f, "failed to query for an existing HII export: {status:?}")
            }
            Self::UnexpectedState { data_size } => write!(
                f,
                "size query for the HII export returned {data_size} bytes of data"
            ),
            Self::ProviderUnavailable(status) => {
                write!(f, "HII database protocol could not be found: {status:?}")
            }
            Self::SizeNegotiation(err) => write!(f, "{err}"),
            Self::Allocation { size, status } => write!(
                f,
                "couldn't allocate {size} bytes for the HII export: {status:?}"
            ),
            Self::Export(status) => write!(f, "ExportPackageLists failed: {status:?}"),
            Self::RecordEncoding(err) => write!(f, "can't encode the HII export record: {err}"),
            Self::Persistence(status) => {
                write!(f, "unable to set the HII export variable: {status:?}")
            }
        }
    }
}

impl core::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::SizeNegotiation(err) => Some(err),
            Self::RecordEncoding(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SizeNegotiationError> for ExportError {
    fn from(value: SizeNegotiationError) -> Self {
        Self::SizeNegotiation(value)
    }
}

impl From<RecordError> for ExportError {
    fn from(value: RecordError) -> Self {
        Self::RecordEncoding(value)
    }
}

/// The two-phase size negotiation with the HII database went wrong.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeNegotiationError {
    /// The size probe reported zero bytes.
    Empty {
        /// Status of the probe call.
        status: Status,
    },
    /// The size reported by the export call differs from the probe.
    Changed {
        /// Size reported by the probe, and size of the snapshot buffer.
        probed: usize,
        /// Size reported by the export call.
        reported: usize,
    },
}

impl Display for SizeNegotiationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { status } => write!(
                f,
                "couldn't get size for ExportPackageLists (probe returned 0 bytes, {status:?})"
            ),
            Self::Changed { probed, reported } => write!(
                f,
                "HII database size changed from {probed} to {reported} bytes during export"
            ),
        }
    }
}

impl core::error::Error for SizeNegotiationError {}
