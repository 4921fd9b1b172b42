// SPDX-License-Identifier: MIT OR Apache-2.0

//! The fixed-layout record published in the `HiiDB` variable.

use crate::config::FieldWidth;
use core::fmt::{self, Display, Formatter};
use log::warn;

/// Location and size of an exported HII database snapshot.
///
/// The variable store imposes no schema on variable contents, so this layout
/// is the whole interface to the reader on the other side of
/// `ExitBootServices`: two little-endian `u32`s, no version tag, no checksum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct ExportRecord {
    /// Size of the snapshot in bytes.
    pub length: u32,
    /// Physical address of the snapshot.
    pub locator: u32,
}

const _: () = assert!(size_of::<ExportRecord>() == ExportRecord::SIZE);

impl ExportRecord {
    /// Size of the encoded record in bytes.
    pub const SIZE: usize = 8;

    /// Build a record for a snapshot of `length` bytes at `address`.
    ///
    /// Both values must fit into 32 bits. With [`FieldWidth::Checked`] a value
    /// that doesn't fit is an error; with [`FieldWidth::Truncate`] the upper
    /// bits are masked off and a warning is logged.
    pub fn encode(length: usize, address: usize, width: FieldWidth) -> Result<Self, RecordError> {
        Ok(Self {
            length: narrow(RecordField::Length, length as u64, width)?,
            locator: narrow(RecordField::Locator, address as u64, width)?,
        })
    }

    /// Serialize into the on-variable representation.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0; Self::SIZE];
        bytes[..4].copy_from_slice(&self.length.to_le_bytes());
        bytes[4..].copy_from_slice(&self.locator.to_le_bytes());
        bytes
    }

    /// Parse the on-variable representation.
    ///
    /// The variable must be exactly [`Self::SIZE`] bytes long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RecordError> {
        let bytes: &[u8; Self::SIZE] = bytes
            .try_into()
            .map_err(|_| RecordError::InvalidLength { len: bytes.len() })?;
        let [l0, l1, l2, l3, p0, p1, p2, p3] = *bytes;
        Ok(Self {
            length: u32::from_le_bytes([l0, l1, l2, l3]),
            locator: u32::from_le_bytes([p0, p1, p2, p3]),
        })
    }
}

fn narrow(field: RecordField, value: u64, width: FieldWidth) -> Result<u32, RecordError> {
    match (u32::try_from(value), width) {
        (Ok(narrowed), _) => Ok(narrowed),
        (Err(_), FieldWidth::Checked) => Err(RecordError::FieldOverflow { field, value }),
        (Err(_), FieldWidth::Truncate) => {
            let narrowed = (value & 0xffff_ffff) as u32;
            warn!("{field} {value:#x} truncated to {narrowed:#x}");
            Ok(narrowed)
        }
    }
}

/// A field of an [`ExportRecord`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordField {
    /// [`ExportRecord::length`]
    Length,
    /// [`ExportRecord::locator`]
    Locator,
}

impl Display for RecordField {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Length => write!(f, "length"),
            Self::Locator => write!(f, "locator"),
        }
    }
}

/// Errors while encoding or decoding an [`ExportRecord`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordError {
    /// The value doesn't fit into the 32-bit field.
    FieldOverflow {
        /// The field being encoded.
        field: RecordField,
        /// The full-width value.
        value: u64,
    },
    /// The encoded record has the wrong size.
    InvalidLength {
        /// Actual size of the input.
        len: usize,
    },
}

impl Display for RecordError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::FieldOverflow { field, value } => {
                write!(f, "{field} {value:#x} does not fit into 32 bits")
            }
            Self::InvalidLength { len } => write!(
                f,
                "record is {len} bytes long, expected {}",
                ExportRecord::SIZE
            ),
        }
    }
}

impl core::error::Error for RecordError {}
