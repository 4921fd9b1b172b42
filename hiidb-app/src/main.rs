// SPDX-License-Identifier: MIT OR Apache-2.0

//! Publishes a snapshot of the HII database in the `HiiDB` variable.
//!
//! Run it once per boot, before the OS loader, e.g. from the UEFI shell or as
//! a `Driver####`/`SysPrep####` entry. Running it again is harmless: an
//! existing export is left alone.

#![no_main]
#![no_std]

use cfg_if::cfg_if;
use hiidb::firmware::{BootServicesAllocator, HiiDatabaseLocator, Placement, RuntimeVariableStore};
use hiidb::{ExitCodes, ExportConfig, Exporter, FieldWidth};
use log::error;
use uefi::prelude::*;

fn config() -> ExportConfig {
    let config = ExportConfig::new();

    cfg_if! {
        if #[cfg(feature = "truncate-record")] {
            let config = config.with_field_width(FieldWidth::Truncate);
        } else {
            let config = config.with_field_width(FieldWidth::Checked);
        }
    }

    cfg_if! {
        if #[cfg(feature = "distinct-exit-codes")] {
            config.with_exit_codes(ExitCodes::Distinct)
        } else {
            config.with_exit_codes(ExitCodes::Compatible)
        }
    }
}

fn placement() -> Placement {
    if cfg!(feature = "low-memory") {
        Placement::Below4GiB
    } else {
        Placement::Pool
    }
}

#[entry]
fn main() -> Status {
    if let Err(err) = uefi::helpers::init() {
        return err.status();
    }

    let config = config();
    let mut exporter = Exporter::new(
        config,
        RuntimeVariableStore,
        HiiDatabaseLocator,
        BootServicesAllocator::new(placement()),
    );

    match exporter.run() {
        Ok(_) => Status::SUCCESS,
        Err(err) => {
            error!("{err}");
            config.exit_status(&err)
        }
    }
}
