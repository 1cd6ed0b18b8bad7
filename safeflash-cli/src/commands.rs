// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! The flash command: load, validate, confirm, program, reset.

use std::path::Path;

use anyhow::Result;
use safeflash_common::{Error, ResetSequencer, Session, AGON_FLASH, AGON_STAGING};

use crate::host::{self, HostSystem, StdConsole, StdDelay};
use crate::loader;

/// Reprogram the device file at `device` with the image at `file`.
///
/// Returns only when the run stops before the destructive phase. Afterwards the
/// process ends through a reset (exit 0) or a halt (exit 3).
pub fn flash(file: &Path, expected_crc: u32, device: &Path) -> Result<()> {
    println!("Boot firmware upgrade utility v{}", env!("CARGO_PKG_VERSION"));
    println!();

    let layout = AGON_FLASH;
    let staging = AGON_STAGING;

    // one byte past flash capacity so an oversize file fails the capacity check
    let mut image_buffer = vec![0u8; layout.capacity.max(staging.size) as usize + 1];
    let size = loader::load_file(file, &mut image_buffer, staging.load_block as usize)?;

    let flash = host::open_device(device, layout)?;
    let mut session = Session::new(flash, StdConsole, layout);

    let image = session.preflight(&image_buffer[..size], expected_crc)?;

    match session.confirm() {
        Ok(()) => {}
        Err(Error::Declined) => return Ok(()),
        Err(e) => return Err(e.into()),
    }

    let mut backup_buffer = vec![0u8; staging.size as usize];
    let mut system = HostSystem;
    let completion = session.program(&mut system, image, &mut backup_buffer)?;

    host::save_device(device, session.flash())?;

    session.finish(
        &completion,
        &ResetSequencer::default(),
        &mut system,
        &mut StdDelay,
    )
}
