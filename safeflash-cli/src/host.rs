// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Host stand-ins for the target: terminal console, process-level reset and halt,
//! and a file-backed flash device.

use std::fmt;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use embedded_hal::delay::DelayNs;
use safeflash_common::sim::SimFlash;
use safeflash_common::{Console, FlashLayout, System};

/// Exit status after a halt that needs an external programmer.
pub const EXIT_UNRECOVERABLE: i32 = 3;

/// Console on stdin/stdout.
pub struct StdConsole;

impl fmt::Write for StdConsole {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let mut out = io::stdout().lock();
        out.write_all(s.as_bytes()).map_err(|_| fmt::Error)?;
        out.flush().map_err(|_| fmt::Error)
    }
}

impl Console for StdConsole {
    fn write_byte(&mut self, byte: u8) {
        let mut out = io::stdout().lock();
        out.write_all(&[byte]).and_then(|_| out.flush()).ok();
    }

    fn read_byte(&mut self) -> Option<u8> {
        let mut byte = [0u8; 1];
        match io::stdin().lock().read(&mut byte) {
            Ok(1) => Some(byte[0]),
            _ => None,
        }
    }
}

/// The host process plays the machine: reset and halt end the process.
pub struct HostSystem;

impl System for HostSystem {
    fn mask_interrupts(&mut self) {}

    fn warm_reset(&mut self) -> ! {
        std::process::exit(0);
    }

    fn halt(&mut self) -> ! {
        std::process::exit(EXIT_UNRECOVERABLE);
    }
}

pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}

/// Load the simulated flash device from `path`. The file must be exactly the flash capacity.
pub fn open_device(path: &Path, layout: FlashLayout) -> Result<SimFlash> {
    let contents =
        fs::read(path).with_context(|| format!("Failed to read device {}", path.display()))?;
    if contents.len() != layout.capacity as usize {
        bail!(
            "Device {} holds {} bytes, expected {}",
            path.display(),
            contents.len(),
            layout.capacity
        );
    }
    Ok(SimFlash::new(layout, contents))
}

/// Write the flash contents back to `path`.
pub fn save_device(path: &Path, flash: &SimFlash) -> Result<()> {
    fs::write(path, flash.contents())
        .with_context(|| format!("Failed to write device {}", path.display()))
}
