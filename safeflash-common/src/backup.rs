// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Snapshot of the current flash contents, taken before the first erase.

use crate::{
    checksum,
    controller::FlashController,
    error::Error,
    layout::FlashLayout,
};

/// Full-capacity copy of flash and its checksum. Immutable once captured.
#[derive(Debug, Clone, Copy)]
pub struct BackupImage<'a> {
    bytes: &'a [u8],
    crc: u32,
}

impl<'a> BackupImage<'a> {
    /// Copy the whole flash region into `buffer` and checksum the copy.
    ///
    /// The copy is accepted only if flash, read again, yields the same checksum.
    pub fn capture<F: FlashController>(
        flash: &mut F,
        layout: &FlashLayout,
        buffer: &'a mut [u8],
    ) -> Result<Self, Error> {
        let capacity = layout.capacity as usize;
        if buffer.len() < capacity {
            return Err(Error::BackupBufferTooSmall {
                len: buffer.len(),
                capacity: layout.capacity,
            });
        }

        let copy = &mut buffer[..capacity];
        flash.read(layout.base, copy);
        let crc = checksum::checksum(copy);

        let flash_crc = checksum::flash_checksum(flash, layout.base, layout.capacity);
        if flash_crc != crc {
            #[cfg(feature = "defmt")]
            defmt::error!(
                "Backup: copy crc 0x{:08x} != flash crc 0x{:08x}",
                crc,
                flash_crc
            );
            return Err(Error::BackupUnreadable {
                copy: crc,
                flash: flash_crc,
            });
        }

        #[cfg(feature = "defmt")]
        defmt::println!("Backup: {} bytes, crc 0x{:08x}", capacity, crc);

        Ok(Self { bytes: copy, crc })
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn crc(&self) -> u32 {
        self.crc
    }
}
