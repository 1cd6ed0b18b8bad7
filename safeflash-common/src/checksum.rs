// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! CRC-32 (ISO HDLC) over RAM buffers and over flash contents.

use crate::controller::FlashController;
use crc::{Crc, CRC_32_ISO_HDLC};

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);
const READ_CHUNK: usize = 256;

/// Compute CRC-32 over a byte slice.
pub fn checksum(bytes: &[u8]) -> u32 {
    CRC32.checksum(bytes)
}

/// Compute CRC-32 over `len` bytes of flash starting at `address`.
pub fn flash_checksum<F: FlashController>(flash: &mut F, address: u32, len: u32) -> u32 {
    let mut digest = CRC32.digest();
    let mut remaining = len as usize;
    let mut addr = address;
    let mut chunk = [0u8; READ_CHUNK];

    while remaining > 0 {
        let n = remaining.min(chunk.len());
        flash.read(addr, &mut chunk[..n]);
        digest.update(&chunk[..n]);
        addr += n as u32;
        remaining -= n;
    }

    digest.finalize()
}
