// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Checks a staged image against the flash capacity and the operator's checksum.

use crate::{checksum, error::Error, layout::FlashLayout};

/// A staged image that passed pre-flight validation.
#[derive(Debug, Clone, Copy)]
pub struct FirmwareImage<'a> {
    bytes: &'a [u8],
    expected_crc: u32,
    crc: u32,
}

impl<'a> FirmwareImage<'a> {
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn len(&self) -> u32 {
        self.bytes.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn expected_crc(&self) -> u32 {
        self.expected_crc
    }

    /// Checksum computed over the staged bytes.
    pub fn crc(&self) -> u32 {
        self.crc
    }
}

/// Parse a hex string (with or without 0x prefix) into a u32.
pub fn parse_checksum(text: &str) -> Result<u32, Error> {
    let text = text.trim();
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    // from_str_radix accepts a leading '+', a checksum literal does not
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::InvalidChecksumLiteral);
    }
    u32::from_str_radix(digits, 16).map_err(|_| Error::InvalidChecksumLiteral)
}

/// Validate a staged image. Touches nothing but the staged bytes.
pub fn validate<'a>(
    staged: &'a [u8],
    expected_crc: u32,
    layout: &FlashLayout,
) -> Result<FirmwareImage<'a>, Error> {
    if staged.is_empty() {
        return Err(Error::EmptyImage);
    }

    if staged.len() > layout.capacity as usize {
        return Err(Error::ImageTooLarge {
            size: staged.len(),
            capacity: layout.capacity,
        });
    }

    let actual = checksum::checksum(staged);
    if actual != expected_crc {
        return Err(Error::ChecksumMismatch {
            expected: expected_crc,
            actual,
        });
    }

    Ok(FirmwareImage {
        bytes: staged,
        expected_crc,
        crc: actual,
    })
}
