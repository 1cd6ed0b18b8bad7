// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Errors raised before the destructive phase begins.
//!
//! Every variant leaves flash in its original state. Failures after the first
//! erase are handled inside the program state machine and never surface here.

use core::fmt;

/// Reasons a run stops while flash is still untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The checksum literal is not an unsigned hexadecimal 32-bit value.
    InvalidChecksumLiteral,
    /// The staged image contains no bytes.
    EmptyImage,
    /// The staged image does not fit in flash. `size` counts staged bytes, which
    /// stop at the end of the staging buffer.
    ImageTooLarge { size: usize, capacity: u32 },
    /// The staged image checksum differs from the operator-supplied value.
    ChecksumMismatch { expected: u32, actual: u32 },
    /// The operator answered no, or input closed before an answer.
    Declined,
    /// The backup staging buffer cannot hold the whole flash.
    BackupBufferTooSmall { len: usize, capacity: u32 },
    /// Flash re-read after the backup copy does not match the copy.
    BackupUnreadable { copy: u32, flash: u32 },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidChecksumLiteral => f.write_str("incorrect crc32 format"),
            Self::EmptyImage => f.write_str("image file is empty"),
            Self::ImageTooLarge { capacity, .. } => {
                write!(f, "image too large for {}KB flash", capacity / 1024)
            }
            Self::ChecksumMismatch { expected, actual } => write!(
                f,
                "crc32 mismatch: expected 0x{:08x}, got 0x{:08x}",
                expected, actual
            ),
            Self::Declined => f.write_str("user abort"),
            Self::BackupBufferTooSmall { len, capacity } => write!(
                f,
                "backup buffer of {} bytes cannot hold {} bytes of flash",
                len, capacity
            ),
            Self::BackupUnreadable { copy, flash } => write!(
                f,
                "backup copy crc32 0x{:08x} differs from flash crc32 0x{:08x}",
                copy, flash
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
