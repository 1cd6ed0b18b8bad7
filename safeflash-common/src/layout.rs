// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Build-time memory layout of the flash device and the RAM staging buffers.

/// Physical description of the flash region being reprogrammed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlashLayout {
    /// Address of the first flash byte.
    pub base: u32,
    /// Total size of the region in bytes.
    pub capacity: u32,
    /// Smallest erasable unit.
    pub page_size: u32,
    /// Protection register value that opens every block for erase/program.
    pub unprotect_all: u8,
    /// Protection register value that closes every block.
    pub protect_all: u8,
    /// Erase/program timing divisor for the current system clock.
    pub timing_divisor: u8,
}

impl FlashLayout {
    /// Number of pages covering the whole region.
    pub const fn page_count(&self) -> u32 {
        self.capacity.div_ceil(self.page_size)
    }

    /// Address one past the last flash byte.
    pub const fn end(&self) -> u32 {
        self.base + self.capacity
    }
}

/// RAM regions that hold the candidate image and the backup during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StagingLayout {
    /// Base address of the candidate image buffer.
    pub image: u32,
    /// Base address of the backup buffer.
    pub backup: u32,
    /// Size of each buffer.
    pub size: u32,
    /// Chunk size used when streaming the image file into the image buffer.
    pub load_block: u32,
}

impl StagingLayout {
    /// True if the image and backup buffers share no byte.
    pub const fn is_disjoint(&self) -> bool {
        self.image + self.size <= self.backup || self.backup + self.size <= self.image
    }
}

/// On-chip flash of the eZ80F92: 128KB in 128 pages of 1KB, protected in 8 blocks of 16KB.
pub const AGON_FLASH: FlashLayout = FlashLayout {
    base: 0x00_0000,
    capacity: 128 * 1024,
    page_size: 1024,
    unprotect_all: 0x00,
    protect_all: 0xFF,
    // Ceiling(18MHz * 5.1us) = 95
    timing_divisor: 0x5F,
};

pub const AGON_STAGING: StagingLayout = StagingLayout {
    image: 0x05_0000,
    backup: 0x07_0000,
    size: AGON_FLASH.capacity,
    load_block: 4096,
};

const _: () = assert!(AGON_STAGING.is_disjoint());
const _: () = assert!(AGON_STAGING.size >= AGON_FLASH.capacity);
const _: () = assert!(AGON_FLASH.page_count() == 128);
