// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! CRC-32 against published vectors, and flash/RAM agreement.

use safeflash_common::layout::{FlashLayout, AGON_FLASH};
use safeflash_common::sim::SimFlash;
use safeflash_common::{checksum, flash_checksum};

#[test]
fn test_checksum_empty() {
    assert_eq!(checksum(&[]), 0x0000_0000);
}

#[test]
fn test_checksum_single_byte() {
    assert_eq!(checksum(b"a"), 0xE8B7_BE43);
}

#[test]
fn test_checksum_check_value() {
    assert_eq!(checksum(b"123456789"), 0xCBF4_3926);
}

#[test]
fn test_checksum_sentence() {
    assert_eq!(
        checksum(b"The quick brown fox jumps over the lazy dog"),
        0x414F_A339
    );
}

#[test]
fn test_checksum_is_deterministic() {
    let image: Vec<u8> = (0..70_000u32).map(|i| (i * 7 % 256) as u8).collect();
    assert_eq!(checksum(&image), checksum(&image.clone()));
}

#[test]
fn test_flash_checksum_matches_ram_checksum() {
    let layout = FlashLayout {
        base: 0x4000,
        capacity: 10_000,
        ..AGON_FLASH
    };
    let mut flash = SimFlash::with_pattern(layout);
    let expected = checksum(flash.contents());

    assert_eq!(flash_checksum(&mut flash, 0x4000, 10_000), expected);
}

#[test]
fn test_flash_checksum_partial_range() {
    let mut flash = SimFlash::with_pattern(AGON_FLASH);
    // 1000 is not a multiple of the read chunk
    let expected = checksum(&flash.contents()[..1000]);

    assert_eq!(flash_checksum(&mut flash, 0, 1000), expected);
}
