// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Register-level flash controller for byte-wide key/protection/page-control blocks.
//!
//! The protection and divisor registers only accept a write right after the
//! two-byte key sequence, and the key register re-locks after that write. A page
//! erase is started by selecting the page and setting the erase bit in page
//! control; the controller clears the bit when done.
//!
//! Flash is programmed by plain volatile byte stores into the mapped range once
//! the blocks are unprotected.

use crate::{controller::FlashController, layout::FlashLayout};

/// Two-byte sequence written to the key register to open protected registers.
pub const KEY_UNLOCK: [u8; 2] = [0xB6, 0x49];
/// Page erase enable / busy bit in the page control register.
pub const PAGE_ERASE: u8 = 0x02;

/// Addresses of the controller registers.
#[derive(Debug, Clone, Copy)]
pub struct FlashRegisters {
    pub key: *mut u8,
    pub divisor: *mut u8,
    pub protection: *mut u8,
    pub page_select: *mut u8,
    pub page_control: *mut u8,
}

pub struct MmioFlash {
    regs: FlashRegisters,
    memory: *mut u8,
    base: u32,
    capacity: u32,
    protect_all: u8,
}

impl MmioFlash {
    /// # Safety
    /// Every pointer in `regs` must address the matching controller register, and
    /// `memory` must map `layout.capacity` bytes of flash starting at flash address
    /// `layout.base`. No other code may access either while this value exists.
    pub const unsafe fn new(regs: FlashRegisters, memory: *mut u8, layout: &FlashLayout) -> Self {
        Self {
            regs,
            memory,
            base: layout.base,
            capacity: layout.capacity,
            protect_all: layout.protect_all,
        }
    }

    /// Offset of `len` bytes at flash address `addr` into the mapped range.
    fn offset(&self, addr: u32, len: usize) -> usize {
        debug_assert!(addr >= self.base, "address 0x{:06x} below flash base", addr);
        let start = addr.wrapping_sub(self.base) as usize;
        debug_assert!(
            start + len <= self.capacity as usize,
            "access 0x{:06x}+{} past flash end",
            addr,
            len
        );
        start
    }

    fn write_reg(&mut self, reg: *mut u8, value: u8) {
        // SAFETY: only called with pointers taken from `self.regs`, which `new`
        // requires to be valid and exclusive
        unsafe { reg_write(reg, value) }
    }
}

/// # Safety
/// `reg` must be valid for a volatile byte write.
unsafe fn reg_write(reg: *mut u8, value: u8) {
    reg.write_volatile(value)
}

/// # Safety
/// `reg` must be valid for a volatile byte read.
unsafe fn reg_read(reg: *mut u8) -> u8 {
    reg.read_volatile()
}

impl FlashController for MmioFlash {
    fn unlock_protection(&mut self) {
        for byte in KEY_UNLOCK {
            self.write_reg(self.regs.key, byte);
        }
    }

    fn set_protection(&mut self, mask: u8) {
        self.write_reg(self.regs.protection, mask);
    }

    fn set_timing_divisor(&mut self, divisor: u8) {
        self.write_reg(self.regs.divisor, divisor);
    }

    fn erase_page(&mut self, index: u32) {
        // page select is 7 bits wide
        self.write_reg(self.regs.page_select, index as u8);
        self.write_reg(self.regs.page_control, PAGE_ERASE);
    }

    fn erase_done(&mut self) -> bool {
        // SAFETY: `new` requires every register pointer to be valid and exclusive
        let control = unsafe { reg_read(self.regs.page_control) };
        control & PAGE_ERASE == 0
    }

    fn write_bytes(&mut self, dest: u32, src: &[u8]) {
        let start = self.offset(dest, src.len());
        for (i, byte) in src.iter().enumerate() {
            // SAFETY: in range of the mapping `new` was given
            unsafe { self.memory.add(start + i).write_volatile(*byte) };
        }
    }

    fn lock_protection(&mut self) {
        self.unlock_protection();
        self.write_reg(self.regs.protection, self.protect_all);
    }

    fn read(&mut self, src: u32, buf: &mut [u8]) {
        let start = self.offset(src, buf.len());
        for (i, byte) in buf.iter_mut().enumerate() {
            // SAFETY: in range of the mapping `new` was given
            *byte = unsafe { self.memory.add(start + i).read_volatile() };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::PollPolicy;
    use crate::layout::AGON_FLASH;

    const KEY: usize = 0;
    const DIVISOR: usize = 1;
    const PROTECTION: usize = 2;
    const PAGE_SELECT: usize = 3;
    const PAGE_CONTROL: usize = 4;

    fn layout() -> FlashLayout {
        FlashLayout {
            base: 0x100,
            capacity: 64,
            page_size: 16,
            ..AGON_FLASH
        }
    }

    fn regs(block: *mut u8) -> FlashRegisters {
        unsafe {
            FlashRegisters {
                key: block.add(KEY),
                divisor: block.add(DIVISOR),
                protection: block.add(PROTECTION),
                page_select: block.add(PAGE_SELECT),
                page_control: block.add(PAGE_CONTROL),
            }
        }
    }

    #[test]
    fn writes_and_reads_mapped_flash() {
        let mut block = [0u8; 5];
        let mut memory = [0xFFu8; 64];
        let mut flash =
            unsafe { MmioFlash::new(regs(block.as_mut_ptr()), memory.as_mut_ptr(), &layout()) };

        flash.write_bytes(0x110, &[1, 2, 3]);
        let mut buf = [0u8; 4];
        flash.read(0x10F, &mut buf);
        assert_eq!(buf, [0xFF, 1, 2, 3]);
        drop(flash);
        assert_eq!(memory[0x10..0x13], [1, 2, 3]);
    }

    #[test]
    fn lock_writes_key_then_protection() {
        let mut block = [0u8; 5];
        let mut memory = [0xFFu8; 64];
        let mut flash =
            unsafe { MmioFlash::new(regs(block.as_mut_ptr()), memory.as_mut_ptr(), &layout()) };

        flash.unlock_protection();
        flash.set_protection(0x00);
        flash.unlock_protection();
        flash.set_timing_divisor(0x5F);
        flash.lock_protection();
        drop(flash);

        assert_eq!(block[KEY], KEY_UNLOCK[1]);
        assert_eq!(block[DIVISOR], 0x5F);
        assert_eq!(block[PROTECTION], 0xFF);
    }

    #[test]
    fn erase_busy_bit_holds_until_cleared() {
        let mut block = [0u8; 5];
        let mut memory = [0xFFu8; 64];
        let mut flash =
            unsafe { MmioFlash::new(regs(block.as_mut_ptr()), memory.as_mut_ptr(), &layout()) };

        flash.erase_page(3);
        // nothing clears the busy bit in plain RAM
        assert!(!PollPolicy::Bounded(16).wait(&mut flash));
        drop(flash);

        assert_eq!(block[PAGE_SELECT], 3);
        assert_eq!(block[PAGE_CONTROL], PAGE_ERASE);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "below flash base")]
    fn read_below_base_is_caught() {
        let mut block = [0u8; 5];
        let mut memory = [0xFFu8; 64];
        let mut flash =
            unsafe { MmioFlash::new(regs(block.as_mut_ptr()), memory.as_mut_ptr(), &layout()) };

        flash.read(0xFF, &mut [0u8; 1]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "past flash end")]
    fn write_past_end_is_caught() {
        let mut block = [0u8; 5];
        let mut memory = [0xFFu8; 64];
        let mut flash =
            unsafe { MmioFlash::new(regs(block.as_mut_ptr()), memory.as_mut_ptr(), &layout()) };

        flash.write_bytes(0x13E, &[1, 2, 3]);
    }
}
