// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Flash controller capability used by the program state machine.
//!
//! The state machine never touches registers directly. A target provides a
//! register-backed implementation (see [`crate::mmio::MmioFlash`]); tests and the
//! host tool use [`crate::sim::SimFlash`].

/// Operations on the flash controller and the flash address range.
pub trait FlashController {
    /// Write the unlock sequence to the key register.
    ///
    /// The key register re-locks itself after the next protected register write.
    fn unlock_protection(&mut self);

    /// Write the block protection register. Requires a preceding unlock.
    fn set_protection(&mut self, mask: u8);

    /// Write the erase/program timing divisor. Requires a preceding unlock.
    fn set_timing_divisor(&mut self, divisor: u8);

    /// Select a page and start erasing it.
    fn erase_page(&mut self, index: u32);

    /// True once the controller reports the running page erase as complete.
    fn erase_done(&mut self) -> bool;

    /// Program `src` into flash at absolute address `dest`.
    fn write_bytes(&mut self, dest: u32, src: &[u8]);

    /// Protect every block and leave the key register locked.
    fn lock_protection(&mut self);

    /// Read flash contents at absolute address `src` into `buf`.
    fn read(&mut self, src: u32, buf: &mut [u8]);
}

/// How long to wait for a page erase to complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollPolicy {
    /// Poll until the controller reports completion, however long that takes.
    #[default]
    Unbounded,
    /// Give up after this many polls.
    Bounded(u32),
}

impl PollPolicy {
    /// Busy-poll the erase status. Returns `false` only if a bounded policy ran out.
    pub fn wait<F: FlashController>(self, flash: &mut F) -> bool {
        match self {
            Self::Unbounded => {
                while !flash.erase_done() {
                    core::hint::spin_loop();
                }
                true
            }
            Self::Bounded(max) => (0..max).any(|_| flash.erase_done()),
        }
    }
}

impl<T: FlashController + ?Sized> FlashController for &mut T {
    fn unlock_protection(&mut self) {
        (**self).unlock_protection()
    }

    fn set_protection(&mut self, mask: u8) {
        (**self).set_protection(mask)
    }

    fn set_timing_divisor(&mut self, divisor: u8) {
        (**self).set_timing_divisor(divisor)
    }

    fn erase_page(&mut self, index: u32) {
        (**self).erase_page(index)
    }

    fn erase_done(&mut self) -> bool {
        (**self).erase_done()
    }

    fn write_bytes(&mut self, dest: u32, src: &[u8]) {
        (**self).write_bytes(dest, src)
    }

    fn lock_protection(&mut self) {
        (**self).lock_protection()
    }

    fn read(&mut self, src: u32, buf: &mut [u8]) {
        (**self).read(src, buf)
    }
}
