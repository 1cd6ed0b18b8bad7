// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Operator console.

use core::fmt;

/// Control byte that clears the terminal.
pub const CLEAR_SCREEN: u8 = 0x0C;

/// Character console used for every operator-visible message.
///
/// Must keep working with interrupts masked, so target implementations poll the
/// UART directly instead of relying on the running firmware.
pub trait Console: fmt::Write {
    /// Emit one raw byte, including control bytes.
    fn write_byte(&mut self, byte: u8);

    /// Block until a byte arrives. `None` means the input is closed.
    fn read_byte(&mut self) -> Option<u8>;
}

/// Ask for confirmation until the operator answers `y` or `n`.
///
/// Any other byte is ignored. Closed input counts as a refusal.
pub fn confirm<C: Console>(console: &mut C, question: &str) -> bool {
    write!(console, "{} (y/n)? ", question).ok();
    loop {
        match console.read_byte() {
            Some(b'y') => return true,
            Some(b'n') | None => return false,
            Some(_) => {}
        }
    }
}
