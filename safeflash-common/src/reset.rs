// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Countdown and warm reset once flash has converged.

use embedded_hal::delay::DelayNs;

use crate::{
    console::{Console, CLEAR_SCREEN},
    system::System,
};

/// Countdown printed before resetting, one line per second.
pub const COUNTDOWN_SECS: u32 = 5;
/// Pause between clearing the screen and resetting.
pub const SETTLE_MS: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetSequencer {
    pub countdown_secs: u32,
    pub settle_ms: u32,
}

impl Default for ResetSequencer {
    fn default() -> Self {
        Self {
            countdown_secs: COUNTDOWN_SECS,
            settle_ms: SETTLE_MS,
        }
    }
}

impl ResetSequencer {
    /// Print the countdown, clear the screen and let the console settle.
    pub fn announce<C: Console, D: DelayNs>(&self, console: &mut C, delay: &mut D) {
        write!(console, "\r\n").ok();
        for remaining in (1..=self.countdown_secs).rev() {
            write!(console, "\rReset in {}s", remaining).ok();
            delay.delay_ms(1000);
        }
        console.write_byte(CLEAR_SCREEN);
        delay.delay_ms(self.settle_ms);
    }

    /// Announce, then reset the machine.
    pub fn run<S: System, C: Console, D: DelayNs>(
        &self,
        system: &mut S,
        console: &mut C,
        delay: &mut D,
    ) -> ! {
        self.announce(console, delay);
        #[cfg(feature = "defmt")]
        defmt::println!("Issuing warm reset");
        system.warm_reset()
    }
}
