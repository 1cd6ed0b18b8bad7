// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Interrupt masking, warm reset and halt.

/// Machine-level controls needed around the destructive phase.
pub trait System {
    /// Disable delivery of every interrupt. Never undone before reset.
    fn mask_interrupts(&mut self);

    /// Restart the machine.
    fn warm_reset(&mut self) -> !;

    /// Stop forever without touching flash.
    fn halt(&mut self) -> ! {
        loop {
            core::hint::spin_loop();
        }
    }
}

/// Proof that interrupts are masked for the rest of the run.
///
/// The code driving the erase may live in the flash being rewritten, so there is
/// no way back to normal execution: the section is left only through
/// [`System::warm_reset`] or [`System::halt`]. Dropping the token does not
/// re-enable interrupts.
#[derive(Debug)]
pub struct ExclusiveSection {
    _private: (),
}

impl ExclusiveSection {
    /// Mask interrupts and return the token.
    pub fn enter<S: System>(system: &mut S) -> Self {
        system.mask_interrupts();
        #[cfg(feature = "defmt")]
        defmt::println!("Interrupts masked, entering exclusive section");
        Self { _private: () }
    }
}

/// Cortex-M system control: PRIMASK for masking, AIRCR for reset.
#[cfg(feature = "embedded")]
pub struct CortexM;

#[cfg(feature = "embedded")]
impl System for CortexM {
    fn mask_interrupts(&mut self) {
        cortex_m::interrupt::disable();
    }

    fn warm_reset(&mut self) -> ! {
        cortex_m::peripheral::SCB::sys_reset();
    }

    fn halt(&mut self) -> ! {
        loop {
            cortex_m::asm::nop();
        }
    }
}
