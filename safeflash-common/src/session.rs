// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! One reprogramming run on the target, from a staged image to reset or halt.
//!
//! The stages, in order:
//! - `preflight`: capacity and checksum checks, flash untouched
//! - `confirm`: operator gate, last point where aborting is free
//! - `program`: backup, mask interrupts, erase/program/verify until terminal
//! - `finish`: countdown and warm reset, or permanent halt

use embedded_hal::delay::DelayNs;
use heapless::Vec;

use crate::{
    backup::BackupImage,
    console::{self, Console},
    controller::{FlashController, PollPolicy},
    error::Error,
    layout::FlashLayout,
    preflight::{self, FirmwareImage},
    program::{Attempt, ProgramState, Programmer, MAX_ATTEMPTS},
    reset::ResetSequencer,
    system::{ExclusiveSection, System},
};

/// Outcome of the destructive phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// `SystemReset` or `Halted`.
    pub state: ProgramState,
    pub attempts: Vec<Attempt, MAX_ATTEMPTS>,
    /// Checksum of the backup taken before the first erase.
    pub backup_crc: u32,
}

impl Completion {
    /// States visited, starting with `Firmware`.
    pub fn states(&self) -> impl Iterator<Item = ProgramState> + '_ {
        self.attempts
            .iter()
            .map(|attempt| attempt.state)
            .chain(core::iter::once(self.state))
    }
}

pub struct Session<F, C> {
    flash: F,
    console: C,
    layout: FlashLayout,
    poll: PollPolicy,
}

impl<F: FlashController, C: Console> Session<F, C> {
    pub fn new(flash: F, console: C, layout: FlashLayout) -> Self {
        Self {
            flash,
            console,
            layout,
            poll: PollPolicy::default(),
        }
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn flash(&self) -> &F {
        &self.flash
    }

    pub fn console(&mut self) -> &mut C {
        &mut self.console
    }

    /// Validate the staged image and report the checksums.
    pub fn preflight<'a>(
        &mut self,
        staged: &'a [u8],
        expected_crc: u32,
    ) -> Result<FirmwareImage<'a>, Error> {
        let result = preflight::validate(staged, expected_crc, &self.layout);
        let console = &mut self.console;
        match result {
            Err(Error::EmptyImage) => {
                write!(console, "Empty image - aborting\r\n").ok();
            }
            Err(Error::ImageTooLarge { capacity, .. }) => {
                write!(console, "Too large for {}KB flash - aborting\r\n", capacity / 1024).ok();
            }
            Err(Error::ChecksumMismatch { expected, actual }) => {
                write!(console, "Testing CRC32: 0x{:08x}\n\r", expected).ok();
                write!(console, "CRC32 result : 0x{:08x}\n\r", actual).ok();
                write!(console, "\n\rMismatch - aborting\n\r").ok();
            }
            Err(_) => {}
            Ok(image) => {
                write!(console, "Testing CRC32: 0x{:08x}\n\r", expected_crc).ok();
                write!(console, "CRC32 result : 0x{:08x}\n\r", image.crc()).ok();
                write!(console, "\n\rOK\n\r\n\r").ok();
            }
        }
        result
    }

    /// Ask the operator before anything destructive happens.
    pub fn confirm(&mut self) -> Result<(), Error> {
        if console::confirm(&mut self.console, "Erase and program flash") {
            Ok(())
        } else {
            write!(self.console, "\n\rUser abort\n\r").ok();
            Err(Error::Declined)
        }
    }

    /// Back up flash, mask interrupts and run the program state machine.
    ///
    /// Returns `Err` only if the backup cannot be taken, in which case flash has
    /// not been erased and interrupts are still enabled.
    pub fn program<'a, S: System>(
        &mut self,
        system: &mut S,
        image: FirmwareImage<'a>,
        backup_buffer: &'a mut [u8],
    ) -> Result<Completion, Error> {
        write!(self.console, "\r\nBacking up existing firmware... ").ok();
        let backup = match BackupImage::capture(&mut self.flash, &self.layout, backup_buffer) {
            Ok(backup) => backup,
            Err(e) => {
                write!(self.console, "failed: {}\r\n", e).ok();
                return Err(e);
            }
        };

        let section = ExclusiveSection::enter(system);
        let mut programmer = Programmer::new(&mut self.flash, self.layout, image, backup)
            .with_poll_policy(self.poll);
        let state = programmer.run(&section, &mut self.console);
        let (_, attempts) = programmer.into_parts();

        Ok(Completion {
            state,
            attempts,
            backup_crc: backup.crc(),
        })
    }

    /// Reset after a verified write, halt otherwise. Never returns.
    pub fn finish<S: System, D: DelayNs>(
        &mut self,
        completion: &Completion,
        sequencer: &ResetSequencer,
        system: &mut S,
        delay: &mut D,
    ) -> ! {
        match completion.state {
            ProgramState::SystemReset => sequencer.run(system, &mut self.console, delay),
            _ => {
                write!(
                    self.console,
                    "Flash contents unverified, an external flash programmer is required\r\n"
                )
                .ok();
                #[cfg(feature = "defmt")]
                defmt::error!("Unrecoverable: halting");
                system.halt()
            }
        }
    }
}
