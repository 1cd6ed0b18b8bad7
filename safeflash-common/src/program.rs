// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Erase/program/verify state machine.
//!
//! Each attempt runs the full sequence:
//!   1. unlock key register, open every protection block, unlock again
//!   2. set the timing divisor
//!   3. erase every page of the region, polling for completion
//!   4. program the source page by page, lowest address first
//!   5. re-lock protection
//!   6. checksum exactly the bytes that were meant to be written
//!
//! A verified write ends in `SystemReset`. A failed firmware write is retried once
//! from the backup, a failed backup write ends in `Halted`.

use core::ops::Range;

use heapless::Vec;

use crate::{
    backup::BackupImage,
    checksum,
    console::Console,
    controller::{FlashController, PollPolicy},
    layout::FlashLayout,
    preflight::FirmwareImage,
    system::ExclusiveSection,
};

/// Program state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProgramState {
    /// Writing the validated candidate image.
    Firmware,
    /// Writing the backup taken before the first erase.
    Recover,
    /// Flash verified, reset pending.
    SystemReset,
    /// Both sources failed to verify. Needs an external programmer.
    Halted,
}

/// Result of comparing the written flash against the target checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Verify {
    Match,
    Mismatch,
}

impl ProgramState {
    /// Next state after an attempt made in `self` verified as `verify`.
    pub const fn next(self, verify: Verify) -> Self {
        match (self, verify) {
            (Self::Halted, _) => Self::Halted,
            (_, Verify::Match) => Self::SystemReset,
            (Self::Recover, Verify::Mismatch) => Self::Halted,
            (Self::Firmware | Self::SystemReset, Verify::Mismatch) => Self::Recover,
        }
    }

    /// True for states that make no further flash access.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::SystemReset | Self::Halted)
    }
}

/// Split of a write of `size` bytes into flash pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePlan {
    size: u32,
    page_size: u32,
}

impl PagePlan {
    pub const fn new(size: u32, page_size: u32) -> Self {
        Self { size, page_size }
    }

    pub const fn page_count(&self) -> u32 {
        self.size.div_ceil(self.page_size)
    }

    /// Bytes written to the final page; a full page when `size` is page-aligned.
    pub const fn last_page_len(&self) -> u32 {
        match self.size % self.page_size {
            0 => self.page_size,
            rem => rem,
        }
    }

    /// Source offsets of each page, in write order.
    pub fn pages(&self) -> impl Iterator<Item = Range<usize>> {
        let size = self.size as usize;
        let page_size = self.page_size as usize;
        (0..size)
            .step_by(page_size)
            .map(move |start| start..(start + page_size).min(size))
    }
}

/// Record of one erase/write/verify cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Attempt {
    pub state: ProgramState,
    /// Bytes meant to be written and verified.
    pub size: u32,
    pub pages: u32,
    pub last_page_len: u32,
    /// Checksum the flash had to reach.
    pub target_crc: u32,
    /// Checksum measured after re-locking; `None` if the erase stalled.
    pub flash_crc: Option<u32>,
    /// Page whose erase never completed under a bounded poll policy.
    pub stalled_page: Option<u32>,
    pub verify: Verify,
}

/// At most one firmware attempt and one recovery attempt happen per run.
pub const MAX_ATTEMPTS: usize = 2;

/// Drives the flash through the program states.
///
/// Owns the controller for the whole destructive window.
pub struct Programmer<'a, F> {
    flash: F,
    layout: FlashLayout,
    poll: PollPolicy,
    image: FirmwareImage<'a>,
    backup: BackupImage<'a>,
    state: ProgramState,
    attempts: Vec<Attempt, MAX_ATTEMPTS>,
}

impl<'a, F: FlashController> Programmer<'a, F> {
    pub fn new(
        flash: F,
        layout: FlashLayout,
        image: FirmwareImage<'a>,
        backup: BackupImage<'a>,
    ) -> Self {
        Self {
            flash,
            layout,
            poll: PollPolicy::default(),
            image,
            backup,
            state: ProgramState::Firmware,
            attempts: Vec::new(),
        }
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn state(&self) -> ProgramState {
        self.state
    }

    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }

    pub fn flash(&self) -> &F {
        &self.flash
    }

    /// Give the controller back. Only meaningful once a terminal state is reached.
    pub fn into_parts(self) -> (F, Vec<Attempt, MAX_ATTEMPTS>) {
        (self.flash, self.attempts)
    }

    /// Run attempts until `SystemReset` or `Halted`.
    pub fn run<C: Console>(
        &mut self,
        section: &ExclusiveSection,
        console: &mut C,
    ) -> ProgramState {
        while !self.state.is_terminal() {
            self.step(section, console);
        }
        self.state
    }

    /// Perform one attempt for the current state and move to the next state.
    ///
    /// Terminal states are left as they are without any controller access.
    pub fn step<C: Console>(
        &mut self,
        _section: &ExclusiveSection,
        console: &mut C,
    ) -> ProgramState {
        let state = self.state;
        let (source, target_crc) = match state {
            ProgramState::Firmware => (self.image.bytes(), self.image.expected_crc()),
            ProgramState::Recover => (self.backup.bytes(), self.backup.crc()),
            ProgramState::SystemReset | ProgramState::Halted => return state,
        };

        let attempt = self.attempt(state, source, target_crc, console);
        report(console, &attempt);
        self.attempts.push(attempt).ok();

        let next = state.next(attempt.verify);
        #[cfg(feature = "defmt")]
        defmt::println!("Program: {:?} -> {:?}", state, next);
        self.state = next;
        next
    }

    fn attempt<C: Console>(
        &mut self,
        state: ProgramState,
        source: &[u8],
        target_crc: u32,
        console: &mut C,
    ) -> Attempt {
        let plan = PagePlan::new(source.len() as u32, self.layout.page_size);
        let mut attempt = Attempt {
            state,
            size: source.len() as u32,
            pages: plan.page_count(),
            last_page_len: plan.last_page_len(),
            target_crc,
            flash_crc: None,
            stalled_page: None,
            verify: Verify::Mismatch,
        };

        write!(console, "\r\nErasing flash... ").ok();
        self.open_protection();

        if let Err(page) = self.erase_all() {
            #[cfg(feature = "defmt")]
            defmt::error!("Program: erase of page {} never completed", page);
            self.flash.lock_protection();
            attempt.stalled_page = Some(page);
            return attempt;
        }

        write!(console, "\r\nWriting new firmware...\r\n").ok();
        self.write_pages(source, &plan, console);
        self.flash.lock_protection();
        write!(console, "\r\n").ok();

        write!(console, "Verifying flash checksum... ").ok();
        let flash_crc = checksum::flash_checksum(&mut self.flash, self.layout.base, attempt.size);
        attempt.flash_crc = Some(flash_crc);
        if flash_crc == target_crc {
            attempt.verify = Verify::Match;
        }
        attempt
    }

    fn open_protection(&mut self) {
        self.flash.unlock_protection();
        self.flash.set_protection(self.layout.unprotect_all);
        self.flash.unlock_protection();
        self.flash.set_timing_divisor(self.layout.timing_divisor);
    }

    /// Erase the whole region, whatever the size of the write that follows.
    fn erase_all(&mut self) -> Result<(), u32> {
        for page in 0..self.layout.page_count() {
            self.flash.erase_page(page);
            if !self.poll.wait(&mut self.flash) {
                return Err(page);
            }
        }
        Ok(())
    }

    fn write_pages<C: Console>(&mut self, source: &[u8], plan: &PagePlan, console: &mut C) {
        let total = plan.page_count();
        let mut target = self.layout.base;
        for (index, range) in plan.pages().enumerate() {
            write!(console, "\rWriting flash page {:03}/{:03}", index + 1, total).ok();
            self.flash.write_bytes(target, &source[range]);
            target += self.layout.page_size;
        }
    }
}

fn report<C: Console>(console: &mut C, attempt: &Attempt) {
    match (attempt.verify, attempt.state) {
        (Verify::Match, _) => {
            write!(console, "- OK\r\n").ok();
        }
        (Verify::Mismatch, ProgramState::Firmware) => {
            write!(
                console,
                "\r\nError occurred during flash write\r\nAttempting to flash backup firmware...\r\n"
            )
            .ok();
        }
        (Verify::Mismatch, _) => {
            write!(
                console,
                "\r\nError occurred during flash write\r\nBackup recovery failed\r\n"
            )
            .ok();
        }
    }
}
