// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Simulated flash device, console and delay for the host tool and tests.
//!
//! `SimFlash` models NOR semantics: erase sets a page to 0xFF, programming can only
//! clear bits. Protected register writes without a preceding key unlock, and erases
//! or writes while blocks are protected, are ignored and counted as violations.

use std::collections::VecDeque;
use std::fmt;
use std::string::String;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;

use crate::{console::Console, controller::FlashController, layout::FlashLayout};

/// Every controller call, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashCall {
    Unlock,
    SetProtection(u8),
    SetDivisor(u8),
    ErasePage(u32),
    PollErase,
    Write { dest: u32, len: usize },
    Lock,
    Read { src: u32, len: usize },
}

impl FlashCall {
    /// True for calls that change flash contents or controller registers.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Self::Read { .. } | Self::PollErase)
    }
}

/// Faults injected into the simulated controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Faults {
    /// Corrupt the data of this many write batches, counted from the next one.
    pub corrupt_batches: usize,
    /// Never report erase completion.
    pub stuck_erase: bool,
    /// Polls needed before an erase reports completion.
    pub erase_latency: u32,
    /// Flip the first byte returned by the read with this index, counting from zero.
    pub corrupt_read: Option<usize>,
}

#[derive(Debug)]
pub struct SimFlash {
    memory: Vec<u8>,
    layout: FlashLayout,
    key_open: bool,
    protection: u8,
    divisor: Option<u8>,
    erase_polls_left: Option<u32>,
    batch_corrupted: bool,
    faults: Faults,
    reads: usize,
    calls: Vec<FlashCall>,
    violations: usize,
}

impl SimFlash {
    /// A locked device holding `contents`, which must be exactly the flash capacity.
    pub fn new(layout: FlashLayout, contents: Vec<u8>) -> Self {
        assert_eq!(
            contents.len(),
            layout.capacity as usize,
            "flash contents must match capacity"
        );
        Self {
            memory: contents,
            layout,
            key_open: false,
            protection: layout.protect_all,
            divisor: None,
            erase_polls_left: None,
            batch_corrupted: false,
            faults: Faults::default(),
            reads: 0,
            calls: Vec::new(),
            violations: 0,
        }
    }

    /// A locked device filled with a repeating, non-blank pattern.
    pub fn with_pattern(layout: FlashLayout) -> Self {
        let contents = (0..layout.capacity).map(|i| (i % 251) as u8).collect();
        Self::new(layout, contents)
    }

    pub fn with_faults(mut self, faults: Faults) -> Self {
        self.faults = faults;
        self
    }

    pub fn layout(&self) -> FlashLayout {
        self.layout
    }

    pub fn contents(&self) -> &[u8] {
        &self.memory
    }

    pub fn calls(&self) -> &[FlashCall] {
        &self.calls
    }

    pub fn erase_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, FlashCall::ErasePage(_)))
            .count()
    }

    /// `(dest, len)` of every write, in order.
    pub fn writes(&self) -> Vec<(u32, usize)> {
        self.calls
            .iter()
            .filter_map(|c| match *c {
                FlashCall::Write { dest, len } => Some((dest, len)),
                _ => None,
            })
            .collect()
    }

    /// Number of calls that touch flash contents or registers.
    pub fn mutating_calls(&self) -> usize {
        self.calls.iter().filter(|c| c.is_mutating()).count()
    }

    pub fn is_locked(&self) -> bool {
        self.protection == self.layout.protect_all && !self.key_open
    }

    pub fn violations(&self) -> usize {
        self.violations
    }

    fn offset(&self, addr: u32) -> usize {
        (addr - self.layout.base) as usize
    }

    fn protected(&self) -> bool {
        self.protection != self.layout.unprotect_all
    }

    /// Consume the key unlock for a protected register write.
    fn take_key(&mut self) -> bool {
        let open = self.key_open;
        self.key_open = false;
        if !open {
            self.violations += 1;
        }
        open
    }
}

impl FlashController for SimFlash {
    fn unlock_protection(&mut self) {
        self.calls.push(FlashCall::Unlock);
        self.key_open = true;
    }

    fn set_protection(&mut self, mask: u8) {
        self.calls.push(FlashCall::SetProtection(mask));
        if self.take_key() {
            self.protection = mask;
        }
    }

    fn set_timing_divisor(&mut self, divisor: u8) {
        self.calls.push(FlashCall::SetDivisor(divisor));
        if self.take_key() {
            self.divisor = Some(divisor);
        }
    }

    fn erase_page(&mut self, index: u32) {
        self.calls.push(FlashCall::ErasePage(index));
        if self.protected() || self.divisor.is_none() || index >= self.layout.page_count() {
            self.violations += 1;
            return;
        }
        let start = (index * self.layout.page_size) as usize;
        let end = (start + self.layout.page_size as usize).min(self.memory.len());
        self.memory[start..end].fill(0xFF);
        self.erase_polls_left = Some(self.faults.erase_latency);
    }

    fn erase_done(&mut self) -> bool {
        self.calls.push(FlashCall::PollErase);
        if self.faults.stuck_erase {
            return false;
        }
        match self.erase_polls_left {
            Some(0) | None => {
                self.erase_polls_left = None;
                true
            }
            Some(n) => {
                self.erase_polls_left = Some(n - 1);
                false
            }
        }
    }

    fn write_bytes(&mut self, dest: u32, src: &[u8]) {
        self.calls.push(FlashCall::Write {
            dest,
            len: src.len(),
        });
        if self.protected() {
            self.violations += 1;
            return;
        }
        let start = self.offset(dest);
        for (cell, byte) in self.memory[start..start + src.len()].iter_mut().zip(src) {
            *cell &= *byte;
        }
        if self.faults.corrupt_batches > 0 && !self.batch_corrupted && !src.is_empty() {
            self.memory[start] = !src[0];
            self.batch_corrupted = true;
        }
    }

    fn lock_protection(&mut self) {
        self.calls.push(FlashCall::Lock);
        self.protection = self.layout.protect_all;
        self.key_open = false;
        if self.batch_corrupted {
            self.batch_corrupted = false;
            self.faults.corrupt_batches -= 1;
        }
    }

    fn read(&mut self, src: u32, buf: &mut [u8]) {
        self.calls.push(FlashCall::Read {
            src,
            len: buf.len(),
        });
        let start = self.offset(src);
        buf.copy_from_slice(&self.memory[start..start + buf.len()]);
        if self.faults.corrupt_read == Some(self.reads) {
            if let Some(first) = buf.first_mut() {
                *first = !*first;
            }
        }
        self.reads += 1;
    }
}

/// Console that records output and replays scripted input.
#[derive(Debug, Default)]
pub struct RecordingConsole {
    output: Vec<u8>,
    input: VecDeque<u8>,
}

impl RecordingConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// A console whose operator will type `input`.
    pub fn with_input(input: &str) -> Self {
        Self {
            output: Vec::new(),
            input: input.bytes().collect(),
        }
    }

    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }

    pub fn raw_output(&self) -> &[u8] {
        &self.output
    }
}

impl fmt::Write for RecordingConsole {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.output.extend_from_slice(s.as_bytes());
        Ok(())
    }
}

impl Console for RecordingConsole {
    fn write_byte(&mut self, byte: u8) {
        self.output.push(byte);
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.input.pop_front()
    }
}

/// Delay that records the requested time instead of sleeping.
#[derive(Debug, Default)]
pub struct CountingDelay {
    pub total_ns: u64,
    pub calls: usize,
}

impl DelayNs for CountingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
        self.calls += 1;
    }
}
