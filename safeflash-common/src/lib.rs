// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Checksum-gated boot firmware reprogramming with automatic backup recovery.
//!
//! This crate supports both `no_std` (target) and `std` (host) environments:
//! - Default: `no_std` mode for the machine being reprogrammed
//! - `std` feature: Enables the simulated flash device and test doubles in [`sim`]
//! - `embedded` feature: Enables the Cortex-M [`system::CortexM`] implementation
//! - `defmt` feature: Emits diagnostics through `defmt`

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(test)]
extern crate std;

pub mod backup;
pub mod checksum;
pub mod console;
pub mod controller;
pub mod error;
pub mod layout;
pub mod mmio;
pub mod preflight;
pub mod program;
pub mod reset;
pub mod session;
pub mod system;

#[cfg(feature = "std")]
pub mod sim;

// Re-export commonly used types
pub use backup::BackupImage;
pub use checksum::{checksum, flash_checksum};
pub use console::Console;
pub use controller::{FlashController, PollPolicy};
pub use error::Error;
pub use layout::{FlashLayout, StagingLayout, AGON_FLASH, AGON_STAGING};
pub use preflight::{parse_checksum, FirmwareImage};
pub use program::{Attempt, PagePlan, ProgramState, Programmer, Verify};
pub use reset::ResetSequencer;
pub use session::{Completion, Session};
pub use system::{ExclusiveSection, System};
