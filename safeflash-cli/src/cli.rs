// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command-line interface definitions.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::commands;

/// Command-line arguments.
#[derive(Parser)]
#[command(name = "safeflash")]
#[command(about = "Boot firmware upgrade utility")]
#[command(version)]
pub struct Cli {
    /// Firmware image file (e.g. firmware.bin)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Expected CRC32 of the image, 4-byte hex (e.g. 0x1A2B3C4D)
    #[arg(value_name = "CRC32", value_parser = parse_crc32)]
    pub crc32: u32,

    /// File holding the contents of the flash device
    #[arg(short, long, default_value = "flash.bin")]
    pub device: PathBuf,
}

fn parse_crc32(s: &str) -> Result<u32, String> {
    safeflash_common::parse_checksum(s).map_err(|e| e.to_string())
}

/// Execute the parsed CLI command.
pub fn run(cli: Cli) -> Result<()> {
    commands::flash(&cli.file, cli.crc32, &cli.device)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_positionals() {
        let cli = Cli::try_parse_from(["safeflash", "firmware.bin", "0xCBF43926"]).unwrap();
        assert_eq!(cli.file, PathBuf::from("firmware.bin"));
        assert_eq!(cli.crc32, 0xCBF4_3926);
        assert_eq!(cli.device, PathBuf::from("flash.bin"));
    }

    #[test]
    fn wrong_argument_count_is_a_usage_error() {
        assert!(Cli::try_parse_from(["safeflash", "firmware.bin"]).is_err());
        assert!(Cli::try_parse_from(["safeflash", "a.bin", "0", "extra"]).is_err());
    }

    #[test]
    fn malformed_checksum_is_rejected() {
        let err = Cli::try_parse_from(["safeflash", "firmware.bin", "nothex"])
            .err()
            .unwrap();
        assert!(err.to_string().contains("incorrect crc32 format"));
    }
}
