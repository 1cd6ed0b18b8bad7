// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Streams the image file into the staging buffer.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

/// Read `path` into `staging` in `block`-sized chunks. Returns the image size.
pub fn load_file(path: &Path, staging: &mut [u8], block: usize) -> Result<usize> {
    let file =
        File::open(path).with_context(|| format!("Error opening \"{}\"", path.display()))?;
    let total = file.metadata().map(|m| m.len()).unwrap_or(0);

    println!("Loading file : {}", path.display());

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes}")?
            .progress_chars("#>-"),
    );

    let size = read_chunks(file, staging, block, |n| pb.set_position(n as u64));
    match size {
        Ok(size) => {
            pb.finish_and_clear();
            println!("File size    : {} byte(s)", total.max(size as u64));
            Ok(size)
        }
        Err(e) => {
            pb.abandon();
            Err(e)
        }
    }
}

/// Fill `staging` from `reader` until end of input or the buffer is full.
///
/// Input past the end of the buffer is left unread.
pub fn read_chunks<R: Read>(
    mut reader: R,
    staging: &mut [u8],
    block: usize,
    mut progress: impl FnMut(usize),
) -> Result<usize> {
    let mut size = 0;
    while size < staging.len() {
        let end = (size + block).min(staging.len());
        let got = match reader.read(&mut staging[size..end]) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e).context("Error reading image"),
        };
        size += got;
        progress(size);
    }

    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_in_blocks_until_eof() {
        let data: Vec<u8> = (0..10_000u32).map(|i| i as u8).collect();
        let mut staging = vec![0u8; 16_384];
        let mut reports = Vec::new();

        let size = read_chunks(Cursor::new(&data), &mut staging, 4096, |n| reports.push(n)).unwrap();

        assert_eq!(size, 10_000);
        assert_eq!(&staging[..size], &data[..]);
        assert_eq!(reports, [4096, 8192, 10_000]);
    }

    #[test]
    fn exact_fit_is_accepted() {
        let data = vec![0x5A; 8192];
        let mut staging = vec![0u8; 8192];

        let size = read_chunks(Cursor::new(&data), &mut staging, 4096, |_| {}).unwrap();

        assert_eq!(size, 8192);
    }

    #[test]
    fn stops_once_buffer_is_full() {
        let data = vec![0x5A; 20_000];
        let mut staging = vec![0u8; 8193];
        let mut reports = Vec::new();

        let size = read_chunks(Cursor::new(&data), &mut staging, 4096, |n| reports.push(n)).unwrap();

        assert_eq!(size, 8193);
        assert_eq!(reports, [4096, 8192, 8193]);
    }

    #[test]
    fn missing_file_reports_path() {
        let mut staging = vec![0u8; 16];
        let err = load_file(Path::new("does/not/exist.bin"), &mut staging, 4).unwrap_err();
        assert!(err.to_string().contains("does/not/exist.bin"));
    }
}
