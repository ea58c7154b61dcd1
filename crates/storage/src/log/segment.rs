// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log segment files
//!
//! Segments are named `events-<n>.jsonl` with `n` starting at 1. Reading a
//! segment stops at the first line that fails to parse or verify; that is
//! where a torn write ended.

use super::entry::LogLine;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

const SEGMENT_PREFIX: &str = "events-";
const SEGMENT_SUFFIX: &str = ".jsonl";

pub fn segment_file_name(number: u64) -> String {
    format!("{}{}{}", SEGMENT_PREFIX, number, SEGMENT_SUFFIX)
}

fn parse_segment_number(file_name: &str) -> Option<u64> {
    file_name
        .strip_prefix(SEGMENT_PREFIX)?
        .strip_suffix(SEGMENT_SUFFIX)?
        .parse()
        .ok()
}

/// Segments in `dir`, ordered oldest first
pub fn list_segments(dir: &Path) -> io::Result<Vec<(u64, PathBuf)>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut segments = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        if let Some(number) = name.to_str().and_then(parse_segment_number) {
            segments.push((number, entry.path()));
        }
    }
    segments.sort_by_key(|(number, _)| *number);
    Ok(segments)
}

/// Valid lines of one segment
#[derive(Debug, Default)]
pub struct SegmentContents {
    pub lines: Vec<LogLine>,
    /// Line number of the first invalid line, if reading stopped early
    pub corrupt_at: Option<u64>,
}

impl SegmentContents {
    pub fn is_clean(&self) -> bool {
        self.corrupt_at.is_none()
    }
}

/// Read every valid line of a segment. A missing file reads as empty.
pub fn read_segment(path: &Path) -> io::Result<SegmentContents> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(SegmentContents::default()),
        Err(e) => return Err(e),
    };

    let mut contents = SegmentContents::default();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line_number = index as u64 + 1;
        let line = match line {
            Ok(l) => l,
            Err(_) => {
                contents.corrupt_at = Some(line_number);
                break;
            }
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match LogLine::from_line(trimmed) {
            Ok(entry) if entry.verify() => contents.lines.push(entry),
            Ok(_) => {
                tracing::warn!(path = %path.display(), line = line_number, "checksum mismatch, ignoring rest of segment");
                contents.corrupt_at = Some(line_number);
                break;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), line = line_number, error = %e, "unreadable line, ignoring rest of segment");
                contents.corrupt_at = Some(line_number);
                break;
            }
        }
    }
    Ok(contents)
}

#[cfg(test)]
#[path = "segment_tests.rs"]
mod tests;
