// SPDX-License-Identifier: Apache-2.0

//! Media device discovery.
//!
//! Scans `/dev/media*` nodes and matches a chosen device-information field
//! against a glob-style pattern. Nodes that cannot be opened or queried
//! (permissions, non-media nodes) are skipped, not reported as errors.

use std::fs;
use std::path::{Path, PathBuf};

use crate::device::DeviceInfo;
use crate::transport::{KernelTransport, MediaTransport};
use crate::Error;

/// Device-information field used as the discovery key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoField {
    Driver,
    Model,
    Serial,
    BusInfo,
}

impl InfoField {
    pub fn name(&self) -> &'static str {
        match self {
            InfoField::Driver => "driver",
            InfoField::Model => "model",
            InfoField::Serial => "serial",
            InfoField::BusInfo => "bus-info",
        }
    }

    pub(crate) fn of<'a>(&self, info: &'a DeviceInfo) -> &'a str {
        match self {
            InfoField::Driver => &info.driver,
            InfoField::Model => &info.model,
            InfoField::Serial => &info.serial,
            InfoField::BusInfo => &info.bus_info,
        }
    }
}

/// Find the first media device node whose info field matches the pattern.
pub fn find_media_device(field: InfoField, pattern: &str) -> Result<PathBuf, Error> {
    find_media_device_in(Path::new("/dev"), field, pattern)
}

fn find_media_device_in(dev: &Path, field: InfoField, pattern: &str) -> Result<PathBuf, Error> {
    let mut candidates = Vec::new();
    for entry in fs::read_dir(dev)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with("media") {
            candidates.push(entry.path());
        }
    }
    candidates.sort();

    for path in candidates {
        let Ok(transport) = KernelTransport::open(&path) else {
            continue;
        };
        let Ok(raw) = transport.device_info() else {
            log::debug!("{}: not a media controller node, skipped", path.display());
            continue;
        };
        let Ok(info) = DeviceInfo::from_raw(&raw) else {
            continue;
        };
        if glob_match(pattern, field.of(&info)) {
            log::debug!(
                "{} matched {} pattern \"{}\"",
                path.display(),
                field.name(),
                pattern
            );
            return Ok(path);
        }
    }

    Err(Error::DeviceNotFound(format!(
        "{} matching \"{}\"",
        field.name(),
        pattern
    )))
}

/// Glob-style pattern match: `*` matches any run of characters, `?` matches
/// exactly one.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut pi, mut ti) = (0, 0);
    let mut star: Option<usize> = None;
    let mut mark = 0;

    while ti < text.len() {
        if pi < pattern.len() && (pattern[pi] == '?' || pattern[pi] == text[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < pattern.len() && pattern[pi] == '*' {
            star = Some(pi);
            mark = ti;
            pi += 1;
        } else if let Some(s) = star {
            // Backtrack: let the last star absorb one more character.
            pi = s + 1;
            mark += 1;
            ti = mark;
        } else {
            return false;
        }
    }
    while pi < pattern.len() && pattern[pi] == '*' {
        pi += 1;
    }
    pi == pattern.len()
}
