// SPDX-License-Identifier: Apache-2.0

//! Media controller device enumeration.

use crate::error::CliError;
use crate::utils::{to_json_string, InfoOutput};
use clap::Args as ClapArgs;
use mediactl::MediaDevice;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

#[derive(ClapArgs, Debug)]
pub struct Args {
    /// Directory scanned for media device nodes
    #[arg(long, default_value = "/dev", hide = true)]
    dev_dir: String,
}

#[derive(Debug, Serialize)]
struct DevicesOutput {
    devices: Vec<DeviceRecord>,
}

#[derive(Debug, Serialize)]
struct DeviceRecord {
    path: String,
    #[serde(flatten)]
    info: InfoOutput,
    entities: usize,
    links: usize,
}

pub fn execute(args: Args, json: bool) -> Result<(), CliError> {
    log::debug!("Executing devices command: {:?}", args);

    let mut nodes: Vec<PathBuf> = fs::read_dir(&args.dev_dir)
        .map_err(|e| CliError::General(format!("cannot read {}: {}", args.dev_dir, e)))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().starts_with("media"))
                .unwrap_or(false)
        })
        .collect();
    nodes.sort();

    let mut devices = Vec::new();
    for path in nodes {
        // Skip nodes that are not usable media controller devices rather
        // than failing the whole listing.
        let device = match MediaDevice::open(&path) {
            Ok(device) => device,
            Err(err) => {
                log::debug!("{}: skipped ({})", path.display(), err);
                continue;
            }
        };
        devices.push(DeviceRecord {
            path: path.display().to_string(),
            info: InfoOutput::from(device.info()),
            entities: device.graph().entities().len(),
            links: device.graph().links().len(),
        });
    }

    let output = DevicesOutput { devices };

    if json {
        println!("{}", to_json_string(&output)?);
    } else if output.devices.is_empty() {
        println!("No media controller devices found");
    } else {
        for record in &output.devices {
            println!(
                "{}: {} \"{}\" on {} ({} entities, {} links)",
                record.path,
                record.info.driver,
                record.info.model,
                record.info.bus_info,
                record.entities,
                record.links
            );
        }
    }

    Ok(())
}
