// SPDX-License-Identifier: Apache-2.0

//! Device information display.

use crate::error::CliError;
use crate::utils::{to_json_string, DeviceArgs, InfoOutput};
use clap::Args as ClapArgs;
use serde::Serialize;

#[derive(ClapArgs, Debug)]
pub struct Args {
    #[command(flatten)]
    device: DeviceArgs,
}

#[derive(Debug, Serialize)]
struct Output {
    #[serde(flatten)]
    info: InfoOutput,
    topology_version: u64,
    entities: usize,
    interfaces: usize,
    pads: usize,
    links: usize,
}

pub fn execute(args: Args, json: bool) -> Result<(), CliError> {
    log::debug!("Executing info command: {:?}", args);

    let device = args.device.open()?;
    let graph = device.graph();
    let output = Output {
        info: InfoOutput::from(device.info()),
        topology_version: graph.version(),
        entities: graph.entities().len(),
        interfaces: graph.interfaces().len(),
        pads: graph.pads().len(),
        links: graph.links().len(),
    };

    if json {
        println!("{}", to_json_string(&output)?);
    } else {
        println!("driver          : {}", output.info.driver);
        println!("model           : {}", output.info.model);
        if !output.info.serial.is_empty() {
            println!("serial          : {}", output.info.serial);
        }
        println!("bus info        : {}", output.info.bus_info);
        println!("media version   : {}", output.info.media_version);
        println!("driver version  : {}", output.info.driver_version);
        println!("hw revision     : 0x{:x}", output.info.hw_revision);
        println!("topology version: {}", output.topology_version);
        println!(
            "objects         : {} entities, {} interfaces, {} pads, {} links",
            output.entities, output.interfaces, output.pads, output.links
        );
    }

    Ok(())
}
