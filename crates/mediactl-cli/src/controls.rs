// SPDX-License-Identifier: Apache-2.0

//! V4L2 control enumeration for an entity's device node.

use crate::error::CliError;
use crate::utils::{to_json_string, DeviceArgs};
use clap::Args as ClapArgs;
use mediactl::controls::{enumerate_controls, ControlClass, MenuItem};
use mediactl::{SubDevice, VideoDevice};
use serde::Serialize;

#[derive(ClapArgs, Debug)]
pub struct Args {
    #[command(flatten)]
    device: DeviceArgs,

    /// Entity whose device node is queried (glob pattern)
    #[arg(short, long)]
    entity: String,
}

#[derive(Debug, Serialize)]
struct Output {
    entity: String,
    device_node: String,
    classes: Vec<ClassOutput>,
}

#[derive(Debug, Serialize)]
struct ClassOutput {
    name: String,
    controls: Vec<ControlOutput>,
}

#[derive(Debug, Serialize)]
struct ControlOutput {
    id: String,
    name: String,
    #[serde(rename = "type")]
    control_type: String,
    minimum: i64,
    maximum: i64,
    step: u64,
    default: i64,
    flags: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    menu: Vec<String>,
}

fn class_outputs(classes: &[ControlClass]) -> Vec<ClassOutput> {
    classes
        .iter()
        .map(|class| ClassOutput {
            name: class.name.clone(),
            controls: class
                .controls
                .iter()
                .map(|control| ControlOutput {
                    id: format!("0x{:08x}", control.id),
                    name: control.name.clone(),
                    control_type: control.control_type.name().to_string(),
                    minimum: control.minimum,
                    maximum: control.maximum,
                    step: control.step,
                    default: control.default_value,
                    flags: control.flags,
                    menu: control
                        .menu_items
                        .iter()
                        .map(|item| match item {
                            MenuItem::Name(index, name) => format!("{}: {}", index, name),
                            MenuItem::Value(index, value) => format!("{}: {}", index, value),
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect()
}

pub fn execute(args: Args, json: bool) -> Result<(), CliError> {
    log::debug!("Executing controls command: {:?}", args);

    let device = args.device.open()?;
    let graph = device.graph();

    let entity = graph
        .find_entity(&args.entity)
        .ok_or_else(|| CliError::NotFound(format!("no entity matching \"{}\"", args.entity)))?;
    let iface = graph
        .interface_of(entity)
        .ok_or_else(|| CliError::NotFound(format!("entity \"{}\" has no device node", entity.name())))?;

    // Sub-device and video nodes answer the same control ioctls; only the
    // open path differs.
    let classes = if iface.is_subdev() {
        let subdev = SubDevice::from_entity(graph, entity)?;
        enumerate_controls(&subdev)?
    } else {
        let video = VideoDevice::from_entity(graph, entity)?;
        enumerate_controls(&video)?
    };

    let output = Output {
        entity: entity.name().to_string(),
        device_node: iface.dev_path().display().to_string(),
        classes: class_outputs(&classes),
    };

    if json {
        println!("{}", to_json_string(&output)?);
    } else {
        println!("{} ({})", output.entity, output.device_node);
        for class in &output.classes {
            println!("\n{}", class.name);
            for control in &class.controls {
                println!(
                    "  {} {} ({}): min={} max={} step={} default={}",
                    control.id,
                    control.name,
                    control.control_type,
                    control.minimum,
                    control.maximum,
                    control.step,
                    control.default
                );
                for item in &control.menu {
                    println!("      {}", item);
                }
            }
        }
    }

    Ok(())
}
