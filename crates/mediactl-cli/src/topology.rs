// SPDX-License-Identifier: Apache-2.0

//! Topology graph printing.

use crate::error::CliError;
use crate::utils::{to_json_string, DeviceArgs};
use clap::Args as ClapArgs;
use mediactl::graph::{MediaGraph, Pad};
use serde::Serialize;

#[derive(ClapArgs, Debug)]
pub struct Args {
    #[command(flatten)]
    device: DeviceArgs,

    /// Only print entities whose name matches this glob pattern
    #[arg(short, long)]
    entity: Option<String>,
}

#[derive(Debug, Serialize)]
struct TopologyOutput {
    topology_version: u64,
    entities: Vec<EntityOutput>,
}

#[derive(Debug, Serialize)]
struct EntityOutput {
    id: u32,
    name: String,
    function: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    device_node: Option<String>,
    pads: Vec<PadOutput>,
}

#[derive(Debug, Serialize)]
struct PadOutput {
    id: u32,
    index: u32,
    direction: String,
    links: Vec<LinkOutput>,
}

#[derive(Debug, Serialize)]
struct LinkOutput {
    id: u32,
    direction: String,
    remote_entity: String,
    remote_pad: u32,
    enabled: bool,
    immutable: bool,
}

fn pad_direction(pad: &Pad) -> String {
    match (pad.is_source(), pad.is_sink()) {
        (true, false) => "source".to_string(),
        (false, true) => "sink".to_string(),
        _ => "none".to_string(),
    }
}

fn pad_output(graph: &MediaGraph, pad: &Pad) -> Result<PadOutput, CliError> {
    let mut links = Vec::new();
    for link_id in pad.link_ids() {
        let Some(link) = graph.link(*link_id) else {
            continue;
        };
        if !link.is_data_link() {
            continue;
        }
        let outbound = link.source_id() == pad.id();
        let remote = if outbound {
            graph.sink_pad(link)?
        } else {
            graph.source_pad(link)?
        };
        let remote_entity = graph.entity_of(remote)?;
        links.push(LinkOutput {
            id: link.id(),
            direction: if outbound { "to" } else { "from" }.to_string(),
            remote_entity: remote_entity.name().to_string(),
            remote_pad: remote.index(),
            enabled: link.is_enabled(),
            immutable: link.is_immutable(),
        });
    }
    Ok(PadOutput {
        id: pad.id(),
        index: pad.index(),
        direction: pad_direction(pad),
        links,
    })
}

pub fn execute(args: Args, json: bool) -> Result<(), CliError> {
    log::debug!("Executing topology command: {:?}", args);

    let device = args.device.open()?;
    let graph = device.graph();

    let mut entities = Vec::new();
    for entity in graph.entities() {
        if let Some(pattern) = &args.entity {
            if !mediactl::glob_match(pattern, entity.name()) {
                continue;
            }
        }
        let mut pads = Vec::new();
        for pad in graph.pads_of(entity) {
            pads.push(pad_output(graph, pad)?);
        }
        entities.push(EntityOutput {
            id: entity.id(),
            name: entity.name().to_string(),
            function: entity.function().name().to_string(),
            device_node: graph
                .interface_of(entity)
                .map(|iface| iface.dev_path().display().to_string()),
            pads,
        });
    }

    if let Some(pattern) = &args.entity {
        if entities.is_empty() {
            return Err(CliError::NotFound(format!(
                "no entity matching \"{}\"",
                pattern
            )));
        }
    }

    let output = TopologyOutput {
        topology_version: graph.version(),
        entities,
    };

    if json {
        println!("{}", to_json_string(&output)?);
    } else {
        print_text(&output);
    }

    Ok(())
}

fn print_text(output: &TopologyOutput) {
    println!("topology version {}", output.topology_version);
    for entity in &output.entities {
        println!(
            "- entity {}: {} ({}, {} pads)",
            entity.id,
            entity.name,
            entity.function,
            entity.pads.len()
        );
        if let Some(node) = &entity.device_node {
            println!("            device node {}", node);
        }
        for pad in &entity.pads {
            println!("    pad {} [{}]", pad.index, pad.direction);
            for link in &pad.links {
                let mut flags = Vec::new();
                if link.enabled {
                    flags.push("ENABLED");
                }
                if link.immutable {
                    flags.push("IMMUTABLE");
                }
                println!(
                    "        {} \"{}\":{} [{}]",
                    if link.direction == "to" { "->" } else { "<-" },
                    link.remote_entity,
                    link.remote_pad,
                    flags.join(",")
                );
            }
        }
    }
}
