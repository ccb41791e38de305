// SPDX-License-Identifier: Apache-2.0

//! Data link enable/disable.

use crate::error::CliError;
use crate::utils::{to_json_string, DeviceArgs};
use clap::Args as ClapArgs;
use mediactl::MediaGraph;
use serde::Serialize;

#[derive(ClapArgs, Debug)]
pub struct Args {
    #[command(flatten)]
    device: DeviceArgs,

    /// Select the link by its object id
    #[arg(long, conflicts_with_all = ["source", "sink"])]
    id: Option<u32>,

    /// Source endpoint as "entity:pad" (entity name may be a glob pattern)
    #[arg(long, requires = "sink")]
    source: Option<String>,

    /// Sink endpoint as "entity:pad" (entity name may be a glob pattern)
    #[arg(long, requires = "source")]
    sink: Option<String>,

    /// Enable the link
    #[arg(long, conflicts_with = "disable")]
    enable: bool,

    /// Disable the link
    #[arg(long)]
    disable: bool,
}

#[derive(Debug, Serialize)]
struct Output {
    link_id: u32,
    enabled: bool,
}

/// Parse an "entity:pad" endpoint argument.
fn parse_endpoint(endpoint: &str) -> Result<(String, u32), CliError> {
    let (name, index) = endpoint
        .rsplit_once(':')
        .ok_or_else(|| CliError::InvalidArgs(format!("\"{}\" is not entity:pad", endpoint)))?;
    let index = index
        .parse()
        .map_err(|_| CliError::InvalidArgs(format!("\"{}\" has no numeric pad index", endpoint)))?;
    Ok((name.to_string(), index))
}

/// Find the data link connecting two pads given by entity-name pattern and
/// pad index.
fn find_link(
    graph: &MediaGraph,
    source: &(String, u32),
    sink: &(String, u32),
) -> Result<u32, CliError> {
    for link in graph.links() {
        if !link.is_data_link() {
            continue;
        }
        let source_pad = graph.source_pad(link)?;
        let sink_pad = graph.sink_pad(link)?;
        let source_entity = graph.entity_of(source_pad)?;
        let sink_entity = graph.entity_of(sink_pad)?;

        if mediactl::glob_match(&source.0, source_entity.name())
            && source_pad.index() == source.1
            && mediactl::glob_match(&sink.0, sink_entity.name())
            && sink_pad.index() == sink.1
        {
            return Ok(link.id());
        }
    }
    Err(CliError::NotFound(format!(
        "no data link \"{}\":{} -> \"{}\":{}",
        source.0, source.1, sink.0, sink.1
    )))
}

pub fn execute(args: Args, json: bool) -> Result<(), CliError> {
    log::debug!("Executing link command: {:?}", args);

    if !args.enable && !args.disable {
        return Err(CliError::InvalidArgs(
            "one of --enable or --disable is required".to_string(),
        ));
    }
    let enable = args.enable;

    let mut device = args.device.open()?;

    let link_id = match (&args.id, &args.source, &args.sink) {
        (Some(id), _, _) => *id,
        (None, Some(source), Some(sink)) => {
            let source = parse_endpoint(source)?;
            let sink = parse_endpoint(sink)?;
            find_link(device.graph(), &source, &sink)?
        }
        _ => {
            return Err(CliError::InvalidArgs(
                "select the link with --id or with --source and --sink".to_string(),
            ))
        }
    };

    device.set_link_enabled(link_id, enable)?;

    let output = Output {
        link_id,
        enabled: enable,
    };
    if json {
        println!("{}", to_json_string(&output)?);
    } else {
        println!(
            "link {} {}",
            output.link_id,
            if output.enabled { "enabled" } else { "disabled" }
        );
    }

    Ok(())
}
