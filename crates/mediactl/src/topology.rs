// SPDX-License-Identifier: Apache-2.0

//! Two-phase raw topology acquisition.
//!
//! `MEDIA_IOC_G_TOPOLOGY` is read in two calls: a sizing call with all
//! array pointers null to learn the object counts, then a filling call with
//! caller-allocated arrays. The kernel can add or remove objects between
//! the two calls (device hot-plug), which surfaces as a count mismatch and
//! is reported as a retryable error rather than papered over.

use std::fmt;

use mediactl_sys as sys;

use crate::transport::MediaTransport;
use crate::Error;

/// Object counts reported by a topology call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopologyCounts {
    pub entities: u32,
    pub interfaces: u32,
    pub pads: u32,
    pub links: u32,
}

impl TopologyCounts {
    fn from_raw(topology: &sys::media_v2_topology) -> Self {
        TopologyCounts {
            entities: topology.num_entities,
            interfaces: topology.num_interfaces,
            pads: topology.num_pads,
            links: topology.num_links,
        }
    }
}

impl fmt::Display for TopologyCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entities, {} interfaces, {} pads, {} links",
            self.entities, self.interfaces, self.pads, self.links
        )
    }
}

/// A raw topology snapshot: the kernel's record arrays plus the topology
/// version counter, before any cross-referencing.
#[derive(Debug, Clone, Default)]
pub struct RawTopology {
    pub version: u64,
    pub entities: Vec<sys::media_v2_entity>,
    pub interfaces: Vec<sys::media_v2_interface>,
    pub pads: Vec<sys::media_v2_pad>,
    pub links: Vec<sys::media_v2_link>,
}

impl RawTopology {
    pub fn counts(&self) -> TopologyCounts {
        TopologyCounts {
            entities: self.entities.len() as u32,
            interfaces: self.interfaces.len() as u32,
            pads: self.pads.len() as u32,
            links: self.links.len() as u32,
        }
    }
}

/// Read a complete raw topology snapshot from a transport.
///
/// Returns [`Error::TopologyChanged`] when the counts of the filling call
/// differ from the sizing call; callers may retry the whole read.
pub fn read_topology(transport: &dyn MediaTransport) -> Result<RawTopology, Error> {
    let mut topology = sys::media_v2_topology::default();
    transport.get_topology(&mut topology)?;
    let sized = TopologyCounts::from_raw(&topology);
    log::debug!(
        "topology v{}: {}",
        topology.topology_version,
        sized
    );

    let mut entities = vec![sys::media_v2_entity::default(); sized.entities as usize];
    let mut interfaces = vec![sys::media_v2_interface::default(); sized.interfaces as usize];
    let mut pads = vec![sys::media_v2_pad::default(); sized.pads as usize];
    let mut links = vec![sys::media_v2_link::default(); sized.links as usize];

    if !entities.is_empty() {
        topology.ptr_entities = entities.as_mut_ptr() as u64;
    }
    if !interfaces.is_empty() {
        topology.ptr_interfaces = interfaces.as_mut_ptr() as u64;
    }
    if !pads.is_empty() {
        topology.ptr_pads = pads.as_mut_ptr() as u64;
    }
    if !links.is_empty() {
        topology.ptr_links = links.as_mut_ptr() as u64;
    }

    transport.get_topology(&mut topology)?;
    let filled = TopologyCounts::from_raw(&topology);
    if filled != sized {
        log::debug!("topology changed during read: {} -> {}", sized, filled);
        return Err(Error::TopologyChanged { sized, filled });
    }

    Ok(RawTopology {
        version: topology.topology_version,
        entities,
        interfaces,
        pads,
        links,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_display() {
        let counts = TopologyCounts {
            entities: 12,
            interfaces: 2,
            pads: 30,
            links: 28,
        };
        assert_eq!(counts.to_string(), "12 entities, 2 interfaces, 30 pads, 28 links");
    }

    #[test]
    fn test_raw_topology_counts() {
        let raw = RawTopology {
            version: 1,
            entities: vec![sys::media_v2_entity::default(); 3],
            interfaces: vec![],
            pads: vec![sys::media_v2_pad::default(); 4],
            links: vec![sys::media_v2_link::default(); 2],
        };
        let counts = raw.counts();
        assert_eq!(counts.entities, 3);
        assert_eq!(counts.interfaces, 0);
        assert_eq!(counts.pads, 4);
        assert_eq!(counts.links, 2);
    }
}
