// SPDX-License-Identifier: Apache-2.0

//! Media device handle: device information plus the resolved topology
//! graph, with runtime link setup.

use std::fmt;
use std::path::Path;

use mediactl_sys as sys;

use crate::discover::{self, InfoField};
use crate::graph::MediaGraph;
use crate::topology;
use crate::transport::{KernelTransport, MediaTransport};
use crate::Error;

/// A kernel-style packed version number (`major.minor.patch`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct KernelVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl From<u32> for KernelVersion {
    fn from(raw: u32) -> Self {
        KernelVersion {
            major: ((raw >> 16) & 0xff) as u8,
            minor: ((raw >> 8) & 0xff) as u8,
            patch: (raw & 0xff) as u8,
        }
    }
}

impl fmt::Display for KernelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Decoded `MEDIA_IOC_DEVICE_INFO` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub driver: String,
    pub model: String,
    pub serial: String,
    pub bus_info: String,
    pub media_version: KernelVersion,
    pub hw_revision: u32,
    pub driver_version: KernelVersion,
}

impl DeviceInfo {
    pub(crate) fn from_raw(raw: &sys::media_device_info) -> Result<Self, Error> {
        Ok(DeviceInfo {
            driver: decode_field(&raw.driver)?,
            model: decode_field(&raw.model)?,
            serial: decode_field(&raw.serial)?,
            bus_info: decode_field(&raw.bus_info)?,
            media_version: KernelVersion::from(raw.media_version),
            hw_revision: raw.hw_revision,
            driver_version: KernelVersion::from(raw.driver_version),
        })
    }
}

fn decode_field(bytes: &[u8]) -> Result<String, Error> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    Ok(std::str::from_utf8(&bytes[..end])?.to_string())
}

/// An open media controller device.
///
/// Owns the transport, the decoded device information, and the resolved
/// topology graph. The graph is a snapshot: it only changes through
/// [`MediaDevice::refresh`] (whole new graph) or a successful
/// [`MediaDevice::set_link_enabled`] (per-link flag mirror).
pub struct MediaDevice {
    transport: Box<dyn MediaTransport>,
    info: DeviceInfo,
    graph: MediaGraph,
}

impl MediaDevice {
    /// Open a media device node and read its topology.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::with_transport(Box::new(KernelTransport::open(path)?))
    }

    /// Open the first media device whose info field matches a glob pattern
    /// (e.g. the `Model` field against `"imx8*"`).
    pub fn open_matching(field: InfoField, pattern: &str) -> Result<Self, Error> {
        let path = discover::find_media_device(field, pattern)?;
        Self::open(path)
    }

    /// Build a device over an arbitrary transport.
    pub fn with_transport(transport: Box<dyn MediaTransport>) -> Result<Self, Error> {
        let info = DeviceInfo::from_raw(&transport.device_info()?)?;
        log::debug!(
            "media device: driver {} model \"{}\" bus {}",
            info.driver,
            info.model,
            info.bus_info
        );
        let graph = read_graph(transport.as_ref())?;
        Ok(MediaDevice {
            transport,
            info,
            graph,
        })
    }

    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    pub fn graph(&self) -> &MediaGraph {
        &self.graph
    }

    /// Re-read the topology, atomically replacing the graph. On failure the
    /// previous graph stays in place.
    pub fn refresh(&mut self) -> Result<(), Error> {
        self.graph = read_graph(self.transport.as_ref())?;
        Ok(())
    }

    /// Enable or disable a data link.
    ///
    /// Both endpoints must be pads; interface links fail with a type
    /// mismatch before any kernel call. Only the enabled bit is sent on the
    /// wire. On success the in-memory link flags are set to exactly the
    /// requested value; on failure they are left untouched and the kernel's
    /// rejection is surfaced as [`Error::LinkSetup`].
    pub fn set_link_enabled(&mut self, link_id: u32, enabled: bool) -> Result<(), Error> {
        let (desc, flags) = {
            let link = self
                .graph
                .link(link_id)
                .ok_or(Error::UnknownObject(link_id))?;
            let source = self.graph.source_pad(link)?;
            let sink = self.graph.sink_pad(link)?;
            let source_entity = self.graph.entity_of(source)?;
            let sink_entity = self.graph.entity_of(sink)?;

            let flags = if enabled { sys::MEDIA_LNK_FL_ENABLED } else { 0 };
            let desc = sys::media_link_desc {
                source: sys::media_pad_desc {
                    entity: source_entity.id(),
                    index: source.index() as u16,
                    flags: 0,
                    reserved: [0; 2],
                },
                sink: sys::media_pad_desc {
                    entity: sink_entity.id(),
                    index: sink.index() as u16,
                    flags: 0,
                    reserved: [0; 2],
                },
                flags,
                reserved: [0; 2],
            };
            (desc, flags)
        };

        self.transport.setup_link(&desc).map_err(|err| match err {
            Error::Io(io) => Error::LinkSetup(io),
            other => other,
        })?;

        self.graph.set_link_flags(link_id, flags);
        log::debug!(
            "link {} {}",
            link_id,
            if enabled { "enabled" } else { "disabled" }
        );
        Ok(())
    }
}

impl fmt::Debug for MediaDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaDevice")
            .field("info", &self.info)
            .field("graph_version", &self.graph.version())
            .finish()
    }
}

fn read_graph(transport: &dyn MediaTransport) -> Result<MediaGraph, Error> {
    let raw = topology::read_topology(transport)?;
    MediaGraph::resolve_with(&raw, &|major, minor| transport.devnode_path(major, minor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_version_decoding() {
        let version = KernelVersion::from(0x0006_0107);
        assert_eq!(
            version,
            KernelVersion {
                major: 6,
                minor: 1,
                patch: 7
            }
        );
        assert_eq!(version.to_string(), "6.1.7");
    }

    #[test]
    fn test_device_info_decoding() {
        let mut raw = sys::media_device_info::default();
        raw.driver[..8].copy_from_slice(b"mxc-isi\0");
        raw.model[..9].copy_from_slice(b"FSL MXC8\0");
        raw.bus_info[..9].copy_from_slice(b"platform\0");
        raw.media_version = 0x0005_0f02;
        raw.driver_version = 0x0005_0f02;
        raw.hw_revision = 0x10;

        let info = DeviceInfo::from_raw(&raw).unwrap();
        assert_eq!(info.driver, "mxc-isi");
        assert_eq!(info.model, "FSL MXC8");
        assert_eq!(info.serial, "");
        assert_eq!(info.bus_info, "platform");
        assert_eq!(info.media_version.to_string(), "5.15.2");
        assert_eq!(info.hw_revision, 0x10);
    }

    #[test]
    fn test_device_info_invalid_utf8() {
        let mut raw = sys::media_device_info::default();
        raw.driver[0] = 0xff;
        raw.driver[1] = 0xfe;

        let err = DeviceInfo::from_raw(&raw).unwrap_err();
        assert!(matches!(err, Error::Utf8(_)));
    }
}
