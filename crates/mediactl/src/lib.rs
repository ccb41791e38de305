// SPDX-License-Identifier: Apache-2.0

//! Media Controller Library for Rust
//!
//! Safe access to the Linux Media Controller subsystem: read a device's
//! topology, navigate it as a strongly-typed object graph of entities,
//! pads, links, and interfaces, and reconfigure data links at runtime.
//!
//! # Quick Start
//!
//! ```no_run
//! use mediactl::MediaDevice;
//!
//! let device = MediaDevice::open("/dev/media0")?;
//! println!("driver: {}", device.info().driver);
//!
//! let graph = device.graph();
//! for entity in graph.entities() {
//!     println!("{} ({} pads)", entity.name(), entity.pad_ids().len());
//! }
//! # Ok::<(), mediactl::Error>(())
//! ```
//!
//! ## Enabling a Link
//!
//! ```no_run
//! use mediactl::MediaDevice;
//!
//! let mut device = MediaDevice::open("/dev/media0")?;
//! let sensor = device
//!     .graph()
//!     .find_entity("ov5640*")
//!     .ok_or(mediactl::Error::DeviceNotFound("ov5640".into()))?;
//! let link_id = device.graph().pad_links(sensor)[0].id();
//! device.set_link_enabled(link_id, true)?;
//! # Ok::<(), mediactl::Error>(())
//! ```
//!
//! # Features
//!
//! - Two-phase `MEDIA_IOC_G_TOPOLOGY` acquisition with change detection
//! - Fully cross-referenced, invariant-checked topology graph
//! - Link enable/disable with typed endpoint checking
//! - Device discovery by driver/model/bus glob patterns
//! - Pixel and metadata format tables with stride/plane arithmetic
//! - Sub-device format/routing queries and V4L2 control enumeration

use std::{error, fmt, io, str};

/// Error type for media controller operations
#[derive(Debug)]
pub enum Error {
    /// I/O error from an open or ioctl system call (device removed,
    /// permission denied, not a media-controller-capable node)
    Io(io::Error),

    /// UTF-8 conversion error when decoding a kernel-supplied string
    Utf8(str::Utf8Error),

    /// The kernel reported a topology that violates the media graph model
    /// (dangling object ID, multiple interfaces on one entity, duplicate ID)
    Malformed(String),

    /// An object or link endpoint was accessed as the wrong concrete kind
    /// (e.g. a pad accessor used on an interface endpoint)
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// The topology changed between the sizing and filling calls of the
    /// two-phase read (hot-plug race); the read may simply be retried
    TopologyChanged {
        sized: TopologyCounts,
        filled: TopologyCounts,
    },

    /// The kernel rejected a link setup request (immutable link, invalid
    /// endpoints, device busy); carries the kernel error code
    LinkSetup(io::Error),

    /// No device node is registered for a (major, minor) pair
    NoDevnode { major: u32, minor: u32 },

    /// No media device matched a discovery pattern
    DeviceNotFound(String),

    /// An object ID not present in the resolved graph was passed to an
    /// operation
    UnknownObject(u32),
}

impl Error {
    /// Whether the operation may be retried as-is.
    ///
    /// Only the sizing/filling count race of the topology read is
    /// retryable; everything else reflects a real failure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::TopologyChanged { .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Utf8(err) => write!(f, "UTF-8 conversion error: {}", err),
            Error::Malformed(msg) => write!(f, "malformed topology: {}", msg),
            Error::TypeMismatch { expected, found } => {
                write!(f, "object type mismatch: expected {}, found {}", expected, found)
            }
            Error::TopologyChanged { sized, filled } => write!(
                f,
                "topology changed between sizing and filling calls ({} != {})",
                sized, filled
            ),
            Error::LinkSetup(err) => write!(f, "link setup rejected: {}", err),
            Error::NoDevnode { major, minor } => {
                write!(f, "no device node registered for ({}, {})", major, minor)
            }
            Error::DeviceNotFound(what) => write!(f, "no media device found: {}", what),
            Error::UnknownObject(id) => write!(f, "no object with id {} in this graph", id),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Utf8(err) => Some(err),
            Error::LinkSetup(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<str::Utf8Error> for Error {
    fn from(err: str::Utf8Error) -> Self {
        Error::Utf8(err)
    }
}

/// The transport module defines the kernel ioctl boundary and its mockable trait.
pub mod transport;

/// The topology module performs the two-phase raw topology read.
pub mod topology;

/// The graph module holds the typed object model and the resolver.
pub mod graph;

/// The device module owns the descriptor, device info, and resolved graph.
pub mod device;

/// The discover module finds media devices by info-field glob patterns.
pub mod discover;

/// The devnode module maps (major, minor) pairs to /dev paths via sysfs.
pub mod devnode;

/// The formats module provides the static pixel/meta format tables.
pub mod formats;

/// The subdev module layers format and routing queries over entity devnodes.
pub mod subdev;

/// The controls module enumerates V4L2 controls on an open device node.
pub mod controls;

pub use device::{DeviceInfo, KernelVersion, MediaDevice};
pub use discover::{find_media_device, glob_match, InfoField};
pub use graph::{Entity, Interface, Link, MediaGraph, Object, Pad};
pub use subdev::{Route, SubDevice, VideoDevice, Which};
pub use topology::{RawTopology, TopologyCounts};
pub use transport::{KernelTransport, MediaTransport};
