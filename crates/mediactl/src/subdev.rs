// SPDX-License-Identifier: Apache-2.0

//! Read-only queries against the device nodes behind graph entities.
//!
//! A [`SubDevice`] wraps the `/dev/v4l-subdevN` node of an entity with a
//! sub-device interface and answers per-pad format and routing queries; a
//! [`VideoDevice`] wraps a `/dev/videoN` node and reports the configured
//! capture format. Both are opened from a resolved graph, so the entity to
//! devnode mapping is never guessed.

use std::fs::{File, OpenOptions};
use std::os::fd::{AsRawFd, RawFd};

use mediactl_sys as sys;

use crate::graph::{Entity, MediaGraph};
use crate::transport::ioctl;
use crate::Error;

/// Which format state a sub-device query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Which {
    Try,
    Active,
}

impl Which {
    fn raw(self) -> u32 {
        match self {
            Which::Try => sys::V4L2_SUBDEV_FORMAT_TRY,
            Which::Active => sys::V4L2_SUBDEV_FORMAT_ACTIVE,
        }
    }
}

/// A stream route through a sub-device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub sink_pad: u32,
    pub sink_stream: u32,
    pub source_pad: u32,
    pub source_stream: u32,
    pub active: bool,
}

impl Route {
    fn from_raw(raw: &sys::v4l2_subdev_route) -> Self {
        Route {
            sink_pad: raw.sink_pad,
            sink_stream: raw.sink_stream,
            source_pad: raw.source_pad,
            source_stream: raw.source_stream,
            active: raw.flags & sys::V4L2_SUBDEV_ROUTE_FL_ACTIVE != 0,
        }
    }
}

fn open_entity_node(
    graph: &MediaGraph,
    entity: &Entity,
    want_subdev: bool,
) -> Result<(File, String), Error> {
    let expected = if want_subdev {
        "sub-device interface"
    } else {
        "video interface"
    };
    let iface = graph.interface_of(entity).ok_or(Error::TypeMismatch {
        expected,
        found: "entity without interface",
    })?;
    let ok = if want_subdev {
        iface.is_subdev()
    } else {
        iface.is_video()
    };
    if !ok {
        return Err(Error::TypeMismatch {
            expected,
            found: iface.interface_type().name(),
        });
    }
    let file = OpenOptions::new().read(true).open(iface.dev_path())?;
    log::debug!(
        "opened {} for entity \"{}\"",
        iface.dev_path().display(),
        entity.name()
    );
    Ok((file, entity.name().to_string()))
}

/// An open V4L2 sub-device node.
#[derive(Debug)]
pub struct SubDevice {
    file: File,
    entity_name: String,
}

impl SubDevice {
    /// Open the sub-device node behind a graph entity. Fails with a type
    /// mismatch when the entity has no interface or a non-subdev one.
    pub fn from_entity(graph: &MediaGraph, entity: &Entity) -> Result<Self, Error> {
        let (file, entity_name) = open_entity_node(graph, entity, true)?;
        Ok(SubDevice { file, entity_name })
    }

    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    /// Query the media bus format on one pad/stream.
    pub fn format(
        &self,
        which: Which,
        pad: u32,
        stream: u32,
    ) -> Result<sys::v4l2_mbus_framefmt, Error> {
        let mut fmt = sys::v4l2_subdev_format {
            which: which.raw(),
            pad,
            stream,
            ..Default::default()
        };
        ioctl(self.file.as_raw_fd(), sys::VIDIOC_SUBDEV_G_FMT, &mut fmt)?;
        Ok(fmt.format)
    }

    /// Query the active stream routing table.
    ///
    /// Sub-devices without streams support answer the routing ioctl with
    /// ENOTTY; that is reported as an empty table, not an error.
    pub fn routes(&self) -> Result<Vec<Route>, Error> {
        let mut routing = sys::v4l2_subdev_routing {
            which: sys::V4L2_SUBDEV_FORMAT_ACTIVE,
            ..Default::default()
        };
        match ioctl(
            self.file.as_raw_fd(),
            sys::VIDIOC_SUBDEV_G_ROUTING,
            &mut routing,
        ) {
            Ok(()) => {}
            Err(Error::Io(err)) if err.raw_os_error() == Some(libc::ENOTTY) => {
                return Ok(Vec::new())
            }
            Err(err) => return Err(err),
        }

        let mut raw_routes =
            vec![sys::v4l2_subdev_route::default(); routing.num_routes as usize];
        if !raw_routes.is_empty() {
            routing.len_routes = routing.num_routes;
            routing.routes = raw_routes.as_mut_ptr() as u64;
            ioctl(
                self.file.as_raw_fd(),
                sys::VIDIOC_SUBDEV_G_ROUTING,
                &mut routing,
            )?;
            raw_routes.truncate(routing.num_routes as usize);
        }
        Ok(raw_routes.iter().map(Route::from_raw).collect())
    }
}

impl AsRawFd for SubDevice {
    fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}

/// An open V4L2 video capture node.
#[derive(Debug)]
pub struct VideoDevice {
    file: File,
    entity_name: String,
}

impl VideoDevice {
    /// Open the video node behind a graph entity. Fails with a type
    /// mismatch when the entity has no interface or a non-video one.
    pub fn from_entity(graph: &MediaGraph, entity: &Entity) -> Result<Self, Error> {
        let (file, entity_name) = open_entity_node(graph, entity, false)?;
        Ok(VideoDevice { file, entity_name })
    }

    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    /// Query the currently configured single-planar capture format.
    pub fn capture_format(&self) -> Result<sys::v4l2_pix_format, Error> {
        let mut fmt = sys::v4l2_format {
            type_: sys::V4L2_BUF_TYPE_VIDEO_CAPTURE,
            fmt: sys::v4l2_format_union {
                raw_data: [0; 200],
            },
        };
        ioctl(self.file.as_raw_fd(), sys::VIDIOC_G_FMT, &mut fmt)?;
        // SAFETY: the kernel filled the pix member for the single-planar
        // capture buffer type requested above.
        Ok(unsafe { fmt.fmt.pix })
    }
}

impl AsRawFd for VideoDevice {
    fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}
