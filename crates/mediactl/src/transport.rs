// SPDX-License-Identifier: Apache-2.0

//! Kernel ioctl boundary.
//!
//! Every kernel interaction of a [`crate::MediaDevice`] goes through the
//! [`MediaTransport`] trait, so the protocol and graph layers can be tested
//! against an in-memory fake. [`KernelTransport`] is the real thing: an open
//! media device node plus the three media controller ioctls.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use mediactl_sys as sys;

use crate::{devnode, Error};

/// The ioctl surface of a media controller device node.
pub trait MediaTransport {
    /// Query the static device information record.
    fn device_info(&self) -> Result<sys::media_device_info, Error>;

    /// Issue a single `MEDIA_IOC_G_TOPOLOGY` call. With all array pointers
    /// null the kernel only fills in the counts; with pointers set it fills
    /// the arrays. The two-phase protocol lives in [`crate::topology`].
    fn get_topology(&self, topology: &mut sys::media_v2_topology) -> Result<(), Error>;

    /// Issue a `MEDIA_IOC_SETUP_LINK` call for one link descriptor.
    fn setup_link(&self, desc: &sys::media_link_desc) -> Result<(), Error>;

    /// Resolve the device node path for an interface's (major, minor) pair.
    /// The default goes through sysfs; fakes override it.
    fn devnode_path(&self, major: u32, minor: u32) -> Result<PathBuf, Error> {
        devnode::path_for_devnode(major, minor)
    }
}

/// Issue an ioctl on a raw descriptor, mapping failure to the calling
/// thread's errno.
pub(crate) fn ioctl<T>(fd: RawFd, request: libc::c_ulong, arg: *mut T) -> Result<(), Error> {
    // SAFETY: the caller passes a pointer to a properly sized and aligned
    // argument struct matching the request code.
    let ret = unsafe { libc::ioctl(fd, request as _, arg) };
    if ret < 0 {
        Err(Error::Io(io::Error::last_os_error()))
    } else {
        Ok(())
    }
}

/// Real transport over an open `/dev/mediaN` node.
///
/// The node is opened read-write and non-blocking; the descriptor is closed
/// when the transport is dropped.
#[derive(Debug)]
pub struct KernelTransport {
    file: File,
}

impl KernelTransport {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(path)?;
        log::debug!("opened media device {}", path.display());
        Ok(KernelTransport { file })
    }
}

impl AsRawFd for KernelTransport {
    fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}

impl MediaTransport for KernelTransport {
    fn device_info(&self) -> Result<sys::media_device_info, Error> {
        let mut info = sys::media_device_info::default();
        ioctl(self.file.as_raw_fd(), sys::MEDIA_IOC_DEVICE_INFO, &mut info)?;
        Ok(info)
    }

    fn get_topology(&self, topology: &mut sys::media_v2_topology) -> Result<(), Error> {
        ioctl(self.file.as_raw_fd(), sys::MEDIA_IOC_G_TOPOLOGY, topology)
    }

    fn setup_link(&self, desc: &sys::media_link_desc) -> Result<(), Error> {
        // The request is _IOWR, so hand the kernel a writable copy.
        let mut desc = *desc;
        ioctl(self.file.as_raw_fd(), sys::MEDIA_IOC_SETUP_LINK, &mut desc)
    }
}
