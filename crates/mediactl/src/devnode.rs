// SPDX-License-Identifier: Apache-2.0

//! Device node resolution through sysfs.
//!
//! The kernel reports interfaces as (major, minor) character device
//! numbers; the corresponding `/dev` path comes from the `DEVNAME` field of
//! `/sys/dev/char/<major>:<minor>/uevent`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::Error;

const SYS_DEV_CHAR: &str = "/sys/dev/char";

/// Resolve the `/dev` path registered for a character device number.
///
/// Fails with [`Error::NoDevnode`] when no such node is registered or the
/// uevent record carries no `DEVNAME`.
pub fn path_for_devnode(major: u32, minor: u32) -> Result<PathBuf, Error> {
    path_for_devnode_in(Path::new(SYS_DEV_CHAR), major, minor)
}

pub(crate) fn path_for_devnode_in(root: &Path, major: u32, minor: u32) -> Result<PathBuf, Error> {
    let uevent = root.join(format!("{}:{}", major, minor)).join("uevent");
    let contents = match fs::read_to_string(&uevent) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(Error::NoDevnode { major, minor })
        }
        Err(err) => return Err(Error::Io(err)),
    };

    for line in contents.lines() {
        if let Some(name) = line.strip_prefix("DEVNAME=") {
            return Ok(Path::new("/dev").join(name.trim()));
        }
    }
    Err(Error::NoDevnode { major, minor })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_uevent(root: &Path, major: u32, minor: u32, contents: &str) {
        let dir = root.join(format!("{}:{}", major, minor));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("uevent"), contents).unwrap();
    }

    #[test]
    fn test_devname_resolution() {
        let tmp = tempfile::tempdir().unwrap();
        write_uevent(
            tmp.path(),
            81,
            4,
            "MAJOR=81\nMINOR=4\nDEVNAME=v4l-subdev2\n",
        );

        let path = path_for_devnode_in(tmp.path(), 81, 4).unwrap();
        assert_eq!(path, PathBuf::from("/dev/v4l-subdev2"));
    }

    #[test]
    fn test_devname_with_subdirectory() {
        let tmp = tempfile::tempdir().unwrap();
        write_uevent(tmp.path(), 240, 0, "DEVNAME=dri/card0\n");

        let path = path_for_devnode_in(tmp.path(), 240, 0).unwrap();
        assert_eq!(path, PathBuf::from("/dev/dri/card0"));
    }

    #[test]
    fn test_unregistered_node() {
        let tmp = tempfile::tempdir().unwrap();

        let err = path_for_devnode_in(tmp.path(), 81, 9).unwrap_err();
        assert!(matches!(err, Error::NoDevnode { major: 81, minor: 9 }));
    }

    #[test]
    fn test_uevent_without_devname() {
        let tmp = tempfile::tempdir().unwrap();
        write_uevent(tmp.path(), 81, 4, "MAJOR=81\nMINOR=4\n");

        let err = path_for_devnode_in(tmp.path(), 81, 4).unwrap_err();
        assert!(matches!(err, Error::NoDevnode { major: 81, minor: 4 }));
    }
}
