// SPDX-License-Identifier: Apache-2.0

//! V4L2 control enumeration.
//!
//! Walks the extended control space of an open device node with the
//! `NEXT_CTRL | NEXT_COMPOUND` chaining flags, grouping controls under the
//! control-class records the kernel interleaves into the walk. Menu and
//! integer-menu controls get their valid items enumerated index by index;
//! indices the driver rejects are simply skipped (sparse menus are legal).

use std::os::fd::AsRawFd;

use mediactl_sys as sys;

use crate::transport::ioctl;
use crate::Error;

/// Control value type (`V4L2_CTRL_TYPE_*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlType {
    Integer,
    Boolean,
    Menu,
    Button,
    Integer64,
    CtrlClass,
    String,
    Bitmask,
    IntegerMenu,
    Other(u32),
}

impl ControlType {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            sys::V4L2_CTRL_TYPE_INTEGER => ControlType::Integer,
            sys::V4L2_CTRL_TYPE_BOOLEAN => ControlType::Boolean,
            sys::V4L2_CTRL_TYPE_MENU => ControlType::Menu,
            sys::V4L2_CTRL_TYPE_BUTTON => ControlType::Button,
            sys::V4L2_CTRL_TYPE_INTEGER64 => ControlType::Integer64,
            sys::V4L2_CTRL_TYPE_CTRL_CLASS => ControlType::CtrlClass,
            sys::V4L2_CTRL_TYPE_STRING => ControlType::String,
            sys::V4L2_CTRL_TYPE_BITMASK => ControlType::Bitmask,
            sys::V4L2_CTRL_TYPE_INTEGER_MENU => ControlType::IntegerMenu,
            other => ControlType::Other(other),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ControlType::Integer => "integer",
            ControlType::Boolean => "boolean",
            ControlType::Menu => "menu",
            ControlType::Button => "button",
            ControlType::Integer64 => "integer64",
            ControlType::CtrlClass => "control-class",
            ControlType::String => "string",
            ControlType::Bitmask => "bitmask",
            ControlType::IntegerMenu => "integer-menu",
            ControlType::Other(_) => "other",
        }
    }
}

/// One valid menu entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuItem {
    /// Named entry of a regular menu control.
    Name(u32, String),
    /// Numeric entry of an integer menu control.
    Value(u32, i64),
}

/// A decoded control record, with menu items where applicable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub id: u32,
    pub control_type: ControlType,
    pub name: String,
    pub minimum: i64,
    pub maximum: i64,
    pub step: u64,
    pub default_value: i64,
    pub flags: u32,
    pub elem_size: u32,
    pub elems: u32,
    pub dims: Vec<u32>,
    pub menu_items: Vec<MenuItem>,
}

/// Controls grouped under one control class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlClass {
    pub name: String,
    pub controls: Vec<Control>,
}

fn decode_name(bytes: &[u8]) -> Result<String, Error> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    Ok(std::str::from_utf8(&bytes[..end])?.to_string())
}

fn menu_items(
    fd: std::os::fd::RawFd,
    ctrl: &sys::v4l2_query_ext_ctrl,
) -> Vec<MenuItem> {
    let control_type = ControlType::from_raw(ctrl.type_);
    let mut items = Vec::new();
    for index in ctrl.minimum..=ctrl.maximum {
        let mut menu = sys::v4l2_querymenu {
            id: ctrl.id,
            index: index as u32,
            name: [0; 32],
            reserved: 0,
        };
        if ioctl(fd, sys::VIDIOC_QUERYMENU, &mut menu).is_err() {
            continue;
        }
        let name = menu.name;
        match control_type {
            ControlType::IntegerMenu => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&name[..8]);
                items.push(MenuItem::Value(index as u32, i64::from_le_bytes(raw)));
            }
            _ => {
                if let Ok(text) = decode_name(&name) {
                    items.push(MenuItem::Name(index as u32, text));
                }
            }
        }
    }
    items
}

/// Enumerate every control of a device node, grouped by control class.
///
/// Controls reported before the first class record land in a synthetic
/// "User Controls" group, matching how drivers without class markers
/// present the user control space.
pub fn enumerate_controls<D: AsRawFd>(device: &D) -> Result<Vec<ControlClass>, Error> {
    let fd = device.as_raw_fd();
    let mut classes = vec![ControlClass {
        name: "User Controls".to_string(),
        controls: Vec::new(),
    }];

    let mut next_id = sys::V4L2_CTRL_FLAG_NEXT_CTRL | sys::V4L2_CTRL_FLAG_NEXT_COMPOUND;
    loop {
        let mut query = sys::v4l2_query_ext_ctrl::default();
        query.id = next_id;
        // The walk ends when the driver rejects the next-control query.
        if ioctl(fd, sys::VIDIOC_QUERY_EXT_CTRL, &mut query).is_err() {
            break;
        }

        let control_type = ControlType::from_raw(query.type_);
        let name = decode_name(&query.name)?;

        if control_type == ControlType::CtrlClass {
            classes.push(ControlClass {
                name: name.clone(),
                controls: Vec::new(),
            });
        }

        let items = match control_type {
            ControlType::Menu | ControlType::IntegerMenu => menu_items(fd, &query),
            _ => Vec::new(),
        };

        let control = Control {
            id: query.id,
            control_type,
            name,
            minimum: query.minimum,
            maximum: query.maximum,
            step: query.step,
            default_value: query.default_value,
            flags: query.flags,
            elem_size: query.elem_size,
            elems: query.elems,
            dims: query.dims[..query.nr_of_dims as usize].to_vec(),
            menu_items: items,
        };
        if let Some(class) = classes.last_mut() {
            class.controls.push(control);
        }

        next_id = query.id
            | sys::V4L2_CTRL_FLAG_NEXT_CTRL
            | sys::V4L2_CTRL_FLAG_NEXT_COMPOUND;
    }

    // Drop the synthetic group when everything had a proper class.
    if classes[0].controls.is_empty() && classes.len() > 1 {
        classes.remove(0);
    }
    Ok(classes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_type_classification() {
        assert_eq!(
            ControlType::from_raw(sys::V4L2_CTRL_TYPE_INTEGER),
            ControlType::Integer
        );
        assert_eq!(
            ControlType::from_raw(sys::V4L2_CTRL_TYPE_CTRL_CLASS),
            ControlType::CtrlClass
        );
        assert_eq!(ControlType::from_raw(0x0100), ControlType::Other(0x0100));
        assert_eq!(ControlType::Bitmask.name(), "bitmask");
    }
}
