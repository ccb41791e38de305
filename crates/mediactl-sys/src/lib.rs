// SPDX-License-Identifier: Apache-2.0

//! Raw Linux Media Controller and V4L2 UAPI definitions.
//!
//! Hand-written `#[repr(C)]` mirrors of the structures and constants from
//! `linux/media.h` and the parts of `linux/videodev2.h` and
//! `linux/v4l2-subdev.h` used by the safe `mediactl` crate. The media UAPI
//! is small and frozen, so the structs are maintained by hand against the
//! kernel headers rather than generated.
//!
//! Everything here is plain data: no ioctl calls are issued from this crate.

#![allow(non_camel_case_types)]

use libc::c_ulong;
use std::mem::size_of;

// ---------------------------------------------------------------------------
// ioctl request encoding (asm-generic/ioctl.h)
// ---------------------------------------------------------------------------

const _IOC_NRSHIFT: c_ulong = 0;
const _IOC_TYPESHIFT: c_ulong = 8;
const _IOC_SIZESHIFT: c_ulong = 16;
const _IOC_DIRSHIFT: c_ulong = 30;

const _IOC_WRITE: c_ulong = 1;
const _IOC_READ: c_ulong = 2;

const fn ioc(dir: c_ulong, ty: u8, nr: u8, size: usize) -> c_ulong {
    (dir << _IOC_DIRSHIFT)
        | ((ty as c_ulong) << _IOC_TYPESHIFT)
        | ((nr as c_ulong) << _IOC_NRSHIFT)
        | ((size as c_ulong) << _IOC_SIZESHIFT)
}

const fn iowr(ty: u8, nr: u8, size: usize) -> c_ulong {
    ioc(_IOC_READ | _IOC_WRITE, ty, nr, size)
}

// ---------------------------------------------------------------------------
// linux/media.h
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct media_device_info {
    pub driver: [u8; 16],
    pub model: [u8; 32],
    pub serial: [u8; 40],
    pub bus_info: [u8; 32],
    pub media_version: u32,
    pub hw_revision: u32,
    pub driver_version: u32,
    pub reserved: [u32; 31],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct media_v2_entity {
    pub id: u32,
    pub name: [u8; 64],
    pub function: u32,
    pub flags: u32,
    pub reserved: [u32; 5],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct media_v2_intf_devnode {
    pub major: u32,
    pub minor: u32,
}

/// The kernel declares the devnode as an anonymous union padded to 16 u32s.
/// Only the devnode member is ever populated for the interface types we
/// handle, so the rest of the union is kept as explicit padding.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct media_v2_interface {
    pub id: u32,
    pub intf_type: u32,
    pub flags: u32,
    pub reserved: [u32; 9],
    pub devnode: media_v2_intf_devnode,
    pub raw: [u32; 14],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct media_v2_pad {
    pub id: u32,
    pub entity_id: u32,
    pub flags: u32,
    pub index: u32,
    pub reserved: [u32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct media_v2_link {
    pub id: u32,
    pub source_id: u32,
    pub sink_id: u32,
    pub flags: u32,
    pub reserved: [u32; 6],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct media_v2_topology {
    pub topology_version: u64,
    pub num_entities: u32,
    pub reserved1: u32,
    pub ptr_entities: u64,
    pub num_interfaces: u32,
    pub reserved2: u32,
    pub ptr_interfaces: u64,
    pub num_pads: u32,
    pub reserved3: u32,
    pub ptr_pads: u64,
    pub num_links: u32,
    pub reserved4: u32,
    pub ptr_links: u64,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct media_pad_desc {
    pub entity: u32,
    pub index: u16,
    pub flags: u32,
    pub reserved: [u32; 2],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct media_link_desc {
    pub source: media_pad_desc,
    pub sink: media_pad_desc,
    pub flags: u32,
    pub reserved: [u32; 2],
}

pub const MEDIA_IOC_DEVICE_INFO: c_ulong = iowr(b'|', 0x00, size_of::<media_device_info>());
pub const MEDIA_IOC_SETUP_LINK: c_ulong = iowr(b'|', 0x03, size_of::<media_link_desc>());
pub const MEDIA_IOC_G_TOPOLOGY: c_ulong = iowr(b'|', 0x04, size_of::<media_v2_topology>());

// Entity functions
pub const MEDIA_ENT_F_BASE: u32 = 0x0000_0000;
pub const MEDIA_ENT_F_OLD_BASE: u32 = 0x0001_0000;
pub const MEDIA_ENT_F_OLD_SUBDEV_BASE: u32 = 0x0002_0000;

pub const MEDIA_ENT_F_UNKNOWN: u32 = MEDIA_ENT_F_BASE;
pub const MEDIA_ENT_F_V4L2_SUBDEV_UNKNOWN: u32 = MEDIA_ENT_F_OLD_SUBDEV_BASE;

pub const MEDIA_ENT_F_DTV_DEMOD: u32 = MEDIA_ENT_F_BASE + 0x0000_0001;
pub const MEDIA_ENT_F_TS_DEMUX: u32 = MEDIA_ENT_F_BASE + 0x0000_0002;
pub const MEDIA_ENT_F_DTV_CA: u32 = MEDIA_ENT_F_BASE + 0x0000_0003;
pub const MEDIA_ENT_F_DTV_NET_DECAP: u32 = MEDIA_ENT_F_BASE + 0x0000_0004;

pub const MEDIA_ENT_F_IO_V4L: u32 = MEDIA_ENT_F_OLD_BASE + 1;
pub const MEDIA_ENT_F_IO_DTV: u32 = MEDIA_ENT_F_BASE + 0x0000_1001;
pub const MEDIA_ENT_F_IO_VBI: u32 = MEDIA_ENT_F_BASE + 0x0000_1002;
pub const MEDIA_ENT_F_IO_SWRADIO: u32 = MEDIA_ENT_F_BASE + 0x0000_1003;

pub const MEDIA_ENT_F_IF_VID_DECODER: u32 = MEDIA_ENT_F_BASE + 0x0000_2001;
pub const MEDIA_ENT_F_IF_AUD_DECODER: u32 = MEDIA_ENT_F_BASE + 0x0000_2002;

pub const MEDIA_ENT_F_AUDIO_CAPTURE: u32 = MEDIA_ENT_F_BASE + 0x0000_3001;
pub const MEDIA_ENT_F_AUDIO_PLAYBACK: u32 = MEDIA_ENT_F_BASE + 0x0000_3002;
pub const MEDIA_ENT_F_AUDIO_MIXER: u32 = MEDIA_ENT_F_BASE + 0x0000_3003;

pub const MEDIA_ENT_F_PROC_VIDEO_COMPOSER: u32 = MEDIA_ENT_F_BASE + 0x0000_4001;
pub const MEDIA_ENT_F_PROC_VIDEO_PIXEL_FORMATTER: u32 = MEDIA_ENT_F_BASE + 0x0000_4002;
pub const MEDIA_ENT_F_PROC_VIDEO_PIXEL_ENC_CONV: u32 = MEDIA_ENT_F_BASE + 0x0000_4003;
pub const MEDIA_ENT_F_PROC_VIDEO_LUT: u32 = MEDIA_ENT_F_BASE + 0x0000_4004;
pub const MEDIA_ENT_F_PROC_VIDEO_SCALER: u32 = MEDIA_ENT_F_BASE + 0x0000_4005;
pub const MEDIA_ENT_F_PROC_VIDEO_STATISTICS: u32 = MEDIA_ENT_F_BASE + 0x0000_4006;
pub const MEDIA_ENT_F_PROC_VIDEO_ENCODER: u32 = MEDIA_ENT_F_BASE + 0x0000_4007;
pub const MEDIA_ENT_F_PROC_VIDEO_DECODER: u32 = MEDIA_ENT_F_BASE + 0x0000_4008;
pub const MEDIA_ENT_F_PROC_VIDEO_ISP: u32 = MEDIA_ENT_F_BASE + 0x0000_4009;

pub const MEDIA_ENT_F_VID_MUX: u32 = MEDIA_ENT_F_BASE + 0x0000_5001;
pub const MEDIA_ENT_F_VID_IF_BRIDGE: u32 = MEDIA_ENT_F_BASE + 0x0000_5002;

pub const MEDIA_ENT_F_CAM_SENSOR: u32 = MEDIA_ENT_F_OLD_SUBDEV_BASE + 1;
pub const MEDIA_ENT_F_FLASH: u32 = MEDIA_ENT_F_OLD_SUBDEV_BASE + 2;
pub const MEDIA_ENT_F_LENS: u32 = MEDIA_ENT_F_OLD_SUBDEV_BASE + 3;
pub const MEDIA_ENT_F_ATV_DECODER: u32 = MEDIA_ENT_F_OLD_SUBDEV_BASE + 4;
pub const MEDIA_ENT_F_TUNER: u32 = MEDIA_ENT_F_OLD_SUBDEV_BASE + 5;

// Entity flags
pub const MEDIA_ENT_FL_DEFAULT: u32 = 1 << 0;
pub const MEDIA_ENT_FL_CONNECTOR: u32 = 1 << 1;

// Pad flags
pub const MEDIA_PAD_FL_SINK: u32 = 1 << 0;
pub const MEDIA_PAD_FL_SOURCE: u32 = 1 << 1;
pub const MEDIA_PAD_FL_MUST_CONNECT: u32 = 1 << 2;
pub const MEDIA_PAD_FL_INTERNAL: u32 = 1 << 3;

// Link flags
pub const MEDIA_LNK_FL_ENABLED: u32 = 1 << 0;
pub const MEDIA_LNK_FL_IMMUTABLE: u32 = 1 << 1;
pub const MEDIA_LNK_FL_DYNAMIC: u32 = 1 << 2;
pub const MEDIA_LNK_FL_LINK_TYPE: u32 = 0xf << 28;
pub const MEDIA_LNK_FL_DATA_LINK: u32 = 0 << 28;
pub const MEDIA_LNK_FL_INTERFACE_LINK: u32 = 1 << 28;
pub const MEDIA_LNK_FL_ANCILLARY_LINK: u32 = 2 << 28;

// Interface types
pub const MEDIA_INTF_T_DVB_BASE: u32 = 0x0000_0100;
pub const MEDIA_INTF_T_V4L_BASE: u32 = 0x0000_0200;
pub const MEDIA_INTF_T_ALSA_BASE: u32 = 0x0000_0300;

pub const MEDIA_INTF_T_DVB_FE: u32 = MEDIA_INTF_T_DVB_BASE;
pub const MEDIA_INTF_T_DVB_DEMUX: u32 = MEDIA_INTF_T_DVB_BASE + 1;
pub const MEDIA_INTF_T_DVB_DVR: u32 = MEDIA_INTF_T_DVB_BASE + 2;
pub const MEDIA_INTF_T_DVB_CA: u32 = MEDIA_INTF_T_DVB_BASE + 3;
pub const MEDIA_INTF_T_DVB_NET: u32 = MEDIA_INTF_T_DVB_BASE + 4;

pub const MEDIA_INTF_T_V4L_VIDEO: u32 = MEDIA_INTF_T_V4L_BASE;
pub const MEDIA_INTF_T_V4L_VBI: u32 = MEDIA_INTF_T_V4L_BASE + 1;
pub const MEDIA_INTF_T_V4L_RADIO: u32 = MEDIA_INTF_T_V4L_BASE + 2;
pub const MEDIA_INTF_T_V4L_SUBDEV: u32 = MEDIA_INTF_T_V4L_BASE + 3;
pub const MEDIA_INTF_T_V4L_SWRADIO: u32 = MEDIA_INTF_T_V4L_BASE + 4;
pub const MEDIA_INTF_T_V4L_TOUCH: u32 = MEDIA_INTF_T_V4L_BASE + 5;

pub const MEDIA_INTF_T_ALSA_PCM_CAPTURE: u32 = MEDIA_INTF_T_ALSA_BASE;
pub const MEDIA_INTF_T_ALSA_PCM_PLAYBACK: u32 = MEDIA_INTF_T_ALSA_BASE + 1;
pub const MEDIA_INTF_T_ALSA_CONTROL: u32 = MEDIA_INTF_T_ALSA_BASE + 2;

// ---------------------------------------------------------------------------
// linux/v4l2-subdev.h
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct v4l2_mbus_framefmt {
    pub width: u32,
    pub height: u32,
    pub code: u32,
    pub field: u32,
    pub colorspace: u32,
    pub ycbcr_enc: u16,
    pub quantization: u16,
    pub xfer_func: u16,
    pub flags: u16,
    pub reserved: [u16; 10],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct v4l2_subdev_format {
    pub which: u32,
    pub pad: u32,
    pub format: v4l2_mbus_framefmt,
    pub stream: u32,
    pub reserved: [u32; 7],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct v4l2_subdev_route {
    pub sink_pad: u32,
    pub sink_stream: u32,
    pub source_pad: u32,
    pub source_stream: u32,
    pub flags: u32,
    pub reserved: [u32; 5],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct v4l2_subdev_routing {
    pub which: u32,
    pub len_routes: u32,
    pub routes: u64,
    pub num_routes: u32,
    pub reserved: [u32; 11],
}

pub const V4L2_SUBDEV_FORMAT_TRY: u32 = 0;
pub const V4L2_SUBDEV_FORMAT_ACTIVE: u32 = 1;

pub const V4L2_SUBDEV_ROUTE_FL_ACTIVE: u32 = 1 << 0;

pub const VIDIOC_SUBDEV_G_FMT: c_ulong = iowr(b'V', 4, size_of::<v4l2_subdev_format>());
pub const VIDIOC_SUBDEV_G_ROUTING: c_ulong = iowr(b'V', 38, size_of::<v4l2_subdev_routing>());

// ---------------------------------------------------------------------------
// linux/videodev2.h (formats and controls)
// ---------------------------------------------------------------------------

pub const V4L2_BUF_TYPE_VIDEO_CAPTURE: u32 = 1;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct v4l2_pix_format {
    pub width: u32,
    pub height: u32,
    pub pixelformat: u32,
    pub field: u32,
    pub bytesperline: u32,
    pub sizeimage: u32,
    pub colorspace: u32,
    pub private: u32,
    pub flags: u32,
    pub ycbcr_enc: u32,
    pub quantization: u32,
    pub xfer_func: u32,
}

/// The `fmt` union of `struct v4l2_format`. Only the single-planar pix
/// member is accessed; the rest of the union is covered by `raw_data`,
/// with `_align` forcing the 8-byte alignment the kernel union has from
/// its pointer-carrying members.
#[repr(C)]
#[derive(Clone, Copy)]
pub union v4l2_format_union {
    pub pix: v4l2_pix_format,
    pub raw_data: [u8; 200],
    pub _align: [u64; 25],
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct v4l2_format {
    pub type_: u32,
    pub fmt: v4l2_format_union,
}

pub const VIDIOC_G_FMT: c_ulong = iowr(b'V', 4, size_of::<v4l2_format>());

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct v4l2_query_ext_ctrl {
    pub id: u32,
    pub type_: u32,
    pub name: [u8; 32],
    pub minimum: i64,
    pub maximum: i64,
    pub step: u64,
    pub default_value: i64,
    pub flags: u32,
    pub elem_size: u32,
    pub elems: u32,
    pub nr_of_dims: u32,
    pub dims: [u32; 4],
    pub reserved: [u32; 32],
}

/// `struct v4l2_querymenu` is declared packed in the kernel header; the
/// name/value union is kept as raw name bytes and reinterpreted by the
/// caller for integer menus.
#[repr(C, packed)]
#[derive(Debug, Clone, Copy)]
pub struct v4l2_querymenu {
    pub id: u32,
    pub index: u32,
    pub name: [u8; 32],
    pub reserved: u32,
}

pub const VIDIOC_QUERYMENU: c_ulong = iowr(b'V', 37, size_of::<v4l2_querymenu>());
pub const VIDIOC_QUERY_EXT_CTRL: c_ulong = iowr(b'V', 103, size_of::<v4l2_query_ext_ctrl>());

pub const V4L2_CTRL_FLAG_NEXT_CTRL: u32 = 0x8000_0000;
pub const V4L2_CTRL_FLAG_NEXT_COMPOUND: u32 = 0x4000_0000;

pub const V4L2_CTRL_TYPE_INTEGER: u32 = 1;
pub const V4L2_CTRL_TYPE_BOOLEAN: u32 = 2;
pub const V4L2_CTRL_TYPE_MENU: u32 = 3;
pub const V4L2_CTRL_TYPE_BUTTON: u32 = 4;
pub const V4L2_CTRL_TYPE_INTEGER64: u32 = 5;
pub const V4L2_CTRL_TYPE_CTRL_CLASS: u32 = 6;
pub const V4L2_CTRL_TYPE_STRING: u32 = 7;
pub const V4L2_CTRL_TYPE_BITMASK: u32 = 8;
pub const V4L2_CTRL_TYPE_INTEGER_MENU: u32 = 9;

// ---------------------------------------------------------------------------
// Default (zeroed) constructors, bindgen-style
// ---------------------------------------------------------------------------

macro_rules! zeroed_default {
    ($($t:ty),+ $(,)?) => {
        $(
            impl Default for $t {
                fn default() -> Self {
                    // All-zero is a valid bit pattern for these plain C structs.
                    unsafe { std::mem::zeroed() }
                }
            }
        )+
    };
}

zeroed_default!(
    media_device_info,
    media_v2_entity,
    media_v2_intf_devnode,
    media_v2_interface,
    media_v2_pad,
    media_v2_link,
    media_v2_topology,
    media_pad_desc,
    media_link_desc,
    v4l2_mbus_framefmt,
    v4l2_subdev_format,
    v4l2_subdev_route,
    v4l2_subdev_routing,
    v4l2_pix_format,
    v4l2_format,
    v4l2_query_ext_ctrl,
    v4l2_querymenu,
);
