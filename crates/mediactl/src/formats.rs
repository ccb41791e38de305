// SPDX-License-Identifier: Apache-2.0

//! Pixel and metadata format descriptions.
//!
//! Static tables keyed by V4L2 FourCC, with the per-plane arithmetic needed
//! to size capture buffers: line stride, plane size, and full frame size.
//! All arithmetic is in pixel groups, so packed formats (several pixels per
//! byte group) and subsampled planes come out right.

use std::fmt;

/// A four character code, stored as its four bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// Build from the packed little-endian u32 the kernel reports.
    pub const fn from_u32(value: u32) -> Self {
        FourCC([
            (value & 0xff) as u8,
            ((value >> 8) & 0xff) as u8,
            ((value >> 16) & 0xff) as u8,
            ((value >> 24) & 0xff) as u8,
        ])
    }

    /// Pack into the u32 wire representation.
    pub const fn as_u32(self) -> u32 {
        (self.0[0] as u32)
            | (self.0[1] as u32) << 8
            | (self.0[2] as u32) << 16
            | (self.0[3] as u32) << 24
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            if byte.is_ascii_graphic() || byte == b' ' {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "\\x{:02x}", byte)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCC({})", self)
    }
}

impl From<u32> for FourCC {
    fn from(value: u32) -> Self {
        FourCC::from_u32(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorEncoding {
    Rgb,
    Yuv,
    Raw,
}

/// Per-plane layout: bytes per pixel group and vertical subsampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneInfo {
    pub bytes_per_group: u32,
    pub vertical_subsampling: u32,
}

/// A pixel format description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormat {
    pub name: &'static str,
    pub fourcc: FourCC,
    pub drm_fourcc: Option<FourCC>,
    pub bits_per_pixel: u32,
    pub color: ColorEncoding,
    pub packed: bool,
    pub pixels_per_group: u32,
    pub planes: &'static [PlaneInfo],
}

impl PixelFormat {
    /// Line stride of a plane in bytes, rounded up to `align` when nonzero.
    ///
    /// `None` when the plane index is out of range.
    pub fn stride(&self, width: u32, plane: usize, align: u32) -> Option<u32> {
        let info = self.planes.get(plane)?;
        let groups = width.div_ceil(self.pixels_per_group);
        let stride = groups * info.bytes_per_group;
        if align > 1 {
            Some(stride.div_ceil(align) * align)
        } else {
            Some(stride)
        }
    }

    /// Size of one plane in bytes.
    pub fn plane_size(&self, width: u32, height: u32, plane: usize, align: u32) -> Option<u32> {
        let info = self.planes.get(plane)?;
        let stride = self.stride(width, plane, align)?;
        Some(stride * height.div_ceil(info.vertical_subsampling))
    }

    /// Total size of one frame across all planes.
    pub fn frame_size(&self, width: u32, height: u32, align: u32) -> u32 {
        (0..self.planes.len())
            .filter_map(|plane| self.plane_size(width, height, plane, align))
            .sum()
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

macro_rules! pixel_format {
    ($name:literal, $drm:expr, $v4l2:literal, $bpp:literal, $color:ident,
     packed: $packed:literal, ppg: $ppg:literal, planes: [$(($bpg:literal, $vsub:literal)),+]) => {
        PixelFormat {
            name: $name,
            fourcc: FourCC(*$v4l2),
            drm_fourcc: $drm,
            bits_per_pixel: $bpp,
            color: ColorEncoding::$color,
            packed: $packed,
            pixels_per_group: $ppg,
            planes: &[$(PlaneInfo {
                bytes_per_group: $bpg,
                vertical_subsampling: $vsub,
            }),+],
        }
    };
}

pub static PIXEL_FORMATS: &[PixelFormat] = &[
    pixel_format!("RGB565", Some(FourCC(*b"RG16")), b"RGBP", 16, Rgb,
        packed: false, ppg: 1, planes: [(2, 1)]),
    pixel_format!("RGB888", Some(FourCC(*b"RG24")), b"BGR3", 24, Rgb,
        packed: false, ppg: 1, planes: [(3, 1)]),
    pixel_format!("BGR888", Some(FourCC(*b"BG24")), b"RGB3", 24, Rgb,
        packed: false, ppg: 1, planes: [(3, 1)]),
    pixel_format!("NV12", Some(FourCC(*b"NV12")), b"NM12", 12, Yuv,
        packed: false, ppg: 2, planes: [(2, 1), (2, 2)]),
    pixel_format!("YUYV", Some(FourCC(*b"YUYV")), b"YUYV", 16, Yuv,
        packed: false, ppg: 2, planes: [(4, 1)]),
    pixel_format!("UYVY", Some(FourCC(*b"UYVY")), b"UYVY", 16, Yuv,
        packed: false, ppg: 2, planes: [(4, 1)]),
    pixel_format!("SBGGR8", None, b"BA81", 8, Raw,
        packed: false, ppg: 1, planes: [(1, 1)]),
    pixel_format!("SGBRG8", None, b"GBRG", 8, Raw,
        packed: false, ppg: 1, planes: [(1, 1)]),
    pixel_format!("SGRBG8", None, b"GRBG", 8, Raw,
        packed: false, ppg: 1, planes: [(1, 1)]),
    pixel_format!("SRGGB8", None, b"RGGB", 8, Raw,
        packed: false, ppg: 1, planes: [(1, 1)]),
    pixel_format!("SRGGB10", None, b"RG10", 10, Raw,
        packed: false, ppg: 1, planes: [(2, 1)]),
    pixel_format!("SBGGR10", None, b"BG10", 10, Raw,
        packed: false, ppg: 1, planes: [(2, 1)]),
    pixel_format!("SRGGB10P", None, b"pRAA", 10, Raw,
        packed: true, ppg: 4, planes: [(5, 1)]),
    pixel_format!("SRGGB12", None, b"RG12", 12, Raw,
        packed: false, ppg: 1, planes: [(2, 1)]),
    pixel_format!("SRGGB16", None, b"RG16", 16, Raw,
        packed: false, ppg: 1, planes: [(2, 1)]),
];

/// Look up a pixel format by its V4L2 FourCC.
pub fn pixel_format(fourcc: FourCC) -> Option<&'static PixelFormat> {
    PIXEL_FORMATS.iter().find(|f| f.fourcc == fourcc)
}

/// Look up a pixel format by name.
pub fn pixel_format_by_name(name: &str) -> Option<&'static PixelFormat> {
    PIXEL_FORMATS.iter().find(|f| f.name == name)
}

/// A metadata stream format. Single plane; width counts metadata units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetaFormat {
    pub name: &'static str,
    pub fourcc: FourCC,
    pub pixels_per_group: u32,
    pub bytes_per_group: u32,
}

impl MetaFormat {
    pub fn stride(&self, width: u32, align: u32) -> u32 {
        let groups = width.div_ceil(self.pixels_per_group);
        let stride = groups * self.bytes_per_group;
        if align > 1 {
            stride.div_ceil(align) * align
        } else {
            stride
        }
    }

    pub fn buffer_size(&self, width: u32, height: u32, align: u32) -> u32 {
        self.stride(width, align) * height
    }
}

impl fmt::Display for MetaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

pub static META_FORMATS: &[MetaFormat] = &[
    MetaFormat {
        name: "GENERIC_8",
        fourcc: FourCC(*b"MET8"),
        pixels_per_group: 2,
        bytes_per_group: 2,
    },
    MetaFormat {
        name: "GENERIC_CSI2_10",
        fourcc: FourCC(*b"MC1A"),
        pixels_per_group: 4,
        bytes_per_group: 5,
    },
    MetaFormat {
        name: "GENERIC_CSI2_12",
        fourcc: FourCC(*b"MC1C"),
        pixels_per_group: 2,
        bytes_per_group: 3,
    },
    MetaFormat {
        name: "RPI_FE_CFG",
        fourcc: FourCC(*b"RPFC"),
        pixels_per_group: 1,
        bytes_per_group: 1,
    },
    MetaFormat {
        name: "RPI_FE_STATS",
        fourcc: FourCC(*b"RPFS"),
        pixels_per_group: 1,
        bytes_per_group: 1,
    },
    MetaFormat {
        name: "SENSOR_DATA",
        fourcc: FourCC(*b"SENS"),
        pixels_per_group: 1,
        bytes_per_group: 1,
    },
];

/// Look up a metadata format by its V4L2 FourCC.
pub fn meta_format(fourcc: FourCC) -> Option<&'static MetaFormat> {
    META_FORMATS.iter().find(|f| f.fourcc == fourcc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fourcc_round_trip() {
        let fourcc = FourCC(*b"NM12");
        assert_eq!(FourCC::from_u32(fourcc.as_u32()), fourcc);
        assert_eq!(fourcc.as_u32(), 0x3231_4d4e);
        assert_eq!(fourcc.to_string(), "NM12");
    }

    #[test]
    fn test_fourcc_display_escapes_non_printable() {
        let fourcc = FourCC([b'A', 0x01, b' ', 0xff]);
        assert_eq!(fourcc.to_string(), "A\\x01 \\xff");
    }

    #[test]
    fn test_lookup_by_fourcc_and_name() {
        assert_eq!(pixel_format(FourCC(*b"YUYV")).unwrap().name, "YUYV");
        assert_eq!(pixel_format_by_name("NV12").unwrap().fourcc, FourCC(*b"NM12"));
        assert!(pixel_format(FourCC(*b"zzzz")).is_none());
    }

    #[test]
    fn test_yuyv_arithmetic() {
        let fmt = pixel_format_by_name("YUYV").unwrap();
        assert_eq!(fmt.stride(1920, 0, 0), Some(3840));
        assert_eq!(fmt.plane_size(1920, 1080, 0, 0), Some(3840 * 1080));
        assert_eq!(fmt.frame_size(1920, 1080, 0), 3840 * 1080);
        // Out of range plane.
        assert_eq!(fmt.stride(1920, 1, 0), None);
    }

    #[test]
    fn test_nv12_two_plane_arithmetic() {
        let fmt = pixel_format_by_name("NV12").unwrap();
        assert_eq!(fmt.stride(1920, 0, 0), Some(1920));
        assert_eq!(fmt.stride(1920, 1, 0), Some(1920));
        assert_eq!(fmt.plane_size(1920, 1080, 0, 0), Some(1920 * 1080));
        // Chroma plane is vertically subsampled by 2.
        assert_eq!(fmt.plane_size(1920, 1080, 1, 0), Some(1920 * 540));
        assert_eq!(fmt.frame_size(1920, 1080, 0), 1920 * 1080 * 3 / 2);
    }

    #[test]
    fn test_nv12_odd_height_rounds_chroma_up() {
        let fmt = pixel_format_by_name("NV12").unwrap();
        // A subsampled plane covers partial rows, so odd heights round up.
        assert_eq!(fmt.plane_size(1920, 1081, 1, 0), Some(1920 * 541));
        assert_eq!(fmt.frame_size(1920, 1081, 0), 1920 * 1081 + 1920 * 541);
    }

    #[test]
    fn test_raw_bit_depths() {
        assert_eq!(pixel_format_by_name("SRGGB10").unwrap().bits_per_pixel, 10);
        assert_eq!(pixel_format_by_name("SBGGR10").unwrap().bits_per_pixel, 10);
        assert_eq!(pixel_format_by_name("SRGGB12").unwrap().bits_per_pixel, 12);
        assert_eq!(pixel_format_by_name("SRGGB16").unwrap().bits_per_pixel, 16);
    }

    #[test]
    fn test_packed_raw10_arithmetic() {
        // 4 pixels per 5-byte group.
        let fmt = pixel_format_by_name("SRGGB10P").unwrap();
        assert!(fmt.packed);
        assert_eq!(fmt.stride(640, 0, 0), Some(800));
        // Width not a multiple of the group rounds the group count up.
        assert_eq!(fmt.stride(642, 0, 0), Some(805));
    }

    #[test]
    fn test_stride_alignment() {
        let fmt = pixel_format_by_name("RGB888").unwrap();
        assert_eq!(fmt.stride(642, 0, 0), Some(1926));
        assert_eq!(fmt.stride(642, 0, 64), Some(1984));
        assert_eq!(fmt.plane_size(642, 10, 0, 64), Some(1984 * 10));
    }

    #[test]
    fn test_meta_format_arithmetic() {
        let fmt = meta_format(FourCC(*b"MC1A")).unwrap();
        assert_eq!(fmt.name, "GENERIC_CSI2_10");
        assert_eq!(fmt.stride(16, 0), 20);
        assert_eq!(fmt.stride(18, 0), 25);
        assert_eq!(fmt.buffer_size(16, 2, 0), 40);
    }
}
