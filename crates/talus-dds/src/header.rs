//! DDS header structures.

use std::fmt;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{Error, Result};

/// DDS file header.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct DdsHeader {
    /// Header size (must be 124).
    pub size: u32,
    /// Header flags.
    pub flags: u32,
    /// Image height.
    pub height: u32,
    /// Image width.
    pub width: u32,
    /// Pitch or linear size.
    pub pitch_or_linear_size: u32,
    /// Depth (for volume textures).
    pub depth: u32,
    /// Number of mipmap levels.
    pub mipmap_count: u32,
    /// Reserved.
    pub reserved1: [u32; 11],
    /// Pixel format.
    pub pixel_format: DdsPixelFormat,
    /// Surface capabilities.
    pub caps: u32,
    /// Surface capabilities 2.
    pub caps2: u32,
    /// Surface capabilities 3.
    pub caps3: u32,
    /// Surface capabilities 4.
    pub caps4: u32,
    /// Reserved.
    pub reserved2: u32,
}

impl DdsHeader {
    /// Expected header size.
    pub const SIZE: u32 = 124;

    /// Flags bit: caps field is valid.
    pub const FLAG_CAPS: u32 = 0x1;
    /// Flags bit: height field is valid.
    pub const FLAG_HEIGHT: u32 = 0x2;
    /// Flags bit: width field is valid.
    pub const FLAG_WIDTH: u32 = 0x4;
    /// Flags bit: pitch is provided for an uncompressed texture.
    pub const FLAG_PITCH: u32 = 0x8;
    /// Flags bit: pixel format field is valid.
    pub const FLAG_PIXELFORMAT: u32 = 0x1000;
    /// Flags bit: mipmap count field is valid.
    pub const FLAG_MIPMAPCOUNT: u32 = 0x20000;
    /// Flags bit: linear size is provided for a compressed texture.
    pub const FLAG_LINEARSIZE: u32 = 0x80000;
    /// Flags bit: depth field is valid.
    pub const FLAG_DEPTH: u32 = 0x800000;

    /// Flag bits every valid texture header must carry.
    pub const REQUIRED_FLAGS: u32 =
        Self::FLAG_CAPS | Self::FLAG_HEIGHT | Self::FLAG_WIDTH | Self::FLAG_PIXELFORMAT;

    /// Caps bit: surface has more than one level or face.
    pub const CAPS_COMPLEX: u32 = 0x8;
    /// Caps bit: surface has mipmaps.
    pub const CAPS_MIPMAP: u32 = 0x400000;
    /// Caps bit: surface is a texture.
    pub const CAPS_TEXTURE: u32 = 0x1000;

    /// Check if this header is followed by a DX10 extended header.
    pub fn is_dx10(&self) -> bool {
        let pf = self.pixel_format;
        pf.has_four_cc() && pf.four_cc == FourCC::DX10
    }

    /// Validate the invariants every DDS texture header must satisfy.
    pub fn validate(&self) -> Result<()> {
        let size = self.size;
        if size != Self::SIZE {
            return Err(Error::InvalidHeader(format!(
                "header size must be {}, got {}",
                Self::SIZE,
                size
            )));
        }

        let flags = self.flags;
        if flags & Self::REQUIRED_FLAGS != Self::REQUIRED_FLAGS {
            return Err(Error::InvalidHeader(format!(
                "required flags missing: got {:#x}",
                flags
            )));
        }

        let caps = self.caps;
        if caps & Self::CAPS_TEXTURE == 0 {
            return Err(Error::InvalidHeader("texture capability not set".into()));
        }

        Ok(())
    }
}

/// DDS pixel format.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct DdsPixelFormat {
    /// Structure size (should be 32).
    pub size: u32,
    /// Pixel format flags.
    pub flags: u32,
    /// Four-character code for compression.
    pub four_cc: FourCC,
    /// Number of bits per pixel (for uncompressed).
    pub rgb_bit_count: u32,
    /// Red bit mask.
    pub r_bit_mask: u32,
    /// Green bit mask.
    pub g_bit_mask: u32,
    /// Blue bit mask.
    pub b_bit_mask: u32,
    /// Alpha bit mask.
    pub a_bit_mask: u32,
}

impl DdsPixelFormat {
    /// Flags bit: alpha channel bit mask is valid.
    pub const FLAG_ALPHAPIXELS: u32 = 0x1;
    /// Flags bit: alpha-only data.
    pub const FLAG_ALPHA: u32 = 0x2;
    /// Flags bit: four_cc identifies the format.
    pub const FLAG_FOURCC: u32 = 0x4;
    /// Flags bit: uncompressed RGB data.
    pub const FLAG_RGB: u32 = 0x40;
    /// Flags bit: YUV data.
    pub const FLAG_YUV: u32 = 0x200;
    /// Flags bit: luminance data.
    pub const FLAG_LUMINANCE: u32 = 0x20000;

    /// Check if the FourCC tag identifies the format.
    pub fn has_four_cc(&self) -> bool {
        self.flags & Self::FLAG_FOURCC != 0
    }

    /// Resolve the texture format this pixel format describes.
    ///
    /// Without the FourCC flag (or with a tag we treat as packed pixels)
    /// the format is [`TextureFormat::Uncompressed`] and the channel bit
    /// masks describe the layout.
    pub fn format(&self) -> TextureFormat {
        if !self.has_four_cc() {
            return TextureFormat::Uncompressed;
        }
        let four_cc = self.four_cc;
        match four_cc {
            FourCC::DXT1 => TextureFormat::Bc1,
            FourCC::DXT2 | FourCC::DXT3 => TextureFormat::Bc2,
            FourCC::DXT4 | FourCC::DXT5 => TextureFormat::Bc3,
            FourCC::DX10 | FourCC::ATI1 | FourCC::ATI2 | FourCC::A2XY => {
                TextureFormat::Unsupported(four_cc)
            }
            _ => TextureFormat::Uncompressed,
        }
    }
}

/// Four-character code identifying a compression type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(transparent)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// DXT1 (BC1) compression.
    pub const DXT1: Self = Self(*b"DXT1");
    /// DXT2 (BC2, premultiplied) compression.
    pub const DXT2: Self = Self(*b"DXT2");
    /// DXT3 (BC2) compression.
    pub const DXT3: Self = Self(*b"DXT3");
    /// DXT4 (BC3, premultiplied) compression.
    pub const DXT4: Self = Self(*b"DXT4");
    /// DXT5 (BC3) compression.
    pub const DXT5: Self = Self(*b"DXT5");
    /// DX10 extended header.
    pub const DX10: Self = Self(*b"DX10");
    /// ATI1 (BC4) compression.
    pub const ATI1: Self = Self(*b"ATI1");
    /// ATI2 (BC5) compression.
    pub const ATI2: Self = Self(*b"ATI2");
    /// A2XY swizzled normal map compression.
    pub const A2XY: Self = Self(*b"A2XY");
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{:02x}", b)?;
            }
        }
        Ok(())
    }
}

/// DX10 extended header.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct DdsHeaderDxt10 {
    /// DXGI format.
    pub dxgi_format: u32,
    /// Resource dimension.
    pub resource_dimension: u32,
    /// Misc flags.
    pub misc_flag: u32,
    /// Array size.
    pub array_size: u32,
    /// Misc flags 2.
    pub misc_flags2: u32,
}

/// Pixel layout selected by the pixel format flags and FourCC tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    /// BC1 (DXT1) block compression.
    Bc1,
    /// BC2 (DXT2/DXT3) block compression.
    Bc2,
    /// BC3 (DXT4/DXT5) block compression.
    Bc3,
    /// Packed pixels described by the channel bit masks.
    Uncompressed,
    /// Recognized tag with no decoder (DX10, ATI1, ATI2, A2XY).
    Unsupported(FourCC),
}

impl TextureFormat {
    /// Bytes per 4x4 block for the block-compressed formats.
    pub fn block_bytes(self) -> Option<usize> {
        match self {
            Self::Bc1 => Some(8),
            Self::Bc2 | Self::Bc3 => Some(16),
            _ => None,
        }
    }
}

impl fmt::Display for TextureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bc1 => write!(f, "BC1 (DXT1)"),
            Self::Bc2 => write!(f, "BC2 (DXT3)"),
            Self::Bc3 => write!(f, "BC3 (DXT5)"),
            Self::Uncompressed => write!(f, "uncompressed"),
            Self::Unsupported(tag) => write!(f, "unsupported ({})", tag),
        }
    }
}
