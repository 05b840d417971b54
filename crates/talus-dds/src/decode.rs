//! DDS pixel decoding.
//!
//! Every decode path expands the source payload into the same canonical
//! layout: a flat RGBA8 buffer of `width * height * depth * 4` bytes with
//! scanlines flipped vertically, so row 0 is the bottom of the image.

use std::fs;
use std::path::Path;

use talus_common::BinaryReader;

use crate::header::{DdsHeader, DdsHeaderDxt10, DdsPixelFormat, TextureFormat};
use crate::{Error, Result, DDS_MAGIC};

/// Size of the magic plus the main header (4 + 124 bytes).
pub const HEADER_SIZE: usize = 128;

/// A decoded DDS image.
///
/// Owns the header copy and an RGBA8 pixel buffer of exactly
/// `width * height * depth * 4` bytes. Scanlines are stored bottom-up
/// (row 0 is the bottom of the image), which is the orientation the
/// texture upload expects. Immutable after construction.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    header: DdsHeader,
    dx10_header: Option<DdsHeaderDxt10>,
    width: u32,
    height: u32,
    depth: u32,
    pixels: Vec<u8>,
}

impl DecodedImage {
    /// Image width in pixels (clamped to at least 1).
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels (clamped to at least 1).
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Image depth in slices (1 for plain 2D textures).
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// The parsed file header.
    pub fn header(&self) -> &DdsHeader {
        &self.header
    }

    /// The DX10 extended header, if the file carried one.
    pub fn dx10_header(&self) -> Option<&DdsHeaderDxt10> {
        self.dx10_header.as_ref()
    }

    /// The texture format the pixels were decoded from.
    pub fn format(&self) -> TextureFormat {
        let pf = self.header.pixel_format;
        pf.format()
    }

    /// The decoded RGBA8 pixels, bottom-up rows.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Consume the image and take ownership of the pixel buffer.
    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }
}

/// Read a DDS file from disk and decode it.
pub fn decode_file<P: AsRef<Path>>(path: P) -> Result<DecodedImage> {
    let data = fs::read(path)?;
    decode(&data)
}

/// Parse the container headers without decoding pixel data.
pub fn parse_header(data: &[u8]) -> Result<(DdsHeader, Option<DdsHeaderDxt10>)> {
    read_headers(data).map(|(header, dx10, _)| (header, dx10))
}

/// Decode a DDS file held in memory into an RGBA8 image.
///
/// Dispatches on the pixel format: BC1/BC2/BC3 block decompression for
/// the DXT1-DXT5 tags, the bit-mask path for everything else. The
/// recognized-but-undecoded tags (DX10, ATI1, ATI2, A2XY) fail with
/// [`Error::UnsupportedFormat`].
pub fn decode(data: &[u8]) -> Result<DecodedImage> {
    let (header, dx10_header, reader) = read_headers(data)?;

    let width = (header.width as usize).max(1);
    let height = (header.height as usize).max(1);
    let depth = (header.depth as usize).max(1);

    let mut pixels = vec![0u8; image_size(&[width, height, depth, 4])?];
    let payload = reader.remaining_bytes();

    let pf = header.pixel_format;
    match pf.format() {
        TextureFormat::Bc1 => decode_bc1(width, height, depth, payload, &mut pixels)?,
        TextureFormat::Bc2 => decode_bc2(width, height, depth, payload, &mut pixels)?,
        TextureFormat::Bc3 => decode_bc3(width, height, depth, payload, &mut pixels)?,
        TextureFormat::Uncompressed => {
            decode_uncompressed(pf, width, height, depth, payload, &mut pixels)?
        }
        TextureFormat::Unsupported(tag) => return Err(Error::UnsupportedFormat(tag)),
    }

    Ok(DecodedImage {
        header,
        dx10_header,
        width: width as u32,
        height: height as u32,
        depth: depth as u32,
        pixels,
    })
}

/// Validate the magic, read and validate the main header, and read the
/// DX10 extended header when present. The returned reader is positioned
/// at the start of the pixel payload.
fn read_headers(data: &[u8]) -> Result<(DdsHeader, Option<DdsHeaderDxt10>, BinaryReader<'_>)> {
    if data.len() < HEADER_SIZE {
        return Err(Error::Truncated {
            needed: HEADER_SIZE,
            available: data.len(),
        });
    }

    let magic: [u8; 4] = data[..4].try_into().unwrap();
    if &magic != DDS_MAGIC {
        return Err(Error::InvalidMagic(magic));
    }

    let mut reader = BinaryReader::new(&data[4..]);
    let header: DdsHeader = reader.read_struct()?;
    header.validate()?;

    let dx10_header: Option<DdsHeaderDxt10> = if header.is_dx10() {
        Some(reader.read_struct()?)
    } else {
        None
    };

    Ok((header, dx10_header, reader))
}

/// Multiply size factors, guarding against usize overflow from
/// adversarial header dimensions.
fn image_size(factors: &[usize]) -> Result<usize> {
    factors
        .iter()
        .try_fold(1usize, |acc, &f| acc.checked_mul(f))
        .ok_or_else(|| Error::InvalidHeader("image dimensions overflow".into()))
}

/// Shift pair that moves a masked channel into an 8-bit value.
///
/// The extraction is `((word & mask) >> right) << left`: the channel bits
/// are shifted to the high end of the byte and the low bits stay zero.
/// No bit replication is performed, so channels narrower than 8 bits
/// never reach full intensity.
#[derive(Debug, Clone, Copy)]
struct ChannelShift {
    mask: u32,
    right: u32,
    left: u32,
}

impl ChannelShift {
    fn from_mask(mask: u32) -> Self {
        let mut right = if mask == 0 { 0 } else { mask.trailing_zeros() };
        let bits = mask.count_ones();
        let left = if bits >= 8 {
            right += bits - 8;
            0
        } else {
            8 - bits
        };
        Self { mask, right, left }
    }

    #[inline]
    fn extract(self, word: u32) -> u8 {
        (((word & self.mask) >> self.right) << self.left) as u8
    }
}

/// Decode packed pixels using the channel bit masks.
fn decode_uncompressed(
    pf: DdsPixelFormat,
    width: usize,
    height: usize,
    depth: usize,
    payload: &[u8],
    pixels: &mut [u8],
) -> Result<()> {
    let bit_count = pf.rgb_bit_count;
    let bytes_per_pixel = match bit_count {
        8 => 1,
        16 => 2,
        32 => 4,
        other => {
            return Err(Error::InvalidHeader(format!(
                "unsupported RGB bit count {}",
                other
            )))
        }
    };

    let needed = image_size(&[width, height, depth, bytes_per_pixel])?;
    if payload.len() < needed {
        return Err(Error::Truncated {
            needed,
            available: payload.len(),
        });
    }

    let r = ChannelShift::from_mask(pf.r_bit_mask);
    let g = ChannelShift::from_mask(pf.g_bit_mask);
    let b = ChannelShift::from_mask(pf.b_bit_mask);
    let a = ChannelShift::from_mask(pf.a_bit_mask);
    // No alpha mask means the texture is fully opaque
    let force_opaque = pf.a_bit_mask == 0;

    for z in 0..depth {
        for y in 0..height {
            for x in 0..width {
                let src = (z * width * height + y * width + x) * bytes_per_pixel;
                let word = match bytes_per_pixel {
                    1 => payload[src] as u32,
                    2 => u16::from_le_bytes([payload[src], payload[src + 1]]) as u32,
                    _ => u32::from_le_bytes([
                        payload[src],
                        payload[src + 1],
                        payload[src + 2],
                        payload[src + 3],
                    ]),
                };

                let dst = (z * width * height + (height - 1 - y) * width + x) * 4;
                pixels[dst] = r.extract(word);
                pixels[dst + 1] = g.extract(word);
                pixels[dst + 2] = b.extract(word);
                pixels[dst + 3] = if force_opaque { 0xFF } else { a.extract(word) };
            }
        }
    }

    Ok(())
}

/// Unpack an RGB565 word into 8-bit channels by shifting.
///
/// Truncating expansion: the low bits of each output byte stay zero.
#[inline]
fn unpack_565(c: u16) -> [u8; 3] {
    [
        ((c & 0xF800) >> 8) as u8,
        ((c & 0x07E0) >> 3) as u8,
        ((c & 0x001F) << 3) as u8,
    ]
}

/// `(2a + b) / 3` per channel.
#[inline]
fn mix_2_1(a: [u8; 3], b: [u8; 3]) -> [u8; 3] {
    let mut out = [0u8; 3];
    for i in 0..3 {
        out[i] = ((2 * a[i] as u16 + b[i] as u16) / 3) as u8;
    }
    out
}

/// `(a + b) / 2` per channel.
#[inline]
fn mix_half(a: [u8; 3], b: [u8; 3]) -> [u8; 3] {
    let mut out = [0u8; 3];
    for i in 0..3 {
        out[i] = ((a[i] as u16 + b[i] as u16) / 2) as u8;
    }
    out
}

/// Color for a 2-bit code in a BC2/BC3 color block.
///
/// Unlike BC1 there is no `color0 > color1` special case: codes 2 and 3
/// always interpolate.
#[inline]
fn bc_color(code: u32, c0: [u8; 3], c1: [u8; 3]) -> [u8; 3] {
    match code {
        0 => c0,
        1 => c1,
        2 => mix_2_1(c0, c1),
        _ => mix_2_1(c1, c0),
    }
}

/// Decode BC1 (DXT1) blocks: two RGB565 colors plus a 2-bit code per
/// texel, 8 bytes per 4x4 block. `color0 <= color1` selects the
/// 1-bit-alpha mode where code 3 is transparent black (written as
/// opaque black here, the output has no 1-bit alpha).
fn decode_bc1(
    width: usize,
    height: usize,
    depth: usize,
    payload: &[u8],
    pixels: &mut [u8],
) -> Result<()> {
    let blocks_x = (width / 4).max(1);
    let blocks_y = (height / 4).max(1);
    let slice_len = image_size(&[blocks_x, blocks_y, 8])?;

    let needed = image_size(&[slice_len, depth])?;
    if payload.len() < needed {
        return Err(Error::Truncated {
            needed,
            available: payload.len(),
        });
    }

    for z in 0..depth {
        let slice = &payload[z * slice_len..(z + 1) * slice_len];
        for by in 0..blocks_y {
            for bx in 0..blocks_x {
                let block = &slice[(by * blocks_x + bx) * 8..][..8];
                let color0 = u16::from_le_bytes([block[0], block[1]]);
                let color1 = u16::from_le_bytes([block[2], block[3]]);
                let codes = u32::from_le_bytes([block[4], block[5], block[6], block[7]]);

                let c0 = unpack_565(color0);
                let c1 = unpack_565(color1);

                for t in 0..16 {
                    let px = bx * 4 + t % 4;
                    let py = by * 4 + t / 4;
                    if px >= width || py >= height {
                        continue;
                    }

                    let code = (codes >> (2 * t)) & 0b11;
                    let rgb = match code {
                        0 => c0,
                        1 => c1,
                        2 => {
                            if color0 > color1 {
                                mix_2_1(c0, c1)
                            } else {
                                mix_half(c0, c1)
                            }
                        }
                        _ => {
                            if color0 > color1 {
                                mix_2_1(c1, c0)
                            } else {
                                [0, 0, 0]
                            }
                        }
                    };

                    let dst = (z * width * height + (height - 1 - py) * width + px) * 4;
                    pixels[dst..dst + 3].copy_from_slice(&rgb);
                    pixels[dst + 3] = 0xFF;
                }
            }
        }
    }

    Ok(())
}

/// Decode BC2 (DXT3) blocks: 8 bytes of explicit 4-bit alpha followed by
/// a BC1-style color block, 16 bytes per 4x4 block.
///
/// The alpha nibble is written as read, in the 0-15 range. This matches
/// the viewer's original behavior; see DESIGN.md.
fn decode_bc2(
    width: usize,
    height: usize,
    depth: usize,
    payload: &[u8],
    pixels: &mut [u8],
) -> Result<()> {
    let blocks_x = (width / 4).max(1);
    let blocks_y = (height / 4).max(1);
    let slice_len = image_size(&[blocks_x, blocks_y, 16])?;

    let needed = image_size(&[slice_len, depth])?;
    if payload.len() < needed {
        return Err(Error::Truncated {
            needed,
            available: payload.len(),
        });
    }

    for z in 0..depth {
        let slice = &payload[z * slice_len..(z + 1) * slice_len];
        for by in 0..blocks_y {
            for bx in 0..blocks_x {
                let block = &slice[(by * blocks_x + bx) * 16..][..16];
                let alpha_bits = u64::from_le_bytes([
                    block[0], block[1], block[2], block[3], block[4], block[5], block[6], block[7],
                ]);
                let color0 = u16::from_le_bytes([block[8], block[9]]);
                let color1 = u16::from_le_bytes([block[10], block[11]]);
                let codes = u32::from_le_bytes([block[12], block[13], block[14], block[15]]);

                let c0 = unpack_565(color0);
                let c1 = unpack_565(color1);

                for t in 0..16 {
                    let px = bx * 4 + t % 4;
                    let py = by * 4 + t / 4;
                    if px >= width || py >= height {
                        continue;
                    }

                    let code = (codes >> (2 * t)) & 0b11;
                    let rgb = bc_color(code, c0, c1);

                    let dst = (z * width * height + (height - 1 - py) * width + px) * 4;
                    pixels[dst..dst + 3].copy_from_slice(&rgb);
                    pixels[dst + 3] = ((alpha_bits >> (4 * t)) & 0xF) as u8;
                }
            }
        }
    }

    Ok(())
}

/// Alpha for a 3-bit code in a BC3 alpha block.
#[inline]
fn bc3_alpha(code: u64, alpha0: u8, alpha1: u8) -> u8 {
    let (a0, a1) = (alpha0 as u16, alpha1 as u16);
    match code {
        0 => alpha0,
        1 => alpha1,
        c if alpha0 > alpha1 => (((8 - c as u16) * a0 + (c as u16 - 1) * a1) / 7) as u8,
        6 => 0,
        7 => 255,
        c => (((6 - c as u16) * a0 + (c as u16 - 1) * a1) / 5) as u8,
    }
}

/// Decode BC3 (DXT5) blocks: two alpha endpoints with 3-bit interpolation
/// codes followed by a BC1-style color block, 16 bytes per 4x4 block.
fn decode_bc3(
    width: usize,
    height: usize,
    depth: usize,
    payload: &[u8],
    pixels: &mut [u8],
) -> Result<()> {
    let blocks_x = (width / 4).max(1);
    let blocks_y = (height / 4).max(1);
    let slice_len = image_size(&[blocks_x, blocks_y, 16])?;

    let needed = image_size(&[slice_len, depth])?;
    if payload.len() < needed {
        return Err(Error::Truncated {
            needed,
            available: payload.len(),
        });
    }

    for z in 0..depth {
        let slice = &payload[z * slice_len..(z + 1) * slice_len];
        for by in 0..blocks_y {
            for bx in 0..blocks_x {
                let block = &slice[(by * blocks_x + bx) * 16..][..16];
                let alpha0 = block[0];
                let alpha1 = block[1];
                // 48 bits of alpha codes, 3 per texel
                let mut code_bytes = [0u8; 8];
                code_bytes[..6].copy_from_slice(&block[2..8]);
                let alpha_codes = u64::from_le_bytes(code_bytes);

                let color0 = u16::from_le_bytes([block[8], block[9]]);
                let color1 = u16::from_le_bytes([block[10], block[11]]);
                let codes = u32::from_le_bytes([block[12], block[13], block[14], block[15]]);

                let c0 = unpack_565(color0);
                let c1 = unpack_565(color1);

                for t in 0..16 {
                    let px = bx * 4 + t % 4;
                    let py = by * 4 + t / 4;
                    if px >= width || py >= height {
                        continue;
                    }

                    let code = (codes >> (2 * t)) & 0b11;
                    let rgb = bc_color(code, c0, c1);
                    let alpha_code = (alpha_codes >> (3 * t)) & 0b111;

                    let dst = (z * width * height + (height - 1 - py) * width + px) * 4;
                    pixels[dst..dst + 3].copy_from_slice(&rgb);
                    pixels[dst + 3] = bc3_alpha(alpha_code, alpha0, alpha1);
                }
            }
        }
    }

    Ok(())
}
