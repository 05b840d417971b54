//! DDS texture decoding for the Talus terrain viewer.
//!
//! Parses the DDS container, validates the header invariants, and expands
//! the pixel payload into a flat RGBA8 buffer ready for texture upload:
//!
//! - Packed uncompressed pixels described by the channel bit masks
//! - BC1 (DXT1), BC2 (DXT2/3) and BC3 (DXT4/5) block compression
//!
//! Scanlines in the output are flipped vertically: row 0 is the bottom of
//! the image, matching the texture coordinate origin the viewer uses.
//! Mipmap chains and cubemap layout are out of scope, and the DX10, ATI1,
//! ATI2 and A2XY tags are recognized but rejected with an explicit error.
//!
//! # Example
//!
//! ```no_run
//! use talus_dds::decode_file;
//!
//! let image = decode_file("terrain/rocks.dds")?;
//! let expected = image.width() * image.height() * image.depth() * 4;
//! assert_eq!(image.pixels().len(), expected as usize);
//! # Ok::<(), talus_dds::Error>(())
//! ```

mod decode;
mod error;
mod header;

pub use decode::{decode, decode_file, parse_header, DecodedImage, HEADER_SIZE};
pub use error::{Error, Result};
pub use header::{DdsHeader, DdsHeaderDxt10, DdsPixelFormat, FourCC, TextureFormat};

/// DDS file magic bytes ("DDS ").
pub const DDS_MAGIC: &[u8; 4] = b"DDS ";
