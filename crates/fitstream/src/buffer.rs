//! Typed 2D pixel buffers.
//!
//! An [`ImageBuffer`] owns a row-major pixel vector of one of seven element
//! types plus its width and height. Byte views are zero-copy reinterpretations
//! in native order; wire-order conversion lives in [`crate::endian`].

use alloc::vec;
use alloc::vec::Vec;

use crate::error::{Error, Result};

/// Supported pixel element types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelType {
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
}

impl PixelType {
    /// Element size in bytes.
    pub fn size(self) -> usize {
        match self {
            PixelType::U8 => 1,
            PixelType::I16 | PixelType::U16 => 2,
            PixelType::I32 | PixelType::U32 | PixelType::F32 => 4,
            PixelType::F64 => 8,
        }
    }

    /// The BITPIX value this type is stored under.
    ///
    /// Unsigned types share the BITPIX of their signed sibling and are
    /// distinguished by [`PixelType::bzero`].
    pub fn bitpix(self) -> i64 {
        match self {
            PixelType::U8 => 8,
            PixelType::I16 | PixelType::U16 => 16,
            PixelType::I32 | PixelType::U32 => 32,
            PixelType::F32 => -32,
            PixelType::F64 => -64,
        }
    }

    /// The BZERO offset used to store this type, if any.
    pub fn bzero(self) -> Option<i64> {
        match self {
            PixelType::U16 => Some(32768),
            PixelType::U32 => Some(2_147_483_648),
            _ => None,
        }
    }

    /// Map a BITPIX value (and the header's BZERO) back to a pixel type.
    ///
    /// BITPIX 16/32 with the matching unsigned offset decode as `U16`/`U32`;
    /// any other BITPIX, including 64, is [`Error::InvalidBitpix`].
    pub fn from_bitpix(bitpix: i64, bzero: i64) -> Result<PixelType> {
        match bitpix {
            8 => Ok(PixelType::U8),
            16 if bzero == 32768 => Ok(PixelType::U16),
            16 => Ok(PixelType::I16),
            32 if bzero == 2_147_483_648 => Ok(PixelType::U32),
            32 => Ok(PixelType::I32),
            -32 => Ok(PixelType::F32),
            -64 => Ok(PixelType::F64),
            other => Err(Error::InvalidBitpix(other)),
        }
    }

    /// Lowercase name of the type, as accepted by [`PixelType::from_str`].
    pub fn name(self) -> &'static str {
        match self {
            PixelType::U8 => "u8",
            PixelType::I16 => "i16",
            PixelType::U16 => "u16",
            PixelType::I32 => "i32",
            PixelType::U32 => "u32",
            PixelType::F32 => "f32",
            PixelType::F64 => "f64",
        }
    }
}

impl core::str::FromStr for PixelType {
    type Err = Error;

    fn from_str(s: &str) -> Result<PixelType> {
        match s {
            "u8" => Ok(PixelType::U8),
            "i16" => Ok(PixelType::I16),
            "u16" => Ok(PixelType::U16),
            "i32" => Ok(PixelType::I32),
            "u32" => Ok(PixelType::U32),
            "f32" => Ok(PixelType::F32),
            "f64" => Ok(PixelType::F64),
            _ => Err(Error::InvalidArgument("unknown pixel type name")),
        }
    }
}

/// A pixel vector tagged by its element type.
#[derive(Debug, Clone, PartialEq)]
pub enum Pixels {
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    I32(Vec<i32>),
    U32(Vec<u32>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl Pixels {
    pub fn pixel_type(&self) -> PixelType {
        match self {
            Pixels::U8(_) => PixelType::U8,
            Pixels::I16(_) => PixelType::I16,
            Pixels::U16(_) => PixelType::U16,
            Pixels::I32(_) => PixelType::I32,
            Pixels::U32(_) => PixelType::U32,
            Pixels::F32(_) => PixelType::F32,
            Pixels::F64(_) => PixelType::F64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Pixels::U8(v) => v.len(),
            Pixels::I16(v) => v.len(),
            Pixels::U16(v) => v.len(),
            Pixels::I32(v) => v.len(),
            Pixels::U32(v) => v.len(),
            Pixels::F32(v) => v.len(),
            Pixels::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Native-order byte view of the pixel vector.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Pixels::U8(v) => v,
            Pixels::I16(v) => bytemuck::cast_slice(v),
            Pixels::U16(v) => bytemuck::cast_slice(v),
            Pixels::I32(v) => bytemuck::cast_slice(v),
            Pixels::U32(v) => bytemuck::cast_slice(v),
            Pixels::F32(v) => bytemuck::cast_slice(v),
            Pixels::F64(v) => bytemuck::cast_slice(v),
        }
    }

    /// Mutable native-order byte view.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        match self {
            Pixels::U8(v) => v,
            Pixels::I16(v) => bytemuck::cast_slice_mut(v),
            Pixels::U16(v) => bytemuck::cast_slice_mut(v),
            Pixels::I32(v) => bytemuck::cast_slice_mut(v),
            Pixels::U32(v) => bytemuck::cast_slice_mut(v),
            Pixels::F32(v) => bytemuck::cast_slice_mut(v),
            Pixels::F64(v) => bytemuck::cast_slice_mut(v),
        }
    }

    fn value_at(&self, index: usize) -> f64 {
        match self {
            Pixels::U8(v) => f64::from(v[index]),
            Pixels::I16(v) => f64::from(v[index]),
            Pixels::U16(v) => f64::from(v[index]),
            Pixels::I32(v) => f64::from(v[index]),
            Pixels::U32(v) => f64::from(v[index]),
            Pixels::F32(v) => f64::from(v[index]),
            Pixels::F64(v) => v[index],
        }
    }
}

macro_rules! impl_pixels_from {
    ($($variant:ident($ty:ty)),* $(,)?) => {$(
        impl From<Vec<$ty>> for Pixels {
            fn from(v: Vec<$ty>) -> Pixels {
                Pixels::$variant(v)
            }
        }
    )*};
}

impl_pixels_from!(U8(u8), I16(i16), U16(u16), I32(i32), U32(u32), F32(f32), F64(f64));

/// How [`ImageBuffer::eq_with`] compares pixel values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Bit-exact equality for every element type.
    Strict,
    /// Integer types compare exactly; floats within a small relative
    /// tolerance (and NaN equals NaN).
    Loose,
}

const LOOSE_REL_TOL: f64 = 1e-6;

fn loose_eq_f64(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    if a.is_nan() && b.is_nan() {
        return true;
    }
    let scale = if libm::fabs(a) > libm::fabs(b) {
        libm::fabs(a)
    } else {
        libm::fabs(b)
    };
    libm::fabs(a - b) <= LOOSE_REL_TOL * scale
}

fn loose_eq_f32(a: f32, b: f32) -> bool {
    loose_eq_f64(f64::from(a), f64::from(b))
}

/// A row-major 2D image: width × height pixels of a single element type.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    width: usize,
    height: usize,
    pixels: Pixels,
}

impl ImageBuffer {
    /// An all-zero image of the given geometry and element type.
    ///
    /// Fails with [`Error::InvalidArgument`] if either dimension is zero.
    pub fn zeroed(width: usize, height: usize, ty: PixelType) -> Result<ImageBuffer> {
        check_dims(width, height)?;
        let n = width * height;
        let pixels = match ty {
            PixelType::U8 => Pixels::U8(vec![0; n]),
            PixelType::I16 => Pixels::I16(vec![0; n]),
            PixelType::U16 => Pixels::U16(vec![0; n]),
            PixelType::I32 => Pixels::I32(vec![0; n]),
            PixelType::U32 => Pixels::U32(vec![0; n]),
            PixelType::F32 => Pixels::F32(vec![0.0; n]),
            PixelType::F64 => Pixels::F64(vec![0.0; n]),
        };
        Ok(ImageBuffer {
            width,
            height,
            pixels,
        })
    }

    /// Take ownership of a pixel vector as a width × height image.
    ///
    /// The vector length must equal `width * height`. Callers that need to
    /// keep the source clone it first.
    pub fn from_pixels(pixels: impl Into<Pixels>, width: usize, height: usize) -> Result<ImageBuffer> {
        check_dims(width, height)?;
        let pixels = pixels.into();
        if pixels.len() != width * height {
            return Err(Error::InvalidArgument(
                "pixel count does not match width * height",
            ));
        }
        Ok(ImageBuffer {
            width,
            height,
            pixels,
        })
    }

    /// Reinterpret native-order bytes as a width × height image.
    ///
    /// At least `width * height * ty.size()` bytes are required; a longer
    /// slice contributes only its needed prefix.
    pub fn from_bytes(bytes: &[u8], width: usize, height: usize, ty: PixelType) -> Result<ImageBuffer> {
        check_dims(width, height)?;
        let needed = width * height * ty.size();
        if bytes.len() < needed {
            return Err(Error::InvalidArgument(
                "byte count is short of the image geometry",
            ));
        }
        let bytes = &bytes[..needed];
        let pixels = match ty {
            PixelType::U8 => Pixels::U8(bytes.to_vec()),
            PixelType::I16 => Pixels::I16(bytemuck::pod_collect_to_vec(bytes)),
            PixelType::U16 => Pixels::U16(bytemuck::pod_collect_to_vec(bytes)),
            PixelType::I32 => Pixels::I32(bytemuck::pod_collect_to_vec(bytes)),
            PixelType::U32 => Pixels::U32(bytemuck::pod_collect_to_vec(bytes)),
            PixelType::F32 => Pixels::F32(bytemuck::pod_collect_to_vec(bytes)),
            PixelType::F64 => Pixels::F64(bytemuck::pod_collect_to_vec(bytes)),
        };
        Ok(ImageBuffer {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of pixels.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pixel_type(&self) -> PixelType {
        self.pixels.pixel_type()
    }

    /// Total pixel payload size in bytes.
    pub fn byte_len(&self) -> usize {
        self.len() * self.pixel_type().size()
    }

    pub fn pixels(&self) -> &Pixels {
        &self.pixels
    }

    pub fn into_pixels(self) -> Pixels {
        self.pixels
    }

    /// Zero-copy native-order byte view of the pixel data.
    pub fn as_bytes(&self) -> &[u8] {
        self.pixels.as_bytes()
    }

    /// Mutable zero-copy byte view.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        self.pixels.as_bytes_mut()
    }

    /// The pixel at `(row, col)` as an `f64`, or `None` when out of range.
    ///
    /// Every supported element type is exactly representable in `f64`, so
    /// the widening is lossless.
    pub fn value_at(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.height || col >= self.width {
            return None;
        }
        Some(self.pixels.value_at(row * self.width + col))
    }

    /// Compare two images under the given [`Comparison`] mode.
    ///
    /// Images of different geometry or element type are never equal. Integer
    /// images compare exactly in both modes.
    pub fn eq_with(&self, other: &ImageBuffer, mode: Comparison) -> bool {
        if self.width != other.width
            || self.height != other.height
            || self.pixel_type() != other.pixel_type()
        {
            return false;
        }
        match (&self.pixels, &other.pixels, mode) {
            (Pixels::F32(a), Pixels::F32(b), Comparison::Loose) => {
                a.iter().zip(b).all(|(&x, &y)| loose_eq_f32(x, y))
            }
            (Pixels::F64(a), Pixels::F64(b), Comparison::Loose) => {
                a.iter().zip(b).all(|(&x, &y)| loose_eq_f64(x, y))
            }
            (a, b, _) => a == b,
        }
    }
}

fn check_dims(width: usize, height: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidArgument("image dimensions must be nonzero"));
    }
    Ok(())
}
