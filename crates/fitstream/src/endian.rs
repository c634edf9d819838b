//! Big-endian wire conversion for pixel element buffers.
//!
//! FITS data is big-endian on the wire regardless of host order. The write
//! path serializes typed slices into byte vectors; the read path rebuilds
//! typed vectors from whole-element byte runs.

use alloc::vec::Vec;

use crate::error::{Error, Result};

mod sealed {
    pub trait Sealed {}
}

/// A pixel element with a fixed-size big-endian wire form.
pub trait Element: bytemuck::Pod + sealed::Sealed {
    /// Wire size in bytes.
    const SIZE: usize;

    /// Append the big-endian bytes of `self` to `out`.
    fn push_be(self, out: &mut Vec<u8>);

    /// Rebuild an element from exactly [`Element::SIZE`] big-endian bytes.
    fn from_be_chunk(chunk: &[u8]) -> Self;
}

macro_rules! impl_element {
    ($($ty:ty),* $(,)?) => {$(
        impl sealed::Sealed for $ty {}

        impl Element for $ty {
            const SIZE: usize = core::mem::size_of::<$ty>();

            fn push_be(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_be_bytes());
            }

            fn from_be_chunk(chunk: &[u8]) -> Self {
                let mut buf = [0u8; core::mem::size_of::<$ty>()];
                buf.copy_from_slice(chunk);
                <$ty>::from_be_bytes(buf)
            }
        }
    )*};
}

impl_element!(u8, i16, u16, i32, u32, f32, f64);

/// Serialize a typed slice into big-endian wire bytes.
pub fn to_be_bytes<T: Element>(values: &[T]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * T::SIZE);
    for &v in values {
        v.push_be(&mut out);
    }
    out
}

/// Rebuild a typed vector from big-endian wire bytes.
///
/// The byte length must be a whole number of elements.
pub fn from_be_bytes<T: Element>(bytes: &[u8]) -> Result<Vec<T>> {
    if bytes.len() % T::SIZE != 0 {
        return Err(Error::InvalidArgument(
            "byte length is not a multiple of the element size",
        ));
    }
    Ok(bytes.chunks_exact(T::SIZE).map(T::from_be_chunk).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn i16_wire_order() {
        assert_eq!(to_be_bytes(&[0x0102i16, -1]), vec![0x01, 0x02, 0xFF, 0xFF]);
    }

    #[test]
    fn u8_passes_through() {
        assert_eq!(to_be_bytes(&[1u8, 2, 3]), vec![1, 2, 3]);
    }

    #[test]
    fn f32_wire_order() {
        // 1.0f32 = 0x3F800000
        assert_eq!(to_be_bytes(&[1.0f32]), vec![0x3F, 0x80, 0x00, 0x00]);
    }

    #[test]
    fn roundtrip_all_widths() {
        let i = [i32::MIN, -1, 0, 1, i32::MAX];
        assert_eq!(from_be_bytes::<i32>(&to_be_bytes(&i)).unwrap(), i);

        let f = [0.0f64, -2.5, 1e300];
        assert_eq!(from_be_bytes::<f64>(&to_be_bytes(&f)).unwrap(), f);

        let u = [0u16, 1, u16::MAX];
        assert_eq!(from_be_bytes::<u16>(&to_be_bytes(&u)).unwrap(), u);
    }

    #[test]
    fn ragged_length_is_rejected() {
        assert!(matches!(
            from_be_bytes::<i32>(&[0u8; 6]),
            Err(Error::InvalidArgument(_))
        ));
    }
}
