//! `ndarray` interop, behind the `array` feature.

use ndarray::Array2;

use crate::buffer::{ImageBuffer, Pixels};
use crate::error::Result;

/// View an image as an `Array2<f64>` of shape `(height, width)`.
///
/// Every supported element type widens to `f64` losslessly.
pub fn to_array2(image: &ImageBuffer) -> Array2<f64> {
    Array2::from_shape_fn((image.height(), image.width()), |(row, col)| {
        image.value_at(row, col).unwrap_or(0.0)
    })
}

/// Build an image from a 2D array of shape `(height, width)`.
///
/// Fails for arrays with a zero dimension.
pub fn from_array2<T>(array: &Array2<T>) -> Result<ImageBuffer>
where
    T: Clone,
    Vec<T>: Into<Pixels>,
{
    let (height, width) = array.dim();
    let data: Vec<T> = array.iter().cloned().collect();
    ImageBuffer::from_pixels(data, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::PixelType;
    use ndarray::array;

    #[test]
    fn array_roundtrip_keeps_shape_and_values() {
        let arr = array![[1i16, 2, 3], [4, 5, 6]];
        let image = from_array2(&arr).unwrap();
        assert_eq!(image.width(), 3);
        assert_eq!(image.height(), 2);
        assert_eq!(image.pixel_type(), PixelType::I16);
        assert_eq!(image.value_at(1, 0), Some(4.0));

        let back = to_array2(&image);
        assert_eq!(back.dim(), (2, 3));
        assert_eq!(back[[0, 2]], 3.0);
        assert_eq!(back[[1, 1]], 5.0);
    }

    #[test]
    fn zero_sized_array_is_rejected() {
        let arr = Array2::<f32>::zeros((0, 4));
        assert!(from_array2(&arr).is_err());
    }
}
