//! Streaming FITS image codec.
//!
//! Everything on the wire is built from two fixed sizes: 80-byte keyword
//! cards ([`Card`]) and 2880-byte units ([`Unit`]). A single image write is
//! one END-terminated run of header units followed by big-endian data units;
//! [`stream`] walks that shape in both directions over `std::io` streams.
//!
//! The format layer (`card`, `value`, `unit`, `buffer`, `endian`) is
//! `no_std` + `alloc`; the stream layer needs the default `std` feature. The
//! optional `array` feature adds `ndarray::Array2` interop.
//!
//! ```
//! use fitstream::{stream, ImageBuffer};
//!
//! let image = ImageBuffer::from_pixels(vec![42i16; 256], 16, 16)?;
//! let mut sink = Vec::new();
//! stream::write_image(&mut sink, &image, &[])?;
//!
//! let (back, cards) = stream::read_image(&mut std::io::Cursor::new(sink))?;
//! assert_eq!(back, image);
//! assert!(cards.iter().any(|c| c.name_str() == "BITPIX"));
//! # Ok::<(), fitstream::Error>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

#[cfg(feature = "array")]
pub mod array;
pub mod buffer;
pub mod card;
pub mod endian;
pub mod error;
#[cfg(feature = "std")]
pub mod stream;
pub mod unit;
pub mod value;

pub use buffer::{Comparison, ImageBuffer, PixelType, Pixels};
pub use card::{Card, CARD_SIZE, NAME_SIZE};
pub use error::{Error, Result};
pub use unit::{Unit, UnitKind, CARDS_PER_UNIT, UNIT_SIZE};
pub use value::CardValue;

#[cfg(feature = "std")]
pub use stream::CancelToken;
