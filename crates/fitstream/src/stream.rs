//! Sequential FITS image stream writer and reader.
//!
//! Writing emits one header (keyword units, END-terminated) followed by the
//! big-endian data units for a single image. Reading walks the same shape
//! back: keyword units until the END card shows up, then exactly enough data
//! units to cover `NAXIS1 * NAXIS2` elements. Units are never split; a
//! truncated stream surfaces as [`Error::UnexpectedEof`].

use std::io::{Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::buffer::{ImageBuffer, PixelType, Pixels};
use crate::card::Card;
use crate::endian;
use crate::error::{Error, Result};
use crate::unit::{Unit, UnitKind, UNIT_SIZE};
use crate::value::CardValue;

/// Cooperative cancellation handle for long writes.
///
/// Clones share one flag and may be moved across threads; flip it with
/// [`CancelToken::cancel`] and the writer stops with [`Error::Cancelled`]
/// before its next unit. A unit write already in flight always completes.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Build the END-terminated card list for an image header.
///
/// Mandatory cards come first and in order: SIMPLE, BITPIX, NAXIS, NAXIS1,
/// NAXIS2, then BZERO/BSCALE for unsigned pixel types, then the caller's
/// extra cards. Stray END cards among the extras are dropped; the single END
/// terminator is appended here.
pub fn image_cards(image: &ImageBuffer, extras: &[Card]) -> Result<Vec<Card>> {
    let ty = image.pixel_type();
    let mut cards = vec![
        Card::with_comment(
            "SIMPLE",
            CardValue::Logical(true),
            "conforms to the FITS standard",
        )?,
        Card::with_comment(
            "BITPIX",
            CardValue::Integer(ty.bitpix()),
            "bits per data value",
        )?,
        Card::with_comment("NAXIS", CardValue::Integer(2), "number of data axes")?,
        Card::new("NAXIS1", CardValue::Integer(image.width() as i64))?,
        Card::new("NAXIS2", CardValue::Integer(image.height() as i64))?,
    ];
    if let Some(bzero) = ty.bzero() {
        cards.push(Card::with_comment(
            "BZERO",
            CardValue::Integer(bzero),
            "offset for unsigned values",
        )?);
        cards.push(Card::new("BSCALE", CardValue::Integer(1))?);
    }
    cards.extend(extras.iter().filter(|c| !c.is_end()).cloned());
    cards.push(Card::end());
    Ok(cards)
}

/// Serialize the pixel payload into wire bytes: big-endian, with unsigned
/// types offset into their signed siblings per the BZERO convention.
fn encode_data(image: &ImageBuffer) -> Vec<u8> {
    match image.pixels() {
        Pixels::U8(v) => v.clone(),
        Pixels::I16(v) => endian::to_be_bytes(v),
        Pixels::U16(v) => {
            let shifted: Vec<i16> = v.iter().map(|&x| (i32::from(x) - 32768) as i16).collect();
            endian::to_be_bytes(&shifted)
        }
        Pixels::I32(v) => endian::to_be_bytes(v),
        Pixels::U32(v) => {
            let shifted: Vec<i32> = v
                .iter()
                .map(|&x| (i64::from(x) - 2_147_483_648) as i32)
                .collect();
            endian::to_be_bytes(&shifted)
        }
        Pixels::F32(v) => endian::to_be_bytes(v),
        Pixels::F64(v) => endian::to_be_bytes(v),
    }
}

/// Rebuild `count` pixels of the given type from wire bytes (which may carry
/// trailing unit padding).
fn decode_data(bytes: &[u8], ty: PixelType, count: usize) -> Result<Pixels> {
    let needed = count.checked_mul(ty.size()).ok_or(Error::InvalidValue)?;
    if bytes.len() < needed {
        return Err(Error::UnexpectedEof);
    }
    let payload = &bytes[..needed];
    Ok(match ty {
        PixelType::U8 => Pixels::U8(payload.to_vec()),
        PixelType::I16 => Pixels::I16(endian::from_be_bytes(payload)?),
        PixelType::U16 => Pixels::U16(
            endian::from_be_bytes::<i16>(payload)?
                .into_iter()
                .map(|v| (i32::from(v) + 32768) as u16)
                .collect(),
        ),
        PixelType::I32 => Pixels::I32(endian::from_be_bytes(payload)?),
        PixelType::U32 => Pixels::U32(
            endian::from_be_bytes::<i32>(payload)?
                .into_iter()
                .map(|v| (i64::from(v) + 2_147_483_648) as u32)
                .collect(),
        ),
        PixelType::F32 => Pixels::F32(endian::from_be_bytes(payload)?),
        PixelType::F64 => Pixels::F64(endian::from_be_bytes(payload)?),
    })
}

fn write_units<W: Write>(
    writer: &mut W,
    image: &ImageBuffer,
    extras: &[Card],
    token: Option<&CancelToken>,
) -> Result<()> {
    let cards = image_cards(image, extras)?;
    let data = encode_data(image);
    for unit in Unit::from_cards(&cards).chain(Unit::from_data(&data)) {
        if let Some(token) = token {
            if token.is_cancelled() {
                return Err(Error::Cancelled);
            }
        }
        unit.write_to(writer)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write one image, header first, to a byte sink.
pub fn write_image<W: Write>(writer: &mut W, image: &ImageBuffer, extras: &[Card]) -> Result<()> {
    write_units(writer, image, extras, None)
}

/// Like [`write_image`], checking the [`CancelToken`] before each unit.
pub fn write_image_with_cancel<W: Write>(
    writer: &mut W,
    image: &ImageBuffer,
    extras: &[Card],
    token: &CancelToken,
) -> Result<()> {
    write_units(writer, image, extras, Some(token))
}

/// Read keyword units until one carries the END card, collecting cards.
fn read_header<R: Read>(reader: &mut R) -> Result<Vec<Card>> {
    let mut cards = Vec::new();
    loop {
        let unit =
            Unit::read_from(reader, UnitKind::Header)?.ok_or(Error::UnexpectedEof)?;
        cards.extend(unit.cards()?);
        if unit.contains_end() {
            return Ok(cards);
        }
    }
}

/// Read whole data units until `needed` payload bytes are covered.
fn read_payload<R: Read>(reader: &mut R, needed: usize) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(needed.div_ceil(UNIT_SIZE) * UNIT_SIZE);
    while bytes.len() < needed {
        let unit = Unit::read_from(reader, UnitKind::Data)?.ok_or(Error::UnexpectedEof)?;
        bytes.extend_from_slice(unit.bytes());
    }
    Ok(bytes)
}

fn find_card<'a>(cards: &'a [Card], name: &str) -> Option<&'a Card> {
    cards.iter().find(|c| c.name_str() == name)
}

fn require_integer(cards: &[Card], name: &'static str) -> Result<i64> {
    find_card(cards, name)
        .ok_or(Error::MissingKeyword(name))?
        .integer()
        .ok_or(Error::InvalidValue)
}

/// Numeric card value: integer or float, as written by other producers.
fn numeric(cards: &[Card], name: &str) -> Option<f64> {
    match find_card(cards, name)?.value {
        CardValue::Integer(n) => Some(n as f64),
        CardValue::Float(f) => Some(f),
        _ => None,
    }
}

fn image_geometry(cards: &[Card]) -> Result<(i64, usize, usize)> {
    let bitpix = require_integer(cards, "BITPIX")?;
    if let Some(naxis) = find_card(cards, "NAXIS") {
        if naxis.integer() != Some(2) {
            return Err(Error::InvalidValue);
        }
    }
    let width = require_integer(cards, "NAXIS1")?;
    let height = require_integer(cards, "NAXIS2")?;
    if width <= 0 || height <= 0 {
        return Err(Error::InvalidValue);
    }
    let width = usize::try_from(width).map_err(|_| Error::InvalidValue)?;
    let height = usize::try_from(height).map_err(|_| Error::InvalidValue)?;
    Ok((bitpix, width, height))
}

/// Pixel count and payload byte length promised by the header, with the
/// products checked so a corrupt or hostile NAXIS pair cannot wrap.
fn promised_sizes(width: usize, height: usize, elem: usize) -> Result<(usize, usize)> {
    let count = width.checked_mul(height).ok_or(Error::InvalidValue)?;
    let bytes = count.checked_mul(elem).ok_or(Error::InvalidValue)?;
    Ok((count, bytes))
}

/// Read one image and its full card list (END excluded) from a byte source.
///
/// Requires BITPIX, NAXIS1 and NAXIS2 and fails with
/// [`Error::MissingKeyword`] naming the first absent one. BITPIX 16/32 with
/// the matching BZERO offset decode as the unsigned pixel types.
pub fn read_image<R: Read>(reader: &mut R) -> Result<(ImageBuffer, Vec<Card>)> {
    let cards = read_header(reader)?;
    let (bitpix, width, height) = image_geometry(&cards)?;
    let bzero = numeric(&cards, "BZERO").unwrap_or(0.0) as i64;
    let ty = PixelType::from_bitpix(bitpix, bzero)?;

    let (count, byte_len) = promised_sizes(width, height, ty.size())?;
    let bytes = read_payload(reader, byte_len)?;
    let pixels = decode_data(&bytes, ty, count)?;
    let image = ImageBuffer::from_pixels(pixels, width, height)?;
    Ok((image, cards))
}

/// Read one image as physical values: `physical = BZERO + BSCALE * raw`.
///
/// Raw values are taken at their stored signed type, so the unsigned BZERO
/// convention folds in naturally. The result is always an `F64` image.
pub fn read_image_physical<R: Read>(reader: &mut R) -> Result<(ImageBuffer, Vec<Card>)> {
    let cards = read_header(reader)?;
    let (bitpix, width, height) = image_geometry(&cards)?;
    let bzero = numeric(&cards, "BZERO").unwrap_or(0.0);
    let bscale = numeric(&cards, "BSCALE").unwrap_or(1.0);
    let raw_ty = PixelType::from_bitpix(bitpix, 0)?;

    let (count, byte_len) = promised_sizes(width, height, raw_ty.size())?;
    let bytes = read_payload(reader, byte_len)?;
    let raw = ImageBuffer::from_pixels(decode_data(&bytes, raw_ty, count)?, width, height)?;

    let mut physical = Vec::with_capacity(raw.len());
    for row in 0..height {
        for col in 0..width {
            let v = raw.value_at(row, col).unwrap_or(0.0);
            physical.push(bzero + bscale * v);
        }
    }
    let image = ImageBuffer::from_pixels(physical, width, height)?;
    Ok((image, cards))
}

/// Write an image to a new file at `path`.
pub fn write_image_to_path<P: AsRef<Path>>(
    path: P,
    image: &ImageBuffer,
    extras: &[Card],
) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    write_image(&mut writer, image, extras)
}

/// Read an image from the file at `path`.
pub fn read_image_from_path<P: AsRef<Path>>(path: P) -> Result<(ImageBuffer, Vec<Card>)> {
    let file = std::fs::File::open(path)?;
    let mut reader = std::io::BufReader::new(file);
    read_image(&mut reader)
}
