//! 2880-byte FITS units (blocks).
//!
//! Everything in a FITS stream is carried in fixed-size units: header units
//! hold 36 keyword cards, data units hold raw big-endian pixel bytes. Short
//! final chunks are padded out, spaces for headers and zeros for data.

use alloc::vec::Vec;

use crate::card::{Card, CARD_SIZE};
use crate::error::{Error, Result};

/// Unit (block) size in bytes.
pub const UNIT_SIZE: usize = 2880;

/// Number of cards per header unit.
pub const CARDS_PER_UNIT: usize = UNIT_SIZE / CARD_SIZE;

/// Whether a unit carries keyword cards or raw data bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    /// 36 keyword cards, space-padded.
    Header,
    /// Raw big-endian data bytes, zero-padded.
    Data,
}

/// One fixed-size FITS unit.
#[derive(Clone)]
pub struct Unit {
    kind: UnitKind,
    bytes: [u8; UNIT_SIZE],
}

impl Unit {
    /// Wrap raw bytes read off a stream as a unit of the given kind.
    pub fn from_bytes(kind: UnitKind, bytes: [u8; UNIT_SIZE]) -> Unit {
        Unit { kind, bytes }
    }

    /// Chunk a card list into header units, space-padding the last one.
    ///
    /// The caller is responsible for terminating the list with an END card;
    /// this just serializes whatever it is given, 36 cards per unit.
    pub fn from_cards(cards: &[Card]) -> impl Iterator<Item = Unit> + '_ {
        cards.chunks(CARDS_PER_UNIT).map(|chunk| {
            let mut bytes = [b' '; UNIT_SIZE];
            for (i, card) in chunk.iter().enumerate() {
                bytes[i * CARD_SIZE..(i + 1) * CARD_SIZE].copy_from_slice(&card.to_bytes());
            }
            Unit {
                kind: UnitKind::Header,
                bytes,
            }
        })
    }

    /// Chunk raw data bytes into data units, zero-padding the last one.
    pub fn from_data(data: &[u8]) -> impl Iterator<Item = Unit> + '_ {
        data.chunks(UNIT_SIZE).map(|chunk| {
            let mut bytes = [0u8; UNIT_SIZE];
            bytes[..chunk.len()].copy_from_slice(chunk);
            Unit {
                kind: UnitKind::Data,
                bytes,
            }
        })
    }

    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    pub fn is_header(&self) -> bool {
        self.kind == UnitKind::Header
    }

    pub fn is_data(&self) -> bool {
        self.kind == UnitKind::Data
    }

    /// The raw 2880 bytes of this unit.
    pub fn bytes(&self) -> &[u8; UNIT_SIZE] {
        &self.bytes
    }

    /// Parse the cards of a header unit.
    ///
    /// Stops at the END card (which is not returned) and skips fully blank
    /// padding cards; commentary cards are kept. Fails on a malformed card,
    /// or if called on a data unit.
    pub fn cards(&self) -> Result<Vec<Card>> {
        if self.kind != UnitKind::Header {
            return Err(Error::InvalidArgument("unit does not carry keyword cards"));
        }
        let mut cards = Vec::new();
        for slot in self.bytes.chunks_exact(CARD_SIZE) {
            let card = Card::parse(slot)?;
            if card.is_end() {
                break;
            }
            if card.is_blank() && card.comment.is_none() {
                continue;
            }
            cards.push(card);
        }
        Ok(cards)
    }

    /// Scan a header unit for the END card without fully parsing it.
    pub fn contains_end(&self) -> bool {
        self.bytes
            .chunks_exact(CARD_SIZE)
            .any(|slot| &slot[..8] == b"END     ")
    }

    /// Copy the unit's data bytes into a typed buffer, whole elements only.
    ///
    /// Copies `min(dest bytes, 2880)` rounded down to the element size and
    /// returns the number of elements written. Bytes are copied as-is; any
    /// endian conversion is the caller's job.
    pub fn copy_data_into<T: bytemuck::Pod>(&self, dest: &mut [T]) -> usize {
        let elem = core::mem::size_of::<T>();
        if elem == 0 {
            return 0;
        }
        let dest_bytes: &mut [u8] = bytemuck::cast_slice_mut(dest);
        let n = dest_bytes.len().min(UNIT_SIZE) / elem * elem;
        dest_bytes[..n].copy_from_slice(&self.bytes[..n]);
        n / elem
    }

    /// Read one whole unit off a stream.
    ///
    /// Returns `Ok(None)` at a clean end of stream, and also when only a
    /// partial unit remains (a truncated trailer is treated as the end, not
    /// as corruption).
    #[cfg(feature = "std")]
    pub fn read_from<R: std::io::Read>(reader: &mut R, kind: UnitKind) -> Result<Option<Unit>> {
        let mut bytes = [0u8; UNIT_SIZE];
        let mut filled = 0;
        while filled < UNIT_SIZE {
            let n = reader.read(&mut bytes[filled..])?;
            if n == 0 {
                return Ok(None);
            }
            filled += n;
        }
        Ok(Some(Unit { kind, bytes }))
    }

    /// Write the unit's 2880 bytes to a stream.
    #[cfg(feature = "std")]
    pub fn write_to<W: std::io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.bytes)?;
        Ok(())
    }
}

impl core::fmt::Debug for Unit {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Unit").field("kind", &self.kind).finish()
    }
}
