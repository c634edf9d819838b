//! 80-byte FITS keyword cards.

use alloc::string::String;
use core::str;

use crate::error::{Error, Result};
use crate::value::{format_value, parse_value, CardValue, VALUE_FIELD_SIZE};

/// Card (keyword record) size in bytes.
pub const CARD_SIZE: usize = 80;

/// Keyword name size in bytes (card columns 1-8).
pub const NAME_SIZE: usize = 8;

const END_NAME: &[u8; NAME_SIZE] = b"END     ";
const BLANK_NAME: [u8; NAME_SIZE] = [b' '; NAME_SIZE];

/// One FITS header card: an 8-byte keyword name, a typed value, and an
/// optional comment. Serializes to exactly [`CARD_SIZE`] ASCII bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    /// Keyword name, ASCII, left-justified, space-padded.
    pub name: [u8; NAME_SIZE],
    /// Typed value; [`CardValue::Blank`] for valueless cards.
    pub value: CardValue,
    /// Optional comment (the text after ` /`, or the free text of a
    /// commentary card).
    pub comment: Option<String>,
}

/// Uppercase, truncate and pad a keyword name to 8 bytes, rejecting
/// characters outside the FITS keyword alphabet.
fn normalize_name(name: &str) -> Result<[u8; NAME_SIZE]> {
    let mut buf = BLANK_NAME;
    for (i, byte) in name.bytes().take(NAME_SIZE).enumerate() {
        let b = byte.to_ascii_uppercase();
        match b {
            b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b' ' => buf[i] = b,
            _ => return Err(Error::InvalidKeyword),
        }
    }
    Ok(buf)
}

fn validate_name(name: &[u8; NAME_SIZE]) -> Result<()> {
    for &b in name {
        match b {
            b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b' ' => {}
            _ => return Err(Error::InvalidKeyword),
        }
    }
    Ok(())
}

fn is_commentary_name(name: &[u8; NAME_SIZE]) -> bool {
    name == b"COMMENT " || name == b"HISTORY " || *name == BLANK_NAME
}

impl Card {
    /// Create a card with the given keyword name and value.
    ///
    /// The name is uppercased and truncated/padded to 8 characters; names
    /// containing characters outside `A-Z 0-9 - _` fail with
    /// [`Error::InvalidKeyword`].
    pub fn new(name: &str, value: CardValue) -> Result<Card> {
        Ok(Card {
            name: normalize_name(name)?,
            value,
            comment: None,
        })
    }

    /// Create a card with a comment.
    pub fn with_comment(name: &str, value: CardValue, comment: &str) -> Result<Card> {
        Ok(Card {
            name: normalize_name(name)?,
            value,
            comment: Some(String::from(comment)),
        })
    }

    /// The END sentinel card terminating a keyword list.
    pub fn end() -> Card {
        Card {
            name: *END_NAME,
            value: CardValue::Blank,
            comment: None,
        }
    }

    /// An entirely blank card.
    pub fn blank() -> Card {
        Card {
            name: BLANK_NAME,
            value: CardValue::Blank,
            comment: None,
        }
    }

    /// The keyword name with trailing padding removed.
    pub fn name_str(&self) -> &str {
        let end = self
            .name
            .iter()
            .rposition(|&b| b != b' ')
            .map_or(0, |i| i + 1);
        str::from_utf8(&self.name[..end]).unwrap_or("")
    }

    /// Returns `true` if this is the END sentinel.
    pub fn is_end(&self) -> bool {
        &self.name == END_NAME
    }

    /// Returns `true` if the keyword name is all spaces.
    pub fn is_blank(&self) -> bool {
        self.name == BLANK_NAME
    }

    /// Returns `true` for COMMENT, HISTORY and blank-name cards.
    pub fn is_commentary(&self) -> bool {
        is_commentary_name(&self.name)
    }

    // ── typed access (the active variant is the card's type) ──

    /// Logical value, if this card holds one.
    pub fn logical(&self) -> Option<bool> {
        match self.value {
            CardValue::Logical(b) => Some(b),
            _ => None,
        }
    }

    /// Integer value, if this card holds one.
    pub fn integer(&self) -> Option<i64> {
        match self.value {
            CardValue::Integer(n) => Some(n),
            _ => None,
        }
    }

    /// Float value, if this card holds one.
    pub fn float(&self) -> Option<f64> {
        match self.value {
            CardValue::Float(f) => Some(f),
            _ => None,
        }
    }

    /// String value, if this card holds one.
    pub fn text(&self) -> Option<&str> {
        match &self.value {
            CardValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Complex value as `(real, imaginary)`, if this card holds one.
    pub fn complex(&self) -> Option<(f64, f64)> {
        match self.value {
            CardValue::Complex(re, im) => Some((re, im)),
            _ => None,
        }
    }

    /// Parse an 80-byte card image.
    ///
    /// Fails with [`Error::InvalidCard`] unless `bytes` is exactly 80 bytes,
    /// and with [`Error::InvalidKeyword`] for a malformed name.
    pub fn parse(bytes: &[u8]) -> Result<Card> {
        let card: &[u8; CARD_SIZE] = bytes.try_into().map_err(|_| Error::InvalidCard)?;

        let mut name = BLANK_NAME;
        name.copy_from_slice(&card[..NAME_SIZE]);
        validate_name(&name)?;

        if &name == END_NAME {
            return Ok(Card::end());
        }

        // Commentary cards and cards without the `= ` indicator carry
        // free-form text in bytes 8..80.
        let has_indicator =
            !is_commentary_name(&name) && card[8] == b'=' && card[9] == b' ';
        if !has_indicator {
            let text = str::from_utf8(&card[NAME_SIZE..])
                .map_err(|_| Error::InvalidCard)?
                .trim_end();
            return Ok(Card {
                name,
                value: CardValue::Blank,
                comment: (!text.is_empty()).then(|| String::from(text)),
            });
        }

        let field = &card[10..CARD_SIZE];
        match parse_value(field) {
            Some((value, comment)) => Ok(Card {
                name,
                value,
                comment: comment.map(String::from),
            }),
            None => {
                // Empty value field; keep a comment if one is present.
                let text = str::from_utf8(field).map_err(|_| Error::InvalidCard)?;
                let comment = text
                    .find(" /")
                    .map(|idx| text[idx + 2..].trim_start_matches(' ').trim_end())
                    .filter(|c| !c.is_empty())
                    .map(String::from);
                Ok(Card {
                    name,
                    value: CardValue::Blank,
                    comment,
                })
            }
        }
    }

    /// Serialize this card into its 80-byte image.
    pub fn to_bytes(&self) -> [u8; CARD_SIZE] {
        let mut buf = [b' '; CARD_SIZE];
        buf[..NAME_SIZE].copy_from_slice(&self.name);

        if self.value.is_blank() {
            // Valueless card: free-form comment text from byte 8 on.
            if let Some(comment) = &self.comment {
                if !self.is_blank() || !comment.is_empty() {
                    let bytes = comment.as_bytes();
                    let len = bytes.len().min(CARD_SIZE - NAME_SIZE);
                    buf[NAME_SIZE..NAME_SIZE + len].copy_from_slice(&bytes[..len]);
                }
            }
            return buf;
        }

        buf[8] = b'=';
        buf[9] = b' ';
        let mut field = format_value(&self.value);
        if let Some(comment) = &self.comment {
            append_comment(&mut field, comment);
        }
        buf[10..].copy_from_slice(&field);
        buf
    }
}

/// Append a ` / comment` to a formatted value field, after the value content.
fn append_comment(field: &mut [u8; VALUE_FIELD_SIZE], comment: &str) {
    let content_end = if field[0] == b'\'' {
        // Scan past the closing quote of a string value.
        let mut i = 1;
        loop {
            if i >= VALUE_FIELD_SIZE {
                break i;
            }
            if field[i] == b'\'' {
                if i + 1 < VALUE_FIELD_SIZE && field[i + 1] == b'\'' {
                    i += 2;
                } else {
                    break i + 1;
                }
            } else {
                i += 1;
            }
        }
    } else {
        // Right-justified values may run past the fixed 20-column field
        // (complex pairs do), so find where the content actually ends.
        let end = field
            .iter()
            .rposition(|&b| b != b' ')
            .map_or(0, |i| i + 1);
        end.max(20)
    };

    let sep = content_end + 1;
    if sep + 3 >= VALUE_FIELD_SIZE {
        return;
    }
    field[sep] = b'/';
    field[sep + 1] = b' ';

    let start = sep + 2;
    let bytes = comment.as_bytes();
    let len = bytes.len().min(VALUE_FIELD_SIZE - start);
    field[start..start + len].copy_from_slice(&bytes[..len]);
}
