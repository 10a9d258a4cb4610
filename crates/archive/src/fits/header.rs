use std::io::{ErrorKind, Read, Write};

use super::{BLOCK_SIZE, CARD_SIZE, padded_len};
use crate::error::ArchiveError;

/// Value of a header card.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    Logical(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl HeaderValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HeaderValue::Integer(v) => Some(*v as f64),
            HeaderValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            HeaderValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HeaderValue::Text(v) => Some(v),
            _ => None,
        }
    }

    fn format(&self) -> String {
        match self {
            HeaderValue::Logical(v) => format!("{:>20}", if *v { "T" } else { "F" }),
            HeaderValue::Integer(v) => format!("{v:>20}"),
            HeaderValue::Float(v) => format!("{:>20}", format!("{v:.15E}")),
            HeaderValue::Text(v) => format!("'{:<8}'", v.replace('\'', "''")),
        }
    }

    fn parse(text: &str) -> Option<HeaderValue> {
        let text = text.trim_start();
        if let Some(rest) = text.strip_prefix('\'') {
            return Some(HeaderValue::Text(parse_quoted(rest)));
        }

        let token = text.split('/').next().unwrap_or("").trim();
        match token {
            "" => None,
            "T" => Some(HeaderValue::Logical(true)),
            "F" => Some(HeaderValue::Logical(false)),
            _ => token
                .parse::<i64>()
                .map(HeaderValue::Integer)
                .or_else(|_| token.replace('D', "E").parse::<f64>().map(HeaderValue::Float))
                .ok(),
        }
    }
}

/// Reads a quoted string body; `''` is an escaped quote. Trailing spaces are not significant.
fn parse_quoted(rest: &str) -> String {
    let mut value = String::new();
    let mut chars = rest.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\'' {
            if chars.peek() == Some(&'\'') {
                value.push('\'');
                chars.next();
            } else {
                break;
            }
        } else {
            value.push(c);
        }
    }
    value.trim_end().to_string()
}

/// Reads until `block` is full or the stream ends, returning the byte count.
fn fill_block<R: Read>(reader: &mut R, block: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < block.len() {
        match reader.read(&mut block[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// An ordered list of keyword/value cards.
///
/// # Examples
///
/// ```
/// use archive::fits::{Header, HeaderValue};
///
/// let mut header = Header::new();
/// header.set("NAXIS", HeaderValue::Integer(0));
/// header.set("TIME", HeaderValue::Float(12.5));
///
/// let bytes = header.to_bytes().unwrap();
/// assert_eq!(bytes.len(), 2880);
///
/// let parsed = Header::read_from(&mut bytes.as_slice()).unwrap().unwrap();
/// assert_eq!(parsed.get_f64("TIME"), Some(12.5));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    cards: Vec<(String, HeaderValue)>,
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `keyword`, replacing an existing card with the same keyword.
    pub fn set(&mut self, keyword: &str, value: HeaderValue) {
        match self.cards.iter_mut().find(|(k, _)| k == keyword) {
            Some((_, existing)) => *existing = value,
            None => self.cards.push((keyword.to_string(), value)),
        }
    }

    pub fn get(&self, keyword: &str) -> Option<&HeaderValue> {
        self.cards
            .iter()
            .find(|(k, _)| k == keyword)
            .map(|(_, v)| v)
    }

    pub fn get_f64(&self, keyword: &str) -> Option<f64> {
        self.get(keyword).and_then(HeaderValue::as_f64)
    }

    pub fn get_i64(&self, keyword: &str) -> Option<i64> {
        self.get(keyword).and_then(HeaderValue::as_i64)
    }

    pub fn get_str(&self, keyword: &str) -> Option<&str> {
        self.get(keyword).and_then(HeaderValue::as_str)
    }

    pub fn require_i64(&self, keyword: &str) -> Result<i64, ArchiveError> {
        self.get_i64(keyword)
            .ok_or_else(|| ArchiveError::Header(format!("missing integer keyword {keyword}")))
    }

    /// Whether this is the header of a binary table extension
    pub fn is_bintable(&self) -> bool {
        self.get_str("XTENSION") == Some("BINTABLE")
    }

    /// Size in bytes of the data unit that follows this header, without padding.
    pub fn data_len(&self) -> Result<usize, ArchiveError> {
        let naxis = self.get_i64("NAXIS").unwrap_or(0);
        if naxis == 0 {
            return Ok(0);
        }
        let bitpix = self.require_i64("BITPIX")?;
        let overflow = || ArchiveError::Header("data size overflows".to_string());
        let mut elements: i64 = 1;
        for axis in 1..=naxis {
            let length = self.require_i64(&format!("NAXIS{axis}"))?;
            elements = elements.checked_mul(length).ok_or_else(overflow)?;
        }
        let pcount = self.get_i64("PCOUNT").unwrap_or(0);
        let gcount = self.get_i64("GCOUNT").unwrap_or(1);
        let bytes = pcount
            .checked_add(elements)
            .and_then(|n| n.checked_mul(gcount))
            .and_then(|n| n.checked_mul((bitpix.unsigned_abs() / 8) as i64))
            .ok_or_else(overflow)?;
        usize::try_from(bytes).map_err(|_| ArchiveError::Header(format!("negative data size {bytes}")))
    }

    /// Serializes the cards, an `END` card and block padding.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ArchiveError> {
        let mut bytes = Vec::with_capacity(BLOCK_SIZE);
        for (keyword, value) in &self.cards {
            if keyword.len() > 8 || !keyword.is_ascii() {
                return Err(ArchiveError::Header(format!("invalid keyword {keyword}")));
            }
            let card = format!("{keyword:<8}= {}", value.format());
            if card.len() > CARD_SIZE || !card.is_ascii() {
                return Err(ArchiveError::Header(format!("card for {keyword} is too long")));
            }
            bytes.extend_from_slice(format!("{card:<80}").as_bytes());
        }
        bytes.extend_from_slice(format!("{:<80}", "END").as_bytes());
        bytes.resize(padded_len(bytes.len()), b' ');
        Ok(bytes)
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), ArchiveError> {
        writer.write_all(&self.to_bytes()?)?;
        Ok(())
    }

    /// Reads one header block by block until the `END` card.
    ///
    /// Returns `Ok(None)` at a clean end of file (no bytes before the header).
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Option<Header>, ArchiveError> {
        let mut header = Header::new();
        let mut block = vec![0u8; BLOCK_SIZE];
        let mut first = true;

        loop {
            match fill_block(reader, &mut block)? {
                0 if first => return Ok(None),
                BLOCK_SIZE => {}
                _ => return Err(ArchiveError::Header("truncated header".to_string())),
            }
            first = false;

            for card in block.chunks(CARD_SIZE) {
                if !card.is_ascii() {
                    return Err(ArchiveError::Header("non-ASCII card".to_string()));
                }
                let card = std::str::from_utf8(card)
                    .map_err(|_| ArchiveError::Header("non-ASCII card".to_string()))?;
                let keyword = card[..8].trim_end();
                if keyword == "END" {
                    return Ok(Some(header));
                }
                if keyword.is_empty() || &card[8..10] != "= " {
                    continue;
                }
                if let Some(value) = HeaderValue::parse(&card[10..]) {
                    header.cards.push((keyword.to_string(), value));
                }
            }
        }
    }
}
