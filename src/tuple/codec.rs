use crate::error::DecodeError;

use super::{Element, Tuple};

const NULL: u8 = 0x00;
const BYTES: u8 = 0x01;
const STRING: u8 = 0x02;
const NESTED: u8 = 0x05;
const INT_ZERO: u8 = 0x14;
const INT_MIN_CODE: u8 = INT_ZERO - 8;
const INT_MAX_CODE: u8 = INT_ZERO + 8;
const DOUBLE: u8 = 0x21;
const FALSE: u8 = 0x26;
const TRUE: u8 = 0x27;
const ESCAPE: u8 = 0xFF;

const SIGN_BIT: u64 = 1 << 63;

/// Encode a tuple.
pub fn pack(tuple: &Tuple) -> Vec<u8> {
    let mut out = Vec::new();
    pack_into(tuple, &mut out);
    out
}

/// Append the encoding of `tuple` to `out`.
pub(crate) fn pack_into(tuple: &Tuple, out: &mut Vec<u8>) {
    for element in tuple.iter() {
        encode(element, out, false);
    }
}

/// Decode bytes produced by [`pack`].
pub fn unpack(bytes: &[u8]) -> Result<Tuple, DecodeError> {
    let mut decoder = Decoder { bytes, pos: 0 };
    let mut elements = Vec::new();
    while decoder.pos < bytes.len() {
        elements.push(decoder.element()?);
    }
    Ok(Tuple(elements))
}

/// The unsigned value whose order matches the encoded order of `value`.
pub(super) fn order_bits(value: f64) -> u64 {
    let bits = value.to_bits();
    if bits & SIGN_BIT != 0 {
        !bits
    } else {
        bits ^ SIGN_BIT
    }
}

fn from_order_bits(bits: u64) -> f64 {
    if bits & SIGN_BIT != 0 {
        f64::from_bits(bits ^ SIGN_BIT)
    } else {
        f64::from_bits(!bits)
    }
}

fn encode(element: &Element, out: &mut Vec<u8>, nested: bool) {
    match element {
        Element::Null if nested => out.extend_from_slice(&[NULL, ESCAPE]),
        Element::Null => out.push(NULL),
        Element::Bytes(bytes) => encode_escaped(BYTES, bytes, out),
        Element::String(string) => encode_escaped(STRING, string.as_bytes(), out),
        Element::Nested(tuple) => {
            out.push(NESTED);
            for inner in tuple.iter() {
                encode(inner, out, true);
            }
            out.push(NULL);
        }
        Element::Int(value) => encode_int(*value, out),
        Element::Double(value) => {
            out.push(DOUBLE);
            out.extend_from_slice(&order_bits(*value).to_be_bytes());
        }
        Element::Bool(false) => out.push(FALSE),
        Element::Bool(true) => out.push(TRUE),
    }
}

fn encode_escaped(code: u8, payload: &[u8], out: &mut Vec<u8>) {
    out.push(code);
    for &byte in payload {
        out.push(byte);
        if byte == NULL {
            out.push(ESCAPE);
        }
    }
    out.push(NULL);
}

fn encode_int(value: i64, out: &mut Vec<u8>) {
    if value == 0 {
        out.push(INT_ZERO);
        return;
    }
    let magnitude = value.unsigned_abs();
    let len = 8 - magnitude.leading_zeros() as usize / 8;
    if value > 0 {
        out.push(INT_ZERO + len as u8);
        out.extend_from_slice(&magnitude.to_be_bytes()[8 - len..]);
    } else {
        out.push(INT_ZERO - len as u8);
        out.extend_from_slice(&(!magnitude).to_be_bytes()[8 - len..]);
    }
}

struct Decoder<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Decoder<'_> {
    fn element(&mut self) -> Result<Element, DecodeError> {
        let start = self.pos;
        let code = self.bytes[start];
        self.pos += 1;
        match code {
            NULL => Ok(Element::Null),
            BYTES => Ok(Element::Bytes(self.escaped(start)?)),
            STRING => {
                let raw = self.escaped(start)?;
                String::from_utf8(raw)
                    .map(Element::String)
                    .map_err(|_| DecodeError::InvalidUtf8)
            }
            NESTED => self.nested(start),
            INT_MIN_CODE..=INT_MAX_CODE => self.int(code, start),
            DOUBLE => {
                let raw = self.take(8, start)?;
                let mut buf = [0u8; 8];
                buf.copy_from_slice(raw);
                Ok(Element::Double(from_order_bits(u64::from_be_bytes(buf))))
            }
            FALSE => Ok(Element::Bool(false)),
            TRUE => Ok(Element::Bool(true)),
            _ => Err(DecodeError::UnknownTypeCode {
                code,
                offset: start,
            }),
        }
    }

    fn take(&mut self, len: usize, start: usize) -> Result<&[u8], DecodeError> {
        let end = self.pos + len;
        if end > self.bytes.len() {
            return Err(DecodeError::Truncated(start));
        }
        let raw = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(raw)
    }

    /// Payload up to the unescaped terminator.
    fn escaped(&mut self, start: usize) -> Result<Vec<u8>, DecodeError> {
        let mut out = Vec::new();
        loop {
            match self.bytes.get(self.pos) {
                None => return Err(DecodeError::Truncated(start)),
                Some(&NULL) if self.bytes.get(self.pos + 1) == Some(&ESCAPE) => {
                    out.push(NULL);
                    self.pos += 2;
                }
                Some(&NULL) => {
                    self.pos += 1;
                    return Ok(out);
                }
                Some(&byte) => {
                    out.push(byte);
                    self.pos += 1;
                }
            }
        }
    }

    fn nested(&mut self, start: usize) -> Result<Element, DecodeError> {
        let mut elements = Vec::new();
        loop {
            match self.bytes.get(self.pos) {
                None => return Err(DecodeError::Truncated(start)),
                Some(&NULL) if self.bytes.get(self.pos + 1) == Some(&ESCAPE) => {
                    elements.push(Element::Null);
                    self.pos += 2;
                }
                Some(&NULL) => {
                    self.pos += 1;
                    return Ok(Element::Nested(Tuple(elements)));
                }
                Some(_) => elements.push(self.element()?),
            }
        }
    }

    fn int(&mut self, code: u8, start: usize) -> Result<Element, DecodeError> {
        if code == INT_ZERO {
            return Ok(Element::Int(0));
        }
        let negative = code < INT_ZERO;
        let len = code.abs_diff(INT_ZERO) as usize;
        let raw = self.take(len, start)?;

        let mut buf = [0u8; 8];
        buf[8 - len..].copy_from_slice(raw);
        let stored = u64::from_be_bytes(buf);

        if negative {
            if raw[0] == 0xFF {
                return Err(DecodeError::NonCanonicalInteger(start));
            }
            // Undo the one's complement within `len` bytes.
            let mask = if len == 8 { u64::MAX } else { (1u64 << (len * 8)) - 1 };
            let magnitude = !stored & mask;
            0i64.checked_sub_unsigned(magnitude)
                .map(Element::Int)
                .ok_or(DecodeError::IntegerOverflow(start))
        } else {
            if raw[0] == 0x00 {
                return Err(DecodeError::NonCanonicalInteger(start));
            }
            i64::try_from(stored)
                .map(Element::Int)
                .map_err(|_| DecodeError::IntegerOverflow(start))
        }
    }
}
