//! Key/value dictionary exchanged with the companion app.
//!
//! Wire format (all integers little-endian):
//!
//! ```text
//! ┌───────┬─────────┬──────┬────────┬───────────────┐
//! │ COUNT │ KEY     │ TYPE │ LENGTH │ VALUE         │ ... repeated COUNT times
//! │ 1B    │ 4B      │ 1B   │ 2B     │ LENGTH bytes  │
//! └───────┴─────────┴──────┴────────┴───────────────┘
//! ```
//!
//! TYPE is 0 for a byte array, 1 for a NUL terminated string, 2 for an
//! unsigned and 3 for a signed integer of 1, 2 or 4 bytes.

use heapless::{String, Vec};

use crate::config::{MAX_MESSAGE_SIZE, MAX_TUPLES, MAX_VALUE_LEN};

const TYPE_BYTES: u8 = 0;
const TYPE_CSTRING: u8 = 1;
const TYPE_UINT: u8 = 2;
const TYPE_INT: u8 = 3;

/// Size of the KEY, TYPE and LENGTH fields
const TUPLE_HEADER_LEN: usize = 4 + 1 + 2;

/// Errors that can occur while decoding a dictionary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Input ended inside a tuple
    Truncated,
    /// Tuple type is not one of the four known types
    UnknownType(u8),
    /// Integer tuple with a length other than 1, 2 or 4
    BadLength,
    /// More tuples than a dictionary can hold
    TooManyTuples,
    /// Value does not fit the value buffer
    ValueTooLong,
    /// String value is not UTF-8
    InvalidUtf8,
}

/// Errors that can occur while encoding a dictionary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// Output buffer too small
    BufferTooSmall,
    /// More tuples than a dictionary can hold
    TooManyTuples,
}

/// Value of a single tuple
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bytes(Vec<u8, MAX_VALUE_LEN>),
    CString(String<MAX_VALUE_LEN>),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    Int8(i8),
    Int16(i16),
    Int32(i32),
}

impl Value {
    /// Integer value as `i32`, for any integer width that fits.
    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            Value::UInt8(v) => Some(i32::from(v)),
            Value::UInt16(v) => Some(i32::from(v)),
            Value::UInt32(v) => i32::try_from(v).ok(),
            Value::Int8(v) => Some(i32::from(v)),
            Value::Int16(v) => Some(i32::from(v)),
            Value::Int32(v) => Some(v),
            Value::Bytes(_) | Value::CString(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::CString(s) => Some(s.as_str()),
            _ => None,
        }
    }

    fn type_id(&self) -> u8 {
        match self {
            Value::Bytes(_) => TYPE_BYTES,
            Value::CString(_) => TYPE_CSTRING,
            Value::UInt8(_) | Value::UInt16(_) | Value::UInt32(_) => TYPE_UINT,
            Value::Int8(_) | Value::Int16(_) | Value::Int32(_) => TYPE_INT,
        }
    }

    /// Number of value bytes on the wire
    fn wire_len(&self) -> usize {
        match self {
            Value::Bytes(b) => b.len(),
            // Terminating NUL
            Value::CString(s) => s.len() + 1,
            Value::UInt8(_) | Value::Int8(_) => 1,
            Value::UInt16(_) | Value::Int16(_) => 2,
            Value::UInt32(_) | Value::Int32(_) => 4,
        }
    }

    fn write_to(&self, out: &mut [u8]) {
        match self {
            Value::Bytes(b) => out.copy_from_slice(b),
            Value::CString(s) => {
                out[..s.len()].copy_from_slice(s.as_bytes());
                out[s.len()] = 0;
            }
            Value::UInt8(v) => out.copy_from_slice(&v.to_le_bytes()),
            Value::UInt16(v) => out.copy_from_slice(&v.to_le_bytes()),
            Value::UInt32(v) => out.copy_from_slice(&v.to_le_bytes()),
            Value::Int8(v) => out.copy_from_slice(&v.to_le_bytes()),
            Value::Int16(v) => out.copy_from_slice(&v.to_le_bytes()),
            Value::Int32(v) => out.copy_from_slice(&v.to_le_bytes()),
        }
    }

    fn read_from(type_id: u8, data: &[u8]) -> Result<Self, DecodeError> {
        match type_id {
            TYPE_BYTES => Vec::from_slice(data)
                .map(Value::Bytes)
                .map_err(|_| DecodeError::ValueTooLong),
            TYPE_CSTRING => {
                let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
                let text =
                    core::str::from_utf8(&data[..end]).map_err(|_| DecodeError::InvalidUtf8)?;
                let mut s = String::new();
                s.push_str(text).map_err(|_| DecodeError::ValueTooLong)?;
                Ok(Value::CString(s))
            }
            TYPE_UINT => match *data {
                [a] => Ok(Value::UInt8(a)),
                [a, b] => Ok(Value::UInt16(u16::from_le_bytes([a, b]))),
                [a, b, c, d] => Ok(Value::UInt32(u32::from_le_bytes([a, b, c, d]))),
                _ => Err(DecodeError::BadLength),
            },
            TYPE_INT => match *data {
                [a] => Ok(Value::Int8(i8::from_le_bytes([a]))),
                [a, b] => Ok(Value::Int16(i16::from_le_bytes([a, b]))),
                [a, b, c, d] => Ok(Value::Int32(i32::from_le_bytes([a, b, c, d]))),
                _ => Err(DecodeError::BadLength),
            },
            other => Err(DecodeError::UnknownType(other)),
        }
    }
}

/// One key/value pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tuple {
    pub key: u32,
    pub value: Value,
}

/// An ordered set of tuples
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dictionary {
    tuples: Vec<Tuple, MAX_TUPLES>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tuple, replacing any previous value under the same key.
    pub fn insert(&mut self, key: u32, value: Value) -> Result<(), EncodeError> {
        if let Some(tuple) = self.tuples.iter_mut().find(|t| t.key == key) {
            tuple.value = value;
            return Ok(());
        }
        self.tuples
            .push(Tuple { key, value })
            .map_err(|_| EncodeError::TooManyTuples)
    }

    /// Look up the value stored under `key`.
    pub fn find(&self, key: u32) -> Option<&Value> {
        self.tuples.iter().find(|t| t.key == key).map(|t| &t.value)
    }

    pub fn tuples(&self) -> &[Tuple] {
        &self.tuples
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    /// Number of bytes `encode` writes
    pub fn encoded_len(&self) -> usize {
        1 + self
            .tuples
            .iter()
            .map(|t| TUPLE_HEADER_LEN + t.value.wire_len())
            .sum::<usize>()
    }

    /// Encode this dictionary into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, EncodeError> {
        let total = self.encoded_len();
        if buffer.len() < total {
            return Err(EncodeError::BufferTooSmall);
        }

        buffer[0] = self.tuples.len() as u8;
        let mut pos = 1;
        for tuple in &self.tuples {
            let len = tuple.value.wire_len();
            buffer[pos..pos + 4].copy_from_slice(&tuple.key.to_le_bytes());
            buffer[pos + 4] = tuple.value.type_id();
            buffer[pos + 5..pos + 7].copy_from_slice(&(len as u16).to_le_bytes());
            pos += TUPLE_HEADER_LEN;
            tuple.value.write_to(&mut buffer[pos..pos + len]);
            pos += len;
        }

        Ok(pos)
    }

    /// Encode this dictionary into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_MESSAGE_SIZE>, EncodeError> {
        let mut buffer = [0u8; MAX_MESSAGE_SIZE];
        let len = self.encode(&mut buffer)?;
        Vec::from_slice(&buffer[..len]).map_err(|_| EncodeError::BufferTooSmall)
    }

    /// Decode a complete dictionary. Trailing bytes are ignored.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let (&count, mut rest) = bytes.split_first().ok_or(DecodeError::Truncated)?;
        if count as usize > MAX_TUPLES {
            return Err(DecodeError::TooManyTuples);
        }

        let mut dict = Dictionary::new();
        for _ in 0..count {
            if rest.len() < TUPLE_HEADER_LEN {
                return Err(DecodeError::Truncated);
            }
            let key = u32::from_le_bytes([rest[0], rest[1], rest[2], rest[3]]);
            let type_id = rest[4];
            let len = u16::from_le_bytes([rest[5], rest[6]]) as usize;
            rest = &rest[TUPLE_HEADER_LEN..];

            if rest.len() < len {
                return Err(DecodeError::Truncated);
            }
            let value = Value::read_from(type_id, &rest[..len])?;
            rest = &rest[len..];

            dict.insert(key, value)
                .map_err(|_| DecodeError::TooManyTuples)?;
        }

        Ok(dict)
    }
}
