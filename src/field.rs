//! Field types and values: the closed type enumeration tuples are built
//! from, per the data model's tuple descriptor.

use crate::error::{DbError, DbResult};
use std::fmt;

/// Default fixed width for `Varchar` fields when one isn't specified.
pub const DEFAULT_STRING_LEN: usize = 128;

/// A field type in the closed enumeration: fixed-width integer or
/// fixed-width string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Int,
    Varchar(usize),
}

impl FieldType {
    /// Width in bytes, as stored on disk.
    pub fn width(&self) -> usize {
        match self {
            FieldType::Int => 4,
            FieldType::Varchar(len) => *len,
        }
    }
}

/// A field value, one per tuple position.
#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub enum Field {
    Int(i32),
    Varchar(String),
}

impl Field {
    /// Encodes this value into exactly `width` bytes, per the on-disk
    /// field layout: 4-byte big-endian int, or a 4-byte big-endian length
    /// prefix followed by content and zero padding for strings.
    pub fn encode(&self, width: usize, out: &mut Vec<u8>) -> DbResult<()> {
        match self {
            Field::Int(v) => {
                if width != 4 {
                    return Err(DbError::db("int field width must be 4"));
                }
                out.extend_from_slice(&v.to_be_bytes());
            }
            Field::Varchar(s) => {
                let bytes = s.as_bytes();
                if bytes.len() + 4 > width {
                    return Err(DbError::db("string value too long for field width"));
                }
                out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
                out.extend_from_slice(bytes);
                let padding = width - 4 - bytes.len();
                out.extend(std::iter::repeat(0u8).take(padding));
            }
        }
        Ok(())
    }

    pub fn decode(field_type: FieldType, bytes: &[u8]) -> DbResult<Field> {
        match field_type {
            FieldType::Int => {
                if bytes.len() != 4 {
                    return Err(DbError::db("int field slice must be 4 bytes"));
                }
                let mut arr = [0u8; 4];
                arr.copy_from_slice(bytes);
                Ok(Field::Int(i32::from_be_bytes(arr)))
            }
            FieldType::Varchar(len) => {
                if bytes.len() != len {
                    return Err(DbError::db("string field slice has wrong width"));
                }
                let mut len_bytes = [0u8; 4];
                len_bytes.copy_from_slice(&bytes[0..4]);
                let n = u32::from_be_bytes(len_bytes) as usize;
                if 4 + n > bytes.len() {
                    return Err(DbError::db("string field length prefix out of range"));
                }
                let content = std::str::from_utf8(&bytes[4..4 + n])
                    .map_err(|_| DbError::db("string field is not valid utf8"))?;
                Ok(Field::Varchar(content.to_string()))
            }
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Field::Int(v) => write!(f, "{}", v),
            Field::Varchar(s) => write!(f, "{}", s),
        }
    }
}
