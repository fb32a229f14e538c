//! Record-level encoding: type codes, 8-byte reals and a streaming reader.

use std::io::Read;

use byteorder::{BigEndian, ReadBytesExt};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::{GdsError, GdsResult};

/// Largest record payload, in bytes.
pub const MAX_PAYLOAD: usize = u16::MAX as usize - 4;

/// Most points a single XY record can carry.
pub const MAX_XY_POINTS: usize = MAX_PAYLOAD / 8;

/// GDSII record types, with their type codes as discriminants.
///
/// Decoded from the code byte with [`FromPrimitive`].
#[derive(FromPrimitive, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RecordType {
    /// Stream version.
    Header = 0x00,
    /// Start of the library, with timestamps.
    BgnLib = 0x01,
    /// Library name.
    LibName = 0x02,
    /// User and database units.
    Units = 0x03,
    /// End of the library.
    EndLib = 0x04,
    /// Start of a structure, with timestamps.
    BgnStr = 0x05,
    /// Structure name.
    StrName = 0x06,
    /// End of a structure.
    EndStr = 0x07,
    /// Start of a boundary element.
    Boundary = 0x08,
    /// Start of a path element.
    Path = 0x09,
    /// Start of a structure reference.
    Sref = 0x0a,
    /// Start of a text element.
    Text = 0x0c,
    /// Layer number.
    Layer = 0x0d,
    /// Data type number.
    DataType = 0x0e,
    /// Path width.
    Width = 0x0f,
    /// Coordinates.
    Xy = 0x10,
    /// End of an element.
    EndEl = 0x11,
    /// Referenced structure name.
    SName = 0x12,
    /// Text type number.
    TextType = 0x16,
    /// Text font and justification.
    Presentation = 0x17,
    /// Text string.
    String = 0x19,
    /// Reflection and absolute flags.
    Strans = 0x1a,
    /// Magnification.
    Mag = 0x1b,
    /// Rotation in degrees.
    Angle = 0x1c,
    /// Path end type.
    PathType = 0x21,
}

impl RecordType {
    /// The record type byte.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// The data type byte that accompanies this record type.
    pub const fn data_type(self) -> u8 {
        match self {
            RecordType::EndLib
            | RecordType::EndStr
            | RecordType::Boundary
            | RecordType::Path
            | RecordType::Sref
            | RecordType::Text
            | RecordType::EndEl => 0x00,
            RecordType::Strans | RecordType::Presentation => 0x01,
            RecordType::Header
            | RecordType::BgnLib
            | RecordType::BgnStr
            | RecordType::Layer
            | RecordType::DataType
            | RecordType::TextType
            | RecordType::PathType => 0x02,
            RecordType::Width | RecordType::Xy => 0x03,
            RecordType::Units | RecordType::Mag | RecordType::Angle => 0x05,
            RecordType::LibName
            | RecordType::StrName
            | RecordType::SName
            | RecordType::String => 0x06,
        }
    }
}

/// Encodes an `f64` as a GDSII excess-64, base-16 real.
///
/// ```
/// use gds::record::{decode_real8, encode_real8};
///
/// assert_eq!(encode_real8(1.0), 0x4110_0000_0000_0000);
/// assert_eq!(decode_real8(encode_real8(1e-9)), 1e-9);
/// ```
pub fn encode_real8(value: f64) -> u64 {
    if value == 0. || !value.is_finite() {
        return 0;
    }
    let sign = if value < 0. { 1u64 << 63 } else { 0 };
    let mut v = value.abs();
    let mut exponent: i32 = 0;
    while v >= 1. {
        v /= 16.;
        exponent += 1;
    }
    while v < 1. / 16. {
        v *= 16.;
        exponent -= 1;
    }
    let mut mantissa = (v * (1u64 << 56) as f64).round() as u64;
    if mantissa >= 1u64 << 56 {
        mantissa >>= 4;
        exponent += 1;
    }
    let biased = (exponent + 64).clamp(0, 127) as u64;
    sign | (biased << 56) | (mantissa & ((1u64 << 56) - 1))
}

/// Decodes a GDSII excess-64, base-16 real.
pub fn decode_real8(bits: u64) -> f64 {
    let sign = if bits >> 63 == 1 { -1. } else { 1. };
    let exponent = ((bits >> 56) & 0x7f) as i32 - 64;
    let mantissa = (bits & ((1u64 << 56) - 1)) as f64 / (1u64 << 56) as f64;
    sign * mantissa * 16f64.powi(exponent)
}

/// A raw record read from a stream.
#[derive(Debug, Clone, PartialEq)]
pub struct GdsRecord {
    /// The record type.
    pub rtype: RecordType,
    /// The payload, without the 4-byte header.
    pub data: Vec<u8>,
}

impl GdsRecord {
    /// Interprets the payload as big-endian 16-bit integers.
    pub fn i16s(&self) -> Vec<i16> {
        self.data
            .chunks_exact(2)
            .map(|c| i16::from_be_bytes([c[0], c[1]]))
            .collect()
    }

    /// Interprets the payload as big-endian 32-bit integers.
    pub fn i32s(&self) -> Vec<i32> {
        self.data
            .chunks_exact(4)
            .map(|c| i32::from_be_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    /// Interprets the payload as 8-byte reals.
    pub fn reals(&self) -> Vec<f64> {
        self.data
            .chunks_exact(8)
            .map(|c| {
                let mut b = [0u8; 8];
                b.copy_from_slice(c);
                decode_real8(u64::from_be_bytes(b))
            })
            .collect()
    }

    /// Interprets the payload as an ASCII string, dropping NUL padding.
    pub fn string(&self) -> String {
        String::from_utf8_lossy(&self.data)
            .trim_end_matches('\0')
            .to_string()
    }
}

/// Iterates over the records of a GDSII stream, stopping after ENDLIB.
pub struct RecordReader<R> {
    src: R,
    done: bool,
}

impl<R: Read> RecordReader<R> {
    /// Creates a reader over `src`.
    pub fn new(src: R) -> Self {
        Self { src, done: false }
    }

    fn read_record(&mut self) -> GdsResult<GdsRecord> {
        let len = self.src.read_u16::<BigEndian>()? as usize;
        if len < 4 || len % 2 != 0 {
            return Err(GdsError::Malformed(arcstr::format!(
                "invalid record length {len}"
            )));
        }
        let code = self.src.read_u8()?;
        let _data_type = self.src.read_u8()?;
        let rtype: RecordType =
            FromPrimitive::from_u8(code).ok_or(GdsError::UnsupportedRecord(code))?;
        let mut data = vec![0u8; len - 4];
        self.src.read_exact(&mut data)?;
        Ok(GdsRecord { rtype, data })
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = GdsResult<GdsRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let rec = self.read_record();
        match &rec {
            Ok(r) if r.rtype == RecordType::EndLib => self.done = true,
            Err(_) => self.done = true,
            _ => {}
        }
        Some(rec)
    }
}
