use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};
use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::record::{encode_real8, RecordType, MAX_PAYLOAD, MAX_XY_POINTS};
use crate::{
    GdsBoundary, GdsElement, GdsError, GdsLibrary, GdsPath, GdsPoint, GdsResult, GdsStrans,
    GdsStruct, GdsStructRef, GdsTextElem,
};

/// GDSII stream version written to the HEADER record.
const VERSION: i16 = 600;

const STRANS_REFLECT: u16 = 0x8000;

pub(crate) struct GdsWriter<W> {
    dest: W,
}

impl<W: Write> GdsWriter<W> {
    pub(crate) fn new(dest: W) -> Self {
        Self { dest }
    }

    pub(crate) fn write_library(mut self, lib: &GdsLibrary) -> GdsResult<()> {
        self.record_i16(RecordType::Header, &[VERSION])?;
        self.record_i16(RecordType::BgnLib, &timestamps(lib.modified))?;
        self.record_str(RecordType::LibName, &lib.name)?;
        self.record_real(RecordType::Units, &[lib.units.user, lib.units.db])?;
        for strukt in &lib.structs {
            self.write_struct(strukt, lib.modified)?;
        }
        self.record_empty(RecordType::EndLib)?;
        self.dest.flush()?;
        Ok(())
    }

    fn write_struct(&mut self, strukt: &GdsStruct, modified: NaiveDateTime) -> GdsResult<()> {
        self.record_i16(RecordType::BgnStr, &timestamps(modified))?;
        self.record_str(RecordType::StrName, &strukt.name)?;
        for elem in &strukt.elems {
            match elem {
                GdsElement::Boundary(b) => self.write_boundary(b)?,
                GdsElement::Path(p) => self.write_path(p)?,
                GdsElement::StructRef(s) => self.write_sref(s)?,
                GdsElement::Text(t) => self.write_text(t)?,
            }
        }
        self.record_empty(RecordType::EndStr)
    }

    fn write_boundary(&mut self, b: &GdsBoundary) -> GdsResult<()> {
        let mut xy = b.xy.clone();
        if let (Some(first), Some(last)) = (xy.first().copied(), xy.last().copied()) {
            if first != last {
                xy.push(first);
            }
        }
        self.record_empty(RecordType::Boundary)?;
        self.record_i16(RecordType::Layer, &[b.layer])?;
        self.record_i16(RecordType::DataType, &[b.datatype])?;
        self.record_xy(&xy)?;
        self.record_empty(RecordType::EndEl)
    }

    fn write_path(&mut self, p: &GdsPath) -> GdsResult<()> {
        self.record_empty(RecordType::Path)?;
        self.record_i16(RecordType::Layer, &[p.layer])?;
        self.record_i16(RecordType::DataType, &[p.datatype])?;
        self.record_i16(RecordType::PathType, &[p.pathtype])?;
        self.record_i32(RecordType::Width, &[p.width])?;
        self.record_xy(&p.xy)?;
        self.record_empty(RecordType::EndEl)
    }

    fn write_sref(&mut self, s: &GdsStructRef) -> GdsResult<()> {
        self.record_empty(RecordType::Sref)?;
        self.record_str(RecordType::SName, &s.name)?;
        if let Some(strans) = &s.strans {
            self.write_strans(strans)?;
        }
        self.record_xy(&[s.xy])?;
        self.record_empty(RecordType::EndEl)
    }

    fn write_text(&mut self, t: &GdsTextElem) -> GdsResult<()> {
        self.record_empty(RecordType::Text)?;
        self.record_i16(RecordType::Layer, &[t.layer])?;
        self.record_i16(RecordType::TextType, &[t.texttype])?;
        if let Some(strans) = &t.strans {
            self.write_strans(strans)?;
        }
        self.record_xy(&[t.xy])?;
        self.record_str(RecordType::String, &t.string)?;
        self.record_empty(RecordType::EndEl)
    }

    fn write_strans(&mut self, strans: &GdsStrans) -> GdsResult<()> {
        let bits = if strans.reflected { STRANS_REFLECT } else { 0 };
        self.header(RecordType::Strans, 2)?;
        self.dest.write_u16::<BigEndian>(bits)?;
        if let Some(mag) = strans.mag {
            self.record_real(RecordType::Mag, &[mag])?;
        }
        if let Some(angle) = strans.angle {
            self.record_real(RecordType::Angle, &[angle])?;
        }
        Ok(())
    }

    fn header(&mut self, rtype: RecordType, payload: usize) -> GdsResult<()> {
        if payload > MAX_PAYLOAD {
            return Err(GdsError::Malformed(arcstr::format!(
                "payload of {payload} bytes exceeds a single record"
            )));
        }
        self.dest.write_u16::<BigEndian>((payload + 4) as u16)?;
        self.dest.write_u8(rtype.code())?;
        self.dest.write_u8(rtype.data_type())?;
        Ok(())
    }

    fn record_empty(&mut self, rtype: RecordType) -> GdsResult<()> {
        self.header(rtype, 0)
    }

    fn record_i16(&mut self, rtype: RecordType, values: &[i16]) -> GdsResult<()> {
        self.header(rtype, values.len() * 2)?;
        for v in values {
            self.dest.write_i16::<BigEndian>(*v)?;
        }
        Ok(())
    }

    fn record_i32(&mut self, rtype: RecordType, values: &[i32]) -> GdsResult<()> {
        self.header(rtype, values.len() * 4)?;
        for v in values {
            self.dest.write_i32::<BigEndian>(*v)?;
        }
        Ok(())
    }

    fn record_real(&mut self, rtype: RecordType, values: &[f64]) -> GdsResult<()> {
        self.header(rtype, values.len() * 8)?;
        for v in values {
            self.dest.write_u64::<BigEndian>(encode_real8(*v))?;
        }
        Ok(())
    }

    fn record_str(&mut self, rtype: RecordType, s: &str) -> GdsResult<()> {
        let bytes = s.as_bytes();
        let padded = bytes.len() + bytes.len() % 2;
        if padded > MAX_PAYLOAD {
            return Err(GdsError::StringTooLong(bytes.len()));
        }
        self.header(rtype, padded)?;
        self.dest.write_all(bytes)?;
        if padded != bytes.len() {
            self.dest.write_u8(0)?;
        }
        Ok(())
    }

    fn record_xy(&mut self, points: &[GdsPoint]) -> GdsResult<()> {
        if points.len() > MAX_XY_POINTS {
            return Err(GdsError::TooManyPoints(points.len()));
        }
        self.header(RecordType::Xy, points.len() * 8)?;
        for p in points {
            self.dest.write_i32::<BigEndian>(p.x)?;
            self.dest.write_i32::<BigEndian>(p.y)?;
        }
        Ok(())
    }
}

/// Modification and access times, both set to `t`.
fn timestamps(t: NaiveDateTime) -> [i16; 12] {
    let one = [
        t.year() as i16,
        t.month() as i16,
        t.day() as i16,
        t.hour() as i16,
        t.minute() as i16,
        t.second() as i16,
    ];
    let mut out = [0i16; 12];
    out[..6].copy_from_slice(&one);
    out[6..].copy_from_slice(&one);
    out
}
