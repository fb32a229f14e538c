use approx::assert_relative_eq;
use chrono::NaiveDate;

use crate::record::{decode_real8, encode_real8};
use crate::*;

fn fixed_library() -> GdsLibrary {
    let mut lib = GdsLibrary::new("lib");
    lib.modified = NaiveDate::from_ymd_opt(2023, 1, 9)
        .unwrap()
        .and_hms_opt(12, 30, 0)
        .unwrap();
    lib
}

fn records(lib: &GdsLibrary) -> Vec<GdsRecord> {
    let bytes = lib.to_bytes().unwrap();
    RecordReader::new(bytes.as_slice())
        .collect::<GdsResult<Vec<_>>>()
        .unwrap()
}

#[test]
fn real8_encoding() {
    assert_eq!(encode_real8(0.), 0);
    assert_eq!(encode_real8(1e-3), 0x3e41_8937_4bc6_a7f0);
    for v in [1e-3, 1e-9, 90., -270.5, 0.1, 123456.789] {
        assert_relative_eq!(decode_real8(encode_real8(v)), v, max_relative = 1e-15);
    }
}

#[test]
fn empty_library_structure() {
    let recs = records(&fixed_library());
    let types: Vec<_> = recs.iter().map(|r| r.rtype).collect();
    assert_eq!(
        types,
        vec![
            RecordType::Header,
            RecordType::BgnLib,
            RecordType::LibName,
            RecordType::Units,
            RecordType::EndLib
        ]
    );
    assert_eq!(recs[0].i16s(), vec![600]);
    assert_eq!(&recs[1].i16s()[..6], &[2023, 1, 9, 12, 30, 0]);
    assert_eq!(recs[2].string(), "lib");
    let units = recs[3].reals();
    assert_relative_eq!(units[0], 1e-3, max_relative = 1e-15);
    assert_relative_eq!(units[1], 1e-9, max_relative = 1e-15);
}

#[test]
fn boundary_is_closed_and_odd_strings_padded() {
    let mut lib = fixed_library();
    let mut cell = GdsStruct::new("ABC");
    cell.elems.push(
        GdsBoundary {
            layer: 130,
            datatype: 1,
            xy: vec![
                GdsPoint::new(0, 0),
                GdsPoint::new(1000, 0),
                GdsPoint::new(1000, -500),
            ],
        }
        .into(),
    );
    lib.structs.push(cell);

    let bytes = lib.to_bytes().unwrap();
    assert_eq!(bytes.len() % 2, 0);
    let recs = records(&lib);
    let name = recs.iter().find(|r| r.rtype == RecordType::StrName).unwrap();
    assert_eq!(name.data.len(), 4);
    assert_eq!(name.string(), "ABC");
    let xy = recs.iter().find(|r| r.rtype == RecordType::Xy).unwrap();
    assert_eq!(xy.i32s(), vec![0, 0, 1000, 0, 1000, -500, 0, 0]);
    let layer = recs.iter().find(|r| r.rtype == RecordType::Layer).unwrap();
    assert_eq!(layer.i16s(), vec![130]);
}

#[test]
fn sref_with_strans() {
    let mut lib = fixed_library();
    let mut top = GdsStruct::new("TOP");
    top.elems.push(
        GdsStructRef {
            name: "CHILD".into(),
            xy: GdsPoint::new(3_000_000, 7_000_000),
            strans: Some(GdsStrans {
                reflected: true,
                mag: None,
                angle: Some(90.),
            }),
        }
        .into(),
    );
    lib.structs.push(GdsStruct::new("CHILD"));
    lib.structs.push(top);

    let recs = records(&lib);
    let strans = recs.iter().find(|r| r.rtype == RecordType::Strans).unwrap();
    assert_eq!(strans.data, vec![0x80, 0x00]);
    let angle = recs.iter().find(|r| r.rtype == RecordType::Angle).unwrap();
    assert_relative_eq!(angle.reals()[0], 90.);
    assert!(recs.iter().all(|r| r.rtype != RecordType::Mag));
    let structs = recs.iter().filter(|r| r.rtype == RecordType::BgnStr).count();
    assert_eq!(structs, 2);
}

#[test]
fn too_many_points_is_an_error() {
    let mut lib = fixed_library();
    let mut cell = GdsStruct::new("BIG");
    cell.elems.push(
        GdsBoundary {
            layer: 1,
            datatype: 0,
            xy: (0..10_000).map(|i| GdsPoint::new(i, i % 7)).collect(),
        }
        .into(),
    );
    lib.structs.push(cell);
    assert!(matches!(lib.to_bytes(), Err(GdsError::TooManyPoints(_))));
}

#[test]
fn truncated_stream_is_reported() {
    let bytes = fixed_library().to_bytes().unwrap();
    let truncated = &bytes[..bytes.len() - 6];
    let result: GdsResult<Vec<_>> = RecordReader::new(truncated).collect();
    assert!(result.is_err());
}

#[test]
fn record_codes() {
    use num_traits::FromPrimitive;

    assert_eq!(RecordType::Sref.code(), 0x0a);
    assert_eq!(RecordType::from_u8(0x21), Some(RecordType::PathType));
    assert_eq!(RecordType::from_u8(0x0b), None);

    // An AREF header, which is not read.
    let bytes = [0x00, 0x04, 0x0b, 0x00];
    let mut reader = RecordReader::new(&bytes[..]);
    assert!(matches!(
        reader.next(),
        Some(Err(GdsError::UnsupportedRecord(0x0b)))
    ));
    assert!(reader.next().is_none());
}
