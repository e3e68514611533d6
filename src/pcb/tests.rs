use proptest::prelude::*;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::binary::BinaryWriter;
use crate::container::{MemoryContainer, StreamSource};
use crate::coord::{Coord, CoordPoint};
use crate::diagnostics::Severity;
use crate::error::{DecodeError, Error};
use crate::mapping::MilCoord;
use crate::options::{ReadOptions, WriteOptions};
use crate::params::OwnedParameters;

fn track(x: f64, layer: Layer) -> Track {
    Track {
        common: PrimitiveCommon::on_layer(layer),
        start: CoordPoint::from_mils(x, 0.0),
        end: CoordPoint::from_mils(x, 100.0),
        width: Coord::from_mils(10.0),
    }
}

fn pad(designator: &str, x: f64) -> Pad {
    Pad {
        common: PrimitiveCommon::on_layer(Layer::MULTI_LAYER),
        designator: designator.to_string(),
        location: CoordPoint::from_mils(x, 0.0),
        size_top: CoordPoint::from_mils(60.0, 60.0),
        size_middle: CoordPoint::from_mils(60.0, 60.0),
        size_bottom: CoordPoint::from_mils(60.0, 60.0),
        hole_size: Coord::from_mils(32.0),
        shape_top: PadShape::Round,
        shape_middle: PadShape::Round,
        shape_bottom: PadShape::Round,
        plated: true,
        ..Pad::default()
    }
}

fn write_lib(lib: &PcbLib) -> MemoryContainer {
    let mut container = MemoryContainer::new();
    lib.write(&mut container, &WriteOptions::new()).unwrap();
    container
}

fn write_doc(doc: &PcbDocument) -> MemoryContainer {
    let mut container = MemoryContainer::new();
    doc.write(&mut container, &WriteOptions::new()).unwrap();
    container
}

#[test]
fn test_pcblib_roundtrip() {
    let lib = PcbLib {
        footprints: vec![Footprint::new("ROUNDTRIP").with_primitive(track(0.0, Layer::TOP_OVERLAY))],
        ..PcbLib::default()
    };
    let container = write_lib(&lib);
    for stream in ["FileHeader", "Library/Data", "ROUNDTRIP/Data", "ROUNDTRIP/Parameters", "ROUNDTRIP/Header"] {
        assert!(container.has_stream(stream), "{stream}");
    }
    assert_eq!(container.stream("ROUNDTRIP/Header"), Some(&[1u8, 0, 0, 0][..]));

    let read = PcbLib::read(&container, &ReadOptions::new()).unwrap();
    assert!(read.diagnostics().is_empty());
    assert_eq!(read.footprints.len(), 1);
    let footprint = &read.footprints[0];
    assert_eq!(footprint.name, "ROUNDTRIP");
    assert_eq!(footprint.primitives, vec![PcbPrimitive::Track(track(0.0, Layer::TOP_OVERLAY))]);
    assert_eq!(read.footprints, lib.footprints);
}

#[test]
fn test_pcblib_parameters_and_settings() {
    let mut library = OwnedParameters::new();
    library.push("FILENAME", "C:\\Libs\\Passives.PcbLib");
    library.push("KIND", "Protel_Advanced_PCB_Library");
    let lib = PcbLib {
        library,
        footprints: vec![
            Footprint {
                name: "0603".to_string(),
                parameters: FootprintParameters {
                    height: MilCoord(Coord::from_mils(31.5)),
                    description: "Chip resistor".to_string(),
                    ..FootprintParameters::default()
                },
                primitives: vec![pad("1", -30.0).into(), pad("2", 30.0).into()],
            },
            Footprint::new("TP"),
        ],
        ..PcbLib::default()
    };
    let read = PcbLib::read(&write_lib(&lib), &ReadOptions::new()).unwrap();
    assert_eq!(read.library, lib.library);
    assert_eq!(read.footprints, lib.footprints);
    let chip = read.footprint("0603").unwrap();
    assert_eq!(chip.pads().map(|p| p.designator.as_str()).collect::<Vec<_>>(), ["1", "2"]);
    assert!(read.footprint("TP").unwrap().primitives.is_empty());
}

#[test]
fn test_pcblib_section_keys() {
    let lib = PcbLib {
        footprints: vec![
            Footprint::new("SOIC-8/150mil"),
            Footprint::new("QFN-48-1EP_7x7mm_P0.5mm_EP5.6x5.6mm"),
        ],
        ..PcbLib::default()
    };
    let container = write_lib(&lib);
    assert!(container.has_stream("SectionKeys"));
    assert!(container.has_stream("SOIC-8_150mil/Data"));
    let read = PcbLib::read(&container, &ReadOptions::new()).unwrap();
    assert_eq!(read.footprints, lib.footprints);
}

#[test]
fn test_pcblib_duplicate_names_roundtrip() {
    let lib = PcbLib {
        footprints: vec![
            Footprint::new("X").with_primitive(track(0.0, Layer::TOP)),
            Footprint::new("X")
                .with_primitive(track(10.0, Layer::TOP))
                .with_primitive(track(20.0, Layer::BOTTOM)),
        ],
        ..PcbLib::default()
    };
    let container = write_lib(&lib);
    assert!(container.has_stream("X/Data"));
    assert!(container.has_stream("X_1/Data"));

    let read = PcbLib::read(&container, &ReadOptions::new()).unwrap();
    let counts: Vec<_> = read.footprints.iter().map(|f| f.primitives.len()).collect();
    assert_eq!(counts, vec![1, 2]);
    assert_eq!(read.footprints, lib.footprints);
    assert!(read.diagnostics().is_empty());
}

#[test]
fn test_pcblib_name_with_trailing_space_is_rejected() {
    let lib = PcbLib {
        footprints: vec![Footprint::new("R ")],
        ..PcbLib::default()
    };
    let err = lib.write(&mut MemoryContainer::new(), &WriteOptions::new()).unwrap_err();
    assert!(matches!(
        err,
        Error::Encode { ref stream, source: crate::binary::BinaryError::UnrepresentableValue { .. }, .. }
            if stream == "R /Parameters"
    ));
}

#[test]
fn test_pcblib_header_count_mismatch_warns() {
    let lib = PcbLib {
        footprints: vec![Footprint::new("R").with_primitive(track(0.0, Layer::TOP))],
        ..PcbLib::default()
    };
    let mut container = write_lib(&lib);
    container.insert("R/Header", 5u32.to_le_bytes().to_vec());
    let read = PcbLib::read(&container, &ReadOptions::new()).unwrap();
    assert_eq!(read.footprints, lib.footprints);
    assert_eq!(read.diagnostics().count(Severity::Warning), 1);
}

#[test]
fn test_unknown_object_is_skipped() {
    let lib = PcbLib {
        footprints: vec![Footprint::new("R").with_primitive(track(0.0, Layer::TOP))],
        ..PcbLib::default()
    };
    let mut container = write_lib(&lib);
    let mut data = container.stream("R/Data").unwrap().to_vec();
    let mut w = BinaryWriter::new(&mut data);
    w.write_u8(12).unwrap();
    w.write_block(&[0u8; 40]).unwrap();
    container.insert("R/Data", data);
    container.insert("R/Header", 2u32.to_le_bytes().to_vec());

    let read = PcbLib::read(&container, &ReadOptions::new()).unwrap();
    assert_eq!(read.footprints, lib.footprints);
    assert_eq!(read.diagnostics().count(Severity::Info), 1);
    assert!(!read.diagnostics().has_warnings());
}

#[test]
fn test_corrupt_pcblib_inputs() {
    let mut empty = MemoryContainer::new();
    empty.insert("FileHeader", Vec::new());
    let err = PcbLib::read(&empty, &ReadOptions::new()).unwrap_err();
    assert!(matches!(err, Error::Corrupt { source: DecodeError::EmptyStream, .. }));

    let mut random = MemoryContainer::new();
    random.insert("FileHeader", vec![0x3C, 0x91, 0x07, 0xAA, 0x55]);
    assert!(PcbLib::read(&random, &ReadOptions::new()).unwrap_err().is_corrupt());

    let mut wrong = write_doc(&PcbDocument::new());
    wrong.insert("Library/Data", Vec::new());
    let err = PcbLib::read(&wrong, &ReadOptions::new()).unwrap_err();
    assert!(matches!(err, Error::Corrupt { source: DecodeError::BadHeader(_), .. }));

    let mut truncated = write_lib(&PcbLib {
        footprints: vec![Footprint::new("R").with_primitive(pad("1", 0.0))],
        ..PcbLib::default()
    });
    let data = truncated.stream("R/Data").unwrap().to_vec();
    truncated.insert("R/Data", data[..data.len() - 10].to_vec());
    let err = PcbLib::read(&truncated, &ReadOptions::new()).unwrap_err();
    assert!(matches!(
        err,
        Error::Corrupt { ref stream, source: DecodeError::Binary(_), .. } if stream == "R/Data"
    ));
}

#[test]
fn test_pcblib_cancelled() {
    let lib = PcbLib {
        footprints: vec![Footprint::new("R").with_primitive(track(0.0, Layer::TOP))],
        ..PcbLib::default()
    };
    let container = write_lib(&lib);
    let token = CancellationToken::new();
    token.cancel();
    let options = ReadOptions::new().with_cancellation(token.clone());
    assert!(PcbLib::read(&container, &options).unwrap_err().is_cancelled());
    let mut sink = MemoryContainer::new();
    let options = WriteOptions::new().with_cancellation(token);
    assert!(lib.write(&mut sink, &options).unwrap_err().is_cancelled());
    assert!(sink.is_empty());
}

fn board() -> PcbDocument {
    let mut board = OwnedParameters::new();
    board.push("SHEETWIDTH", "10000mil");
    board.push("LAYER1NAME", "Top Layer");
    let resistor = PcbComponent {
        layer: Layer::TOP,
        x: MilCoord(Coord::from_mils(1000.0)),
        y: MilCoord(Coord::from_mils(500.0)),
        pattern: "0603".to_string(),
        source_designator: "R1".to_string(),
        name_on: true,
        ..PcbComponent::default()
    };
    let header = PcbComponent {
        layer: Layer::BOTTOM,
        rotation: 180.0,
        pattern: "HDR1X2".to_string(),
        source_designator: "J1".to_string(),
        ..PcbComponent::default()
    };
    let label = Text {
        common: PrimitiveCommon::on_layer(Layer::TOP_OVERLAY),
        height: Coord::from_mils(60.0),
        stroke_width: Coord::from_mils(10.0),
        text: "R1".to_string(),
        ..Text::default()
    };
    PcbDocument {
        board,
        components: vec![
            PlacedComponent::new(resistor)
                .with_primitive(pad("1", 970.0))
                .with_primitive(pad("2", 1030.0))
                .with_primitive(label),
            PlacedComponent::new(header)
                .with_primitive(pad("1", 0.0))
                .with_primitive(track(0.0, Layer::BOTTOM_OVERLAY)),
        ],
        primitives: vec![
            Via {
                common: PrimitiveCommon::on_layer(Layer::MULTI_LAYER),
                center: CoordPoint::from_mils(200.0, 200.0),
                diameter: Coord::from_mils(24.0),
                hole_size: Coord::from_mils(12.0),
                start_layer: Layer::TOP,
                end_layer: Layer::BOTTOM,
            }
            .into(),
            track(500.0, Layer::TOP).into(),
            track(600.0, Layer::BOTTOM).into(),
        ],
        ..PcbDocument::default()
    }
}

#[test]
fn test_pcbdoc_roundtrip() {
    let doc = board();
    let container = write_doc(&doc);
    assert_eq!(container.stream("Tracks6/Header"), Some(&[3u8, 0, 0, 0][..]));
    assert_eq!(container.stream("Components6/Header"), Some(&[2u8, 0, 0, 0][..]));
    assert_eq!(container.stream("Arcs6/Data"), Some(&[][..]));

    let read = PcbDocument::read(&container, &ReadOptions::new()).unwrap();
    assert!(read.diagnostics().is_empty());
    assert_eq!(read.board, doc.board);
    assert_eq!(read.components, doc.components);
    assert_eq!(read.primitives, doc.primitives);
    assert_eq!(read.all_primitives().count(), 8);
}

#[test]
fn test_pcbdoc_bad_component_index_warns() {
    let doc = PcbDocument {
        components: vec![PlacedComponent::new(PcbComponent::default()).with_primitive(track(0.0, Layer::TOP))],
        ..PcbDocument::default()
    };
    let mut container = write_doc(&doc);
    // Point the track at component 9, which does not exist.
    let mut data = container.stream("Tracks6/Data").unwrap().to_vec();
    data[1 + 4 + 7] = 9;
    container.insert("Tracks6/Data", data);

    let read = PcbDocument::read(&container, &ReadOptions::new()).unwrap();
    assert!(read.components[0].primitives.is_empty());
    assert_eq!(read.primitives.len(), 1);
    assert_eq!(read.diagnostics().count(Severity::Warning), 1);
}

#[test]
fn test_corrupt_pcbdoc_inputs() {
    let mut empty = MemoryContainer::new();
    empty.insert("FileHeader", Vec::new());
    assert!(PcbDocument::read(&empty, &ReadOptions::new()).unwrap_err().is_corrupt());

    let mut random = MemoryContainer::new();
    random.insert("FileHeader", vec![0xFF, 0xFF, 0xFF, 0x7F, 0x00]);
    assert!(PcbDocument::read(&random, &ReadOptions::new()).unwrap_err().is_corrupt());

    let lib = write_lib(&PcbLib::new());
    let err = PcbDocument::read(&lib, &ReadOptions::new()).unwrap_err();
    assert!(matches!(err, Error::Corrupt { source: DecodeError::BadHeader(_), .. }));

    let mut bad_component = write_doc(&PcbDocument::new());
    let mut out = BinaryWriter::new(Vec::new());
    out.write_parameter_block(b"|X=wide|").unwrap();
    bad_component.insert("Components6/Data", out.into_inner());
    let err = PcbDocument::read(&bad_component, &ReadOptions::new()).unwrap_err();
    assert!(matches!(err, Error::Corrupt { source: DecodeError::Field(_), .. }));
}

#[test]
fn test_pcbdoc_cancelled() {
    let doc = board();
    let container = write_doc(&doc);
    let token = CancellationToken::new();
    token.cancel();
    let options = ReadOptions::new().with_cancellation(token.clone());
    assert!(PcbDocument::read(&container, &options).unwrap_err().is_cancelled());
    let options = WriteOptions::new().with_cancellation(token);
    assert!(doc.write(&mut MemoryContainer::new(), &options).unwrap_err().is_cancelled());
}

fn any_object() -> impl Strategy<Value = (u8, Vec<Vec<u8>>)> {
    (
        0u8..14,
        prop::collection::vec(prop::collection::vec(any::<u8>(), 0..96), 0..7),
    )
}

fn object_bytes(out: &mut BinaryWriter<Vec<u8>>, objects: &[(u8, Vec<Vec<u8>>)], tail: &[u8]) {
    for (id, blocks) in objects {
        out.write_u8(*id).unwrap();
        for block in blocks {
            out.write_block(block).unwrap();
        }
    }
    out.write_bytes(tail).unwrap();
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_pcblib_arbitrary_objects(
        objects in prop::collection::vec(any_object(), 0..12),
        tail in prop::collection::vec(any::<u8>(), 0..8),
    ) {
        let mut container = write_lib(&PcbLib {
            footprints: vec![Footprint::new("R")],
            ..PcbLib::default()
        });
        let mut out = BinaryWriter::new(Vec::new());
        out.write_string_block("R", crate::encoding::DEFAULT_ENCODING).unwrap();
        object_bytes(&mut out, &objects, &tail);
        container.insert("R/Data", out.into_inner());

        if let Ok(lib) = PcbLib::read(&container, &ReadOptions::new()) {
            prop_assert_eq!(lib.footprints.len(), 1);
            prop_assert!(lib.footprints[0].primitives.len() <= objects.len());
            let _ = lib.write(&mut MemoryContainer::new(), &WriteOptions::new());
        }
    }

    #[test]
    fn prop_pcbdoc_arbitrary_objects(
        components in prop::collection::vec("(\\|[A-Z]{1,8}=[-0-9A-Za-z.]{0,8}){0,6}", 0..4),
        objects in prop::collection::vec(any_object(), 0..12),
        tail in prop::collection::vec(any::<u8>(), 0..8),
    ) {
        let mut container = write_doc(&PcbDocument::new());
        let mut out = BinaryWriter::new(Vec::new());
        for text in &components {
            out.write_parameter_block(text.as_bytes()).unwrap();
        }
        container.insert("Components6/Data", out.into_inner());
        let mut out = BinaryWriter::new(Vec::new());
        object_bytes(&mut out, &objects, &tail);
        container.insert("Pads6/Data", out.into_inner());

        if let Ok(doc) = PcbDocument::read(&container, &ReadOptions::new()) {
            prop_assert_eq!(doc.components.len(), components.len());
            prop_assert!(doc.all_primitives().count() <= objects.len());
            let _ = doc.write(&mut MemoryContainer::new(), &WriteOptions::new());
        }
    }
}
