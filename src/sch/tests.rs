use proptest::prelude::*;
use tokio_util::sync::CancellationToken;

use super::pin::tests::binary_pin_bytes;
use super::*;
use crate::binary::BinaryWriter;
use crate::container::{MemoryContainer, StreamSource};
use crate::coord::{Coord, CoordPoint};
use crate::diagnostics::Severity;
use crate::error::{DecodeError, Error};
use crate::hierarchy::Node;
use crate::mapping::{Color, Font, FontTable, Vertices};
use crate::options::{ReadOptions, WriteOptions};

fn component(name: &str) -> Component {
    Component {
        lib_reference: name.to_string(),
        part_count: 2,
        current_part_id: 1,
        ..Component::default()
    }
}

fn rectangle() -> Rectangle {
    Rectangle {
        common: Ownership {
            owner_part_id: 1,
            ..Ownership::default()
        },
        location: CoordPoint::from_dxp(-10, -20),
        corner: CoordPoint::new(Coord::from_raw(1_234_567), Coord::from_dxp(30, 0)),
        line_width: LineWidth::Small,
        color: Color::rgb(0, 0, 128),
        area_color: Color::rgb(255, 255, 176),
        is_solid: true,
        ..Rectangle::default()
    }
}

fn write_lib(lib: &SchLib) -> MemoryContainer {
    let mut container = MemoryContainer::new();
    lib.write(&mut container, &WriteOptions::new()).unwrap();
    container
}

fn text_block(out: &mut BinaryWriter<Vec<u8>>, text: &str) {
    out.write_parameter_block(text.as_bytes()).unwrap();
}

fn flagged_block(out: &mut BinaryWriter<Vec<u8>>, flags: u8, data: &[u8]) {
    out.write_u32(data.len() as u32 | u32::from(flags) << 24).unwrap();
    out.write_bytes(data).unwrap();
}

/// A one-component library whose `U1/Data` stream is replaced by `body`.
fn lib_with_data(body: impl FnOnce(&mut BinaryWriter<Vec<u8>>)) -> MemoryContainer {
    let mut container = write_lib(&SchLib {
        components: vec![LibComponent::new(component("U1"))],
        ..SchLib::default()
    });
    let mut out = BinaryWriter::new(Vec::new());
    text_block(&mut out, "|RECORD=1|LIBREFERENCE=U1|PARTCOUNT=2");
    body(&mut out);
    container.insert("U1/Data", out.into_inner());
    container
}

#[test]
fn test_schlib_roundtrip() {
    let lib = SchLib {
        components: vec![LibComponent::new(component("ROUNDTRIP")).with_child(rectangle())],
        ..SchLib::default()
    };
    let container = write_lib(&lib);
    assert!(container.has_stream("FileHeader"));
    assert!(container.has_stream("ROUNDTRIP/Data"));
    assert!(!container.has_stream("SectionKeys"));

    let read = SchLib::read(&container, &ReadOptions::new()).unwrap();
    assert!(read.diagnostics().is_empty());
    assert_eq!(read.components.len(), 1);
    let only = &read.components[0];
    assert_eq!(only.name(), "ROUNDTRIP");
    assert_eq!(only.children, vec![Node::new(SchRecord::Rectangle(rectangle()))]);
    assert_eq!(read.components, lib.components);
}

#[test]
fn test_schlib_header_fields_roundtrip() {
    let lib = SchLib {
        header: LibraryHeader {
            fonts: FontTable(vec![Font {
                name: "Arial".to_string(),
                size: 12,
                bold: true,
                ..Font::default()
            }]),
            snap_grid_on: true,
            snap_grid_size: 10,
            area_color: Color(16_317_695),
            ..LibraryHeader::default()
        },
        components: vec![LibComponent::new(Component {
            description: "Quad NAND".to_string(),
            ..component("7400")
        })],
        ..SchLib::default()
    };
    let read = SchLib::read(&write_lib(&lib), &ReadOptions::new()).unwrap();
    assert_eq!(read.header, lib.header);
    assert_eq!(read.component("7400").unwrap().component.description, "Quad NAND");
    assert!(read.component("7401").is_none());
}

#[test]
fn test_schlib_nested_owners() {
    let pin = Pin {
        name: "A".to_string(),
        designator: "1".to_string(),
        length: Coord::from_dxp(3, 0),
        ..Pin::default()
    };
    let parameter = Parameter {
        name: "PinUniqueId".to_string(),
        text: "XYZ".to_string(),
        ..Parameter::default()
    };
    let lib = SchLib {
        components: vec![LibComponent {
            component: component("U1"),
            children: vec![
                Node::with_children(
                    SchRecord::Pin(pin.clone()),
                    vec![Node::new(SchRecord::Parameter(parameter))],
                ),
                Node::new(SchRecord::Rectangle(rectangle())),
            ],
        }],
        ..SchLib::default()
    };
    let read = SchLib::read(&write_lib(&lib), &ReadOptions::new()).unwrap();
    assert_eq!(read.components, lib.components);
    assert_eq!(read.components[0].pins().collect::<Vec<_>>(), vec![&pin]);
    assert_eq!(read.components[0].record_count(), 4);
}

#[test]
fn test_section_keys_for_unusual_names() {
    let long = "A_VERY_LONG_COMPONENT_NAME_EXCEEDING_LIMITS";
    let lib = SchLib {
        components: vec![
            LibComponent::new(component("74HC/HCT00")),
            LibComponent::new(component(long)),
            LibComponent::new(component("R1")),
        ],
        ..SchLib::default()
    };
    let container = write_lib(&lib);
    assert!(container.has_stream("SectionKeys"));
    assert!(container.has_stream("74HC_HCT00/Data"));
    assert!(container.has_stream("A_VERY_LONG_COMPONENT_NAME_EXCE/Data"));
    assert!(container.has_stream("R1/Data"));

    let read = SchLib::read(&container, &ReadOptions::new()).unwrap();
    let names: Vec<_> = read.components.iter().map(LibComponent::name).collect();
    assert_eq!(names, vec!["74HC/HCT00", long, "R1"]);
}

#[test]
fn test_schlib_duplicate_names_roundtrip() {
    let lib = SchLib {
        components: vec![
            LibComponent::new(component("X")),
            LibComponent::new(component("X")).with_child(rectangle()),
        ],
        ..SchLib::default()
    };
    let container = write_lib(&lib);
    assert!(container.has_stream("X/Data"));
    assert!(container.has_stream("X_1/Data"));

    let read = SchLib::read(&container, &ReadOptions::new()).unwrap();
    assert_eq!(read.components, lib.components);
    assert_eq!(read.components[0].children.len(), 0);
    assert_eq!(read.components[1].children.len(), 1);
}

#[test]
fn test_text_that_cannot_read_back_is_rejected() {
    let lib = SchLib {
        components: vec![LibComponent::new(component("U1")).with_child(Label {
            text: "A|B".to_string(),
            ..Label::default()
        })],
        ..SchLib::default()
    };
    let err = lib.write(&mut MemoryContainer::new(), &WriteOptions::new()).unwrap_err();
    assert!(matches!(
        err,
        Error::Encode { ref stream, source: crate::binary::BinaryError::UnrepresentableValue { .. }, .. }
            if stream == "U1/Data"
    ));
}

#[test]
fn test_binary_pin_is_read() {
    let container = lib_with_data(|out| flagged_block(out, 0x01, &binary_pin_bytes("CLK", "3")));
    let lib = SchLib::read(&container, &ReadOptions::new()).unwrap();
    let pins: Vec<_> = lib.components[0].pins().collect();
    assert_eq!(pins.len(), 1);
    assert_eq!(pins[0].name, "CLK");
    assert_eq!(pins[0].designator, "3");
    assert_eq!(pins[0].electrical, PinElectrical::Passive);
}

#[test]
fn test_binary_pin_written_as_text() {
    let container = lib_with_data(|out| flagged_block(out, 0x01, &binary_pin_bytes("CLK", "3")));
    let lib = SchLib::read(&container, &ReadOptions::new()).unwrap();
    let rewritten = write_lib(&lib);
    let data = rewritten.stream("U1/Data").unwrap();
    assert!(data.windows(10).any(|w| w == b"|RECORD=2|"));

    let reread = SchLib::read(&rewritten, &ReadOptions::new()).unwrap();
    assert_eq!(reread.components, lib.components);
}

#[test]
fn test_unknown_block_flags_are_skipped() {
    let container = lib_with_data(|out| {
        flagged_block(out, 0x02, &[1, 2, 3, 4, 5]);
        text_block(out, "|RECORD=13|LOCATION.X=1|CORNER.X=2");
    });
    let lib = SchLib::read(&container, &ReadOptions::new()).unwrap();
    let children = &lib.components[0].children;
    assert_eq!(children.len(), 1);
    assert!(matches!(children[0].record, SchRecord::Line(_)));
    assert_eq!(lib.diagnostics().count(Severity::Info), 1);
    assert!(!lib.diagnostics().has_warnings());
}

#[test]
fn test_owner_on_skipped_block_warns() {
    let container = lib_with_data(|out| {
        flagged_block(out, 0x02, &[0; 8]);
        text_block(out, "|RECORD=13|OWNERINDEX=1");
    });
    let lib = SchLib::read(&container, &ReadOptions::new()).unwrap();
    assert_eq!(lib.components[0].children.len(), 1);
    assert_eq!(lib.diagnostics().count(Severity::Warning), 1);
}

#[test]
fn test_binary_record_other_than_pin_is_unsupported() {
    let container = lib_with_data(|out| flagged_block(out, 0x01, &[13, 0, 0, 0, 0, 0]));
    let err = SchLib::read(&container, &ReadOptions::new()).unwrap_err();
    assert!(matches!(err, Error::Unsupported { ref stream, .. } if stream == "U1/Data"));
}

#[test]
fn test_data_must_start_with_component() {
    let container = {
        let mut c = lib_with_data(|_| {});
        let mut out = BinaryWriter::new(Vec::new());
        text_block(&mut out, "|RECORD=13");
        c.insert("U1/Data", out.into_inner());
        c
    };
    let err = SchLib::read(&container, &ReadOptions::new()).unwrap_err();
    assert!(matches!(
        err,
        Error::Corrupt {
            source: DecodeError::UnexpectedRecord { index: 0, .. },
            ..
        }
    ));
}

#[test]
fn test_corrupt_schlib_inputs() {
    let mut empty = MemoryContainer::new();
    empty.insert("FileHeader", Vec::new());
    let err = SchLib::read(&empty, &ReadOptions::new()).unwrap_err();
    assert!(matches!(err, Error::Corrupt { source: DecodeError::EmptyStream, .. }));

    let mut random = MemoryContainer::new();
    random.insert("FileHeader", vec![0xDE, 0xAD, 0xBE, 0xEF, 1, 2, 3, 4, 5, 6, 7]);
    assert!(SchLib::read(&random, &ReadOptions::new()).unwrap_err().is_corrupt());

    let err = SchLib::read(&MemoryContainer::new(), &ReadOptions::new()).unwrap_err();
    assert!(matches!(err, Error::Corrupt { source: DecodeError::MissingStream, .. }));

    let mut missing_data = write_lib(&SchLib {
        components: vec![LibComponent::new(component("U1"))],
        ..SchLib::default()
    });
    missing_data.remove("U1/Data");
    let err = SchLib::read(&missing_data, &ReadOptions::new()).unwrap_err();
    assert!(matches!(err, Error::Corrupt { ref stream, .. } if stream == "U1/Data"));
}

#[test]
fn test_wrong_header_family() {
    let mut container = MemoryContainer::new();
    let mut out = BinaryWriter::new(Vec::new());
    text_block(&mut out, &format!("|HEADER={DOCUMENT_HEADER}|WEIGHT=1"));
    container.insert("FileHeader", out.into_inner());
    let err = SchLib::read(&container, &ReadOptions::new()).unwrap_err();
    assert!(matches!(err, Error::Corrupt { source: DecodeError::BadHeader(_), .. }));
}

#[test]
fn test_error_names_path_and_stream() {
    let options = ReadOptions::new().with_path("parts/Logic.SchLib");
    let err = SchLib::read(&MemoryContainer::new(), &options).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Logic.SchLib"), "{message}");
    assert!(message.contains("FileHeader"), "{message}");
}

#[test]
fn test_cancelled_before_start() {
    let lib = SchLib {
        components: vec![LibComponent::new(component("U1")).with_child(rectangle())],
        ..SchLib::default()
    };
    let container = write_lib(&lib);
    let token = CancellationToken::new();
    token.cancel();

    let err = SchLib::read(&container, &ReadOptions::new().with_cancellation(token.clone())).unwrap_err();
    assert!(err.is_cancelled());

    let mut sink = MemoryContainer::new();
    let err = lib
        .write(&mut sink, &WriteOptions::new().with_cancellation(token))
        .unwrap_err();
    assert!(err.is_cancelled());
    assert!(sink.is_empty());
}

fn document() -> SchDocument {
    let sheet = Sheet {
        fonts: FontTable(vec![Font::default()]),
        border_on: true,
        snap_grid_on: true,
        snap_grid_size: 10,
        ..Sheet::default()
    };
    let wire = Wire {
        color: Color::rgb(0, 0, 128),
        vertices: Vertices(vec![CoordPoint::from_dxp(0, 0), CoordPoint::from_dxp(50, 0)]),
        ..Wire::default()
    };
    let label = NetLabel {
        location: CoordPoint::from_dxp(10, 0),
        text: "CLK".to_string(),
        ..NetLabel::default()
    };
    let designator = Designator {
        name: "Designator".to_string(),
        text: "U1".to_string(),
        ..Designator::default()
    };
    let implementation = Implementation {
        model_name: "DIP14".to_string(),
        model_type: "PCBLIB".to_string(),
        is_current: true,
        ..Implementation::default()
    };
    let component = Node::with_children(
        SchRecord::Component(component("7400")),
        vec![
            Node::new(SchRecord::Pin(Pin {
                name: "A".to_string(),
                designator: "1".to_string(),
                ..Pin::default()
            })),
            Node::new(SchRecord::Designator(designator)),
            Node::with_children(
                SchRecord::ImplementationList(ImplementationList::default()),
                vec![Node::with_children(
                    SchRecord::Implementation(implementation),
                    vec![Node::new(SchRecord::MapDefinerList(MapDefinerList::default()))],
                )],
            ),
        ],
    );
    SchDocument::new(sheet)
        .with_record(SchRecord::Wire(wire))
        .with_record(SchRecord::NetLabel(label))
        .with_record(component)
}

#[test]
fn test_schdoc_roundtrip() {
    let doc = document();
    let mut container = MemoryContainer::new();
    doc.write(&mut container, &WriteOptions::new()).unwrap();
    assert_eq!(container.len(), 1);

    let read = SchDocument::read(&container, &ReadOptions::new()).unwrap();
    assert!(read.diagnostics().is_empty());
    assert_eq!(read.sheet, doc.sheet);
    assert_eq!(read.records, doc.records);
    assert_eq!(read.record_count(), 8);
    let (component, children) = read.components().next().unwrap();
    assert_eq!(component.lib_reference, "7400");
    assert_eq!(children.len(), 3);
}

#[test]
fn test_schdoc_writes_components_last() {
    let doc = SchDocument::new(Sheet::default())
        .with_record(Node::with_children(
            SchRecord::Component(component("U1")),
            vec![Node::new(SchRecord::Line(Line::default()))],
        ))
        .with_record(SchRecord::Junction(Junction::default()));
    let mut container = MemoryContainer::new();
    doc.write(&mut container, &WriteOptions::new()).unwrap();
    let read = SchDocument::read(&container, &ReadOptions::new()).unwrap();
    assert!(matches!(read.records[0].record, SchRecord::Junction(_)));
    assert!(matches!(read.records[1].record, SchRecord::Component(_)));
    assert_eq!(read.records[1].children.len(), 1);
}

fn doc_stream(records: &[&str]) -> MemoryContainer {
    let mut out = BinaryWriter::new(Vec::new());
    text_block(&mut out, &format!("|HEADER={DOCUMENT_HEADER}|WEIGHT={}", records.len()));
    for record in records {
        text_block(&mut out, record);
    }
    let mut container = MemoryContainer::new();
    container.insert("FileHeader", out.into_inner());
    container
}

#[test]
fn test_schdoc_out_of_range_owner() {
    let container = doc_stream(&[
        "|RECORD=31",
        "|RECORD=1|LIBREFERENCE=U1",
        "|RECORD=13|OWNERINDEX=1",
        "|RECORD=13|OWNERINDEX=99",
    ]);
    let doc = SchDocument::read(&container, &ReadOptions::new()).unwrap();
    assert_eq!(doc.records.len(), 2);
    assert_eq!(doc.records[0].children.len(), 1);
    assert!(matches!(doc.records[1].record, SchRecord::Line(_)));
    assert_eq!(doc.diagnostics().count(Severity::Warning), 1);
    let warning = doc.diagnostics().iter().next().unwrap();
    assert_eq!(warning.record_index(), Some(3));
}

#[test]
fn test_schdoc_owner_zero_is_top_level() {
    let container = doc_stream(&["|RECORD=31", "|RECORD=29|OWNERINDEX=0", "|RECORD=29"]);
    let doc = SchDocument::read(&container, &ReadOptions::new()).unwrap();
    assert_eq!(doc.records.len(), 2);
    assert!(doc.diagnostics().is_empty());
}

#[test]
fn test_schdoc_long_owner_chain() {
    const CHAIN: usize = 100_000;
    let mut records = vec!["|RECORD=31".to_string()];
    records.extend((1..=CHAIN).map(|k| format!("|RECORD=1|OWNERINDEX={}|LIBREFERENCE=U{k}", k - 1)));
    let records: Vec<&str> = records.iter().map(String::as_str).collect();
    let container = doc_stream(&records);

    let doc = SchDocument::read(&container, &ReadOptions::new()).unwrap();
    assert_eq!(doc.record_count(), CHAIN);
    assert!(doc.diagnostics().count(Severity::Warning) > 0);
    assert!(doc.records.len() > 1);

    let mut rewritten = MemoryContainer::new();
    doc.write(&mut rewritten, &WriteOptions::new()).unwrap();
    let reread = SchDocument::read(&rewritten, &ReadOptions::new()).unwrap();
    assert_eq!(reread.record_count(), CHAIN);
    assert_eq!(reread.records.len(), doc.records.len());
    drop(doc);
    drop(reread);
}

#[test]
fn test_schdoc_unknown_record_passes_through() {
    let container = doc_stream(&[
        "|RECORD=31",
        "|RECORD=1|LIBREFERENCE=U1",
        "|RECORD=215|OWNERINDEX=1|Foo=bar|Extra=%UTF8%Ωmega",
    ]);
    let doc = SchDocument::read(&container, &ReadOptions::new()).unwrap();
    assert_eq!(doc.diagnostics().count(Severity::Info), 1);
    let SchRecord::Unknown(unknown) = &doc.records[0].children[0].record else {
        panic!("expected an unknown record");
    };
    assert_eq!(unknown.kind, "215");
    assert_eq!(unknown.params.get("foo"), Some("bar"));

    let mut rewritten = MemoryContainer::new();
    doc.write(&mut rewritten, &WriteOptions::new()).unwrap();
    let reread = SchDocument::read(&rewritten, &ReadOptions::new()).unwrap();
    assert_eq!(reread.records, doc.records);
}

#[test]
fn test_schdoc_requires_sheet_first() {
    let container = doc_stream(&["|RECORD=1|LIBREFERENCE=U1", "|RECORD=31"]);
    let err = SchDocument::read(&container, &ReadOptions::new()).unwrap_err();
    assert!(matches!(
        err,
        Error::Corrupt {
            source: DecodeError::UnexpectedRecord { index: 0, .. },
            ..
        }
    ));
}

#[test]
fn test_corrupt_schdoc_inputs() {
    let mut empty = MemoryContainer::new();
    empty.insert("FileHeader", Vec::new());
    assert!(SchDocument::read(&empty, &ReadOptions::new()).unwrap_err().is_corrupt());

    let mut random = MemoryContainer::new();
    random.insert("FileHeader", vec![0x07, 0, 0, 0, b'|', b'A', b'=', 0x11, 0x22]);
    assert!(SchDocument::read(&random, &ReadOptions::new()).unwrap_err().is_corrupt());

    let missing_kind = doc_stream(&["|RECORD=31", "|OWNERINDEX=0|NAME=x"]);
    let err = SchDocument::read(&missing_kind, &ReadOptions::new()).unwrap_err();
    assert!(matches!(
        err,
        Error::Corrupt {
            source: DecodeError::MissingKind { index: 1 },
            ..
        }
    ));
}

#[test]
fn test_schdoc_cancelled() {
    let doc = document();
    let mut container = MemoryContainer::new();
    doc.write(&mut container, &WriteOptions::new()).unwrap();
    let token = CancellationToken::new();
    token.cancel();
    let options = ReadOptions::new().with_cancellation(token.clone());
    assert!(SchDocument::read(&container, &options).unwrap_err().is_cancelled());
    let options = WriteOptions::new().with_cancellation(token);
    assert!(doc.write(&mut MemoryContainer::new(), &options).unwrap_err().is_cancelled());
}

fn record_text() -> impl Strategy<Value = Vec<u8>> {
    (0i32..50, -2i32..10, "(\\|[A-Z][A-Z0-9_.]{0,10}=[-0-9A-Za-z.%]{0,6}){0,5}")
        .prop_map(|(kind, owner, rest)| format!("|RECORD={kind}|OWNERINDEX={owner}{rest}").into_bytes())
}

fn any_block() -> impl Strategy<Value = (u8, Vec<u8>)> {
    prop_oneof![
        3 => record_text().prop_map(|text| (0, text)),
        1 => (0u8..3, prop::collection::vec(any::<u8>(), 0..64)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_schlib_arbitrary_records(
        blocks in prop::collection::vec(any_block(), 0..24),
        tail in prop::collection::vec(any::<u8>(), 0..8),
    ) {
        let container = lib_with_data(|out| {
            for (flags, data) in &blocks {
                flagged_block(out, *flags, data);
            }
            out.write_bytes(&tail).unwrap();
        });
        if let Ok(lib) = SchLib::read(&container, &ReadOptions::new()) {
            prop_assert_eq!(lib.components.len(), 1);
            let _ = lib.write(&mut MemoryContainer::new(), &WriteOptions::new());
        }
    }

    #[test]
    fn prop_schdoc_arbitrary_records(
        blocks in prop::collection::vec(any_block(), 0..24),
        tail in prop::collection::vec(any::<u8>(), 0..8),
    ) {
        let mut out = BinaryWriter::new(Vec::new());
        text_block(&mut out, &format!("|HEADER={DOCUMENT_HEADER}|WEIGHT={}", blocks.len()));
        text_block(&mut out, "|RECORD=31");
        for (flags, data) in &blocks {
            flagged_block(&mut out, *flags, data);
        }
        out.write_bytes(&tail).unwrap();
        let mut container = MemoryContainer::new();
        container.insert("FileHeader", out.into_inner());

        if let Ok(doc) = SchDocument::read(&container, &ReadOptions::new()) {
            prop_assert!(doc.record_count() <= blocks.len());
            let _ = doc.write(&mut MemoryContainer::new(), &WriteOptions::new());
        }
    }
}
