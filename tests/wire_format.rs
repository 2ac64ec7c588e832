//! # Wire Format Tests
//!
//! Full print jobs run through a session backed by in-memory ports, checking
//! the exact bytes and write boundaries the printer would receive.

use std::time::Duration;

use image::{DynamicImage, GrayImage, Luma};
use pretty_assertions::assert_eq;

use labelbridge::page::ImageFileRasterizer;
use labelbridge::render::pipeline::RasterOptions;
use labelbridge::session::TextStyle;
use labelbridge::transport::{MemoryPorts, PortSettings};
use labelbridge::{LabelSession, LabelSpec, PrintContent, PrintRequest, SerialConnection};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn session(ports: &MemoryPorts) -> LabelSession<MemoryPorts> {
    let settings = PortSettings::new("mem0", 9600).with_settle(Duration::ZERO);
    LabelSession::new(SerialConnection::new(ports.clone(), settings))
}

fn as_text(bytes: &[u8]) -> String {
    String::from_utf8(bytes.to_vec()).expect("command text is ASCII")
}

fn plain_options() -> RasterOptions {
    RasterOptions {
        auto_crop: false,
        auto_rotate: false,
        flip_vertical: false,
        invert: false,
        manual_crop: None,
    }
}

// ============================================================================
// TEXT LABELS
// ============================================================================

#[test]
fn text_label_stream() {
    let ports = MemoryPorts::new();
    let outcome = session(&ports).run(PrintRequest::new(
        PrintContent::Text("Line one\n   \nSay \"hi\"\nLine three".into()),
        LabelSpec::TEXT_DEFAULT,
    ));
    assert!(outcome.success, "{}", outcome.message);

    let writes = ports.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(
        as_text(&writes[0]),
        concat!(
            "SIZE 40 mm, 30 mm\n",
            "GAP 2 mm, 0 mm\n",
            "DIRECTION 1\n",
            "CLS\n",
            "TEXT 10,10,\"2\",0,1,1,\"Line one\"\n",
            "TEXT 10,50,\"2\",0,1,1,\"Say \\\"hi\\\"\"\n",
            "TEXT 10,90,\"2\",0,1,1,\"Line three\"\n",
            "PRINT 1\n",
            "\n",
        )
    );
    assert!(!writes[0].contains(&b'\r'));
}

#[test]
fn text_label_custom_style() {
    let ports = MemoryPorts::new();
    let style = TextStyle {
        font: "3".to_string(),
        position: labelbridge::protocol::text::Position { x: 20, y: 30 },
    };
    let mut session = session(&ports);
    session.connect().unwrap();
    session
        .print_text_label("A\nB", &LabelSpec::SMALL_2X1, &style, 2)
        .unwrap();

    assert_eq!(
        as_text(&ports.bytes()),
        concat!(
            "SIZE 50 mm, 25 mm\n",
            "GAP 2 mm, 0 mm\n",
            "DIRECTION 1\n",
            "CLS\n",
            "TEXT 20,30,\"3\",0,1,1,\"A\"\n",
            "TEXT 20,70,\"3\",0,1,1,\"B\"\n",
            "PRINT 2\n",
            "\n",
        )
    );
}

// ============================================================================
// BITMAP LABELS
// ============================================================================

#[test]
fn bitmap_label_stream() {
    // 2 x 1 mm at 203 dpi is 16 x 8 dots
    let label = LabelSpec::new(2.0, 1.0, 2.0, 203).unwrap();
    assert_eq!(label.target_dots(), (16, 8));

    // Left half black, right half white
    let page = GrayImage::from_fn(16, 8, |x, _| Luma([if x < 8 { 0 } else { 255 }]));

    let ports = MemoryPorts::new();
    let outcome = session(&ports).run(
        PrintRequest::new(PrintContent::Raster(DynamicImage::ImageLuma8(page)), label)
            .with_options(plain_options()),
    );
    assert!(outcome.success, "{}", outcome.message);

    let writes = ports.writes();
    assert_eq!(writes.len(), 3);
    assert_eq!(
        as_text(&writes[0]),
        "SIZE 2 mm, 1 mm\nGAP 2 mm, 0 mm\nDIRECTION 1\nCLS\nBITMAP 0,0,2,8,0,"
    );
    assert_eq!(writes[1], [0xFFu8, 0x00].repeat(8));
    assert_eq!(writes[2], b"PRINT 1\n\n".to_vec());
}

#[test]
fn bitmap_label_inverted() {
    let label = LabelSpec::new(2.0, 1.0, 2.0, 203).unwrap();
    let page = GrayImage::from_fn(16, 8, |x, _| Luma([if x < 8 { 0 } else { 255 }]));

    let ports = MemoryPorts::new();
    let options = RasterOptions {
        invert: true,
        ..plain_options()
    };
    let outcome = session(&ports).run(
        PrintRequest::new(PrintContent::Raster(DynamicImage::ImageLuma8(page)), label)
            .with_options(options),
    );
    assert!(outcome.success, "{}", outcome.message);
    assert_eq!(ports.writes()[1], [0x00u8, 0xFF].repeat(8));
}

#[test]
fn document_on_shipping_label() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("letter.png");
    // A blank US Letter page rendered at 72 dpi
    GrayImage::from_pixel(612, 792, Luma([255]))
        .save(&path)
        .unwrap();

    let ports = MemoryPorts::new();
    let mut session = session(&ports).with_rasterizer(Box::new(ImageFileRasterizer::new(300)));
    let options = RasterOptions {
        auto_crop: false,
        ..RasterOptions::default()
    };
    let outcome = session.run(
        PrintRequest::new(PrintContent::Document(path), LabelSpec::SHIPPING_4X6)
            .with_options(options),
    );
    assert!(outcome.success, "{}", outcome.message);

    let writes = ports.writes();
    assert_eq!(writes.len(), 3);
    assert_eq!(
        as_text(&writes[0]),
        "SIZE 101 mm, 152 mm\nGAP 2 mm, 0 mm\nDIRECTION 1\nCLS\nBITMAP 0,0,101,1215,0,"
    );

    // Inverted white page: every dot is ink, padding bit stays clear
    let payload = &writes[1];
    assert_eq!(payload.len(), 101 * 1215);
    for row in payload.chunks(101) {
        assert!(row[..100].iter().all(|&b| b == 0xFF));
        assert_eq!(row[100], 0xFE);
    }
    assert_eq!(writes[2], b"PRINT 1\n\n".to_vec());
}

// ============================================================================
// RAW AND FAILURE PATHS
// ============================================================================

#[test]
fn raw_bytes_pass_through() {
    let ports = MemoryPorts::new();
    let data = vec![0x1B, 0x40, 0x00, 0x11, 0x13, 0xFF];
    let outcome = session(&ports).run(PrintRequest::new(
        PrintContent::Raw(data.clone()),
        LabelSpec::default(),
    ));
    assert!(outcome.success);
    assert_eq!(ports.writes(), vec![data]);
}

#[test]
fn failed_job_leaves_port_closed() {
    let ports = MemoryPorts::failing_writes();
    let mut session = session(&ports);
    let outcome = session.run(PrintRequest::new(
        PrintContent::Text("x".into()),
        LabelSpec::TEXT_DEFAULT,
    ));
    assert!(!outcome.success);
    assert!(outcome.message.starts_with("Print failed"));
    assert!(!session.is_connected());
    assert!(!ports.is_open());
}

#[test]
fn payload_failure_stops_before_print() {
    let label = LabelSpec::new(2.0, 1.0, 2.0, 203).unwrap();
    let page = GrayImage::from_pixel(16, 8, Luma([0]));

    // Header goes out, the bitmap payload write fails
    let ports = MemoryPorts::failing_write(2);
    let mut session = session(&ports);
    let outcome = session.run(
        PrintRequest::new(PrintContent::Raster(DynamicImage::ImageLuma8(page)), label)
            .with_options(plain_options()),
    );
    assert!(!outcome.success);
    assert!(outcome.message.starts_with("Print failed"));

    let writes = ports.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(
        as_text(&writes[0]),
        "SIZE 2 mm, 1 mm\nGAP 2 mm, 0 mm\nDIRECTION 1\nCLS\nBITMAP 0,0,2,8,0,"
    );
    assert!(!ports.bytes().windows(5).any(|w| w == b"PRINT"));
    assert!(!session.is_connected());
    assert!(!ports.is_open());
}
