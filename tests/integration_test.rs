//! Integration tests for fitspix
//!
//! These tests build synthetic FITS containers on disk and verify the full
//! pipeline from mapping to export.

use std::io::Write;
use std::path::PathBuf;

use fitspix::document::{Document, DocumentError, RenderOptions};
use fitspix::export::{ColorMode, Frame, ImageEncoder};
use fitspix::pixels::{Channel, Transform};
use fitspix::scanner::BLOCK_LEN;
use fitspix::unit::UnitKind;
use tempfile::tempdir;

const RECORD_LEN: usize = 80;

fn card(text: &str) -> [u8; RECORD_LEN] {
    let mut out = [b' '; RECORD_LEN];
    out[..text.len()].copy_from_slice(text.as_bytes());
    out
}

fn push_header(out: &mut Vec<u8>, cards: &[&str]) {
    for c in cards {
        out.extend_from_slice(&card(c));
    }
    while out.len() as u64 % BLOCK_LEN != 0 {
        out.extend_from_slice(&card(""));
    }
}

fn push_payload(out: &mut Vec<u8>, payload: &[u8]) {
    out.extend_from_slice(payload);
    let pad = (BLOCK_LEN - out.len() as u64 % BLOCK_LEN) % BLOCK_LEN;
    out.extend(std::iter::repeat(0u8).take(pad as usize));
}

fn write_fits(bytes: &[u8]) -> (tempfile::TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.fits");
    std::fs::File::create(&path)
        .unwrap()
        .write_all(bytes)
        .unwrap();
    (dir, path)
}

/// A primary unit (zero axes), a 10x10 8-bit image extension and a 5x5
/// 16-bit image extension - the reference three-unit container.
fn three_unit_container() -> Vec<u8> {
    let mut bytes = Vec::new();

    push_header(
        &mut bytes,
        &[
            "SIMPLE  =                    T / conforms to the standard",
            "BITPIX  =                    8",
            "NAXIS   =                    0",
            "END",
        ],
    );

    push_header(
        &mut bytes,
        &[
            "XTENSION= 'IMAGE   '           / image extension",
            "BITPIX  =                    8",
            "NAXIS   =                    2",
            "NAXIS1  =                   10",
            "NAXIS2  =                   10",
            "END",
        ],
    );
    let ramp8: Vec<u8> = (0..100).map(|i| (i * 2) as u8).collect();
    push_payload(&mut bytes, &ramp8);

    push_header(
        &mut bytes,
        &[
            "XTENSION= 'IMAGE   '           / image extension",
            "BITPIX  =                   16",
            "NAXIS   =                    2",
            "NAXIS1  =                    5",
            "NAXIS2  =                    5",
            "END",
        ],
    );
    let ramp16: Vec<u8> = (0..25i16).flat_map(|i| (i * 100).to_be_bytes()).collect();
    push_payload(&mut bytes, &ramp16);

    bytes
}

#[derive(Default)]
struct CollectingEncoder {
    frames: Vec<(u32, u32, ColorMode, Vec<u8>)>,
}

impl ImageEncoder for CollectingEncoder {
    fn encode(&mut self, frame: &Frame<'_>) -> std::io::Result<()> {
        assert_eq!(frame.bit_depth, 8);
        assert_eq!(
            frame.pixels.len(),
            (frame.width * frame.height * 3) as usize
        );
        self.frames
            .push((frame.width, frame.height, frame.color, frame.pixels.to_vec()));
        Ok(())
    }
}

/// A shared collector usable as the per-unit encoder of export_all_units.
struct SharedEncoder<'a>(&'a std::cell::RefCell<CollectingEncoder>);

impl ImageEncoder for SharedEncoder<'_> {
    fn encode(&mut self, frame: &Frame<'_>) -> std::io::Result<()> {
        self.0.borrow_mut().encode(frame)
    }
}

#[test]
fn three_unit_container_scans_and_exports() {
    let (_dir, path) = write_fits(&three_unit_container());
    let doc = Document::open(&path).unwrap();

    assert_eq!(doc.unit_count(), 3);
    assert_eq!(doc.unit(0).unwrap().kind, UnitKind::Primary);
    assert_eq!(doc.unit(1).unwrap().kind, UnitKind::ImageExtension);
    assert_eq!(doc.unit(2).unwrap().kind, UnitKind::ImageExtension);
    assert_eq!(doc.unit(1).unwrap().axes, &[10, 10]);
    assert_eq!(doc.unit(2).unwrap().sample_width, 16);

    let collector = std::cell::RefCell::new(CollectingEncoder::default());
    let summary = doc
        .export_all_units(
            &RenderOptions::default(),
            |_index| Ok(SharedEncoder(&collector)),
            None,
        )
        .unwrap();

    // The zero-axis primary is a skip, both image extensions export.
    assert_eq!(summary.exported, 2);
    assert_eq!(summary.skipped, 1);

    let collector = collector.into_inner();
    assert_eq!(collector.frames.len(), 2);
    assert_eq!(collector.frames[0].0, 10);
    assert_eq!(collector.frames[1].0, 5);
}

#[test]
fn export_progress_is_reported_in_order() {
    let (_dir, path) = write_fits(&three_unit_container());
    let doc = Document::open(&path).unwrap();

    let mut seen = Vec::new();
    let mut report = |p: u8| seen.push(p);
    let collector = std::cell::RefCell::new(CollectingEncoder::default());
    doc.export_all_units(
        &RenderOptions::default(),
        |_| Ok(SharedEncoder(&collector)),
        Some(&mut report),
    )
    .unwrap();

    assert_eq!(seen, vec![33, 66, 100]);
}

#[test]
fn grayscale_export_flattens_channels() {
    let (_dir, path) = write_fits(&three_unit_container());
    let doc = Document::open(&path).unwrap();

    let options = RenderOptions {
        transform: Transform::None,
        grayscale: true,
        stretch_threshold: None,
    };
    let mut encoder = CollectingEncoder::default();
    doc.export_unit(1, &options, &mut encoder, None).unwrap();

    let (_, _, color, pixels) = &encoder.frames[0];
    assert_eq!(*color, ColorMode::Grayscale);
    for px in pixels.chunks_exact(3) {
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
    }
}

#[test]
fn export_unit_rejects_the_zero_axis_primary() {
    let (_dir, path) = write_fits(&three_unit_container());
    let doc = Document::open(&path).unwrap();

    let mut encoder = CollectingEncoder::default();
    let err = doc
        .export_unit(0, &RenderOptions::default(), &mut encoder, None)
        .unwrap_err();
    assert!(matches!(err, DocumentError::NotAnImage { index: 0, .. }));
    assert!(encoder.frames.is_empty());
}

#[test]
fn decoded_image_supports_live_edit_workflow() {
    let (_dir, path) = write_fits(&three_unit_container());
    let doc = Document::open(&path).unwrap();

    let mut image = doc.decode_unit(2).unwrap();
    image.render(Transform::LinearPositive, Some(0.0), None).unwrap();

    // Threshold 0 must reproduce the raw range.
    let raw = image.min_max().unwrap();
    assert_eq!(image.stretch_range(0.0).unwrap(), raw);
    assert_eq!(raw, (0.0, 2400.0));

    // Edit, then revert.
    image.backup();
    let before = image.pixels_flat32().to_vec();
    image.adjust_channel(Channel::Red, 0.5);
    image.grayscale();
    assert_ne!(image.pixels_flat32(), &before[..]);
    assert!(image.restore());
    assert_eq!(image.pixels_flat32(), &before[..]);

    // Independent decode of another unit shares no state.
    let mut other = doc.decode_unit(1).unwrap();
    other.render(Transform::None, None, None).unwrap();
    assert_eq!(other.min_max().unwrap(), (0.0, 198.0));
    assert_eq!(image.min_max().unwrap(), (0.0, 2400.0));
}

#[test]
fn affine_keywords_rescale_values() {
    let mut bytes = Vec::new();
    push_header(
        &mut bytes,
        &[
            "SIMPLE  =                    T",
            "BITPIX  =                   16",
            "NAXIS   =                    2",
            "NAXIS1  =                    2",
            "NAXIS2  =                    2",
            "BZERO   =                 1000.",
            "BSCALE  =                   2.",
            "END",
        ],
    );
    let payload: Vec<u8> = [0i16, 10, 20, 30].iter().flat_map(|v| v.to_be_bytes()).collect();
    push_payload(&mut bytes, &payload);
    let (_dir, path) = write_fits(&bytes);

    let doc = Document::open(&path).unwrap();
    let mut image = doc.decode_unit(0).unwrap();
    assert_eq!(image.affine(), (1000.0, 2.0));
    assert_eq!(image.min_max().unwrap(), (1000.0, 1060.0));
}

#[test]
fn header_values_survive_the_round_trip() {
    let mut bytes = Vec::new();
    push_header(
        &mut bytes,
        &[
            "SIMPLE  =                    T / conforms to the standard",
            "BITPIX  =                    8",
            "NAXIS   =                    0",
            "OBJECT  = 'M 31    '           / target name",
            "OBSERVER= 'O''BRIEN '",
            "LONGSTR = 'first half &'",
            "CONTINUE  'second half'",
            "COMMENT  synthetic test container",
            "END",
        ],
    );
    let (_dir, path) = write_fits(&bytes);

    let doc = Document::open(&path).unwrap();
    let view = doc.unit(0).unwrap();

    assert_eq!(view.header.decode::<String>("OBJECT"), Some("M 31".into()));
    assert_eq!(
        view.header.decode::<String>("OBSERVER"),
        Some("O'BRIEN".into())
    );

    let (_, long) = view.header.find("LONGSTR").unwrap();
    assert!(long.continued);
    assert_eq!(long.value, "first half");
    let (_, cont) = view.header.find("CONTINUE").unwrap();
    assert_eq!(cont.value, "second half");

    let (_, comment) = view.header.find("COMMENT").unwrap();
    assert_eq!(comment.value, "synthetic test container");
}

#[test]
fn table_extensions_are_classified_but_not_decoded() {
    let mut bytes = three_unit_container();
    push_header(
        &mut bytes,
        &[
            "XTENSION= 'BINTABLE'           / binary table",
            "BITPIX  =                    8",
            "NAXIS   =                    2",
            "NAXIS1  =                    4",
            "NAXIS2  =                    3",
            "END",
        ],
    );
    push_payload(&mut bytes, &[1u8; 12]);
    let (_dir, path) = write_fits(&bytes);

    let doc = Document::open(&path).unwrap();
    assert_eq!(doc.unit_count(), 4);
    assert_eq!(doc.unit(3).unwrap().kind, UnitKind::BinaryTableExtension);

    // Not an image kind: a skip during export-all, an error when forced.
    assert!(matches!(
        doc.decode_unit(3),
        Err(DocumentError::NotAnImage { index: 3, .. })
    ));

    let collector = std::cell::RefCell::new(CollectingEncoder::default());
    let summary = doc
        .export_all_units(
            &RenderOptions::default(),
            |_| Ok(SharedEncoder(&collector)),
            None,
        )
        .unwrap();
    assert_eq!(summary.exported, 2);
    assert_eq!(summary.skipped, 2);
}

#[test]
fn multi_plane_cube_renders_its_first_plane() {
    let mut bytes = Vec::new();
    push_header(
        &mut bytes,
        &[
            "SIMPLE  =                    T",
            "BITPIX  =                    8",
            "NAXIS   =                    3",
            "NAXIS1  =                    4",
            "NAXIS2  =                    4",
            "NAXIS3  =                    2",
            "END",
        ],
    );
    push_payload(&mut bytes, &(0..32).map(|i| i as u8).collect::<Vec<_>>());
    let (_dir, path) = write_fits(&bytes);

    let doc = Document::open(&path).unwrap();
    assert_eq!(doc.unit(0).unwrap().payload_len, 32);

    let mut image = doc.decode_unit(0).unwrap();
    assert_eq!(image.width(), 4);
    assert_eq!(image.height(), 4);
    image.render(Transform::None, None, None).unwrap();
    assert!(image.is_rendered());
}
