//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::io::{Cursor, Write};

use image::{ImageFormat, Rgb, RgbImage};
use quire::{TocNode, Writer};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const CONTAINER_XML: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

/// A solid-colour PNG of the given size.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([120, 30, 30]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

/// A minimal XHTML document.
pub fn xhtml(title: &str, body: &str) -> Vec<u8> {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<head><title>{title}</title></head>
<body>{body}</body>
</html>"#
    )
    .into_bytes()
}

/// Zip the given entries in order, `mimetype` first.
pub fn epub(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    zip.start_file("mimetype", stored).unwrap();
    zip.write_all(b"application/epub+zip").unwrap();
    for (name, data) in entries {
        zip.start_file(*name, stored).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

pub fn white_company_toc() -> TocNode {
    TocNode::group("Contents")
        .with_child(TocNode::new("Chapter 1", "chapter1.xhtml"))
        .with_child(TocNode::new("Chapter 2", "chapter2.xhtml"))
}

/// A complete single-rendition writer.
pub fn white_company() -> Writer {
    let mut writer = Writer::new("urn:test:1");
    writer
        .title("The White Company")
        .languages(["en"])
        .author("Arthur Conan Doyle")
        .publisher("Smith, Elder & Co.");
    writer.add_content(
        "chapter1.xhtml",
        xhtml(
            "How the Black Sheep Came Forth",
            "<h1>Chapter 1</h1><p>The great bell of Beaulieu was ringing.</p>",
        ),
    );
    writer.add_content(
        "chapter2.xhtml",
        xhtml("How Alleyne Edricson Came Out", "<h1>Chapter 2</h1><p>It was close upon noon.</p>"),
    );
    writer.cover(&png(3, 4)).unwrap();
    writer.table_of_contents(white_company_toc());
    writer.modified("2024-05-01T12:00:00Z");
    writer
}
