//! Benchmarks for opening, resolving and writing publications.
//!
//! Run with: cargo bench

use std::hint::black_box;
use std::io::Cursor;

use criterion::{Criterion, criterion_group, criterion_main};
use image::{ImageFormat, Rgb, RgbImage};

use quire::{Publication, TocNode, Writer};

const CHAPTERS: usize = 24;

fn cover_png() -> Vec<u8> {
    let img = RgbImage::from_pixel(600, 900, Rgb([120, 30, 30]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

fn chapter(n: usize) -> Vec<u8> {
    let paragraphs: String = (0..40)
        .map(|i| format!("<p>Paragraph {i} of chapter {n}. The great bell of Beaulieu was ringing.</p>"))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml"><head><title>Chapter {n}</title></head>
<body><h1>Chapter {n}</h1>{paragraphs}</body></html>"#
    )
    .into_bytes()
}

fn sample_writer() -> Writer {
    let mut writer = Writer::new("urn:bench:1");
    writer
        .title("The White Company")
        .languages(["en"])
        .author("Arthur Conan Doyle")
        .description("<p>A tale of the Hundred Years War.</p>");
    let mut toc = TocNode::group("Contents");
    for n in 1..=CHAPTERS {
        let href = format!("chapter{n}.xhtml");
        writer.add_content(&href, chapter(n));
        toc.push(TocNode::new(format!("Chapter {n}"), href));
    }
    writer.cover(&cover_png()).unwrap();
    writer.table_of_contents(toc);
    writer
}

fn bench_open(c: &mut Criterion) {
    let bytes = sample_writer().to_bytes().unwrap();

    c.bench_function("open", |b| {
        b.iter(|| Publication::from_bytes(black_box(&bytes)).unwrap());
    });
}

fn bench_extract(c: &mut Criterion) {
    let bytes = sample_writer().to_bytes().unwrap();
    let publication = Publication::from_bytes(&bytes).unwrap();

    c.bench_function("title_author_toc", |b| {
        b.iter(|| {
            let view = publication.view();
            black_box(view.title());
            black_box(view.author());
            black_box(view.table_of_contents().unwrap().len());
        });
    });

    c.bench_function("cover", |b| {
        b.iter(|| black_box(publication.view().cover()));
    });
}

fn bench_write(c: &mut Criterion) {
    let writer = sample_writer();

    c.bench_function("write", |b| {
        b.iter(|| writer.to_bytes().unwrap());
    });
}

criterion_group!(benches, bench_open, bench_extract, bench_write);
criterion_main!(benches);
