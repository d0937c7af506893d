//! Each fallback strategy winning on a book that lacks every earlier source.

mod common;

use image::GenericImageView;
use quire::Publication;
use quire::extract::{AUTHOR_STRATEGIES, COVER_STRATEGIES, DESCRIPTION_STRATEGIES, TITLE_STRATEGIES, run_chain};

use common::{CONTAINER_XML, epub, png, xhtml};

/// A package at `OEBPS/content.opf` with an identifier and a language and
/// nothing else that the chains look at.
fn package(metadata: &str, manifest: &str, spine: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="uid">urn:fallback:1</dc:identifier>
    <dc:language>en</dc:language>
    {metadata}
  </metadata>
  <manifest>
    {manifest}
  </manifest>
  <spine>{spine}</spine>
</package>"#
    )
}

fn book(opf: &str, files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut entries: Vec<(&str, &[u8])> = vec![
        ("META-INF/container.xml", CONTAINER_XML.as_bytes()),
        ("OEBPS/content.opf", opf.as_bytes()),
    ];
    entries.extend_from_slice(files);
    epub(&entries)
}

#[test]
fn test_title_and_author_from_title_resources() {
    let opf = package(
        "",
        r#"<item id="titlepage" href="title.xhtml" media-type="application/xhtml+xml"/>
           <item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>"#,
        r#"<itemref idref="titlepage"/><itemref idref="c1"/>"#,
    );
    let title = xhtml(
        "Title",
        r#"<h1 epub:type="fulltitle">Micah Clarke</h1>
           <p epub:type="z3998:author">Arthur Conan Doyle</p>"#,
    );
    let chapter = xhtml("Chapter 1", "<p>Havant.</p>");
    let bytes = book(&opf, &[("OEBPS/title.xhtml", &title), ("OEBPS/c1.xhtml", &chapter)]);

    let publication = Publication::from_bytes(&bytes).unwrap();
    let view = publication.view();

    let (source, title) = run_chain(&view, "title", TITLE_STRATEGIES).unwrap();
    assert_eq!(source, "title-resources");
    assert_eq!(title, "Micah Clarke");

    let (source, author) = run_chain(&view, "author", AUTHOR_STRATEGIES).unwrap();
    assert_eq!(source, "title-resources");
    assert_eq!(author, "Arthur Conan Doyle");
}

#[test]
fn test_description_from_meta_bag() {
    let opf = package(
        r#"<meta name="book-description" content="&lt;p&gt;A &lt;i&gt;grim&lt;/i&gt; tale.&lt;/p&gt;"/>"#,
        r#"<item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>"#,
        r#"<itemref idref="c1"/>"#,
    );
    let chapter = xhtml("Chapter 1", "<p>Havant.</p>");
    let bytes = book(&opf, &[("OEBPS/c1.xhtml", &chapter)]);

    let publication = Publication::from_bytes(&bytes).unwrap();
    let view = publication.view();

    let (source, description) = run_chain(&view, "description", DESCRIPTION_STRATEGIES).unwrap();
    assert_eq!(source, "meta-bag");
    assert_eq!(description, "A *grim* tale.");
}

#[test]
fn test_description_and_cover_from_toc() {
    let opf = package(
        "",
        r#"<item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
           <item id="page0" href="front.xhtml" media-type="application/xhtml+xml"/>
           <item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>
           <item id="pic" href="images/pic.png" media-type="image/png"/>"#,
        r#"<itemref idref="page0"/><itemref idref="c1"/>"#,
    );
    let nav = xhtml(
        "Contents",
        r#"<nav epub:type="toc"><ol>
             <li><a href="front.xhtml#cover">Front</a></li>
             <li><a href="c1.xhtml">Chapter 1</a></li>
           </ol></nav>"#,
    );
    let front = xhtml("Front", r#"<img src="images/pic.png" alt=""/>"#);
    let chapter = xhtml("Chapter 1", "<p>Opening lines.</p>");
    let pic = png(2, 5);
    let bytes = book(
        &opf,
        &[
            ("OEBPS/nav.xhtml", &nav),
            ("OEBPS/front.xhtml", &front),
            ("OEBPS/c1.xhtml", &chapter),
            ("OEBPS/images/pic.png", &pic),
        ],
    );

    let publication = Publication::from_bytes(&bytes).unwrap();
    let view = publication.view();

    let (source, description) = run_chain(&view, "description", DESCRIPTION_STRATEGIES).unwrap();
    assert_eq!(source, "toc");
    assert_eq!(description, "Opening lines.");

    let (source, cover) = run_chain(&view, "cover", COVER_STRATEGIES).unwrap();
    assert_eq!(source, "toc");
    assert_eq!(cover.dimensions(), (2, 5));
}

#[test]
fn test_cover_from_cover_image_property() {
    let opf = package(
        "",
        r#"<item id="art" href="art.png" media-type="image/png" properties="cover-image"/>
           <item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>"#,
        r#"<itemref idref="c1"/>"#,
    );
    let art = png(2, 3);
    let chapter = xhtml("Chapter 1", "<p>Text.</p>");
    let bytes = book(&opf, &[("OEBPS/art.png", &art), ("OEBPS/c1.xhtml", &chapter)]);

    let publication = Publication::from_bytes(&bytes).unwrap();
    let view = publication.view();
    let (source, cover) = run_chain(&view, "cover", COVER_STRATEGIES).unwrap();
    assert_eq!(source, "cover-image");
    assert_eq!(cover.dimensions(), (2, 3));
}

#[test]
fn test_cover_from_manifest_id() {
    let opf = package(
        "",
        r#"<item id="cover-art" href="front.png" media-type="image/png"/>
           <item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>"#,
        r#"<itemref idref="c1"/>"#,
    );
    let art = png(5, 1);
    let chapter = xhtml("Chapter 1", "<p>Text.</p>");
    let bytes = book(&opf, &[("OEBPS/front.png", &art), ("OEBPS/c1.xhtml", &chapter)]);

    let publication = Publication::from_bytes(&bytes).unwrap();
    let view = publication.view();
    let (source, cover) = run_chain(&view, "cover", COVER_STRATEGIES).unwrap();
    assert_eq!(source, "manifest-id");
    assert_eq!(cover.dimensions(), (5, 1));
}

#[test]
fn test_cover_from_spine_document() {
    let opf = package(
        "",
        r#"<item id="cover" href="jacket.xhtml" media-type="application/xhtml+xml"/>
           <item id="jacket" href="jacket.png" media-type="image/png"/>
           <item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>"#,
        r#"<itemref idref="cover"/><itemref idref="c1"/>"#,
    );
    let jacket = xhtml("Jacket", r#"<div><img src="jacket.png" alt=""/></div>"#);
    let art = png(3, 3);
    let chapter = xhtml("Chapter 1", "<p>Text.</p>");
    let bytes = book(
        &opf,
        &[
            ("OEBPS/jacket.xhtml", &jacket),
            ("OEBPS/jacket.png", &art),
            ("OEBPS/c1.xhtml", &chapter),
        ],
    );

    let publication = Publication::from_bytes(&bytes).unwrap();
    let view = publication.view();
    let (source, cover) = run_chain(&view, "cover", COVER_STRATEGIES).unwrap();
    assert_eq!(source, "spine");
    assert_eq!(cover.dimensions(), (3, 3));
}
