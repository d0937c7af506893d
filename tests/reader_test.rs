//! Reading hand-built archives: legacy navigation, fallback chains,
//! rendition selection and refinements.

mod common;

use image::GenericImageView;
use quire::extract::{AUTHOR_STRATEGIES, COVER_STRATEGIES, DESCRIPTION_STRATEGIES, TITLE_STRATEGIES, run_chain};
use quire::{Error, GuideType, Publication, ReaderOptions, RefinementMode, TocNode};

use common::{CONTAINER_XML, epub, png, xhtml};

const LEGACY_OPF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0" unique-identifier="bookid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
    <dc:identifier id="bookid">urn:legacy:1</dc:identifier>
    <dc:language>en</dc:language>
    <meta name="cover" content="cover-page"/>
  </metadata>
  <manifest>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
    <item id="cover-page" href="Text/cover.xhtml" media-type="application/xhtml+xml"/>
    <item id="titlepage" href="Text/titlepage.xhtml" media-type="application/xhtml+xml"/>
    <item id="preface" href="Text/preface.xhtml" media-type="application/xhtml+xml"/>
    <item id="ch1" href="Text/chapter%201.xhtml" media-type="application/xhtml+xml"/>
    <item id="art" href="Images/cover%20art.png" media-type="image/png"/>
  </manifest>
  <spine toc="ncx">
    <itemref idref="cover-page"/>
    <itemref idref="titlepage"/>
    <itemref idref="preface"/>
    <itemref idref="ch1"/>
  </spine>
  <guide>
    <reference type="title-page" title="Title Page" href="Text/titlepage.xhtml"/>
    <reference type="cover" title="Cover" href="Text/cover.xhtml"/>
  </guide>
</package>"#;

const LEGACY_NCX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
    <meta name="dtb:uid" content="urn:legacy:1"/>
    <meta name="dtb:depth" content="2"/>
  </head>
  <docTitle><text>The White Company</text></docTitle>
  <navMap>
    <navPoint id="np1" playOrder="1">
      <navLabel><text>Cover</text></navLabel>
      <content src="Text/cover.xhtml"/>
    </navPoint>
    <navPoint id="np2" playOrder="2">
      <navLabel><text>Preface</text></navLabel>
      <content src="Text/preface.xhtml"/>
    </navPoint>
    <navPoint id="np3" playOrder="3">
      <navLabel><text>Chapter 1</text></navLabel>
      <content src="Text/chapter%201.xhtml"/>
      <navPoint id="np4" playOrder="4">
        <navLabel><text>Section 1</text></navLabel>
        <content src="Text/chapter%201.xhtml#s1"/>
      </navPoint>
    </navPoint>
  </navMap>
</ncx>"#;

fn legacy_epub() -> Vec<u8> {
    let cover = xhtml("Cover", r#"<div><img src="../Images/cover%20art.png" alt="Cover"/></div>"#);
    let titlepage = xhtml(
        "Title Page",
        r#"<section epub:type="titlepage"><h1 epub:type="title">The White Company</h1>
           <p epub:type="z3998:author">Arthur Conan Doyle</p></section>"#,
    );
    let preface = xhtml(
        "Preface",
        r#"<section epub:type="preface"><h2>Preface</h2>
           <p>Crème brûlée is <em>not</em> on the menu.</p></section>"#,
    );
    let chapter = xhtml("Chapter 1", r#"<h1 id="s1">Chapter 1</h1><p>The bell rang.</p>"#);
    let art = png(6, 2);

    epub(&[
        ("META-INF/container.xml", CONTAINER_XML.as_bytes()),
        ("OEBPS/content.opf", LEGACY_OPF.as_bytes()),
        ("OEBPS/toc.ncx", LEGACY_NCX.as_bytes()),
        ("OEBPS/Text/cover.xhtml", &cover),
        ("OEBPS/Text/titlepage.xhtml", &titlepage),
        ("OEBPS/Text/preface.xhtml", &preface),
        ("OEBPS/Text/chapter 1.xhtml", &chapter),
        ("OEBPS/Images/cover art.png", &art),
    ])
}

#[test]
fn test_ncx_is_used_without_nav_document() {
    let publication = Publication::from_bytes(&legacy_epub()).unwrap();
    let view = publication.view();

    let toc = view.table_of_contents().unwrap();
    assert_eq!(toc.title, "The White Company");
    assert_eq!(toc.len(), 4);
    assert_eq!(toc.depth(), 2);
    assert_eq!(view.navigation_path(), Some("OEBPS/toc.ncx"));

    let flat = toc.flatten();
    let titles: Vec<&str> = flat.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, ["Cover", "Preface", "Chapter 1", "Section 1"]);
    assert_eq!(toc.at_depth(1), vec![TocNode::new("Section 1", "Text/chapter%201.xhtml#s1")]);

    let section = &toc.children[2].children[0];
    assert_eq!(view.toc_target(section).unwrap().id(), "ch1");
}

#[test]
fn test_title_and_author_from_title_page() {
    let publication = Publication::from_bytes(&legacy_epub()).unwrap();
    let view = publication.view();

    assert_eq!(view.title(), "The White Company");
    assert_eq!(view.author(), "Arthur Conan Doyle");

    let (source, _) = run_chain(&view, "title", TITLE_STRATEGIES).unwrap();
    assert_eq!(source, "title-page");
    let (source, _) = run_chain(&view, "author", AUTHOR_STRATEGIES).unwrap();
    assert_eq!(source, "title-page");
}

#[test]
fn test_description_from_intro_section() {
    let publication = Publication::from_bytes(&legacy_epub()).unwrap();
    let view = publication.view();

    let (source, _) = run_chain(&view, "description", DESCRIPTION_STRATEGIES).unwrap();
    assert_eq!(source, "intro-section");

    let description = view.description();
    assert!(description.starts_with("## Preface"));
    assert!(description.contains("Creme brulee is *not* on the menu."));
}

#[test]
fn test_cover_through_content_document() {
    let publication = Publication::from_bytes(&legacy_epub()).unwrap();
    let view = publication.view();

    let (source, cover) = run_chain(&view, "cover", COVER_STRATEGIES).unwrap();
    assert_eq!(source, "metadata");
    assert_eq!(cover.dimensions(), (6, 2));
}

#[test]
fn test_resource_lookups_are_consistent() {
    let publication = Publication::from_bytes(&legacy_epub()).unwrap();
    let view = publication.view();

    for resource in view.spine() {
        let by_id = view.resource_by_id(resource.id()).unwrap();
        let by_href = view.resource_by_href(resource.href()).unwrap();
        assert_eq!(by_id.path, by_href.path);
        assert_eq!(by_id.path, format!("OEBPS/{}", resource.href()));
        assert!(by_id.content.is_some(), "{} has no content", by_id.path);
    }

    let art = view.resource_by_id("art").unwrap();
    assert_eq!(art.path, "OEBPS/Images/cover%20art.png");
    assert!(art.content.is_some());
    assert!(view.image_by_href("Images/cover%20art.png").is_some());

    let references = view.references();
    assert!(references.contains_key(&GuideType::TitlePage));
    assert!(references.contains_key(&GuideType::Cover));
    assert_eq!(view.guide_resource(&GuideType::Cover).unwrap().id(), "cover-page");
    assert!(view.guide_resource(&GuideType::Preface).is_none());
}

#[test]
fn test_identifier_accessors() {
    let publication = Publication::from_bytes(&legacy_epub()).unwrap();
    let view = publication.view();
    assert_eq!(view.identifier(), "urn:legacy:1");
    assert_eq!(view.uid(), Some("urn:legacy:1"));
    assert_eq!(view.language(), "en");
    assert_eq!(view.version(), "2.0");
    assert!(!view.package().is_epub3());
}

const GUIDE_COVER_OPF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="uid">urn:guide:1</dc:identifier>
    <dc:title>Guide Cover</dc:title>
    <dc:language>en</dc:language>
  </metadata>
  <manifest>
    <item id="broken" href="broken.png" media-type="image/png" properties="cover-image"/>
    <item id="frontispiece" href="front.xhtml" media-type="application/xhtml+xml"/>
    <item id="plate" href="plate.png" media-type="image/png"/>
    <item id="text" href="text.xhtml" media-type="application/xhtml+xml"/>
  </manifest>
  <spine>
    <itemref idref="frontispiece"/>
    <itemref idref="text"/>
  </spine>
  <guide>
    <reference type="cover" href="front.xhtml"/>
    <reference type="text" href="text.xhtml"/>
  </guide>
</package>"#;

#[test]
fn test_undecodable_cover_falls_through_to_guide() {
    let front = xhtml(
        "Frontispiece",
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">
           <image width="4" height="4" xlink:href="plate.png"/></svg>"#,
    );
    let text = xhtml("Text", "<p>Body text.</p>");
    let plate = png(4, 4);
    let bytes = epub(&[
        ("META-INF/container.xml", CONTAINER_XML.as_bytes()),
        ("OEBPS/content.opf", GUIDE_COVER_OPF.as_bytes()),
        ("OEBPS/broken.png", b"not a png"),
        ("OEBPS/front.xhtml", &front),
        ("OEBPS/plate.png", &plate),
        ("OEBPS/text.xhtml", &text),
    ]);

    let publication = Publication::from_bytes(&bytes).unwrap();
    let view = publication.view();

    let (source, cover) = run_chain(&view, "cover", COVER_STRATEGIES).unwrap();
    assert_eq!(source, "guide");
    assert_eq!(cover.dimensions(), (4, 4));

    assert_eq!(view.images().len(), 1);
    assert_eq!(view.author(), "Unknown");

    let (source, description) = run_chain(&view, "description", DESCRIPTION_STRATEGIES).unwrap();
    assert_eq!(source, "guide");
    assert_eq!(description, "Body text.");

    let toc = view.table_of_contents().unwrap();
    assert!(toc.is_empty());
}

const RENDITIONS_CONTAINER: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container"
           xmlns:rendition="http://www.idpf.org/2013/rendition">
  <rootfiles>
    <rootfile full-path="fixed/package.opf" media-type="application/oebps-package+xml"
              rendition:layout="pre-paginated" rendition:language="fr"/>
    <rootfile full-path="reflow/package.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

fn rendition_opf(title: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="uid">urn:renditions:1</dc:identifier>
    <dc:title>{title}</dc:title>
    <dc:language>en</dc:language>
    <dc:description>&lt;p&gt;A &lt;b&gt;bold&lt;/b&gt; tale.&lt;/p&gt;</dc:description>
  </metadata>
  <manifest>
    <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
    <item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>
  </manifest>
  <spine><itemref idref="c1"/></spine>
</package>"#
    )
}

#[test]
fn test_rendition_selection() {
    let fixed = rendition_opf("Fixed Layout");
    let reflow = rendition_opf("Reflowable");
    let nav = br#"<html><body><nav epub:type="toc"><ol><li><a href="c1.xhtml">One</a></li></ol></nav></body></html>"#;
    let no_landmark = br#"<html><body><nav><ol><li><a href="c1.xhtml">One</a></li></ol></nav></body></html>"#;
    let bytes = epub(&[
        ("META-INF/container.xml", RENDITIONS_CONTAINER.as_bytes()),
        ("fixed/package.opf", fixed.as_bytes()),
        ("fixed/nav.xhtml", no_landmark),
        ("fixed/c1.xhtml", b"<html><body><p>Fixed</p></body></html>"),
        ("reflow/package.opf", reflow.as_bytes()),
        ("reflow/nav.xhtml", nav),
        ("reflow/c1.xhtml", b"<html><body><p>Reflow</p></body></html>"),
    ]);

    let publication = Publication::from_bytes(&bytes).unwrap();
    let keys: Vec<&str> = publication.rendition_keys().collect();
    assert_eq!(keys, ["default_pre-paginated_fr", "default"]);
    assert_eq!(publication.default_rendition().package_path(), "reflow/package.opf");

    let reflow = publication.view();
    assert_eq!(reflow.title(), "Reflowable");
    assert_eq!(reflow.description(), "A **bold** tale.");
    assert_eq!(
        reflow.table_of_contents().unwrap().children,
        vec![TocNode::new("One", "c1.xhtml")]
    );

    let fixed = publication.select_rendition("default_pre-paginated_fr").unwrap();
    assert_eq!(fixed.title(), "Fixed Layout");
    assert_eq!(fixed.spine()[0].path, "fixed/c1.xhtml");
    assert!(matches!(fixed.table_of_contents(), Err(Error::NavigationNotFound)));
}

const REFINES_OPF: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="uid">urn:refines:1</dc:identifier>
    <dc:title id="t1">The White Company</dc:title>
    <dc:language>en</dc:language>
    <dc:creator id="author">Arthur Conan Doyle</dc:creator>
    <meta refines="#t1" property="title-type">main</meta>
    <meta refines="#author" property="file-as" id="author-file-as">Doyle, Arthur Conan</meta>
    EXTRA
  </metadata>
  <manifest><item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/></manifest>
  <spine><itemref idref="c1"/></spine>
</package>"##;

fn refines_epub(extra: &str) -> Vec<u8> {
    let opf = REFINES_OPF.replace("EXTRA", extra);
    epub(&[
        ("META-INF/container.xml", CONTAINER_XML.as_bytes()),
        ("OEBPS/content.opf", opf.as_bytes()),
        ("OEBPS/c1.xhtml", b"<html><body><p>x</p></body></html>"),
    ])
}

#[test]
fn test_orphan_refinement_is_pruned() {
    let publication = Publication::from_bytes(&refines_epub("")).unwrap();
    let refines = publication.view().refinements().clone();

    assert_eq!(refines["t1"]["title-type"], ["main"]);
    assert_eq!(refines["author"]["creator"], ["Arthur Conan Doyle"]);
    assert_eq!(refines["author"]["file-as"], ["Doyle, Arthur Conan"]);
    assert!(!refines.contains_key("author-file-as"));
}

#[test]
fn test_chained_refinement_is_kept() {
    let extra = r##"<meta refines="#author-file-as" property="alternate-script" xml:lang="ja">ドイル</meta>"##;
    let bytes = refines_epub(extra);

    let publication = Publication::from_bytes(&bytes).unwrap();
    let refines = publication.view().refinements().clone();
    assert_eq!(refines["author-file-as"]["file-as"], ["Doyle, Arthur Conan"]);
    assert_eq!(refines["author-file-as"]["alternate-script"], ["ドイル"]);

    let options = ReaderOptions::new().with_refinement_mode(RefinementMode::Direct);
    let publication = Publication::from_bytes_with(&bytes, options).unwrap();
    let refines = publication.view().refinements().clone();
    assert!(!refines["author-file-as"].contains_key("file-as"));
    assert_eq!(refines["author-file-as"]["alternate-script"], ["ドイル"]);
}

#[test]
fn test_open_errors_are_distinguishable() {
    assert!(matches!(
        Publication::from_bytes(b"not a zip"),
        Err(Error::Zip(_))
    ));

    let no_container = epub(&[("OEBPS/content.opf", LEGACY_OPF.as_bytes())]);
    assert!(matches!(
        Publication::from_bytes(&no_container),
        Err(Error::MissingDescriptor(_))
    ));

    let no_package = epub(&[("META-INF/container.xml", CONTAINER_XML.as_bytes())]);
    assert!(matches!(
        Publication::from_bytes(&no_package),
        Err(Error::MissingDescriptor(ref path)) if path == "OEBPS/content.opf"
    ));

    let broken = epub(&[
        ("META-INF/container.xml", CONTAINER_XML.as_bytes()),
        ("OEBPS/content.opf", b"<package><metadata></package>"),
    ]);
    assert!(Publication::from_bytes(&broken).is_err());
}

const TWO_NCX_OPF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="uid">urn:ncx:2</dc:identifier>
    <dc:title>Two Tables</dc:title>
    <dc:language>en</dc:language>
  </metadata>
  <manifest>
    <item id="old" href="old.ncx" media-type="application/x-dtbncx+xml"/>
    <item id="toc" href="nav/toc.ncx" media-type="application/x-dtbncx+xml"/>
    <item id="c1" href="Text/c1.xhtml" media-type="application/xhtml+xml"/>
  </manifest>
  <spine toc="toc"><itemref idref="c1"/></spine>
</package>"#;

fn ncx(title: &str, label: &str, src: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head><meta name="dtb:uid" content="urn:ncx:2"/></head>
  <docTitle><text>{title}</text></docTitle>
  <navMap>
    <navPoint id="np1" playOrder="1">
      <navLabel><text>{label}</text></navLabel>
      <content src="{src}"/>
    </navPoint>
  </navMap>
</ncx>"#
    )
}

#[test]
fn test_toc_hrefs_resolve_against_spine_ncx() {
    let old = ncx("Old", "Stale", "missing.xhtml");
    let current = ncx("Contents", "Chapter 1", "../Text/c1.xhtml");
    let chapter = xhtml("Chapter 1", "<p>Text.</p>");
    let bytes = epub(&[
        ("META-INF/container.xml", CONTAINER_XML.as_bytes()),
        ("OEBPS/content.opf", TWO_NCX_OPF.as_bytes()),
        ("OEBPS/old.ncx", old.as_bytes()),
        ("OEBPS/nav/toc.ncx", current.as_bytes()),
        ("OEBPS/Text/c1.xhtml", &chapter),
    ]);

    let publication = Publication::from_bytes(&bytes).unwrap();
    let view = publication.view();

    assert_eq!(view.navigation_path(), Some("OEBPS/nav/toc.ncx"));
    let toc = view.table_of_contents().unwrap();
    assert_eq!(toc.title, "Contents");
    assert_eq!(view.toc_target(&toc.children[0]).unwrap().id(), "c1");
}

const DUPLICATE_KEY_CONTAINER: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="first/package.opf" media-type="application/oebps-package+xml"/>
    <rootfile full-path="extra/package.opf" media-type="application/oebps-package+xml"
              xmlns:rendition="http://www.idpf.org/2013/rendition" rendition:layout="pre-paginated"/>
    <rootfile full-path="second/package.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

#[test]
fn test_duplicate_rendition_key_keeps_last_root_file() {
    let first = rendition_opf("First");
    let extra = rendition_opf("Extra");
    let second = rendition_opf("Second");
    let bytes = epub(&[
        ("META-INF/container.xml", DUPLICATE_KEY_CONTAINER.as_bytes()),
        ("first/package.opf", first.as_bytes()),
        ("extra/package.opf", extra.as_bytes()),
        ("second/package.opf", second.as_bytes()),
    ]);

    let publication = Publication::from_bytes(&bytes).unwrap();
    let keys: Vec<&str> = publication.rendition_keys().collect();
    assert_eq!(keys, ["default", "default_pre-paginated"]);

    let view = publication.select_rendition("default").unwrap();
    assert_eq!(view.package_path(), "second/package.opf");
    assert_eq!(view.title(), "Second");
}
