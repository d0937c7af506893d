//! Package document parser.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::model::{
    DcElement, Guide, GuideReference, GuideType, ItemRef, Link, ManifestItem, Meta, Package,
};
use crate::error::{Error, Result};
use crate::util::{decode_text, strip_bom};
use crate::xml::{TextBuf, attr_value, local_name};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Metadata,
    Manifest,
    Spine,
    Guide,
}

/// A metadata child whose character data is still being collected.
enum Pending {
    Dc(DcElement),
    Meta(Meta),
    Link(Link),
}

impl Pending {
    fn local_name(&self) -> &[u8] {
        match self {
            Pending::Dc(dc) => dc.name.as_bytes(),
            Pending::Meta(_) => b"meta",
            Pending::Link(_) => b"link",
        }
    }
}

/// Parse a package document.
///
/// Missing optional sections are tolerated; a document without a
/// `<package>` root is not.
pub fn parse_package(bytes: &[u8]) -> Result<Package> {
    let content = decode_text(strip_bom(bytes));
    let mut reader = Reader::from_str(&content);

    let mut package: Option<Package> = None;
    let mut section = Section::None;
    let mut pending: Option<Pending> = None;
    let mut text = TextBuf::new();

    loop {
        let (e, empty) = match reader.read_event()? {
            Event::Start(e) => (e, false),
            Event::Empty(e) => (e, true),
            Event::Text(e) => {
                if pending.is_some() {
                    text.push_text(&e);
                }
                continue;
            }
            Event::CData(e) => {
                if pending.is_some() {
                    text.push_cdata(&e);
                }
                continue;
            }
            Event::GeneralRef(e) => {
                if pending.is_some() {
                    text.push_ref(&e);
                }
                continue;
            }
            Event::End(e) => {
                let name = e.name();
                let local = local_name(name.as_ref());
                if pending.as_ref().is_some_and(|p| p.local_name() == local) {
                    if let (Some(p), Some(pkg)) = (pending.take(), package.as_mut()) {
                        finish_pending(pkg, p, text.take());
                    }
                    text.clear();
                } else if matches!(local, b"metadata" | b"manifest" | b"spine" | b"guide") {
                    section = Section::None;
                }
                continue;
            }
            Event::Eof => break,
            _ => continue,
        };

        let name = e.name();
        let local = local_name(name.as_ref());

        if local == b"package" {
            package = Some(parse_package_attrs(&e)?);
            continue;
        }
        let Some(pkg) = package.as_mut() else {
            continue;
        };

        match (section, local) {
            (_, b"metadata") => section = Section::Metadata,
            (_, b"manifest") => {
                section = Section::Manifest;
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"id" {
                        pkg.manifest.id = Some(attr_value(&attr)?);
                    }
                }
            }
            (_, b"spine") => {
                section = Section::Spine;
                for attr in e.attributes().flatten() {
                    let value = attr_value(&attr)?;
                    match attr.key.as_ref() {
                        b"id" => pkg.spine.id = Some(value),
                        b"toc" => pkg.spine.toc = Some(value),
                        b"page-progression-direction" => {
                            pkg.spine.page_progression_direction = Some(value)
                        }
                        _ => {}
                    }
                }
            }
            (_, b"guide") => {
                section = Section::Guide;
                pkg.guide.get_or_insert_with(Guide::default);
            }
            (Section::Metadata, b"dc-metadata" | b"x-metadata") => {}
            (Section::Metadata, _) if pending.is_none() => {
                let item = match local {
                    b"meta" => Pending::Meta(parse_meta_attrs(&e)?),
                    b"link" => Pending::Link(parse_link_attrs(&e)?),
                    _ => Pending::Dc(parse_dc_attrs(&e, local)?),
                };
                if empty {
                    finish_pending(pkg, item, String::new());
                } else {
                    text.clear();
                    pending = Some(item);
                }
            }
            (Section::Manifest, b"item") => {
                pkg.manifest.items.push(parse_item_attrs(&e)?);
            }
            (Section::Spine, b"itemref") => {
                pkg.spine.itemrefs.push(parse_itemref_attrs(&e)?);
            }
            (Section::Guide, b"reference") => {
                if let Some(reference) = parse_reference_attrs(&e)? {
                    pkg.guide
                        .get_or_insert_with(Guide::default)
                        .references
                        .push(reference);
                }
            }
            _ => {}
        }
    }

    package.ok_or_else(|| Error::InvalidPackage("missing <package> element".into()))
}

fn finish_pending(pkg: &mut Package, pending: Pending, value: String) {
    match pending {
        Pending::Dc(mut dc) => {
            dc.value = value;
            pkg.metadata.push(dc);
        }
        Pending::Meta(mut meta) => {
            meta.value = value;
            pkg.metadata.metas.push(meta);
        }
        Pending::Link(link) => pkg.metadata.links.push(link),
    }
}

fn parse_package_attrs(e: &BytesStart<'_>) -> Result<Package> {
    let mut pkg = Package::default();
    for attr in e.attributes().flatten() {
        let value = attr_value(&attr)?;
        match attr.key.as_ref() {
            b"dir" => pkg.dir = Some(value),
            b"id" => pkg.id = Some(value),
            b"prefix" => pkg.prefix = Some(value),
            b"xml:lang" => pkg.lang = Some(value),
            b"unique-identifier" => pkg.unique_identifier = value,
            b"version" => pkg.version = value,
            _ => {}
        }
    }
    Ok(pkg)
}

fn parse_dc_attrs(e: &BytesStart<'_>, local: &[u8]) -> Result<DcElement> {
    let mut dc = DcElement {
        name: String::from_utf8_lossy(local).into_owned(),
        ..Default::default()
    };
    for attr in e.attributes().flatten() {
        let value = attr_value(&attr)?;
        match attr.key.as_ref() {
            b"id" => dc.id = Some(value),
            b"dir" => dc.dir = Some(value),
            b"xml:lang" => dc.lang = Some(value),
            _ => {}
        }
    }
    Ok(dc)
}

fn parse_meta_attrs(e: &BytesStart<'_>) -> Result<Meta> {
    let mut meta = Meta::default();
    for attr in e.attributes().flatten() {
        let value = attr_value(&attr)?;
        match attr.key.as_ref() {
            b"name" => meta.name = Some(value),
            b"content" => meta.content = Some(value),
            b"property" => meta.property = Some(value),
            b"refines" => meta.refines = Some(value),
            b"id" => meta.id = Some(value),
            b"scheme" => meta.scheme = Some(value),
            b"dir" => meta.dir = Some(value),
            b"xml:lang" => meta.lang = Some(value),
            _ => {}
        }
    }
    Ok(meta)
}

fn parse_link_attrs(e: &BytesStart<'_>) -> Result<Link> {
    let mut link = Link::default();
    for attr in e.attributes().flatten() {
        let value = attr_value(&attr)?;
        match attr.key.as_ref() {
            b"href" => link.href = value,
            b"rel" => link.rel = value,
            b"id" => link.id = Some(value),
            b"media-type" => link.media_type = Some(value),
            b"hreflang" => link.hreflang = Some(value),
            b"properties" => link.properties = Some(value),
            b"refines" => link.refines = Some(value),
            _ => {}
        }
    }
    Ok(link)
}

fn parse_item_attrs(e: &BytesStart<'_>) -> Result<ManifestItem> {
    let mut item = ManifestItem::default();
    for attr in e.attributes().flatten() {
        let value = attr_value(&attr)?;
        match attr.key.as_ref() {
            b"id" => item.id = value,
            b"href" => item.href = value,
            b"media-type" => item.media_type = value,
            b"properties" => item.properties = Some(value),
            b"fallback" => item.fallback = Some(value),
            b"media-overlay" => item.media_overlay = Some(value),
            _ => {}
        }
    }
    Ok(item)
}

fn parse_itemref_attrs(e: &BytesStart<'_>) -> Result<ItemRef> {
    let mut itemref = ItemRef::new(String::new());
    for attr in e.attributes().flatten() {
        let value = attr_value(&attr)?;
        match attr.key.as_ref() {
            b"idref" => itemref.idref = value,
            b"id" => itemref.id = Some(value),
            b"linear" => itemref.linear = value != "no",
            b"properties" => itemref.properties = Some(value),
            _ => {}
        }
    }
    Ok(itemref)
}

fn parse_reference_attrs(e: &BytesStart<'_>) -> Result<Option<GuideReference>> {
    let mut kind = None;
    let mut title = None;
    let mut href = None;
    for attr in e.attributes().flatten() {
        let value = attr_value(&attr)?;
        match attr.key.as_ref() {
            b"type" => kind = Some(GuideType::from(value.as_str())),
            b"title" => title = Some(value),
            b"href" => href = Some(value),
            _ => {}
        }
    }
    Ok(match (kind, href) {
        (Some(kind), Some(href)) => Some(GuideReference { kind, title, href }),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPUB3_OPF: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="uid" xml:lang="en">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="uid">urn:uuid:1234</dc:identifier>
    <dc:title id="t1">Tom &amp; Jerry</dc:title>
    <dc:language>en</dc:language>
    <dc:creator id="creator01">Arthur Conan Doyle</dc:creator>
    <dc:subject>Adventure</dc:subject>
    <meta refines="#creator01" property="role" scheme="marc:relators">aut</meta>
    <meta property="dcterms:modified">2024-01-01T00:00:00Z</meta>
    <meta name="cover" content="cover-img"/>
    <link rel="record" href="meta/record.xml" media-type="application/marc"/>
  </metadata>
  <manifest>
    <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
    <item id="ch1" href="Text/ch1.xhtml" media-type="application/xhtml+xml"/>
    <item id="cover-img" href="Images/cover.png" media-type="image/png" properties="cover-image"/>
  </manifest>
  <spine page-progression-direction="ltr">
    <itemref idref="ch1"/>
    <itemref idref="nav" linear="no"/>
  </spine>
  <guide>
    <reference type="cover" title="Cover" href="Text/cover.xhtml"/>
    <reference type="other.custom" href="Text/x.xhtml"/>
  </guide>
</package>"##;

    #[test]
    fn test_parse_epub3_package() {
        let pkg = parse_package(EPUB3_OPF.as_bytes()).unwrap();

        assert_eq!(pkg.version, "3.0");
        assert!(pkg.is_epub3());
        assert_eq!(pkg.lang.as_deref(), Some("en"));
        assert_eq!(pkg.unique_identifier_value(), Some("urn:uuid:1234"));

        let md = &pkg.metadata;
        assert_eq!(md.titles[0].value, "Tom & Jerry");
        assert_eq!(md.titles[0].id.as_deref(), Some("t1"));
        assert_eq!(md.languages[0].value, "en");
        assert_eq!(md.values("creator"), vec!["Arthur Conan Doyle"]);
        assert_eq!(md.values("subject"), vec!["Adventure"]);
        assert_eq!(md.metas.len(), 3);
        assert_eq!(md.metas[0].refines_id(), Some("creator01"));
        assert_eq!(md.metas[0].scheme.as_deref(), Some("marc:relators"));
        assert_eq!(md.metas[2].text(), "cover-img");
        assert_eq!(md.links[0].rel, "record");

        assert_eq!(pkg.manifest.items.len(), 3);
        assert!(pkg.manifest.get("nav").unwrap().has_property("nav"));

        assert_eq!(pkg.spine.page_progression_direction.as_deref(), Some("ltr"));
        assert_eq!(pkg.spine.itemrefs.len(), 2);
        assert!(pkg.spine.itemrefs[0].linear);
        assert!(!pkg.spine.itemrefs[1].linear);

        let guide = pkg.guide.unwrap();
        assert_eq!(guide.references.len(), 2);
        assert_eq!(guide.references[0].kind, GuideType::Cover);
        assert_eq!(
            guide.references[1].kind,
            GuideType::Other("other.custom".into())
        );
    }

    #[test]
    fn test_parse_epub2_with_toc_attribute() {
        let opf = r#"<?xml version="1.0"?>
<package version="2.0" unique-identifier="BookId" xmlns="http://www.idpf.org/2007/opf">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
    <dc:title>Old Book</dc:title>
    <dc:identifier id="BookId" opf:scheme="ISBN">123</dc:identifier>
  </metadata>
  <manifest>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
  </manifest>
  <spine toc="ncx"/>
</package>"#;
        let pkg = parse_package(opf.as_bytes()).unwrap();
        assert_eq!(pkg.spine.toc.as_deref(), Some("ncx"));
        assert_eq!(pkg.metadata.identifiers[0].value, "123");
        assert!(pkg.guide.is_none());
        assert!(!pkg.is_epub3());
    }

    #[test]
    fn test_missing_package_root() {
        assert!(matches!(
            parse_package(b"<html><body/></html>"),
            Err(Error::InvalidPackage(_))
        ));
    }

    #[test]
    fn test_malformed_xml() {
        let broken = r#"<package version="3.0"><metadata></manifest></package>"#;
        assert!(matches!(parse_package(broken.as_bytes()), Err(Error::Xml(_))));
    }
}
