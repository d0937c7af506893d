//! Package document serialization.

use super::model::{DcElement, Link, Meta, Package};
use super::vocab::{DC_NS, OPF_NS};
use crate::util::escape_xml;

fn push_opt_attr(out: &mut String, name: &str, value: &Option<String>) {
    if let Some(value) = value {
        out.push_str(&format!(" {}=\"{}\"", name, escape_xml(value)));
    }
}

fn write_dc(opf: &mut String, dc: &DcElement) {
    opf.push_str(&format!("    <dc:{}", dc.name));
    push_opt_attr(opf, "id", &dc.id);
    push_opt_attr(opf, "dir", &dc.dir);
    push_opt_attr(opf, "xml:lang", &dc.lang);
    opf.push_str(&format!(">{}</dc:{}>\n", escape_xml(&dc.value), dc.name));
}

fn write_meta(opf: &mut String, meta: &Meta) {
    opf.push_str("    <meta");
    push_opt_attr(opf, "name", &meta.name);
    push_opt_attr(opf, "content", &meta.content);
    push_opt_attr(opf, "property", &meta.property);
    push_opt_attr(opf, "refines", &meta.refines);
    push_opt_attr(opf, "id", &meta.id);
    push_opt_attr(opf, "scheme", &meta.scheme);
    push_opt_attr(opf, "dir", &meta.dir);
    push_opt_attr(opf, "xml:lang", &meta.lang);
    if meta.value.is_empty() {
        opf.push_str("/>\n");
    } else {
        opf.push_str(&format!(">{}</meta>\n", escape_xml(&meta.value)));
    }
}

fn write_link(opf: &mut String, link: &Link) {
    opf.push_str(&format!(
        "    <link href=\"{}\" rel=\"{}\"",
        escape_xml(&link.href),
        escape_xml(&link.rel)
    ));
    push_opt_attr(opf, "id", &link.id);
    push_opt_attr(opf, "media-type", &link.media_type);
    push_opt_attr(opf, "hreflang", &link.hreflang);
    push_opt_attr(opf, "properties", &link.properties);
    push_opt_attr(opf, "refines", &link.refines);
    opf.push_str("/>\n");
}

impl Package {
    /// Serialize to package document XML.
    pub fn to_xml(&self) -> String {
        let mut opf = String::new();

        opf.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        opf.push_str(&format!(
            "<package xmlns=\"{}\" version=\"{}\" unique-identifier=\"{}\"",
            OPF_NS,
            escape_xml(&self.version),
            escape_xml(&self.unique_identifier)
        ));
        push_opt_attr(&mut opf, "id", &self.id);
        push_opt_attr(&mut opf, "dir", &self.dir);
        push_opt_attr(&mut opf, "prefix", &self.prefix);
        push_opt_attr(&mut opf, "xml:lang", &self.lang);
        opf.push_str(">\n");

        // Metadata
        opf.push_str(&format!("  <metadata xmlns:dc=\"{}\">\n", DC_NS));
        for dc in self.metadata.base_items() {
            write_dc(&mut opf, dc);
        }
        for meta in &self.metadata.metas {
            write_meta(&mut opf, meta);
        }
        for link in &self.metadata.links {
            write_link(&mut opf, link);
        }
        opf.push_str("  </metadata>\n");

        // Manifest
        opf.push_str("  <manifest");
        push_opt_attr(&mut opf, "id", &self.manifest.id);
        opf.push_str(">\n");
        for item in &self.manifest.items {
            opf.push_str(&format!(
                "    <item id=\"{}\" href=\"{}\" media-type=\"{}\"",
                escape_xml(&item.id),
                escape_xml(&item.href),
                escape_xml(&item.media_type)
            ));
            push_opt_attr(&mut opf, "properties", &item.properties);
            push_opt_attr(&mut opf, "fallback", &item.fallback);
            push_opt_attr(&mut opf, "media-overlay", &item.media_overlay);
            opf.push_str("/>\n");
        }
        opf.push_str("  </manifest>\n");

        // Spine
        opf.push_str("  <spine");
        push_opt_attr(&mut opf, "id", &self.spine.id);
        push_opt_attr(&mut opf, "toc", &self.spine.toc);
        push_opt_attr(
            &mut opf,
            "page-progression-direction",
            &self.spine.page_progression_direction,
        );
        opf.push_str(">\n");
        for itemref in &self.spine.itemrefs {
            opf.push_str(&format!(
                "    <itemref idref=\"{}\"",
                escape_xml(&itemref.idref)
            ));
            push_opt_attr(&mut opf, "id", &itemref.id);
            if !itemref.linear {
                opf.push_str(" linear=\"no\"");
            }
            push_opt_attr(&mut opf, "properties", &itemref.properties);
            opf.push_str("/>\n");
        }
        opf.push_str("  </spine>\n");

        // Guide (EPUB 2 legacy, still read by many reading systems)
        if let Some(ref guide) = self.guide
            && !guide.references.is_empty()
        {
            opf.push_str("  <guide>\n");
            for reference in &guide.references {
                opf.push_str(&format!(
                    "    <reference type=\"{}\"",
                    escape_xml(reference.kind.as_str())
                ));
                push_opt_attr(&mut opf, "title", &reference.title);
                opf.push_str(&format!(" href=\"{}\"/>\n", escape_xml(&reference.href)));
            }
            opf.push_str("  </guide>\n");
        }

        opf.push_str("</package>\n");
        opf
    }
}
