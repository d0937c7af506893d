//! `META-INF/container.xml`: the list of root files (one per rendition).

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::{Error, Result};
use crate::util::{escape_xml, strip_bom};
use crate::xml::{attr_value, local_name};

pub const CONTAINER_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:container";
pub const RENDITION_NS: &str = "http://www.idpf.org/2013/rendition";
pub const PACKAGE_MEDIA_TYPE: &str = "application/oebps-package+xml";

/// A `<rootfile>` entry with its optional rendition selection attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootFile {
    pub full_path: String,
    pub media_type: String,
    pub media: Option<String>,
    pub layout: Option<String>,
    pub language: Option<String>,
    pub access_mode: Option<String>,
    pub label: Option<String>,
}

impl RootFile {
    pub fn new(full_path: impl Into<String>) -> Self {
        Self {
            full_path: full_path.into(),
            media_type: PACKAGE_MEDIA_TYPE.to_string(),
            ..Default::default()
        }
    }

    /// Rendition attributes in key order, skipping absent and empty ones.
    pub fn variant_attributes(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("media", &self.media),
            ("layout", &self.layout),
            ("language", &self.language),
            ("accessMode", &self.access_mode),
            ("label", &self.label),
        ]
        .into_iter()
        .filter_map(|(name, value)| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(|v| (name, v))
        })
    }

    pub fn has_variant_attributes(&self) -> bool {
        self.variant_attributes().next().is_some()
    }
}

/// A `<link>` in the container's `<links>` block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerLink {
    pub href: String,
    pub rel: String,
    pub media_type: Option<String>,
}

/// Parsed container descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Container {
    pub version: String,
    pub root_files: Vec<RootFile>,
    pub links: Vec<ContainerLink>,
}

impl Container {
    /// Parse container.xml bytes.
    ///
    /// A descriptor without any `<rootfile>` is rejected.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let content = String::from_utf8_lossy(strip_bom(bytes));
        let mut reader = Reader::from_str(&content);
        reader.config_mut().trim_text(true);

        let mut container = Container {
            version: "1.0".to_string(),
            ..Default::default()
        };

        loop {
            match reader.read_event()? {
                Event::Start(e) | Event::Empty(e) => {
                    let name = e.name();
                    match local_name(name.as_ref()) {
                        b"container" => {
                            for attr in e.attributes().flatten() {
                                if attr.key.as_ref() == b"version" {
                                    container.version = attr_value(&attr)?;
                                }
                            }
                        }
                        b"rootfile" => {
                            let mut root = RootFile::default();
                            for attr in e.attributes().flatten() {
                                let value = attr_value(&attr)?;
                                match local_name(attr.key.as_ref()) {
                                    b"full-path" => root.full_path = value,
                                    b"media-type" => root.media_type = value,
                                    b"media" => root.media = Some(value),
                                    b"layout" => root.layout = Some(value),
                                    b"language" => root.language = Some(value),
                                    b"accessMode" => root.access_mode = Some(value),
                                    b"label" => root.label = Some(value),
                                    _ => {}
                                }
                            }
                            if !root.full_path.is_empty() {
                                container.root_files.push(root);
                            }
                        }
                        b"link" => {
                            let mut link = ContainerLink::default();
                            for attr in e.attributes().flatten() {
                                let value = attr_value(&attr)?;
                                match attr.key.as_ref() {
                                    b"href" => link.href = value,
                                    b"rel" => link.rel = value,
                                    b"media-type" => link.media_type = Some(value),
                                    _ => {}
                                }
                            }
                            container.links.push(link);
                        }
                        _ => {}
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if container.root_files.is_empty() {
            return Err(Error::InvalidContainer(
                "No rootfile found in container.xml".into(),
            ));
        }

        Ok(container)
    }

    /// Serialize to container.xml.
    pub fn to_xml(&self) -> String {
        let with_renditions = self.root_files.iter().any(RootFile::has_variant_attributes);

        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str(&format!(
            "<container version=\"{}\" xmlns=\"{}\"",
            escape_xml(&self.version),
            CONTAINER_NS
        ));
        if with_renditions {
            xml.push_str(&format!(" xmlns:rendition=\"{}\"", RENDITION_NS));
        }
        xml.push_str(">\n  <rootfiles>\n");

        for root in &self.root_files {
            xml.push_str(&format!(
                "    <rootfile full-path=\"{}\" media-type=\"{}\"",
                escape_xml(&root.full_path),
                escape_xml(&root.media_type)
            ));
            for (name, value) in root.variant_attributes() {
                xml.push_str(&format!(" rendition:{}=\"{}\"", name, escape_xml(value)));
            }
            xml.push_str("/>\n");
        }
        xml.push_str("  </rootfiles>\n");

        if !self.links.is_empty() {
            xml.push_str("  <links>\n");
            for link in &self.links {
                xml.push_str(&format!(
                    "    <link href=\"{}\" rel=\"{}\"",
                    escape_xml(&link.href),
                    escape_xml(&link.rel)
                ));
                if let Some(ref media_type) = link.media_type {
                    xml.push_str(&format!(" media-type=\"{}\"", escape_xml(media_type)));
                }
                xml.push_str("/>\n");
            }
            xml.push_str("  </links>\n");
        }

        xml.push_str("</container>\n");
        xml
    }
}
