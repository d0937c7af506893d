//! Package document data model.

use std::fmt;

/// One package document (`.opf`), i.e. one rendition of the publication.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Package {
    pub dir: Option<String>,
    pub id: Option<String>,
    pub prefix: Option<String>,
    pub lang: Option<String>,
    pub unique_identifier: String,
    pub version: String,
    pub metadata: Metadata,
    pub manifest: Manifest,
    pub spine: Spine,
    pub guide: Option<Guide>,
}

impl Package {
    /// The `dc:identifier` named by `unique-identifier`.
    pub fn unique_identifier_value(&self) -> Option<&str> {
        self.metadata
            .identifiers
            .iter()
            .find(|i| i.id.as_deref() == Some(self.unique_identifier.as_str()))
            .map(|i| i.value.as_str())
    }

    pub fn is_epub3(&self) -> bool {
        self.version.starts_with('3')
    }
}

/// A Dublin Core element (`dc:title`, `dc:creator`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DcElement {
    /// Local element name without the `dc:` prefix.
    pub name: String,
    pub id: Option<String>,
    pub dir: Option<String>,
    pub lang: Option<String>,
    pub value: String,
}

impl DcElement {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// A `<meta>` element, either EPUB 3 (`property`) or EPUB 2 (`name`/`content`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Meta {
    pub name: Option<String>,
    pub content: Option<String>,
    pub property: Option<String>,
    pub refines: Option<String>,
    pub id: Option<String>,
    pub scheme: Option<String>,
    pub dir: Option<String>,
    pub lang: Option<String>,
    /// Character data of the element.
    pub value: String,
}

impl Meta {
    /// EPUB 3 style `<meta property="...">value</meta>`.
    pub fn property(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: Some(property.into()),
            value: value.into(),
            ..Default::default()
        }
    }

    /// EPUB 2 style `<meta name="..." content="..."/>`.
    pub fn named(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn refining(mut self, target_id: impl Into<String>) -> Self {
        let target = target_id.into();
        self.refines = Some(if target.starts_with('#') {
            target
        } else {
            format!("#{}", target)
        });
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    /// `property` for EPUB 3 metas, otherwise `name`.
    pub fn key(&self) -> Option<&str> {
        self.property
            .as_deref()
            .filter(|p| !p.is_empty())
            .or(self.name.as_deref())
    }

    /// `content` for name/content metas, otherwise the character data.
    pub fn text(&self) -> &str {
        match (&self.name, &self.content) {
            (Some(_), Some(content)) if self.value.is_empty() => content.as_str(),
            _ => self.value.as_str(),
        }
    }

    /// Target id of `refines`, without the leading `#`.
    pub fn refines_id(&self) -> Option<&str> {
        self.refines
            .as_deref()
            .map(|r| r.trim_start_matches('#'))
            .filter(|r| !r.is_empty())
    }
}

/// A metadata `<link>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    pub rel: String,
    pub id: Option<String>,
    pub media_type: Option<String>,
    pub hreflang: Option<String>,
    pub properties: Option<String>,
    pub refines: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub identifiers: Vec<DcElement>,
    pub titles: Vec<DcElement>,
    pub languages: Vec<DcElement>,
    /// Every other Dublin Core element, in document order.
    pub optional: Vec<DcElement>,
    pub metas: Vec<Meta>,
    pub links: Vec<Link>,
}

impl Metadata {
    /// All optional elements with the given local name.
    pub fn elements<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a DcElement> + 'a {
        self.optional.iter().filter(move |e| e.name == name)
    }

    /// Values of all optional elements with the given local name.
    pub fn values(&self, name: &str) -> Vec<String> {
        self.elements(name).map(|e| e.value.clone()).collect()
    }

    /// Identifiable base items in document-group order: identifiers,
    /// titles, languages, then the optional elements.
    pub fn base_items(&self) -> impl Iterator<Item = &DcElement> {
        self.identifiers
            .iter()
            .chain(&self.titles)
            .chain(&self.languages)
            .chain(&self.optional)
    }

    /// Push a Dublin Core element into the right list by name.
    pub fn push(&mut self, element: DcElement) {
        match element.name.as_str() {
            "identifier" => self.identifiers.push(element),
            "title" => self.titles.push(element),
            "language" => self.languages.push(element),
            _ => self.optional.push(element),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub id: Option<String>,
    pub items: Vec<ManifestItem>,
}

impl Manifest {
    pub fn get(&self, id: &str) -> Option<&ManifestItem> {
        self.items.iter().find(|item| item.id == id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestItem {
    pub id: String,
    pub href: String,
    pub media_type: String,
    pub properties: Option<String>,
    pub fallback: Option<String>,
    pub media_overlay: Option<String>,
}

impl ManifestItem {
    pub fn new(
        id: impl Into<String>,
        href: impl Into<String>,
        media_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            href: href.into(),
            media_type: media_type.into(),
            ..Default::default()
        }
    }

    pub fn with_properties(mut self, properties: impl Into<String>) -> Self {
        self.properties = Some(properties.into());
        self
    }

    pub fn has_property(&self, property: &str) -> bool {
        self.properties
            .as_deref()
            .is_some_and(|p| p.split_whitespace().any(|p| p == property))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Spine {
    pub id: Option<String>,
    pub page_progression_direction: Option<String>,
    /// Manifest id of the NCX (EPUB 2).
    pub toc: Option<String>,
    pub itemrefs: Vec<ItemRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRef {
    pub idref: String,
    pub id: Option<String>,
    pub linear: bool,
    pub properties: Option<String>,
}

impl ItemRef {
    pub fn new(idref: impl Into<String>) -> Self {
        Self {
            idref: idref.into(),
            id: None,
            linear: true,
            properties: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Guide {
    pub references: Vec<GuideReference>,
}

impl Guide {
    pub fn find(&self, kind: &GuideType) -> Option<&GuideReference> {
        self.references.iter().find(|r| &r.kind == kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuideReference {
    pub kind: GuideType,
    pub title: Option<String>,
    pub href: String,
}

/// Guide reference roles.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GuideType {
    Cover,
    TitlePage,
    Toc,
    Index,
    Glossary,
    Acknowledgements,
    Bibliography,
    Colophon,
    CopyrightPage,
    Dedication,
    Epigraph,
    Foreword,
    Loi,
    Lot,
    Notes,
    Preface,
    Text,
    /// Any role outside the standard list, kept verbatim.
    Other(String),
}

impl GuideType {
    pub fn as_str(&self) -> &str {
        match self {
            GuideType::Cover => "cover",
            GuideType::TitlePage => "title-page",
            GuideType::Toc => "toc",
            GuideType::Index => "index",
            GuideType::Glossary => "glossary",
            GuideType::Acknowledgements => "acknowledgements",
            GuideType::Bibliography => "bibliography",
            GuideType::Colophon => "colophon",
            GuideType::CopyrightPage => "copyright-page",
            GuideType::Dedication => "dedication",
            GuideType::Epigraph => "epigraph",
            GuideType::Foreword => "foreword",
            GuideType::Loi => "loi",
            GuideType::Lot => "lot",
            GuideType::Notes => "notes",
            GuideType::Preface => "preface",
            GuideType::Text => "text",
            GuideType::Other(s) => s,
        }
    }
}

impl From<&str> for GuideType {
    fn from(s: &str) -> Self {
        match s {
            "cover" => GuideType::Cover,
            "title-page" => GuideType::TitlePage,
            "toc" => GuideType::Toc,
            "index" => GuideType::Index,
            "glossary" => GuideType::Glossary,
            "acknowledgements" => GuideType::Acknowledgements,
            "bibliography" => GuideType::Bibliography,
            "colophon" => GuideType::Colophon,
            "copyright-page" => GuideType::CopyrightPage,
            "dedication" => GuideType::Dedication,
            "epigraph" => GuideType::Epigraph,
            "foreword" => GuideType::Foreword,
            "loi" => GuideType::Loi,
            "lot" => GuideType::Lot,
            "notes" => GuideType::Notes,
            "preface" => GuideType::Preface,
            "text" => GuideType::Text,
            other => GuideType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for GuideType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guide_type_round_trip() {
        for s in ["cover", "title-page", "copyright-page", "loi", "text"] {
            assert_eq!(GuideType::from(s).as_str(), s);
        }
        assert_eq!(
            GuideType::from("other.ms-coverimage"),
            GuideType::Other("other.ms-coverimage".into())
        );
    }

    #[test]
    fn test_meta_key_and_text() {
        let epub2 = Meta::named("cover", "cover-img");
        assert_eq!(epub2.key(), Some("cover"));
        assert_eq!(epub2.text(), "cover-img");

        let epub3 = Meta::property("file-as", "Doyle, Arthur Conan").refining("creator01");
        assert_eq!(epub3.key(), Some("file-as"));
        assert_eq!(epub3.text(), "Doyle, Arthur Conan");
        assert_eq!(epub3.refines_id(), Some("creator01"));
    }

    #[test]
    fn test_manifest_properties() {
        let item = ManifestItem::new("nav", "nav.xhtml", "application/xhtml+xml")
            .with_properties("scripted nav");
        assert!(item.has_property("nav"));
        assert!(!item.has_property("na"));
    }
}
