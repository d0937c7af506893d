//! The generic metadata bag: every metadata entry under its element name.

use std::collections::BTreeMap;

use crate::opf::Metadata;

/// A value in the metadata bag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaValue {
    /// Name/content `meta` entries.
    Single(String),
    /// Dublin Core elements and property `meta` entries.
    List(Vec<String>),
    /// The `meta` bag itself.
    Nested(BTreeMap<String, MetaValue>),
}

impl MetaValue {
    pub fn as_single(&self) -> Option<&str> {
        match self {
            MetaValue::Single(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            MetaValue::List(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_nested(&self) -> Option<&BTreeMap<String, MetaValue>> {
        match self {
            MetaValue::Nested(map) => Some(map),
            _ => None,
        }
    }

    /// String values, nested maps excluded.
    pub fn strings(&self) -> Vec<&str> {
        match self {
            MetaValue::Single(s) => vec![s.as_str()],
            MetaValue::List(values) => values.iter().map(String::as_str).collect(),
            MetaValue::Nested(_) => Vec::new(),
        }
    }

    /// String values joined with `", "`.
    pub fn joined(&self) -> String {
        self.strings().join(", ")
    }
}

/// Metadata of one rendition keyed by element name.
///
/// `identifier`, `title`, `language` and every other Dublin Core element
/// present map to a [`MetaValue::List`]; all `meta` elements live in a
/// [`MetaValue::Nested`] map under `meta`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataBag {
    entries: BTreeMap<String, MetaValue>,
}

impl MetadataBag {
    pub fn from_metadata(metadata: &Metadata) -> Self {
        let mut entries = BTreeMap::new();

        for element in metadata.base_items() {
            let values = entries
                .entry(element.name.clone())
                .or_insert_with(|| MetaValue::List(Vec::new()));
            if let MetaValue::List(values) = values {
                values.push(element.value.clone());
            }
        }

        let mut metas: BTreeMap<String, MetaValue> = BTreeMap::new();
        for meta in &metadata.metas {
            match (&meta.property, &meta.name) {
                (Some(property), _) => {
                    let slot = metas
                        .entry(property.clone())
                        .or_insert_with(|| MetaValue::List(Vec::new()));
                    if !matches!(slot, MetaValue::List(_)) {
                        *slot = MetaValue::List(Vec::new());
                    }
                    if let MetaValue::List(values) = slot
                        && values.last() != Some(&meta.value)
                    {
                        values.push(meta.value.clone());
                    }
                }
                (None, Some(name)) => {
                    let content = meta.content.clone().unwrap_or_default();
                    metas.insert(name.clone(), MetaValue::Single(content));
                }
                (None, None) => {}
            }
        }
        if !metas.is_empty() {
            entries.insert("meta".to_string(), MetaValue::Nested(metas));
        }

        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.entries.get(key)
    }

    /// Values of a Dublin Core element.
    pub fn list(&self, key: &str) -> &[String] {
        self.get(key).and_then(MetaValue::as_list).unwrap_or_default()
    }

    /// The nested `meta` map (empty when there are no meta elements).
    pub fn metas(&self) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.get("meta")
            .and_then(MetaValue::as_nested)
            .into_iter()
            .flatten()
            .map(|(key, value)| (key.as_str(), value))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opf::{DcElement, Meta};

    #[test]
    fn test_bag_shape() {
        let mut metadata = Metadata::default();
        metadata.push(DcElement::new("identifier", "urn:test:1"));
        metadata.push(DcElement::new("title", "The White Company"));
        metadata.push(DcElement::new("language", "en-GB"));
        metadata.push(DcElement::new("subject", "Historical fiction"));
        metadata.push(DcElement::new("subject", "Knights"));
        metadata.metas.push(Meta::named("cover", "cover-image"));
        metadata.metas.push(Meta::property("se:subject", "Fiction"));
        metadata.metas.push(Meta::property("se:subject", "Fiction"));
        metadata.metas.push(Meta::property("se:subject", "Adventure"));
        metadata.metas.push(Meta::property("se:subject", "Fiction"));

        let bag = MetadataBag::from_metadata(&metadata);
        assert_eq!(bag.list("identifier"), ["urn:test:1"]);
        assert_eq!(bag.list("language"), ["en-GB"]);
        assert_eq!(bag.list("subject"), ["Historical fiction", "Knights"]);
        assert!(bag.list("creator").is_empty());

        let metas: BTreeMap<_, _> = bag.metas().collect();
        assert_eq!(metas["cover"], &MetaValue::Single("cover-image".into()));
        assert_eq!(
            metas["se:subject"].as_list().unwrap(),
            ["Fiction", "Adventure", "Fiction"]
        );
        assert_eq!(metas["se:subject"].joined(), "Fiction, Adventure, Fiction");
    }

    #[test]
    fn test_empty_metadata_has_no_keys() {
        let bag = MetadataBag::from_metadata(&Metadata::default());
        assert!(bag.is_empty());
        assert_eq!(bag.metas().count(), 0);
    }
}
