//! Manifest items resolved to container paths and bytes.

use std::collections::HashMap;

use crate::ocf::ContainerStore;
use crate::opf::vocab::{MEDIA_TYPE_NCX, MEDIA_TYPE_SVG, MEDIA_TYPE_XHTML, is_image_media_type};
use crate::opf::{ManifestItem, Package};
use crate::util::{parent_dir, percent_decoded, resolve_path, strip_fragment};

/// A manifest item together with where it lives in the container.
///
/// `content` borrows from the store and is `None` when the archive has no
/// entry at `path`.
#[derive(Debug, Clone)]
pub struct Resource<'a> {
    pub item: &'a ManifestItem,
    pub path: String,
    pub content: Option<&'a [u8]>,
}

impl<'a> Resource<'a> {
    pub fn id(&self) -> &'a str {
        &self.item.id
    }

    pub fn href(&self) -> &'a str {
        &self.item.href
    }

    pub fn media_type(&self) -> &'a str {
        &self.item.media_type
    }

    pub fn has_property(&self, property: &str) -> bool {
        self.item.has_property(property)
    }

    /// Content bytes, empty when the entry is missing.
    pub fn bytes(&self) -> &'a [u8] {
        self.content.unwrap_or_default()
    }

    pub fn is_xhtml(&self) -> bool {
        self.item.media_type == MEDIA_TYPE_XHTML
    }

    pub fn is_svg(&self) -> bool {
        self.item.media_type == MEDIA_TYPE_SVG
    }

    pub fn is_ncx(&self) -> bool {
        self.item.media_type == MEDIA_TYPE_NCX
    }

    /// JPEG, PNG, GIF, WebP or SVG.
    pub fn is_image(&self) -> bool {
        is_image_media_type(&self.item.media_type)
    }

    /// Raster image types the `image` crate can decode.
    pub fn is_raster_image(&self) -> bool {
        self.is_image() && !self.is_svg()
    }
}

/// All resources of one rendition with id, href and path indexes.
#[derive(Debug, Clone, Default)]
pub struct ResourceTable<'a> {
    resources: Vec<Resource<'a>>,
    by_id: HashMap<&'a str, usize>,
    by_href: HashMap<&'a str, usize>,
    by_path: HashMap<String, usize>,
}

impl<'a> ResourceTable<'a> {
    /// Resolve every manifest item against the package document's directory.
    ///
    /// The first item wins when ids, hrefs or paths collide.
    pub fn build(package: &'a Package, package_path: &str, store: &'a ContainerStore) -> Self {
        let base = parent_dir(package_path);
        let mut table = ResourceTable::default();

        for item in &package.manifest.items {
            let path = resolve_path(base, strip_fragment(&item.href));
            let content = store.get(&path);
            let index = table.resources.len();

            table.by_id.entry(item.id.as_str()).or_insert(index);
            table.by_href.entry(item.href.as_str()).or_insert(index);
            table.by_path.entry(path.clone()).or_insert(index);
            if let Some(decoded) = percent_decoded(&path) {
                table.by_path.entry(decoded).or_insert(index);
            }
            table.resources.push(Resource {
                item,
                path,
                content,
            });
        }

        table
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Resources in manifest order.
    pub fn iter(&self) -> impl Iterator<Item = &Resource<'a>> {
        self.resources.iter()
    }

    pub fn by_id(&self, id: &str) -> Option<&Resource<'a>> {
        self.by_id.get(id).map(|&i| &self.resources[i])
    }

    /// Lookup by manifest href, ignoring any fragment.
    pub fn by_href(&self, href: &str) -> Option<&Resource<'a>> {
        self.by_href
            .get(href)
            .or_else(|| self.by_href.get(strip_fragment(href)))
            .map(|&i| &self.resources[i])
    }

    /// Lookup by resolved container path, percent-encoded or not.
    pub fn by_path(&self, path: &str) -> Option<&Resource<'a>> {
        self.by_path
            .get(path)
            .or_else(|| percent_decoded(path).and_then(|p| self.by_path.get(&p)))
            .map(|&i| &self.resources[i])
    }

    /// Resolve an href found inside the document at `doc_path`.
    pub fn relative_to(&self, doc_path: &str, href: &str) -> Option<&Resource<'a>> {
        let path = resolve_path(parent_dir(doc_path), strip_fragment(href));
        self.by_path(&path)
    }
}
