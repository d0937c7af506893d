//! A publication seen through one rendition.

use std::cell::OnceCell;
use std::collections::{BTreeMap, HashMap};

use image::DynamicImage;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::html::{Dom, body, document_title, parse_html, to_markdown};
use crate::metadata::{MetadataBag, Refinements, resolve_refinements};
use crate::nav::{Ncx, TocNode, parse_nav};
use crate::ocf::ContainerStore;
use crate::opf::vocab::PROPERTY_NAV;
use crate::opf::{GuideType, Package};
use crate::publication::ReaderOptions;
use crate::rendition::Rendition;
use crate::resource::{Resource, ResourceTable};
use crate::util::decode_text;

/// Navigation tree plus the path of the document it came from, which is
/// the base its hrefs are relative to.
#[derive(Debug)]
struct Navigation {
    toc: TocNode,
    doc_path: String,
}

/// Everything derived from one rendition: package, resources, metadata
/// and (lazily) navigation.
///
/// Produced by [`Publication::select_rendition`](crate::Publication::select_rendition)
/// or [`Publication::view`](crate::Publication::view). Switching rendition
/// means asking for another view.
#[derive(Debug)]
pub struct ResolvedView<'a> {
    store: &'a ContainerStore,
    rendition: &'a Rendition,
    resources: ResourceTable<'a>,
    metadata: MetadataBag,
    refinements: Refinements,
    navigation: OnceCell<Option<Navigation>>,
    ncx: OnceCell<Option<(Ncx, String)>>,
}

impl<'a> ResolvedView<'a> {
    pub(crate) fn new(store: &'a ContainerStore, rendition: &'a Rendition, options: ReaderOptions) -> Self {
        let package = &rendition.package;
        Self {
            store,
            rendition,
            resources: ResourceTable::build(package, rendition.package_path(), store),
            metadata: MetadataBag::from_metadata(&package.metadata),
            refinements: resolve_refinements(&package.metadata, options.refinement_mode),
            navigation: OnceCell::new(),
            ncx: OnceCell::new(),
        }
    }

    pub fn key(&self) -> &'a str {
        &self.rendition.key
    }

    pub fn rendition(&self) -> &'a Rendition {
        self.rendition
    }

    pub fn package(&self) -> &'a Package {
        &self.rendition.package
    }

    pub fn package_path(&self) -> &'a str {
        self.rendition.package_path()
    }

    pub fn store(&self) -> &'a ContainerStore {
        self.store
    }

    pub fn resources(&self) -> &ResourceTable<'a> {
        &self.resources
    }

    pub fn resource_by_id(&self, id: &str) -> Option<&Resource<'a>> {
        self.resources.by_id(id)
    }

    pub fn resource_by_href(&self, href: &str) -> Option<&Resource<'a>> {
        self.resources.by_href(href)
    }

    /// The generic metadata bag.
    pub fn metadata(&self) -> &MetadataBag {
        &self.metadata
    }

    /// Subject id → refining properties.
    pub fn refinements(&self) -> &Refinements {
        &self.refinements
    }

    /// Declared languages joined with `", "`.
    pub fn language(&self) -> String {
        self.metadata.list("language").join(", ")
    }

    /// Declared identifiers joined with `", "`.
    pub fn identifier(&self) -> String {
        self.metadata.list("identifier").join(", ")
    }

    /// The identifier referenced by `unique-identifier`, else the last one declared.
    pub fn uid(&self) -> Option<&'a str> {
        let package = self.package();
        package.unique_identifier_value().or_else(|| {
            package
                .metadata
                .identifiers
                .last()
                .map(|dc| dc.value.as_str())
        })
    }

    pub fn version(&self) -> &'a str {
        &self.package().version
    }

    /// Spine items as resources, in reading order. Dangling idrefs are skipped.
    pub fn spine(&self) -> Vec<&Resource<'a>> {
        self.package()
            .spine
            .itemrefs
            .iter()
            .filter_map(|itemref| self.resources.by_id(&itemref.idref))
            .collect()
    }

    /// Whether `encryption.xml` lists this resource.
    pub fn is_encrypted(&self, resource: &Resource<'_>) -> bool {
        self.store
            .encryption()
            .is_some_and(|enc| enc.is_encrypted(&resource.path))
    }

    /// Parse a resource as HTML. `None` when its bytes are missing.
    pub fn parse_document(&self, resource: &Resource<'_>) -> Option<Dom> {
        let Some(bytes) = resource.content else {
            debug!(id = resource.id(), path = %resource.path, "no content for document");
            return None;
        };
        Some(parse_html(&decode_text(bytes)))
    }

    /// Manifest ids of XHTML content documents.
    pub fn content_document_ids(&self) -> Vec<&'a str> {
        self.resources
            .iter()
            .filter(|r| r.is_xhtml())
            .map(|r| r.id())
            .collect()
    }

    /// Manifest ids of images (JPEG, PNG, GIF, WebP, SVG).
    pub fn image_ids(&self) -> Vec<&'a str> {
        self.resources
            .iter()
            .filter(|r| r.is_image())
            .map(|r| r.id())
            .collect()
    }

    /// XHTML content documents keyed by id; missing documents are omitted.
    pub fn content_documents(&self) -> BTreeMap<&'a str, Dom> {
        self.resources
            .iter()
            .filter(|r| r.is_xhtml())
            .filter_map(|r| Some((r.id(), self.parse_document(r)?)))
            .collect()
    }

    pub fn content_document(&self, id: &str) -> Option<Dom> {
        let resource = self.resources.by_id(id).filter(|r| r.is_xhtml())?;
        self.parse_document(resource)
    }

    pub fn content_document_by_href(&self, href: &str) -> Option<Dom> {
        let resource = self.resources.by_href(href).filter(|r| r.is_xhtml())?;
        self.parse_document(resource)
    }

    /// A content document as Markdown.
    ///
    /// When the document has a `<title>`, it is prepended as a YAML front
    /// matter block.
    pub fn content_markdown(&self, id: &str) -> Option<String> {
        let dom = self.content_document(id)?;
        Some(render_markdown(&dom))
    }

    /// Every content document as Markdown, keyed by id.
    pub fn content_markdown_all(&self) -> BTreeMap<&'a str, String> {
        self.content_documents()
            .into_iter()
            .map(|(id, dom)| (id, render_markdown(&dom)))
            .collect()
    }

    /// SVG documents keyed by id.
    pub fn svg_documents(&self) -> BTreeMap<&'a str, Dom> {
        self.resources
            .iter()
            .filter(|r| r.is_svg())
            .filter_map(|r| Some((r.id(), self.parse_document(r)?)))
            .collect()
    }

    /// Decode a raster image resource; failures are logged and yield `None`.
    pub fn decode_image(&self, resource: &Resource<'_>) -> Option<DynamicImage> {
        if !resource.is_raster_image() {
            return None;
        }
        let bytes = resource.content?;
        match image::load_from_memory(bytes) {
            Ok(img) => Some(img),
            Err(e) => {
                debug!(id = resource.id(), "cannot decode image: {}", e);
                None
            }
        }
    }

    pub fn image_by_id(&self, id: &str) -> Option<DynamicImage> {
        self.decode_image(self.resources.by_id(id)?)
    }

    pub fn image_by_href(&self, href: &str) -> Option<DynamicImage> {
        self.decode_image(self.resources.by_href(href)?)
    }

    /// Decoded raster images keyed by id; undecodable ones are skipped.
    pub fn images(&self) -> BTreeMap<&'a str, DynamicImage> {
        self.resources
            .iter()
            .filter_map(|r| Some((r.id(), self.decode_image(r)?)))
            .collect()
    }

    /// Raw bytes of raster images keyed by id.
    pub fn image_bytes(&self) -> BTreeMap<&'a str, &'a [u8]> {
        self.resources
            .iter()
            .filter(|r| r.is_raster_image())
            .filter_map(|r| Some((r.id(), r.content?)))
            .collect()
    }

    /// Resource a guide reference points at.
    pub fn guide_resource(&self, kind: &GuideType) -> Option<&Resource<'a>> {
        let reference = self.package().guide.as_ref()?.find(kind)?;
        self.resources.relative_to(self.package_path(), &reference.href)
    }

    /// Guide references parsed as documents, keyed by role.
    pub fn references(&self) -> HashMap<GuideType, Dom> {
        let Some(guide) = self.package().guide.as_ref() else {
            return HashMap::new();
        };
        guide
            .references
            .iter()
            .filter_map(|reference| {
                let resource = self
                    .resources
                    .relative_to(self.package_path(), &reference.href)?;
                Some((reference.kind.clone(), self.parse_document(resource)?))
            })
            .collect()
    }

    /// The NCX of this rendition, if it has a readable one.
    ///
    /// Taken from the spine's `toc` attribute, else the first manifest item
    /// with the NCX media type.
    pub fn navigation_center_extended(&self) -> Option<&Ncx> {
        self.parsed_ncx().map(|(ncx, _)| ncx)
    }

    /// The NCX together with the container path it was read from.
    fn parsed_ncx(&self) -> Option<&(Ncx, String)> {
        self.ncx
            .get_or_init(|| {
                let resource = self
                    .package()
                    .spine
                    .toc
                    .as_deref()
                    .and_then(|id| self.resources.by_id(id))
                    .or_else(|| self.resources.iter().find(|r| r.is_ncx()))?;
                let bytes = resource.content?;
                match Ncx::parse(bytes) {
                    Ok(ncx) => Some((ncx, resource.path.clone())),
                    Err(e) => {
                        warn!(path = %resource.path, "unreadable NCX: {}", e);
                        None
                    }
                }
            })
            .as_ref()
    }

    fn navigation(&self) -> Option<&Navigation> {
        self.navigation
            .get_or_init(|| {
                let nav_doc = self.resources.iter().find(|r| r.has_property(PROPERTY_NAV));
                if let Some(nav_doc) = nav_doc {
                    match parse_nav(nav_doc.bytes()) {
                        Ok(toc) => {
                            return Some(Navigation {
                                toc,
                                doc_path: nav_doc.path.clone(),
                            });
                        }
                        Err(e) => debug!(path = %nav_doc.path, "nav document unusable: {}", e),
                    }
                }

                if let Some((ncx, path)) = self.parsed_ncx() {
                    return Some(Navigation {
                        toc: ncx.to_toc(),
                        doc_path: path.clone(),
                    });
                }

                if nav_doc.is_some() {
                    return None;
                }
                Some(Navigation {
                    toc: TocNode::default(),
                    doc_path: self.package_path().to_string(),
                })
            })
            .as_ref()
    }

    /// The table of contents.
    ///
    /// The HTML nav document wins over the NCX. A publication with neither
    /// has an empty tree; one whose nav document has no `toc` landmark and
    /// no NCX to fall back on fails with [`Error::NavigationNotFound`].
    pub fn table_of_contents(&self) -> Result<&TocNode> {
        self.navigation()
            .map(|nav| &nav.toc)
            .ok_or(Error::NavigationNotFound)
    }

    /// Path of the document the table of contents was read from.
    pub fn navigation_path(&self) -> Option<&str> {
        self.navigation().map(|nav| nav.doc_path.as_str())
    }

    /// Resource a table of contents entry points at.
    pub fn toc_target(&self, node: &TocNode) -> Option<&Resource<'a>> {
        if node.href.is_empty() {
            return None;
        }
        let nav = self.navigation()?;
        self.resources.relative_to(&nav.doc_path, &node.href)
    }
}

fn render_markdown(dom: &Dom) -> String {
    let body = to_markdown(dom, body(dom));
    match document_title(dom) {
        Some(title) => format!("---\ntitle: {:?}\n---\n{}", title, body),
        None => body,
    }
}
