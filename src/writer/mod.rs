//! Building publications.
//!
//! A [`Writer`] accumulates metadata, resources and navigation for one or
//! more renditions and emits an OCF archive once every rendition passes the
//! guard check.

mod config;

pub use config::WriterConfig;

use std::collections::HashSet;
use std::io::{Seek, Write};
use std::path::Path;

use chrono::Utc;
use tracing::{debug, warn};

use crate::error::{Result, ValidationError};
use crate::nav::{Ncx, TocNode, nav_document};
use crate::ocf::{CONTAINER_PATH, Container, ContainerStore, EPUB_MIMETYPE, MIMETYPE_PATH, RootFile};
use crate::opf::vocab::{MEDIA_TYPE_NCX, MEDIA_TYPE_XHTML, PROPERTY_COVER_IMAGE, PROPERTY_NAV};
use crate::opf::{DcElement, GuideReference, GuideType, ItemRef, ManifestItem, Meta, Package};
use crate::rendition::rendition_key;
use crate::util::{guess_media_type, href_to_id, parent_dir, resolve_path, sanitize_path};

const UID: &str = "uid";
const NAV_FILE: &str = "nav.xhtml";
const NCX_FILE: &str = "toc.ncx";
const NCX_ID: &str = "ncx";

/// One rendition under construction.
#[derive(Debug, Clone)]
struct Draft {
    root_file: RootFile,
    package: Package,
    /// Href relative to the content directory → bytes.
    files: Vec<(String, Vec<u8>)>,
    toc: Option<TocNode>,
    ids: HashSet<String>,
    creators: usize,
}

impl Draft {
    fn new(identifier: &str) -> Self {
        let mut package = Package {
            version: "3.0".to_string(),
            unique_identifier: UID.to_string(),
            ..Default::default()
        };
        package
            .metadata
            .push(DcElement::new("identifier", identifier).with_id(UID));

        Self {
            root_file: RootFile::new(""),
            package,
            files: Vec::new(),
            toc: None,
            ids: HashSet::new(),
            creators: 0,
        }
    }

    /// A manifest id derived from `base`, unique within this rendition.
    fn unique_id(&mut self, base: &str) -> String {
        let base = href_to_id(base);
        let mut id = base.clone();
        let mut n = 1;
        while self.ids.contains(&id) {
            n += 1;
            id = format!("{}-{}", base, n);
        }
        self.ids.insert(id.clone());
        id
    }

    fn add_item(&mut self, id_base: &str, href: String, media_type: &str, data: Vec<u8>) -> String {
        let id = self.unique_id(id_base);
        if let Some(existing) = self.package.manifest.items.iter().find(|i| i.href == href) {
            warn!(href = %href, "replacing resource with the same href");
            let existing = existing.id.clone();
            self.remove_item(&existing);
        }
        self.package
            .manifest
            .items
            .push(ManifestItem::new(&id, &href, media_type));
        self.files.push((href, data));
        id
    }

    /// Drop a manifest item with its bytes and spine references.
    fn remove_item(&mut self, id: &str) {
        if let Some(pos) = self.package.manifest.items.iter().position(|i| i.id == id) {
            let item = self.package.manifest.items.remove(pos);
            self.files.retain(|(href, _)| *href != item.href);
            self.package.spine.itemrefs.retain(|r| r.idref != id);
        }
    }

    /// Drop previously generated navigation documents.
    fn clear_navigation(&mut self) {
        let generated: Vec<String> = self
            .package
            .manifest
            .items
            .iter()
            .filter(|i| i.has_property(PROPERTY_NAV) || i.media_type == MEDIA_TYPE_NCX)
            .map(|i| i.id.clone())
            .collect();
        for id in generated {
            self.remove_item(&id);
        }
        self.package.spine.toc = None;
    }

    fn key(&self) -> String {
        rendition_key(&self.root_file)
    }

    /// First guard violation, in rule order.
    fn check(&self) -> std::result::Result<(), ValidationError> {
        let key = self.key();
        let metadata = &self.package.metadata;
        let items = &self.package.manifest.items;

        if metadata.identifiers.is_empty() {
            return Err(ValidationError::MissingIdentifier(key));
        }
        if metadata.titles.is_empty() {
            return Err(ValidationError::MissingTitle(key));
        }
        if metadata.languages.is_empty() {
            return Err(ValidationError::MissingLanguage(key));
        }
        if items.is_empty() {
            return Err(ValidationError::EmptyManifest(key));
        }
        if !items
            .iter()
            .any(|i| i.media_type == MEDIA_TYPE_XHTML && !i.has_property(PROPERTY_NAV))
        {
            return Err(ValidationError::MissingContent(key));
        }
        if !items.iter().any(|i| i.has_property(PROPERTY_COVER_IMAGE)) {
            return Err(ValidationError::MissingCover(key));
        }
        if self.toc.is_none() {
            return Err(ValidationError::MissingNavigation(key));
        }
        Ok(())
    }
}

/// Publication builder.
///
/// Calls apply to the current rendition, which is the most recent one
/// created with [`Writer::new_rendition`].
///
/// # Example
///
/// ```no_run
/// use quire::{TocNode, Writer};
///
/// # fn cover_png() -> Vec<u8> { Vec::new() }
/// let mut writer = Writer::new("urn:uuid:1234");
/// writer.title("The White Company").languages(["en"]).author("Arthur Conan Doyle");
/// writer.add_content("chapter1.xhtml", b"<html>...</html>".to_vec());
/// writer.cover(&cover_png())?;
/// writer.table_of_contents(TocNode::group("Contents").with_child(TocNode::new("Chapter 1", "chapter1.xhtml")));
/// writer.write("white-company.epub")?;
/// # Ok::<(), quire::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Writer {
    config: WriterConfig,
    drafts: Vec<Draft>,
    modified: Option<String>,
}

impl Writer {
    pub fn new(identifier: impl AsRef<str>) -> Self {
        Self {
            config: WriterConfig::default(),
            drafts: vec![Draft::new(identifier.as_ref())],
            modified: None,
        }
    }

    /// Replace the layout settings. Call before adding resources.
    pub fn with_config(mut self, config: WriterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    fn draft(&mut self) -> &mut Draft {
        let last = self.drafts.len() - 1;
        &mut self.drafts[last]
    }

    fn push_dc(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.draft().package.metadata.push(DcElement::new(name, value));
        self
    }

    pub fn title(&mut self, title: impl Into<String>) -> &mut Self {
        self.push_dc("title", title)
    }

    /// Replace the declared languages.
    pub fn languages<I, S>(&mut self, languages: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let languages = languages
            .into_iter()
            .map(|lang| DcElement::new("language", lang))
            .collect();
        self.draft().package.metadata.languages = languages;
        self
    }

    /// Add a creator, refined with the `aut` role.
    pub fn author(&mut self, name: impl Into<String>) -> &mut Self {
        let draft = self.draft();
        draft.creators += 1;
        let id = format!("creator{:02}", draft.creators);
        draft
            .package
            .metadata
            .push(DcElement::new("creator", name).with_id(&id));
        draft.package.metadata.metas.push(
            Meta::property("role", "aut")
                .refining(&id)
                .with_scheme("marc:relators"),
        );
        self
    }

    pub fn subject(&mut self, subject: impl Into<String>) -> &mut Self {
        self.push_dc("subject", subject)
    }

    pub fn description(&mut self, description: impl Into<String>) -> &mut Self {
        self.push_dc("description", description)
    }

    pub fn publisher(&mut self, publisher: impl Into<String>) -> &mut Self {
        self.push_dc("publisher", publisher)
    }

    pub fn date(&mut self, date: impl Into<String>) -> &mut Self {
        self.push_dc("date", date)
    }

    /// Add a property `meta`.
    pub fn meta(&mut self, property: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.draft()
            .package
            .metadata
            .metas
            .push(Meta::property(property, value));
        self
    }

    /// Add a `meta` refining the element with id `target`.
    pub fn refine(
        &mut self,
        target: impl Into<String>,
        property: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.draft()
            .package
            .metadata
            .metas
            .push(Meta::property(property, value).refining(target));
        self
    }

    /// Override the `dcterms:modified` timestamp (default: time of writing).
    pub fn modified(&mut self, timestamp: impl Into<String>) -> &mut Self {
        self.modified = Some(timestamp.into());
        self
    }

    /// Add an XHTML document under the text directory and append it to the
    /// spine. Returns its manifest id.
    pub fn add_content(&mut self, href: &str, data: Vec<u8>) -> String {
        let name = sanitize_path(href);
        let href = WriterConfig::href_in(&self.config.text_dir, &name);
        let draft = self.draft();
        let id = draft.add_item(&name, href, MEDIA_TYPE_XHTML, data);
        draft.package.spine.itemrefs.push(ItemRef::new(&id));
        id
    }

    /// Add an image under the image directory. Returns its manifest id.
    pub fn add_image(&mut self, href: &str, data: Vec<u8>) -> String {
        let name = sanitize_path(href);
        let href = WriterConfig::href_in(&self.config.image_dir, &name);
        let media_type = guess_media_type(&name);
        self.draft().add_item(&name, href, media_type, data)
    }

    /// Add any resource at `href`, relative to the content directory.
    pub fn add_resource(&mut self, href: &str, media_type: &str, data: Vec<u8>) -> String {
        let href = sanitize_path(href);
        self.draft().add_item(&href.clone(), href, media_type, data)
    }

    /// Add the cover image. The format is sniffed from the bytes.
    pub fn cover(&mut self, data: &[u8]) -> Result<String> {
        let format = image::guess_format(data)?;
        let ext = format.extensions_str().first().copied().unwrap_or("img");
        let href = WriterConfig::href_in(&self.config.image_dir, &format!("cover.{}", ext));

        let draft = self.draft();
        let id = draft.add_item("cover-image", href, format.to_mime_type(), data.to_vec());
        if let Some(item) = draft.package.manifest.items.last_mut() {
            item.properties = Some(PROPERTY_COVER_IMAGE.to_string());
        }
        draft.package.metadata.metas.retain(|m| m.name.as_deref() != Some("cover"));
        draft.package.metadata.metas.push(Meta::named("cover", &id));
        debug!(id = %id, format = ?format, "added cover");
        Ok(id)
    }

    /// Add a guide reference; `href` is relative to the content directory.
    pub fn guide(&mut self, kind: GuideType, title: impl Into<String>, href: impl Into<String>) -> &mut Self {
        let draft = self.draft();
        draft
            .package
            .guide
            .get_or_insert_with(Default::default)
            .references
            .push(GuideReference {
                kind,
                title: Some(title.into()),
                href: href.into(),
            });
        self
    }

    /// Build the navigation documents from `toc`.
    ///
    /// `nav.xhtml` and `toc.ncx` are written into the text directory, so
    /// hrefs in the tree are relative to the content documents. Calling this
    /// again replaces the previous navigation.
    pub fn table_of_contents(&mut self, toc: TocNode) -> &mut Self {
        let text_dir = self.config.text_dir.clone();
        let draft = self.draft();
        draft.clear_navigation();

        let package = &draft.package;
        let uid = package.unique_identifier_value().unwrap_or_default().to_string();
        let lang = package.metadata.languages.first().map(|l| l.value.clone());

        let nav = nav_document(&toc, lang.as_deref());
        let ncx = Ncx::from_toc(&toc, &uid).to_xml();

        let nav_id = draft.add_item(
            "nav",
            WriterConfig::href_in(&text_dir, NAV_FILE),
            MEDIA_TYPE_XHTML,
            nav.into_bytes(),
        );
        if let Some(item) = draft.package.manifest.items.last_mut() {
            item.properties = Some(PROPERTY_NAV.to_string());
        }
        let ncx_id = draft.add_item(
            NCX_ID,
            WriterConfig::href_in(&text_dir, NCX_FILE),
            MEDIA_TYPE_NCX,
            ncx.into_bytes(),
        );
        draft.package.spine.toc = Some(ncx_id);
        debug!(nav = %nav_id, entries = toc.len(), "built navigation");
        draft.toc = Some(toc);
        self
    }

    /// Start a new rendition with the given variant attributes (`media`,
    /// `layout`, `language`, `accessMode`, `label`). It starts with a copy of
    /// the current rendition's metadata and no resources. Returns its key.
    pub fn new_rendition(&mut self, attributes: &[(&str, &str)]) -> String {
        let current = self.draft();
        let mut draft = Draft::new("");
        draft.package.metadata = current.package.metadata.clone();
        draft.creators = current.creators;

        for &(name, value) in attributes {
            let slot = match name {
                "media" => &mut draft.root_file.media,
                "layout" => &mut draft.root_file.layout,
                "language" => &mut draft.root_file.language,
                "accessMode" => &mut draft.root_file.access_mode,
                "label" => &mut draft.root_file.label,
                other => {
                    warn!(attribute = other, "ignoring unknown rendition attribute");
                    continue;
                }
            };
            *slot = Some(value.to_string());
        }

        let key = draft.key();
        self.drafts.push(draft);
        key
    }

    /// Keys of all renditions, in declaration order.
    pub fn rendition_keys(&self) -> Vec<String> {
        self.drafts.iter().map(Draft::key).collect()
    }

    /// Renditions after the first live in their own directory.
    fn package_path(&self, index: usize) -> String {
        let name = match index {
            0 => "package.opf".to_string(),
            n => format!("rendition{}/package.opf", n),
        };
        self.config.content_path(&name)
    }

    /// Run the guard check over every rendition.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        self.drafts.iter().try_for_each(Draft::check)
    }

    /// Assemble the container store for the archive.
    pub fn to_store(&self) -> Result<ContainerStore> {
        self.validate()?;

        let modified = self
            .modified
            .clone()
            .unwrap_or_else(|| Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string());

        let mut store = ContainerStore::new();
        let mut container = Container {
            version: "1.0".to_string(),
            ..Default::default()
        };

        for (index, draft) in self.drafts.iter().enumerate() {
            let package_path = self.package_path(index);
            let base = parent_dir(&package_path);

            let mut package = draft.package.clone();
            if !package
                .metadata
                .metas
                .iter()
                .any(|m| m.property.as_deref() == Some("dcterms:modified"))
            {
                package
                    .metadata
                    .metas
                    .push(Meta::property("dcterms:modified", &modified));
            }
            store.insert(package_path.as_str(), package.to_xml());

            for (href, data) in &draft.files {
                store.insert(resolve_path(base, href), data.clone());
            }

            let mut root_file = draft.root_file.clone();
            root_file.full_path = package_path;
            container.root_files.push(root_file);
        }

        store.insert(MIMETYPE_PATH, EPUB_MIMETYPE);
        store.insert(CONTAINER_PATH, container.to_xml());
        debug!(entries = store.len(), renditions = self.drafts.len(), "assembled archive");
        Ok(store)
    }

    /// Write the archive into `writer`.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<W> {
        self.to_store()?.write_to(writer, self.config.level())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.to_store()?.to_bytes(self.config.level())
    }

    /// Write the archive to `path`.
    ///
    /// The archive is built in memory first, so a failed guard check leaves
    /// any existing file untouched.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}
