//! Opening a publication and choosing a rendition.

use std::io::{Read, Seek};
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::metadata::RefinementMode;
use crate::ocf::ContainerStore;
use crate::rendition::{DEFAULT_RENDITION, Rendition, load_renditions};
use crate::view::ResolvedView;

/// Reader configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderOptions {
    pub refinement_mode: RefinementMode,
}

impl ReaderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_refinement_mode(mut self, mode: RefinementMode) -> Self {
        self.refinement_mode = mode;
        self
    }
}

/// An opened publication: the whole archive in memory plus one parsed
/// package document per rendition.
///
/// Queries go through a [`ResolvedView`] bound to one rendition.
///
/// # Example
///
/// ```no_run
/// use quire::Publication;
///
/// let publication = Publication::open("book.epub")?;
/// let view = publication.view();
/// println!("{} by {}", view.title(), view.author());
/// # Ok::<(), quire::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Publication {
    store: ContainerStore,
    renditions: Vec<Rendition>,
    default_index: usize,
    options: ReaderOptions,
}

impl Publication {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, ReaderOptions::default())
    }

    pub fn open_with<P: AsRef<Path>>(path: P, options: ReaderOptions) -> Result<Self> {
        Self::from_store(ContainerStore::open(path)?, options)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes_with(bytes, ReaderOptions::default())
    }

    pub fn from_bytes_with(bytes: &[u8], options: ReaderOptions) -> Result<Self> {
        Self::from_store(ContainerStore::from_bytes(bytes)?, options)
    }

    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        Self::from_store(ContainerStore::from_reader(reader)?, ReaderOptions::default())
    }

    /// Parse every rendition of an already loaded store.
    pub fn from_store(store: ContainerStore, options: ReaderOptions) -> Result<Self> {
        let renditions = load_renditions(&store)?;
        if renditions.is_empty() {
            return Err(Error::InvalidContainer("no root files".into()));
        }
        let default_index = renditions
            .iter()
            .position(|r| r.key == DEFAULT_RENDITION)
            .unwrap_or(0);
        debug!(
            renditions = renditions.len(),
            default = %renditions[default_index].key,
            "opened publication"
        );

        Ok(Self {
            store,
            renditions,
            default_index,
            options,
        })
    }

    pub fn store(&self) -> &ContainerStore {
        &self.store
    }

    pub fn options(&self) -> ReaderOptions {
        self.options
    }

    pub fn renditions(&self) -> &[Rendition] {
        &self.renditions
    }

    /// Rendition keys in declaration order.
    pub fn rendition_keys(&self) -> impl Iterator<Item = &str> {
        self.renditions.iter().map(|r| r.key.as_str())
    }

    /// The `default` rendition when declared, otherwise the first one.
    pub fn default_rendition(&self) -> &Rendition {
        &self.renditions[self.default_index]
    }

    /// Resolve the rendition with the given key.
    pub fn select_rendition(&self, key: &str) -> Result<ResolvedView<'_>> {
        let rendition = self
            .renditions
            .iter()
            .find(|r| r.key == key)
            .ok_or_else(|| Error::RenditionNotFound(key.to_string()))?;
        Ok(ResolvedView::new(&self.store, rendition, self.options))
    }

    /// Resolve the default rendition.
    pub fn view(&self) -> ResolvedView<'_> {
        ResolvedView::new(&self.store, self.default_rendition(), self.options)
    }
}
