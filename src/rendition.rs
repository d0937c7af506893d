//! Renditions: one parsed package document per container root file.

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::ocf::{ContainerStore, RootFile};
use crate::opf::{Package, parse_package};

/// Key of a root file without rendition attributes.
pub const DEFAULT_RENDITION: &str = "default";

/// Build the lookup key of a root file.
///
/// `"default"` followed by each present rendition attribute (media,
/// layout, language, access mode, label), joined with `_`.
pub fn rendition_key(root_file: &RootFile) -> String {
    std::iter::once(DEFAULT_RENDITION)
        .chain(root_file.variant_attributes().map(|(_, value)| value))
        .collect::<Vec<_>>()
        .join("_")
}

/// A declared rendition and its package document.
#[derive(Debug, Clone)]
pub struct Rendition {
    pub key: String,
    pub root_file: RootFile,
    pub package: Package,
}

impl Rendition {
    /// Container path of the package document.
    pub fn package_path(&self) -> &str {
        &self.root_file.full_path
    }
}

/// Parse every root file listed in the container descriptor.
///
/// A root file whose package document is absent is a structural error,
/// as is a malformed package document. Root files sharing a key collapse
/// into one rendition at the first one's position, holding the last one's
/// package.
pub fn load_renditions(store: &ContainerStore) -> Result<Vec<Rendition>> {
    let mut renditions: Vec<Rendition> = Vec::new();

    for root_file in &store.container().root_files {
        let key = rendition_key(root_file);
        let bytes = store
            .get(&root_file.full_path)
            .ok_or_else(|| Error::MissingDescriptor(root_file.full_path.clone()))?;
        let package = parse_package(bytes)?;

        debug!(key = %key, path = %root_file.full_path, version = %package.version, "loaded rendition");
        let rendition = Rendition {
            key,
            root_file: root_file.clone(),
            package,
        };
        match renditions.iter_mut().find(|r| r.key == rendition.key) {
            Some(existing) => {
                warn!(key = %rendition.key, path = %root_file.full_path, "duplicate rendition key, the later root file wins");
                *existing = rendition;
            }
            None => renditions.push(rendition),
        }
    }

    Ok(renditions)
}
