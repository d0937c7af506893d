//! Open Container Format: the zip archive, its `mimetype` entry and the
//! reserved `META-INF` files.

mod container;
mod encryption;
mod store;

pub use container::{Container, ContainerLink, PACKAGE_MEDIA_TYPE, RENDITION_NS, RootFile};
pub use encryption::{EncryptedResource, Encryption, IDPF_FONT_OBFUSCATION};
pub use store::{
    CONTAINER_PATH, ContainerStore, EPUB_MIMETYPE, MIMETYPE_PATH, MetaInf, ReservedFile,
};
