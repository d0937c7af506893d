//! Package documents: metadata, manifest, spine and guide.

mod model;
mod parser;
mod serialize;
pub mod vocab;

pub use model::{
    DcElement, Guide, GuideReference, GuideType, ItemRef, Link, Manifest, ManifestItem, Meta,
    Metadata, Package, Spine,
};
pub use parser::parse_package;
