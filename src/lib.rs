//! # quire
//!
//! Read and write EPUB publications with more than one rendition.
//!
//! ## Features
//!
//! - Every rendition declared in `container.xml` parsed at open time
//! - Manifest resolution with id, href and container-path lookups
//! - Metadata refinement graph (`refines`) and a typed metadata bag
//! - One navigation tree for both the HTML nav document and the NCX
//! - Fallback chains for title, author, description and cover
//! - A guard-checked writer that emits both navigation formats
//!
//! ## Reading
//!
//! ```no_run
//! use quire::Publication;
//!
//! let publication = Publication::open("book.epub")?;
//! for key in publication.rendition_keys() {
//!     println!("rendition: {key}");
//! }
//!
//! let view = publication.view();
//! println!("{} by {}", view.title(), view.author());
//! for entry in view.table_of_contents()?.flatten() {
//!     println!("{} -> {}", entry.title, entry.href);
//! }
//! # Ok::<(), quire::Error>(())
//! ```
//!
//! ## Writing
//!
//! ```no_run
//! use quire::{TocNode, Writer};
//!
//! # let cover = Vec::new();
//! let mut writer = Writer::new("urn:isbn:9780000000000");
//! writer.title("The White Company").languages(["en"]);
//! writer.add_content("chapter1.xhtml", b"<html>...</html>".to_vec());
//! writer.cover(&cover)?;
//! writer.table_of_contents(
//!     TocNode::group("Contents").with_child(TocNode::new("Chapter 1", "chapter1.xhtml")),
//! );
//! writer.write("out.epub")?;
//! # Ok::<(), quire::Error>(())
//! ```

pub mod error;
pub mod extract;
pub mod html;
pub mod metadata;
pub mod nav;
pub mod ocf;
pub mod opf;
mod publication;
pub mod rendition;
pub mod resource;
pub(crate) mod util;
mod view;
pub mod writer;
pub(crate) mod xml;

pub use error::{Error, Result, ValidationError};
pub use metadata::{MetaValue, MetadataBag, RefinementMode, Refinements};
pub use nav::{Ncx, TocNode};
pub use opf::{GuideType, Package};
pub use publication::{Publication, ReaderOptions};
pub use rendition::Rendition;
pub use resource::Resource;
pub use view::ResolvedView;
pub use writer::{Writer, WriterConfig};
