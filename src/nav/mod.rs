//! Navigation: one tree for both the HTML nav document and the legacy NCX.

mod html;
mod ncx;
mod tree;

pub use html::{nav_document, parse_nav, parse_nav_dom};
pub use ncx::{NCX_NS, NavList, NavPoint, NavTarget, Ncx, PageList, PageTarget};
pub use tree::TocNode;
