//! Lenient HTML parsing for content documents, navigation documents and
//! descriptions, plus Markdown rendering.

mod arena;
mod markdown;
mod sink;
mod text;

pub use arena::{Attribute, Dom, NodeData, NodeId};
pub use markdown::{escape_markdown, html_to_markdown, to_markdown};
pub use sink::parse_html;
pub use text::{
    body, document_title, find_by_epub_type, first_image_src, strip_diacritics, text_by_epub_type,
};
