//! Queries over parsed content documents.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use super::arena::{Dom, NodeId};

/// The `<body>` element, or the document node when there is none.
pub fn body(dom: &Dom) -> NodeId {
    dom.find_by_tag("body").unwrap_or(dom.document())
}

/// Trimmed `<title>` text, if non-empty.
pub fn document_title(dom: &Dom) -> Option<String> {
    let title = dom.find_by_tag("title")?;
    let text = dom.text_content(title);
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

/// First element below `root` whose `epub:type` token list contains `kind`.
///
/// Prefixed tokens match on their local part, so `z3998:author` matches
/// `author`.
pub fn find_by_epub_type(dom: &Dom, root: NodeId, kind: &str) -> Option<NodeId> {
    dom.find_from(root, |dom, id| {
        dom.get_attr(id, "epub:type").is_some_and(|types| {
            types
                .split_whitespace()
                .any(|t| t == kind || t.rsplit(':').next() == Some(kind))
        })
    })
}

/// Whitespace-normalized text of the first element typed `kind`.
pub fn text_by_epub_type(dom: &Dom, kind: &str) -> Option<String> {
    let id = find_by_epub_type(dom, dom.document(), kind)?;
    let text = dom
        .text_content(id)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    (!text.is_empty()).then_some(text)
}

/// Source of the first image in the document.
///
/// Covers both `<img src>` and SVG `<image xlink:href>` wrappers.
pub fn first_image_src(dom: &Dom) -> Option<String> {
    dom.descendants(dom.document()).find_map(|id| {
        let src = if dom.is_tag(id, "img") {
            dom.get_attr(id, "src")
        } else if dom.is_tag(id, "image") {
            dom.get_attr(id, "xlink:href").or_else(|| dom.get_attr(id, "href"))
        } else {
            None
        };
        src.map(str::trim)
            .filter(|src| !src.is_empty())
            .map(str::to_string)
    })
}

/// Remove combining marks: `"Crème Brûlée"` becomes `"Creme Brulee"`.
pub fn strip_diacritics(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).nfc().collect()
}
