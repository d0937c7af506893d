//! HTML navigation documents (`<nav epub:type="toc">`).

use tracing::trace;

use super::tree::TocNode;
use crate::error::{Error, Result};
use crate::html::{Dom, NodeId, parse_html};
use crate::util::{decode_text, escape_xml};

/// Parse a navigation document into a tree.
///
/// The landmark is the first element carrying any attribute whose value is
/// exactly `toc`; without one this fails with [`Error::NavigationNotFound`].
pub fn parse_nav(bytes: &[u8]) -> Result<TocNode> {
    let dom = parse_html(&decode_text(bytes));
    parse_nav_dom(&dom)
}

/// Same as [`parse_nav`] over an already parsed document.
pub fn parse_nav_dom(dom: &Dom) -> Result<TocNode> {
    let nav = dom
        .find_from(dom.document(), |dom, id| {
            dom.attrs(id).iter().any(|a| a.value == "toc")
        })
        .ok_or(Error::NavigationNotFound)?;

    let mut toc = TocNode::default();
    if let Some(heading) = dom.element_children(nav).next()
        && !is_list(dom, heading)
    {
        toc.title = visible_text(dom, heading);
    }
    if let Some(list) = dom.element_children(nav).find(|&c| is_list(dom, c)) {
        toc.children = parse_list(dom, list);
    }
    trace!(entries = toc.len(), "parsed nav document");
    Ok(toc)
}

fn is_list(dom: &Dom, id: NodeId) -> bool {
    dom.is_tag(id, "ol") || dom.is_tag(id, "ul")
}

fn visible_text(dom: &Dom, id: NodeId) -> String {
    dom.text_content(id)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_list(dom: &Dom, list: NodeId) -> Vec<TocNode> {
    dom.element_children(list)
        .filter(|&c| dom.is_tag(c, "li"))
        .map(|li| parse_item(dom, li))
        .collect()
}

fn parse_item(dom: &Dom, li: NodeId) -> TocNode {
    let mut item = TocNode::default();
    let mut label = Vec::new();
    let mut sublist = None;

    for child in dom.children(li) {
        if is_list(dom, child) {
            sublist.get_or_insert(child);
        } else {
            label.push(child);
        }
    }

    let anchor = label.iter().find_map(|&node| {
        if dom.is_tag(node, "a") {
            Some(node)
        } else if dom.is_element(node) {
            dom.find_from(node, |dom, id| dom.is_tag(id, "a"))
        } else {
            None
        }
    });

    if let Some(anchor) = anchor {
        item.href = dom.get_attr(anchor, "href").unwrap_or("").to_string();
        item.title = visible_text(dom, anchor);
    } else {
        let text: String = label.iter().map(|&node| dom.text_content(node)).collect();
        item.title = text.split_whitespace().collect::<Vec<_>>().join(" ");
    }
    if let Some(sublist) = sublist {
        item.children = parse_list(dom, sublist);
    }
    item
}

fn write_list(out: &mut String, nodes: &[TocNode], indent: usize) {
    let pad = "  ".repeat(indent);
    out.push_str(&format!("{}<ol>\n", pad));
    for node in nodes {
        let label = if node.href.is_empty() {
            format!("<span>{}</span>", escape_xml(&node.title))
        } else {
            format!(
                "<a href=\"{}\">{}</a>",
                escape_xml(&node.href),
                escape_xml(&node.title)
            )
        };
        if node.children.is_empty() {
            out.push_str(&format!("{}  <li>{}</li>\n", pad, label));
        } else {
            out.push_str(&format!("{}  <li>{}\n", pad, label));
            write_list(out, &node.children, indent + 2);
            out.push_str(&format!("{}  </li>\n", pad));
        }
    }
    out.push_str(&format!("{}</ol>\n", pad));
}

/// Generate an XHTML navigation document with `toc` and `landmarks` sections.
pub fn nav_document(toc: &TocNode, lang: Option<&str>) -> String {
    let mut html = String::new();
    html.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE html>\n");
    html.push_str(
        "<html xmlns=\"http://www.w3.org/1999/xhtml\" xmlns:epub=\"http://www.idpf.org/2007/ops\"",
    );
    if let Some(lang) = lang {
        let lang = escape_xml(lang);
        html.push_str(&format!(" lang=\"{}\" xml:lang=\"{}\"", lang, lang));
    }
    html.push_str(">\n<head>\n");
    html.push_str(&format!("  <title>{}</title>\n", escape_xml(&toc.title)));
    html.push_str("</head>\n<body>\n");

    html.push_str("  <nav epub:type=\"toc\" id=\"toc\">\n");
    html.push_str(&format!("    <h2>{}</h2>\n", escape_xml(&toc.title)));
    write_list(&mut html, &toc.children, 2);
    html.push_str("  </nav>\n");

    if let Some(start) = toc.landmark() {
        html.push_str("  <nav epub:type=\"landmarks\" id=\"landmarks\" hidden=\"hidden\">\n");
        html.push_str("    <h2>Landmarks</h2>\n    <ol>\n");
        html.push_str(&format!(
            "      <li><a epub:type=\"bodymatter\" href=\"{}\">{}</a></li>\n",
            escape_xml(&start.href),
            escape_xml(&start.title)
        ));
        html.push_str("    </ol>\n  </nav>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}
