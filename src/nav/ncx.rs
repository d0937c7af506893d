//! Legacy NCX navigation documents.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::tree::TocNode;
use crate::error::Result;
use crate::util::{decode_text, escape_xml, strip_bom};
use crate::xml::{TextBuf, attr_value, local_name};

pub const NCX_NS: &str = "http://www.daisy.org/z3986/2005/ncx/";

/// A parsed NCX document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ncx {
    pub version: String,
    pub lang: Option<String>,
    /// `<head>` meta name/content pairs, e.g. `dtb:uid`.
    pub head: Vec<(String, String)>,
    pub doc_title: String,
    pub doc_author: Option<String>,
    pub nav_map: Vec<NavPoint>,
    pub page_list: Option<PageList>,
    pub nav_lists: Vec<NavList>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavPoint {
    pub id: String,
    pub class: Option<String>,
    pub play_order: Option<u32>,
    pub label: String,
    pub src: String,
    pub children: Vec<NavPoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageList {
    pub label: Option<String>,
    pub targets: Vec<PageTarget>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageTarget {
    pub id: String,
    /// `front`, `normal` or `special`.
    pub kind: Option<String>,
    pub value: Option<String>,
    pub label: String,
    pub src: String,
}

/// Auxiliary list such as illustrations or tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavList {
    pub label: String,
    pub targets: Vec<NavTarget>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavTarget {
    pub id: String,
    pub label: String,
    pub src: String,
}

/// Element currently collecting a label or content source.
enum Frame {
    DocTitle,
    DocAuthor,
    Point(NavPoint),
    PageList,
    Page(PageTarget),
    List(NavList),
    Target(NavTarget),
}

fn attrs_of(e: &BytesStart<'_>) -> Result<Vec<(Vec<u8>, String)>> {
    let mut attrs = Vec::new();
    for attr in e.attributes().flatten() {
        attrs.push((local_name(attr.key.as_ref()).to_vec(), attr_value(&attr)?));
    }
    Ok(attrs)
}

fn find(attrs: &[(Vec<u8>, String)], name: &[u8]) -> Option<String> {
    attrs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.clone())
}

impl Ncx {
    /// Parse an NCX document. Unknown elements are ignored.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let content = decode_text(strip_bom(bytes));
        let mut reader = Reader::from_str(&content);

        let mut ncx = Ncx::default();
        let mut stack: Vec<Frame> = Vec::new();
        let mut text = TextBuf::new();
        let mut in_text = false;

        loop {
            let (e, empty) = match reader.read_event()? {
                Event::Start(e) => (e, false),
                Event::Empty(e) => (e, true),
                Event::Text(e) => {
                    if in_text {
                        text.push_text(&e);
                    }
                    continue;
                }
                Event::CData(e) => {
                    if in_text {
                        text.push_cdata(&e);
                    }
                    continue;
                }
                Event::GeneralRef(e) => {
                    if in_text {
                        text.push_ref(&e);
                    }
                    continue;
                }
                Event::End(e) => {
                    ncx.close(local_name(e.name().as_ref()), &mut stack, &mut text, &mut in_text);
                    continue;
                }
                Event::Eof => break,
                _ => continue,
            };

            let name = e.name();
            let local = local_name(name.as_ref());
            let attrs = attrs_of(&e)?;

            match local {
                b"ncx" => {
                    ncx.version = find(&attrs, b"version").unwrap_or_default();
                    ncx.lang = find(&attrs, b"lang");
                }
                b"meta" => {
                    if let (Some(name), Some(content)) =
                        (find(&attrs, b"name"), find(&attrs, b"content"))
                    {
                        ncx.head.push((name, content));
                    }
                }
                b"docTitle" => stack.push(Frame::DocTitle),
                b"docAuthor" => stack.push(Frame::DocAuthor),
                b"navPoint" => stack.push(Frame::Point(NavPoint {
                    id: find(&attrs, b"id").unwrap_or_default(),
                    class: find(&attrs, b"class"),
                    play_order: find(&attrs, b"playOrder").and_then(|p| p.trim().parse().ok()),
                    ..Default::default()
                })),
                b"pageList" => stack.push(Frame::PageList),
                b"pageTarget" => stack.push(Frame::Page(PageTarget {
                    id: find(&attrs, b"id").unwrap_or_default(),
                    kind: find(&attrs, b"type"),
                    value: find(&attrs, b"value"),
                    ..Default::default()
                })),
                b"navList" => stack.push(Frame::List(NavList::default())),
                b"navTarget" => stack.push(Frame::Target(NavTarget {
                    id: find(&attrs, b"id").unwrap_or_default(),
                    ..Default::default()
                })),
                b"text" => {
                    text.clear();
                    in_text = true;
                }
                b"content" => {
                    let src = find(&attrs, b"src").unwrap_or_default();
                    match stack.last_mut() {
                        Some(Frame::Point(p)) => p.src = src,
                        Some(Frame::Page(t)) => t.src = src,
                        Some(Frame::Target(t)) => t.src = src,
                        _ => {}
                    }
                }
                _ => {}
            }

            if empty && local != b"content" && local != b"meta" {
                ncx.close(local, &mut stack, &mut text, &mut in_text);
            }
        }

        Ok(ncx)
    }

    fn close(&mut self, local: &[u8], stack: &mut Vec<Frame>, text: &mut TextBuf, in_text: &mut bool) {
        match local {
            b"text" => {
                *in_text = false;
                let value = text.take();
                match stack.last_mut() {
                    Some(Frame::DocTitle) => self.doc_title = value,
                    Some(Frame::DocAuthor) => self.doc_author = Some(value),
                    Some(Frame::Point(p)) if p.label.is_empty() => p.label = value,
                    Some(Frame::PageList) => {
                        self.page_list.get_or_insert_with(PageList::default).label = Some(value)
                    }
                    Some(Frame::Page(t)) if t.label.is_empty() => t.label = value,
                    Some(Frame::List(l)) if l.label.is_empty() => l.label = value,
                    Some(Frame::Target(t)) if t.label.is_empty() => t.label = value,
                    _ => {}
                }
            }
            b"docTitle" | b"docAuthor" | b"pageList" => {
                if local == b"pageList" {
                    self.page_list.get_or_insert_with(PageList::default);
                }
                stack.pop();
            }
            b"navPoint" => {
                if let Some(Frame::Point(point)) = stack.pop() {
                    match stack.last_mut() {
                        Some(Frame::Point(parent)) => parent.children.push(point),
                        _ => self.nav_map.push(point),
                    }
                }
            }
            b"pageTarget" => {
                if let Some(Frame::Page(target)) = stack.pop() {
                    self.page_list
                        .get_or_insert_with(PageList::default)
                        .targets
                        .push(target);
                }
            }
            b"navTarget" => {
                if let Some(Frame::Target(target)) = stack.pop()
                    && let Some(Frame::List(list)) = stack.last_mut()
                {
                    list.targets.push(target);
                }
            }
            b"navList" => {
                if let Some(Frame::List(list)) = stack.pop() {
                    self.nav_lists.push(list);
                }
            }
            _ => {}
        }
    }

    /// Value of a `<head>` meta entry.
    pub fn head_meta(&self, name: &str) -> Option<&str> {
        self.head
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c.as_str())
    }

    /// Normalize the navMap into a tree titled with the docTitle.
    pub fn to_toc(&self) -> TocNode {
        fn convert(points: &[NavPoint]) -> Vec<TocNode> {
            points
                .iter()
                .map(|p| TocNode {
                    title: p.label.clone(),
                    href: p.src.clone(),
                    children: convert(&p.children),
                })
                .collect()
        }
        TocNode {
            title: self.doc_title.clone(),
            href: String::new(),
            children: convert(&self.nav_map),
        }
    }

    /// Build an NCX from a tree, numbering points in reading order.
    pub fn from_toc(toc: &TocNode, uid: &str) -> Self {
        fn convert(nodes: &[TocNode], counter: &mut u32) -> Vec<NavPoint> {
            nodes
                .iter()
                .map(|node| {
                    *counter += 1;
                    let order = *counter;
                    NavPoint {
                        id: format!("navPoint-{}", order),
                        class: None,
                        play_order: Some(order),
                        label: node.title.clone(),
                        src: node.href.clone(),
                        children: convert(&node.children, counter),
                    }
                })
                .collect()
        }

        let mut counter = 0;
        let nav_map = convert(&toc.children, &mut counter);
        Ncx {
            version: "2005-1".to_string(),
            lang: None,
            head: vec![
                ("dtb:uid".to_string(), uid.to_string()),
                ("dtb:depth".to_string(), toc.depth().max(1).to_string()),
                ("dtb:totalPageCount".to_string(), "0".to_string()),
                ("dtb:maxPageNumber".to_string(), "0".to_string()),
            ],
            doc_title: toc.title.clone(),
            doc_author: None,
            nav_map,
            page_list: None,
            nav_lists: Vec::new(),
        }
    }

    pub fn to_xml(&self) -> String {
        let mut ncx = String::new();
        ncx.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        ncx.push_str(&format!(
            "<ncx xmlns=\"{}\" version=\"{}\"",
            NCX_NS,
            escape_xml(&self.version)
        ));
        if let Some(lang) = &self.lang {
            ncx.push_str(&format!(" xml:lang=\"{}\"", escape_xml(lang)));
        }
        ncx.push_str(">\n  <head>\n");
        for (name, content) in &self.head {
            ncx.push_str(&format!(
                "    <meta name=\"{}\" content=\"{}\"/>\n",
                escape_xml(name),
                escape_xml(content)
            ));
        }
        ncx.push_str("  </head>\n");
        ncx.push_str(&format!(
            "  <docTitle><text>{}</text></docTitle>\n",
            escape_xml(&self.doc_title)
        ));
        if let Some(author) = &self.doc_author {
            ncx.push_str(&format!(
                "  <docAuthor><text>{}</text></docAuthor>\n",
                escape_xml(author)
            ));
        }

        ncx.push_str("  <navMap>\n");
        write_nav_points(&mut ncx, &self.nav_map, 2);
        ncx.push_str("  </navMap>\n");

        if let Some(page_list) = &self.page_list {
            ncx.push_str("  <pageList>\n");
            if let Some(label) = &page_list.label {
                ncx.push_str(&format!(
                    "    <navLabel><text>{}</text></navLabel>\n",
                    escape_xml(label)
                ));
            }
            for target in &page_list.targets {
                ncx.push_str(&format!("    <pageTarget id=\"{}\"", escape_xml(&target.id)));
                if let Some(kind) = &target.kind {
                    ncx.push_str(&format!(" type=\"{}\"", escape_xml(kind)));
                }
                if let Some(value) = &target.value {
                    ncx.push_str(&format!(" value=\"{}\"", escape_xml(value)));
                }
                ncx.push_str(&format!(
                    ">\n      <navLabel><text>{}</text></navLabel>\n      <content src=\"{}\"/>\n    </pageTarget>\n",
                    escape_xml(&target.label),
                    escape_xml(&target.src)
                ));
            }
            ncx.push_str("  </pageList>\n");
        }

        for list in &self.nav_lists {
            ncx.push_str(&format!(
                "  <navList>\n    <navLabel><text>{}</text></navLabel>\n",
                escape_xml(&list.label)
            ));
            for target in &list.targets {
                ncx.push_str(&format!(
                    "    <navTarget id=\"{}\">\n      <navLabel><text>{}</text></navLabel>\n      <content src=\"{}\"/>\n    </navTarget>\n",
                    escape_xml(&target.id),
                    escape_xml(&target.label),
                    escape_xml(&target.src)
                ));
            }
            ncx.push_str("  </navList>\n");
        }

        ncx.push_str("</ncx>\n");
        ncx
    }
}

/// Recursively write navPoint elements.
fn write_nav_points(ncx: &mut String, points: &[NavPoint], indent: usize) {
    for point in points {
        let pad = "  ".repeat(indent);
        ncx.push_str(&format!("{}<navPoint id=\"{}\"", pad, escape_xml(&point.id)));
        if let Some(class) = &point.class {
            ncx.push_str(&format!(" class=\"{}\"", escape_xml(class)));
        }
        if let Some(order) = point.play_order {
            ncx.push_str(&format!(" playOrder=\"{}\"", order));
        }
        ncx.push_str(">\n");
        ncx.push_str(&format!(
            "{}  <navLabel><text>{}</text></navLabel>\n",
            pad,
            escape_xml(&point.label)
        ));
        ncx.push_str(&format!(
            "{}  <content src=\"{}\"/>\n",
            pad,
            escape_xml(&point.src)
        ));
        write_nav_points(ncx, &point.children, indent + 1);
        ncx.push_str(&format!("{}</navPoint>\n", pad));
    }
}
