//! Title, author and description chains.

use tracing::debug;

use super::{Chain, contains_ignore_case, non_empty, run_chain};
use crate::html::{Dom, body, find_by_epub_type, html_to_markdown, strip_diacritics, text_by_epub_type, to_markdown};
use crate::opf::GuideType;
use crate::resource::Resource;
use crate::view::ResolvedView;

/// Author returned when no source names one.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// `epub:type` values of sections that can stand in for a description.
const INTRO_TYPES: &[&str] = &[
    "abstract",
    "foreword",
    "introduction",
    "preamble",
    "preface",
    "prologue",
];

/// Guide roles searched for a description, in order.
const DESCRIPTION_GUIDE_TYPES: &[GuideType] = &[GuideType::Text, GuideType::Preface, GuideType::Foreword];

pub const TITLE_STRATEGIES: &Chain<String> = &[
    ("metadata", title_from_metadata),
    ("title-page", title_from_title_page),
    ("title-resources", title_from_title_resources),
];

pub const AUTHOR_STRATEGIES: &Chain<String> = &[
    ("metadata", author_from_metadata),
    ("title-page", author_from_title_page),
    ("title-resources", author_from_title_resources),
    ("placeholder", author_placeholder),
];

pub const DESCRIPTION_STRATEGIES: &Chain<String> = &[
    ("metadata", description_from_metadata),
    ("meta-bag", description_from_meta_bag),
    ("intro-section", description_from_intro_section),
    ("guide", description_from_guide),
    ("toc", description_from_toc),
];

impl ResolvedView<'_> {
    /// The publication title, empty when no source has one.
    pub fn title(&self) -> String {
        run_chain(self, "title", TITLE_STRATEGIES)
            .map(|(_, title)| title)
            .unwrap_or_default()
    }

    /// Authors joined with `", "`, or [`UNKNOWN_AUTHOR`].
    pub fn author(&self) -> String {
        run_chain(self, "author", AUTHOR_STRATEGIES)
            .map(|(_, author)| author)
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string())
    }

    /// A Markdown description with diacritics stripped, empty when no
    /// source has one.
    pub fn description(&self) -> String {
        run_chain(self, "description", DESCRIPTION_STRATEGIES)
            .map(|(_, description)| strip_diacritics(&description))
            .unwrap_or_default()
    }
}

fn title_from_metadata(view: &ResolvedView<'_>) -> Option<String> {
    non_empty(view.metadata().list("title").join(", "))
}

fn title_from_title_page(view: &ResolvedView<'_>) -> Option<String> {
    let dom = title_page(view)?;
    text_by_epub_type(&dom, "title")
}

fn title_from_title_resources(view: &ResolvedView<'_>) -> Option<String> {
    title_resources(view).find_map(|dom| {
        text_by_epub_type(&dom, "title").or_else(|| text_by_epub_type(&dom, "fulltitle"))
    })
}

fn author_from_metadata(view: &ResolvedView<'_>) -> Option<String> {
    non_empty(view.metadata().list("creator").join(", "))
}

fn author_from_title_page(view: &ResolvedView<'_>) -> Option<String> {
    let dom = title_page(view)?;
    text_by_epub_type(&dom, "author")
}

fn author_from_title_resources(view: &ResolvedView<'_>) -> Option<String> {
    title_resources(view).find_map(|dom| text_by_epub_type(&dom, "author"))
}

fn author_placeholder(_: &ResolvedView<'_>) -> Option<String> {
    Some(UNKNOWN_AUTHOR.to_string())
}

fn description_from_metadata(view: &ResolvedView<'_>) -> Option<String> {
    let joined = view.metadata().list("description").join(", ");
    non_empty(html_to_markdown(&joined))
}

fn description_from_meta_bag(view: &ResolvedView<'_>) -> Option<String> {
    let values: Vec<&str> = view
        .metadata()
        .metas()
        .filter(|(key, _)| contains_ignore_case(key, "description"))
        .flat_map(|(_, value)| value.strings())
        .collect();
    non_empty(html_to_markdown(&values.join(", ")))
}

fn description_from_intro_section(view: &ResolvedView<'_>) -> Option<String> {
    view.spine()
        .into_iter()
        .filter(|resource| resource.is_xhtml())
        .filter_map(|resource| view.parse_document(resource))
        .find_map(|dom| {
            INTRO_TYPES.iter().find_map(|kind| {
                let section = find_by_epub_type(&dom, dom.document(), kind)?;
                non_empty(to_markdown(&dom, section))
            })
        })
}

fn description_from_guide(view: &ResolvedView<'_>) -> Option<String> {
    DESCRIPTION_GUIDE_TYPES.iter().find_map(|kind| {
        let resource = view.guide_resource(kind)?;
        body_markdown(view, resource)
    })
}

fn description_from_toc(view: &ResolvedView<'_>) -> Option<String> {
    let toc = view.table_of_contents().ok()?;
    let entry = toc
        .children
        .iter()
        .find(|node| !node.href.is_empty() && !contains_ignore_case(&node.href, "cover"))?;
    let resource = view.toc_target(entry)?;
    body_markdown(view, resource)
}

fn title_page(view: &ResolvedView<'_>) -> Option<Dom> {
    let resource = view.guide_resource(&GuideType::TitlePage)?;
    view.parse_document(resource)
}

/// Content documents whose id or href mentions "title".
fn title_resources<'v>(view: &'v ResolvedView<'_>) -> impl Iterator<Item = Dom> + 'v {
    view.resources()
        .iter()
        .filter(|r| r.is_xhtml())
        .filter(|r| contains_ignore_case(r.id(), "title") || contains_ignore_case(r.href(), "title"))
        .filter_map(|r| view.parse_document(r))
}

fn body_markdown(view: &ResolvedView<'_>, resource: &Resource<'_>) -> Option<String> {
    if !resource.is_xhtml() {
        debug!(id = resource.id(), "description source is not a content document");
        return None;
    }
    let dom = view.parse_document(resource)?;
    non_empty(to_markdown(&dom, body(&dom)))
}
