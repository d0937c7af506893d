//! Cover image chain.
//!
//! Canonical order:
//! 1. a `meta` whose name contains `cover`, its value taken as a manifest id
//! 2. the item with the `cover-image` property
//! 3. an image item whose id contains `cover`
//! 4. a spine item whose idref contains `cover`
//! 5. the guide `cover` reference
//! 6. the first top-level TOC entry whose href contains `cover`
//!
//! A candidate that is a content document (or an SVG wrapper) stands for the
//! first image it references. Candidates that fail to decode are skipped.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat};
use tracing::debug;

use super::{Chain, contains_ignore_case, run_chain};
use crate::error::Result;
use crate::html::first_image_src;
use crate::opf::GuideType;
use crate::opf::vocab::PROPERTY_COVER_IMAGE;
use crate::resource::Resource;
use crate::view::ResolvedView;

pub const COVER_STRATEGIES: &Chain<DynamicImage> = &[
    ("metadata", cover_from_metadata),
    ("cover-image", cover_from_property),
    ("manifest-id", cover_from_manifest_id),
    ("spine", cover_from_spine),
    ("guide", cover_from_guide),
    ("toc", cover_from_toc),
];

impl ResolvedView<'_> {
    /// The decoded cover image.
    pub fn cover(&self) -> Option<DynamicImage> {
        run_chain(self, "cover", COVER_STRATEGIES).map(|(_, image)| image)
    }

    /// The cover re-encoded as PNG.
    pub fn cover_bytes(&self) -> Result<Option<Vec<u8>>> {
        let Some(cover) = self.cover() else {
            return Ok(None);
        };
        let mut buf = Cursor::new(Vec::new());
        cover.write_to(&mut buf, ImageFormat::Png)?;
        Ok(Some(buf.into_inner()))
    }
}

fn cover_from_metadata(view: &ResolvedView<'_>) -> Option<DynamicImage> {
    view.metadata()
        .metas()
        .filter(|(key, _)| contains_ignore_case(key, "cover"))
        .flat_map(|(_, value)| value.strings())
        .find_map(|id| image_from_resource(view, view.resource_by_id(id.trim())?))
}

fn cover_from_property(view: &ResolvedView<'_>) -> Option<DynamicImage> {
    view.resources()
        .iter()
        .filter(|r| r.has_property(PROPERTY_COVER_IMAGE))
        .find_map(|r| image_from_resource(view, r))
}

fn cover_from_manifest_id(view: &ResolvedView<'_>) -> Option<DynamicImage> {
    view.resources()
        .iter()
        .filter(|r| r.is_image() && contains_ignore_case(r.id(), "cover"))
        .find_map(|r| image_from_resource(view, r))
}

fn cover_from_spine(view: &ResolvedView<'_>) -> Option<DynamicImage> {
    view.spine()
        .into_iter()
        .filter(|r| contains_ignore_case(r.id(), "cover"))
        .find_map(|r| image_from_resource(view, r))
}

fn cover_from_guide(view: &ResolvedView<'_>) -> Option<DynamicImage> {
    image_from_resource(view, view.guide_resource(&GuideType::Cover)?)
}

fn cover_from_toc(view: &ResolvedView<'_>) -> Option<DynamicImage> {
    let toc = view.table_of_contents().ok()?;
    let entry = toc
        .children
        .iter()
        .find(|node| contains_ignore_case(&node.href, "cover"))?;
    image_from_resource(view, view.toc_target(entry)?)
}

/// Decode a candidate, following one level of document indirection.
fn image_from_resource(view: &ResolvedView<'_>, resource: &Resource<'_>) -> Option<DynamicImage> {
    if resource.is_raster_image() {
        return view.decode_image(resource);
    }
    if !resource.is_xhtml() && !resource.is_svg() {
        debug!(id = resource.id(), media_type = resource.media_type(), "cover candidate is not an image");
        return None;
    }

    let dom = view.parse_document(resource)?;
    let src = first_image_src(&dom)?;
    let target = view.resources().relative_to(&resource.path, &src);
    match target {
        Some(target) => view.decode_image(target),
        None => {
            debug!(id = resource.id(), src = %src, "cover image not in manifest");
            None
        }
    }
}
