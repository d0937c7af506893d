//! Package vocabulary: manifest properties, media types, namespaces.

pub const OPF_NS: &str = "http://www.idpf.org/2007/opf";
pub const DC_NS: &str = "http://purl.org/dc/elements/1.1/";

pub const PROPERTY_NAV: &str = "nav";
pub const PROPERTY_COVER_IMAGE: &str = "cover-image";
pub const PROPERTY_MATHML: &str = "mathml";
pub const PROPERTY_REMOTE_RESOURCES: &str = "remote-resources";
pub const PROPERTY_SCRIPTED: &str = "scripted";
pub const PROPERTY_SVG: &str = "svg";
pub const PROPERTY_SWITCH: &str = "switch";

pub const MEDIA_TYPE_XHTML: &str = "application/xhtml+xml";
pub const MEDIA_TYPE_SVG: &str = "image/svg+xml";
pub const MEDIA_TYPE_JPEG: &str = "image/jpeg";
pub const MEDIA_TYPE_GIF: &str = "image/gif";
pub const MEDIA_TYPE_WEBP: &str = "image/webp";
pub const MEDIA_TYPE_PNG: &str = "image/png";
pub const MEDIA_TYPE_CSS: &str = "text/css";
pub const MEDIA_TYPE_NCX: &str = "application/x-dtbncx+xml";

pub const IMAGE_MEDIA_TYPES: [&str; 5] = [
    MEDIA_TYPE_SVG,
    MEDIA_TYPE_JPEG,
    MEDIA_TYPE_GIF,
    MEDIA_TYPE_WEBP,
    MEDIA_TYPE_PNG,
];

/// Dublin Core elements that may appear besides identifier, title and language.
pub const OPTIONAL_DC_ELEMENTS: [&str; 12] = [
    "contributor",
    "coverage",
    "creator",
    "date",
    "description",
    "format",
    "publisher",
    "relation",
    "rights",
    "source",
    "subject",
    "type",
];

pub fn is_image_media_type(media_type: &str) -> bool {
    IMAGE_MEDIA_TYPES.contains(&media_type)
}
