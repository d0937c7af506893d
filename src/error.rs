//! Error types for quire operations.

use thiserror::Error;

/// Errors that can occur while opening, querying or writing a publication.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Missing container descriptor: {0}")]
    MissingDescriptor(String),

    #[error("Invalid container: {0}")]
    InvalidContainer(String),

    #[error("Invalid package document: {0}")]
    InvalidPackage(String),

    #[error("Unknown rendition: {0}")]
    RenditionNotFound(String),

    #[error("No navigation landmark found")]
    NavigationNotFound,

    #[error("Publication is incomplete: {0}")]
    Validation(#[from] ValidationError),
}

/// A guard-check failure raised by the writer before any bytes are produced.
///
/// Each variant carries the rendition key it was raised for.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("rendition {0}: at least one identifier is required")]
    MissingIdentifier(String),

    #[error("rendition {0}: at least one title is required")]
    MissingTitle(String),

    #[error("rendition {0}: at least one language is required")]
    MissingLanguage(String),

    #[error("rendition {0}: the manifest is empty")]
    EmptyManifest(String),

    #[error("rendition {0}: at least one XHTML content document is required")]
    MissingContent(String),

    #[error("rendition {0}: a cover image is required")]
    MissingCover(String),

    #[error("rendition {0}: the table of contents has not been built")]
    MissingNavigation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
