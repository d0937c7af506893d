/// Layout and compression settings for [`Writer`](super::Writer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterConfig {
    /// Directory holding package documents and resources.
    pub content_dir: String,
    /// Subdirectory of `content_dir` for XHTML and navigation documents.
    pub text_dir: String,
    /// Subdirectory of `content_dir` for images.
    pub image_dir: String,
    /// Deflate level (0-9, default 6).
    pub compression_level: Option<u32>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            content_dir: "OEBPS".to_string(),
            text_dir: "Text".to_string(),
            image_dir: "Images".to_string(),
            compression_level: None,
        }
    }
}

impl WriterConfig {
    pub(crate) fn level(&self) -> i64 {
        i64::from(self.compression_level.unwrap_or(6).min(9))
    }

    /// Container path of a file relative to the content directory.
    pub(crate) fn content_path(&self, href: &str) -> String {
        if self.content_dir.is_empty() {
            href.to_string()
        } else {
            format!("{}/{}", self.content_dir, href)
        }
    }

    /// Manifest href inside `dir`.
    pub(crate) fn href_in(dir: &str, name: &str) -> String {
        if dir.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", dir, name)
        }
    }
}
