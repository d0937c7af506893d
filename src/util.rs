//! Text, path and media-type helpers shared by the reader and the writer.

use std::borrow::Cow;
use std::path::Path;

use percent_encoding::percent_decode_str;

/// Decode bytes to a string, handling various encodings.
///
/// This function:
/// 1. First tries UTF-8 (handles BOM automatically via encoding_rs)
/// 2. If malformed, tries the encoding named in the XML declaration
/// 3. Falls back to Windows-1252 (common in old ebooks)
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(name) = extract_xml_encoding(bytes)
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Extract encoding from XML declaration.
///
/// Only the first 100 bytes are examined.
pub fn extract_xml_encoding(bytes: &[u8]) -> Option<&str> {
    let check_len = bytes.len().min(100);
    let prefix = &bytes[..check_len];

    let xml_start = prefix.windows(5).position(|w| w == b"<?xml")?;
    let after_xml = &prefix[xml_start..];

    let enc_pos = after_xml
        .windows(9)
        .position(|w| w.eq_ignore_ascii_case(b"encoding="))?;
    let after_enc = &after_xml[enc_pos + 9..];

    let quote = *after_enc.first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }

    let value_end = after_enc[1..].iter().position(|&b| b == quote)? + 1;
    std::str::from_utf8(&after_enc[1..value_end]).ok()
}

/// Strip UTF-8 BOM if present.
pub fn strip_bom(data: &[u8]) -> &[u8] {
    if data.starts_with(&[0xEF, 0xBB, 0xBF]) {
        &data[3..]
    } else {
        data
    }
}

/// Escape XML special characters.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Sanitize a path for use in ZIP (remove leading slashes, normalize).
pub fn sanitize_path(path: &str) -> String {
    path.trim_start_matches('/')
        .replace('\\', "/")
        .replace("//", "/")
}

/// Directory part of a container path, without the trailing slash.
///
/// `"OEBPS/content.opf"` gives `"OEBPS"`, `"content.opf"` gives `""`.
pub fn parent_dir(path: &str) -> &str {
    path.rfind('/').map(|i| &path[..i]).unwrap_or("")
}

/// Remove a `#fragment` suffix from an href.
pub fn strip_fragment(href: &str) -> &str {
    href.split('#').next().unwrap_or(href)
}

/// Join `href` onto `base_dir` and normalize `.` and `..` segments.
///
/// The result always uses `/` separators and never starts with `/`.
/// `..` segments that would climb above the container root are dropped.
pub fn resolve_path(base_dir: &str, href: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    let joined = if base_dir.is_empty() || href.starts_with('/') {
        href.replace('\\', "/")
    } else {
        format!("{}/{}", base_dir, href).replace('\\', "/")
    };

    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }

    parts.join("/")
}

/// Percent-decode a path, returning `None` when nothing changes.
pub fn percent_decoded(path: &str) -> Option<String> {
    let decoded = percent_decode_str(path).decode_utf8().ok()?;
    if decoded == path {
        None
    } else {
        Some(decoded.into_owned())
    }
}

/// Guess media type from file extension.
pub fn guess_media_type(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "xhtml" | "html" | "htm" => "application/xhtml+xml",
        "css" => "text/css",
        "js" => "application/javascript",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "smil" => "application/smil+xml",
        "mp3" => "audio/mpeg",
        "ncx" => "application/x-dtbncx+xml",
        "opf" => "application/oebps-package+xml",
        _ => "application/octet-stream",
    }
}

/// Derive a manifest id from an href.
///
/// XML ids may not start with a digit, so such ids get an `id_` prefix.
pub fn href_to_id(href: &str) -> String {
    let id = href.replace(['/', '.', ' ', '-', '#', '%'], "_");
    if id.starts_with(|c: char| c.is_ascii_digit()) || id.is_empty() {
        format!("id_{}", id)
    } else {
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_bom() {
        assert_eq!(strip_bom(&[0xEF, 0xBB, 0xBF, b'h', b'i']), b"hi");
        assert_eq!(strip_bom(b"hi"), b"hi");
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("Hello & World"), "Hello &amp; World");
        assert_eq!(escape_xml("<tag>"), "&lt;tag&gt;");
        assert_eq!(escape_xml("\"quoted\""), "&quot;quoted&quot;");
    }

    #[test]
    fn test_resolve_path() {
        assert_eq!(resolve_path("OEBPS", "Text/ch1.xhtml"), "OEBPS/Text/ch1.xhtml");
        assert_eq!(resolve_path("OEBPS/Text", "../Images/a.png"), "OEBPS/Images/a.png");
        assert_eq!(resolve_path("", "./content.opf"), "content.opf");
        assert_eq!(resolve_path("a", "../../b"), "b");
        assert_eq!(resolve_path("OEBPS", "Text\\ch1.xhtml"), "OEBPS/Text/ch1.xhtml");
    }

    #[test]
    fn test_parent_dir_and_fragment() {
        assert_eq!(parent_dir("OEBPS/content.opf"), "OEBPS");
        assert_eq!(parent_dir("content.opf"), "");
        assert_eq!(strip_fragment("ch1.xhtml#p3"), "ch1.xhtml");
        assert_eq!(strip_fragment("ch1.xhtml"), "ch1.xhtml");
    }

    #[test]
    fn test_percent_decoded() {
        assert_eq!(percent_decoded("a%20b.xhtml").as_deref(), Some("a b.xhtml"));
        assert_eq!(percent_decoded("plain.xhtml"), None);
    }

    #[test]
    fn test_guess_media_type() {
        assert_eq!(guess_media_type("file.xhtml"), "application/xhtml+xml");
        assert_eq!(guess_media_type("style.css"), "text/css");
        assert_eq!(guess_media_type("image.JPG"), "image/jpeg");
        assert_eq!(guess_media_type("unknown"), "application/octet-stream");
    }

    #[test]
    fn test_href_to_id() {
        assert_eq!(href_to_id("Text/chapter-1.xhtml"), "Text_chapter_1_xhtml");
        assert_eq!(href_to_id("1.xhtml"), "id_1_xhtml");
    }

    #[test]
    fn test_decode_text_fallback() {
        assert_eq!(decode_text("héllo".as_bytes()), "héllo");
        // 0xE9 is é in Windows-1252 and invalid as a lone UTF-8 byte
        assert_eq!(decode_text(&[b'h', 0xE9]), "hé");
        let latin = b"<?xml version=\"1.0\" encoding=\"iso-8859-1\"?><a>\xE9</a>";
        assert_eq!(extract_xml_encoding(latin), Some("iso-8859-1"));
        assert!(decode_text(latin).contains('é'));
    }
}
