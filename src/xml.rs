//! Small helpers around quick-xml used by every XML parser in the crate.

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesCData, BytesRef, BytesStart, BytesText};

use crate::error::Result;

/// Extract local name from namespaced XML name (e.g., "dc:title" -> "title").
pub fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

/// Resolve XML entity references.
pub fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        "nbsp" => return Some("\u{a0}".to_string()),
        _ => {}
    }

    if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
        if let Ok(code) = u32::from_str_radix(hex, 16)
            && let Some(c) = char::from_u32(code)
        {
            return Some(c.to_string());
        }
    } else if let Some(dec) = entity.strip_prefix('#')
        && let Ok(code) = dec.parse::<u32>()
        && let Some(c) = char::from_u32(code)
    {
        return Some(c.to_string());
    }

    None
}

/// Unescaped attribute value as an owned string.
pub fn attr_value(attr: &Attribute<'_>) -> Result<String> {
    Ok(attr
        .unescape_value()
        .map_err(quick_xml::Error::from)?
        .into_owned())
}

/// Look up an attribute by its full (possibly prefixed) name.
pub fn get_attr(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == name {
            return attr_value(&attr).map(Some);
        }
    }
    Ok(None)
}

/// Accumulates character data across Text, CData and entity events.
#[derive(Debug, Default)]
pub struct TextBuf {
    buf: String,
}

impl TextBuf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn push_text(&mut self, e: &BytesText<'_>) {
        self.buf.push_str(&String::from_utf8_lossy(e.as_ref()));
    }

    pub fn push_cdata(&mut self, e: &BytesCData<'_>) {
        self.buf.push_str(&String::from_utf8_lossy(e.as_ref()));
    }

    pub fn push_ref(&mut self, e: &BytesRef<'_>) {
        let entity = String::from_utf8_lossy(e.as_ref());
        if let Some(resolved) = resolve_entity(&entity) {
            self.buf.push_str(&resolved);
        }
    }

    /// Take the collected text, trimmed.
    pub fn take(&mut self) -> String {
        let text = self.buf.trim().to_string();
        self.buf.clear();
        text
    }
}
