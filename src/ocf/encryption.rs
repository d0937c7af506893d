//! `META-INF/encryption.xml`: which container paths are encrypted, and how.

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::Result;
use crate::util::strip_bom;
use crate::xml::{attr_value, local_name};

/// Algorithm URI used for IDPF font obfuscation.
pub const IDPF_FONT_OBFUSCATION: &str = "http://www.idpf.org/2008/embedding";

/// One `<EncryptedData>` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncryptedResource {
    /// Container path from the CipherReference URI.
    pub uri: String,
    pub algorithm: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Encryption {
    pub resources: Vec<EncryptedResource>,
}

impl Encryption {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let content = String::from_utf8_lossy(strip_bom(bytes));
        let mut reader = Reader::from_str(&content);
        reader.config_mut().trim_text(true);

        let mut resources = Vec::new();
        let mut current: Option<EncryptedResource> = None;
        // EncryptedKey also carries an EncryptionMethod; only EncryptedData counts
        let mut in_data = false;

        loop {
            match reader.read_event()? {
                Event::Start(e) | Event::Empty(e) => {
                    let name = e.name();
                    match local_name(name.as_ref()) {
                        b"EncryptedData" => {
                            in_data = true;
                            current = Some(EncryptedResource::default());
                        }
                        b"EncryptionMethod" if in_data => {
                            for attr in e.attributes().flatten() {
                                if attr.key.as_ref() == b"Algorithm"
                                    && let Some(res) = current.as_mut()
                                {
                                    res.algorithm = Some(attr_value(&attr)?);
                                }
                            }
                        }
                        b"CipherReference" if in_data => {
                            for attr in e.attributes().flatten() {
                                if attr.key.as_ref() == b"URI"
                                    && let Some(res) = current.as_mut()
                                {
                                    res.uri = attr_value(&attr)?;
                                }
                            }
                        }
                        _ => {}
                    }
                }
                Event::End(e) => {
                    if local_name(e.name().as_ref()) == b"EncryptedData" {
                        in_data = false;
                        if let Some(res) = current.take()
                            && !res.uri.is_empty()
                        {
                            resources.push(res);
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(Self { resources })
    }

    pub fn is_encrypted(&self, path: &str) -> bool {
        self.resources.iter().any(|r| r.uri == path)
    }

    pub fn algorithm_for(&self, path: &str) -> Option<&str> {
        self.resources
            .iter()
            .find(|r| r.uri == path)
            .and_then(|r| r.algorithm.as_deref())
    }
}
