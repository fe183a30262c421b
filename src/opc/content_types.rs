//! The `[Content_Types].xml` index of an OPC package.
//!
//! Maps file extensions (Default elements) and individual partnames
//! (Override elements) to content types. The template's index is parsed on
//! open, mutated as media parts are added, and serialized back on save.

use crate::error::{Error, Result};
use crate::opc::constants::namespace;
use crate::opc::packuri::PackUri;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::BTreeMap;
use std::fmt::Write as FmtWrite;

/// Content type index for a package.
#[derive(Debug, Clone, Default)]
pub struct ContentTypes {
    /// Extension (lowercase, no period) to content type
    defaults: BTreeMap<String, String>,
    /// Partname to content type
    overrides: BTreeMap<String, String>,
}

impl ContentTypes {
    /// Parse a `[Content_Types].xml` stream.
    pub fn from_xml(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut defaults = BTreeMap::new();
        let mut overrides = BTreeMap::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                    b"Default" => {
                        let mut ext = None;
                        let mut ct = None;
                        for attr in e.attributes() {
                            let attr = attr?;
                            let value = attr.unescape_value().map_err(|e| Error::Xml(e.to_string()))?.into_owned();
                            match attr.key.as_ref() {
                                b"Extension" => ext = Some(value.to_ascii_lowercase()),
                                b"ContentType" => ct = Some(value),
                                _ => {},
                            }
                        }
                        if let (Some(ext), Some(ct)) = (ext, ct) {
                            defaults.insert(ext, ct);
                        }
                    },
                    b"Override" => {
                        let mut partname = None;
                        let mut ct = None;
                        for attr in e.attributes() {
                            let attr = attr?;
                            let value = attr.unescape_value().map_err(|e| Error::Xml(e.to_string()))?.into_owned();
                            match attr.key.as_ref() {
                                b"PartName" => partname = Some(value),
                                b"ContentType" => ct = Some(value),
                                _ => {},
                            }
                        }
                        if let (Some(partname), Some(ct)) = (partname, ct) {
                            overrides.insert(partname, ct);
                        }
                    },
                    _ => {},
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(e.into()),
                _ => {},
            }
            buf.clear();
        }

        Ok(Self {
            defaults,
            overrides,
        })
    }

    /// Serialize back to `[Content_Types].xml`. Defaults come before
    /// overrides, each in lexical order, so output is deterministic.
    pub fn to_xml(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        );
        let _ = write!(xml, r#"<Types xmlns="{}">"#, namespace::OPC_CONTENT_TYPES);
        for (ext, ct) in &self.defaults {
            let _ = write!(
                xml,
                r#"<Default Extension="{ext}" ContentType="{ct}"/>"#
            );
        }
        for (partname, ct) in &self.overrides {
            let _ = write!(
                xml,
                r#"<Override PartName="{partname}" ContentType="{ct}"/>"#
            );
        }
        xml.push_str("</Types>");
        xml
    }

    /// The content type for a part, checking overrides before extension
    /// defaults.
    pub fn content_type_for(&self, partname: &PackUri) -> Result<&str> {
        if let Some(ct) = self.overrides.get(partname.as_str()) {
            return Ok(ct);
        }
        self.defaults
            .get(&partname.ext().to_ascii_lowercase())
            .map(String::as_str)
            .ok_or_else(|| {
                Error::PartNotFound(format!("no content type registered for {partname}"))
            })
    }

    /// Register a Default mapping for an extension if absent.
    pub fn ensure_default(&mut self, ext: &str, content_type: &str) {
        self.defaults
            .entry(ext.to_ascii_lowercase())
            .or_insert_with(|| content_type.to_string());
    }

    /// Register an Override mapping for a single part.
    pub fn set_override(&mut self, partname: &PackUri, content_type: &str) {
        self.overrides
            .insert(partname.as_str().to_string(), content_type.to_string());
    }

    /// Partnames with an Override of the given content type.
    pub fn overrides_with(&self, content_type: &str) -> Vec<&str> {
        self.overrides
            .iter()
            .filter(|(_, ct)| ct.as_str() == content_type)
            .map(|(partname, _)| partname.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opc::constants::content_type as ct;

    const TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
  <Override PartName="/ppt/slides/slide1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>
</Types>"#;

    #[test]
    fn test_override_beats_default() {
        let types = ContentTypes::from_xml(TYPES_XML.as_bytes()).unwrap();
        let pres = PackUri::new("/ppt/presentation.xml").unwrap();
        assert_eq!(
            types.content_type_for(&pres).unwrap(),
            ct::PML_PRESENTATION_MAIN
        );
        let other = PackUri::new("/ppt/viewProps.xml").unwrap();
        assert_eq!(types.content_type_for(&other).unwrap(), ct::XML);
    }

    #[test]
    fn test_unregistered_extension_errors() {
        let types = ContentTypes::from_xml(TYPES_XML.as_bytes()).unwrap();
        let png = PackUri::new("/ppt/media/image1.png").unwrap();
        assert!(types.content_type_for(&png).is_err());
    }

    #[test]
    fn test_ensure_default_is_idempotent() {
        let mut types = ContentTypes::from_xml(TYPES_XML.as_bytes()).unwrap();
        types.ensure_default("png", ct::PNG);
        types.ensure_default("png", "image/ignored");
        let png = PackUri::new("/ppt/media/image1.png").unwrap();
        assert_eq!(types.content_type_for(&png).unwrap(), ct::PNG);
    }

    #[test]
    fn test_round_trip() {
        let mut types = ContentTypes::from_xml(TYPES_XML.as_bytes()).unwrap();
        types.ensure_default("png", ct::PNG);
        let reparsed = ContentTypes::from_xml(types.to_xml().as_bytes()).unwrap();
        let slide = PackUri::new("/ppt/slides/slide1.xml").unwrap();
        assert_eq!(reparsed.content_type_for(&slide).unwrap(), ct::PML_SLIDE);
        assert_eq!(
            reparsed.overrides_with(ct::PML_SLIDE),
            vec!["/ppt/slides/slide1.xml"]
        );
    }
}
