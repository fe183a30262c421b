//! Relationship-related objects for OPC packages.
//!
//! Each part may carry a `.rels` part mapping relationship IDs to targets.
//! Slide-to-image links and the package-to-presentation link both live here.

use crate::error::{Error, Result};
use crate::opc::constants::{namespace, target_mode};
use crate::opc::packuri::PackUri;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashMap;
use std::fmt::Write as FmtWrite;

/// Escape XML special characters for attribute content.
fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// A single relationship from a source part to a target.
#[derive(Debug, Clone)]
pub struct Relationship {
    /// Relationship ID (e.g. "rId1")
    r_id: String,
    /// Relationship type URI
    reltype: String,
    /// Target reference, a relative part reference or an external URL
    target_ref: String,
    /// Base URI for resolving relative references
    base_uri: String,
    /// Whether the target is external to the package
    is_external: bool,
}

impl Relationship {
    pub fn new(
        r_id: String,
        reltype: String,
        target_ref: String,
        base_uri: String,
        is_external: bool,
    ) -> Self {
        Self {
            r_id,
            reltype,
            target_ref,
            base_uri,
            is_external,
        }
    }

    #[inline]
    pub fn r_id(&self) -> &str {
        &self.r_id
    }

    #[inline]
    pub fn reltype(&self) -> &str {
        &self.reltype
    }

    #[inline]
    pub fn target_ref(&self) -> &str {
        &self.target_ref
    }

    #[inline]
    pub fn is_external(&self) -> bool {
        self.is_external
    }

    /// The absolute target partname. Errors for external relationships.
    pub fn target_partname(&self) -> Result<PackUri> {
        if self.is_external {
            return Err(Error::RelationshipNotFound(format!(
                "relationship {} targets an external resource",
                self.r_id
            )));
        }
        PackUri::from_rel_ref(&self.base_uri, &self.target_ref)
    }
}

/// Collection of relationships belonging to one source part.
#[derive(Debug, Clone)]
pub struct Relationships {
    base_uri: String,
    rels: HashMap<String, Relationship>,
}

impl Relationships {
    pub fn new(base_uri: String) -> Self {
        Self {
            base_uri,
            rels: HashMap::new(),
        }
    }

    /// Parse a `.rels` part.
    ///
    /// `base_uri` is the directory of the source part (not of the `.rels`
    /// part itself), so relative targets resolve against the source part.
    pub fn from_xml(base_uri: &str, xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut rels = HashMap::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) | Ok(Event::Empty(e))
                    if e.local_name().as_ref() == b"Relationship" =>
                {
                    let mut r_id = None;
                    let mut reltype = None;
                    let mut target = None;
                    let mut external = false;

                    for attr in e.attributes() {
                        let attr = attr?;
                        let value = attr.unescape_value().map_err(|e| Error::Xml(e.to_string()))?.into_owned();
                        match attr.key.as_ref() {
                            b"Id" => r_id = Some(value),
                            b"Type" => reltype = Some(value),
                            b"Target" => target = Some(value),
                            b"TargetMode" => external = value == target_mode::EXTERNAL,
                            _ => {},
                        }
                    }

                    let (Some(r_id), Some(reltype), Some(target)) = (r_id, reltype, target) else {
                        return Err(Error::Xml(
                            "Relationship element missing Id, Type, or Target".to_string(),
                        ));
                    };

                    rels.insert(
                        r_id.clone(),
                        Relationship::new(r_id, reltype, target, base_uri.to_string(), external),
                    );
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(e.into()),
                _ => {},
            }
            buf.clear();
        }

        Ok(Self {
            base_uri: base_uri.to_string(),
            rels,
        })
    }

    /// Serialize back to `.rels` XML.
    ///
    /// Relationships are emitted in rId order so output is deterministic.
    /// Targets are escaped; external URLs may carry query strings.
    pub fn to_xml(&self) -> String {
        let mut ids: Vec<&String> = self.rels.keys().collect();
        ids.sort_by_key(|id| {
            id.strip_prefix("rId")
                .and_then(|n| n.parse::<u32>().ok())
                .unwrap_or(u32::MAX)
        });

        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        );
        let _ = write!(xml, r#"<Relationships xmlns="{}">"#, namespace::OPC_RELATIONSHIPS);
        for id in ids {
            let rel = &self.rels[id];
            let _ = write!(
                xml,
                r#"<Relationship Id="{}" Type="{}" Target="{}""#,
                rel.r_id,
                rel.reltype,
                escape_attr(&rel.target_ref)
            );
            if rel.is_external {
                let _ = write!(xml, r#" TargetMode="{}""#, target_mode::EXTERNAL);
            }
            xml.push_str("/>");
        }
        xml.push_str("</Relationships>");
        xml
    }

    #[inline]
    pub fn get(&self, r_id: &str) -> Option<&Relationship> {
        self.rels.get(r_id)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rels.len()
    }

    /// Add an internal relationship with the next free rId.
    ///
    /// Returns the rId of the relationship; an existing relationship of the
    /// same type to the same target is reused.
    pub fn get_or_add(&mut self, reltype: &str, target_ref: &str) -> String {
        for rel in self.rels.values() {
            if rel.reltype == reltype && rel.target_ref == target_ref && !rel.is_external {
                return rel.r_id.clone();
            }
        }

        let r_id = self.next_r_id();
        self.rels.insert(
            r_id.clone(),
            Relationship::new(
                r_id.clone(),
                reltype.to_string(),
                target_ref.to_string(),
                self.base_uri.clone(),
                false,
            ),
        );
        r_id
    }

    /// The single relationship of the given type.
    pub fn part_with_reltype(&self, reltype: &str) -> Result<&Relationship> {
        self.rels
            .values()
            .find(|rel| rel.reltype == reltype)
            .ok_or_else(|| {
                Error::RelationshipNotFound(format!("no relationship of type '{reltype}'"))
            })
    }

    /// Next free relationship ID in "rId1", "rId2", ... form, filling gaps.
    fn next_r_id(&self) -> String {
        let mut used: Vec<u32> = self
            .rels
            .keys()
            .filter_map(|id| id.strip_prefix("rId").and_then(|n| n.parse().ok()))
            .collect();
        used.sort_unstable();

        let mut next = 1u32;
        for n in used {
            match n.cmp(&next) {
                std::cmp::Ordering::Equal => next += 1,
                std::cmp::Ordering::Greater => break,
                std::cmp::Ordering::Less => {},
            }
        }
        format!("rId{next}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLIDE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.org/" TargetMode="External"/>
</Relationships>"#;

    #[test]
    fn test_parse_rels() {
        let rels = Relationships::from_xml("/ppt/slides", SLIDE_RELS.as_bytes()).unwrap();
        assert_eq!(rels.len(), 2);

        let layout = rels.get("rId1").unwrap();
        assert!(!layout.is_external());
        assert_eq!(
            layout.target_partname().unwrap().as_str(),
            "/ppt/slideLayouts/slideLayout1.xml"
        );

        let link = rels.get("rId2").unwrap();
        assert!(link.is_external());
        assert!(link.target_partname().is_err());
    }

    #[test]
    fn test_get_or_add_reuses_existing() {
        let mut rels = Relationships::from_xml("/ppt/slides", SLIDE_RELS.as_bytes()).unwrap();
        let rid = rels.get_or_add(
            crate::opc::constants::relationship_type::IMAGE,
            "../media/image1.png",
        );
        assert_eq!(rid, "rId3");
        let again = rels.get_or_add(
            crate::opc::constants::relationship_type::IMAGE,
            "../media/image1.png",
        );
        assert_eq!(again, "rId3");
        assert_eq!(rels.len(), 3);
    }

    #[test]
    fn test_next_r_id_fills_gaps() {
        let mut rels = Relationships::new("/ppt/slides".to_string());
        rels.rels.insert(
            "rId2".to_string(),
            Relationship::new(
                "rId2".into(),
                "t".into(),
                "x".into(),
                "/ppt/slides".into(),
                false,
            ),
        );
        assert_eq!(rels.next_r_id(), "rId1");
    }

    #[test]
    fn test_round_trip() {
        let rels = Relationships::from_xml("/ppt/slides", SLIDE_RELS.as_bytes()).unwrap();
        let xml = rels.to_xml();
        let reparsed = Relationships::from_xml("/ppt/slides", xml.as_bytes()).unwrap();
        assert_eq!(reparsed.len(), 2);
        assert!(reparsed.get("rId2").unwrap().is_external());
        // rId order is deterministic
        assert!(xml.find("rId1").unwrap() < xml.find("rId2").unwrap());
    }
}
