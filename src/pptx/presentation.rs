//! The presentation part: slide ordering and slide size.
//!
//! Slide order comes from the `p:sldIdLst` element; each `p:sldId` carries
//! an `r:id` resolved through the presentation part's relationships.

use crate::error::{Error, Result};
use crate::opc::{OpcPackage, PackUri};
use quick_xml::Reader;
use quick_xml::events::Event;

/// A resolved view of the presentation part.
///
/// Holds the slide partnames in presentation order. Built once per package
/// open; adding media parts never reorders slides, so the view stays valid
/// for the life of the run.
#[derive(Debug, Clone)]
pub struct Presentation {
    partname: PackUri,
    slides: Vec<PackUri>,
    slide_width: Option<i64>,
    slide_height: Option<i64>,
}

impl Presentation {
    /// Resolve the presentation part of an open package.
    pub(crate) fn load(opc: &OpcPackage, partname: PackUri) -> Result<Self> {
        let xml = opc.part(&partname)?;
        let rels = opc.part_rels(&partname)?;

        let mut reader = Reader::from_reader(xml);
        let mut buf = Vec::new();

        let mut slide_rids = Vec::new();
        let mut in_sld_id_lst = false;
        let mut slide_width = None;
        let mut slide_height = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                    match e.local_name().as_ref() {
                        b"sldIdLst" => in_sld_id_lst = true,
                        b"sldId" if in_sld_id_lst => {
                            for attr in e.attributes() {
                                let attr = attr?;
                                if attr.key.local_name().as_ref() == b"id"
                                    && attr.key.as_ref().starts_with(b"r:")
                                {
                                    slide_rids.push(attr.unescape_value().map_err(|e| Error::Xml(e.to_string()))?.into_owned());
                                }
                            }
                        },
                        b"sldSz" => {
                            for attr in e.attributes() {
                                let attr = attr?;
                                let value = std::str::from_utf8(&attr.value)
                                    .map_err(|e| Error::Xml(e.to_string()))?
                                    .parse::<i64>()
                                    .ok();
                                match attr.key.as_ref() {
                                    b"cx" => slide_width = value,
                                    b"cy" => slide_height = value,
                                    _ => {},
                                }
                            }
                        },
                        _ => {},
                    }
                },
                Ok(Event::End(e)) if e.local_name().as_ref() == b"sldIdLst" => {
                    in_sld_id_lst = false;
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(e.into()),
                _ => {},
            }
            buf.clear();
        }

        let mut slides = Vec::with_capacity(slide_rids.len());
        for rid in &slide_rids {
            let rel = rels.get(rid).ok_or_else(|| {
                Error::RelationshipNotFound(format!("slide relationship {rid} not in rels"))
            })?;
            slides.push(rel.target_partname()?);
        }

        Ok(Self {
            partname,
            slides,
            slide_width,
            slide_height,
        })
    }

    /// The presentation part's own partname.
    #[inline]
    pub fn partname(&self) -> &PackUri {
        &self.partname
    }

    /// Number of slides in the deck.
    #[inline]
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Partname of the 1-based `number`-th slide.
    pub fn slide_partname(&self, number: usize) -> Result<&PackUri> {
        if number == 0 || number > self.slides.len() {
            return Err(Error::SlideOutOfRange {
                slide: number,
                count: self.slides.len(),
            });
        }
        Ok(&self.slides[number - 1])
    }

    /// Slide width in EMUs, when the deck declares one.
    #[inline]
    pub fn slide_width(&self) -> Option<i64> {
        self.slide_width
    }

    /// Slide height in EMUs, when the deck declares one.
    #[inline]
    pub fn slide_height(&self) -> Option<i64> {
        self.slide_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opc::package::tests::mini_package;

    fn package_with_two_slides() -> OpcPackage {
        OpcPackage::from_bytes(mini_package(&[
            (
                "[Content_Types].xml",
                r#"<?xml version="1.0"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
  <Override PartName="/ppt/slides/slide1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>
  <Override PartName="/ppt/slides/slide2.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>
</Types>"#,
            ),
            (
                "_rels/.rels",
                r#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>
</Relationships>"#,
            ),
            (
                "ppt/presentation.xml",
                r#"<?xml version="1.0"?>
<p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <p:sldIdLst><p:sldId id="256" r:id="rId2"/><p:sldId id="257" r:id="rId3"/></p:sldIdLst>
  <p:sldSz cx="12192000" cy="6858000"/>
</p:presentation>"#,
            ),
            (
                "ppt/_rels/presentation.xml.rels",
                r#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide1.xml"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide2.xml"/>
</Relationships>"#,
            ),
            ("ppt/slides/slide1.xml", "<p:sld/>"),
            ("ppt/slides/slide2.xml", "<p:sld/>"),
        ]))
        .unwrap()
    }

    #[test]
    fn test_slides_in_sld_id_lst_order() {
        let opc = package_with_two_slides();
        let pres =
            Presentation::load(&opc, PackUri::new("/ppt/presentation.xml").unwrap()).unwrap();
        assert_eq!(pres.slide_count(), 2);
        assert_eq!(
            pres.slide_partname(1).unwrap().as_str(),
            "/ppt/slides/slide1.xml"
        );
        assert_eq!(
            pres.slide_partname(2).unwrap().as_str(),
            "/ppt/slides/slide2.xml"
        );
    }

    #[test]
    fn test_slide_size() {
        let opc = package_with_two_slides();
        let pres =
            Presentation::load(&opc, PackUri::new("/ppt/presentation.xml").unwrap()).unwrap();
        assert_eq!(pres.slide_width(), Some(12_192_000));
        assert_eq!(pres.slide_height(), Some(6_858_000));
    }

    #[test]
    fn test_slide_out_of_range() {
        let opc = package_with_two_slides();
        let pres =
            Presentation::load(&opc, PackUri::new("/ppt/presentation.xml").unwrap()).unwrap();
        assert!(matches!(
            pres.slide_partname(3),
            Err(Error::SlideOutOfRange { slide: 3, count: 2 })
        ));
        assert!(pres.slide_partname(0).is_err());
    }
}
