//! Package implementation for PowerPoint presentations.
//!
//! The main entry point for working with the template deck: open and verify
//! a `.pptx`, address slides by 1-based number, and save the mutated result.

use crate::error::{Error, Result};
use crate::opc::constants::{content_type as ct, relationship_type as rt};
use crate::opc::{OpcPackage, PackUri};
use crate::pptx::picture;
use crate::pptx::presentation::Presentation;
use crate::pptx::textframe::{self, push_event};
use chrono::Utc;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::io::{Read, Seek};
use std::path::Path;

/// A PowerPoint (.pptx) package.
///
/// Wraps an OPC package and resolves the presentation part once on open.
/// Slide numbers and text-box ordinals are 1-based throughout, matching how
/// the template is addressed.
///
/// # Examples
///
/// ```rust,no_run
/// use genedeck::pptx::Package;
/// use genedeck::units::inches;
///
/// let mut pkg = Package::open("powerpoints/input.pptx")?;
/// pkg.replace_text_box(1, 1, "P04637")?;
/// let png = std::fs::read("scratch/rna_plot.png")?;
/// pkg.add_picture(4, &png, "RNA chart", inches(11.0), inches(3.0), inches(8.0), inches(6.0))?;
/// pkg.save("powerpoints/P04637_SUMMARY.pptx")?;
/// # Ok::<(), genedeck::Error>(())
/// ```
pub struct Package {
    opc: OpcPackage,
    presentation: Presentation,
}

impl Package {
    /// Open a `.pptx` package from a file path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_opc(OpcPackage::open(path)?)
    }

    /// Open a `.pptx` package from a reader.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        Self::from_opc(OpcPackage::from_reader(reader)?)
    }

    /// Open a `.pptx` package from owned bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_opc(OpcPackage::from_bytes(data)?)
    }

    fn from_opc(opc: OpcPackage) -> Result<Self> {
        let (partname, content_type) = opc.main_document_part()?;

        // Support both regular and macro-enabled presentations
        if content_type != ct::PML_PRESENTATION_MAIN && content_type != ct::PML_PRES_MACRO_MAIN {
            return Err(Error::InvalidContentType {
                expected: format!(
                    "{} or {}",
                    ct::PML_PRESENTATION_MAIN,
                    ct::PML_PRES_MACRO_MAIN
                ),
                got: content_type,
            });
        }

        let presentation = Presentation::load(&opc, partname)?;
        Ok(Self { opc, presentation })
    }

    /// The resolved presentation part.
    #[inline]
    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    /// The underlying OPC package.
    #[inline]
    pub fn opc_package(&self) -> &OpcPackage {
        &self.opc
    }

    /// The text of every text-bearing shape on a slide, in ordinal order.
    pub fn text_boxes(&self, slide: usize) -> Result<Vec<String>> {
        let partname = self.presentation.slide_partname(slide)?;
        textframe::text_boxes(self.opc.part(partname)?)
    }

    /// Replace the `ordinal`-th text box on a slide, keeping the first
    /// run's formatting.
    pub fn replace_text_box(&mut self, slide: usize, ordinal: usize, new_text: &str) -> Result<()> {
        let partname = self.presentation.slide_partname(slide)?.clone();
        let xml = self.opc.part(&partname)?;

        match textframe::replace_text_box(xml, ordinal, new_text)? {
            Some(updated) => self.opc.set_part(&partname, updated),
            None => Err(Error::TextBoxNotFound { slide, ordinal }),
        }
    }

    /// Embed PNG bytes as a picture on a slide.
    ///
    /// Registers a new `/ppt/media` part and an image relationship, then
    /// appends a `p:pic` shape at the given EMU position and extent.
    pub fn add_picture(
        &mut self,
        slide: usize,
        png: &[u8],
        description: &str,
        x: i64,
        y: i64,
        width: i64,
        height: i64,
    ) -> Result<()> {
        let slide_partname = self.presentation.slide_partname(slide)?.clone();

        let idx = self.opc.next_partname_idx("/ppt/media", "image");
        let media_partname = PackUri::new(format!("/ppt/media/image{idx}.png"))?;
        self.opc
            .add_part_with_default(media_partname.clone(), ct::PNG, png.to_vec());

        let mut rels = self.opc.part_rels(&slide_partname)?;
        let target_ref = media_partname.relative_ref(slide_partname.base_uri());
        let rel_id = rels.get_or_add(rt::IMAGE, &target_ref);
        self.opc.set_part_rels(&slide_partname, &rels)?;

        let slide_xml = self.opc.part(&slide_partname)?;
        let shape_id = picture::next_shape_id(slide_xml)?;
        let pic = picture::pic_xml(shape_id, &rel_id, description, x, y, width, height);
        let updated = picture::append_to_sp_tree(slide_xml, &pic)?;
        self.opc.set_part(&slide_partname, updated)
    }

    /// Write the package to a file, refreshing `dcterms:modified` in the
    /// core properties when the part is present.
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.refresh_core_properties()?;
        self.opc.save(path)
    }

    /// Serialize the package to bytes, refreshing core properties first.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.refresh_core_properties()?;
        self.opc.to_bytes()
    }

    fn refresh_core_properties(&mut self) -> Result<()> {
        let partname = match self
            .opc
            .package_rels()?
            .part_with_reltype(rt::CORE_PROPERTIES)
        {
            Ok(rel) => rel.target_partname()?,
            // A template without core properties is left as it is
            Err(_) => return Ok(()),
        };
        if !self.opc.contains(&partname) {
            return Ok(());
        }

        let stamp = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let updated = set_modified(self.opc.part(&partname)?, &stamp)?;
        self.opc.set_part(&partname, updated)
    }
}

/// Rewrite the text content of `dcterms:modified` in a core-properties part.
fn set_modified(xml: &[u8], stamp: &str) -> Result<Vec<u8>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut out = Vec::with_capacity(xml.len());
    let mut in_modified = false;

    loop {
        {
            let event = reader.read_event_into(&mut buf)?;
            match &event {
                Event::Start(e) => {
                    let qname = e.name().as_ref().to_vec();
                    push_event(&event, &mut out);
                    if qname == b"dcterms:modified" {
                        in_modified = true;
                        out.extend_from_slice(stamp.as_bytes());
                    }
                },
                Event::Text(_) | Event::GeneralRef(_) if in_modified => {},
                Event::End(e) => {
                    if e.name().as_ref() == b"dcterms:modified" {
                        in_modified = false;
                    }
                    push_event(&event, &mut out);
                },
                Event::Eof => break,
                other => push_event(other, &mut out),
            }
        }
        buf.clear();
    }

    Ok(out)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::opc::package::tests::mini_package;
    use crate::pptx::textframe::tests::SLIDE_XML;

    /// A two-slide deck whose first slide carries the text-box fixture.
    pub(crate) fn sample_deck() -> Vec<u8> {
        let slide2 = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/></p:spTree></p:cSld></p:sld>"#;
        mini_package(&[
            (
                "[Content_Types].xml",
                r#"<?xml version="1.0"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
  <Override PartName="/ppt/slides/slide1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>
  <Override PartName="/ppt/slides/slide2.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>
  <Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
</Types>"#,
            ),
            (
                "_rels/.rels",
                r#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
</Relationships>"#,
            ),
            (
                "ppt/presentation.xml",
                r#"<?xml version="1.0"?>
<p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><p:sldIdLst><p:sldId id="256" r:id="rId2"/><p:sldId id="257" r:id="rId3"/></p:sldIdLst><p:sldSz cx="12192000" cy="6858000"/></p:presentation>"#,
            ),
            (
                "ppt/_rels/presentation.xml.rels",
                r#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide1.xml"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide2.xml"/>
</Relationships>"#,
            ),
            ("ppt/slides/slide1.xml", SLIDE_XML),
            ("ppt/slides/slide2.xml", slide2),
            (
                "docProps/core.xml",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dc:title>Template</dc:title><dcterms:modified xsi:type="dcterms:W3CDTF">2020-01-01T00:00:00Z</dcterms:modified></cp:coreProperties>"#,
            ),
        ])
    }

    #[test]
    fn test_open_verifies_content_type() {
        let pkg = Package::from_bytes(sample_deck()).unwrap();
        assert_eq!(pkg.presentation().slide_count(), 2);
    }

    #[test]
    fn test_rejects_non_presentation() {
        let data = mini_package(&[
            (
                "[Content_Types].xml",
                r#"<?xml version="1.0"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#,
            ),
            (
                "_rels/.rels",
                r#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#,
            ),
            ("word/document.xml", "<w:document/>"),
        ]);
        assert!(matches!(
            Package::from_bytes(data),
            Err(Error::InvalidContentType { .. })
        ));
    }

    #[test]
    fn test_replace_text_box_round_trip() {
        let mut pkg = Package::from_bytes(sample_deck()).unwrap();
        pkg.replace_text_box(1, 1, "P04637").unwrap();

        let reopened = Package::from_bytes(pkg.to_bytes().unwrap()).unwrap();
        let boxes = reopened.text_boxes(1).unwrap();
        assert_eq!(boxes[0], "P04637");
    }

    #[test]
    fn test_replace_text_box_errors() {
        let mut pkg = Package::from_bytes(sample_deck()).unwrap();
        assert!(matches!(
            pkg.replace_text_box(1, 9, "x"),
            Err(Error::TextBoxNotFound { slide: 1, ordinal: 9 })
        ));
        assert!(matches!(
            pkg.replace_text_box(7, 1, "x"),
            Err(Error::SlideOutOfRange { slide: 7, count: 2 })
        ));
    }

    #[test]
    fn test_add_picture_registers_part_rel_and_shape() {
        let mut pkg = Package::from_bytes(sample_deck()).unwrap();
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        pkg.add_picture(2, &png, "RNA chart", 0, 0, 914_400, 914_400)
            .unwrap();

        let media = PackUri::new("/ppt/media/image1.png").unwrap();
        assert_eq!(pkg.opc_package().part(&media).unwrap(), &png);

        let slide_pn = PackUri::new("/ppt/slides/slide2.xml").unwrap();
        let rels = pkg.opc_package().part_rels(&slide_pn).unwrap();
        let rel = rels.part_with_reltype(rt::IMAGE).unwrap();
        assert_eq!(rel.target_partname().unwrap(), media);

        let slide_xml = String::from_utf8(pkg.opc_package().part(&slide_pn).unwrap().to_vec()).unwrap();
        assert!(slide_xml.contains(r#"<a:blip r:embed="rId1"/>"#));
        assert!(slide_xml.contains("</p:pic></p:spTree>"));

        // Second picture gets the next media index and shape id
        pkg.add_picture(2, &png, "protein chart", 0, 0, 1, 1).unwrap();
        let media2 = PackUri::new("/ppt/media/image2.png").unwrap();
        assert!(pkg.opc_package().contains(&media2));
    }

    #[test]
    fn test_save_and_reopen() {
        let mut pkg = Package::from_bytes(sample_deck()).unwrap();
        pkg.replace_text_box(1, 1, "saved").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pptx");
        pkg.save(&path).unwrap();

        let reopened = Package::open(&path).unwrap();
        assert_eq!(reopened.text_boxes(1).unwrap()[0], "saved");
    }

    #[test]
    fn test_save_refreshes_modified_stamp() {
        let mut pkg = Package::from_bytes(sample_deck()).unwrap();
        let bytes = pkg.to_bytes().unwrap();
        let reopened = OpcPackage::from_bytes(bytes).unwrap();
        let core = PackUri::new("/docProps/core.xml").unwrap();
        let xml = String::from_utf8(reopened.part(&core).unwrap().to_vec()).unwrap();
        assert!(!xml.contains("2020-01-01T00:00:00Z"));
        assert!(xml.contains("<dc:title>Template</dc:title>"));
        assert!(xml.contains(r#"<dcterms:modified xsi:type="dcterms:W3CDTF">"#));
    }
}
