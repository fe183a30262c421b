//! Picture shapes: `p:pic` element emission and shape-tree insertion.

use crate::error::Result;
use crate::pptx::textframe::escape_xml;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::fmt::Write as FmtWrite;

/// Build a `p:pic` element referencing an image relationship.
///
/// Position and extent are in EMUs. The picture is stretched to fill the
/// given frame.
pub(crate) fn pic_xml(
    shape_id: u32,
    rel_id: &str,
    description: &str,
    x: i64,
    y: i64,
    width: i64,
    height: i64,
) -> String {
    let mut xml = String::new();

    xml.push_str("<p:pic>");
    xml.push_str("<p:nvPicPr>");
    let _ = write!(
        xml,
        r#"<p:cNvPr id="{}" name="Picture {}" descr="{}"/>"#,
        shape_id,
        shape_id,
        escape_xml(description)
    );
    xml.push_str(r#"<p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr>"#);
    xml.push_str("<p:nvPr/>");
    xml.push_str("</p:nvPicPr>");

    xml.push_str("<p:blipFill>");
    let _ = write!(xml, r#"<a:blip r:embed="{rel_id}"/>"#);
    xml.push_str("<a:stretch><a:fillRect/></a:stretch>");
    xml.push_str("</p:blipFill>");

    xml.push_str("<p:spPr>");
    xml.push_str("<a:xfrm>");
    let _ = write!(xml, r#"<a:off x="{x}" y="{y}"/>"#);
    let _ = write!(xml, r#"<a:ext cx="{width}" cy="{height}"/>"#);
    xml.push_str("</a:xfrm>");
    xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom>"#);
    xml.push_str("</p:spPr>");
    xml.push_str("</p:pic>");

    xml
}

/// Append a shape fragment to the end of the slide's shape tree.
///
/// The fragment lands immediately before `</p:spTree>`, after every
/// existing shape, so z-order puts it on top.
pub(crate) fn append_to_sp_tree(slide_xml: &[u8], fragment: &str) -> Result<Vec<u8>> {
    let close = find_sp_tree_close(slide_xml)?;
    let mut out = Vec::with_capacity(slide_xml.len() + fragment.len());
    out.extend_from_slice(&slide_xml[..close]);
    out.extend_from_slice(fragment.as_bytes());
    out.extend_from_slice(&slide_xml[close..]);
    Ok(out)
}

/// Byte offset of the `</p:spTree>` end tag.
fn find_sp_tree_close(slide_xml: &[u8]) -> Result<usize> {
    let mut reader = Reader::from_reader(slide_xml);
    let mut buf = Vec::new();

    loop {
        let tag_start = reader.buffer_position() as usize;
        match reader.read_event_into(&mut buf) {
            Ok(Event::End(e)) if e.local_name().as_ref() == b"spTree" => {
                return Ok(tag_start);
            },
            Ok(Event::Eof) => {
                return Err(crate::error::Error::Xml(
                    "slide has no p:spTree element".to_string(),
                ));
            },
            Err(e) => return Err(e.into()),
            _ => {},
        }
        buf.clear();
    }
}

/// Next free shape id on the slide: one past the largest `cNvPr` id.
pub(crate) fn next_shape_id(slide_xml: &[u8]) -> Result<u32> {
    let mut reader = Reader::from_reader(slide_xml);
    let mut buf = Vec::new();
    let mut max_id = 0u32;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e))
                if e.local_name().as_ref() == b"cNvPr" =>
            {
                for attr in e.attributes() {
                    let attr = attr?;
                    if attr.key.as_ref() == b"id" {
                        if let Ok(id) = std::str::from_utf8(&attr.value)
                            .unwrap_or("")
                            .parse::<u32>()
                        {
                            max_id = max_id.max(id);
                        }
                    }
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {},
        }
        buf.clear();
    }

    Ok(max_id + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pptx::textframe::tests::SLIDE_XML;
    use crate::pptx::textframe::text_boxes;

    #[test]
    fn test_pic_xml_layout() {
        let xml = pic_xml(7, "rId4", "RNA expression", 914_400, 0, 1_828_800, 914_400);
        assert!(xml.contains(r#"<p:cNvPr id="7" name="Picture 7" descr="RNA expression"/>"#));
        assert!(xml.contains(r#"<a:blip r:embed="rId4"/>"#));
        assert!(xml.contains(r#"<a:off x="914400" y="0"/>"#));
        assert!(xml.contains(r#"<a:ext cx="1828800" cy="914400"/>"#));
    }

    #[test]
    fn test_append_lands_inside_sp_tree() {
        let fragment = pic_xml(9, "rId4", "chart", 0, 0, 10, 10);
        let out = append_to_sp_tree(SLIDE_XML.as_bytes(), &fragment).unwrap();
        let text = String::from_utf8(out.clone()).unwrap();

        let pic_at = text.find("<p:pic>").unwrap();
        let close_at = text.find("</p:spTree>").unwrap();
        assert!(pic_at < close_at);

        // Adding a picture does not disturb text-box ordinals
        let boxes = text_boxes(&out).unwrap();
        assert_eq!(boxes.len(), 2);
    }

    #[test]
    fn test_next_shape_id() {
        assert_eq!(next_shape_id(SLIDE_XML.as_bytes()).unwrap(), 5);
    }
}
