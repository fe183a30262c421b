//! Shape and run traversal for slide parts.
//!
//! Slides address their placeholders positionally: the N-th text-bearing
//! shape on the slide, counting `p:sp` elements directly under the shape
//! tree whose text frame holds any non-empty text run. Replacing a text
//! box keeps the first run's `a:rPr` element verbatim so the new text
//! inherits the template's formatting.

use crate::error::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// One `p:sp` element directly under the shape tree.
#[derive(Debug, Clone)]
pub(crate) struct ShapeScan {
    /// Text of each paragraph in the shape's text frame
    pub paragraphs: Vec<String>,
    /// Raw XML of the first run's `a:rPr` element in the first paragraph
    pub first_run_props: Option<Vec<u8>>,
}

impl ShapeScan {
    /// Paragraph texts joined with newlines.
    pub fn text(&self) -> String {
        self.paragraphs.join("\n")
    }

    pub fn is_text_bearing(&self) -> bool {
        self.paragraphs.iter().any(|p| !p.is_empty())
    }
}

/// Reconstruct a start tag (attributes kept byte-for-byte as read).
pub(crate) fn push_start(tag: &BytesStart, out: &mut Vec<u8>, self_closing: bool) {
    out.push(b'<');
    out.extend_from_slice(tag.name().as_ref());
    for attr in tag.attributes().flatten() {
        out.push(b' ');
        out.extend_from_slice(attr.key.as_ref());
        out.extend_from_slice(b"=\"");
        out.extend_from_slice(&attr.value);
        out.push(b'"');
    }
    if self_closing {
        out.extend_from_slice(b"/>");
    } else {
        out.push(b'>');
    }
}

/// Reconstruct any event, byte-preserving for text and attributes.
pub(crate) fn push_event(event: &Event, out: &mut Vec<u8>) {
    match event {
        Event::Start(e) => push_start(e, out, false),
        Event::Empty(e) => push_start(e, out, true),
        Event::End(e) => {
            out.extend_from_slice(b"</");
            out.extend_from_slice(e.name().as_ref());
            out.push(b'>');
        },
        Event::Text(t) => out.extend_from_slice(t.as_ref()),
        Event::CData(c) => {
            out.extend_from_slice(b"<![CDATA[");
            out.extend_from_slice(c.as_ref());
            out.extend_from_slice(b"]]>");
        },
        Event::Comment(c) => {
            out.extend_from_slice(b"<!--");
            out.extend_from_slice(c.as_ref());
            out.extend_from_slice(b"-->");
        },
        Event::Decl(_) => {
            out.extend_from_slice(br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        },
        Event::PI(p) => {
            out.extend_from_slice(b"<?");
            out.extend_from_slice(p.as_ref());
            out.extend_from_slice(b"?>");
        },
        Event::DocType(d) => {
            out.extend_from_slice(b"<!DOCTYPE ");
            out.extend_from_slice(d.as_ref());
            out.push(b'>');
        },
        Event::GeneralRef(r) => {
            out.push(b'&');
            out.extend_from_slice(r.as_ref());
            out.push(b';');
        },
        Event::Eof => {},
    }
}

/// Escape XML special characters for text or attribute content.
pub(crate) fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Decode a general entity reference name into its character, when known.
fn decode_entity(name: &[u8]) -> Option<char> {
    match name {
        b"amp" => Some('&'),
        b"lt" => Some('<'),
        b"gt" => Some('>'),
        b"quot" => Some('"'),
        b"apos" => Some('\''),
        _ => {
            let name = std::str::from_utf8(name).ok()?;
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        },
    }
}

/// Scan every `p:sp` directly under the shape tree, in document order.
pub(crate) fn scan_shapes(xml: &[u8]) -> Result<Vec<ShapeScan>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut shapes = Vec::new();
    let mut stack: Vec<Vec<u8>> = Vec::new();

    // Depth of the sp element currently being scanned, if any
    let mut sp_depth: Option<usize> = None;
    let mut current: Option<ShapeScan> = None;
    // First-paragraph / first-run tracking for format capture
    let mut para_seen = false;
    let mut first_para_done = false;
    let mut run_seen = false;
    let mut in_first_run = false;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let local = e.local_name().as_ref().to_vec();
                // Set when a whole subtree was consumed inline, so the
                // element must not land on the open-element stack
                let mut consumed_subtree = false;

                if local == b"sp" && stack.last().map(Vec::as_slice) == Some(b"spTree".as_slice()) {
                    sp_depth = Some(stack.len());
                    current = Some(ShapeScan {
                        paragraphs: Vec::new(),
                        first_run_props: None,
                    });
                    para_seen = false;
                    first_para_done = false;
                    run_seen = false;
                    in_first_run = false;
                } else if let Some(shape) = current.as_mut() {
                    match local.as_slice() {
                        b"p" if stack.last().map(Vec::as_slice) == Some(b"txBody".as_slice()) => {
                            shape.paragraphs.push(String::new());
                            para_seen = true;
                        },
                        b"r" if para_seen
                            && !first_para_done
                            && !run_seen
                            && stack.last().map(Vec::as_slice) == Some(b"p".as_slice()) =>
                        {
                            run_seen = true;
                            in_first_run = true;
                        },
                        b"rPr" if in_first_run && shape.first_run_props.is_none() => {
                            // Capture the whole element verbatim
                            let mut raw = Vec::new();
                            push_start(&e, &mut raw, false);
                            let mut depth = 1usize;
                            let mut inner = Vec::new();
                            while depth > 0 {
                                {
                                    let ev = reader.read_event_into(&mut inner)?;
                                    match &ev {
                                        Event::Start(_) => depth += 1,
                                        Event::End(_) => depth -= 1,
                                        Event::Eof => break,
                                        _ => {},
                                    }
                                    push_event(&ev, &mut raw);
                                }
                                inner.clear();
                            }
                            shape.first_run_props = Some(raw);
                            consumed_subtree = true;
                        },
                        b"t" => in_text = true,
                        _ => {},
                    }
                }

                if !consumed_subtree {
                    stack.push(local);
                }
            },
            Ok(Event::Empty(e)) => {
                if let Some(shape) = current.as_mut() {
                    match e.local_name().as_ref() {
                        b"p" if stack.last().map(Vec::as_slice) == Some(b"txBody".as_slice()) => {
                            shape.paragraphs.push(String::new());
                            if !para_seen {
                                para_seen = true;
                                first_para_done = true;
                            }
                        },
                        b"rPr" if in_first_run && shape.first_run_props.is_none() => {
                            let mut raw = Vec::new();
                            push_start(&e, &mut raw, true);
                            shape.first_run_props = Some(raw);
                        },
                        _ => {},
                    }
                }
            },
            Ok(Event::Text(t)) => {
                if in_text {
                    if let Some(para) = current.as_mut().and_then(|s| s.paragraphs.last_mut()) {
                        let text = std::str::from_utf8(t.as_ref())
                            .map_err(|e| Error::Xml(e.to_string()))?;
                        para.push_str(text);
                    }
                }
            },
            Ok(Event::GeneralRef(r)) => {
                if in_text {
                    if let Some(para) = current.as_mut().and_then(|s| s.paragraphs.last_mut()) {
                        if let Some(c) = decode_entity(r.as_ref()) {
                            para.push(c);
                        }
                    }
                }
            },
            Ok(Event::End(e)) => {
                let local = e.local_name().as_ref().to_vec();
                stack.pop();

                match local.as_slice() {
                    b"t" => in_text = false,
                    b"r" => in_first_run = false,
                    b"p" if para_seen => first_para_done = true,
                    _ => {},
                }

                if let Some(depth) = sp_depth {
                    if local == b"sp" && stack.len() == depth {
                        if let Some(shape) = current.take() {
                            shapes.push(shape);
                        }
                        sp_depth = None;
                    }
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {},
        }
        buf.clear();
    }

    Ok(shapes)
}

/// The text of every text-bearing shape, in ordinal order.
pub(crate) fn text_boxes(xml: &[u8]) -> Result<Vec<String>> {
    Ok(scan_shapes(xml)?
        .iter()
        .filter(|shape| shape.is_text_bearing())
        .map(ShapeScan::text)
        .collect())
}

/// Replace the `ordinal`-th (1-based) text box with a single run holding
/// `new_text` under the captured first-run formatting. `bodyPr` and
/// `lstStyle` are kept; every existing paragraph is removed.
///
/// Returns None when the slide has no such text box.
pub(crate) fn replace_text_box(
    xml: &[u8],
    ordinal: usize,
    new_text: &str,
) -> Result<Option<Vec<u8>>> {
    let shapes = scan_shapes(xml)?;
    if ordinal == 0 {
        return Ok(None);
    }

    // Flat index (among all direct sp children) of the target text box
    let mut remaining = ordinal;
    let mut target_flat_idx = None;
    let mut run_props = None;
    for (idx, shape) in shapes.iter().enumerate() {
        if shape.is_text_bearing() {
            remaining -= 1;
            if remaining == 0 {
                target_flat_idx = Some(idx);
                run_props = shape.first_run_props.clone();
                break;
            }
        }
    }
    let Some(target_flat_idx) = target_flat_idx else {
        return Ok(None);
    };

    let mut paragraph = Vec::new();
    paragraph.extend_from_slice(b"<a:p><a:r>");
    if let Some(props) = &run_props {
        paragraph.extend_from_slice(props);
    }
    paragraph.extend_from_slice(b"<a:t>");
    paragraph.extend_from_slice(escape_xml(new_text).as_bytes());
    paragraph.extend_from_slice(b"</a:t></a:r></a:p>");

    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut out = Vec::with_capacity(xml.len() + paragraph.len());

    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut flat_idx = 0usize;
    let mut sp_depth: Option<usize> = None;
    let mut in_target_sp = false;
    let mut in_target_txbody = false;
    // Depth within a paragraph subtree being dropped
    let mut skip_depth = 0usize;

    loop {
        {
            let event = reader.read_event_into(&mut buf)?;
            match &event {
                Event::Start(e) => {
                    let local = e.local_name().as_ref().to_vec();

                    if skip_depth > 0 {
                        skip_depth += 1;
                        stack.push(local);
                    } else {
                        if local == b"sp"
                            && stack.last().map(Vec::as_slice) == Some(b"spTree".as_slice())
                        {
                            if flat_idx == target_flat_idx {
                                in_target_sp = true;
                                sp_depth = Some(stack.len());
                            }
                            flat_idx += 1;
                        }

                        if in_target_txbody && local == b"p" {
                            skip_depth = 1;
                        } else {
                            push_event(&event, &mut out);
                            if in_target_sp && local == b"txBody" {
                                in_target_txbody = true;
                            }
                        }
                        stack.push(local);
                    }
                },
                Event::Empty(e) => {
                    let drop_paragraph =
                        in_target_txbody && e.local_name().as_ref() == b"p";
                    if skip_depth == 0 && !drop_paragraph {
                        push_event(&event, &mut out);
                    }
                },
                Event::End(e) => {
                    let local = e.local_name().as_ref().to_vec();
                    stack.pop();

                    if skip_depth > 0 {
                        skip_depth -= 1;
                    } else {
                        if in_target_txbody && local == b"txBody" {
                            out.extend_from_slice(&paragraph);
                            in_target_txbody = false;
                        }

                        push_event(&event, &mut out);

                        if let Some(depth) = sp_depth {
                            if local == b"sp" && stack.len() == depth {
                                in_target_sp = false;
                                sp_depth = None;
                            }
                        }
                    }
                },
                Event::Eof => break,
                other => {
                    if skip_depth == 0 {
                        push_event(other, &mut out);
                    }
                },
            }
        }
        buf.clear();
    }

    Ok(Some(out))
}
