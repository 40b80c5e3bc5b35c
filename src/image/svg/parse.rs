//! SVG text → [`VectorDocument`].

use quick_xml::{
    Reader,
    escape::unescape,
    events::{BytesStart, Event},
};

use super::DocumentError;
use super::document::{AspectFit, Dimension, Frame, Shape, VectorDocument, ViewBox};
use super::style::StyleRule;

/// Parse SVG bytes, which must be UTF-8.
pub fn parse_document_bytes(bytes: &[u8]) -> Result<VectorDocument, DocumentError> {
    let text = std::str::from_utf8(bytes).map_err(|_| DocumentError::InvalidUtf8)?;
    parse_document(text)
}

/// Parse an SVG document.
///
/// The root `<svg>` becomes the frame and root attributes, every other
/// element is kept as an opaque [`Shape`]. A single `<style>` element is
/// lifted into the document's style rule.
pub fn parse_document(svg: &str) -> Result<VectorDocument, DocumentError> {
    let mut reader = Reader::from_str(svg);
    let mut stack: Vec<Shape> = Vec::new();
    let mut doc: Option<VectorDocument> = None;
    let mut style: Option<StyleRule> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(elem)) => {
                let shape = read_element(&elem, reader.buffer_position() as u64)?;
                if stack.is_empty() {
                    check_root(&shape, doc.is_some())?;
                }
                stack.push(shape);
            }
            Ok(Event::Empty(elem)) => {
                let shape = read_element(&elem, reader.buffer_position() as u64)?;
                if stack.is_empty() {
                    check_root(&shape, doc.is_some())?;
                    doc = Some(into_document(shape)?);
                } else {
                    close_element(&mut stack, shape, &mut style)?;
                }
            }
            Ok(Event::End(_)) => {
                let Some(shape) = stack.pop() else {
                    continue;
                };
                if stack.is_empty() {
                    doc = Some(into_document(shape)?);
                } else {
                    close_element(&mut stack, shape, &mut style)?;
                }
            }
            Ok(Event::Text(text)) => {
                let text = text.decode().map_err(|e| DocumentError::Xml {
                    position: reader.buffer_position() as u64,
                    message: e.to_string(),
                })?;
                push_text(&mut stack, &text);
            }
            Ok(Event::CData(data)) => {
                let text = reader.decoder().decode(&data).map_err(|e| DocumentError::Xml {
                    position: reader.buffer_position() as u64,
                    message: e.to_string(),
                })?;
                push_text(&mut stack, &text);
            }
            Ok(Event::GeneralRef(entity)) => {
                let name = entity.decode().map_err(|e| DocumentError::Xml {
                    position: reader.buffer_position() as u64,
                    message: e.to_string(),
                })?;
                let reference = format!("&{name};");
                let resolved = unescape(&reference).map_err(|e| DocumentError::Xml {
                    position: reader.buffer_position() as u64,
                    message: e.to_string(),
                })?;
                push_text(&mut stack, &resolved);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(DocumentError::Xml {
                    position: reader.error_position() as u64,
                    message: e.to_string(),
                });
            }
        }
    }

    if !stack.is_empty() {
        return Err(DocumentError::Xml {
            position: reader.buffer_position() as u64,
            message: "unexpected end of document".to_string(),
        });
    }
    let mut doc = doc.ok_or(DocumentError::Empty)?;
    doc.style = style;
    Ok(doc)
}

fn check_root(shape: &Shape, seen_root: bool) -> Result<(), DocumentError> {
    if seen_root || shape.tag != "svg" {
        return Err(DocumentError::NotSvg(shape.tag.clone()));
    }
    Ok(())
}

fn read_element(elem: &BytesStart<'_>, position: u64) -> Result<Shape, DocumentError> {
    let xml_error = |message: String| DocumentError::Xml { position, message };

    let tag = std::str::from_utf8(elem.name().as_ref())
        .map_err(|e| xml_error(e.to_string()))?
        .to_string();
    let mut shape = Shape::new(tag);

    for attr in elem.attributes() {
        let attr = attr.map_err(|e| xml_error(e.to_string()))?;
        let key = std::str::from_utf8(attr.key.as_ref()).map_err(|e| xml_error(e.to_string()))?;
        let raw = std::str::from_utf8(attr.value.as_ref()).map_err(|e| xml_error(e.to_string()))?;
        let value = unescape(raw).map_err(|e| xml_error(e.to_string()))?;
        shape.attrs.push((key.to_string(), value.into_owned()));
    }
    Ok(shape)
}

/// Attach a finished element to its parent, or lift it into the style rule.
fn close_element(
    stack: &mut [Shape],
    shape: Shape,
    style: &mut Option<StyleRule>,
) -> Result<(), DocumentError> {
    if shape.tag == "style" {
        let css = shape.text.unwrap_or_default();
        if css.trim().is_empty() {
            return Ok(());
        }
        if style.is_some() {
            return Err(DocumentError::UnsupportedStyle);
        }
        *style = Some(StyleRule::parse(&css).ok_or(DocumentError::UnsupportedStyle)?);
        return Ok(());
    }
    if let Some(parent) = stack.last_mut() {
        parent.children.push(shape);
    }
    Ok(())
}

fn push_text(stack: &mut [Shape], text: &str) {
    let Some(current) = stack.last_mut() else {
        return;
    };
    // Indentation between elements is not content.
    if current.text.is_none() && text.trim().is_empty() {
        return;
    }
    current.text.get_or_insert_with(String::new).push_str(text);
}

fn into_document(root: Shape) -> Result<VectorDocument, DocumentError> {
    let mut frame = Frame::default();
    let mut root_attrs = Vec::new();

    for (name, value) in root.attrs {
        match name.as_str() {
            "viewBox" => {
                frame.view_box = Some(ViewBox::parse(&value).ok_or(
                    DocumentError::InvalidAttribute {
                        name: "viewBox",
                        value,
                    },
                )?);
            }
            "width" => {
                frame.width = Some(Dimension::parse(&value).ok_or(
                    DocumentError::InvalidAttribute {
                        name: "width",
                        value,
                    },
                )?);
            }
            "height" => {
                frame.height = Some(Dimension::parse(&value).ok_or(
                    DocumentError::InvalidAttribute {
                        name: "height",
                        value,
                    },
                )?);
            }
            "preserveAspectRatio" => {
                frame.aspect = Some(AspectFit::parse(&value).ok_or(
                    DocumentError::InvalidAttribute {
                        name: "preserveAspectRatio",
                        value,
                    },
                )?);
            }
            _ => root_attrs.push((name, value)),
        }
    }

    Ok(VectorDocument {
        frame,
        root_attrs,
        shapes: root.children,
        style: None,
    })
}
