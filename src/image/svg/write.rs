//! [`VectorDocument`] → SVG text.
//!
//! Two encodings: the stored one keeps the style rule and the declared
//! frame; the render one bakes resolved colors into every shape and sizes
//! the viewport to the viewBox so the renderer can apply its own fit.

use std::io::Cursor;

use quick_xml::{
    Writer,
    events::{BytesEnd, BytesStart, BytesText, Event},
};

use super::DocumentError;
use super::document::{Shape, VectorDocument, ViewBox, format_number};
use super::style::{Paint, StyleRule, parse_declarations, write_declarations};
use crate::image::color::ColorSlotAssignment;

pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

type SvgWriter = Writer<Cursor<Vec<u8>>>;

/// Encode a document for storage.
pub fn write_document(doc: &VectorDocument) -> Result<String, DocumentError> {
    let mut root = root_element(doc);
    if let Some(view_box) = doc.frame.view_box {
        root.push_attribute(("viewBox", view_box.to_string().as_str()));
    }
    if let Some(width) = doc.frame.width {
        root.push_attribute(("width", width.to_string().as_str()));
    }
    if let Some(height) = doc.frame.height {
        root.push_attribute(("height", height.to_string().as_str()));
    }
    if let Some(aspect) = doc.frame.aspect {
        root.push_attribute(("preserveAspectRatio", aspect.as_str()));
    }
    push_root_attrs(&mut root, doc);

    let mut writer = Writer::new(Cursor::new(Vec::new()));
    write(&mut writer, Event::Start(root))?;
    if let Some(rule) = &doc.style {
        write(&mut writer, Event::Start(BytesStart::new("style")))?;
        write(&mut writer, Event::Text(BytesText::new(&rule.to_css())))?;
        write(&mut writer, Event::End(BytesEnd::new("style")))?;
    }
    for shape in &doc.shapes {
        write_shape(&mut writer, shape)?;
    }
    write(&mut writer, Event::End(BytesEnd::new("svg")))?;
    finish(writer)
}

/// Encode a document for the renderer, with slots resolved against
/// `assignment`.
///
/// Returns the SVG text and the coordinate frame it was laid out in.
pub fn write_for_render(
    doc: &VectorDocument,
    assignment: &ColorSlotAssignment,
) -> Result<(String, ViewBox), DocumentError> {
    let frame = doc
        .frame
        .coordinate_frame()
        .ok_or(DocumentError::MissingFrame)?;
    let rule = doc.style.as_ref().map(|rule| rule.resolve(assignment));

    let mut root = root_element(doc);
    root.push_attribute(("viewBox", frame.to_string().as_str()));
    root.push_attribute(("width", format_number(frame.width).as_str()));
    root.push_attribute(("height", format_number(frame.height).as_str()));
    root.push_attribute(("preserveAspectRatio", "none"));
    push_root_attrs(&mut root, doc);

    let mut writer = Writer::new(Cursor::new(Vec::new()));
    write(&mut writer, Event::Start(root))?;
    for shape in &doc.shapes {
        let mut shape = shape.clone();
        shape.walk_mut(&mut |s| bake_paint(s, rule.as_ref(), assignment));
        write_shape(&mut writer, &shape)?;
    }
    write(&mut writer, Event::End(BytesEnd::new("svg")))?;
    Ok((finish(writer)?, frame))
}

fn root_element(doc: &VectorDocument) -> BytesStart<'static> {
    let mut root = BytesStart::new("svg");
    root.push_attribute(("xmlns", doc.root_attr("xmlns").unwrap_or(SVG_NAMESPACE)));
    root
}

fn push_root_attrs(root: &mut BytesStart<'_>, doc: &VectorDocument) {
    for (name, value) in doc.root_attrs.iter().filter(|(name, _)| name != "xmlns") {
        root.push_attribute((name.as_str(), value.as_str()));
    }
}

/// Apply the resolved rule to a shape and resolve slot references left in
/// its own attributes.
fn bake_paint(shape: &mut Shape, rule: Option<&StyleRule>, assignment: &ColorSlotAssignment) {
    for name in ["fill", "stroke"] {
        let slot_paint = shape
            .attr(name)
            .map(Paint::parse)
            .filter(|paint| paint.slot().is_some());
        if let Some(paint) = slot_paint {
            shape.set_attr(name, paint.resolve(assignment).to_string());
        }
    }

    let Some(rule) = rule.filter(|rule| selector_matches(&rule.selector, &shape.tag)) else {
        return;
    };
    let mut overridden = Vec::new();
    if let Some(fill) = &rule.fill {
        shape.set_attr("fill", fill.to_string());
        overridden.push("fill");
    }
    if let Some(stroke) = &rule.stroke {
        shape.set_attr("stroke", stroke.to_string());
        overridden.push("stroke");
    }
    for (name, value) in &rule.extra {
        shape.set_attr(name.as_str(), value.as_str());
        overridden.push(name.as_str());
    }

    // Inline declarations would beat the attributes just set.
    if let Some(inline) = shape.attr("style") {
        let kept: Vec<_> = parse_declarations(inline)
            .into_iter()
            .filter(|(name, _)| !overridden.contains(&name.as_str()))
            .collect();
        if kept.is_empty() {
            shape.remove_attr("style");
        } else {
            shape.set_attr("style", write_declarations(&kept));
        }
    }
}

/// Type selectors only: `*`, `path`, `path, circle`.
fn selector_matches(selector: &str, tag: &str) -> bool {
    selector
        .split(',')
        .map(str::trim)
        .any(|part| part == "*" || part == tag)
}

fn write_shape(writer: &mut SvgWriter, shape: &Shape) -> Result<(), DocumentError> {
    let mut start = BytesStart::new(shape.tag.as_str());
    for (name, value) in &shape.attrs {
        start.push_attribute((name.as_str(), value.as_str()));
    }
    if shape.children.is_empty() && shape.text.is_none() {
        return write(writer, Event::Empty(start));
    }

    write(writer, Event::Start(start))?;
    if let Some(text) = &shape.text {
        write(writer, Event::Text(BytesText::new(text)))?;
    }
    for child in &shape.children {
        write_shape(writer, child)?;
    }
    write(writer, Event::End(BytesEnd::new(shape.tag.as_str())))
}

fn write(writer: &mut SvgWriter, event: Event<'_>) -> Result<(), DocumentError> {
    writer
        .write_event(event)
        .map_err(|e| DocumentError::Write(e.to_string()))
}

fn finish(writer: SvgWriter) -> Result<String, DocumentError> {
    String::from_utf8(writer.into_inner().into_inner())
        .map_err(|e| DocumentError::Write(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::color::Color;
    use crate::image::svg::document::{AspectFit, Dimension, Frame};
    use crate::image::svg::parse::parse_document;

    fn themed_doc() -> VectorDocument {
        VectorDocument {
            frame: Frame {
                view_box: Some(ViewBox::new(0.0, 0.0, 20.0, 10.0)),
                width: Some(Dimension::FULL),
                height: Some(Dimension::FULL),
                aspect: Some(AspectFit::Slice),
            },
            root_attrs: vec![("version".to_string(), "1.1".to_string())],
            shapes: vec![
                Shape::new("path")
                    .with_attr("d", "M0 0L20 10Z")
                    .with_attr("style", "fill:#ff0000;opacity:0.5"),
            ],
            style: Some(StyleRule::themed(Color::rgb(0x2d, 0x5b, 0xff))),
        }
    }

    #[test]
    fn test_stored_encoding() {
        let svg = write_document(&themed_doc()).unwrap();
        assert!(svg.starts_with(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 20 10" width="100%" height="100%" preserveAspectRatio="xMidYMid slice" version="1.1">"#
        ));
        assert!(svg.contains("<style>*{fill:var(--svg-primary, #2d5bff) !important;"));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn test_stored_encoding_parses_back() {
        let doc = themed_doc();
        let parsed = parse_document(&write_document(&doc).unwrap()).unwrap();
        assert_eq!(parsed.frame, doc.frame);
        assert_eq!(parsed.style, doc.style);
        assert_eq!(parsed.shapes, doc.shapes);
    }

    #[test]
    fn test_render_encoding_bakes_colors() {
        let assignment = ColorSlotAssignment::primary(Color::rgb(0x11, 0x22, 0x33));
        let (svg, frame) = write_for_render(&themed_doc(), &assignment).unwrap();
        assert_eq!(frame, ViewBox::new(0.0, 0.0, 20.0, 10.0));
        assert!(svg.contains(r#"width="20" height="10" preserveAspectRatio="none""#));
        assert!(!svg.contains("<style>"));

        let parsed = parse_document(&svg).unwrap();
        let path = &parsed.shapes[0];
        assert_eq!(path.attr("fill"), Some("#112233"));
        assert_eq!(path.attr("stroke"), Some("none"));
        assert_eq!(path.attr("style"), Some("opacity:0.5"));
    }

    #[test]
    fn test_render_encoding_resolves_attribute_slots() {
        let doc = VectorDocument::new(
            Frame::pixels(4.0, 4.0),
            vec![Shape::new("rect").with_attr("fill", "var(--svg-secondary, #000000)")],
        );
        let (svg, _) = write_for_render(&doc, &ColorSlotAssignment::new()).unwrap();
        assert!(svg.contains(r##"fill="#000000""##));
    }

    #[test]
    fn test_render_encoding_requires_frame() {
        let doc = VectorDocument::new(Frame::default(), vec![]);
        assert!(matches!(
            write_for_render(&doc, &ColorSlotAssignment::new()),
            Err(DocumentError::MissingFrame)
        ));
    }
}
