//! Literal-colored document → themeable document.

use super::document::{AspectFit, Dimension, Shape, VectorDocument};
use super::style::{StyleRule, parse_declarations, write_declarations};
use crate::image::color::Color;

/// Elements dropped together with their subtree.
const EXECUTABLE_ELEMENTS: &[&str] = &["script", "foreignObject"];

/// Paint properties owned by the style rule after theming.
const PAINT_PROPERTIES: &[&str] = &["fill", "stroke", "stroke-width"];

/// Inherited properties that mean the same on `*` as on any narrower
/// selector.
const INHERITED_PROPERTIES: &[&str] = &[
    "clip-rule",
    "color",
    "fill-opacity",
    "fill-rule",
    "paint-order",
    "shape-rendering",
    "stroke-dasharray",
    "stroke-dashoffset",
    "stroke-linecap",
    "stroke-linejoin",
    "stroke-miterlimit",
    "stroke-opacity",
    "visibility",
];

/// Rewrite `doc` so its color comes from the `primary` slot, falling back
/// to `fallback` when the slot is unassigned.
///
/// Executable content is removed, literal paint is stripped from every
/// element and the viewport is set to fill its container.
pub fn make_themeable(mut doc: VectorDocument, fallback: Color) -> VectorDocument {
    strip_executable(&mut doc.shapes);
    doc.for_each_shape_mut(|shape| {
        strip_attrs(&mut shape.attrs);
    });
    strip_attrs(&mut doc.root_attrs);

    let mut rule = StyleRule::themed(fallback);
    if let Some(existing) = doc.style.take() {
        // Non-inherited extras would compound through nested groups on `*`.
        let widened = existing.selector != rule.selector;
        rule.extra = existing
            .extra
            .into_iter()
            .filter(|(name, _)| !PAINT_PROPERTIES.contains(&name.as_str()))
            .filter(|(name, _)| !widened || INHERITED_PROPERTIES.contains(&name.as_str()))
            .collect();
    }
    doc.style = Some(rule);

    doc.frame.view_box = doc.frame.coordinate_frame();
    doc.frame.width = Some(Dimension::FULL);
    doc.frame.height = Some(Dimension::FULL);
    doc.frame.aspect = Some(AspectFit::Slice);
    doc
}

fn strip_executable(shapes: &mut Vec<Shape>) {
    shapes.retain(|shape| !EXECUTABLE_ELEMENTS.contains(&shape.tag.as_str()));
    for shape in shapes {
        strip_executable(&mut shape.children);
    }
}

fn strip_attrs(attrs: &mut Vec<(String, String)>) {
    attrs.retain(|(name, value)| {
        let lower = name.to_ascii_lowercase();
        !(lower.starts_with("on")
            || PAINT_PROPERTIES.contains(&lower.as_str())
            || (is_href(&lower) && is_javascript_url(value)))
    });

    let Some(index) = attrs.iter().position(|(name, _)| name == "style") else {
        return;
    };
    let kept: Vec<_> = parse_declarations(&attrs[index].1)
        .into_iter()
        .filter(|(name, _)| !PAINT_PROPERTIES.contains(&name.as_str()))
        .collect();
    if kept.is_empty() {
        attrs.remove(index);
    } else {
        attrs[index].1 = write_declarations(&kept);
    }
}

fn is_href(name: &str) -> bool {
    name == "href" || name.ends_with(":href")
}

fn is_javascript_url(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect();
    compact.to_ascii_lowercase().starts_with("javascript:")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::svg::document::{Frame, ViewBox};
    use crate::image::svg::parse::parse_document;
    use crate::image::svg::write::write_document;

    const FALLBACK: Color = Color::rgb(0x2d, 0x5b, 0xff);

    fn literal_svg() -> &'static str {
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="120" height="80" fill="#111111" onload="evil()">
  <script>alert(1)</script>
  <g stroke="#000000" stroke-width="3">
    <path d="M0 0L10 10" fill="#000000" style="fill:#000000;opacity:0.8" onclick="x()"/>
    <foreignObject><div/></foreignObject>
  </g>
  <a href=" JavaScript:alert(1)"><circle r="4" fill="red"/></a>
  <a href="https://example.com"><rect width="2" height="2"/></a>
</svg>"##
    }

    #[test]
    fn test_single_primary_binding_and_no_literal_fill() {
        let doc = make_themeable(parse_document(literal_svg()).unwrap(), FALLBACK);

        let rule = doc.style.as_ref().unwrap();
        assert_eq!(rule.primary_bindings(), 1);
        assert!(doc.is_themeable());

        doc.for_each_shape(|shape| {
            assert!(shape.attr("fill").is_none(), "{} kept fill", shape.tag);
            assert!(shape.attr("stroke").is_none());
            assert!(shape.attr("stroke-width").is_none());
        });

        let svg = write_document(&doc).unwrap();
        assert_eq!(svg.matches("--svg-primary").count(), 1);
        assert!(!svg.contains("fill=\""));
    }

    #[test]
    fn test_strips_executable_content() {
        let doc = make_themeable(parse_document(literal_svg()).unwrap(), FALLBACK);
        let svg = write_document(&doc).unwrap();
        assert!(!svg.contains("<script"));
        assert!(!svg.contains("foreignObject"));
        assert!(!svg.contains("onclick"));
        assert!(!svg.contains("onload"));
        assert!(!svg.to_ascii_lowercase().contains("javascript:"));
        assert!(svg.contains(r#"href="https://example.com""#));
    }

    #[test]
    fn test_inline_style_keeps_other_declarations() {
        let doc = make_themeable(parse_document(literal_svg()).unwrap(), FALLBACK);
        let path = &doc.shapes[0].children[0];
        assert_eq!(path.attr("style"), Some("opacity:0.8"));
    }

    #[test]
    fn test_frame_synthesized_from_size() {
        let doc = make_themeable(parse_document(literal_svg()).unwrap(), FALLBACK);
        assert_eq!(doc.frame.view_box, Some(ViewBox::new(0.0, 0.0, 120.0, 80.0)));
        assert_eq!(doc.frame.width, Some(Dimension::FULL));
        assert_eq!(doc.frame.height, Some(Dimension::FULL));
        assert_eq!(doc.frame.aspect, Some(AspectFit::Slice));
    }

    #[test]
    fn test_existing_view_box_kept() {
        let doc = VectorDocument::new(
            Frame {
                view_box: Some(ViewBox::new(-5.0, -5.0, 10.0, 10.0)),
                width: Some(Dimension::Px(300.0)),
                ..Frame::default()
            },
            vec![Shape::new("path").with_attr("fill", "#000000")],
        );
        let doc = make_themeable(doc, FALLBACK);
        assert_eq!(doc.frame.view_box, Some(ViewBox::new(-5.0, -5.0, 10.0, 10.0)));
    }

    #[test]
    fn test_widened_rule_keeps_only_inherited_declarations() {
        let svg = r#"<svg viewBox="0 0 1 1"><style>path{fill:#000000;opacity:0.5;fill-rule:evenodd}</style><g><path d="M0 0"/></g></svg>"#;
        let doc = make_themeable(parse_document(svg).unwrap(), FALLBACK);
        let rule = doc.style.unwrap();
        assert_eq!(rule.selector, "*");
        assert_eq!(rule.extra, vec![("fill-rule".to_string(), "evenodd".to_string())]);
        assert!(!rule.to_css().contains("opacity"));
    }

    #[test]
    fn test_universal_rule_keeps_its_declarations() {
        let svg = r#"<svg viewBox="0 0 1 1"><style>*{fill:#000000;opacity:0.5}</style><path d="M0 0"/></svg>"#;
        let doc = make_themeable(parse_document(svg).unwrap(), FALLBACK);
        let rule = doc.style.unwrap();
        assert_eq!(rule.extra, vec![("opacity".to_string(), "0.5".to_string())]);
    }
}
