//! Structured vector document model.
//!
//! Documents are rewritten through this model only; text is produced and
//! consumed at the boundary by [`super::parse`] and [`super::write`].

use std::fmt;

use super::style::StyleRule;

/// Format a coordinate with up to 3 decimals, trailing zeros trimmed.
pub fn format_number(value: f64) -> String {
    let text = format!("{value:.3}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    match text {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

/// `viewBox` rectangle in document units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    pub const fn new(min_x: f64, min_y: f64, width: f64, height: f64) -> Self {
        Self {
            min_x,
            min_y,
            width,
            height,
        }
    }

    /// Parse `minX minY width height` (whitespace and/or comma separated).
    ///
    /// Rejects non-finite numbers and non-positive sizes.
    pub fn parse(text: &str) -> Option<Self> {
        let mut values = text
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<f64>().ok().filter(|v| v.is_finite()));

        let view_box = Self::new(
            values.next()??,
            values.next()??,
            values.next()??,
            values.next()??,
        );
        if values.next().is_some() || view_box.width <= 0.0 || view_box.height <= 0.0 {
            return None;
        }
        Some(view_box)
    }
}

impl fmt::Display for ViewBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            format_number(self.min_x),
            format_number(self.min_y),
            format_number(self.width),
            format_number(self.height)
        )
    }
}

/// Declared `width` / `height` of the root element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
    Px(f64),
    Percent(f64),
}

impl Dimension {
    pub const FULL: Self = Self::Percent(100.0);

    /// Parse `200`, `200px` or `100%`. Other units are not understood.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (number, percent) = match text.strip_suffix('%') {
            Some(number) => (number, true),
            None => (text.strip_suffix("px").unwrap_or(text), false),
        };
        let value = number.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
        Some(if percent {
            Self::Percent(value)
        } else {
            Self::Px(value)
        })
    }

    /// Positive absolute size, usable as a coordinate frame.
    pub fn absolute(&self) -> Option<f64> {
        match *self {
            Self::Px(value) if value > 0.0 => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Px(value) => f.write_str(&format_number(*value)),
            Self::Percent(value) => write!(f, "{}%", format_number(*value)),
        }
    }
}

/// How the frame is fitted into the viewport (`preserveAspectRatio`).
///
/// Alignment is always centered; other alignments parse as their fit mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectFit {
    Meet,
    Slice,
    Stretch,
}

impl AspectFit {
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.split_whitespace();
        let align = parts.next()?;
        if align == "none" {
            return Some(Self::Stretch);
        }
        match parts.next() {
            Some("slice") => Some(Self::Slice),
            Some("meet") | None => Some(Self::Meet),
            Some(_) => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Meet => "xMidYMid meet",
            Self::Slice => "xMidYMid slice",
            Self::Stretch => "none",
        }
    }
}

/// Coordinate frame and viewport of the root element.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Frame {
    pub view_box: Option<ViewBox>,
    pub width: Option<Dimension>,
    pub height: Option<Dimension>,
    pub aspect: Option<AspectFit>,
}

impl Frame {
    /// Frame of a `w x h` pixel canvas.
    pub fn pixels(width: f64, height: f64) -> Self {
        Self {
            view_box: Some(ViewBox::new(0.0, 0.0, width, height)),
            width: Some(Dimension::Px(width)),
            height: Some(Dimension::Px(height)),
            aspect: None,
        }
    }

    /// The viewBox, or `0 0 w h` synthesized from absolute width/height.
    pub fn coordinate_frame(&self) -> Option<ViewBox> {
        if self.view_box.is_some() {
            return self.view_box;
        }
        let width = self.width?.absolute()?;
        let height = self.height?.absolute()?;
        Some(ViewBox::new(0.0, 0.0, width, height))
    }
}

/// Opaque shape primitive: an element with its attributes and children.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Shape>,
    pub text: Option<String>,
}

impl Shape {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
            text: None,
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set or replace an attribute, keeping its original position.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        set_attr(&mut self.attrs, name.into(), value.into());
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let index = self.attrs.iter().position(|(key, _)| key == name)?;
        Some(self.attrs.remove(index).1)
    }

    /// Visit this shape and every descendant, depth first.
    pub fn walk_mut(&mut self, f: &mut impl FnMut(&mut Shape)) {
        f(self);
        for child in &mut self.children {
            child.walk_mut(f);
        }
    }

    pub fn walk(&self, f: &mut impl FnMut(&Shape)) {
        f(self);
        for child in &self.children {
            child.walk(f);
        }
    }
}

pub(crate) fn set_attr(attrs: &mut Vec<(String, String)>, name: String, value: String) {
    match attrs.iter_mut().find(|(key, _)| *key == name) {
        Some((_, existing)) => *existing = value,
        None => attrs.push((name, value)),
    }
}

/// A vector document: frame, shapes and an optional style rule.
///
/// Themeable documents carry a style rule binding at least the primary
/// slot; literal documents color their shapes with presentation attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorDocument {
    pub frame: Frame,
    /// Root attributes other than the frame (`xmlns`, `version`, ...).
    pub root_attrs: Vec<(String, String)>,
    pub shapes: Vec<Shape>,
    pub style: Option<StyleRule>,
}

impl VectorDocument {
    pub fn new(frame: Frame, shapes: Vec<Shape>) -> Self {
        Self {
            frame,
            root_attrs: Vec::new(),
            shapes,
            style: None,
        }
    }

    /// True when the style rule binds a color slot.
    pub fn is_themeable(&self) -> bool {
        self.style.as_ref().is_some_and(StyleRule::has_slot_binding)
    }

    pub fn root_attr(&self, name: &str) -> Option<&str> {
        self.root_attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_root_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        set_attr(&mut self.root_attrs, name.into(), value.into());
    }

    pub fn for_each_shape_mut(&mut self, mut f: impl FnMut(&mut Shape)) {
        for shape in &mut self.shapes {
            shape.walk_mut(&mut f);
        }
    }

    pub fn for_each_shape(&self, mut f: impl FnMut(&Shape)) {
        for shape in &self.shapes {
            shape.walk(&mut f);
        }
    }

    /// Number of shapes, nested ones included.
    pub fn shape_count(&self) -> usize {
        let mut count = 0;
        self.for_each_shape(|_| count += 1);
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(10.0), "10");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(1.23456), "1.235");
        assert_eq!(format_number(-0.0001), "0");
        assert_eq!(format_number(-12.5), "-12.5");
    }

    #[test]
    fn test_view_box_parse() {
        assert_eq!(
            ViewBox::parse("0 0 100 50"),
            Some(ViewBox::new(0.0, 0.0, 100.0, 50.0))
        );
        assert_eq!(
            ViewBox::parse("-1.5,2 , 3 4"),
            Some(ViewBox::new(-1.5, 2.0, 3.0, 4.0))
        );
        assert_eq!(ViewBox::parse("0 0 100"), None);
        assert_eq!(ViewBox::parse("0 0 0 10"), None);
        assert_eq!(ViewBox::parse("0 0 a 10"), None);
        assert_eq!(ViewBox::parse("0 0 1 1 1"), None);
    }

    #[test]
    fn test_view_box_display() {
        assert_eq!(ViewBox::new(-12.5, 0.0, 80.01, 80.01).to_string(), "-12.5 0 80.01 80.01");
    }

    #[test]
    fn test_dimension_parse() {
        assert_eq!(Dimension::parse("100%"), Some(Dimension::Percent(100.0)));
        assert_eq!(Dimension::parse("200px"), Some(Dimension::Px(200.0)));
        assert_eq!(Dimension::parse(" 64 "), Some(Dimension::Px(64.0)));
        assert_eq!(Dimension::parse("2em"), None);
        assert_eq!(Dimension::FULL.to_string(), "100%");
    }

    #[test]
    fn test_aspect_parse() {
        assert_eq!(AspectFit::parse("xMidYMid slice"), Some(AspectFit::Slice));
        assert_eq!(AspectFit::parse("xMinYMin"), Some(AspectFit::Meet));
        assert_eq!(AspectFit::parse("none"), Some(AspectFit::Stretch));
    }

    #[test]
    fn test_coordinate_frame_fallback() {
        let frame = Frame {
            width: Some(Dimension::Px(30.0)),
            height: Some(Dimension::Px(20.0)),
            ..Frame::default()
        };
        assert_eq!(
            frame.coordinate_frame(),
            Some(ViewBox::new(0.0, 0.0, 30.0, 20.0))
        );

        let relative = Frame {
            width: Some(Dimension::FULL),
            height: Some(Dimension::FULL),
            ..Frame::default()
        };
        assert_eq!(relative.coordinate_frame(), None);
    }

    #[test]
    fn test_shape_attrs_keep_order() {
        let mut shape = Shape::new("path")
            .with_attr("d", "M0 0")
            .with_attr("fill", "#000000");
        shape.set_attr("d", "M1 1");
        assert_eq!(shape.attrs[0], ("d".to_string(), "M1 1".to_string()));
        assert_eq!(shape.remove_attr("fill").as_deref(), Some("#000000"));
        assert_eq!(shape.attr("fill"), None);
    }

    #[test]
    fn test_shape_count_includes_nested() {
        let group = Shape {
            children: vec![Shape::new("path"), Shape::new("circle")],
            ..Shape::new("g")
        };
        let doc = VectorDocument::new(Frame::pixels(10.0, 10.0), vec![group, Shape::new("rect")]);
        assert_eq!(doc.shape_count(), 4);
        assert!(!doc.is_themeable());
    }
}
