//! Document-wide style rule and paint values.

use std::fmt;

use crate::image::color::{Color, ColorSlot, ColorSlotAssignment};

/// A `fill` / `stroke` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Paint {
    None,
    Literal(Color),
    /// `var(--svg-<slot>, <fallback>)`
    Slot { slot: ColorSlot, fallback: Color },
    /// Anything else (`currentColor`, `url(#g)`, named colors), kept verbatim.
    Other(String),
}

impl Paint {
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if text == "none" {
            return Self::None;
        }
        if let Some(color) = Color::parse_hex(text).filter(|_| text.starts_with('#')) {
            return Self::Literal(color);
        }
        Self::parse_slot(text).unwrap_or_else(|| Self::Other(text.to_string()))
    }

    fn parse_slot(text: &str) -> Option<Self> {
        let inner = text.strip_prefix("var(")?.strip_suffix(')')?;
        let (name, fallback) = match inner.split_once(',') {
            Some((name, fallback)) => (name.trim(), Some(fallback.trim())),
            None => (inner.trim(), None),
        };
        let slot = ColorSlot::from_css_var(name)?;
        let fallback = match fallback {
            Some(text) => Color::parse_hex(text)?,
            None => Color::BLACK,
        };
        Some(Self::Slot { slot, fallback })
    }

    /// Replace a slot reference by its assigned color or its fallback.
    pub fn resolve(&self, assignment: &ColorSlotAssignment) -> Self {
        match self {
            Self::Slot { slot, fallback } => {
                Self::Literal(assignment.get(*slot).unwrap_or(*fallback))
            }
            other => other.clone(),
        }
    }

    pub fn slot(&self) -> Option<ColorSlot> {
        match self {
            Self::Slot { slot, .. } => Some(*slot),
            _ => None,
        }
    }
}

impl fmt::Display for Paint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Literal(color) => write!(f, "{color}"),
            Self::Slot { slot, fallback } => write!(f, "var({}, {fallback})", slot.css_var()),
            Self::Other(text) => f.write_str(text),
        }
    }
}

/// The single `<style>` rule of a document.
///
/// `fill` and `stroke` are written with `!important` so they win over any
/// presentation attribute left on a shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRule {
    pub selector: String,
    pub fill: Option<Paint>,
    pub stroke: Option<Paint>,
    /// Other declarations, in source order.
    pub extra: Vec<(String, String)>,
}

impl StyleRule {
    /// `*{fill:var(--svg-primary, <fallback>) !important;stroke:none !important;}`
    pub fn themed(fallback: Color) -> Self {
        Self {
            selector: "*".to_string(),
            fill: Some(Paint::Slot {
                slot: ColorSlot::Primary,
                fallback,
            }),
            stroke: Some(Paint::None),
            extra: Vec::new(),
        }
    }

    /// Parse the text of a `<style>` element holding one rule.
    ///
    /// Returns `None` for empty text, several rules, or at-rules.
    pub fn parse(css: &str) -> Option<Self> {
        let css = strip_css_comments(css);
        let css = css.trim();
        let open = css.find('{')?;
        let body = css[open + 1..].trim_end().strip_suffix('}')?;
        let selector = css[..open].trim();
        if selector.is_empty() || selector.starts_with('@') || body.contains(['{', '}']) {
            return None;
        }

        let mut rule = Self {
            selector: selector.to_string(),
            fill: None,
            stroke: None,
            extra: Vec::new(),
        };
        for (name, value) in parse_declarations(body) {
            match name.as_str() {
                "fill" => rule.fill = Some(Paint::parse(&value)),
                "stroke" => rule.stroke = Some(Paint::parse(&value)),
                _ => rule.extra.push((name, value)),
            }
        }
        Some(rule)
    }

    pub fn to_css(&self) -> String {
        let mut css = format!("{}{{", self.selector);
        if let Some(fill) = &self.fill {
            css.push_str(&format!("fill:{fill} !important;"));
        }
        if let Some(stroke) = &self.stroke {
            css.push_str(&format!("stroke:{stroke} !important;"));
        }
        for (name, value) in &self.extra {
            css.push_str(&format!("{name}:{value};"));
        }
        css.push('}');
        css
    }

    /// Copy with every slot reference replaced by a literal color.
    pub fn resolve(&self, assignment: &ColorSlotAssignment) -> Self {
        Self {
            selector: self.selector.clone(),
            fill: self.fill.as_ref().map(|p| p.resolve(assignment)),
            stroke: self.stroke.as_ref().map(|p| p.resolve(assignment)),
            extra: self.extra.clone(),
        }
    }

    /// Number of `fill` / `stroke` bindings to the primary slot.
    pub fn primary_bindings(&self) -> usize {
        [&self.fill, &self.stroke]
            .into_iter()
            .flatten()
            .filter(|paint| paint.slot() == Some(ColorSlot::Primary))
            .count()
    }

    pub fn has_slot_binding(&self) -> bool {
        [&self.fill, &self.stroke]
            .into_iter()
            .flatten()
            .any(|paint| paint.slot().is_some())
    }

    pub fn remove_extra(&mut self, name: &str) {
        self.extra.retain(|(key, _)| key != name);
    }
}

/// Split `a:b; c:d` into trimmed pairs; `!important` is dropped.
pub fn parse_declarations(body: &str) -> Vec<(String, String)> {
    body.split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim();
            let value = value.strip_suffix("!important").unwrap_or(value).trim();
            (!name.is_empty()).then(|| (name, value.to_string()))
        })
        .collect()
}

pub fn write_declarations(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(name, value)| format!("{name}:{value}"))
        .collect::<Vec<_>>()
        .join(";")
}

fn strip_css_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paint_parse() {
        assert_eq!(Paint::parse("none"), Paint::None);
        assert_eq!(
            Paint::parse("#2d5bff"),
            Paint::Literal(Color::rgb(0x2d, 0x5b, 0xff))
        );
        assert_eq!(
            Paint::parse("var(--svg-primary, #000000)"),
            Paint::Slot {
                slot: ColorSlot::Primary,
                fallback: Color::BLACK
            }
        );
        assert_eq!(
            Paint::parse("var(--svg-secondary)"),
            Paint::Slot {
                slot: ColorSlot::Secondary,
                fallback: Color::BLACK
            }
        );
        assert_eq!(
            Paint::parse("currentColor"),
            Paint::Other("currentColor".to_string())
        );
        assert_eq!(
            Paint::parse("var(--brand, #000000)"),
            Paint::Other("var(--brand, #000000)".to_string())
        );
    }

    #[test]
    fn test_themed_rule_css() {
        let rule = StyleRule::themed(Color::rgb(0x2d, 0x5b, 0xff));
        assert_eq!(
            rule.to_css(),
            "*{fill:var(--svg-primary, #2d5bff) !important;stroke:none !important;}"
        );
        assert_eq!(rule.primary_bindings(), 1);
        assert!(rule.has_slot_binding());
    }

    #[test]
    fn test_parse_rule_round_trip() {
        let css = "*{fill:var(--svg-primary, #2d5bff) !important;stroke:none !important;}";
        let rule = StyleRule::parse(css).unwrap();
        assert_eq!(rule, StyleRule::themed(Color::rgb(0x2d, 0x5b, 0xff)));
    }

    #[test]
    fn test_parse_rule_keeps_extra_declarations() {
        let rule = StyleRule::parse("/* theme */ path { opacity: 0.5; fill: #ff0000 }").unwrap();
        assert_eq!(rule.selector, "path");
        assert_eq!(rule.fill, Some(Paint::Literal(Color::rgb(255, 0, 0))));
        assert_eq!(rule.extra, vec![("opacity".to_string(), "0.5".to_string())]);
        assert!(!rule.has_slot_binding());
    }

    #[test]
    fn test_parse_rejects_multiple_rules() {
        assert!(StyleRule::parse("a{fill:red} b{fill:blue}").is_none());
        assert!(StyleRule::parse("@media print{a{fill:red}}").is_none());
        assert!(StyleRule::parse("").is_none());
    }

    #[test]
    fn test_resolve_uses_assignment_then_fallback() {
        let rule = StyleRule::themed(Color::rgb(1, 2, 3));
        let assigned = rule.resolve(&ColorSlotAssignment::primary(Color::rgb(9, 9, 9)));
        assert_eq!(assigned.fill, Some(Paint::Literal(Color::rgb(9, 9, 9))));

        let fallback = rule.resolve(&ColorSlotAssignment::new());
        assert_eq!(fallback.fill, Some(Paint::Literal(Color::rgb(1, 2, 3))));
        assert_eq!(fallback.stroke, Some(Paint::None));
    }

    #[test]
    fn test_parse_declarations() {
        assert_eq!(
            parse_declarations("Fill: red !important; ;stroke-width:2"),
            vec![
                ("fill".to_string(), "red".to_string()),
                ("stroke-width".to_string(), "2".to_string())
            ]
        );
    }
}
