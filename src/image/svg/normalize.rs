//! Re-center and re-scale a document around its rendered content.

use thiserror::Error;

use super::bounds::{alpha_bounds, geometry_bounds, snap_to_geometry, to_document_units};
use super::document::{AspectFit, Dimension, Shape, VectorDocument, ViewBox};
use super::render::{Fit, RenderError, render};
use super::style::{Paint, parse_declarations, write_declarations};
use crate::config::NormalizeConfig;
use crate::image::color::ColorSlotAssignment;

/// Attributes removed so content bounds never depend on stroke geometry.
const STROKE_PROPERTIES: &[&str] = &[
    "stroke",
    "stroke-width",
    "stroke-linecap",
    "stroke-linejoin",
    "stroke-miterlimit",
    "vector-effect",
];

/// How far, in render pixels, a detected edge may sit from the geometric
/// one and still be snapped to it.
const SNAP_PIXELS: f64 = 3.0;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("document renders no content above the alpha threshold")]
    EmptyContent,

    #[error(transparent)]
    Render(#[from] RenderError),
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Produce a copy of `doc` whose square viewBox holds the rendered content
/// centered, occupying `content_fraction` of the longer side.
pub fn normalize(
    doc: &VectorDocument,
    config: &NormalizeConfig,
) -> Result<VectorDocument, NormalizeError> {
    let resolution = config.render_resolution;
    let rendered = render(
        doc,
        &ColorSlotAssignment::new(),
        resolution,
        resolution,
        Fit::Stretch,
    )?;

    let pixels = alpha_bounds(
        |x, y| rendered.alpha(x, y),
        rendered.width,
        rendered.height,
        config.alpha_threshold,
    )
    .ok_or(NormalizeError::EmptyContent)?;
    let frame = rendered.frame;
    let detected = to_document_units(pixels, frame, rendered.width, rendered.height);
    let bounds = match geometry_bounds(&rendered.tree) {
        // Refinement error plus faint tips lost to the threshold.
        Some(geometry) => snap_to_geometry(
            detected,
            geometry.translate(frame.min_x, frame.min_y),
            SNAP_PIXELS * frame.width / rendered.width as f64,
            SNAP_PIXELS * frame.height / rendered.height as f64,
        ),
        None => detected,
    };

    let side = round2(bounds.width().max(bounds.height()) / config.content_fraction);
    if side <= 0.0 {
        return Err(NormalizeError::EmptyContent);
    }
    let (cx, cy) = bounds.center();
    let view_box = ViewBox::new(round2(cx - side / 2.0), round2(cy - side / 2.0), side, side);

    let mut out = doc.clone();
    strip_strokes(&mut out);

    out.frame.view_box = Some(view_box);
    out.frame.width = Some(Dimension::FULL);
    out.frame.height = Some(Dimension::FULL);
    out.frame.aspect = Some(AspectFit::Meet);
    out.set_root_attr("shape-rendering", "geometricPrecision");

    crate::debug!(
        "normalize";
        "content {:.2}x{:.2} at ({:.2}, {:.2}), viewBox {}",
        bounds.width(),
        bounds.height(),
        bounds.min_x,
        bounds.min_y,
        view_box
    );
    Ok(out)
}

fn strip_strokes(doc: &mut VectorDocument) {
    let themeable = doc.is_themeable();
    strip_stroke_attrs(&mut doc.root_attrs);
    doc.for_each_shape_mut(|shape: &mut Shape| {
        strip_stroke_attrs(&mut shape.attrs);
        if !themeable {
            shape.set_attr("stroke", "none");
        }
    });

    if let Some(rule) = doc.style.as_mut().filter(|_| themeable) {
        rule.stroke = Some(Paint::None);
        for name in STROKE_PROPERTIES {
            rule.remove_extra(name);
        }
    }
}

fn strip_stroke_attrs(attrs: &mut Vec<(String, String)>) {
    attrs.retain(|(name, _)| !STROKE_PROPERTIES.contains(&name.as_str()));

    let Some(index) = attrs.iter().position(|(name, _)| name == "style") else {
        return;
    };
    let kept: Vec<_> = parse_declarations(&attrs[index].1)
        .into_iter()
        .filter(|(name, _)| !STROKE_PROPERTIES.contains(&name.as_str()))
        .collect();
    if kept.is_empty() {
        attrs.remove(index);
    } else {
        attrs[index].1 = write_declarations(&kept);
    }
}
