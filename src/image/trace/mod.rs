//! Bitmap tracing.
//!
//! Converts an [`InkMask`] into a literal-colored [`VectorDocument`]
//! holding one even-odd `<path>`:
//!
//! ```text
//! InkMask ──► decompose ──► fit_polygon ──► smooth ──► optimize ──► path data
//!            (boundaries)   (per path, parallel)
//! ```

mod bitmap;
mod curve;
mod decompose;
mod polygon;

use rayon::prelude::*;
use thiserror::Error;

use self::bitmap::Bitmap;
use self::curve::{Curve, Point, Segment};
use self::decompose::{Sign, decompose};
use self::polygon::fit_polygon;
use crate::config::TraceConfig;
use crate::image::mask::InkMask;
use crate::image::svg::{Frame, Shape, VectorDocument, format_number, write::SVG_NAMESPACE};

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("mask is uniformly {value}, nothing to trace")]
    UniformMask { value: u8 },

    #[error("mask has no pixels")]
    EmptyMask,

    #[error("all {suppressed} regions are below the speckle threshold")]
    AllSuppressed { suppressed: usize },

    #[error("boundary walk starting at ({x}, {y}) did not close")]
    PathWalkExceeded { x: i32, y: i32 },

    #[error("vertex solver did not converge within {iterations} iterations")]
    SolverDiverged { iterations: u32 },

    #[error("tracing produced non-finite coordinates")]
    NonFinite,
}

/// Trace the ink of `mask` into outlines.
pub fn trace(mask: &InkMask, config: &TraceConfig) -> Result<VectorDocument, TraceError> {
    if mask.width() == 0 || mask.height() == 0 {
        return Err(TraceError::EmptyMask);
    }
    if let Some(value) = mask.uniform_value() {
        return Err(TraceError::UniformMask { value });
    }

    let bitmap = Bitmap::from_mask(mask);
    let decomposition = decompose(
        &bitmap,
        config.turn_policy,
        config.speckle_suppression_px as i64,
    )?;
    if decomposition.paths.is_empty() {
        return Err(TraceError::AllSuppressed {
            suppressed: decomposition.suppressed,
        });
    }

    let curves = decomposition
        .paths
        .par_iter()
        .map(|path| {
            let mut vertices = fit_polygon(path, config.max_solver_iterations)?;
            if path.sign == Sign::Negative {
                vertices.reverse();
            }
            let curve = curve::smooth(&vertices, config.corner_threshold);
            let curve = if config.optimize_curves {
                curve::optimize(&curve, config.optimization_tolerance)
            } else {
                curve
            };
            if curve.is_finite() {
                Ok(curve)
            } else {
                Err(TraceError::NonFinite)
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    crate::debug!(
        "trace";
        "{} paths, {} speckles suppressed",
        curves.len(),
        decomposition.suppressed
    );

    let width = mask.width() as f64;
    let height = mask.height() as f64;
    let path = Shape::new("path")
        .with_attr("d", path_data(&curves))
        .with_attr("fill-rule", "evenodd")
        .with_attr("fill", config.fill.to_string())
        .with_attr("stroke", "none");

    let mut doc = VectorDocument::new(Frame::pixels(width, height), vec![path]);
    doc.set_root_attr("xmlns", SVG_NAMESPACE);
    Ok(doc)
}

fn path_data(curves: &[Curve]) -> String {
    let mut d = String::new();
    for curve in curves {
        let n = curve.len();
        if n == 0 {
            continue;
        }
        if !d.is_empty() {
            d.push(' ');
        }
        d.push('M');
        push_point(&mut d, curve.c[n - 1][2]);
        for (tag, c) in curve.tag.iter().zip(&curve.c) {
            match tag {
                Segment::Curve => {
                    d.push('C');
                    push_point(&mut d, c[0]);
                    d.push(' ');
                    push_point(&mut d, c[1]);
                    d.push(' ');
                    push_point(&mut d, c[2]);
                }
                Segment::Corner => {
                    d.push('L');
                    push_point(&mut d, c[1]);
                    d.push('L');
                    push_point(&mut d, c[2]);
                }
            }
        }
        d.push('Z');
    }
    d
}

fn push_point(d: &mut String, p: Point) {
    d.push_str(&format_number(p.x));
    d.push(' ');
    d.push_str(&format_number(p.y));
}
