//! Off-screen rendering of documents with resvg.

use resvg::tiny_skia::{Pixmap, Transform};
use thiserror::Error;

use super::DocumentError;
use super::document::{VectorDocument, ViewBox};
use super::write::write_for_render;
use crate::image::color::ColorSlotAssignment;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("renderer rejected document: {0}")]
    Load(String),

    #[error("cannot allocate a {width}x{height} canvas")]
    Canvas { width: u32, height: u32 },
}

/// How the coordinate frame is mapped onto the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fit {
    /// Fill the canvas on both axes independently.
    Stretch,
    /// Uniform scale, centered, content never cropped.
    Contain,
}

/// Premultiplied RGBA pixels, with the tree they were rendered from.
///
/// The tree's user space is the frame shifted to the origin.
pub struct Rendered {
    pub width: u32,
    pub height: u32,
    pub frame: ViewBox,
    pub data: Vec<u8>,
    pub tree: usvg::Tree,
}

impl Rendered {
    #[inline]
    pub fn alpha(&self, x: u32, y: u32) -> u8 {
        self.data[((y * self.width + x) * 4 + 3) as usize]
    }
}

pub fn parse_tree(svg: &str) -> Result<usvg::Tree, RenderError> {
    usvg::Tree::from_str(svg, &usvg::Options::default()).map_err(|e| RenderError::Load(e.to_string()))
}

/// Render `doc` with its slots resolved against `assignment`.
pub fn render(
    doc: &VectorDocument,
    assignment: &ColorSlotAssignment,
    width: u32,
    height: u32,
    fit: Fit,
) -> Result<Rendered, RenderError> {
    let (svg, frame) = write_for_render(doc, assignment)?;
    let tree = parse_tree(&svg)?;
    let mut pixmap = Pixmap::new(width, height).ok_or(RenderError::Canvas { width, height })?;

    let size = tree.size();
    let sx = width as f32 / size.width();
    let sy = height as f32 / size.height();
    let transform = match fit {
        Fit::Stretch => Transform::from_scale(sx, sy),
        Fit::Contain => {
            let scale = sx.min(sy);
            let tx = (width as f32 - size.width() * scale) / 2.0;
            let ty = (height as f32 - size.height() * scale) / 2.0;
            Transform::from_row(scale, 0.0, 0.0, scale, tx, ty)
        }
    };
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    Ok(Rendered {
        width,
        height,
        frame,
        data: pixmap.take(),
        tree,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::color::Color;
    use crate::image::svg::document::{Frame, Shape};
    use crate::image::svg::theme::make_themeable;

    fn square_doc() -> VectorDocument {
        VectorDocument::new(
            Frame::pixels(20.0, 10.0),
            vec![
                Shape::new("path")
                    .with_attr("d", "M0 0H10V10H0Z")
                    .with_attr("fill", "#000000")
                    .with_attr("stroke", "none"),
            ],
        )
    }

    #[test]
    fn test_stretch_fills_both_axes() {
        let out = render(&square_doc(), &ColorSlotAssignment::new(), 40, 40, Fit::Stretch).unwrap();
        // Left half of the canvas is covered top to bottom.
        assert_eq!(out.alpha(5, 35), 255);
        assert_eq!(out.alpha(25, 5), 0);
    }

    #[test]
    fn test_contain_centers_content() {
        let out = render(&square_doc(), &ColorSlotAssignment::new(), 40, 40, Fit::Contain).unwrap();
        // 20x10 frame scaled by 2 into a 40x40 canvas: rows 10..30.
        assert_eq!(out.alpha(5, 5), 0);
        assert_eq!(out.alpha(5, 20), 255);
        assert_eq!(out.alpha(30, 20), 0);
    }

    #[test]
    fn test_themed_renders_like_literal() {
        let literal = square_doc();
        let themed = make_themeable(literal.clone(), Color::BLACK);
        let a = render(&literal, &ColorSlotAssignment::new(), 64, 32, Fit::Stretch).unwrap();
        let b = render(&themed, &ColorSlotAssignment::new(), 64, 32, Fit::Stretch).unwrap();
        assert_eq!(a.data, b.data);
    }

    #[test]
    fn test_assignment_changes_color_only() {
        let themed = make_themeable(square_doc(), Color::BLACK);
        let red = ColorSlotAssignment::primary(Color::rgb(255, 0, 0));
        let out = render(&themed, &red, 40, 20, Fit::Stretch).unwrap();
        let i = ((10 * 40 + 5) * 4) as usize;
        assert_eq!(&out.data[i..i + 4], &[255, 0, 0, 255]);
    }
}
