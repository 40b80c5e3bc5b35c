//! Content bounds of a document.
//!
//! Bounds are detected on rendered pixels, so they cover what a viewer
//! sees (fill rule, clipping and strokes included). Each detected edge is
//! then snapped to the exact geometric edge when the two agree, which keeps
//! the result independent of render scale.

use usvg::{Node, Tree};

use super::document::ViewBox;

/// Tight box around rendered content, in viewBox units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl ContentBounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn translate(self, dx: f64, dy: f64) -> Self {
        Self {
            min_x: self.min_x + dx,
            min_y: self.min_y + dy,
            max_x: self.max_x + dx,
            max_y: self.max_y + dy,
        }
    }

    pub fn union(self, other: Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }
}

/// Bounds of the pixels whose alpha reaches `threshold`, in pixel units.
///
/// The outermost rows and columns are refined by their peak coverage: a
/// leading edge at column `c` lands at `c + 1 - coverage`, a trailing edge
/// at `c + coverage`.
pub fn alpha_bounds(
    alpha: impl Fn(u32, u32) -> u8,
    width: u32,
    height: u32,
    threshold: u8,
) -> Option<ContentBounds> {
    let threshold = threshold.max(1);
    let mut col_peak = vec![0u8; width as usize];
    let mut row_peak = vec![0u8; height as usize];

    for y in 0..height {
        for x in 0..width {
            let a = alpha(x, y);
            if a >= threshold {
                let col = &mut col_peak[x as usize];
                *col = (*col).max(a);
                let row = &mut row_peak[y as usize];
                *row = (*row).max(a);
            }
        }
    }

    let (left, right) = refine_edges(&col_peak)?;
    let (top, bottom) = refine_edges(&row_peak)?;
    Some(ContentBounds {
        min_x: left,
        min_y: top,
        max_x: right,
        max_y: bottom,
    })
}

fn refine_edges(peaks: &[u8]) -> Option<(f64, f64)> {
    let first = peaks.iter().position(|p| *p > 0)?;
    let last = peaks.iter().rposition(|p| *p > 0)?;

    let coverage = |i: usize| peaks[i] as f64 / 255.0;
    let lead = first as f64 + 1.0 - coverage(first);
    let trail = last as f64 + coverage(last);

    // A single faint column can invert the pair.
    if lead > trail {
        let mid = (lead + trail) / 2.0;
        return Some((mid, mid));
    }
    Some((lead, trail))
}

/// Map pixel bounds of a `width x height` stretched render back to
/// document units.
pub fn to_document_units(
    bounds: ContentBounds,
    frame: ViewBox,
    width: u32,
    height: u32,
) -> ContentBounds {
    let sx = frame.width / width as f64;
    let sy = frame.height / height as f64;
    ContentBounds {
        min_x: frame.min_x + bounds.min_x * sx,
        min_y: frame.min_y + bounds.min_y * sy,
        max_x: frame.min_x + bounds.max_x * sx,
        max_y: frame.min_y + bounds.max_y * sy,
    }
}

/// Replace each edge of `detected` with the matching edge of `geometry`
/// when they are within `tolerance_x` / `tolerance_y` of each other.
///
/// Edges that disagree (clipped or invisible geometry) keep the detected
/// value.
pub fn snap_to_geometry(
    detected: ContentBounds,
    geometry: ContentBounds,
    tolerance_x: f64,
    tolerance_y: f64,
) -> ContentBounds {
    let snap = |measured: f64, exact: f64, tolerance: f64| {
        if (measured - exact).abs() <= tolerance { exact } else { measured }
    };
    ContentBounds {
        min_x: snap(detected.min_x, geometry.min_x, tolerance_x),
        min_y: snap(detected.min_y, geometry.min_y, tolerance_y),
        max_x: snap(detected.max_x, geometry.max_x, tolerance_x),
        max_y: snap(detected.max_y, geometry.max_y, tolerance_y),
    }
}

/// Stroke-inclusive geometric bounds of a parsed tree, in the tree's user
/// space.
///
/// `None` when the tree holds nothing drawable.
pub fn geometry_bounds(tree: &Tree) -> Option<ContentBounds> {
    let mut bounds = None;
    traverse_group(tree.root(), &mut bounds);
    bounds
}

fn traverse_group(group: &usvg::Group, bounds: &mut Option<ContentBounds>) {
    for node in group.children() {
        let rect = node.abs_stroke_bounding_box();
        let node_bounds = ContentBounds {
            min_x: rect.x() as f64,
            min_y: rect.y() as f64,
            max_x: rect.right() as f64,
            max_y: rect.bottom() as f64,
        };
        *bounds = Some(match *bounds {
            Some(existing) => existing.union(node_bounds),
            None => node_bounds,
        });

        if let Node::Group(nested) = node {
            traverse_group(nested, bounds);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(width: u32, height: u32, cells: &[(u32, u32, u8)]) -> impl Fn(u32, u32) -> u8 {
        let mut data = vec![0u8; (width * height) as usize];
        for &(x, y, a) in cells {
            data[(y * width + x) as usize] = a;
        }
        move |x, y| data[(y * width + x) as usize]
    }

    #[test]
    fn test_full_coverage_bounds() {
        let alpha = grid(8, 8, &[(2, 3, 255), (5, 6, 255)]);
        let bounds = alpha_bounds(alpha, 8, 8, 10).unwrap();
        assert_eq!(bounds.min_x, 2.0);
        assert_eq!(bounds.max_x, 6.0);
        assert_eq!(bounds.min_y, 3.0);
        assert_eq!(bounds.max_y, 7.0);
    }

    #[test]
    fn test_partial_coverage_refines_edges() {
        // Half-covered leading column, quarter-covered trailing row.
        let alpha = grid(8, 8, &[(1, 1, 255), (0, 1, 128), (1, 2, 64)]);
        let bounds = alpha_bounds(alpha, 8, 8, 10).unwrap();
        assert!((bounds.min_x - (1.0 - 128.0 / 255.0)).abs() < 1e-9);
        assert_eq!(bounds.max_x, 2.0);
        assert_eq!(bounds.min_y, 1.0);
        assert!((bounds.max_y - (2.0 + 64.0 / 255.0)).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_excludes_faint_pixels() {
        let alpha = grid(4, 4, &[(1, 1, 9)]);
        assert!(alpha_bounds(&alpha, 4, 4, 10).is_none());
        assert!(alpha_bounds(&alpha, 4, 4, 9).is_some());
    }

    #[test]
    fn test_single_faint_column_collapses_to_midpoint() {
        let alpha = grid(4, 4, &[(2, 2, 51)]);
        let bounds = alpha_bounds(alpha, 4, 4, 10).unwrap();
        assert_eq!(bounds.width(), 0.0);
        assert!((bounds.min_x - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_to_document_units() {
        let pixels = ContentBounds {
            min_x: 100.0,
            min_y: 0.0,
            max_x: 300.0,
            max_y: 400.0,
        };
        let doc = to_document_units(pixels, ViewBox::new(-10.0, 5.0, 20.0, 40.0), 400, 400);
        assert_eq!(doc.min_x, -5.0);
        assert_eq!(doc.max_x, 5.0);
        assert_eq!(doc.min_y, 5.0);
        assert_eq!(doc.max_y, 45.0);
        assert_eq!(doc.center(), (0.0, 25.0));
    }

    #[test]
    fn test_snap_to_geometry() {
        let detected = ContentBounds {
            min_x: 10.3,
            min_y: 0.0,
            max_x: 20.0,
            max_y: 30.0,
        };
        let geometry = ContentBounds {
            min_x: 10.0,
            min_y: -5.0,
            max_x: 20.4,
            max_y: 30.1,
        };
        let snapped = snap_to_geometry(detected, geometry, 0.5, 0.5);
        assert_eq!(snapped.min_x, 10.0);
        assert_eq!(snapped.max_x, 20.4);
        assert_eq!(snapped.max_y, 30.1);
        // Clipped away: keeps the detected edge.
        assert_eq!(snapped.min_y, 0.0);
    }

    #[test]
    fn test_geometry_bounds_of_shifted_frame() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="-20 10 100 50" width="100" height="50" preserveAspectRatio="none">
            <circle cx="0" cy="30" r="10"/>
        </svg>"#;
        let tree = Tree::from_str(svg, &usvg::Options::default()).unwrap();
        let bounds = geometry_bounds(&tree).unwrap().translate(-20.0, 10.0);
        assert!((bounds.min_x + 10.0).abs() < 1e-3, "{bounds:?}");
        assert!((bounds.max_x - 10.0).abs() < 1e-3, "{bounds:?}");
        assert!((bounds.min_y - 20.0).abs() < 1e-3, "{bounds:?}");
        assert!((bounds.max_y - 40.0).abs() < 1e-3, "{bounds:?}");
    }

    #[test]
    fn test_geometry_bounds() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100">
            <rect x="10" y="20" width="30" height="40"/>
            <g><rect x="50" y="50" width="10" height="10"/></g>
        </svg>"#;
        let tree = Tree::from_str(svg, &usvg::Options::default()).unwrap();
        let bounds = geometry_bounds(&tree).unwrap();
        assert!((bounds.min_x - 10.0).abs() < 1e-3);
        assert!((bounds.max_y - 60.0).abs() < 1e-3);

        let empty = r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"/>"#;
        let tree = Tree::from_str(empty, &usvg::Options::default()).unwrap();
        assert!(geometry_bounds(&tree).is_none());
    }
}
