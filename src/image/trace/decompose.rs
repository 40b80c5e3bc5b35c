//! Path decomposition.
//!
//! Walks the boundary of every connected ink region along pixel-corner
//! lattice points, then XOR-fills the region so holes surface as fresh
//! regions of their own. Coordinates are y-down: pixel `(x, y)` spans the
//! unit square with top-left lattice point `(x, y)`.

use super::TraceError;
use super::bitmap::Bitmap;
use crate::config::TurnPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Lattice {
    pub x: i32,
    pub y: i32,
}

/// Whether a boundary encloses ink or a hole in the source bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Sign {
    Positive,
    Negative,
}

/// Closed lattice boundary of one region.
#[derive(Debug, Clone)]
pub(super) struct RawPath {
    pub points: Vec<Lattice>,
    pub area: i64,
    pub sign: Sign,
    pub max_x: i32,
}

#[derive(Debug)]
pub(super) struct Decomposition {
    pub paths: Vec<RawPath>,
    pub suppressed: usize,
}

/// Split the bitmap into closed boundaries, dropping regions whose area is
/// below `min_area`.
pub(super) fn decompose(
    source: &Bitmap,
    policy: TurnPolicy,
    min_area: i64,
) -> Result<Decomposition, TraceError> {
    let mut work = source.clone();
    let mut paths = Vec::new();
    let mut suppressed = 0;

    // A boundary never uses a lattice edge twice.
    let budget = 2 * (source.width as usize + 1) * (source.height as usize + 1) + 4;

    let mut cursor = 0;
    while let Some(start) = work.find_next(cursor) {
        let path = find_path(source, &work, start, policy, budget)?;
        xor_path(&mut work, &path);

        if path.area >= min_area {
            paths.push(path);
        } else {
            suppressed += 1;
        }
        cursor = work.index_of(start.0, start.1);
    }

    Ok(Decomposition { paths, suppressed })
}

fn find_path(
    source: &Bitmap,
    work: &Bitmap,
    (x0, y0): (i32, i32),
    policy: TurnPolicy,
    budget: usize,
) -> Result<RawPath, TraceError> {
    let sign = if source.at(x0, y0) {
        Sign::Positive
    } else {
        Sign::Negative
    };

    let (mut x, mut y) = (x0, y0);
    let (mut dirx, mut diry) = (0i32, 1i32);
    let mut points = Vec::new();
    let mut area = 0i64;
    let mut max_x = x0;

    loop {
        if points.len() >= budget {
            return Err(TraceError::PathWalkExceeded { x: x0, y: y0 });
        }
        points.push(Lattice { x, y });
        max_x = max_x.max(x);

        x += dirx;
        y += diry;
        area -= x as i64 * diry as i64;

        if x == x0 && y == y0 {
            break;
        }

        // Pixels ahead-left and ahead-right of the current heading.
        let l = work.at(x + (dirx + diry - 1) / 2, y + (diry - dirx - 1) / 2);
        let r = work.at(x + (dirx - diry - 1) / 2, y + (diry + dirx - 1) / 2);

        if r && !l {
            let turn_right = match policy {
                TurnPolicy::Right => true,
                TurnPolicy::Left => false,
                TurnPolicy::Black => sign == Sign::Positive,
                TurnPolicy::White => sign == Sign::Negative,
                TurnPolicy::Majority => majority(work, x, y),
                TurnPolicy::Minority => !majority(work, x, y),
            };
            (dirx, diry) = if turn_right {
                (-diry, dirx)
            } else {
                (diry, -dirx)
            };
        } else if r {
            (dirx, diry) = (-diry, dirx);
        } else if !l {
            (dirx, diry) = (diry, -dirx);
        }
    }

    Ok(RawPath {
        points,
        area: area.abs(),
        sign,
        max_x,
    })
}

/// Local color majority in growing square rings around a lattice point.
fn majority(work: &Bitmap, x: i32, y: i32) -> bool {
    for i in 2..5 {
        let mut ct = 0i32;
        for a in (-i + 1)..=(i - 1) {
            ct += if work.at(x + a, y + i - 1) { 1 } else { -1 };
            ct += if work.at(x + i - 1, y + a - 1) { 1 } else { -1 };
            ct += if work.at(x + a - 1, y - i) { 1 } else { -1 };
            ct += if work.at(x - i, y + a) { 1 } else { -1 };
        }
        if ct > 0 {
            return true;
        } else if ct < 0 {
            return false;
        }
    }
    false
}

/// Invert every pixel enclosed by the path.
fn xor_path(work: &mut Bitmap, path: &RawPath) {
    let mut y1 = path.points[0].y;
    for point in &path.points[1..] {
        if point.y != y1 {
            let min_y = y1.min(point.y);
            for x in point.x..path.max_x {
                work.flip(x, min_y);
            }
            y1 = point.y;
        }
    }
}
