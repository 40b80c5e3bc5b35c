//! Optimal polygon fitting.
//!
//! For each boundary: find the longest straight subpath starting at every
//! lattice point, pick the polygon with the fewest segments (ties broken by
//! least squared deviation), then move every polygon vertex inside its
//! unit cell to where it best fits both adjacent segments.

use super::TraceError;
use super::curve::Point;
use super::decompose::{Lattice, RawPath};

#[derive(Debug, Clone, Copy, Default)]
struct Sum {
    x: f64,
    y: f64,
    xy: f64,
    x2: f64,
    y2: f64,
}

/// Prefix sums of coordinates relative to the first point.
struct Sums {
    origin: Lattice,
    data: Vec<Sum>,
}

impl Sums {
    fn new(points: &[Lattice]) -> Self {
        let origin = points[0];
        let mut data = Vec::with_capacity(points.len() + 1);
        let mut acc = Sum::default();
        data.push(acc);
        for p in points {
            let x = (p.x - origin.x) as f64;
            let y = (p.y - origin.y) as f64;
            acc.x += x;
            acc.y += y;
            acc.xy += x * y;
            acc.x2 += x * x;
            acc.y2 += y * y;
            data.push(acc);
        }
        Self { origin, data }
    }
}

#[inline]
fn modulo(a: i64, n: i64) -> i64 {
    a.rem_euclid(n)
}

/// `b` lies in the cyclic half-open interval `[a, c)`.
#[inline]
fn cyclic(a: i64, b: i64, c: i64) -> bool {
    if a <= c { a <= b && b < c } else { a <= b || b < c }
}

#[inline]
fn sign(v: i64) -> i64 {
    v.signum()
}

#[inline]
fn xprod(a: (i64, i64), b: (i64, i64)) -> i64 {
    a.0 * b.1 - a.1 * b.0
}

/// Fit the polygon of a boundary; returns vertices in lattice coordinates.
pub(super) fn fit_polygon(path: &RawPath, max_solver_iterations: u32) -> Result<Vec<Point>, TraceError> {
    let sums = Sums::new(&path.points);
    let lon = longest_straight(&path.points);
    let polygon = best_polygon(&path.points, &sums, &lon);
    adjust_vertices(&path.points, &sums, &polygon, max_solver_iterations)
}

/// `lon[i]`: furthest index reachable from `i` along a straight subpath.
fn longest_straight(pt: &[Lattice]) -> Vec<i64> {
    let n = pt.len() as i64;
    let at = |i: i64| pt[i as usize];

    let mut nc = vec![0i64; n as usize];
    let mut k = 0i64;
    for i in (0..n).rev() {
        if at(i).x != at(k).x && at(i).y != at(k).y {
            k = i + 1;
        }
        nc[i as usize] = k;
    }

    let mut pivk = vec![0i64; n as usize];
    for i in (0..n).rev() {
        let mut ct = [0u32; 4];
        let next = at(modulo(i + 1, n));
        let dir = (3 + 3 * (next.x - at(i).x) as i64 + (next.y - at(i).y) as i64) / 2;
        ct[dir as usize] += 1;

        let mut constraint = [(0i64, 0i64); 2];
        let mut k = nc[i as usize];
        let mut k1 = i;
        let mut found = false;

        loop {
            let dir = (3 + 3 * sign((at(k).x - at(k1).x) as i64) + sign((at(k).y - at(k1).y) as i64)) / 2;
            ct[dir as usize] += 1;

            if ct.iter().all(|c| *c > 0) {
                pivk[i as usize] = k1;
                found = true;
                break;
            }

            let cur = ((at(k).x - at(i).x) as i64, (at(k).y - at(i).y) as i64);
            if xprod(constraint[0], cur) < 0 || xprod(constraint[1], cur) > 0 {
                break;
            }

            if cur.0.abs() > 1 || cur.1.abs() > 1 {
                let off = (
                    cur.0 + if cur.1 >= 0 && (cur.1 > 0 || cur.0 < 0) { 1 } else { -1 },
                    cur.1 + if cur.0 <= 0 && (cur.0 < 0 || cur.1 < 0) { 1 } else { -1 },
                );
                if xprod(constraint[0], off) >= 0 {
                    constraint[0] = off;
                }
                let off = (
                    cur.0 + if cur.1 <= 0 && (cur.1 < 0 || cur.0 < 0) { 1 } else { -1 },
                    cur.1 + if cur.0 >= 0 && (cur.0 > 0 || cur.1 < 0) { 1 } else { -1 },
                );
                if xprod(constraint[1], off) <= 0 {
                    constraint[1] = off;
                }
            }

            k1 = k;
            k = nc[k1 as usize];
            if !cyclic(k, i, k1) {
                break;
            }
        }

        if !found {
            let dk = (
                sign((at(k).x - at(k1).x) as i64),
                sign((at(k).y - at(k1).y) as i64),
            );
            let cur = ((at(k1).x - at(i).x) as i64, (at(k1).y - at(i).y) as i64);

            let a = xprod(constraint[0], cur);
            let b = xprod(constraint[0], dk);
            let c = xprod(constraint[1], cur);
            let d = xprod(constraint[1], dk);

            let mut j = 10_000_000i64;
            if b < 0 {
                j = a.div_euclid(-b);
            }
            if d > 0 {
                j = j.min((-c).div_euclid(d));
            }
            pivk[i as usize] = modulo(k1 + j, n);
        }
    }

    let mut lon = vec![0i64; n as usize];
    let mut j = pivk[(n - 1) as usize];
    lon[(n - 1) as usize] = j;
    for i in (0..n - 1).rev() {
        if cyclic(i + 1, pivk[i as usize], j) {
            j = pivk[i as usize];
        }
        lon[i as usize] = j;
    }

    let mut i = n - 1;
    while i >= 0 && cyclic(modulo(i + 1, n), j, lon[i as usize]) {
        lon[i as usize] = j;
        i -= 1;
    }
    lon
}

/// Standard deviation of the points `i..=j` from the straight line `i -> j`.
fn penalty3(pt: &[Lattice], sums: &Sums, i: usize, j: usize) -> f64 {
    let n = pt.len();
    let s = &sums.data;
    let (j, wrapped) = if j >= n { (j - n, true) } else { (j, false) };

    let (x, y, xy, x2, y2, k) = if wrapped {
        (
            s[j + 1].x - s[i].x + s[n].x,
            s[j + 1].y - s[i].y + s[n].y,
            s[j + 1].xy - s[i].xy + s[n].xy,
            s[j + 1].x2 - s[i].x2 + s[n].x2,
            s[j + 1].y2 - s[i].y2 + s[n].y2,
            (j + 1 + n - i) as f64,
        )
    } else {
        (
            s[j + 1].x - s[i].x,
            s[j + 1].y - s[i].y,
            s[j + 1].xy - s[i].xy,
            s[j + 1].x2 - s[i].x2,
            s[j + 1].y2 - s[i].y2,
            (j + 1 - i) as f64,
        )
    };

    let origin = sums.origin;
    let px = (pt[i].x + pt[j].x) as f64 / 2.0 - origin.x as f64;
    let py = (pt[i].y + pt[j].y) as f64 / 2.0 - origin.y as f64;
    let ey = (pt[j].x - pt[i].x) as f64;
    let ex = -((pt[j].y - pt[i].y) as f64);

    let a = (x2 - 2.0 * x * px) / k + px * px;
    let b = (xy - x * py - y * px) / k + px * py;
    let c = (y2 - 2.0 * y * py) / k + py * py;

    let s = ex * ex * a + 2.0 * ex * ey * b + ey * ey * c;
    s.max(0.0).sqrt()
}

/// Indices of the optimal polygon's vertices.
fn best_polygon(pt: &[Lattice], sums: &Sums, lon: &[i64]) -> Vec<usize> {
    let n = pt.len();
    let ni = n as i64;

    let mut clip0 = vec![0usize; n];
    for i in 0..n {
        let mut c = modulo(lon[modulo(i as i64 - 1, ni) as usize] - 1, ni);
        if c == i as i64 {
            c = modulo(i as i64 + 1, ni);
        }
        clip0[i] = if c < i as i64 { n } else { c as usize };
    }

    let mut clip1 = vec![0usize; n + 1];
    let mut j = 1;
    for (i, &c) in clip0.iter().enumerate() {
        while j <= c {
            clip1[j] = i;
            j += 1;
        }
    }

    let mut seg0 = vec![0usize; n + 1];
    let mut i = 0;
    let mut m = 0;
    while i < n {
        seg0[m] = i;
        i = clip0[i];
        m += 1;
    }
    seg0[m] = n;

    let mut seg1 = vec![0usize; n + 1];
    let mut i = n;
    for j in (1..=m).rev() {
        seg1[j] = i;
        i = clip1[i];
    }
    seg1[0] = 0;

    let mut pen = vec![0f64; n + 1];
    let mut prev = vec![0usize; n + 1];
    for j in 1..=m {
        for i in seg1[j]..=seg0[j] {
            let mut best = -1.0;
            let mut k = seg0[j - 1] as i64;
            while k >= clip1[i] as i64 {
                let this = penalty3(pt, sums, k as usize, i) + pen[k as usize];
                if best < 0.0 || this < best {
                    prev[i] = k as usize;
                    best = this;
                }
                k -= 1;
            }
            pen[i] = best;
        }
    }

    let mut polygon = vec![0usize; m];
    let mut i = n;
    for j in (0..m).rev() {
        i = prev[i];
        polygon[j] = i;
    }
    polygon
}

/// Symmetric 3x3 quadratic form.
#[derive(Debug, Clone, Copy, Default)]
struct Quad([[f64; 3]; 3]);

impl Quad {
    fn eval(&self, w: Point) -> f64 {
        let v = [w.x, w.y, 1.0];
        let mut sum = 0.0;
        for (l, row) in self.0.iter().enumerate() {
            for (k, q) in row.iter().enumerate() {
                sum += v[l] * q * v[k];
            }
        }
        sum
    }

    fn add_outer(&mut self, v: [f64; 3], d: f64) {
        for l in 0..3 {
            for k in 0..3 {
                self.0[l][k] += v[l] * v[k] / d;
            }
        }
    }
}

/// Least-squares line through points `i..=j` (cyclic): center and unit direction.
fn point_slope(pt: &[Lattice], sums: &Sums, i: i64, j: i64) -> (Point, Point) {
    let n = pt.len() as i64;
    let s = &sums.data;
    let (mut i, mut j, mut r) = (i, j, 0i64);
    while j >= n {
        j -= n;
        r += 1;
    }
    while i >= n {
        i -= n;
        r -= 1;
    }
    while j < 0 {
        j += n;
        r -= 1;
    }
    while i < 0 {
        i += n;
        r += 1;
    }
    let (iu, ju, nu) = (i as usize, j as usize, n as usize);
    let rf = r as f64;

    let x = s[ju + 1].x - s[iu].x + rf * s[nu].x;
    let y = s[ju + 1].y - s[iu].y + rf * s[nu].y;
    let x2 = s[ju + 1].x2 - s[iu].x2 + rf * s[nu].x2;
    let xy = s[ju + 1].xy - s[iu].xy + rf * s[nu].xy;
    let y2 = s[ju + 1].y2 - s[iu].y2 + rf * s[nu].y2;
    let k = (j + 1 - i + r * n) as f64;

    let center = Point::new(x / k, y / k);

    let mut a = (x2 - x * x / k) / k;
    let b = (xy - x * y / k) / k;
    let mut c = (y2 - y * y / k) / k;

    let lambda2 = (a + c + ((a - c) * (a - c) + 4.0 * b * b).sqrt()) / 2.0;
    a -= lambda2;
    c -= lambda2;

    let dir = if a.abs() >= c.abs() {
        let l = (a * a + b * b).sqrt();
        if l != 0.0 { Point::new(-b / l, a / l) } else { Point::default() }
    } else {
        let l = (c * c + b * b).sqrt();
        if l != 0.0 { Point::new(-c / l, b / l) } else { Point::default() }
    };
    (center, dir)
}

fn adjust_vertices(
    pt: &[Lattice],
    sums: &Sums,
    polygon: &[usize],
    max_iterations: u32,
) -> Result<Vec<Point>, TraceError> {
    let m = polygon.len() as i64;
    let n = pt.len() as i64;
    let origin = sums.origin;

    let mut q = Vec::with_capacity(polygon.len());
    for i in 0..m {
        let start = polygon[i as usize] as i64;
        let next = polygon[modulo(i + 1, m) as usize] as i64;
        let end = modulo(next - start, n) + start;
        let (center, dir) = point_slope(pt, sums, start, end);

        let mut quad = Quad::default();
        let d = dir.x * dir.x + dir.y * dir.y;
        if d != 0.0 {
            let v0 = dir.y;
            let v1 = -dir.x;
            let v2 = -v1 * center.y - v0 * center.x;
            quad.add_outer([v0, v1, v2], d);
        }
        q.push(quad);
    }

    let mut vertices = Vec::with_capacity(polygon.len());
    for i in 0..m {
        let p = pt[polygon[i as usize]];
        let s = Point::new((p.x - origin.x) as f64, (p.y - origin.y) as f64);
        let j = modulo(i - 1, m) as usize;

        let mut quad = Quad::default();
        for l in 0..3 {
            for k in 0..3 {
                quad.0[l][k] = q[j].0[l][k] + q[i as usize].0[l][k];
            }
        }

        let mut iterations = 0;
        let w = loop {
            let qm = &quad.0;
            let det = qm[0][0] * qm[1][1] - qm[0][1] * qm[1][0];
            if det != 0.0 {
                break Point::new(
                    (-qm[0][2] * qm[1][1] + qm[1][2] * qm[0][1]) / det,
                    (qm[0][2] * qm[1][0] - qm[1][2] * qm[0][0]) / det,
                );
            }
            if iterations >= max_iterations {
                return Err(TraceError::SolverDiverged {
                    iterations: max_iterations,
                });
            }
            iterations += 1;

            // Degenerate form: add a constraint through the lattice point.
            let (v0, v1) = if qm[0][0] > qm[1][1] {
                (-qm[0][1], qm[0][0])
            } else if qm[1][1] != 0.0 {
                (-qm[1][1], qm[1][0])
            } else {
                (1.0, 0.0)
            };
            let d = v0 * v0 + v1 * v1;
            let v2 = -v1 * s.y - v0 * s.x;
            quad.add_outer([v0, v1, v2], d);
        };

        if (w.x - s.x).abs() <= 0.5 && (w.y - s.y).abs() <= 0.5 {
            vertices.push(Point::new(w.x + origin.x as f64, w.y + origin.y as f64));
            continue;
        }

        // Solution left the unit cell: minimize on the cell boundary instead.
        let qm = quad.0;
        let mut min = quad.eval(s);
        let mut best = s;

        if qm[0][0] != 0.0 {
            for z in 0..2 {
                let wy = s.y - 0.5 + z as f64;
                let wx = -(qm[0][1] * wy + qm[0][2]) / qm[0][0];
                let cand_point = Point::new(wx, wy);
                let cand = quad.eval(cand_point);
                if (wx - s.x).abs() <= 0.5 && cand < min {
                    min = cand;
                    best = cand_point;
                }
            }
        }

        if qm[1][1] != 0.0 {
            for z in 0..2 {
                let wx = s.x - 0.5 + z as f64;
                let wy = -(qm[1][0] * wx + qm[1][2]) / qm[1][1];
                let cand_point = Point::new(wx, wy);
                let cand = quad.eval(cand_point);
                if (wy - s.y).abs() <= 0.5 && cand < min {
                    min = cand;
                    best = cand_point;
                }
            }
        }

        for l in 0..2 {
            for k in 0..2 {
                let corner = Point::new(s.x - 0.5 + l as f64, s.y - 0.5 + k as f64);
                let cand = quad.eval(corner);
                if cand < min {
                    min = cand;
                    best = corner;
                }
            }
        }

        vertices.push(Point::new(best.x + origin.x as f64, best.y + origin.y as f64));
    }

    Ok(vertices)
}
