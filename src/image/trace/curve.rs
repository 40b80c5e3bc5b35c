//! Corner detection, Bezier smoothing and curve optimization.

use std::ops::{Add, Mul, Sub};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(super) struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point {
    type Output = Self;
    fn add(self, o: Self) -> Self {
        Self::new(self.x + o.x, self.y + o.y)
    }
}

impl Sub for Point {
    type Output = Self;
    fn sub(self, o: Self) -> Self {
        Self::new(self.x - o.x, self.y - o.y)
    }
}

impl Mul<f64> for Point {
    type Output = Self;
    fn mul(self, k: f64) -> Self {
        Self::new(self.x * k, self.y * k)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Segment {
    Corner,
    Curve,
}

/// Closed curve; segment `i` ends at `c[i][2]` and starts where `i - 1` ends.
///
/// Corners use `c[i][1]` (the vertex) and `c[i][2]`; curves use all three
/// as Bezier control, control, end point.
#[derive(Debug, Clone)]
pub(super) struct Curve {
    pub tag: Vec<Segment>,
    pub c: Vec<[Point; 3]>,
    pub vertex: Vec<Point>,
    pub alpha: Vec<f64>,
    pub alpha0: Vec<f64>,
    pub beta: Vec<f64>,
}

impl Curve {
    fn new(n: usize) -> Self {
        Self {
            tag: vec![Segment::Corner; n],
            c: vec![[Point::default(); 3]; n],
            vertex: vec![Point::default(); n],
            alpha: vec![0.0; n],
            alpha0: vec![0.0; n],
            beta: vec![0.0; n],
        }
    }

    pub fn len(&self) -> usize {
        self.tag.len()
    }

    pub fn is_finite(&self) -> bool {
        self.c.iter().flatten().all(|p| p.is_finite())
    }
}

// ============================================================================
// geometry helpers
// ============================================================================

#[inline]
fn modulo(a: i64, n: usize) -> usize {
    a.rem_euclid(n as i64) as usize
}

#[inline]
fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// `a + lambda * (b - a)`
#[inline]
fn interval(lambda: f64, a: Point, b: Point) -> Point {
    a + (b - a) * lambda
}

/// Twice the signed area of the triangle `p0 p1 p2`.
#[inline]
fn dpara(p0: Point, p1: Point, p2: Point) -> f64 {
    (p1.x - p0.x) * (p2.y - p0.y) - (p2.x - p0.x) * (p1.y - p0.y)
}

/// Normal of `p0 -> p2`, snapped to the 8 compass directions.
#[inline]
fn dorth_infty(p0: Point, p2: Point) -> Point {
    Point::new(-sign(p2.y - p0.y), sign(p2.x - p0.x))
}

#[inline]
fn ddenom(p0: Point, p2: Point) -> f64 {
    let r = dorth_infty(p0, p2);
    r.y * (p2.x - p0.x) - r.x * (p2.y - p0.y)
}

#[inline]
fn cprod(p0: Point, p1: Point, p2: Point, p3: Point) -> f64 {
    (p1.x - p0.x) * (p3.y - p2.y) - (p3.x - p2.x) * (p1.y - p0.y)
}

#[inline]
fn iprod(p0: Point, p1: Point, p2: Point) -> f64 {
    (p1.x - p0.x) * (p2.x - p0.x) + (p1.y - p0.y) * (p2.y - p0.y)
}

#[inline]
fn iprod1(p0: Point, p1: Point, p2: Point, p3: Point) -> f64 {
    (p1.x - p0.x) * (p3.x - p2.x) + (p1.y - p0.y) * (p3.y - p2.y)
}

#[inline]
fn ddist(p: Point, q: Point) -> f64 {
    ((p.x - q.x) * (p.x - q.x) + (p.y - q.y) * (p.y - q.y)).sqrt()
}

fn bezier(t: f64, p0: Point, p1: Point, p2: Point, p3: Point) -> Point {
    let s = 1.0 - t;
    p0 * (s * s * s) + p1 * (3.0 * s * s * t) + p2 * (3.0 * t * t * s) + p3 * (t * t * t)
}

/// Parameter where the Bezier's tangent is parallel to `q0 -> q1`, or -1.
fn tangent(p0: Point, p1: Point, p2: Point, p3: Point, q0: Point, q1: Point) -> f64 {
    let a_ = cprod(p0, p1, q0, q1);
    let b_ = cprod(p1, p2, q0, q1);
    let c_ = cprod(p2, p3, q0, q1);

    let a = a_ - 2.0 * b_ + c_;
    let b = -2.0 * a_ + 2.0 * b_;
    let c = a_;
    let d = b * b - 4.0 * a * c;

    if a == 0.0 || d < 0.0 {
        return -1.0;
    }

    let s = d.sqrt();
    let r1 = (-b + s) / (2.0 * a);
    let r2 = (-b - s) / (2.0 * a);
    if (0.0..=1.0).contains(&r1) {
        r1
    } else if (0.0..=1.0).contains(&r2) {
        r2
    } else {
        -1.0
    }
}

// ============================================================================
// smoothing
// ============================================================================

/// Turn polygon vertices into corners and curve segments.
///
/// A vertex whose smoothness `alpha` reaches `alpha_max` stays a corner.
pub(super) fn smooth(vertices: &[Point], alpha_max: f64) -> Curve {
    let m = vertices.len();
    let mut curve = Curve::new(m);
    curve.vertex = vertices.to_vec();

    for i in 0..m {
        let j = (i + 1) % m;
        let k = (i + 2) % m;
        let (vi, vj, vk) = (vertices[i], vertices[j], vertices[k]);
        let p4 = interval(0.5, vk, vj);

        let denom = ddenom(vi, vk);
        let mut alpha = if denom != 0.0 {
            let dd = (dpara(vi, vj, vk) / denom).abs();
            let alpha = if dd > 1.0 { 1.0 - 1.0 / dd } else { 0.0 };
            alpha / 0.75
        } else {
            4.0 / 3.0
        };
        curve.alpha0[j] = alpha;

        if alpha >= alpha_max {
            curve.tag[j] = Segment::Corner;
            curve.c[j][1] = vj;
            curve.c[j][2] = p4;
        } else {
            alpha = alpha.clamp(0.55, 1.0);
            curve.tag[j] = Segment::Curve;
            curve.c[j][0] = interval(0.5 + 0.5 * alpha, vi, vj);
            curve.c[j][1] = interval(0.5 + 0.5 * alpha, vk, vj);
            curve.c[j][2] = p4;
        }
        curve.alpha[j] = alpha;
        curve.beta[j] = 0.5;
    }
    curve
}

// ============================================================================
// curve optimization
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
struct Opti {
    pen: f64,
    c: [Point; 2],
    t: f64,
    s: f64,
    alpha: f64,
}

/// Merge runs of curve segments into single Beziers within `tolerance`.
pub(super) fn optimize(curve: &Curve, tolerance: f64) -> Curve {
    let m = curve.len();
    let vert = &curve.vertex;

    let convc: Vec<f64> = (0..m)
        .map(|i| match curve.tag[i] {
            Segment::Curve => sign(dpara(
                vert[modulo(i as i64 - 1, m)],
                vert[i],
                vert[(i + 1) % m],
            )),
            Segment::Corner => 0.0,
        })
        .collect();

    // Area under the curve, prefix-summed.
    let mut areac = vec![0.0; m + 1];
    let mut area = 0.0;
    let p0 = vert[0];
    for i in 0..m {
        let i1 = (i + 1) % m;
        if curve.tag[i1] == Segment::Curve {
            let alpha = curve.alpha[i1];
            area += 0.3 * alpha * (4.0 - alpha) * dpara(curve.c[i][2], vert[i1], curve.c[i1][2]) / 2.0;
            area += dpara(p0, curve.c[i][2], curve.c[i1][2]) / 2.0;
        }
        areac[i + 1] = area;
    }

    let mut pt = vec![0i64; m + 1];
    let mut pen = vec![0.0; m + 1];
    let mut len = vec![0usize; m + 1];
    let mut opt = vec![Opti::default(); m + 1];
    pt[0] = -1;

    for j in 1..=m {
        pt[j] = j as i64 - 1;
        pen[j] = pen[j - 1];
        len[j] = len[j - 1] + 1;

        for i in (0..j.saturating_sub(1)).rev() {
            let Some(o) = opti_penalty(curve, i, j % m, tolerance, &convc, &areac) else {
                break;
            };
            if len[j] > len[i] + 1 || (len[j] == len[i] + 1 && pen[j] > pen[i] + o.pen) {
                pt[j] = i as i64;
                pen[j] = pen[i] + o.pen;
                len[j] = len[i] + 1;
                opt[j] = o;
            }
        }
    }

    let om = len[m];
    let mut out = Curve::new(om);
    let mut s = vec![0.0; om];
    let mut t = vec![0.0; om];

    let mut j = m;
    for i in (0..om).rev() {
        let jm = j % m;
        if pt[j] == j as i64 - 1 {
            out.tag[i] = curve.tag[jm];
            out.c[i] = curve.c[jm];
            out.vertex[i] = curve.vertex[jm];
            out.alpha[i] = curve.alpha[jm];
            out.alpha0[i] = curve.alpha0[jm];
            out.beta[i] = curve.beta[jm];
            s[i] = 1.0;
            t[i] = 1.0;
        } else {
            let o = opt[j];
            out.tag[i] = Segment::Curve;
            out.c[i] = [o.c[0], o.c[1], curve.c[jm][2]];
            out.vertex[i] = interval(o.s, curve.c[jm][2], vert[jm]);
            out.alpha[i] = o.alpha;
            out.alpha0[i] = o.alpha;
            s[i] = o.s;
            t[i] = o.t;
        }
        j = pt[j].max(0) as usize;
    }

    for i in 0..om {
        let i1 = (i + 1) % om;
        out.beta[i] = s[i] / (s[i] + t[i1]);
    }
    out
}

/// Penalty of replacing segments `i+1 ..= j` by one Bezier, or `None`
/// when the merge is impossible.
fn opti_penalty(
    curve: &Curve,
    i: usize,
    j: usize,
    tolerance: f64,
    convc: &[f64],
    areac: &[f64],
) -> Option<Opti> {
    let m = curve.len();
    let vertex = &curve.vertex;

    if i == j {
        return None;
    }

    let i1 = (i + 1) % m;
    let mut k1 = i1;
    let conv = convc[k1];
    if conv == 0.0 {
        return None;
    }

    // Convexity, consistency and a total turn below 179 degrees.
    let d = ddist(vertex[i], vertex[i1]);
    let mut k = k1;
    while k != j {
        k1 = (k + 1) % m;
        let k2 = (k + 2) % m;
        if convc[k1] != conv {
            return None;
        }
        if sign(cprod(vertex[i], vertex[i1], vertex[k1], vertex[k2])) != conv {
            return None;
        }
        if iprod1(vertex[i], vertex[i1], vertex[k1], vertex[k2])
            < d * ddist(vertex[k1], vertex[k2]) * -0.999847695156
        {
            return None;
        }
        k = k1;
    }

    let p0 = curve.c[i][2];
    let mut p1 = vertex[i1];
    let mut p2 = vertex[j];
    let p3 = curve.c[j][2];

    let mut area = areac[j] - areac[i];
    area -= dpara(vertex[0], curve.c[i][2], curve.c[j][2]) / 2.0;
    if i >= j {
        area += areac[m];
    }

    let a1 = dpara(p0, p1, p2);
    let a2 = dpara(p0, p1, p3);
    let a3 = dpara(p0, p2, p3);
    let a4 = a1 + a3 - a2;

    if a2 == a1 {
        return None;
    }

    let t = a3 / (a3 - a4);
    let s = a2 / (a2 - a1);
    if !t.is_finite() || !s.is_finite() {
        return None;
    }
    let a = a2 * t / 2.0;
    if a == 0.0 {
        return None;
    }

    let r = area / a;
    let alpha = 2.0 - (4.0 - r / 0.3).sqrt();
    if !alpha.is_finite() {
        return None;
    }

    let mut res = Opti {
        pen: 0.0,
        c: [interval(t * alpha, p0, p1), interval(s * alpha, p3, p2)],
        t,
        s,
        alpha,
    };
    p1 = res.c[0];
    p2 = res.c[1];

    // The new curve must stay close to every original edge.
    let mut k = i1;
    while k != j {
        let k1 = (k + 1) % m;
        let tt = tangent(p0, p1, p2, p3, vertex[k], vertex[k1]);
        if tt < -0.5 {
            return None;
        }
        let pt = bezier(tt, p0, p1, p2, p3);
        let d = ddist(vertex[k], vertex[k1]);
        if d == 0.0 {
            return None;
        }
        let d1 = dpara(vertex[k], vertex[k1], pt) / d;
        if !(d1.abs() <= tolerance) {
            return None;
        }
        if iprod(vertex[k], vertex[k1], pt) < 0.0 || iprod(vertex[k1], vertex[k], pt) < 0.0 {
            return None;
        }
        res.pen += d1 * d1;
        k = k1;
    }

    // ...and to every original corner.
    let mut k = i;
    while k != j {
        let k1 = (k + 1) % m;
        let tt = tangent(p0, p1, p2, p3, curve.c[k][2], curve.c[k1][2]);
        if tt < -0.5 {
            return None;
        }
        let pt = bezier(tt, p0, p1, p2, p3);
        let d = ddist(curve.c[k][2], curve.c[k1][2]);
        if d == 0.0 {
            return None;
        }
        let mut d1 = dpara(curve.c[k][2], curve.c[k1][2], pt) / d;
        let mut d2 = dpara(curve.c[k][2], curve.c[k1][2], vertex[k1]) / d;
        d2 *= 0.75 * curve.alpha[k1];
        if d2 < 0.0 {
            d1 = -d1;
            d2 = -d2;
        }
        if d1 < d2 - tolerance {
            return None;
        }
        if d1 < d2 {
            res.pen += (d1 - d2) * (d1 - d2);
        }
        k = k1;
    }

    Some(res)
}
