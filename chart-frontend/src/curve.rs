//! Monotone cubic interpolation in x (Fritsch–Carlson / Steffen tangents), emitted
//! as an SVG path. The curve never overshoots between points, so a rising
//! frontier stays rising on screen.

use crate::surface::fmt_num;

fn sign(v: f64) -> f64 {
    if v < 0.0 {
        -1.0
    } else {
        1.0
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Tangent at `p1` from its two neighbouring secants.
fn interior_tangent(p0: (f64, f64), p1: (f64, f64), p2: (f64, f64)) -> f64 {
    let h0 = p1.0 - p0.0;
    let h1 = p2.0 - p1.0;
    let s0 = (p1.1 - p0.1) / h0;
    let s1 = (p2.1 - p1.1) / h1;
    let p = (s0 * h1 + s1 * h0) / (h0 + h1);
    if s0.is_nan() || s1.is_nan() || p.is_nan() {
        return 0.0;
    }
    finite_or_zero((sign(s0) + sign(s1)) * s0.abs().min(s1.abs()).min(0.5 * p.abs()))
}

/// Tangent at an end point, from the adjacent secant and the neighbour's tangent.
fn end_tangent(a: (f64, f64), b: (f64, f64), neighbour: f64) -> f64 {
    let h = b.0 - a.0;
    if h == 0.0 {
        return neighbour;
    }
    finite_or_zero((3.0 * (b.1 - a.1) / h - neighbour) / 2.0)
}

fn pt(p: (f64, f64)) -> String {
    format!("{},{}", fmt_num(p.0), fmt_num(p.1))
}

/// SVG path data through `points` (sorted by x). Empty for no points, a straight
/// segment for two.
pub fn monotone_x_path(points: &[(f64, f64)]) -> String {
    match points.len() {
        0 => String::new(),
        1 => format!("M{}", pt(points[0])),
        2 => format!("M{}L{}", pt(points[0]), pt(points[1])),
        n => {
            let mut tangents = vec![0.0; n];
            for i in 1..n - 1 {
                tangents[i] = interior_tangent(points[i - 1], points[i], points[i + 1]);
            }
            tangents[0] = end_tangent(points[0], points[1], tangents[1]);
            tangents[n - 1] = end_tangent(points[n - 2], points[n - 1], tangents[n - 2]);

            let mut d = format!("M{}", pt(points[0]));
            for i in 0..n - 1 {
                let (x0, y0) = points[i];
                let (x1, y1) = points[i + 1];
                let dx = (x1 - x0) / 3.0;
                d.push_str(&format!(
                    "C{} {} {}",
                    pt((x0 + dx, y0 + dx * tangents[i])),
                    pt((x1 - dx, y1 - dx * tangents[i + 1])),
                    pt((x1, y1))
                ));
            }
            d
        }
    }
}
