//! Outline simplification using the Ramer-Douglas-Peucker algorithm.
//!
//! Reduces point count by removing points that lie within a given
//! tolerance of the chord between their retained neighbours. Outlines
//! from contour extraction are rings, so [`simplify_closed`] splits the
//! ring into two arcs before recursing; [`simplify`] handles open paths.
//!
//! The output is always a subsequence of the input vertices. Because the
//! split points chosen at each level do not depend on the tolerance, a
//! larger tolerance never keeps more points than a smaller one.

use crate::types::{Point, Polyline};

/// Simplify an open polyline.
///
/// Points within `tolerance` pixels of the line between their endpoints
/// are removed. Both endpoints are always kept.
///
/// Polylines with fewer than 3 points are returned unchanged.
#[must_use = "returns the simplified polyline"]
pub fn simplify(polyline: &Polyline, tolerance: f64) -> Polyline {
    let points = polyline.points();
    if points.len() < 3 {
        return polyline.clone();
    }

    let mut kept = vec![false; points.len()];
    kept[0] = true;
    kept[points.len() - 1] = true;

    rdp_recurse(points, 0, points.len() - 1, tolerance, &mut kept);

    collect_kept(points, &kept)
}

/// Simplify a closed outline, treating the last point as adjacent to the
/// first.
///
/// The first point anchors the ring. The point farthest from it (first
/// one on ties) splits the ring into two arcs, each simplified with RDP.
/// Anchor and split point are always retained, so any ring with at least
/// two distinct points keeps at least two points. A ring whose points all
/// coincide collapses to its first point.
///
/// Outlines with fewer than 3 points are returned unchanged.
#[must_use = "returns the simplified outline"]
pub fn simplify_closed(outline: &Polyline, tolerance: f64) -> Polyline {
    let points = outline.points();
    let n = points.len();
    if n < 3 {
        return outline.clone();
    }

    let anchor = points[0];
    let mut split = 0;
    let mut max_dist = 0.0;
    for (i, &p) in points.iter().enumerate().skip(1) {
        let d = p.distance_squared(anchor);
        if d > max_dist {
            max_dist = d;
            split = i;
        }
    }
    if split == 0 {
        return Polyline::new(vec![anchor]);
    }

    // Index `n` stands for the anchor again, closing the ring.
    let mut ring = Vec::with_capacity(n + 1);
    ring.extend_from_slice(points);
    ring.push(anchor);

    let mut kept = vec![false; n + 1];
    kept[0] = true;
    kept[split] = true;
    rdp_recurse(&ring, 0, split, tolerance, &mut kept);
    rdp_recurse(&ring, split, n, tolerance, &mut kept);

    collect_kept(points, &kept[..n])
}

/// Simplify every outline independently, preserving order.
#[must_use = "returns the simplified outlines"]
pub fn simplify_outlines(outlines: &[Polyline], tolerance: f64) -> Vec<Polyline> {
    outlines
        .iter()
        .map(|o| simplify_closed(o, tolerance))
        .collect()
}

fn collect_kept(points: &[Point], kept: &[bool]) -> Polyline {
    Polyline::new(
        points
            .iter()
            .zip(kept)
            .filter(|&(_, k)| *k)
            .map(|(&p, _)| p)
            .collect(),
    )
}

/// Recursive step of the Ramer-Douglas-Peucker algorithm.
///
/// Finds the point between `start` and `end` that is farthest from the
/// line segment between them. If that distance exceeds `tolerance`, the
/// point is kept and both sub-segments are processed recursively.
fn rdp_recurse(points: &[Point], start: usize, end: usize, tolerance: f64, kept: &mut [bool]) {
    if end <= start + 1 {
        return;
    }

    let mut max_dist = 0.0;
    let mut max_idx = start;

    for i in (start + 1)..end {
        let d = perpendicular_distance(points[i], points[start], points[end]);
        if d > max_dist {
            max_dist = d;
            max_idx = i;
        }
    }

    if max_dist > tolerance {
        kept[max_idx] = true;
        rdp_recurse(points, start, max_idx, tolerance, kept);
        rdp_recurse(points, max_idx, end, tolerance, kept);
    }
}

/// Perpendicular distance from point `p` to the line defined by `a` and `b`.
///
/// Uses the formula: |cross(b-a, p-a)| / |b-a|.
/// When `a` and `b` coincide, returns the distance from `p` to `a`.
fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length_sq = dx.mul_add(dx, dy * dy);

    if length_sq == 0.0 {
        return p.distance(a);
    }

    let cross = dx.mul_add(a.y - p.y, -(dy * (a.x - p.x)));
    cross.abs() / length_sq.sqrt()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn ring(coords: &[(f64, f64)]) -> Polyline {
        Polyline::new(coords.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    fn is_subsequence(sub: &[Point], of: &[Point]) -> bool {
        let mut it = of.iter();
        sub.iter().all(|p| it.any(|q| q == p))
    }

    // --- open polylines ---

    #[test]
    fn two_points_unchanged() {
        let pl = ring(&[(0.0, 0.0), (10.0, 0.0)]);
        assert_eq!(simplify(&pl, 1.0).len(), 2);
    }

    #[test]
    fn collinear_points_collapse_to_endpoints() {
        let pl = ring(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0), (4.0, 4.0)]);
        let result = simplify(&pl, 0.1);
        assert_eq!(result.points(), &[Point::new(0.0, 0.0), Point::new(4.0, 4.0)]);
    }

    #[test]
    fn zigzag_retains_peaks_until_tolerance_exceeds_them() {
        let pl = ring(&[(0.0, 0.0), (2.0, 5.0), (4.0, 0.0), (6.0, 5.0), (8.0, 0.0)]);
        assert_eq!(simplify(&pl, 1.0).len(), 5);
        assert_eq!(simplify(&pl, 10.0).len(), 2);
    }

    // --- closed outlines ---

    #[test]
    fn empty_outline_unchanged() {
        assert!(simplify_closed(&Polyline::new(vec![]), 1.0).is_empty());
    }

    #[test]
    fn square_corners_survive() {
        let square = ring(&[(3.0, 3.0), (3.0, 6.0), (6.0, 6.0), (6.0, 3.0)]);
        let result = simplify_closed(&square, 0.5);
        assert_eq!(result, square);
    }

    #[test]
    fn closing_edge_is_considered() {
        // (5, 0.2) sits on the wrap-around edge from the last point back to
        // the first and is within tolerance of it.
        let outline = ring(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0), (5.0, 0.2)]);
        let result = simplify_closed(&outline, 0.5);
        assert_eq!(result.len(), 4);
        assert!(!result.points().contains(&Point::new(5.0, 0.2)));
    }

    #[test]
    fn densely_sampled_circle_coarsens() {
        let points: Vec<Point> = (0..64)
            .map(|i| {
                let t = f64::from(i) / 64.0 * std::f64::consts::TAU;
                Point::new(50.0 + 20.0 * t.cos(), 50.0 + 20.0 * t.sin())
            })
            .collect();
        let circle = Polyline::new(points);
        let fine = simplify_closed(&circle, 0.1);
        let coarse = simplify_closed(&circle, 2.0);
        assert!(coarse.len() < fine.len());
        assert!(coarse.len() >= 2);
    }

    #[test]
    fn coincident_ring_collapses_to_one_point() {
        let outline = ring(&[(2.0, 2.0), (2.0, 2.0), (2.0, 2.0)]);
        let result = simplify_closed(&outline, 1.0);
        assert_eq!(result.points(), &[Point::new(2.0, 2.0)]);
    }

    #[test]
    fn simplify_outlines_is_one_to_one() {
        let outlines = vec![
            ring(&[(0.0, 0.0), (0.0, 4.0), (4.0, 4.0), (4.0, 0.0)]),
            ring(&[(1.0, 1.0)]),
            Polyline::new(vec![]),
        ];
        let result = simplify_outlines(&outlines, 1.0);
        assert_eq!(result.len(), 3);
        assert_eq!(result[0].len(), 4);
        assert_eq!(result[1].len(), 1);
        assert!(result[2].is_empty());
    }

    #[test]
    fn simplify_outlines_empty() {
        assert!(simplify_outlines(&[], 1.0).is_empty());
    }

    // --- perpendicular distance ---

    #[test]
    fn perpendicular_distance_diagonal_segment() {
        let d = perpendicular_distance(
            Point::new(2.0, -1.0),
            Point::new(0.0, 0.0),
            Point::new(4.0, 2.0),
        );
        let expected = 8.0 / 20.0_f64.sqrt();
        assert!((d - expected).abs() < 1e-10, "got {d}, expected {expected}");
    }

    #[test]
    fn perpendicular_distance_coincident_endpoints() {
        let d = perpendicular_distance(
            Point::new(3.0, 4.0),
            Point::new(0.0, 0.0),
            Point::new(0.0, 0.0),
        );
        assert!((d - 5.0).abs() < 1e-10);
    }

    fn arb_outline() -> impl Strategy<Value = Polyline> {
        prop::collection::vec((-50i32..50, -50i32..50), 0..40).prop_map(|coords| {
            Polyline::new(
                coords
                    .into_iter()
                    .map(|(x, y)| Point::new(f64::from(x), f64::from(y)))
                    .collect(),
            )
        })
    }

    proptest! {
        #[test]
        fn output_is_subsequence_of_input(outline in arb_outline(), tolerance in 0.0f64..20.0) {
            let result = simplify_closed(&outline, tolerance);
            prop_assert!(is_subsequence(result.points(), outline.points()));
            prop_assert_eq!(result.is_empty(), outline.is_empty());
        }

        #[test]
        fn larger_tolerance_never_keeps_more(
            outline in arb_outline(),
            t1 in 0.0f64..10.0,
            delta in 0.0f64..10.0,
        ) {
            let fine = simplify_closed(&outline, t1);
            let coarse = simplify_closed(&outline, t1 + delta);
            prop_assert!(coarse.len() <= fine.len());
        }
    }
}
