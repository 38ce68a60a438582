//! Planar geometry helpers for polygons and contours

use glam::DVec2;

/// Squared distance from `p` to the segment `a`-`b`
pub fn segment_distance_squared(p: DVec2, a: DVec2, b: DVec2) -> f64 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 == 0.0 {
        return p.distance_squared(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance_squared(a + ab * t)
}

/// Twice the signed area of triangle `a b c`: positive when counter-clockwise
pub fn orient(a: DVec2, b: DVec2, c: DVec2) -> f64 {
    (b - a).perp_dot(c - a)
}

/// Signed area of a closed loop (shoelace). Positive for counter-clockwise.
pub fn signed_area(points: &[DVec2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        sum += a.perp_dot(b);
    }
    sum * 0.5
}

/// Winding number of the closed loop around `p`
pub fn winding_number(points: &[DVec2], p: DVec2) -> i32 {
    let n = points.len();
    let mut wn = 0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        if a.y <= p.y {
            if b.y > p.y && orient(a, b, p) > 0.0 {
                wn += 1;
            }
        } else if b.y <= p.y && orient(a, b, p) < 0.0 {
            wn -= 1;
        }
    }
    wn
}

/// Even-odd rule: true when a ray from `p` crosses the loop an odd number of times
pub fn crossings_odd(points: &[DVec2], p: DVec2) -> bool {
    let n = points.len();
    let mut inside = false;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x {
                inside = !inside;
            }
        }
    }
    inside
}

/// True when segments `a0-a1` and `b0-b1` cross or touch.
///
/// Collinear overlapping segments count as intersecting.
pub fn segments_intersect(a0: DVec2, a1: DVec2, b0: DVec2, b1: DVec2) -> bool {
    let d1 = orient(b0, b1, a0);
    let d2 = orient(b0, b1, a1);
    let d3 = orient(a0, a1, b0);
    let d4 = orient(a0, a1, b1);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    let on_segment = |p: DVec2, q: DVec2, r: DVec2| {
        r.x >= p.x.min(q.x) && r.x <= p.x.max(q.x) && r.y >= p.y.min(q.y) && r.y <= p.y.max(q.y)
    };

    (d1 == 0.0 && on_segment(b0, b1, a0))
        || (d2 == 0.0 && on_segment(b0, b1, a1))
        || (d3 == 0.0 && on_segment(a0, a1, b0))
        || (d4 == 0.0 && on_segment(a0, a1, b1))
}

/// True when any two non-adjacent edges of the closed loop intersect
pub fn is_self_intersecting(points: &[DVec2]) -> bool {
    let n = points.len();
    for i in 0..n {
        let a0 = points[i];
        let a1 = points[(i + 1) % n];
        for j in (i + 1)..n {
            // skip edges sharing a vertex with edge i
            if j == i + 1 || (i == 0 && j == n - 1) {
                continue;
            }
            let b0 = points[j];
            let b1 = points[(j + 1) % n];
            if segments_intersect(a0, a1, b0, b1) {
                return true;
            }
        }
    }
    false
}

/// Convert polar coordinates to cartesian
pub fn polar(radius: f64, theta: f64) -> DVec2 {
    DVec2::new(radius * theta.cos(), radius * theta.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square() -> Vec<DVec2> {
        vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(2.0, 0.0),
            DVec2::new(2.0, 2.0),
            DVec2::new(0.0, 2.0),
        ]
    }

    fn pentagram() -> Vec<DVec2> {
        (0..5_i32)
            .map(|i| {
                let theta = std::f64::consts::FRAC_PI_2 + f64::from(i) * 0.8 * std::f64::consts::PI;
                polar(1.0, theta)
            })
            .collect()
    }

    #[test]
    fn segment_distance_clamps_to_endpoints() {
        let a = DVec2::ZERO;
        let b = DVec2::new(2.0, 0.0);
        assert_relative_eq!(segment_distance_squared(DVec2::new(1.0, 3.0), a, b), 9.0);
        assert_relative_eq!(segment_distance_squared(DVec2::new(-3.0, 4.0), a, b), 25.0);
    }

    #[test]
    fn square_area_and_orientation() {
        let mut s = square();
        assert_relative_eq!(signed_area(&s), 4.0);
        s.reverse();
        assert_relative_eq!(signed_area(&s), -4.0);
    }

    #[test]
    fn winding_and_parity_agree_on_simple_polygon() {
        let s = square();
        let p = DVec2::new(1.0, 1.0);
        assert_eq!(winding_number(&s, p), 1);
        assert!(crossings_odd(&s, p));
        assert_eq!(winding_number(&s, DVec2::new(3.0, 1.0)), 0);
        assert!(!crossings_odd(&s, DVec2::new(3.0, 1.0)));
    }

    #[test]
    fn pentagram_center_differs_between_rules() {
        let star = pentagram();
        assert_eq!(winding_number(&star, DVec2::ZERO).abs(), 2);
        assert!(!crossings_odd(&star, DVec2::ZERO));
    }

    #[test]
    fn detects_self_intersection() {
        assert!(!is_self_intersecting(&square()));
        assert!(is_self_intersecting(&pentagram()));
        let bow_tie = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(0.0, 1.0),
        ];
        assert!(is_self_intersecting(&bow_tie));
    }
}
