//! Geometry kernel: point/vector algebra, polygon winding/area/bounds,
//! point-in-polygon, segment containment and sliding-distance queries.
//!
//! Everything here is pure and stateless. All floating comparisons go through
//! [`almost_equal`]; this tolerance discipline is what keeps the orbiting NFP
//! search stable against duplicate and collinear vertices.

use polynest_core::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Floating point comparison tolerance.
pub const TOL: f64 = 1e-9;

/// Compares two floats under the default tolerance.
#[inline]
pub fn almost_equal(a: f64, b: f64) -> bool {
    (a - b).abs() < TOL
}

/// Compares two floats under an explicit tolerance.
#[inline]
pub fn almost_equal_tol(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() < tolerance
}

// ============================================================================
// Point
// ============================================================================

/// A 2D point / vector.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn add(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    #[inline]
    pub fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    #[inline]
    pub fn scale(self, factor: f64) -> Point {
        Point::new(self.x * factor, self.y * factor)
    }

    #[inline]
    pub fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }

    #[inline]
    pub fn dot(self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// 2D cross product (z component of the 3D cross).
    #[inline]
    pub fn cross(self, other: Point) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Right-hand normal `(y, -x)`.
    #[inline]
    pub fn normal(self) -> Point {
        Point::new(self.y, -self.x)
    }

    #[inline]
    pub fn length_squared(self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    #[inline]
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Scales to unit length. Vectors already within tolerance of unit length
    /// are returned as-is.
    pub fn normalized(self) -> Point {
        if almost_equal(self.length_squared(), 1.0) {
            return self;
        }
        self.scale(1.0 / self.length())
    }

    /// Rotates by `angle` radians around the origin.
    pub fn rotated(self, angle: f64) -> Point {
        let (sin, cos) = angle.sin_cos();
        Point::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    #[inline]
    pub fn almost_equal(self, other: Point) -> bool {
        almost_equal(self.x, other.x) && almost_equal(self.y, other.y)
    }

    /// Returns true if this point lies strictly inside the segment `a`-`b`
    /// (on the line, within range, not at either endpoint).
    pub fn on_segment(self, a: Point, b: Point) -> bool {
        let ab = b.sub(a);
        let ap = self.sub(a);

        // vertical segment
        if ab.x.abs() < TOL && ap.x.abs() < TOL {
            let (min_y, max_y) = (a.y.min(b.y), a.y.max(b.y));
            return !almost_equal(self.y, a.y)
                && !almost_equal(self.y, b.y)
                && self.y > min_y
                && self.y < max_y;
        }

        // range check
        if self.x < a.x.min(b.x) || self.x > a.x.max(b.x) || self.y < a.y.min(b.y) || self.y > a.y.max(b.y)
        {
            return false;
        }

        // exclude endpoints, require collinearity
        if self.almost_equal(a) || self.almost_equal(b) || ap.cross(ab).abs() > TOL {
            return false;
        }

        let dot = ap.dot(ab);
        let len2 = ab.length_squared();

        !(dot < TOL || dot > len2 || almost_equal(dot, len2))
    }
}

// ============================================================================
// Bounds
// ============================================================================

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    /// Bounding box of a point set. Returns `None` for fewer than 3 points.
    pub fn of(points: &[Point]) -> Option<Bounds> {
        if points.len() < 3 {
            return None;
        }

        let mut min = points[0];
        let mut max = points[0];
        for p in &points[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }

        Some(Bounds {
            x: min.x,
            y: min.y,
            width: max.x - min.x,
            height: max.y - min.y,
        })
    }
}

// ============================================================================
// Polygon
// ============================================================================

/// A simple polygon: a closed loop of points (no duplicated endpoint) with a
/// canonical winding, an id, the rotation currently applied, a read-time
/// translation `offset`, and optional children representing holes (children
/// of children are islands, and so on).
///
/// Positioning during the NFP search mutates only `offset`; the base point
/// array is never aliased between cached and in-flight polygons. Rotation
/// always produces a new polygon.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Polygon {
    pub id: usize,
    /// Rotation in degrees already applied to `points`.
    pub rotation: f64,
    /// Translation applied at read time, not baked into `points`.
    pub offset: Point,
    pub points: Vec<Point>,
    /// Holes (and their islands, alternating).
    pub children: Vec<Polygon>,
}

impl Polygon {
    /// Builds a polygon from a point loop.
    ///
    /// Rejects fewer than 3 points, drops a duplicated closing point, and
    /// canonicalizes winding to negative signed area.
    pub fn new(id: usize, mut points: Vec<Point>) -> Result<Self> {
        if points.len() > 1 && points[0].almost_equal(points[points.len() - 1]) {
            points.pop();
        }
        if points.len() < 3 {
            return Err(Error::InvalidGeometry(format!(
                "polygon {id} must have at least 3 distinct points"
            )));
        }
        if signed_area(&points) > 0.0 {
            points.reverse();
        }

        Ok(Self {
            id,
            rotation: 0.0,
            offset: Point::ZERO,
            points,
            children: Vec::new(),
        })
    }

    /// Convenience constructor for an axis-aligned rectangle with its
    /// minimum corner at the origin.
    pub fn rectangle(id: usize, width: f64, height: f64) -> Result<Self> {
        Polygon::new(
            id,
            vec![
                Point::new(0.0, 0.0),
                Point::new(width, 0.0),
                Point::new(width, height),
                Point::new(0.0, height),
            ],
        )
    }

    /// Attaches a hole.
    pub fn with_child(mut self, child: Polygon) -> Self {
        self.children.push(child);
        self
    }

    /// Signed area of the outer loop (negative for the canonical winding).
    pub fn area(&self) -> f64 {
        signed_area(&self.points)
    }

    /// Bounding box of the base points (offset not applied).
    pub fn bounds(&self) -> Bounds {
        Bounds::of(&self.points).unwrap_or(Bounds {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
        })
    }

    /// Returns a new polygon with all points (and children) rotated by
    /// `degrees` around the origin. The result's `rotation` records the
    /// applied angle; the offset is reset.
    pub fn rotated(&self, degrees: f64) -> Polygon {
        let radians = degrees.to_radians();
        let points: Vec<Point> = self.points.iter().map(|p| p.rotated(radians)).collect();

        Polygon {
            id: self.id,
            rotation: degrees,
            offset: Point::ZERO,
            points,
            children: self.children.iter().map(|c| c.rotated(degrees)).collect(),
        }
    }

    /// Bakes a translation into the base points (used for bin normalization,
    /// not for NFP positioning).
    pub fn translate(&mut self, delta: Point) {
        for p in &mut self.points {
            *p = p.add(delta);
        }
        for child in &mut self.children {
            child.translate(delta);
        }
    }

    /// Point at index `i` with the current offset applied.
    #[inline]
    pub fn at(&self, i: usize) -> Point {
        self.points[i].add(self.offset)
    }

    /// Returns true if every vertex lies on the polygon's bounding box edges
    /// (i.e. the polygon is an axis-aligned rectangle, possibly with
    /// redundant vertices).
    pub fn is_rectangle(&self) -> bool {
        let bounds = self.bounds();
        let (min_x, min_y) = (bounds.x, bounds.y);
        let (max_x, max_y) = (bounds.x + bounds.width, bounds.y + bounds.height);

        self.points.iter().all(|p| {
            (almost_equal(p.x, min_x) || almost_equal(p.x, max_x))
                && (almost_equal(p.y, min_y) || almost_equal(p.y, max_y))
        })
    }
}

/// Shoelace signed area. Negative for counter-clockwise winding in a
/// y-up coordinate system; the canonical polygon winding here is negative.
pub fn signed_area(points: &[Point]) -> f64 {
    let n = points.len();
    let mut area = 0.0;
    for i in 0..n {
        let j = (i + n - 1) % n;
        area += (points[j].x + points[i].x) * (points[j].y - points[i].y);
    }
    0.5 * area
}

/// Crossing-number point-in-polygon test against the polygon's offset
/// position. Returns `None` when the point lies exactly on a vertex or edge
/// (the indeterminate case).
pub fn point_in_polygon_tristate(point: Point, polygon: &Polygon) -> Option<bool> {
    let n = polygon.points.len();
    if n < 3 {
        return Some(false);
    }

    let mut inside = false;
    for i in 0..n {
        let current = polygon.at(i);
        let previous = polygon.at((i + n - 1) % n);

        if point.almost_equal(current) {
            return None; // on a vertex
        }
        if point.on_segment(current, previous) {
            return None; // on an edge
        }
        if current.almost_equal(previous) {
            continue; // degenerate edge
        }

        let intersects = (current.y > point.y) != (previous.y > point.y)
            && point.x
                < ((previous.x - current.x) * (point.y - current.y)) / (previous.y - current.y)
                    + current.x;
        if intersects {
            inside = !inside;
        }
    }

    Some(inside)
}

/// Point-in-polygon with the ambiguous boundary case defined as "not
/// inside".
pub fn point_in_polygon(point: Point, polygon: &Polygon) -> bool {
    point_in_polygon_tristate(point, polygon) == Some(true)
}

// ============================================================================
// Segment queries
// ============================================================================

/// True when `value` falls strictly outside the span `[a, b]`. Spans shorter
/// than the tolerance cannot reject anything (degenerate axis).
fn out_of_range(value: f64, a: f64, b: f64) -> bool {
    let span = (a - b).abs();
    span > TOL && (2.0 * value - a - b).abs() > span
}

/// Intersection of segments AB and EF, or `None` when they miss (or are
/// parallel). With `infinite` set, AB and EF describe unbounded lines.
pub fn line_intersect(a: Point, b: Point, e: Point, f: Point, infinite: bool) -> Option<Point> {
    let a1 = b.y - a.y;
    let b1 = a.x - b.x;
    let c1 = b.x * a.y - a.x * b.y;
    let a2 = f.y - e.y;
    let b2 = e.x - f.x;
    let c2 = f.x * e.y - e.x * f.y;
    let denom = a1 * b2 - a2 * b1;

    let x = (b1 * c2 - b2 * c1) / denom;
    let y = (a2 * c1 - a1 * c2) / denom;
    if !x.is_finite() || !y.is_finite() {
        return None;
    }

    if !infinite
        && (out_of_range(x, a.x, b.x)
            || out_of_range(y, a.y, b.y)
            || out_of_range(x, e.x, f.x)
            || out_of_range(y, e.y, f.y))
    {
        return None;
    }

    Some(Point::new(x, y))
}

/// Disambiguates a touching vertex: walks to the next distinct vertex of
/// `poly` on the given side and compares its containment in `other` against
/// the neighbour's. Either point landing on the boundary is indeterminate
/// and does not count as a crossing.
fn sides_differ(
    poly: &Polygon,
    other: &Polygon,
    neighbour: Point,
    index: usize,
    step: isize,
) -> bool {
    let size = poly.points.len();
    let mut point_index = (index as isize + step).rem_euclid(size as isize) as usize;

    if point_index == index || poly.points[point_index].almost_equal(poly.points[index]) {
        point_index = (point_index as isize + step).rem_euclid(size as isize) as usize;
    }

    let probe = poly.at(point_index);
    match (
        point_in_polygon_tristate(probe, other),
        point_in_polygon_tristate(neighbour, other),
    ) {
        (Some(probe_inside), Some(neighbour_inside)) => probe_inside != neighbour_inside,
        _ => false,
    }
}

/// Returns true if the boundaries of A and B (at their current offsets)
/// properly intersect. Touching contacts are resolved by checking whether
/// the neighbouring vertices end up on opposite sides.
pub fn intersect(a: &Polygon, b: &Polygon) -> bool {
    let a_size = a.points.len();
    let b_size = b.points.len();

    for i in 0..a_size.saturating_sub(1) {
        let a1 = a.at(i);
        let a2 = a.at(i + 1);

        for j in 0..b_size.saturating_sub(1) {
            let b1 = b.at(j);
            let b2 = b.at(j + 1);

            if b1.on_segment(a1, a2) || b1.almost_equal(a1) {
                if sides_differ(b, a, b2, j, -1) {
                    return true;
                }
                continue;
            }

            if b2.on_segment(a1, a2) || b2.almost_equal(a2) {
                if sides_differ(b, a, b1, j + 1, 1) {
                    return true;
                }
                continue;
            }

            if a1.on_segment(b1, b2) || a1.almost_equal(b2) {
                if sides_differ(a, b, a2, i, -1) {
                    return true;
                }
                continue;
            }

            if a2.on_segment(b1, b2) || a2.almost_equal(b1) {
                if sides_differ(a, b, a1, i + 1, 1) {
                    return true;
                }
                continue;
            }

            if line_intersect(b1, b2, a1, a2, false).is_some() {
                return true;
            }
        }
    }

    false
}

/// Distance from point `p` to segment `s1`-`s2` measured along `normal`
/// (positive = `p` must move against the normal to reach the segment).
/// `None` when the projection of `p` misses the segment.
pub fn point_distance(p: Point, s1: Point, s2: Point, normal: Point, infinite: bool) -> Option<f64> {
    let normal = normal.normalized();
    let dir = normal.normal();

    let p_dot = dir.dot(p);
    let s1_dot = dir.dot(s1);
    let s2_dot = dir.dot(s2);
    let p_dot_norm = normal.dot(p);
    let s1_dot_norm = normal.dot(s1);
    let s2_dot_norm = normal.dot(s2);

    if !infinite {
        if ((p_dot < s1_dot + TOL) && (p_dot < s2_dot + TOL))
            || ((p_dot > s1_dot - TOL) && (p_dot > s2_dot - TOL))
        {
            return None; // projection misses the segment, or lies on a vertex
        }
        if almost_equal(p_dot, s1_dot)
            && almost_equal(p_dot, s2_dot)
            && p_dot_norm - s1_dot_norm > 0.0
            && p_dot_norm - s2_dot_norm > 0.0
        {
            return Some((p_dot_norm - s1_dot_norm).min(p_dot_norm - s2_dot_norm));
        }
        if almost_equal(p_dot, s1_dot)
            && almost_equal(p_dot, s2_dot)
            && p_dot_norm - s1_dot_norm < 0.0
            && p_dot_norm - s2_dot_norm < 0.0
        {
            return Some((p_dot_norm - s1_dot_norm).max(p_dot_norm - s2_dot_norm));
        }
    }

    Some(
        ((s1_dot_norm - s2_dot_norm) * (p_dot - s1_dot)) / (s1_dot - s2_dot)
            - (p_dot_norm - s1_dot_norm),
    )
}

/// Minimum displacement of segment EF along `direction` before it contacts
/// segment AB, or `None` when the segments never interact in that direction.
pub fn segment_distance(a: Point, b: Point, e: Point, f: Point, direction: Point) -> Option<f64> {
    let normal = direction.normal();
    let reverse = direction.neg();

    let dot_a = normal.dot(a);
    let dot_b = normal.dot(b);
    let dot_e = normal.dot(e);
    let dot_f = normal.dot(f);

    let cross_a = direction.dot(a);
    let cross_b = direction.dot(b);
    let cross_e = direction.dot(e);
    let cross_f = direction.dot(f);

    let min_ab = dot_a.min(dot_b);
    let max_ab = dot_a.max(dot_b);
    let min_ef = dot_e.min(dot_f);
    let max_ef = dot_e.max(dot_f);

    // segments merely touch at one extreme, or miss each other entirely
    if almost_equal(max_ab, min_ef) || almost_equal(min_ab, max_ef) || max_ab < min_ef || min_ab > max_ef
    {
        return None;
    }

    let max_offset = max_ab - max_ef;
    let min_offset = min_ab - min_ef;
    let overlap = if (max_offset + min_offset).abs() >= (max_offset - min_offset).abs() {
        (max_ab.min(max_ef) - min_ab.max(min_ef)) / (max_ab.max(max_ef) - min_ab.min(min_ef))
    } else {
        1.0
    };

    let ab = b.sub(a);
    let ef = f.sub(e);
    let cross_abe = e.sub(a).cross(ab);
    let cross_abf = f.sub(a).cross(ab);

    // collinear lines
    if almost_equal(cross_abe, 0.0) && almost_equal(cross_abf, 0.0) {
        let normal_ab = ab.normal().normalized();
        let normal_ef = ef.normal().normalized();

        // segment normals must point in opposite directions
        if normal_ab.cross(normal_ef).abs() < TOL && normal_ab.dot(normal_ef) < 0.0 {
            let normal_dot = direction.dot(normal_ab);
            // segments merely slide along each other
            if almost_equal(normal_dot, 0.0) {
                return None;
            }
            if normal_dot < 0.0 {
                return Some(0.0);
            }
        }
        return None;
    }

    let mut distances: Vec<f64> = Vec::new();

    // endpoint A against EF
    if almost_equal(dot_a, dot_e) {
        distances.push(cross_a - cross_e);
    } else if almost_equal(dot_a, dot_f) {
        distances.push(cross_a - cross_f);
    } else if dot_a > min_ef && dot_a < max_ef {
        let mut d = point_distance(a, e, f, reverse, false);
        if let Some(value) = d {
            // A touches EF but AB is moving away from it
            if value.abs() < TOL {
                let delta = point_distance(b, e, f, reverse, true);
                if delta.map_or(true, |delta| delta < 0.0 || (delta * overlap).abs() < TOL) {
                    d = None;
                }
            }
        }
        if let Some(value) = d {
            distances.push(value);
        }
    }

    // endpoint B against EF
    if almost_equal(dot_b, dot_e) {
        distances.push(cross_b - cross_e);
    } else if almost_equal(dot_b, dot_f) {
        distances.push(cross_b - cross_f);
    } else if dot_b > min_ef && dot_b < max_ef {
        let mut d = point_distance(b, e, f, reverse, false);
        if let Some(value) = d {
            if value.abs() < TOL {
                let delta = point_distance(a, e, f, reverse, true);
                if delta.map_or(true, |delta| delta < 0.0 || (delta * overlap).abs() < TOL) {
                    d = None;
                }
            }
        }
        if let Some(value) = d {
            distances.push(value);
        }
    }

    // endpoint E against AB
    if dot_e > min_ab && dot_e < max_ab {
        let mut d = point_distance(e, a, b, direction, false);
        if let Some(value) = d {
            if value.abs() < TOL {
                let delta = point_distance(f, a, b, direction, true);
                if delta.map_or(true, |delta| delta < 0.0 || (delta * overlap).abs() < TOL) {
                    d = None;
                }
            }
        }
        if let Some(value) = d {
            distances.push(value);
        }
    }

    // endpoint F against AB
    if dot_f > min_ab && dot_f < max_ab {
        let mut d = point_distance(f, a, b, direction, false);
        if let Some(value) = d {
            if value.abs() < TOL {
                let delta = point_distance(e, a, b, direction, true);
                if delta.map_or(true, |delta| delta < 0.0 || (delta * overlap).abs() < TOL) {
                    d = None;
                }
            }
        }
        if let Some(value) = d {
            distances.push(value);
        }
    }

    distances.into_iter().reduce(f64::min)
}

/// Maximum distance B (at its offset) can slide along `direction` before
/// colliding with A (at its offset). `None` means no constraint.
pub fn polygon_slide_distance(
    a: &Polygon,
    b: &Polygon,
    direction: Point,
    ignore_negative: bool,
) -> Option<f64> {
    let dir = direction.normalized();
    let mut result: Option<f64> = None;

    let a_len = a.points.len();
    let b_len = b.points.len();

    for i in 0..b_len {
        let b1 = b.at(i);
        let b2 = b.at((i + 1) % b_len);
        if b1.almost_equal(b2) {
            continue; // ignore extremely small edges
        }

        for j in 0..a_len {
            let a1 = a.at(j);
            let a2 = a.at((j + 1) % a_len);
            if a1.almost_equal(a2) {
                continue;
            }

            if let Some(distance) = segment_distance(a1, a2, b1, b2, dir) {
                let improved = result.map_or(true, |best| distance < best);
                let acceptable =
                    !ignore_negative || distance > 0.0 || almost_equal(distance, 0.0);
                if improved && acceptable {
                    result = Some(distance);
                }
            }
        }
    }

    result
}

/// Projects every vertex of B onto A along `direction` and returns the
/// largest of the per-vertex minimum projection distances.
pub fn polygon_projection_distance(a: &Polygon, b: &Polygon, direction: Point) -> Option<f64> {
    let mut result: Option<f64> = None;
    let a_len = a.points.len();
    let b_len = b.points.len();

    for i in 0..b_len {
        let p = b.at(i);
        let mut min_projection: Option<f64> = None;

        for j in 0..a_len {
            let s1 = a.at(j);
            let s2 = a.at((j + 1) % a_len);

            // skip edges parallel to the direction
            if almost_equal(
                (s2.y - s1.y) * direction.x,
                (s2.x - s1.x) * direction.y,
            ) {
                continue;
            }

            if let Some(distance) = point_distance(p, s1, s2, direction, false) {
                if min_projection.map_or(true, |best| distance < best) {
                    min_projection = Some(distance);
                }
            }
        }

        if let Some(projection) = min_projection {
            if result.map_or(true, |best| projection > best) {
                result = Some(projection);
            }
        }
    }

    result
}

// ============================================================================
// Tests
// ============================================================================
