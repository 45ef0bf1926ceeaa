//! No-fit polygon generation.
//!
//! For a fixed polygon A and a movable polygon B, the outer NFP is the locus
//! of positions of B's first point where B touches A without overlap; the
//! inner NFP keeps B fully inside A. Three strategies:
//!
//! - **Orbiting**: slide B around A from touching contact to touching
//!   contact, tracing the path of B's reference point until it closes.
//!   Handles concave shapes and, with `search_edges`, finds multiple loops.
//! - **Rectangle fast path**: closed form for the inner NFP when A is an
//!   axis-aligned rectangle.
//! - **Minkowski fast path**: outer NFP as the boundary of A ⊕ −B, via
//!   convex decomposition and an `i_overlay` union, keeping the largest
//!   loop.
//!
//! A geometric failure (orbit that never closes, failed area sanity check)
//! is reported as `None`: the pair is unplaceable for this attempt, not an
//! error.

use geo::{Area as _, Coord, ConvexHull as _, LineString};

use crate::clip;
use crate::geometry::{
    almost_equal, intersect, point_in_polygon, point_in_polygon_tristate,
    polygon_projection_distance, polygon_slide_distance, signed_area, Point, Polygon, TOL,
};

/// Near-parallel rejection threshold for translation candidates that would
/// retrace the previous orbit step.
const REVERSAL_CROSS_TOL: f64 = 1e-4;

/// A no-fit polygon: one or more loops. The first loop is the primary
/// boundary; later loops are holes within it (or alternate placement
/// regions, for inner NFPs found through `search_edges`).
///
/// Loop winding is semantic (holes wind opposite to boundaries) and is NOT
/// canonicalized; boolean consumers rely on it under the non-zero fill
/// rule.
#[derive(Debug, Clone, Default)]
pub struct Nfp {
    pub loops: Vec<Vec<Point>>,
}

impl Nfp {
    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }

    /// Translates every loop by `delta`.
    pub fn translated(&self, delta: Point) -> Nfp {
        Nfp {
            loops: self
                .loops
                .iter()
                .map(|l| l.iter().map(|p| p.add(delta)).collect())
                .collect(),
        }
    }
}

// ============================================================================
// Orbiting
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum ContactKind {
    /// B vertex coincides with A vertex.
    VertexVertex,
    /// B vertex lies on an A edge.
    BOnEdgeA,
    /// A vertex lies on a B edge.
    AOnEdgeB,
}

#[derive(Debug, Clone, Copy)]
struct Contact {
    kind: ContactKind,
    a: usize,
    b: usize,
}

/// A candidate translation. `start_a`/`end_a` reference A vertices when the
/// generating edge belongs to A; marking them steers `search_start_point`
/// away from exhausted starts.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    v: Point,
    start_a: Option<usize>,
    end_a: Option<usize>,
}

fn find_contacts(a: &Polygon, b: &Polygon) -> Vec<Contact> {
    let a_len = a.points.len();
    let b_len = b.points.len();
    let mut touching = Vec::new();

    for i in 0..a_len {
        for j in 0..b_len {
            let b1 = b.at(j);
            let b2 = b.at((j + 1) % b_len);
            let a1 = a.at(i);
            let a2 = a.at((i + 1) % a_len);

            if a1.almost_equal(b1) {
                touching.push(Contact {
                    kind: ContactKind::VertexVertex,
                    a: i,
                    b: j,
                });
            } else if b1.on_segment(a1, a2) {
                touching.push(Contact {
                    kind: ContactKind::BOnEdgeA,
                    a: (i + 1) % a_len,
                    b: j,
                });
            } else if a1.on_segment(b1, b2) {
                touching.push(Contact {
                    kind: ContactKind::AOnEdgeB,
                    a: i,
                    b: (j + 1) % b_len,
                });
            }
        }
    }

    touching
}

fn candidate_vectors(
    a: &Polygon,
    b: &Polygon,
    touching: &[Contact],
    marks_a: &mut [bool],
) -> Vec<Candidate> {
    let a_len = a.points.len();
    let b_len = b.points.len();
    let mut vectors = Vec::new();

    for contact in touching {
        marks_a[contact.a] = true;

        let vertex_a = a.points[contact.a];
        let prev_a_index = (contact.a + a_len - 1) % a_len;
        let next_a_index = (contact.a + 1) % a_len;
        let prev_a = a.points[prev_a_index];
        let next_a = a.points[next_a_index];

        let vertex_b = b.points[contact.b];
        let prev_b_index = (contact.b + b_len - 1) % b_len;
        let prev_b = b.points[prev_b_index];
        let next_b = b.points[(contact.b + 1) % b_len];

        match contact.kind {
            ContactKind::VertexVertex => {
                vectors.push(Candidate {
                    v: prev_a.sub(vertex_a),
                    start_a: Some(contact.a),
                    end_a: Some(prev_a_index),
                });
                vectors.push(Candidate {
                    v: next_a.sub(vertex_a),
                    start_a: Some(contact.a),
                    end_a: Some(next_a_index),
                });
                // B edge vectors are inverted: B slides, A stays
                vectors.push(Candidate {
                    v: vertex_b.sub(prev_b),
                    start_a: None,
                    end_a: None,
                });
                vectors.push(Candidate {
                    v: vertex_b.sub(next_b),
                    start_a: None,
                    end_a: None,
                });
            }
            ContactKind::BOnEdgeA => {
                let touch = b.at(contact.b);
                vectors.push(Candidate {
                    v: vertex_a.sub(touch),
                    start_a: Some(prev_a_index),
                    end_a: Some(contact.a),
                });
                vectors.push(Candidate {
                    v: prev_a.sub(touch),
                    start_a: Some(contact.a),
                    end_a: Some(prev_a_index),
                });
            }
            ContactKind::AOnEdgeB => {
                vectors.push(Candidate {
                    v: vertex_a.sub(b.at(contact.b)),
                    start_a: None,
                    end_a: None,
                });
                vectors.push(Candidate {
                    v: vertex_a.sub(b.at(prev_b_index)),
                    start_a: None,
                    end_a: None,
                });
            }
        }
    }

    vectors
}

/// Picks the candidate with the largest feasible slide, rejecting vectors
/// that would retrace the previous step.
fn select_translation(
    a: &Polygon,
    b: &Polygon,
    vectors: &[Candidate],
    prev: Option<Point>,
) -> Option<(Candidate, f64)> {
    let mut best: Option<(Candidate, f64)> = None;

    for candidate in vectors {
        if candidate.v.x == 0.0 && candidate.v.y == 0.0 {
            continue;
        }

        // a vector pointing back where we came from would unwind the orbit:
        // opposite direction (negative dot) and nearly parallel (unit cross
        // within tolerance)
        if let Some(prev) = prev {
            if candidate.v.dot(prev) < 0.0 {
                let unit = candidate.v.scale(1.0 / candidate.v.length());
                let prev_unit = prev.scale(1.0 / prev.length());
                if unit.cross(prev_unit).abs() < REVERSAL_CROSS_TOL {
                    continue;
                }
            }
        }

        let mut distance = match polygon_slide_distance(a, b, candidate.v, true) {
            Some(d) if d * d <= candidate.v.length_squared() => d,
            // unconstrained in this direction: the full edge length applies
            _ => candidate.v.length(),
        };

        if distance > best.as_ref().map_or(0.0, |(_, d)| *d) {
            distance = distance.max(0.0);
            best = Some((*candidate, distance));
        }
    }

    best
}

/// Orbits B around (or inside) A, tracing the closed path of B's first
/// point. Returns the traced loops; empty when no start position exists or
/// the orbit failed to close.
pub fn no_fit_polygon(a: &Polygon, b: &Polygon, inside: bool, search_edges: bool) -> Vec<Vec<Point>> {
    if a.points.len() < 3 || b.points.len() < 3 {
        return Vec::new();
    }

    let mut a = a.clone();
    a.offset = Point::ZERO;
    let mut b = b.clone();

    let a_len = a.points.len();
    let b_len = b.points.len();
    let mut marks_a = vec![false; a_len];

    // B's top-most vertex against A's bottom-most guarantees a touching,
    // non-overlapping start for the outer orbit
    let min_a_index = (0..a_len)
        .min_by(|&i, &j| a.points[i].y.total_cmp(&a.points[j].y))
        .unwrap_or(0);
    let max_b_index = (0..b_len)
        .max_by(|&i, &j| b.points[i].y.total_cmp(&b.points[j].y))
        .unwrap_or(0);

    let mut start_point = if inside {
        // no reliable heuristic for inside, search for one
        search_start_point(&a, &b, true, &[], &mut marks_a)
    } else {
        Some(a.points[min_a_index].sub(b.points[max_b_index]))
    };

    let mut nfp_list: Vec<Vec<Point>> = Vec::new();
    let iteration_cap = 10 * (a_len + b_len);

    while let Some(start) = start_point {
        b.offset = start;

        let mut prev_vector: Option<Point> = None;
        let mut nfp: Option<Vec<Point>> = Some(vec![b.points[0].add(start)]);
        let mut reference = b.points[0].add(start);
        let loop_start = reference;
        let mut counter = 0;

        while counter < iteration_cap {
            let touching = find_contacts(&a, &b);
            let vectors = candidate_vectors(&a, &b, &touching, &mut marks_a);

            let selected = select_translation(&a, &b, &vectors, prev_vector);
            let (candidate, max_distance) = match selected {
                Some(pair) if !almost_equal(pair.1, 0.0) => pair,
                // stuck: the loop cannot be closed
                _ => {
                    nfp = None;
                    break;
                }
            };

            if let Some(i) = candidate.start_a {
                marks_a[i] = true;
            }
            if let Some(i) = candidate.end_a {
                marks_a[i] = true;
            }

            let mut translate = candidate.v;
            prev_vector = Some(translate);

            // trim the slide to the collision distance
            let v_len2 = translate.length_squared();
            if max_distance * max_distance < v_len2 && !almost_equal(max_distance * max_distance, v_len2)
            {
                translate = translate.scale((max_distance * max_distance / v_len2).sqrt());
            }

            reference = reference.add(translate);

            if reference.almost_equal(loop_start) {
                break; // closed
            }

            // when A and B begin on a touching horizontal line the closure
            // can land on an earlier point instead of the start
            let looped = nfp.as_ref().is_some_and(|points| {
                points.len() > 1
                    && points[..points.len() - 1]
                        .iter()
                        .any(|p| reference.almost_equal(*p))
            });
            if looped {
                break;
            }

            if let Some(points) = nfp.as_mut() {
                points.push(reference);
            }

            b.offset = b.offset.add(translate);
            counter += 1;
        }

        if counter >= iteration_cap {
            // never closed within the sanity bound
            nfp = None;
        }

        if let Some(points) = nfp {
            if !points.is_empty() {
                nfp_list.push(points);
            }
        }

        if !search_edges {
            break; // only the primary loop is wanted
        }

        start_point = search_start_point(&a, &b, inside, &nfp_list, &mut marks_a);
    }

    nfp_list
}

/// Returns true if `p` coincides with a vertex already traced into `nfp`.
fn in_nfp(p: Point, nfp: &[Vec<Point>]) -> bool {
    nfp.iter()
        .any(|points| points.iter().any(|q| p.almost_equal(*q)))
}

/// Searches for a placement of B touching A (outside, or inside for inner
/// NFPs) that has not been traversed yet. Walks every unmarked A vertex,
/// aligning each B vertex to it and sliding along the A edge when the
/// direct alignment overlaps.
fn search_start_point(
    a: &Polygon,
    b: &Polygon,
    inside: bool,
    nfp: &[Vec<Point>],
    marks_a: &mut [bool],
) -> Option<Point> {
    let a_len = a.points.len();
    let b_len = b.points.len();
    let mut b = b.clone();

    for i in 0..a_len {
        if marks_a[i] {
            continue;
        }
        marks_a[i] = true;

        for j in 0..b_len {
            let mut offset = a.points[i].sub(b.points[j]);
            b.offset = offset;

            // first definitive containment of any B vertex decides the side
            let mut b_inside = None;
            for k in 0..b_len {
                if let Some(v) = point_in_polygon_tristate(b.at(k), a) {
                    b_inside = Some(v);
                    break;
                }
            }
            // every vertex on A's boundary: A and B are identical
            let mut side = b_inside?;

            if side == inside && !intersect(a, &b) && !in_nfp(offset, nfp) {
                return Some(offset);
            }

            // slide B along the A edge and retry
            let mut v = a.points[(i + 1) % a_len].sub(a.points[i]);
            let d1 = polygon_projection_distance(a, &b, v);
            let d2 = polygon_projection_distance(&b, a, v.neg());

            let distance = match (d1, d2) {
                (None, None) => continue,
                (Some(d), None) | (None, Some(d)) => d,
                (Some(x), Some(y)) => x.min(y),
            };

            // only slide while still interpenetrating
            if almost_equal(distance, 0.0) || distance <= 0.0 {
                continue;
            }

            let v_len2 = v.length_squared();
            if distance * distance < v_len2 && !almost_equal(distance * distance, v_len2) {
                v = v.scale(distance / v_len2.sqrt());
            }

            offset = offset.add(v);
            b.offset = offset;

            for k in 0..b_len {
                if let Some(value) = point_in_polygon_tristate(b.at(k), a) {
                    side = value;
                    break;
                }
            }

            if side == inside && !intersect(a, &b) && !in_nfp(offset, nfp) {
                return Some(offset);
            }
        }
    }

    None
}

// ============================================================================
// Rectangle fast path
// ============================================================================

/// Inner NFP for the special case where A is an axis-aligned rectangle:
/// B's bounding box is translated through A's. `None` when B does not fit.
pub fn no_fit_polygon_rectangle(a: &Polygon, b: &Polygon) -> Option<Vec<Vec<Point>>> {
    let bounds_a = a.bounds();
    let bounds_b = b.bounds();

    if bounds_b.width > bounds_a.width || bounds_b.height > bounds_a.height {
        return None;
    }

    let first_b = b.points[0];
    let min_x = bounds_a.x + (first_b.x - bounds_b.x);
    let min_y = bounds_a.y + (first_b.y - bounds_b.y);
    let max_x = bounds_a.x + bounds_a.width + (first_b.x - (bounds_b.x + bounds_b.width));
    let max_y = bounds_a.y + bounds_a.height + (first_b.y - (bounds_b.y + bounds_b.height));

    Some(vec![vec![
        Point::new(min_x, min_y),
        Point::new(max_x, min_y),
        Point::new(max_x, max_y),
        Point::new(min_x, max_y),
    ]])
}

// ============================================================================
// Minkowski fast path
// ============================================================================

fn is_convex(points: &[Point]) -> bool {
    let n = points.len();
    let mut sign = 0.0f64;
    for i in 0..n {
        let p = points[i];
        let q = points[(i + 1) % n];
        let r = points[(i + 2) % n];
        let cross = q.sub(p).cross(r.sub(q));
        if cross.abs() > TOL {
            if sign != 0.0 && cross.signum() != sign {
                return false;
            }
            sign = cross.signum();
        }
    }
    true
}

/// Reorders a CCW loop to start at its lowest (then leftmost) vertex.
fn reorder_lowest(points: &[Point]) -> Vec<Point> {
    let start = (0..points.len())
        .min_by(|&i, &j| {
            points[i]
                .y
                .total_cmp(&points[j].y)
                .then(points[i].x.total_cmp(&points[j].x))
        })
        .unwrap_or(0);

    let mut result = Vec::with_capacity(points.len());
    result.extend_from_slice(&points[start..]);
    result.extend_from_slice(&points[..start]);
    result
}

/// Ensures standard counter-clockwise vertex order (negative canonical
/// shoelace sign).
fn ensure_ccw(points: &[Point]) -> Vec<Point> {
    if signed_area(points) > 0.0 {
        points.iter().rev().copied().collect()
    } else {
        points.to_vec()
    }
}

/// Minkowski sum of two convex CCW loops by merging edge vectors in angular
/// order.
fn convex_minkowski_sum(p: &[Point], q: &[Point]) -> Vec<Point> {
    let p = reorder_lowest(p);
    let q = reorder_lowest(q);
    let n = p.len();
    let m = q.len();

    let mut result = Vec::with_capacity(n + m);
    let (mut i, mut j) = (0usize, 0usize);

    while i < n || j < m {
        result.push(p[i % n].add(q[j % m]));
        let p_edge = p[(i + 1) % n].sub(p[i % n]);
        let q_edge = q[(j + 1) % m].sub(q[j % m]);

        if i >= n {
            j += 1;
        } else if j >= m {
            i += 1;
        } else {
            let cross = p_edge.cross(q_edge);
            if cross > TOL {
                i += 1;
            } else if cross < -TOL {
                j += 1;
            } else {
                i += 1;
                j += 1;
            }
        }
    }

    result
}

fn point_in_triangle(p: Point, a: Point, b: Point, c: Point) -> bool {
    let d1 = p.sub(a).cross(b.sub(a));
    let d2 = p.sub(b).cross(c.sub(b));
    let d3 = p.sub(c).cross(a.sub(c));
    let has_neg = d1 < -TOL || d2 < -TOL || d3 < -TOL;
    let has_pos = d1 > TOL || d2 > TOL || d3 > TOL;
    !(has_neg && has_pos)
}

/// Ear-clipping triangulation of a simple CCW polygon. Falls back to the
/// convex hull when no ear can be clipped (degenerate input).
fn triangulate(points: &[Point]) -> Vec<[Point; 3]> {
    let points = ensure_ccw(points);
    let mut indices: Vec<usize> = (0..points.len()).collect();
    let mut triangles = Vec::new();

    while indices.len() > 3 {
        let n = indices.len();
        let mut clipped = false;

        for idx in 0..n {
            let i0 = indices[(idx + n - 1) % n];
            let i1 = indices[idx];
            let i2 = indices[(idx + 1) % n];
            let (a, b, c) = (points[i0], points[i1], points[i2]);

            // reflex vertex, not an ear
            if b.sub(a).cross(c.sub(b)) <= TOL {
                continue;
            }

            let blocked = indices.iter().any(|&k| {
                k != i0 && k != i1 && k != i2 && point_in_triangle(points[k], a, b, c)
            });
            if blocked {
                continue;
            }

            triangles.push([a, b, c]);
            indices.remove(idx);
            clipped = true;
            break;
        }

        if !clipped {
            // degenerate remainder: approximate with the convex hull
            let remaining: Vec<Point> = indices.iter().map(|&k| points[k]).collect();
            let hull = convex_hull(&remaining);
            for w in 1..hull.len().saturating_sub(1) {
                triangles.push([hull[0], hull[w], hull[w + 1]]);
            }
            return triangles;
        }
    }

    if indices.len() == 3 {
        triangles.push([points[indices[0]], points[indices[1]], points[indices[2]]]);
    }

    triangles
}

fn convex_hull(points: &[Point]) -> Vec<Point> {
    let coords: Vec<Coord<f64>> = points.iter().map(|p| Coord { x: p.x, y: p.y }).collect();
    let polygon = geo::Polygon::new(LineString::from(coords), vec![]);
    let hull = polygon.convex_hull();

    let mut result: Vec<Point> = hull
        .exterior()
        .coords()
        .map(|c| Point::new(c.x, c.y))
        .collect();
    // geo closes the ring
    if result.len() > 1 && result[0].almost_equal(result[result.len() - 1]) {
        result.pop();
    }
    // geo's hull is CW for positive-area polygons
    if hull.unsigned_area() > 0.0 && signed_area(&result) > 0.0 {
        result.reverse();
    }
    result
}

/// Outer NFP via the Minkowski difference A ⊕ −B: convex pairs sum
/// directly, concave ones go through triangulation and a union of partial
/// sums. The largest-area loop is the primary boundary; coordinates are
/// snapped to the scaled integer grid first.
pub fn minkowski_difference(a: &Polygon, b: &Polygon, clipper_scale: f64) -> Option<Vec<Vec<Point>>> {
    let snap = |p: Point| -> Point {
        Point::new(
            (p.x * clipper_scale).round() / clipper_scale,
            (p.y * clipper_scale).round() / clipper_scale,
        )
    };

    let a_points: Vec<Point> = a.points.iter().map(|p| snap(*p)).collect();
    let b_negated: Vec<Point> = b.points.iter().map(|p| snap(p.neg())).collect();

    let a_ccw = ensure_ccw(&a_points);
    let b_ccw = ensure_ccw(&b_negated);

    let loops: Vec<Vec<Point>> = if is_convex(&a_ccw) && is_convex(&b_ccw) {
        vec![convex_minkowski_sum(&a_ccw, &b_ccw)]
    } else {
        let partials: Vec<Vec<Point>> = triangulate(&a_ccw)
            .iter()
            .flat_map(|ta| {
                triangulate(&b_ccw)
                    .iter()
                    .map(|tb| convex_minkowski_sum(ta, tb))
                    .collect::<Vec<_>>()
            })
            .collect();
        clip::union(&partials)
    };

    // keep the largest enclosed loop as the primary outer boundary
    let largest = loops
        .into_iter()
        .max_by(|x, y| signed_area(x).abs().total_cmp(&signed_area(y).abs()))?;

    let shift = b.points[0];
    let translated: Vec<Point> = largest.iter().map(|p| p.add(shift)).collect();

    Some(vec![translated])
}

// ============================================================================
// Pair dispatch
// ============================================================================

fn loop_polygon(points: Vec<Point>) -> Polygon {
    // raw loop wrapper for containment tests; winding left as-is
    Polygon {
        id: 0,
        rotation: 0.0,
        offset: Point::ZERO,
        points,
        children: Vec::new(),
    }
}

/// Computes the NFP for an already-rotated pair.
///
/// `inside` selects the inner NFP (B within A); `search_edges` enables the
/// exhaustive orbiting search; `use_holes` appends inner NFPs for A's holes
/// that are large enough to admit B. `None` means the NFP could not be
/// generated: a legitimate outcome for inside queries (B simply does not
/// fit), a logged geometric failure for outer ones.
pub fn compute_nfp(
    a: &Polygon,
    b: &Polygon,
    inside: bool,
    search_edges: bool,
    use_holes: bool,
    clipper_scale: f64,
) -> Option<Nfp> {
    if inside {
        let mut loops = if a.is_rectangle() {
            no_fit_polygon_rectangle(a, b)?
        } else {
            no_fit_polygon(a, b, true, search_edges)
        };

        if loops.is_empty() {
            // the part may simply be larger than the container
            log::debug!(
                "no inner NFP for pair ({}, {}) at rotations ({}, {})",
                a.id,
                b.id,
                a.rotation,
                b.rotation
            );
            return None;
        }

        // all interior loops share one winding direction
        for points in &mut loops {
            if signed_area(points) > 0.0 {
                points.reverse();
            }
        }

        return Some(Nfp { loops });
    }

    let mut loops = if search_edges {
        no_fit_polygon(a, b, false, true)
    } else {
        minkowski_difference(a, b, clipper_scale)?
    };

    if loops.is_empty() {
        log::warn!("failed to generate outer NFP for pair ({}, {})", a.id, b.id);
        return None;
    }

    // sanity: the outer boundary must enclose at least A's own footprint
    // (with search_edges only the first loop is guaranteed to)
    let area_a = a.area().abs();
    for (i, points) in loops.iter().enumerate() {
        if (!search_edges || i == 0) && signed_area(points).abs() < area_a {
            log::warn!(
                "outer NFP area {} below polygon {} area {}, dropping result",
                signed_area(points).abs(),
                a.id,
                area_a
            );
            return None;
        }
    }

    // first loop is the largest boundary; subsequent loops inside it are
    // holes and wind the opposite way
    for points in &mut loops {
        if signed_area(points) > 0.0 {
            points.reverse();
        }
    }
    if loops.len() > 1 {
        let outer = loop_polygon(loops[0].clone());
        for points in &mut loops[1..] {
            if point_in_polygon(points[0], &outer) && signed_area(points) < 0.0 {
                points.reverse();
            }
        }
    }

    // inner NFPs for holes of A that could admit B at all
    if use_holes {
        let bounds_b = b.bounds();
        let mut hole_loops = Vec::new();

        for child in &a.children {
            let bounds_child = child.bounds();
            if bounds_child.width > bounds_b.width && bounds_child.height > bounds_b.height {
                let mut cnfp = no_fit_polygon(child, b, true, search_edges);
                for points in &mut cnfp {
                    if signed_area(points) < 0.0 {
                        points.reverse();
                    }
                    hole_loops.push(std::mem::take(points));
                }
            }
        }

        loops.extend(hole_loops);
    }

    Some(Nfp { loops })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Bounds;
    use approx::assert_relative_eq;

    fn square(id: usize, size: f64) -> Polygon {
        Polygon::rectangle(id, size, size).unwrap()
    }

    fn loop_bounds(points: &[Point]) -> Bounds {
        Bounds::of(points).unwrap()
    }

    #[test]
    fn test_orbit_outer_squares() {
        let a = square(0, 4.0);
        let b = square(1, 2.0);

        let loops = no_fit_polygon(&a, &b, false, false);
        assert_eq!(loops.len(), 1);

        let nfp = &loops[0];
        // positions of B's first point form a 6x6 ring boundary around A
        let bounds = loop_bounds(nfp);
        assert_relative_eq!(bounds.x, -2.0, epsilon = 1e-9);
        assert_relative_eq!(bounds.y, -2.0, epsilon = 1e-9);
        assert_relative_eq!(bounds.width, 6.0, epsilon = 1e-9);
        assert_relative_eq!(bounds.height, 6.0, epsilon = 1e-9);

        // NFP area never shrinks below A's own footprint
        assert!(signed_area(nfp).abs() >= a.area().abs());
    }

    #[test]
    fn test_orbit_outer_triangle_pair() {
        let a = Polygon::new(
            0,
            vec![
                Point::new(0.0, 0.0),
                Point::new(6.0, 0.0),
                Point::new(3.0, 5.0),
            ],
        )
        .unwrap();
        let b = Polygon::new(
            1,
            vec![
                Point::new(0.0, 0.0),
                Point::new(2.0, 0.0),
                Point::new(1.0, 1.5),
            ],
        )
        .unwrap();

        let loops = no_fit_polygon(&a, &b, false, false);
        assert_eq!(loops.len(), 1);
        assert!(signed_area(&loops[0]).abs() >= a.area().abs());
    }

    #[test]
    fn test_rectangle_inner_fast_path() {
        let a = square(0, 10.0);
        let b = square(1, 2.0);

        let loops = no_fit_polygon_rectangle(&a, &b).unwrap();
        let bounds = loop_bounds(&loops[0]);
        assert_relative_eq!(bounds.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(bounds.y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(bounds.width, 8.0, epsilon = 1e-9);
        assert_relative_eq!(bounds.height, 8.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rectangle_inner_rejects_oversized_part() {
        let a = square(0, 2.0);
        let b = square(1, 3.0);
        assert!(no_fit_polygon_rectangle(&a, &b).is_none());
    }

    #[test]
    fn test_rectangle_matches_orbiting_inner() {
        let a = square(0, 10.0);
        let b = square(1, 2.0);

        let fast = no_fit_polygon_rectangle(&a, &b).unwrap();
        let orbit = no_fit_polygon(&a, &b, true, false);

        assert!(!orbit.is_empty());
        let fast_bounds = loop_bounds(&fast[0]);
        let orbit_bounds = loop_bounds(&orbit[0]);

        assert_relative_eq!(fast_bounds.x, orbit_bounds.x, epsilon = 1e-6);
        assert_relative_eq!(fast_bounds.y, orbit_bounds.y, epsilon = 1e-6);
        assert_relative_eq!(fast_bounds.width, orbit_bounds.width, epsilon = 1e-6);
        assert_relative_eq!(fast_bounds.height, orbit_bounds.height, epsilon = 1e-6);
        assert_relative_eq!(
            signed_area(&fast[0]).abs(),
            signed_area(&orbit[0]).abs(),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_minkowski_squares() {
        let a = square(0, 4.0);
        let b = square(1, 2.0);

        let loops = minkowski_difference(&a, &b, 10_000_000.0).unwrap();
        assert_eq!(loops.len(), 1);

        let bounds = loop_bounds(&loops[0]);
        assert_relative_eq!(bounds.x, -2.0, epsilon = 1e-6);
        assert_relative_eq!(bounds.width, 6.0, epsilon = 1e-6);
        assert_relative_eq!(signed_area(&loops[0]).abs(), 36.0, epsilon = 1e-5);
    }

    #[test]
    fn test_minkowski_matches_orbiting_outer() {
        let a = square(0, 5.0);
        let b = square(1, 3.0);

        let minkowski = minkowski_difference(&a, &b, 10_000_000.0).unwrap();
        let orbit = no_fit_polygon(&a, &b, false, false);

        assert_relative_eq!(
            signed_area(&minkowski[0]).abs(),
            signed_area(&orbit[0]).abs(),
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_compute_nfp_outer_area_invariant() {
        // a convex and a concave fixed polygon against a small square
        let shapes = vec![
            square(0, 4.0),
            Polygon::new(
                1,
                vec![
                    Point::new(0.0, 0.0),
                    Point::new(6.0, 0.0),
                    Point::new(6.0, 6.0),
                    Point::new(3.0, 3.0),
                    Point::new(0.0, 6.0),
                ],
            )
            .unwrap(),
        ];
        let b = square(2, 1.0);

        for a in &shapes {
            let nfp = compute_nfp(a, &b, false, false, false, 10_000_000.0).unwrap();
            assert!(!nfp.is_empty());
            assert!(
                signed_area(&nfp.loops[0]).abs() >= a.area().abs(),
                "NFP area below fixed polygon area"
            );
        }
    }

    #[test]
    fn test_compute_nfp_inside_none_for_oversized() {
        let a = square(0, 2.0);
        let b = square(1, 5.0);
        assert!(compute_nfp(&a, &b, true, false, false, 10_000_000.0).is_none());
    }

    #[test]
    fn test_compute_nfp_hole_admits_part() {
        let hole = Polygon::new(
            10,
            vec![
                Point::new(2.0, 2.0),
                Point::new(8.0, 2.0),
                Point::new(8.0, 8.0),
                Point::new(2.0, 8.0),
            ],
        )
        .unwrap();
        let a = square(0, 10.0).with_child(hole);
        let b = square(1, 2.0);

        let with_holes = compute_nfp(&a, &b, false, false, true, 10_000_000.0).unwrap();
        let without = compute_nfp(&a, &b, false, false, false, 10_000_000.0).unwrap();

        // hole-fitting adds extra loops for the admissible hole
        assert!(with_holes.loops.len() > without.loops.len());
    }

    #[test]
    fn test_nfp_translated() {
        let nfp = Nfp {
            loops: vec![vec![
                Point::new(0.0, 0.0),
                Point::new(1.0, 0.0),
                Point::new(1.0, 1.0),
            ]],
        };
        let moved = nfp.translated(Point::new(5.0, -2.0));
        assert_relative_eq!(moved.loops[0][0].x, 5.0);
        assert_relative_eq!(moved.loops[0][0].y, -2.0);
        // original untouched
        assert_relative_eq!(nfp.loops[0][0].x, 0.0);
    }
}
