//! Polygon boolean and offset operations.
//!
//! Thin wrapper over `i_overlay` (union/difference, non-zero fill) plus a
//! mitered polygon offset. Coordinates round-trip through a scaled integer
//! grid (`clipper_scale`) so results are stable across repeated boolean ops,
//! and degenerate slivers are filtered by vertex-merge distance and a minimum
//! loop area.

use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;

use polynest_core::{Error, Result};

use crate::geometry::{line_intersect, signed_area, Point, Polygon};

/// Vertex-merge distance used when cleaning boolean results, in model units
/// (equivalent to `0.0001 * clipper_scale` grid steps at the default scale).
pub const CLEAN_DISTANCE: f64 = 1e-4;

/// Loops with an absolute area below this are discarded as numerical noise.
pub const MIN_LOOP_AREA: f64 = 0.1;

/// Miter limit for polygon offsetting, as a multiple of the offset delta.
const MITER_LIMIT: f64 = 2.0;

fn to_path(points: &[Point], offset: Point) -> Vec<[f64; 2]> {
    points
        .iter()
        .map(|p| [p.x + offset.x, p.y + offset.y])
        .collect()
}

fn from_path(path: &[[f64; 2]]) -> Vec<Point> {
    path.iter().map(|p| Point::new(p[0], p[1])).collect()
}

/// Snaps a coordinate onto the scaled integer grid.
#[inline]
fn snap(value: f64, scale: f64) -> f64 {
    (value * scale).round() / scale
}

fn snap_loop(points: &mut [Point], scale: f64) {
    for p in points.iter_mut() {
        p.x = snap(p.x, scale);
        p.y = snap(p.y, scale);
    }
}

/// Unions a set of loops into a merged region. Returns all boundary loops of
/// the result (outer boundaries and holes alike).
pub fn union(loops: &[Vec<Point>]) -> Vec<Vec<Point>> {
    if loops.is_empty() {
        return Vec::new();
    }

    let subject: Vec<Vec<[f64; 2]>> = loops.iter().map(|l| to_path(l, Point::ZERO)).collect();
    let clip: Vec<Vec<[f64; 2]>> = Vec::new();
    let shapes = subject.overlay(&clip, OverlayRule::Subject, FillRule::NonZero);

    flatten(shapes)
}

/// Subtracts `clip` from `subject`. Returns all boundary loops of the result.
pub fn difference(subject: &[Vec<Point>], clip: &[Vec<Point>]) -> Vec<Vec<Point>> {
    if subject.is_empty() {
        return Vec::new();
    }
    if clip.is_empty() {
        return subject.to_vec();
    }

    let subject: Vec<Vec<[f64; 2]>> = subject.iter().map(|l| to_path(l, Point::ZERO)).collect();
    let clip: Vec<Vec<[f64; 2]>> = clip.iter().map(|l| to_path(l, Point::ZERO)).collect();
    let shapes = subject.overlay(&clip, OverlayRule::Difference, FillRule::NonZero);

    flatten(shapes)
}

fn flatten(shapes: Vec<Vec<Vec<[f64; 2]>>>) -> Vec<Vec<Point>> {
    let mut result = Vec::new();
    for shape in shapes {
        for path in shape {
            if path.len() >= 3 {
                result.push(from_path(&path));
            }
        }
    }
    result
}

/// Merges vertices closer than `clean_distance`, snaps onto the integer grid
/// and drops loops that degenerate below 3 points or `min_area`.
pub fn clean_loops(
    loops: Vec<Vec<Point>>,
    clean_distance: f64,
    min_area: f64,
    scale: f64,
) -> Vec<Vec<Point>> {
    let mut result = Vec::new();

    for mut points in loops {
        snap_loop(&mut points, scale);

        let mut cleaned: Vec<Point> = Vec::with_capacity(points.len());
        for p in points {
            match cleaned.last() {
                Some(last)
                    if (p.x - last.x).abs() < clean_distance
                        && (p.y - last.y).abs() < clean_distance => {}
                _ => cleaned.push(p),
            }
        }
        // closing point may collapse into the first
        while cleaned.len() > 1 {
            let first = cleaned[0];
            let last = cleaned[cleaned.len() - 1];
            if (first.x - last.x).abs() < clean_distance && (first.y - last.y).abs() < clean_distance
            {
                cleaned.pop();
            } else {
                break;
            }
        }

        if cleaned.len() >= 3 && signed_area(&cleaned).abs() >= min_area {
            result.push(cleaned);
        }
    }

    result
}

/// Mitered offset of a single loop: positive `delta` expands, negative
/// contracts. Joins are mitered up to a limit of twice the delta, then
/// beveled. The result is resolved through a non-zero union to strip
/// self-intersections introduced by contraction, then cleaned with
/// `tolerance` as the vertex-merge distance.
fn offset_loop(points: &[Point], delta: f64, tolerance: f64, scale: f64) -> Vec<Vec<Point>> {
    let n = points.len();

    // outward normal for the canonical winding (negative signed area)
    let outward = |i: usize| -> Point {
        let p = points[i];
        let q = points[(i + 1) % n];
        let edge = q.sub(p);
        Point::new(edge.y, -edge.x).normalized()
    };

    let mut raw: Vec<Point> = Vec::with_capacity(2 * n);
    let limit = MITER_LIMIT * delta.abs();

    for i in 0..n {
        let vertex = points[(i + 1) % n];
        let normal_in = outward(i);
        let normal_out = outward((i + 1) % n);

        let in_a = points[i].add(normal_in.scale(delta));
        let in_b = vertex.add(normal_in.scale(delta));
        let out_a = vertex.add(normal_out.scale(delta));
        let out_b = points[(i + 2) % n].add(normal_out.scale(delta));

        match line_intersect(in_a, in_b, out_a, out_b, true) {
            Some(miter) if miter.sub(vertex).length() <= limit => raw.push(miter),
            _ => {
                // parallel edges or miter limit exceeded: bevel
                raw.push(in_b);
                raw.push(out_a);
            }
        }
    }

    snap_loop(&mut raw, scale);

    // a contraction larger than the shape inverts the loop entirely
    if signed_area(&raw).signum() != signed_area(points).signum() {
        return Vec::new();
    }

    let resolved = union(&[raw]);
    let cleaned = clean_loops(resolved, tolerance.max(CLEAN_DISTANCE), MIN_LOOP_AREA, scale);

    // an inverted loop can keep its winding through the union; a contraction
    // must strictly shrink the loop, anything else has collapsed
    if delta < 0.0 {
        let input_area = signed_area(points).abs();
        if cleaned.iter().any(|l| signed_area(l).abs() >= input_area) {
            return Vec::new();
        }
    }

    cleaned
}

/// Offsets a polygon outline by `delta` (positive = expand). Holes are offset
/// the opposite way so the material grows or shrinks consistently.
/// `tolerance` is the curve tolerance used to clean the result.
///
/// A delta that makes the outline vanish or split into multiple loops is a
/// configuration error (the spacing is too large for the shape).
pub fn offset_polygon(polygon: &Polygon, delta: f64, tolerance: f64, scale: f64) -> Result<Polygon> {
    if delta == 0.0 {
        return Ok(polygon.clone());
    }

    let loops = offset_loop(&polygon.points, delta, tolerance, scale);
    if loops.len() != 1 {
        return Err(Error::ConfigError(format!(
            "offset of {delta} on polygon {} produced {} loops (expected 1); \
             reduce spacing or simplify the shape",
            polygon.id,
            loops.len()
        )));
    }

    let mut result = Polygon::new(polygon.id, loops.into_iter().next().unwrap())?;
    result.rotation = polygon.rotation;

    for child in &polygon.children {
        // hole boundary moves opposite to the outline
        let child_loops = offset_loop(&child.points, -delta, tolerance, scale);
        if child_loops.len() == 1 {
            let mut hole = Polygon::new(child.id, child_loops.into_iter().next().unwrap())?;
            hole.rotation = child.rotation;
            result.children.push(hole);
        }
        // a hole that vanishes under the offset is simply dropped
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square_points(size: f64) -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(size, 0.0),
            Point::new(size, size),
            Point::new(0.0, size),
        ]
    }

    fn loops_area(loops: &[Vec<Point>]) -> f64 {
        loops.iter().map(|l| signed_area(l).abs()).sum()
    }

    #[test]
    fn test_union_disjoint_and_overlapping() {
        let a = square_points(2.0);
        let b: Vec<Point> = square_points(2.0)
            .into_iter()
            .map(|p| p.add(Point::new(10.0, 0.0)))
            .collect();

        let result = union(&[a.clone(), b]);
        assert_eq!(result.len(), 2);

        // overlapping squares merge into one loop of area 6
        let c: Vec<Point> = square_points(2.0)
            .into_iter()
            .map(|p| p.add(Point::new(1.0, 0.0)))
            .collect();
        let result = union(&[a, c]);
        assert_eq!(result.len(), 1);
        assert_relative_eq!(signed_area(&result[0]).abs(), 6.0, epsilon = 1e-6);
    }

    #[test]
    fn test_difference_carves_hole() {
        let outer = square_points(10.0);
        let inner: Vec<Point> = square_points(2.0)
            .into_iter()
            .map(|p| p.add(Point::new(4.0, 4.0)))
            .collect();

        let result = difference(&[outer], &[inner]);
        // outer boundary plus hole boundary
        assert_eq!(result.len(), 2);
        let outer_area = result
            .iter()
            .map(|l| signed_area(l).abs())
            .fold(0.0, f64::max);
        assert_relative_eq!(outer_area, 100.0, epsilon = 1e-6);
    }

    #[test]
    fn test_clean_drops_slivers() {
        let sliver = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 0.01),
            Point::new(0.0, 0.01),
        ];
        let kept = vec![
            Point::new(0.0, 0.0),
            Point::new(5.0, 0.0),
            Point::new(5.0, 5.0),
        ];

        let result = clean_loops(
            vec![sliver, kept],
            CLEAN_DISTANCE,
            MIN_LOOP_AREA,
            10_000_000.0,
        );
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].len(), 3);
    }

    #[test]
    fn test_offset_expand_square() {
        let poly = Polygon::rectangle(0, 4.0, 4.0).unwrap();
        let grown = offset_polygon(&poly, 1.0, 0.3, 10_000_000.0).unwrap();

        // mitered square offset grows each side by 2*delta
        assert_relative_eq!(grown.area().abs(), 36.0, epsilon = 1e-6);
        let bounds = grown.bounds();
        assert_relative_eq!(bounds.width, 6.0, epsilon = 1e-6);
    }

    #[test]
    fn test_offset_contract_square() {
        let poly = Polygon::rectangle(0, 4.0, 4.0).unwrap();
        let shrunk = offset_polygon(&poly, -1.0, 0.3, 10_000_000.0).unwrap();

        assert_relative_eq!(shrunk.area().abs(), 4.0, epsilon = 1e-6);
        let bounds = shrunk.bounds();
        assert_relative_eq!(bounds.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(bounds.width, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_offset_collapse_is_config_error() {
        let poly = Polygon::rectangle(0, 2.0, 2.0).unwrap();
        assert!(offset_polygon(&poly, -2.0, 0.3, 10_000_000.0).is_err());

        // over-contraction re-inflates the inverted loop with the original
        // winding; it must still be rejected
        assert!(offset_polygon(&poly, -3.0, 0.3, 10_000_000.0).is_err());
        assert!(offset_polygon(&poly, -1.0, 0.3, 10_000_000.0).is_err());
    }

    #[test]
    fn test_union_area_monotone() {
        let a = square_points(3.0);
        let b: Vec<Point> = square_points(3.0)
            .into_iter()
            .map(|p| p.add(Point::new(2.0, 2.0)))
            .collect();

        let merged = union(&[a.clone(), b.clone()]);
        let merged_area = loops_area(&merged);
        assert_relative_eq!(merged_area, 9.0 + 9.0 - 1.0, epsilon = 1e-6);
    }
}
