//! Greedy bottom-left placement.
//!
//! Parts are taken in the order the genetic search proposes, already rotated.
//! Each bin pass places as many remaining parts as possible: for every part
//! the feasible region is the bin's inner NFP minus the union of the outer
//! NFPs of the already placed parts, and the candidate vertex minimizing the
//! weighted bounding box (`2 * width + height`) of everything placed so far
//! wins. Parts that cannot be placed spill into the next bin pass; whatever
//! survives all passes is reported unplaced.
//!
//! Fitness is additive and lower-is-better: one point per opened bin, the
//! normalized width of the final pass's chosen bounding box, and a two-point
//! penalty per unplaced part.

use std::sync::Arc;

use polynest_core::{PlaceResult, Placement};

use crate::cache::{NfpCache, NfpKey};
use crate::clip;
use crate::geometry::{almost_equal, Point, Polygon};
use crate::nfp::Nfp;

/// Places `parts` (each carrying its proposed rotation in `rotation`) into
/// as many bins as needed. All required NFPs must already be in `cache`;
/// a part whose NFPs are missing or ungenerateable is skipped for the pass.
pub fn place_paths(
    parts: &[Polygon],
    bin_area: f64,
    cache: &NfpCache,
    rotations: u32,
    clipper_scale: f64,
) -> PlaceResult {
    let mut remaining: Vec<Polygon> = parts.iter().map(|p| p.rotated(p.rotation)).collect();

    let mut bins: Vec<Vec<Placement>> = Vec::new();
    let mut fitness = 0.0;

    while !remaining.is_empty() {
        let mut placed: Vec<Polygon> = Vec::new();
        let mut positions: Vec<Point> = Vec::new();
        let mut placed_indices: Vec<usize> = Vec::new();
        let mut pass_width: Option<f64> = None;

        fitness += 1.0; // each opened bin costs one point

        for (index, path) in remaining.iter().enumerate() {
            let bin_key = NfpKey::bin(rotations, path.id, path.rotation);
            let bin_nfp = match cache.get(bin_key) {
                Some(nfp) if !nfp.is_empty() => nfp,
                // part does not fit the bin at this rotation
                _ => continue,
            };

            let pair_nfps = match collect_pair_nfps(&placed, path, cache, rotations) {
                Some(nfps) => nfps,
                // a missing pair NFP makes the part unplaceable this pass
                None => continue,
            };

            let position = if placed.is_empty() {
                first_position(&bin_nfp, path)
            } else {
                best_position(
                    &bin_nfp,
                    &pair_nfps,
                    &placed,
                    &positions,
                    path,
                    clipper_scale,
                    &mut pass_width,
                )
            };

            if let Some(position) = position {
                placed.push(path.clone());
                positions.push(position);
                placed_indices.push(index);
            }
        }

        if let Some(width) = pass_width {
            fitness += width / bin_area;
        }

        if placed.is_empty() {
            break; // nothing fit, the rest is unplaceable
        }

        let bin_index = bins.len();
        let placements = placed
            .iter()
            .zip(&positions)
            .map(|(path, pos)| Placement::new(path.id, pos.x, pos.y, path.rotation, bin_index))
            .collect();
        bins.push(placements);

        for &index in placed_indices.iter().rev() {
            remaining.remove(index);
        }
    }

    fitness += 2.0 * remaining.len() as f64;

    PlaceResult {
        bins,
        unplaced: remaining.iter().map(|p| p.id).collect(),
        fitness,
    }
}

/// Fetches the outer NFP of `path` against every already placed part.
/// `None` as soon as one is missing.
fn collect_pair_nfps(
    placed: &[Polygon],
    path: &Polygon,
    cache: &NfpCache,
    rotations: u32,
) -> Option<Vec<Arc<Nfp>>> {
    placed
        .iter()
        .map(|other| {
            let key = NfpKey::new(rotations, false, other.id, path.id, other.rotation, path.rotation);
            cache.get(key)
        })
        .collect()
}

/// First part of a bin pass: leftmost vertex of the bin NFP wins.
fn first_position(bin_nfp: &Nfp, path: &Polygon) -> Option<Point> {
    let first = path.points[0];
    let mut position: Option<Point> = None;

    for points in &bin_nfp.loops {
        for p in points {
            let candidate = p.sub(first);
            if position.is_none_or(|best| candidate.x < best.x) {
                position = Some(candidate);
            }
        }
    }

    position
}

/// Scans every vertex of the feasible region and keeps the candidate whose
/// combined bounding box scores lowest. Ties under `almost_equal` break
/// toward the smaller x.
fn best_position(
    bin_nfp: &Nfp,
    pair_nfps: &[Arc<Nfp>],
    placed: &[Polygon],
    positions: &[Point],
    path: &Polygon,
    clipper_scale: f64,
    pass_width: &mut Option<f64>,
) -> Option<Point> {
    // union of placed-part NFPs, each translated to its placement
    let mut obstacle_loops: Vec<Vec<Point>> = Vec::new();
    for (nfp, position) in pair_nfps.iter().zip(positions) {
        let translated = nfp.translated(*position);
        let cleaned = clip::clean_loops(
            translated.loops,
            clip::CLEAN_DISTANCE,
            clip::MIN_LOOP_AREA,
            clipper_scale,
        );
        obstacle_loops.extend(cleaned);
    }
    let combined = clip::union(&obstacle_loops);

    let feasible = clip::difference(&bin_nfp.loops, &combined);
    let feasible = clip::clean_loops(
        feasible,
        clip::CLEAN_DISTANCE,
        clip::MIN_LOOP_AREA,
        clipper_scale,
    );
    if feasible.is_empty() {
        return None;
    }

    // bounding box of everything already placed; candidates only extend it
    let mut placed_min = Point::new(f64::INFINITY, f64::INFINITY);
    let mut placed_max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
    for (other, position) in placed.iter().zip(positions) {
        for p in &other.points {
            let q = p.add(*position);
            placed_min = Point::new(placed_min.x.min(q.x), placed_min.y.min(q.y));
            placed_max = Point::new(placed_max.x.max(q.x), placed_max.y.max(q.y));
        }
    }

    let first = path.points[0];
    let mut best_score: Option<f64> = None;
    let mut best_x: Option<f64> = None;
    let mut best: Option<Point> = None;

    for loop_points in &feasible {
        for candidate in loop_points {
            let shift = candidate.sub(first);

            let mut min = placed_min;
            let mut max = placed_max;
            for p in &path.points {
                let q = p.add(shift);
                min = Point::new(min.x.min(q.x), min.y.min(q.y));
                max = Point::new(max.x.max(q.x), max.y.max(q.y));
            }

            let width = max.x - min.x;
            let height = max.y - min.y;
            // width weighs double to compress along the gravity axis
            let score = width * 2.0 + height;

            let improves = match best_score {
                None => true,
                Some(current) if score < current && !almost_equal(score, current) => true,
                Some(current) => {
                    almost_equal(score, current) && best_x.is_none_or(|x| shift.x < x)
                }
            };

            if improves {
                best_score = Some(score);
                best_x = Some(shift.x);
                best = Some(shift);
                *pass_width = Some(width);
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SCALE: f64 = 10_000_000.0;

    /// Inner NFP loop for a `part`-sized square in a `bin`-sized square bin,
    /// both anchored at the origin.
    fn bin_nfp(bin: f64, part: f64) -> Nfp {
        let reach = bin - part;
        Nfp {
            loops: vec![vec![
                Point::new(0.0, 0.0),
                Point::new(0.0, reach),
                Point::new(reach, reach),
                Point::new(reach, 0.0),
            ]],
        }
    }

    /// Outer NFP of a `b`-sized square orbiting an `a`-sized square, both
    /// anchored at the origin (positions of B's first point).
    fn square_pair_nfp(a: f64, b: f64) -> Nfp {
        Nfp {
            loops: vec![vec![
                Point::new(-b, -b),
                Point::new(a, -b),
                Point::new(a, a),
                Point::new(-b, a),
            ]],
        }
    }

    fn seeded_cache(bin: f64, sizes: &[f64]) -> NfpCache {
        let cache = NfpCache::new();
        for (id, &size) in sizes.iter().enumerate() {
            cache.insert(NfpKey::bin(4, id, 0.0), bin_nfp(bin, size));
        }
        for (id_a, &size_a) in sizes.iter().enumerate() {
            for (id_b, &size_b) in sizes.iter().enumerate() {
                if id_a != id_b {
                    cache.insert(
                        NfpKey::new(4, false, id_a, id_b, 0.0, 0.0),
                        square_pair_nfp(size_a, size_b),
                    );
                }
            }
        }
        cache
    }

    fn square(id: usize, size: f64) -> Polygon {
        Polygon::rectangle(id, size, size).unwrap()
    }

    #[test]
    fn test_single_part_lands_bottom_left() {
        let cache = seeded_cache(10.0, &[2.0]);
        let parts = vec![square(0, 2.0)];

        let result = place_paths(&parts, 100.0, &cache, 4, SCALE);

        assert_eq!(result.bins.len(), 1);
        assert!(result.unplaced.is_empty());
        let placement = &result.bins[0][0];
        assert_relative_eq!(placement.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(placement.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(result.fitness, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_second_part_stacks_to_minimize_width() {
        let cache = seeded_cache(10.0, &[2.0, 2.0]);
        let parts = vec![square(0, 2.0), square(1, 2.0)];

        let result = place_paths(&parts, 100.0, &cache, 4, SCALE);

        assert_eq!(result.bins.len(), 1);
        assert_eq!(result.bins[0].len(), 2);
        assert!(result.unplaced.is_empty());

        // double width weighting stacks the second square above the first
        let second = &result.bins[0][1];
        assert_relative_eq!(second.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(second.y, 2.0, epsilon = 1e-6);

        // one bin plus the normalized pass width
        assert_relative_eq!(result.fitness, 1.0 + 2.0 / 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_oversized_part_reported_unplaced() {
        let cache = NfpCache::new();
        // no bin NFP for the part: it cannot fit at any position
        let parts = vec![square(7, 20.0)];

        let result = place_paths(&parts, 100.0, &cache, 4, SCALE);

        assert!(result.bins.is_empty());
        assert_eq!(result.unplaced, vec![7]);
        // one opened bin plus two points penalty
        assert_relative_eq!(result.fitness, 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_overflow_opens_second_bin() {
        // bin fits exactly one 4x4 part (reach 0 collapses the inner NFP to
        // a point loop, so give it a sliver of slack instead)
        let cache = NfpCache::new();
        for id in 0..2 {
            cache.insert(NfpKey::bin(4, id, 0.0), bin_nfp(10.0, 6.0));
        }
        // pair NFP covers the whole bin NFP: the two parts can never coexist
        cache.insert(
            NfpKey::new(4, false, 0, 1, 0.0, 0.0),
            Nfp {
                loops: vec![vec![
                    Point::new(-7.0, -7.0),
                    Point::new(7.0, -7.0),
                    Point::new(7.0, 7.0),
                    Point::new(-7.0, 7.0),
                ]],
            },
        );

        let parts = vec![square(0, 6.0), square(1, 6.0)];
        let result = place_paths(&parts, 100.0, &cache, 4, SCALE);

        assert_eq!(result.bins.len(), 2);
        assert_eq!(result.bins[0].len(), 1);
        assert_eq!(result.bins[1].len(), 1);
        assert_eq!(result.bins[1][0].bin_index, 1);
        assert!(result.unplaced.is_empty());
        assert_relative_eq!(result.fitness, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rotation_applied_before_placement() {
        let cache = NfpCache::new();
        // bin NFP registered only for the 90 degree bucket
        cache.insert(NfpKey::bin(4, 0, 90.0), bin_nfp(10.0, 2.0));

        let mut part = square(0, 2.0);
        part.rotation = 90.0;

        let result = place_paths(&[part], 100.0, &cache, 4, SCALE);
        assert_eq!(result.bins.len(), 1);
        assert_relative_eq!(result.bins[0][0].rotation, 90.0, epsilon = 1e-9);
    }
}
