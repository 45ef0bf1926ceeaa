//! End-to-end solves through the public API.

use approx::assert_relative_eq;
use polynest_d2::{Config, Nester, Placement, Point, Polygon, Solver};

fn rect(id: usize, width: f64, height: f64) -> Polygon {
    Polygon::rectangle(id, width, height).unwrap()
}

fn base_config() -> Config {
    Config::new()
        .with_seed(7)
        .with_population_size(6)
        .with_max_generations(3)
        .with_rotations(2)
        .with_threads(1)
}

/// Axis-aligned bounds of `part` rotated and translated per `placement`.
fn placed_bounds(part: &Polygon, placement: &Placement) -> (Point, Point) {
    let rotated = part.rotated(placement.rotation);
    let mut min = Point::new(f64::INFINITY, f64::INFINITY);
    let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in &rotated.points {
        let q = Point::new(p.x + placement.x, p.y + placement.y);
        min = Point::new(min.x.min(q.x), min.y.min(q.y));
        max = Point::new(max.x.max(q.x), max.y.max(q.y));
    }
    (min, max)
}

/// Smallest axis gap between two placed bounding boxes; negative means the
/// boxes overlap on both axes.
fn axis_gap(a: (Point, Point), b: (Point, Point)) -> f64 {
    let gap_x = (b.0.x - a.1.x).max(a.0.x - b.1.x);
    let gap_y = (b.0.y - a.1.y).max(a.0.y - b.1.y);
    gap_x.max(gap_y)
}

#[test]
fn single_square_in_square_bin() {
    let bin = rect(0, 10.0, 10.0);
    let part = rect(0, 2.0, 2.0);

    let mut nester = Nester::new(base_config()).unwrap();
    let result = nester.solve(&[part.clone()], &bin).unwrap();

    assert!(result.all_placed());
    assert_eq!(result.bins_used, 1);
    assert_eq!(result.placements.len(), 1);

    let placement = &result.placements[0];
    assert_eq!(placement.part_id, 0);
    assert_eq!(placement.bin_index, 0);

    // the placed square keeps its 2x2 shape and stays inside the bin
    let (min, max) = placed_bounds(&part, placement);
    assert_relative_eq!(max.x - min.x, 2.0, epsilon = 1e-6);
    assert_relative_eq!(max.y - min.y, 2.0, epsilon = 1e-6);
    assert!(min.x >= -1e-6 && min.y >= -1e-6);
    assert!(max.x <= 10.0 + 1e-6 && max.y <= 10.0 + 1e-6);

    assert!(result.best_fitness.is_finite());
    assert_eq!(result.fitness_history.len() as u32, result.generations);
}

#[test]
fn two_rectangles_share_one_bin() {
    let bin = rect(0, 10.0, 10.0);
    let parts = vec![rect(0, 5.0, 10.0), rect(1, 4.8, 9.0)];

    let mut nester = Nester::new(base_config()).unwrap();
    let result = nester.solve(&parts, &bin).unwrap();

    assert!(result.all_placed());
    assert_eq!(result.bins_used, 1, "5 + 4.8 fits side by side in width 10");
    assert_eq!(result.placements.len(), 2);

    // no overlap between the two placed parts
    let a = placed_bounds(&parts[0], &result.placements[0]);
    let b = placed_bounds(&parts[1], &result.placements[1]);
    assert!(axis_gap(a, b) >= -1e-6);
}

#[test]
fn slightly_too_wide_pair_opens_second_bin() {
    let bin = rect(0, 10.0, 10.0);
    let parts = vec![rect(0, 5.0, 10.0), rect(1, 5.01, 9.0)];

    let mut nester = Nester::new(base_config()).unwrap();
    let result = nester.solve(&parts, &bin).unwrap();

    assert!(result.all_placed());
    assert_eq!(result.bins_used, 2, "5.01 cannot share width 10 with 5");

    let bins: Vec<usize> = result.placements.iter().map(|p| p.bin_index).collect();
    assert!(bins.contains(&0) && bins.contains(&1));
}

#[test]
fn spacing_buffers_are_respected() {
    let bin = rect(0, 8.0, 10.0);
    let parts = vec![rect(0, 1.0, 6.0), rect(1, 0.5, 5.5)];

    let config = base_config().with_spacing(1.0).with_bin_spacing(2.0);
    let mut nester = Nester::new(config).unwrap();
    let result = nester.solve(&parts, &bin).unwrap();

    assert!(result.all_placed());
    assert_eq!(result.bins_used, 1);

    let a = placed_bounds(&parts[0], &result.placements[0]);
    let b = placed_bounds(&parts[1], &result.placements[1]);

    // parts keep the full part-to-part clearance
    assert!(axis_gap(a, b) >= 1.0 - 1e-4, "gap {}", axis_gap(a, b));

    // and the bin spacing from every bin edge
    for (min, max) in [a, b] {
        assert!(min.x >= 2.0 - 1e-4 && min.y >= 2.0 - 1e-4);
        assert!(max.x <= 6.0 + 1e-4 && max.y <= 8.0 + 1e-4);
    }
}

#[test]
fn translation_round_trip_preserves_points() {
    let mut polygon = Polygon::new(
        0,
        vec![
            Point::new(0.3, 0.7),
            Point::new(4.1, 0.2),
            Point::new(2.9, 3.8),
        ],
    )
    .unwrap();
    let original = polygon.points.clone();

    let v = Point::new(12.345, -6.789);
    polygon.translate(v);
    polygon.translate(Point::new(-v.x, -v.y));

    for (p, q) in polygon.points.iter().zip(&original) {
        assert_relative_eq!(p.x, q.x, epsilon = 1e-9);
        assert_relative_eq!(p.y, q.y, epsilon = 1e-9);
    }
}

#[test]
fn progress_callback_fires_per_generation() {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    let bin = rect(0, 10.0, 10.0);
    let part = rect(0, 2.0, 2.0);

    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();

    let mut nester = Nester::new(base_config()).unwrap();
    let result = nester
        .solve_with_progress(
            &[part],
            &bin,
            Some(Box::new(move |info| {
                counter.fetch_add(1, Ordering::SeqCst);
                assert!(info.best_fitness.is_finite());
            })),
        )
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), result.generations);
}

#[test]
fn unplaceable_part_is_reported_not_fatal() {
    let bin = rect(0, 10.0, 10.0);
    let parts = vec![rect(0, 2.0, 2.0), rect(1, 20.0, 20.0)];

    let mut nester = Nester::new(base_config()).unwrap();
    let result = nester.solve(&parts, &bin).unwrap();

    assert_eq!(result.unplaced, vec![1]);
    assert_eq!(result.placements.len(), 1);
    assert_eq!(result.placements[0].part_id, 0);
}

#[test]
fn seeded_solves_are_reproducible() {
    let bin = rect(0, 10.0, 10.0);
    let parts = vec![rect(0, 3.0, 4.0), rect(1, 2.0, 5.0), rect(2, 4.0, 2.0)];

    let solve = || {
        let mut nester = Nester::new(base_config()).unwrap();
        nester.solve(&parts, &bin).unwrap()
    };

    let first = solve();
    let second = solve();

    assert_eq!(first.best_fitness, second.best_fitness);
    assert_eq!(first.bins_used, second.bins_used);
    assert_eq!(first.placements.len(), second.placements.len());
    for (a, b) in first.placements.iter().zip(&second.placements) {
        assert_eq!(a.part_id, b.part_id);
        assert_relative_eq!(a.x, b.x, epsilon = 1e-12);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-12);
    }
}
