//! Nesting engine: orchestrates NFP batches, placement and the genetic
//! search.
//!
//! Per generation the engine gathers every NFP key the unevaluated
//! phenotypes will need, rebuilds the cache from the keys requested this
//! round, computes the missing entries in parallel, evaluates the phenotypes
//! through the placement engine, then breeds the next generation. The best
//! layout ever seen is kept across generations and returned when a stop
//! condition (generation limit, time limit, cancellation) is reached.
//!
//! Spacing is applied up front: every part is inflated by half the part
//! spacing, and the bin is contracted by the remainder of the bin spacing,
//! so all NFP and placement math runs on exact contact.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use polynest_core::{
    Config, Error, PlaceResult, ProgressCallback, ProgressInfo, Result, SolveResult, Solver,
};

use crate::cache::{NfpCache, NfpKey};
use crate::clip;
use crate::ga::Ga;
use crate::geometry::{Point, Polygon};
use crate::nfp::{compute_nfp, Nfp};
use crate::placement::place_paths;

/// Generations to run when neither a generation nor a time limit is set.
const DEFAULT_GENERATIONS: u32 = 10;

/// Part ids must fit the 9-bit second slot of the cache key.
const MAX_PARTS: usize = 511;

/// A pending NFP computation for one cache key.
struct NfpJob {
    key: NfpKey,
    /// Index of the fixed part, or `None` for the bin.
    a: Option<usize>,
    b: usize,
    rotation_a: f64,
    rotation_b: f64,
}

/// 2D nesting solver.
///
/// Parts are referenced by their index in the input slice: `part_id` in the
/// returned placements is that index. Placement coordinates are relative to
/// the bin translated to the origin.
pub struct Nester {
    config: Config,
    cancelled: Arc<AtomicBool>,
}

impl Nester {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Normalizes the bin: translated to the origin and contracted so parts
    /// inflated by half the part spacing keep the full bin spacing from the
    /// bin edge.
    fn prepare_bin(&self, bin: &Polygon) -> Result<Polygon> {
        let mut bin = bin.clone();
        let bounds = bin.bounds();
        bin.translate(Point::new(-bounds.x, -bounds.y));

        let contraction = self.config.effective_bin_spacing() - self.config.spacing / 2.0;
        if contraction > 0.0 {
            bin = clip::offset_polygon(
                &bin,
                -contraction,
                self.config.curve_tolerance,
                self.config.clipper_scale,
            )?;
        }
        Ok(bin)
    }

    /// Re-ids parts by input index and inflates each by half the part
    /// spacing.
    fn prepare_parts(&self, parts: &[Polygon]) -> Result<Vec<Polygon>> {
        let inflation = self.config.spacing / 2.0;

        parts
            .iter()
            .enumerate()
            .map(|(index, part)| {
                let mut part = part.clone();
                part.id = index;
                for child in &mut part.children {
                    child.id = index;
                }
                if inflation > 0.0 {
                    part = clip::offset_polygon(
                        &part,
                        inflation,
                        self.config.curve_tolerance,
                        self.config.clipper_scale,
                    )?;
                }
                Ok(part)
            })
            .collect()
    }

    /// Every cache key the unevaluated phenotypes will request: the bin NFP
    /// of each part at its proposed rotation, and the pairwise NFP of each
    /// part against all parts inserted before it.
    fn requested_keys(&self, ga: &Ga, parts: &[Polygon]) -> (HashSet<NfpKey>, Vec<NfpJob>) {
        let rotations = self.config.rotations;
        let mut requested = HashSet::new();
        let mut jobs: HashMap<NfpKey, NfpJob> = HashMap::new();

        for phenotype in ga.population() {
            if phenotype.is_evaluated() {
                continue;
            }

            for (i, (&index_b, &rotation_b)) in phenotype
                .order
                .iter()
                .zip(&phenotype.rotations)
                .enumerate()
            {
                let bin_key = NfpKey::bin(rotations, parts[index_b].id, rotation_b);
                requested.insert(bin_key);
                jobs.entry(bin_key).or_insert(NfpJob {
                    key: bin_key,
                    a: None,
                    b: index_b,
                    rotation_a: 0.0,
                    rotation_b,
                });

                for (&index_a, &rotation_a) in
                    phenotype.order[..i].iter().zip(&phenotype.rotations[..i])
                {
                    let key = NfpKey::new(
                        rotations,
                        false,
                        parts[index_a].id,
                        parts[index_b].id,
                        rotation_a,
                        rotation_b,
                    );
                    requested.insert(key);
                    jobs.entry(key).or_insert(NfpJob {
                        key,
                        a: Some(index_a),
                        b: index_b,
                        rotation_a,
                        rotation_b,
                    });
                }
            }
        }

        (requested, jobs.into_values().collect())
    }

    /// Computes the missing NFPs in parallel and stores the successful ones.
    /// Failures stay uncached; the placement engine skips the affected part.
    fn compute_missing(&self, cache: &NfpCache, bin: &Polygon, parts: &[Polygon], jobs: Vec<NfpJob>) {
        let pending: Vec<NfpJob> = jobs
            .into_iter()
            .filter(|job| !cache.contains(job.key))
            .collect();

        let computed: Vec<(NfpKey, Option<Nfp>)> = pending
            .par_iter()
            .map(|job| {
                let b = parts[job.b].rotated(job.rotation_b);
                let nfp = match job.a {
                    None => compute_nfp(
                        bin,
                        &b,
                        true,
                        self.config.explore_concave,
                        false,
                        self.config.clipper_scale,
                    ),
                    Some(index_a) => {
                        let a = parts[index_a].rotated(job.rotation_a);
                        compute_nfp(
                            &a,
                            &b,
                            false,
                            self.config.explore_concave,
                            self.config.use_holes,
                            self.config.clipper_scale,
                        )
                    }
                };
                (job.key, nfp)
            })
            .collect();

        for (key, nfp) in computed {
            if let Some(nfp) = nfp {
                cache.insert(key, nfp);
            }
        }
    }

    fn run(
        &self,
        parts: &[Polygon],
        bin: &Polygon,
        progress: Option<ProgressCallback>,
    ) -> Result<SolveResult> {
        if parts.is_empty() {
            return Err(Error::NoParts);
        }
        if parts.len() > MAX_PARTS {
            return Err(Error::ConfigError(format!(
                "at most {MAX_PARTS} parts are supported, got {}",
                parts.len()
            )));
        }

        let start = Instant::now();

        let bin = self.prepare_bin(bin)?;
        let parts = self.prepare_parts(parts)?;

        let bin_area = bin.area().abs();
        let bin_bounds = bin.bounds();
        let parts_area: f64 = parts.iter().map(|p| p.area().abs()).sum();

        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut ga = Ga::new(
            parts.clone(),
            bin_bounds,
            self.config.population_size,
            self.config.mutation_rate,
            self.config.rotations,
            &mut rng,
        );

        let max_generations = match (self.config.max_generations, self.config.time_limit_ms) {
            (Some(limit), _) => limit,
            (None, Some(_)) => u32::MAX,
            (None, None) => DEFAULT_GENERATIONS,
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .build()
            .map_err(|e| Error::Internal(e.to_string()))?;

        let mut cache = NfpCache::new();
        let mut best: Option<PlaceResult> = None;
        let mut fitness_history = Vec::new();
        let mut generations = 0;
        let mut cancelled = false;

        for generation in 0..max_generations {
            if self.cancelled.load(Ordering::SeqCst) {
                cancelled = true;
                break;
            }
            if let Some(limit) = self.config.time_limit_ms {
                if start.elapsed().as_millis() as u64 >= limit && generation > 0 {
                    break;
                }
            }

            let (requested, jobs) = self.requested_keys(&ga, &parts);
            cache = cache.retain_requested(&requested);

            pool.install(|| self.compute_missing(&cache, &bin, &parts, jobs));
            log::debug!(
                "generation {}: {} NFPs cached for {} requested keys",
                generation,
                cache.len(),
                requested.len()
            );

            // evaluate the phenotypes the breeding step left unscored
            let pending: Vec<usize> = ga
                .population()
                .iter()
                .enumerate()
                .filter(|(_, p)| !p.is_evaluated())
                .map(|(i, _)| i)
                .collect();

            let evaluated: Vec<(usize, PlaceResult)> = pool.install(|| {
                pending
                    .par_iter()
                    .filter_map(|&index| {
                        if self.cancelled.load(Ordering::SeqCst) {
                            return None;
                        }
                        let phenotype = &ga.population()[index];
                        let ordered: Vec<Polygon> = phenotype
                            .order
                            .iter()
                            .zip(&phenotype.rotations)
                            .map(|(&part_index, &rotation)| {
                                let mut part = parts[part_index].clone();
                                part.rotation = rotation;
                                part
                            })
                            .collect();

                        let result = place_paths(
                            &ordered,
                            bin_area,
                            &cache,
                            self.config.rotations,
                            self.config.clipper_scale,
                        );
                        Some((index, result))
                    })
                    .collect()
            });

            for (index, result) in evaluated {
                ga.population_mut()[index].fitness = result.fitness;
                let improved = best
                    .as_ref()
                    .is_none_or(|current| result.fitness < current.fitness);
                if improved {
                    best = Some(result);
                }
            }

            // a cancel mid-generation leaves the skipped phenotypes unscored;
            // the partial generation is not counted
            if self.cancelled.load(Ordering::SeqCst) {
                cancelled = true;
                break;
            }

            generations = generation + 1;
            let best_fitness = best.as_ref().map_or(f64::INFINITY, |b| b.fitness);
            fitness_history.push(best_fitness);

            if let Some(callback) = &progress {
                let utilization = best
                    .as_ref()
                    .map_or(0.0, |b| utilization_of(b, &parts, parts_area, bin_area));
                callback(ProgressInfo {
                    generation,
                    best_fitness,
                    utilization,
                    elapsed_ms: start.elapsed().as_millis() as u64,
                });
            }

            ga.next_generation(&mut rng);
        }

        let best = match best {
            Some(best) => best,
            None if cancelled => return Err(Error::Cancelled),
            None => return Err(Error::Internal("no generation was evaluated".into())),
        };
        let utilization = utilization_of(&best, &parts, parts_area, bin_area);

        Ok(SolveResult {
            placements: best.flatten(),
            bins_used: best.bins.len(),
            utilization,
            unplaced: best.unplaced.clone(),
            computation_time_ms: start.elapsed().as_millis() as u64,
            generations,
            best_fitness: best.fitness,
            fitness_history,
            cancelled,
        })
    }
}

/// Placed part area over consumed bin area.
fn utilization_of(result: &PlaceResult, parts: &[Polygon], parts_area: f64, bin_area: f64) -> f64 {
    if result.bins.is_empty() || bin_area <= 0.0 {
        return 0.0;
    }
    let unplaced_area: f64 = result
        .unplaced
        .iter()
        .map(|&id| parts[id].area().abs())
        .sum();
    (parts_area - unplaced_area) / (bin_area * result.bins.len() as f64)
}

impl Solver for Nester {
    type Part = Polygon;
    type Bin = Polygon;

    fn solve_with_progress(
        &mut self,
        parts: &[Polygon],
        bin: &Polygon,
        progress: Option<ProgressCallback>,
    ) -> Result<SolveResult> {
        // a cancel issued before this call applied to the previous solve
        self.cancelled.store(false, Ordering::SeqCst);
        self.run(parts, bin, progress)
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}
