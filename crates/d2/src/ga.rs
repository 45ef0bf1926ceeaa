//! Genetic search over part order and rotations.
//!
//! A phenotype is an insertion order (permutation of part indices) plus one
//! rotation angle per position. The search is elitist: each generation keeps
//! its best individual untouched and refills the rest by rank-weighted parent
//! selection, single-point crossover with duplicate repair, and per-gene
//! mutation (order swap with the next position, independent rotation
//! re-roll). Fitness comes from the placement engine and is lower-is-better;
//! an unevaluated phenotype carries `f64::INFINITY`.

use rand::prelude::*;

use crate::geometry::{Bounds, Polygon};

/// One individual: an insertion order over part indices and a rotation angle
/// (degrees) per position.
#[derive(Debug, Clone)]
pub struct Phenotype {
    /// Permutation of part indices (insertion order).
    pub order: Vec<usize>,
    /// Rotation angle in degrees for each position.
    pub rotations: Vec<f64>,
    /// Placement fitness, `f64::INFINITY` until evaluated.
    pub fitness: f64,
}

impl Phenotype {
    fn new(order: Vec<usize>, rotations: Vec<f64>) -> Self {
        Self {
            order,
            rotations,
            fitness: f64::INFINITY,
        }
    }

    pub fn is_evaluated(&self) -> bool {
        self.fitness.is_finite()
    }

    /// Prefix of this phenotype up to `at` (exclusive), fitness reset.
    fn cut(&self, at: usize) -> Phenotype {
        Phenotype::new(
            self.order[..at].to_vec(),
            self.rotations[..at].to_vec(),
        )
    }

    /// Appends the genes of `other` whose part index is not present yet.
    fn mate(&mut self, other: &Phenotype) {
        for (index, rotation) in other.order.iter().zip(&other.rotations) {
            if !self.order.contains(index) {
                self.order.push(*index);
                self.rotations.push(*rotation);
            }
        }
    }
}

/// Elitist genetic algorithm over phenotypes.
pub struct Ga {
    parts: Vec<Polygon>,
    bin_bounds: Bounds,
    rotations: u32,
    mutation_rate: u32,
    population: Vec<Phenotype>,
}

impl Ga {
    /// Seeds the population: the founding individual inserts parts in
    /// descending area order with a random feasible angle each, and the rest
    /// of the population are its mutants.
    pub fn new<R: Rng>(
        parts: Vec<Polygon>,
        bin_bounds: Bounds,
        population_size: usize,
        mutation_rate: u32,
        rotations: u32,
        rng: &mut R,
    ) -> Self {
        let mut ga = Self {
            parts,
            bin_bounds,
            rotations,
            mutation_rate,
            population: Vec::with_capacity(population_size),
        };

        let mut order: Vec<usize> = (0..ga.parts.len()).collect();
        order.sort_by(|&a, &b| {
            ga.parts[b]
                .area()
                .abs()
                .total_cmp(&ga.parts[a].area().abs())
        });

        let angles: Vec<f64> = order
            .iter()
            .map(|&index| ga.random_angle(&ga.parts[index], rng))
            .collect();

        let adam = Phenotype::new(order, angles);
        ga.population.push(adam);

        while ga.population.len() < population_size.max(1) {
            let mutant = ga.mutate(&ga.population[0].clone(), rng);
            ga.population.push(mutant);
        }

        ga
    }

    pub fn population(&self) -> &[Phenotype] {
        &self.population
    }

    /// Drops the whole population. A cleared search holds no individuals
    /// until it is reseeded.
    pub fn clear(&mut self) {
        self.population.clear();
    }

    pub fn population_mut(&mut self) -> &mut [Phenotype] {
        &mut self.population
    }

    /// Best evaluated individual so far, `None` when cleared.
    pub fn best(&self) -> Option<&Phenotype> {
        self.population
            .iter()
            .min_by(|a, b| a.fitness.total_cmp(&b.fitness))
    }

    /// Breeds the next generation. The fittest individual survives
    /// unchanged; the remainder are mutated children of rank-weighted
    /// parent pairs.
    pub fn next_generation<R: Rng>(&mut self, rng: &mut R) {
        self.population
            .sort_by(|a, b| a.fitness.total_cmp(&b.fitness));

        let size = self.population.len();
        let mut next = vec![self.population[0].clone()];

        while next.len() < size {
            let male = self.select_weighted(None, rng);
            let female = self.select_weighted(Some(male), rng);

            let (first, second) = self.crossover(
                &self.population[male].clone(),
                &self.population[female].clone(),
                rng,
            );

            next.push(self.mutate(&first, rng));
            if next.len() < size {
                next.push(self.mutate(&second, rng));
            }
        }

        self.population = next;
    }

    /// Picks a random feasible angle: the rotation buckets are shuffled and
    /// the first one whose rotated bounds fit the bin wins, falling back
    /// to 0.
    fn random_angle<R: Rng>(&self, part: &Polygon, rng: &mut R) -> f64 {
        let count = self.rotations.max(1) as usize;
        let step = 360.0 / count as f64;

        let mut angles: Vec<f64> = (0..count).map(|i| i as f64 * step).collect();
        angles.shuffle(rng);

        for angle in angles {
            let bounds = part.rotated(angle).bounds();
            if bounds.width < self.bin_bounds.width && bounds.height < self.bin_bounds.height {
                return angle;
            }
        }

        0.0
    }

    /// Per-gene mutation: a `mutation_rate`% chance to swap a position with
    /// the next one, and an independent equal chance to re-roll the rotation.
    fn mutate<R: Rng>(&self, individual: &Phenotype, rng: &mut R) -> Phenotype {
        let threshold = 0.01 * self.mutation_rate as f64;
        let mut clone = Phenotype::new(individual.order.clone(), individual.rotations.clone());
        let size = clone.order.len();

        for i in 0..size {
            if rng.gen::<f64>() < threshold && i + 1 < size {
                clone.order.swap(i, i + 1);
            }

            if rng.gen::<f64>() < threshold {
                clone.rotations[i] = self.random_angle(&self.parts[clone.order[i]], rng);
            }
        }

        clone
    }

    /// Single-point crossover: each child takes one parent's prefix and
    /// repairs the tail from the other parent, skipping duplicates.
    fn crossover<R: Rng>(
        &self,
        male: &Phenotype,
        female: &Phenotype,
        rng: &mut R,
    ) -> (Phenotype, Phenotype) {
        let len = male.order.len();
        let cut = (rng.gen::<f64>().clamp(0.1, 0.9) * (len.saturating_sub(1)) as f64).round()
            as usize;

        let mut first = male.cut(cut);
        let mut second = female.cut(cut);

        first.mate(female);
        second.mate(male);

        (first, second)
    }

    /// Rank-weighted parent selection: the population is sorted ascending by
    /// fitness, and selection probability decreases linearly with rank.
    fn select_weighted<R: Rng>(&self, exclude: Option<usize>, rng: &mut R) -> usize {
        let indices: Vec<usize> = (0..self.population.len())
            .filter(|&i| Some(i) != exclude)
            .collect();

        let size = indices.len();
        let rand: f64 = rng.gen();
        let weight = 2.0 / size as f64;
        let mut lower = 0.0;
        let mut upper = weight / 2.0;

        for (rank, &index) in indices.iter().enumerate() {
            if rand > lower && rand < upper {
                return index;
            }
            lower = upper;
            upper += weight * ((size - rank) as f64 / size as f64);
        }

        indices[0]
    }
}
