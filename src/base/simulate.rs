//! Simulated summary statistics for tests

use crate::base::SumStats;
use ndarray::prelude::*;
use rand::prelude::*;
use statrs::distribution::Normal;

/// Null summary statistics of two metabolites whose measurement errors correlate by `rho`
/// Standard errors are 0.1 for the numerator and 0.2 for the denominator, so that the
/// variance of the difference is 0.05 - 0.04 * rho.
pub fn simulate_pair(n: usize, rho: f64, seed: u64) -> (SumStats, SumStats) {
    let normal = Normal::new(0.0, 1.0).unwrap();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut beta_1 = Vec::with_capacity(n);
    let mut beta_2 = Vec::with_capacity(n);
    let mut eaf = Vec::with_capacity(n);
    for _ in 0..n {
        let e1: f64 = normal.sample(&mut rng);
        let e2: f64 = rho * e1 + (1.0 - rho * rho).sqrt() * normal.sample(&mut rng);
        beta_1.push(0.1 * e1);
        beta_2.push(0.2 * e2);
        eaf.push(rng.gen_range(0.05..0.95));
    }
    let chromosome: Vec<String> = (0..n).map(|i| format!("{}", 1 + (i % 22))).collect();
    let base_pair_location: Vec<u64> = (0..n).map(|i| 1_000 + 10 * i as u64).collect();
    let met1 = SumStats {
        chromosome: chromosome.clone(),
        base_pair_location: base_pair_location.clone(),
        effect_allele: vec!["A".to_owned(); n],
        other_allele: vec!["G".to_owned(); n],
        beta: Array1::from_vec(beta_1),
        se: Array1::from_elem(n, 0.1),
        effect_allele_frequency: Array1::from_vec(eaf.clone()),
    };
    let met2 = SumStats {
        chromosome,
        base_pair_location,
        effect_allele: vec!["A".to_owned(); n],
        other_allele: vec!["G".to_owned(); n],
        beta: Array1::from_vec(beta_2),
        se: Array1::from_elem(n, 0.2),
        effect_allele_frequency: Array1::from_vec(eaf),
    };
    (met1, met2)
}
