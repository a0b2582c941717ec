use crate::base::*;
use function_name::named;
use log::{debug, info};
use ndarray::prelude::*;
use std::collections::{HashMap, HashSet};

type VariantKey<'a> = (&'a str, u64, &'a str, &'a str);

/// Fail on the first variant key seen twice
#[named]
fn check_unique_variants(sumstats: &SumStats, label: &str) -> Result<()> {
    let mut seen = HashSet::with_capacity(sumstats.len());
    for i in 0..sumstats.len() {
        let key = sumstats.key(i);
        if !seen.insert(key) {
            return Err(RatioError::Join(format!(
                "{}: duplicated variant {}:{}:{}:{} in the {} table (row {})",
                function_name!(),
                key.0,
                key.1,
                key.2,
                key.3,
                label,
                i
            )));
        }
    }
    Ok(())
}

fn index_variants(sumstats: &SumStats) -> HashMap<VariantKey<'_>, usize> {
    (0..sumstats.len()).map(|i| (sumstats.key(i), i)).collect()
}

/// Inner join of the numerator and denominator summary statistics on
/// `(chromosome, base_pair_location, effect_allele, other_allele)`.
/// Rows follow the order of the numerator table.
#[named]
pub fn merge(met1: &SumStats, met2: &SumStats) -> Result<MergedSumStats> {
    met1.check()?;
    met2.check()?;
    check_unique_variants(met1, "numerator")?;
    check_unique_variants(met2, "denominator")?;
    let index_2 = index_variants(met2);
    let (row_1, row_2): (Vec<usize>, Vec<usize>) = (0..met1.len())
        .filter_map(|i| index_2.get(&met1.key(i)).map(|&j| (i, j)))
        .unzip();
    debug!(
        "{}: {} numerator and {} denominator variants, {} shared",
        function_name!(),
        met1.len(),
        met2.len(),
        row_1.len()
    );
    if row_1.is_empty() {
        return Err(RatioError::Join(format!(
            "{}: the numerator ({} variants) and denominator ({} variants) share no variants",
            function_name!(),
            met1.len(),
            met2.len()
        )));
    }
    let merged = MergedSumStats {
        chromosome: row_1.iter().map(|&i| met1.chromosome[i].clone()).collect(),
        base_pair_location: row_1.iter().map(|&i| met1.base_pair_location[i]).collect(),
        effect_allele: row_1.iter().map(|&i| met1.effect_allele[i].clone()).collect(),
        other_allele: row_1.iter().map(|&i| met1.other_allele[i].clone()).collect(),
        beta_1: met1.beta.select(Axis(0), &row_1),
        se_1: met1.se.select(Axis(0), &row_1),
        effect_allele_frequency_1: met1.effect_allele_frequency.select(Axis(0), &row_1),
        beta_2: met2.beta.select(Axis(0), &row_2),
        se_2: met2.se.select(Axis(0), &row_2),
        effect_allele_frequency_2: met2.effect_allele_frequency.select(Axis(0), &row_2),
        row_1,
        row_2,
    };
    info!("Merged {} shared variants", merged.len());
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sumstats(positions: &[u64], beta: &[f64]) -> SumStats {
        let n = positions.len();
        SumStats {
            chromosome: vec!["1".to_owned(); n],
            base_pair_location: positions.to_vec(),
            effect_allele: vec!["A".to_owned(); n],
            other_allele: vec!["G".to_owned(); n],
            beta: Array1::from_vec(beta.to_vec()),
            se: Array1::from_elem(n, 0.1),
            effect_allele_frequency: Array1::from_elem(n, 0.3),
        }
    }

    #[test]
    fn test_merge() {
        let met1 = sumstats(&[10, 20, 30, 40], &[1.0, 2.0, 3.0, 4.0]);
        let mut met2 = sumstats(&[40, 30, 50, 10], &[-4.0, -3.0, -5.0, -1.0]);
        // same position but a different allele pair is a different variant
        met2.effect_allele[2] = "T".to_owned();
        met2.base_pair_location[2] = 20;
        let merged = merge(&met1, &met2).unwrap();
        assert_eq!(merged.base_pair_location, vec![10, 30, 40]);
        assert_eq!(merged.row_1, vec![0, 2, 3]);
        assert_eq!(merged.row_2, vec![3, 1, 0]);
        for k in 0..merged.len() {
            assert_eq!(merged.beta_1[k], met1.beta[merged.row_1[k]]);
            assert_eq!(merged.beta_2[k], met2.beta[merged.row_2[k]]);
            assert_eq!(merged.beta_1[k], -merged.beta_2[k]);
            assert_eq!(met1.key(merged.row_1[k]), met2.key(merged.row_2[k]));
        }
    }

    #[test]
    fn test_merge_without_shared_variants() {
        let met1 = sumstats(&[10, 20], &[1.0, 2.0]);
        let met2 = sumstats(&[30, 40], &[1.0, 2.0]);
        assert!(matches!(merge(&met1, &met2), Err(RatioError::Join(_))));
    }

    #[test]
    fn test_merge_with_duplicated_variants() {
        let met1 = sumstats(&[10, 20, 10], &[1.0, 2.0, 3.0]);
        let met2 = sumstats(&[10, 20], &[1.0, 2.0]);
        assert!(matches!(merge(&met1, &met2), Err(RatioError::Join(_))));
        assert!(matches!(merge(&met2, &met1), Err(RatioError::Join(_))));
        assert!(check_unique_variants(&met2, "denominator").is_ok());
        // a differing allele makes a distinct variant
        let mut met3 = met1.clone();
        met3.other_allele[2] = "T".to_owned();
        assert!(check_unique_variants(&met3, "numerator").is_ok());
        assert_eq!(index_variants(&met3).len(), 3);
    }
}
