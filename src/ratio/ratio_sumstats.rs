use crate::base::*;
use crate::ratio::{eafs_to_mafs, estimate_correlation, genomic_inflation, merge, ratio_variance};
use function_name::named;
use log::{info, warn};
use ndarray::prelude::*;
use ndarray::Zip;

/// Summary statistics of the ratio of two metabolites
///
/// 1. Inner join of the numerator (`met1`) and denominator (`met2`) on the variant keys
/// 2. Minor allele frequencies from the numerator and per-metabolite z-scores
/// 3. Correlation between the measurement errors estimated over all shared variants (genomic control)
/// 4. Variants with `maf <= maf_threshold` omitted
/// 5. Ratio effects `beta_1 - beta_2` with standard errors accounting for the correlation
///
/// Ratio z-scores are plain divisions, so variants with zero ratio variance get infinite z-scores
/// (NaN if their beta is zero too), unless `ZeroVariancePolicy::Reject` turns them into an error.
#[named]
pub fn calculate_ratio(
    met1: &SumStats,
    met2: &SumStats,
    settings: &RatioSettings,
) -> Result<RatioSumStats> {
    let merged = merge(met1, met2)?;
    let maf = eafs_to_mafs(&merged.effect_allele_frequency_1)?;
    let correlation = estimate_correlation(&merged, &settings.calibration)?;

    let idx: Vec<usize> = maf
        .iter()
        .enumerate()
        .filter(|&(_, &m)| m > settings.maf_threshold)
        .map(|(i, _)| i)
        .collect();
    info!(
        "Keeping {} of {} variants with minor allele frequency above {}",
        idx.len(),
        merged.len(),
        settings.maf_threshold
    );
    if idx.is_empty() {
        warn!("No variants left after minor allele frequency filtering");
    }
    let merged = merged.subset(&idx);
    let maf = maf.subset(&idx);

    let z_1 = &merged.beta_1 / &merged.se_1;
    let z_2 = &merged.beta_2 / &merged.se_2;
    let beta = &merged.beta_1 - &merged.beta_2;
    let se = Zip::from(&merged.se_1)
        .and(&merged.se_2)
        .map_collect(|&s1, &s2| ratio_variance(correlation, s1, s2).sqrt());
    let z = &beta / &se;

    // se and beta are finite, so only rows with zero ratio variance get non-finite z-scores
    let zero_variance: Vec<usize> = se
        .iter()
        .enumerate()
        .filter(|&(_, &s)| s == 0.0)
        .map(|(i, _)| i)
        .collect();
    if let Some(&i) = zero_variance.first() {
        match settings.zero_variance {
            ZeroVariancePolicy::Propagate => warn!(
                "{} variants have zero ratio variance and infinite (or NaN, if beta is zero) z-scores",
                zero_variance.len()
            ),
            ZeroVariancePolicy::Reject => {
                return Err(RatioError::InvalidInput(format!(
                    "{}: zero ratio variance with beta {} at {}:{}:{}:{} (and {} more)",
                    function_name!(),
                    beta[i],
                    merged.chromosome[i],
                    merged.base_pair_location[i],
                    merged.effect_allele[i],
                    merged.other_allele[i],
                    zero_variance.len() - 1
                )));
            }
        }
    }
    let p_value = z.mapv(two_sided_pvalue);

    Ok(RatioSumStats {
        merged,
        correlation,
        maf,
        z_1,
        z_2,
        se,
        beta,
        z,
        p_value,
    })
}

impl RatioSumStats {
    pub fn len(&self) -> usize {
        self.merged.len()
    }

    /// Genomic-control inflation factor of the ratio z-scores
    pub fn lambda(&self) -> f64 {
        genomic_inflation(self.z.view())
    }

    fn top_hit(&self, trait_name: &str, z: ArrayView1<f64>) -> Option<TopHit> {
        // NaN z-scores carry no evidence and are skipped
        let (i, p_value) = z
            .iter()
            .map(|&x| two_sided_pvalue(x))
            .enumerate()
            .filter(|(_, p)| !p.is_nan())
            .min_by(|a, b| a.1.total_cmp(&b.1))?;
        Some(TopHit {
            trait_name: trait_name.to_owned(),
            chromosome: self.merged.chromosome[i].clone(),
            base_pair_location: self.merged.base_pair_location[i],
            effect_allele: self.merged.effect_allele[i].clone(),
            other_allele: self.merged.other_allele[i].clone(),
            z: z[i],
            p_value,
        })
    }

    /// Strongest association of the ratio, the numerator, and the denominator
    pub fn top_hits(&self) -> Vec<TopHit> {
        [
            ("ratio", self.z.view()),
            ("numerator", self.z_1.view()),
            ("denominator", self.z_2.view()),
        ]
        .into_iter()
        .filter_map(|(name, z)| self.top_hit(name, z))
        .collect()
    }
}
