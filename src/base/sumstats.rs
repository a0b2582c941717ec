use crate::base::*;
use function_name::named;
use ndarray::prelude::*;

impl SumStats {
    pub fn len(&self) -> usize {
        self.chromosome.len()
    }

    /// Join key of the i-th variant
    pub fn key(&self, i: usize) -> (&str, u64, &str, &str) {
        (
            self.chromosome[i].as_str(),
            self.base_pair_location[i],
            self.effect_allele[i].as_str(),
            self.other_allele[i].as_str(),
        )
    }
}

impl CheckStruct for SumStats {
    fn check(&self) -> Result<()> {
        check_sumstats(self)
    }
}

#[named]
fn check_sumstats(sumstats: &SumStats) -> Result<()> {
    let n = sumstats.len();
    let lengths = [
        sumstats.base_pair_location.len(),
        sumstats.effect_allele.len(),
        sumstats.other_allele.len(),
        sumstats.beta.len(),
        sumstats.se.len(),
        sumstats.effect_allele_frequency.len(),
    ];
    if lengths.iter().any(|&l| l != n) {
        return Err(RatioError::InvalidInput(format!(
            "{}: columns have inconsistent lengths ({} chromosomes vs {:?})",
            function_name!(),
            n,
            lengths
        )));
    }
    for i in 0..n {
        let (chromosome, position, effect_allele, other_allele) = sumstats.key(i);
        let describe = || {
            format!(
                "{}:{}:{}:{}",
                chromosome, position, effect_allele, other_allele
            )
        };
        if !sumstats.beta[i].is_finite() {
            return Err(RatioError::InvalidInput(format!(
                "{}: non-finite beta ({}) at {}",
                function_name!(),
                sumstats.beta[i],
                describe()
            )));
        }
        if !sumstats.se[i].is_finite() || sumstats.se[i] < 0.0 {
            return Err(RatioError::InvalidInput(format!(
                "{}: standard error must be finite and non-negative, found {} at {}",
                function_name!(),
                sumstats.se[i],
                describe()
            )));
        }
        let eaf = sumstats.effect_allele_frequency[i];
        if !(0.0..=1.0).contains(&eaf) {
            return Err(RatioError::InvalidInput(format!(
                "{}: effect allele frequency outside [0, 1] ({}) at {}",
                function_name!(),
                eaf,
                describe()
            )));
        }
    }
    Ok(())
}

impl MergedSumStats {
    pub fn len(&self) -> usize {
        self.chromosome.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Subset for MergedSumStats {
    fn subset(&self, idx: &[usize]) -> Self {
        MergedSumStats {
            chromosome: idx.iter().map(|&i| self.chromosome[i].clone()).collect(),
            base_pair_location: idx.iter().map(|&i| self.base_pair_location[i]).collect(),
            effect_allele: idx.iter().map(|&i| self.effect_allele[i].clone()).collect(),
            other_allele: idx.iter().map(|&i| self.other_allele[i].clone()).collect(),
            row_1: idx.iter().map(|&i| self.row_1[i]).collect(),
            row_2: idx.iter().map(|&i| self.row_2[i]).collect(),
            beta_1: self.beta_1.select(Axis(0), idx),
            se_1: self.se_1.select(Axis(0), idx),
            effect_allele_frequency_1: self.effect_allele_frequency_1.select(Axis(0), idx),
            beta_2: self.beta_2.select(Axis(0), idx),
            se_2: self.se_2.select(Axis(0), idx),
            effect_allele_frequency_2: self.effect_allele_frequency_2.select(Axis(0), idx),
        }
    }
}

impl Subset for Array1<f64> {
    fn subset(&self, idx: &[usize]) -> Self {
        self.select(Axis(0), idx)
    }
}
