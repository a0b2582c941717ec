use crate::base::*;
use function_name::named;
use ndarray::prelude::*;

/// Minor allele frequency from the effect allele frequency, i.e. folding around 0.5
/// Frequencies outside [0, 1] are rejected.
#[named]
pub fn eaf_to_maf(eaf: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&eaf) {
        return Err(RatioError::InvalidInput(format!(
            "{}: effect allele frequency {} is outside [0, 1]",
            function_name!(),
            eaf
        )));
    }
    if eaf <= 0.5 {
        Ok(eaf)
    } else {
        Ok(1.0 - eaf)
    }
}

pub fn eafs_to_mafs(eaf: &Array1<f64>) -> Result<Array1<f64>> {
    eaf.iter()
        .map(|&f| eaf_to_maf(f))
        .collect::<Result<Vec<f64>>>()
        .map(Array1::from_vec)
}
