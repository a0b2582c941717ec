use crate::base::*;
use argmin::core::{CostFunction, Error as ArgminError, Executor, State};
use argmin::solver::brent::BrentRoot;
use function_name::named;
use log::{debug, info};
use ndarray::prelude::*;
use ndarray::Zip;

/// Median of the chi-squared distribution with 1 degree of freedom
pub const CHISQ_1DF_MEDIAN: f64 = 0.454936423119572;

/// Variance of beta_1 - beta_2 given the correlation of their errors, clamped at zero
pub fn ratio_variance(correlation: f64, se_1: f64, se_2: f64) -> f64 {
    let var = se_1.powi(2) + se_2.powi(2) - 2.0 * correlation * se_1 * se_2;
    if var < 0.0 {
        0.0
    } else {
        var
    }
}

/// Naive ratio z-scores under a trial correlation
/// Variants with zero ratio standard error get a z-score of exactly zero.
pub fn ratio_z_for_calibration(
    correlation: f64,
    beta_1: ArrayView1<f64>,
    se_1: ArrayView1<f64>,
    beta_2: ArrayView1<f64>,
    se_2: ArrayView1<f64>,
) -> Array1<f64> {
    Zip::from(beta_1)
        .and(se_1)
        .and(beta_2)
        .and(se_2)
        .map_collect(|&b1, &s1, &b2, &s2| {
            let se = ratio_variance(correlation, s1, s2).sqrt();
            if se == 0.0 {
                0.0
            } else {
                (b1 - b2) / se
            }
        })
}

/// Genomic-control inflation factor (λ), i.e. the median of the squared z-scores over its null expectation
pub fn genomic_inflation(z: ArrayView1<f64>) -> f64 {
    let mut chisq: Vec<f64> = z.iter().map(|x| x.powi(2)).collect();
    median(&mut chisq) / CHISQ_1DF_MEDIAN
}

/// Genomic-control calibration of the ratio of two metabolites
/// Borrows the merged effects and standard errors
#[derive(Debug, Clone)]
pub struct GenomicControl<'a> {
    pub beta_1: ArrayView1<'a, f64>,
    pub se_1: ArrayView1<'a, f64>,
    pub beta_2: ArrayView1<'a, f64>,
    pub se_2: ArrayView1<'a, f64>,
}

impl<'a> GenomicControl<'a> {
    pub fn new(merged: &'a MergedSumStats) -> Self {
        GenomicControl {
            beta_1: merged.beta_1.view(),
            se_1: merged.se_1.view(),
            beta_2: merged.beta_2.view(),
            se_2: merged.se_2.view(),
        }
    }

    /// λ - 1 of the naive ratio z-scores at the trial correlation
    pub fn objective(&self, correlation: f64) -> f64 {
        let z = ratio_z_for_calibration(
            correlation,
            self.beta_1,
            self.se_1,
            self.beta_2,
            self.se_2,
        );
        genomic_inflation(z.view()) - 1.0
    }
}

impl CostFunction for GenomicControl<'_> {
    type Param = f64;
    type Output = f64;
    fn cost(&self, correlation: &Self::Param) -> std::result::Result<Self::Output, ArgminError> {
        Ok(self.objective(*correlation))
    }
}

/// Root of a cost function over the correlation bracket [-1, 1] with Brent's method
/// Returns the root and the number of iterations. An exact zero at a bracket end is returned as is.
#[named]
fn find_correlation_root<P>(problem: P, settings: &CalibrationSettings) -> Result<(f64, u64)>
where
    P: CostFunction<Param = f64, Output = f64>,
{
    let evaluate = |c: f64| {
        problem.cost(&c).map_err(|e| {
            RatioError::Calibration(format!("{}: objective failed at {}: {}", function_name!(), c, e))
        })
    };
    let lower = evaluate(-1.0)?;
    let upper = evaluate(1.0)?;
    debug!(
        "{}: λ - 1 is {} at correlation -1 and {} at correlation 1",
        function_name!(),
        lower,
        upper
    );
    if !lower.is_finite() || !upper.is_finite() {
        return Err(RatioError::Calibration(format!(
            "{}: non-finite objective at the bracket ends ({}, {})",
            function_name!(),
            lower,
            upper
        )));
    }
    if lower == 0.0 {
        return Ok((-1.0, 0));
    }
    if upper == 0.0 {
        return Ok((1.0, 0));
    }
    if lower.signum() == upper.signum() {
        return Err(RatioError::Calibration(format!(
            "{}: λ - 1 does not change sign over [-1, 1] ({} and {}); the two summary statistics cannot be calibrated",
            function_name!(),
            lower,
            upper
        )));
    }
    let solver = BrentRoot::new(-1.0, 1.0, settings.tolerance);
    let res = Executor::new(problem, solver)
        .configure(|state| state.max_iters(settings.max_iters))
        .run()
        .map_err(|e| {
            RatioError::Calibration(format!("{}: root finding failed: {}", function_name!(), e))
        })?;
    let state = res.state();
    let n_iters = state.get_iter();
    if n_iters >= settings.max_iters {
        return Err(RatioError::Calibration(format!(
            "{}: no convergence within {} iterations",
            function_name!(),
            settings.max_iters
        )));
    }
    match state.get_param() {
        Some(&c) if c.is_finite() => Ok((c.clamp(-1.0, 1.0), n_iters)),
        _ => Err(RatioError::Calibration(format!(
            "{}: root finding returned no correlation",
            function_name!()
        ))),
    }
}

/// Estimate the correlation between the measurement errors of the two metabolites
/// Finds the root of λ - 1 within [-1, 1] with Brent's method over all merged variants.
#[named]
pub fn estimate_correlation(
    merged: &MergedSumStats,
    settings: &CalibrationSettings,
) -> Result<f64> {
    if merged.is_empty() {
        return Err(RatioError::Calibration(format!(
            "{}: no variants to calibrate on",
            function_name!()
        )));
    }
    let (correlation, n_iters) = find_correlation_root(GenomicControl::new(merged), settings)?;
    info!(
        "Estimated correlation of {} after {} iterations over {} variants",
        correlation,
        n_iters,
        merged.len()
    );
    Ok(correlation)
}
