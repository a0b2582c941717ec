use crate::base::{CalibrationArgs, CalibrationSettings, FilterArgs, RatioSettings};
use statrs::function::erf::erfc;
use std::f64::consts::SQRT_2;

/// Parse the minor allele frequency threshold
/// Any finite value is accepted: thresholds below zero keep every variant.
pub fn parse_maf_threshold(s: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        Ok(_) => Err(format!("{} is not a finite number", s)),
        Err(_) => Err(format!("{} is not a valid number", s)),
    }
}

/// Parse a strictly positive root finding tolerance
pub fn parse_tolerance(s: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => Ok(value),
        Ok(_) => Err(format!("{} must be a positive finite number", s)),
        Err(_) => Err(format!("{} is not a valid number", s)),
    }
}

pub fn prepare_ratio_settings(
    filter_args: &FilterArgs,
    calibration_args: &CalibrationArgs,
) -> RatioSettings {
    RatioSettings {
        maf_threshold: filter_args.maf,
        zero_variance: filter_args.zero_variance,
        calibration: CalibrationSettings {
            max_iters: calibration_args.max_iters,
            tolerance: calibration_args.tolerance,
        },
    }
}

/// Median of a slice, averaging the two central values for even lengths
/// Sorts in place. Returns NaN for empty input.
pub fn median(values: &mut [f64]) -> f64 {
    let n = values.len();
    if n == 0 {
        return f64::NAN;
    }
    values.sort_unstable_by(|a, b| a.total_cmp(b));
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}

/// Two-sided p-value of a standard normal test statistic, i.e. 2 * (1 - Phi(|z|))
pub fn two_sided_pvalue(z: f64) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }
    erfc(z.abs() / SQRT_2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median() {
        assert!(median(&mut []).is_nan());
        assert_eq!(median(&mut [3.0]), 3.0);
        assert_eq!(median(&mut [5.0, 1.0, 3.0]), 3.0);
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn test_two_sided_pvalue() {
        assert!((two_sided_pvalue(0.0) - 1.0).abs() < 1e-12);
        assert!((two_sided_pvalue(1.959963984540054) - 0.05).abs() < 1e-9);
        assert_eq!(two_sided_pvalue(-2.5), two_sided_pvalue(2.5));
        assert_eq!(two_sided_pvalue(f64::INFINITY), 0.0);
        assert!(two_sided_pvalue(f64::NAN).is_nan());
    }

    #[test]
    fn test_parse_arguments() {
        assert_eq!(parse_maf_threshold("0.01"), Ok(0.01));
        assert_eq!(parse_maf_threshold("-1.0"), Ok(-1.0));
        assert!(parse_maf_threshold("inf").is_err());
        assert!(parse_maf_threshold("one").is_err());
        assert_eq!(parse_tolerance("1e-10"), Ok(1e-10));
        assert!(parse_tolerance("0").is_err());
        assert!(parse_tolerance("-1e-3").is_err());
    }
}
