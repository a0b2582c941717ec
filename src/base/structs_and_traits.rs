//! Structs and Traits

use crate::base::{parse_maf_threshold, parse_tolerance, Result};
use arrow::array::ArrayRef;
use clap::{Args, ValueEnum};
use ndarray::prelude::*;

/// The entry point summary statistics file struct, i.e. one single-metabolite GWAS
/// - `filename` - filename of the summary statistics (`*.parquet`, `*.parquet.gz`, `*.tsv`, `*.tsv.gz`, `*.csv`, or `*.csv.gz`)
#[derive(Debug, Clone)]
pub struct FileSumStats {
    pub filename: String,
}

/// Summary statistics of a single metabolite, one row per variant
/// A variant is keyed by `(chromosome, base_pair_location, effect_allele, other_allele)` which must be unique per table.
#[derive(Debug, Clone, PartialEq)]
pub struct SumStats {
    pub chromosome: Vec<String>,              // chromosome or scaffold name
    pub base_pair_location: Vec<u64>,         // position in number of bases
    pub effect_allele: Vec<String>,           // allele whose effect is reported
    pub other_allele: Vec<String>,            // reference allele
    pub beta: Array1<f64>,                    // effect size
    pub se: Array1<f64>,                      // standard error of beta
    pub effect_allele_frequency: Array1<f64>, // frequency of the effect allele in [0, 1]
}

/// Columns of an input table which are not needed for the ratio but are carried into the output
#[derive(Debug, Clone, Default)]
pub struct Passthrough {
    pub names: Vec<String>,
    pub columns: Vec<ArrayRef>,
}

/// Summary statistics loaded from file along with the columns we only pass through
#[derive(Debug, Clone)]
pub struct LoadedSumStats {
    pub sumstats: SumStats,
    pub passthrough: Passthrough,
}

/// Inner join of the numerator (`_1`) and denominator (`_2`) summary statistics
#[derive(Debug, Clone, PartialEq)]
pub struct MergedSumStats {
    pub chromosome: Vec<String>,
    pub base_pair_location: Vec<u64>,
    pub effect_allele: Vec<String>,
    pub other_allele: Vec<String>,
    pub row_1: Vec<usize>, // row index into the numerator table
    pub row_2: Vec<usize>, // row index into the denominator table
    pub beta_1: Array1<f64>,
    pub se_1: Array1<f64>,
    pub effect_allele_frequency_1: Array1<f64>,
    pub beta_2: Array1<f64>,
    pub se_2: Array1<f64>,
    pub effect_allele_frequency_2: Array1<f64>,
}

/// Summary statistics of the ratio of two metabolites
#[derive(Debug, Clone, PartialEq)]
pub struct RatioSumStats {
    pub merged: MergedSumStats, // MAF-filtered join
    pub correlation: f64,       // estimated correlation between the measurement errors of the two metabolites
    pub maf: Array1<f64>,       // minor allele frequency from the numerator
    pub z_1: Array1<f64>,
    pub z_2: Array1<f64>,
    pub se: Array1<f64>,
    pub beta: Array1<f64>,
    pub z: Array1<f64>,
    pub p_value: Array1<f64>, // two-sided
}

/// Strongest association of one of the three traits (ratio, numerator, or denominator)
#[derive(Debug, Clone, PartialEq)]
pub struct TopHit {
    pub trait_name: String,
    pub chromosome: String,
    pub base_pair_location: u64,
    pub effect_allele: String,
    pub other_allele: String,
    pub z: f64,
    pub p_value: f64,
}

/// What to do with output rows whose ratio variance is zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ZeroVariancePolicy {
    /// Divide anyway and keep the resulting infinite or NaN z-scores
    Propagate,
    /// Fail on the first variant with zero ratio variance, whatever its beta
    Reject,
}

/// Root finding settings for the genomic-control calibration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationSettings {
    pub max_iters: u64,
    pub tolerance: f64,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        CalibrationSettings {
            max_iters: 100,
            tolerance: 2e-12,
        }
    }
}

/// Ratio computation settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioSettings {
    pub maf_threshold: f64,
    pub zero_variance: ZeroVariancePolicy,
    pub calibration: CalibrationSettings,
}

impl Default for RatioSettings {
    fn default() -> Self {
        RatioSettings {
            maf_threshold: 0.01,
            zero_variance: ZeroVariancePolicy::Propagate,
            calibration: CalibrationSettings::default(),
        }
    }
}

#[derive(Args)]
#[clap(next_help_heading = "General")]
pub struct GeneralArgs {
    /// Summary statistics of the first metabolite (numerator): parquet or delimited text, optionally gzipped
    #[clap(long)]
    pub met1: String,
    /// Summary statistics of the second metabolite (denominator): parquet or delimited text, optionally gzipped
    #[clap(long)]
    pub met2: String,
    /// Output filename (*.parquet, or *.tsv / *.txt / *.csv for delimited text)
    #[clap(long)]
    pub out: String,
}

#[derive(Args)]
#[clap(next_help_heading = "Filtering")]
pub struct FilterArgs {
    /// Minor allele frequency threshold (variants with maf at or below this value are omitted; negative keeps all)
    #[clap(long, default_value_t = 0.01, allow_negative_numbers = true, value_parser = parse_maf_threshold)]
    pub maf: f64,
    /// Handling of output rows with zero ratio variance (infinite or NaN z-scores)
    #[clap(long, value_enum, default_value_t = ZeroVariancePolicy::Propagate)]
    pub zero_variance: ZeroVariancePolicy,
}

#[derive(Args)]
#[clap(next_help_heading = "Calibration")]
pub struct CalibrationArgs {
    /// Maximum number of root finding iterations when estimating the correlation
    #[clap(long, default_value_t = 100)]
    pub max_iters: u64,
    /// Absolute tolerance on the estimated correlation
    #[clap(long, default_value_t = 2e-12, value_parser = parse_tolerance)]
    pub tolerance: f64,
}

////////////////////////////////////////////////////////////////////////////////
/// # TRAITS
////////////////////////////////////////////////////////////////////////////////

pub trait CheckStruct {
    fn check(&self) -> Result<()>;
}

pub trait Parse<T> {
    fn lparse(&self) -> Result<T>;
}

pub trait Subset {
    fn subset(&self, idx: &[usize]) -> Self;
}

pub trait SaveTable {
    fn write_table(
        &self,
        passthrough_1: &Passthrough,
        passthrough_2: &Passthrough,
        out: &String,
    ) -> Result<String>;
}
