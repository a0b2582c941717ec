//! **metratio**: summary statistics of metabolite ratios from single-metabolite GWAS

use base::{
    prepare_ratio_settings, CalibrationArgs, FileSumStats, FilterArgs, GeneralArgs, Parse,
    SaveTable,
};
use clap::Parser;
use log::info;
mod base;
mod ratio;

#[derive(Parser)]
#[clap(
    version = "0.1.0",
    about = "Summary statistics for the ratio of two metabolites, accounting for the correlation between their measurement errors."
)]
struct Cli {
    #[command(flatten)]
    general_args: GeneralArgs,
    #[command(flatten)]
    filter_args: FilterArgs,
    #[command(flatten)]
    calibration_args: CalibrationArgs,
}

/// # metratio: summary statistics of metabolite ratios
/// - loads the summary statistics of the numerator (`--met1`) and denominator (`--met2`) metabolites
/// - joins them on chromosome, base pair location, effect allele, and other allele
/// - estimates the correlation between their measurement errors by genomic control (λ = 1)
/// - omits variants with minor allele frequency at or below `--maf`
/// - writes the ratio effects, standard errors, z-scores, and p-values into `--out`
///
/// ## Examples
/// ```shell
/// cargo run -- --met1 ./met1.parquet --met2 ./met2.parquet --out ./ratio.parquet
/// cargo run -- --met1 ./met1.tsv.gz --met2 ./met2.tsv.gz --out ./ratio.tsv --maf 0.05 --zero-variance reject
/// ```
fn run(cli: &Cli) -> base::Result<String> {
    let settings = prepare_ratio_settings(&cli.filter_args, &cli.calibration_args);
    let met1 = FileSumStats {
        filename: cli.general_args.met1.clone(),
    }
    .lparse()?;
    let met2 = FileSumStats {
        filename: cli.general_args.met2.clone(),
    }
    .lparse()?;
    let ratio_sumstats = ratio::calculate_ratio(&met1.sumstats, &met2.sumstats, &settings)?;
    info!(
        "Ratio genomic inflation factor (λ) across {} variants: {}",
        ratio_sumstats.len(),
        ratio_sumstats.lambda()
    );
    for hit in ratio_sumstats.top_hits() {
        info!(
            "Top hit of the {}: {}:{}:{}:{} (z = {}, p = {:e})",
            hit.trait_name,
            hit.chromosome,
            hit.base_pair_location,
            hit.effect_allele,
            hit.other_allele,
            hit.z,
            hit.p_value
        );
    }
    let fname_out = ratio_sumstats.write_table(
        &met1.passthrough,
        &met2.passthrough,
        &cli.general_args.out,
    )?;
    Ok(format!("FILE CREATED: {}", fname_out))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::simulate::simulate_pair;
    use crate::base::RatioError;
    use std::fs::File;
    use std::io::Write;

    fn write_tsv(sumstats: &base::SumStats, fname: &str) {
        let mut file = File::create(fname).unwrap();
        writeln!(
            file,
            "chromosome\tbase_pair_location\teffect_allele\tother_allele\tbeta\tse\teffect_allele_frequency\tpos_name"
        )
        .unwrap();
        for i in 0..sumstats.len() {
            writeln!(
                file,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\trs{}",
                sumstats.chromosome[i],
                sumstats.base_pair_location[i],
                sumstats.effect_allele[i],
                sumstats.other_allele[i],
                sumstats.beta[i],
                sumstats.se[i],
                sumstats.effect_allele_frequency[i],
                i
            )
            .unwrap();
        }
    }

    #[test]
    fn test_cli() {
        let dir = tempfile::tempdir().unwrap();
        let (met1, met2) = simulate_pair(3_000, 0.6, 21);
        let fname_1 = dir.path().join("met1.tsv").to_string_lossy().to_string();
        let fname_2 = dir.path().join("met2.tsv").to_string_lossy().to_string();
        let fname_out = dir.path().join("ratio.tsv").to_string_lossy().to_string();
        write_tsv(&met1, &fname_1);
        write_tsv(&met2, &fname_2);

        let cli = Cli::try_parse_from([
            "metratio", "--met1", fname_1.as_str(), "--met2", fname_2.as_str(), "--out", fname_out.as_str(), "--maf", "-1.0",
        ])
        .unwrap();
        assert_eq!(cli.filter_args.maf, -1.0);
        assert_eq!(cli.calibration_args.max_iters, 100);
        assert_eq!(run(&cli).unwrap(), format!("FILE CREATED: {}", fname_out));

        let text = std::fs::read_to_string(&fname_out).unwrap();
        let mut lines = text.lines();
        let header: Vec<&str> = lines.next().unwrap().split('\t').collect();
        assert!(header.contains(&"pos_name_1") && header.contains(&"pos_name_2"));
        let idx_beta = header.iter().position(|&x| x == "beta").unwrap();
        let rows: Vec<Vec<&str>> = lines.map(|l| l.split('\t').collect()).collect();
        // every variant is shared and the negative threshold keeps them all
        assert_eq!(rows.len(), met1.len());
        let beta_0: f64 = rows[0][idx_beta].parse().unwrap();
        assert!((beta_0 - (met1.beta[0] - met2.beta[0])).abs() < 1e-12);
    }

    #[test]
    fn test_cli_errors() {
        let dir = tempfile::tempdir().unwrap();
        let (met1, mut met2) = simulate_pair(100, 0.0, 22);
        met2.chromosome = met2.chromosome.iter().map(|c| format!("chr{}", c)).collect();
        let fname_1 = dir.path().join("met1.tsv").to_string_lossy().to_string();
        let fname_2 = dir.path().join("met2.tsv").to_string_lossy().to_string();
        let fname_out = dir.path().join("ratio.parquet").to_string_lossy().to_string();
        write_tsv(&met1, &fname_1);
        write_tsv(&met2, &fname_2);
        let cli = Cli::try_parse_from([
            "metratio", "--met1", fname_1.as_str(), "--met2", fname_2.as_str(), "--out", fname_out.as_str(),
        ])
        .unwrap();
        assert_eq!(cli.filter_args.maf, 0.01);
        assert!(matches!(run(&cli), Err(RatioError::Join(_))));
        assert!(!std::path::Path::new(&fname_out).exists());

        assert!(Cli::try_parse_from(["metratio", "--met1", fname_1.as_str(), "--out", fname_out.as_str()]).is_err());
        assert!(Cli::try_parse_from([
            "metratio", "--met1", fname_1.as_str(), "--met2", fname_2.as_str(), "--out", fname_out.as_str(), "--tolerance", "0",
        ])
        .is_err());
    }
}
