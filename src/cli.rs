// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use structopt::StructOpt;

use crate::config::{Config, Method};
use crate::estimation::stability::stability;
use crate::estimation::BatchEstimatorBuilder;
use crate::model::{Counts, MutationKey, MutationObservation};
use crate::table;

#[derive(Debug, StructOpt, Clone)]
#[structopt(
    name = "cfdna-origin",
    about = "Bayes factors of tumor versus clonal hematopoiesis origin for mutations found in \
             cell-free DNA, using read counts from matched white blood cells.",
    setting = structopt::clap::AppSettings::ColoredHelp
)]
pub struct CfdnaOrigin {
    #[structopt(long, short, global = true, help = "Print debug information.")]
    pub verbose: bool,
    #[structopt(long, short, global = true, help = "Only print warnings and errors.")]
    pub quiet: bool,
    #[structopt(subcommand)]
    pub command: Command,
}

/// Options shared by all subcommands that run the estimator.
#[derive(Debug, StructOpt, Clone)]
pub struct ConfigArgs {
    #[structopt(
        long,
        parse(from_os_str),
        help = "YAML file with Beta priors (ctdna, chip, ctc), Monte Carlo settings \
                (montecarlo.samples, montecarlo.method), prior.weight, retain_draws and seed. \
                Missing keys fall back to the defaults (see default-config)."
    )]
    pub config: Option<PathBuf>,
    #[structopt(
        long,
        help = "Number of Monte Carlo samples per latent allele fraction (overrides config)."
    )]
    pub samples: Option<usize>,
    #[structopt(
        long = "prior-weight",
        help = "Fraction of samples drawn from the prior instead of the conjugate posterior \
                (overrides config)."
    )]
    pub prior_weight: Option<f64>,
    #[structopt(long, help = "Seed of the random number generator (overrides config).")]
    pub seed: Option<u64>,
    #[structopt(
        long,
        help = "Use the closed form Beta-Binomial marginal likelihood instead of Monte Carlo \
                integration."
    )]
    pub exact: bool,
}

impl ConfigArgs {
    pub fn load(&self) -> Result<Config> {
        let mut config = match self.config {
            Some(ref path) => Config::from_path(path)?,
            None => Config::default(),
        };
        if let Some(samples) = self.samples {
            config.set_samples(samples);
        }
        if let Some(weight) = self.prior_weight {
            config.set_prior_weight(weight);
        }
        if let Some(seed) = self.seed {
            config.set_seed(seed);
        }
        if self.exact {
            config.set_method(Method::Exact);
        }
        Ok(config)
    }
}

#[derive(Debug, StructOpt, Clone)]
pub enum Command {
    #[structopt(
        name = "estimate",
        about = "Estimate the log Bayes factor (somatic over hematopoietic) for every mutation \
                 of a counts table."
    )]
    Estimate {
        #[structopt(flatten)]
        config: ConfigArgs,
        #[structopt(
            parse(from_os_str),
            help = "Tab separated counts table with columns sample, mutation, plasma_alt, \
                    plasma_depth, buffy_coat_alt, buffy_coat_depth (if omitted, read from STDIN)."
        )]
        counts: Option<PathBuf>,
        #[structopt(
            long,
            short,
            parse(from_os_str),
            help = "Tab separated results table (if omitted, write to STDOUT)."
        )]
        output: Option<PathBuf>,
        #[structopt(
            long = "prior-odds",
            help = "Prior odds of somatic origin. If given, the posterior probability of \
                    somatic origin is reported."
        )]
        prior_odds: Option<f64>,
        #[structopt(
            long = "retain-draws",
            help = "Keep Monte Carlo draws and importance weights (requires --draws-json)."
        )]
        retain_draws: bool,
        #[structopt(
            long = "draws-json",
            parse(from_os_str),
            help = "JSON file to write retained Monte Carlo draws to."
        )]
        draws_json: Option<PathBuf>,
        #[structopt(long, short = "t", help = "Number of threads to use.")]
        threads: Option<usize>,
    },
    #[structopt(
        name = "stability",
        about = "Repeat the estimation for a single mutation over a grid of sample counts and \
                 prior weights and report the spread of the log Bayes factor."
    )]
    Stability {
        #[structopt(flatten)]
        config: ConfigArgs,
        #[structopt(long = "plasma-alt", help = "Mutant reads in plasma.")]
        plasma_alt: u64,
        #[structopt(long = "plasma-depth", help = "Total reads in plasma.")]
        plasma_depth: u64,
        #[structopt(long = "buffy-coat-alt", help = "Mutant reads in buffy coat.")]
        buffy_coat_alt: u64,
        #[structopt(long = "buffy-coat-depth", help = "Total reads in buffy coat.")]
        buffy_coat_depth: u64,
        #[structopt(
            long = "grid-samples",
            default_value = "1000,10000,50000",
            use_delimiter = true,
            help = "Sample counts to evaluate."
        )]
        grid_samples: Vec<usize>,
        #[structopt(
            long = "grid-prior-weights",
            default_value = "0.1,1.0",
            use_delimiter = true,
            help = "Prior weights to evaluate."
        )]
        grid_prior_weights: Vec<f64>,
        #[structopt(long, default_value = "100", help = "Repetitions per setting.")]
        repetitions: usize,
        #[structopt(long, short = "t", help = "Number of threads to use.")]
        threads: Option<usize>,
    },
    #[structopt(
        name = "default-config",
        about = "Print the default configuration as YAML."
    )]
    DefaultConfig,
}

fn setup_threads(threads: Option<usize>) -> Result<()> {
    if let Some(threads) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
        info!("Using {} threads.", threads);
    }
    Ok(())
}

fn output_writer(path: &Option<PathBuf>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(File::create(path).with_context(|| {
            format!("unable to create output file {}", path.display())
        })?)),
        None => Box::new(BufWriter::new(io::stdout())),
    })
}

pub fn run(opt: CfdnaOrigin) -> Result<()> {
    match opt.command {
        Command::Estimate {
            ref config,
            ref counts,
            ref output,
            prior_odds,
            retain_draws,
            ref draws_json,
            threads,
        } => {
            setup_threads(threads)?;
            let mut config = config.load()?;
            if retain_draws {
                config.set_retain_draws(true);
            }
            if config.retain_draws() && draws_json.is_none() {
                warn!("Draws are retained but not written, specify --draws-json.");
            }
            if let Some(odds) = prior_odds {
                if !(odds > 0.0 && odds.is_finite()) {
                    anyhow::bail!("invalid prior odds {}: must be positive", odds);
                }
            }

            let observations = match counts {
                Some(path) => table::read_observations(BufReader::new(
                    File::open(path)
                        .with_context(|| format!("unable to open counts table {}", path.display()))?,
                ))?,
                None => table::read_observations(io::stdin())?,
            };

            let entries = BatchEstimatorBuilder::default()
                .priors(*config.priors())
                .config(config.sampler())
                .retain_draws(config.retain_draws())
                .seed(config.seed())
                .build()?
                .estimate(&observations)?;

            table::write_results(output_writer(output)?, &entries, prior_odds)?;
            if let Some(path) = draws_json {
                let file = File::create(path)
                    .with_context(|| format!("unable to create draws file {}", path.display()))?;
                table::write_draws(BufWriter::new(file), &entries)?;
            }
        }
        Command::Stability {
            ref config,
            plasma_alt,
            plasma_depth,
            buffy_coat_alt,
            buffy_coat_depth,
            ref grid_samples,
            ref grid_prior_weights,
            repetitions,
            threads,
        } => {
            setup_threads(threads)?;
            let config = config.load()?;
            let observation = MutationObservation::new(
                MutationKey::new("cli".to_owned(), "mutation".to_owned()),
                Counts::new(plasma_alt, plasma_depth),
                Counts::new(buffy_coat_alt, buffy_coat_depth),
            );
            let records = stability(
                &observation,
                config.priors(),
                &config.sampler(),
                grid_samples,
                grid_prior_weights,
                repetitions,
                config.seed(),
            )?;
            let mut writer = csv::WriterBuilder::new()
                .delimiter(b'\t')
                .from_writer(io::stdout());
            for record in records {
                writer.serialize(record)?;
            }
            writer.flush()?;
        }
        Command::DefaultConfig => {
            print!("{}", Config::default().to_yaml()?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_estimate() {
        let opt = CfdnaOrigin::from_iter(&[
            "cfdna-origin",
            "estimate",
            "--samples",
            "1000",
            "--prior-weight",
            "0.2",
            "--exact",
            "counts.tsv",
        ]);
        match opt.command {
            Command::Estimate {
                config, counts, ..
            } => {
                let config = config.load().unwrap();
                assert_eq!(*config.sampler().samples(), 1000);
                assert_relative_eq!(*config.sampler().prior_weight(), 0.2);
                assert_eq!(*config.sampler().method(), Method::Exact);
                assert_eq!(counts, Some(PathBuf::from("counts.tsv")));
            }
            _ => panic!("bug: unexpected subcommand"),
        }
    }

    #[test]
    fn test_parse_stability_grid() {
        let opt = CfdnaOrigin::from_iter(&[
            "cfdna-origin",
            "stability",
            "--plasma-alt",
            "4",
            "--plasma-depth",
            "1000",
            "--buffy-coat-alt",
            "0",
            "--buffy-coat-depth",
            "600",
            "--grid-samples",
            "100,200",
        ]);
        match opt.command {
            Command::Stability {
                grid_samples,
                grid_prior_weights,
                repetitions,
                ..
            } => {
                assert_eq!(grid_samples, vec![100, 200]);
                assert_eq!(grid_prior_weights, vec![0.1, 1.0]);
                assert_eq!(repetitions, 100);
            }
            _ => panic!("bug: unexpected subcommand"),
        }
    }
}
