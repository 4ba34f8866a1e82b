// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Monte Carlo stability of the Bayes factor.
//!
//! Repeats the estimation of a single mutation with independent random streams,
//! for a grid of sample counts and prior weights, and reports the spread of the
//! resulting log Bayes factors.

use itertools::Itertools;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::config::SamplerConfig;
use crate::errors::Error;
use crate::estimation::estimate;
use crate::model::priors::PriorSpec;
use crate::model::MutationObservation;

/// Spread of repeated log Bayes factor estimates for one sampler setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityRecord {
    pub samples: usize,
    pub prior_weight: f64,
    pub repetitions: usize,
    pub mean_ln_bayes_factor: f64,
    pub sd_ln_bayes_factor: f64,
    pub min_ln_bayes_factor: f64,
    pub max_ln_bayes_factor: f64,
}

impl StabilityRecord {
    fn new(config: &SamplerConfig, values: &[f64]) -> Self {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let sd = if values.len() > 1 {
            (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
        } else {
            0.0
        };
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
                (min.min(*v), max.max(*v))
            });
        StabilityRecord {
            samples: *config.samples(),
            prior_weight: *config.prior_weight(),
            repetitions: values.len(),
            mean_ln_bayes_factor: mean,
            sd_ln_bayes_factor: sd,
            min_ln_bayes_factor: min,
            max_ln_bayes_factor: max,
        }
    }
}

/// Estimate the log Bayes factor `repetitions` times for every combination of sample
/// count and prior weight.
///
/// Repetition `i` of every setting uses the random stream seeded with `seed + i`.
pub fn stability(
    observation: &MutationObservation,
    priors: &PriorSpec,
    base_config: &SamplerConfig,
    samples: &[usize],
    prior_weights: &[f64],
    repetitions: usize,
    seed: u64,
) -> Result<Vec<StabilityRecord>, Error> {
    if repetitions == 0 {
        return Err(Error::InvalidRepetitions);
    }
    let configs = samples
        .iter()
        .cartesian_product(prior_weights.iter())
        .map(|(n, w)| base_config.with_samples(*n).with_prior_weight(*w))
        .collect_vec();
    for config in &configs {
        config.validate()?;
    }
    priors.validate()?;
    observation.validate()?;

    info!(
        "Running {} repetitions for {} sampler settings on {}.",
        repetitions,
        configs.len(),
        observation.key()
    );

    configs
        .iter()
        .map(|config| -> Result<StabilityRecord, Error> {
            let values = (0..repetitions)
                .into_par_iter()
                .map(|i| {
                    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
                    estimate(observation, priors, config, false, &mut rng)
                        .map(|res| res.ln_bayes_factor)
                })
                .collect::<Result<Vec<f64>, Error>>()?;
            let record = StabilityRecord::new(config, &values);
            debug!(
                "N={}, w={}: mean ln BF {:.4}, sd {:.4}",
                record.samples,
                record.prior_weight,
                record.mean_ln_bayes_factor,
                record.sd_ln_bayes_factor
            );
            Ok(record)
        })
        .collect()
}
