// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Estimation over many mutations.
//!
//! Mutations are processed in parallel. Each one draws from its own random
//! stream, seeded with the batch seed plus the mutation's index in the input,
//! so results do not depend on the number of threads.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::config::{SamplerConfig, DEFAULT_SEED};
use crate::errors::Error;
use crate::estimation::{estimate, EstimationResult};
use crate::model::priors::PriorSpec;
use crate::model::{MutationKey, MutationObservation};

/// Result for one mutation of a batch, in input order.
pub type BatchEntry = (MutationKey, Result<EstimationResult, Error>);

/// Per-mutation replacement of the shared priors or sampler settings.
#[derive(new, Debug, Clone, Default, PartialEq)]
pub struct Override {
    pub priors: Option<PriorSpec>,
    pub config: Option<SamplerConfig>,
}

#[derive(Builder, Debug, Clone)]
#[builder(pattern = "owned")]
pub struct BatchEstimator {
    priors: PriorSpec,
    config: SamplerConfig,
    /// Keep raw draws and importance weights. Memory grows with the number of samples.
    #[builder(default)]
    retain_draws: bool,
    #[builder(default = "DEFAULT_SEED")]
    seed: u64,
    #[builder(default)]
    overrides: HashMap<MutationKey, Override>,
}

impl BatchEstimator {
    /// Random stream of the mutation at the given input index.
    pub fn rng(&self, index: usize) -> StdRng {
        StdRng::seed_from_u64(self.seed.wrapping_add(index as u64))
    }

    fn settings(&self, key: &MutationKey) -> (&PriorSpec, &SamplerConfig) {
        match self.overrides.get(key) {
            Some(o) => (
                o.priors.as_ref().unwrap_or(&self.priors),
                o.config.as_ref().unwrap_or(&self.config),
            ),
            None => (&self.priors, &self.config),
        }
    }

    /// Estimate all given mutations.
    ///
    /// Invalid shared priors or sampler settings abort the whole batch. Malformed counts
    /// and invalid overrides only fail the affected mutation.
    pub fn estimate(&self, observations: &[MutationObservation]) -> Result<Vec<BatchEntry>, Error> {
        self.priors.validate()?;
        self.config.validate()?;

        info!(
            "Estimating origin of {} mutations ({} samples per allele fraction, prior weight {}, {}).",
            observations.len(),
            self.config.samples(),
            self.config.prior_weight(),
            self.config.method()
        );

        let entries: Vec<BatchEntry> = observations
            .par_iter()
            .enumerate()
            .map(|(i, observation)| {
                let mut rng = self.rng(i);
                let (priors, config) = self.settings(observation.key());
                let result = estimate(observation, priors, config, self.retain_draws, &mut rng);
                if let Err(ref e) = result {
                    warn!("Skipping {}: {}", observation.key(), e);
                }
                (observation.key().clone(), result)
            })
            .collect();

        let failed = entries.iter().filter(|(_, res)| res.is_err()).count();
        let low_confidence = entries
            .iter()
            .filter(|(_, res)| res.as_ref().map_or(false, |r| r.low_confidence()))
            .count();
        info!(
            "Finished {} mutations ({} failed, {} with low confidence).",
            entries.len(),
            failed,
            low_confidence
        );

        Ok(entries)
    }
}

/// Estimate all given mutations with shared priors and sampler settings.
pub fn estimate_batch(
    observations: &[MutationObservation],
    priors: &PriorSpec,
    config: &SamplerConfig,
    retain_draws: bool,
    seed: u64,
) -> Result<Vec<BatchEntry>, Error> {
    BatchEstimator {
        priors: *priors,
        config: *config,
        retain_draws,
        seed,
        overrides: HashMap::new(),
    }
    .estimate(observations)
}
