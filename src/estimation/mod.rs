// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Bayes factor of tumor versus clonal hematopoiesis origin for single mutations.

use bio::stats::bayesian::bayes_factors::evidence::KassRaftery;
use bio::stats::bayesian::bayes_factors::BayesFactor;
use bio::stats::LogProb;
use rand::Rng;

use crate::config::SamplerConfig;
use crate::errors::Error;
use crate::model::modes::{
    HematopoieticModel, ModelEstimate, Origin, OriginModel, SomaticModel,
};
use crate::model::priors::PriorSpec;
use crate::model::MutationObservation;

pub mod batch;
pub mod stability;

pub use batch::{estimate_batch, BatchEntry, BatchEstimator, BatchEstimatorBuilder, Override};

/// Marginal likelihoods of both origin models for one mutation and their log Bayes factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationResult {
    pub hematopoietic: ModelEstimate,
    pub somatic: ModelEstimate,
    /// `ln L(somatic) - ln L(hematopoietic)`, natural log.
    pub ln_bayes_factor: f64,
}

impl EstimationResult {
    fn new(hematopoietic: ModelEstimate, somatic: ModelEstimate) -> Self {
        let ln_bayes_factor = somatic.ln_marginal - hematopoietic.ln_marginal;
        EstimationResult {
            hematopoietic,
            somatic,
            ln_bayes_factor,
        }
    }

    /// Some importance weights underflowed completely. Retry with more samples or a
    /// larger prior weight.
    pub fn low_confidence(&self) -> bool {
        self.hematopoietic.is_degenerate() || self.somatic.is_degenerate()
    }

    /// The origin supported by the data (ties count as hematopoietic).
    ///
    /// `None` if the estimate is of low confidence, since the log Bayes factor is
    /// then infinite or NaN and carries no evidence.
    pub fn favored_origin(&self) -> Option<Origin> {
        if self.low_confidence() || !self.ln_bayes_factor.is_finite() {
            None
        } else if self.ln_bayes_factor > 0.0 {
            Some(Origin::Somatic)
        } else {
            Some(Origin::Hematopoietic)
        }
    }

    /// Bayes factor of the favored origin against the other one.
    pub fn bayes_factor(&self) -> Option<BayesFactor> {
        let (somatic, hematopoietic) = (self.somatic.ln_marginal(), self.hematopoietic.ln_marginal());
        self.favored_origin().map(|origin| match origin {
            Origin::Somatic => BayesFactor::new(somatic, hematopoietic),
            Origin::Hematopoietic => BayesFactor::new(hematopoietic, somatic),
        })
    }

    /// Kass-Raftery strength of the evidence for the favored origin.
    pub fn evidence(&self) -> Option<KassRaftery> {
        self.bayes_factor().map(|bf| bf.evidence_kass_raftery())
    }

    pub fn ln_bayes_factor(&self) -> LogProb {
        LogProb(self.ln_bayes_factor)
    }
}

/// Estimate the Bayes factor of somatic versus hematopoietic origin for one mutation.
///
/// All randomness is taken from `rng`, so repeated calls with identically seeded
/// generators yield identical results.
pub fn estimate<R: Rng + ?Sized>(
    observation: &MutationObservation,
    priors: &PriorSpec,
    config: &SamplerConfig,
    retain_draws: bool,
    rng: &mut R,
) -> Result<EstimationResult, Error> {
    priors.validate()?;
    config.validate()?;
    observation.validate()?;

    let hematopoietic =
        HematopoieticModel::new(priors.chip()).estimate(observation, config, retain_draws, rng)?;
    let somatic = SomaticModel::new(priors.ctdna(), priors.ctc())
        .estimate(observation, config, retain_draws, rng)?;

    let result = EstimationResult::new(hematopoietic, somatic);
    if result.low_confidence() {
        warn!(
            "{}: numerically degenerate marginal likelihood, Bayes factor is unreliable",
            observation.key()
        );
    }
    debug!(
        "{}: ln L(H)={:.4}, ln L(S)={:.4}, ln BF={:.4}",
        observation.key(),
        result.hematopoietic.ln_marginal,
        result.somatic.ln_marginal,
        result.ln_bayes_factor
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::config::Method;
    use crate::model::priors::{BetaPrior, LatentRole};
    use crate::model::{Compartment, Counts, MutationKey};

    fn observation(plasma: (u64, u64), buffy_coat: (u64, u64)) -> MutationObservation {
        MutationObservation::new(
            MutationKey::new("patient1".to_owned(), "TP53:c.524G>A".to_owned()),
            Counts::new(plasma.0, plasma.1),
            Counts::new(buffy_coat.0, buffy_coat.1),
        )
    }

    fn run(obs: &MutationObservation, config: &SamplerConfig, seed: u64) -> EstimationResult {
        let mut rng = StdRng::seed_from_u64(seed);
        estimate(obs, &PriorSpec::default(), config, false, &mut rng).unwrap()
    }

    #[test]
    fn test_weak_evidence_for_tumor() {
        let obs = observation((4, 1000), (0, 600));
        let result = run(&obs, &SamplerConfig::default(), 1);
        assert_relative_eq!(result.ln_bayes_factor, 1.8669667304375253, epsilon = 0.05);
        assert_eq!(result.favored_origin(), Some(Origin::Somatic));
        assert!(!result.low_confidence());
    }

    #[test]
    fn test_strong_evidence_for_tumor() {
        let obs = observation((395, 1750), (0, 963));
        let result = run(&obs, &SamplerConfig::default(), 2);
        assert_relative_eq!(result.ln_bayes_factor, 190.22197977497126, epsilon = 0.05);
        assert_eq!(result.evidence(), Some(KassRaftery::VeryStrong));
    }

    #[test]
    fn test_evidence_for_clonal_hematopoiesis() {
        let obs = observation((15, 2969), (5, 1495));
        let result = run(&obs, &SamplerConfig::default(), 3);
        assert_relative_eq!(result.ln_bayes_factor, -1.136009048201231, epsilon = 0.05);
        assert_eq!(result.favored_origin(), Some(Origin::Hematopoietic));
    }

    #[test]
    fn test_exact_method_matches_closed_form() {
        let obs = observation((15, 2969), (5, 1495));
        let config = SamplerConfig::default().with_method(Method::Exact);
        let result = run(&obs, &config, 0);
        assert_relative_eq!(result.ln_bayes_factor, -1.136009048201231, epsilon = 1e-6);
    }

    #[test]
    fn test_deterministic_given_seed() {
        let obs = observation((4, 1000), (0, 600));
        let config = SamplerConfig::default().with_samples(2000);
        assert_eq!(run(&obs, &config, 42), run(&obs, &config, 42));
        assert_ne!(
            run(&obs, &config, 42).ln_bayes_factor,
            run(&obs, &config, 43).ln_bayes_factor
        );
    }

    #[test]
    fn test_equal_fractions_favor_hematopoiesis() {
        let obs = observation((10, 1000), (10, 1000));
        let result = run(&obs, &SamplerConfig::default().with_samples(10000), 5);
        assert!(result.ln_bayes_factor < 0.0);
        assert_relative_eq!(result.ln_bayes_factor, -5.222227901411, epsilon = 0.1);
    }

    #[test]
    fn test_no_mutant_reads() {
        let obs = observation((0, 1000), (0, 600));
        let result = run(&obs, &SamplerConfig::default().with_samples(5000), 9);
        assert!(result.ln_bayes_factor.is_finite());
        assert!(!result.low_confidence());
    }

    #[test]
    fn test_retained_draws() {
        let obs = observation((4, 1000), (0, 600));
        let mut rng = StdRng::seed_from_u64(1);
        let config = SamplerConfig::default().with_samples(300);
        let result = estimate(&obs, &PriorSpec::default(), &config, true, &mut rng).unwrap();
        for role in &[LatentRole::Ctdna, LatentRole::Ctc] {
            let draws = result.somatic.component(*role).unwrap().draws.as_ref().unwrap();
            assert_eq!(draws.theta.len(), 300);
        }
        let draws = result.hematopoietic.component(LatentRole::Chip).unwrap().draws.as_ref();
        assert_eq!(draws.unwrap().ln_weights.len(), 300);
    }

    // Priors concentrated at 0, pure prior sampling and three draws: for many seeds
    // all draws of a latent fraction underflow to 0.
    fn degenerate_setting() -> (MutationObservation, PriorSpec, SamplerConfig) {
        let spiky = BetaPrior::new(1e-3, 1.0);
        (
            observation((5, 10), (5, 10)),
            PriorSpec::new(spiky, spiky, spiky),
            SamplerConfig::new(3, 1.0, Method::ImportanceSampling),
        )
    }

    #[test]
    fn test_degenerate_estimate_has_no_evidence() {
        let (obs, priors, config) = degenerate_setting();
        let results = (0..200)
            .map(|seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                estimate(&obs, &priors, &config, false, &mut rng).unwrap()
            })
            .collect::<Vec<_>>();
        let degenerate = results.iter().filter(|r| r.low_confidence()).collect::<Vec<_>>();
        assert!(!degenerate.is_empty());
        for result in degenerate {
            assert!(!result.ln_bayes_factor.is_finite());
            assert_eq!(result.favored_origin(), None);
            assert!(result.bayes_factor().is_none());
            assert_eq!(result.evidence(), None);
        }
        assert!(results
            .iter()
            .filter(|r| !r.low_confidence())
            .all(|r| r.favored_origin().is_some() && r.evidence().is_some()));
    }

    #[test]
    fn test_errors() {
        let mut rng = StdRng::seed_from_u64(1);
        let obs = observation((4, 1000), (0, 0));
        assert_eq!(
            estimate(&obs, &PriorSpec::default(), &SamplerConfig::default(), false, &mut rng),
            Err(Error::MissingCoverage {
                compartment: Compartment::BuffyCoat
            })
        );

        let obs = observation((4, 1000), (0, 600));
        let priors = PriorSpec::new(
            BetaPrior::new(1.0, 9.0),
            BetaPrior::new(1.0, 9.0),
            BetaPrior::new(1.0, -1000.0),
        );
        let res = estimate(&obs, &priors, &SamplerConfig::default(), false, &mut rng);
        assert!(res.unwrap_err().is_configuration_error());
    }
}
