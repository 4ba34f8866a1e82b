// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Marginal likelihood of one latent allele fraction.
//!
//! The integral `L = ∫ Pr(counts | θ) Pr(θ) dθ` is estimated by importance
//! sampling from a [`MixtureProposal`](crate::model::proposal::MixtureProposal).
//! For draws `θ_i` with log weights
//! `ℓ_i = ln Pr(counts | θ_i) + ln Pr(θ_i) − ln g(θ_i)`,
//! the estimate is `ln L = ln Σ exp(ℓ_i) − ln N`.
//!
//! The average of the weights is unbiased for `L`. Its logarithm is biased low
//! (Jensen's inequality) and converges as `N` grows. This is inherent to any
//! Monte Carlo estimate of a log integral and is not corrected here.

use bio::stats::LogProb;
use itertools::Itertools;
use rand::Rng;

use crate::config::{Method, SamplerConfig};
use crate::errors::Error;
use crate::model::distributions::{
    beta_posterior, ln_beta_binomial_marginal, ln_beta_pdf, ln_likelihood,
};
use crate::model::priors::{BetaPrior, LatentRole};
use crate::model::proposal::MixtureProposal;
use crate::model::{AlleleFreq, Compartment, Counts};

/// Raw Monte Carlo draws and their log importance weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draws {
    pub theta: Vec<AlleleFreq>,
    pub ln_weights: Vec<f64>,
}

/// Estimated log marginal likelihood of one latent allele fraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginalEstimate {
    pub role: LatentRole,
    pub ln_marginal: f64,
    /// Effective sample size `(Σw)² / Σw²` of the importance weights.
    pub effective_sample_size: f64,
    /// All importance weights underflowed to zero.
    pub degenerate: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub draws: Option<Draws>,
}

impl MarginalEstimate {
    pub fn ln_marginal(&self) -> LogProb {
        LogProb(self.ln_marginal)
    }
}

/// `ln((1/N) Σ exp(ℓ_i))`, max-shifted so that extreme weights neither overflow nor underflow.
pub fn ln_mean_exp(ln_weights: &[LogProb]) -> LogProb {
    if ln_weights.is_empty() {
        return LogProb::ln_zero();
    }
    LogProb(*LogProb::ln_sum_exp(ln_weights) - (ln_weights.len() as f64).ln())
}

/// Effective sample size of importance weights given in log space.
pub fn effective_sample_size(ln_weights: &[LogProb]) -> f64 {
    let ln_sum = LogProb::ln_sum_exp(ln_weights);
    if *ln_sum == f64::NEG_INFINITY || ln_sum.is_nan() {
        return 0.0;
    }
    let squared = ln_weights.iter().map(|w| LogProb(2.0 * **w)).collect_vec();
    (2.0 * *ln_sum - *LogProb::ln_sum_exp(&squared)).exp()
}

/// Estimator for the marginal likelihood of an allele fraction that explains the
/// counts of one or more compartments.
#[derive(new, Debug)]
pub struct MarginalLikelihood<'a> {
    role: LatentRole,
    prior: &'a BetaPrior,
    config: &'a SamplerConfig,
    retain_draws: bool,
}

impl<'a> MarginalLikelihood<'a> {
    /// Estimate the log marginal likelihood of the given counts.
    ///
    /// Each entry of `counts` is paired with the compartment it stems from, which is
    /// only used for error reporting.
    pub fn estimate<R: Rng + ?Sized>(
        &self,
        counts: &[(Compartment, Counts)],
        rng: &mut R,
    ) -> Result<MarginalEstimate, Error> {
        self.config.validate()?;
        self.prior.validate(self.role)?;
        for (compartment, c) in counts {
            c.validate(*compartment)?;
        }
        let counts = counts.iter().map(|(_, c)| *c).collect_vec();

        match self.config.method() {
            Method::Exact => Ok(self.exact(&counts)),
            Method::ImportanceSampling => self.importance_sampling(&counts, rng),
        }
    }

    fn exact(&self, counts: &[Counts]) -> MarginalEstimate {
        let ln_marginal = ln_beta_binomial_marginal(self.prior, counts);
        debug!("{}: exact ln marginal likelihood {:.4}", self.role, *ln_marginal);
        MarginalEstimate {
            role: self.role,
            ln_marginal: *ln_marginal,
            effective_sample_size: f64::INFINITY,
            degenerate: false,
            draws: None,
        }
    }

    fn importance_sampling<R: Rng + ?Sized>(
        &self,
        counts: &[Counts],
        rng: &mut R,
    ) -> Result<MarginalEstimate, Error> {
        let posterior = beta_posterior(self.prior, &Counts::pooled(counts));
        let proposal = MixtureProposal::new(
            self.role,
            *self.prior,
            posterior,
            *self.config.prior_weight(),
        )?;

        let theta = proposal.draw(rng, *self.config.samples());
        let ln_weights = theta
            .iter()
            .map(|&t| {
                ln_likelihood(counts, t) + ln_beta_pdf(t, self.prior) - proposal.ln_density(t)
            })
            .collect_vec();

        let ln_marginal = ln_mean_exp(&ln_weights);
        let degenerate = *ln_marginal == f64::NEG_INFINITY || ln_marginal.is_nan();
        let effective_sample_size = effective_sample_size(&ln_weights);
        if degenerate {
            warn!(
                "{}: all {} importance weights underflowed, estimate is unreliable \
                 (consider more samples or a larger prior weight)",
                self.role,
                theta.len()
            );
        } else {
            debug!(
                "{}: ln marginal likelihood {:.4} (effective sample size {:.1} of {})",
                self.role,
                *ln_marginal,
                effective_sample_size,
                theta.len()
            );
        }

        let draws = if self.retain_draws {
            Some(Draws {
                theta,
                ln_weights: ln_weights.iter().map(|w| **w).collect(),
            })
        } else {
            None
        };

        Ok(MarginalEstimate {
            role: self.role,
            ln_marginal: *ln_marginal,
            effective_sample_size,
            degenerate,
            draws,
        })
    }
}
