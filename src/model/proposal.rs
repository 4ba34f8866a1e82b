// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Importance sampling proposal mixing an allele fraction prior with its
//! conjugate posterior.
//!
//! The posterior component concentrates draws where the likelihood has mass,
//! while the prior component keeps the proposal tails at least as heavy as
//! the prior's, which bounds the importance weights.

use bio::stats::LogProb;
use rand::distributions::Distribution;
use rand::Rng;
use statrs::distribution::Beta;

use crate::errors::Error;
use crate::model::distributions::ln_beta_pdf;
use crate::model::priors::{BetaPrior, LatentRole};
use crate::model::AlleleFreq;

/// Two component mixture `w * prior + (1 - w) * posterior` over allele fractions.
#[derive(Debug, Clone, Getters)]
pub struct MixtureProposal {
    #[get = "pub"]
    prior: BetaPrior,
    #[get = "pub"]
    posterior: BetaPrior,
    #[get = "pub"]
    prior_weight: f64,
    prior_dist: Beta,
    posterior_dist: Beta,
}

impl MixtureProposal {
    pub fn new(
        role: LatentRole,
        prior: BetaPrior,
        posterior: BetaPrior,
        prior_weight: f64,
    ) -> Result<Self, Error> {
        if !(0.0..=1.0).contains(&prior_weight) {
            return Err(Error::InvalidPriorWeight {
                weight: prior_weight,
            });
        }
        Ok(MixtureProposal {
            prior_dist: prior.distribution(role)?,
            posterior_dist: posterior.distribution(role)?,
            prior,
            posterior,
            prior_weight,
        })
    }

    /// Draw `n` allele fractions from the mixture.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> Vec<AlleleFreq> {
        (0..n).map(|_| self.sample(rng)).collect()
    }

    /// Log density of the mixture at `theta`.
    pub fn ln_density(&self, theta: AlleleFreq) -> LogProb {
        let ln_prior = ln_beta_pdf(theta, &self.prior);
        let ln_posterior = ln_beta_pdf(theta, &self.posterior);
        if self.prior_weight == 1.0 {
            ln_prior
        } else if self.prior_weight == 0.0 {
            ln_posterior
        } else {
            let ln_w = LogProb(self.prior_weight.ln());
            let ln_1mw = LogProb((-self.prior_weight).ln_1p());
            (ln_w + ln_prior).ln_add_exp(ln_1mw + ln_posterior)
        }
    }
}

impl Distribution<AlleleFreq> for MixtureProposal {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> AlleleFreq {
        if rng.gen_bool(self.prior_weight) {
            self.prior_dist.sample(rng)
        } else {
            self.posterior_dist.sample(rng)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::model::distributions::beta_posterior;
    use crate::model::Counts;

    fn proposal(weight: f64) -> MixtureProposal {
        let prior = BetaPrior::new(1.0, 9.0);
        let posterior = beta_posterior(&prior, &Counts::new(395, 1750));
        MixtureProposal::new(LatentRole::Ctdna, prior, posterior, weight).unwrap()
    }

    fn mean(values: &[f64]) -> f64 {
        values.iter().sum::<f64>() / values.len() as f64
    }

    #[test]
    fn test_invalid_weight() {
        let prior = BetaPrior::new(1.0, 9.0);
        for weight in &[-0.1, 1.1, f64::NAN] {
            assert!(MixtureProposal::new(LatentRole::Chip, prior, prior, *weight).is_err());
        }
    }

    #[test]
    fn test_draws_are_allele_fractions() {
        let mut rng = StdRng::seed_from_u64(1);
        let draws = proposal(0.1).draw(&mut rng, 5000);
        assert_eq!(draws.len(), 5000);
        assert!(draws.iter().all(|theta| (0.0..=1.0).contains(theta)));
    }

    #[test]
    fn test_pure_prior_sampling() {
        let mut rng = StdRng::seed_from_u64(2);
        let draws = proposal(1.0).draw(&mut rng, 20000);
        // Beta(1, 9) has mean 0.1, posterior Beta(396, 1364) has mean 0.225
        assert_relative_eq!(mean(&draws), 0.1, epsilon = 0.01);
    }

    #[test]
    fn test_pure_posterior_sampling() {
        let mut rng = StdRng::seed_from_u64(3);
        let p = proposal(0.0);
        let draws = p.draw(&mut rng, 20000);
        assert_relative_eq!(mean(&draws), p.posterior().mean(), epsilon = 0.002);
        assert!(draws.iter().all(|theta| *theta > 0.15 && *theta < 0.3));
    }

    #[test]
    fn test_density_degenerate_weights() {
        let pure_prior = proposal(1.0);
        let pure_posterior = proposal(0.0);
        for theta in &[0.05, 0.2, 0.225, 0.6] {
            assert_relative_eq!(
                *pure_prior.ln_density(*theta),
                *ln_beta_pdf(*theta, pure_prior.prior())
            );
            assert_relative_eq!(
                *pure_posterior.ln_density(*theta),
                *ln_beta_pdf(*theta, pure_posterior.posterior())
            );
        }
    }

    #[test]
    fn test_density_is_mixture() {
        let p = proposal(0.1);
        // ln_add_exp is accurate to about 1e-8 relative
        for theta in &[0.01, 0.1, 0.225, 0.5] {
            let expected = 0.1 * ln_beta_pdf(*theta, p.prior()).exp()
                + 0.9 * ln_beta_pdf(*theta, p.posterior()).exp();
            assert_relative_eq!(p.ln_density(*theta).exp(), expected, max_relative = 1e-7);
        }
        // far in the tail, the prior component keeps the density away from zero
        assert!(*p.ln_density(0.9) > 0.1f64.ln() + *ln_beta_pdf(0.9, p.prior()) - 1e-9);
    }
}
