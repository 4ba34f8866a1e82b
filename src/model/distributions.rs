// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Log-space densities of the Binomial read count model and the Beta allele
//! fraction priors, and the conjugate Beta posterior update.

use bio::stats::LogProb;
use statrs::function::beta::ln_beta;
use statrs::function::factorial::ln_binomial;

use crate::model::priors::BetaPrior;
use crate::model::{AlleleFreq, Counts};

/// Magnitude at which Beta log-densities are saturated at the support boundary.
pub const MAX_LN_DENSITY: f64 = 1e6;

/// `x * ln(p)` with the convention `0 * ln(0) = 0`.
fn xlogy(x: f64, p: f64) -> f64 {
    if x == 0.0 {
        0.0
    } else {
        x * p.ln()
    }
}

/// `x * ln(1 - p)` with the convention `0 * ln(0) = 0`.
fn xlog1my(x: f64, p: f64) -> f64 {
    if x == 0.0 {
        0.0
    } else {
        x * (-p).ln_1p()
    }
}

/// Log probability of observing `y` mutant reads out of `n` at allele fraction `theta`.
///
/// Impossible configurations (`y > n`, `theta` outside of `[0, 1]`) yield `ln(0)`.
pub fn ln_binomial_pmf(y: u64, n: u64, theta: AlleleFreq) -> LogProb {
    if y > n || !(0.0..=1.0).contains(&theta) {
        return LogProb::ln_zero();
    }
    let y_f = y as f64;
    let ref_f = (n - y) as f64;
    LogProb(ln_binomial(n, y) + xlogy(y_f, theta) + xlog1my(ref_f, theta))
}

/// Log likelihood of several compartments' counts sharing the same allele fraction.
pub fn ln_likelihood(counts: &[Counts], theta: AlleleFreq) -> LogProb {
    LogProb(
        counts
            .iter()
            .map(|c| *ln_binomial_pmf(c.alt, c.depth, theta))
            .sum(),
    )
}

/// Log density of a Beta prior at `theta`.
///
/// At the boundary of the support (or outside of it) the density may be zero or
/// unbounded. Such values are saturated to `±MAX_LN_DENSITY` so that sums over
/// draws stay finite.
pub fn ln_beta_pdf(theta: AlleleFreq, prior: &BetaPrior) -> LogProb {
    if !(0.0..=1.0).contains(&theta) {
        return LogProb(-MAX_LN_DENSITY);
    }
    let raw = xlogy(prior.a - 1.0, theta) + xlog1my(prior.b - 1.0, theta) - ln_beta(prior.a, prior.b);
    if raw.is_nan() {
        LogProb(-MAX_LN_DENSITY)
    } else {
        LogProb(raw.max(-MAX_LN_DENSITY).min(MAX_LN_DENSITY))
    }
}

/// Conjugate update of a Beta prior with Binomial counts.
pub fn beta_posterior(prior: &BetaPrior, counts: &Counts) -> BetaPrior {
    BetaPrior::new(
        prior.a + counts.alt as f64,
        prior.b + counts.ref_count() as f64,
    )
}

/// Closed form log marginal likelihood of Binomial counts under a Beta prior, where all
/// given compartments share one allele fraction.
pub fn ln_beta_binomial_marginal(prior: &BetaPrior, counts: &[Counts]) -> LogProb {
    let pooled = Counts::pooled(counts);
    let posterior = beta_posterior(prior, &pooled);
    let ln_coefficients: f64 = counts.iter().map(|c| ln_binomial(c.depth, c.alt)).sum();
    LogProb(ln_coefficients + ln_beta(posterior.a, posterior.b) - ln_beta(prior.a, prior.b))
}
