// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use bio::stats::{LogProb, Prob};

/// Posterior probability of somatic origin given the log Bayes factor (somatic over
/// hematopoietic) and the prior odds of somatic origin.
///
/// Computes `BF * odds / (1 + BF * odds)` as the logistic function of the log
/// posterior odds, so that huge Bayes factors saturate at 1 instead of overflowing.
pub fn posterior_prob_somatic(ln_bayes_factor: f64, prior_odds: f64) -> Prob {
    let ln_posterior_odds = ln_bayes_factor + prior_odds.ln();
    let ln_prob = if ln_posterior_odds >= 0.0 {
        -(-ln_posterior_odds).exp().ln_1p()
    } else {
        ln_posterior_odds - ln_posterior_odds.exp().ln_1p()
    };
    Prob::from(LogProb(ln_prob))
}
