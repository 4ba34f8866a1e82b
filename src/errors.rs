// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use thiserror::Error;

use crate::model::priors::LatentRole;
use crate::model::Compartment;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("invalid number of Monte Carlo samples: must be at least 1")]
    InvalidSampleCount,
    #[error("invalid number of repetitions: must be at least 1")]
    InvalidRepetitions,
    #[error("invalid prior weight {weight}: must be within [0, 1]")]
    InvalidPriorWeight { weight: f64 },
    #[error("invalid Beta prior for {role}: shape parameters a={a}, b={b} must be finite and > 0")]
    InvalidBetaShape { role: LatentRole, a: f64, b: f64 },
    #[error("invalid counts in {compartment}: {alt} mutant reads exceed total depth {depth}")]
    AltExceedsDepth {
        compartment: Compartment,
        alt: u64,
        depth: u64,
    },
    #[error("no coverage in {compartment}: total depth is 0")]
    MissingCoverage { compartment: Compartment },
}

impl Error {
    /// Errors caused by an invalid prior or sampler configuration.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidSampleCount
                | Error::InvalidRepetitions
                | Error::InvalidPriorWeight { .. }
                | Error::InvalidBetaShape { .. }
        )
    }

    /// Errors caused by malformed read counts of a single mutation.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            Error::AltExceedsDepth { .. } | Error::MissingCoverage { .. }
        )
    }
}
