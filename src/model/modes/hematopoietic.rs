// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use rand::Rng;

use crate::config::SamplerConfig;
use crate::errors::Error;
use crate::model::marginal::MarginalLikelihood;
use crate::model::modes::{ModelEstimate, Origin, OriginModel};
use crate::model::priors::{BetaPrior, LatentRole};
use crate::model::{Compartment, MutationObservation};

/// Clonal hematopoiesis: a single allele fraction shared by plasma and buffy coat.
///
/// The likelihood is the product of both compartments' Binomial likelihoods, the
/// proposal posterior is obtained from the pooled counts.
#[derive(new, Debug, Clone)]
pub struct HematopoieticModel<'a> {
    chip: &'a BetaPrior,
}

impl<'a> OriginModel for HematopoieticModel<'a> {
    fn origin(&self) -> Origin {
        Origin::Hematopoietic
    }

    fn estimate<R: Rng + ?Sized>(
        &self,
        observation: &MutationObservation,
        config: &SamplerConfig,
        retain_draws: bool,
        rng: &mut R,
    ) -> Result<ModelEstimate, Error> {
        let shared = MarginalLikelihood::new(LatentRole::Chip, self.chip, config, retain_draws)
            .estimate(
                &[
                    (Compartment::Plasma, *observation.plasma()),
                    (Compartment::BuffyCoat, *observation.buffy_coat()),
                ],
                rng,
            )?;
        Ok(ModelEstimate::from_components(self.origin(), vec![shared]))
    }
}
