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

/// Tumor origin: the plasma fraction (ctDNA) and the buffy coat fraction (circulating
/// tumor cell contamination) are independent, each informed by its own counts only.
#[derive(new, Debug, Clone)]
pub struct SomaticModel<'a> {
    ctdna: &'a BetaPrior,
    ctc: &'a BetaPrior,
}

impl<'a> OriginModel for SomaticModel<'a> {
    fn origin(&self) -> Origin {
        Origin::Somatic
    }

    fn estimate<R: Rng + ?Sized>(
        &self,
        observation: &MutationObservation,
        config: &SamplerConfig,
        retain_draws: bool,
        rng: &mut R,
    ) -> Result<ModelEstimate, Error> {
        let ctdna = MarginalLikelihood::new(LatentRole::Ctdna, self.ctdna, config, retain_draws)
            .estimate(&[(Compartment::Plasma, *observation.plasma())], rng)?;
        let ctc = MarginalLikelihood::new(LatentRole::Ctc, self.ctc, config, retain_draws)
            .estimate(&[(Compartment::BuffyCoat, *observation.buffy_coat())], rng)?;
        Ok(ModelEstimate::from_components(
            self.origin(),
            vec![ctdna, ctc],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::config::Method;
    use crate::model::{Counts, MutationKey};

    #[test]
    fn test_independent_fractions_add_up() {
        let ctdna = BetaPrior::new(1.0, 9.0);
        let ctc = BetaPrior::new(1.0, 1000.0);
        let observation = MutationObservation::new(
            MutationKey::new("s".to_owned(), "m".to_owned()),
            Counts::new(395, 1750),
            Counts::new(0, 963),
        );
        let config = SamplerConfig::new(1, 0.1, Method::Exact);
        let mut rng = StdRng::seed_from_u64(0);
        let estimate = SomaticModel::new(&ctdna, &ctc)
            .estimate(&observation, &config, false, &mut rng)
            .unwrap();
        let ctdna_est = estimate.component(LatentRole::Ctdna).unwrap();
        let ctc_est = estimate.component(LatentRole::Ctc).unwrap();
        assert_relative_eq!(
            estimate.ln_marginal,
            ctdna_est.ln_marginal + ctc_est.ln_marginal
        );
        assert_relative_eq!(estimate.ln_marginal, -7.9902900704688555, epsilon = 1e-6);
        // Beta(1, 1000) with no mutant reads in 963: ln(1000 / 1963)
        assert_relative_eq!(ctc_est.ln_marginal, (1000.0f64 / 1963.0).ln(), epsilon = 1e-9);
    }
}
