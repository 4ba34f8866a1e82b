// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::collections::BTreeMap;

use bio::stats::LogProb;
use rand::Rng;
use strum_macros::{Display, EnumString, IntoStaticStr};

use crate::config::SamplerConfig;
use crate::errors::Error;
use crate::model::marginal::MarginalEstimate;
use crate::model::priors::LatentRole;
use crate::model::MutationObservation;

pub mod hematopoietic;
pub mod somatic;

pub use hematopoietic::HematopoieticModel;
pub use somatic::SomaticModel;

/// Competing explanations for a mutation seen in plasma and buffy coat.
#[derive(
    Display,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Origin {
    /// Tumor-derived mutation.
    Somatic,
    /// Clonal hematopoiesis.
    Hematopoietic,
}

/// Marginal likelihood of one origin model, with one estimate per latent allele fraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEstimate {
    pub origin: Origin,
    pub ln_marginal: f64,
    pub components: BTreeMap<LatentRole, MarginalEstimate>,
}

impl ModelEstimate {
    /// Combine independent latent fractions. Their likelihoods multiply, so the logs add up.
    pub fn from_components(origin: Origin, components: Vec<MarginalEstimate>) -> Self {
        let ln_marginal = components.iter().map(|c| c.ln_marginal).sum();
        ModelEstimate {
            origin,
            ln_marginal,
            components: components.into_iter().map(|c| (c.role, c)).collect(),
        }
    }

    pub fn ln_marginal(&self) -> LogProb {
        LogProb(self.ln_marginal)
    }

    pub fn component(&self, role: LatentRole) -> Option<&MarginalEstimate> {
        self.components.get(&role)
    }

    pub fn is_degenerate(&self) -> bool {
        self.components.values().any(|c| c.degenerate)
    }
}

/// A model explaining the plasma and buffy coat counts of a mutation.
pub trait OriginModel {
    fn origin(&self) -> Origin;

    fn estimate<R: Rng + ?Sized>(
        &self,
        observation: &MutationObservation,
        config: &SamplerConfig,
        retain_draws: bool,
        rng: &mut R,
    ) -> Result<ModelEstimate, Error>;
}
