// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use statrs::distribution::Beta;
use strum_macros::{Display, EnumString, IntoStaticStr};

use crate::errors::Error;

/// Latent allele fractions the two origin models reason about.
#[derive(
    Display,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum LatentRole {
    /// Tumor-derived fraction in plasma (somatic model).
    Ctdna,
    /// Clonal hematopoiesis fraction shared by plasma and buffy coat (hematopoietic model).
    Chip,
    /// Circulating tumor cell contamination of the buffy coat (somatic model).
    Ctc,
}

/// Shape parameters of a Beta distribution over an allele fraction.
#[derive(new, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetaPrior {
    pub a: f64,
    pub b: f64,
}

impl BetaPrior {
    pub fn is_valid(&self) -> bool {
        self.a.is_finite() && self.b.is_finite() && self.a > 0.0 && self.b > 0.0
    }

    pub fn validate(&self, role: LatentRole) -> Result<(), Error> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(Error::InvalidBetaShape {
                role,
                a: self.a,
                b: self.b,
            })
        }
    }

    pub fn mean(&self) -> f64 {
        self.a / (self.a + self.b)
    }

    /// Sampleable distribution with these shape parameters.
    pub(crate) fn distribution(&self, role: LatentRole) -> Result<Beta, Error> {
        Beta::new(self.a, self.b).map_err(|_| Error::InvalidBetaShape {
            role,
            a: self.a,
            b: self.b,
        })
    }
}

fn default_ctdna() -> BetaPrior {
    BetaPrior::new(1.0, 9.0)
}

fn default_chip() -> BetaPrior {
    BetaPrior::new(1.0, 9.0)
}

fn default_ctc() -> BetaPrior {
    BetaPrior::new(1.0, 1000.0)
}

/// Beta priors for each latent role.
#[derive(new, Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Getters)]
#[get = "pub"]
pub struct PriorSpec {
    #[serde(default = "default_ctdna")]
    ctdna: BetaPrior,
    #[serde(default = "default_chip")]
    chip: BetaPrior,
    #[serde(default = "default_ctc")]
    ctc: BetaPrior,
}

impl Default for PriorSpec {
    fn default() -> Self {
        PriorSpec {
            ctdna: default_ctdna(),
            chip: default_chip(),
            ctc: default_ctc(),
        }
    }
}

impl PriorSpec {
    pub fn prior(&self, role: LatentRole) -> &BetaPrior {
        match role {
            LatentRole::Ctdna => &self.ctdna,
            LatentRole::Chip => &self.chip,
            LatentRole::Ctc => &self.ctc,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        self.ctdna.validate(LatentRole::Ctdna)?;
        self.chip.validate(LatentRole::Chip)?;
        self.ctc.validate(LatentRole::Ctc)
    }
}
