// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Data model and statistical core: read counts per compartment, Beta priors,
//! the mixture proposal and the marginal likelihood estimator.

use std::fmt;

use strum_macros::{Display, EnumString, IntoStaticStr};

use crate::errors::Error;

pub mod distributions;
pub mod marginal;
pub mod modes;
pub mod priors;
pub mod proposal;

/// An allele fraction, i.e. the latent proportion of fragments carrying the mutant allele.
pub type AlleleFreq = f64;

/// Blood compartment a read count was obtained from.
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
pub enum Compartment {
    /// Cell-free DNA from plasma.
    Plasma,
    /// White blood cells (buffy coat).
    BuffyCoat,
}

/// Mutant and total read counts at a mutation in one compartment.
#[derive(new, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Counts {
    /// Number of reads supporting the mutant allele (y).
    pub alt: u64,
    /// Total number of reads covering the position (n).
    pub depth: u64,
}

impl Counts {
    pub fn ref_count(&self) -> u64 {
        self.depth.saturating_sub(self.alt)
    }

    /// Fraction of reads supporting the mutant allele, if there is any coverage.
    pub fn alt_fraction(&self) -> Option<AlleleFreq> {
        if self.depth == 0 {
            None
        } else {
            Some(self.alt as f64 / self.depth as f64)
        }
    }

    /// Check that the counts can inform an allele fraction.
    pub fn validate(&self, compartment: Compartment) -> Result<(), Error> {
        if self.alt > self.depth {
            return Err(Error::AltExceedsDepth {
                compartment,
                alt: self.alt,
                depth: self.depth,
            });
        }
        if self.depth == 0 {
            return Err(Error::MissingCoverage { compartment });
        }
        Ok(())
    }

    /// Sum counts over several compartments.
    pub fn pooled(counts: &[Counts]) -> Counts {
        counts.iter().fold(Counts::new(0, 0), |acc, c| {
            Counts::new(acc.alt + c.alt, acc.depth + c.depth)
        })
    }
}

/// Unique identifier of a mutation within a sample.
#[derive(
    new, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Getters,
)]
#[get = "pub"]
pub struct MutationKey {
    sample: String,
    mutation: String,
}

impl fmt::Display for MutationKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.sample, self.mutation)
    }
}

/// One mutation observed in plasma and buffy coat of the same sample.
///
/// Counts are taken as delivered by upstream tooling. Whether they are usable
/// is checked when estimation starts (see `validate`), so that batch runs can
/// report malformed records individually.
#[derive(new, Debug, Clone, PartialEq, Eq, Getters)]
#[get = "pub"]
pub struct MutationObservation {
    key: MutationKey,
    plasma: Counts,
    buffy_coat: Counts,
}

impl MutationObservation {
    pub fn counts(&self, compartment: Compartment) -> &Counts {
        match compartment {
            Compartment::Plasma => &self.plasma,
            Compartment::BuffyCoat => &self.buffy_coat,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        self.plasma.validate(Compartment::Plasma)?;
        self.buffy_coat.validate(Compartment::BuffyCoat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(plasma: (u64, u64), buffy_coat: (u64, u64)) -> MutationObservation {
        MutationObservation::new(
            MutationKey::new("s1".to_owned(), "chr1:100A>T".to_owned()),
            Counts::new(plasma.0, plasma.1),
            Counts::new(buffy_coat.0, buffy_coat.1),
        )
    }

    #[test]
    fn test_valid_observation() {
        let obs = observation((4, 1000), (0, 600));
        assert!(obs.validate().is_ok());
        assert_eq!(obs.counts(Compartment::BuffyCoat).depth, 600);
        assert_eq!(obs.key().to_string(), "s1:chr1:100A>T");
    }

    #[test]
    fn test_alt_exceeds_depth() {
        let obs = observation((4, 1000), (7, 6));
        assert_eq!(
            obs.validate(),
            Err(Error::AltExceedsDepth {
                compartment: Compartment::BuffyCoat,
                alt: 7,
                depth: 6
            })
        );
    }

    #[test]
    fn test_missing_coverage() {
        let obs = observation((0, 0), (0, 600));
        assert_eq!(
            obs.validate(),
            Err(Error::MissingCoverage {
                compartment: Compartment::Plasma
            })
        );
    }

    #[test]
    fn test_pooled_counts() {
        let pooled = Counts::pooled(&[Counts::new(15, 2969), Counts::new(5, 1495)]);
        assert_eq!(pooled, Counts::new(20, 4464));
        assert_eq!(pooled.ref_count(), 4444);
        assert_eq!(Counts::new(0, 0).alt_fraction(), None);
    }
}
