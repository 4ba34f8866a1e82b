// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Sampler settings and the YAML configuration file.
//!
//! ```yaml
//! ctdna: { a: 1.0, b: 9.0 }
//! chip: { a: 1.0, b: 9.0 }
//! ctc: { a: 1.0, b: 1000.0 }
//! montecarlo:
//!   samples: 50000
//!   method: importance-sampling
//! prior:
//!   weight: 0.1
//! retain_draws: false
//! seed: 42
//! ```

use std::convert::TryFrom;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use strum_macros::{Display, EnumString, IntoStaticStr};

use crate::errors::Error;
use crate::model::priors::PriorSpec;

pub const DEFAULT_SAMPLES: usize = 50000;
pub const DEFAULT_PRIOR_WEIGHT: f64 = 0.1;
pub const DEFAULT_SEED: u64 = 42;

/// How marginal likelihoods are computed.
#[derive(
    Display,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Method {
    /// Monte Carlo integration with a prior/posterior mixture proposal.
    ImportanceSampling,
    /// Closed form Beta-Binomial marginal likelihood. Only valid for Beta priors.
    Exact,
}

impl Default for Method {
    fn default() -> Self {
        Method::ImportanceSampling
    }
}

/// Monte Carlo settings shared by all latent allele fractions.
#[derive(new, Debug, Clone, Copy, PartialEq, Getters)]
#[get = "pub"]
pub struct SamplerConfig {
    /// Number of draws per latent allele fraction.
    samples: usize,
    /// Fraction of draws taken from the prior instead of the posterior.
    prior_weight: f64,
    method: Method,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        SamplerConfig {
            samples: DEFAULT_SAMPLES,
            prior_weight: DEFAULT_PRIOR_WEIGHT,
            method: Method::default(),
        }
    }
}

impl SamplerConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.samples == 0 {
            return Err(Error::InvalidSampleCount);
        }
        if !(0.0..=1.0).contains(&self.prior_weight) {
            return Err(Error::InvalidPriorWeight {
                weight: self.prior_weight,
            });
        }
        Ok(())
    }

    pub fn with_samples(mut self, samples: usize) -> Self {
        self.samples = samples;
        self
    }

    pub fn with_prior_weight(mut self, prior_weight: f64) -> Self {
        self.prior_weight = prior_weight;
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }
}

fn default_samples() -> usize {
    DEFAULT_SAMPLES
}

fn default_prior_weight() -> f64 {
    DEFAULT_PRIOR_WEIGHT
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct MonteCarloSection {
    #[serde(default = "default_samples")]
    samples: usize,
    #[serde(default)]
    method: Method,
}

impl Default for MonteCarloSection {
    fn default() -> Self {
        MonteCarloSection {
            samples: DEFAULT_SAMPLES,
            method: Method::default(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct PriorSection {
    #[serde(default = "default_prior_weight")]
    weight: f64,
}

impl Default for PriorSection {
    fn default() -> Self {
        PriorSection {
            weight: DEFAULT_PRIOR_WEIGHT,
        }
    }
}

/// Complete configuration as read from a YAML file. All keys are optional.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    #[serde(flatten)]
    priors: PriorSpec,
    #[serde(default)]
    montecarlo: MonteCarloSection,
    #[serde(default)]
    prior: PriorSection,
    #[serde(default)]
    retain_draws: bool,
    #[serde(default = "default_seed")]
    seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            priors: PriorSpec::default(),
            montecarlo: MonteCarloSection::default(),
            prior: PriorSection::default(),
            retain_draws: false,
            seed: DEFAULT_SEED,
        }
    }
}

impl<'a> TryFrom<&'a str> for Config {
    type Error = serde_yaml::Error;

    fn try_from(yaml: &str) -> Result<Self, Self::Error> {
        serde_yaml::from_str(yaml)
    }
}

impl Config {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path)
            .with_context(|| format!("unable to read configuration {}", path.display()))?;
        let config = Config::try_from(yaml.as_str())
            .with_context(|| format!("invalid configuration {}", path.display()))?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn priors(&self) -> &PriorSpec {
        &self.priors
    }

    pub fn sampler(&self) -> SamplerConfig {
        SamplerConfig::new(
            self.montecarlo.samples,
            self.prior.weight,
            self.montecarlo.method,
        )
    }

    pub fn retain_draws(&self) -> bool {
        self.retain_draws
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Check priors and sampler settings.
    pub fn validate(&self) -> Result<(), Error> {
        self.priors.validate()?;
        self.sampler().validate()
    }

    pub fn set_samples(&mut self, samples: usize) {
        self.montecarlo.samples = samples;
    }

    pub fn set_prior_weight(&mut self, weight: f64) {
        self.prior.weight = weight;
    }

    pub fn set_method(&mut self, method: Method) {
        self.montecarlo.method = method;
    }

    pub fn set_retain_draws(&mut self, retain_draws: bool) {
        self.retain_draws = retain_draws;
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::priors::BetaPrior;

    #[test]
    fn test_parse_full_config() {
        let yaml = "
ctdna: { a: 2.0, b: 8.0 }
chip: { a: 1.0, b: 19.0 }
ctc: { a: 1.0, b: 500.0 }
montecarlo:
  samples: 1000
  method: exact
prior:
  weight: 0.25
retain_draws: true
seed: 7
";
        let config = Config::try_from(yaml).unwrap();
        assert_eq!(*config.priors().ctdna(), BetaPrior::new(2.0, 8.0));
        assert_eq!(*config.priors().ctc(), BetaPrior::new(1.0, 500.0));
        assert_eq!(
            config.sampler(),
            SamplerConfig::new(1000, 0.25, Method::Exact)
        );
        assert!(config.retain_draws());
        assert_eq!(config.seed(), 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = Config::try_from("prior:\n  weight: 0.5\n").unwrap();
        assert_eq!(*config.priors(), PriorSpec::default());
        assert_eq!(*config.sampler().samples(), DEFAULT_SAMPLES);
        assert_relative_eq!(*config.sampler().prior_weight(), 0.5);
        assert_eq!(*config.sampler().method(), Method::ImportanceSampling);
        assert!(!config.retain_draws());
        assert_eq!(config.seed(), DEFAULT_SEED);
    }

    #[test]
    fn test_yaml_roundtrip_of_defaults() {
        let yaml = Config::default().to_yaml().unwrap();
        assert_eq!(Config::try_from(yaml.as_str()).unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_sampler() {
        assert_eq!(
            SamplerConfig::default().with_samples(0).validate(),
            Err(Error::InvalidSampleCount)
        );
        assert_eq!(
            SamplerConfig::default().with_prior_weight(1.5).validate(),
            Err(Error::InvalidPriorWeight { weight: 1.5 })
        );
        assert!(SamplerConfig::default()
            .with_prior_weight(1.0)
            .validate()
            .is_ok());
        assert!(SamplerConfig::default()
            .with_prior_weight(0.0)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_method_names() {
        assert_eq!("exact".parse::<Method>().unwrap(), Method::Exact);
        assert_eq!(Method::ImportanceSampling.to_string(), "importance-sampling");
    }
}
