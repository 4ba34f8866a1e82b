// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Bayesian discrimination between tumor (somatic) and clonal hematopoiesis origin of
//! mutations observed in cell-free DNA.
//!
//! For each mutation, read counts from plasma and from the matched buffy coat are
//! compared under two models: a hematopoietic model with a single clonal hematopoiesis
//! allele fraction shared by both compartments, and a somatic model with independent
//! ctDNA and circulating tumor cell fractions. Marginal likelihoods are estimated by
//! importance sampling from a mixture of the Beta prior and the conjugate posterior,
//! and their ratio is reported as a Bayes factor.

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate derive_builder;
#[macro_use]
extern crate getset;
#[macro_use]
extern crate derive_new;
#[cfg(test)]
#[macro_use]
extern crate approx;

pub mod cli;
pub mod config;
pub mod errors;
pub mod estimation;
pub mod model;
pub mod table;
pub mod utils;

pub use crate::estimation::{estimate, estimate_batch, EstimationResult};
