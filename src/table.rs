// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Tab separated input of read counts and output of estimation results.

use std::io;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};

use crate::errors::Error;
use crate::estimation::{BatchEntry, EstimationResult};
use crate::model::priors::LatentRole;
use crate::model::{Counts, MutationKey, MutationObservation};
use crate::utils::posterior_prob_somatic;

/// One row of the counts table, with header
/// `sample mutation plasma_alt plasma_depth buffy_coat_alt buffy_coat_depth`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountsRecord {
    pub sample: String,
    pub mutation: String,
    pub plasma_alt: u64,
    pub plasma_depth: u64,
    pub buffy_coat_alt: u64,
    pub buffy_coat_depth: u64,
}

impl From<CountsRecord> for MutationObservation {
    fn from(record: CountsRecord) -> Self {
        MutationObservation::new(
            MutationKey::new(record.sample, record.mutation),
            Counts::new(record.plasma_alt, record.plasma_depth),
            Counts::new(record.buffy_coat_alt, record.buffy_coat_depth),
        )
    }
}

/// Read mutation observations from a tab separated table.
pub fn read_observations<R: io::Read>(reader: R) -> Result<Vec<MutationObservation>> {
    let mut reader = ReaderBuilder::new().delimiter(b'\t').from_reader(reader);
    reader
        .deserialize()
        .enumerate()
        .map(|(i, record)| -> Result<MutationObservation> {
            let record: CountsRecord =
                record.with_context(|| format!("invalid record {} in counts table", i + 1))?;
            Ok(record.into())
        })
        .collect()
}

/// One row of the results table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub sample: String,
    pub mutation: String,
    pub ln_marginal_hematopoietic: Option<f64>,
    pub ln_marginal_somatic: Option<f64>,
    pub ln_bayes_factor: Option<f64>,
    pub favored_origin: Option<String>,
    pub evidence: Option<String>,
    pub prob_somatic: Option<f64>,
    pub low_confidence: Option<bool>,
    pub error: Option<String>,
}

impl ResultRecord {
    pub fn new(
        key: &MutationKey,
        result: &Result<EstimationResult, Error>,
        prior_odds: Option<f64>,
    ) -> Self {
        match result {
            Ok(res) => ResultRecord {
                sample: key.sample().to_owned(),
                mutation: key.mutation().to_owned(),
                ln_marginal_hematopoietic: Some(res.hematopoietic.ln_marginal),
                ln_marginal_somatic: Some(res.somatic.ln_marginal),
                ln_bayes_factor: Some(res.ln_bayes_factor),
                favored_origin: res.favored_origin().map(|origin| origin.to_string()),
                evidence: res.evidence().map(|evidence| format!("{:?}", evidence)),
                prob_somatic: prior_odds
                    .filter(|_| !res.low_confidence())
                    .map(|odds| *posterior_prob_somatic(res.ln_bayes_factor, odds)),
                low_confidence: Some(res.low_confidence()),
                error: None,
            },
            Err(e) => ResultRecord {
                sample: key.sample().to_owned(),
                mutation: key.mutation().to_owned(),
                ln_marginal_hematopoietic: None,
                ln_marginal_somatic: None,
                ln_bayes_factor: None,
                favored_origin: None,
                evidence: None,
                prob_somatic: None,
                low_confidence: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Write one result row per mutation, in the order given.
pub fn write_results<W: io::Write>(
    writer: W,
    entries: &[BatchEntry],
    prior_odds: Option<f64>,
) -> Result<()> {
    let mut writer = WriterBuilder::new().delimiter(b'\t').from_writer(writer);
    for (key, result) in entries {
        writer.serialize(ResultRecord::new(key, result, prior_odds))?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct DrawsRecord<'a> {
    sample: &'a str,
    mutation: &'a str,
    role: LatentRole,
    theta: &'a [f64],
    ln_weights: &'a [f64],
}

/// Write retained Monte Carlo draws of all successful estimations as a JSON array.
pub fn write_draws<W: io::Write>(writer: W, entries: &[BatchEntry]) -> Result<()> {
    let records: Vec<DrawsRecord> = entries
        .iter()
        .filter_map(|(key, result)| result.as_ref().ok().map(|res| (key, res)))
        .flat_map(|(key, res)| {
            res.hematopoietic
                .components
                .values()
                .chain(res.somatic.components.values())
                .filter_map(move |component| {
                    component.draws.as_ref().map(|draws| DrawsRecord {
                        sample: key.sample(),
                        mutation: key.mutation(),
                        role: component.role,
                        theta: &draws.theta,
                        ln_weights: &draws.ln_weights,
                    })
                })
        })
        .collect();
    serde_json::to_writer(writer, &records)?;
    Ok(())
}
