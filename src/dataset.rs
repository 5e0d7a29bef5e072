//! Training and inference matrices over a frozen feature schema.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::engine::FeatureRow;
use crate::error::EngineError;
use crate::features::{FeatureVector, canonical_feature_names};
use crate::outcome::Outcome;

/// Fraction of schema features an inference row must supply.
pub const MIN_SCHEMA_COVERAGE: f64 = 0.5;

/// Feature order and per-feature training medians, frozen at training time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub names: Vec<String>,
    #[serde(default)]
    pub medians: BTreeMap<String, f64>,
}

impl FeatureSchema {
    pub fn canonical() -> Self {
        Self {
            names: canonical_feature_names(),
            medians: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read feature schema {}", path.display()))?;
        serde_json::from_str(&raw).context("parse feature schema")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(self).context("serialize feature schema")?;
        fs::write(&tmp, json).context("write feature schema")?;
        fs::rename(&tmp, path).context("swap feature schema")?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSet {
    pub schema: FeatureSchema,
    pub match_ids: Vec<u64>,
    pub x: Vec<Vec<f64>>,
    pub y: Vec<Outcome>,
    /// Rows excluded because at least one schema feature was missing.
    pub dropped: usize,
}

impl TrainingSet {
    /// Complete rows only. Missing values are never imputed for training.
    pub fn from_rows(rows: &[FeatureRow], names: &[String]) -> Self {
        let mut match_ids = Vec::new();
        let mut x = Vec::new();
        let mut y = Vec::new();
        let mut dropped = 0usize;

        for row in rows {
            if !row.features.is_complete(names) {
                dropped += 1;
                continue;
            }
            let values = names
                .iter()
                .map(|n| row.features.value(n).unwrap_or_default())
                .collect();
            match_ids.push(row.match_id);
            x.push(values);
            y.push(row.outcome);
        }

        let medians = column_medians(names, &x);
        if dropped > 0 {
            info!(kept = x.len(), dropped, "training rows with missing features excluded");
        }
        Self {
            schema: FeatureSchema {
                names: names.to_vec(),
                medians,
            },
            match_ids,
            x,
            y,
            dropped,
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

fn column_medians(names: &[String], x: &[Vec<f64>]) -> BTreeMap<String, f64> {
    let mut out = BTreeMap::new();
    for (col, name) in names.iter().enumerate() {
        let mut values: Vec<f64> = x.iter().map(|row| row[col]).collect();
        if let Some(m) = median(&mut values) {
            out.insert(name.clone(), m);
        }
    }
    out
}

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

/// Inference rows laid out in schema order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferenceMatrix {
    pub match_ids: Vec<u64>,
    pub x: Vec<Vec<f64>>,
}

impl InferenceMatrix {
    /// Missing values take the training median; features the row never supplied
    /// take 0. A row supplying under half the schema rejects the whole request.
    pub fn build(rows: &[FeatureRow], schema: &FeatureSchema) -> Result<Self, EngineError> {
        let mut match_ids = Vec::with_capacity(rows.len());
        let mut x = Vec::with_capacity(rows.len());
        for row in rows {
            x.push(align_row(row.match_id, &row.features, schema)?);
            match_ids.push(row.match_id);
        }
        Ok(Self { match_ids, x })
    }
}

pub fn align_row(
    match_id: u64,
    features: &FeatureVector,
    schema: &FeatureSchema,
) -> Result<Vec<f64>, EngineError> {
    let supplied = schema.names.iter().filter(|n| features.contains(n)).count();
    let expected = schema.len();
    if (supplied as f64) < expected as f64 * MIN_SCHEMA_COVERAGE {
        warn!(match_id, supplied, expected, "inference row rejected");
        return Err(EngineError::SchemaCoverage { supplied, expected });
    }

    Ok(schema
        .names
        .iter()
        .map(|name| match features.get(name) {
            Some(Some(v)) => v,
            Some(None) => schema.medians.get(name).copied().unwrap_or_default(),
            None => 0.0,
        })
        .collect())
}
