//! Offline training pipeline.
//!
//! Re-architected from notebook-style sequential cells into pure stages,
//! each taking and returning explicit values:
//! load → clean → encode → split → fit → evaluate → persist.
//! No stage touches global state, so each is unit-testable on its own.

pub mod dataset;
pub mod fit;

pub use dataset::{clean, load_rows, split, LabeledRecord, TrainingRow};
pub use fit::{evaluate, fit_tree, FitParams};

use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::RecommendedAction;
use crate::pipeline::encoding::{encode, EncodingTable};
use crate::pipeline::inference::{DecisionTree, InferenceError, ModelArtifact};

#[derive(Error, Debug)]
pub enum TrainingError {
    #[error("failed to read training data: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        source: serde_json::Error,
    },

    #[error("no usable training rows after cleaning")]
    EmptyDataset,

    #[error("failed to persist artifact: {0}")]
    Persist(#[from] InferenceError),
}

/// Summary of one training run.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub rows_loaded: usize,
    pub rows_dropped: usize,
    pub train_examples: usize,
    pub test_examples: usize,
    pub accuracy: f32,
    pub artifact_path: PathBuf,
}

/// Run the full pipeline from a JSON-Lines reader to a persisted artifact.
pub fn run(
    reader: impl Read,
    artifact_path: &Path,
    model_version: &str,
    params: &FitParams,
    split_seed: u64,
) -> Result<TrainingReport, TrainingError> {
    let rows = load_rows(reader)?;
    let rows_loaded = rows.len();

    let labeled = clean(rows);
    let rows_dropped = rows_loaded - labeled.len();
    if labeled.is_empty() {
        return Err(TrainingError::EmptyDataset);
    }

    let table = build_table(&labeled);
    let examples = encode_all(&labeled, &table);

    let (train, test) = split(examples, 0.2, split_seed);
    let tree = fit_tree(&train, RecommendedAction::ALL.len(), params);
    let accuracy = evaluate(&tree, &test);

    let artifact = ModelArtifact {
        model_version: model_version.to_string(),
        n_features: table.arity(),
        labels: RecommendedAction::ALL.to_vec(),
        trees: vec![DecisionTree { root: tree.root.clone() }],
        encoding: table,
    };
    artifact.save(artifact_path)?;

    tracing::info!(
        rows = rows_loaded,
        dropped = rows_dropped,
        train = train.len(),
        test = test.len(),
        accuracy,
        artifact = %artifact_path.display(),
        "training run complete"
    );

    Ok(TrainingReport {
        rows_loaded,
        rows_dropped,
        train_examples: train.len(),
        test_examples: test.len(),
        accuracy,
        artifact_path: artifact_path.to_path_buf(),
    })
}

/// Build the encoding table from the cleaned training set. Every
/// categorical value observed here gets a stable code; everything novel at
/// serving time falls back to the unknown code.
pub fn build_table(records: &[LabeledRecord]) -> EncodingTable {
    let mut builder = EncodingTable::runtime_v1_builder();
    for labeled in records {
        if let Some(demo) = &labeled.record.demographics {
            builder.observe("gender", demo.gender.as_str());
            if let Some(ethnicity) = &demo.ethnicity {
                builder.observe("ethnicity", ethnicity);
            }
        }
        if let Some(history) = &labeled.record.medical_history {
            builder.observe("smoking_status", history.smoking_status.as_str());
        }
    }
    builder.build()
}

/// Encode the cleaned records into (features, label ordinal) pairs.
/// Rows that still fail binary normalization are dropped here rather than
/// aborting the run; they are counted and logged.
pub fn encode_all(records: &[LabeledRecord], table: &EncodingTable) -> Vec<fit::Example> {
    let mut examples = Vec::with_capacity(records.len());
    let mut dropped = 0usize;
    for labeled in records {
        match encode(&labeled.record, table) {
            Ok(vector) => examples.push(fit::Example {
                features: vector.values,
                label: labeled.action.ordinal(),
            }),
            Err(e) => {
                dropped += 1;
                tracing::debug!(patient_id = %labeled.record.id, error = %e, "dropping unencodable row");
            }
        }
    }
    if dropped > 0 {
        tracing::warn!(dropped, "training rows dropped at encoding");
    }
    examples
}
