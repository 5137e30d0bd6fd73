use std::io::{BufRead, BufReader, Read};
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::models::{PatientRecord, RecommendedAction};

use super::fit::Example;
use super::TrainingError;

/// One raw training row: a patient record plus its outcome label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingRow {
    #[serde(flatten)]
    pub record: PatientRecord,
    #[serde(default, rename = "recommendedAction")]
    pub recommended_action: Option<String>,
}

/// A cleaned row: validated record, parsed label.
#[derive(Debug, Clone)]
pub struct LabeledRecord {
    pub record: PatientRecord,
    pub action: RecommendedAction,
}

/// Load JSON-Lines training data. A malformed line is a hard error with
/// its line number — silent row loss at parse time hides data bugs.
pub fn load_rows(reader: impl Read) -> Result<Vec<TrainingRow>, TrainingError> {
    let mut rows = Vec::new();
    for (idx, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row: TrainingRow = serde_json::from_str(&line)
            .map_err(|source| TrainingError::Parse { line: idx + 1, source })?;
        rows.push(row);
    }
    Ok(rows)
}

/// Drop rows that cannot be trained on: missing or unparseable label, or a
/// record that fails ingestion validation. Mirrors the serving-side rules
/// so train and serve see the same data shape.
pub fn clean(rows: Vec<TrainingRow>) -> Vec<LabeledRecord> {
    let total = rows.len();
    let labeled: Vec<LabeledRecord> = rows
        .into_iter()
        .filter_map(|row| {
            let action = row
                .recommended_action
                .as_deref()
                .and_then(|raw| RecommendedAction::from_str(raw.trim()).ok())?;
            row.record.validate().ok()?;
            Some(LabeledRecord {
                record: row.record,
                action,
            })
        })
        .collect();

    if labeled.len() < total {
        tracing::debug!(kept = labeled.len(), total, "cleaned training rows");
    }
    labeled
}

/// Deterministic shuffled train/test split. Same seed, same split.
pub fn split(
    mut examples: Vec<Example>,
    test_fraction: f64,
    seed: u64,
) -> (Vec<Example>, Vec<Example>) {
    let mut rng = StdRng::seed_from_u64(seed);
    examples.shuffle(&mut rng);

    let test_len = ((examples.len() as f64) * test_fraction).round() as usize;
    let test_len = test_len.min(examples.len());
    let train = examples.split_off(test_len);
    (train, examples)
}
