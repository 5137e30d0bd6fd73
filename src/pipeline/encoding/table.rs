use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// Code reserved for categorical values never seen at training time.
pub const UNKNOWN_CODE: u32 = 0;

/// Sentinel for optional fields absent from a record. All real values are
/// non-negative by record invariant, so the sentinel is unambiguous.
pub const MISSING_VALUE: f32 = -1.0;

/// Schema version of the reconciled runtime patient-record feature layout.
pub const RUNTIME_SCHEMA_V1: &str = "patient-v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Numeric,
    Categorical,
    Binary,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Numeric => "numeric",
            FieldKind::Categorical => "categorical",
            FieldKind::Binary => "binary",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
}

/// Categorical value → code mapping, built once at training time and
/// immutable thereafter. Field order is the feature-vector order; the
/// schema version ties that order to the model trained against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodingTable {
    schema_version: String,
    fields: Vec<FieldSpec>,
    /// field name → (normalized raw value → code ≥ 1). Code 0 is reserved
    /// for unknown.
    categories: HashMap<String, HashMap<String, u32>>,
}

impl EncodingTable {
    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Number of features a vector encoded against this table will have.
    pub fn arity(&self) -> usize {
        self.fields.len()
    }

    /// Look up the code for a raw categorical value. Unseen values map to
    /// the reserved unknown code — encoding never fails on novel categories.
    pub fn code_for(&self, field: &str, raw: &str) -> u32 {
        let normalized = normalize_category(raw);
        self.categories
            .get(field)
            .and_then(|values| values.get(&normalized))
            .copied()
            .unwrap_or(UNKNOWN_CODE)
    }

    pub fn builder(schema_version: &str) -> EncodingTableBuilder {
        EncodingTableBuilder::new(schema_version)
    }

    /// The reconciled runtime schema: demographics, history, vitals, labs,
    /// symptoms, wearables, in that fixed order.
    pub fn runtime_v1_builder() -> EncodingTableBuilder {
        let mut builder = EncodingTableBuilder::new(RUNTIME_SCHEMA_V1);
        builder.field("age", FieldKind::Numeric);
        builder.field("gender", FieldKind::Categorical);
        builder.field("ethnicity", FieldKind::Categorical);
        builder.field("hypertension", FieldKind::Binary);
        builder.field("diabetes", FieldKind::Binary);
        builder.field("heart_disease", FieldKind::Binary);
        builder.field("stroke_history", FieldKind::Binary);
        builder.field("smoking_status", FieldKind::Categorical);
        builder.field("systolic", FieldKind::Numeric);
        builder.field("diastolic", FieldKind::Numeric);
        builder.field("heart_rate", FieldKind::Numeric);
        builder.field("temperature", FieldKind::Numeric);
        builder.field("oxygen_saturation", FieldKind::Numeric);
        builder.field("cholesterol", FieldKind::Numeric);
        builder.field("glucose", FieldKind::Numeric);
        builder.field("facial_dropping", FieldKind::Binary);
        builder.field("arm_weakness", FieldKind::Binary);
        builder.field("speech_difficulty", FieldKind::Binary);
        builder.field("severity", FieldKind::Numeric);
        builder.field("steps", FieldKind::Numeric);
        builder.field("sleep_hours", FieldKind::Numeric);
        builder.field("calories", FieldKind::Numeric);
        builder.field("distance", FieldKind::Numeric);
        builder.field("active_minutes", FieldKind::Numeric);
        builder
    }
}

/// Builds an [`EncodingTable`] from observed training values.
///
/// Codes are assigned in sorted order of the normalized values, starting at
/// 1, so a table built from the same data is byte-identical regardless of
/// observation order.
pub struct EncodingTableBuilder {
    schema_version: String,
    fields: Vec<FieldSpec>,
    observed: BTreeMap<String, BTreeSet<String>>,
}

impl EncodingTableBuilder {
    pub fn new(schema_version: &str) -> Self {
        Self {
            schema_version: schema_version.to_string(),
            fields: Vec::new(),
            observed: BTreeMap::new(),
        }
    }

    pub fn field(&mut self, name: &str, kind: FieldKind) -> &mut Self {
        self.fields.push(FieldSpec {
            name: name.to_string(),
            kind,
        });
        self
    }

    /// Record a categorical value seen in training data.
    pub fn observe(&mut self, field: &str, raw: &str) -> &mut Self {
        self.observed
            .entry(field.to_string())
            .or_default()
            .insert(normalize_category(raw));
        self
    }

    pub fn build(self) -> EncodingTable {
        let categories = self
            .observed
            .into_iter()
            .map(|(field, values)| {
                let codes = values
                    .into_iter()
                    .zip(1u32..)
                    .collect::<HashMap<String, u32>>();
                (field, codes)
            })
            .collect();

        EncodingTable {
            schema_version: self.schema_version,
            fields: self.fields,
            categories,
        }
    }
}

fn normalize_category(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// An encoded record: fixed-width numeric features in table order, tagged
/// with the schema version it was encoded under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub schema_version: String,
    pub values: Vec<f32>,
}

impl FeatureVector {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
