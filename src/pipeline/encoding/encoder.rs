use crate::models::{Flag, PatientRecord};

use super::table::{EncodingTable, FeatureVector, FieldKind, MISSING_VALUE, UNKNOWN_CODE};
use super::EncodingError;

/// Encode a patient record into a fixed-width feature vector.
///
/// Field order comes from the table, which is the order the model was
/// trained against; the schema version carried on the output is what the
/// classifier checks before trusting the positions.
///
/// Policy, not oversight: unseen categorical values encode to the unknown
/// code and missing optional fields encode to the missing sentinel. Only an
/// unrecognized binary value is a hard error.
pub fn encode(
    record: &PatientRecord,
    table: &EncodingTable,
) -> Result<FeatureVector, EncodingError> {
    let mut values = Vec::with_capacity(table.arity());

    for spec in table.fields() {
        let value = match spec.kind {
            FieldKind::Numeric => {
                numeric_value(record, &spec.name)?.unwrap_or(MISSING_VALUE)
            }
            FieldKind::Categorical => match categorical_value(record, &spec.name)? {
                Some(raw) => table.code_for(&spec.name, &raw) as f32,
                None => UNKNOWN_CODE as f32,
            },
            FieldKind::Binary => match flag_value(record, &spec.name)? {
                Some(flag) => match flag.normalize() {
                    Some(true) => 1.0,
                    Some(false) => 0.0,
                    None => {
                        return Err(EncodingError::InvalidBinary {
                            field: spec.name.clone(),
                            value: flag.raw(),
                        })
                    }
                },
                None => MISSING_VALUE,
            },
        };
        values.push(value);
    }

    Ok(FeatureVector {
        schema_version: table.schema_version().to_string(),
        values,
    })
}

fn numeric_value(record: &PatientRecord, field: &str) -> Result<Option<f32>, EncodingError> {
    let vitals = record.vital_signs.as_ref();
    let labs = record.lab_results.as_ref();
    let tracking = record.health_tracking.as_ref();

    let value = match field {
        "age" => record
            .demographics
            .as_ref()
            .and_then(|d| d.age)
            .map(|v| v as f32),
        "systolic" => vitals
            .and_then(|v| v.blood_pressure.as_ref())
            .map(|bp| bp.systolic as f32),
        "diastolic" => vitals
            .and_then(|v| v.blood_pressure.as_ref())
            .map(|bp| bp.diastolic as f32),
        "heart_rate" => vitals.and_then(|v| v.heart_rate).map(|v| v as f32),
        "temperature" => vitals.and_then(|v| v.temperature).map(|v| v as f32),
        "oxygen_saturation" => vitals.and_then(|v| v.oxygen_saturation).map(|v| v as f32),
        "cholesterol" => labs.and_then(|l| l.cholesterol).map(|v| v as f32),
        "glucose" => labs.and_then(|l| l.glucose).map(|v| v as f32),
        "severity" => record
            .symptoms
            .as_ref()
            .and_then(|s| s.severity)
            .map(|v| v as f32),
        "steps" => tracking.and_then(|t| t.steps).map(|v| v as f32),
        "sleep_hours" => tracking.and_then(|t| t.sleep_hours).map(|v| v as f32),
        "calories" => tracking.and_then(|t| t.calories).map(|v| v as f32),
        "distance" => tracking.and_then(|t| t.distance).map(|v| v as f32),
        "active_minutes" => tracking.and_then(|t| t.active_minutes).map(|v| v as f32),
        _ => {
            return Err(EncodingError::UnknownField {
                field: field.to_string(),
                kind: "numeric",
            })
        }
    };
    Ok(value)
}

fn categorical_value(
    record: &PatientRecord,
    field: &str,
) -> Result<Option<String>, EncodingError> {
    let value = match field {
        "gender" => record
            .demographics
            .as_ref()
            .map(|d| d.gender.as_str().to_string()),
        "ethnicity" => record
            .demographics
            .as_ref()
            .and_then(|d| d.ethnicity.clone()),
        "smoking_status" => record
            .medical_history
            .as_ref()
            .map(|h| h.smoking_status.as_str().to_string()),
        _ => {
            return Err(EncodingError::UnknownField {
                field: field.to_string(),
                kind: "categorical",
            })
        }
    };
    Ok(value)
}

fn flag_value<'a>(
    record: &'a PatientRecord,
    field: &str,
) -> Result<Option<&'a Flag>, EncodingError> {
    let history = record.medical_history.as_ref();
    let symptoms = record.symptoms.as_ref();

    let value = match field {
        "hypertension" => history.and_then(|h| h.hypertension.as_ref()),
        "diabetes" => history.and_then(|h| h.diabetes.as_ref()),
        "heart_disease" => history.and_then(|h| h.heart_disease.as_ref()),
        "stroke_history" => history.and_then(|h| h.stroke_history.as_ref()),
        "facial_dropping" => symptoms.and_then(|s| s.facial_dropping.as_ref()),
        "arm_weakness" => symptoms.and_then(|s| s.arm_weakness.as_ref()),
        "speech_difficulty" => symptoms.and_then(|s| s.speech_difficulty.as_ref()),
        _ => {
            return Err(EncodingError::UnknownField {
                field: field.to_string(),
                kind: "binary",
            })
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Demographics, MedicalHistory, VitalSigns};
    use crate::pipeline::encoding::table::RUNTIME_SCHEMA_V1;

    fn runtime_table() -> EncodingTable {
        let mut builder = EncodingTable::runtime_v1_builder();
        for gender in ["male", "female", "other", "unknown"] {
            builder.observe("gender", gender);
        }
        for status in ["never", "former", "current", "unknown"] {
            builder.observe("smoking_status", status);
        }
        builder.observe("ethnicity", "caucasian");
        builder.observe("ethnicity", "asian");
        builder.build()
    }

    fn minimal_record() -> PatientRecord {
        PatientRecord {
            id: "P1".into(),
            vital_signs: Some(VitalSigns {
                heart_rate: Some(78),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn vector_matches_table_arity_and_version() {
        let table = runtime_table();
        let vector = encode(&minimal_record(), &table).unwrap();
        assert_eq!(vector.len(), table.arity());
        assert_eq!(vector.schema_version, RUNTIME_SCHEMA_V1);
    }

    #[test]
    fn unseen_categorical_value_uses_unknown_code() {
        let table = runtime_table();
        let mut record = minimal_record();
        record.demographics = Some(Demographics {
            age: Some(50),
            ethnicity: Some("Martian".into()),
            ..Default::default()
        });

        let vector = encode(&record, &table).unwrap();
        // ethnicity is field index 2 in the runtime schema
        assert_eq!(vector.values[2], UNKNOWN_CODE as f32);
    }

    #[test]
    fn binary_string_variants_encode_deterministically() {
        let table = runtime_table();
        for (raw, expected) in [("yes", 1.0), (" YES ", 1.0), ("1", 1.0), ("no", 0.0), ("0", 0.0)] {
            let mut record = minimal_record();
            record.medical_history = Some(MedicalHistory {
                hypertension: Some(Flag::Text(raw.into())),
                ..Default::default()
            });
            let vector = encode(&record, &table).unwrap();
            // hypertension is field index 3 in the runtime schema
            assert_eq!(vector.values[3], expected, "raw = {raw:?}");
        }
    }

    #[test]
    fn unrecognized_binary_value_is_a_hard_error() {
        let table = runtime_table();
        let mut record = minimal_record();
        record.medical_history = Some(MedicalHistory {
            diabetes: Some(Flag::Text("sometimes".into())),
            ..Default::default()
        });

        let err = encode(&record, &table).unwrap_err();
        assert!(matches!(
            err,
            EncodingError::InvalidBinary { ref field, .. } if field == "diabetes"
        ));
    }

    #[test]
    fn missing_optional_fields_use_the_sentinel() {
        let table = runtime_table();
        let vector = encode(&minimal_record(), &table).unwrap();
        // age missing
        assert_eq!(vector.values[0], MISSING_VALUE);
        // heart_rate present (field index 10)
        assert_eq!(vector.values[10], 78.0);
        // hypertension flag absent
        assert_eq!(vector.values[3], MISSING_VALUE);
    }

    #[test]
    fn field_order_is_stable_across_calls() {
        let table = runtime_table();
        let record = minimal_record();
        assert_eq!(
            encode(&record, &table).unwrap(),
            encode(&record, &table).unwrap()
        );
    }

    #[test]
    fn table_with_unextractable_field_errors() {
        let mut builder = EncodingTable::builder("bad-v1");
        builder.field("shoe_size", FieldKind::Numeric);
        let table = builder.build();

        assert!(matches!(
            encode(&minimal_record(), &table),
            Err(EncodingError::UnknownField { .. })
        ));
    }
}
