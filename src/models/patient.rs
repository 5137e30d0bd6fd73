use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::{Gender, SmokingStatus};
use super::RecordError;

/// A raw patient record as supplied by the ingestion collaborator.
///
/// Everything beyond the identifier is optional at ingestion; missing
/// sections are absent, never zeroed. Validation (non-negative numerics,
/// bounded severity / oxygen saturation, at least one vital) happens in
/// [`PatientRecord::validate`], not during deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demographics: Option<Demographics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<MedicalHistory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vital_signs: Option<VitalSigns>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lab_results: Option<LabResults>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symptoms: Option<Symptoms>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_tracking: Option<HealthTracking>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Demographics {
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub ethnicity: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalHistory {
    #[serde(default)]
    pub hypertension: Option<Flag>,
    #[serde(default)]
    pub diabetes: Option<Flag>,
    #[serde(default)]
    pub heart_disease: Option<Flag>,
    #[serde(default)]
    pub stroke_history: Option<Flag>,
    #[serde(default)]
    pub smoking_status: SmokingStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalSigns {
    #[serde(default)]
    pub blood_pressure: Option<BloodPressure>,
    #[serde(default)]
    pub heart_rate: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub oxygen_saturation: Option<u32>,
}

impl VitalSigns {
    /// True if at least one measurement is present.
    pub fn any_present(&self) -> bool {
        self.blood_pressure.is_some()
            || self.heart_rate.is_some()
            || self.temperature.is_some()
            || self.oxygen_saturation.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BloodPressure {
    pub systolic: u32,
    pub diastolic: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabResults {
    #[serde(default)]
    pub cholesterol: Option<u32>,
    #[serde(default)]
    pub glucose: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Symptoms {
    /// Field name kept as the ingestion collaborator spells it.
    #[serde(default, rename = "facialDropping")]
    pub facial_dropping: Option<Flag>,
    #[serde(default)]
    pub arm_weakness: Option<Flag>,
    #[serde(default)]
    pub speech_difficulty: Option<Flag>,
    #[serde(default)]
    pub severity: Option<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthTracking {
    #[serde(default)]
    pub steps: Option<u64>,
    #[serde(default)]
    pub sleep_hours: Option<f64>,
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub active_minutes: Option<u32>,
    #[serde(default)]
    pub is_real_time: Option<bool>,
    #[serde(default)]
    pub last_updated: Option<NaiveDateTime>,
}

/// A binary-ish value as it arrives from ingestion: JSON bool, number, or
/// string. Normalization to 0/1 is the encoder's job; the record keeps the
/// raw form so unrecognized values fail loudly at encoding time, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Flag {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl Flag {
    /// Case-insensitive, whitespace-trimmed normalization.
    /// Accepts {"yes","1",true} → true and {"no","0",false} → false;
    /// anything else is unrecognized.
    pub fn normalize(&self) -> Option<bool> {
        match self {
            Flag::Bool(b) => Some(*b),
            Flag::Int(1) => Some(true),
            Flag::Int(0) => Some(false),
            Flag::Int(_) => None,
            Flag::Text(s) => match s.trim().to_lowercase().as_str() {
                "yes" | "1" => Some(true),
                "no" | "0" => Some(false),
                _ => None,
            },
        }
    }

    /// Raw form for error messages.
    pub fn raw(&self) -> String {
        match self {
            Flag::Bool(b) => b.to_string(),
            Flag::Int(i) => i.to_string(),
            Flag::Text(s) => s.clone(),
        }
    }
}

impl From<bool> for Flag {
    fn from(b: bool) -> Self {
        Flag::Bool(b)
    }
}

impl PatientRecord {
    /// Validate ingestion invariants: non-empty identifier, at least one
    /// vital sign, severity ∈ [0,5], oxygen saturation ∈ [0,100] and
    /// non-negative wearable metrics.
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.id.trim().is_empty() {
            return Err(RecordError::MissingField("id"));
        }

        let vitals = self.vital_signs.as_ref().ok_or(RecordError::NoVitals)?;
        if !vitals.any_present() {
            return Err(RecordError::NoVitals);
        }

        if let Some(t) = vitals.temperature {
            if t < 0.0 {
                return Err(RecordError::OutOfRange {
                    field: "temperature",
                    value: t,
                });
            }
        }
        if let Some(spo2) = vitals.oxygen_saturation {
            if spo2 > 100 {
                return Err(RecordError::OutOfRange {
                    field: "oxygen_saturation",
                    value: spo2 as f64,
                });
            }
        }

        if let Some(symptoms) = &self.symptoms {
            if let Some(sev) = symptoms.severity {
                if sev > 5 {
                    return Err(RecordError::OutOfRange {
                        field: "severity",
                        value: sev as f64,
                    });
                }
            }
        }

        if let Some(tracking) = &self.health_tracking {
            for (field, value) in [
                ("sleep_hours", tracking.sleep_hours),
                ("calories", tracking.calories),
                ("distance", tracking.distance),
            ] {
                if let Some(v) = value {
                    if v < 0.0 {
                        return Err(RecordError::OutOfRange { field, value: v });
                    }
                }
            }
        }

        Ok(())
    }

    /// Deterministic clinical one-liner used as the embedding input.
    ///
    /// Same record, same text — the embedding contract depends on it.
    pub fn summary_text(&self) -> String {
        let mut parts: Vec<String> = Vec::new();

        if let Some(demo) = &self.demographics {
            let age = demo
                .age
                .map(|a| format!("{a} year old"))
                .unwrap_or_else(|| "age unknown".to_string());
            parts.push(format!("{age} {}", demo.gender.as_str()));
            if let Some(eth) = &demo.ethnicity {
                parts.push(eth.trim().to_lowercase());
            }
        }

        if let Some(history) = &self.medical_history {
            for (name, flag) in [
                ("hypertension", &history.hypertension),
                ("diabetes", &history.diabetes),
                ("heart disease", &history.heart_disease),
                ("prior stroke", &history.stroke_history),
            ] {
                if flag.as_ref().and_then(Flag::normalize) == Some(true) {
                    parts.push(name.to_string());
                }
            }
            parts.push(format!("{} smoker", history.smoking_status.as_str()));
        }

        if let Some(symptoms) = &self.symptoms {
            for (name, flag) in [
                ("facial dropping", &symptoms.facial_dropping),
                ("arm weakness", &symptoms.arm_weakness),
                ("speech difficulty", &symptoms.speech_difficulty),
            ] {
                if flag.as_ref().and_then(Flag::normalize) == Some(true) {
                    parts.push(name.to_string());
                }
            }
            if let Some(sev) = symptoms.severity {
                parts.push(format!("severity {sev}"));
            }
        }

        if let Some(vitals) = &self.vital_signs {
            if let Some(bp) = &vitals.blood_pressure {
                parts.push(format!("bp {}/{}", bp.systolic, bp.diastolic));
            }
            if let Some(hr) = vitals.heart_rate {
                parts.push(format!("hr {hr}"));
            }
            if let Some(spo2) = vitals.oxygen_saturation {
                parts.push(format!("spo2 {spo2}"));
            }
        }

        if let Some(labs) = &self.lab_results {
            if let Some(chol) = labs.cholesterol {
                parts.push(format!("cholesterol {chol}"));
            }
            if let Some(glu) = labs.glucose {
                parts.push(format!("glucose {glu}"));
            }
        }

        parts.join(", ")
    }
}
