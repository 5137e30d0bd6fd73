pub mod decision;
pub mod enums;
pub mod patient;

pub use decision::*;
pub use enums::*;
pub use patient::*;

use thiserror::Error;

/// Validation failures for ingested patient records.
///
/// These are reported to the caller and never retried: a record that
/// fails validation cannot produce a trustworthy decision.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("record has no vital signs")]
    NoVitals,

    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("invalid {field}: {value}")]
    InvalidEnum { field: String, value: String },
}
