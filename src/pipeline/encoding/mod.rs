pub mod encoder;
pub mod table;

pub use encoder::encode;
pub use table::{EncodingTable, EncodingTableBuilder, FeatureVector, FieldKind, FieldSpec};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("unrecognized binary value for {field}: {value:?}")]
    InvalidBinary { field: String, value: String },

    #[error("encoding table names a field the record schema does not have: {field} ({kind})")]
    UnknownField { field: String, kind: &'static str },
}
