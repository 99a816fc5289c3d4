use thiserror::Error;

use crate::{bc::Edge, methods::OperatorKind};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("invalid grid along {axis}: {reason}")]
    InvalidGrid { axis: &'static str, reason: String },

    #[error("invalid boundary at {edge:?}: {reason}")]
    InvalidBoundary { edge: Edge, reason: String },

    #[error("shape mismatch for {what}: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        what: String,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("`{operator}` expects {expected} field(s), got {found}")]
    FieldCount {
        operator: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("`{operator:?}` needs a {parameter} parameter")]
    MissingParameter {
        operator: OperatorKind,
        parameter: &'static str,
    },

    #[error("`{0:?}` is an elliptic problem, use the relaxation solver")]
    NotExplicit(OperatorKind),

    #[error("field `{field}` holds a non-finite value at {index:?} after step {step}")]
    NonFinite {
        field: String,
        step: usize,
        index: (usize, usize),
    },
}
