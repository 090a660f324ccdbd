use thiserror::Error;

/// Rejection of client-supplied query parameters.
///
/// Every variant maps to a client error; nothing here is a server fault.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Unsupported query operator '{op}' on field '{field}'")]
    UnsupportedOperator { field: String, op: String },

    #[error("Unknown field '{0}'")]
    UnknownField(String),

    #[error("Invalid field name '{0}'")]
    InvalidFieldName(String),

    #[error("Field path '{0}' is nested too deeply")]
    TooDeep(String),

    #[error("Operator 'in' on field '{0}' needs at least one value")]
    EmptyList(String),
}
