use nsrep_types::StoreError;

/// Errors raised while parsing or evaluating a selection document.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("PARSE: {message} at offset {offset}")]
    Parse { offset: usize, message: String },

    #[error("UNKNOWN_FIELD: {owner} has no field {field}")]
    UnknownField { owner: String, field: String },

    #[error("UNKNOWN_ARGUMENT: {field} has no argument {argument}")]
    UnknownArgument { field: String, argument: String },

    #[error("SEARCH: {0}")]
    Search(#[from] StoreError),
}

impl SchemaError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "PARSE",
            Self::UnknownField { .. } => "UNKNOWN_FIELD",
            Self::UnknownArgument { .. } => "UNKNOWN_ARGUMENT",
            Self::Search(_) => "SEARCH",
        }
    }
}

pub type SchemaResult<T> = Result<T, SchemaError>;
