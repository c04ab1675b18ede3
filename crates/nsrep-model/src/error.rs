use nsrep_types::{Id, ValueType};

/// Errors raised while registering an item in the data model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// The id has fewer than two segments, so it holds no `(Type, Key)` pair.
    #[error("SHORT_ID: ID string is too short to represent type/id: {id}")]
    ShortId { id: Id },

    /// The type segment of the id differs from the declared item type.
    #[error("NO_TYPE: ID string does not contain item type: {declared} != {found}")]
    NoType { declared: String, found: String },

    /// An attribute already recorded with another value type.
    #[error("TYPE_MISMATCH: Attribute {attribute} of {item_type} was {was}, now {now}")]
    TypeMismatch {
        item_type: String,
        attribute: String,
        was: ValueType,
        now: ValueType,
    },

    /// Several model errors, one message per line.
    #[error("MODEL_MULTIPLE: {}", .0.join("\n"))]
    Multiple(Vec<String>),
}

impl ModelError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ShortId { .. } => "SHORT_ID",
            Self::NoType { .. } => "NO_TYPE",
            Self::TypeMismatch { .. } => "TYPE_MISMATCH",
            Self::Multiple(_) => "MODEL_MULTIPLE",
        }
    }

    /// Structural errors reject the item before the model is touched.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::ShortId { .. } | Self::NoType { .. })
    }

    /// Collapse collected errors: none, the only one, or a combined error.
    pub(crate) fn combine(mut errors: Vec<ModelError>) -> Option<ModelError> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Self::Multiple(
                errors.iter().map(ToString::to_string).collect(),
            )),
        }
    }
}
