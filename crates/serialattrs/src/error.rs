use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AttrError {
    #[error("Cannot parse {input} as {type_name}: {reason}")]
    Parse {
        type_name: String,
        input: String,
        reason: String,
    },

    #[error("Cannot encode {input} as {type_name}: {reason}")]
    Encode {
        type_name: String,
        input: String,
        reason: String,
    },

    #[error("Unknown attribute type: {0}")]
    UnknownType(String),

    #[error("Unknown field {field} in group {group}")]
    UnknownField { group: String, field: String },

    #[error("Unknown attribute group: {0}")]
    UnknownGroup(String),

    #[error("Field {field} is not a boolean")]
    NotBoolean { field: String },

    #[error("Format error: {0}")]
    Format(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Config load error: {0}")]
    ConfigLoad(#[from] confique::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Record not found: {0}")]
    RecordNotFound(Uuid),
}

impl AttrError {
    pub(crate) fn parse(
        type_name: impl Into<String>,
        input: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        AttrError::Parse {
            type_name: type_name.into(),
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn encode(
        type_name: impl Into<String>,
        input: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        AttrError::Encode {
            type_name: type_name.into(),
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AttrError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_json_errors_keep_their_source() {
        let json_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err: AttrError = json_err.into();
        assert!(matches!(err, AttrError::Serialization(_)));
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("Serialization error: "));
    }

    #[test]
    fn test_parse_helper_formats_message() {
        let err = AttrError::parse("integer", "abc", "out of range");
        assert_eq!(err.to_string(), "Cannot parse abc as integer: out of range");
    }
}
