use std::fmt;

/// Structurally malformed input. Everything else the kernel recovers from.
#[derive(Debug)]
pub enum InputError {
    MissingField {
        location: String,
        field: &'static str,
    },
    NonFinite {
        location: String,
        field: &'static str,
    },
    BadMarginal(String),
    /// Two region keys name the same region once case is ignored.
    DuplicateRegion(String),
    /// Both sides of the contest are the same entity.
    SameEntity(String),
    Json(serde_json::Error),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::MissingField { location, field } => {
                write!(f, "{location}: missing required field '{field}'")
            }
            InputError::NonFinite { location, field } => {
                write!(f, "{location}: field '{field}' is not a finite number")
            }
            InputError::BadMarginal(msg) => write!(f, "invalid marginal: {msg}"),
            InputError::DuplicateRegion(code) => {
                write!(f, "region '{code}' appears more than once")
            }
            InputError::SameEntity(name) => {
                write!(f, "entityA and entityB are both '{name}'")
            }
            InputError::Json(e) => write!(f, "malformed JSON: {e}"),
        }
    }
}

impl std::error::Error for InputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InputError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for InputError {
    fn from(e: serde_json::Error) -> Self {
        InputError::Json(e)
    }
}

pub type Result<T> = std::result::Result<T, InputError>;
