pub mod approvals;
pub mod employees;
pub mod imports;
pub mod prenomina;

/// Raised when a string token from outside the core does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized {kind} '{value}'")]
pub struct UnknownToken {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownToken {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Lowercases and trims a boundary token so lookups are case-insensitive.
pub(crate) fn normalize_token(value: &str) -> String {
    value.trim().to_ascii_lowercase().replace(['-', ' '], "_")
}
