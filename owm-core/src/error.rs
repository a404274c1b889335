use thiserror::Error;

use crate::schema::SchemaViolation;

/// Errors returned by [`crate::WeatherApi`] operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport, DNS, timeout or non-success HTTP status.
    #[error("Network error: {0}")]
    Network(String),

    /// Geocoding returned no match.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Response body does not satisfy the declared contract.
    #[error("Schema error: {}", format_violations(.0))]
    Schema(Vec<SchemaViolation>),

    /// The client could not be constructed.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Violations carried by a `Schema` error, empty for every other kind.
    pub fn violations(&self) -> &[SchemaViolation] {
        match self {
            ApiError::Schema(v) => v,
            _ => &[],
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}

fn format_violations(violations: &[SchemaViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::JsonType;

    #[test]
    fn schema_error_lists_every_violation() {
        let err = ApiError::Schema(vec![
            SchemaViolation::missing("list[0].dt_txt"),
            SchemaViolation::wrong_type("cod", JsonType::String, "number"),
        ]);

        let msg = err.to_string();
        assert!(msg.contains("list[0].dt_txt"));
        assert!(msg.contains("cod"));
        assert_eq!(err.violations().len(), 2);
    }

    #[test]
    fn non_schema_errors_have_no_violations() {
        let err = ApiError::NotFound("City not found".into());
        assert!(err.violations().is_empty());
        assert!(err.is_not_found());
        assert!(err.to_string().contains("City not found"));
    }
}
