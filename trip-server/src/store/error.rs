//! Store loading errors.

use std::path::PathBuf;

use crate::domain::DomainError;

/// Errors from loading a route seed file.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse route seed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("route seed rejected: {0}")]
    Rejected(#[from] DomainError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = StoreError::Io {
            path: PathBuf::from("/nope/routes.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(err.to_string(), "failed to read /nope/routes.json: missing");

        let err = StoreError::from(DomainError::validation("duplicate route id r1"));
        assert_eq!(
            err.to_string(),
            "route seed rejected: validation failed: duplicate route id r1"
        );
    }
}
