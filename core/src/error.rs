use thiserror::Error;

/// Errors surfaced by the index, its store and the prefix tree.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("corrupt record: {0}")]
    Codec(#[from] bincode::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("meta file error: {0}")]
    Meta(#[from] serde_json::Error),

    #[error("incompatible index: format version {actual}, supported <= {expected}")]
    IncompatibleIndex { expected: u32, actual: u32 },

    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

pub type Result<T> = std::result::Result<T, SearchError>;

impl SearchError {
    /// True for failures of the durable store (disk, permissions, corruption).
    /// Only `InvariantViolation` is a programmer error instead.
    pub fn is_storage(&self) -> bool {
        !matches!(self, SearchError::InvariantViolation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_are_distinguishable() {
        let io = SearchError::from(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope"));
        assert!(io.is_storage());
        assert!(SearchError::IncompatibleIndex { expected: 1, actual: 2 }.is_storage());
        assert!(!SearchError::InvariantViolation("dup edge".into()).is_storage());
    }

    #[test]
    fn error_display() {
        let err = SearchError::IncompatibleIndex { expected: 1, actual: 3 };
        assert_eq!(err.to_string(), "incompatible index: format version 3, supported <= 1");
    }
}
