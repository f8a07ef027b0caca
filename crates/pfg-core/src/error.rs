use thiserror::Error;

#[derive(Debug, Error)]
pub enum PfgError {
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Unexpected end of input: {0}")]
    UnexpectedEof(String),

    #[error("Topology error: {0}")]
    Topology(String),

    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Capacity exceeded: {0}")]
    Capacity(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl PfgError {
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    /// Errors that must terminate the process instead of dropping one entity.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Capacity(_))
    }
}

pub type Result<T> = std::result::Result<T, PfgError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_capacity_is_fatal() {
        assert!(PfgError::Capacity("patches".into()).is_fatal());
        assert!(!PfgError::Topology("x".into()).is_fatal());
        assert!(!PfgError::parse(3, "bad").is_fatal());
    }

    #[test]
    fn test_parse_message_has_line() {
        let err = PfgError::parse(12, "expected number");
        assert_eq!(err.to_string(), "Parse error at line 12: expected number");
    }
}
