use crate::error::Result;

/// Validate structural integrity of a surface, patch, or link set.
pub trait Validate {
    fn validate(&self) -> Result<()>;
}
