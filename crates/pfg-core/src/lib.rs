pub mod error;
pub mod tolerance;
pub mod traits;

pub use error::{PfgError, Result};
pub use tolerance::Tolerance;
