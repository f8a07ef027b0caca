//! PFG patch engine geometry: bicubic patches and their forward-difference evaluation.

pub mod evaluate;
pub mod fdiff;
pub mod surface;

pub use evaluate::{calculate_d00, calculate_surface, evaluate_patch, DifferenceTables, EvaluatedGrid, Sample};
pub use fdiff::{clamp_precision, StepMatrices, DEFAULT_PRECISION, MAX_PRECISION, MIN_PRECISION};
pub use surface::{BicubicPatch, ControlGrid, Surface};
