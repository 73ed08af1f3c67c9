//! Engine calibration checks

pub mod symmetry;

pub use symmetry::{SymmetryCheck, SymmetryReport, SymmetryViolation, ViolationType};
