//! Concrete problems.

pub mod binary;

pub use binary::BinaryProblem;
