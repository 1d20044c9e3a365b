//! Dense matrices and the three-layer sigmoid policy network used by gridmind agents.
//!
//! The network maps an encoded observation to one score per movement direction. It learns
//! either from supervised `(input, target)` pairs or from remembered experiences, where the
//! target for the taken action is derived from the observed reward.

use thiserror::Error;

pub mod matrix;
pub mod network;
pub mod training;

pub use matrix::{Matrix, Shape};
pub use network::PolicyNetwork;
pub use training::{LearningStrategy, TrainingData};

/// Errors raised by matrix arithmetic and network training.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BrainError {
    /// Operand dimensions are incompatible for the requested operation.
    #[error("shape mismatch in {op}: {lhs} vs {rhs}")]
    ShapeMismatch {
        op: &'static str,
        lhs: Shape,
        rhs: Shape,
    },
    /// A training set whose parallel sequences disagree in length.
    #[error("training data has {inputs} inputs but {actual} {field}")]
    InvalidTrainingData {
        field: &'static str,
        inputs: usize,
        actual: usize,
    },
    /// An experience names an action the network has no output for.
    #[error("action {action} is out of range for a network with {outputs} outputs")]
    ActionOutOfRange { action: usize, outputs: usize },
}
