//! Error types for marga-plan.

use thiserror::Error;

use crate::tree::NodeId;

/// Planner and PTG error type.
#[derive(Error, Debug)]
pub enum PlanError {
    /// A precondition on the planner input was violated.
    #[error("invalid planner input: {0}")]
    Config(String),

    /// The sampler could not draw a collision-free pose.
    #[error("could not draw a collision-free random pose after {attempts} attempts")]
    SamplerExhausted {
        /// Number of rejected draws before giving up.
        attempts: usize,
    },

    /// Two tree nodes share the same pose (zero TP-space distance).
    #[error("duplicated pose in motion tree at node {node:?}")]
    DuplicateNode {
        /// The offending node.
        node: NodeId,
    },

    /// A binary archive was written by an unknown format version.
    #[error("unsupported archive version {found} (this build reads version {expected})")]
    SerializationVersion {
        /// Version found in the archive header.
        found: u8,
        /// Version this build understands.
        expected: u8,
    },

    /// Encoding or decoding a binary archive failed.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A user-supplied PTG expression failed to parse.
    #[error("invalid expression: {0}")]
    Expression(String),

    /// Filesystem error while writing debug artifacts.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<bincode::Error> for PlanError {
    fn from(e: bincode::Error) -> Self {
        PlanError::Serialization(e.to_string())
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, PlanError>;
