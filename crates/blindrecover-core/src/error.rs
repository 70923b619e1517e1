use thiserror::Error;

/// Invalid-argument failures: a caller bug, not a routine "insufficient
/// data" outcome. These are the only failures in this crate reported via
/// `Result` rather than `Option`/`bool` — see spec.md §7 and
/// SPEC_FULL.md §4.8.
#[derive(Error, Debug, PartialEq)]
pub enum CoreError {
    #[error("vertices length {vertices} does not match confidences length {confidences}")]
    VerticesConfidencesLengthMismatch { vertices: usize, confidences: usize },

    #[error("vertices length {vertices} does not match corruption mask length {mask}")]
    VerticesMaskLengthMismatch { vertices: usize, mask: usize },

    #[error("confidences length {confidences} does not match corruption mask length {mask}")]
    ConfidencesMaskLengthMismatch { confidences: usize, mask: usize },

    #[error(
        "dimensional offsets length {got} does not match vertex count {expected}"
    )]
    DimensionalOffsetsLengthMismatch { expected: usize, got: usize },

    #[error("corruption mask length {got} does not match vertex count {expected}")]
    CorruptionMaskLengthMismatch { expected: usize, got: usize },

    #[error(
        "expected-distance matrix has {got} entries, but {expected} anchors require {expected}x{expected}"
    )]
    AnchorDistanceMatrixMismatch { expected: usize, got: usize },

    #[error("anchor set must be non-empty")]
    EmptyAnchorSet,
}

pub type Result<T> = std::result::Result<T, CoreError>;
