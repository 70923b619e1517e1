//! `blindrecover-analysis` - multi-resolution and multi-scalar diagnostic
//! analyzers for blindrecover (spec.md §4.5, §4.6).
//!
//! These analyzers are independent diagnostics: they are not required for
//! the recovery driver's termination (spec.md §2), but their outputs are
//! part of the public contract and must be reproducible bit-for-bit under
//! identical inputs, so nothing here touches wall-clock time or RNG state.

pub mod oscillation;
pub mod scale;
pub mod scalar;

pub use oscillation::{DimensionSignature, OscillationMap};
pub use scale::{analyze_multi_scale, MultiScaleAnalysis, ScaleLevel};
pub use scalar::{
    analyze_multi_scalar, HyperdimensionalStructure, MultiScalarAnalysis, ScalarAnalysis,
};
