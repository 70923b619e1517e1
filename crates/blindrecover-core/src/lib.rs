//! `blindrecover-core` - the blind-recovery engine's data model and
//! iteration logic: anchors, the confidence scorer, the anchor manager,
//! the recovery driver, and recovery metrics.
//!
//! Geometry and coprime/GCD analysis live in the sibling
//! `blindrecover-geometry` crate; multi-scale and multi-scalar diagnostics
//! live in `blindrecover-analysis`. This crate owns everything in
//! spec.md §3/§4.3/§4.4/§4.7: the vertex/anchor/structural data model, the
//! confidence scorer, the anchor manager, and the outer recovery driver.

pub mod anchor;
pub mod confidence;
pub mod driver;
pub mod error;
pub mod metrics;
pub mod structural;

pub use anchor::{AnchorManager, AnchorManagerConfig, AnchorPoint, AnchorSystem, TriangulationMatrix};
pub use confidence::{
    all_vertex_confidence, compute_all_confidence_scores, iterative_blend,
    iterative_blend_in_place, per_vertex_confidence, structural_confidence,
};
pub use driver::adjust_anchors_iterative;
pub use error::{CoreError, Result};
pub use metrics::{compute_recovery_metrics, validate_recovery_quality, RecoveryMetrics};
pub use structural::StructuralMap;

pub use blindrecover_geometry::distance::Point3;
