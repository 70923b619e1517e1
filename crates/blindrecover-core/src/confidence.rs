use crate::anchor::AnchorSystem;
use crate::error::{CoreError, Result};
use crate::structural::StructuralMap;
use blindrecover_geometry::distance::{distance, Point3};

/// Fixed confidence assigned to vertices the corruption mask does not
/// flag: the anchor triangulation is considered reliable for them.
const UNCORRUPTED_DEFAULT_CONFIDENCE: f64 = 0.95;

/// Additive epsilon in the per-anchor relative-error denominator.
const RELATIVE_ERROR_EPSILON: f64 = 1e-6;

/// Relative-error threshold above which the outlier penalty applies.
const OUTLIER_THRESHOLD: f64 = 0.5;

/// Multiplicative outlier penalty.
const OUTLIER_PENALTY: f64 = 0.5;

/// Base structural confidence for an Euler-consistent vertex.
const EULER_CONSISTENT_CONFIDENCE: f64 = 0.9;

/// Base structural confidence for an Euler-inconsistent vertex.
const EULER_INCONSISTENT_CONFIDENCE: f64 = 0.5;

/// Per-vertex confidence from anchor-distance consistency (spec.md §4.3
/// "Per-vertex confidence").
///
/// `anchor_positions` and `expected` must be the same length; that length
/// is the anchor count `A`. Returns `0.0` for `A == 0` or a length
/// mismatch (a "null input" in spec terms).
pub fn per_vertex_confidence(p: Point3, anchor_positions: &[Point3], expected: &[f64]) -> f64 {
    if anchor_positions.is_empty() || anchor_positions.len() != expected.len() {
        return 0.0;
    }

    let relative_errors: Vec<f64> = anchor_positions
        .iter()
        .zip(expected.iter())
        .map(|(&a, &e)| {
            let d = distance(p, a);
            (d - e).abs() / (e + RELATIVE_ERROR_EPSILON)
        })
        .collect();

    let mean_error = relative_errors.iter().sum::<f64>() / relative_errors.len() as f64;
    let max_error = relative_errors
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);

    let mut confidence = (-2.0 * mean_error).exp();
    if max_error > OUTLIER_THRESHOLD {
        confidence *= OUTLIER_PENALTY;
    }
    confidence
}

/// Computes per-vertex confidence for every vertex (spec.md §4.3
/// "All-vertex confidence"): corrupted vertices are scored against the
/// mean pairwise anchor distance broadcast to every anchor slot;
/// uncorrupted vertices get the fixed default.
///
/// `vertices`, `mask`, and `confidences_out` must all have the same
/// length.
pub fn all_vertex_confidence(
    vertices: &[Point3],
    mask: &[bool],
    anchor_system: &AnchorSystem,
    confidences_out: &mut [f64],
) -> Result<()> {
    if vertices.len() != mask.len() {
        return Err(CoreError::VerticesMaskLengthMismatch {
            vertices: vertices.len(),
            mask: mask.len(),
        });
    }
    if vertices.len() != confidences_out.len() {
        return Err(CoreError::VerticesConfidencesLengthMismatch {
            vertices: vertices.len(),
            confidences: confidences_out.len(),
        });
    }

    let anchor_positions: Vec<Point3> = anchor_system.anchors.iter().map(|a| a.position).collect();
    let broadcast_distance = anchor_system.triangulation().mean_upper_triangular();
    let expected: Vec<f64> = vec![broadcast_distance; anchor_positions.len()];

    for (v, (&position, &corrupted)) in vertices.iter().zip(mask.iter()).enumerate() {
        confidences_out[v] = if corrupted {
            per_vertex_confidence(position, &anchor_positions, &expected)
        } else {
            UNCORRUPTED_DEFAULT_CONFIDENCE
        };
    }

    Ok(())
}

/// The public "compute all confidence scores" boundary operation
/// (spec.md §6): same algorithm as [`all_vertex_confidence`], but the
/// corruption mask is read from `structural_map` rather than passed
/// separately.
pub fn compute_all_confidence_scores(
    vertices: &[Point3],
    anchor_system: &AnchorSystem,
    structural_map: &StructuralMap,
    confidences_out: &mut [f64],
) -> Result<()> {
    all_vertex_confidence(
        vertices,
        &structural_map.corruption_mask,
        anchor_system,
        confidences_out,
    )
}

/// Structural confidence for `vertex_id` (spec.md §4.3 "Structural
/// confidence"): a base score from the Euler relation, optionally
/// attenuated by that vertex's dimensional offset.
///
/// # Panics
/// Panics if `vertex_id >= structural_map.n` when dimensional offsets are
/// present and shorter than expected — this cannot happen through the
/// public `StructuralMap` constructors, which enforce the offsets length
/// precondition at construction time (SPEC_FULL.md Open Question 1).
pub fn structural_confidence(vertex_id: usize, structural_map: &StructuralMap) -> f64 {
    let base = if structural_map.is_euler_consistent() {
        EULER_CONSISTENT_CONFIDENCE
    } else {
        EULER_INCONSISTENT_CONFIDENCE
    };

    match structural_map.dimensional_offsets() {
        Some(offsets) => base * (-offsets[vertex_id]).exp(),
        None => base,
    }
}

/// Convex blend of a new confidence `c` with a previous snapshot `prev`
/// at learning rate `alpha`: `(1 - alpha) * prev + alpha * c`.
///
/// [`crate::driver::adjust_anchors_iterative`] does not call this: its
/// per-iteration steps (spec.md §4.7) overwrite the confidence vector
/// wholesale via [`all_vertex_confidence`] and name no blending step,
/// unlike spec.md §3's looser "mutated ... implicitly, via side effect,
/// by the driver's blending rule" description of the data model. Since
/// §4.7 gives the driver's exact algorithm and leaves the blend's
/// learning rate `alpha` unspecified (no numeric value for it appears
/// anywhere in spec.md §6's constant list), wiring it into the driver
/// would mean inventing a constant the spec never gives. These functions
/// remain public so a caller that wants confidence to change gradually
/// across repeated `compute_all_confidence_scores` calls — at whatever
/// `alpha` it chooses — can apply the blend itself between calls.
pub fn iterative_blend(c: f64, prev: f64, alpha: f64) -> f64 {
    (1.0 - alpha) * prev + alpha * c
}

/// Blends `confidences` in place against a `previous` snapshot at rate
/// `alpha`. Both slices must have equal length.
pub fn iterative_blend_in_place(
    confidences: &mut [f64],
    previous: &[f64],
    alpha: f64,
) -> Result<()> {
    if confidences.len() != previous.len() {
        return Err(CoreError::VerticesConfidencesLengthMismatch {
            vertices: previous.len(),
            confidences: confidences.len(),
        });
    }
    for (c, &prev) in confidences.iter_mut().zip(previous.iter()) {
        *c = iterative_blend(*c, prev, alpha);
    }
    Ok(())
}
