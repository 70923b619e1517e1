use crate::anchor::{AnchorManager, AnchorSystem};
use crate::confidence::all_vertex_confidence;
use crate::error::{CoreError, Result};
use blindrecover_geometry::distance::Point3;

/// The outer recovery iteration (spec.md §4.7).
///
/// Each iteration recomputes per-vertex confidence from the current
/// anchor system (spec.md §2: "the driver invokes the confidence scorer
/// on the current vertices"), runs the anchor manager's global confidence
/// update, then walks anchors in order attempting replacement (if
/// flagged corrupted) or refinement. Anchor `i`'s step observes anchors
/// `0..i` as already updated this iteration, since anchors are mutated in
/// place in index order.
///
/// Terminates early at the first iteration that makes zero position-level
/// adjustments (replace/refine) *and* leaves every anchor's confidence
/// and `is_corrupted` flag unchanged — a no-change fixpoint in the full
/// sense of spec.md §8 property #5 ("if the return value is 0, no anchor
/// changed during the call"), not merely a round with no replacement or
/// refinement. Anchor confidence grows by a fixed factor each iteration
/// (§4.4) until it saturates at `1.0`; an iteration that only grows
/// confidence still counts as a change and keeps the loop going so a
/// later call against an already-converged system is a true no-op
/// (spec.md §8: "a system already at fixpoint ... leaves all positions,
/// confidences, and the triangulation matrix bitwise unchanged"),
/// otherwise after `max_iterations` iterations, whichever comes first.
/// Returns the total *position-level* adjustment count across all
/// iterations (unaffected by confidence-only iterations); this is never
/// an error condition (spec.md §7: "exhausting the budget without
/// fixpoint is a successful return").
///
/// `vertices` is read-only: no operation this driver invokes writes
/// vertex positions, only anchor positions and the confidence vector.
pub fn adjust_anchors_iterative(
    system: &mut AnchorSystem,
    manager: &AnchorManager,
    vertices: &[Point3],
    confidences: &mut [f64],
    mask: &[bool],
    max_iterations: u32,
) -> Result<u64> {
    if vertices.len() != confidences.len() {
        return Err(CoreError::VerticesConfidencesLengthMismatch {
            vertices: vertices.len(),
            confidences: confidences.len(),
        });
    }
    if vertices.len() != mask.len() {
        return Err(CoreError::VerticesMaskLengthMismatch {
            vertices: vertices.len(),
            mask: mask.len(),
        });
    }

    let mut total = 0u64;
    for iteration in 0..max_iterations {
        all_vertex_confidence(vertices, mask, system, confidences)?;
        let confidence_changed = manager.update_global_confidence(system);

        let mut iteration_count = 0u64;
        for i in 0..system.len() {
            let changed = if system.anchors[i].is_corrupted {
                manager.replace_corrupted_anchor(system, i, vertices, mask, confidences)
            } else {
                manager.refine_anchor_position(system, i, vertices, confidences)
            };
            if changed {
                iteration_count += 1;
            }
        }

        total += iteration_count;
        tracing::debug!(
            iteration,
            adjustments = iteration_count,
            confidence_changed,
            total,
            "recovery iteration complete"
        );

        if iteration_count == 0 && !confidence_changed {
            tracing::info!(iteration, total, "recovery reached fixpoint");
            break;
        }
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::{build_anchor_system, AnchorPoint};
    use blindrecover_geometry::distance::distance;

    fn cube_vertices() -> Vec<Point3> {
        let mut verts = Vec::new();
        for &x in &[-1.0, 1.0] {
            for &y in &[-1.0, 1.0] {
                for &z in &[-1.0, 1.0] {
                    verts.push([x, y, z]);
                }
            }
        }
        verts
    }

    fn cube_anchor_system(positions: &[Point3]) -> AnchorSystem {
        let anchors: Vec<AnchorPoint> = positions
            .iter()
            .enumerate()
            .map(|(i, &p)| AnchorPoint::new(i as u32, p, 0.95))
            .collect();
        let dim = anchors.len();
        let mut expected = vec![0.0; dim * dim];
        for i in 0..dim {
            for j in 0..dim {
                expected[i * dim + j] = distance(positions[i], positions[j]);
            }
        }
        build_anchor_system(anchors, expected).unwrap()
    }

    #[test]
    fn test_s1_perfect_geometry_reaches_fixpoint_immediately() {
        let vertices = cube_vertices();
        let anchor_positions = &vertices[0..4];
        let mut system = cube_anchor_system(anchor_positions);
        let manager = AnchorManager::new();
        let mask = vec![false; vertices.len()];
        let mut confidences = vec![0.95; vertices.len()];

        let total = adjust_anchors_iterative(
            &mut system,
            &manager,
            &vertices,
            &mut confidences,
            &mask,
            10,
        )
        .unwrap();

        assert_eq!(total, 0);
        assert!(confidences.iter().all(|&c| (c - 0.95).abs() < 1e-12));
    }

    #[test]
    fn test_s2_one_corrupted_anchor_is_replaced_once() {
        let vertices = cube_vertices();
        // Anchors at (1,1,1) and its three single-axis-flip neighbors: each
        // of the latter shares an axis-aligned edge of length 2 with
        // (1,1,1), so displacing (1,1,1) by (0.5, 0, 0) stretches that edge
        // to 2.5 (25% relative error, over the 10% tolerance) while leaving
        // the other three anchors' mutual distances untouched.
        let true_positions: Vec<Point3> = vec![vertices[7], vertices[3], vertices[5], vertices[6]];
        let mut anchor_positions: Vec<Point3> = true_positions.to_vec();
        anchor_positions[0][0] += 0.5;

        let dim = true_positions.len();
        let mut expected = vec![0.0; dim * dim];
        for i in 0..dim {
            for j in 0..dim {
                expected[i * dim + j] = distance(true_positions[i], true_positions[j]);
            }
        }
        let anchors: Vec<AnchorPoint> = anchor_positions
            .iter()
            .enumerate()
            .map(|(i, &p)| AnchorPoint::new(i as u32, p, 0.95))
            .collect();
        let mut system = build_anchor_system(anchors, expected).unwrap();

        let manager = AnchorManager::new();
        let mask = vec![false; vertices.len()];
        let mut confidences = vec![0.95; vertices.len()];

        let total = adjust_anchors_iterative(
            &mut system,
            &manager,
            &vertices,
            &mut confidences,
            &mask,
            10,
        )
        .unwrap();

        assert_eq!(total, 1);
        assert!(system.triangulation().is_well_formed());
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let vertices = cube_vertices();
        let anchor_positions = &vertices[0..4];
        let mut system = cube_anchor_system(anchor_positions);
        let manager = AnchorManager::new();
        let mask = vec![false; vertices.len() - 1];
        let mut confidences = vec![0.95; vertices.len()];
        assert!(adjust_anchors_iterative(
            &mut system,
            &manager,
            &vertices,
            &mut confidences,
            &mask,
            1
        )
        .is_err());
    }

    #[test]
    fn test_fixpoint_is_idempotent_on_rerun() {
        let vertices = cube_vertices();
        let anchor_positions = &vertices[0..4];
        let mut system = cube_anchor_system(anchor_positions);
        let manager = AnchorManager::new();
        let mask = vec![false; vertices.len()];
        let mut confidences = vec![0.95; vertices.len()];

        let first = adjust_anchors_iterative(
            &mut system,
            &manager,
            &vertices,
            &mut confidences,
            &mask,
            10,
        )
        .unwrap();
        let snapshot = system.clone();

        let second = adjust_anchors_iterative(
            &mut system,
            &manager,
            &vertices,
            &mut confidences,
            &mask,
            1,
        )
        .unwrap();

        assert_eq!(first, 0);
        assert_eq!(second, 0);
        assert_eq!(system, snapshot);
    }
}
