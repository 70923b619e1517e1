use crate::error::{CoreError, Result};
use blindrecover_geometry::distance::{distance, Point3};

/// A geometric reference point used to constrain recovery.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorPoint {
    /// Index into the vertex set this anchor was derived from.
    pub vertex_id: u32,
    pub position: Point3,
    pub confidence: f64,
    pub is_corrupted: bool,
}

impl AnchorPoint {
    pub fn new(vertex_id: u32, position: Point3, confidence: f64) -> Self {
        AnchorPoint {
            vertex_id,
            position,
            confidence,
            is_corrupted: false,
        }
    }
}

/// Dense, row-major `A x A` table of expected pairwise anchor distances.
///
/// Symmetric with a zero diagonal; this invariant is enforced at the two
/// places that write to it: [`TriangulationMatrix::build`] and
/// [`AnchorSystem::replace_anchor_row`].
#[derive(Debug, Clone, PartialEq)]
pub struct TriangulationMatrix {
    dim: usize,
    entries: Vec<f64>,
}

impl TriangulationMatrix {
    /// Builds a triangulation matrix from a dense `dim x dim` row-major
    /// buffer of expected distances. The diagonal is forced to zero
    /// regardless of the input, per spec.md §3's invariant.
    ///
    /// Returns `None` if `entries.len() != dim * dim`.
    pub fn build(dim: usize, mut entries: Vec<f64>) -> Option<Self> {
        if entries.len() != dim * dim {
            return None;
        }
        for i in 0..dim {
            entries[i * dim + i] = 0.0;
        }
        Some(TriangulationMatrix { dim, entries })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.entries[i * self.dim + j]
    }

    fn set(&mut self, i: usize, j: usize, v: f64) {
        self.entries[i * self.dim + j] = v;
    }

    /// Mean of all strictly upper-triangular entries (the mean pairwise
    /// anchor distance). `0.0` when `dim < 2`.
    pub fn mean_upper_triangular(&self) -> f64 {
        if self.dim < 2 {
            return 0.0;
        }
        let mut sum = 0.0;
        let mut count = 0usize;
        for i in 0..self.dim {
            for j in (i + 1)..self.dim {
                sum += self.get(i, j);
                count += 1;
            }
        }
        sum / count as f64
    }

    /// `true` iff the matrix is symmetric and has a zero diagonal.
    pub fn is_well_formed(&self) -> bool {
        for i in 0..self.dim {
            if self.get(i, i) != 0.0 {
                return false;
            }
            for j in (i + 1)..self.dim {
                if self.get(i, j) != self.get(j, i) {
                    return false;
                }
            }
        }
        true
    }
}

/// Owned anchor set plus the triangulation matrix and aggregate
/// confidence. Mutated in place over the lifetime of a recovery run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorSystem {
    pub anchors: Vec<AnchorPoint>,
    triangulation: TriangulationMatrix,
    pub global_confidence: f64,
}

impl AnchorSystem {
    /// Builds an anchor system from an ordered sequence of anchors and the
    /// `A x A` expected-distance matrix (row-major, dense).
    ///
    /// Returns `None` if `anchors` is empty or `expected_distances` does
    /// not have `anchors.len()^2` entries.
    pub fn build(anchors: Vec<AnchorPoint>, expected_distances: Vec<f64>) -> Option<Self> {
        if anchors.is_empty() {
            return None;
        }
        let dim = anchors.len();
        let triangulation = TriangulationMatrix::build(dim, expected_distances)?;
        let global_confidence = mean(anchors.iter().map(|a| a.confidence));
        Some(AnchorSystem {
            anchors,
            triangulation,
            global_confidence,
        })
    }

    pub fn triangulation(&self) -> &TriangulationMatrix {
        &self.triangulation
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Recomputes `global_confidence` as the arithmetic mean of per-anchor
    /// confidences.
    pub fn recompute_global_confidence(&mut self) {
        self.global_confidence = mean(self.anchors.iter().map(|a| a.confidence));
    }

    /// Overwrites row `i` and column `i` of the triangulation matrix with
    /// the actual pairwise distances from `anchors[i].position` to every
    /// other anchor, and resets the diagonal entry to zero.
    ///
    /// Called by [`crate::anchor::AnchorManager::replace_corrupted_anchor`]
    /// after a replacement; the lone other write site besides `build`.
    pub fn replace_anchor_row(&mut self, i: usize) {
        let position = self.anchors[i].position;
        let dim = self.triangulation.dim;
        for j in 0..dim {
            let d = if i == j {
                0.0
            } else {
                distance(position, self.anchors[j].position)
            };
            self.triangulation.set(i, j, d);
            self.triangulation.set(j, i, d);
        }
    }
}

/// Minimum position displacement for a refinement to count as a real
/// adjustment rather than a no-op (spec.md §4.7's "no-change fixpoint").
/// Not part of the spec's public numeric contract (§6) — those constants
/// govern the refinement's own math; this one only filters the driver's
/// adjustment count so bitwise-unchanged updates don't block convergence.
const POSITION_CHANGE_EPSILON: f64 = 1e-9;

fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    values.sum::<f64>() / n as f64
}

/// Policy constants for the anchor manager, exposed for construction-time
/// rebinding so tests can probe the boundary of each threshold (spec.md
/// §4.4: "implementations must expose them at construction time").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorManagerConfig {
    /// Radius of the spherical neighborhood considered during refinement.
    /// A vertex exactly at this distance is outside the neighborhood
    /// (open ball), not on its boundary.
    pub neighborhood_radius: f64,
    /// Minimum vertex confidence to be considered during refinement or
    /// replacement candidate selection.
    pub min_confidence_for_candidate: f64,
    /// Additive epsilon in the refinement weighting `c / (d + eps)`.
    pub weight_distance_epsilon: f64,
    /// Blend weight kept from the anchor's current position.
    pub blend_existing: f64,
    /// Blend weight taken from the weighted neighborhood mean.
    pub blend_new: f64,
    /// Anchor confidence threshold below which the anchor is flagged
    /// corrupted.
    pub corruption_confidence_threshold: f64,
    /// Relative triangulation-distance discrepancy above which the anchor
    /// is flagged corrupted.
    pub anchor_distance_tolerance: f64,
    /// Minimum total refinement weight; below this, refinement fails.
    pub total_weight_epsilon: f64,
    /// Confidence growth factor applied to anchors found not corrupted.
    pub confidence_growth: f64,
    /// Confidence penalty factor applied to anchors found corrupted.
    pub confidence_penalty: f64,
}

impl Default for AnchorManagerConfig {
    fn default() -> Self {
        AnchorManagerConfig {
            neighborhood_radius: 2.0,
            min_confidence_for_candidate: 0.80,
            weight_distance_epsilon: 0.1,
            blend_existing: 0.70,
            blend_new: 0.30,
            corruption_confidence_threshold: 0.6,
            anchor_distance_tolerance: 0.10,
            total_weight_epsilon: 1e-6,
            confidence_growth: 1.05,
            confidence_penalty: 0.5,
        }
    }
}

/// Detects corrupted anchors, refines or replaces their positions, and
/// keeps `AnchorSystem::global_confidence` up to date. Holds no domain
/// state of its own beyond its policy constants.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnchorManager {
    pub config: AnchorManagerConfig,
}

impl AnchorManager {
    pub fn new() -> Self {
        AnchorManager::default()
    }

    pub fn with_config(config: AnchorManagerConfig) -> Self {
        AnchorManager { config }
    }

    /// Corruption detection for anchor `i`: flagged corrupted if its
    /// stored confidence is below the threshold, or if the relative
    /// discrepancy between its measured and expected distance to some
    /// other anchor exceeds the tolerance.
    ///
    /// Returns `(is_corrupted, max_distance_error)`. With a single anchor
    /// (no `j` to compare against) `max_distance_error` is `0.0` and only
    /// the confidence rule can trigger corruption, per spec.md §8's
    /// boundary behavior.
    pub fn detect_corruption(&self, system: &AnchorSystem, i: usize) -> (bool, f64) {
        let anchor = &system.anchors[i];
        let confidence_below = anchor.confidence < self.config.corruption_confidence_threshold;

        let dim = system.anchors.len();
        let mut max_err = 0.0f64;
        for j in 0..dim {
            if j == i {
                continue;
            }
            let measured = distance(anchor.position, system.anchors[j].position);
            let expected = system.triangulation.get(i, j);
            let rel_err = (measured - expected).abs() / expected;
            if rel_err > max_err {
                max_err = rel_err;
            }
        }

        let distance_exceeds = max_err > self.config.anchor_distance_tolerance;
        (confidence_below || distance_exceeds, max_err)
    }

    /// Refines anchor `i`'s position toward a weighted mean of nearby
    /// high-confidence vertices. Returns `true` only if the position
    /// materially changed (beyond [`POSITION_CHANGE_EPSILON`]) — a
    /// weighted mean that reproduces the anchor's current position (e.g.
    /// the only qualifying neighbor is the anchor's own linked vertex) is
    /// a no-op and must not count as an adjustment, or the driver's
    /// no-change fixpoint (spec.md §4.7) could never be reached.
    pub fn refine_anchor_position(
        &self,
        system: &mut AnchorSystem,
        i: usize,
        vertices: &[Point3],
        confidences: &[f64],
    ) -> bool {
        let anchor_position = system.anchors[i].position;

        let mut weighted_sum = [0.0f64; 3];
        let mut total_weight = 0.0f64;
        for (q, &pos) in vertices.iter().enumerate() {
            let c = confidences[q];
            if c < self.config.min_confidence_for_candidate {
                continue;
            }
            let d = distance(anchor_position, pos);
            if d >= self.config.neighborhood_radius {
                continue;
            }
            let w = c / (d + self.config.weight_distance_epsilon);
            weighted_sum[0] += w * pos[0];
            weighted_sum[1] += w * pos[1];
            weighted_sum[2] += w * pos[2];
            total_weight += w;
        }

        if total_weight < self.config.total_weight_epsilon {
            return false;
        }

        let mean_pos = [
            weighted_sum[0] / total_weight,
            weighted_sum[1] / total_weight,
            weighted_sum[2] / total_weight,
        ];

        let blend_existing = self.config.blend_existing;
        let blend_new = self.config.blend_new;
        let new_position = [
            blend_existing * anchor_position[0] + blend_new * mean_pos[0],
            blend_existing * anchor_position[1] + blend_new * mean_pos[1],
            blend_existing * anchor_position[2] + blend_new * mean_pos[2],
        ];

        if distance(new_position, anchor_position) <= POSITION_CHANGE_EPSILON {
            return false;
        }

        system.anchors[i].position = new_position;
        true
    }

    /// Replaces corrupted anchor `i` with the highest-scoring uncorrupted,
    /// high-confidence vertex, where score is confidence weighted by
    /// separation from every other anchor. Rebuilds row/column `i` of the
    /// triangulation matrix. Returns `true` on replacement.
    pub fn replace_corrupted_anchor(
        &self,
        system: &mut AnchorSystem,
        i: usize,
        vertices: &[Point3],
        mask: &[bool],
        confidences: &[f64],
    ) -> bool {
        let dim = system.anchors.len();
        let other_positions: Vec<Point3> = (0..dim)
            .filter(|&j| j != i)
            .map(|j| system.anchors[j].position)
            .collect();

        if other_positions.is_empty() {
            // No other anchors to separate from; nothing to score against.
            return false;
        }

        let mut best: Option<(usize, f64)> = None;
        for (q, &pos) in vertices.iter().enumerate() {
            if mask[q] {
                continue;
            }
            let c = confidences[q];
            if c < self.config.min_confidence_for_candidate {
                continue;
            }
            let min_sep = other_positions
                .iter()
                .map(|&op| distance(pos, op))
                .fold(f64::INFINITY, f64::min);
            let score = c * min_sep;
            if best.map(|(_, best_score)| score > best_score).unwrap_or(true) {
                best = Some((q, score));
            }
        }

        let Some((q, _)) = best else {
            return false;
        };

        system.anchors[i] = AnchorPoint {
            vertex_id: q as u32,
            position: vertices[q],
            confidence: confidences[q],
            is_corrupted: false,
        };
        system.replace_anchor_row(i);
        true
    }

    /// Runs corruption detection over every anchor, applies the
    /// confidence penalty/growth rule, and recomputes
    /// `AnchorSystem::global_confidence`.
    ///
    /// Returns `true` if any anchor's `confidence`/`is_corrupted` or the
    /// system's `global_confidence` actually changed value. The driver
    /// uses this to tell a true fixpoint (nothing left to do, including
    /// confidence growth not yet saturated at `1.0`) from an iteration
    /// that merely made zero position-level adjustments — see
    /// [`crate::driver::adjust_anchors_iterative`].
    pub fn update_global_confidence(&self, system: &mut AnchorSystem) -> bool {
        let decisions: Vec<bool> = (0..system.anchors.len())
            .map(|i| self.detect_corruption(system, i).0)
            .collect();

        let mut changed = false;
        for (i, corrupted) in decisions.into_iter().enumerate() {
            let anchor = &mut system.anchors[i];
            let old_confidence = anchor.confidence;
            let old_is_corrupted = anchor.is_corrupted;
            if corrupted {
                anchor.confidence *= self.config.confidence_penalty;
                anchor.is_corrupted = true;
            } else {
                anchor.confidence = (anchor.confidence * self.config.confidence_growth).min(1.0);
                anchor.is_corrupted = false;
            }
            if anchor.confidence != old_confidence || anchor.is_corrupted != old_is_corrupted {
                changed = true;
            }
        }

        let old_global_confidence = system.global_confidence;
        system.recompute_global_confidence();
        changed || system.global_confidence != old_global_confidence
    }
}

fn validate_lengths(
    anchors_len: usize,
    expected_len: usize,
) -> Result<()> {
    let required = anchors_len * anchors_len;
    if expected_len != required {
        return Err(CoreError::AnchorDistanceMatrixMismatch {
            expected: required,
            got: expected_len,
        });
    }
    Ok(())
}

/// Builds an [`AnchorSystem`], returning a [`CoreError`] describing the
/// mismatch instead of silently discarding invalid input.
pub fn build_anchor_system(
    anchors: Vec<AnchorPoint>,
    expected_distances: Vec<f64>,
) -> Result<AnchorSystem> {
    if anchors.is_empty() {
        return Err(CoreError::EmptyAnchorSet);
    }
    validate_lengths(anchors.len(), expected_distances.len())?;
    Ok(AnchorSystem::build(anchors, expected_distances)
        .expect("length already validated"))
}
