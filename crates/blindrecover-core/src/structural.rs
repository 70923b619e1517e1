use crate::error::{CoreError, Result};
use blindrecover_geometry::coprime::CoprimeMatrix;

/// The polyhedral structural summary a vertex set is checked against:
/// vertex/edge/face counts, optional coprime and dimensional-offset data,
/// and the caller-supplied per-vertex corruption mask.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuralMap {
    pub n: u32,
    pub e: u32,
    pub f: u32,
    pub coprime_matrix: Option<CoprimeMatrix>,
    dimensional_offsets: Option<Vec<f64>>,
    pub corruption_mask: Vec<bool>,
}

impl StructuralMap {
    /// Builds a structural map. `corruption_mask.len()` must equal `n`.
    pub fn new(n: u32, e: u32, f: u32, corruption_mask: Vec<bool>) -> Result<Self> {
        if corruption_mask.len() != n as usize {
            return Err(CoreError::CorruptionMaskLengthMismatch {
                expected: n as usize,
                got: corruption_mask.len(),
            });
        }
        Ok(StructuralMap {
            n,
            e,
            f,
            coprime_matrix: None,
            dimensional_offsets: None,
            corruption_mask,
        })
    }

    pub fn with_coprime_matrix(mut self, matrix: CoprimeMatrix) -> Self {
        self.coprime_matrix = Some(matrix);
        self
    }

    /// Attaches per-vertex dimensional offsets. `offsets.len()` must equal
    /// `n` — see SPEC_FULL.md Open Question (1): the original indexes this
    /// array without a stored length or bounds check, which this
    /// precondition closes off at construction time instead of at use.
    pub fn with_dimensional_offsets(mut self, offsets: Vec<f64>) -> Result<Self> {
        if offsets.len() != self.n as usize {
            return Err(CoreError::DimensionalOffsetsLengthMismatch {
                expected: self.n as usize,
                got: offsets.len(),
            });
        }
        self.dimensional_offsets = Some(offsets);
        Ok(self)
    }

    pub fn dimensional_offsets(&self) -> Option<&[f64]> {
        self.dimensional_offsets.as_deref()
    }

    /// `V - E + F`.
    pub fn euler_residual(&self) -> i64 {
        self.n as i64 - self.e as i64 + self.f as i64
    }

    /// `true` iff the Euler relation `V - E + F = 2` holds.
    pub fn is_euler_consistent(&self) -> bool {
        self.euler_residual() == 2
    }

    /// Fraction of vertices flagged corrupted, in `[0, 1]`. `0.0` when
    /// `n == 0`.
    pub fn corruption_percentage(&self) -> f64 {
        if self.corruption_mask.is_empty() {
            return 0.0;
        }
        let corrupted = self.corruption_mask.iter().filter(|&&m| m).count();
        corrupted as f64 / self.corruption_mask.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_euler_consistent_sphere() {
        // A cube: V=8, E=12, F=6 -> 8 - 12 + 6 = 2.
        let m = StructuralMap::new(8, 12, 6, vec![false; 8]).unwrap();
        assert_eq!(m.euler_residual(), 2);
        assert!(m.is_euler_consistent());
    }

    #[test]
    fn test_euler_inconsistent() {
        let m = StructuralMap::new(8, 10, 6, vec![false; 8]).unwrap();
        assert!(!m.is_euler_consistent());
    }

    #[test]
    fn test_mask_length_mismatch_rejected() {
        let err = StructuralMap::new(8, 12, 6, vec![false; 4]).unwrap_err();
        assert_eq!(
            err,
            CoreError::CorruptionMaskLengthMismatch {
                expected: 8,
                got: 4
            }
        );
    }

    #[test]
    fn test_dimensional_offsets_length_mismatch_rejected() {
        let m = StructuralMap::new(8, 12, 6, vec![false; 8]).unwrap();
        let err = m.with_dimensional_offsets(vec![0.0; 3]).unwrap_err();
        assert_eq!(
            err,
            CoreError::DimensionalOffsetsLengthMismatch {
                expected: 8,
                got: 3
            }
        );
    }

    #[test]
    fn test_corruption_percentage() {
        let m = StructuralMap::new(4, 6, 4, vec![true, false, true, false]).unwrap();
        assert!((m.corruption_percentage() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_empty_map_corruption_percentage_zero() {
        let m = StructuralMap::new(0, 0, 0, vec![]).unwrap();
        assert_eq!(m.corruption_percentage(), 0.0);
    }
}
